//! idegen - classify raw toolchain flags into IDE project settings
//!
//! This crate provides the library side of the `idegen` tool: the flag
//! classification engine, the per-back-end rule tables, the project model
//! the classifier fills, and the operations that tie them to flag
//! descriptions on disk.

pub mod backends;
pub mod classify;
pub mod core;
pub mod ops;
pub mod util;

pub use backends::BackendId;
pub use classify::{Classified, Classifier, ClassifierOptions, ClassifyError};
pub use core::{
    manifest::FlagDescription,
    project::{ModelError, ProjectModel},
    setting::{Setting, SettingValue},
    target::{BuildVariant, FlagCategory, TargetName},
};
pub use util::config::Config;
