//! Core data structures for idegen.
//!
//! This module contains the types every other layer is built on:
//! - Targets, flag categories and build variants
//! - Recognized settings and the project model they accumulate in
//! - The TOML flag description a generation run starts from

pub mod manifest;
pub mod ordered_set;
pub mod project;
pub mod setting;
pub mod target;

pub use manifest::FlagDescription;
pub use ordered_set::OrderedSet;
pub use project::{CategoryFlags, ModelError, ProjectModel, SourceFlags, TargetFlags};
pub use setting::{Setting, SettingValue};
pub use target::{BuildVariant, FlagCategory, ParseNameError, TargetName};
