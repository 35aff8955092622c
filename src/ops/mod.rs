//! High-level operations.
//!
//! This module contains the implementation of idegen commands.

pub mod generate;
pub mod writer;

pub use generate::{build_model, generate, resolve_selection, GenerateOptions, GenerateResult, Tally};
pub use writer::{JsonWriter, ProjectWriter};
