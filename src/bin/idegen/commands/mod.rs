//! Command implementations

pub mod backends;
pub mod classify;
pub mod completions;
pub mod generate;
