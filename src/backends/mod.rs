//! Supported back ends and their rule tables.
//!
//! Each back end module builds its own override chain: a family layer with
//! the base rule table, a back-end layer that logs every received line, and
//! an application or library variant layer on top. Rule tables are private
//! to their module so one back end's vocabulary never leaks into another's.

mod cmake;
mod codewarrior;
mod iar;
mod mcux;
mod mdk;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::classify::matcher::Matcher;
use crate::classify::{ClassifierOptions, Layer};
use crate::core::target::{BuildVariant, FlagCategory, ParseNameError};

/// Categories an application variant accepts unless a back end says otherwise.
pub const APPLICATION_CATEGORIES: &[FlagCategory] = &[
    FlagCategory::Assembler,
    FlagCategory::CCompiler,
    FlagCategory::CxxCompiler,
    FlagCategory::Linker,
];

/// Categories a library variant accepts unless a back end says otherwise.
pub const LIBRARY_CATEGORIES: &[FlagCategory] = &[
    FlagCategory::Assembler,
    FlagCategory::CCompiler,
    FlagCategory::CxxCompiler,
    FlagCategory::Archiver,
];

/// Project generator back end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendId {
    /// CMake generator (armgcc standalone projects)
    CMake,
    /// IAR Embedded Workbench
    Iar,
    /// Keil MDK (armclang)
    Mdk,
    /// CodeWarrior for DSC
    CodeWarrior,
    /// MCUXpresso IDE
    Mcux,
}

impl BackendId {
    pub const ALL: [BackendId; 5] = [
        BackendId::CMake,
        BackendId::Iar,
        BackendId::Mdk,
        BackendId::CodeWarrior,
        BackendId::Mcux,
    ];

    /// Get the backend name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendId::CMake => "cmake",
            BackendId::Iar => "iar",
            BackendId::Mdk => "mdk",
            BackendId::CodeWarrior => "codewarrior",
            BackendId::Mcux => "mcux",
        }
    }

    /// One-line description for listings.
    pub fn description(&self) -> &'static str {
        match self {
            BackendId::CMake => "CMake generator: library grouping, everything else passed through",
            BackendId::Iar => "IAR Embedded Workbench for Arm",
            BackendId::Mdk => "Keil MDK with the armclang toolchain",
            BackendId::CodeWarrior => "CodeWarrior for DSC (56800/E)",
            BackendId::Mcux => "MCUXpresso IDE managed-make projects",
        }
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BackendId {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cmake" | "armgcc" => Ok(BackendId::CMake),
            "iar" => Ok(BackendId::Iar),
            "mdk" | "keil" => Ok(BackendId::Mdk),
            "codewarrior" | "cw" => Ok(BackendId::CodeWarrior),
            "mcux" | "mcuxpresso" => Ok(BackendId::Mcux),
            _ => Err(ParseNameError::new(
                "back end",
                s,
                "cmake, iar, mdk, codewarrior, mcux",
            )),
        }
    }
}

/// Build the override chain for a (back end, variant) pair.
pub fn build_chain(backend: BackendId, variant: BuildVariant, options: &ClassifierOptions) -> Layer {
    match backend {
        BackendId::CMake => cmake::chain(variant, options),
        BackendId::Iar => iar::chain(variant),
        BackendId::Mdk => mdk::chain(variant),
        BackendId::CodeWarrior => codewarrior::chain(variant),
        BackendId::Mcux => mcux::chain(variant),
    }
}

/// Rules for compiler flags attached to a single source file.
///
/// Only IAR and MDK application projects carry per-source settings; every
/// other pair records the whole line as opaque flags.
pub fn source_rules(backend: BackendId, variant: BuildVariant) -> Vec<Box<dyn Matcher>> {
    if variant.is_library() {
        return Vec::new();
    }
    match backend {
        BackendId::Iar => iar::source_rules(),
        BackendId::Mdk => mdk::source_rules(),
        BackendId::CMake | BackendId::CodeWarrior | BackendId::Mcux => Vec::new(),
    }
}

/// Name of a variant layer, e.g. `mcux/app`.
fn variant_name(backend: BackendId, variant: BuildVariant) -> String {
    format!("{}/{}", backend, variant.short())
}
