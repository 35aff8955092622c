//! Targets, build variants and flag categories.
//!
//! A target is one build configuration ("debug", "release") inside a
//! generated project. Flag lines arrive per (target, category) pair.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::project::ModelError;

/// The tool a raw flag line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagCategory {
    /// Assembler flags (`asflags`)
    Assembler,
    /// C compiler flags (`ccflags`)
    #[serde(rename = "c-compiler")]
    CCompiler,
    /// C++ compiler flags (`cxflags`)
    #[serde(rename = "cxx-compiler")]
    CxxCompiler,
    /// Linker flags (`ldflags`)
    Linker,
    /// Archiver flags (`arflags`)
    Archiver,
}

impl FlagCategory {
    /// Every category, in the order a generation run classifies them.
    pub const ALL: [FlagCategory; 5] = [
        FlagCategory::Assembler,
        FlagCategory::CCompiler,
        FlagCategory::CxxCompiler,
        FlagCategory::Linker,
        FlagCategory::Archiver,
    ];

    /// Short name, matching the flag description keys without the `flags` suffix.
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagCategory::Assembler => "as",
            FlagCategory::CCompiler => "cc",
            FlagCategory::CxxCompiler => "cx",
            FlagCategory::Linker => "ld",
            FlagCategory::Archiver => "ar",
        }
    }
}

impl fmt::Display for FlagCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}flags", self.as_str())
    }
}

impl FromStr for FlagCategory {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "as" | "asm" | "asflags" | "assembler" => Ok(FlagCategory::Assembler),
            "cc" | "c" | "ccflags" | "c-compiler" => Ok(FlagCategory::CCompiler),
            "cx" | "cxx" | "cpp" | "c++" | "cxflags" | "cxxflags" | "cxx-compiler" => {
                Ok(FlagCategory::CxxCompiler)
            }
            "ld" | "ldflags" | "linker" => Ok(FlagCategory::Linker),
            "ar" | "arflags" | "archiver" => Ok(FlagCategory::Archiver),
            _ => Err(ParseNameError::new(
                "flag category",
                s,
                "as, cc, cx, ld, ar",
            )),
        }
    }
}

/// Application vs library build of the same back end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildVariant {
    /// Executable project skeleton (default)
    #[default]
    #[serde(alias = "app")]
    Application,
    /// Static library project skeleton
    #[serde(alias = "lib")]
    Library,
}

impl BuildVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildVariant::Application => "application",
            BuildVariant::Library => "library",
        }
    }

    /// Short form used in layer names (`mcux/app`).
    pub fn short(&self) -> &'static str {
        match self {
            BuildVariant::Application => "app",
            BuildVariant::Library => "lib",
        }
    }

    /// Whether the serializer should emit an archive project skeleton.
    pub fn is_library(&self) -> bool {
        matches!(self, BuildVariant::Library)
    }
}

impl fmt::Display for BuildVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildVariant {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "app" | "application" => Ok(BuildVariant::Application),
            "lib" | "library" => Ok(BuildVariant::Library),
            _ => Err(ParseNameError::new("build variant", s, "application, library")),
        }
    }
}

/// Error returned when a category, variant or back-end name is not recognized.
#[derive(Debug, Clone, Error)]
#[error("invalid {kind} '{value}', valid values: {expected}")]
pub struct ParseNameError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

impl ParseNameError {
    pub fn new(kind: &'static str, value: &str, expected: &'static str) -> Self {
        ParseNameError {
            kind,
            value: value.to_string(),
            expected,
        }
    }
}

/// Name of a build target, guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TargetName(String);

impl TargetName {
    /// Validate and wrap a target name.
    pub fn new(name: impl Into<String>) -> Result<Self, ModelError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ModelError::EmptyTargetName);
        }
        Ok(TargetName(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TargetName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
