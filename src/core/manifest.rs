//! Flag description parsing.
//!
//! A flag description is the TOML file a generation run starts from. It names
//! the project, optionally picks the back end and build variant, and lists
//! the raw flag lines of every target.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::backends::BackendId;
use crate::core::target::{BuildVariant, FlagCategory, TargetName};

/// Parsed flag description.
#[derive(Debug, Clone)]
pub struct FlagDescription {
    pub project: ProjectSection,
    pub targets: Vec<TargetDescription>,
    /// Directory containing the description file
    pub description_dir: PathBuf,
}

/// The `[project]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectSection {
    pub name: String,

    /// Back end to generate for; the CLI flag takes precedence
    #[serde(default)]
    pub backend: Option<BackendId>,

    /// Build variant; the CLI flag takes precedence
    #[serde(default)]
    pub variant: Option<BuildVariant>,
}

/// One `[[target]]` entry after validation.
#[derive(Debug, Clone)]
pub struct TargetDescription {
    pub name: TargetName,
    lines: BTreeMap<FlagCategory, String>,
    /// Per-source C compiler flags in description order
    pub source_flags: Vec<(PathBuf, String)>,
}

impl TargetDescription {
    /// Raw flag line for a category, if the description has one.
    pub fn line(&self, category: FlagCategory) -> Option<&str> {
        self.lines.get(&category).map(String::as_str)
    }

    /// Per-source flag line for a path, if the description has one.
    pub fn source_line(&self, path: &Path) -> Option<&str> {
        self.source_flags
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, line)| line.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct RawDescription {
    project: ProjectSection,
    #[serde(default, rename = "target")]
    targets: Vec<RawTarget>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTarget {
    name: String,
    #[serde(default)]
    asflags: Option<String>,
    #[serde(default)]
    ccflags: Option<String>,
    #[serde(default)]
    cxflags: Option<String>,
    #[serde(default)]
    ldflags: Option<String>,
    #[serde(default)]
    arflags: Option<String>,
    /// Kept as a table so entries stay in document order
    #[serde(default, rename = "source-flags")]
    source_flags: toml::Table,
}

impl FlagDescription {
    /// Load a flag description from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read flag description: {}", path.display()))?;

        Self::parse(&content, path)
    }

    /// Parse flag description content.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let raw: RawDescription = toml::from_str(content)
            .with_context(|| format!("failed to parse flag description: {}", path.display()))?;

        if raw.project.name.trim().is_empty() {
            anyhow::bail!("project name in {} must not be empty", path.display());
        }

        let mut targets: Vec<TargetDescription> = Vec::with_capacity(raw.targets.len());
        for (index, raw_target) in raw.targets.into_iter().enumerate() {
            let name = TargetName::new(raw_target.name.clone())
                .with_context(|| format!("target #{} in {}", index + 1, path.display()))?;

            if targets.iter().any(|t| t.name == name) {
                anyhow::bail!("target `{}` is declared more than once in {}", name, path.display());
            }

            let lines = [
                (FlagCategory::Assembler, raw_target.asflags),
                (FlagCategory::CCompiler, raw_target.ccflags),
                (FlagCategory::CxxCompiler, raw_target.cxflags),
                (FlagCategory::Linker, raw_target.ldflags),
                (FlagCategory::Archiver, raw_target.arflags),
            ]
            .into_iter()
            .filter_map(|(category, line)| line.map(|l| (category, l)))
            .collect();

            let source_flags = raw_target
                .source_flags
                .into_iter()
                .map(|(path, line)| match line {
                    toml::Value::String(line) => Ok((PathBuf::from(path), line)),
                    other => anyhow::bail!(
                        "source-flags entry `{}` of target `{}` must be a string, found {}",
                        path,
                        name,
                        other.type_str()
                    ),
                })
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("invalid target `{}` in {}", name, path.display()))?;

            targets.push(TargetDescription {
                name,
                lines,
                source_flags,
            });
        }

        if targets.is_empty() {
            tracing::warn!("{} declares no targets", path.display());
        }

        Ok(FlagDescription {
            project: raw.project,
            targets,
            description_dir: path.parent().unwrap_or(Path::new(".")).to_path_buf(),
        })
    }

    /// Target names in declaration order.
    pub fn target_names(&self) -> impl Iterator<Item = &TargetName> + '_ {
        self.targets.iter().map(|t| &t.name)
    }
}
