//! Configuration file support for idegen.
//!
//! idegen reads two configuration file locations:
//! - Global: `~/.idegen/config.toml` - User-wide defaults
//! - Project: `.idegen/config.toml` next to the flag description
//!
//! Project config takes precedence over global config.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::classify::ClassifierOptions;

/// idegen configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Classification settings
    pub classify: ClassifyConfig,

    /// Output settings
    pub output: OutputConfig,
}

/// Classification-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifyConfig {
    /// Libraries treated as system libraries when splitting link groups
    pub extra_system_libraries: Vec<String>,
}

/// Output-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output directory, relative to the flag description
    pub dir: Option<PathBuf>,

    /// Pretty-print JSON project files (default: true)
    pub pretty: Option<bool>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if !other.classify.extra_system_libraries.is_empty() {
            self.classify.extra_system_libraries = other.classify.extra_system_libraries;
        }

        if other.output.dir.is_some() {
            self.output.dir = other.output.dir;
        }
        if other.output.pretty.is_some() {
            self.output.pretty = other.output.pretty;
        }
    }

    /// Options handed to every classifier of a run.
    pub fn classifier_options(&self) -> ClassifierOptions {
        ClassifierOptions::default()
            .with_extra_system_libraries(self.classify.extra_system_libraries.iter().cloned())
    }

    pub fn pretty(&self) -> bool {
        self.output.pretty.unwrap_or(true)
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.idegen/config.toml)
/// 2. Global config (~/.idegen/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    if global_path.exists() {
        let global = Config::load_or_default(global_path);
        config.merge(global);
    }

    if project_path.exists() {
        let project = Config::load_or_default(project_path);
        config.merge(project);
    }

    config
}

/// Get the global idegen config directory (~/.idegen).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".idegen"))
}

/// Get the global config path (~/.idegen/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.idegen/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".idegen").join("config.toml")
}

/// Load the configuration that applies to a flag description directory.
pub fn load_for_project(project_root: &Path) -> Config {
    let project = project_config_path(project_root);
    match global_config_path() {
        Some(global) => load_config(&global, &project),
        None => load_config(Path::new(""), &project),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.classify.extra_system_libraries.is_empty());
        assert!(config.output.dir.is_none());
        assert!(config.pretty());
    }

    #[test]
    fn test_config_load() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");

        std::fs::write(
            &config_path,
            r#"
[classify]
extra_system_libraries = ["-lmylibc", "-lsemihost"]

[output]
dir = "generated"
pretty = false
"#,
        )
        .unwrap();

        let config = Config::load(&config_path).unwrap();
        assert_eq!(
            config.classify.extra_system_libraries,
            vec!["-lmylibc", "-lsemihost"]
        );
        assert_eq!(config.output.dir, Some(PathBuf::from("generated")));
        assert!(!config.pretty());
        assert_eq!(
            config.classifier_options().extra_system_libraries,
            vec!["-lmylibc", "-lsemihost"]
        );
    }

    #[test]
    fn test_config_merge() {
        let mut base = Config::default();
        base.output.dir = Some(PathBuf::from("out"));
        base.output.pretty = Some(false);

        let mut override_cfg = Config::default();
        override_cfg.output.dir = Some(PathBuf::from("build/ide"));

        base.merge(override_cfg);

        assert_eq!(base.output.dir, Some(PathBuf::from("build/ide")));
        assert_eq!(base.output.pretty, Some(false)); // Not overridden
    }

    #[test]
    fn test_unreadable_config_falls_back() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(&config_path, "[output\npretty = ").unwrap();

        let config = Config::load_or_default(&config_path);
        assert!(config.output.dir.is_none());
        assert!(config.pretty());
    }

    #[test]
    fn test_load_config_precedence() {
        let tmp = TempDir::new().unwrap();
        let global_path = tmp.path().join("global.toml");
        let project_path = tmp.path().join("project.toml");

        std::fs::write(
            &global_path,
            r#"
[classify]
extra_system_libraries = ["-lglobal"]

[output]
dir = "global-out"
"#,
        )
        .unwrap();

        std::fs::write(
            &project_path,
            r#"
[output]
dir = "project-out"
"#,
        )
        .unwrap();

        let config = load_config(&global_path, &project_path);

        assert_eq!(config.output.dir, Some(PathBuf::from("project-out")));
        assert_eq!(config.classify.extra_system_libraries, vec!["-lglobal"]);
    }
}
