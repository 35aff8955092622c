//! In-memory project model populated by the classification pipeline.
//!
//! One model is created per generation run. It maps every target to the
//! settings and opaque flags recognized for each flag category. Entries are
//! only ever appended: classifying a second line for the same target and
//! category adds to what is already there.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

use crate::backends::BackendId;
use crate::core::setting::Setting;
use crate::core::target::{BuildVariant, FlagCategory, TargetName};

/// Contract violations detected by the model.
#[derive(Debug, Clone, Error, Diagnostic)]
pub enum ModelError {
    #[error("target name must not be empty")]
    #[diagnostic(code(idegen::model::empty_target))]
    EmptyTargetName,

    #[error("target `{0}` is not part of this project")]
    #[diagnostic(
        code(idegen::model::unknown_target),
        help("targets are fixed when the project model is created")
    )]
    UnknownTarget(String),

    #[error("target `{0}` is declared more than once")]
    #[diagnostic(code(idegen::model::duplicate_target))]
    DuplicateTarget(String),
}

/// Settings and opaque flags of one category for one target.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CategoryFlags {
    settings: Vec<Setting>,
    opaque: Vec<String>,
}

impl CategoryFlags {
    pub fn settings(&self) -> &[Setting] {
        &self.settings
    }

    pub fn opaque_flags(&self) -> &[String] {
        &self.opaque
    }

    pub fn push_setting(&mut self, setting: Setting) {
        self.settings.push(setting);
    }

    pub fn push_opaque(&mut self, token: impl Into<String>) {
        self.opaque.push(token.into());
    }

    /// Last value recorded for `group.key`.
    pub fn last_setting(&self, group: &str, key: &str) -> Option<&Setting> {
        self.settings.iter().rev().find(|s| s.is(group, key))
    }

    pub fn is_empty(&self) -> bool {
        self.settings.is_empty() && self.opaque.is_empty()
    }
}

/// Compiler flags attached to a single source file.
#[derive(Debug, Clone, Serialize)]
pub struct SourceFlags {
    pub path: PathBuf,
    /// Settings recognized by the back end's per-source rules
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub settings: Vec<Setting>,
    /// Tokens no per-source rule recognized
    pub flags: Vec<String>,
}

impl SourceFlags {
    /// Last value recorded for `group.key`.
    pub fn last_setting(&self, group: &str, key: &str) -> Option<&Setting> {
        self.settings.iter().rev().find(|s| s.is(group, key))
    }
}

/// Everything recorded for one target.
#[derive(Debug, Clone, Serialize)]
pub struct TargetFlags {
    name: TargetName,
    categories: BTreeMap<FlagCategory, CategoryFlags>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sources: Vec<SourceFlags>,
}

impl TargetFlags {
    fn new(name: TargetName) -> Self {
        TargetFlags {
            name,
            categories: BTreeMap::new(),
            sources: Vec::new(),
        }
    }

    pub fn name(&self) -> &TargetName {
        &self.name
    }

    /// Flags for one category; `None` if nothing was ever classified there.
    pub fn category(&self, category: FlagCategory) -> Option<&CategoryFlags> {
        self.categories.get(&category)
    }

    pub fn categories(&self) -> impl Iterator<Item = (FlagCategory, &CategoryFlags)> + '_ {
        self.categories.iter().map(|(c, f)| (*c, f))
    }

    pub fn sources(&self) -> &[SourceFlags] {
        &self.sources
    }

    fn category_mut(&mut self, category: FlagCategory) -> &mut CategoryFlags {
        self.categories.entry(category).or_default()
    }

    fn source_mut(&mut self, path: &Path) -> &mut SourceFlags {
        // Sources keep first-seen order.
        match self.sources.iter().position(|s| s.path == path) {
            Some(index) => &mut self.sources[index],
            None => {
                self.sources.push(SourceFlags {
                    path: path.to_path_buf(),
                    settings: Vec::new(),
                    flags: Vec::new(),
                });
                let last = self.sources.len() - 1;
                &mut self.sources[last]
            }
        }
    }
}

/// The target-keyed accumulation of classified flags for one generation run.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectModel {
    name: String,
    backend: BackendId,
    variant: BuildVariant,
    targets: Vec<TargetFlags>,
}

impl ProjectModel {
    /// Create a model with a fixed set of targets.
    pub fn new(
        name: impl Into<String>,
        backend: BackendId,
        variant: BuildVariant,
        targets: impl IntoIterator<Item = TargetName>,
    ) -> Result<Self, ModelError> {
        let mut model = ProjectModel {
            name: name.into(),
            backend,
            variant,
            targets: Vec::new(),
        };

        for target in targets {
            if model.targets.iter().any(|t| t.name == target) {
                return Err(ModelError::DuplicateTarget(target.to_string()));
            }
            model.targets.push(TargetFlags::new(target));
        }

        Ok(model)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn backend(&self) -> BackendId {
        self.backend
    }

    pub fn variant(&self) -> BuildVariant {
        self.variant
    }

    /// Whether the serializer should produce an archive project.
    pub fn is_library(&self) -> bool {
        self.variant.is_library()
    }

    pub fn targets(&self) -> impl Iterator<Item = &TargetFlags> + '_ {
        self.targets.iter()
    }

    pub fn target(&self, name: &str) -> Result<&TargetFlags, ModelError> {
        self.targets
            .iter()
            .find(|t| t.name.as_str() == name)
            .ok_or_else(|| unknown_target(name))
    }

    fn target_mut(&mut self, name: &str) -> Result<&mut TargetFlags, ModelError> {
        self.targets
            .iter_mut()
            .find(|t| t.name.as_str() == name)
            .ok_or_else(|| unknown_target(name))
    }

    /// Mutable access to one (target, category) record.
    pub fn category_mut(
        &mut self,
        target: &str,
        category: FlagCategory,
    ) -> Result<&mut CategoryFlags, ModelError> {
        Ok(self.target_mut(target)?.category_mut(category))
    }

    pub fn add_setting(
        &mut self,
        target: &str,
        category: FlagCategory,
        setting: Setting,
    ) -> Result<(), ModelError> {
        self.category_mut(target, category)?.push_setting(setting);
        Ok(())
    }

    pub fn add_opaque(
        &mut self,
        target: &str,
        category: FlagCategory,
        token: impl Into<String>,
    ) -> Result<(), ModelError> {
        self.category_mut(target, category)?.push_opaque(token);
        Ok(())
    }

    /// Append compiler flags for a single source file.
    pub fn add_source_flags(
        &mut self,
        target: &str,
        path: &Path,
        tokens: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<(), ModelError> {
        let source = self.target_mut(target)?.source_mut(path);
        source.flags.extend(tokens.into_iter().map(Into::into));
        Ok(())
    }

    /// Record settings recognized in a source file's flag line.
    pub fn add_source_settings(
        &mut self,
        target: &str,
        path: &Path,
        settings: impl IntoIterator<Item = Setting>,
    ) -> Result<(), ModelError> {
        let source = self.target_mut(target)?.source_mut(path);
        source.settings.extend(settings);
        Ok(())
    }

    /// All settings recorded for a target and category, in recognition order.
    pub fn settings(&self, target: &str, category: FlagCategory) -> Result<&[Setting], ModelError> {
        Ok(self
            .target(target)?
            .category(category)
            .map(|c| c.settings())
            .unwrap_or(&[]))
    }

    /// All opaque flags recorded for a target and category, in input order.
    pub fn opaque_flags(
        &self,
        target: &str,
        category: FlagCategory,
    ) -> Result<&[String], ModelError> {
        Ok(self
            .target(target)?
            .category(category)
            .map(|c| c.opaque_flags())
            .unwrap_or(&[]))
    }

    /// Last-wins lookup for formats that only hold a single value per key.
    pub fn setting(
        &self,
        target: &str,
        category: FlagCategory,
        group: &str,
        key: &str,
    ) -> Result<Option<&Setting>, ModelError> {
        Ok(self
            .target(target)?
            .category(category)
            .and_then(|c| c.last_setting(group, key)))
    }
}

fn unknown_target(name: &str) -> ModelError {
    if name.trim().is_empty() {
        ModelError::EmptyTargetName
    } else {
        ModelError::UnknownTarget(name.to_string())
    }
}
