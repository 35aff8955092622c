//! Project writers.
//!
//! A writer renders a populated [`ProjectModel`] into files. Native IDE
//! formats plug in behind [`ProjectWriter`]; the JSON writer persists the
//! whole model and is what `idegen generate` uses.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::core::project::ProjectModel;
use crate::util::fs::{ensure_dir, file_stem, write_string};

/// Renders a project model and persists it under an output directory.
pub trait ProjectWriter {
    /// Write the model; returns the paths of the files written.
    fn write(&self, model: &ProjectModel, out_dir: &Path) -> Result<Vec<PathBuf>>;
}

/// Writes `<project>.<backend>.json`.
#[derive(Debug, Clone)]
pub struct JsonWriter {
    pretty: bool,
}

impl Default for JsonWriter {
    fn default() -> Self {
        JsonWriter { pretty: true }
    }
}

#[derive(Serialize)]
struct ProjectDocument<'a> {
    generator: &'static str,
    library: bool,
    #[serde(flatten)]
    model: &'a ProjectModel,
}

impl JsonWriter {
    pub fn new(pretty: bool) -> Self {
        JsonWriter { pretty }
    }

    /// File name the model is written to.
    pub fn file_name(model: &ProjectModel) -> String {
        format!("{}.{}.json", file_stem(model.name()), model.backend())
    }

    /// Render the model without touching the filesystem.
    pub fn render(&self, model: &ProjectModel) -> Result<String> {
        let document = ProjectDocument {
            generator: concat!("idegen ", env!("CARGO_PKG_VERSION")),
            library: model.is_library(),
            model,
        };
        let mut json = if self.pretty {
            serde_json::to_string_pretty(&document)
        } else {
            serde_json::to_string(&document)
        }
        .with_context(|| format!("failed to serialize project `{}`", model.name()))?;
        json.push('\n');
        Ok(json)
    }
}

impl ProjectWriter for JsonWriter {
    fn write(&self, model: &ProjectModel, out_dir: &Path) -> Result<Vec<PathBuf>> {
        ensure_dir(out_dir)?;
        let path = out_dir.join(Self::file_name(model));
        write_string(&path, &self.render(model)?)?;
        tracing::info!("wrote {}", path.display());
        Ok(vec![path])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::BackendId;
    use crate::core::setting::{Setting, SettingValue};
    use crate::core::target::{BuildVariant, FlagCategory, TargetName};
    use tempfile::TempDir;

    fn model() -> ProjectModel {
        let mut model = ProjectModel::new(
            "hello world",
            BackendId::Iar,
            BuildVariant::Library,
            [TargetName::new("debug").unwrap()],
        )
        .unwrap();
        model
            .add_setting(
                "debug",
                FlagCategory::CCompiler,
                Setting::new("optimization", "level", SettingValue::text("none")).with_source(["-On"]),
            )
            .unwrap();
        model.add_opaque("debug", FlagCategory::CCompiler, "-DDEBUG").unwrap();
        model
    }

    #[test]
    fn test_file_name() {
        assert_eq!(JsonWriter::file_name(&model()), "hello_world.iar.json");
    }

    #[test]
    fn test_render_contains_model() {
        let json = JsonWriter::new(false).render(&model()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["name"], "hello world");
        assert_eq!(value["backend"], "iar");
        assert_eq!(value["variant"], "library");
        assert_eq!(value["library"], true);
        assert!(value["generator"].as_str().unwrap().starts_with("idegen "));
        assert_eq!(value["targets"][0]["name"], "debug");
    }

    #[test]
    fn test_write_creates_output_dir() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("generated").join("iar");

        let written = JsonWriter::default().write(&model(), &out).unwrap();

        assert_eq!(written, vec![out.join("hello_world.iar.json")]);
        let contents = std::fs::read_to_string(&written[0]).unwrap();
        assert!(contents.contains("\"-DDEBUG\""));
    }
}
