//! Implementation of `idegen generate`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::backends::BackendId;
use crate::classify::{Classified, Classifier};
use crate::core::manifest::FlagDescription;
use crate::core::project::ProjectModel;
use crate::core::target::{BuildVariant, FlagCategory};
use crate::ops::writer::ProjectWriter;
use crate::util::config::Config;
use crate::util::diagnostic::suggestions;

/// Options for a generation run.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Back end; overrides the description's `[project] backend`
    pub backend: Option<BackendId>,

    /// Build variant; overrides the description's `[project] variant`
    pub variant: Option<BuildVariant>,

    /// Output directory; overrides `[output] dir` from the config
    pub out_dir: Option<PathBuf>,
}

/// What a generation run produced.
#[derive(Debug, Clone)]
pub struct GenerateResult {
    pub backend: BackendId,
    pub variant: BuildVariant,
    /// Recognized settings across all targets
    pub settings: usize,
    /// Opaque flags across all targets
    pub opaque: usize,
    /// Lines dropped because the variant does not accept their category
    pub skipped: usize,
    pub written: Vec<PathBuf>,
}

/// Back end and variant for a run: the CLI wins over the description.
pub fn resolve_selection(
    description: &FlagDescription,
    opts: &GenerateOptions,
) -> Result<(BackendId, BuildVariant)> {
    let backend = opts
        .backend
        .or(description.project.backend)
        .with_context(|| {
            format!(
                "no back end selected for project `{}`\n{}",
                description.project.name,
                suggestions::PICK_BACKEND
            )
        })?;
    let variant = opts
        .variant
        .or(description.project.variant)
        .unwrap_or_default();
    Ok((backend, variant))
}

/// Classify every flag line of a description into a fresh project model.
///
/// Categories run in a fixed order (asm, cc, cxx, ld, ar) for every target,
/// followed by the per-source compiler flags.
pub fn build_model(
    description: &FlagDescription,
    classifier: &Classifier,
) -> Result<(ProjectModel, Tally)> {
    let mut model = ProjectModel::new(
        description.project.name.clone(),
        classifier.backend(),
        classifier.variant(),
        description.target_names().cloned(),
    )?;
    let mut tally = Tally::default();

    for target in &description.targets {
        for category in FlagCategory::ALL {
            let Some(line) = target.line(category) else {
                continue;
            };
            let outcome = classifier
                .classify(&mut model, target.name.as_str(), category, line)
                .with_context(|| {
                    format!(
                        "failed to classify {} of target `{}`: `{}`",
                        category, target.name, line
                    )
                })?;
            tally.add(&outcome);
        }

        for (path, line) in &target.source_flags {
            let outcome = classifier
                .classify_source(&mut model, target.name.as_str(), path, line)
                .with_context(|| {
                    format!(
                        "failed to record flags of `{}` for target `{}`: `{}`",
                        path.display(),
                        target.name,
                        line
                    )
                })?;
            tally.add(&outcome);
        }
    }

    Ok((model, tally))
}

/// Counters over the classification calls of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub settings: usize,
    pub opaque: usize,
    pub skipped: usize,
}

impl Tally {
    fn add(&mut self, outcome: &Classified) {
        match outcome {
            Classified::Recorded { settings, opaque } => {
                self.settings += settings;
                self.opaque += opaque;
            }
            Classified::Skipped(_) => self.skipped += 1,
        }
    }
}

/// Run a full generation: load, classify, write.
pub fn generate(
    description_path: &Path,
    opts: &GenerateOptions,
    config: &Config,
    writer: &dyn ProjectWriter,
) -> Result<GenerateResult> {
    let description = FlagDescription::load(description_path)?;
    let (backend, variant) = resolve_selection(&description, opts)?;

    tracing::info!(
        "generating `{}` for {} ({}), {} target(s)",
        description.project.name,
        backend,
        variant,
        description.targets.len()
    );

    let classifier = Classifier::new(backend, variant, &config.classifier_options());
    let (model, tally) = build_model(&description, &classifier)?;

    let out_dir = match (&opts.out_dir, &config.output.dir) {
        (Some(dir), _) => dir.clone(),
        (None, Some(dir)) => description.description_dir.join(dir),
        (None, None) => description.description_dir.clone(),
    };

    let written = writer
        .write(&model, &out_dir)
        .with_context(|| format!("failed to write project to {}", out_dir.display()))?;

    Ok(GenerateResult {
        backend,
        variant,
        settings: tally.settings,
        opaque: tally.opaque,
        skipped: tally.skipped,
        written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ClassifierOptions;
    use crate::core::setting::SettingValue;
    use crate::ops::writer::JsonWriter;
    use tempfile::TempDir;

    const DESCRIPTION: &str = r#"
[project]
name = "hello_world"
backend = "cmake"

[[target]]
name = "debug"
ccflags = "-O0 -g3 -DDEBUG"
ldflags = "-T link.ld -Wl,--start-group -lm -lc -lboard -Wl,--end-group"
arflags = "-r -c"

[target.source-flags]
"source/hello.c" = "-O3"

[[target]]
name = "release"
ccflags = "-Os"
"#;

    fn description() -> FlagDescription {
        FlagDescription::parse(DESCRIPTION, Path::new("/work/flags.toml")).unwrap()
    }

    #[test]
    fn test_cli_selection_wins() {
        let desc = description();
        let opts = GenerateOptions {
            backend: Some(BackendId::Mcux),
            variant: Some(BuildVariant::Library),
            ..Default::default()
        };
        assert_eq!(
            resolve_selection(&desc, &opts).unwrap(),
            (BackendId::Mcux, BuildVariant::Library)
        );
        assert_eq!(
            resolve_selection(&desc, &GenerateOptions::default()).unwrap(),
            (BackendId::CMake, BuildVariant::Application)
        );
    }

    #[test]
    fn test_missing_backend_is_an_error() {
        let desc =
            FlagDescription::parse("[project]\nname = \"p\"\n", Path::new("flags.toml")).unwrap();
        let err = resolve_selection(&desc, &GenerateOptions::default()).unwrap_err();
        assert!(err.to_string().contains("no back end selected"));
    }

    #[test]
    fn test_build_model_classifies_every_target() {
        let classifier = Classifier::new(
            BackendId::CMake,
            BuildVariant::Application,
            &ClassifierOptions::default(),
        );
        let (model, tally) = build_model(&description(), &classifier).unwrap();

        assert_eq!(
            model.opaque_flags("debug", FlagCategory::CCompiler).unwrap(),
            &["-O0", "-g3", "-DDEBUG"]
        );
        assert_eq!(
            model.opaque_flags("debug", FlagCategory::Linker).unwrap(),
            &["-T", "link.ld"]
        );
        let user = model
            .setting("debug", FlagCategory::Linker, "libraries", "user")
            .unwrap()
            .unwrap();
        assert_eq!(user.value, SettingValue::list(["-lboard"]));
        assert_eq!(model.target("debug").unwrap().sources()[0].flags, vec!["-O3"]);
        assert_eq!(model.opaque_flags("release", FlagCategory::CCompiler).unwrap(), &["-Os"]);

        // The archiver line is not accepted by an application.
        assert_eq!(tally.skipped, 1);
        assert_eq!(tally.settings, 3);
        assert_eq!(tally.opaque, 3 + 2 + 1 + 1);
    }

    #[test]
    fn test_source_flags_follow_description_order() {
        let desc = FlagDescription::parse(
            r#"
[project]
name = "p"

[[target]]
name = "debug"

[target.source-flags]
"z.c" = "-O0"
"a.c" = "-O3"
"#,
            Path::new("flags.toml"),
        )
        .unwrap();
        let classifier = Classifier::new(
            BackendId::CMake,
            BuildVariant::Application,
            &ClassifierOptions::default(),
        );
        let (model, _) = build_model(&desc, &classifier).unwrap();

        let paths: Vec<_> = model
            .target("debug")
            .unwrap()
            .sources()
            .iter()
            .map(|s| s.path.clone())
            .collect();
        assert_eq!(paths, vec![PathBuf::from("z.c"), PathBuf::from("a.c")]);
    }

    #[test]
    fn test_generate_writes_json() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("flags.toml");
        std::fs::write(&path, DESCRIPTION).unwrap();

        let opts = GenerateOptions {
            out_dir: Some(tmp.path().join("out")),
            ..Default::default()
        };
        let result = generate(&path, &opts, &Config::default(), &JsonWriter::default()).unwrap();

        assert_eq!(result.backend, BackendId::CMake);
        assert_eq!(result.written, vec![tmp.path().join("out").join("hello_world.cmake.json")]);
        assert!(result.written[0].exists());
    }

    #[test]
    fn test_output_dir_from_config_is_relative_to_description() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("flags.toml");
        std::fs::write(&path, DESCRIPTION).unwrap();

        let mut config = Config::default();
        config.output.dir = Some(PathBuf::from("generated"));
        let result =
            generate(&path, &GenerateOptions::default(), &config, &JsonWriter::default()).unwrap();

        assert!(tmp.path().join("generated").join("hello_world.cmake.json").exists());
        assert_eq!(result.written.len(), 1);
    }
}
