//! Flag classification engine.
//!
//! A [`Classifier`] is built for one (back end, variant) pair. Each call
//! classifies one raw flag line for one (target, category) pair: the
//! effective rule sequence of the override chain runs over the line, and
//! every token no rule recognized is deposited as an opaque flag. Nothing
//! is dropped: each input token ends up either in the source of a recorded
//! setting or in the opaque list.

pub mod layer;
pub mod matcher;
pub mod splitter;

use std::path::Path;

use miette::Diagnostic;
use thiserror::Error;

use crate::backends::{self, BackendId};
use crate::core::project::{CategoryFlags, ModelError, ProjectModel};
use crate::core::target::{BuildVariant, FlagCategory};

pub use layer::{Delegation, Layer, LayerKind};
pub use matcher::{MatchContext, Matcher};
pub use splitter::split_tokens;

/// Contract violations detected while classifying.
#[derive(Debug, Clone, Error, Diagnostic)]
pub enum ClassifyError {
    #[error(
        "project model targets {model_backend}/{model_variant} but the classifier is {backend}/{variant}"
    )]
    #[diagnostic(
        code(idegen::classify::model_mismatch),
        help("create the project model with the same back end and variant as the classifier")
    )]
    ModelMismatch {
        backend: BackendId,
        variant: BuildVariant,
        model_backend: BackendId,
        model_variant: BuildVariant,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Model(#[from] ModelError),
}

/// Knobs that feed the rule tables.
#[derive(Debug, Clone, Default)]
pub struct ClassifierOptions {
    /// Appended to the built-in system-library set used by library grouping
    pub extra_system_libraries: Vec<String>,
}

impl ClassifierOptions {
    pub fn with_extra_system_libraries(mut self, libs: impl IntoIterator<Item = String>) -> Self {
        self.extra_system_libraries.extend(libs);
        self
    }
}

/// What a classification call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified {
    /// The line was consumed
    Recorded {
        /// Settings added to the model
        settings: usize,
        /// Opaque flags added to the model
        opaque: usize,
    },
    /// The variant does not accept this category; the line is returned unconsumed
    Skipped(String),
}

impl Classified {
    pub fn is_skipped(&self) -> bool {
        matches!(self, Classified::Skipped(_))
    }
}

/// Classifier for one (back end, variant) pair.
pub struct Classifier {
    backend: BackendId,
    variant: BuildVariant,
    chain: Layer,
    source_rules: Vec<Box<dyn Matcher>>,
}

impl Classifier {
    pub fn new(backend: BackendId, variant: BuildVariant, options: &ClassifierOptions) -> Self {
        Classifier {
            backend,
            variant,
            chain: backends::build_chain(backend, variant, options),
            source_rules: backends::source_rules(backend, variant),
        }
    }

    pub fn backend(&self) -> BackendId {
        self.backend
    }

    pub fn variant(&self) -> BuildVariant {
        self.variant
    }

    /// The variant layer at the top of the override chain.
    pub fn chain(&self) -> &Layer {
        &self.chain
    }

    /// Whether the variant accepts lines of this category.
    pub fn supports(&self, category: FlagCategory) -> bool {
        self.chain.exposes(category)
    }

    /// Matcher names that run for a category, in order.
    pub fn effective_rules(&self, category: FlagCategory) -> Vec<String> {
        if !self.supports(category) {
            return Vec::new();
        }
        self.chain.effective_rules(category)
    }

    /// Classify one raw flag line into `model`.
    pub fn classify(
        &self,
        model: &mut ProjectModel,
        target: &str,
        category: FlagCategory,
        line: &str,
    ) -> Result<Classified, ClassifyError> {
        self.check_model(model)?;
        model.target(target)?;

        if !self.supports(category) {
            tracing::debug!(
                "{}/{} does not accept {}; ignoring line for `{}`",
                self.backend,
                self.variant.short(),
                category,
                target
            );
            return Ok(Classified::Skipped(line.to_string()));
        }

        let flags = model.category_mut(target, category)?;
        let (settings_before, opaque_before) = (flags.settings().len(), flags.opaque_flags().len());

        let mut ctx = MatchContext::new(target, category, flags);
        let residual = self.chain.run(category, line.to_string(), &mut ctx);
        for token in split_tokens(&residual) {
            ctx.pass_through(token);
        }

        Ok(Classified::Recorded {
            settings: flags.settings().len() - settings_before,
            opaque: flags.opaque_flags().len() - opaque_before,
        })
    }

    /// Names of the per-source rules, in order.
    pub fn source_rule_names(&self) -> Vec<String> {
        self.source_rules.iter().map(|r| r.name().to_string()).collect()
    }

    /// Classify compiler flags that apply to a single source file.
    ///
    /// The back end's per-source rules run first; whatever they leave is
    /// stored as the source's opaque flags. Only application projects carry
    /// per-source flags; library variants skip the line.
    pub fn classify_source(
        &self,
        model: &mut ProjectModel,
        target: &str,
        path: &Path,
        line: &str,
    ) -> Result<Classified, ClassifyError> {
        self.check_model(model)?;
        model.target(target)?;

        if self.variant.is_library() {
            tracing::debug!(
                "{}/{} has no per-source flags; ignoring {}",
                self.backend,
                self.variant.short(),
                path.display()
            );
            return Ok(Classified::Skipped(line.to_string()));
        }

        let mut flags = CategoryFlags::default();
        let source = path.display().to_string();
        let mut ctx = MatchContext::new(&source, FlagCategory::CCompiler, &mut flags);
        let residual = self
            .source_rules
            .iter()
            .fold(line.to_string(), |line, rule| rule.apply(line, &mut ctx));
        for token in split_tokens(&residual) {
            ctx.pass_through(token);
        }

        let (settings, opaque) = (flags.settings().len(), flags.opaque_flags().len());
        model.add_source_settings(target, path, flags.settings().iter().cloned())?;
        model.add_source_flags(target, path, flags.opaque_flags().iter().cloned())?;
        Ok(Classified::Recorded { settings, opaque })
    }

    fn check_model(&self, model: &ProjectModel) -> Result<(), ClassifyError> {
        if model.backend() != self.backend || model.variant() != self.variant {
            return Err(ClassifyError::ModelMismatch {
                backend: self.backend,
                variant: self.variant,
                model_backend: model.backend(),
                model_variant: model.variant(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::setting::SettingValue;
    use crate::core::target::TargetName;

    fn setup(backend: BackendId, variant: BuildVariant) -> (Classifier, ProjectModel) {
        let classifier = Classifier::new(backend, variant, &ClassifierOptions::default());
        let model = ProjectModel::new(
            "demo",
            backend,
            variant,
            [TargetName::new("debug").unwrap(), TargetName::new("release").unwrap()],
        )
        .unwrap();
        (classifier, model)
    }

    #[test]
    fn test_cmake_plain_pass_through() {
        let (c, mut m) = setup(BackendId::CMake, BuildVariant::Application);
        let outcome = c
            .classify(&mut m, "debug", FlagCategory::CCompiler, "-O2 -Wall -DMY_MACRO=1")
            .unwrap();
        assert_eq!(
            outcome,
            Classified::Recorded {
                settings: 0,
                opaque: 3
            }
        );
        assert!(m.settings("debug", FlagCategory::CCompiler).unwrap().is_empty());
        assert_eq!(
            m.opaque_flags("debug", FlagCategory::CCompiler).unwrap(),
            &["-O2", "-Wall", "-DMY_MACRO=1"]
        );
    }

    #[test]
    fn test_recognized_optimization() {
        let (c, mut m) = setup(BackendId::Mdk, BuildVariant::Application);
        c.classify(&mut m, "debug", FlagCategory::CCompiler, "-O2 -DFOO")
            .unwrap();
        let opt = m
            .setting("debug", FlagCategory::CCompiler, "optimization", "level")
            .unwrap()
            .unwrap();
        assert_eq!(opt.value, SettingValue::text("2"));
        assert_eq!(m.opaque_flags("debug", FlagCategory::CCompiler).unwrap(), &["-DFOO"]);
    }

    #[test]
    fn test_cmake_library_grouping_leaves_empty_residual() {
        let (c, mut m) = setup(BackendId::CMake, BuildVariant::Application);
        c.classify(
            &mut m,
            "debug",
            FlagCategory::Linker,
            "-Wl,--start-group -lm -lfoo -lc -Wl,--end-group",
        )
        .unwrap();
        assert!(m.opaque_flags("debug", FlagCategory::Linker).unwrap().is_empty());
        let system = m
            .setting("debug", FlagCategory::Linker, "libraries", "system")
            .unwrap()
            .unwrap();
        assert_eq!(system.value, SettingValue::list(["-lm", "-lc"]));
        let user = m
            .setting("debug", FlagCategory::Linker, "libraries", "user")
            .unwrap()
            .unwrap();
        assert_eq!(user.value, SettingValue::list(["-lfoo"]));
    }

    #[test]
    fn test_variant_gating() {
        let (app, mut app_model) = setup(BackendId::Mcux, BuildVariant::Application);
        let outcome = app
            .classify(&mut app_model, "debug", FlagCategory::Archiver, "-r -c")
            .unwrap();
        assert_eq!(outcome, Classified::Skipped("-r -c".to_string()));
        assert!(app_model.target("debug").unwrap().category(FlagCategory::Archiver).is_none());

        let (lib, mut lib_model) = setup(BackendId::Mcux, BuildVariant::Library);
        lib.classify(&mut lib_model, "debug", FlagCategory::Archiver, "-r -c")
            .unwrap();
        let ar = lib_model.settings("debug", FlagCategory::Archiver).unwrap();
        assert_eq!(ar.len(), 1);
        assert_eq!(ar[0].value, SettingValue::text("-r -c"));
        assert!(lib_model.settings("release", FlagCategory::Archiver).unwrap().is_empty());
        assert!(lib_model.settings("debug", FlagCategory::Linker).unwrap().is_empty());
    }

    #[test]
    fn test_contract_violations() {
        let (c, mut m) = setup(BackendId::Iar, BuildVariant::Application);
        assert!(matches!(
            c.classify(&mut m, "", FlagCategory::CCompiler, "-On"),
            Err(ClassifyError::Model(ModelError::EmptyTargetName))
        ));
        assert!(matches!(
            c.classify(&mut m, "profile", FlagCategory::CCompiler, "-On"),
            Err(ClassifyError::Model(ModelError::UnknownTarget(_)))
        ));

        let (_, mut other) = setup(BackendId::Mdk, BuildVariant::Application);
        assert!(matches!(
            c.classify(&mut other, "debug", FlagCategory::CCompiler, "-On"),
            Err(ClassifyError::ModelMismatch { .. })
        ));
    }

    #[test]
    fn test_unexposed_category_still_checks_target() {
        let (c, mut m) = setup(BackendId::CMake, BuildVariant::Application);
        assert!(c
            .classify(&mut m, "profile", FlagCategory::Archiver, "-r")
            .is_err());
    }

    #[test]
    fn test_empty_line_records_nothing() {
        let (c, mut m) = setup(BackendId::Mcux, BuildVariant::Application);
        let outcome = c.classify(&mut m, "debug", FlagCategory::CCompiler, "").unwrap();
        assert_eq!(
            outcome,
            Classified::Recorded {
                settings: 0,
                opaque: 0
            }
        );
    }

    #[test]
    fn test_source_flags_only_for_applications() {
        let (app, mut m) = setup(BackendId::CMake, BuildVariant::Application);
        app.classify_source(&mut m, "debug", Path::new("src/main.c"), "-O0 -g3")
            .unwrap();
        assert_eq!(m.target("debug").unwrap().sources()[0].flags, vec!["-O0", "-g3"]);

        let (lib, mut lm) = setup(BackendId::CMake, BuildVariant::Library);
        let outcome = lib
            .classify_source(&mut lm, "debug", Path::new("src/main.c"), "-O0")
            .unwrap();
        assert!(outcome.is_skipped());
        assert!(lm.target("debug").unwrap().sources().is_empty());
    }

    #[test]
    fn test_iar_source_rules_recognize_optimization() {
        let (c, mut m) = setup(BackendId::Iar, BuildVariant::Application);
        let outcome = c
            .classify_source(
                &mut m,
                "debug",
                Path::new("src/fast.c"),
                "-Ol -Oh --no_size_constraints -Ohs -Sspeed --no_inline",
            )
            .unwrap();
        assert_eq!(
            outcome,
            Classified::Recorded {
                settings: 4,
                opaque: 1
            }
        );

        let source = &m.target("debug").unwrap().sources()[0];
        let level = source.last_setting("optimization", "level").unwrap();
        assert_eq!(level.value, SettingValue::text("high"));
        assert_eq!(level.source, vec!["-Ol", "-Oh"]);
        assert_eq!(
            source.last_setting("optimization", "strategy").unwrap().value,
            SettingValue::text("speed")
        );
        assert_eq!(
            source.last_setting("optimization", "tradeoff").unwrap().value,
            SettingValue::text("speed")
        );
        assert!(source.last_setting("optimization", "no_size_constraints").is_some());
        assert_eq!(source.flags, vec!["--no_inline"]);
    }

    #[test]
    fn test_mdk_source_rules_recognize_suppress_and_standard() {
        let (c, mut m) = setup(BackendId::Mdk, BuildVariant::Application);
        c.classify_source(
            &mut m,
            "debug",
            Path::new("src/legacy.c"),
            "-O1 --diag_suppress=66 --diag_suppress=1296 --library_interface=armcc --cpp -DLEGACY",
        )
        .unwrap();

        let source = &m.target("debug").unwrap().sources()[0];
        assert_eq!(
            source.last_setting("optimization", "level").unwrap().value,
            SettingValue::text("1")
        );
        assert_eq!(
            source.last_setting("diagnostics", "suppress").unwrap().value,
            SettingValue::list(["66", "1296"])
        );
        assert_eq!(
            source.last_setting("language", "library_interface").unwrap().value,
            SettingValue::text("armcc")
        );
        assert_eq!(
            source.last_setting("language", "standard").unwrap().value,
            SettingValue::text("--cpp")
        );
        assert_eq!(source.flags, vec!["-DLEGACY"]);
        assert_eq!(
            c.source_rule_names(),
            [
                "optimization.level",
                "diagnostics.suppress",
                "language.library_interface",
                "language.standard"
            ]
        );
    }

    #[test]
    fn test_source_rules_only_where_defined() {
        for backend in [BackendId::CMake, BackendId::CodeWarrior, BackendId::Mcux] {
            let (c, _) = setup(backend, BuildVariant::Application);
            assert!(c.source_rule_names().is_empty(), "{}", backend);
        }
        let (lib, _) = setup(BackendId::Iar, BuildVariant::Library);
        assert!(lib.source_rule_names().is_empty());
    }

    #[test]
    fn test_backend_isolation() {
        // The same line means different things to different back ends.
        let line = "-mcpu=cortex-m4 -O2";
        let (mcux, mut mm) = setup(BackendId::Mcux, BuildVariant::Application);
        let (cmake, mut cm) = setup(BackendId::CMake, BuildVariant::Application);
        mcux.classify(&mut mm, "debug", FlagCategory::CCompiler, line).unwrap();
        cmake.classify(&mut cm, "debug", FlagCategory::CCompiler, line).unwrap();

        assert!(mm
            .setting("debug", FlagCategory::CCompiler, "architecture", "core")
            .unwrap()
            .is_some());
        assert!(cm.settings("debug", FlagCategory::CCompiler).unwrap().is_empty());
        assert_eq!(cm.opaque_flags("debug", FlagCategory::CCompiler).unwrap().len(), 2);
    }
}
