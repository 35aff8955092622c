//! CodeWarrior for DSC rules.
//!
//! Covers the 56800/E memory models, pipeline padding, the v4 ELF variant
//! and the handful of language switches the DSC compiler understands.

use crate::backends::{variant_name, BackendId, APPLICATION_CATEGORIES};
use crate::classify::matcher::{token, Choice, Matcher, Switch};
use crate::classify::Layer;
use crate::core::setting::SettingValue;
use crate::core::target::{BuildVariant, FlagCategory};

const PROGRAM_MODELS: &[(&str, &str)] = &[("sprog", "small"), ("hprog", "huge")];

const LIBRARY_CATEGORIES: &[FlagCategory] = &[
    FlagCategory::Assembler,
    FlagCategory::CCompiler,
    FlagCategory::CxxCompiler,
    FlagCategory::Linker,
    FlagCategory::Archiver,
];

fn assembler_rules() -> Vec<Box<dyn Matcher>> {
    vec![
        Switch::new("general", "no_system_paths", token("-nosyspath")).boxed(),
        Choice::new("general", "data_memory_model", token(r"-data\s+(\d+)")).boxed(),
        Choice::new("general", "program_memory_model", token(r"-prog\s+(\d+)")).boxed(),
        Switch::new("general", "pad_pipeline", token("-nodebug_workaround"))
            .with_value(SettingValue::Switch(false))
            .boxed(),
        Switch::new("general", "hawk_elf", token("-v4")).boxed(),
    ]
}

fn compiler_rules() -> Vec<Box<dyn Matcher>> {
    vec![
        Choice::new("optimization", "level", token(r"-opt\s+level=([1-4])")).boxed(),
        Choice::new("processor", "program_model", token(r"-(sprog|hprog)"))
            .table(PROGRAM_MODELS)
            .boxed(),
        Switch::new("processor", "large_data_model", token("-ldata")).boxed(),
        Switch::new("processor", "pad_pipeline", token("-nopadpipe"))
            .with_value(SettingValue::Switch(false))
            .boxed(),
        Switch::new("processor", "globals_in_lower_memory", token("-globalsInLowerMemory")).boxed(),
        Switch::new("processor", "hawk_elf", token("-v4")).boxed(),
        Switch::new("language", "c99", token(r"-lang\s+c99")).boxed(),
        Switch::new("language", "require_prototypes", token("-requireprotos")).boxed(),
    ]
}

fn linker_rules() -> Vec<Box<dyn Matcher>> {
    vec![
        Switch::new("general", "no_stdlib", token("-nostdlib")).boxed(),
        Switch::new("general", "generate_map", token("-map")).boxed(),
        Switch::new("general", "large_data_model", token("-ldata")).boxed(),
        Switch::new("general", "hawk_elf", token("-v4")).boxed(),
        Choice::new("input", "additional_libraries", token(r"-l(\S+)"))
            .transform(library_name)
            .repeated()
            .boxed(),
    ]
}

/// Strip escaped quotes; quote names that start with a build variable.
fn library_name(raw: &str) -> String {
    let lib = raw.replace("\\\"", "");
    let var_prefixed = lib
        .strip_prefix("${")
        .and_then(|rest| rest.find('}').map(|end| end > 0 && end + 1 < rest.len()))
        .unwrap_or(false);
    if var_prefixed {
        format!("\"{}\"", lib)
    } else {
        lib
    }
}

pub(super) fn chain(variant: BuildVariant) -> Layer {
    let family = Layer::family("codewarrior/common")
        .rules(FlagCategory::Assembler, assembler_rules())
        .rules(FlagCategory::CCompiler, compiler_rules())
        .rules(FlagCategory::Linker, linker_rules());
    let backend = Layer::backend(BackendId::CodeWarrior.as_str(), family);

    let name = variant_name(BackendId::CodeWarrior, variant);
    match variant {
        BuildVariant::Application => Layer::variant(name, backend)
            .before_parent(
                FlagCategory::Linker,
                vec![Choice::new("general", "entry_point", token(r"-main\s+(\S+)")).boxed()],
            )
            .expose(APPLICATION_CATEGORIES),
        BuildVariant::Library => Layer::variant(name, backend).expose(LIBRARY_CATEGORIES),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{Classifier, ClassifierOptions};
    use crate::core::project::ProjectModel;
    use crate::core::target::TargetName;

    fn classify(variant: BuildVariant, category: FlagCategory, line: &str) -> ProjectModel {
        let classifier = Classifier::new(BackendId::CodeWarrior, variant, &ClassifierOptions::default());
        let mut model = ProjectModel::new(
            "dsc",
            BackendId::CodeWarrior,
            variant,
            [TargetName::new("debug").unwrap()],
        )
        .unwrap();
        classifier.classify(&mut model, "debug", category, line).unwrap();
        model
    }

    fn text(model: &ProjectModel, category: FlagCategory, group: &str, key: &str) -> Option<SettingValue> {
        model
            .setting("debug", category, group, key)
            .unwrap()
            .map(|s| s.value.clone())
    }

    #[test]
    fn test_compiler_memory_models() {
        let m = classify(
            BuildVariant::Library,
            FlagCategory::CCompiler,
            "-opt level=4 -hprog -ldata -nopadpipe -lang c99 -DDEBUG",
        );
        let cc = FlagCategory::CCompiler;
        assert_eq!(text(&m, cc, "optimization", "level"), Some(SettingValue::text("4")));
        assert_eq!(text(&m, cc, "processor", "program_model"), Some(SettingValue::text("huge")));
        assert_eq!(text(&m, cc, "processor", "large_data_model"), Some(SettingValue::Switch(true)));
        assert_eq!(text(&m, cc, "processor", "pad_pipeline"), Some(SettingValue::Switch(false)));
        assert_eq!(text(&m, cc, "language", "c99"), Some(SettingValue::Switch(true)));
        assert_eq!(m.opaque_flags("debug", cc).unwrap(), &["-DDEBUG"]);
    }

    #[test]
    fn test_assembler_models() {
        let m = classify(
            BuildVariant::Library,
            FlagCategory::Assembler,
            "-data 24 -prog 19 -v4 -nodebug_workaround",
        );
        let asm = FlagCategory::Assembler;
        assert_eq!(text(&m, asm, "general", "data_memory_model"), Some(SettingValue::text("24")));
        assert_eq!(text(&m, asm, "general", "program_memory_model"), Some(SettingValue::text("19")));
        assert!(m.opaque_flags("debug", asm).unwrap().is_empty());
    }

    #[test]
    fn test_additional_libraries() {
        let m = classify(
            BuildVariant::Library,
            FlagCategory::Linker,
            r#"-nostdlib -l\"runtime.lib\" -l${MCU_TOOLS}/lib/fp.lib -map"#,
        );
        assert_eq!(
            text(&m, FlagCategory::Linker, "input", "additional_libraries"),
            Some(SettingValue::list([
                "runtime.lib".to_string(),
                "\"${MCU_TOOLS}/lib/fp.lib\"".to_string()
            ]))
        );
        assert!(m.opaque_flags("debug", FlagCategory::Linker).unwrap().is_empty());
    }

    #[test]
    fn test_entry_point_only_in_application() {
        let app = classify(BuildVariant::Application, FlagCategory::Linker, "-main F_EntryPoint");
        assert_eq!(
            text(&app, FlagCategory::Linker, "general", "entry_point"),
            Some(SettingValue::text("F_EntryPoint"))
        );

        let lib = classify(BuildVariant::Library, FlagCategory::Linker, "-main F_EntryPoint");
        assert!(text(&lib, FlagCategory::Linker, "general", "entry_point").is_none());
        assert_eq!(lib.opaque_flags("debug", FlagCategory::Linker).unwrap().len(), 2);
    }

    #[test]
    fn test_library_name_quoting() {
        assert_eq!(library_name("m"), "m");
        assert_eq!(library_name(r#"\"a b\""#), "a b");
        assert_eq!(library_name("${ROOT}/x.lib"), "\"${ROOT}/x.lib\"");
        assert_eq!(library_name("${ROOT}"), "${ROOT}");
    }
}
