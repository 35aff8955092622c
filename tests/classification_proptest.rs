//! Property-based tests for flag classification.
//!
//! Lines are assembled from a vocabulary mixing flags every back end
//! recognizes with tokens none of them know, so each property runs against
//! recognized settings and pass-through at once.

use idegen::backends::BackendId;
use idegen::classify::matcher::{token, CatchAll, Choice, LibraryGroup, MatchContext, Matcher, Switch};
use idegen::classify::{split_tokens, Classifier, ClassifierOptions};
use idegen::core::{BuildVariant, CategoryFlags, FlagCategory, ProjectModel, TargetName};
use proptest::prelude::*;

const VOCABULARY: &[&str] = &[
    // generic / pass-through
    "-DFOO",
    "-DBAR=1",
    "-Iinclude",
    "-c",
    "-T",
    "link.ld",
    "main",
    // library groups
    "-Wl,--start-group",
    "-Wl,--end-group",
    "-lm",
    "-lc",
    "-lfoo",
    // gcc style
    "-O0",
    "-O2",
    "-Os",
    "-Oz",
    "-g",
    "-g3",
    "-w",
    "-W",
    "-Wall",
    "-Werror",
    "-mcpu=cortex-m4",
    "-mcpu=cortex-m99",
    "-mfpu=fpv4-sp-d16",
    "-mfloat-abi=hard",
    "-mfloat-abi=soft",
    "-std=gnu99",
    "-std=c++14",
    "-fno-common",
    "-flto",
    "-fno-rtti",
    "-nostdlib",
    "-u",
    "-Xlinker",
    "--gc-sections",
    "--defsym=__heap_size__=1024",
    "-secure",
    "${workspace_loc:/lib/libx.a}",
    "{misc_flags_start}-a{misc_flags_end}",
    "-x",
    "assembler-with-cpp",
    // IAR
    "--cpu=Cortex-M4",
    "-On",
    "-Oh",
    "-Ohs",
    "--diag_suppress",
    "Pa050",
    "--entry",
    "--redirect",
    "_Printf=_PrintfTiny",
    "-f",
    "-s+",
    "-S",
    "--silent",
    // MDK
    "--info",
    "sizes",
    "--keep",
    "--map",
    // CodeWarrior
    "-opt",
    "level=2",
    "-data",
    "24",
    "-hprog",
    "-v4",
    "-l\\\"rt.lib\\\"",
    "-main",
];

fn line_strategy() -> impl Strategy<Value = Vec<&'static str>> {
    prop::collection::vec(prop::sample::select(VOCABULARY.to_vec()), 0..24)
}

fn variants() -> [BuildVariant; 2] {
    [BuildVariant::Application, BuildVariant::Library]
}

fn model(backend: BackendId, variant: BuildVariant) -> ProjectModel {
    ProjectModel::new("prop", backend, variant, [TargetName::new("debug").unwrap()]).unwrap()
}

/// Every token recorded for a category: setting sources plus opaque flags.
fn accounted_tokens(model: &ProjectModel, category: FlagCategory) -> Vec<String> {
    let mut tokens: Vec<String> = model
        .settings("debug", category)
        .unwrap()
        .iter()
        .flat_map(|s| s.source.iter().cloned())
        .collect();
    tokens.extend(model.opaque_flags("debug", category).unwrap().iter().cloned());
    tokens.sort();
    tokens
}

proptest! {
    #[test]
    fn every_token_is_accounted_for(tokens in line_strategy(), separator in "[ ]{1,3}") {
        let line = tokens.join(separator.as_str());
        let mut expected: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
        expected.sort();

        for backend in BackendId::ALL {
            for variant in variants() {
                let classifier = Classifier::new(backend, variant, &ClassifierOptions::default());
                for category in FlagCategory::ALL {
                    let mut m = model(backend, variant);
                    classifier.classify(&mut m, "debug", category, &line).unwrap();

                    let actual = accounted_tokens(&m, category);
                    if classifier.supports(category) {
                        prop_assert_eq!(&actual, &expected, "{}/{} {}", backend, variant, category);
                    } else {
                        prop_assert!(actual.is_empty());
                    }
                }
            }
        }
    }

    #[test]
    fn pass_through_preserves_order_across_calls(
        first in line_strategy(),
        second in line_strategy(),
    ) {
        let classifier = Classifier::new(
            BackendId::CMake,
            BuildVariant::Application,
            &ClassifierOptions::default(),
        );
        let mut m = model(BackendId::CMake, BuildVariant::Application);
        let (first, second) = (first.join(" "), second.join(" "));
        classifier.classify(&mut m, "debug", FlagCategory::CCompiler, &first).unwrap();
        classifier.classify(&mut m, "debug", FlagCategory::CCompiler, &second).unwrap();

        let expected: Vec<&str> = split_tokens(&first)
            .into_iter()
            .chain(split_tokens(&second))
            .collect();
        prop_assert_eq!(m.opaque_flags("debug", FlagCategory::CCompiler).unwrap(), expected.as_slice());
    }

    #[test]
    fn matchers_leave_nothing_for_a_second_pass(tokens in line_strategy()) {
        const LEVELS: &[(&str, &str)] = &[("0", "none"), ("2", "more")];
        let matchers: Vec<Box<dyn Matcher>> = vec![
            Switch::new("warnings", "all", token("-Wall")).boxed(),
            Choice::new("optimization", "level", token(r"-O(\w+)")).table(LEVELS).boxed(),
            Choice::new("linker", "undefined", token(r"-u\s+(\S+)")).repeated().boxed(),
            LibraryGroup::new(&[]).boxed(),
            CatchAll::new("misc", "other").boxed(),
        ];

        for matcher in &matchers {
            let mut flags = CategoryFlags::default();
            let mut ctx = MatchContext::new("debug", FlagCategory::CCompiler, &mut flags);
            let residual = matcher.apply(tokens.join(" "), &mut ctx);
            let again = matcher.apply(residual.clone(), &mut ctx);
            prop_assert_eq!(split_tokens(&again), split_tokens(&residual), "{}", matcher.name());

            let recorded = flags.settings().len();
            let mut flags_again = CategoryFlags::default();
            let mut ctx = MatchContext::new("debug", FlagCategory::CCompiler, &mut flags_again);
            matcher.apply(residual, &mut ctx);
            prop_assert!(flags_again.settings().is_empty(), "{} recorded {} then more", matcher.name(), recorded);
        }
    }
}

#[test]
fn library_grouping_example() {
    let classifier = Classifier::new(
        BackendId::CMake,
        BuildVariant::Application,
        &ClassifierOptions::default(),
    );
    let mut m = model(BackendId::CMake, BuildVariant::Application);
    classifier
        .classify(
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
    assert_eq!(system.value.as_list().unwrap(), ["-lm", "-lc"]);
}
