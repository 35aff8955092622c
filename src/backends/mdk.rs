//! Keil MDK rules for the armclang toolchain.

use crate::backends::{variant_name, BackendId, APPLICATION_CATEGORIES, LIBRARY_CATEGORIES};
use crate::classify::matcher::{token, token_ci, Choice, Matcher, Switch, Toggle};
use crate::classify::Layer;
use crate::core::target::{BuildVariant, FlagCategory};

const ENDIANNESS: &[(&str, &str)] = &[("little", "little"), ("big", "big")];

const WARNING_LEVELS: &[(&str, &str)] = &[
    ("w", "none"),
    ("Wall", "all"),
    ("Weverything", "everything"),
];

fn lower(value: &str) -> String {
    value.to_lowercase()
}

fn target_rules() -> Vec<Box<dyn Matcher>> {
    vec![
        Choice::new("target", "core", token_ci(r"-mcpu=(\S+)"))
            .transform(lower)
            .boxed(),
        Choice::new("target", "fpu", token_ci(r"-mfpu=(\S+)"))
            .transform(lower)
            .boxed(),
        Choice::new("target", "endian", token_ci(r"-m(little|big)-endian"))
            .table(ENDIANNESS)
            .ignore_case()
            .boxed(),
        Switch::new("target", "cmse", token_ci("-mcmse")).boxed(),
        Switch::new("output", "debug_info", token_ci("-g")).boxed(),
    ]
}

fn position_independence() -> Vec<Box<dyn Matcher>> {
    vec![
        Toggle::new("code", "ro_independent", "-fropi", "-fno-ropi").boxed(),
        Toggle::new("code", "rw_independent", "-frwpi", "-fno-rwpi").boxed(),
    ]
}

fn assembler_rules() -> Vec<Box<dyn Matcher>> {
    let mut rules = target_rules();
    rules.push(Choice::new("target", "triple", token_ci(r"--target=(\S+)")).boxed());
    rules.push(
        Switch::new("assembler", "preprocess", token(r"-x\s+assembler-with-cpp")).boxed(),
    );
    rules.extend(position_independence());
    rules
}

fn suppressed_diagnostics() -> Box<dyn Matcher> {
    Choice::new("diagnostics", "suppress", token_ci(r"--diag_suppress=(\S+)"))
        .repeated()
        .boxed()
}

fn optimization_level() -> Box<dyn Matcher> {
    Choice::new("optimization", "level", token_ci(r"-O(0|1|2|3|fast|s|z)")).boxed()
}

/// Rules the C and C++ compilers share, ahead of their language options.
fn compiler_rules() -> Vec<Box<dyn Matcher>> {
    let mut rules = target_rules();
    rules.push(Toggle::new("optimization", "link_time", "-flto", "-fno-lto").boxed());
    rules.push(optimization_level());
    rules.push(Switch::new("code", "split_sections", token_ci("-ffunction-sections")).boxed());
    rules.push(Switch::new("code", "signed_char", token_ci("-fsigned-char")).boxed());
    rules.extend(position_independence());
    rules.push(Switch::new("code", "short_enums", token_ci("-fshort-enums")).boxed());
    rules.push(Switch::new("code", "short_wchar", token_ci("-fshort-wchar")).boxed());
    rules
}

fn warning_rules() -> [Box<dyn Matcher>; 2] {
    [
        Choice::new("warnings", "level", token(r"-(w|Wall|Weverything)"))
            .table(WARNING_LEVELS)
            .boxed(),
        Switch::new("warnings", "as_errors", token_ci("-Werror")).boxed(),
    ]
}

fn c_compiler_rules() -> Vec<Box<dyn Matcher>> {
    let mut rules = compiler_rules();
    rules.push(
        Choice::new("language", "c_standard", token_ci(r"-std=((?:c|gnu)(?:90|99|11))")).boxed(),
    );
    rules.extend(warning_rules());
    rules
}

fn cxx_compiler_rules() -> Vec<Box<dyn Matcher>> {
    let mut rules = compiler_rules();
    rules.push(
        Choice::new(
            "language",
            "cxx_standard",
            token_ci(r"-std=((?:c|gnu)\+\+(?:98|03|11|14|17))"),
        )
        .boxed(),
    );
    rules.extend(warning_rules());
    rules.push(Toggle::new("language", "rtti", "-frtti", "-fno-rtti").boxed());
    rules.push(Toggle::new("language", "exceptions", "-fexceptions", "-fno-exceptions").boxed());
    rules
}

fn application_linker_rules() -> Vec<Box<dyn Matcher>> {
    let mut rules = vec![
        Choice::new("linker", "keep", token_ci(r"--keep\s+(\S+)"))
            .repeated()
            .boxed(),
        suppressed_diagnostics(),
    ];
    rules.extend([
        Toggle::new("linker", "remove_unused", "--remove", "--no_remove").boxed(),
        Toggle::new(
            "library",
            "microlib",
            "--library_type=microlib",
            "--library_type=(?:standardlib|nomicrolib)",
        )
        .boxed(),
        Switch::new("listing", "map", token_ci("--map")).boxed(),
        Switch::new("listing", "callgraph", token_ci("--callgraph")).boxed(),
        Switch::new("listing", "symbols", token_ci("--symbols")).boxed(),
        Switch::new("listing", "cross_reference", token_ci("--xref")).boxed(),
        Choice::new("listing", "info", token_ci(r"--info\s+(sizes|totals|unused|veneers)"))
            .repeated()
            .boxed(),
        Choice::new("target", "core", token_ci(r"--cpu(?:\s+|=)(\S+)"))
            .transform(lower)
            .boxed(),
    ]);
    rules
}

/// Options a single source file may override.
pub(super) fn source_rules() -> Vec<Box<dyn Matcher>> {
    vec![
        optimization_level(),
        suppressed_diagnostics(),
        Choice::new(
            "language",
            "library_interface",
            token_ci(r"--library_interface=(none|armcc|armcc_c90)"),
        )
        .transform(lower)
        .boxed(),
        Choice::new("language", "standard", token_ci(r"(--cpp|-std=\S+)")).boxed(),
    ]
}

pub(super) fn chain(variant: BuildVariant) -> Layer {
    let family = Layer::family("mdk/common")
        .rules(FlagCategory::Assembler, assembler_rules())
        .rules(FlagCategory::CCompiler, c_compiler_rules())
        .rules(FlagCategory::CxxCompiler, cxx_compiler_rules());
    let backend = Layer::backend(BackendId::Mdk.as_str(), family);

    let name = variant_name(BackendId::Mdk, variant);
    match variant {
        BuildVariant::Application => Layer::variant(name, backend)
            .before_parent(
                FlagCategory::Assembler,
                vec![Choice::new("assembler", "preprocessor_options", token_ci(r"--cpreproc_opts\s+(\S+)"))
                    .repeated()
                    .boxed()],
            )
            .rules(FlagCategory::Linker, application_linker_rules())
            .expose(APPLICATION_CATEGORIES),
        BuildVariant::Library => Layer::variant(name, backend).expose(LIBRARY_CATEGORIES),
    }
}
