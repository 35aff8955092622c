//! IAR Embedded Workbench rules.
//!
//! IAR accepts its long options in any case, so most patterns are
//! case-insensitive and values are normalized to lower case. The short
//! assembler switches (`-s`, `-S`) differ only by case and stay exact.

use std::path::Path;

use crate::backends::{variant_name, BackendId, APPLICATION_CATEGORIES, LIBRARY_CATEGORIES};
use crate::classify::matcher::{token, token_ci, Choice, Matcher, Switch};
use crate::classify::Layer;
use crate::core::target::{BuildVariant, FlagCategory};

const ENDIANNESS: &[(&str, &str)] = &[
    ("little", "little"),
    ("l", "little"),
    ("big", "big"),
    ("b", "big"),
];

const CPU_MODES: &[(&str, &str)] = &[("arm", "arm"), ("thumb", "thumb")];

const OPTIMIZATION_LEVELS: &[(&str, &str)] = &[
    ("n", "none"),
    ("l", "low"),
    ("m", "medium"),
    ("h", "high"),
];

const OPTIMIZATION_STRATEGIES: &[(&str, &str)] = &[
    ("hb", "balance"),
    ("hs", "speed"),
    ("hz", "size"),
];

const TRADEOFFS: &[(&str, &str)] = &[
    ("balance", "balance"),
    ("size", "size"),
    ("speed", "speed"),
];

const CONFORMANCE: &[(&str, &str)] = &[("-e", "extension"), ("--strict", "strict")];

/// Optimizations the compiler can be told to skip, by setting key.
const DISABLED_TRANSFORMS: &[(&str, &str)] = &[
    ("no_cse", "--no_cse"),
    ("no_unroll", "--no_unroll"),
    ("no_inline", "--no_inline"),
    ("no_code_motion", "--no_code_motion"),
    ("no_tbaa", "--no_tbaa"),
    ("no_clustering", "--no_clustering"),
    ("no_scheduling", "--no_scheduling"),
];

const CXX_DIALECTS: &[(&str, &str)] = &[
    ("ec++", "embedded"),
    ("eec++", "extended"),
    ("c++", "full"),
];

const ASSEMBLER_WARNINGS: &[(&str, &str)] = &[("+", "enabled"), ("-", "disabled")];

const PRINTF_FORMATTERS: &[(&str, &str)] = &[
    ("_PrintfFull", "full"),
    ("_PrintfFullNoMb", "full_no_mb"),
    ("_PrintfLarge", "large"),
    ("_PrintfLargeNoMb", "large_no_mb"),
    ("_PrintfSmall", "small"),
    ("_PrintfSmallNoMb", "small_no_mb"),
    ("_PrintfTiny", "tiny"),
];

const SCANF_FORMATTERS: &[(&str, &str)] = &[
    ("_ScanfFull", "full"),
    ("_ScanfFullNoMb", "full_no_mb"),
    ("_ScanfLarge", "large"),
    ("_ScanfLargeNoMb", "large_no_mb"),
    ("_ScanfSmall", "small"),
    ("_ScanfSmallNoMb", "small_no_mb"),
];

fn lower(value: &str) -> String {
    value.to_lowercase()
}

fn file_name(value: &str) -> String {
    Path::new(value)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| value.to_string())
}

fn cpu_fpu_rules() -> Vec<Box<dyn Matcher>> {
    vec![
        Choice::new("target", "core", token_ci(r"--cpu(?:=|\s+)(\S+)"))
            .transform(lower)
            .boxed(),
        Choice::new("target", "fpu", token_ci(r"--fpu(?:=|\s+)(\S+)"))
            .transform(lower)
            .boxed(),
    ]
}

fn suppressed_diagnostics() -> Box<dyn Matcher> {
    Choice::new("diagnostics", "suppress", token_ci(r"--diag_suppress\s+([^\s\-]+)"))
        .repeated()
        .boxed()
}

fn assembler_rules() -> Vec<Box<dyn Matcher>> {
    let mut rules = cpu_fpu_rules();
    rules.extend([
        Switch::new("output", "debug_info", token_ci("-r")).boxed(),
        Switch::new("language", "alternative_names", token_ci("-j")).boxed(),
        Switch::new("language", "case_sensitive", token(r"-s\+?")).boxed(),
        Choice::new("diagnostics", "warnings", token(r"-w([+-])"))
            .table(ASSEMBLER_WARNINGS)
            .boxed(),
        Switch::new("general", "silent", token("-S")).boxed(),
    ]);
    rules
}

/// Rules the C and C++ compilers share, after their dialect options.
fn compiler_common_rules() -> Vec<Box<dyn Matcher>> {
    let mut rules = vec![
        Choice::new("diagnostics", "misra", token_ci(r"--misra(2004|1998)")).boxed(),
        Choice::new("preprocessor", "preinclude", token_ci(r"--preinclude\s+(\S+)"))
            .repeated()
            .boxed(),
        Switch::new("language", "require_prototypes", token_ci("--require_prototypes")).boxed(),
        suppressed_diagnostics(),
        Switch::new("output", "debug_info", token_ci("--debug")).boxed(),
        Choice::new("target", "endian", token_ci(r"--endian=(\w+)"))
            .table(ENDIANNESS)
            .ignore_case()
            .boxed(),
        Switch::new("target", "cmse", token_ci("--cmse")).boxed(),
        Switch::new("code", "interwork", token_ci("--interwork")).boxed(),
        Choice::new("code", "processor_mode", token_ci(r"--cpu_mode\s+(\w+)"))
            .table(CPU_MODES)
            .ignore_case()
            .boxed(),
        optimization_level(),
        optimization_tradeoff(),
        optimization_strategy(),
        no_size_constraints(),
    ];
    rules.extend(
        DISABLED_TRANSFORMS
            .iter()
            .map(|&(key, flag)| Switch::new("optimization", key, token_ci(flag)).boxed()),
    );
    rules.extend([
        Choice::new("language", "conformance", token_ci(r"-e|--strict"))
            .table(CONFORMANCE)
            .ignore_case()
            .boxed(),
        Switch::new("diagnostics", "warnings_are_errors", token_ci("--warnings_are_errors")).boxed(),
        Switch::new("general", "silent", token("--silent")).boxed(),
    ]);
    rules
}

/// The strongest level on the line wins, regardless of position.
fn optimization_level() -> Box<dyn Matcher> {
    Choice::new("optimization", "level", token_ci(r"-O([nlmh])"))
        .table(OPTIMIZATION_LEVELS)
        .ignore_case()
        .highest()
        .boxed()
}

/// `-Ssize`, `-Sspeed` or `-Sbalance`.
fn optimization_tradeoff() -> Box<dyn Matcher> {
    Choice::new("optimization", "tradeoff", token_ci(r"-S(size|speed|balance)"))
        .table(TRADEOFFS)
        .ignore_case()
        .boxed()
}

fn optimization_strategy() -> Box<dyn Matcher> {
    Choice::new("optimization", "strategy", token_ci(r"-O(h[bsz])"))
        .table(OPTIMIZATION_STRATEGIES)
        .ignore_case()
        .boxed()
}

fn no_size_constraints() -> Box<dyn Matcher> {
    Switch::new("optimization", "no_size_constraints", token_ci("--no_size_constraints")).boxed()
}

fn c_compiler_rules() -> Vec<Box<dyn Matcher>> {
    let mut rules = cpu_fpu_rules();
    rules.extend([
        Choice::new("library", "config", token_ci(r"--dlib_config\s+([^\s\-]+)"))
            .transform(lower)
            .boxed(),
        Switch::new("language", "c89", token_ci("--c89")).boxed(),
        Switch::new("language", "vla", token_ci("--vla")).boxed(),
    ]);
    rules.extend(compiler_common_rules());
    rules
}

fn cxx_compiler_rules() -> Vec<Box<dyn Matcher>> {
    let mut rules = cpu_fpu_rules();
    rules.extend([
        Switch::new("language", "no_rtti", token_ci("--fno-rtti|--no_rtti")).boxed(),
        Switch::new("language", "no_exceptions", token_ci("--fno-exceptions|--no_exceptions")).boxed(),
        Choice::new("language", "cxx_dialect", token_ci(r"--(ec\+\+|eec\+\+|c\+\+)"))
            .table(CXX_DIALECTS)
            .ignore_case()
            .boxed(),
    ]);
    rules.extend(compiler_common_rules());
    rules
}

fn application_linker_rules() -> Vec<Box<dyn Matcher>> {
    let mut rules = vec![
        Choice::new("linker", "entry", token(r"--entry(?:\s+|=)(\S+)")).boxed(),
        Choice::new("linker", "keep", token(r"--keep(?:\s+|=)(\S+)"))
            .repeated()
            .boxed(),
        Choice::new("library", "printf_formatter", token(r"--redirect\s+_Printf=(\w+)"))
            .table(PRINTF_FORMATTERS)
            .boxed(),
        Choice::new("library", "scanf_formatter", token(r"--redirect\s+_Scanf=(\w+)"))
            .table(SCANF_FORMATTERS)
            .boxed(),
        Switch::new("library", "buffered_write", token(r"--redirect\s+__write=__write_buffered")).boxed(),
        Switch::new(
            "library",
            "stdout_via_swo",
            token(r"--redirect\s+__iar_sh_stdout=__iar_sh_stdout_swo"),
        )
        .boxed(),
        Choice::new("linker", "redirect", token(r"--redirect\s+(\S+)"))
            .repeated()
            .boxed(),
        Switch::new("library", "semihosting", token("--semihosting")).boxed(),
        Switch::new("general", "silent", token("--silent")).boxed(),
        Choice::new("linker", "command_file", token(r"-f\s+(\S+)")).boxed(),
        suppressed_diagnostics(),
        Choice::new("linker", "config_defines", token(r"--config_def\s+(\S+)"))
            .repeated()
            .boxed(),
        Choice::new("linker", "image_inputs", token(r"--image_input=(\S+,\S+,\S+,\d+)"))
            .repeated()
            .boxed(),
        Choice::new("linker", "place_holders", token(r"--place_holder\s+(\S+)"))
            .repeated()
            .boxed(),
        Choice::new("linker", "cmse_import_library", token(r"--import_cmse_lib_out(?:\s+|=)(\S+)"))
            .transform(file_name)
            .boxed(),
    ];
    rules.extend(cpu_fpu_rules());
    rules
}

/// Optimization controls a single source file may override.
pub(super) fn source_rules() -> Vec<Box<dyn Matcher>> {
    vec![
        optimization_level(),
        optimization_tradeoff(),
        optimization_strategy(),
        no_size_constraints(),
    ]
}

pub(super) fn chain(variant: BuildVariant) -> Layer {
    let family = Layer::family("iar/common")
        .rules(FlagCategory::Assembler, assembler_rules())
        .rules(FlagCategory::CCompiler, c_compiler_rules())
        .rules(FlagCategory::CxxCompiler, cxx_compiler_rules());
    let backend = Layer::backend(BackendId::Iar.as_str(), family);

    let name = variant_name(BackendId::Iar, variant);
    match variant {
        BuildVariant::Application => Layer::variant(name, backend)
            .before_parent(
                FlagCategory::CCompiler,
                vec![
                    Switch::new("library", "use_cmsis_dsp", token_ci("--use_cmsis_dsp")).boxed(),
                    Switch::new("library", "use_cmsis", token_ci("--use_cmsis")).boxed(),
                ],
            )
            .before_parent(
                FlagCategory::CxxCompiler,
                vec![optimization_strategy(), no_size_constraints()],
            )
            .rules(FlagCategory::Linker, application_linker_rules())
            .expose(APPLICATION_CATEGORIES),
        BuildVariant::Library => Layer::variant(name, backend).expose(LIBRARY_CATEGORIES),
    }
}
