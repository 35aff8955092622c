//! MCUXpresso IDE rules.
//!
//! The compiler tables are shared by the C and C++ compilers; the
//! application variant adds link-time and security options plus the whole
//! managed linker vocabulary, the library variant sweeps leftovers into
//! each tool's "other flags" field and takes the archiver line verbatim.

use regex::Regex;

use crate::backends::{variant_name, BackendId, APPLICATION_CATEGORIES, LIBRARY_CATEGORIES};
use crate::classify::matcher::{consume_all, source_of, token, CatchAll, Choice, MatchContext, Matcher, Switch};
use crate::classify::Layer;
use crate::core::setting::{Setting, SettingValue};
use crate::core::target::{BuildVariant, FlagCategory};

const CORES: &[(&str, &str)] = &[
    ("cortex-m7", "cm7"),
    ("cortex-m4", "cm4"),
    ("cortex-m3", "cm3"),
    ("cortex-m1", "cm1"),
    ("cortex-m0", "cm0"),
    ("cortex-m0plus", "cm0plus"),
    ("cortex-m0sm", "cm0.smallmul"),
    ("cortex-m0plussm", "cm0plus.smallmul"),
    ("arm7tdmi", "a7"),
    ("arm968es", "a968e"),
    ("arm926ejs", "a926ej"),
];

/// `<float-abi>-<fpu>` to the IDE's floating point selection.
const FLOATING_POINT: &[(&str, &str)] = &[
    ("soft-", "none"),
    ("softfp-vfp", "vfp"),
    ("softfp-fpv4-sp-d16", "fpv4"),
    ("hard-fpv4-sp-d16", "fpv4.hard"),
    ("hard-fpv5-sp-d16", "fpv5sp.hard"),
    ("hard-fpv5-d16", "fpv5dp.hard"),
    ("soft-fpv5-d16", "fpv5dp"),
];

const C_STANDARDS: &[(&str, &str)] = &[
    ("ansi", "default"),
    ("std=gnu90", "gnu90"),
    ("std=gnu99", "gnu99"),
    ("std=gnu11", "gnu11"),
    ("std=c90", "c90"),
    ("std=c99", "c99"),
    ("std=c11", "c11"),
];

const CXX_STANDARDS: &[(&str, &str)] = &[
    ("std=gnu++98", "gnupp98"),
    ("std=gnu++03", "gnupp03"),
    ("std=gnu++11", "gnupp11"),
    ("std=gnu++14", "gnupp14"),
    ("std=c++98", "cpp98"),
    ("std=c++03", "cpp03"),
    ("std=c++11", "cpp11"),
    ("std=c++14", "cpp14"),
    ("std=c++1y", "cpp14"),
];

const DEBUG_LEVELS: &[(&str, &str)] = &[
    ("g", "default"),
    ("g1", "minimal"),
    ("g3", "max"),
    ("g0", "none"),
];

const OPTIMIZATION_LEVELS: &[(&str, &str)] = &[
    ("O0", "none"),
    ("O1", "optimize"),
    ("O2", "more"),
    ("O3", "most"),
    ("Os", "size"),
    ("Og", "general"),
];

/// `-mfpu=` and `-mfloat-abi=` recognized as one pair.
///
/// Recorded only when the combination is known; otherwise both tokens are
/// left for pass-through.
struct FloatingPoint {
    regex: Regex,
}

impl FloatingPoint {
    fn new() -> Self {
        FloatingPoint {
            regex: token(r"-mfpu=(\S+)|-mfloat-abi=(\S+)"),
        }
    }
}

impl Matcher for FloatingPoint {
    fn name(&self) -> &str {
        "architecture.floating_point"
    }

    fn apply(&self, line: String, ctx: &mut MatchContext<'_>) -> String {
        let mut fpu = String::new();
        let mut abi = String::new();
        let mut source = Vec::new();
        let residual = consume_all(line.clone(), &self.regex, |caps| {
            if let Some(m) = caps.get(1) {
                fpu = m.as_str().to_string();
            }
            if let Some(m) = caps.get(2) {
                abi = m.as_str().to_string();
            }
            source.extend(source_of(caps));
            true
        });
        if source.is_empty() {
            return line;
        }

        let combination = format!("{}-{}", abi, fpu);
        match FLOATING_POINT.iter().find(|(key, _)| *key == combination) {
            Some((_, value)) => {
                ctx.record(
                    Setting::new("architecture", "floating_point", SettingValue::text(*value))
                        .with_source(source),
                );
                residual
            }
            None => {
                tracing::debug!("unsupported fpu and float abi combination `{}`", combination);
                line
            }
        }
    }
}

/// `-Xlinker <option>` pairs.
///
/// `--defsym=__heap_size__=N` and `--defsym=__stack_size__=N` (optionally
/// with `&&region=R&&location=L`) fold into one heap/stack descriptor; every
/// other option is collected as an extra linker option.
struct LinkerOptions {
    xlinker: Regex,
    defsym: Regex,
}

impl LinkerOptions {
    fn new() -> Self {
        LinkerOptions {
            xlinker: token(r#"-Xlinker\s+("[^"]+"|\S+)"#),
            defsym: Regex::new(
                r"^--defsym=(__stack_size__|__heap_size__)=(\w+)(?:&&region=(\w+)&&location=(\w+))?",
            )
            .unwrap(),
        }
    }
}

/// Hex size as the IDE expects it; symbolic and hex values pass unchanged.
///
/// A `K` or `M` suffix scales by 1024 or 1024 * 1024. Returns `None` when
/// the size is not a number or does not fit in 64 bits.
fn memory_size(raw: &str) -> Option<String> {
    if raw.starts_with("0x") || raw.contains("Default") {
        return Some(raw.to_string());
    }
    let (digits, multiplier) = match raw.as_bytes().last() {
        Some(b'K' | b'k') => (&raw[..raw.len() - 1], 1024),
        Some(b'M' | b'm') => (&raw[..raw.len() - 1], 1024 * 1024),
        _ => (raw, 1),
    };
    let bytes = digits.parse::<u64>().ok()?.checked_mul(multiplier)?;
    Some(format!("0x{:x}", bytes))
}

fn memory_location(raw: &str) -> &str {
    if raw.to_lowercase().contains("post") {
        "Post Data"
    } else {
        raw
    }
}

impl Matcher for LinkerOptions {
    fn name(&self) -> &str {
        "linker.other_options"
    }

    fn apply(&self, line: String, ctx: &mut MatchContext<'_>) -> String {
        let mut heap: Option<String> = None;
        let mut stack: Option<String> = None;
        let mut memory_source = Vec::new();
        let mut options = Vec::new();
        let mut option_source = Vec::new();

        let line = consume_all(line, &self.xlinker, |caps| {
            let option = &caps[1];
            match self.defsym.captures(option) {
                Some(sym) => {
                    // An unreadable size stays on the line.
                    let Some(size) = memory_size(&sym[2]) else {
                        return false;
                    };
                    let (region, location) = match (sym.get(3), sym.get(4)) {
                        (Some(r), Some(l)) => (r.as_str(), memory_location(l.as_str())),
                        _ => ("Default", "Default"),
                    };
                    let descriptor = format!("{};{};{}", region, location, size);
                    if &sym[1] == "__heap_size__" {
                        heap = Some(format!("&Heap:{}", descriptor));
                    } else {
                        stack = Some(format!("&Stack:{}", descriptor));
                    }
                    memory_source.extend(source_of(caps));
                }
                None => {
                    options.push(option.to_string());
                    option_source.extend(source_of(caps));
                }
            }
            true
        });

        if !options.is_empty() {
            ctx.record(
                Setting::new("linker", "other_options", SettingValue::List(options))
                    .with_source(option_source),
            );
        }
        if heap.is_some() || stack.is_some() {
            let heap = heap.unwrap_or_else(|| "&Heap:Default;Default;Default".to_string());
            let stack = stack.unwrap_or_else(|| "&Stack:Default;Default;Default".to_string());
            ctx.record(
                Setting::new("memory", "heap_stack", SettingValue::Text(heap + &stack))
                    .with_source(memory_source),
            );
        }
        line
    }
}

fn core_rule() -> Box<dyn Matcher> {
    Choice::new("architecture", "core", token(r"-mcpu=(\S+)"))
        .table(CORES)
        .boxed()
}

fn warning_rules() -> Vec<Box<dyn Matcher>> {
    vec![
        Switch::new("warnings", "inhibit_all", token("-w")).boxed(),
        Switch::new("warnings", "all", token("-Wall")).boxed(),
        Switch::new("warnings", "extra", token("-Wextra")).boxed(),
        Switch::new("warnings", "implicit_conversion", token("-Wconversion")).boxed(),
        Switch::new("warnings", "as_errors", token("-Werror")).boxed(),
    ]
}

fn assembler_rules() -> Vec<Box<dyn Matcher>> {
    vec![
        core_rule(),
        FloatingPoint::new().boxed(),
        Switch::new("warnings", "suppress", token("-W")).boxed(),
    ]
}

fn c_compiler_rules() -> Vec<Box<dyn Matcher>> {
    let mut rules = vec![
        core_rule(),
        FloatingPoint::new().boxed(),
        Choice::new("language", "standard", token(r"-(ansi|std=\S+)"))
            .table(C_STANDARDS)
            .boxed(),
        Choice::new("debugging", "level", token(r"-(g[013]?)"))
            .table(DEBUG_LEVELS)
            .boxed(),
    ];
    rules.extend(warning_rules());
    rules.push(
        Choice::new("optimization", "level", token(r"-(O[0-3sg])"))
            .table(OPTIMIZATION_LEVELS)
            .boxed(),
    );
    rules.push(Switch::new("directories", "no_std_include", token("-nostdinc")).boxed());
    rules
}

fn cxx_compiler_rules() -> Vec<Box<dyn Matcher>> {
    let mut rules = vec![
        core_rule(),
        FloatingPoint::new().boxed(),
        Choice::new("language", "standard", token(r"-(std=\S+)"))
            .table(CXX_STANDARDS)
            .boxed(),
        Choice::new("debugging", "level", token(r"-(g[013]?)"))
            .table(DEBUG_LEVELS)
            .boxed(),
    ];
    rules.extend(warning_rules());
    rules.push(
        Choice::new("optimization", "level", token(r"-(O[0-3sg])"))
            .table(OPTIMIZATION_LEVELS)
            .boxed(),
    );
    // C++ recognizes -fno-common for both variants; C only for applications.
    rules.push(Switch::new("optimization", "no_common", token("-fno-common")).boxed());
    rules.push(Switch::new("directories", "no_std_include", token(r"-nostdinc\+\+")).boxed());
    rules
}

fn secure_state() -> Box<dyn Matcher> {
    Choice::new("security", "state", token(r"-(secure|nonsecure|none)")).boxed()
}

fn application_compiler_rules(no_common: bool) -> Vec<Box<dyn Matcher>> {
    let mut rules = vec![Switch::new("optimization", "link_time", token("-flto")).boxed()];
    // The C++ family rules already take -fno-common.
    if no_common {
        rules.push(Switch::new("optimization", "no_common", token("-fno-common")).boxed());
    }
    rules.push(secure_state());
    rules
}

fn application_linker_rules() -> Vec<Box<dyn Matcher>> {
    vec![
        core_rule(),
        FloatingPoint::new().boxed(),
        Switch::new("general", "no_startfiles", token("-nostartfiles")).boxed(),
        Switch::new("general", "no_default_libs", token("-nodefaultlibs")).boxed(),
        Switch::new("general", "no_stdlib", token("-nostdlib")).boxed(),
        Switch::new("general", "omit_all_symbols", token("-s")).boxed(),
        Switch::new("general", "static", token("-static")).boxed(),
        Switch::new("memory", "to_ram", token("-toram=true")).boxed(),
        Choice::new("memory", "data", token(r"\S*memorydata=(\S*)")).boxed(),
        Choice::new("memory", "load_image", token(r"\S*memoryimage=(\S*)")).boxed(),
        Choice::new("memory", "sections", token(r"\S*isd=\S*"))
            .repeated()
            .boxed(),
        LinkerOptions::new().boxed(),
        secure_state(),
        Choice::new(
            "linker",
            "other_objects",
            token(r"\$\{workspace_loc:/\S+\}|\$\{proj_loc:\s?/\S+\}"),
        )
        .repeated()
        .boxed(),
        Choice::new("libraries", "header", token(r"-lib=(\w+\.\w+)")).boxed(),
        Choice::new("linker", "undefined_symbols", token(r"-u\s+(\S+)"))
            .repeated()
            .boxed(),
        Switch::new("linker", "coverage", token("--coverage")).boxed(),
        Choice::new(
            "linker",
            "misc_flags",
            token(r"\{misc_flags_start\}(.*?)\{misc_flags_end\}"),
        )
        .boxed(),
    ]
}

fn other_flags() -> Vec<Box<dyn Matcher>> {
    vec![CatchAll::new("misc", "other_flags").boxed()]
}

pub(super) fn chain(variant: BuildVariant) -> Layer {
    let family = Layer::family("mcux/common")
        .rules(FlagCategory::Assembler, assembler_rules())
        .rules(FlagCategory::CCompiler, c_compiler_rules())
        .rules(FlagCategory::CxxCompiler, cxx_compiler_rules());
    let backend = Layer::backend(BackendId::Mcux.as_str(), family);

    let name = variant_name(BackendId::Mcux, variant);
    match variant {
        BuildVariant::Application => Layer::variant(name, backend)
            .after_parent(FlagCategory::CCompiler, application_compiler_rules(true))
            .after_parent(FlagCategory::CxxCompiler, application_compiler_rules(false))
            .rules(FlagCategory::Linker, application_linker_rules())
            .expose(APPLICATION_CATEGORIES),
        BuildVariant::Library => Layer::variant(name, backend)
            .after_parent(FlagCategory::Assembler, other_flags())
            .after_parent(FlagCategory::CCompiler, other_flags())
            .after_parent(FlagCategory::CxxCompiler, other_flags())
            .rules(
                FlagCategory::Archiver,
                vec![CatchAll::new("archiver", "flags").joined().boxed()],
            )
            .expose(LIBRARY_CATEGORIES),
    }
}
