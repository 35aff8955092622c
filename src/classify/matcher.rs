//! Pattern matchers.
//!
//! A matcher owns one recognized construct. It receives the residual line,
//! records what it recognizes through a [`MatchContext`] and returns the line
//! with every recognized occurrence cut out. A cut is replaced by a single
//! space so neighbouring tokens never fuse. A matcher that finds nothing
//! returns the line unchanged.
//!
//! Patterns are token-anchored (see [`token`]): a match always starts and
//! ends on token boundaries, which is what lets every setting carry the
//! exact raw tokens it was recognized from.

use regex::{Captures, Regex};

use crate::classify::splitter::split_owned;
use crate::core::ordered_set::OrderedSet;
use crate::core::project::CategoryFlags;
use crate::core::setting::{Setting, SettingValue};
use crate::core::target::FlagCategory;

/// Libraries the toolchains link implicitly; everything else in a library
/// group is a user library.
pub const SYSTEM_LIBRARIES: &[&str] = &[
    "-lm",
    "-lc",
    "-lgcc",
    "-lnosys",
    "-lc_nano",
    "-lcr_c",
    "-lcr_eabihelpers",
    "-lstdc++",
    "-lstdc++_nano",
    "crti.o",
    "crtn.o",
    "crtbegin.o",
    "crtend.o",
    "-lcr_semihost",
    "-lcr_semihost_nf",
    "-lcr_semihost_mb",
    "-lcr_semihost_mb_nf",
    "-lcr_nohost_nf",
    "-lcr_newlib_semihost",
    "-lcr_newlib_nohost",
    "-lcr_newlib_none",
];

/// Where recognized settings of one classification call go.
pub struct MatchContext<'a> {
    target: &'a str,
    category: FlagCategory,
    flags: &'a mut CategoryFlags,
}

impl<'a> MatchContext<'a> {
    pub fn new(target: &'a str, category: FlagCategory, flags: &'a mut CategoryFlags) -> Self {
        MatchContext {
            target,
            category,
            flags,
        }
    }

    pub fn target(&self) -> &str {
        self.target
    }

    pub fn category(&self) -> FlagCategory {
        self.category
    }

    /// Record a recognized setting.
    pub fn record(&mut self, setting: Setting) {
        tracing::debug!(
            "{} {}: recognized {} from {:?}",
            self.target,
            self.category,
            setting,
            setting.source
        );
        self.flags.push_setting(setting);
    }

    /// Deposit an unrecognized token as an opaque pass-through flag.
    pub fn pass_through(&mut self, token: &str) {
        tracing::debug!("{} {}: passing through `{}`", self.target, self.category, token);
        self.flags.push_opaque(token);
    }
}

/// A single classification rule.
pub trait Matcher: Send + Sync {
    /// Short name used in logs and rule listings.
    fn name(&self) -> &str;

    /// Recognize this matcher's construct in `line` and return the residual.
    fn apply(&self, line: String, ctx: &mut MatchContext<'_>) -> String;

    /// Box for storage in a rule table.
    fn boxed(self) -> Box<dyn Matcher>
    where
        Self: Sized + 'static,
    {
        Box::new(self)
    }
}

/// Compile a token-anchored pattern.
///
/// `body` must match whole tokens; the surrounding whitespace (or line
/// boundary) is part of the match so a cut never leaves half a token.
///
/// # Panics
///
/// Panics if `body` is not a valid regular expression. Rule tables are
/// built from literals.
pub fn token(body: &str) -> Regex {
    Regex::new(&format!(r"(?:^|\s)(?:{})(?:\s|$)", body)).unwrap()
}

/// Case-insensitive variant of [`token`].
pub fn token_ci(body: &str) -> Regex {
    Regex::new(&format!(r"(?:^|\s)(?i:{})(?:\s|$)", body)).unwrap()
}

/// Visit every match of `regex` in `line`, cutting the ones `accept` takes.
///
/// Rejected matches stay in the line and the search resumes after them.
pub(crate) fn consume_all<F>(mut line: String, regex: &Regex, mut accept: F) -> String
where
    F: FnMut(&Captures<'_>) -> bool,
{
    let mut pos = 0;
    while pos <= line.len() {
        let (range, accepted) = match regex.captures_at(&line, pos) {
            Some(caps) => {
                let Some(whole) = caps.get(0) else { break };
                (whole.range(), accept(&caps))
            }
            None => break,
        };

        if accepted {
            line.replace_range(range.clone(), " ");
            pos = range.start;
        } else {
            // The trailing separator may lead the next match.
            pos = match line[..range.end].chars().next_back() {
                Some(c) if c.is_whitespace() => range.end - c.len_utf8(),
                _ => range.end,
            };
        }
    }
    line
}

/// Raw tokens covered by a match.
pub(crate) fn source_of(caps: &Captures<'_>) -> Vec<String> {
    caps.get(0).map(|m| split_owned(m.as_str())).unwrap_or_default()
}

/// Value of a match: the first capture group, or the whole trimmed match.
fn captured<'h>(caps: &Captures<'h>) -> &'h str {
    caps.get(1)
        .or_else(|| caps.get(0))
        .map(|m| m.as_str().trim())
        .unwrap_or_default()
}

/// Presence flag: every occurrence of the pattern sets one value.
pub struct Switch {
    name: String,
    group: &'static str,
    key: &'static str,
    regex: Regex,
    value: SettingValue,
}

impl Switch {
    pub fn new(group: &'static str, key: &'static str, regex: Regex) -> Self {
        Switch {
            name: format!("{}.{}", group, key),
            group,
            key,
            regex,
            value: SettingValue::Switch(true),
        }
    }

    /// Record `value` instead of `true` (e.g. `-nopadpipe` turns padding off).
    pub fn with_value(mut self, value: SettingValue) -> Self {
        self.value = value;
        self
    }
}

impl Matcher for Switch {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, line: String, ctx: &mut MatchContext<'_>) -> String {
        let mut source = Vec::new();
        let line = consume_all(line, &self.regex, |caps| {
            source.extend(source_of(caps));
            true
        });

        if !source.is_empty() {
            ctx.record(Setting::new(self.group, self.key, self.value.clone()).with_source(source));
        }
        line
    }
}

/// An option and its negation writing one boolean setting.
///
/// Occurrences are recorded in line order, so the last-wins reader sees
/// whichever form came last on the command line.
pub struct Toggle {
    name: String,
    group: &'static str,
    key: &'static str,
    regex: Regex,
}

impl Toggle {
    /// `on` and `off` are pattern bodies, matched without regard to case.
    pub fn new(group: &'static str, key: &'static str, on: &str, off: &str) -> Self {
        Toggle {
            name: format!("{}.{}", group, key),
            group,
            key,
            regex: token_ci(&format!("(?P<on>{})|(?P<off>{})", on, off)),
        }
    }
}

impl Matcher for Toggle {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, line: String, ctx: &mut MatchContext<'_>) -> String {
        let mut found = Vec::new();
        let line = consume_all(line, &self.regex, |caps| {
            found.push((caps.name("on").is_some(), source_of(caps)));
            true
        });

        for (on, source) in found {
            ctx.record(
                Setting::new(self.group, self.key, SettingValue::Switch(on)).with_source(source),
            );
        }
        line
    }
}

/// Selection flag: the captured value, optionally translated through a table.
///
/// Each occurrence is recorded separately so the last one on the line wins
/// for single-valued readers. With [`Choice::repeated`] all occurrences are
/// gathered into one list instead.
pub struct Choice {
    name: String,
    group: &'static str,
    key: &'static str,
    regex: Regex,
    table: Option<&'static [(&'static str, &'static str)]>,
    ignore_case: bool,
    transform: Option<fn(&str) -> String>,
    repeated: bool,
    highest: bool,
}

impl Choice {
    pub fn new(group: &'static str, key: &'static str, regex: Regex) -> Self {
        Choice {
            name: format!("{}.{}", group, key),
            group,
            key,
            regex,
            table: None,
            ignore_case: false,
            transform: None,
            repeated: false,
            highest: false,
        }
    }

    /// Translate captured values; values missing from the table are left in the line.
    pub fn table(mut self, table: &'static [(&'static str, &'static str)]) -> Self {
        self.table = Some(table);
        self
    }

    /// Look values up in the table without regard to ASCII case.
    pub fn ignore_case(mut self) -> Self {
        self.ignore_case = true;
        self
    }

    /// Rewrite the captured value before recording it.
    pub fn transform(mut self, f: fn(&str) -> String) -> Self {
        self.transform = Some(f);
        self
    }

    /// Gather all occurrences into a single list setting.
    pub fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }

    /// Keep only the occurrence ranked highest, later table rows ranking higher.
    ///
    /// All occurrences are consumed and become the source of one setting.
    pub fn highest(mut self) -> Self {
        self.highest = true;
        self
    }

    /// Translated value and its table row (0 without a table).
    fn resolve(&self, raw: &str) -> Option<(String, usize)> {
        let (value, rank) = match self.table {
            Some(table) => table
                .iter()
                .enumerate()
                .find(|(_, (from, _))| {
                    if self.ignore_case {
                        from.eq_ignore_ascii_case(raw)
                    } else {
                        *from == raw
                    }
                })
                .map(|(rank, (_, to))| ((*to).to_string(), rank))?,
            None => (raw.to_string(), 0),
        };
        let value = match self.transform {
            Some(f) => f(&value),
            None => value,
        };
        Some((value, rank))
    }
}

impl Matcher for Choice {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, line: String, ctx: &mut MatchContext<'_>) -> String {
        let mut found: Vec<(String, usize, Vec<String>)> = Vec::new();
        let line = consume_all(line, &self.regex, |caps| {
            let raw = captured(caps);
            match self.resolve(raw) {
                Some((value, rank)) => {
                    found.push((value, rank, source_of(caps)));
                    true
                }
                None => {
                    tracing::debug!("{}: unsupported value `{}`", self.name, raw);
                    false
                }
            }
        });

        if found.is_empty() {
            return line;
        }

        if self.highest {
            let sources: Vec<String> = found.iter().flat_map(|(_, _, s)| s.clone()).collect();
            // max_by_key returns the last of equal ranks
            if let Some((value, _, _)) = found.into_iter().max_by_key(|(_, rank, _)| *rank) {
                ctx.record(
                    Setting::new(self.group, self.key, SettingValue::Text(value))
                        .with_source(sources),
                );
            }
        } else if self.repeated {
            let (values, sources): (Vec<_>, Vec<_>) =
                found.into_iter().map(|(value, _, source)| (value, source)).unzip();
            ctx.record(
                Setting::new(self.group, self.key, SettingValue::List(values))
                    .with_source(sources.into_iter().flatten()),
            );
        } else {
            for (value, _, source) in found {
                ctx.record(
                    Setting::new(self.group, self.key, SettingValue::Text(value))
                        .with_source(source),
                );
            }
        }
        line
    }
}

/// Takes whatever is left of the line.
pub struct CatchAll {
    name: String,
    group: &'static str,
    key: &'static str,
    joined: bool,
}

impl CatchAll {
    /// Record the remaining tokens as a list.
    pub fn new(group: &'static str, key: &'static str) -> Self {
        CatchAll {
            name: format!("{}.{}", group, key),
            group,
            key,
            joined: false,
        }
    }

    /// Record the remaining tokens as one space-joined text value.
    pub fn joined(mut self) -> Self {
        self.joined = true;
        self
    }
}

impl Matcher for CatchAll {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, line: String, ctx: &mut MatchContext<'_>) -> String {
        let tokens = split_owned(&line);
        if tokens.is_empty() {
            return line;
        }

        let value = if self.joined {
            SettingValue::Text(tokens.join(" "))
        } else {
            SettingValue::List(tokens.clone())
        };
        ctx.record(Setting::new(self.group, self.key, value).with_source(tokens));
        String::new()
    }
}

/// Partitions `-Wl,--start-group ... -Wl,--end-group` into system and user libraries.
pub struct LibraryGroup {
    regex: Regex,
    system: OrderedSet<String>,
}

impl LibraryGroup {
    pub fn new(extra_system_libraries: &[String]) -> Self {
        let mut system: OrderedSet<String> =
            SYSTEM_LIBRARIES.iter().map(|s| s.to_string()).collect();
        system.extend(extra_system_libraries.iter().cloned());

        LibraryGroup {
            regex: token(r"(-Wl,--start-group)\s(.*?)\s?(-Wl,--end-group)"),
            system,
        }
    }

    pub fn is_system(&self, library: &str) -> bool {
        self.system.contains(library)
    }
}

impl Matcher for LibraryGroup {
    fn name(&self) -> &str {
        "libraries.group"
    }

    fn apply(&self, line: String, ctx: &mut MatchContext<'_>) -> String {
        let mut groups = Vec::new();
        let line = consume_all(line, &self.regex, |caps| {
            let markers = [&caps[1], &caps[3]].map(str::to_string);
            groups.push((markers, split_owned(&caps[2])));
            true
        });

        for (markers, libraries) in groups {
            let mut system = OrderedSet::new();
            let mut user = OrderedSet::new();
            let mut system_source = Vec::new();
            let mut user_source = Vec::new();

            for lib in libraries {
                if self.is_system(&lib) {
                    system.insert(lib.clone());
                    system_source.push(lib);
                } else {
                    user.insert(lib.clone());
                    user_source.push(lib);
                }
            }

            ctx.record(
                Setting::new("libraries", "grouped", SettingValue::Switch(true))
                    .with_source(markers),
            );
            if !system.is_empty() {
                ctx.record(
                    Setting::new("libraries", "system", SettingValue::List(system.into_vec()))
                        .with_source(system_source),
                );
            }
            if !user.is_empty() {
                ctx.record(
                    Setting::new("libraries", "user", SettingValue::List(user.into_vec()))
                        .with_source(user_source),
                );
            }
        }
        line
    }
}
