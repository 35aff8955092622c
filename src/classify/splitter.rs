//! Whitespace tokenization of raw flag lines.
//!
//! No quoting or escaping is understood: `"a b"` yields two tokens. Flag
//! lines come from build descriptions, not from a shell.

/// Split a flag line into its non-empty whitespace-delimited tokens.
pub fn split_tokens(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}

/// Owned variant of [`split_tokens`].
pub fn split_owned(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}
