//! Text normalization shared by every scoring tier.
//!
//! Training and inference must clean text identically, so both the
//! prototype scorer and the statistical classifier go through here.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9 ]").expect("valid regex"));
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Lowercase and replace everything outside `[a-z0-9 ]` with a space.
/// Tabs and line breaks become single spaces; runs of spaces are kept.
pub fn normalize_text(text: &str) -> String {
    NON_ALNUM.replace_all(&text.to_lowercase(), " ").into_owned()
}

/// `normalize_text` plus whitespace collapsing and trimming.
pub fn clean_text(text: &str) -> String {
    WHITESPACE_RUN
        .replace_all(&normalize_text(text), " ")
        .trim()
        .to_string()
}

/// Whitespace tokens of already-normalized text.
pub fn tokens(normalized: &str) -> Vec<&str> {
    normalized.split_whitespace().collect()
}

pub fn token_set(normalized: &str) -> HashSet<&str> {
    normalized.split_whitespace().collect()
}
