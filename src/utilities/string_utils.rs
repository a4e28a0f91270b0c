//! String utility functions shared by intake, features, and recovery.

use once_cell::sync::Lazy;
use regex::Regex;

static CLAUSE_DELIMITERS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?;,\n]+").unwrap());
static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*```[A-Za-z0-9_-]*[ \t]*\r?$").unwrap());

/// Split free text into trimmed, non-empty clauses.
///
/// Clause boundaries are sentence punctuation, semicolons, commas, and
/// line breaks.
pub fn split_clauses(text: &str) -> Vec<String> {
    CLAUSE_DELIMITERS
        .split(text)
        .map(str::trim)
        .filter(|clause| !clause.is_empty())
        .map(String::from)
        .collect()
}

/// Truncate to at most `max_chars` characters, respecting char boundaries.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Remove Markdown code-fence lines (```` ``` ```` and ```` ```json ````).
/// Backticks elsewhere in a line are kept.
pub fn strip_code_fences(text: &str) -> String {
    CODE_FENCE.replace_all(text, "").into_owned()
}

/// Whitespace-delimited word count.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
