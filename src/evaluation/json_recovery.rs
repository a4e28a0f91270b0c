//! Recovering one JSON object from untrusted model output.
//!
//! Model text may wrap the object in prose or Markdown fences, or emit
//! several objects. Recovery runs in order:
//!
//! 1. trimmed text starting with `{` is parsed directly;
//! 2. otherwise fences are stripped and [`object_spans`] collects every
//!    balanced top-level object, tried largest first;
//! 3. `None` when nothing parses.
//!
//! Only whole fence lines are removed, so backticks inside string values
//! survive.

use std::ops::Range;

use serde_json::{Map, Value};

use crate::utilities::string_utils::strip_code_fences;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Normal,
    InString,
    Escaped,
}

/// Byte ranges of every balanced top-level `{...}` in `text`, ordered by
/// start.
///
/// Braces inside quoted strings (backslash escapes honored) do not count.
/// The text is scanned twice: once tracking quotes only inside objects, so
/// stray quote characters in prose are harmless, and once tracking them
/// everywhere, so a quoted `"{"` in prose is skipped. Spans from both scans
/// are merged. When a scan reaches the end with an object still open, that
/// `{` is treated as prose and scanning resumes just after it.
pub fn object_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    for top_level_quotes in [false, true] {
        let mut from = 0;
        while let Some(unclosed) = scan_from(text, from, top_level_quotes, &mut spans) {
            // '{' is one byte wide.
            from = unclosed + 1;
        }
    }
    spans.sort_by_key(|r| (r.start, r.end));
    spans.dedup();
    spans
}

/// Scan `text[from..]`, pushing closed top-level spans. Returns the start of
/// an object left open at end of input.
fn scan_from(
    text: &str,
    from: usize,
    top_level_quotes: bool,
    spans: &mut Vec<Range<usize>>,
) -> Option<usize> {
    let mut state = ScanState::Normal;
    let mut depth = 0usize;
    let mut start = from;

    for (offset, ch) in text[from..].char_indices() {
        let idx = from + offset;
        state = match (state, ch) {
            (ScanState::Escaped, _) => ScanState::InString,
            (ScanState::InString, '\\') => ScanState::Escaped,
            (ScanState::InString, '"') => ScanState::Normal,
            (ScanState::InString, _) => ScanState::InString,
            (ScanState::Normal, '"') if depth > 0 || top_level_quotes => ScanState::InString,
            (ScanState::Normal, '{') => {
                if depth == 0 {
                    start = idx;
                }
                depth += 1;
                ScanState::Normal
            }
            (ScanState::Normal, '}') if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    spans.push(start..idx + 1);
                }
                ScanState::Normal
            }
            (ScanState::Normal, _) => ScanState::Normal,
        };
    }

    (depth > 0).then_some(start)
}

/// Candidate object strings from `text`, longest (in chars) first. Ties keep
/// their original order.
pub fn candidates(text: &str) -> Vec<&str> {
    let mut found: Vec<&str> = object_spans(text).into_iter().map(|r| &text[r]).collect();
    found.sort_by_key(|s| std::cmp::Reverse(s.chars().count()));
    found
}

/// Recover the intended JSON object, if any.
pub fn recover_object(raw: &str) -> Option<Map<String, Value>> {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') {
        if let Some(object) = parse_object(trimmed) {
            tracing::debug!("summary parsed directly");
            return Some(object);
        }
    }

    let stripped = strip_code_fences(trimmed);
    let found = candidates(&stripped);
    tracing::debug!(candidates = found.len(), "scanning for embedded objects");
    found.into_iter().find_map(parse_object)
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(object)) => Some(object),
        _ => None,
    }
}
