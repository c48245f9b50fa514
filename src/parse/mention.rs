use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

/// `@` followed by one or more word characters (letters, digits, `_`)
pub(crate) static MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@(\w+)").expect("mention pattern is valid"));

/// Extract mention names from comment text, in text order.
///
/// Duplicates are kept and case is preserved as typed. The leading `@`
/// is not included.
pub fn extract_mentions(text: &str) -> Vec<String> {
    MENTION_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Byte ranges of every `@name` occurrence, including the `@`.
pub fn mention_spans(text: &str) -> Vec<Range<usize>> {
    MENTION_RE
        .find_iter(text)
        .map(|m| m.start()..m.end())
        .collect()
}
