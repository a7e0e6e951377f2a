//! Configuration file parsing utilities.
//!
//! Helpers shared by the settings store for comment skipping and
//! key-value splitting.

/// What: Check if a line should be skipped (empty or comment).
///
/// Inputs:
/// - `line`: Line to check
///
/// Output:
/// - `true` if the line should be skipped, `false` otherwise
///
/// Details:
/// - Skips empty lines and lines starting with `#`, `//`, or `;`
#[must_use]
pub fn skip_comment_or_empty(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty()
        || trimmed.starts_with('#')
        || trimmed.starts_with("//")
        || trimmed.starts_with(';')
}

/// Normalise a settings key: lower case, with `.`, `-` and spaces folded to `_`.
#[must_use]
pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase().replace(['.', '-', ' '], "_")
}

/// What: Drop a trailing `# comment` from a value.
///
/// Inputs:
/// - `value`: Raw value text after the `=`.
///
/// Output:
/// - Trimmed value without the inline comment.
#[must_use]
pub fn strip_inline_comment(value: &str) -> &str {
    value.find('#').map_or(value, |i| &value[..i]).trim()
}

/// What: Parse a key-value pair from a line.
///
/// Inputs:
/// - `line`: Line containing key=value format
///
/// Output:
/// - `Some((key, value))` if parsing succeeds, `None` otherwise
///
/// Details:
/// - Splits on the first `=` character
/// - Normalises the key and strips inline comments from the value
#[must_use]
pub fn parse_key_value(line: &str) -> Option<(String, String)> {
    if skip_comment_or_empty(line) {
        return None;
    }
    let (key, value) = line.trim().split_once('=')?;
    let key = normalize_key(key);
    if key.is_empty() {
        return None;
    }
    Some((key, strip_inline_comment(value).to_string()))
}

/// Interpret common truthy spellings (`true`, `1`, `yes`, `on`).
#[must_use]
pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}
