//! Shared text normalization and string-literal escaping helpers.

/// Trim an optional string and drop empty values.
///
/// # Returns
/// `None` when the input is missing or whitespace-only; otherwise the trimmed
/// string.
pub fn normalize_optional_nonempty(value: Option<String>) -> Option<String> {
    value.and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Encode `text` as a double-quoted source string literal.
///
/// Quotes, backslashes and control characters are escaped JSON-style, and
/// every `/` becomes `\/`. The result is a valid JavaScript/JSON string
/// literal that never contains `*/`, so it cannot close a comment or forge a
/// slot marker.
///
/// # Returns
/// The quoted literal, including the surrounding `"`.
pub fn encode_string_literal(text: &str) -> String {
    // serde_json never fails when serializing a plain `str`.
    let quoted = serde_json::to_string(text).unwrap_or_else(|_| String::from("\"\""));
    quoted.replace('/', "\\/")
}

/// Decode a literal produced by [`encode_string_literal`].
///
/// # Returns
/// The unescaped text, or `None` when `literal` is not a valid quoted string.
pub fn decode_string_literal(literal: &str) -> Option<String> {
    serde_json::from_str::<String>(literal.trim()).ok()
}
