//! Markup escaping.

use std::fmt::Display;

/// Escape a value for use as text content.
///
/// Escapes `&`, `<`, `>`, `"`, `'` and `/`.
pub fn escape_text(value: impl Display) -> String {
    let text = value.to_string();
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape a value for use inside a double-quoted attribute.
///
/// Only `&` and `"` are replaced.
pub fn escape_attr(value: &str) -> String {
    if !value.contains(['&', '"']) {
        return value.to_string();
    }
    value.replace('&', "&amp;").replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("<b>"), "&lt;b&gt;");
        assert_eq!(escape_text("a & b"), "a &amp; b");
        assert_eq!(escape_text("it's \"x\""), "it&#x27;s &quot;x&quot;");
        assert_eq!(escape_text("a/b"), "a&#x2F;b");
        assert_eq!(escape_text(42), "42");
    }

    #[test]
    fn test_escape_attr_leaves_angle_brackets() {
        assert_eq!(escape_attr("<a href=\"x\">&"), "<a href=&quot;x&quot;>&amp;");
        assert_eq!(escape_attr("plain"), "plain");
    }
}
