//! Text escaping for emission (RFC 5545 §3.3.11, RFC 6868).

/// Escapes a TEXT value: `\` `;` `,` and newlines.
#[must_use]
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

/// Escapes a parameter value with RFC 6868 caret encoding. Quoting of
/// values containing separators happens when the parameter list is
/// serialized.
#[must_use]
pub fn escape_param_value(s: &str) -> String {
    let mut encoded = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '^' => encoded.push_str("^^"),
            '\n' => encoded.push_str("^n"),
            '"' => encoded.push_str("^'"),
            _ => encoded.push(c),
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_escapes() {
        assert_eq!(escape_text("a, b; c\nd\\e"), "a\\, b\\; c\\nd\\\\e");
    }

    #[test]
    fn param_caret_encoding() {
        assert_eq!(escape_param_value("plain"), "plain");
        assert_eq!(escape_param_value("has\"quote"), "has^'quote");
        assert_eq!(escape_param_value("two\nlines"), "two^nlines");
        // Separators are left alone; the line serializer quotes them.
        assert_eq!(escape_param_value("Doe, Jane"), "Doe, Jane");
    }
}
