//! Identifier and string escaping.

/// Escape a label, type, key or variable name.
///
/// Plain identifiers are returned unchanged; anything else is wrapped in
/// backticks with embedded backticks doubled.
pub fn escape_identifier(name: &str) -> String {
    let mut chars = name.chars();
    let plain = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if plain {
        name.to_string()
    } else {
        format!("`{}`", name.replace('`', "``"))
    }
}

/// Escape string contents for use inside a double-quoted literal
pub fn escape_string_contents(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Render a double-quoted string literal
pub fn quote_string(value: &str) -> String {
    format!("\"{}\"", escape_string_contents(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("title", "title" ; "plain")]
    #[test_case("_id", "_id" ; "leading underscore")]
    #[test_case("my label", "`my label`" ; "space")]
    #[test_case("1st", "`1st`" ; "leading digit")]
    #[test_case("a`b", "`a``b`" ; "backtick")]
    fn test_escape_identifier(input: &str, expected: &str) {
        assert_eq!(escape_identifier(input), expected);
    }

    #[test]
    fn test_quote_string() {
        assert_eq!(quote_string(r#"say "hi" \o/"#), r#""say \"hi\" \\o/""#);
    }
}
