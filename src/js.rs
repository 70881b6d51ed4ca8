//! JavaScript text helpers shared by the emitters.

use regex::Regex;
use std::collections::HashSet;

lazy_static::lazy_static! {
    static ref IDENT_RE: Regex = Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap();

    static ref RESERVED: HashSet<&'static str> = [
        "break", "case", "catch", "class", "const", "continue", "debugger", "default",
        "delete", "do", "else", "export", "extends", "finally", "for", "function", "if",
        "import", "in", "instanceof", "new", "return", "super", "switch", "this", "throw",
        "try", "typeof", "var", "void", "while", "with", "yield", "let", "static",
        "enum", "await", "null", "true", "false",
    ]
    .into_iter()
    .collect();
}

pub const INDENT: &str = "  ";

/// Usable as a binding name or a dotted member.
pub fn is_valid_ident(name: &str) -> bool {
    IDENT_RE.is_match(name) && !RESERVED.contains(name)
}

/// Usable after a dot (`a.default` is fine, `a.1x` is not).
pub fn is_valid_member(name: &str) -> bool {
    IDENT_RE.is_match(name)
}

pub fn sanitize_ident(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' || ch == '$' {
            out.push(ch);
        } else {
            out.push('_');
        }
    }
    if out.is_empty() {
        return "_".to_string();
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) || RESERVED.contains(out.as_str()) {
        out.insert(0, '_');
    }
    out
}

pub fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn quote(s: &str) -> String {
    format!("\"{}\"", escape_string(s))
}

/// Escapes literal text placed inside a template literal.
pub fn escape_template(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '`' => out.push_str("\\`"),
            '$' if chars.peek() == Some(&'{') => out.push_str("\\$"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f.is_infinite() {
        if f > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if f.fract() == 0.0 {
        format!("{f:.1}")
    } else {
        format!("{f}")
    }
}

/// Object-literal key: bare when it is an identifier, quoted otherwise.
pub fn property_key(name: &str) -> String {
    if is_valid_member(name) {
        name.to_string()
    } else {
        quote(name)
    }
}

pub fn indent(level: usize) -> String {
    INDENT.repeat(level)
}

/// Re-indents every non-empty line of `text` by `level` steps.
pub fn indent_block(text: &str, level: usize) -> String {
    let pad = indent(level);
    text.lines()
        .map(|l| if l.is_empty() { String::new() } else { format!("{}{}", pad, l) })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_string() {
        assert_eq!(escape_string("a\"b\\c\nd\te\r"), "a\\\"b\\\\c\\nd\\te\\r");
        assert_eq!(quote("hi"), "\"hi\"");
    }

    #[test]
    fn test_escape_template() {
        assert_eq!(escape_template("cost: ${x} `q`"), "cost: \\${x} \\`q\\`");
        assert_eq!(escape_template("$5"), "$5");
    }

    #[test]
    fn test_identifier_rules() {
        assert!(is_valid_ident("_counter"));
        assert!(is_valid_ident("$el"));
        assert!(!is_valid_ident("class"));
        assert!(!is_valid_ident("1abc"));
        assert!(!is_valid_ident("a-b"));
        assert!(is_valid_member("default"));
        assert_eq!(sanitize_ident("operator=="), "operator__");
        assert_eq!(sanitize_ident("new"), "_new");
        assert_eq!(property_key("data-id"), "\"data-id\"");
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(1.0), "1.0");
        assert_eq!(format_float(0.25), "0.25");
        assert_eq!(format_float(f64::INFINITY), "Infinity");
    }
}
