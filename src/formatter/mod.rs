//! Response body pretty-printing.
//!
//! Parse-success detection: a body that parses as JSON is re-serialized with
//! two-space indentation; a body that looks like XML gets a lightweight
//! re-indent. Anything else is returned unchanged.

use serde_json::ser::PrettyFormatter;
use serde_json::Serializer;

/// Pretty-prints a response body when its format is recognized, otherwise
/// returns the input unchanged.
pub fn pretty_print_body(body: &str) -> String {
    if let Some(json) = pretty_print_json(body) {
        return json;
    }
    if let Some(xml) = pretty_print_xml(body) {
        return xml;
    }
    body.to_string()
}

/// Re-serializes valid JSON with two-space indentation.
pub fn pretty_print_json(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;

    let formatter = PrettyFormatter::with_indent(b"  ");
    let mut output = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut output, formatter);
    serde::Serialize::serialize(&value, &mut serializer).ok()?;
    String::from_utf8(output).ok()
}

/// Re-indents XML by element nesting. Only attempted for bodies that start
/// with `<`; malformed markup falls back to the raw text.
pub fn pretty_print_xml(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if !trimmed.starts_with('<') {
        return None;
    }

    let mut output = String::with_capacity(trimmed.len());
    let mut depth: usize = 0;
    let mut tokens: Vec<&str> = Vec::new();
    let mut token_start = 0;

    // split into tag and text tokens
    for (index, c) in trimmed.char_indices() {
        if c == '<' {
            if index > token_start {
                tokens.push(&trimmed[token_start..index]);
            }
            token_start = index;
        } else if c == '>' {
            tokens.push(&trimmed[token_start..=index]);
            token_start = index + c.len_utf8();
        }
    }
    if token_start < trimmed.len() {
        tokens.push(&trimmed[token_start..]);
    }

    for token in tokens {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        if token.starts_with("</") {
            depth = depth.saturating_sub(1);
        }
        for _ in 0..depth {
            output.push_str("  ");
        }
        output.push_str(token);
        output.push('\n');
        if token.starts_with('<')
            && !token.starts_with("</")
            && !token.starts_with("<?")
            && !token.starts_with("<!")
            && !token.ends_with("/>")
        {
            depth += 1;
        }
    }

    Some(output.trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_pretty_printed() {
        let pretty = pretty_print_body(r#"{"b":2,"a":{"c":[1,2]}}"#);
        assert!(pretty.contains("{\n"));
        assert!(pretty.contains("  \"a\""));
    }

    #[test]
    fn test_json_indentation_is_two_spaces() {
        let pretty = pretty_print_json(r#"{"key":"value"}"#).unwrap();
        assert_eq!(pretty, "{\n  \"key\": \"value\"\n}");
    }

    #[test]
    fn test_invalid_json_not_json_formatted() {
        assert!(pretty_print_json("{broken").is_none());
    }

    #[test]
    fn test_xml_pretty_printed() {
        let pretty = pretty_print_body("<root><child>text</child><leaf/></root>");
        let lines: Vec<&str> = pretty.lines().collect();
        assert_eq!(lines[0], "<root>");
        assert_eq!(lines[1], "  <child>");
        assert_eq!(lines[2], "    text");
        assert!(lines.contains(&"  <leaf/>"));
    }

    #[test]
    fn test_xml_declaration_does_not_indent() {
        let pretty = pretty_print_xml("<?xml version=\"1.0\"?><a><b/></a>").unwrap();
        assert!(pretty.starts_with("<?xml"));
        assert!(pretty.contains("\n<a>"));
    }

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(pretty_print_body("hello world"), "hello world");
        assert_eq!(pretty_print_body(""), "");
    }
}
