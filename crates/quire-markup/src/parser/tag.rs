//! Start/end tag slices → name, attributes and self-closing flag.

use std::sync::OnceLock;

use regex::Regex;

/// A parsed start or end tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTag {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub self_closing: bool,
}

fn name_regex() -> &'static Regex {
    static NAME_REGEX: OnceLock<Regex> = OnceLock::new();
    NAME_REGEX.get_or_init(|| {
        Regex::new(r"^</?\s*([A-Za-z][A-Za-z0-9:-]*)").expect("Invalid tag name regex")
    })
}

fn attr_regex() -> &'static Regex {
    static ATTR_REGEX: OnceLock<Regex> = OnceLock::new();
    ATTR_REGEX.get_or_init(|| {
        Regex::new(r#"([^\s"'>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
            .expect("Invalid attribute regex")
    })
}

/// Parse the text of a single tag token.
///
/// Returns `None` when the slice does not start with a tag name, which the
/// lexer already guarantees for `StartTag`/`EndTag` tokens.
pub fn parse_tag(slice: &str) -> Option<ParsedTag> {
    let caps = name_regex().captures(slice)?;
    let whole = caps.get(0)?;
    let name = caps.get(1)?.as_str().to_ascii_lowercase();

    let body = slice[whole.end()..].trim_end_matches('>');
    let self_closing = body.trim_end().ends_with('/');

    let mut attrs: Vec<(String, String)> = Vec::new();
    for cap in attr_regex().captures_iter(body) {
        let Some(key) = cap.get(1) else { continue };
        let key = key.as_str().to_ascii_lowercase();
        // First occurrence wins, like the HTML tokenizer
        if attrs.iter().any(|(k, _)| *k == key) {
            continue;
        }
        let raw = cap
            .get(2)
            .or_else(|| cap.get(3))
            .or_else(|| cap.get(4))
            .map(|m| m.as_str())
            .unwrap_or("");
        let value = html_escape::decode_html_entities(raw).into_owned();
        attrs.push((key, value));
    }

    Some(ParsedTag {
        name,
        attrs,
        self_closing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn attrs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn bare_tag() {
        let tag = parse_tag("<P>").unwrap();
        assert_eq!(tag.name, "p");
        assert!(tag.attrs.is_empty());
        assert!(!tag.self_closing);
    }

    #[test]
    fn quoted_unquoted_and_boolean_attributes() {
        let tag = parse_tag(r#"<img SRC="a.png" alt='x &amp; y' width=20 hidden>"#).unwrap();
        assert_eq!(
            tag.attrs,
            attrs(&[
                ("src", "a.png"),
                ("alt", "x & y"),
                ("width", "20"),
                ("hidden", "")
            ])
        );
    }

    #[test]
    fn self_closing() {
        let tag = parse_tag("<br />").unwrap();
        assert_eq!(tag.name, "br");
        assert!(tag.self_closing);
        assert!(tag.attrs.is_empty());
    }

    #[test]
    fn duplicate_attribute_keeps_first() {
        let tag = parse_tag(r#"<a href="one" HREF="two">"#).unwrap();
        assert_eq!(tag.attrs, attrs(&[("href", "one")]));
    }

    #[test]
    fn end_tag_name() {
        assert_eq!(parse_tag("</Strong >").unwrap().name, "strong");
    }
}
