//! Inline `style` attribute parsing.
//!
//! Only declarations are understood; there are no selectors in a `style`
//! attribute. Values are returned raw and checked with [`clean_value`]
//! before they reach the document.

use std::sync::OnceLock;

use regex::Regex;

fn comment_regex() -> &'static Regex {
    static COMMENT_REGEX: OnceLock<Regex> = OnceLock::new();
    COMMENT_REGEX
        .get_or_init(|| Regex::new(r"(?s)/\*.*?\*/").expect("Invalid CSS comment regex"))
}

fn length_regex() -> &'static Regex {
    static LENGTH_REGEX: OnceLock<Regex> = OnceLock::new();
    LENGTH_REGEX.get_or_init(|| {
        Regex::new(r"^(-?(?:\d+\.?\d*|\.\d+))\s*(px|pt|pc|em|rem|in|cm|mm)?$")
            .expect("Invalid CSS length regex")
    })
}

/// `prop: value` pairs in source order, property names lowercased.
///
/// `!important` is dropped; declarations without a colon are skipped.
pub fn parse_declarations(style: &str) -> Vec<(String, String)> {
    let style = comment_regex().replace_all(style, "");
    style
        .split(';')
        .filter_map(|decl| {
            let (prop, value) = decl.split_once(':')?;
            let prop = prop.trim().to_ascii_lowercase();
            let value = value.trim();
            let value = value
                .strip_suffix("!important")
                .map(str::trim_end)
                .unwrap_or(value);
            if prop.is_empty() || value.is_empty() {
                return None;
            }
            Some((prop, value.to_string()))
        })
        .collect()
}

/// A CSS length in pixels.
///
/// Relative units assume a 16px font; a bare number is only accepted
/// when it is zero.
pub fn length_px(value: &str) -> Option<f32> {
    let caps = length_regex().captures(value.trim())?;
    let number: f32 = caps.get(1)?.as_str().parse().ok()?;
    let factor = match caps.get(2).map(|m| m.as_str().to_ascii_lowercase()) {
        None if number == 0.0 => 1.0,
        None => return None,
        Some(unit) => match unit.as_str() {
            "px" => 1.0,
            "pt" => 96.0 / 72.0,
            "pc" => 16.0,
            "em" | "rem" => 16.0,
            "in" => 96.0,
            "cm" => 96.0 / 2.54,
            "mm" => 96.0 / 25.4,
            _ => return None,
        },
    };
    Some(number * factor)
}

/// The left component of a `margin`/`padding` shorthand.
pub fn shorthand_left(value: &str) -> Option<&str> {
    let parts: Vec<&str> = value.split_whitespace().collect();
    match parts.as_slice() {
        [all] => Some(all),
        [_, horizontal] | [_, horizontal, _] => Some(horizontal),
        [_, _, _, left] => Some(left),
        _ => None,
    }
}

/// A property value that is safe to carry into a span style.
///
/// Rejects anything that could break out of the declaration or pull in
/// external resources.
pub fn clean_value(value: &str) -> Option<String> {
    let value = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if value.is_empty() || value.len() > 200 {
        return None;
    }
    if value
        .chars()
        .any(|c| matches!(c, ';' | '\\' | '<' | '>' | '{' | '}') || c.is_control())
    {
        return None;
    }
    let lower = value.to_ascii_lowercase();
    if ["url(", "expression(", "javascript:", "var("]
        .iter()
        .any(|bad| lower.contains(bad))
    {
        return None;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn declarations_in_order() {
        let decls = parse_declarations(
            "Font-Weight: bold; /* word */ color:red !important;;mso-bidi:x; broken",
        );
        assert_eq!(
            decls,
            vec![
                ("font-weight".to_string(), "bold".to_string()),
                ("color".to_string(), "red".to_string()),
                ("mso-bidi".to_string(), "x".to_string()),
            ]
        );
    }

    #[rstest]
    #[case("40px", Some(40.0))]
    #[case("30pt", Some(40.0))]
    #[case("2.5em", Some(40.0))]
    #[case(".5in", Some(48.0))]
    #[case("0", Some(0.0))]
    #[case("12", None)]
    #[case("auto", None)]
    fn lengths(#[case] input: &str, #[case] expected: Option<f32>) {
        assert_eq!(length_px(input), expected);
    }

    #[rstest]
    #[case("0in 0in 0in .5in", Some(".5in"))]
    #[case("0 40px", Some("40px"))]
    #[case("10px", Some("10px"))]
    #[case("", None)]
    fn margin_shorthand(#[case] input: &str, #[case] expected: Option<&str>) {
        assert_eq!(shorthand_left(input), expected);
    }

    #[rstest]
    #[case("\"Times New Roman\", serif", true)]
    #[case("rgb(255, 0, 0)", true)]
    #[case("url(http://evil)", false)]
    #[case("red; position: fixed", false)]
    #[case("expression(alert(1))", false)]
    fn cleaned_values(#[case] input: &str, #[case] accepted: bool) {
        assert_eq!(clean_value(input).is_some(), accepted);
    }
}
