//! URL scheme checks for links and image sources.

/// Schemes that execute script when followed.
const SCRIPT_SCHEMES: &[&str] = &["javascript", "vbscript", "livescript"];

/// Where a URL is going to be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlUse {
    Link,
    ImageSource,
}

/// Scheme of `url`, lowercased, ignoring embedded whitespace and control
/// characters the way browsers do.
fn scheme(url: &str) -> Option<String> {
    let cleaned: String = url
        .trim()
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_ascii_control())
        .collect();
    let colon = cleaned.find(':')?;
    let candidate = &cleaned[..colon];
    let valid = !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then(|| candidate.to_ascii_lowercase())
}

/// Whether `url` is acceptable for the given use.
///
/// Script schemes are always rejected. `data:` is only accepted for image
/// sources, and only with an image media type.
pub fn is_safe_url(url: &str, usage: UrlUse) -> bool {
    match scheme(url).as_deref() {
        None => true,
        Some(s) if SCRIPT_SCHEMES.contains(&s) => false,
        Some("data") => {
            usage == UrlUse::ImageSource
                && url.trim().to_ascii_lowercase().starts_with("data:image/")
        }
        Some(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::http("http://example.com", UrlUse::Link, true)]
    #[case::relative("../page.html", UrlUse::Link, true)]
    #[case::fragment("#top", UrlUse::Link, true)]
    #[case::javascript("javascript:alert(1)", UrlUse::Link, false)]
    #[case::mixed_case("JavaScript:alert(1)", UrlUse::Link, false)]
    #[case::obfuscated(" java\tscript:alert(1)", UrlUse::Link, false)]
    #[case::vbscript("vbscript:msgbox", UrlUse::ImageSource, false)]
    #[case::data_link("data:text/html,<b>x</b>", UrlUse::Link, false)]
    #[case::data_image("data:image/png;base64,AAAA", UrlUse::ImageSource, true)]
    #[case::data_html_image("data:text/html,x", UrlUse::ImageSource, false)]
    #[case::blob("blob:quire/1234", UrlUse::ImageSource, true)]
    fn url_safety(#[case] url: &str, #[case] usage: UrlUse, #[case] expected: bool) {
        assert_eq!(is_safe_url(url, usage), expected);
    }
}
