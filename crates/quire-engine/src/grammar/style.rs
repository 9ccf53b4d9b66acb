//! # Style Values
//!
//! Styles are a closed set of enum variants, each carrying only the payload
//! it needs. Three layers describe them:
//!
//! - [`InlineStyle`] / [`BlockStyle`]: a concrete style with its value, as
//!   passed to commands and returned by detection
//! - [`InlineKind`]: a style family without its value, used for "any value
//!   present" matching and for removal
//! - [`StyleSet`]: the effective inline styling of one leaf, folded from
//!   its wrapper ancestors
//!
//! ## Canonical Wrapper Order
//!
//! A [`StyleSet`] expands back into wrappers outermost-first:
//!
//! ```text
//! Link → Span → Bold → Italic → Underline → Strikethrough → Superscript/Subscript
//! ```
//!
//! Both the inline normalizer and the sanitizer build wrappers in this
//! order, so equal style sets always produce identical wrapper chains.

use super::node::{Alignment, ListKind, SpanAttrs, Wrapper};

/// A character-level style with its value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InlineStyle {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Superscript,
    Subscript,
    Link(String),
    FontFamily(String),
    FontSize(String),
    Color(String),
    Background(String),
}

/// A character-level style family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InlineKind {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Superscript,
    Subscript,
    Link,
    FontFamily,
    FontSize,
    Color,
    Background,
}

impl InlineKind {
    pub const ALL: [InlineKind; 11] = [
        InlineKind::Bold,
        InlineKind::Italic,
        InlineKind::Underline,
        InlineKind::Strikethrough,
        InlineKind::Superscript,
        InlineKind::Subscript,
        InlineKind::Link,
        InlineKind::FontFamily,
        InlineKind::FontSize,
        InlineKind::Color,
        InlineKind::Background,
    ];

    /// Kinds that carry a value and are matched by exact value on removal.
    pub fn is_valued(&self) -> bool {
        matches!(
            self,
            InlineKind::Link
                | InlineKind::FontFamily
                | InlineKind::FontSize
                | InlineKind::Color
                | InlineKind::Background
        )
    }

    /// The kind that cannot coexist with this one.
    pub fn exclusive_with(&self) -> Option<InlineKind> {
        match self {
            InlineKind::Superscript => Some(InlineKind::Subscript),
            InlineKind::Subscript => Some(InlineKind::Superscript),
            _ => None,
        }
    }
}

impl InlineStyle {
    pub fn kind(&self) -> InlineKind {
        match self {
            InlineStyle::Bold => InlineKind::Bold,
            InlineStyle::Italic => InlineKind::Italic,
            InlineStyle::Underline => InlineKind::Underline,
            InlineStyle::Strikethrough => InlineKind::Strikethrough,
            InlineStyle::Superscript => InlineKind::Superscript,
            InlineStyle::Subscript => InlineKind::Subscript,
            InlineStyle::Link(_) => InlineKind::Link,
            InlineStyle::FontFamily(_) => InlineKind::FontFamily,
            InlineStyle::FontSize(_) => InlineKind::FontSize,
            InlineStyle::Color(_) => InlineKind::Color,
            InlineStyle::Background(_) => InlineKind::Background,
        }
    }

    /// Whether this style may be applied to a collapsed selection.
    pub fn allowed_when_collapsed(&self) -> bool {
        !matches!(self, InlineStyle::Link(_))
    }
}

/// A block-level style with its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BlockStyle {
    /// Plain division, i.e. no heading
    Paragraph,
    Heading(u8),
    Quote,
    Align(Alignment),
    List(ListKind),
}

/// Anything detection can report.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StyleValue {
    Inline(InlineStyle),
    Block(BlockStyle),
}

impl Wrapper {
    /// Build the wrapper that applies `style`.
    pub fn from_style(style: &InlineStyle) -> Wrapper {
        match style {
            InlineStyle::Bold => Wrapper::Bold,
            InlineStyle::Italic => Wrapper::Italic,
            InlineStyle::Underline => Wrapper::Underline,
            InlineStyle::Strikethrough => Wrapper::Strikethrough,
            InlineStyle::Superscript => Wrapper::Superscript,
            InlineStyle::Subscript => Wrapper::Subscript,
            InlineStyle::Link(href) => Wrapper::Link { href: href.clone() },
            InlineStyle::FontFamily(v) => Wrapper::Span(SpanAttrs {
                font_family: Some(v.clone()),
                ..Default::default()
            }),
            InlineStyle::FontSize(v) => Wrapper::Span(SpanAttrs {
                font_size: Some(v.clone()),
                ..Default::default()
            }),
            InlineStyle::Color(v) => Wrapper::Span(SpanAttrs {
                color: Some(v.clone()),
                ..Default::default()
            }),
            InlineStyle::Background(v) => Wrapper::Span(SpanAttrs {
                background: Some(v.clone()),
                ..Default::default()
            }),
        }
    }

    /// Whether this wrapper applies exactly `style`, value included.
    pub fn applies(&self, style: &InlineStyle) -> bool {
        match (self, style) {
            (Wrapper::Link { href }, InlineStyle::Link(value)) => href == value,
            (Wrapper::Span(attrs), InlineStyle::FontFamily(v)) => {
                attrs.font_family.as_ref() == Some(v)
            }
            (Wrapper::Span(attrs), InlineStyle::FontSize(v)) => attrs.font_size.as_ref() == Some(v),
            (Wrapper::Span(attrs), InlineStyle::Color(v)) => attrs.color.as_ref() == Some(v),
            (Wrapper::Span(attrs), InlineStyle::Background(v)) => {
                attrs.background.as_ref() == Some(v)
            }
            (Wrapper::Span(_), _) | (Wrapper::Link { .. }, _) => false,
            (wrapper, style) => wrapper.has_kind(style.kind()),
        }
    }

    /// Whether this wrapper applies any value of `kind`.
    pub fn has_kind(&self, kind: InlineKind) -> bool {
        match self {
            Wrapper::Bold => kind == InlineKind::Bold,
            Wrapper::Italic => kind == InlineKind::Italic,
            Wrapper::Underline => kind == InlineKind::Underline,
            Wrapper::Strikethrough => kind == InlineKind::Strikethrough,
            Wrapper::Superscript => kind == InlineKind::Superscript,
            Wrapper::Subscript => kind == InlineKind::Subscript,
            Wrapper::Link { .. } => kind == InlineKind::Link,
            Wrapper::Span(attrs) => match kind {
                InlineKind::FontFamily => attrs.font_family.is_some(),
                InlineKind::FontSize => attrs.font_size.is_some(),
                InlineKind::Color => attrs.color.is_some(),
                InlineKind::Background => attrs.background.is_some(),
                _ => false,
            },
        }
    }

    /// Strip `kind` from this wrapper.
    ///
    /// Returns `true` when nothing is left and the wrapper should be
    /// unwrapped entirely.
    pub fn strip(&mut self, kind: InlineKind) -> bool {
        match self {
            Wrapper::Span(attrs) => {
                match kind {
                    InlineKind::FontFamily => attrs.font_family = None,
                    InlineKind::FontSize => attrs.font_size = None,
                    InlineKind::Color => attrs.color = None,
                    InlineKind::Background => attrs.background = None,
                    _ => {}
                }
                attrs.is_empty()
            }
            _ => self.has_kind(kind),
        }
    }

    /// Add an attribute-valued style to a span; `false` for other wrappers.
    pub fn absorb(&mut self, style: &InlineStyle) -> bool {
        let Wrapper::Span(attrs) = self else {
            return false;
        };
        match style {
            InlineStyle::FontFamily(v) => attrs.font_family = Some(v.clone()),
            InlineStyle::FontSize(v) => attrs.font_size = Some(v.clone()),
            InlineStyle::Color(v) => attrs.color = Some(v.clone()),
            InlineStyle::Background(v) => attrs.background = Some(v.clone()),
            _ => return false,
        }
        true
    }
}

/// Effective inline styling of a leaf.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleSet {
    pub link: Option<String>,
    pub span: SpanAttrs,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub superscript: bool,
    pub subscript: bool,
}

impl StyleSet {
    /// Fold a wrapper chain given outermost first.
    pub fn from_chain<'a>(chain: impl IntoIterator<Item = &'a Wrapper>) -> Self {
        let mut set = StyleSet::default();
        for wrapper in chain {
            set.add(wrapper);
        }
        set
    }

    /// Add a wrapper nested inside everything added so far.
    pub fn add(&mut self, wrapper: &Wrapper) {
        match wrapper {
            Wrapper::Link { href } => self.link = Some(href.clone()),
            Wrapper::Span(attrs) => self.span.merge(attrs),
            Wrapper::Bold => self.bold = true,
            Wrapper::Italic => self.italic = true,
            Wrapper::Underline => self.underline = true,
            Wrapper::Strikethrough => self.strikethrough = true,
            Wrapper::Superscript => {
                self.superscript = true;
                self.subscript = false;
            }
            Wrapper::Subscript => {
                self.subscript = true;
                self.superscript = false;
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == StyleSet::default()
    }

    pub fn has_kind(&self, kind: InlineKind) -> bool {
        match kind {
            InlineKind::Bold => self.bold,
            InlineKind::Italic => self.italic,
            InlineKind::Underline => self.underline,
            InlineKind::Strikethrough => self.strikethrough,
            InlineKind::Superscript => self.superscript,
            InlineKind::Subscript => self.subscript,
            InlineKind::Link => self.link.is_some(),
            InlineKind::FontFamily => self.span.font_family.is_some(),
            InlineKind::FontSize => self.span.font_size.is_some(),
            InlineKind::Color => self.span.color.is_some(),
            InlineKind::Background => self.span.background.is_some(),
        }
    }

    /// Concrete styles, one per active kind.
    pub fn styles(&self) -> Vec<InlineStyle> {
        let mut out = Vec::new();
        if self.bold {
            out.push(InlineStyle::Bold);
        }
        if self.italic {
            out.push(InlineStyle::Italic);
        }
        if self.underline {
            out.push(InlineStyle::Underline);
        }
        if self.strikethrough {
            out.push(InlineStyle::Strikethrough);
        }
        if self.superscript {
            out.push(InlineStyle::Superscript);
        }
        if self.subscript {
            out.push(InlineStyle::Subscript);
        }
        if let Some(href) = &self.link {
            out.push(InlineStyle::Link(href.clone()));
        }
        if let Some(v) = &self.span.font_family {
            out.push(InlineStyle::FontFamily(v.clone()));
        }
        if let Some(v) = &self.span.font_size {
            out.push(InlineStyle::FontSize(v.clone()));
        }
        if let Some(v) = &self.span.color {
            out.push(InlineStyle::Color(v.clone()));
        }
        if let Some(v) = &self.span.background {
            out.push(InlineStyle::Background(v.clone()));
        }
        out
    }

    /// Wrappers in canonical order, outermost first.
    pub fn chain(&self) -> Vec<Wrapper> {
        let mut chain = Vec::new();
        if let Some(href) = &self.link {
            chain.push(Wrapper::Link { href: href.clone() });
        }
        if !self.span.is_empty() {
            chain.push(Wrapper::Span(self.span.clone()));
        }
        if self.bold {
            chain.push(Wrapper::Bold);
        }
        if self.italic {
            chain.push(Wrapper::Italic);
        }
        if self.underline {
            chain.push(Wrapper::Underline);
        }
        if self.strikethrough {
            chain.push(Wrapper::Strikethrough);
        }
        if self.superscript {
            chain.push(Wrapper::Superscript);
        } else if self.subscript {
            chain.push(Wrapper::Subscript);
        }
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn applies_requires_exact_value() {
        let link = Wrapper::Link {
            href: "http://x".into(),
        };
        assert!(link.applies(&InlineStyle::Link("http://x".into())));
        assert!(!link.applies(&InlineStyle::Link("http://y".into())));
        assert!(link.has_kind(InlineKind::Link));
    }

    #[test]
    fn strip_span_attribute_keeps_others() {
        let mut span = Wrapper::Span(SpanAttrs {
            color: Some("red".into()),
            font_size: Some("12px".into()),
            ..Default::default()
        });
        assert!(!span.strip(InlineKind::Color));
        assert!(!span.has_kind(InlineKind::Color));
        assert!(span.strip(InlineKind::FontSize));
    }

    #[test]
    fn chain_is_canonical() {
        let set = StyleSet::from_chain(&[
            Wrapper::Italic,
            Wrapper::Bold,
            Wrapper::Link {
                href: "http://x".into(),
            },
        ]);
        assert_eq!(
            set.chain(),
            vec![
                Wrapper::Link {
                    href: "http://x".into()
                },
                Wrapper::Bold,
                Wrapper::Italic
            ]
        );
    }

    #[test]
    fn innermost_script_wins() {
        let set = StyleSet::from_chain(&[Wrapper::Superscript, Wrapper::Subscript]);
        assert!(set.subscript);
        assert!(!set.superscript);
    }
}
