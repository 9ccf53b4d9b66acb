//! # Sanitizer
//!
//! Converts a foreign tree (pasted or dropped markup, already parsed by
//! `quire-markup`) into grammar nodes.
//!
//! ## Approach
//!
//! The foreign tree is walked once with a [`Context`] describing the
//! effective styling at each point. Inline elements never produce nodes;
//! they only adjust the context. Every text or void leaf is created under
//! the current block with its full canonical wrapper chain, and the inline
//! normalizer later merges neighbouring chains. This makes inline elements
//! around blocks (`<b><p>x</p></b>`) and overlapping overrides
//! (`<b><span style="font-weight: normal">x</span></b>`) come out right
//! with no special cases.
//!
//! ```text
//! <p><b>a<i>b</i></b></p>
//!
//! div                        div
//! ├── b["a"]         ──►     └── b
//! └── b[i["b"]]                  ├── "a"
//!                                └── i["b"]
//! ```
//!
//! ## Element handling
//!
//! | class | elements | result |
//! |-------|----------|--------|
//! | dropped | `script`, `style`, `head`, `iframe`, form controls, ... | removed with content |
//! | void | `br`, `hr`, `img` | line break, rule, image (safe `src` only) |
//! | inline | `b`, `strong`, `i`, `em`, `u`, `s`, `sup`, `sub`, `a`, `span`, `font` | context only |
//! | block | `p`, `div`, `h1`-`h6`, `blockquote`, `ul`, `ol`, `li`, `pre`, ... | grammar block |
//! | other | anything else | elided, children kept |
//!
//! Headings and alignment are carried down the context to the line blocks
//! that end up holding the text, so `<h1><div>x</div></h1>` becomes a
//! heading rather than a division inside a demoted heading. A left margin
//! or padding becomes one indent step per `indent_step_px`.
//!
//! ## Whitespace
//!
//! Outside preformatted content, runs of ASCII whitespace collapse to a
//! single space, a space at the start of a line or right after another
//! space is dropped, and spaces before a line break or at the end of a line
//! are trimmed. A line left with nothing but collapsed whitespace is
//! removed. In preformatted content newlines become line breaks and spaces
//! become no-break spaces.
//!
//! The output of [`sanitize`] rendered with [`crate::render::to_markup`]
//! and sanitized again yields the same tree.

pub mod css;

use quire_markup::{ForeignElement, ForeignNode};

use crate::grammar::{
    Alignment, Block, BlockTag, DocTree, ImageAttrs, ListKind, NodeId, NodeKind, SpanAttrs,
    StyleSet, UrlUse, VoidKind, is_safe_url,
};
use crate::normalize::{is_line_block, tidy};
use crate::render::MarkupOptions;

/// Elements removed together with their content.
const DROPPED: &[&str] = &[
    "script", "style", "head", "title", "template", "noscript", "iframe", "frame", "frameset",
    "object", "embed", "applet", "svg", "math", "canvas", "audio", "video", "select", "textarea",
    "input", "button", "option", "base", "meta", "link", "param", "source", "track", "area", "map",
];

/// Elements that become plain divisions.
const DIVISION_LIKE: &[&str] = &[
    "p",
    "div",
    "pre",
    "address",
    "article",
    "aside",
    "section",
    "header",
    "footer",
    "main",
    "nav",
    "figure",
    "figcaption",
    "center",
    "dl",
    "dt",
    "dd",
    "tr",
    "caption",
    "details",
    "summary",
    "form",
    "fieldset",
    "legend",
    "hgroup",
    "listing",
    "plaintext",
    "xmp",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Vertical {
    Super,
    Sub,
    Baseline,
}

/// Effective styling at a point of the walk.
///
/// `None` means "not decided here"; the innermost decision wins.
#[derive(Debug, Clone, Default)]
struct Context {
    bold: Option<bool>,
    italic: Option<bool>,
    underline: Option<bool>,
    strikethrough: Option<bool>,
    vertical: Option<Vertical>,
    link: Option<String>,
    span: SpanAttrs,
    preformatted: bool,
    heading: Option<u8>,
    align: Option<Alignment>,
}

impl Context {
    fn styles(&self) -> StyleSet {
        StyleSet {
            link: self.link.clone(),
            span: self.span.clone(),
            bold: self.bold == Some(true),
            italic: self.italic == Some(true),
            underline: self.underline == Some(true),
            strikethrough: self.strikethrough == Some(true),
            superscript: self.vertical == Some(Vertical::Super),
            subscript: self.vertical == Some(Vertical::Sub),
        }
    }

    /// Apply an element's implied inline semantics.
    fn apply_tag(&mut self, element: &ForeignElement) {
        match element.name.as_str() {
            "b" | "strong" => self.bold = Some(true),
            "i" | "em" | "cite" | "dfn" | "var" => self.italic = Some(true),
            "u" | "ins" => self.underline = Some(true),
            "s" | "strike" | "del" => self.strikethrough = Some(true),
            "sup" => self.vertical = Some(Vertical::Super),
            "sub" => self.vertical = Some(Vertical::Sub),
            "a" => {
                if let Some(href) = element.attr("href").map(str::trim)
                    && !href.is_empty()
                    && is_safe_url(href, UrlUse::Link)
                {
                    self.link = Some(href.to_string());
                }
            }
            "font" => {
                if let Some(face) = element.attr("face").and_then(css::clean_value) {
                    self.span.font_family = Some(face);
                }
                if let Some(size) = element.attr("size").and_then(font_size_keyword) {
                    self.span.font_size = Some(size.to_string());
                }
                if let Some(color) = element.attr("color").and_then(css::clean_value) {
                    self.span.color = Some(color);
                }
            }
            "pre" | "listing" | "plaintext" | "xmp" => self.preformatted = true,
            _ => {}
        }
        if let Some(align) = element.attr("align").and_then(Alignment::parse) {
            self.align = Some(align);
        }
    }

    /// Apply one style declaration.
    fn apply_declaration(&mut self, prop: &str, value: &str) {
        let lower = value.to_ascii_lowercase();
        match prop {
            "font-weight" => {
                self.bold = match lower.as_str() {
                    "bold" | "bolder" => Some(true),
                    "normal" | "lighter" => Some(false),
                    other => other.parse::<u32>().ok().map(|w| w >= 600).or(self.bold),
                }
            }
            "font-style" => {
                self.italic = match lower.as_str() {
                    "italic" | "oblique" => Some(true),
                    "normal" => Some(false),
                    _ => self.italic,
                }
            }
            "text-decoration" | "text-decoration-line" => {
                if lower.contains("none") {
                    self.underline = Some(false);
                    self.strikethrough = Some(false);
                }
                if lower.contains("underline") {
                    self.underline = Some(true);
                }
                if lower.contains("line-through") {
                    self.strikethrough = Some(true);
                }
            }
            "vertical-align" => {
                self.vertical = match lower.as_str() {
                    "super" => Some(Vertical::Super),
                    "sub" => Some(Vertical::Sub),
                    "baseline" => Some(Vertical::Baseline),
                    _ => self.vertical,
                }
            }
            "font-family" => {
                if let Some(v) = css::clean_value(value) {
                    self.span.font_family = Some(v);
                }
            }
            "font-size" => {
                if let Some(v) = css::clean_value(value) {
                    self.span.font_size = Some(v);
                }
            }
            "color" => {
                if let Some(v) = css::clean_value(value) {
                    self.span.color = Some(v);
                }
            }
            "background-color" | "background" => {
                if let Some(v) = css::clean_value(value) {
                    self.span.background = Some(v);
                }
            }
            "text-align" => {
                if let Some(align) = Alignment::parse(value) {
                    self.align = Some(align);
                }
            }
            "white-space" => {
                self.preformatted = lower.starts_with("pre");
            }
            _ => {}
        }
    }
}

/// Legacy `<font size>` steps.
fn font_size_keyword(size: &str) -> Option<&'static str> {
    match size.trim() {
        "1" => Some("x-small"),
        "2" => Some("small"),
        "3" => Some("medium"),
        "4" => Some("large"),
        "5" => Some("x-large"),
        "6" => Some("xx-large"),
        "7" => Some("xxx-large"),
        _ => None,
    }
}

fn heading_level(name: &str) -> Option<u8> {
    match name {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

struct Builder<'o> {
    tree: DocTree,
    options: &'o MarkupOptions,
}

impl Builder<'_> {
    fn push_leaf(&mut self, block: NodeId, kind: NodeKind, ctx: &Context) {
        let mut parent = block;
        for wrapper in ctx.styles().chain() {
            parent = self.tree.create_child(parent, NodeKind::Wrapper(wrapper));
        }
        self.tree.create_child(parent, kind);
    }

    fn visit(&mut self, node: &ForeignNode, block: NodeId, ctx: &Context) {
        match node {
            ForeignNode::Text(text) => self.text(text, block, ctx),
            ForeignNode::Element(element) => self.element(element, block, ctx),
        }
    }

    fn text(&mut self, text: &str, block: NodeId, ctx: &Context) {
        if !ctx.preformatted {
            let collapsed = collapse_whitespace(text);
            if !collapsed.is_empty() {
                self.push_leaf(block, NodeKind::Text(collapsed), ctx);
            }
            return;
        }
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        for (index, line) in text.split('\n').enumerate() {
            if index > 0 {
                self.push_leaf(block, NodeKind::line_break(), ctx);
            }
            if !line.is_empty() {
                let line: String = line
                    .chars()
                    .map(|c| if c == ' ' || c == '\t' { '\u{a0}' } else { c })
                    .collect();
                self.push_leaf(block, NodeKind::Text(line), ctx);
            }
        }
    }

    fn element(&mut self, element: &ForeignElement, block: NodeId, ctx: &Context) {
        let name = element.name.as_str();
        if DROPPED.contains(&name) {
            log::debug!("dropping <{}> with its content", name);
            return;
        }

        let mut ctx = ctx.clone();
        ctx.apply_tag(element);
        let declarations = element
            .attr("style")
            .map(css::parse_declarations)
            .unwrap_or_default();
        for (prop, value) in &declarations {
            ctx.apply_declaration(prop, value);
        }

        match name {
            "br" => self.push_leaf(block, NodeKind::line_break(), &ctx),
            "hr" => self.push_leaf(block, NodeKind::Void(VoidKind::Rule), &ctx),
            "img" => {
                if let Some(image) = image_attrs(element) {
                    self.push_leaf(block, NodeKind::Void(VoidKind::Image(image)), &ctx);
                }
            }
            "td" | "th" => {
                self.children(element, block, &ctx);
                self.push_leaf(block, NodeKind::text(" "), &ctx);
            }
            _ => {
                let Some(tag) = block_tag(name, &ctx) else {
                    self.children(element, block, &ctx);
                    return;
                };
                if let Some(level) = heading_level(name) {
                    ctx.heading = Some(level);
                }
                let levels = self.indent_levels(&declarations);
                let new = self.open_block(block, tag, name, levels, &ctx);
                // Alignment and heading apply to the blocks created for
                // this element, not to nested lists and quotes
                let mut inner = ctx.clone();
                if matches!(tag, BlockTag::List(_) | BlockTag::Quote) {
                    inner.heading = None;
                }
                self.children(element, new, &inner);
            }
        }
    }

    fn children(&mut self, element: &ForeignElement, block: NodeId, ctx: &Context) {
        for child in &element.children {
            self.visit(child, block, ctx);
        }
    }

    /// Indent steps requested by a left margin or padding.
    fn indent_levels(&self, declarations: &[(String, String)]) -> usize {
        let step = self.options.indent_step_px.max(1) as f32;
        let mut px = 0.0;
        for (prop, value) in declarations {
            let left = match prop.as_str() {
                "margin-left" | "padding-left" | "margin-inline-start" => css::length_px(value),
                "margin" | "padding" => css::shorthand_left(value).and_then(css::length_px),
                _ => None,
            };
            if let Some(left) = left {
                px += left;
            }
        }
        if px <= 0.0 {
            return 0;
        }
        (px / step).round() as usize
    }

    fn open_block(
        &mut self,
        parent: NodeId,
        tag: BlockTag,
        name: &str,
        levels: usize,
        ctx: &Context,
    ) -> NodeId {
        let carries_indent = matches!(tag, BlockTag::Division | BlockTag::Heading(_));
        let extra = match tag {
            _ if levels == 0 => 0,
            _ if carries_indent => levels - 1,
            BlockTag::Quote => levels,
            _ => 0,
        };
        let mut container = parent;
        for _ in 0..extra {
            container = self.tree.create_child(container, NodeKind::indent());
        }
        let align = match tag {
            BlockTag::List(_) | BlockTag::Quote => None,
            _ => ctx.align,
        };
        log::debug!("<{}> -> {:?}", name, tag);
        self.tree.create_child(
            container,
            NodeKind::Block(Block {
                tag,
                align,
                indent: carries_indent && levels > 0,
            }),
        )
    }
}

/// Grammar block for an element name, if it is a block element.
fn block_tag(name: &str, ctx: &Context) -> Option<BlockTag> {
    let division = || match ctx.heading {
        Some(level) => BlockTag::Heading(level),
        None => BlockTag::Division,
    };
    if let Some(level) = heading_level(name) {
        return Some(BlockTag::Heading(level));
    }
    match name {
        "blockquote" => Some(BlockTag::Quote),
        "ul" | "menu" | "dir" => Some(BlockTag::List(ListKind::Unordered)),
        "ol" => Some(BlockTag::List(ListKind::Ordered)),
        "li" => Some(BlockTag::ListItem {
            marker_hidden: false,
        }),
        _ if DIVISION_LIKE.contains(&name) => Some(division()),
        _ => None,
    }
}

fn image_attrs(element: &ForeignElement) -> Option<ImageAttrs> {
    let src = element.attr("src")?.trim();
    if src.is_empty() || !is_safe_url(src, UrlUse::ImageSource) {
        log::debug!("dropping image with unsafe or empty source");
        return None;
    }
    let dimension = |name: &str| {
        element
            .attr(name)
            .and_then(|v| v.trim().trim_end_matches("px").parse::<u32>().ok())
    };
    Some(ImageAttrs {
        src: src.to_string(),
        alt: element.attr("alt").map(str::to_string),
        width: dimension("width"),
        height: dimension("height"),
    })
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_ascii_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Trim collapsible spaces in one line block.
///
/// Returns `true` when the line held text and nothing is left of it.
fn trim_line(tree: &mut DocTree, line: NodeId) -> bool {
    let leaves = tree.leaves(line);
    if leaves.is_empty() {
        return false;
    }

    // Forward: leading spaces at line start and after a space
    let mut drop_leading = true;
    for &leaf in &leaves {
        match tree.kind_mut(leaf) {
            NodeKind::Text(text) => {
                if drop_leading && text.starts_with(' ') {
                    text.remove(0);
                }
                if !text.is_empty() {
                    drop_leading = text.ends_with(' ');
                }
            }
            NodeKind::Void(VoidKind::LineBreak) => drop_leading = true,
            NodeKind::Caret => {}
            _ => drop_leading = false,
        }
    }

    // Backward: trailing spaces before a break or the line end
    let mut drop_trailing = true;
    for &leaf in leaves.iter().rev() {
        match tree.kind_mut(leaf) {
            NodeKind::Text(text) => {
                if drop_trailing {
                    let trimmed = text.trim_end_matches(' ').len();
                    text.truncate(trimmed);
                }
                if !text.is_empty() {
                    drop_trailing = false;
                }
            }
            NodeKind::Void(VoidKind::LineBreak) => drop_trailing = true,
            NodeKind::Caret => {}
            _ => drop_trailing = false,
        }
    }

    leaves
        .iter()
        .all(|&leaf| tree.text(leaf).is_some_and(str::is_empty))
}

/// Drop alignment from containers; their lines already carry it.
fn clear_container_alignment(tree: &mut DocTree) {
    for node in tree.descendants(tree.root()) {
        if !is_line_block(tree, node)
            && let Some(block) = tree.kind_mut(node).as_block_mut()
        {
            block.align = None;
        }
    }
}

pub fn sanitize(nodes: &[ForeignNode]) -> DocTree {
    sanitize_with(nodes, &MarkupOptions::default())
}

pub fn sanitize_with(nodes: &[ForeignNode], options: &MarkupOptions) -> DocTree {
    let mut builder = Builder {
        tree: DocTree::new(),
        options,
    };
    let root = builder.tree.root();
    let ctx = Context::default();
    for node in nodes {
        builder.visit(node, root, &ctx);
    }
    let mut tree = builder.tree;

    tidy(&mut tree);
    let lines: Vec<NodeId> = tree
        .descendants(tree.root())
        .into_iter()
        .filter(|&n| is_line_block(&tree, n))
        .collect();
    for line in lines {
        if trim_line(&mut tree, line) {
            tree.remove(line);
        }
    }
    clear_container_alignment(&mut tree);
    tidy(&mut tree);

    log::debug!("sanitized {} foreign nodes into {} nodes", nodes.len(), tree.len());
    tree
}

/// Parse and sanitize a markup string.
pub fn sanitize_markup(markup: &str) -> DocTree {
    sanitize(&quire_markup::parse(markup))
}

pub fn sanitize_markup_with(markup: &str, options: &MarkupOptions) -> DocTree {
    sanitize_with(&quire_markup::parse(markup), options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invariants::violations;
    use crate::render::{to_markup, to_markup_with};
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn clean(markup: &str) -> String {
        let tree = sanitize_markup(markup);
        assert!(violations(&tree).is_empty(), "{:?}", violations(&tree));
        to_markup(&tree)
    }

    #[rstest]
    #[case("<p>Hello <b>world</b></p>", "<div>Hello <b>world</b></div>")]
    #[case("<strong>a</strong><em>b</em>", "<div><b>a</b><i>b</i></div>")]
    #[case("<b><p>x</p></b>", "<div><b>x</b></div>")]
    #[case("<b>a<span style=\"font-weight: normal\">b</span></b>", "<div><b>a</b>b</div>")]
    #[case("<sub>1<sup>2</sup></sub>", "<div><sub>1</sub><sup>2</sup></div>")]
    #[case("<i>a</i><i>b</i>", "<div><i>ab</i></div>")]
    #[case("<p>a<script>alert(1)</script>b</p>", "<div>ab</div>")]
    #[case("<p><blink>kept</blink></p>", "<div>kept</div>")]
    #[case("<a href=\"javascript:alert(1)\">x</a>", "<div>x</div>")]
    #[case("<a href=\"https://x.test/\">x</a>", "<div><a href=\"https://x.test/\">x</a></div>")]
    #[case("<img src=\"javascript:x\"><img src=\"a.png\" width=\"5\">", "<div><img src=\"a.png\" width=\"5\"></div>")]
    fn inline_content(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(clean(input), expected);
    }

    #[rstest]
    #[case("<p>  a \n  b  </p>", "<div>a b</div>")]
    #[case("<p>a <b> b</b></p>", "<div>a <b>b</b></div>")]
    #[case("<p>a <br> b</p>", "<div>a<br>b</div>")]
    #[case("<p>a</p>\n\n<p>b</p>", "<div>a</div><div>b</div>")]
    #[case("<p> </p><p>b</p>", "<div>b</div>")]
    #[case("<pre>a  b\nc</pre>", "<div>a\u{a0}\u{a0}b<br>c</div>")]
    fn whitespace(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(clean(input), expected);
    }

    #[rstest]
    #[case("<h2>Title</h2>", "<h2>Title</h2>")]
    #[case("<h1><div>a</div><div>b</div></h1>", "<h1>a</h1><h1>b</h1>")]
    #[case("<div style=\"text-align: center\"><p>a</p><p>b</p></div>", "<div style=\"text-align: center\">a</div><div style=\"text-align: center\">b</div>")]
    #[case("<p align=\"right\">a</p>", "<div style=\"text-align: right\">a</div>")]
    #[case("<blockquote>q</blockquote>", "<blockquote><div>q</div></blockquote>")]
    #[case("<ul><li>a<li>b</ul>", "<ul><li>a</li><li>b</li></ul>")]
    #[case("<li>orphan</li>", "<div>orphan</div>")]
    #[case("<ol><li>a<ol><li>b</li></ol></li></ol>", "<ol><li><div>a</div><ol><li>b</li></ol></li></ol>")]
    fn blocks(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(clean(input), expected);
    }

    #[test]
    fn margins_become_indent_steps() {
        assert_snapshot!(
            clean("<p style=\"margin-left: 80px\">a</p>"),
            @r#"<div style="margin-left: 40px"><div style="margin-left: 40px">a</div></div>"#
        );
        assert_snapshot!(
            clean("<p style=\"margin: 0in 0in 0in .5in\">a</p>"),
            @r#"<div style="margin-left: 40px">a</div>"#
        );
        assert_snapshot!(
            clean("<blockquote style=\"margin-left: 40px\">q</blockquote>"),
            @r#"<div style="margin-left: 40px"><blockquote><div>q</div></blockquote></div>"#
        );
    }

    #[test]
    fn indent_step_is_configurable() {
        let options = MarkupOptions { indent_step_px: 20 };
        let tree = sanitize_markup_with("<p style=\"margin-left: 40px\">a</p>", &options);
        assert_eq!(
            to_markup_with(&tree, &options),
            r#"<div style="margin-left: 20px"><div style="margin-left: 20px">a</div></div>"#
        );
    }

    #[test]
    fn font_tag_and_span_styles() {
        assert_snapshot!(
            clean("<font face=\"Arial\" size=\"5\" color=\"#f00\">x</font><span style=\"background: yellow; color: url(x)\">y</span>"),
            @r##"<div><span style="font-family: Arial; font-size: x-large; color: #f00">x</span><span style="background-color: yellow">y</span></div>"##
        );
    }

    #[test]
    fn word_fragment() {
        let input = r#"<html><head><meta charset="utf-8"><style>p{color:red}</style></head>
<body><!--StartFragment--><p class="MsoNormal" style="margin-left:.5in"><b><span style="font-size:14.0pt">Heading-ish</span></b><o:p></o:p></p>
<p class="MsoNormal">Plain &amp; <i>simple</i> text&nbsp;</p><!--EndFragment--></body></html>"#;
        assert_eq!(
            clean(input),
            "<div style=\"margin-left: 40px\"><span style=\"font-size: 14.0pt\"><b>Heading-ish</b></span></div>\
             <div>Plain &amp; <i>simple</i> text\u{a0}</div>"
        );
    }

    #[rstest]
    #[case("<p>Hello <b>world</b></p><ul><li>a</li><li>b<ul><li>c</li></ul></li></ul>")]
    #[case("<h1 style=\"text-align:center\">T</h1><blockquote><p>q <i>x</i></p></blockquote>")]
    #[case("<p style=\"margin-left: 120px\"><a href=\"http://a\">l<b>b</b></a><br>x</p>")]
    #[case("<pre>a  b\n c</pre><p><font size=2>s</font><sup>1</sup></p><hr>")]
    #[case("<div><div>\n</div><span style=\"color:red\">  </span>z</div>")]
    fn sanitize_is_idempotent(#[case] input: &str) {
        let first = sanitize_markup(input);
        let rendered = to_markup(&first);
        let second = sanitize_markup(&rendered);
        assert_eq!(to_markup(&second), rendered);
        assert!(violations(&second).is_empty());
    }
}
