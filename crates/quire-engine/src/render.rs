//! Rendering a document tree to markup and plain text.
//!
//! The markup is the exact vocabulary the sanitizer understands, so
//! `sanitize(parse(to_markup(t)))` reproduces `t` for any sanitized tree.
//! Carets, and wrappers that hold nothing but a caret, are not rendered.

use crate::grammar::{BlockTag, DocTree, ListKind, NodeId, NodeKind, VoidKind, Wrapper};

/// Pixel width of one indentation step.
pub const DEFAULT_INDENT_STEP_PX: u32 = 40;

/// Options shared by rendering and sanitizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkupOptions {
    pub indent_step_px: u32,
}

impl Default for MarkupOptions {
    fn default() -> Self {
        Self {
            indent_step_px: DEFAULT_INDENT_STEP_PX,
        }
    }
}

pub fn to_markup(tree: &DocTree) -> String {
    to_markup_with(tree, &MarkupOptions::default())
}

pub fn to_markup_with(tree: &DocTree, options: &MarkupOptions) -> String {
    let mut out = String::new();
    for &child in tree.children(tree.root()) {
        render_node(tree, child, options, &mut out);
    }
    out
}

/// Whether a subtree holds anything besides carets.
pub(crate) fn has_content(tree: &DocTree, id: NodeId) -> bool {
    tree.leaves(id)
        .into_iter()
        .any(|leaf| !matches!(tree.kind(leaf), NodeKind::Caret))
}

fn render_node(tree: &DocTree, id: NodeId, options: &MarkupOptions, out: &mut String) {
    match tree.kind(id) {
        NodeKind::Root => render_children(tree, id, options, out),
        NodeKind::Text(text) => out.push_str(&html_escape::encode_text(text)),
        NodeKind::Caret => {}
        NodeKind::Void(VoidKind::LineBreak) => out.push_str("<br>"),
        NodeKind::Void(VoidKind::Rule) => out.push_str("<hr>"),
        NodeKind::Void(VoidKind::Image(image)) => {
            out.push_str("<img src=\"");
            out.push_str(&html_escape::encode_double_quoted_attribute(&image.src));
            out.push('"');
            if let Some(alt) = &image.alt {
                out.push_str(" alt=\"");
                out.push_str(&html_escape::encode_double_quoted_attribute(alt));
                out.push('"');
            }
            if let Some(width) = image.width {
                out.push_str(&format!(" width=\"{}\"", width));
            }
            if let Some(height) = image.height {
                out.push_str(&format!(" height=\"{}\"", height));
            }
            out.push('>');
        }
        NodeKind::Wrapper(wrapper) => {
            if !has_content(tree, id) {
                return;
            }
            let (open, close) = wrapper_tags(wrapper);
            out.push_str(&open);
            render_children(tree, id, options, out);
            out.push_str(close);
        }
        NodeKind::Block(block) => {
            let name = block_tag_name(block.tag);
            let mut styles: Vec<String> = Vec::new();
            if block.indent {
                styles.push(format!("margin-left: {}px", options.indent_step_px));
            }
            if let Some(align) = block.align {
                styles.push(format!("text-align: {}", align.as_str()));
            }
            if block.tag == (BlockTag::ListItem { marker_hidden: true }) {
                styles.push("list-style-type: none".to_string());
            }
            out.push('<');
            out.push_str(&name);
            if !styles.is_empty() {
                out.push_str(" style=\"");
                out.push_str(&styles.join("; "));
                out.push('"');
            }
            out.push('>');
            render_children(tree, id, options, out);
            out.push_str("</");
            out.push_str(&name);
            out.push('>');
        }
    }
}

fn render_children(tree: &DocTree, id: NodeId, options: &MarkupOptions, out: &mut String) {
    for &child in tree.children(id) {
        render_node(tree, child, options, out);
    }
}

pub(crate) fn block_tag_name(tag: BlockTag) -> String {
    match tag {
        BlockTag::Division => "div".to_string(),
        BlockTag::Heading(level) => format!("h{}", level.clamp(1, 6)),
        BlockTag::Quote => "blockquote".to_string(),
        BlockTag::List(ListKind::Ordered) => "ol".to_string(),
        BlockTag::List(ListKind::Unordered) => "ul".to_string(),
        BlockTag::ListItem { .. } => "li".to_string(),
    }
}

fn wrapper_tags(wrapper: &Wrapper) -> (String, &'static str) {
    match wrapper {
        Wrapper::Bold => ("<b>".into(), "</b>"),
        Wrapper::Italic => ("<i>".into(), "</i>"),
        Wrapper::Underline => ("<u>".into(), "</u>"),
        Wrapper::Strikethrough => ("<s>".into(), "</s>"),
        Wrapper::Superscript => ("<sup>".into(), "</sup>"),
        Wrapper::Subscript => ("<sub>".into(), "</sub>"),
        Wrapper::Link { href } => (
            format!(
                "<a href=\"{}\">",
                html_escape::encode_double_quoted_attribute(href)
            ),
            "</a>",
        ),
        Wrapper::Span(attrs) => {
            let mut parts = Vec::new();
            if let Some(v) = &attrs.font_family {
                parts.push(format!("font-family: {}", v));
            }
            if let Some(v) = &attrs.font_size {
                parts.push(format!("font-size: {}", v));
            }
            if let Some(v) = &attrs.color {
                parts.push(format!("color: {}", v));
            }
            if let Some(v) = &attrs.background {
                parts.push(format!("background-color: {}", v));
            }
            (
                format!(
                    "<span style=\"{}\">",
                    html_escape::encode_double_quoted_attribute(&parts.join("; "))
                ),
                "</span>",
            )
        }
    }
}

/// Text content with one line per line block and line breaks as newlines.
pub fn to_plain_text(tree: &DocTree) -> String {
    let mut lines = Vec::new();
    collect_lines(tree, tree.root(), &mut lines);
    lines.join("\n")
}

fn collect_lines(tree: &DocTree, id: NodeId, lines: &mut Vec<String>) {
    let has_blocks = tree
        .children(id)
        .iter()
        .any(|&c| tree.kind(c).is_block());
    if has_blocks {
        for &child in tree.children(id) {
            collect_lines(tree, child, lines);
        }
        return;
    }
    if id == tree.root() && tree.children(id).is_empty() {
        return;
    }
    let mut line = String::new();
    for leaf in tree.leaves(id) {
        match tree.kind(leaf) {
            NodeKind::Text(text) => line.push_str(text),
            NodeKind::Void(VoidKind::LineBreak) | NodeKind::Void(VoidKind::Rule) => {
                line.push('\n')
            }
            NodeKind::Void(VoidKind::Image(image)) => {
                line.push_str(image.alt.as_deref().unwrap_or(""))
            }
            _ => {}
        }
    }
    // A line holding only a break is an empty line
    if line == "\n" {
        line.clear();
    }
    lines.push(line);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{Alignment, Block, ImageAttrs};
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;

    #[test]
    fn renders_blocks_with_styles() {
        let mut tree = DocTree::new();
        let root = tree.root();
        let indent = tree.create_child(root, NodeKind::indent());
        let heading = tree.create_child(
            indent,
            NodeKind::Block(Block {
                tag: BlockTag::Heading(2),
                align: Some(Alignment::Center),
                indent: false,
            }),
        );
        tree.create_child(heading, NodeKind::text("Title & <more>"));

        assert_snapshot!(
            to_markup(&tree),
            @r#"<div style="margin-left: 40px"><h2 style="text-align: center">Title &amp; &lt;more&gt;</h2></div>"#
        );
        assert_eq!(
            to_markup_with(&tree, &MarkupOptions { indent_step_px: 24 }),
            r#"<div style="margin-left: 24px"><h2 style="text-align: center">Title &amp; &lt;more&gt;</h2></div>"#
        );
    }

    #[test]
    fn renders_voids_and_skips_caret_wrappers() {
        let mut tree = DocTree::new();
        let div = tree.create_child(tree.root(), NodeKind::division());
        tree.create_child(
            div,
            NodeKind::Void(VoidKind::Image(ImageAttrs {
                src: "a.png".into(),
                alt: Some("A \"quoted\" alt".into()),
                width: Some(10),
                height: None,
            })),
        );
        let bold = tree.create_child(div, NodeKind::Wrapper(Wrapper::Bold));
        tree.create_child(bold, NodeKind::Caret);
        tree.create_child(div, NodeKind::line_break());

        assert_eq!(
            to_markup(&tree),
            r#"<div><img src="a.png" alt="A &quot;quoted&quot; alt" width="10"><br></div>"#
        );
    }

    #[test]
    fn plain_text_lines() {
        let mut tree = DocTree::new();
        let root = tree.root();
        let list = tree.create_child(root, NodeKind::list(ListKind::Ordered));
        for text in ["one", "two"] {
            let li = tree.create_child(list, NodeKind::list_item());
            tree.create_child(li, NodeKind::text(text));
        }
        let empty = tree.create_child(root, NodeKind::division());
        tree.create_child(empty, NodeKind::line_break());

        assert_eq!(to_plain_text(&tree), "one\ntwo\n");
    }
}
