//! # Interchange Format
//!
//! Documents travel as JSON arrays of nodes. A node is either a plain
//! string (text) or an element object:
//!
//! ```json
//! [
//!   {"tag": "h1", "children": ["Title"]},
//!   {"tag": "div", "attrs": {"align": "center"}, "children": [
//!     "plain ", {"tag": "b", "children": ["bold"]}
//!   ]}
//! ]
//! ```
//!
//! ## Import is strict
//!
//! Unlike pasted markup, which the sanitizer absorbs whatever it looks
//! like, interchange input must already follow the grammar. [`import`]
//! rejects unknown tags and attributes, script-scheme URLs, voids with
//! children, blocks inside inline content, malformed lists and containers
//! holding inline content directly. On any error no tree is produced.
//!
//! Accepted vocabulary:
//!
//! | tag | attributes |
//! |-----|------------|
//! | `div` | `align`, `indent` (`"true"`) |
//! | `h1`-`h6` | `align`, `indent` |
//! | `blockquote`, `ul`, `ol` | none |
//! | `li` | `align` |
//! | `b`, `i`, `u`, `s`, `sup`, `sub` | none |
//! | `a` | `href` (required) |
//! | `span` | `font-family`, `font-size`, `color`, `background-color` (at least one) |
//! | `img` | `src` (required), `alt`, `width`, `height` |
//! | `br`, `hr` | none |
//!
//! ## Selections and hashes
//!
//! [`SerializedSelection`] stores each endpoint as a child-index path from
//! the root plus a leaf-local offset, so it survives a tree clone but not
//! an edit. [`content_hash`] fingerprints the exported form, which leaves
//! out the caret placeholder: moving the caret does not change the hash.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::grammar::{
    Alignment, Block, BlockTag, DocTree, ImageAttrs, ListKind, NodeId, NodeKind, SpanAttrs,
    UrlUse, VoidKind, Wrapper, is_safe_url,
};
use crate::normalize::tidy;
use crate::range::{Point, Selection};
use crate::render::{block_tag_name, has_content};
use crate::sanitize::css::clean_value;

/// One node of an interchange document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SerializedNode {
    Text(String),
    Element(SerializedElement),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SerializedElement {
    pub tag: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SerializedNode>,
}

impl SerializedElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn with_children(mut self, children: Vec<SerializedNode>) -> Self {
        self.children = children;
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Unknown tag: <{0}>")]
    UnknownTag(String),
    #[error("Unknown attribute `{attr}` on <{tag}>")]
    UnknownAttribute { tag: String, attr: String },
    #[error("Invalid value {value:?} for `{attr}` on <{tag}>")]
    InvalidAttribute {
        tag: String,
        attr: String,
        value: String,
    },
    #[error("Missing attribute `{attr}` on <{tag}>")]
    MissingAttribute { tag: String, attr: String },
    #[error("Unsafe URL: {0}")]
    UnsafeUrl(String),
    #[error("Void element <{0}> cannot have children")]
    VoidWithChildren(String),
    #[error("Block <{block}> inside inline <{inline}>")]
    BlockInsideInline { block: String, inline: String },
    #[error("Invalid list structure: {0}")]
    ListShape(String),
    #[error("<{0}> mixes block and inline children")]
    MixedChildren(String),
    #[error("<{0}> cannot hold inline content directly")]
    InlineInContainer(String),
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

// ----------------------------------------------------------------------
// Export
// ----------------------------------------------------------------------

/// The interchange form of `tree`, without the caret placeholder.
pub fn export(tree: &DocTree) -> Vec<SerializedNode> {
    export_children(tree, tree.root())
}

fn export_children(tree: &DocTree, id: NodeId) -> Vec<SerializedNode> {
    tree.children(id)
        .iter()
        .filter_map(|&child| export_node(tree, child))
        .collect()
}

fn export_node(tree: &DocTree, id: NodeId) -> Option<SerializedNode> {
    let element = match tree.kind(id) {
        NodeKind::Root | NodeKind::Caret => return None,
        NodeKind::Text(text) => return Some(SerializedNode::Text(text.clone())),
        NodeKind::Void(VoidKind::LineBreak) => SerializedElement::new("br"),
        NodeKind::Void(VoidKind::Rule) => SerializedElement::new("hr"),
        NodeKind::Void(VoidKind::Image(image)) => {
            let mut element = SerializedElement::new("img").with_attr("src", &image.src);
            if let Some(alt) = &image.alt {
                element = element.with_attr("alt", alt);
            }
            if let Some(width) = image.width {
                element = element.with_attr("width", width.to_string());
            }
            if let Some(height) = image.height {
                element = element.with_attr("height", height.to_string());
            }
            element
        }
        NodeKind::Wrapper(wrapper) => {
            if !has_content(tree, id) {
                return None;
            }
            export_wrapper(wrapper).with_children(export_children(tree, id))
        }
        NodeKind::Block(block) => {
            let mut element = SerializedElement::new(block_tag_name(block.tag));
            if let Some(align) = block.align {
                element = element.with_attr("align", align.as_str());
            }
            if block.indent {
                element = element.with_attr("indent", "true");
            }
            element.with_children(export_children(tree, id))
        }
    };
    Some(SerializedNode::Element(element))
}

fn export_wrapper(wrapper: &Wrapper) -> SerializedElement {
    match wrapper {
        Wrapper::Bold => SerializedElement::new("b"),
        Wrapper::Italic => SerializedElement::new("i"),
        Wrapper::Underline => SerializedElement::new("u"),
        Wrapper::Strikethrough => SerializedElement::new("s"),
        Wrapper::Superscript => SerializedElement::new("sup"),
        Wrapper::Subscript => SerializedElement::new("sub"),
        Wrapper::Link { href } => SerializedElement::new("a").with_attr("href", href),
        Wrapper::Span(attrs) => {
            let mut element = SerializedElement::new("span");
            for (name, value) in [
                ("font-family", &attrs.font_family),
                ("font-size", &attrs.font_size),
                ("color", &attrs.color),
                ("background-color", &attrs.background),
            ] {
                if let Some(value) = value {
                    element = element.with_attr(name, value);
                }
            }
            element
        }
    }
}

pub fn to_json(tree: &DocTree) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&export(tree))
}

// ----------------------------------------------------------------------
// Import
// ----------------------------------------------------------------------

/// Build a document from interchange nodes, rejecting anything outside
/// the grammar.
pub fn import(nodes: &[SerializedNode]) -> Result<DocTree, ImportError> {
    let mut tree = DocTree::new();
    let root = tree.root();
    for node in nodes {
        import_node(&mut tree, root, "root", node)?;
    }
    check_children(&tree, root, "root")?;
    tidy(&mut tree);
    log::debug!("imported {} top-level nodes", nodes.len());
    Ok(tree)
}

pub fn from_json(json: &str) -> Result<DocTree, ImportError> {
    let nodes: Vec<SerializedNode> = serde_json::from_str(json)?;
    import(&nodes)
}

fn import_node(
    tree: &mut DocTree,
    parent: NodeId,
    parent_tag: &str,
    node: &SerializedNode,
) -> Result<(), ImportError> {
    let parent_kind = tree.kind(parent).clone();
    let element = match node {
        SerializedNode::Text(text) => {
            if parent_kind.is_list() {
                return Err(ImportError::ListShape(format!(
                    "text directly inside <{parent_tag}>"
                )));
            }
            if !text.is_empty() {
                tree.create_child(parent, NodeKind::text(text.as_str()));
            }
            return Ok(());
        }
        SerializedNode::Element(element) => element,
    };

    let kind = element_kind(element)?;
    let tag = element.tag.as_str();

    if kind.is_leaf() && !element.children.is_empty() {
        return Err(ImportError::VoidWithChildren(tag.to_string()));
    }
    if kind.is_block() && parent_kind.is_inline() {
        return Err(ImportError::BlockInsideInline {
            block: tag.to_string(),
            inline: parent_tag.to_string(),
        });
    }
    if parent_kind.is_list() && !kind.is_list_item() {
        return Err(ImportError::ListShape(format!(
            "<{tag}> directly inside <{parent_tag}>"
        )));
    }
    if kind.is_list_item() && !parent_kind.is_list() {
        return Err(ImportError::ListShape(format!(
            "<li> inside <{parent_tag}>"
        )));
    }

    let id = tree.create_child(parent, kind);
    for child in &element.children {
        import_node(tree, id, tag, child)?;
    }
    check_children(tree, id, tag)
}

fn check_children(tree: &DocTree, id: NodeId, tag: &str) -> Result<(), ImportError> {
    let children = tree.children(id);
    let has_block = children.iter().any(|&c| tree.kind(c).is_block());
    let has_inline = children.iter().any(|&c| tree.kind(c).is_inline());
    let holds_blocks_only = matches!(tree.kind(id), NodeKind::Root) || tree.kind(id).is_quote();
    if has_block && has_inline {
        return Err(ImportError::MixedChildren(tag.to_string()));
    }
    if has_inline && holds_blocks_only {
        return Err(ImportError::InlineInContainer(tag.to_string()));
    }
    Ok(())
}

/// Attributes each tag accepts.
fn allowed_attrs(tag: &str) -> Option<&'static [&'static str]> {
    Some(match tag {
        "div" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => &["align", "indent"],
        "li" => &["align"],
        "blockquote" | "ul" | "ol" | "b" | "i" | "u" | "s" | "sup" | "sub" | "br" | "hr" => &[],
        "a" => &["href"],
        "span" => &["font-family", "font-size", "color", "background-color"],
        "img" => &["src", "alt", "width", "height"],
        _ => return None,
    })
}

fn element_kind(element: &SerializedElement) -> Result<NodeKind, ImportError> {
    let tag = element.tag.as_str();
    let allowed = allowed_attrs(tag).ok_or_else(|| ImportError::UnknownTag(tag.to_string()))?;
    if let Some(attr) = element.attrs.keys().find(|a| !allowed.contains(&a.as_str())) {
        return Err(ImportError::UnknownAttribute {
            tag: tag.to_string(),
            attr: attr.clone(),
        });
    }

    let invalid = |attr: &str, value: &str| ImportError::InvalidAttribute {
        tag: tag.to_string(),
        attr: attr.to_string(),
        value: value.to_string(),
    };
    let missing = |attr: &str| ImportError::MissingAttribute {
        tag: tag.to_string(),
        attr: attr.to_string(),
    };
    let attr = |name: &str| element.attrs.get(name).map(String::as_str);

    let block = |block_tag: BlockTag| -> Result<NodeKind, ImportError> {
        let align = match attr("align") {
            None => None,
            Some(value) => Some(
                Alignment::parse(value)
                    .filter(|a| a.as_str() == value)
                    .ok_or_else(|| invalid("align", value))?,
            ),
        };
        let indent = match attr("indent") {
            None => false,
            Some("true") => true,
            Some(value) => return Err(invalid("indent", value)),
        };
        Ok(NodeKind::Block(Block {
            tag: block_tag,
            align,
            indent,
        }))
    };

    let kind = match tag {
        "div" => block(BlockTag::Division)?,
        "blockquote" => block(BlockTag::Quote)?,
        "ul" => block(BlockTag::List(ListKind::Unordered))?,
        "ol" => block(BlockTag::List(ListKind::Ordered))?,
        "li" => block(BlockTag::ListItem {
            marker_hidden: false,
        })?,
        "b" => NodeKind::Wrapper(Wrapper::Bold),
        "i" => NodeKind::Wrapper(Wrapper::Italic),
        "u" => NodeKind::Wrapper(Wrapper::Underline),
        "s" => NodeKind::Wrapper(Wrapper::Strikethrough),
        "sup" => NodeKind::Wrapper(Wrapper::Superscript),
        "sub" => NodeKind::Wrapper(Wrapper::Subscript),
        "br" => NodeKind::line_break(),
        "hr" => NodeKind::Void(VoidKind::Rule),
        "a" => {
            let href = attr("href").ok_or_else(|| missing("href"))?;
            if !is_safe_url(href, UrlUse::Link) {
                return Err(ImportError::UnsafeUrl(href.to_string()));
            }
            NodeKind::Wrapper(Wrapper::Link {
                href: href.to_string(),
            })
        }
        "span" => {
            let value = |name: &str| -> Result<Option<String>, ImportError> {
                match attr(name) {
                    None => Ok(None),
                    Some(raw) => clean_value(raw)
                        .filter(|v| v == raw)
                        .map(Some)
                        .ok_or_else(|| invalid(name, raw)),
                }
            };
            let attrs = SpanAttrs {
                font_family: value("font-family")?,
                font_size: value("font-size")?,
                color: value("color")?,
                background: value("background-color")?,
            };
            if attrs.is_empty() {
                return Err(missing("style"));
            }
            NodeKind::Wrapper(Wrapper::Span(attrs))
        }
        "img" => {
            let src = attr("src").ok_or_else(|| missing("src"))?;
            if !is_safe_url(src, UrlUse::ImageSource) {
                return Err(ImportError::UnsafeUrl(src.to_string()));
            }
            let dimension = |name: &str| -> Result<Option<u32>, ImportError> {
                attr(name)
                    .map(|v| v.parse::<u32>().map_err(|_| invalid(name, v)))
                    .transpose()
            };
            NodeKind::Void(VoidKind::Image(ImageAttrs {
                src: src.to_string(),
                alt: attr("alt").map(str::to_string),
                width: dimension("width")?,
                height: dimension("height")?,
            }))
        }
        heading => {
            let level = heading
                .strip_prefix('h')
                .and_then(|l| l.parse::<u8>().ok())
                .filter(|l| (1..=6).contains(l))
                .ok_or_else(|| ImportError::UnknownTag(heading.to_string()))?;
            block(BlockTag::Heading(level))?
        }
    };
    Ok(kind)
}

// ----------------------------------------------------------------------
// Selections
// ----------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SerializedPoint {
    pub path: Vec<usize>,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SerializedSelection {
    pub start: SerializedPoint,
    pub end: SerializedPoint,
}

impl SerializedSelection {
    pub fn capture(tree: &DocTree, selection: Selection) -> Self {
        let point = |p: Point| SerializedPoint {
            path: if tree.contains(p.node) {
                tree.path(p.node)
            } else {
                Vec::new()
            },
            offset: p.offset,
        };
        Self {
            start: point(selection.start),
            end: point(selection.end),
        }
    }

    /// The selection in `tree`, or `None` when a path no longer exists.
    ///
    /// Offsets past the end of a node are clamped.
    pub fn restore(&self, tree: &DocTree) -> Option<Selection> {
        let point = |p: &SerializedPoint| -> Option<Point> {
            let node = tree.node_at_path(&p.path)?;
            let limit = if tree.is_leaf(node) {
                tree.leaf_len(node)
            } else {
                tree.children(node).len()
            };
            Some(Point::new(node, p.offset.min(limit)))
        };
        Some(Selection::new(point(&self.start)?, point(&self.end)?))
    }
}

// ----------------------------------------------------------------------
// Hashing
// ----------------------------------------------------------------------

/// Hex-encoded SHA-256 of the document content.
pub fn content_hash(tree: &DocTree) -> String {
    let mut hasher = Sha256::new();
    for node in export(tree) {
        feed(&mut hasher, &node);
    }
    hex::encode(hasher.finalize())
}

fn feed_str(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

fn feed(hasher: &mut Sha256, node: &SerializedNode) {
    match node {
        SerializedNode::Text(text) => {
            hasher.update([0u8]);
            feed_str(hasher, text);
        }
        SerializedNode::Element(element) => {
            hasher.update([1u8]);
            feed_str(hasher, &element.tag);
            hasher.update((element.attrs.len() as u64).to_le_bytes());
            for (name, value) in &element.attrs {
                feed_str(hasher, name);
                feed_str(hasher, value);
            }
            hasher.update((element.children.len() as u64).to_le_bytes());
            for child in &element.children {
                feed(hasher, child);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invariants::violations;
    use crate::render::to_markup;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const DOCUMENT: &str = r#"[
        {"tag": "h2", "attrs": {"align": "center"}, "children": ["Title"]},
        {"tag": "ul", "children": [
            {"tag": "li", "children": ["one ", {"tag": "a", "attrs": {"href": "http://x"}, "children": ["link"]}]},
            {"tag": "li", "children": [{"tag": "ul", "children": [{"tag": "li", "children": ["nested"]}]}]}
        ]},
        {"tag": "div", "attrs": {"indent": "true"}, "children": [
            {"tag": "span", "attrs": {"color": "red"}, "children": ["red"]},
            {"tag": "img", "attrs": {"src": "a.png", "width": "10"}}
        ]}
    ]"#;

    #[test]
    fn import_builds_a_valid_tree() {
        let tree = from_json(DOCUMENT).unwrap();
        assert!(violations(&tree).is_empty());
        assert_snapshot!(to_markup(&tree), @r#"<h2 style="text-align: center">Title</h2><ul><li>one <a href="http://x">link</a></li><li style="list-style-type: none"><ul><li>nested</li></ul></li></ul><div style="margin-left: 40px"><span style="color: red">red</span><img src="a.png" width="10"></div>"#);
    }

    #[test]
    fn export_then_import_preserves_the_document() {
        let tree = from_json(DOCUMENT).unwrap();
        let exported = export(&tree);
        let again = import(&exported).unwrap();
        assert_eq!(export(&again), exported);
        assert_eq!(content_hash(&again), content_hash(&tree));
    }

    #[rstest]
    #[case::unknown_tag(r#"[{"tag": "table"}]"#, "Unknown tag: <table>")]
    #[case::unknown_attr(
        r#"[{"tag": "div", "attrs": {"class": "x"}, "children": ["a"]}]"#,
        "Unknown attribute `class` on <div>"
    )]
    #[case::script_link(
        r#"[{"tag": "div", "children": [{"tag": "a", "attrs": {"href": "javascript:alert(1)"}, "children": ["x"]}]}]"#,
        "Unsafe URL: javascript:alert(1)"
    )]
    #[case::void_children(
        r#"[{"tag": "div", "children": [{"tag": "br", "children": ["x"]}]}]"#,
        "Void element <br> cannot have children"
    )]
    #[case::block_in_inline(
        r#"[{"tag": "div", "children": [{"tag": "b", "children": [{"tag": "div"}]}]}]"#,
        "Block <div> inside inline <b>"
    )]
    #[case::list_shape(
        r#"[{"tag": "ul", "children": [{"tag": "div"}]}]"#,
        "Invalid list structure: <div> directly inside <ul>"
    )]
    #[case::mixed(
        r#"[{"tag": "div", "children": ["a", {"tag": "div"}]}]"#,
        "<div> mixes block and inline children"
    )]
    #[case::text_at_root(r#"["loose"]"#, "<root> cannot hold inline content directly")]
    #[case::bad_align(
        r#"[{"tag": "div", "attrs": {"align": "middle"}}]"#,
        "Invalid value \"middle\" for `align` on <div>"
    )]
    #[case::unknown_field(r#"[{"tag": "div", "style": "x"}]"#, "Invalid JSON")]
    fn import_rejects(#[case] json: &str, #[case] expected: &str) {
        let err = from_json(json).unwrap_err();
        assert!(
            err.to_string().starts_with(expected),
            "{} does not start with {}",
            err,
            expected
        );
    }

    #[test]
    fn hash_ignores_the_caret() {
        let mut tree = from_json(r#"[{"tag": "div", "children": ["ab"]}]"#).unwrap();
        let before = content_hash(&tree);
        let div = tree.children(tree.root())[0];
        let bold = tree.create_child(div, NodeKind::Wrapper(Wrapper::Bold));
        tree.create_child(bold, NodeKind::Caret);
        assert_eq!(content_hash(&tree), before);

        tree.create_child(div, NodeKind::text("c"));
        assert_ne!(content_hash(&tree), before);
    }

    #[test]
    fn selection_round_trips_through_paths() {
        let tree = from_json(DOCUMENT).unwrap();
        let copy = tree.clone();
        let leaf = tree.leaves(tree.root())[1];
        let selection = Selection::new(Point::new(leaf, 1), Point::new(leaf, 3));

        let serialized = SerializedSelection::capture(&tree, selection);
        assert_eq!(serialized.start.path, tree.path(leaf));
        let restored = serialized.restore(&copy).unwrap();
        assert_eq!(copy.text(restored.start.node), Some("one "));
        assert_eq!((restored.start.offset, restored.end.offset), (1, 3));

        let far = SerializedSelection {
            start: SerializedPoint {
                path: vec![9, 9],
                offset: 0,
            },
            end: serialized.end.clone(),
        };
        assert_eq!(far.restore(&copy), None);
    }
}
