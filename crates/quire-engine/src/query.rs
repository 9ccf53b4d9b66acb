//! Styling detection and find primitives.
//!
//! Detection answers "what does the toolbar show for this selection".
//! Inline styles, headings and alignment count only when every non-empty
//! leaf in the range has them; list and quote membership counts when any
//! covered leaf is inside one.

use std::collections::BTreeSet;

use crate::grammar::{
    BlockStyle, BlockTag, DocTree, InlineKind, InlineStyle, NodeId, NodeKind, StyleValue,
};
use crate::normalize::style_of;
use crate::range::{Point, Selection, resolve};
use crate::render;

/// Leaves that decide styling for a selection.
///
/// Falls back to the zero-width leaves (a caret, say) when the range
/// holds nothing else.
fn deciding_leaves(tree: &DocTree, selection: Selection) -> Vec<NodeId> {
    let range = resolve(tree, selection);
    let non_empty: Vec<NodeId> = range
        .leaves
        .iter()
        .copied()
        .filter(|&l| tree.leaf_len(l) > 0)
        .collect();
    if non_empty.is_empty() {
        range.leaves
    } else {
        non_empty
    }
}

fn line_styles(tree: &DocTree, leaf: NodeId) -> BTreeSet<BlockStyle> {
    let mut out = BTreeSet::new();
    let line = tree.line_block(leaf);
    if let Some(block) = tree.kind(line).as_block() {
        match block.tag {
            BlockTag::Heading(level) => {
                out.insert(BlockStyle::Heading(level));
            }
            BlockTag::Division | BlockTag::ListItem { .. } => {
                out.insert(BlockStyle::Paragraph);
            }
            _ => {}
        }
        if let Some(align) = block.align {
            out.insert(BlockStyle::Align(align));
        }
    }
    out
}

fn container_styles(tree: &DocTree, leaf: NodeId) -> BTreeSet<BlockStyle> {
    let mut out = BTreeSet::new();
    let ancestors = tree.ancestors(leaf);
    if let Some(BlockTag::List(kind)) = ancestors
        .iter()
        .filter_map(|&a| tree.kind(a).block_tag())
        .find(|tag| matches!(tag, BlockTag::List(_)))
    {
        out.insert(BlockStyle::List(kind));
    }
    if ancestors.iter().any(|&a| tree.kind(a).is_quote()) {
        out.insert(BlockStyle::Quote);
    }
    out
}

fn intersect<T: Ord + Clone>(acc: Option<BTreeSet<T>>, next: BTreeSet<T>) -> Option<BTreeSet<T>> {
    Some(match acc {
        None => next,
        Some(acc) => acc.intersection(&next).cloned().collect(),
    })
}

/// Common styling across the selection.
pub fn detect_styling(tree: &DocTree, selection: Selection) -> BTreeSet<StyleValue> {
    let leaves = deciding_leaves(tree, selection);

    let mut inline: Option<BTreeSet<InlineStyle>> = None;
    let mut lines: Option<BTreeSet<BlockStyle>> = None;
    let mut containers: BTreeSet<BlockStyle> = BTreeSet::new();

    for &leaf in &leaves {
        let styles: BTreeSet<InlineStyle> = style_of(tree, leaf).styles().into_iter().collect();
        inline = intersect(inline, styles);
        lines = intersect(lines, line_styles(tree, leaf));
        containers.extend(container_styles(tree, leaf));
    }

    let mut out = BTreeSet::new();
    out.extend(inline.unwrap_or_default().into_iter().map(StyleValue::Inline));
    out.extend(lines.unwrap_or_default().into_iter().map(StyleValue::Block));
    out.extend(containers.into_iter().map(StyleValue::Block));
    out
}

/// Whether every deciding leaf carries any value of `kind`.
pub fn is_inline_active(tree: &DocTree, selection: Selection, kind: InlineKind) -> bool {
    let leaves = deciding_leaves(tree, selection);
    !leaves.is_empty() && leaves.iter().all(|&l| style_of(tree, l).has_kind(kind))
}

/// Whether `style` is active; valued inline styles match any value.
pub fn is_active(tree: &DocTree, selection: Selection, style: &StyleValue) -> bool {
    match style {
        StyleValue::Inline(inline) => is_inline_active(tree, selection, inline.kind()),
        StyleValue::Block(_) => detect_styling(tree, selection).contains(style),
    }
}

/// Text leaves in document order.
pub fn text_leaves(tree: &DocTree) -> Vec<NodeId> {
    tree.leaves(tree.root())
        .into_iter()
        .filter(|&l| matches!(tree.kind(l), NodeKind::Text(_)))
        .collect()
}

/// Non-overlapping occurrences of `needle` inside single text leaves.
pub fn find_text(tree: &DocTree, needle: &str) -> Vec<Selection> {
    if needle.is_empty() {
        return Vec::new();
    }
    let needle_len = needle.chars().count();
    let mut out = Vec::new();
    for leaf in text_leaves(tree) {
        let Some(text) = tree.text(leaf) else {
            continue;
        };
        for (byte, _) in text.match_indices(needle) {
            let start = text[..byte].chars().count();
            out.push(Selection::new(
                Point::new(leaf, start),
                Point::new(leaf, start + needle_len),
            ));
        }
    }
    out
}

pub fn plain_text(tree: &DocTree) -> String {
    render::to_plain_text(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{Alignment, Block, ListKind, Wrapper};
    use pretty_assertions::assert_eq;

    #[test]
    fn inline_styles_must_be_uniform() {
        let mut tree = DocTree::new();
        let div = tree.create_child(tree.root(), NodeKind::division());
        let bold = tree.create_child(div, NodeKind::Wrapper(Wrapper::Bold));
        let a = tree.create_child(bold, NodeKind::text("a"));
        let b = tree.create_child(div, NodeKind::text("b"));

        let both = Selection::new(Point::new(a, 0), Point::new(b, 1));
        let only_a = Selection::new(Point::new(a, 0), Point::new(a, 1));

        assert!(!detect_styling(&tree, both).contains(&StyleValue::Inline(InlineStyle::Bold)));
        assert!(detect_styling(&tree, only_a).contains(&StyleValue::Inline(InlineStyle::Bold)));
        assert!(is_inline_active(&tree, only_a, InlineKind::Bold));
        assert!(!is_inline_active(&tree, both, InlineKind::Bold));
    }

    #[test]
    fn list_activates_on_any_leaf_and_alignment_must_be_uniform() {
        let mut tree = DocTree::new();
        let root = tree.root();
        let list = tree.create_child(root, NodeKind::list(ListKind::Unordered));
        let li = tree.create_child(list, NodeKind::list_item());
        let a = tree.create_child(li, NodeKind::text("a"));
        let centered = tree.create_child(
            root,
            NodeKind::Block(Block {
                align: Some(Alignment::Center),
                ..Block::new(BlockTag::Division)
            }),
        );
        let b = tree.create_child(centered, NodeKind::text("b"));

        let styles = detect_styling(&tree, Selection::new(Point::new(a, 0), Point::new(b, 1)));
        assert!(styles.contains(&StyleValue::Block(BlockStyle::List(ListKind::Unordered))));
        assert!(styles.contains(&StyleValue::Block(BlockStyle::Paragraph)));
        assert!(!styles.contains(&StyleValue::Block(BlockStyle::Align(Alignment::Center))));
    }

    #[test]
    fn valued_styles_match_any_value() {
        let mut tree = DocTree::new();
        let div = tree.create_child(tree.root(), NodeKind::division());
        let link = tree.create_child(
            div,
            NodeKind::Wrapper(Wrapper::Link {
                href: "http://a".into(),
            }),
        );
        let t = tree.create_child(link, NodeKind::text("x"));
        let sel = Selection::new(Point::new(t, 0), Point::new(t, 1));
        assert!(is_active(
            &tree,
            sel,
            &StyleValue::Inline(InlineStyle::Link("http://other".into()))
        ));
    }

    #[test]
    fn find_text_reports_char_offsets() {
        let mut tree = DocTree::new();
        let div = tree.create_child(tree.root(), NodeKind::division());
        let t = tree.create_child(div, NodeKind::text("éa-a"));
        let found = find_text(&tree, "a");
        assert_eq!(
            found,
            vec![
                Selection::new(Point::new(t, 1), Point::new(t, 2)),
                Selection::new(Point::new(t, 3), Point::new(t, 4)),
            ]
        );
        assert!(find_text(&tree, "").is_empty());
        assert_eq!(text_leaves(&tree), vec![t]);
    }
}
