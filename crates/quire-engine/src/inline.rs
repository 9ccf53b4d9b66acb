//! # Inline Style Engine
//!
//! Applies, removes and toggles character styles over a selection.
//!
//! ## Ranged selections
//!
//! The boundary text leaves are split at the selection offsets so the
//! range covers whole leaves. Each covered leaf is then styled on its own:
//!
//! - **apply** reuses an ancestor wrapper that already applies the style,
//!   folds attribute styles into a span that holds only this leaf, and
//!   otherwise wraps the leaf innermost
//! - **remove** isolates the nearest matching ancestor wrapper around the
//!   leaf (splitting it into before/middle/after copies) and strips the
//!   style from the middle copy, unwrapping it when nothing is left
//!
//! Afterwards every touched line block is rebuilt by
//! [`normalize_inline`], which merges the per-leaf wrappers back into
//! canonical nesting. Inline edits never change text, so the selection is
//! carried across the rebuild as linear offsets.
//!
//! ## Collapsed selections
//!
//! A collapsed selection styles "what will be typed next". A single
//! [`NodeKind::Caret`] leaf is placed at the point and styled like any
//! other leaf; its wrappers stay in the tree while the caret does. Placing
//! a new caret removes any old one and the wrappers that existed only to
//! hold it.

use crate::grammar::{DocTree, InlineKind, InlineStyle, NodeId, NodeKind, Wrapper};
use crate::normalize::{normalize_inline, tidy};
use crate::query::is_inline_active;
use crate::range::{Bias, Point, Selection, doc_offset, ordered, point_at_offset, resolve};

#[derive(Debug, Clone, Copy)]
enum Edit<'a> {
    Apply(&'a InlineStyle),
    /// Remove one exact value
    Remove(&'a InlineStyle),
    /// Remove any value of a kind
    RemoveKind(InlineKind),
    /// Remove every kind except links
    RemoveAll,
}

impl Edit<'_> {
    fn allowed_when_collapsed(&self) -> bool {
        match self {
            Edit::Apply(style) => style.allowed_when_collapsed(),
            _ => true,
        }
    }
}

/// Apply `style` over the selection.
pub fn apply(tree: &mut DocTree, selection: Selection, style: &InlineStyle) -> Selection {
    run(tree, selection, &[Edit::Apply(style)])
}

/// Remove exactly `style` (value included) from the selection.
pub fn remove(tree: &mut DocTree, selection: Selection, style: &InlineStyle) -> Selection {
    run(tree, selection, &[Edit::Remove(style)])
}

/// Remove any value of `kind` from the selection.
pub fn remove_kind(tree: &mut DocTree, selection: Selection, kind: InlineKind) -> Selection {
    run(tree, selection, &[Edit::RemoveKind(kind)])
}

/// Replace whatever value of `style`'s kind is present with `style`.
pub fn change(tree: &mut DocTree, selection: Selection, style: &InlineStyle) -> Selection {
    run(
        tree,
        selection,
        &[Edit::RemoveKind(style.kind()), Edit::Apply(style)],
    )
}

/// Remove the style when the whole selection has it, apply it otherwise.
///
/// Valued styles count as present with any value.
pub fn toggle(tree: &mut DocTree, selection: Selection, style: &InlineStyle) -> Selection {
    if is_inline_active(tree, selection, style.kind()) {
        remove_kind(tree, selection, style.kind())
    } else {
        apply(tree, selection, style)
    }
}

/// Strip all character formatting except links.
pub fn remove_all(tree: &mut DocTree, selection: Selection) -> Selection {
    run(tree, selection, &[Edit::RemoveAll])
}

fn run(tree: &mut DocTree, selection: Selection, edits: &[Edit<'_>]) -> Selection {
    let selection = ordered(tree, selection);
    if selection.is_collapsed() {
        if !edits.iter().all(Edit::allowed_when_collapsed) {
            return selection;
        }
        let caret = ensure_caret(tree, selection.start);
        for edit in edits {
            edit_leaf(tree, caret, *edit);
        }
        let line = tree.line_block(caret);
        normalize_inline(tree, line);
        return Selection::collapsed(Point::new(caret, 0));
    }

    let range = resolve(tree, selection);
    let (Some(&first), Some(&last)) = (range.leaves.first(), range.leaves.last()) else {
        return selection;
    };
    if range.is_empty() {
        return selection;
    }
    let start = doc_offset(tree, Point::new(first, range.start_offset));
    let end = doc_offset(tree, Point::new(last, range.end_offset));

    // End first: when both ends are in one leaf the start offset stays valid
    tree.split_text(last, range.end_offset);
    let mut leaves = range.leaves.clone();
    if let Some(tail) = tree.split_text(first, range.start_offset) {
        leaves[0] = tail;
    }

    let mut lines = Vec::new();
    for &leaf in &leaves {
        if matches!(tree.kind(leaf), NodeKind::Caret) {
            continue;
        }
        let line = tree.line_block(leaf);
        if !lines.contains(&line) {
            lines.push(line);
        }
        for edit in edits {
            edit_leaf(tree, leaf, *edit);
        }
    }
    for line in lines {
        normalize_inline(tree, line);
    }

    log::debug!("inline edit over {} leaves", leaves.len());
    Selection::new(
        point_at_offset(tree, start, Bias::Forward),
        point_at_offset(tree, end, Bias::Backward),
    )
}

fn edit_leaf(tree: &mut DocTree, leaf: NodeId, edit: Edit<'_>) {
    match edit {
        Edit::Apply(style) => apply_to_leaf(tree, leaf, style),
        Edit::Remove(style) => strip_from_leaf(tree, leaf, style.kind(), |w| w.applies(style)),
        Edit::RemoveKind(kind) => strip_from_leaf(tree, leaf, kind, |w| w.has_kind(kind)),
        Edit::RemoveAll => {
            for kind in InlineKind::ALL {
                if kind != InlineKind::Link {
                    strip_from_leaf(tree, leaf, kind, |w| w.has_kind(kind));
                }
            }
        }
    }
}

/// Wrapper ancestors of `leaf`, nearest first.
fn wrapper_ancestors(tree: &DocTree, leaf: NodeId) -> Vec<NodeId> {
    tree.ancestors(leaf)
        .into_iter()
        .take_while(|&a| tree.kind(a).as_wrapper().is_some())
        .collect()
}

fn apply_to_leaf(tree: &mut DocTree, leaf: NodeId, style: &InlineStyle) {
    let kind = style.kind();
    if let Some(other) = kind.exclusive_with() {
        strip_from_leaf(tree, leaf, other, |w| w.has_kind(other));
    }

    let already = wrapper_ancestors(tree, leaf)
        .into_iter()
        .any(|a| tree.kind(a).as_wrapper().is_some_and(|w| w.applies(style)));
    if already {
        return;
    }
    if kind.is_valued() {
        strip_from_leaf(tree, leaf, kind, |w| w.has_kind(kind));
    }

    if let Some(parent) = tree.parent(leaf)
        && tree.children(parent).len() == 1
        && let NodeKind::Wrapper(wrapper) = tree.kind_mut(parent)
        && wrapper.absorb(style)
    {
        return;
    }
    tree.wrap(leaf, NodeKind::Wrapper(Wrapper::from_style(style)));
}

/// Strip `kind` from every ancestor wrapper of `leaf` matching `matches`,
/// touching only the part of the wrapper that holds `leaf`.
fn strip_from_leaf(
    tree: &mut DocTree,
    leaf: NodeId,
    kind: InlineKind,
    matches: impl Fn(&Wrapper) -> bool,
) {
    loop {
        let found = wrapper_ancestors(tree, leaf)
            .into_iter()
            .find(|&a| tree.kind(a).as_wrapper().is_some_and(&matches));
        let Some(wrapper) = found else {
            break;
        };
        tree.isolate(wrapper, leaf, leaf);
        let empty = match tree.kind_mut(wrapper) {
            NodeKind::Wrapper(w) => w.strip(kind),
            _ => false,
        };
        if empty {
            tree.unwrap(wrapper);
        } else if tree.kind(wrapper).as_wrapper().is_some_and(&matches) {
            // Stripping left the match in place; nothing more can change
            break;
        }
    }
}

/// The caret leaf, if the document has one.
pub fn caret(tree: &DocTree) -> Option<NodeId> {
    tree.descendants(tree.root())
        .into_iter()
        .find(|&n| matches!(tree.kind(n), NodeKind::Caret))
}

/// Remove every caret and the wrappers that only held it.
///
/// Returns whether anything was removed. The affected line blocks are
/// re-normalized, so text leaves next to a removed caret may merge.
pub fn clear_caret(tree: &mut DocTree) -> bool {
    let carets: Vec<NodeId> = tree
        .descendants(tree.root())
        .into_iter()
        .filter(|&n| matches!(tree.kind(n), NodeKind::Caret))
        .collect();
    if carets.is_empty() {
        return false;
    }

    let mut lines = Vec::new();
    for caret in carets {
        let line = tree.line_block(caret);
        let mut parent = tree.parent(caret);
        tree.remove(caret);
        while let Some(p) = parent
            && tree.kind(p).as_wrapper().is_some()
            && tree.children(p).is_empty()
        {
            parent = tree.parent(p);
            tree.remove(p);
        }
        if !lines.contains(&line) {
            lines.push(line);
        }
    }
    for line in lines {
        if tree.is_attached(line) {
            normalize_inline(tree, line);
            if tree.kind(line).is_block() && tree.children(line).is_empty() {
                tree.create_child(line, NodeKind::line_break());
            }
        }
    }
    true
}

/// Place the caret at `point` and return it.
///
/// Reuses `point.node` when it already is the caret.
pub fn ensure_caret(tree: &mut DocTree, point: Point) -> NodeId {
    if tree.contains(point.node) && matches!(tree.kind(point.node), NodeKind::Caret) {
        return point.node;
    }

    let anchor = doc_offset(tree, point);
    let point = if clear_caret(tree) && !tree.is_attached(point.node) {
        point_at_offset(tree, anchor, Bias::Backward)
    } else {
        point
    };

    let range = resolve(tree, Selection::collapsed(point));
    let caret = tree.create(NodeKind::Caret);
    match range.leaves.first() {
        Some(&leaf) => {
            let offset = range.start_offset;
            let len = tree.leaf_len(leaf);
            if offset == 0 && len > 0 {
                tree.insert_before(leaf, caret);
            } else if offset >= len {
                tree.insert_after(leaf, caret);
            } else {
                tree.split_text(leaf, offset);
                tree.insert_after(leaf, caret);
            }
        }
        None => {
            let container = range.insertion.node;
            let index = range.insertion.offset;
            let holds_blocks = tree
                .children(container)
                .iter()
                .any(|&c| tree.kind(c).is_block());
            if container == tree.root() || holds_blocks || tree.kind(container).is_list() {
                let line = tree.create(NodeKind::division());
                tree.insert(container, index, line);
                tree.append(line, caret);
                tidy(tree);
            } else {
                tree.insert(container, index, caret);
            }
        }
    }
    caret
}
