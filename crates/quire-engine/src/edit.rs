//! # Content Insertion
//!
//! Typing, line splitting, void insertion and pasting. All of them work
//! through the caret placeholder: [`ensure_caret`] puts a caret leaf at the
//! insertion point (splitting text as needed), and the new content takes
//! the caret's place. Content inserted at a styled caret therefore picks up
//! the pending styles.
//!
//! Every routine returns the selection after the inserted content. Ids of
//! text leaves can change when neighbours merge, so positions are carried
//! as linear offsets through the final normalization.

use crate::grammar::{BlockTag, DocTree, NodeId, NodeKind, VoidKind};
use crate::inline::ensure_caret;
use crate::normalize::{is_line_block, normalize_inline, tidy};
use crate::range::{Bias, Point, Selection, doc_offset, ordered, point_at_offset, resolve};

/// Delete the selected content, leaving a collapsed selection.
///
/// Leaves are removed together with wrappers they leave empty. When the
/// selection spans lines, the content left in the last line moves up into
/// the first one and fully covered lines disappear.
pub fn delete_selection(tree: &mut DocTree, selection: Selection) -> Selection {
    let selection = ordered(tree, selection);
    if selection.is_collapsed() {
        return selection;
    }
    let range = resolve(tree, selection);
    let (Some(&first), Some(&last)) = (range.leaves.first(), range.leaves.last()) else {
        return Selection::collapsed(selection.start);
    };
    if range.is_empty() {
        return Selection::collapsed(selection.start);
    }
    let start = doc_offset(tree, Point::new(first, range.start_offset));

    tree.split_text(last, range.end_offset);
    let mut leaves = range.leaves.clone();
    if let Some(tail) = tree.split_text(first, range.start_offset) {
        leaves[0] = tail;
    }

    let mut lines: Vec<NodeId> = Vec::new();
    for &leaf in &leaves {
        let line = tree.line_block(leaf);
        if !lines.contains(&line) {
            lines.push(line);
        }
        if !matches!(tree.kind(leaf), NodeKind::Caret) {
            remove_leaf(tree, leaf);
        }
    }

    if let Some((&head, rest)) = lines.split_first() {
        for (index, &line) in rest.iter().enumerate() {
            if !tree.is_attached(line) {
                continue;
            }
            let is_last = index + 1 == rest.len();
            if is_last && is_line_block(tree, head) && is_line_block(tree, line) {
                tree.move_children(line, head);
            }
            if tree.children(line).is_empty() {
                tree.remove(line);
            }
        }
        if tree.is_attached(head) {
            normalize_inline(tree, head);
        }
    }
    tidy(tree);
    log::debug!("deleted {} leaves", leaves.len());
    Selection::collapsed(point_at_offset(tree, start, Bias::Backward))
}

/// Remove a leaf and any wrapper ancestors it leaves empty.
fn remove_leaf(tree: &mut DocTree, leaf: NodeId) {
    let mut parent = tree.parent(leaf);
    tree.remove(leaf);
    while let Some(p) = parent
        && tree.kind(p).as_wrapper().is_some()
        && tree.children(p).is_empty()
    {
        parent = tree.parent(p);
        tree.remove(p);
    }
}

/// Put a new leaf where the caret for `point` goes, consuming the caret.
///
/// A line break that was the only content of the line is dropped.
fn replace_caret(tree: &mut DocTree, point: Point, kind: NodeKind) -> NodeId {
    let caret = ensure_caret(tree, point);
    let line = tree.line_block(caret);
    let leaf = tree.create(kind);
    tree.insert_before(caret, leaf);
    remove_leaf(tree, caret);

    let others: Vec<NodeId> = tree
        .leaves(line)
        .into_iter()
        .filter(|&l| l != leaf)
        .collect();
    if let [only] = others.as_slice()
        && matches!(tree.kind(*only), NodeKind::Void(VoidKind::LineBreak))
    {
        remove_leaf(tree, *only);
    }
    leaf
}

/// Type `text` over the selection.
///
/// Newlines split the line as [`insert_newline`] does.
pub fn insert_text(tree: &mut DocTree, selection: Selection, text: &str) -> Selection {
    let mut selection = delete_selection(tree, selection);
    for (index, part) in text.split('\n').enumerate() {
        if index > 0 {
            selection = insert_newline(tree, selection);
        }
        if part.is_empty() {
            continue;
        }
        let leaf = replace_caret(tree, selection.end, NodeKind::text(part));
        let end = doc_offset(tree, Point::new(leaf, tree.leaf_len(leaf)));
        let line = tree.line_block(leaf);
        normalize_inline(tree, line);
        selection = Selection::collapsed(point_at_offset(tree, end, Bias::Backward));
    }
    selection
}

/// Insert a void leaf at the end of the selection.
pub fn insert_void(tree: &mut DocTree, selection: Selection, void: VoidKind) -> Selection {
    let selection = ordered(tree, selection);
    let leaf = replace_caret(tree, selection.end, NodeKind::Void(void));
    let end = doc_offset(tree, Point::new(leaf, 1));
    tidy(tree);
    Selection::collapsed(point_at_offset(tree, end, Bias::Backward))
}

/// Split the current line at the selection.
///
/// The new line keeps the block type of the old one, except that a
/// heading split at its end continues as a plain division. Pending
/// caret styles carry over to the new line.
pub fn insert_newline(tree: &mut DocTree, selection: Selection) -> Selection {
    let selection = delete_selection(tree, selection);
    let caret = ensure_caret(tree, selection.end);
    let line = tree.line_block(caret);
    if line == tree.root() {
        log::warn!("caret outside a line block, newline ignored");
        return Selection::collapsed(Point::new(caret, 0));
    }

    if tree.split_before(line, caret).is_none() {
        let empty = tree.shallow_clone(line);
        tree.insert_before(line, empty);
        tree.create_child(empty, NodeKind::line_break());
    }

    let has_content = tree
        .leaves(line)
        .into_iter()
        .any(|l| !matches!(tree.kind(l), NodeKind::Caret));
    if !has_content {
        if let Some(block) = tree.kind_mut(line).as_block_mut()
            && matches!(block.tag, BlockTag::Heading(_))
        {
            block.tag = BlockTag::Division;
        }
        if tree.parent(caret) == Some(line) {
            // Unstyled caret: an ordinary empty line
            tree.remove(caret);
        }
    }

    let start = match tree.first_leaf(line) {
        Some(leaf) => doc_offset(tree, Point::new(leaf, 0)),
        None => doc_offset(tree, Point::new(line, 0)),
    };
    let keep_caret = tree.contains(caret);
    tidy(tree);
    if keep_caret && tree.is_attached(caret) {
        return Selection::collapsed(Point::new(caret, 0));
    }
    Selection::collapsed(point_at_offset(tree, start, Bias::Forward))
}

/// Insert a sanitized fragment over the selection.
///
/// A fragment that is a single plain line is inserted inline at the
/// caret. Anything else splits the current line and the fragment's blocks
/// go between the two halves.
pub fn insert_fragment(tree: &mut DocTree, selection: Selection, fragment: &DocTree) -> Selection {
    let blocks = fragment.children(fragment.root()).to_vec();
    if blocks.is_empty() {
        return ordered(tree, selection);
    }
    let selection = delete_selection(tree, selection);

    let inline_only = matches!(
        blocks.as_slice(),
        [only] if fragment.kind(*only).as_block().is_some_and(|b| b.is_plain_division())
            && is_line_block(fragment, *only)
    );

    let caret = ensure_caret(tree, selection.end);
    let line = tree.line_block(caret);

    let last_inserted = if inline_only {
        let mut last = None;
        for &child in fragment.children(blocks[0]) {
            let copy = tree.import(fragment, child);
            tree.insert_before(caret, copy);
            last = Some(copy);
        }
        last
    } else {
        tree.split_before(line, caret);
        let mut last = None;
        for &block in &blocks {
            let copy = tree.import(fragment, block);
            tree.insert_before(line, copy);
            last = Some(copy);
        }
        last
    };
    remove_leaf(tree, caret);
    if !inline_only && !tree.leaves(line).iter().any(|&l| tree.leaf_len(l) > 0) {
        tree.remove(line);
    }

    let end = last_inserted
        .and_then(|node| tree.last_leaf(node))
        .map(|leaf| doc_offset(tree, Point::new(leaf, tree.leaf_len(leaf))))
        .unwrap_or(0);
    tidy(tree);
    log::debug!("pasted {} blocks", blocks.len());
    Selection::collapsed(point_at_offset(tree, end, Bias::Backward))
}
