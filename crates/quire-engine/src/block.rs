//! # Block Style Engine
//!
//! Headings, alignment, quotes, lists and indentation.
//!
//! Block operations work on whole blocks. The selection is widened with
//! [`block_extend`] and the covered blocks are collected with
//! [`covered_blocks`]; consecutive siblings among them form a *run*, and
//! most operations act once per run:
//!
//! ```text
//! root
//! ├── div "a"      ┐
//! ├── div "b"      ┘ run 1
//! └── ul
//!     ├── li "c"   ┐ run 2 (partially covered list)
//!     └── li "d"   ┘
//! ```
//!
//! Removing a container style (quote, list) from part of a container
//! isolates the covered children first, so the uncovered siblings keep the
//! style in their own copy of the container.
//!
//! Every operation ends with [`tidy`] and restores the selection onto the
//! same leaves it started on. Leaves are never split or merged by block
//! operations, so the ids survive; offsets are the fallback.

use crate::grammar::{
    Block, BlockStyle, BlockTag, DocTree, ListKind, NodeId, NodeKind, StyleValue,
};
use crate::normalize::{is_line_block, tidy};
use crate::query::detect_styling;
use crate::range::{
    Bias, Point, Selection, block_extend, covered_blocks, doc_offset, ordered, point_at_offset,
    resolve,
};

/// Apply a block style to every block the selection touches.
pub fn apply(tree: &mut DocTree, selection: Selection, style: BlockStyle) -> Selection {
    with_blocks(tree, selection, |tree, covered| match style {
        BlockStyle::Paragraph => {
            for line in line_blocks_under(tree, covered) {
                set_tag_if(tree, line, BlockTag::Division, |t| {
                    matches!(t, BlockTag::Heading(_))
                });
            }
        }
        BlockStyle::Heading(level) => heading(tree, covered, level.clamp(1, 6)),
        BlockStyle::Align(align) => {
            let mut lines = Vec::new();
            for &node in covered {
                flatten_into_lines(tree, node, &mut lines);
            }
            for line in lines {
                if let Some(block) = tree.kind_mut(line).as_block_mut() {
                    block.align = Some(align);
                }
            }
        }
        BlockStyle::Quote => quote(tree, covered),
        BlockStyle::List(kind) => list(tree, covered, kind),
    })
}

/// Remove a block style from the selection.
///
/// For quotes and lists, `all_ancestors` removes every enclosing container
/// of that style instead of only the nearest one.
pub fn remove(
    tree: &mut DocTree,
    selection: Selection,
    style: BlockStyle,
    all_ancestors: bool,
) -> Selection {
    with_blocks(tree, selection, |tree, covered| match style {
        BlockStyle::Paragraph => {}
        BlockStyle::Heading(_) => {
            for line in line_blocks_under(tree, covered) {
                set_tag_if(tree, line, BlockTag::Division, |t| {
                    matches!(t, BlockTag::Heading(_))
                });
            }
        }
        BlockStyle::Align(_) => {
            for &node in covered {
                let mut nodes = vec![node];
                nodes.extend(tree.descendants(node));
                for n in nodes {
                    if let Some(block) = tree.kind_mut(n).as_block_mut() {
                        block.align = None;
                    }
                }
            }
        }
        BlockStyle::Quote => {
            for container in containers_to_change(tree, covered, all_ancestors, |k| k.is_quote()) {
                tree.unwrap(container);
            }
        }
        BlockStyle::List(kind) => {
            let is_kind = |k: &NodeKind| k.block_tag() == Some(BlockTag::List(kind));
            for container in containers_to_change(tree, covered, all_ancestors, is_kind) {
                unlist(tree, container);
            }
        }
    })
}

/// Remove the style when detection reports it, apply it otherwise.
pub fn toggle(tree: &mut DocTree, selection: Selection, style: BlockStyle) -> Selection {
    let active = detect_styling(tree, selection).contains(&StyleValue::Block(style));
    if active {
        remove(tree, selection, style, false)
    } else {
        apply(tree, selection, style)
    }
}

/// Change covered lists of kind `from` into lists of kind `to`.
pub fn replace_list_kind(
    tree: &mut DocTree,
    selection: Selection,
    from: ListKind,
    to: ListKind,
) -> Selection {
    with_blocks(tree, selection, |tree, covered| {
        let is_from = |k: &NodeKind| k.block_tag() == Some(BlockTag::List(from));
        for container in containers_to_change(tree, covered, false, is_from) {
            set_tag_if(tree, container, BlockTag::List(to), |_| true);
            merge_adjacent(tree, container);
        }
    })
}

/// Indent covered blocks one step; list items nest one level deeper.
pub fn indent(tree: &mut DocTree, selection: Selection) -> Selection {
    with_blocks(tree, selection, |tree, covered| {
        for run in runs(tree, covered) {
            let Some(parent) = tree.parent(run[0]) else {
                continue;
            };
            if let Some(BlockTag::List(kind)) = tree.kind(parent).block_tag() {
                nest_items(tree, parent, kind, &run);
            } else if let Some((start, end)) = run_bounds(tree, &run) {
                let wrapper = tree.wrap_range(parent, start, end, NodeKind::indent());
                merge_adjacent(tree, wrapper);
            }
        }
    })
}

/// Undo one level of indentation or list nesting.
pub fn outdent(tree: &mut DocTree, selection: Selection) -> Selection {
    with_blocks(tree, selection, |tree, covered| {
        let covered = open_lists(tree, covered);
        for run in runs(tree, &covered) {
            if !run.iter().all(|&n| tree.is_attached(n)) {
                continue;
            }
            let Some(parent) = tree.parent(run[0]) else {
                continue;
            };
            if tree.kind(parent).is_list() {
                outdent_items(tree, &run);
                continue;
            }

            let direct: Vec<NodeId> = run
                .iter()
                .copied()
                .filter(|&n| tree.kind(n).is_indent())
                .collect();
            if !direct.is_empty() {
                for node in direct {
                    unindent(tree, node);
                }
                continue;
            }

            let found = tree
                .ancestors(run[0])
                .into_iter()
                .find(|&a| tree.kind(a).is_indent() || tree.kind(a).is_list_item());
            match found {
                Some(ancestor) if tree.kind(ancestor).is_indent() => {
                    let (Some(first), Some(last)) = (
                        tree.child_toward(ancestor, run[0]),
                        tree.child_toward(ancestor, run[run.len() - 1]),
                    ) else {
                        continue;
                    };
                    tree.isolate(ancestor, first, last);
                    unindent(tree, ancestor);
                }
                Some(item) => {
                    if let Some(list) = tree.parent(item) {
                        lift_items(tree, list, &[item]);
                    }
                }
                None => {}
            }
        }
    })
}

// ----------------------------------------------------------------------
// Driver
// ----------------------------------------------------------------------

/// A selection endpoint remembered across a block operation.
struct Anchor {
    leaf: Option<NodeId>,
    offset: usize,
    linear: usize,
}

fn capture(tree: &DocTree, selection: Selection) -> (Anchor, Anchor) {
    let range = resolve(tree, selection);
    let start = range.leaves.first().map(|&l| (l, range.start_offset));
    let end = range.leaves.last().map(|&l| (l, range.end_offset));
    let anchor = |point: Option<(NodeId, usize)>, fallback: Point| match point {
        Some((leaf, offset)) => Anchor {
            leaf: Some(leaf),
            offset,
            linear: doc_offset(tree, Point::new(leaf, offset)),
        },
        None => Anchor {
            leaf: None,
            offset: 0,
            linear: doc_offset(tree, fallback),
        },
    };
    (anchor(start, selection.start), anchor(end, selection.end))
}

fn restore(tree: &DocTree, anchor: &Anchor, bias: Bias) -> Point {
    match anchor.leaf {
        Some(leaf) if tree.is_attached(leaf) => {
            Point::new(leaf, anchor.offset.min(tree.leaf_len(leaf)))
        }
        _ => point_at_offset(tree, anchor.linear, bias),
    }
}

/// Give an empty document one empty line and bring the tree into shape.
fn prepare(tree: &mut DocTree) {
    let root = tree.root();
    if tree.children(root).is_empty() {
        let line = tree.create_child(root, NodeKind::division());
        tree.create_child(line, NodeKind::line_break());
    }
    tidy(tree);
}

fn with_blocks(
    tree: &mut DocTree,
    selection: Selection,
    op: impl FnOnce(&mut DocTree, &[NodeId]),
) -> Selection {
    let offset_of = |tree: &DocTree, point: Point| {
        if tree.contains(point.node) {
            doc_offset(tree, point)
        } else {
            0
        }
    };
    let linear = (
        offset_of(tree, selection.start),
        offset_of(tree, selection.end),
    );
    prepare(tree);
    let selection = if tree.is_attached(selection.start.node) && tree.is_attached(selection.end.node)
    {
        ordered(tree, selection)
    } else {
        Selection::new(
            point_at_offset(tree, linear.0.min(linear.1), Bias::Forward),
            point_at_offset(tree, linear.0.max(linear.1), Bias::Backward),
        )
    };

    let (start, end) = capture(tree, selection);
    let covered = covered(tree, selection);
    log::debug!("block operation over {} blocks", covered.len());
    if !covered.is_empty() {
        op(tree, &covered);
    }
    tidy(tree);

    let collapsed = selection.is_collapsed();
    let start = restore(tree, &start, Bias::Forward);
    if collapsed {
        Selection::collapsed(start)
    } else {
        Selection::new(start, restore(tree, &end, Bias::Backward))
    }
}

/// Blocks the selection covers, in document order.
fn covered(tree: &DocTree, selection: Selection) -> Vec<NodeId> {
    if let Some(range) = block_extend(tree, selection) {
        let blocks = covered_blocks(tree, &range);
        if !blocks.is_empty() {
            return blocks;
        }
    }
    let mut out = Vec::new();
    for leaf in resolve(tree, selection).leaves {
        let line = tree.line_block(leaf);
        if tree.kind(line).is_block() && !out.contains(&line) {
            out.push(line);
        }
    }
    out
}

// ----------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------

/// Group nodes into runs of consecutive siblings.
fn runs(tree: &DocTree, nodes: &[NodeId]) -> Vec<Vec<NodeId>> {
    let mut out: Vec<Vec<NodeId>> = Vec::new();
    for &node in nodes {
        if let Some(run) = out.last_mut()
            && let Some(&prev) = run.last()
            && tree.next_sibling(prev) == Some(node)
        {
            run.push(node);
            continue;
        }
        out.push(vec![node]);
    }
    out
}

/// Child index range a run occupies in its parent.
fn run_bounds(tree: &DocTree, run: &[NodeId]) -> Option<(usize, usize)> {
    let start = tree.index_of(*run.first()?)?;
    let end = tree.index_of(*run.last()?)? + 1;
    Some((start, end))
}

/// Line blocks at or below the given nodes.
fn line_blocks_under(tree: &DocTree, nodes: &[NodeId]) -> Vec<NodeId> {
    let mut out = Vec::new();
    for &node in nodes {
        if is_line_block(tree, node) {
            out.push(node);
            continue;
        }
        out.extend(
            tree.descendants(node)
                .into_iter()
                .filter(|&d| is_line_block(tree, d)),
        );
    }
    out
}

fn set_tag_if(tree: &mut DocTree, id: NodeId, tag: BlockTag, when: impl Fn(BlockTag) -> bool) {
    if let Some(block) = tree.kind_mut(id).as_block_mut()
        && when(block.tag)
    {
        block.tag = tag;
    }
}

/// Fold `node` into an equal container sibling on either side.
///
/// Only containers merge; two line blocks never do. Returns the surviving
/// node.
fn merge_adjacent(tree: &mut DocTree, node: NodeId) -> NodeId {
    let mut node = node;
    if is_line_block(tree, node) {
        return node;
    }
    if let Some(prev) = tree.previous_sibling(node)
        && tree.kind(prev) == tree.kind(node)
        && !is_line_block(tree, prev)
    {
        tree.move_children(node, prev);
        tree.remove(node);
        node = prev;
    }
    if let Some(next) = tree.next_sibling(node)
        && tree.kind(next) == tree.kind(node)
        && !is_line_block(tree, next)
    {
        tree.move_children(next, node);
        tree.remove(next);
    }
    node
}

/// Containers matching `is_match` that should change for `covered`.
///
/// Matching containers inside the covered blocks are returned whole.
/// Matching ancestors (the nearest, or all with `all_ancestors`) are first
/// narrowed with [`DocTree::isolate`] to just the covered part. Deepest
/// containers come first.
fn containers_to_change(
    tree: &mut DocTree,
    covered: &[NodeId],
    all_ancestors: bool,
    is_match: impl Fn(&NodeKind) -> bool,
) -> Vec<NodeId> {
    let mut ancestors: Vec<NodeId> = Vec::new();
    for &node in covered {
        for ancestor in tree.ancestors(node) {
            if is_match(tree.kind(ancestor)) {
                if !ancestors.contains(&ancestor) {
                    ancestors.push(ancestor);
                }
                if !all_ancestors {
                    break;
                }
            }
        }
    }
    // Deepest first, so outer isolation sees the inner result
    ancestors.sort_by_key(|&a| std::cmp::Reverse(tree.ancestors(a).len()));

    let mut out = Vec::new();
    for ancestor in ancestors {
        let inside: Vec<NodeId> = covered
            .iter()
            .filter_map(|&n| tree.child_toward(ancestor, n))
            .collect();
        let (Some(&first), Some(&last)) = (inside.first(), inside.last()) else {
            continue;
        };
        tree.isolate(ancestor, first, last);
        out.push(ancestor);
    }

    let mut inner = Vec::new();
    for &node in covered {
        let mut nodes = vec![node];
        nodes.extend(tree.descendants(node));
        inner.extend(nodes.into_iter().filter(|&n| is_match(tree.kind(n))));
    }
    inner.sort_by_key(|&n| std::cmp::Reverse(tree.ancestors(n).len()));
    for node in inner {
        if !out.contains(&node) {
            out.push(node);
        }
    }
    out
}

/// Dissolve a list: line items become divisions, other items are spliced
/// out, then the list itself is spliced out.
fn unlist(tree: &mut DocTree, list: NodeId) {
    if !tree.is_attached(list) {
        return;
    }
    for item in tree.children(list).to_vec() {
        if is_line_block(tree, item) {
            if let Some(block) = tree.kind_mut(item).as_block_mut() {
                block.tag = BlockTag::Division;
            }
        } else {
            tree.unwrap(item);
        }
    }
    tree.unwrap(list);
}

fn unindent(tree: &mut DocTree, node: NodeId) {
    let keep = is_line_block(tree, node)
        || tree
            .kind(node)
            .as_block()
            .is_some_and(|b| b.align.is_some());
    if keep {
        if let Some(block) = tree.kind_mut(node).as_block_mut() {
            block.indent = false;
        }
    } else {
        tree.unwrap(node);
    }
}

// ----------------------------------------------------------------------
// Headings
// ----------------------------------------------------------------------

fn heading(tree: &mut DocTree, covered: &[NodeId], level: u8) {
    let mut lines = Vec::new();
    for &node in covered {
        flatten_into_lines(tree, node, &mut lines);
    }
    let heading = NodeKind::Block(Block::new(BlockTag::Heading(level)));
    for line in lines {
        let Some(block) = tree.kind(line).as_block().copied() else {
            continue;
        };
        match block.tag {
            BlockTag::Division | BlockTag::Heading(_) if !block.indent => {
                set_tag_if(tree, line, BlockTag::Heading(level), |_| true);
            }
            _ => {
                let len = tree.children(line).len();
                tree.wrap_range(line, 0, len, heading.clone());
            }
        }
    }
}

/// Collect the line blocks under `node`, dissolving quotes, lists and
/// plain divisions on the way.
///
/// Items of a dissolved list become divisions in place. Indented divisions
/// and partially covered items are kept and descended into.
fn flatten_into_lines(tree: &mut DocTree, node: NodeId, lines: &mut Vec<NodeId>) {
    if is_line_block(tree, node) {
        lines.push(node);
        return;
    }
    let Some(block) = tree.kind(node).as_block().copied() else {
        return;
    };
    let children = tree.children(node).to_vec();
    match block.tag {
        BlockTag::List(_) => {
            for item in children {
                if is_line_block(tree, item) {
                    set_tag_if(tree, item, BlockTag::Division, |_| true);
                    lines.push(item);
                } else {
                    let inner = tree.children(item).to_vec();
                    tree.unwrap(item);
                    for child in inner {
                        flatten_into_lines(tree, child, lines);
                    }
                }
            }
            tree.unwrap(node);
        }
        BlockTag::Quote => {
            tree.unwrap(node);
            for child in children {
                flatten_into_lines(tree, child, lines);
            }
        }
        BlockTag::Division if block.is_plain_division() => {
            tree.unwrap(node);
            for child in children {
                flatten_into_lines(tree, child, lines);
            }
        }
        _ => {
            for child in children {
                flatten_into_lines(tree, child, lines);
            }
        }
    }
}

// ----------------------------------------------------------------------
// Quotes
// ----------------------------------------------------------------------

fn quote(tree: &mut DocTree, covered: &[NodeId]) {
    let quoted = |tree: &DocTree, n: NodeId| {
        tree.kind(n).is_quote() || tree.ancestors(n).iter().any(|&a| tree.kind(a).is_quote())
    };
    if covered.iter().all(|&n| quoted(tree, n)) {
        return;
    }

    for run in runs(tree, covered) {
        let Some(parent) = tree.parent(run[0]) else {
            continue;
        };
        if tree.kind(parent).is_list() {
            for item in run {
                let len = tree.children(item).len();
                if is_line_block(tree, item) {
                    let line = tree.wrap_range(item, 0, len, NodeKind::division());
                    tree.wrap(line, NodeKind::Block(Block::new(BlockTag::Quote)));
                } else {
                    tree.wrap_range(item, 0, len, NodeKind::Block(Block::new(BlockTag::Quote)));
                }
            }
        } else if let Some((start, end)) = run_bounds(tree, &run) {
            let quote = tree.wrap_range(
                parent,
                start,
                end,
                NodeKind::Block(Block::new(BlockTag::Quote)),
            );
            merge_adjacent(tree, quote);
        }
    }
}

// ----------------------------------------------------------------------
// Lists
// ----------------------------------------------------------------------

fn list(tree: &mut DocTree, covered: &[NodeId], kind: ListKind) {
    for run in runs(tree, covered) {
        let Some(parent) = tree.parent(run[0]) else {
            continue;
        };

        if let Some(BlockTag::List(existing)) = tree.kind(parent).block_tag() {
            if existing != kind {
                tree.isolate(parent, run[0], run[run.len() - 1]);
                set_tag_if(tree, parent, BlockTag::List(kind), |_| true);
                merge_adjacent(tree, parent);
            }
            continue;
        }

        let mut members = Vec::new();
        for node in run {
            match tree.kind(node).block_tag() {
                Some(BlockTag::List(_)) => {
                    members.extend(tree.unwrap(node));
                }
                Some(BlockTag::Division) if is_line_block(tree, node) => {
                    if let Some(block) = tree.kind_mut(node).as_block_mut() {
                        block.tag = BlockTag::ListItem {
                            marker_hidden: false,
                        };
                        block.indent = false;
                    }
                    members.push(node);
                }
                _ => members.push(tree.wrap(node, NodeKind::list_item())),
            }
        }
        let Some((start, end)) = run_bounds(tree, &members) else {
            continue;
        };
        let list = tree.wrap_range(parent, start, end, NodeKind::list(kind));
        merge_adjacent(tree, list);
    }
}

/// Nest a run of items one level deeper inside a marker-hidden holder item.
///
/// The new sublist joins a same-kind sublist at the end of the previous
/// item or at the start of the next one.
fn nest_items(tree: &mut DocTree, list: NodeId, kind: ListKind, run: &[NodeId]) {
    let Some((start, end)) = run_bounds(tree, run) else {
        return;
    };
    let sublist = tree.wrap_range(list, start, end, NodeKind::list(kind));
    let holder = tree.wrap(
        sublist,
        NodeKind::Block(Block::new(BlockTag::ListItem {
            marker_hidden: true,
        })),
    );

    let mut target = sublist;
    let mut anchor = holder;
    if let Some(prev) = tree.previous_sibling(holder)
        && let Some(&prev_last) = tree.children(prev).last()
        && tree.kind(prev_last).block_tag() == Some(BlockTag::List(kind))
    {
        tree.move_children(sublist, prev_last);
        tree.remove(holder);
        target = prev_last;
        anchor = prev;
    }
    if let Some(next) = tree.next_sibling(anchor)
        && let Some(&next_first) = tree.children(next).first()
        && tree.kind(next_first).block_tag() == Some(BlockTag::List(kind))
    {
        tree.move_children(next_first, target);
        tree.remove(next_first);
        if tree.children(next).is_empty() {
            tree.remove(next);
        }
    }
}

/// Covered lists stand for their items.
fn open_lists(tree: &DocTree, covered: &[NodeId]) -> Vec<NodeId> {
    let mut out = Vec::new();
    for &node in covered {
        if tree.kind(node).is_list() {
            out.extend_from_slice(tree.children(node));
        } else {
            out.push(node);
        }
    }
    out
}

fn is_holder(tree: &DocTree, node: NodeId) -> bool {
    tree.kind(node).block_tag()
        == Some(BlockTag::ListItem {
            marker_hidden: true,
        })
}

/// Move a run of list items one level out.
///
/// A holder item hands its sublist items to the list that holds it, so a
/// nested item returns to the enclosing list instead of leaving it. Other
/// items go through [`lift_items`].
fn outdent_items(tree: &mut DocTree, run: &[NodeId]) {
    let mut items = Vec::new();
    for &node in run {
        if is_holder(tree, node) {
            unnest(tree, node);
        } else {
            items.push(node);
        }
    }
    for run in runs(tree, &items) {
        if let Some(list) = tree.parent(run[0]) {
            lift_items(tree, list, &run);
        }
    }
}

/// Splice a holder item and its sublists into the enclosing list.
fn unnest(tree: &mut DocTree, holder: NodeId) {
    for child in tree.children(holder).to_vec() {
        if tree.kind(child).is_list() {
            tree.unwrap(child);
        }
    }
    tree.unwrap(holder);
}

/// Move a run of items out of `list`.
///
/// Items of a nested list become items of the enclosing list, right where
/// their holder was. Items of a top-level list leave the list entirely.
fn lift_items(tree: &mut DocTree, list: NodeId, run: &[NodeId]) {
    let (Some(&first), Some(&last)) = (run.first(), run.last()) else {
        return;
    };
    match tree.parent(list) {
        Some(holder) if tree.kind(holder).is_list_item() => {
            tree.isolate(holder, first, last);
            tree.unwrap(list);
            tree.unwrap(holder);
        }
        _ => {
            tree.isolate(list, first, last);
            unlist(tree, list);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Alignment;
    use crate::invariants::violations;
    use crate::render::to_markup;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    /// root[div[line]...], returning the text leaves
    fn lines(texts: &[&str]) -> (DocTree, Vec<NodeId>) {
        let mut tree = DocTree::new();
        let root = tree.root();
        let leaves = texts
            .iter()
            .map(|t| {
                let div = tree.create_child(root, NodeKind::division());
                tree.create_child(div, NodeKind::text(*t))
            })
            .collect();
        (tree, leaves)
    }

    fn across(tree: &DocTree, from: NodeId, to: NodeId) -> Selection {
        Selection::new(Point::new(from, 0), Point::new(to, tree.leaf_len(to)))
    }

    #[test]
    fn ordered_list_over_two_paragraphs() {
        // Given two paragraphs
        let (mut tree, leaves) = lines(&["A", "B"]);

        // When toggling an ordered list over both
        let sel = across(&tree, leaves[0], leaves[1]);
        let sel = toggle(&mut tree, sel, BlockStyle::List(ListKind::Ordered));

        // Then both become items of one list
        assert_eq!(to_markup(&tree), "<ol><li>A</li><li>B</li></ol>");
        assert!(violations(&tree).is_empty());

        // And toggling again restores the paragraphs
        toggle(&mut tree, sel, BlockStyle::List(ListKind::Ordered));
        assert_eq!(to_markup(&tree), "<div>A</div><div>B</div>");
        assert!(violations(&tree).is_empty());
    }

    #[test]
    fn list_kind_change_on_part_of_a_list() {
        let (mut tree, leaves) = lines(&["a", "b", "c"]);
        let sel = across(&tree, leaves[0], leaves[2]);
        apply(&mut tree, sel, BlockStyle::List(ListKind::Unordered));

        let sel = Selection::collapsed(Point::new(leaves[1], 0));
        apply(&mut tree, sel, BlockStyle::List(ListKind::Ordered));
        assert_eq!(
            to_markup(&tree),
            "<ul><li>a</li></ul><ol><li>b</li></ol><ul><li>c</li></ul>"
        );

        replace_list_kind(&mut tree, sel, ListKind::Ordered, ListKind::Unordered);
        assert_eq!(to_markup(&tree), "<ul><li>a</li><li>b</li><li>c</li></ul>");
    }

    #[test]
    fn heading_flattens_covered_quote() {
        let (mut tree, leaves) = lines(&["a", "b"]);
        let sel = across(&tree, leaves[0], leaves[1]);
        let sel = apply(&mut tree, sel, BlockStyle::Quote);
        assert_eq!(
            to_markup(&tree),
            "<blockquote><div>a</div><div>b</div></blockquote>"
        );

        apply(&mut tree, sel, BlockStyle::Heading(1));
        assert_eq!(to_markup(&tree), "<h1>a</h1><h1>b</h1>");
        assert!(violations(&tree).is_empty());
    }

    #[test]
    fn heading_on_one_list_item_keeps_the_item() {
        // Given a two item list
        let (mut tree, leaves) = lines(&["a", "b"]);
        let all = across(&tree, leaves[0], leaves[1]);
        apply(&mut tree, all, BlockStyle::List(ListKind::Unordered));

        // When making the first item a heading
        let sel = Selection::collapsed(Point::new(leaves[0], 0));
        apply(&mut tree, sel, BlockStyle::Heading(2));

        // Then the heading sits inside the item
        assert_eq!(to_markup(&tree), "<ul><li><h2>a</h2></li><li>b</li></ul>");

        remove(&mut tree, sel, BlockStyle::Heading(2), false);
        assert_eq!(to_markup(&tree), "<ul><li>a</li><li>b</li></ul>");
    }

    #[test]
    fn quote_merges_with_neighbour_and_removes_partially() {
        let (mut tree, leaves) = lines(&["a", "b", "c"]);
        apply(&mut tree, Selection::collapsed(Point::new(leaves[0], 0)), BlockStyle::Quote);
        apply(&mut tree, Selection::collapsed(Point::new(leaves[1], 0)), BlockStyle::Quote);
        assert_eq!(
            to_markup(&tree),
            "<blockquote><div>a</div><div>b</div></blockquote><div>c</div>"
        );

        remove(
            &mut tree,
            Selection::collapsed(Point::new(leaves[0], 0)),
            BlockStyle::Quote,
            false,
        );
        assert_eq!(
            to_markup(&tree),
            "<div>a</div><blockquote><div>b</div></blockquote><div>c</div>"
        );
    }

    #[rstest]
    #[case(Alignment::Center, r#"<div style="text-align: center">a</div>"#)]
    #[case(Alignment::Justify, r#"<div style="text-align: justify">a</div>"#)]
    fn align_sets_and_clears(#[case] align: Alignment, #[case] expected: &str) {
        let (mut tree, leaves) = lines(&["a"]);
        let sel = Selection::collapsed(Point::new(leaves[0], 0));
        apply(&mut tree, sel, BlockStyle::Align(align));
        assert_eq!(to_markup(&tree), expected);
        remove(&mut tree, sel, BlockStyle::Align(align), false);
        assert_eq!(to_markup(&tree), "<div>a</div>");
    }

    #[test]
    fn indent_and_outdent_paragraphs() {
        let (mut tree, leaves) = lines(&["a", "b"]);
        let sel = across(&tree, leaves[0], leaves[1]);
        let sel = indent(&mut tree, sel);
        assert_snapshot!(
            to_markup(&tree),
            @r#"<div style="margin-left: 40px"><div>a</div><div>b</div></div>"#
        );

        let sel = indent(&mut tree, sel);
        assert_snapshot!(
            to_markup(&tree),
            @r#"<div style="margin-left: 40px"><div style="margin-left: 40px"><div>a</div><div>b</div></div></div>"#
        );

        let sel = outdent(&mut tree, sel);
        let sel = outdent(&mut tree, sel);
        assert_eq!(to_markup(&tree), "<div>a</div><div>b</div>");
        outdent(&mut tree, sel);
        assert_eq!(to_markup(&tree), "<div>a</div><div>b</div>");
        assert!(violations(&tree).is_empty());
    }

    #[test]
    fn indent_and_outdent_list_items() {
        // Given a three item list
        let (mut tree, leaves) = lines(&["a", "b", "c"]);
        let all = across(&tree, leaves[0], leaves[2]);
        apply(&mut tree, all, BlockStyle::List(ListKind::Unordered));

        // When indenting the middle item
        let sel = Selection::collapsed(Point::new(leaves[1], 0));
        let sel = indent(&mut tree, sel);

        // Then it moves into a sublist held by a marker-hidden item
        assert_snapshot!(
            to_markup(&tree),
            @r#"<ul><li>a</li><li style="list-style-type: none"><ul><li>b</li></ul></li><li>c</li></ul>"#
        );
        assert!(violations(&tree).is_empty());

        // And indenting the last item joins the same sublist
        indent(&mut tree, Selection::collapsed(Point::new(leaves[2], 0)));
        assert_snapshot!(
            to_markup(&tree),
            @r#"<ul><li>a</li><li style="list-style-type: none"><ul><li>b</li><li>c</li></ul></li></ul>"#
        );

        // When outdenting the middle item again
        outdent(&mut tree, sel);

        // Then it is back in the outer list
        assert_snapshot!(
            to_markup(&tree),
            @r#"<ul><li>a</li><li>b</li><li style="list-style-type: none"><ul><li>c</li></ul></li></ul>"#
        );
        assert!(violations(&tree).is_empty());
    }

    #[test]
    fn outdent_top_level_item_leaves_the_list() {
        let (mut tree, leaves) = lines(&["a", "b"]);
        let all = across(&tree, leaves[0], leaves[1]);
        apply(&mut tree, all, BlockStyle::List(ListKind::Ordered));
        outdent(&mut tree, Selection::collapsed(Point::new(leaves[0], 0)));
        assert_eq!(to_markup(&tree), "<div>a</div><ol><li>b</li></ol>");
    }

    /// An unordered list with one item per text, returning the text leaves
    fn list_of(texts: &[&str]) -> (DocTree, Vec<NodeId>) {
        let (mut tree, leaves) = lines(texts);
        let all = across(&tree, leaves[0], leaves[leaves.len() - 1]);
        apply(&mut tree, all, BlockStyle::List(ListKind::Unordered));
        (tree, leaves)
    }

    fn caret(leaf: NodeId) -> Selection {
        Selection::collapsed(Point::new(leaf, 0))
    }

    #[test]
    fn outdent_sole_nested_item_returns_it_to_the_list() {
        // Given a list whose middle item is the only item of a sublist
        let (mut tree, leaves) = list_of(&["a", "b", "c"]);
        let sel = indent(&mut tree, caret(leaves[1]));

        // When outdenting it
        outdent(&mut tree, sel);

        // Then the list is whole again
        assert_eq!(to_markup(&tree), "<ul><li>a</li><li>b</li><li>c</li></ul>");
        assert!(violations(&tree).is_empty());
    }

    #[test]
    fn outdent_unwinds_deep_nesting_one_level_at_a_time() {
        // Given b and c nested once, and c nested again below b
        let (mut tree, leaves) = list_of(&["a", "b", "c", "d"]);
        let middle = across(&tree, leaves[1], leaves[2]);
        indent(&mut tree, middle);
        let once = to_markup(&tree);
        assert_snapshot!(
            to_markup(&tree),
            @r#"<ul><li>a</li><li style="list-style-type: none"><ul><li>b</li><li>c</li></ul></li><li>d</li></ul>"#
        );
        indent(&mut tree, caret(leaves[2]));
        assert_snapshot!(
            to_markup(&tree),
            @r#"<ul><li>a</li><li style="list-style-type: none"><ul><li>b</li><li style="list-style-type: none"><ul><li>c</li></ul></li></ul></li><li>d</li></ul>"#
        );

        // When outdenting c once
        outdent(&mut tree, caret(leaves[2]));

        // Then it sits next to b again
        assert_eq!(to_markup(&tree), once);

        // And further outdents bring every item back to the top level
        outdent(&mut tree, caret(leaves[2]));
        assert_snapshot!(
            to_markup(&tree),
            @r#"<ul><li>a</li><li style="list-style-type: none"><ul><li>b</li></ul></li><li>c</li><li>d</li></ul>"#
        );
        outdent(&mut tree, caret(leaves[1]));
        assert_eq!(
            to_markup(&tree),
            "<ul><li>a</li><li>b</li><li>c</li><li>d</li></ul>"
        );
        assert!(violations(&tree).is_empty());
    }

    #[rstest]
    #[case::first(0)]
    #[case::middle(1)]
    #[case::last(2)]
    fn indent_then_outdent_restores_the_list(#[case] index: usize) {
        let (mut tree, leaves) = list_of(&["a", "b", "c"]);
        let before = to_markup(&tree);

        let sel = indent(&mut tree, caret(leaves[index]));
        assert_ne!(to_markup(&tree), before);
        outdent(&mut tree, sel);

        assert_eq!(to_markup(&tree), before);
    }

    #[test]
    fn outdent_whole_list_dissolves_it() {
        let (mut tree, leaves) = list_of(&["a", "b"]);
        let all = across(&tree, leaves[0], leaves[1]);
        outdent(&mut tree, all);
        assert_eq!(to_markup(&tree), "<div>a</div><div>b</div>");
    }

    #[rstest]
    #[case::quote(BlockStyle::Quote)]
    #[case::list(BlockStyle::List(ListKind::Unordered))]
    fn align_flattens_covered_containers(#[case] container: BlockStyle) {
        // Given two lines inside a container
        let (mut tree, leaves) = lines(&["a", "b"]);
        let sel = across(&tree, leaves[0], leaves[1]);
        let sel = apply(&mut tree, sel, container);

        // When centering both
        apply(&mut tree, sel, BlockStyle::Align(Alignment::Center));

        // Then the container gives way to aligned lines
        insta::allow_duplicates! {
            assert_snapshot!(
                to_markup(&tree),
                @r#"<div style="text-align: center">a</div><div style="text-align: center">b</div>"#
            );
        }
        assert!(violations(&tree).is_empty());
    }

    #[test]
    fn align_on_one_list_item_keeps_the_list() {
        let (mut tree, leaves) = list_of(&["a", "b"]);
        apply(&mut tree, caret(leaves[0]), BlockStyle::Align(Alignment::Right));
        assert_eq!(
            to_markup(&tree),
            r#"<ul><li style="text-align: right">a</li><li>b</li></ul>"#
        );
    }

    #[test]
    fn block_style_on_empty_document_creates_a_line() {
        let mut tree = DocTree::new();
        let root = tree.root();
        apply(&mut tree, Selection::collapsed(Point::new(root, 0)), BlockStyle::Heading(3));
        assert_eq!(to_markup(&tree), "<h3><br></h3>");
    }
}
