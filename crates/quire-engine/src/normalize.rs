//! # Normalization Passes
//!
//! Every mutating routine ends by running these passes on what it touched,
//! so the tree satisfies the grammar invariants when control returns to the
//! caller. There is no separate after-the-fact correction step.
//!
//! ## Inline normalization
//!
//! [`normalize_inline`] rebuilds the inline content of one line block from
//! its leaves. Each leaf's effective [`StyleSet`] is folded from its wrapper
//! ancestors, then wrappers are regenerated in canonical order, grouping
//! consecutive leaves that share a wrapper at each depth:
//!
//! ```text
//! b["x"] i[b["y"]] b["z"]      leaves: x{b} y{b,i} z{b}
//!
//! b["x", i["y"], "z"]          one bold wrapper, italic nested once
//! ```
//!
//! This merges equal adjacent wrappers, removes redundant nesting, drops
//! wrappers that lost all their leaves and empty text leaves, and merges
//! adjacent text leaves with identical styling. Leaf ids other than merged
//! text survive.
//!
//! ## Block tidying
//!
//! [`tidy`] walks the whole tree and enforces block shape:
//!
//! 1. mixed block/inline children, and inline content directly in the
//!    root or a quote: inline runs are wrapped in divisions
//!    (whitespace-only runs are dropped)
//! 2. list children that are not list items are wrapped in items; items
//!    outside a list become divisions
//! 3. empty lists and quotes are removed; empty line blocks get a line break
//! 4. attribute-less divisions holding only blocks are spliced out
//! 5. adjacent equal lists, quotes and holder items are merged
//! 6. list item markers are recomputed

use crate::grammar::{Block, BlockTag, DocTree, NodeId, NodeKind, StyleSet, Wrapper};

/// Rebuild the inline content of `block` in canonical form.
///
/// Does nothing when `block` has block children.
pub fn normalize_inline(tree: &mut DocTree, block: NodeId) {
    if tree
        .children(block)
        .iter()
        .any(|&c| tree.kind(c).is_block())
    {
        return;
    }

    let mut items: Vec<(NodeId, StyleSet)> = Vec::new();
    collect_styled_leaves(tree, block, &StyleSet::default(), &mut items);

    for &(leaf, _) in &items {
        tree.detach(leaf);
    }
    for wrapper in tree.children(block).to_vec() {
        tree.remove(wrapper);
    }

    let mut merged: Vec<(NodeId, StyleSet)> = Vec::with_capacity(items.len());
    for (leaf, set) in items {
        let Some(text) = tree.text(leaf).map(str::to_string) else {
            merged.push((leaf, set));
            continue;
        };
        if text.is_empty() {
            tree.remove(leaf);
            continue;
        }
        if let Some((prev, prev_set)) = merged.last()
            && *prev_set == set
            && let NodeKind::Text(prev_text) = tree.kind_mut(*prev)
        {
            prev_text.push_str(&text);
            tree.remove(leaf);
            continue;
        }
        merged.push((leaf, set));
    }

    let chained: Vec<(NodeId, Vec<Wrapper>)> = merged
        .into_iter()
        .map(|(leaf, set)| (leaf, set.chain()))
        .collect();
    build_wrappers(tree, block, &chained, 0);
}

fn collect_styled_leaves(
    tree: &DocTree,
    node: NodeId,
    inherited: &StyleSet,
    out: &mut Vec<(NodeId, StyleSet)>,
) {
    for &child in tree.children(node) {
        match tree.kind(child) {
            NodeKind::Wrapper(wrapper) => {
                let mut set = inherited.clone();
                set.add(wrapper);
                collect_styled_leaves(tree, child, &set, out);
            }
            kind if kind.is_leaf() => out.push((child, inherited.clone())),
            _ => {}
        }
    }
}

fn build_wrappers(
    tree: &mut DocTree,
    parent: NodeId,
    items: &[(NodeId, Vec<Wrapper>)],
    depth: usize,
) {
    let mut index = 0;
    while index < items.len() {
        let (leaf, chain) = &items[index];
        let Some(wrapper) = chain.get(depth) else {
            tree.append(parent, *leaf);
            index += 1;
            continue;
        };
        let mut end = index + 1;
        while end < items.len() && items[end].1.get(depth) == Some(wrapper) {
            end += 1;
        }
        let node = tree.create_child(parent, NodeKind::Wrapper(wrapper.clone()));
        build_wrappers(tree, node, &items[index..end], depth + 1);
        index = end;
    }
}

/// Effective inline styling of a leaf.
pub fn style_of(tree: &DocTree, leaf: NodeId) -> StyleSet {
    let mut chain: Vec<&Wrapper> = tree
        .ancestors(leaf)
        .into_iter()
        .map_while(|a| tree.kind(a).as_wrapper())
        .collect();
    chain.reverse();
    StyleSet::from_chain(chain)
}

/// Whether every leaf under `nodes` is whitespace-only text.
fn is_blank_run(tree: &DocTree, nodes: &[NodeId]) -> bool {
    nodes.iter().all(|&n| {
        tree.leaves(n).into_iter().all(|leaf| {
            tree.text(leaf)
                .is_some_and(|t| t.chars().all(|c| c.is_ascii_whitespace()))
        })
    })
}

/// Whether `id` is a block whose children are inline (or absent).
pub fn is_line_block(tree: &DocTree, id: NodeId) -> bool {
    let Some(block) = tree.kind(id).as_block() else {
        return false;
    };
    !matches!(block.tag, BlockTag::List(_) | BlockTag::Quote)
        && !tree
            .children(id)
            .iter()
            .any(|&c| tree.kind(c).is_block())
}

/// Enforce block shape over the whole tree.
pub fn tidy(tree: &mut DocTree) {
    let root = tree.root();
    tidy_node(tree, root);
}

fn tidy_node(tree: &mut DocTree, node: NodeId) {
    shape_children(tree, node);

    for child in tree.children(node).to_vec() {
        if tree.contains(child) && tree.kind(child).is_block() {
            tidy_node(tree, child);
        }
    }

    prune_children(tree, node);
    merge_siblings(tree, node);

    if is_line_block(tree, node) {
        normalize_inline(tree, node);
        if tree.children(node).is_empty() {
            tree.create_child(node, NodeKind::line_break());
        }
    }

    if let Some(Block {
        tag: BlockTag::ListItem { marker_hidden },
        ..
    }) = tree.kind(node).as_block().copied()
    {
        let hidden = tree
            .children(node)
            .first()
            .is_some_and(|&c| tree.kind(c).is_list());
        if hidden != marker_hidden
            && let Some(block) = tree.kind_mut(node).as_block_mut()
        {
            block.tag = BlockTag::ListItem {
                marker_hidden: hidden,
            };
        }
    }
}

/// Maximal runs of consecutive inline children, as index ranges.
fn inline_runs(tree: &DocTree, node: NodeId) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut start = None;
    let children = tree.children(node);
    for (index, &child) in children.iter().enumerate() {
        let inline = tree.kind(child).is_inline();
        match (inline, start) {
            (true, None) => start = Some(index),
            (false, Some(s)) => {
                runs.push((s, index));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push((s, children.len()));
    }
    runs
}

/// Wrap (or drop, when blank) each inline run among `node`'s children.
fn wrap_inline_runs(tree: &mut DocTree, node: NodeId, wrapper: fn() -> NodeKind) {
    // Back to front so earlier indices stay valid
    for (start, end) in inline_runs(tree, node).into_iter().rev() {
        let run = tree.children(node)[start..end].to_vec();
        if is_blank_run(tree, &run) {
            for n in run {
                tree.remove(n);
            }
        } else {
            tree.wrap_range(node, start, end, wrapper());
        }
    }
}

fn shape_children(tree: &mut DocTree, node: NodeId) {
    let kind = tree.kind(node).clone();

    if kind.is_list() {
        wrap_inline_runs(tree, node, NodeKind::list_item);
        for child in tree.children(node).to_vec() {
            if !tree.kind(child).is_list_item() {
                tree.wrap(child, NodeKind::list_item());
            }
        }
        return;
    }

    for child in tree.children(node).to_vec() {
        if tree.kind(child).is_list_item()
            && let Some(block) = tree.kind_mut(child).as_block_mut()
        {
            block.tag = BlockTag::Division;
        }
    }

    let children = tree.children(node);
    let has_block = children.iter().any(|&c| tree.kind(c).is_block());
    let has_inline = children.iter().any(|&c| tree.kind(c).is_inline());

    if has_block
        && matches!(kind.block_tag(), Some(BlockTag::Heading(_)))
        && let Some(block) = tree.kind_mut(node).as_block_mut()
    {
        block.tag = BlockTag::Division;
    }

    let must_hold_blocks = kind.is_quote() || kind == NodeKind::Root;
    if has_inline && (has_block || must_hold_blocks) {
        wrap_inline_runs(tree, node, NodeKind::division);
    }
}

fn prune_children(tree: &mut DocTree, node: NodeId) {
    let in_list = tree.kind(node).is_list();
    for child in tree.children(node).to_vec() {
        let Some(block) = tree.kind(child).as_block().copied() else {
            continue;
        };
        let children = tree.children(child);

        if matches!(block.tag, BlockTag::List(_) | BlockTag::Quote) && children.is_empty() {
            tree.remove(child);
            continue;
        }

        let only_blocks =
            !children.is_empty() && children.iter().all(|&c| tree.kind(c).is_block());
        if !in_list && block.is_plain_division() && only_blocks {
            tree.unwrap(child);
            continue;
        }

        if block.tag == (BlockTag::ListItem { marker_hidden: false })
            && let [only] = children
            && tree
                .kind(*only)
                .as_block()
                .is_some_and(|b| b.is_plain_division())
            && is_line_block(tree, *only)
        {
            let only = *only;
            tree.move_children(only, child);
            tree.remove(only);
        }
    }
}

/// Fold each mergeable child into an equal previous sibling.
///
/// The merged node is revisited, since the children it gained may now be
/// mergeable neighbours themselves.
fn merge_siblings(tree: &mut DocTree, node: NodeId) {
    let mut prev: Option<NodeId> = None;
    for child in tree.children(node).to_vec() {
        if let Some(p) = prev
            && tree.kind(p) == tree.kind(child)
            && mergeable(tree, p)
            && mergeable(tree, child)
        {
            tree.move_children(child, p);
            tree.remove(child);
            merge_siblings(tree, p);
            continue;
        }
        prev = Some(child);
    }
}

fn mergeable(tree: &DocTree, node: NodeId) -> bool {
    match tree.kind(node).block_tag() {
        Some(BlockTag::List(_) | BlockTag::Quote) => true,
        Some(BlockTag::ListItem { marker_hidden }) => {
            marker_hidden
                && tree
                    .children(node)
                    .iter()
                    .all(|&c| tree.kind(c).is_list())
        }
        _ => false,
    }
}
