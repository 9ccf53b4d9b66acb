//! Structural checks for the grammar invariants.
//!
//! Editing routines never call this; they build valid trees directly.
//! [`violations`] is for tests, for the CLI's `validate` command and for
//! asserting that imported documents came out in shape.

use crate::grammar::{BlockTag, DocTree, NodeId, NodeKind, Wrapper};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    #[error("node {0:?} mixes block and inline children")]
    MixedChildren(NodeId),
    #[error("container {0:?} holds inline content directly")]
    InlineInContainer(NodeId),
    #[error("block {0:?} sits inside inline content")]
    BlockInInline(NodeId),
    #[error("leaf {0:?} has children")]
    LeafWithChildren(NodeId),
    #[error("text leaf {0:?} is empty")]
    EmptyText(NodeId),
    #[error("wrapper {0:?} has no content and does not hold the caret")]
    EmptyWrapper(NodeId),
    #[error("{0} caret placeholders in one document")]
    MultipleCarets(usize),
    #[error("wrapper {0:?} repeats the style of an enclosing wrapper")]
    NestedWrapper(NodeId),
    #[error("wrappers {0:?} and {1:?} are adjacent and equal")]
    AdjacentWrappers(NodeId, NodeId),
    #[error("containers {0:?} and {1:?} are adjacent and equal")]
    AdjacentContainers(NodeId, NodeId),
    #[error("list {0:?} has a child that is not a list item")]
    ListChild(NodeId),
    #[error("list item {0:?} is outside a list")]
    OrphanListItem(NodeId),
    #[error("list item {0:?} marker visibility does not match its first child")]
    MarkerMismatch(NodeId),
}

/// Every invariant violation in `tree`, in document order.
pub fn violations(tree: &DocTree) -> Vec<Violation> {
    let mut out = Vec::new();
    let mut carets = 0;
    let root = tree.root();
    for id in std::iter::once(root).chain(tree.descendants(root)) {
        if matches!(tree.kind(id), NodeKind::Caret) {
            carets += 1;
        }
        check_node(tree, id, &mut out);
    }
    if carets > 1 {
        out.push(Violation::MultipleCarets(carets));
    }
    out
}

fn check_node(tree: &DocTree, id: NodeId, out: &mut Vec<Violation>) {
    let kind = tree.kind(id);
    let children = tree.children(id);

    if kind.is_leaf() {
        if !children.is_empty() {
            out.push(Violation::LeafWithChildren(id));
        }
        if tree.text(id).is_some_and(str::is_empty) {
            out.push(Violation::EmptyText(id));
        }
        return;
    }

    let has_block = children.iter().any(|&c| tree.kind(c).is_block());
    let has_inline = children.iter().any(|&c| tree.kind(c).is_inline());

    match kind {
        NodeKind::Wrapper(wrapper) => {
            if has_block {
                for &c in children.iter().filter(|&&c| tree.kind(c).is_block()) {
                    out.push(Violation::BlockInInline(c));
                }
            }
            check_wrapper(tree, id, wrapper, out);
        }
        NodeKind::Root => {
            if has_inline {
                out.push(Violation::InlineInContainer(id));
            }
        }
        NodeKind::Block(block) => {
            match block.tag {
                BlockTag::Quote if has_inline => out.push(Violation::InlineInContainer(id)),
                BlockTag::List(_) => {
                    if children.iter().any(|&c| !tree.kind(c).is_list_item()) {
                        out.push(Violation::ListChild(id));
                    }
                }
                BlockTag::ListItem { marker_hidden } => {
                    if !tree.parent(id).is_some_and(|p| tree.kind(p).is_list()) {
                        out.push(Violation::OrphanListItem(id));
                    }
                    let starts_with_list =
                        children.first().is_some_and(|&c| tree.kind(c).is_list());
                    if marker_hidden != starts_with_list {
                        out.push(Violation::MarkerMismatch(id));
                    }
                }
                _ => {}
            }
            if has_block && has_inline {
                out.push(Violation::MixedChildren(id));
            }
        }
        _ => {}
    }

    for pair in children.windows(2) {
        match (tree.kind(pair[0]), tree.kind(pair[1])) {
            (NodeKind::Wrapper(a), NodeKind::Wrapper(b)) if a == b => {
                out.push(Violation::AdjacentWrappers(pair[0], pair[1]));
            }
            (NodeKind::Block(a), NodeKind::Block(b))
                if a == b && matches!(a.tag, BlockTag::List(_) | BlockTag::Quote) =>
            {
                out.push(Violation::AdjacentContainers(pair[0], pair[1]));
            }
            _ => {}
        }
    }
}

fn check_wrapper(tree: &DocTree, id: NodeId, wrapper: &Wrapper, out: &mut Vec<Violation>) {
    let leaves = tree.leaves(id);
    let holds_content = leaves
        .iter()
        .any(|&l| !matches!(tree.kind(l), NodeKind::Caret));
    let holds_only_caret =
        matches!(leaves.as_slice(), [only] if matches!(tree.kind(*only), NodeKind::Caret));
    if !holds_content && !holds_only_caret {
        out.push(Violation::EmptyWrapper(id));
    }

    let same_family =
        |other: &Wrapper| std::mem::discriminant(other) == std::mem::discriminant(wrapper);
    if tree
        .ancestors(id)
        .into_iter()
        .map_while(|a| tree.kind(a).as_wrapper())
        .any(same_family)
    {
        out.push(Violation::NestedWrapper(id));
    }
}
