//! # Range Resolver
//!
//! Maps a raw selection onto the grammar leaves it touches.
//!
//! A [`Point`] is a node plus an offset. For leaves the offset counts
//! positions inside the leaf (characters for text, 0..=1 for voids); for
//! containers it is a child index, so `(div, 2)` means "before the third
//! child of `div`".
//!
//! ## Resolution
//!
//! [`resolve`] descends the start point forward into the first leaf at or
//! after it and the end point backward into the last leaf at or before it,
//! collects every leaf in between in document order, then trims boundary
//! leaves that contribute nothing (a start sitting at the very end of a
//! leaf, an end at the very start of one, zero-width carets).
//!
//! ```text
//! <div>ab|c</div><div>de|f</div>     selection  "c" .. "de"
//!
//! leaves        [ "abc", "def" ]
//! start_offset  2   (local to "abc")
//! end_offset    2   (local to "def")
//! ```
//!
//! ## Block extension
//!
//! Block operations always work on whole blocks. [`block_extend`] pushes
//! the endpoints outward to the enclosing line blocks, then keeps ascending
//! while the block is the first (or last) child of its container, so a
//! selection spanning a whole quote covers the quote itself.
//! [`covered_blocks`] then walks siblings forward between the two
//! boundaries, entering a container only when it is partially covered.
//!
//! ## Linear offsets
//!
//! [`doc_offset`] and [`point_at_offset`] flatten a point to the number of
//! leaf positions before it. Inline operations never change text, so
//! selections are carried across splits and merges this way.

use crate::grammar::{DocTree, NodeId, NodeKind};

/// A position in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub node: NodeId,
    pub offset: usize,
}

impl Point {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// A selection between two points, in either order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Selection {
    pub start: Point,
    pub end: Point,
}

impl Selection {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    pub fn collapsed(point: Point) -> Self {
        Self {
            start: point,
            end: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Everything in the document.
    pub fn all(tree: &DocTree) -> Self {
        let root = tree.root();
        match (tree.first_leaf(root), tree.last_leaf(root)) {
            (Some(first), Some(last)) => Self::new(
                Point::new(first, 0),
                Point::new(last, tree.leaf_len(last)),
            ),
            _ => Self::collapsed(Point::new(root, 0)),
        }
    }
}

/// Leaves touched by a selection, with offsets local to the first and last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRange {
    pub leaves: Vec<NodeId>,
    pub start_offset: usize,
    pub end_offset: usize,
    /// Where new content goes when there are no leaves
    pub insertion: Point,
}

impl ResolvedRange {
    fn empty(insertion: Point) -> Self {
        Self {
            leaves: Vec::new(),
            start_offset: 0,
            end_offset: 0,
            insertion,
        }
    }

    /// Whether the range selects no content.
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty() || (self.leaves.len() == 1 && self.start_offset >= self.end_offset)
    }
}

/// Sort key of a point in document order.
fn position_key(tree: &DocTree, point: Point) -> Vec<usize> {
    let mut key = tree.path(point.node);
    key.push(point.offset);
    key
}

/// `selection` with its endpoints in document order.
pub fn ordered(tree: &DocTree, selection: Selection) -> Selection {
    if position_key(tree, selection.end) < position_key(tree, selection.start) {
        Selection::new(selection.end, selection.start)
    } else {
        selection
    }
}

/// First leaf at or after `point`.
fn descend_forward(tree: &DocTree, point: Point) -> Option<(NodeId, usize)> {
    if tree.is_leaf(point.node) {
        return Some((point.node, point.offset.min(tree.leaf_len(point.node))));
    }
    let children = tree.children(point.node);
    let start = point.offset.min(children.len());
    children[start..]
        .iter()
        .find_map(|&c| tree.first_leaf(c))
        .or_else(|| tree.next_leaf(point.node))
        .map(|leaf| (leaf, 0))
}

/// Last leaf at or before `point`.
fn descend_backward(tree: &DocTree, point: Point) -> Option<(NodeId, usize)> {
    if tree.is_leaf(point.node) {
        return Some((point.node, point.offset.min(tree.leaf_len(point.node))));
    }
    let children = tree.children(point.node);
    let end = point.offset.min(children.len());
    children[..end]
        .iter()
        .rev()
        .find_map(|&c| tree.last_leaf(c))
        .or_else(|| tree.prev_leaf(point.node))
        .map(|leaf| (leaf, tree.leaf_len(leaf)))
}

fn resolve_collapsed(tree: &DocTree, point: Point) -> ResolvedRange {
    if tree.is_leaf(point.node) {
        let offset = point.offset.min(tree.leaf_len(point.node));
        return ResolvedRange {
            leaves: vec![point.node],
            start_offset: offset,
            end_offset: offset,
            insertion: point,
        };
    }
    let children = tree.children(point.node);
    let index = point.offset.min(children.len());
    let before = children[..index]
        .iter()
        .rev()
        .find_map(|&c| tree.last_leaf(c))
        .map(|leaf| (leaf, tree.leaf_len(leaf)));
    let after = children[index..]
        .iter()
        .find_map(|&c| tree.first_leaf(c))
        .map(|leaf| (leaf, 0));
    match before.or(after) {
        Some((leaf, offset)) => ResolvedRange {
            leaves: vec![leaf],
            start_offset: offset,
            end_offset: offset,
            insertion: point,
        },
        None => ResolvedRange::empty(point),
    }
}

/// Resolve a selection onto leaves.
pub fn resolve(tree: &DocTree, selection: Selection) -> ResolvedRange {
    let selection = ordered(tree, selection);
    if selection.is_collapsed() {
        return resolve_collapsed(tree, selection.start);
    }

    let (Some((first, mut start_offset)), Some((last, mut end_offset))) = (
        descend_forward(tree, selection.start),
        descend_backward(tree, selection.end),
    ) else {
        return ResolvedRange::empty(selection.start);
    };

    let mut leaves = vec![first];
    let mut current = first;
    while current != last {
        match tree.next_leaf(current) {
            Some(next) => {
                leaves.push(next);
                current = next;
            }
            // The end lies before the start: nothing between them
            None => return resolve_collapsed(tree, selection.start),
        }
    }

    while leaves.len() > 1 {
        let len = tree.leaf_len(leaves[0]);
        if len == 0 || start_offset >= len {
            leaves.remove(0);
            start_offset = 0;
        } else {
            break;
        }
    }
    while leaves.len() > 1 {
        let last = leaves[leaves.len() - 1];
        if tree.leaf_len(last) == 0 || end_offset == 0 {
            leaves.pop();
            end_offset = leaves.last().map(|&l| tree.leaf_len(l)).unwrap_or(0);
        } else {
            break;
        }
    }
    if leaves.len() > 2 {
        let inner_end = leaves.len() - 1;
        let mut index = 1;
        while index < inner_end.min(leaves.len() - 1) {
            if matches!(tree.kind(leaves[index]), NodeKind::Caret) {
                leaves.remove(index);
            } else {
                index += 1;
            }
        }
    }

    ResolvedRange {
        leaves,
        start_offset,
        end_offset,
        insertion: selection.start,
    }
}

/// Number of leaf positions before `point`.
pub fn doc_offset(tree: &DocTree, point: Point) -> usize {
    // A container point counts up to the first leaf at or after it
    let stop = if tree.is_leaf(point.node) {
        Some((point.node, point.offset))
    } else {
        descend_forward(tree, point).map(|(leaf, _)| (leaf, 0))
    };
    let mut total = 0;
    for leaf in tree.leaves(tree.root()) {
        if let Some((node, offset)) = stop
            && node == leaf
        {
            return total + offset.min(tree.leaf_len(leaf));
        }
        total += tree.leaf_len(leaf);
    }
    total
}

/// Which side of a boundary a linear offset resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
    /// End of the earlier leaf
    Backward,
    /// Start of the later leaf
    Forward,
}

/// Inverse of [`doc_offset`].
pub fn point_at_offset(tree: &DocTree, offset: usize, bias: Bias) -> Point {
    let root = tree.root();
    let leaves: Vec<NodeId> = tree
        .leaves(root)
        .into_iter()
        .filter(|&l| tree.leaf_len(l) > 0)
        .collect();
    let Some(&last) = leaves.last() else {
        return Point::new(root, 0);
    };

    let mut consumed = 0;
    for &leaf in &leaves {
        let len = tree.leaf_len(leaf);
        let hit = match bias {
            Bias::Backward => offset > consumed && offset <= consumed + len,
            Bias::Forward => offset >= consumed && offset < consumed + len,
        };
        if hit {
            return Point::new(leaf, offset - consumed);
        }
        consumed += len;
    }
    if offset == 0 {
        return Point::new(leaves[0], 0);
    }
    Point::new(last, tree.leaf_len(last))
}

/// A selection widened to block boundaries, as root-relative positions.
///
/// Each boundary is a path to a container plus a child index, so
/// `start = [1, 0]` means "before the first child of the root's second
/// child".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRange {
    pub start: Vec<usize>,
    pub end: Vec<usize>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Edge {
    Start,
    End,
}

fn extend_up(tree: &DocTree, block: NodeId, edge: Edge) -> NodeId {
    let root = tree.root();
    let mut node = block;
    while let Some(parent) = tree.parent(node) {
        if parent == root {
            break;
        }
        let Some(index) = tree.index_of(node) else {
            break;
        };
        let at_edge = match edge {
            Edge::Start => index == 0,
            Edge::End => index + 1 == tree.children(parent).len(),
        };
        if !at_edge {
            break;
        }
        node = parent;
    }
    node
}

/// Widen a selection so both ends land on block boundaries.
///
/// Returns `None` when the selection touches no leaves at all.
pub fn block_extend(tree: &DocTree, selection: Selection) -> Option<BlockRange> {
    let range = resolve(tree, selection);
    let (&first, &last) = (range.leaves.first()?, range.leaves.last()?);
    let root = tree.root();

    let first_block = tree.line_block(first);
    let last_block = tree.line_block(last);
    if first_block == root || last_block == root {
        return Some(BlockRange {
            start: vec![0],
            end: vec![tree.children(root).len()],
        });
    }

    let start_node = extend_up(tree, first_block, Edge::Start);
    let end_node = extend_up(tree, last_block, Edge::End);

    let mut start = tree.path(start_node);
    let mut end = tree.path(end_node);
    if let Some(index) = end.last_mut() {
        *index += 1;
    }
    if start.is_empty() {
        start.push(0);
    }
    Some(BlockRange { start, end })
}

/// Blocks fully inside `range`, in document order.
///
/// Walks siblings forward, entering a child only when it is partially
/// covered and has block children of its own.
pub fn covered_blocks(tree: &DocTree, range: &BlockRange) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut path = Vec::new();
    collect_covered(tree, tree.root(), &mut path, range, &mut out);
    out
}

fn collect_covered(
    tree: &DocTree,
    node: NodeId,
    path: &mut Vec<usize>,
    range: &BlockRange,
    out: &mut Vec<NodeId>,
) {
    for (index, &child) in tree.children(node).iter().enumerate() {
        if !tree.kind(child).is_block() {
            continue;
        }
        path.push(index);
        let child_start = path.clone();
        if let Some(last) = path.last_mut() {
            *last += 1;
        }
        let child_end = path.clone();
        path.pop();

        if range.start <= child_start && child_end <= range.end {
            out.push(child);
        } else if child_start < range.end && range.start < child_end {
            let has_block_children = tree
                .children(child)
                .iter()
                .any(|&c| tree.kind(c).is_block());
            if has_block_children {
                path.push(index);
                collect_covered(tree, child, path, range, out);
                path.pop();
            } else {
                out.push(child);
            }
        }
    }
}
