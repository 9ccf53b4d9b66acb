//! # Document Tree Arena
//!
//! The document is an explicit arena of nodes addressed by generational
//! [`NodeId`]s, backed by a [`SlotMap`]. Nodes never hold references to
//! each other, only ids, so the tree can be cloned wholesale for history
//! checkpoints and ids stay valid across a clone.
//!
//! ## Offsets
//!
//! Every leaf has a length used for selection offsets:
//!
//! | leaf | length |
//! |------|--------|
//! | text | number of `char`s |
//! | void | 1 |
//! | caret | 0 |
//!
//! ## Splitting
//!
//! The style engines constantly need "the part of this ancestor that
//! contains only these leaves". [`DocTree::split_before`],
//! [`DocTree::split_after`] and [`DocTree::isolate`] provide that: they clone
//! each ancestor level between a node and a chosen top ancestor, moving the
//! siblings on one side into the clones. A clone is only made at levels that
//! actually have siblings to move, so no empty containers are produced.
//!
//! ```text
//! isolate(b, "y", "y") on  b["x", "y", "z"]
//!
//!     b["x"]  b["y"]  b["z"]
//!             ^ still the original id
//! ```

use slotmap::{SlotMap, new_key_type};

use super::node::NodeKind;

new_key_type! {
    /// Stable identifier of a node in a [`DocTree`].
    pub struct NodeId;
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A rooted ordered tree of grammar nodes.
#[derive(Debug, Clone)]
pub struct DocTree {
    nodes: SlotMap<NodeId, Node>,
    root: NodeId,
}

impl Default for DocTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DocTree {
    /// Create a tree holding only an empty root.
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node {
            kind: NodeKind::Root,
            parent: None,
            children: Vec::new(),
        });
        Self { nodes, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the root has no children.
    pub fn is_empty(&self) -> bool {
        self.nodes[self.root].children.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id).map(|n| &n.kind)
    }

    /// Kind of a live node.
    ///
    /// # Panics
    ///
    /// Panics if `id` was removed from the tree. Use [`DocTree::get`] for
    /// ids that may be stale.
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id].kind
    }

    /// # Panics
    ///
    /// Panics if `id` was removed from the tree.
    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.nodes[id].kind
    }

    /// Parent of `id`; `None` for the root, detached nodes and stale ids.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    /// Children of `id`; empty for leaves and stale ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map_or(&[], |n| n.children.as_slice())
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Construction and linking
    // ------------------------------------------------------------------

    /// Create a detached node.
    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.insert(Node {
            kind,
            parent: None,
            children: Vec::new(),
        })
    }

    /// Create a node and append it to `parent`.
    pub fn create_child(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = self.create(kind);
        self.append(parent, id);
        id
    }

    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
    }

    /// Insert `child` at `index` among `parent`'s children (clamped).
    pub fn insert(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        let children = &mut self.nodes[parent].children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.nodes[child].parent = Some(parent);
    }

    pub fn insert_before(&mut self, anchor: NodeId, node: NodeId) {
        if let Some(parent) = self.parent(anchor)
            && let Some(index) = self.index_of(anchor)
        {
            self.insert(parent, index, node);
        }
    }

    pub fn insert_after(&mut self, anchor: NodeId, node: NodeId) {
        if let Some(parent) = self.parent(anchor)
            && let Some(index) = self.index_of(anchor)
        {
            self.insert(parent, index + 1, node);
        }
    }

    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_of(id)?;
        index
            .checked_sub(1)
            .and_then(|i| self.children(parent).get(i).copied())
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_of(id)?;
        self.children(parent).get(index + 1).copied()
    }

    /// Unlink `id` from its parent; the subtree stays in the arena.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id].parent.take() {
            self.nodes[parent].children.retain(|&c| c != id);
        }
    }

    /// Unlink and delete `id` with its whole subtree.
    pub fn remove(&mut self, id: NodeId) {
        if id == self.root {
            return;
        }
        self.detach(id);
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.remove(next) {
                stack.extend(node.children);
            }
        }
    }

    /// Replace `id` by its children and delete it.
    pub fn unwrap(&mut self, id: NodeId) -> Vec<NodeId> {
        let children = std::mem::take(&mut self.nodes[id].children);
        let (Some(parent), Some(index)) = (self.parent(id), self.index_of(id)) else {
            self.nodes[id].children = children;
            return Vec::new();
        };
        for &child in &children {
            self.nodes[child].parent = Some(parent);
        }
        let _replaced: Vec<NodeId> = self.nodes[parent]
            .children
            .splice(index..=index, children.iter().copied())
            .collect();
        self.nodes.remove(id);
        children
    }

    /// Put a new node of `kind` in `id`'s place, with `id` as its only child.
    pub fn wrap(&mut self, id: NodeId, kind: NodeKind) -> NodeId {
        let wrapper = self.create(kind);
        if let (Some(parent), Some(index)) = (self.parent(id), self.index_of(id)) {
            self.nodes[parent].children[index] = wrapper;
            self.nodes[wrapper].parent = Some(parent);
            self.nodes[id].parent = None;
        }
        self.append(wrapper, id);
        wrapper
    }

    /// Wrap `parent`'s children in `start..end` into a new node.
    pub fn wrap_range(&mut self, parent: NodeId, start: usize, end: usize, kind: NodeKind) -> NodeId {
        let wrapper = self.create(kind);
        let len = self.children(parent).len();
        let end = end.min(len);
        let start = start.min(end);
        let moved: Vec<NodeId> = self.nodes[parent]
            .children
            .splice(start..end, std::iter::once(wrapper))
            .collect();
        self.nodes[wrapper].parent = Some(parent);
        for child in moved {
            self.nodes[child].parent = Some(wrapper);
            self.nodes[wrapper].children.push(child);
        }
        wrapper
    }

    /// Move all children of `from` to the end of `to`.
    pub fn move_children(&mut self, from: NodeId, to: NodeId) {
        let children = std::mem::take(&mut self.nodes[from].children);
        for child in children {
            self.nodes[child].parent = Some(to);
            self.nodes[to].children.push(child);
        }
    }

    /// Detached copy of `id` without children.
    pub fn shallow_clone(&mut self, id: NodeId) -> NodeId {
        let kind = self.kind(id).clone();
        self.create(kind)
    }

    /// Deep-copy a subtree of `other` into this arena, detached.
    pub fn import(&mut self, other: &DocTree, id: NodeId) -> NodeId {
        let copy = self.create(other.kind(id).clone());
        for &child in other.children(id) {
            let child_copy = self.import(other, child);
            self.append(copy, child_copy);
        }
        copy
    }

    // ------------------------------------------------------------------
    // Leaves and text
    // ------------------------------------------------------------------

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.kind(id).is_leaf()
    }

    /// Offset length of a leaf; 0 for containers.
    pub fn leaf_len(&self, id: NodeId) -> usize {
        match self.kind(id) {
            NodeKind::Text(text) => text.chars().count(),
            NodeKind::Void(_) => 1,
            _ => 0,
        }
    }

    /// Split a text leaf at a `char` offset.
    ///
    /// The original keeps the head; the tail becomes a new sibling placed
    /// right after it. Returns `None` when the offset is at either end.
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> Option<NodeId> {
        let NodeKind::Text(text) = self.kind(id) else {
            return None;
        };
        let len = text.chars().count();
        if offset == 0 || offset >= len {
            return None;
        }
        let byte = text.char_indices().nth(offset).map(|(b, _)| b)?;
        let tail = text[byte..].to_string();
        if let NodeKind::Text(text) = self.kind_mut(id) {
            text.truncate(byte);
        }
        let new = self.create(NodeKind::Text(tail));
        self.insert_after(id, new);
        Some(new)
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// Ancestors of `id`, nearest first, root last.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent(id);
        while let Some(node) = current {
            out.push(node);
            current = self.parent(node);
        }
        out
    }

    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = self.parent(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Whether `id` is reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.contains(id) && (id == self.root || self.is_ancestor(self.root, id))
    }

    /// The child of `ancestor` whose subtree contains `id`.
    pub fn child_toward(&self, ancestor: NodeId, id: NodeId) -> Option<NodeId> {
        let mut current = id;
        loop {
            let parent = self.parent(current)?;
            if parent == ancestor {
                return Some(current);
            }
            current = parent;
        }
    }

    /// Nearest ancestor-or-self that is a block or the root.
    pub fn line_block(&self, id: NodeId) -> NodeId {
        let mut current = id;
        loop {
            if matches!(self.kind(current), NodeKind::Block(_) | NodeKind::Root) {
                return current;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return current,
            }
        }
    }

    /// All nodes below `id` in document order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// Leaves of `id`'s subtree in document order; `[id]` for a leaf.
    pub fn leaves(&self, id: NodeId) -> Vec<NodeId> {
        if self.is_leaf(id) {
            return vec![id];
        }
        self.descendants(id)
            .into_iter()
            .filter(|&n| self.is_leaf(n))
            .collect()
    }

    pub fn first_leaf(&self, id: NodeId) -> Option<NodeId> {
        if self.is_leaf(id) {
            return Some(id);
        }
        self.children(id).iter().find_map(|&c| self.first_leaf(c))
    }

    pub fn last_leaf(&self, id: NodeId) -> Option<NodeId> {
        if self.is_leaf(id) {
            return Some(id);
        }
        self.children(id).iter().rev().find_map(|&c| self.last_leaf(c))
    }

    /// First leaf after `id`'s subtree in document order.
    pub fn next_leaf(&self, id: NodeId) -> Option<NodeId> {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            let index = self.index_of(current)?;
            let found = self.children(parent)[index + 1..]
                .iter()
                .find_map(|&c| self.first_leaf(c));
            if found.is_some() {
                return found;
            }
            current = parent;
        }
        None
    }

    /// Last leaf before `id`'s subtree in document order.
    pub fn prev_leaf(&self, id: NodeId) -> Option<NodeId> {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            let index = self.index_of(current)?;
            let found = self.children(parent)[..index]
                .iter()
                .rev()
                .find_map(|&c| self.last_leaf(c));
            if found.is_some() {
                return found;
            }
            current = parent;
        }
        None
    }

    /// Child indices from the root down to `id`.
    pub fn path(&self, id: NodeId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = id;
        while let Some(index) = self.index_of(current) {
            path.push(index);
            match self.parent(current) {
                Some(parent) => current = parent,
                None => break,
            }
        }
        path.reverse();
        path
    }

    pub fn node_at_path(&self, path: &[usize]) -> Option<NodeId> {
        let mut current = self.root;
        for &index in path {
            current = *self.children(current).get(index)?;
        }
        Some(current)
    }

    // ------------------------------------------------------------------
    // Splitting
    // ------------------------------------------------------------------

    /// Split every level from `node`'s parent up to and including `top`, so
    /// that nothing precedes `node` inside `top`.
    ///
    /// The preceding content moves into clones inserted before each level.
    /// Returns the clone of `top`, if one was needed.
    pub fn split_before(&mut self, top: NodeId, node: NodeId) -> Option<NodeId> {
        if node == top || !self.is_ancestor(top, node) {
            return None;
        }
        let mut current = node;
        let mut top_clone = None;
        while let Some(parent) = self.parent(current) {
            let index = self.index_of(current)?;
            if index > 0 {
                let clone = self.shallow_clone(parent);
                let moved: Vec<NodeId> = self.nodes[parent].children.drain(..index).collect();
                for child in moved {
                    self.nodes[child].parent = Some(clone);
                    self.nodes[clone].children.push(child);
                }
                self.insert_before(parent, clone);
                if parent == top {
                    top_clone = Some(clone);
                }
            }
            if parent == top {
                break;
            }
            current = parent;
        }
        top_clone
    }

    /// Mirror of [`split_before`](Self::split_before): nothing follows
    /// `node` inside `top` afterwards.
    pub fn split_after(&mut self, top: NodeId, node: NodeId) -> Option<NodeId> {
        if node == top || !self.is_ancestor(top, node) {
            return None;
        }
        let mut current = node;
        let mut top_clone = None;
        while let Some(parent) = self.parent(current) {
            let index = self.index_of(current)?;
            if index + 1 < self.children(parent).len() {
                let clone = self.shallow_clone(parent);
                let moved: Vec<NodeId> =
                    self.nodes[parent].children.drain(index + 1..).collect();
                for child in moved {
                    self.nodes[child].parent = Some(clone);
                    self.nodes[clone].children.push(child);
                }
                self.insert_after(parent, clone);
                if parent == top {
                    top_clone = Some(clone);
                }
            }
            if parent == top {
                break;
            }
            current = parent;
        }
        top_clone
    }

    /// Narrow `top` so it contains exactly the content from `first` through
    /// `last`; the rest moves to clones before and after it.
    pub fn isolate(&mut self, top: NodeId, first: NodeId, last: NodeId) {
        self.split_before(top, first);
        self.split_after(top, last);
    }
}
