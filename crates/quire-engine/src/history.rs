//! # Snapshot History
//!
//! Undo and redo work on whole-document checkpoints rather than on
//! recorded operations. A [`Checkpoint`] holds a clone of the tree, the
//! selection as child-index paths, and a content hash.
//!
//! ```text
//!         save            undo                redo
//! undo: [a b] ──► [a b c]  ──► [a b]   ──►    [a b c]
//! redo: [x]   ──► []       ──► [d]     ──►    []
//!                              (d = state before undo)
//! ```
//!
//! - [`History::save`] skips a checkpoint whose hash equals the newest
//!   one, evicts the oldest beyond the limit, and clears the redo stack.
//! - [`History::undo`] skips a checkpoint identical to the current state,
//!   so "save, then undo" goes back one real step.
//!
//! [`AutosaveTimer`] is host-driven: the session asks it on every tick
//! whether a dirty document has waited long enough to be checkpointed.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::grammar::DocTree;
use crate::interchange::{SerializedSelection, content_hash};
use crate::range::Selection;

pub const DEFAULT_HISTORY_LIMIT: usize = 100;
pub const DEFAULT_AUTOSAVE_INTERVAL: Duration = Duration::from_millis(5000);

/// A restorable document state.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    pub tree: DocTree,
    pub selection: SerializedSelection,
    pub hash: String,
}

impl Checkpoint {
    pub fn capture(tree: &DocTree, selection: Selection) -> Self {
        Self {
            tree: tree.clone(),
            selection: SerializedSelection::capture(tree, selection),
            hash: content_hash(tree),
        }
    }

    /// The stored selection, or everything when its paths are gone.
    pub fn restored_selection(&self) -> Selection {
        self.selection
            .restore(&self.tree)
            .unwrap_or_else(|| Selection::all(&self.tree))
    }
}

/// Bounded undo stack plus redo stack.
#[derive(Debug)]
pub struct History {
    undo: VecDeque<Checkpoint>,
    redo: Vec<Checkpoint>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    /// A limit of zero is treated as one.
    pub fn new(limit: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Record `checkpoint` as the newest undo entry.
    ///
    /// Returns `false` when it was identical to the newest entry. The redo
    /// stack is cleared either way.
    pub fn save(&mut self, checkpoint: Checkpoint) -> bool {
        self.redo.clear();
        self.push_undo(checkpoint)
    }

    fn push_undo(&mut self, checkpoint: Checkpoint) -> bool {
        if self
            .undo
            .back()
            .is_some_and(|newest| newest.hash == checkpoint.hash)
        {
            log::debug!("checkpoint {} already saved", short(&checkpoint.hash));
            return false;
        }
        self.undo.push_back(checkpoint);
        while self.undo.len() > self.limit {
            self.undo.pop_front();
            log::debug!("history limit {} reached, evicted oldest", self.limit);
        }
        true
    }

    /// Step back from `current`, which goes onto the redo stack.
    pub fn undo(&mut self, current: Checkpoint) -> Option<Checkpoint> {
        let target = pop_distinct(&mut self.undo, &current.hash, |stack| stack.pop_back())?;
        self.redo.push(current);
        Some(target)
    }

    /// Step forward from `current`, which goes back onto the undo stack.
    pub fn redo(&mut self, current: Checkpoint) -> Option<Checkpoint> {
        let target = pop_distinct(&mut self.redo, &current.hash, |stack| stack.pop())?;
        self.push_undo(current);
        Some(target)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

/// Pop the newest entry, skipping one that matches `hash`.
///
/// A skipped entry is put back when there is nothing behind it.
fn pop_distinct<S>(
    stack: &mut S,
    hash: &str,
    pop: impl Fn(&mut S) -> Option<Checkpoint>,
) -> Option<Checkpoint>
where
    S: Extend<Checkpoint>,
{
    let newest = pop(stack)?;
    if newest.hash != hash {
        return Some(newest);
    }
    match pop(stack) {
        Some(older) => Some(older),
        None => {
            stack.extend(Some(newest));
            None
        }
    }
}

fn short(hash: &str) -> &str {
    hash.get(..12).unwrap_or(hash)
}

/// Decides when a dirty document is due for a checkpoint.
#[derive(Debug, Clone)]
pub struct AutosaveTimer {
    interval: Duration,
    last_save: Option<Instant>,
    dirty: bool,
}

impl AutosaveTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_save: None,
            dirty: false,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether a checkpoint should be taken at `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        self.dirty
            && self
                .last_save
                .is_none_or(|last| now.saturating_duration_since(last) >= self.interval)
    }

    pub fn saved(&mut self, now: Instant) {
        self.last_save = Some(now);
        self.dirty = false;
    }

    /// Clear the dirty flag after a save the timer did not trigger.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{NodeId, NodeKind};
    use crate::range::Point;
    use pretty_assertions::assert_eq;

    fn document(text: &str) -> (DocTree, Selection) {
        let mut tree = DocTree::new();
        let div = tree.create_child(tree.root(), NodeKind::division());
        let leaf = tree.create_child(div, NodeKind::text(text));
        (tree, Selection::collapsed(Point::new(leaf, 0)))
    }

    fn checkpoint(text: &str) -> Checkpoint {
        let (tree, selection) = document(text);
        Checkpoint::capture(&tree, selection)
    }

    fn text_of(checkpoint: &Checkpoint) -> String {
        crate::render::to_plain_text(&checkpoint.tree)
    }

    #[test]
    fn identical_saves_are_deduplicated() {
        // Given an empty history
        let mut history = History::new(10);

        // When the same content is saved twice
        assert!(history.save(checkpoint("a")));
        assert!(!history.save(checkpoint("a")));

        // Then only one entry exists
        assert_eq!(history.undo_depth(), 1);
    }

    #[test]
    fn oldest_entries_are_evicted() {
        let mut history = History::new(3);
        for text in ["a", "b", "c", "d", "e"] {
            history.save(checkpoint(text));
        }
        assert_eq!(history.undo_depth(), 3);

        let mut seen = Vec::new();
        let mut current = checkpoint("f");
        while let Some(previous) = history.undo(current) {
            seen.push(text_of(&previous));
            current = previous;
        }
        assert_eq!(seen, vec!["e", "d", "c"]);
    }

    #[test]
    fn undo_then_redo_returns_to_the_same_state() {
        let mut history = History::default();
        history.save(checkpoint("one"));

        let undone = history.undo(checkpoint("two")).unwrap();
        assert_eq!(text_of(&undone), "one");
        assert!(history.can_redo());

        let redone = history.redo(undone).unwrap();
        assert_eq!(text_of(&redone), "two");
        assert_eq!(history.redo_depth(), 0);
        assert_eq!(history.undo_depth(), 1);
    }

    #[test]
    fn undo_skips_a_checkpoint_equal_to_the_current_state() {
        let mut history = History::default();
        history.save(checkpoint("one"));
        history.save(checkpoint("two"));

        let undone = history.undo(checkpoint("two")).unwrap();
        assert_eq!(text_of(&undone), "one");
    }

    #[test]
    fn undo_with_only_the_current_state_does_nothing() {
        let mut history = History::default();
        history.save(checkpoint("same"));

        assert!(history.undo(checkpoint("same")).is_none());
        assert_eq!(history.undo_depth(), 1);
        assert!(!history.can_redo());
    }

    #[test]
    fn save_clears_redo() {
        let mut history = History::default();
        history.save(checkpoint("one"));
        history.undo(checkpoint("two"));
        assert!(history.can_redo());

        history.save(checkpoint("three"));
        assert!(!history.can_redo());
    }

    #[test]
    fn checkpoints_restore_their_selection() {
        let (tree, _) = document("hello");
        let leaf: NodeId = tree.leaves(tree.root())[0];
        let selection = Selection::new(Point::new(leaf, 1), Point::new(leaf, 4));
        let saved = Checkpoint::capture(&tree, selection);
        assert_eq!(saved.restored_selection(), selection);
    }

    #[test]
    fn autosave_waits_for_dirty_and_interval() {
        let start = Instant::now();
        let mut timer = AutosaveTimer::new(Duration::from_millis(100));
        assert!(!timer.is_due(start));

        timer.mark_dirty();
        assert!(timer.is_due(start));
        timer.saved(start);
        assert!(!timer.is_dirty());

        timer.mark_dirty();
        assert!(!timer.is_due(start + Duration::from_millis(50)));
        assert!(timer.is_due(start + Duration::from_millis(100)));
    }
}
