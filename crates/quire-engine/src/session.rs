//! # Editing Session
//!
//! [`Session`] is the one object a host talks to. It owns the document
//! tree, the current selection, the undo history, the autosave timer and
//! the registry of pasted resources. There are no globals: two sessions
//! never share state, and every command takes `&mut Session`, so a
//! command cannot start while another one is running.
//!
//! ## Commands
//!
//! Edits are expressed as [`Cmd`] values and run through
//! [`Session::apply`], which takes a history checkpoint first (except for
//! typing, which relies on the autosave timer), runs the engine routine on
//! the current selection and stores the selection it returns. The named
//! methods (`toggle_inline`, `indent`, ...) are shorthands for `apply`.
//!
//! ```
//! use quire_engine::{InlineStyle, Session, SessionOptions};
//!
//! let mut session = Session::new(SessionOptions::default());
//! session.toggle_inline(InlineStyle::Bold);
//! session.insert_text("Hello");
//! assert_eq!(session.to_markup(), "<div><b>Hello</b></div>");
//!
//! session.undo();
//! assert_eq!(session.to_markup(), "");
//! ```

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use quire_markup::ForeignNode;

use crate::edit;
use crate::grammar::{
    BlockStyle, DocTree, ImageAttrs, InlineKind, InlineStyle, ListKind, NodeId, NodeKind,
    StyleValue, VoidKind,
};
use crate::history::{
    AutosaveTimer, Checkpoint, DEFAULT_AUTOSAVE_INTERVAL, DEFAULT_HISTORY_LIMIT, History,
};
use crate::interchange::{self, ImportError, SerializedNode};
use crate::range::{Bias, Point, Selection, point_at_offset};
use crate::render::{self, MarkupOptions};
use crate::resources::{ResourceError, ResourceHandle, ResourceRegistry};
use crate::{block, inline, query, sanitize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub history_limit: usize,
    pub autosave_interval: Duration,
    pub markup: MarkupOptions,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            autosave_interval: DEFAULT_AUTOSAVE_INTERVAL,
            markup: MarkupOptions::default(),
        }
    }
}

/// An edit to run against the current selection.
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    ToggleInline { style: InlineStyle },
    /// Replace any value of the style's kind with this one
    SetInline { style: InlineStyle },
    RemoveInline { kind: InlineKind },
    ClearFormatting,
    ToggleBlock { style: BlockStyle },
    SetBlock { style: BlockStyle },
    RemoveBlock { style: BlockStyle, all_ancestors: bool },
    Indent,
    Outdent,
    ReplaceListKind { from: ListKind, to: ListKind },
    InsertText { text: String },
    InsertNewline,
    InsertVoid { void: VoidKind },
    DeleteSelection,
}

impl Cmd {
    /// Whether a history checkpoint is taken before the command runs.
    fn checkpoints(&self) -> bool {
        !matches!(self, Cmd::InsertText { .. })
    }
}

#[derive(Debug)]
pub struct Session {
    tree: DocTree,
    selection: Selection,
    history: History,
    autosave: AutosaveTimer,
    resources: ResourceRegistry,
    options: SessionOptions,
}

impl Session {
    /// A session over an empty document.
    pub fn new(options: SessionOptions) -> Self {
        Self::with_tree(DocTree::new(), options)
    }

    pub fn with_tree(tree: DocTree, options: SessionOptions) -> Self {
        let selection = start_of(&tree);
        Self {
            tree,
            selection,
            history: History::new(options.history_limit),
            autosave: AutosaveTimer::new(options.autosave_interval),
            resources: ResourceRegistry::new(),
            options,
        }
    }

    pub fn tree(&self) -> &DocTree {
        &self.tree
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn resources(&self) -> &ResourceRegistry {
        &self.resources
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn is_dirty(&self) -> bool {
        self.autosave.is_dirty()
    }

    /// The stored selection if it still points into the tree.
    fn live_selection(&self) -> Selection {
        let attached = |p: Point| self.tree.is_attached(p.node);
        if attached(self.selection.start) && attached(self.selection.end) {
            self.selection
        } else {
            log::warn!("selection points outside the document, moving it to the end");
            Selection::collapsed(point_at_offset(&self.tree, usize::MAX, Bias::Backward))
        }
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Run `cmd` on the current selection and return the new selection.
    pub fn apply(&mut self, cmd: Cmd) -> Selection {
        if cmd.checkpoints() {
            self.save();
        }
        let selection = self.live_selection();
        let tree = &mut self.tree;
        log::debug!("apply {:?}", cmd);
        let selection = match cmd {
            Cmd::ToggleInline { style } => inline::toggle(tree, selection, &style),
            Cmd::SetInline { style } => inline::change(tree, selection, &style),
            Cmd::RemoveInline { kind } => inline::remove_kind(tree, selection, kind),
            Cmd::ClearFormatting => inline::remove_all(tree, selection),
            Cmd::ToggleBlock { style } => block::toggle(tree, selection, style),
            Cmd::SetBlock { style } => block::apply(tree, selection, style),
            Cmd::RemoveBlock {
                style,
                all_ancestors,
            } => block::remove(tree, selection, style, all_ancestors),
            Cmd::Indent => block::indent(tree, selection),
            Cmd::Outdent => block::outdent(tree, selection),
            Cmd::ReplaceListKind { from, to } => block::replace_list_kind(tree, selection, from, to),
            Cmd::InsertText { text } => edit::insert_text(tree, selection, &text),
            Cmd::InsertNewline => edit::insert_newline(tree, selection),
            Cmd::InsertVoid { void } => edit::insert_void(tree, selection, void),
            Cmd::DeleteSelection => edit::delete_selection(tree, selection),
        };
        self.selection = selection;
        self.autosave.mark_dirty();
        selection
    }

    pub fn toggle_inline(&mut self, style: InlineStyle) -> Selection {
        self.apply(Cmd::ToggleInline { style })
    }

    pub fn set_inline(&mut self, style: InlineStyle) -> Selection {
        self.apply(Cmd::SetInline { style })
    }

    pub fn remove_inline(&mut self, kind: InlineKind) -> Selection {
        self.apply(Cmd::RemoveInline { kind })
    }

    pub fn clear_formatting(&mut self) -> Selection {
        self.apply(Cmd::ClearFormatting)
    }

    pub fn toggle_block(&mut self, style: BlockStyle) -> Selection {
        self.apply(Cmd::ToggleBlock { style })
    }

    pub fn set_block(&mut self, style: BlockStyle) -> Selection {
        self.apply(Cmd::SetBlock { style })
    }

    pub fn remove_block(&mut self, style: BlockStyle, all_ancestors: bool) -> Selection {
        self.apply(Cmd::RemoveBlock {
            style,
            all_ancestors,
        })
    }

    pub fn indent(&mut self) -> Selection {
        self.apply(Cmd::Indent)
    }

    pub fn outdent(&mut self) -> Selection {
        self.apply(Cmd::Outdent)
    }

    pub fn replace_list_kind(&mut self, from: ListKind, to: ListKind) -> Selection {
        self.apply(Cmd::ReplaceListKind { from, to })
    }

    pub fn insert_text(&mut self, text: &str) -> Selection {
        self.apply(Cmd::InsertText {
            text: text.to_string(),
        })
    }

    pub fn insert_newline(&mut self) -> Selection {
        self.apply(Cmd::InsertNewline)
    }

    pub fn insert_void(&mut self, void: VoidKind) -> Selection {
        self.apply(Cmd::InsertVoid { void })
    }

    pub fn delete_selection(&mut self) -> Selection {
        self.apply(Cmd::DeleteSelection)
    }

    // ------------------------------------------------------------------
    // Paste
    // ------------------------------------------------------------------

    /// Sanitize pasted markup and insert it over the selection.
    pub fn paste_markup(&mut self, markup: &str) -> Selection {
        let fragment = sanitize::sanitize_markup_with(markup, &self.options.markup);
        self.paste_fragment(&fragment)
    }

    /// Sanitize an already parsed foreign tree and insert it.
    pub fn paste_nodes(&mut self, nodes: &[ForeignNode]) -> Selection {
        let fragment = sanitize::sanitize_with(nodes, &self.options.markup);
        self.paste_fragment(&fragment)
    }

    fn paste_fragment(&mut self, fragment: &DocTree) -> Selection {
        self.save();
        let selection = self.live_selection();
        self.selection = edit::insert_fragment(&mut self.tree, selection, fragment);
        self.autosave.mark_dirty();
        self.save();
        self.selection
    }

    /// Register pasted image data and insert it as an image.
    pub fn paste_image(&mut self, media_type: &str, bytes: Vec<u8>) -> ResourceHandle {
        let handle = self.resources.register(media_type, bytes);
        self.insert_void(VoidKind::Image(ImageAttrs {
            src: handle.url(),
            ..Default::default()
        }));
        handle
    }

    pub fn register_resource(&mut self, media_type: &str, bytes: Vec<u8>) -> ResourceHandle {
        self.resources.register(media_type, bytes)
    }

    /// Replace every `blob:quire/` image source with a `data:` URL.
    ///
    /// All conversions are done before the tree is touched, so a failure
    /// leaves the document unchanged. Returns the number of images changed.
    pub fn inline_resources(&mut self) -> Result<usize, ResourceError> {
        let mut replacements: Vec<(NodeId, String)> = Vec::new();
        for leaf in self.tree.leaves(self.tree.root()) {
            if let NodeKind::Void(VoidKind::Image(image)) = self.tree.kind(leaf)
                && image.src.starts_with("blob:")
            {
                let handle = ResourceHandle::from_url(&image.src)
                    .ok_or_else(|| ResourceError::Unknown(image.src.clone()))?;
                replacements.push((leaf, self.resources.to_data_url(handle)?));
            }
        }
        if replacements.is_empty() {
            return Ok(0);
        }
        self.save();
        for (leaf, url) in &replacements {
            if let NodeKind::Void(VoidKind::Image(image)) = self.tree.kind_mut(*leaf) {
                image.src.clone_from(url);
            }
        }
        self.autosave.mark_dirty();
        Ok(replacements.len())
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint::capture(&self.tree, self.live_selection())
    }

    /// Checkpoint the current state; `false` when nothing changed since
    /// the newest checkpoint.
    pub fn save(&mut self) -> bool {
        let saved = self.history.save(self.checkpoint());
        self.autosave.mark_clean();
        saved
    }

    /// Let the autosave timer checkpoint a dirty document.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.autosave.is_due(now) {
            return false;
        }
        let saved = self.history.save(self.checkpoint());
        self.autosave.saved(now);
        saved
    }

    pub fn undo(&mut self) -> Option<Selection> {
        let target = self.history.undo(self.checkpoint())?;
        Some(self.restore(target))
    }

    pub fn redo(&mut self) -> Option<Selection> {
        let target = self.history.redo(self.checkpoint())?;
        Some(self.restore(target))
    }

    fn restore(&mut self, checkpoint: Checkpoint) -> Selection {
        self.selection = checkpoint.restored_selection();
        self.tree = checkpoint.tree;
        self.autosave.mark_clean();
        self.selection
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn detect_styling(&self) -> BTreeSet<StyleValue> {
        query::detect_styling(&self.tree, self.live_selection())
    }

    pub fn is_active(&self, style: &StyleValue) -> bool {
        query::is_active(&self.tree, self.live_selection(), style)
    }

    pub fn find_text(&self, needle: &str) -> Vec<Selection> {
        query::find_text(&self.tree, needle)
    }

    pub fn plain_text(&self) -> String {
        query::plain_text(&self.tree)
    }

    pub fn to_markup(&self) -> String {
        render::to_markup_with(&self.tree, &self.options.markup)
    }

    // ------------------------------------------------------------------
    // Interchange and teardown
    // ------------------------------------------------------------------

    pub fn export(&self) -> Vec<SerializedNode> {
        interchange::export(&self.tree)
    }

    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        interchange::to_json(&self.tree)
    }

    /// Replace the document. On error the session is untouched.
    ///
    /// History is cleared and resources of the old document are released.
    pub fn import(&mut self, nodes: &[SerializedNode]) -> Result<(), ImportError> {
        let tree = interchange::import(nodes)?;
        self.replace_document(tree);
        Ok(())
    }

    pub fn import_json(&mut self, json: &str) -> Result<(), ImportError> {
        let tree = interchange::from_json(json)?;
        self.replace_document(tree);
        Ok(())
    }

    fn replace_document(&mut self, tree: DocTree) {
        let released = self.resources.release_all();
        self.history.clear();
        self.selection = start_of(&tree);
        self.tree = tree;
        self.autosave.mark_clean();
        log::info!(
            "document replaced ({} nodes, {} resources released)",
            self.tree.len(),
            released
        );
    }

    /// Release every resource handle. Returns how many were live.
    pub fn close(&mut self) -> usize {
        let released = self.resources.release_all();
        log::info!("session closed, {} resources released", released);
        released
    }
}

fn start_of(tree: &DocTree) -> Selection {
    let root = tree.root();
    match tree.first_leaf(root) {
        Some(leaf) => Selection::collapsed(Point::new(leaf, 0)),
        None => Selection::collapsed(Point::new(root, 0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Alignment;
    use pretty_assertions::assert_eq;

    fn session_with(text: &str) -> Session {
        let mut session = Session::new(SessionOptions::default());
        session.insert_text(text);
        session
    }

    fn select_all(session: &mut Session) {
        let all = Selection::all(session.tree());
        session.set_selection(all);
    }

    #[test]
    fn commands_checkpoint_before_running() {
        let mut session = session_with("abc");
        select_all(&mut session);

        session.toggle_inline(InlineStyle::Italic);
        assert_eq!(session.to_markup(), "<div><i>abc</i></div>");
        assert_eq!(session.history().undo_depth(), 1);

        session.undo();
        assert_eq!(session.to_markup(), "<div>abc</div>");
        session.redo();
        assert_eq!(session.to_markup(), "<div><i>abc</i></div>");
    }

    #[test]
    fn detection_follows_the_selection() {
        let mut session = session_with("abc");
        select_all(&mut session);
        session.set_block(BlockStyle::Align(Alignment::Right));
        assert!(session.is_active(&StyleValue::Block(BlockStyle::Align(Alignment::Right))));
        assert!(!session.is_active(&StyleValue::Inline(InlineStyle::Bold)));
    }

    #[test]
    fn stale_selection_falls_back_to_the_end() {
        let mut session = session_with("abc");
        let stale = session.selection();
        select_all(&mut session);
        session.delete_selection();
        session.set_selection(stale);
        session.insert_text("x");
        assert_eq!(session.plain_text(), "x");
    }

    #[test]
    fn pasted_images_become_portable_on_request() {
        let mut session = session_with("a");
        let handle = session.paste_image("image/png", vec![0xff]);
        assert!(session.to_markup().contains(&handle.url()));

        assert_eq!(session.inline_resources(), Ok(1));
        assert!(session.to_markup().contains("data:image/png,%FF"));
        assert_eq!(session.close(), 1);
    }

    #[test]
    fn failed_resource_conversion_leaves_the_document_alone() {
        let mut session = session_with("a");
        let handle = session.paste_image("application/pdf", vec![1]);
        let before = session.export();

        assert_eq!(
            session.inline_resources(),
            Err(ResourceError::UnsupportedType("application/pdf".into()))
        );
        assert_eq!(session.export(), before);
        assert!(session.resources().contains(handle));
    }

    #[test]
    fn import_replaces_document_and_history() {
        let mut session = session_with("old");
        session.register_resource("image/png", vec![1]);
        session
            .import_json(r#"[{"tag": "h1", "children": ["new"]}]"#)
            .unwrap();

        assert_eq!(session.to_markup(), "<h1>new</h1>");
        assert!(!session.history().can_undo());
        assert!(session.resources().is_empty());

        let err = session.import_json("[{\"tag\": \"script\"}]").unwrap_err();
        assert!(matches!(err, ImportError::UnknownTag(_)));
        assert_eq!(session.to_markup(), "<h1>new</h1>");
    }

    #[test]
    fn tick_saves_only_dirty_sessions_after_the_interval() {
        let options = SessionOptions {
            autosave_interval: Duration::from_millis(10),
            ..Default::default()
        };
        let mut session = Session::new(options);
        let start = Instant::now();
        assert!(!session.tick(start));

        session.insert_text("a");
        assert!(session.tick(start));
        session.insert_text("b");
        assert!(!session.tick(start + Duration::from_millis(5)));
        assert!(session.tick(start + Duration::from_millis(10)));
        assert_eq!(session.history().undo_depth(), 2);
    }
}
