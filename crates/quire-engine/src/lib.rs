//! # quire-engine
//!
//! Editing core for structured rich-text documents. A document is a tree
//! of blocks (divisions, headings, quotes, lists) holding inline content
//! (text, formatting wrappers, images, line breaks). Every operation takes
//! a tree and a [`Selection`] and leaves the tree in canonical form.
//!
//! ```text
//!  pasted markup ──► sanitize ──┐
//!                               ▼
//!  Session ──► inline / block / edit ──► normalize ──► DocTree
//!     │                                                   │
//!     └── history (checkpoints) ◄── interchange (hash) ◄──┘
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use quire_engine::{BlockStyle, ListKind, Session, SessionOptions};
//!
//! let mut session = Session::new(SessionOptions::default());
//! session.paste_markup("<p>first</p><p>second</p>");
//! session.set_selection(quire_engine::Selection::all(session.tree()));
//! session.toggle_block(BlockStyle::List(ListKind::Ordered));
//!
//! assert_eq!(session.to_markup(), "<ol><li>first</li><li>second</li></ol>");
//! ```

pub mod block;
pub mod edit;
pub mod grammar;
pub mod history;
pub mod inline;
pub mod interchange;
pub mod invariants;
pub mod io;
pub mod normalize;
pub mod query;
pub mod range;
pub mod render;
pub mod resources;
pub mod sanitize;
pub mod session;

// Re-export key types for easier usage
pub use grammar::{
    Alignment, BlockStyle, DocTree, ImageAttrs, InlineKind, InlineStyle, ListKind, NodeId,
    NodeKind, StyleValue, VoidKind,
};
pub use history::{AutosaveTimer, Checkpoint, History};
pub use interchange::{ImportError, SerializedElement, SerializedNode};
pub use io::{IoError, read_document, write_document};
pub use range::{Point, Selection};
pub use render::{MarkupOptions, to_markup};
pub use resources::{ResourceError, ResourceHandle, ResourceRegistry};
pub use sanitize::{sanitize, sanitize_markup};
pub use session::{Cmd, Session, SessionOptions};
