//! # Content Grammar
//!
//! The fixed set of node types a document may contain, the style values
//! that decorate them, and the arena that holds them.
//!
//! ```text
//! Root
//! └── Block (division, heading, quote, list, list item)
//!     ├── Block ...
//!     └── inline content
//!         ├── Wrapper (bold, italic, ..., link, span)
//!         │   └── inline content
//!         ├── Text
//!         ├── Void (image, line break, rule)
//!         └── Caret
//! ```
//!
//! ## Invariants
//!
//! Every editing operation returns a tree where:
//!
//! - a block's children are all blocks or all inline, never both
//! - a wrapper without text or void content holds exactly the caret, and
//!   there is at most one caret
//! - equal adjacent wrappers are merged, and no wrapper sits inside another
//!   wrapper of the same kind
//! - lists contain only list items; an item whose first child is a list has
//!   its marker hidden
//! - void leaves have no children
//!
//! [`crate::invariants`] checks these on any tree.

pub mod node;
pub mod style;
pub mod tree;
pub mod url;

pub use node::{
    Alignment, Block, BlockTag, ImageAttrs, ListKind, NodeKind, SpanAttrs, VoidKind, Wrapper,
};
pub use style::{BlockStyle, InlineKind, InlineStyle, StyleSet, StyleValue};
pub use tree::{DocTree, NodeId};
pub use url::{UrlUse, is_safe_url};
