//! # Parser Events
//!
//! The parser does not build nodes directly. It emits a flat sequence of
//! events that the [`Sink`](super::sink::Sink) turns into a tree:
//!
//! ```text
//! Open(p)
//!   Text("hello ")
//!   Open(b)
//!     Text("world")
//!   Close
//! Close
//! ```
//!
//! Every `Open` is matched by exactly one `Close`; the parser closes
//! anything left open at end of input, so the sink never has to recover.

/// A tree-building event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Begin an element.
    Open {
        name: String,
        attrs: Vec<(String, String)>,
    },
    /// Decoded character data for the current element.
    Text(String),
    /// End the innermost open element.
    Close,
}
