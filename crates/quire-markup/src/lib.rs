//! # quire-markup
//!
//! An error-tolerant markup reader for pasted and dropped content, built on
//! [Logos].
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## Why a Separate Reader?
//!
//! Clipboard markup comes from word processors, web pages and other editors.
//! It is frequently malformed: unclosed tags, stray `<`, list items without
//! end tags, comments wrapping vendor-specific junk. The editing engine
//! needs a plain tree to sanitize, and it must get one for *any* input.
//!
//! This crate produces that tree. It does not interpret anything: tags it
//! has never heard of survive here and are dropped later by the sanitizer
//! in `quire-engine`.
//!
//! ## Architecture Overview
//!
//! ```text
//! Source Text → Lexer → Tokens → Parser → Events → Sink → Foreign Tree
//!               (Logos)          (tolerance rules)
//! ```
//!
//! ### 1. Lexer ([`lexer`] module)
//!
//! Tokenizes into whole tags, text and comments. Every byte of the input
//! ends up in exactly one token.
//!
//! ### 2. Parser ([`parser`] module)
//!
//! Applies implied end tags, void elements and raw-text content, emitting
//! Open/Text/Close events.
//!
//! ### 3. Sink ([`parser::sink`] module)
//!
//! Assembles events into [`ForeignNode`]s.
//!
//! ## Module Structure
//!
//! ```text
//! quire-markup/
//! ├── lib.rs           # This file - public API and integration tests
//! ├── node.rs          # ForeignNode / ForeignElement
//! ├── lexer.rs         # Logos-based tokenizer
//! └── parser/
//!     ├── mod.rs       # Parser struct, tolerance rules, public parse()
//!     ├── event.rs     # Event enum (Open, Text, Close)
//!     ├── sink.rs      # Converts events to the foreign tree
//!     └── tag.rs       # Tag name and attribute parsing
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use quire_markup::{parse, ForeignNode};
//!
//! let nodes = parse("<p>Hello <b>world</p>");
//!
//! let ForeignNode::Element(p) = &nodes[0] else { panic!("expected element") };
//! assert_eq!(p.name, "p");
//! assert_eq!(nodes[0].text_content(), "Hello world");
//! ```

pub mod lexer;
pub mod node;
pub mod parser;

pub use node::{ForeignElement, ForeignNode};
pub use parser::parse;
