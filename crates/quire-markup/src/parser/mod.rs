//! # Parser - Error-Tolerant Tree Construction
//!
//! Turns the token stream from [`crate::lexer`] into a flat list of
//! [`Event`]s, which the [`Sink`] assembles into [`ForeignNode`]s.
//!
//! ## Tolerance Rules
//!
//! Pasted markup is rarely well formed. The parser never fails; it applies
//! the small subset of HTML tree-construction rules that matter for
//! clipboard content:
//!
//! - **Void elements** (`br`, `img`, `hr`, ...) never take children.
//! - **Implied end tags**: a new `li` closes the previous open `li` of the
//!   same list, and a block-level start tag closes an open `p`.
//! - **Raw text**: the content of `script`, `style`, `textarea` and `title`
//!   is kept as a single text child and never parsed as tags.
//! - **Unmatched end tags** are ignored; `</br>` is read as `<br>`.
//! - Anything still open at end of input is closed.
//!
//! ## Module Structure
//!
//! - [`event`] - The Event enum
//! - [`sink`] - Converts events to the foreign tree
//! - [`tag`] - Attribute parsing for a single tag token

pub mod event;
pub mod sink;
pub mod tag;

use crate::lexer::{Token, TokenKind, lex};
use crate::node::ForeignNode;
use event::Event;
use sink::Sink;
use tag::parse_tag;

/// Elements that cannot have children.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose content is not markup.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

/// Start tags that close an open `p`.
const CLOSES_PARAGRAPH: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "div",
    "dl",
    "fieldset",
    "figure",
    "footer",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hr",
    "main",
    "nav",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "ul",
];

/// Elements that stop the search for an open `p` or `li`.
const SCOPE_BARRIERS: &[&str] = &["table", "td", "th", "caption", "button", "html"];

/// The parser state machine.
///
/// Holds the token stream, the stack of open element names and the
/// accumulated events.
pub struct Parser<'t, 'input> {
    tokens: &'t [Token<'input>],
    pos: usize,
    open: Vec<String>,
    events: Vec<Event>,
}

impl<'t, 'input> Parser<'t, 'input> {
    /// Create a new parser from a slice of tokens.
    pub fn new(tokens: &'t [Token<'input>]) -> Self {
        Self {
            tokens,
            pos: 0,
            open: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Parse the tokens and return the top-level nodes.
    pub fn parse(mut self) -> Vec<ForeignNode> {
        while let Some(token) = self.tokens.get(self.pos) {
            self.pos += 1;
            match token.kind {
                TokenKind::Comment | TokenKind::Declaration | TokenKind::ProcessingInstruction => {}
                TokenKind::Text | TokenKind::Lt => self.text(token.text),
                TokenKind::StartTag => self.start_tag(token.text),
                TokenKind::EndTag => self.end_tag(token.text),
            }
        }
        while !self.open.is_empty() {
            self.close_top();
        }
        Sink::new(self.events).finish()
    }

    fn text(&mut self, raw: &str) {
        let decoded = html_escape::decode_html_entities(raw);
        if !decoded.is_empty() {
            self.events.push(Event::Text(decoded.into_owned()));
        }
    }

    fn start_tag(&mut self, slice: &str) {
        let Some(tag) = parse_tag(slice) else {
            self.text(slice);
            return;
        };

        if tag.name == "li" {
            self.close_open_list_item();
        }
        if CLOSES_PARAGRAPH.contains(&tag.name.as_str()) {
            self.close_open_paragraph();
        }

        let name = tag.name;
        self.events.push(Event::Open {
            name: name.clone(),
            attrs: tag.attrs,
        });

        if VOID_ELEMENTS.contains(&name.as_str()) || tag.self_closing {
            self.events.push(Event::Close);
            return;
        }

        if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
            self.raw_text(&name);
            self.events.push(Event::Close);
            return;
        }

        self.open.push(name);
    }

    /// Consume tokens verbatim up to the matching end tag.
    fn raw_text(&mut self, name: &str) {
        let mut raw = String::new();
        while let Some(token) = self.tokens.get(self.pos) {
            self.pos += 1;
            if token.kind == TokenKind::EndTag
                && parse_tag(token.text).is_some_and(|t| t.name == name)
            {
                break;
            }
            raw.push_str(token.text);
        }
        if !raw.is_empty() {
            self.events.push(Event::Text(raw));
        }
    }

    fn end_tag(&mut self, slice: &str) {
        let Some(tag) = parse_tag(slice) else { return };

        if tag.name == "br" {
            self.events.push(Event::Open {
                name: tag.name,
                attrs: Vec::new(),
            });
            self.events.push(Event::Close);
            return;
        }

        let Some(depth) = self.open.iter().rposition(|n| *n == tag.name) else {
            // Unmatched end tag
            return;
        };
        while self.open.len() > depth {
            self.close_top();
        }
    }

    fn close_top(&mut self) {
        if self.open.pop().is_some() {
            self.events.push(Event::Close);
        }
    }

    fn close_open_paragraph(&mut self) {
        if let Some(depth) = self.find_in_scope("p", &[]) {
            while self.open.len() > depth {
                self.close_top();
            }
        }
    }

    fn close_open_list_item(&mut self) {
        if let Some(depth) = self.find_in_scope("li", &["ul", "ol", "menu"]) {
            while self.open.len() > depth {
                self.close_top();
            }
        }
    }

    /// Index of the innermost open `name`, unless a barrier is nearer.
    fn find_in_scope(&self, name: &str, extra_barriers: &[&str]) -> Option<usize> {
        for (idx, open) in self.open.iter().enumerate().rev() {
            if open == name {
                return Some(idx);
            }
            if SCOPE_BARRIERS.contains(&open.as_str()) || extra_barriers.contains(&open.as_str()) {
                return None;
            }
        }
        None
    }
}

/// Parse markup into a foreign tree.
pub fn parse(input: &str) -> Vec<ForeignNode> {
    let tokens = lex(input);
    Parser::new(&tokens).parse()
}
