//! # Lexer - Tokenizing Markup
//!
//! This module provides the first stage of parsing: breaking markup into
//! tag-level tokens using the [Logos] lexer generator.
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## The Lossless Guarantee
//!
//! Every byte of the input appears in exactly one token. Malformed markup
//! never fails to lex: anything that does not form a complete tag becomes
//! text, which is how browsers treat a stray `<` too.
//!
//! ```
//! use quire_markup::lexer::lex;
//!
//! let input = "<p>a < b</p>";
//! let tokens = lex(input);
//!
//! let reconstructed: String = tokens.iter().map(|t| t.text).collect();
//! assert_eq!(input, reconstructed);
//! ```
//!
//! ## Token Design
//!
//! Tokens are whole tags rather than individual punctuation. Attribute
//! parsing happens later in [`crate::parser::tag`], on the slice of a single
//! start tag, so the lexer stays context-free.

use logos::Logos;

/// Token kinds produced by the Logos lexer.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `<!-- ... -->`, runs to the end of input when unterminated
    #[token("<!--", lex_comment)]
    Comment,

    /// `<!DOCTYPE ...>` and `<![CDATA[...]>`-style declarations
    #[regex(r"<![A-Za-z\[][^>]*>")]
    Declaration,

    /// `<?xml ...?>` and friends
    #[regex(r"<\?[^>]*>")]
    ProcessingInstruction,

    /// `<name attr="value">`, quoted values may contain `>`
    #[regex(r#"<[A-Za-z][A-Za-z0-9:-]*([^>"']|"[^"]*"|'[^']*')*>"#)]
    StartTag,

    /// `</name>`
    #[regex(r"</[A-Za-z][A-Za-z0-9:-]*[^>]*>")]
    EndTag,

    /// Character data up to the next `<`
    #[regex(r"[^<]+")]
    Text,

    /// A `<` that does not open a tag
    #[token("<")]
    Lt,
}

fn lex_comment(lex: &mut logos::Lexer<TokenKind>) {
    let rest = lex.remainder();
    let len = rest.find("-->").map(|i| i + 3).unwrap_or(rest.len());
    lex.bump(len);
}

/// A lexed token with its kind and text slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
}

/// Lex the input into a sequence of tokens.
///
/// Guarantees that all bytes from the input appear in the output tokens.
pub fn lex(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(input);

    while let Some(result) = lexer.next() {
        let text = lexer.slice();
        // Unrecognized input is character data
        let kind = result.unwrap_or(TokenKind::Text);
        tokens.push(Token { kind, text });
    }

    tokens
}
