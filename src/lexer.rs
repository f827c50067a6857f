//! Hand-rolled lexer turning source text into a `Token` stream, one
//! token per char, each stamped with a `codemap::Span`. Deliberately
//! minimal: the parser does its own multi-char assembly (idents,
//! numbers, operators) directly off this char stream rather than
//! relying on a separate lexical grammar.

use codemap::File;
use std::sync::Arc;

use crate::token::Token;

pub struct Lexer {
    tokens: std::vec::IntoIter<Token>,
}

impl Lexer {
    pub fn new(file: &Arc<File>) -> Self {
        let source = file.source();
        let mut tokens = Vec::with_capacity(source.len());
        for (idx, ch) in source.char_indices() {
            let span = file.span.subspan(idx as u64, (idx + ch.len_utf8()) as u64);
            tokens.push(Token::new(span, ch));
        }
        Lexer {
            tokens: tokens.into_iter(),
        }
    }

    /// Replay an already-lexed (and already correctly spanned) token
    /// slice through a fresh `Lexer`. Used by the parser's "slurp now,
    /// reparse later" strategy (`parser::read_prelude`) so a reparsed
    /// selector/value/media-query fragment keeps the spans its tokens
    /// already carry instead of minting a disconnected sub-file.
    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        Lexer {
            tokens: tokens.into_iter(),
        }
    }
}

impl Iterator for Lexer {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.tokens.next()
    }
}
