//! Char-granular token: the parser consumes a stream of
//! `Token { kind: char, pos: Span }` rather than pre-grouped lexemes,
//! so multi-char constructs (idents, numbers, operators) are assembled
//! by the parser itself as it walks the stream.

use codemap::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: char,
    pub pos: Span,
}

impl Token {
    pub fn new(pos: Span, kind: char) -> Self {
        Token { kind, pos }
    }

    pub fn pos(&self) -> Span {
        self.pos
    }
}
