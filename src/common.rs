//! Small shared enums used across the AST, value, and selector hierarchies.

use std::fmt;

/// Whether a list was written with surrounding `[...]` brackets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Brackets {
    Bracketed,
    None,
}

/// The separator a `List` value prints between its items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListSeparator {
    Space,
    Comma,
    /// A `/`-separated list, only produced by `list-separator()` callers
    /// or a literal slash list; printed like `Comma` but distinct for
    /// equality/introspection purposes.
    Slash,
}

impl ListSeparator {
    pub fn as_str(self) -> &'static str {
        match self {
            ListSeparator::Space => " ",
            ListSeparator::Comma => ", ",
            ListSeparator::Slash => " / ",
        }
    }
}

/// Whether a string literal was quoted in source, and with which mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteKind {
    Double,
    Single,
    None,
}

impl fmt::Display for QuoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuoteKind::Double => write!(f, "\""),
            QuoteKind::Single => write!(f, "'"),
            QuoteKind::None => Ok(()),
        }
    }
}

/// Binary operators usable in value expressions (AST node `Binary`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    And,
    Or,
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinOp {
    /// Binding power, highest first, used by the expression parser's
    /// precedence-climbing loop.
    pub fn precedence(self) -> u8 {
        match self {
            BinOp::Or => 1,
            BinOp::And => 2,
            BinOp::Eq | BinOp::Neq => 3,
            BinOp::Gt | BinOp::Gte | BinOp::Lt | BinOp::Lte => 4,
            BinOp::Add | BinOp::Sub => 5,
            BinOp::Mul | BinOp::Div | BinOp::Mod => 6,
        }
    }
}

/// Unary operators (AST node `Unary`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Plus,
    Minus,
    Not,
}

/// Combinators joining compound selectors inside a complex selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combinator {
    Descendant,
    Child,
    NextSibling,
    FollowingSibling,
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Combinator::Descendant => write!(f, " "),
            Combinator::Child => write!(f, " > "),
            Combinator::NextSibling => write!(f, " + "),
            Combinator::FollowingSibling => write!(f, " ~ "),
        }
    }
}

/// Attribute-selector matcher operators (`[x~=y]` etc).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrMatcher {
    Equals,
    Includes,
    DashMatch,
    Prefix,
    Suffix,
    Substring,
}

impl fmt::Display for AttrMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AttrMatcher::Equals => "=",
            AttrMatcher::Includes => "~=",
            AttrMatcher::DashMatch => "|=",
            AttrMatcher::Prefix => "^=",
            AttrMatcher::Suffix => "$=",
            AttrMatcher::Substring => "*=",
        };
        write!(f, "{}", s)
    }
}
