//! The value-context half of the AST. A single `Expression`
//! enum carries both unevaluated nodes (`Binary`, `Variable`, ...) and
//! the "value" subset that `evaluate()` reduces everything down to
//! (`Number`, `Color`, `List`, ...) — a value is just the subset of
//! `Expression` variants that `evaluate()` can produce, realized
//! directly instead of duplicating the scalar/composite shapes into a
//! second enum.

use codemap::Span;
use num_rational::Rational64;

use crate::common::{BinOp, Brackets, ListSeparator, QuoteKind, UnOp};
use crate::value::SassMap;

#[derive(Debug, Clone, PartialEq)]
pub struct SassColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// 0..=1
    pub a: Rational64,
    pub original_name: Option<String>,
}

impl SassColor {
    pub fn rgba(r: u8, g: u8, b: u8, a: Rational64) -> Self {
        SassColor {
            r,
            g,
            b,
            a,
            original_name: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextualKind {
    Number,
    Percentage,
    Dimension,
    Hex,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub value: Expression,
    pub name: Option<String>,
    pub is_rest: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub default: Option<Expression>,
    pub is_rest: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    // ---- value variants: the fully-reduced subset ----
    Number {
        value: Rational64,
        numer_units: Vec<String>,
        denom_units: Vec<String>,
    },
    Color(SassColor),
    Boolean(bool),
    Null,
    StringConstant(String),
    StringQuoted {
        value: String,
        quote: QuoteKind,
    },
    List {
        items: Vec<Expression>,
        separator: ListSeparator,
        brackets: Brackets,
    },
    /// A rest-parameter binding: a positional tail plus any keyword
    /// arguments not consumed by named parameters.
    ArgList {
        positional: Vec<Expression>,
        keyword: Vec<(String, Expression)>,
        separator: ListSeparator,
    },
    Map(SassMap),
    /// An unresolved CSS-level call (`url(...)`, `calc(...)`, vendor
    /// functions): arguments evaluated, call left literal — the last
    /// fallback in function-resolution order, once no user function or
    /// builtin of that name exists.
    UnresolvedFunctionCall {
        name: String,
        args: Vec<Expression>,
    },
    /// `/` kept as a literal CSS separator (e.g. `font: 10px/1.5`)
    /// rather than a division operator, because both operands were
    /// bare number literals with no other operator or parenthesis to
    /// force it to a real quotient. Forced to `Binary { op: Div, .. }`
    /// wherever it becomes the operand of another operator or sits
    /// inside parentheses — see `force_division` in `parser::value`.
    Slash {
        left: Box<Expression>,
        right: Box<Expression>,
    },

    // ---- pre-evaluation variants ----
    StringSchema {
        fragments: Vec<Expression>,
        quote: QuoteKind,
    },
    Binary {
        op: BinOp,
        left: Box<Expression>,
        right: Box<Expression>,
        span: Span,
    },
    Unary {
        op: UnOp,
        operand: Box<Expression>,
        span: Span,
    },
    Variable {
        name: String,
        span: Span,
    },
    FunctionCall {
        name: String,
        args: Vec<Argument>,
        span: Span,
    },
    FunctionCallSchema {
        name: Box<Expression>,
        args: Vec<Argument>,
        span: Span,
    },
    /// An unevaluated numeric literal preserving its source form, used
    /// only transiently while parsing `calc()`/schema contents.
    Textual {
        kind: TextualKind,
        raw: String,
        span: Span,
    },
    ParentSelectorRef(Span),
}

impl Expression {
    pub fn number(value: Rational64) -> Self {
        Expression::Number {
            value,
            numer_units: Vec::new(),
            denom_units: Vec::new(),
        }
    }

    pub fn number_with_unit(value: Rational64, unit: &str) -> Self {
        Expression::Number {
            value,
            numer_units: vec![unit.to_owned()],
            denom_units: Vec::new(),
        }
    }

    pub fn unquoted(s: impl Into<String>) -> Self {
        Expression::StringConstant(s.into())
    }

    pub fn is_value(&self) -> bool {
        !matches!(
            self,
            Expression::StringSchema { .. }
                | Expression::Binary { .. }
                | Expression::Unary { .. }
                | Expression::Variable { .. }
                | Expression::FunctionCall { .. }
                | Expression::FunctionCallSchema { .. }
                | Expression::Textual { .. }
                | Expression::ParentSelectorRef(..)
        )
    }
}
