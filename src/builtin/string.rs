//! String builtins : `quote`, `unquote`,
//! `to-upper-case`, `to-lower-case`, `str-length`, `str-slice`.

use std::collections::HashMap;

use codemap::Span;
use num_rational::Rational64;
use num_traits::ToPrimitive;

use crate::ast::expression::Expression;
use crate::common::QuoteKind;
use crate::environment::Environment;
use crate::error::SassResult;
use crate::value::unquoted_text;

use super::{expect_number, optional, required, Builtin};

pub fn register(m: &mut HashMap<&'static str, Builtin>) {
    m.insert("quote", Builtin::new(vec![required("string")], quote));
    m.insert("unquote", Builtin::new(vec![required("string")], unquote));
    m.insert(
        "to-upper-case",
        Builtin::new(vec![required("string")], to_upper_case),
    );
    m.insert(
        "to-lower-case",
        Builtin::new(vec![required("string")], to_lower_case),
    );
    m.insert(
        "str-length",
        Builtin::new(vec![required("string")], str_length),
    );
    m.insert(
        "str-slice",
        Builtin::new(
            vec![
                required("string"),
                required("start-at"),
                optional("end-at", Expression::number(Rational64::from_integer(-1))),
            ],
            str_slice,
        ),
    );
}

fn quote(args: &[Expression], _: &Environment, span: Span) -> SassResult<Expression> {
    Ok(Expression::StringQuoted {
        value: unquoted_text(&args[0], span),
        quote: QuoteKind::Double,
    })
}

fn unquote(args: &[Expression], _: &Environment, span: Span) -> SassResult<Expression> {
    Ok(Expression::StringConstant(unquoted_text(&args[0], span)))
}

fn to_upper_case(args: &[Expression], _: &Environment, span: Span) -> SassResult<Expression> {
    map_text(&args[0], span, str::to_uppercase)
}

fn to_lower_case(args: &[Expression], _: &Environment, span: Span) -> SassResult<Expression> {
    map_text(&args[0], span, str::to_lowercase)
}

fn map_text(value: &Expression, span: Span, f: impl Fn(&str) -> String) -> SassResult<Expression> {
    let text = unquoted_text(value, span);
    Ok(match value {
        Expression::StringQuoted { quote, .. } => Expression::StringQuoted {
            value: f(&text),
            quote: *quote,
        },
        _ => Expression::StringConstant(f(&text)),
    })
}

fn str_length(args: &[Expression], _: &Environment, span: Span) -> SassResult<Expression> {
    let text = unquoted_text(&args[0], span);
    Ok(Expression::number(Rational64::from_integer(
        text.chars().count() as i64,
    )))
}

/// 1-indexed, inclusive slice, negative indices counting from the end
/// — the conventional Sass `str-slice` contract.
fn str_slice(args: &[Expression], _: &Environment, span: Span) -> SassResult<Expression> {
    let text: Vec<char> = unquoted_text(&args[0], span).chars().collect();
    let len = text.len() as i64;
    let (start, ..) = expect_number(&args[1], span)?;
    let (end, ..) = expect_number(&args[2], span)?;
    let resolve = |n: i64| -> i64 {
        if n < 0 {
            (len + n + 1).max(0)
        } else {
            n
        }
    };
    let start_idx = resolve(start.to_i64().unwrap_or(1)).max(1);
    let end_idx = resolve(end.to_i64().unwrap_or(len)).min(len);
    if start_idx > end_idx || start_idx > len {
        return Ok(match &args[0] {
            Expression::StringQuoted { quote, .. } => {
                Expression::StringQuoted { value: String::new(), quote: *quote }
            }
            _ => Expression::StringConstant(String::new()),
        });
    }
    let slice: String = text[(start_idx - 1) as usize..end_idx as usize].iter().collect();
    Ok(match &args[0] {
        Expression::StringQuoted { quote, .. } => Expression::StringQuoted { value: slice, quote: *quote },
        _ => Expression::StringConstant(slice),
    })
}
