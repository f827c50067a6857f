//! The native function catalogue: color, string, list, map,
//! introspection and math families, resolved by name+arity before any
//! user-defined function or CSS-literal passthrough.

mod color;
pub mod color_names;
mod introspection;
mod list;
mod maps;
mod math;
mod string;

use std::collections::HashMap;

use codemap::Span;
use once_cell::sync::Lazy;

use crate::ast::expression::{Expression, Parameter};
use crate::environment::Environment;
use crate::error::SassResult;

pub type BuiltinFn = fn(&[Expression], &Environment, Span) -> SassResult<Expression>;

pub struct Builtin {
    pub params: Vec<Parameter>,
    pub func: BuiltinFn,
}

impl Builtin {
    fn new(params: Vec<Parameter>, func: BuiltinFn) -> Self {
        Builtin { params, func }
    }
}

pub fn required(name: &str) -> Parameter {
    Parameter {
        name: name.to_owned(),
        default: None,
        is_rest: false,
    }
}

pub fn optional(name: &str, default: Expression) -> Parameter {
    Parameter {
        name: name.to_owned(),
        default: Some(default),
        is_rest: false,
    }
}

pub fn rest(name: &str) -> Parameter {
    Parameter {
        name: name.to_owned(),
        default: None,
        is_rest: true,
    }
}

pub static BUILTINS: Lazy<HashMap<&'static str, Builtin>> = Lazy::new(|| {
    let mut m = HashMap::new();
    color::register(&mut m);
    string::register(&mut m);
    list::register(&mut m);
    maps::register(&mut m);
    math::register(&mut m);
    introspection::register(&mut m);
    m
});

pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTINS.get(name)
}

/// Extract a bare number (value + units) from an argument, the shape
/// most math/color builtins need.
pub(crate) fn expect_number(
    value: &Expression,
    span: Span,
) -> SassResult<(num_rational::Rational64, Vec<String>, Vec<String>)> {
    match value {
        Expression::Number { value, numer_units, denom_units } => {
            Ok((*value, numer_units.clone(), denom_units.clone()))
        }
        other => Err((
            format!("{} is not a number.", crate::value::to_css_string(other, span)?),
            span,
        )
            .into()),
    }
}

pub(crate) fn expect_string(value: &Expression, span: Span) -> String {
    crate::value::unquoted_text(value, span)
}

