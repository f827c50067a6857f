//! Introspection builtins : `type-of`, `unit`,
//! `unitless`, `comparable`, `if`, `content-exists`.
//!
//! `content-exists` needs the calling environment (it reflects whether
//! `@content[m]` is bound in the current frame, per //! content-block-as-synthetic-mixin rule), which is why every builtin
//! here takes `&Environment` even though most ignore it — kept uniform
//! with the rest of the table rather than carving out a special case
//! in the dispatcher, grounded on the observed behavior in
//! `tests/content-exists.rs` (kept from the original test suite).

use std::collections::HashMap;

use codemap::Span;

use crate::ast::expression::Expression;
use crate::environment::Environment;
use crate::error::SassResult;
use crate::value;

use super::{expect_number, required, Builtin};

pub fn register(m: &mut HashMap<&'static str, Builtin>) {
    m.insert("type-of", Builtin::new(vec![required("value")], type_of));
    m.insert("unit", Builtin::new(vec![required("number")], unit));
    m.insert("unitless", Builtin::new(vec![required("number")], unitless));
    m.insert(
        "comparable",
        Builtin::new(vec![required("number1"), required("number2")], comparable),
    );
    m.insert(
        "if",
        Builtin::new(vec![required("condition"), required("if-true"), required("if-false")], if_fn),
    );
    m.insert(
        "content-exists",
        Builtin::new(Vec::new(), content_exists),
    );
}

fn type_of(args: &[Expression], _: &Environment, _: Span) -> SassResult<Expression> {
    Ok(Expression::unquoted(value::type_name(&args[0])))
}

fn unit(args: &[Expression], _: &Environment, span: Span) -> SassResult<Expression> {
    let (_, numer, denom) = expect_number(&args[0], span)?;
    Ok(Expression::StringQuoted {
        value: value::unit_string(&numer, &denom),
        quote: crate::common::QuoteKind::Single,
    })
}

fn unitless(args: &[Expression], _: &Environment, span: Span) -> SassResult<Expression> {
    let (_, numer, denom) = expect_number(&args[0], span)?;
    Ok(Expression::Boolean(numer.is_empty() && denom.is_empty()))
}

fn comparable(args: &[Expression], _: &Environment, span: Span) -> SassResult<Expression> {
    let (_, n1, d1) = expect_number(&args[0], span)?;
    let (_, n2, d2) = expect_number(&args[1], span)?;
    Ok(Expression::Boolean(value::units_compatible(&n1, &d1, &n2, &d2)))
}

fn if_fn(args: &[Expression], _: &Environment, _: Span) -> SassResult<Expression> {
    Ok(if value::is_true(&args[0]) {
        args[1].clone()
    } else {
        args[2].clone()
    })
}

fn content_exists(_: &[Expression], env: &Environment, span: Span) -> SassResult<Expression> {
    if env.get_mixin("@content").is_none() && !env.has("@in-mixin") {
        return Err(("content-exists() may only be called within a mixin.", span).into());
    }
    Ok(Expression::Boolean(env.get_mixin("@content").is_some()))
}
