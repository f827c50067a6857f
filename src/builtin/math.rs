//! Math builtins : `percentage`, `round`, `ceil`,
//! `floor`, `abs`, `min`, `max`.

use std::collections::HashMap;

use codemap::Span;
use num_traits::Signed;

use crate::ast::expression::Expression;
use crate::environment::Environment;
use crate::error::SassResult;

use super::{expect_number, optional, required, Builtin};

pub fn register(m: &mut HashMap<&'static str, Builtin>) {
    m.insert(
        "percentage",
        Builtin::new(vec![required("number")], percentage),
    );
    m.insert("round", Builtin::new(vec![required("number")], round));
    m.insert("ceil", Builtin::new(vec![required("number")], ceil));
    m.insert("floor", Builtin::new(vec![required("number")], floor));
    m.insert("abs", Builtin::new(vec![required("number")], abs));
    m.insert(
        "min",
        Builtin::new(vec![required("number1"), optional("number2", Expression::Null)], min),
    );
    m.insert(
        "max",
        Builtin::new(vec![required("number1"), optional("number2", Expression::Null)], max),
    );
}

fn percentage(args: &[Expression], _: &Environment, span: Span) -> SassResult<Expression> {
    let (value, numer, denom) = expect_number(&args[0], span)?;
    if !numer.is_empty() || !denom.is_empty() {
        return Err(("$number: Expected unitless number.", span).into());
    }
    Ok(Expression::number_with_unit(value * 100, "%"))
}

fn round(args: &[Expression], _: &Environment, span: Span) -> SassResult<Expression> {
    let (value, numer, denom) = expect_number(&args[0], span)?;
    let rounded = value.round();
    Ok(Expression::Number {
        value: rounded,
        numer_units: numer,
        denom_units: denom,
    })
}

fn ceil(args: &[Expression], _: &Environment, span: Span) -> SassResult<Expression> {
    let (value, numer, denom) = expect_number(&args[0], span)?;
    Ok(Expression::Number {
        value: value.ceil(),
        numer_units: numer,
        denom_units: denom,
    })
}

fn floor(args: &[Expression], _: &Environment, span: Span) -> SassResult<Expression> {
    let (value, numer, denom) = expect_number(&args[0], span)?;
    Ok(Expression::Number {
        value: value.floor(),
        numer_units: numer,
        denom_units: denom,
    })
}

fn abs(args: &[Expression], _: &Environment, span: Span) -> SassResult<Expression> {
    let (value, numer, denom) = expect_number(&args[0], span)?;
    Ok(Expression::Number {
        value: value.abs(),
        numer_units: numer,
        denom_units: denom,
    })
}

fn min(args: &[Expression], _: &Environment, span: Span) -> SassResult<Expression> {
    let (a, numer, denom) = expect_number(&args[0], span)?;
    if matches!(args.get(1), None | Some(Expression::Null)) {
        return Ok(args[0].clone());
    }
    let (b, ..) = expect_number(&args[1], span)?;
    Ok(Expression::Number {
        value: if a < b { a } else { b },
        numer_units: numer,
        denom_units: denom,
    })
}

fn max(args: &[Expression], _: &Environment, span: Span) -> SassResult<Expression> {
    let (a, numer, denom) = expect_number(&args[0], span)?;
    if matches!(args.get(1), None | Some(Expression::Null)) {
        return Ok(args[0].clone());
    }
    let (b, ..) = expect_number(&args[1], span)?;
    Ok(Expression::Number {
        value: if a > b { a } else { b },
        numer_units: numer,
        denom_units: denom,
    })
}

// `round`/`ceil`/`floor`/`abs` above call num-rational's own inherent
// `Ratio<T: Integer>` methods of the same names — exact, no `f64`
// drift, matching this crate's reason for using a rational `Number`
// representation in the first place (DESIGN.md).
