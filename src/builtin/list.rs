//! List builtins : `length`, `nth`, `join`,
//! `append`, `index`, `list-separator`, `zip`.

use std::collections::HashMap;

use codemap::Span;
use num_rational::Rational64;
use num_traits::ToPrimitive;

use crate::ast::expression::Expression;
use crate::common::{Brackets, ListSeparator};
use crate::environment::Environment;
use crate::error::SassResult;
use crate::value::equals;

use super::{expect_number, optional, required, Builtin};

pub fn register(m: &mut HashMap<&'static str, Builtin>) {
    m.insert("length", Builtin::new(vec![required("list")], length));
    m.insert(
        "nth",
        Builtin::new(vec![required("list"), required("n")], nth),
    );
    m.insert(
        "join",
        Builtin::new(
            vec![
                required("list1"),
                required("list2"),
                optional("separator", Expression::unquoted("auto")),
                optional("bracketed", Expression::unquoted("auto")),
            ],
            join,
        ),
    );
    m.insert(
        "append",
        Builtin::new(
            vec![
                required("list"),
                required("val"),
                optional("separator", Expression::unquoted("auto")),
            ],
            append,
        ),
    );
    m.insert(
        "index",
        Builtin::new(vec![required("list"), required("value")], index),
    );
    m.insert(
        "list-separator",
        Builtin::new(vec![required("list")], list_separator),
    );
    m.insert("zip", Builtin::new(vec![required("lists")], zip));
}

/// Treat a bare scalar as a one-element, space-separated list — the
/// same "transparent to a single item" rule the documented invariant names
/// for truthiness, extended here to list-builtin argument handling,
/// which is how the original treats non-list arguments to these
/// functions.
fn as_items(value: &Expression) -> (Vec<Expression>, ListSeparator, Brackets) {
    match value {
        Expression::List { items, separator, brackets } => (items.clone(), *separator, *brackets),
        Expression::ArgList { positional, separator, .. } => (positional.clone(), *separator, Brackets::None),
        other => (vec![other.clone()], ListSeparator::Space, Brackets::None),
    }
}

fn length(args: &[Expression], _: &Environment, _: Span) -> SassResult<Expression> {
    let (items, ..) = as_items(&args[0]);
    Ok(Expression::number(Rational64::from_integer(items.len() as i64)))
}

fn resolve_index(n: i64, len: usize) -> Option<usize> {
    if n == 0 {
        return None;
    }
    if n > 0 {
        if n as usize <= len {
            Some(n as usize - 1)
        } else {
            None
        }
    } else {
        let from_end = len as i64 + n;
        if from_end >= 0 {
            Some(from_end as usize)
        } else {
            None
        }
    }
}

fn nth(args: &[Expression], _: &Environment, span: Span) -> SassResult<Expression> {
    let (items, ..) = as_items(&args[0]);
    let (n, ..) = expect_number(&args[1], span)?;
    let idx = n.to_i64().unwrap_or(0);
    match resolve_index(idx, items.len()) {
        Some(i) => Ok(items[i].clone()),
        None => Err((format!("$n: {} is out of bounds.", idx), span).into()),
    }
}

fn separator_for(name: &str, fallback: ListSeparator, span: Span) -> SassResult<ListSeparator> {
    match name {
        "space" => Ok(ListSeparator::Space),
        "comma" => Ok(ListSeparator::Comma),
        "slash" => Ok(ListSeparator::Slash),
        "auto" => Ok(fallback),
        other => Err((format!("$separator: Must be \"space\", \"comma\", \"slash\", or \"auto\". Got \"{}\".", other), span).into()),
    }
}

fn join(args: &[Expression], _: &Environment, span: Span) -> SassResult<Expression> {
    let (mut items1, sep1, brackets1) = as_items(&args[0]);
    let (items2, sep2, _) = as_items(&args[1]);
    let requested = crate::value::unquoted_text(&args[2], span);
    let fallback = if items1.is_empty() { sep2 } else { sep1 };
    let separator = separator_for(&requested, fallback, span)?;
    let bracketed = match &args[3] {
        Expression::StringConstant(s) | Expression::StringQuoted { value: s, .. } if s == "auto" => {
            matches!(brackets1, Brackets::Bracketed)
        }
        other => crate::value::is_true(other),
    };
    items1.extend(items2);
    Ok(Expression::List {
        items: items1,
        separator,
        brackets: if bracketed { Brackets::Bracketed } else { Brackets::None },
    })
}

fn append(args: &[Expression], _: &Environment, span: Span) -> SassResult<Expression> {
    let (mut items, sep, brackets) = as_items(&args[0]);
    let requested = crate::value::unquoted_text(&args[2], span);
    let separator = separator_for(&requested, sep, span)?;
    items.push(args[1].clone());
    Ok(Expression::List { items, separator, brackets })
}

fn index(args: &[Expression], _: &Environment, _: Span) -> SassResult<Expression> {
    let (items, ..) = as_items(&args[0]);
    match items.iter().position(|i| equals(i, &args[1])) {
        Some(i) => Ok(Expression::number(Rational64::from_integer(i as i64 + 1))),
        None => Ok(Expression::Null),
    }
}

fn list_separator(args: &[Expression], _: &Environment, _: Span) -> SassResult<Expression> {
    let (items, sep, _) = as_items(&args[0]);
    let name = match sep {
        ListSeparator::Space => "space",
        ListSeparator::Comma => "comma",
        ListSeparator::Slash => "slash",
    };
    Ok(Expression::unquoted(if items.len() <= 1 { "space" } else { name }))
}

fn zip(args: &[Expression], _: &Environment, _: Span) -> SassResult<Expression> {
    let (lists, ..) = as_items(&args[0]);
    let lists: Vec<Vec<Expression>> = lists.iter().map(|l| as_items(l).0).collect();
    let min_len = lists.iter().map(Vec::len).min().unwrap_or(0);
    let mut out = Vec::with_capacity(min_len);
    for i in 0..min_len {
        let row: Vec<Expression> = lists.iter().map(|l| l[i].clone()).collect();
        out.push(Expression::List {
            items: row,
            separator: ListSeparator::Space,
            brackets: Brackets::None,
        });
    }
    Ok(Expression::List {
        items: out,
        separator: ListSeparator::Comma,
        brackets: Brackets::None,
    })
}
