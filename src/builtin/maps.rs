//! Map builtins : `map-get`, `map-merge`,
//! `map-keys`, `map-values`, `map-has-key`. Named `maps` to avoid
//! colliding with `crate::value::map`.

use std::collections::HashMap;

use codemap::Span;

use crate::ast::expression::Expression;
use crate::common::ListSeparator;
use crate::environment::Environment;
use crate::error::SassResult;
use crate::value::SassMap;

use super::{required, Builtin};

pub fn register(m: &mut HashMap<&'static str, Builtin>) {
    m.insert(
        "map-get",
        Builtin::new(vec![required("map"), required("key")], map_get),
    );
    m.insert(
        "map-merge",
        Builtin::new(vec![required("map1"), required("map2")], map_merge),
    );
    m.insert("map-keys", Builtin::new(vec![required("map")], map_keys));
    m.insert("map-values", Builtin::new(vec![required("map")], map_values));
    m.insert(
        "map-has-key",
        Builtin::new(vec![required("map"), required("key")], map_has_key),
    );
}

fn expect_map<'a>(value: &'a Expression, span: Span) -> SassResult<&'a SassMap> {
    match value {
        Expression::Map(m) => Ok(m),
        other => Err((format!("{:?} is not a map.", other), span).into()),
    }
}

fn map_get(args: &[Expression], _: &Environment, span: Span) -> SassResult<Expression> {
    let map = expect_map(&args[0], span)?;
    Ok(map.get(&args[1]).cloned().unwrap_or(Expression::Null))
}

fn map_merge(args: &[Expression], _: &Environment, span: Span) -> SassResult<Expression> {
    let mut map = expect_map(&args[0], span)?.clone();
    let other = expect_map(&args[1], span)?.clone();
    map.merge(other);
    Ok(Expression::Map(map))
}

fn map_keys(args: &[Expression], _: &Environment, span: Span) -> SassResult<Expression> {
    let map = expect_map(&args[0], span)?;
    Ok(Expression::List {
        items: map.keys(),
        separator: ListSeparator::Comma,
        brackets: crate::common::Brackets::None,
    })
}

fn map_values(args: &[Expression], _: &Environment, span: Span) -> SassResult<Expression> {
    let map = expect_map(&args[0], span)?;
    Ok(Expression::List {
        items: map.values(),
        separator: ListSeparator::Comma,
        brackets: crate::common::Brackets::None,
    })
}

fn map_has_key(args: &[Expression], _: &Environment, span: Span) -> SassResult<Expression> {
    let map = expect_map(&args[0], span)?;
    Ok(Expression::Boolean(map.get(&args[1]).is_some()))
}
