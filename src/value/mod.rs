//! Operations on the evaluated subset of `Expression` (the value
//! variants a fully-resolved `Expression` can settle into — numbers,
//! colors, strings, booleans, null, lists, maps). Kept as a standalone
//! module, mirroring a conventional `value.rs` (a `Value` type's
//! `.equals()`/`.is_true()`/`.to_css_string()` methods), generalized
//! here into free functions over `Expression` since this crate folds
//! its value subset into `Expression` itself rather than keeping a
//! separate enum for fewer redundant hierarchies.

pub mod map;

pub use map::SassMap;

use std::cmp::Ordering;

use codemap::Span;

use crate::ast::expression::Expression;
use crate::error::SassResult;

/// Normalize a unit vector for comparison: sort so `px*em` and `em*px`
/// compare equal. Number equality requires both equal value and equal
/// normalized unit vectors.
fn normalized_units(units: &[String]) -> Vec<String> {
    let mut u: Vec<String> = units.iter().map(|s| s.to_ascii_lowercase()).collect();
    u.sort();
    u
}

pub fn units_compatible(a_num: &[String], a_den: &[String], b_num: &[String], b_den: &[String]) -> bool {
    normalized_units(a_num) == normalized_units(b_num) && normalized_units(a_den) == normalized_units(b_den)
}

/// Unquoted textual representation of a string-shaped value, used by
/// interpolation and by `unquote()`/`quote()`.
pub fn unquoted_text(value: &Expression, span: Span) -> String {
    match value {
        Expression::StringConstant(s) => s.clone(),
        Expression::StringQuoted { value, .. } => value.clone(),
        _ => to_css_string(value, span).unwrap_or_default(),
    }
}

fn string_text(value: &Expression) -> &str {
    match value {
        Expression::StringConstant(s) => s,
        Expression::StringQuoted { value, .. } => value,
        _ => "",
    }
}

/// Total equality: two values of different kinds are unequal; lists
/// compare structurally including separator. A quoted and unquoted
/// string with the same text are `==`.
pub fn equals(a: &Expression, b: &Expression) -> bool {
    use Expression::*;
    match (a, b) {
        (Number { value: v1, numer_units: n1, denom_units: d1 }, Number { value: v2, numer_units: n2, denom_units: d2 }) => {
            units_compatible(n1, d1, n2, d2) && v1 == v2
        }
        (Color(c1), Color(c2)) => c1.r == c2.r && c1.g == c2.g && c1.b == c2.b && c1.a == c2.a,
        (Boolean(x), Boolean(y)) => x == y,
        (Null, Null) => true,
        (StringConstant(_) | StringQuoted { .. }, StringConstant(_) | StringQuoted { .. }) => {
            string_text(a) == string_text(b)
        }
        (List { items: i1, separator: s1, .. }, List { items: i2, separator: s2, .. }) => {
            s1 == s2 && i1.len() == i2.len() && i1.iter().zip(i2).all(|(x, y)| equals(x, y))
        }
        (Map(m1), Map(m2)) => {
            m1.len() == m2.len()
                && m1
                    .iter()
                    .all(|(k, v)| matches!(m2.get(k), Some(v2) if equals(v, v2)))
        }
        _ => false,
    }
}

/// Falsy values are exactly `false` and `null`.
pub fn is_true(value: &Expression) -> bool {
    !matches!(value, Expression::Boolean(false) | Expression::Null)
}

pub fn type_name(value: &Expression) -> &'static str {
    match value {
        Expression::Number { .. } => "number",
        Expression::Color(_) => "color",
        Expression::Boolean(_) => "bool",
        Expression::Null => "null",
        Expression::StringConstant(_) | Expression::StringQuoted { .. } => "string",
        Expression::List { .. } | Expression::ArgList { .. } => "list",
        Expression::Map(_) => "map",
        Expression::UnresolvedFunctionCall { .. } | Expression::Slash { .. } => "string",
        _ => "string",
    }
}

/// Relational comparison, defined only on numbers after unit
/// conversion; anything else is a type error.
pub fn compare(a: &Expression, b: &Expression, span: Span) -> SassResult<Ordering> {
    match (a, b) {
        (
            Expression::Number { value: v1, numer_units: n1, denom_units: d1 },
            Expression::Number { value: v2, numer_units: n2, denom_units: d2 },
        ) => {
            if !units_compatible(n1, d1, n2, d2) {
                return Err((
                    format!(
                        "Incompatible units {} and {}.",
                        unit_string(n1, d1),
                        unit_string(n2, d2)
                    ),
                    span,
                )
                    .into());
            }
            Ok(v1.cmp(v2))
        }
        _ => Err((
            format!("Undefined operation for {} and {}.", type_name(a), type_name(b)),
            span,
        )
            .into()),
    }
}

pub fn unit_string(numer: &[String], denom: &[String]) -> String {
    if denom.is_empty() {
        numer.join("*")
    } else if numer.is_empty() {
        format!("1/{}", denom.join("*"))
    } else {
        format!("{}/{}", numer.join("*"), denom.join("*"))
    }
}

/// Render a fully-evaluated value to its CSS text. Interpolation
/// of a `null` is the empty string.
pub fn to_css_string(value: &Expression, span: Span) -> SassResult<String> {
    Ok(match value {
        Expression::Null => String::new(),
        Expression::Boolean(b) => b.to_string(),
        Expression::Number { value, numer_units, denom_units } => {
            let mut s = format_rational(*value);
            if !numer_units.is_empty() || !denom_units.is_empty() {
                s.push_str(&unit_string(numer_units, denom_units));
            }
            s
        }
        Expression::Color(c) => format_color(c),
        Expression::StringConstant(s) => s.clone(),
        Expression::StringQuoted { value, quote } => format!("{}{}{}", quote, value, quote),
        Expression::List { items, separator, brackets } => {
            let rendered: Vec<String> = items
                .iter()
                .filter(|i| !matches!(i, Expression::Null))
                .map(|i| to_css_string(i, span))
                .collect::<SassResult<_>>()?;
            let joined = rendered.join(separator.as_str());
            match brackets {
                crate::common::Brackets::Bracketed => format!("[{}]", joined),
                crate::common::Brackets::None => joined,
            }
        }
        Expression::ArgList { positional, .. } => {
            let rendered: Vec<String> = positional
                .iter()
                .map(|i| to_css_string(i, span))
                .collect::<SassResult<_>>()?;
            rendered.join(", ")
        }
        Expression::Map(_) => return Err(("Maps are not valid CSS values.", span).into()),
        Expression::UnresolvedFunctionCall { name, args } => {
            let rendered: Vec<String> = args
                .iter()
                .map(|a| to_css_string(a, span))
                .collect::<SassResult<_>>()?;
            format!("{}({})", name, rendered.join(", "))
        }
        Expression::Slash { left, right } => {
            format!("{}/{}", to_css_string(left, span)?, to_css_string(right, span)?)
        }
        other => return Err((format!("{:?} is not a value.", other), span).into()),
    })
}

fn format_rational(value: num_rational::Rational64) -> String {
    if value.is_integer() {
        return value.to_integer().to_string();
    }
    let as_f64 = *value.numer() as f64 / *value.denom() as f64;
    let mut s = format!("{:.5}", as_f64);
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.pop();
    }
    s
}

fn format_color(c: &crate::ast::expression::SassColor) -> String {
    if let Some(name) = &c.original_name {
        if c.a == num_rational::Rational64::new(1, 1) {
            return name.clone();
        }
    }
    if c.a == num_rational::Rational64::new(1, 1) {
        format!("#{:02x}{:02x}{:02x}", c.r, c.g, c.b)
    } else {
        let a_f64 = *c.a.numer() as f64 / *c.a.denom() as f64;
        format!("rgba({}, {}, {}, {})", c.r, c.g, c.b, a_f64)
    }
}
