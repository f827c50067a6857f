//! Reduces `Expression` nodes to their fully-evaluated "value" subset,
//! and runs the control-flow subset (`@if`/`@for`/`@each`/`@while`/
//! variable assignment) that both function bodies and the expander
//! share, dispatching on the unified `Expression` enum against the
//! frame-chain `Environment`.

use std::cell::Cell;
use std::collections::HashMap;

use codemap::Span;
use num_rational::Rational64;
use num_traits::Zero;

use crate::ast::expression::{Argument, Expression, Parameter, SassColor};
use crate::ast::statement::{Block, DefinitionKind, Statement};
use crate::builtin;
use crate::common::{BinOp, Brackets, ListSeparator, QuoteKind, UnOp};
use crate::environment::{Callable, Environment};
use crate::error::SassResult;
use crate::value::{self, SassMap};

thread_local! {
    static CALL_DEPTH: Cell<u32> = Cell::new(0);
}

/// Mixin/function call nesting bound; exceeding it is a real user
/// error (infinite recursion), not a host stack overflow.
const MAX_CALL_DEPTH: u32 = 1024;

struct DepthGuard;

impl DepthGuard {
    fn enter(span: Span) -> SassResult<Self> {
        CALL_DEPTH.with(|d| {
            let next = d.get() + 1;
            if next > MAX_CALL_DEPTH {
                return Err((
                    "Maximum call stack depth exceeded.",
                    span,
                )
                    .into());
            }
            d.set(next);
            Ok(DepthGuard)
        })
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        CALL_DEPTH.with(|d| d.set(d.get() - 1));
    }
}

/// Outcome of running a statement sequence that may contain `@return`.
pub enum Flow {
    Continue,
    Return(Expression),
}

pub fn evaluate(expr: &Expression, env: &Environment, span: Span) -> SassResult<Expression> {
    match expr {
        Expression::Number { .. }
        | Expression::Color(_)
        | Expression::Boolean(_)
        | Expression::Null
        | Expression::StringConstant(_)
        | Expression::StringQuoted { .. } => Ok(expr.clone()),

        Expression::List { items, separator, brackets } => {
            let items = items
                .iter()
                .map(|i| evaluate(i, env, span))
                .collect::<SassResult<Vec<_>>>()?;
            Ok(Expression::List { items, separator: *separator, brackets: *brackets })
        }
        Expression::ArgList { positional, keyword, separator } => {
            let positional = positional
                .iter()
                .map(|i| evaluate(i, env, span))
                .collect::<SassResult<Vec<_>>>()?;
            let keyword = keyword
                .iter()
                .map(|(k, v)| Ok((k.clone(), evaluate(v, env, span)?)))
                .collect::<SassResult<Vec<_>>>()?;
            Ok(Expression::ArgList { positional, keyword, separator: *separator })
        }
        Expression::Map(map) => {
            let pairs = map
                .iter()
                .map(|(k, v)| Ok((evaluate(k, env, span)?, evaluate(v, env, span)?)))
                .collect::<SassResult<Vec<_>>>()?;
            Ok(Expression::Map(SassMap::from_pairs(pairs)))
        }
        Expression::UnresolvedFunctionCall { name, args } => {
            let args = args
                .iter()
                .map(|a| evaluate(a, env, span))
                .collect::<SassResult<Vec<_>>>()?;
            Ok(Expression::UnresolvedFunctionCall { name: name.clone(), args })
        }
        Expression::Slash { left, right } => Ok(Expression::Slash {
            left: Box::new(evaluate(left, env, span)?),
            right: Box::new(evaluate(right, env, span)?),
        }),

        Expression::StringSchema { fragments, quote } => evaluate_schema(fragments, *quote, env, span),
        Expression::Binary { op, left, right, span } => evaluate_binary(*op, left, right, *span, env),
        Expression::Unary { op, operand, span } => evaluate_unary(*op, operand, *span, env),
        Expression::Variable { name, span } => env
            .get(name)
            .ok_or_else(|| (format!("Undefined variable: \"${}\".", name), *span).into()),
        Expression::FunctionCall { name, args, span } => evaluate_function_call(name, args, *span, env),
        Expression::FunctionCallSchema { name, args, span } => {
            let resolved = evaluate(name, env, *span)?;
            let resolved_name = value::unquoted_text(&resolved, *span);
            evaluate_function_call(&resolved_name, args, *span, env)
        }
        Expression::Textual { kind, raw, span } => evaluate_textual(*kind, raw, *span),
        Expression::ParentSelectorRef(span) => {
            Err(("Top-level selectors may not contain the parent selector \"&\".", *span).into())
        }
    }
}

fn evaluate_schema(
    fragments: &[Expression],
    quote: QuoteKind,
    env: &Environment,
    span: Span,
) -> SassResult<Expression> {
    let mut out = String::new();
    for fragment in fragments {
        let value = evaluate(fragment, env, span)?;
        out.push_str(&value::to_css_string(&value, span)?);
    }
    Ok(match quote {
        QuoteKind::None => Expression::StringConstant(out),
        _ => Expression::StringQuoted { value: out, quote },
    })
}

fn cancel_units(mut numer: Vec<String>, denom: Vec<String>) -> (Vec<String>, Vec<String>) {
    let mut remaining_denom = Vec::new();
    for d in denom {
        if let Some(pos) = numer.iter().position(|n| n.eq_ignore_ascii_case(&d)) {
            numer.remove(pos);
        } else {
            remaining_denom.push(d);
        }
    }
    (numer, remaining_denom)
}

fn evaluate_binary(
    op: BinOp,
    left: &Expression,
    right: &Expression,
    span: Span,
    env: &Environment,
) -> SassResult<Expression> {
    // `and`/`or` short-circuit on the evaluated left operand, per the
    // falsy-is-only-false-and-null rule.
    if op == BinOp::And {
        let l = evaluate(left, env, span)?;
        return if value::is_true(&l) { evaluate(right, env, span) } else { Ok(l) };
    }
    if op == BinOp::Or {
        let l = evaluate(left, env, span)?;
        return if value::is_true(&l) { Ok(l) } else { evaluate(right, env, span) };
    }

    let l = evaluate(left, env, span)?;
    let r = evaluate(right, env, span)?;

    match op {
        BinOp::Eq => return Ok(Expression::Boolean(value::equals(&l, &r))),
        BinOp::Neq => return Ok(Expression::Boolean(!value::equals(&l, &r))),
        BinOp::Gt | BinOp::Gte | BinOp::Lt | BinOp::Lte => {
            let ord = value::compare(&l, &r, span)?;
            let result = match op {
                BinOp::Gt => ord == std::cmp::Ordering::Greater,
                BinOp::Gte => ord != std::cmp::Ordering::Less,
                BinOp::Lt => ord == std::cmp::Ordering::Less,
                BinOp::Lte => ord != std::cmp::Ordering::Greater,
                _ => unreachable!(),
            };
            return Ok(Expression::Boolean(result));
        }
        _ => {}
    }

    match (&l, &r) {
        (
            Expression::Number { value: v1, numer_units: n1, denom_units: d1 },
            Expression::Number { value: v2, numer_units: n2, denom_units: d2 },
        ) => arithmetic_on_numbers(op, *v1, n1, d1, *v2, n2, d2, span),
        (Expression::Color(c1), Expression::Color(c2)) if matches!(op, BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div) => {
            Ok(Expression::Color(arithmetic_on_colors(op, c1, c2, span)?))
        }
        (Expression::StringQuoted { .. } | Expression::StringConstant(_), _)
        | (_, Expression::StringQuoted { .. } | Expression::StringConstant(_))
            if op == BinOp::Add =>
        {
            let quote = match (&l, &r) {
                (Expression::StringQuoted { quote, .. }, _) => *quote,
                (_, Expression::StringQuoted { quote, .. }) => *quote,
                _ => QuoteKind::None,
            };
            let joined = format!(
                "{}{}",
                value::to_css_string(&l, span)?,
                value::to_css_string(&r, span)?
            );
            Ok(match quote {
                QuoteKind::None => Expression::StringConstant(joined),
                _ => Expression::StringQuoted { value: joined, quote },
            })
        }
        // `-` and `/` never combine strings numerically; they degrade to
        // a literal concatenation with the operator character between.
        (Expression::StringQuoted { .. } | Expression::StringConstant(_), _)
        | (_, Expression::StringQuoted { .. } | Expression::StringConstant(_))
            if matches!(op, BinOp::Sub | BinOp::Div) =>
        {
            let sep = if op == BinOp::Sub { "-" } else { "/" };
            let joined = format!(
                "{}{}{}",
                value::to_css_string(&l, span)?,
                sep,
                value::to_css_string(&r, span)?
            );
            Ok(Expression::StringConstant(joined))
        }
        // A number combined with a color via `-`/`/` has no numeric
        // meaning either; it degrades the same way.
        (Expression::Number { .. }, Expression::Color(_))
        | (Expression::Color(_), Expression::Number { .. })
            if matches!(op, BinOp::Sub | BinOp::Div) =>
        {
            let sep = if op == BinOp::Sub { "-" } else { "/" };
            let joined = format!(
                "{}{}{}",
                value::to_css_string(&l, span)?,
                sep,
                value::to_css_string(&r, span)?
            );
            Ok(Expression::StringConstant(joined))
        }
        _ => Err((
            format!(
                "Undefined operation \"{} {:?} {}\".",
                value::to_css_string(&l, span).unwrap_or_default(),
                op,
                value::to_css_string(&r, span).unwrap_or_default()
            ),
            span,
        )
            .into()),
    }
}

#[allow(clippy::too_many_arguments)]
fn arithmetic_on_numbers(
    op: BinOp,
    v1: Rational64,
    n1: &[String],
    d1: &[String],
    v2: Rational64,
    n2: &[String],
    d2: &[String],
    span: Span,
) -> SassResult<Expression> {
    match op {
        BinOp::Add | BinOp::Sub | BinOp::Mod => {
            if !value::units_compatible(n1, d1, n2, d2) {
                return Err((
                    format!(
                        "Incompatible units {} and {}.",
                        value::unit_string(n1, d1),
                        value::unit_string(n2, d2)
                    ),
                    span,
                )
                    .into());
            }
            let value = match op {
                BinOp::Add => v1 + v2,
                BinOp::Sub => v1 - v2,
                BinOp::Mod => {
                    if v2.is_zero() {
                        return Err(("Division by zero.", span).into());
                    }
                    let quotient = (v1 / v2).floor();
                    v1 - v2 * quotient
                }
                _ => unreachable!(),
            };
            Ok(Expression::Number { value, numer_units: n1.to_vec(), denom_units: d1.to_vec() })
        }
        BinOp::Mul => {
            let (numer, denom) = cancel_units(
                n1.iter().chain(n2.iter()).cloned().collect(),
                d1.iter().chain(d2.iter()).cloned().collect(),
            );
            Ok(Expression::Number { value: v1 * v2, numer_units: numer, denom_units: denom })
        }
        BinOp::Div => {
            if v2.is_zero() {
                return Err(("Division by zero.", span).into());
            }
            let (numer, denom) = cancel_units(
                n1.iter().chain(d2.iter()).cloned().collect(),
                d1.iter().chain(n2.iter()).cloned().collect(),
            );
            Ok(Expression::Number { value: v1 / v2, numer_units: numer, denom_units: denom })
        }
        _ => unreachable!("relational/logical ops handled above"),
    }
}

/// Add/sub/mul/div two colors channel-by-channel, clamping each result
/// to 0..=255. Both operands must carry the same alpha: there's no
/// sensible way to combine two different alpha channels with a plain
/// per-channel op, so a mismatch is an error rather than a silent pick.
fn arithmetic_on_colors(op: BinOp, c1: &SassColor, c2: &SassColor, span: Span) -> SassResult<SassColor> {
    if c1.a != c2.a {
        return Err((
            format!(
                "Alpha channels must be equal: {:?} {:?} {:?} (alpha {} vs {})",
                c1, op, c2, c1.a, c2.a
            ),
            span,
        )
            .into());
    }
    let clamp = |v: i32| -> u8 { v.clamp(0, 255) as u8 };
    let (r, g, b) = match op {
        BinOp::Add => (
            clamp(i32::from(c1.r) + i32::from(c2.r)),
            clamp(i32::from(c1.g) + i32::from(c2.g)),
            clamp(i32::from(c1.b) + i32::from(c2.b)),
        ),
        BinOp::Sub => (
            clamp(i32::from(c1.r) - i32::from(c2.r)),
            clamp(i32::from(c1.g) - i32::from(c2.g)),
            clamp(i32::from(c1.b) - i32::from(c2.b)),
        ),
        BinOp::Mul => (
            clamp(i32::from(c1.r) * i32::from(c2.r)),
            clamp(i32::from(c1.g) * i32::from(c2.g)),
            clamp(i32::from(c1.b) * i32::from(c2.b)),
        ),
        BinOp::Div => {
            let div = |a: u8, b: u8| -> u8 {
                if b == 0 {
                    0
                } else {
                    clamp(i32::from(a) / i32::from(b))
                }
            };
            (div(c1.r, c2.r), div(c1.g, c2.g), div(c1.b, c2.b))
        }
        _ => unreachable!("only called for Add/Sub/Mul/Div"),
    };
    Ok(SassColor::rgba(r, g, b, c1.a))
}

fn evaluate_unary(op: UnOp, operand: &Expression, span: Span, env: &Environment) -> SassResult<Expression> {
    let value = evaluate(operand, env, span)?;
    match op {
        UnOp::Not => Ok(Expression::Boolean(!value::is_true(&value))),
        UnOp::Plus | UnOp::Minus => match &value {
            Expression::Number { value: n, numer_units, denom_units } => {
                let n = if op == UnOp::Minus { -*n } else { *n };
                Ok(Expression::Number { value: n, numer_units: numer_units.clone(), denom_units: denom_units.clone() })
            }
            // Not a number: the operator is re-emitted as a literal
            // prefix on the operand's CSS text (e.g. `-$x` where `$x`
            // is a string becomes the literal string `-foo`).
            other => {
                let prefix = if op == UnOp::Minus { "-" } else { "+" };
                let text = value::to_css_string(other, span)?;
                Ok(Expression::StringConstant(format!("{}{}", prefix, text)))
            }
        },
    }
}

fn evaluate_textual(kind: crate::ast::expression::TextualKind, raw: &str, span: Span) -> SassResult<Expression> {
    use crate::ast::expression::TextualKind::*;
    match kind {
        Number => parse_number(raw, span).map(|v| Expression::number(v)),
        Percentage => {
            let digits = raw.trim_end_matches('%');
            let v = parse_number(digits, span)?;
            Ok(Expression::number_with_unit(v, "%"))
        }
        Dimension => {
            let split = raw.find(|c: char| c.is_alphabetic() || c == '%').unwrap_or(raw.len());
            let (digits, unit) = raw.split_at(split);
            let v = parse_number(digits, span)?;
            Ok(Expression::number_with_unit(v, unit))
        }
        Hex => parse_hex_color(raw, span),
    }
}

fn parse_number(raw: &str, span: Span) -> SassResult<Rational64> {
    if let Ok(i) = raw.parse::<i64>() {
        return Ok(Rational64::from_integer(i));
    }
    let f: f64 = raw
        .parse()
        .map_err(|_| -> Box<crate::error::SassError> { (format!("Invalid number: \"{}\".", raw), span).into() })?;
    Rational64::approximate_float(f).ok_or_else(|| (format!("Invalid number: \"{}\".", raw), span).into())
}

fn parse_hex_component(s: &str) -> u8 {
    u8::from_str_radix(s, 16).unwrap_or(0)
}

fn parse_hex_color(raw: &str, span: Span) -> SassResult<Expression> {
    let digits = raw.trim_start_matches('#');
    let expand = |c: char| -> String { format!("{0}{0}", c) };
    let (r, g, b, a) = match digits.len() {
        3 => {
            let chars: Vec<char> = digits.chars().collect();
            (
                parse_hex_component(&expand(chars[0])),
                parse_hex_component(&expand(chars[1])),
                parse_hex_component(&expand(chars[2])),
                255u8,
            )
        }
        4 => {
            let chars: Vec<char> = digits.chars().collect();
            (
                parse_hex_component(&expand(chars[0])),
                parse_hex_component(&expand(chars[1])),
                parse_hex_component(&expand(chars[2])),
                parse_hex_component(&expand(chars[3])),
            )
        }
        6 => (
            parse_hex_component(&digits[0..2]),
            parse_hex_component(&digits[2..4]),
            parse_hex_component(&digits[4..6]),
            255u8,
        ),
        8 => (
            parse_hex_component(&digits[0..2]),
            parse_hex_component(&digits[2..4]),
            parse_hex_component(&digits[4..6]),
            parse_hex_component(&digits[6..8]),
        ),
        _ => return Err((format!("Invalid hex color: \"{}\".", raw), span).into()),
    };
    Ok(Expression::Color(SassColor::rgba(r, g, b, Rational64::new(i64::from(a), 255))))
}

/// Positional → named → default → rest, per the shared binding rule
/// used by both user-defined callables and the native function table.
pub fn bind_arguments(
    params: &[Parameter],
    args: &[Argument],
    caller_env: &Environment,
    callee_env: &Environment,
    span: Span,
    callable_name: &str,
) -> SassResult<()> {
    let mut positional: Vec<Expression> = Vec::new();
    let mut named: HashMap<String, Expression> = HashMap::new();

    for a in args {
        let value = evaluate(&a.value, caller_env, a.span)?;
        if a.is_rest {
            match value {
                Expression::ArgList { positional: p, keyword, .. } => {
                    positional.extend(p);
                    for (k, v) in keyword {
                        named.insert(k, v);
                    }
                }
                Expression::List { items, .. } => positional.extend(items),
                Expression::Map(map) => {
                    for (k, v) in map.iter() {
                        named.insert(value::unquoted_text(k, a.span), v.clone());
                    }
                }
                other => positional.push(other),
            }
        } else if let Some(name) = &a.name {
            named.insert(name.clone(), value);
        } else {
            positional.push(value);
        }
    }

    let mut positional = positional.into_iter();
    for param in params {
        if param.is_rest {
            let mut rest_positional: Vec<Expression> = positional.by_ref().collect();
            rest_positional.shrink_to_fit();
            let keyword: Vec<(String, Expression)> = named.drain().collect();
            callee_env.set_local(
                &param.name,
                Expression::ArgList { positional: rest_positional, keyword, separator: ListSeparator::Comma },
            );
            return Ok(());
        }
        if let Some(v) = positional.next() {
            callee_env.set_local(&param.name, v);
        } else if let Some(v) = named.remove(&param.name) {
            callee_env.set_local(&param.name, v);
        } else if let Some(default) = &param.default {
            let v = evaluate(default, callee_env, span)?;
            callee_env.set_local(&param.name, v);
        } else {
            return Err((format!("Missing argument ${} in call to {}().", param.name, callable_name), span).into());
        }
    }

    if positional.next().is_some() {
        return Err((format!("Too many arguments passed to {}().", callable_name), span).into());
    }
    if let Some((k, _)) = named.iter().next() {
        return Err((format!("{}() has no argument named ${}.", callable_name, k), span).into());
    }
    Ok(())
}

fn evaluate_function_call(name: &str, args: &[Argument], span: Span, env: &Environment) -> SassResult<Expression> {
    if let Some(callable) = env.get_function(name) {
        let _guard = DepthGuard::enter(span)?;
        let callee = env.enter_closure(&callable.closure);
        bind_arguments(&callable.params, args, env, &callee, span, name)?;
        return match run_block(&callable.body, &callee)? {
            Flow::Return(v) => Ok(v),
            Flow::Continue => Err((format!("Function {}() finished without @return.", name), span).into()),
        };
    }

    if let Some(builtin) = builtin::lookup(name) {
        let _guard = DepthGuard::enter(span)?;
        let callee = env.push_child();
        bind_arguments(&builtin.params, args, env, &callee, span, name)?;
        let ordered: Vec<Expression> = builtin
            .params
            .iter()
            .map(|p| callee.get(&p.name).unwrap_or(Expression::Null))
            .collect();
        return (builtin.func)(&ordered, &callee, span);
    }

    // Case 3 (spec §4.2 resolution order): not a user function or a
    // native builtin — treat as a plain CSS function call, arguments
    // evaluated but the call left literal (`url(...)`, `calc(...)`).
    let evaluated = args
        .iter()
        .map(|a| evaluate(&a.value, env, a.span))
        .collect::<SassResult<Vec<_>>>()?;
    Ok(Expression::UnresolvedFunctionCall { name: name.to_owned(), args: evaluated })
}

/// Runs a function body (or any other block restricted to the
/// "pure" control-flow subset: no selectors, no declarations).
pub fn run_block(block: &Block, env: &Environment) -> SassResult<Flow> {
    for stmt in &block.children {
        match run_statement(stmt, env)? {
            Flow::Continue => {}
            ret @ Flow::Return(_) => return Ok(ret),
        }
    }
    Ok(Flow::Continue)
}

fn run_statement(stmt: &Statement, env: &Environment) -> SassResult<Flow> {
    match stmt {
        Statement::Assignment { name, value, is_guarded, is_global, span } => {
            run_assignment(name, value, *is_guarded, *is_global, *span, env)?;
            Ok(Flow::Continue)
        }
        Statement::If { predicate, consequent, alternative, span } => {
            if value::is_true(&evaluate(predicate, env, *span)?) {
                run_block(consequent, &env.push_child())
            } else if let Some(alt) = alternative {
                run_statement(alt, env)
            } else {
                Ok(Flow::Continue)
            }
        }
        Statement::For { var, lower, upper, inclusive, block, span } => {
            run_for(var, lower, upper, *inclusive, block, *span, env)
        }
        Statement::Each { vars, list, block, span } => run_each(vars, list, block, *span, env),
        Statement::While { predicate, block, span } => run_while(predicate, block, *span, env),
        Statement::Return { value, span } => Ok(Flow::Return(evaluate(value, env, *span)?)),
        Statement::Warning { value, span } => {
            let text = value::to_css_string(&evaluate(value, env, *span)?, *span)?;
            log::warn!("{}", text);
            Ok(Flow::Continue)
        }
        Statement::Debug { value, span } => {
            let text = value::to_css_string(&evaluate(value, env, *span)?, *span)?;
            log::debug!("{}", text);
            Ok(Flow::Continue)
        }
        Statement::Error { value, span } => {
            let text = value::to_css_string(&evaluate(value, env, *span)?, *span)?;
            Err((text, *span).into())
        }
        Statement::Block(b) => run_block(b, env),
        Statement::Definition { name, params, block, kind, .. } => {
            let callable = Callable { params: params.clone(), body: block.clone(), closure: env.current_frame() };
            match kind {
                DefinitionKind::Mixin => env.insert_mixin(name, callable),
                DefinitionKind::Function => env.insert_function(name, callable),
            }
            Ok(Flow::Continue)
        }
        other => Err((
            "This at-rule is not allowed outside of a style rule.",
            other.span().unwrap_or_else(|| panic!("statement without a span reached pure-context execution")),
        )
            .into()),
    }
}

pub(crate) fn run_assignment(
    name: &str,
    value: &Expression,
    is_guarded: bool,
    is_global: bool,
    span: Span,
    env: &Environment,
) -> SassResult<()> {
    if is_guarded {
        let already_set = env.has(name) && !matches!(env.get(name), Some(Expression::Null));
        if already_set {
            return Ok(());
        }
    }
    let v = evaluate(value, env, span)?;
    if is_global {
        env.set_global(name, v);
    } else {
        env.set_lexical(name, v);
    }
    Ok(())
}

fn run_for(
    var: &str,
    lower: &Expression,
    upper: &Expression,
    inclusive: bool,
    block: &Block,
    span: Span,
    env: &Environment,
) -> SassResult<Flow> {
    let (lo, ..) = builtin::expect_number(&evaluate(lower, env, span)?, span)?;
    let (hi, ..) = builtin::expect_number(&evaluate(upper, env, span)?, span)?;
    let lo = lo.to_integer();
    let hi = hi.to_integer();
    let loop_env = env.push_child();
    let previous = loop_env.get(var);
    let range: Box<dyn Iterator<Item = i64>> = if lo <= hi {
        let end = if inclusive { hi + 1 } else { hi };
        Box::new(lo..end)
    } else {
        let end = if inclusive { hi - 1 } else { hi };
        Box::new((end + 1..=lo).rev())
    };
    for i in range {
        loop_env.set_local(var, Expression::number(Rational64::from_integer(i)));
        match run_block(block, &loop_env.push_child())? {
            Flow::Continue => {}
            ret @ Flow::Return(_) => return Ok(ret),
        }
    }
    loop_env.restore_local(var, previous);
    Ok(Flow::Continue)
}

fn run_each(vars: &[String], list: &Expression, block: &Block, span: Span, env: &Environment) -> SassResult<Flow> {
    let evaluated = evaluate(list, env, span)?;
    let items: Vec<Expression> = match evaluated {
        Expression::List { items, .. } => items,
        Expression::ArgList { positional, .. } => positional,
        Expression::Map(map) => map
            .iter()
            .map(|(k, v)| Expression::List {
                items: vec![k.clone(), v.clone()],
                separator: ListSeparator::Space,
                brackets: Brackets::None,
            })
            .collect(),
        other => vec![other],
    };
    let loop_env = env.push_child();
    let previous: Vec<Option<Expression>> = vars.iter().map(|v| loop_env.get(v)).collect();
    for item in items {
        bind_each_vars(vars, &item, &loop_env);
        match run_block(block, &loop_env.push_child())? {
            Flow::Continue => {}
            ret @ Flow::Return(_) => return Ok(ret),
        }
    }
    for (v, prev) in vars.iter().zip(previous) {
        loop_env.restore_local(v, prev);
    }
    Ok(Flow::Continue)
}

fn bind_each_vars(vars: &[String], item: &Expression, env: &Environment) {
    if vars.len() == 1 {
        env.set_local(&vars[0], item.clone());
        return;
    }
    let parts: Vec<Expression> = match item {
        Expression::List { items, .. } => items.clone(),
        other => vec![other.clone()],
    };
    for (i, name) in vars.iter().enumerate() {
        env.set_local(name, parts.get(i).cloned().unwrap_or(Expression::Null));
    }
}

fn run_while(predicate: &Expression, block: &Block, span: Span, env: &Environment) -> SassResult<Flow> {
    let _guard = DepthGuard::enter(span)?;
    while value::is_true(&evaluate(predicate, env, span)?) {
        match run_block(block, &env.push_child())? {
            Flow::Continue => {}
            ret @ Flow::Return(_) => return Ok(ret),
        }
    }
    Ok(Flow::Continue)
}
