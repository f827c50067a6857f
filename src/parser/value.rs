//! Value-expression grammar: precedence-climbing binary/unary
//! operators over a primary grammar of numbers, colors, strings,
//! variables, calls, lists and maps (`Expression`'s value-producing
//! variants and their operator semantics). Split into its own file the
//! way `selector.rs` is, both as additional `impl Parser` blocks.
//!
//! Binding power follows `BinOp::precedence()` exactly: `eat_or_level`
//! is the weakest (`or`), `eat_mul` the tightest (`*`/`/`/`%`), with
//! `eat_unary` and `eat_primary` underneath.

use codemap::Span;
use num_rational::Rational64;

use crate::ast::expression::{Expression, SassColor};
use crate::builtin::color_names;
use crate::common::{BinOp, Brackets, ListSeparator, QuoteKind, UnOp};
use crate::error::SassResult;
use crate::value::SassMap;

use super::Parser;

/// Forces a delayed `/` to a real quotient: `Expression::Slash` is a
/// literal CSS separator only as long as nothing else needs its value.
/// The moment it becomes the operand of another operator, or sits
/// directly inside parentheses, it must be evaluated instead of
/// round-tripped, so every place that wraps an expression in a further
/// operator or a paren group runs its operands through this first.
fn force_division(expr: Expression, span: Span) -> Expression {
    match expr {
        Expression::Slash { left, right } => Expression::Binary { op: BinOp::Div, left, right, span },
        other => other,
    }
}

/// `@mixin`/`$var: ...`/`@return`/media-query top level: a
/// comma-separated list of space-lists.
pub(crate) fn Parser_eat_expr(p: &mut Parser) -> SassResult<Expression> {
    p.devour_whitespace();
    let mut items = vec![p.eat_space_list_level()?];
    loop {
        p.devour_whitespace();
        if p.consume_char_if(',') {
            p.devour_whitespace();
            if matches!(p.peek().map(|t| t.kind), None) {
                break;
            }
            items.push(p.eat_space_list_level()?);
        } else {
            break;
        }
    }
    Ok(if items.len() == 1 {
        items.into_iter().next().unwrap()
    } else {
        Expression::List { items, separator: ListSeparator::Comma, brackets: Brackets::None }
    })
}

/// A single space-separated run of values, with no top-level comma.
pub(crate) fn Parser_eat_space_list(p: &mut Parser) -> SassResult<Expression> {
    p.eat_space_list_level()
}

/// A single `or`-precedence value: no top-level comma or space list.
pub(crate) fn Parser_eat_or(p: &mut Parser) -> SassResult<Expression> {
    p.eat_or_level()
}

/// Reparses a slurped fragment (declaration value, media query, ...)
/// that may itself contain interpolation, through a fresh sub-parser
/// sharing the compile's `CodeMap` (`Parser::sub_parser`).
pub fn parse_interpolated_expr(parser: &Parser, text: &str, _span: Span) -> SassResult<Expression> {
    let mut sub = parser.sub_parser(text);
    Parser_eat_expr(&mut sub)
}

/// Reparses a slurped fragment that's textual rather than a full
/// expression (a declaration property name): splits on `#{}` the same
/// way `eat_ident_like` does for a single identifier, but over the
/// whole fragment.
pub fn parse_interpolated_text(parser: &Parser, text: &str, _span: Span) -> SassResult<Expression> {
    let mut sub = parser.sub_parser(text);
    let mut fragments = Vec::new();
    let mut literal = String::new();
    loop {
        match sub.peek() {
            None => break,
            Some(t) if t.kind == '#' && sub.peek_nth(1).map(|t| t.kind) == Some('{') => {
                if !literal.is_empty() {
                    fragments.push(Expression::StringConstant(std::mem::take(&mut literal)));
                }
                fragments.push(sub.eat_interpolation()?);
            }
            Some(t) => {
                sub.bump();
                literal.push(t.kind);
            }
        }
    }
    if fragments.is_empty() {
        Ok(Expression::StringConstant(literal.trim().to_owned()))
    } else {
        if !literal.is_empty() {
            fragments.push(Expression::StringConstant(literal));
        }
        Ok(Expression::StringSchema { fragments, quote: QuoteKind::None })
    }
}

fn parse_decimal(s: &str) -> Option<Rational64> {
    let neg = s.starts_with('-');
    let s2 = if neg { &s[1..] } else { s };
    let (int_part, frac_part) = match s2.split_once('.') {
        Some((i, f)) => (i, f),
        None => (s2, ""),
    };
    let int_part = if int_part.is_empty() { "0" } else { int_part };
    let denom: i64 = 10i64.checked_pow(frac_part.len() as u32)?;
    let int_val: i64 = int_part.parse().ok()?;
    let frac_val: i64 = if frac_part.is_empty() { 0 } else { frac_part.parse().ok()? };
    let numer = int_val.checked_mul(denom)?.checked_add(frac_val)?;
    Some(Rational64::new(if neg { -numer } else { numer }, denom))
}

impl Parser {
    fn eat_space_list_level(&mut self) -> SassResult<Expression> {
        self.devour_whitespace();
        let mut items = vec![self.eat_or_level()?];
        loop {
            self.devour_whitespace();
            match self.peek().map(|t| t.kind) {
                None | Some(',') | Some(')') | Some(']') | Some(';') | Some('{') | Some('}') => break,
                _ => items.push(self.eat_or_level()?),
            }
        }
        Ok(Self::finish_space_group(items))
    }

    fn finish_space_group(mut items: Vec<Expression>) -> Expression {
        if items.len() == 1 {
            items.pop().unwrap()
        } else {
            Expression::List { items, separator: ListSeparator::Space, brackets: Brackets::None }
        }
    }

    fn matches_word_ahead(&mut self, kw: &str) -> bool {
        if !self.matches_keyword_ahead(kw) {
            return false;
        }
        !matches!(self.peek_nth(kw.chars().count()), Some(t) if Self::is_ident_continue(t.kind))
    }

    pub(crate) fn eat_or_level(&mut self) -> SassResult<Expression> {
        let mut left = self.eat_and()?;
        loop {
            self.devour_whitespace();
            if self.matches_word_ahead("or") {
                let op_span = self.current_span();
                self.eat_ident_raw()?;
                self.devour_whitespace();
                let right = self.eat_and()?;
                left = Expression::Binary { op: BinOp::Or, left: Box::new(left), right: Box::new(right), span: op_span };
            } else {
                break;
            }
        }
        Ok(left)
    }

    fn eat_and(&mut self) -> SassResult<Expression> {
        let mut left = self.eat_eq()?;
        loop {
            self.devour_whitespace();
            if self.matches_word_ahead("and") {
                let op_span = self.current_span();
                self.eat_ident_raw()?;
                self.devour_whitespace();
                let right = self.eat_eq()?;
                left = Expression::Binary { op: BinOp::And, left: Box::new(left), right: Box::new(right), span: op_span };
            } else {
                break;
            }
        }
        Ok(left)
    }

    fn eat_eq(&mut self) -> SassResult<Expression> {
        let mut left = self.eat_rel()?;
        loop {
            self.devour_whitespace();
            let op_span = self.current_span();
            let op = match self.peek().map(|t| t.kind) {
                Some('=') if self.peek_nth(1).map(|t| t.kind) == Some('=') => {
                    self.bump();
                    self.bump();
                    Some(BinOp::Eq)
                }
                Some('!') if self.peek_nth(1).map(|t| t.kind) == Some('=') => {
                    self.bump();
                    self.bump();
                    Some(BinOp::Neq)
                }
                _ => None,
            };
            match op {
                Some(op) => {
                    self.devour_whitespace();
                    let right = self.eat_rel()?;
                    left = Expression::Binary { op, left: Box::new(left), right: Box::new(right), span: op_span };
                }
                None => break,
            }
        }
        Ok(left)
    }

    fn eat_rel(&mut self) -> SassResult<Expression> {
        let mut left = self.eat_add()?;
        loop {
            self.devour_whitespace();
            let op_span = self.current_span();
            let op = match self.peek().map(|t| t.kind) {
                Some('>') if self.peek_nth(1).map(|t| t.kind) == Some('=') => {
                    self.bump();
                    self.bump();
                    Some(BinOp::Gte)
                }
                Some('>') => {
                    self.bump();
                    Some(BinOp::Gt)
                }
                Some('<') if self.peek_nth(1).map(|t| t.kind) == Some('=') => {
                    self.bump();
                    self.bump();
                    Some(BinOp::Lte)
                }
                Some('<') => {
                    self.bump();
                    Some(BinOp::Lt)
                }
                _ => None,
            };
            match op {
                Some(op) => {
                    self.devour_whitespace();
                    let right = self.eat_add()?;
                    left = Expression::Binary { op, left: Box::new(left), right: Box::new(right), span: op_span };
                }
                None => break,
            }
        }
        Ok(left)
    }

    fn eat_add(&mut self) -> SassResult<Expression> {
        let mut left = self.eat_mul()?;
        loop {
            self.devour_whitespace();
            let op_span = self.current_span();
            match self.peek().map(|t| t.kind) {
                Some('+') => {
                    self.bump();
                    self.devour_whitespace();
                    let right = self.eat_mul()?;
                    left = Expression::Binary {
                        op: BinOp::Add,
                        left: Box::new(force_division(left, op_span)),
                        right: Box::new(force_division(right, op_span)),
                        span: op_span,
                    };
                }
                Some('-') => {
                    self.bump();
                    self.devour_whitespace();
                    let right = self.eat_mul()?;
                    left = Expression::Binary {
                        op: BinOp::Sub,
                        left: Box::new(force_division(left, op_span)),
                        right: Box::new(force_division(right, op_span)),
                        span: op_span,
                    };
                }
                _ => break,
            }
        }
        Ok(left)
    }

    fn eat_mul(&mut self) -> SassResult<Expression> {
        let mut left = self.eat_unary()?;
        loop {
            self.devour_whitespace();
            let op_span = self.current_span();
            match self.peek().map(|t| t.kind) {
                Some('*') => {
                    self.bump();
                    self.devour_whitespace();
                    let right = self.eat_unary()?;
                    left = Expression::Binary {
                        op: BinOp::Mul,
                        left: Box::new(force_division(left, op_span)),
                        right: Box::new(force_division(right, op_span)),
                        span: op_span,
                    };
                }
                Some('%') => {
                    self.bump();
                    self.devour_whitespace();
                    let right = self.eat_unary()?;
                    left = Expression::Binary {
                        op: BinOp::Mod,
                        left: Box::new(force_division(left, op_span)),
                        right: Box::new(force_division(right, op_span)),
                        span: op_span,
                    };
                }
                Some('/') => {
                    self.bump();
                    self.devour_whitespace();
                    let right = self.eat_unary()?;
                    // A `/` between two bare number literals stays a
                    // delayed literal separator until something forces
                    // it to a real quotient (another operator, a
                    // variable operand already forces it eagerly here,
                    // or surrounding parentheses force it after the
                    // fact in `eat_paren`).
                    left = if matches!(left, Expression::Number { .. }) && matches!(right, Expression::Number { .. }) {
                        Expression::Slash { left: Box::new(left), right: Box::new(right) }
                    } else {
                        Expression::Binary {
                            op: BinOp::Div,
                            left: Box::new(force_division(left, op_span)),
                            right: Box::new(force_division(right, op_span)),
                            span: op_span,
                        }
                    };
                }
                _ => break,
            }
        }
        Ok(left)
    }

    fn eat_unary(&mut self) -> SassResult<Expression> {
        self.devour_whitespace();
        let start = self.current_span();
        if self.matches_word_ahead("not") {
            self.eat_ident_raw()?;
            self.devour_whitespace();
            let operand = self.eat_unary()?;
            return Ok(Expression::Unary { op: UnOp::Not, operand: Box::new(operand), span: start });
        }
        match self.peek().map(|t| t.kind) {
            Some('-') if matches!(self.peek_nth(1), Some(t) if t.kind.is_ascii_digit() || t.kind == '.') => {
                self.bump();
                self.eat_number(true)
            }
            Some('-') => {
                self.bump();
                let operand = self.eat_unary()?;
                Ok(Expression::Unary { op: UnOp::Minus, operand: Box::new(operand), span: start })
            }
            Some('+') if matches!(self.peek_nth(1), Some(t) if t.kind.is_ascii_digit() || t.kind == '.') => {
                self.bump();
                self.eat_number(false)
            }
            _ => self.eat_primary(),
        }
    }

    fn eat_number(&mut self, negative: bool) -> SassResult<Expression> {
        let mut raw = String::new();
        if negative {
            raw.push('-');
        }
        while matches!(self.peek(), Some(t) if t.kind.is_ascii_digit()) {
            raw.push(self.bump().unwrap().kind);
        }
        if self.matches_char('.') && matches!(self.peek_nth(1), Some(t) if t.kind.is_ascii_digit()) {
            raw.push('.');
            self.bump();
            while matches!(self.peek(), Some(t) if t.kind.is_ascii_digit()) {
                raw.push(self.bump().unwrap().kind);
            }
        }
        let value = parse_decimal(&raw)
            .ok_or_else(|| -> Box<crate::error::SassError> { (format!("Invalid number \"{}\".", raw), self.current_span()).into() })?;
        if self.matches_char('%') {
            self.bump();
            return Ok(Expression::Number { value, numer_units: vec!["%".to_owned()], denom_units: Vec::new() });
        }
        if matches!(self.peek(), Some(t) if Self::is_ident_start(t.kind)) {
            let unit = self.eat_ident_raw()?;
            return Ok(Expression::number_with_unit(value, &unit));
        }
        Ok(Expression::number(value))
    }

    fn eat_primary(&mut self) -> SassResult<Expression> {
        self.devour_whitespace();
        let start = self.current_span();
        match self.peek().map(|t| t.kind) {
            Some('#') if self.peek_nth(1).map(|t| t.kind) == Some('{') => self.eat_interpolation(),
            Some('#') => self.eat_hex_color(),
            Some('"') | Some('\'') => self.eat_quoted_string(),
            Some('$') => {
                self.bump();
                let name = self.eat_ident_raw()?;
                Ok(Expression::Variable { name, span: start })
            }
            Some('(') => self.eat_paren(),
            Some('[') => self.eat_bracketed_list(),
            Some(c) if c.is_ascii_digit() => self.eat_number(false),
            Some('.') if matches!(self.peek_nth(1), Some(t) if t.kind.is_ascii_digit()) => self.eat_number(false),
            Some(c) if Self::is_ident_start(c) => self.eat_ident_primary(),
            Some(_) => Err(("Expected expression.", start).into()),
            None => Err(("Expected expression.", self.eof_span()).into()),
        }
    }

    fn eat_hex_color(&mut self) -> SassResult<Expression> {
        let start = self.current_span();
        self.bump(); // '#'
        let mut hex = String::new();
        while hex.len() < 8 {
            match self.peek() {
                Some(t) if t.kind.is_ascii_hexdigit() => {
                    hex.push(t.kind);
                    self.bump();
                }
                _ => break,
            }
        }
        let bytes: Vec<u8> = match hex.len() {
            3 | 4 => hex
                .chars()
                .map(|c| {
                    let mut s = String::new();
                    s.push(c);
                    s.push(c);
                    u8::from_str_radix(&s, 16).unwrap_or(0)
                })
                .collect(),
            6 | 8 => {
                let chars: Vec<char> = hex.chars().collect();
                chars
                    .chunks(2)
                    .map(|pair| {
                        let s: String = pair.iter().collect();
                        u8::from_str_radix(&s, 16).unwrap_or(0)
                    })
                    .collect()
            }
            _ => return Err(("Expected hex digit.", start).into()),
        };
        let a = if bytes.len() == 4 { Rational64::new(bytes[3] as i64, 255) } else { Rational64::new(1, 1) };
        Ok(Expression::Color(SassColor::rgba(bytes[0], bytes[1], bytes[2], a)))
    }

    fn eat_quoted_string(&mut self) -> SassResult<Expression> {
        let quote_char = self.bump().unwrap().kind;
        let quote = if quote_char == '"' { QuoteKind::Double } else { QuoteKind::Single };
        let mut fragments = Vec::new();
        let mut literal = String::new();
        loop {
            match self.peek() {
                None => return Err(("Expected closing quote.", self.eof_span()).into()),
                Some(t) if t.kind == quote_char => {
                    self.bump();
                    break;
                }
                Some(t) if t.kind == '\\' => {
                    self.bump();
                    if let Some(next) = self.bump() {
                        literal.push(next.kind);
                    }
                }
                Some(t) if t.kind == '#' && self.peek_nth(1).map(|t| t.kind) == Some('{') => {
                    if !literal.is_empty() {
                        fragments.push(Expression::StringConstant(std::mem::take(&mut literal)));
                    }
                    fragments.push(self.eat_interpolation()?);
                }
                Some(t) => {
                    self.bump();
                    literal.push(t.kind);
                }
            }
        }
        if fragments.is_empty() {
            Ok(Expression::StringQuoted { value: literal, quote })
        } else {
            if !literal.is_empty() {
                fragments.push(Expression::StringConstant(literal));
            }
            Ok(Expression::StringSchema { fragments, quote })
        }
    }

    fn eat_paren(&mut self) -> SassResult<Expression> {
        let paren_span = self.current_span();
        self.bump(); // '('
        self.devour_whitespace();
        if self.consume_char_if(')') {
            return Ok(Expression::List { items: Vec::new(), separator: ListSeparator::Space, brackets: Brackets::None });
        }
        let first = self.eat_or_level()?;
        self.devour_whitespace();
        if self.consume_char_if(':') {
            self.devour_whitespace();
            let first_val = force_division(self.eat_or_level()?, paren_span);
            let mut map = SassMap::new();
            map.insert(first, first_val);
            self.devour_whitespace();
            while self.consume_char_if(',') {
                self.devour_whitespace();
                if self.matches_char(')') {
                    break;
                }
                let k = self.eat_or_level()?;
                self.devour_whitespace();
                self.expect_char(':')?;
                self.devour_whitespace();
                let v = force_division(self.eat_or_level()?, paren_span);
                map.insert(k, v);
                self.devour_whitespace();
            }
            self.expect_char(')')?;
            return Ok(Expression::Map(map));
        }

        // A value sitting directly inside parentheses is never the
        // delayed-CSS-separator reading of `/` — `(10px/2)` must
        // compute `5px`, unlike the bare `10px/2` that round-trips
        // literally in a `font:`-style declaration.
        let mut items = vec![force_division(self.finish_paren_group(first)?, paren_span)];
        self.devour_whitespace();
        while self.consume_char_if(',') {
            self.devour_whitespace();
            if self.matches_char(')') {
                break;
            }
            let next = self.eat_or_level()?;
            items.push(force_division(self.finish_paren_group(next)?, paren_span));
            self.devour_whitespace();
        }
        self.expect_char(')')?;
        if items.len() == 1 {
            Ok(items.into_iter().next().unwrap())
        } else {
            Ok(Expression::List { items, separator: ListSeparator::Comma, brackets: Brackets::None })
        }
    }

    /// Gathers further space-separated terms after the first one, up
    /// to the next top-level `,` or `)`.
    fn finish_paren_group(&mut self, first: Expression) -> SassResult<Expression> {
        let mut items = vec![first];
        loop {
            self.devour_whitespace();
            match self.peek().map(|t| t.kind) {
                Some(',') | Some(')') | None => break,
                _ => items.push(self.eat_or_level()?),
            }
        }
        Ok(Self::finish_space_group(items))
    }

    fn eat_bracketed_list(&mut self) -> SassResult<Expression> {
        self.bump(); // '['
        self.devour_whitespace();
        if self.consume_char_if(']') {
            return Ok(Expression::List { items: Vec::new(), separator: ListSeparator::Space, brackets: Brackets::Bracketed });
        }
        let first = self.eat_or_level()?;
        let mut items = vec![self.finish_bracket_group(first)?];
        self.devour_whitespace();
        while self.consume_char_if(',') {
            self.devour_whitespace();
            if self.matches_char(']') {
                break;
            }
            let next = self.eat_or_level()?;
            items.push(self.finish_bracket_group(next)?);
            self.devour_whitespace();
        }
        self.expect_char(']')?;
        let separator = if items.len() <= 1 { ListSeparator::Space } else { ListSeparator::Comma };
        Ok(Expression::List { items, separator, brackets: Brackets::Bracketed })
    }

    fn finish_bracket_group(&mut self, first: Expression) -> SassResult<Expression> {
        let mut items = vec![first];
        loop {
            self.devour_whitespace();
            match self.peek().map(|t| t.kind) {
                Some(',') | Some(']') | None => break,
                _ => items.push(self.eat_or_level()?),
            }
        }
        Ok(Self::finish_space_group(items))
    }

    fn eat_ident_primary(&mut self) -> SassResult<Expression> {
        let start = self.current_span();
        let ident_expr = self.eat_ident_like()?;
        if let Expression::StringConstant(word) = &ident_expr {
            match word.as_str() {
                "true" => return Ok(Expression::Boolean(true)),
                "false" => return Ok(Expression::Boolean(false)),
                "null" => return Ok(Expression::Null),
                _ => {}
            }
            if self.matches_char('(') {
                let name = word.clone();
                let args = self.eat_args()?;
                return Ok(Expression::FunctionCall { name, args, span: start });
            }
            if word.eq_ignore_ascii_case("transparent") {
                let (r, g, b, _) = color_names::TRANSPARENT;
                return Ok(Expression::Color(SassColor {
                    r,
                    g,
                    b,
                    a: Rational64::new(0, 1),
                    original_name: Some(word.clone()),
                }));
            }
            if let Some((r, g, b)) = color_names::lookup(word) {
                return Ok(Expression::Color(SassColor {
                    r,
                    g,
                    b,
                    a: Rational64::new(1, 1),
                    original_name: Some(word.clone()),
                }));
            }
            return Ok(Expression::StringConstant(word.clone()));
        }
        if self.matches_char('(') {
            let args = self.eat_args()?;
            return Ok(Expression::FunctionCallSchema { name: Box::new(ident_expr), args, span: start });
        }
        Ok(ident_expr)
    }
}
