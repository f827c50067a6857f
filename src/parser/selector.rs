//! Selector-prelude grammar, split into its own file the way
//! `value.rs` is split out — both are `impl Parser` blocks living
//! alongside `mod.rs`'s core `eat_*` machinery rather than free
//! functions over bare text, so they can mint sub-parsers that share
//! the compile's one `CodeMap` (`Parser::sub_parser`).
//!
//! A prelude reaches here only after `read_prelude` has already
//! established it's selector-shaped (not a declaration); `parse_prelude`
//! is the single entry point, dispatching to the interpolation-aware
//! schema path when the text contains `#{`.

use codemap::Span;

use crate::ast::expression::Expression;
use crate::common::{AttrMatcher, Combinator};
use crate::error::SassResult;
use crate::selector::{
    ComplexComponent, ComplexSelector, CompoundSelector, SelectorList, SelectorOrSchema,
    SelectorSchema, SimpleSelector,
};

use super::Parser;

pub fn parse_prelude(parser: &Parser, text: &str, span: Span) -> SassResult<SelectorOrSchema> {
    if text.contains("#{") {
        let contents = schema_expr(parser, text, span)?;
        return Ok(SelectorOrSchema::Schema(SelectorSchema { contents }));
    }
    let mut sub = parser.sub_parser(text);
    let list = sub.eat_selector_list()?;
    Ok(SelectorOrSchema::List(list))
}

/// Scans `text` splitting on `#{...}` interpolants, the same fragment
/// shape `eat_ident_like`/string parsing use, but over the whole
/// selector text rather than one identifier.
fn schema_expr(parser: &Parser, text: &str, _span: Span) -> SassResult<Expression> {
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
    if !literal.is_empty() || fragments.is_empty() {
        fragments.push(Expression::StringConstant(literal));
    }
    Ok(Expression::StringSchema {
        fragments,
        quote: crate::common::QuoteKind::None,
    })
}

impl Parser {
    pub(crate) fn eat_selector_list(&mut self) -> SassResult<SelectorList> {
        let mut items = vec![self.eat_complex_selector()?];
        loop {
            self.devour_whitespace();
            if self.consume_char_if(',') {
                self.devour_whitespace();
                items.push(self.eat_complex_selector()?);
            } else {
                break;
            }
        }
        Ok(SelectorList::new(items))
    }

    fn eat_complex_selector(&mut self) -> SassResult<ComplexSelector> {
        self.devour_whitespace();
        let mut components = vec![ComplexComponent::Compound(self.eat_compound_selector()?)];
        loop {
            let had_space = self.eat_selector_whitespace();
            let combinator = match self.peek().map(|t| t.kind) {
                Some('>') => Some(Combinator::Child),
                Some('+') => Some(Combinator::NextSibling),
                Some('~') => Some(Combinator::FollowingSibling),
                _ => None,
            };
            if let Some(comb) = combinator {
                self.bump();
                self.devour_whitespace();
                components.push(ComplexComponent::Combinator(comb));
                components.push(ComplexComponent::Compound(self.eat_compound_selector()?));
                continue;
            }
            match self.peek().map(|t| t.kind) {
                Some(',') | None => break,
                _ if had_space => {
                    components.push(ComplexComponent::Combinator(Combinator::Descendant));
                    components.push(ComplexComponent::Compound(self.eat_compound_selector()?));
                }
                _ => break,
            }
        }
        Ok(ComplexSelector::new(components))
    }

    fn eat_selector_whitespace(&mut self) -> bool {
        let had = matches!(self.peek(), Some(t) if t.kind.is_whitespace());
        self.devour_whitespace();
        had
    }

    fn eat_compound_selector(&mut self) -> SassResult<CompoundSelector> {
        let mut items = Vec::new();
        loop {
            match self.peek().map(|t| t.kind) {
                Some('*') => {
                    self.bump();
                    items.push(SimpleSelector::Universal);
                }
                Some('.') => {
                    self.bump();
                    items.push(SimpleSelector::Class(self.eat_ident_raw()?));
                }
                Some('#') => {
                    self.bump();
                    items.push(SimpleSelector::Id(self.eat_ident_raw()?));
                }
                Some('%') => {
                    self.bump();
                    items.push(SimpleSelector::Placeholder(self.eat_ident_raw()?));
                }
                Some('&') => {
                    self.bump();
                    items.push(SimpleSelector::Parent);
                }
                Some('[') => items.push(self.eat_attribute_selector()?),
                Some(':') => items.push(self.eat_pseudo_selector()?),
                Some(c) if Self::is_ident_start(c) => {
                    let first = self.eat_ident_raw()?;
                    if self.matches_char('|') && self.peek_nth(1).map(|t| t.kind) != Some('=') {
                        self.bump();
                        let local = self.eat_ident_raw()?;
                        items.push(SimpleSelector::Type { name: local, namespace: Some(first) });
                    } else {
                        items.push(SimpleSelector::Type { name: first, namespace: None });
                    }
                }
                _ => break,
            }
        }
        if items.is_empty() {
            return Err(("expected selector.", self.current_span()).into());
        }
        Ok(CompoundSelector::new(items))
    }

    fn eat_attribute_selector(&mut self) -> SassResult<SimpleSelector> {
        self.bump(); // '['
        self.devour_whitespace();
        let first = self.eat_ident_raw()?;
        self.devour_whitespace();
        let (namespace, name) = if self.matches_char('|') && self.peek_nth(1).map(|t| t.kind) != Some('=') {
            self.bump();
            (Some(first), self.eat_ident_raw()?)
        } else {
            (None, first)
        };
        self.devour_whitespace();
        let matcher = match self.peek().map(|t| t.kind) {
            Some('=') => {
                self.bump();
                Some(AttrMatcher::Equals)
            }
            Some('~') if self.peek_nth(1).map(|t| t.kind) == Some('=') => {
                self.bump();
                self.bump();
                Some(AttrMatcher::Includes)
            }
            Some('|') if self.peek_nth(1).map(|t| t.kind) == Some('=') => {
                self.bump();
                self.bump();
                Some(AttrMatcher::DashMatch)
            }
            Some('^') if self.peek_nth(1).map(|t| t.kind) == Some('=') => {
                self.bump();
                self.bump();
                Some(AttrMatcher::Prefix)
            }
            Some('$') if self.peek_nth(1).map(|t| t.kind) == Some('=') => {
                self.bump();
                self.bump();
                Some(AttrMatcher::Suffix)
            }
            Some('*') if self.peek_nth(1).map(|t| t.kind) == Some('=') => {
                self.bump();
                self.bump();
                Some(AttrMatcher::Substring)
            }
            _ => None,
        };
        self.devour_whitespace();
        let value = if matcher.is_some() {
            let v = match self.peek().map(|t| t.kind) {
                Some('"') | Some('\'') => self.eat_quoted_literal()?,
                _ => self.eat_ident_raw()?,
            };
            Some(v)
        } else {
            None
        };
        self.devour_whitespace();
        // optional case-sensitivity flag (`i`/`s`), accepted and dropped
        if matches!(self.peek().map(|t| t.kind), Some('i') | Some('s') | Some('I') | Some('S'))
            && matches!(self.peek_nth(1).map(|t| t.kind), Some(']'))
        {
            self.bump();
            self.devour_whitespace();
        }
        self.expect_char(']')?;
        Ok(SimpleSelector::Attribute { name, namespace, matcher, value })
    }

    fn eat_pseudo_selector(&mut self) -> SassResult<SimpleSelector> {
        self.bump(); // ':'
        let is_element = self.consume_char_if(':');
        let name = self.eat_ident_raw()?;
        let argument = if self.matches_char('(') {
            self.bump();
            let mut depth = 1i32;
            let mut arg = String::new();
            loop {
                match self.bump() {
                    Some(t) if t.kind == '(' => {
                        depth += 1;
                        arg.push(t.kind);
                    }
                    Some(t) if t.kind == ')' => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                        arg.push(t.kind);
                    }
                    Some(t) => arg.push(t.kind),
                    None => return Err(("expected \")\".", self.eof_span()).into()),
                }
            }
            Some(arg)
        } else {
            None
        };
        Ok(SimpleSelector::Pseudo { name, is_element, argument })
    }
}
