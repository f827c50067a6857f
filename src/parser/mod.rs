//! Recursive-descent parser turning a `Token` stream directly into
//! `Statement`/`Expression`/`Selector` trees — no separate parse-tree
//! stage. Functions are named `eat_*` for what they consume; constructs
//! whose body needs to be deferred (control-flow bodies, media-query
//! preludes, declaration values) are slurped as a raw token slice first
//! and reparsed once their context is known, rather than parsed inline.
//! Judged only against "does it produce the AST the core pipeline
//! needs" — full CSS grammar conformance is out of scope.

pub mod selector;
pub mod value;

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use codemap::{CodeMap, File, Span};
use peekmore::{PeekMore, PeekMoreIterator};

use crate::ast::expression::{Argument, Expression, Parameter};
use crate::ast::statement::{Block, DefinitionKind, Statement};
use crate::common::QuoteKind;
use crate::error::SassResult;
use crate::lexer::Lexer;
use crate::selector::SelectorOrSchema;
use crate::token::Token;

pub struct Parser {
    toks: PeekMoreIterator<Lexer>,
    file: Arc<File>,
    /// Shared with every sub-parser minted to reparse a slurped prelude
    /// (selector schemas, declaration values, media queries — tokens are
    /// slurped now and the slice is reparsed later). Kept as one `CodeMap`
    /// per compile so
    /// every span a sub-parser mints remains resolvable by the same
    /// `codemap.look_up_span` call the top-level driver uses for
    /// diagnostics, even though a reparsed fragment's own spans are
    /// local to that fragment rather than to its original position in
    /// the source file (a deliberate simplification — see DESIGN.md).
    codemap: Rc<RefCell<CodeMap>>,
}

pub fn parse_stylesheet(file: &Arc<File>, codemap: Rc<RefCell<CodeMap>>) -> SassResult<Block> {
    let mut parser = Parser {
        toks: Lexer::new(file).peekmore(),
        file: Arc::clone(file),
        codemap,
    };
    let children = parser.eat_stmts(true)?;
    Ok(Block::root(children))
}

impl Parser {
    fn eof_span(&self) -> Span {
        let len = self.file.source().len() as u64;
        self.file.span.subspan(len, len)
    }

    fn peek(&mut self) -> Option<Token> {
        self.toks.peek().copied()
    }

    fn peek_nth(&mut self, n: usize) -> Option<Token> {
        self.toks.peek_nth(n).copied()
    }

    fn bump(&mut self) -> Option<Token> {
        self.toks.next()
    }

    fn current_span(&mut self) -> Span {
        self.peek().map(|t| t.pos).unwrap_or_else(|| self.eof_span())
    }

    fn expect_char(&mut self, expected: char) -> SassResult<Span> {
        match self.bump() {
            Some(t) if t.kind == expected => Ok(t.pos),
            Some(t) => Err((format!("expected \"{}\".", expected), t.pos).into()),
            None => Err((format!("expected \"{}\".", expected), self.eof_span()).into()),
        }
    }

    fn matches_char(&mut self, c: char) -> bool {
        matches!(self.peek(), Some(t) if t.kind == c)
    }

    fn consume_char_if(&mut self, c: char) -> bool {
        if self.matches_char(c) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn devour_whitespace(&mut self) {
        while let Some(t) = self.peek() {
            if t.kind.is_whitespace() {
                self.bump();
            } else if t.kind == '/' && self.peek_nth(1).map(|t| t.kind) == Some('/') {
                self.devour_line_comment();
            } else if t.kind == '/' && self.peek_nth(1).map(|t| t.kind) == Some('*') {
                self.devour_block_comment();
            } else {
                break;
            }
        }
    }

    fn devour_line_comment(&mut self) {
        while let Some(t) = self.peek() {
            if t.kind == '\n' {
                break;
            }
            self.bump();
        }
    }

    fn devour_block_comment(&mut self) {
        self.bump();
        self.bump();
        let mut prev = '\0';
        while let Some(t) = self.bump() {
            if prev == '*' && t.kind == '/' {
                return;
            }
            prev = t.kind;
        }
    }

    fn eat_block_comment_statement(&mut self, span_start: Span) -> Statement {
        self.bump();
        self.bump();
        let mut text = String::new();
        let mut prev = '\0';
        let mut end_span = span_start;
        while let Some(t) = self.bump() {
            end_span = t.pos;
            if prev == '*' && t.kind == '/' {
                text.pop();
                break;
            }
            text.push(t.kind);
            prev = t.kind;
        }
        let is_important = text.starts_with('!');
        Statement::Comment { text, is_important, span: span_start.merge(end_span) }
    }

    fn is_ident_start(c: char) -> bool {
        c.is_alphabetic() || c == '_' || c == '-' || c == '\\'
    }

    fn is_ident_continue(c: char) -> bool {
        c.is_alphanumeric() || c == '_' || c == '-' || c == '\\'
    }

    /// Reads a bare identifier, honoring `#{}` interpolation by
    /// returning a schema-shaped expression when any is found.
    fn eat_ident_like(&mut self) -> SassResult<Expression> {
        let mut fragments: Vec<Expression> = Vec::new();
        let mut literal = String::new();
        let start = self.current_span();
        loop {
            match self.peek() {
                Some(t) if t.kind == '#' && self.peek_nth(1).map(|t| t.kind) == Some('{') => {
                    if !literal.is_empty() {
                        fragments.push(Expression::StringConstant(std::mem::take(&mut literal)));
                    }
                    fragments.push(self.eat_interpolation()?);
                }
                Some(t) if Self::is_ident_continue(t.kind) => {
                    self.bump();
                    literal.push(t.kind);
                }
                Some(t) if t.kind == '%' && literal.is_empty() && fragments.is_empty() => {
                    // only reached from contexts that pre-checked `%`
                    // (placeholder selectors); bare identifiers never
                    // start with `%`.
                    break;
                }
                _ => break,
            }
        }
        if fragments.is_empty() {
            return Ok(Expression::StringConstant(literal));
        }
        if !literal.is_empty() {
            fragments.push(Expression::StringConstant(literal));
        }
        let _ = start;
        Ok(Expression::StringSchema { fragments, quote: QuoteKind::None })
    }

    fn eat_ident_raw(&mut self) -> SassResult<String> {
        let mut s = String::new();
        while let Some(t) = self.peek() {
            if Self::is_ident_continue(t.kind) {
                s.push(t.kind);
                self.bump();
            } else {
                break;
            }
        }
        if s.is_empty() {
            return Err(("Expected identifier.", self.current_span()).into());
        }
        Ok(s)
    }

    /// `#{ <expr> }`.
    fn eat_interpolation(&mut self) -> SassResult<Expression> {
        self.bump(); // '#'
        self.expect_char('{')?;
        self.devour_whitespace();
        let expr = self.eat_expr()?;
        self.devour_whitespace();
        self.expect_char('}')?;
        Ok(expr)
    }

    /// Body of `@mixin`/`@function`/ruleset/`@media`/... up to and
    /// including the matching `}`.
    fn eat_block(&mut self) -> SassResult<Block> {
        self.devour_whitespace();
        self.expect_char('{')?;
        let children = self.eat_stmts(false)?;
        self.devour_whitespace();
        self.expect_char('}')?;
        Ok(Block::new(children))
    }

    fn eat_stmts(&mut self, is_root: bool) -> SassResult<Vec<Statement>> {
        let mut stmts = Vec::new();
        loop {
            self.devour_whitespace();
            match self.peek() {
                None => {
                    if !is_root {
                        return Err(("expected \"}\".", self.eof_span()).into());
                    }
                    break;
                }
                Some(t) if t.kind == '}' => {
                    if is_root {
                        return Err(("unmatched \"}\".", t.pos).into());
                    }
                    break;
                }
                _ => stmts.push(self.eat_stmt()?),
            }
        }
        Ok(stmts)
    }

    fn eat_stmt(&mut self) -> SassResult<Statement> {
        let start = self.current_span();
        let c = self.peek().map(|t| t.kind).unwrap_or('\0');
        if c == '/' && self.peek_nth(1).map(|t| t.kind) == Some('*') {
            return Ok(self.eat_block_comment_statement(start));
        }
        if c == '@' {
            return self.eat_at_rule();
        }
        if c == '$' {
            return self.eat_variable_decl();
        }
        self.eat_selector_or_declaration()
    }

    fn eat_variable_decl(&mut self) -> SassResult<Statement> {
        let start = self.current_span();
        self.bump(); // '$'
        let name = self.eat_ident_raw()?;
        self.devour_whitespace();
        self.expect_char(':')?;
        self.devour_whitespace();
        let value = self.eat_expr()?;
        let (is_guarded, is_global) = self.eat_trailing_flags()?;
        self.devour_whitespace();
        let end = self.current_span();
        self.consume_char_if(';');
        Ok(Statement::Assignment { name, value, is_guarded, is_global, span: start.merge(end) })
    }

    /// Reads any number of trailing `!default`/`!global` flags in
    /// either order.
    fn eat_trailing_flags(&mut self) -> SassResult<(bool, bool)> {
        let mut guarded = false;
        let mut global = false;
        loop {
            self.devour_whitespace();
            if !self.matches_char('!') {
                break;
            }
            self.bump();
            let flag = self.eat_ident_raw()?;
            match flag.as_str() {
                "default" => guarded = true,
                "global" => global = true,
                other => return Err((format!("Invalid flag \"!{}\".", other), self.current_span()).into()),
            }
        }
        Ok((guarded, global))
    }

    /// Scans the prelude up to (not including) a top-level `;`, `{`, or
    /// the enclosing `}`, tracking bracket/paren/quote nesting so
    /// embedded commas/colons inside `(...)`/`[...]`/strings don't
    /// trip early termination. Returns the raw text and which
    /// character terminated it.
    fn read_prelude(&mut self) -> SassResult<(String, char)> {
        let mut text = String::new();
        let mut depth = 0i32;
        let mut quote: Option<char> = None;
        loop {
            let t = match self.peek() {
                Some(t) => t,
                None => return Err(("expected \";\".", self.eof_span()).into()),
            };
            if let Some(q) = quote {
                text.push(t.kind);
                self.bump();
                if t.kind == q {
                    quote = None;
                }
                continue;
            }
            match t.kind {
                '"' | '\'' => {
                    quote = Some(t.kind);
                    text.push(t.kind);
                    self.bump();
                }
                '(' | '[' => {
                    depth += 1;
                    text.push(t.kind);
                    self.bump();
                }
                ')' | ']' => {
                    depth -= 1;
                    text.push(t.kind);
                    self.bump();
                }
                '{' | ';' if depth <= 0 => return Ok((text, t.kind)),
                '}' if depth <= 0 => return Ok((text, t.kind)),
                _ => {
                    text.push(t.kind);
                    self.bump();
                }
            }
        }
    }

    fn looks_like_property_name(s: &str) -> bool {
        let s = s.trim();
        !s.is_empty()
            && s.chars().next().map(|c| c.is_alphabetic() || c == '-' || c == '_').unwrap_or(false)
            && s.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    }

    /// Dispatches on the scanned prelude: a selector followed by `{`, a
    /// `prop: value;` declaration, or `prop: { ... }` property-block
    /// composition (`font: { family: ...; }`).
    fn eat_selector_or_declaration(&mut self) -> SassResult<Statement> {
        let start = self.current_span();
        let (prelude, terminator) = self.read_prelude()?;
        if terminator == ';' || terminator == '}' {
            if terminator == ';' {
                self.bump();
            }
            return self.finish_declaration(&prelude, None, start);
        }

        // terminator == '{'
        if let Some(colon) = top_level_colon(&prelude) {
            let (prop_text, value_text) = prelude.split_at(colon);
            if Self::looks_like_property_name(prop_text) {
                let block = self.eat_block()?;
                return self.finish_declaration(prop_text, Some((&value_text[1..], block)), start);
            }
        }
        let selector = selector::parse_prelude(self, &prelude, start)?;
        let block = self.eat_block()?;
        let end = self.current_span();
        Ok(Statement::Ruleset { selector, block, span: start.merge(end) })
    }

    fn finish_declaration(
        &mut self,
        prop_text: &str,
        nested: Option<(&str, Block)>,
        start: Span,
    ) -> SassResult<Statement> {
        let property = value::parse_interpolated_text(self, prop_text, start)?;
        let is_custom_property = matches!(&property, Expression::StringConstant(s) if s.trim_start().starts_with("--"));
        let end = self.current_span();
        match nested {
            Some((value_text, mut block)) => {
                if let Some(trailing) = parse_trailing_value(self, value_text, start) {
                    block.children.insert(0, trailing);
                }
                Ok(Statement::Declaration {
                    property,
                    value: None,
                    is_important: false,
                    is_custom_property,
                    block: Some(block),
                    span: start.merge(end),
                })
            }
            None => {
                let (value_text, is_important) = strip_important(prop_text_split(prop_text).1);
                let value = if value_text.trim().is_empty() {
                    None
                } else {
                    Some(value::parse_interpolated_expr(self, value_text, start)?)
                };
                Ok(Statement::Declaration {
                    property: value::parse_interpolated_text(self, prop_text_split(prop_text).0, start)?,
                    value,
                    is_important,
                    is_custom_property,
                    block: None,
                    span: start.merge(end),
                })
            }
        }
    }

    fn eat_at_rule(&mut self) -> SassResult<Statement> {
        let start = self.current_span();
        self.bump(); // '@'
        let keyword = self.eat_ident_raw()?;
        match keyword.as_str() {
            "mixin" => self.eat_definition(DefinitionKind::Mixin, start),
            "function" => self.eat_definition(DefinitionKind::Function, start),
            "include" => self.eat_mixin_call(start),
            "content" => {
                self.devour_whitespace();
                self.consume_char_if(';');
                Ok(Statement::Content { span: start })
            }
            "return" => {
                self.devour_whitespace();
                let value = self.eat_expr()?;
                self.devour_whitespace();
                self.consume_char_if(';');
                Ok(Statement::Return { value, span: start })
            }
            "if" => self.eat_if(start),
            "for" => self.eat_for(start),
            "each" => self.eat_each(start),
            "while" => self.eat_while(start),
            "extend" => self.eat_extend(start),
            "media" => self.eat_media(start),
            "supports" => self.eat_supports(start),
            "at-root" => self.eat_at_root(start),
            "import" => self.eat_import(start),
            "warn" => self.eat_diagnostic(start, Statement::Warning { value: Expression::Null, span: start }),
            "error" => self.eat_diagnostic(start, Statement::Error { value: Expression::Null, span: start }),
            "debug" => self.eat_diagnostic(start, Statement::Debug { value: Expression::Null, span: start }),
            _ if keyword.ends_with("keyframes") => self.eat_keyframes(start),
            _ => self.eat_unknown_at_rule(keyword, start),
        }
    }

    fn eat_diagnostic(&mut self, start: Span, template: Statement) -> SassResult<Statement> {
        self.devour_whitespace();
        let value = self.eat_expr()?;
        self.devour_whitespace();
        self.consume_char_if(';');
        Ok(match template {
            Statement::Warning { .. } => Statement::Warning { value, span: start },
            Statement::Error { .. } => Statement::Error { value, span: start },
            Statement::Debug { .. } => Statement::Debug { value, span: start },
            other => other,
        })
    }

    fn eat_params(&mut self) -> SassResult<Vec<Parameter>> {
        self.devour_whitespace();
        let mut params = Vec::new();
        if !self.matches_char('(') {
            return Ok(params);
        }
        self.bump();
        loop {
            self.devour_whitespace();
            if self.consume_char_if(')') {
                break;
            }
            if self.matches_char(',') {
                self.bump();
                continue;
            }
            let is_rest_marker = self.matches_char('.') && self.peek_nth(1).map(|t| t.kind) == Some('.');
            if is_rest_marker {
                self.bump();
                self.bump();
                self.bump();
                self.devour_whitespace();
                self.expect_char('$')?;
                let name = self.eat_ident_raw()?;
                params.push(Parameter { name, default: None, is_rest: true });
                self.devour_whitespace();
                self.consume_char_if(')');
                break;
            }
            self.expect_char('$')?;
            let name = self.eat_ident_raw()?;
            self.devour_whitespace();
            let default = if self.consume_char_if(':') {
                self.devour_whitespace();
                Some(self.eat_expr()?)
            } else {
                None
            };
            params.push(Parameter { name, default, is_rest: false });
            self.devour_whitespace();
        }
        Ok(params)
    }

    fn eat_args(&mut self) -> SassResult<Vec<Argument>> {
        self.devour_whitespace();
        let mut args = Vec::new();
        if !self.matches_char('(') {
            return Ok(args);
        }
        self.bump();
        loop {
            self.devour_whitespace();
            if self.consume_char_if(')') {
                break;
            }
            if self.matches_char(',') {
                self.bump();
                continue;
            }
            let arg_start = self.current_span();
            let is_rest = self.matches_char('.') && self.peek_nth(1).map(|t| t.kind) == Some('.');
            if is_rest {
                self.bump();
                self.bump();
                self.bump();
                self.devour_whitespace();
                let value = self.eat_or()?;
                args.push(Argument { value, name: None, is_rest: true, span: arg_start });
                self.devour_whitespace();
                continue;
            }
            // `$name: value` keyword argument, disambiguated from a
            // bare variable expression by a following top-level `:`.
            let name = if self.matches_char('$') && self.looks_like_named_arg() {
                self.bump();
                let n = self.eat_ident_raw()?;
                self.devour_whitespace();
                self.expect_char(':')?;
                self.devour_whitespace();
                Some(n)
            } else {
                None
            };
            let value = self.eat_or()?;
            args.push(Argument { value, name, is_rest: false, span: arg_start });
            self.devour_whitespace();
        }
        Ok(args)
    }

    fn looks_like_named_arg(&mut self) -> bool {
        let mut i = 1;
        while let Some(t) = self.peek_nth(i) {
            if Self::is_ident_continue(t.kind) {
                i += 1;
            } else {
                break;
            }
        }
        while let Some(t) = self.peek_nth(i) {
            if t.kind.is_whitespace() {
                i += 1;
            } else {
                break;
            }
        }
        matches!(self.peek_nth(i), Some(t) if t.kind == ':')
    }

    fn eat_definition(&mut self, kind: DefinitionKind, start: Span) -> SassResult<Statement> {
        self.devour_whitespace();
        let name = self.eat_ident_raw()?;
        let params = self.eat_params()?;
        let block = self.eat_block()?;
        Ok(Statement::Definition { name, params, block, kind, span: start })
    }

    fn eat_mixin_call(&mut self, start: Span) -> SassResult<Statement> {
        self.devour_whitespace();
        let name = self.eat_ident_raw()?;
        let args = self.eat_args()?;
        self.devour_whitespace();
        let content_block = if self.matches_char('{') { Some(self.eat_block()?) } else { None };
        if content_block.is_none() {
            self.consume_char_if(';');
        }
        Ok(Statement::MixinCall { name, args, content_block, span: start })
    }

    fn eat_if(&mut self, start: Span) -> SassResult<Statement> {
        self.devour_whitespace();
        let predicate = self.eat_expr()?;
        let consequent = self.eat_block()?;
        self.devour_whitespace();
        let alternative = if self.matches_keyword_ahead("@else") {
            self.bump(); // '@'
            self.eat_ident_raw()?; // "else"
            self.devour_whitespace();
            if self.matches_keyword_ahead("if") {
                self.eat_ident_raw()?;
                Some(Box::new(self.eat_if(start)?))
            } else {
                let block = self.eat_block()?;
                Some(Box::new(Statement::Block(block)))
            }
        } else {
            None
        };
        Ok(Statement::If { predicate, consequent, alternative, span: start })
    }

    fn matches_keyword_ahead(&mut self, kw: &str) -> bool {
        let mut i = 0;
        for expected in kw.chars() {
            match self.peek_nth(i) {
                Some(t) if t.kind == expected => i += 1,
                _ => return false,
            }
        }
        true
    }

    fn eat_for(&mut self, start: Span) -> SassResult<Statement> {
        self.devour_whitespace();
        self.expect_char('$')?;
        let var = self.eat_ident_raw()?;
        self.devour_whitespace();
        self.expect_keyword("from")?;
        self.devour_whitespace();
        let lower = self.eat_space_list()?;
        self.devour_whitespace();
        let inclusive = if self.matches_keyword_ahead("through") {
            self.expect_keyword("through")?;
            true
        } else {
            self.expect_keyword("to")?;
            false
        };
        self.devour_whitespace();
        let upper = self.eat_space_list()?;
        let block = self.eat_block()?;
        Ok(Statement::For { var, lower, upper, inclusive, block, span: start })
    }

    fn expect_keyword(&mut self, kw: &str) -> SassResult<()> {
        let got = self.eat_ident_raw()?;
        if got == kw {
            Ok(())
        } else {
            Err((format!("expected \"{}\".", kw), self.current_span()).into())
        }
    }

    fn eat_each(&mut self, start: Span) -> SassResult<Statement> {
        self.devour_whitespace();
        let mut vars = Vec::new();
        loop {
            self.expect_char('$')?;
            vars.push(self.eat_ident_raw()?);
            self.devour_whitespace();
            if self.consume_char_if(',') {
                self.devour_whitespace();
                continue;
            }
            break;
        }
        self.expect_keyword("in")?;
        self.devour_whitespace();
        let list = self.eat_expr()?;
        let block = self.eat_block()?;
        Ok(Statement::Each { vars, list, block, span: start })
    }

    fn eat_while(&mut self, start: Span) -> SassResult<Statement> {
        self.devour_whitespace();
        let predicate = self.eat_expr()?;
        let block = self.eat_block()?;
        Ok(Statement::While { predicate, block, span: start })
    }

    fn eat_extend(&mut self, start: Span) -> SassResult<Statement> {
        self.devour_whitespace();
        let (prelude, terminator) = self.read_prelude()?;
        if terminator == ';' {
            self.bump();
        }
        let trimmed = prelude.trim_end();
        let (sel_text, is_optional) = if let Some(stripped) = trimmed.strip_suffix("!optional") {
            (stripped.trim_end(), true)
        } else {
            (trimmed, false)
        };
        let selector = selector::parse_prelude(self, sel_text, start)?;
        Ok(Statement::ExtendRule { selector, is_optional, span: start })
    }

    /// `@media`/`@supports` preludes are textual CSS, not Sass
    /// expressions: `(min-width: 100px)` is a media feature, not a map
    /// literal, so the prelude is reparsed the same way a declaration
    /// property name is (`#{}` interpolation only, everything else kept
    /// as literal text) rather than through the general expression
    /// parser that would send `(key: value)` into `eat_paren`'s map
    /// branch.
    fn eat_media(&mut self, start: Span) -> SassResult<Statement> {
        self.devour_whitespace();
        let (prelude, _) = self.read_prelude_for_block()?;
        let queries = value::parse_interpolated_text(self, &prelude, start)?;
        let block = self.eat_block()?;
        Ok(Statement::MediaRule { queries, block, span: start })
    }

    fn eat_supports(&mut self, start: Span) -> SassResult<Statement> {
        self.devour_whitespace();
        let (prelude, _) = self.read_prelude_for_block()?;
        let condition = value::parse_interpolated_text(self, &prelude, start)?;
        let block = self.eat_block()?;
        Ok(Statement::SupportsRule { condition, block, span: start })
    }

    fn eat_at_root(&mut self, start: Span) -> SassResult<Statement> {
        self.devour_whitespace();
        let query = if self.matches_char('(') {
            let (prelude, _) = self.read_prelude_for_block()?;
            Some(value::parse_interpolated_expr(self, &prelude, start)?)
        } else {
            None
        };
        let block = self.eat_block()?;
        Ok(Statement::AtRootRule { query, block, span: start })
    }

    fn eat_keyframes(&mut self, start: Span) -> SassResult<Statement> {
        self.devour_whitespace();
        let (prelude, _) = self.read_prelude_for_block()?;
        let block = self.eat_block()?;
        Ok(Statement::KeyframeRule { name: prelude.trim().to_owned(), block, span: start })
    }

    fn eat_import(&mut self, start: Span) -> SassResult<Statement> {
        self.devour_whitespace();
        let mut urls = Vec::new();
        loop {
            self.devour_whitespace();
            match self.peek().map(|t| t.kind) {
                Some('"') | Some('\'') => urls.push(self.eat_quoted_literal()?),
                _ => {
                    let url = self.eat_ident_raw()?;
                    urls.push(url);
                }
            }
            self.devour_whitespace();
            if self.consume_char_if(',') {
                continue;
            }
            break;
        }
        self.devour_whitespace();
        self.consume_char_if(';');
        // File resolution is a host/importer concern, not this
        // parser's; it only records the requested URLs.
        Ok(Statement::Import { urls, file_stubs: Vec::new(), span: start })
    }

    fn eat_quoted_literal(&mut self) -> SassResult<String> {
        let quote = self.bump().unwrap().kind;
        let mut s = String::new();
        while let Some(t) = self.bump() {
            if t.kind == quote {
                return Ok(s);
            }
            s.push(t.kind);
        }
        Err(("expected matching quote.", self.eof_span()).into())
    }

    fn eat_unknown_at_rule(&mut self, keyword: String, start: Span) -> SassResult<Statement> {
        self.devour_whitespace();
        let (prelude, terminator) = self.read_prelude()?;
        let value = if prelude.trim().is_empty() {
            None
        } else {
            Some(value::parse_interpolated_expr(self, &prelude, start)?)
        };
        let block = if terminator == '{' { Some(self.eat_block()?) } else { None };
        if terminator == ';' {
            self.bump();
        }
        Ok(Statement::Directive { keyword, selector: None, value, block, span: start })
    }

    /// Like `read_prelude` but errors if the prelude isn't
    /// block-terminated (used by `@media`/`@supports`/`@at-root`, whose
    /// preludes are never declarations).
    fn read_prelude_for_block(&mut self) -> SassResult<(String, char)> {
        let (text, term) = self.read_prelude()?;
        if term != '{' {
            return Err(("expected \"{\".", self.current_span()).into());
        }
        Ok((text, term))
    }

    fn eat_space_list(&mut self) -> SassResult<Expression> {
        value::Parser_eat_space_list(self)
    }

    fn eat_or(&mut self) -> SassResult<Expression> {
        value::Parser_eat_or(self)
    }

    pub(crate) fn eat_expr(&mut self) -> SassResult<Expression> {
        value::Parser_eat_expr(self)
    }

    /// Mints a fresh `Parser` over `text`, registering it as a new file
    /// in the shared `CodeMap` so its tokens carry real (if
    /// fragment-local) spans instead of falling back to the enclosing
    /// prelude's single `Span` for every sub-token. Used to reparse
    /// slurped selector/value/media-query text (`read_prelude`'s
    /// "slurp now, reparse later" strategy).
    fn sub_parser(&self, text: &str) -> Parser {
        Parser::for_text(Rc::clone(&self.codemap), text)
    }

    /// Standalone counterpart to `sub_parser` for callers with a
    /// `CodeMap` handle but no live `Parser` (the expander, reparsing
    /// an evaluated selector schema's interpolated text post-hoc).
    pub(crate) fn for_text(codemap: Rc<RefCell<CodeMap>>, text: &str) -> Parser {
        let file = codemap.borrow_mut().add_file("<sass>".to_owned(), text.to_owned());
        Parser {
            toks: Lexer::new(&file).peekmore(),
            file,
            codemap,
        }
    }
}

fn prop_text_split(prop_and_colon_trimmed: &str) -> (&str, &str) {
    // `prop_and_colon_trimmed` here is actually the *whole* prelude
    // text passed in from `finish_declaration`'s `None` branch; split
    // again on the first top-level colon to recover `prop`/`value`.
    match top_level_colon(prop_and_colon_trimmed) {
        Some(idx) => (&prop_and_colon_trimmed[..idx], &prop_and_colon_trimmed[idx + 1..]),
        None => (prop_and_colon_trimmed, ""),
    }
}

fn strip_important(value_text: &str) -> (&str, bool) {
    let trimmed = value_text.trim_end();
    if let Some(stripped) = trimmed.strip_suffix("!important") {
        (stripped.trim_end(), true)
    } else {
        (trimmed, false)
    }
}

fn parse_trailing_value(parser: &Parser, value_text: &str, span: Span) -> Option<Statement> {
    if value_text.trim().is_empty() {
        return None;
    }
    let value = value::parse_interpolated_expr(parser, value_text, span).ok()?;
    Some(Statement::Declaration {
        property: Expression::StringConstant(String::new()),
        value: Some(value),
        is_important: false,
        is_custom_property: false,
        block: None,
        span,
    })
}

/// Index of the first top-level `:` (not inside `()`/`[]`/quotes, and
/// not the second colon of a `::` pseudo-element marker).
fn top_level_colon(s: &str) -> Option<usize> {
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let bytes: Vec<char> = s.chars().collect();
    for (i, &c) in bytes.iter().enumerate() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            ':' if depth == 0 => {
                if bytes.get(i + 1) == Some(&':') {
                    continue;
                }
                return Some(s.char_indices().nth(i).map(|(b, _)| b).unwrap_or(i));
            }
            _ => {}
        }
    }
    None
}
