//! Depth-first statement rewrite: eliminates control
//! flow, mixin calls and imports, resolves parent selectors against an
//! explicit selector stack threaded through the recursion, and collects
//! `@extend` requests into a `SubsetMap` for the next pass.
//!
//! Reuses `evaluate`/`bind_arguments`/`run_assignment` from
//! `evaluator.rs` for the parts that carry no selector context, but
//! cannot reuse `evaluator::run_block`/`run_statement` themselves: those
//! are restricted to the "pure" function-body subset and explicitly
//! reject anything selector-shaped ("This at-rule is not allowed outside
//! of a style rule."). `expand_if` walks `@if`/`@else if`/`@else`
//! branches in order and splices the first true branch's body;
//! `expand_mixin_call` binds arguments in a fresh frame over the
//! callable's captured closure and walks its body the same way a
//! function call does, but additionally threads the selector stack and
//! `@content` binding that a mixin body (unlike a function body) needs.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use codemap::{CodeMap, Span};
use num_rational::Rational64;

use crate::ast::expression::{Argument, Expression};
use crate::ast::statement::{Block, DefinitionKind, Statement};
use crate::environment::{Callable, Environment};
use crate::error::{SassError, SassResult};
use crate::evaluator::{self, Flow};
use crate::parser::Parser;
use crate::selector::{ComplexComponent, ComplexSelector, SelectorList, SelectorOrSchema, SubsetMap};
use crate::value;

thread_local! {
    static MIXIN_DEPTH: Cell<u32> = Cell::new(0);
}

/// Same bound as the evaluator's function-call depth guard
/// (); tracked separately since mixin expansion and function
/// evaluation run on different call stacks (the expander never calls
/// into `evaluator::run_block`).
const MAX_MIXIN_DEPTH: u32 = 1024;

struct MixinDepthGuard;

impl MixinDepthGuard {
    fn enter(span: Span) -> SassResult<Self> {
        MIXIN_DEPTH.with(|d| {
            let next = d.get() + 1;
            if next > MAX_MIXIN_DEPTH {
                return Err(("Maximum call stack depth exceeded.", span).into());
            }
            d.set(next);
            Ok(MixinDepthGuard)
        })
    }
}

impl Drop for MixinDepthGuard {
    fn drop(&mut self) {
        MIXIN_DEPTH.with(|d| d.set(d.get() - 1));
    }
}

pub struct Expander {
    codemap: Rc<RefCell<CodeMap>>,
    subset_map: SubsetMap,
}

impl Expander {
    pub fn new(codemap: Rc<RefCell<CodeMap>>) -> Self {
        Expander {
            codemap,
            subset_map: SubsetMap::new(),
        }
    }

    /// Expand `root` top to bottom, returning the fully static tree plus
    /// every `@extend` request collected along the way (,
    /// §4.4's "collected extensions form a subset map").
    pub fn expand(mut self, root: &Block, env: &Environment) -> SassResult<(Block, SubsetMap)> {
        let children = self.expand_block(&root.children, env, None)?;
        Ok((Block::root(children), self.subset_map))
    }

    fn expand_block(
        &mut self,
        stmts: &[Statement],
        env: &Environment,
        parent: Option<&SelectorList>,
    ) -> SassResult<Vec<Statement>> {
        let mut out = Vec::new();
        for stmt in stmts {
            self.expand_statement(stmt, env, parent, &mut out)?;
        }
        Ok(out)
    }

    fn expand_statement(
        &mut self,
        stmt: &Statement,
        env: &Environment,
        parent: Option<&SelectorList>,
        out: &mut Vec<Statement>,
    ) -> SassResult<()> {
        match stmt {
            Statement::Ruleset { selector, block, span } => {
                let resolved = self.resolve_ruleset_selector(selector, env, parent, *span)?;
                let child_env = env.push_child();
                let children = self.expand_block(&block.children, &child_env, Some(&resolved))?;
                out.push(Statement::Ruleset {
                    selector: SelectorOrSchema::List(resolved),
                    block: Block::new(children),
                    span: *span,
                });
                Ok(())
            }
            Statement::MediaRule { queries, block, span } => {
                let queries = evaluator::evaluate(queries, env, *span)?;
                let child_env = env.push_child();
                let children = self.expand_block(&block.children, &child_env, parent)?;
                out.push(Statement::MediaRule { queries, block: Block::new(children), span: *span });
                Ok(())
            }
            Statement::SupportsRule { condition, block, span } => {
                let condition = evaluator::evaluate(condition, env, *span)?;
                let child_env = env.push_child();
                let children = self.expand_block(&block.children, &child_env, parent)?;
                out.push(Statement::SupportsRule { condition, block: Block::new(children), span: *span });
                Ok(())
            }
            Statement::AtRootRule { query, block, span } => {
                let query = query.as_ref().map(|q| evaluator::evaluate(q, env, *span)).transpose()?;
                let excludes_rule = at_root_excludes_rule(query.as_ref(), *span)?;
                let child_env = env.push_child();
                let effective_parent = if excludes_rule { None } else { parent };
                let children = self.expand_block(&block.children, &child_env, effective_parent)?;
                out.push(Statement::AtRootRule { query, block: Block::new(children), span: *span });
                Ok(())
            }
            Statement::Directive { keyword, selector, value, block, span } => {
                let selector = match selector {
                    Some(SelectorOrSchema::Schema(schema)) => {
                        Some(SelectorOrSchema::List(self.evaluate_schema(&schema.contents, env, *span)?))
                    }
                    other => other.clone(),
                };
                let value = value.as_ref().map(|v| evaluator::evaluate(v, env, *span)).transpose()?;
                let block = match block {
                    Some(b) => {
                        let child_env = env.push_child();
                        Some(Block::new(self.expand_block(&b.children, &child_env, parent)?))
                    }
                    None => None,
                };
                out.push(Statement::Directive { keyword: keyword.clone(), selector, value, block, span: *span });
                Ok(())
            }
            Statement::KeyframeRule { name, block, span } => {
                // Percentage/`from`/`to` selectors inside keyframes are
                // not rulesets in the source selector grammar and never
                // inherit outer nesting, so no parent is threaded in.
                let child_env = env.push_child();
                let children = self.expand_block(&block.children, &child_env, None)?;
                out.push(Statement::KeyframeRule { name: name.clone(), block: Block::new(children), span: *span });
                Ok(())
            }
            Statement::Declaration { property, value, is_important, is_custom_property, block, span } => {
                let property = evaluator::evaluate(property, env, *span)?;
                let value = value.as_ref().map(|v| evaluator::evaluate(v, env, *span)).transpose()?;
                // Nested declaration blocks (`font: { family: ...; }`)
                // keep their own structure here; composing the
                // hyphenated property names is cssize's job.
                let block = match block {
                    Some(b) => Some(Block::new(self.expand_block(&b.children, env, parent)?)),
                    None => None,
                };
                out.push(Statement::Declaration {
                    property,
                    value,
                    is_important: *is_important,
                    is_custom_property: *is_custom_property,
                    block,
                    span: *span,
                });
                Ok(())
            }
            Statement::Assignment { name, value, is_guarded, is_global, span } => {
                evaluator::run_assignment(name, value, *is_guarded, *is_global, *span, env)?;
                Ok(())
            }
            Statement::If { predicate, consequent, alternative, span } => {
                if value::is_true(&evaluator::evaluate(predicate, env, *span)?) {
                    let taken = self.expand_block(&consequent.children, &env.push_child(), parent)?;
                    out.extend(taken);
                } else if let Some(alt) = alternative {
                    self.expand_statement(alt, env, parent, out)?;
                }
                Ok(())
            }
            Statement::For { var, lower, upper, inclusive, block, span } => {
                self.expand_for(var, lower, upper, *inclusive, block, *span, env, parent, out)
            }
            Statement::Each { vars, list, block, span } => {
                self.expand_each(vars, list, block, *span, env, parent, out)
            }
            Statement::While { predicate, block, span } => {
                self.expand_while(predicate, block, *span, env, parent, out)
            }
            Statement::Definition { name, params, block, kind, .. } => {
                let callable = Callable { params: params.clone(), body: block.clone(), closure: env.current_frame() };
                match kind {
                    DefinitionKind::Mixin => env.insert_mixin(name, callable),
                    DefinitionKind::Function => env.insert_function(name, callable),
                }
                Ok(())
            }
            Statement::MixinCall { name, args, content_block, span } => {
                self.expand_mixin_call(name, args, content_block.as_ref(), *span, env, parent, out)
            }
            Statement::Content { .. } => {
                // Absence of a bound `@content` silently yields nothing
                //.
                if let Some(content) = env.get_mixin("@content") {
                    let callee = env.enter_closure(&content.closure);
                    let children = self.expand_block(&content.body.children, &callee, parent)?;
                    out.extend(children);
                }
                Ok(())
            }
            Statement::ExtendRule { selector, is_optional, span } => {
                self.record_extend(selector, *is_optional, env, parent, *span)
            }
            Statement::Import { urls, file_stubs, span } => {
                for stub in file_stubs {
                    self.expand_statement(stub, env, parent, out)?;
                }
                if !urls.is_empty() {
                    let joined = urls
                        .iter()
                        .map(|u| format!("\"{}\"", u))
                        .collect::<Vec<_>>()
                        .join(", ");
                    out.push(Statement::Directive {
                        keyword: "import".to_owned(),
                        selector: None,
                        value: Some(Expression::StringConstant(joined)),
                        block: None,
                        span: *span,
                    });
                }
                Ok(())
            }
            Statement::ImportStub { .. } => Ok(()),
            Statement::Return { span, .. } => {
                Err(("This at-rule is not allowed outside of a function.", *span).into())
            }
            Statement::Warning { value, span } => {
                let text = value::to_css_string(&evaluator::evaluate(value, env, *span)?, *span)?;
                log::warn!("{}", text);
                Ok(())
            }
            Statement::Debug { value, span } => {
                let text = value::to_css_string(&evaluator::evaluate(value, env, *span)?, *span)?;
                log::debug!("{}", text);
                Ok(())
            }
            Statement::Error { value, span } => {
                let text = value::to_css_string(&evaluator::evaluate(value, env, *span)?, *span)?;
                Err((text, *span).into())
            }
            Statement::Comment { text, is_important, span } => {
                out.push(Statement::Comment { text: text.clone(), is_important: *is_important, span: *span });
                Ok(())
            }
            Statement::Block(b) => {
                let children = self.expand_block(&b.children, env, parent)?;
                out.extend(children);
                Ok(())
            }
            Statement::Bubble { .. } | Statement::Trace { .. } => {
                // Cssize-internal markers; never present in a freshly
                // parsed tree, so never reached here.
                Ok(())
            }
        }
    }

    fn resolve_ruleset_selector(
        &mut self,
        selector: &SelectorOrSchema,
        env: &Environment,
        parent: Option<&SelectorList>,
        span: Span,
    ) -> SassResult<SelectorList> {
        let list = match selector {
            SelectorOrSchema::List(list) => list.clone(),
            SelectorOrSchema::Schema(schema) => self.evaluate_schema(&schema.contents, env, span)?,
        };
        resolve_selector(parent, &list, span)
    }

    /// Evaluates an interpolated selector's contents to text and
    /// re-parses it as an ordinary selector list (step 1),
    /// minting a one-off sub-parser over the shared `CodeMap` the way
    /// `parser::selector`/`parser::value` do for slurped text.
    fn evaluate_schema(&self, contents: &Expression, env: &Environment, span: Span) -> SassResult<SelectorList> {
        let value = evaluator::evaluate(contents, env, span)?;
        let text = value::unquoted_text(&value, span);
        let mut parser = Parser::for_text(Rc::clone(&self.codemap), &text);
        parser.eat_selector_list()
    }

    #[allow(clippy::too_many_arguments)]
    fn expand_for(
        &mut self,
        var: &str,
        lower: &Expression,
        upper: &Expression,
        inclusive: bool,
        block: &Block,
        span: Span,
        env: &Environment,
        parent: Option<&SelectorList>,
        out: &mut Vec<Statement>,
    ) -> SassResult<()> {
        let (lo, ..) = crate::builtin::expect_number(&evaluator::evaluate(lower, env, span)?, span)?;
        let (hi, ..) = crate::builtin::expect_number(&evaluator::evaluate(upper, env, span)?, span)?;
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
            let children = self.expand_block(&block.children, &loop_env.push_child(), parent)?;
            out.extend(children);
        }
        loop_env.restore_local(var, previous);
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn expand_each(
        &mut self,
        vars: &[String],
        list: &Expression,
        block: &Block,
        span: Span,
        env: &Environment,
        parent: Option<&SelectorList>,
        out: &mut Vec<Statement>,
    ) -> SassResult<()> {
        let evaluated = evaluator::evaluate(list, env, span)?;
        let items: Vec<Expression> = match evaluated {
            Expression::List { items, .. } => items,
            Expression::ArgList { positional, .. } => positional,
            Expression::Map(map) => map
                .iter()
                .map(|(k, v)| Expression::List {
                    items: vec![k.clone(), v.clone()],
                    separator: crate::common::ListSeparator::Space,
                    brackets: crate::common::Brackets::None,
                })
                .collect(),
            other => vec![other],
        };
        let loop_env = env.push_child();
        let previous: Vec<Option<Expression>> = vars.iter().map(|v| loop_env.get(v)).collect();
        for item in items {
            bind_each_vars(vars, &item, &loop_env);
            let children = self.expand_block(&block.children, &loop_env.push_child(), parent)?;
            out.extend(children);
        }
        for (v, prev) in vars.iter().zip(previous) {
            loop_env.restore_local(v, prev);
        }
        Ok(())
    }

    fn expand_while(
        &mut self,
        predicate: &Expression,
        block: &Block,
        span: Span,
        env: &Environment,
        parent: Option<&SelectorList>,
        out: &mut Vec<Statement>,
    ) -> SassResult<()> {
        let _guard = MixinDepthGuard::enter(span)?;
        while value::is_true(&evaluator::evaluate(predicate, env, span)?) {
            let children = self.expand_block(&block.children, &env.push_child(), parent)?;
            out.extend(children);
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn expand_mixin_call(
        &mut self,
        name: &str,
        args: &[Argument],
        content_block: Option<&Block>,
        span: Span,
        env: &Environment,
        parent: Option<&SelectorList>,
        out: &mut Vec<Statement>,
    ) -> SassResult<()> {
        let _guard = MixinDepthGuard::enter(span)?;
        let callable = env
            .get_mixin(name)
            .ok_or_else(|| -> Box<SassError> { (format!("Undefined mixin: \"{}\".", name), span).into() })?;
        let callee = env.enter_closure(&callable.closure);
        evaluator::bind_arguments(&callable.params, args, env, &callee, span, name)?;
        callee.set_local("@in-mixin", Expression::Boolean(true));
        if let Some(content) = content_block {
            // Bound under a key no source identifier can spell, and
            // closing over the *caller's* frame, not the mixin's: a
            // content block sees variables visible at the `@include`
            // site.
            callee.insert_mixin(
                "@content",
                Callable { params: Vec::new(), body: content.clone(), closure: env.current_frame() },
            );
        }
        let children = self.expand_block(&callable.body.children, &callee, parent)?;
        out.extend(children);
        Ok(())
    }

    fn record_extend(
        &mut self,
        selector: &SelectorOrSchema,
        is_optional: bool,
        env: &Environment,
        parent: Option<&SelectorList>,
        span: Span,
    ) -> SassResult<()> {
        let extendee_list = match selector {
            SelectorOrSchema::List(list) => list.clone(),
            SelectorOrSchema::Schema(schema) => self.evaluate_schema(&schema.contents, env, span)?,
        };
        let extender_list = parent
            .ok_or_else(|| -> Box<SassError> { ("@extend may only be used within a style rule.", span).into() })?;
        for extendee_complex in &extendee_list.items {
            let extendee_compound = match extendee_complex.components.as_slice() {
                [ComplexComponent::Compound(c)] => c.clone(),
                _ => {
                    return Err((
                        "complex selectors may not be extended.",
                        span,
                    )
                        .into())
                }
            };
            for extender_complex in &extender_list.items {
                self.subset_map.insert(extendee_compound.clone(), extender_complex.clone(), is_optional);
            }
        }
        Ok(())
    }
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

/// The `(without: ...)`/`(with: ...)` query (parsed as a one-entry map
/// literal, since that's exactly its grammar shape) decides which
/// wrapper kinds an `@at-root` block escapes. A bare `@at-root {}` with
/// no query defaults to `without: rule` — the common "escape the
/// enclosing ruleset" usage. Recognized tags are the closed enumeration
/// DESIGN.md settles on (`rule`, `media`, `supports`, `all`).
fn at_root_excludes_rule(query: Option<&Expression>, span: Span) -> SassResult<bool> {
    let map = match query {
        None => return Ok(true),
        Some(Expression::Map(m)) => m,
        Some(_) => return Ok(true),
    };
    let mut without: Vec<String> = Vec::new();
    let mut with: Vec<String> = Vec::new();
    for (k, v) in map.iter() {
        let key = value::unquoted_text(k, span).to_ascii_lowercase();
        let tags: Vec<String> =
            value::unquoted_text(v, span).split_whitespace().map(str::to_ascii_lowercase).collect();
        for tag in &tags {
            if !matches!(tag.as_str(), "rule" | "media" | "supports" | "all") {
                return Err((format!("Invalid @at-root query: unknown tag \"{}\".", tag), span).into());
            }
        }
        match key.as_str() {
            "without" => without = tags,
            "with" => with = tags,
            other => return Err((format!("Invalid @at-root query: unknown key \"{}\".", other), span).into()),
        }
    }
    if !with.is_empty() {
        return Ok(!with.iter().any(|t| t == "all" || t == "rule"));
    }
    if without.is_empty() {
        return Ok(true);
    }
    Ok(without.iter().any(|t| t == "all" || t == "rule"))
}

/// Resolves `child` against `parent` ("parent resolution"):
/// `None` parent means top level, where a parent reference is an error;
/// otherwise every complex selector in `child` is resolved against every
/// complex selector in `parent`, producing the documented N·M Cartesian
/// product.
pub(crate) fn resolve_selector(
    parent: Option<&SelectorList>,
    child: &SelectorList,
    span: Span,
) -> SassResult<SelectorList> {
    let parent_list = match parent {
        None => {
            if child.contains_parent_ref() {
                return Err(("Top-level selectors may not contain the parent selector \"&\".", span).into());
            }
            return Ok(child.clone());
        }
        Some(p) => p,
    };
    let mut items = Vec::with_capacity(child.items.len() * parent_list.items.len().max(1));
    for c in &child.items {
        if c.contains_parent_ref() && !c.head_is_parent() {
            return Err(("\"&\" may only used at the beginning of a compound selector.", span).into());
        }
        for p in &parent_list.items {
            let resolved =
                resolve_complex(c, p).map_err(|msg| -> Box<SassError> { (msg, span).into() })?;
            items.push(resolved);
        }
    }
    Ok(SelectorList::new(items))
}

/// Splice `parent` into `child`'s head position: ordinary nesting
/// (`a { b { } }` → `a b`) when the head carries no `&`; `&`-replacement
/// otherwise, delegating the "`&` plus trailing simples" concatenation
/// case to `CompoundSelector::resolve_parent`.
fn resolve_complex(child: &ComplexSelector, parent: &ComplexSelector) -> Result<ComplexSelector, String> {
    use crate::common::Combinator;

    let head = match child.components.first() {
        Some(ComplexComponent::Compound(c)) => c,
        _ => return Err("a complex selector must begin with a compound selector.".into()),
    };
    if !head.contains_parent_ref() {
        let mut components = parent.components.clone();
        components.push(ComplexComponent::Combinator(Combinator::Descendant));
        components.extend(child.components.iter().cloned());
        return Ok(ComplexSelector::new(components));
    }
    if head.items.len() == 1 {
        let mut components = parent.components.clone();
        components.extend(child.components.iter().skip(1).cloned());
        return Ok(ComplexSelector::new(components));
    }
    let parent_tail = match parent.components.last() {
        Some(ComplexComponent::Compound(c)) => c,
        _ => return Err("\"&\" used with empty parent selector.".into()),
    };
    let resolved_head = head.resolve_parent(parent_tail)?;
    let mut components = parent.components[..parent.components.len() - 1].to_vec();
    components.push(ComplexComponent::Compound(resolved_head));
    components.extend(child.components.iter().skip(1).cloned());
    Ok(ComplexSelector::new(components))
}

// `Flow` is re-exported here only so callers gluing the expander onto
// the evaluator (e.g. a future `@function`-in-ruleset extension) have
// one import path; the expander itself never produces a `Flow` since
// `@return` outside a function body is an error.
#[allow(unused_imports)]
use Flow as _UnusedFlowReexport;
