//! De-nesting pass turning the extended statement tree into one the
//! emitter can walk flatly: nested rulesets flatten to
//! sibling position, at-rules nested in a ruleset bubble out (carrying
//! any plain declarations left behind along in a synthetic ruleset
//! wrapping the enclosing selector), `@media`/`@supports` of the same
//! kind merge their queries/conditions with an enclosing at-rule of
//! that kind — whether they're its direct child or they only meet it
//! after bubbling up out of a nested ruleset — and `Declaration`
//! sub-blocks (`font: { family: ...; }`) compose into hyphenated flat
//! properties.
//!
//! Grounded on `a de-nesting, bubble-and-merge design`'s visitor split
//! (one method per statement kind, partitioning a ruleset's children
//! into "stays" vs "bubbles"); reconstructs the synthetic wrapping
//! ruleset inline rather than deferring it to the emitter via the
//! `Statement::Bubble` marker (a deliberate simplification recorded in
//! DESIGN.md — the marker exists in `ast::statement` for a future
//! incremental emitter but isn't needed once cssize produces the final
//! legal shape directly).
//!
//! Simplification (DESIGN.md): media-query and `@supports` condition
//! merging joins text with `and` rather than modeling `not`/`only`
//! compatibility or dropping provably-empty products; `@at-root`
//! `without: media`/`without: supports` doesn't strip an enclosing
//! at-rule wrapper, only the ruleset wrapper the expander already
//! handles.

use crate::ast::expression::Expression;
use crate::ast::statement::{Block, Statement};
use crate::error::SassResult;
use crate::selector::SelectorOrSchema;
use crate::value;

use codemap::Span;

pub fn run(root: &Block) -> SassResult<Block> {
    Ok(Block::root(cssize_stmts(&root.children)?))
}

fn cssize_stmts(stmts: &[Statement]) -> SassResult<Vec<Statement>> {
    let mut out = Vec::new();
    for stmt in stmts {
        out.extend(cssize_stmt(stmt)?);
    }
    Ok(out)
}

fn cssize_stmt(stmt: &Statement) -> SassResult<Vec<Statement>> {
    match stmt {
        Statement::Ruleset { selector, block, span } => {
            cssize_scoped(Some(selector), *span, &block.children)
        }
        Statement::MediaRule { queries, block, span } => {
            cssize_at_rule(AtShell::Media(queries.clone()), *span, &block.children)
        }
        Statement::SupportsRule { condition, block, span } => {
            cssize_at_rule(AtShell::Supports(condition.clone()), *span, &block.children)
        }
        Statement::AtRootRule { block, .. } => cssize_stmts(&block.children),
        Statement::Directive { keyword, selector, value, block, span } => {
            let new_block = match block {
                Some(b) => Some(Block::new(cssize_stmts(&b.children)?)),
                None => None,
            };
            Ok(vec![Statement::Directive {
                keyword: keyword.clone(),
                selector: selector.clone(),
                value: value.clone(),
                block: new_block,
                span: *span,
            }])
        }
        Statement::KeyframeRule { name, block, span } => Ok(vec![Statement::KeyframeRule {
            name: name.clone(),
            block: Block::new(cssize_stmts(&block.children)?),
            span: *span,
        }]),
        Statement::Declaration { property, value, is_important, is_custom_property, block, span } => {
            let mut out = Vec::new();
            compose_declaration(property, value.as_ref(), *is_important, *is_custom_property, block.as_ref(), *span, &mut out)?;
            Ok(out)
        }
        other => Ok(vec![other.clone()]),
    }
}

enum AtShell {
    Media(Expression),
    Supports(Expression),
}

/// Processes the body of a ruleset (`selector = Some`) or an at-rule
/// nested directly inside one (`selector` still the enclosing
/// ruleset's, threaded down so declarations found inside the at-rule
/// get the same synthetic wrapper), separating declarations/comments
/// (which stay at this level) from rulesets and at-rules (which
/// bubble).
fn cssize_scoped(selector: Option<&SelectorOrSchema>, span: Span, stmts: &[Statement]) -> SassResult<Vec<Statement>> {
    let mut own: Vec<Statement> = Vec::new();
    let mut bubbled: Vec<&Statement> = Vec::new();

    for stmt in stmts {
        match stmt {
            Statement::Ruleset { .. } | Statement::MediaRule { .. } | Statement::SupportsRule { .. } | Statement::AtRootRule { .. } => {
                bubbled.push(stmt);
            }
            Statement::Declaration { property, value, is_important, is_custom_property, block, span } => {
                compose_declaration(property, value.as_ref(), *is_important, *is_custom_property, block.as_ref(), *span, &mut own)?;
            }
            Statement::Directive { keyword, selector: dsel, value, block, span } => {
                let new_block = match block {
                    Some(b) => Some(Block::new(cssize_stmts(&b.children)?)),
                    None => None,
                };
                own.push(Statement::Directive {
                    keyword: keyword.clone(),
                    selector: dsel.clone(),
                    value: value.clone(),
                    block: new_block,
                    span: *span,
                });
            }
            Statement::KeyframeRule { name, block, span } => {
                own.push(Statement::KeyframeRule {
                    name: name.clone(),
                    block: Block::new(cssize_stmts(&block.children)?),
                    span: *span,
                });
            }
            other => own.push(other.clone()),
        }
    }

    let mut out = Vec::new();
    match selector {
        Some(sel) => {
            if !own.is_empty() || bubbled.is_empty() {
                out.push(Statement::Ruleset { selector: sel.clone(), block: Block::new(own), span });
            }
        }
        None => out.extend(own),
    }

    for child in bubbled {
        out.extend(bubble_one(selector, child)?);
    }
    Ok(out)
}

/// Bubbles one child of a ruleset (or of an at-rule already being
/// bubbled through) up to sibling position. A nested `Ruleset` already
/// carries its own, independently resolved selector (the expander
/// threads the true parent through), so it recurses on its own account
/// and is never re-wrapped in `outer_selector`. A nested at-rule
/// recurses with `outer_selector` still in scope, so declarations
/// directly inside it land in a synthetic ruleset the same way they
/// would one level up.
fn bubble_one(outer_selector: Option<&SelectorOrSchema>, child: &Statement) -> SassResult<Vec<Statement>> {
    match child {
        Statement::Ruleset { selector, block, span } => cssize_scoped(Some(selector), *span, &block.children),
        Statement::MediaRule { queries, block, span } => {
            let inner = cssize_scoped(outer_selector, *span, &block.children)?;
            Ok(vec![Statement::MediaRule { queries: queries.clone(), block: Block::new(inner), span: *span }])
        }
        Statement::SupportsRule { condition, block, span } => {
            let inner = cssize_scoped(outer_selector, *span, &block.children)?;
            Ok(vec![Statement::SupportsRule { condition: condition.clone(), block: Block::new(inner), span: *span }])
        }
        Statement::AtRootRule { block, span, .. } => cssize_scoped(None, *span, &block.children),
        _ => unreachable!("only bubbleable statement kinds are pushed onto the bubble list"),
    }
}

/// A media/supports rule that bubbles up out of a nested ruleset (or
/// out of an already-bubbled at-rule) still needs to meet an enclosing
/// at-rule of the same kind for merging — it doesn't only arrive as a
/// syntactically-direct child of `shell`. So every child is first run
/// through the ordinary bubbling machinery (`cssize_stmt`), and the
/// *results* of that are what get classified as mergeable or not,
/// rather than classifying the pre-bubble child itself.
fn cssize_at_rule(shell: AtShell, span: Span, stmts: &[Statement]) -> SassResult<Vec<Statement>> {
    let mut own: Vec<Statement> = Vec::new();
    let mut produced: Vec<Statement> = Vec::new();

    for stmt in stmts {
        match stmt {
            Statement::Declaration { property, value, is_important, is_custom_property, block, span } => {
                compose_declaration(property, value.as_ref(), *is_important, *is_custom_property, block.as_ref(), *span, &mut own)?;
            }
            Statement::Ruleset { .. }
            | Statement::MediaRule { .. }
            | Statement::SupportsRule { .. }
            | Statement::AtRootRule { .. } => produced.extend(cssize_stmt(stmt)?),
            _ => own.extend(cssize_stmt(stmt)?),
        }
    }

    finish_at_rule(shell, span, own, produced)
}

/// Wraps already-cssized `own`/`produced` statements into `shell`,
/// merging any same-kind at-rule found in `produced` with it first.
/// `produced`'s items are final (already de-nested, already bubbled),
/// so a merge continuation only needs to reclassify a matched item's
/// own already-resolved body against the *merged* shell — it must not
/// re-run `cssize_stmt`/`cssize_scoped` over that body, which would
/// redo work already done once per level of same-kind at-rule nesting.
fn finish_at_rule(shell: AtShell, span: Span, own: Vec<Statement>, produced: Vec<Statement>) -> SassResult<Vec<Statement>> {
    let mut nested: Vec<Statement> = Vec::new();
    let mut merge_queue: Vec<Statement> = Vec::new();

    for item in produced {
        match (&shell, &item) {
            (AtShell::Media(_), Statement::MediaRule { .. })
            | (AtShell::Supports(_), Statement::SupportsRule { .. }) => merge_queue.push(item),
            _ => nested.push(item),
        }
    }

    let mut body = own;
    body.extend(nested);

    if merge_queue.is_empty() {
        let wrapped = match shell {
            AtShell::Media(q) => Statement::MediaRule { queries: q, block: Block::new(body), span },
            AtShell::Supports(c) => Statement::SupportsRule { condition: c, block: Block::new(body), span },
        };
        return Ok(vec![wrapped]);
    }

    let mut out = Vec::new();
    for merge_child in merge_queue {
        match (&shell, merge_child) {
            (AtShell::Media(outer_q), Statement::MediaRule { queries: inner_q, block, span: inner_span }) => {
                if let Some(merged) = merge_media_queries(outer_q, &inner_q, span)? {
                    out.extend(finish_at_rule(AtShell::Media(merged), inner_span, Vec::new(), block.children)?);
                } // incompatible product: whole nested block discarded
            }
            (AtShell::Supports(outer_c), Statement::SupportsRule { condition: inner_c, block, span: inner_span }) => {
                let merged = merge_supports_conditions(outer_c, &inner_c, span)?;
                out.extend(finish_at_rule(AtShell::Supports(merged), inner_span, Vec::new(), block.children)?);
            }
            _ => unreachable!("merge_queue only ever holds same-kind at-rules"),
        }
    }
    if !body.is_empty() {
        let wrapped = match &shell {
            AtShell::Media(q) => Statement::MediaRule { queries: q.clone(), block: Block::new(body), span },
            AtShell::Supports(c) => Statement::SupportsRule { condition: c.clone(), block: Block::new(body), span },
        };
        out.insert(0, wrapped);
    }
    Ok(out)
}

/// Pairwise intersection of two comma-separated media query lists
///: every combination of one entry from each side joins
/// with `and`; an empty side acts as the universal query (`all`) and
/// contributes nothing to the join. `not`/`only` compatibility isn't
/// modeled (documented simplification) so no pair is ever dropped as
/// incompatible; `Ok(None)` is reserved for that case and never
/// produced today.
fn merge_media_queries(outer: &Expression, inner: &Expression, span: Span) -> SassResult<Option<Expression>> {
    let outer_text = value::to_css_string(outer, span)?;
    let inner_text = value::to_css_string(inner, span)?;
    let outer_items: Vec<&str> = split_top_level_commas(&outer_text);
    let inner_items: Vec<&str> = split_top_level_commas(&inner_text);
    let mut merged = Vec::new();
    for o in &outer_items {
        for i in &inner_items {
            let o = o.trim();
            let i = i.trim();
            merged.push(match (o.is_empty(), i.is_empty()) {
                (true, true) => String::new(),
                (true, false) => i.to_owned(),
                (false, true) => o.to_owned(),
                (false, false) => format!("{} and {}", o, i),
            });
        }
    }
    if merged.is_empty() {
        return Ok(None);
    }
    Ok(Some(Expression::StringConstant(merged.join(", "))))
}

fn merge_supports_conditions(outer: &Expression, inner: &Expression, span: Span) -> SassResult<Expression> {
    let outer_text = value::to_css_string(outer, span)?;
    let inner_text = value::to_css_string(inner, span)?;
    Ok(Expression::StringConstant(format!("{} and {}", outer_text, inner_text)))
}

fn split_top_level_commas(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth <= 0 => {
                out.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(&text[start..]);
    out
}

/// Flattens a `Declaration`'s optional sub-block (`font: { family: ...;
/// size: ...; }`) into siblings at the current level, concatenating
/// the outer property with `-` and the inner property, recursively
/// ("declaration property composition").
#[allow(clippy::too_many_arguments)]
fn compose_declaration(
    property: &Expression,
    value: Option<&Expression>,
    is_important: bool,
    is_custom_property: bool,
    block: Option<&Block>,
    span: Span,
    out: &mut Vec<Statement>,
) -> SassResult<()> {
    if value.is_some() || block.is_none() {
        out.push(Statement::Declaration {
            property: property.clone(),
            value: value.cloned(),
            is_important,
            is_custom_property,
            block: None,
            span,
        });
    }
    if let Some(b) = block {
        let prefix = value::unquoted_text(property, span);
        for child in &b.children {
            if let Statement::Declaration {
                property: inner_prop,
                value: inner_value,
                is_important: inner_important,
                is_custom_property: inner_custom,
                block: inner_block,
                span: inner_span,
            } = child
            {
                let composed = format!("{}-{}", prefix, value::unquoted_text(inner_prop, *inner_span));
                compose_declaration(
                    &Expression::StringConstant(composed),
                    inner_value.as_ref(),
                    *inner_important,
                    *inner_custom,
                    inner_block.as_ref(),
                    *inner_span,
                    out,
                )?;
            }
        }
    }
    Ok(())
}
