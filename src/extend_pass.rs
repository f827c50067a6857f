//! Second traversal applying the `@extend` subset map collected during
//! expansion (the "extend" operation): walks the already-fully
//! resolved statement tree the expander produced and rewrites every
//! ruleset's selector list, splicing in one additional complex selector
//! per matching extension via `selector::algebra::unify_complex_with_compound`.
//!
//! Grounded on `a two-phase collect/apply extend design`'s two-phase
//! "collect during parse, apply in a dedicated pass" structure; the
//! actual unification math lives in `selector::algebra` and
//! `selector::compound` (`subtract`/`unify`), reused unchanged here.
//!
//! Simplification (recorded in DESIGN.md): a non-optional `@extend`
//! whose target is never found anywhere in the document is not
//! reported as an error here, since `SubsetMap::Extension` does not
//! carry the `@extend` call site's span to attach such a diagnostic to.
//! `is_optional` is still collected and available for a future pass
//! that threads the span through.

use crate::ast::statement::{Block, Statement};
use crate::error::SassResult;
use crate::selector::{
    algebra, ComplexComponent, ComplexSelector, SelectorList, SelectorOrSchema, SubsetMap,
};

pub fn apply(root: &Block, map: &SubsetMap) -> SassResult<Block> {
    Ok(Block::root(apply_stmts(&root.children, map)?))
}

fn apply_stmts(stmts: &[Statement], map: &SubsetMap) -> SassResult<Vec<Statement>> {
    stmts.iter().map(|s| apply_stmt(s, map)).collect()
}

fn apply_stmt(stmt: &Statement, map: &SubsetMap) -> SassResult<Statement> {
    Ok(match stmt {
        Statement::Ruleset { selector, block, span } => {
            let list = match selector {
                SelectorOrSchema::List(l) => l,
                SelectorOrSchema::Schema(_) => {
                    unreachable!("selectors are fully resolved to lists by the expander")
                }
            };
            let extended = if map.is_empty() { list.clone() } else { extend_list(list, map) };
            Statement::Ruleset {
                selector: SelectorOrSchema::List(extended),
                block: Block::new(apply_stmts(&block.children, map)?),
                span: *span,
            }
        }
        Statement::MediaRule { queries, block, span } => Statement::MediaRule {
            queries: queries.clone(),
            block: Block::new(apply_stmts(&block.children, map)?),
            span: *span,
        },
        Statement::SupportsRule { condition, block, span } => Statement::SupportsRule {
            condition: condition.clone(),
            block: Block::new(apply_stmts(&block.children, map)?),
            span: *span,
        },
        Statement::AtRootRule { query, block, span } => Statement::AtRootRule {
            query: query.clone(),
            block: Block::new(apply_stmts(&block.children, map)?),
            span: *span,
        },
        Statement::Directive { keyword, selector, value, block, span } => Statement::Directive {
            keyword: keyword.clone(),
            selector: selector.clone(),
            value: value.clone(),
            block: block
                .as_ref()
                .map(|b| apply_stmts(&b.children, map))
                .transpose()?
                .map(Block::new),
            span: *span,
        },
        Statement::KeyframeRule { name, block, span } => Statement::KeyframeRule {
            name: name.clone(),
            block: Block::new(apply_stmts(&block.children, map)?),
            span: *span,
        },
        Statement::Declaration { property, value, is_important, is_custom_property, block, span } => {
            Statement::Declaration {
                property: property.clone(),
                value: value.clone(),
                is_important: *is_important,
                is_custom_property: *is_custom_property,
                block: block
                    .as_ref()
                    .map(|b| apply_stmts(&b.children, map))
                    .transpose()?
                    .map(Block::new),
                span: *span,
            }
        }
        Statement::Block(b) => Statement::Block(Block::new(apply_stmts(&b.children, map)?)),
        other => other.clone(),
    })
}

/// Applies every matching extension to each complex selector in `list`,
/// keeping the original alongside whatever new selectors extension
/// produces (set union, deduplicated by equality — no superselector
/// trimming, see module docs).
fn extend_list(list: &SelectorList, map: &SubsetMap) -> SelectorList {
    let mut result: Vec<ComplexSelector> = Vec::new();
    for complex in &list.items {
        push_unique(&mut result, complex.clone());
        for generated in generate_extensions(complex, map) {
            push_unique(&mut result, generated);
        }
    }
    SelectorList::new(result)
}

fn push_unique(result: &mut Vec<ComplexSelector>, candidate: ComplexSelector) {
    if !result.contains(&candidate) {
        result.push(candidate);
    }
}

/// One generated complex selector per `(compound position, matching
/// extension)` pair: the host compound at that position is replaced by
/// the extender's complex selector, unified at its tail with whatever
/// of the host compound's simples the extendee didn't already cover
/// (point 2, `k - k'` unified onto the extender).
fn generate_extensions(complex: &ComplexSelector, map: &SubsetMap) -> Vec<ComplexSelector> {
    let mut out = Vec::new();
    for (i, component) in complex.components.iter().enumerate() {
        let compound = match component {
            ComplexComponent::Compound(c) => c,
            ComplexComponent::Combinator(_) => continue,
        };
        for ext in map.matches_for(compound) {
            let remaining = compound.subtract(&ext.original_extendee);
            let extender_complex = map.extender(ext.extender);
            if let Some(unified) = algebra::unify_complex_with_compound(extender_complex, &remaining) {
                let mut components = Vec::with_capacity(complex.components.len() + unified.components.len());
                components.extend(complex.components[..i].iter().cloned());
                components.extend(unified.components.iter().cloned());
                components.extend(complex.components[i + 1..].iter().cloned());
                out.push(ComplexSelector::new(components));
            }
        }
    }
    out
}
