//! Drops placeholder selectors that survived extension: any complex
//! selector whose compounds still carry a `%name` after the extend
//! pass ran is dead (it was only ever meant to be extended, not
//! emitted) and is removed from its `SelectorList`; a ruleset whose
//! list empties out entirely is dropped. Order of the remaining
//! selectors is preserved.
//!
//! Runs after cssize, right before the emitter, so every `Ruleset` here
//! is already flat — no recursion into nested rulesets is needed, only
//! into the at-rule/keyframe wrappers cssize still leaves standing.

use crate::ast::statement::{Block, Statement};
use crate::selector::SelectorOrSchema;

pub fn run(root: &Block) -> Block {
    Block::root(run_stmts(&root.children))
}

fn run_stmts(stmts: &[Statement]) -> Vec<Statement> {
    stmts.iter().filter_map(run_stmt).collect()
}

fn run_stmt(stmt: &Statement) -> Option<Statement> {
    match stmt {
        Statement::Ruleset { selector, block, span } => {
            let list = match selector {
                SelectorOrSchema::List(l) => l,
                SelectorOrSchema::Schema(_) => unreachable!("selectors are fully resolved by this point"),
            };
            let kept: Vec<_> = list.items.iter().filter(|c| !c.has_placeholder()).cloned().collect();
            if kept.is_empty() {
                return None;
            }
            Some(Statement::Ruleset {
                selector: SelectorOrSchema::List(crate::selector::SelectorList::new(kept)),
                block: Block::new(run_stmts(&block.children)),
                span: *span,
            })
        }
        Statement::MediaRule { queries, block, span } => Some(Statement::MediaRule {
            queries: queries.clone(),
            block: Block::new(run_stmts(&block.children)),
            span: *span,
        }),
        Statement::SupportsRule { condition, block, span } => Some(Statement::SupportsRule {
            condition: condition.clone(),
            block: Block::new(run_stmts(&block.children)),
            span: *span,
        }),
        Statement::Directive { keyword, selector, value, block, span } => Some(Statement::Directive {
            keyword: keyword.clone(),
            selector: selector.clone(),
            value: value.clone(),
            block: block.as_ref().map(|b| Block::new(run_stmts(&b.children))),
            span: *span,
        }),
        Statement::KeyframeRule { name, block, span } => Some(Statement::KeyframeRule {
            name: name.clone(),
            block: Block::new(run_stmts(&block.children)),
            span: *span,
        }),
        other => Some(other.clone()),
    }
}
