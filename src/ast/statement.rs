//! The expansion-context half of the AST (`Statement`).
//! Boxed recursive enum, continuing the shape already chosen for
//! `Expression` in `ast::expression` rather than introducing a second,
//! inconsistent representation strategy for the sibling hierarchy.

use codemap::Span;

use crate::ast::expression::{Argument, Expression, Parameter};
use crate::selector::schema::SelectorOrSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionKind {
    Mixin,
    Function,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub children: Vec<Statement>,
    pub is_root: bool,
}

impl Block {
    pub fn new(children: Vec<Statement>) -> Self {
        Block {
            children,
            is_root: false,
        }
    }

    pub fn root(children: Vec<Statement>) -> Self {
        Block {
            children,
            is_root: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Block(Block),
    Ruleset {
        selector: SelectorOrSchema,
        block: Block,
        span: Span,
    },
    MediaRule {
        queries: Expression,
        block: Block,
        span: Span,
    },
    SupportsRule {
        condition: Expression,
        block: Block,
        span: Span,
    },
    AtRootRule {
        query: Option<Expression>,
        block: Block,
        span: Span,
    },
    Directive {
        keyword: String,
        selector: Option<SelectorOrSchema>,
        value: Option<Expression>,
        block: Option<Block>,
        span: Span,
    },
    KeyframeRule {
        name: String,
        block: Block,
        span: Span,
    },
    Declaration {
        property: Expression,
        value: Option<Expression>,
        is_important: bool,
        is_custom_property: bool,
        block: Option<Block>,
        span: Span,
    },
    Assignment {
        name: String,
        value: Expression,
        is_guarded: bool,
        is_global: bool,
        span: Span,
    },
    Import {
        urls: Vec<String>,
        file_stubs: Vec<Statement>,
        span: Span,
    },
    ImportStub {
        resolved_path: String,
    },
    If {
        predicate: Expression,
        consequent: Block,
        alternative: Option<Box<Statement>>,
        span: Span,
    },
    For {
        var: String,
        lower: Expression,
        upper: Expression,
        inclusive: bool,
        block: Block,
        span: Span,
    },
    Each {
        vars: Vec<String>,
        list: Expression,
        block: Block,
        span: Span,
    },
    While {
        predicate: Expression,
        block: Block,
        span: Span,
    },
    Return {
        value: Expression,
        span: Span,
    },
    Definition {
        name: String,
        params: Vec<Parameter>,
        block: Block,
        kind: DefinitionKind,
        span: Span,
    },
    MixinCall {
        name: String,
        args: Vec<Argument>,
        content_block: Option<Block>,
        span: Span,
    },
    Content {
        span: Span,
    },
    ExtendRule {
        selector: SelectorOrSchema,
        is_optional: bool,
        span: Span,
    },
    Warning {
        value: Expression,
        span: Span,
    },
    Error {
        value: Expression,
        span: Span,
    },
    Debug {
        value: Expression,
        span: Span,
    },
    Comment {
        text: String,
        is_important: bool,
        span: Span,
    },
    /// Internal marker inserted during cssize: an
    /// at-rule that must rise above the ruleset currently wrapping it.
    Bubble {
        inner: Box<Statement>,
        wrapper_selector: Option<SelectorOrSchema>,
    },
    /// Virtual frame for backtraces; never emitted.
    Trace {
        name: String,
        span: Span,
        inner: Box<Statement>,
    },
}

impl Statement {
    pub fn span(&self) -> Option<Span> {
        match self {
            Statement::Block(_) | Statement::ImportStub { .. } | Statement::Bubble { .. } => None,
            Statement::Ruleset { span, .. }
            | Statement::MediaRule { span, .. }
            | Statement::SupportsRule { span, .. }
            | Statement::AtRootRule { span, .. }
            | Statement::Directive { span, .. }
            | Statement::KeyframeRule { span, .. }
            | Statement::Declaration { span, .. }
            | Statement::Assignment { span, .. }
            | Statement::Import { span, .. }
            | Statement::If { span, .. }
            | Statement::For { span, .. }
            | Statement::Each { span, .. }
            | Statement::While { span, .. }
            | Statement::Return { span, .. }
            | Statement::Definition { span, .. }
            | Statement::MixinCall { span, .. }
            | Statement::Content { span }
            | Statement::ExtendRule { span, .. }
            | Statement::Warning { span, .. }
            | Statement::Error { span, .. }
            | Statement::Debug { span, .. }
            | Statement::Comment { span, .. }
            | Statement::Trace { span, .. } => Some(*span),
        }
    }

    /// True for statements that carry a nested rule body that cssize
    /// may need to bubble: `@media`/`@supports`/`@at-root`.
    pub fn is_bubbleable_at_rule(&self) -> bool {
        matches!(
            self,
            Statement::MediaRule { .. } | Statement::SupportsRule { .. } | Statement::AtRootRule { .. }
        )
    }

    pub fn is_ruleset(&self) -> bool {
        matches!(self, Statement::Ruleset { .. })
    }
}
