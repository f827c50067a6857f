//! The dual AST hierarchy: `Statement` for expansion
//! contexts, `Expression` for value contexts. Selector types live in
//! `crate::selector` since they are conceptually a sub-hierarchy of
//! expressions but large enough to deserve their own module, kept
//! separate from the rest of the value/style code.

pub mod expression;
pub mod statement;

pub use expression::{Argument, Expression, Parameter, SassColor, TextualKind};
pub use statement::Statement;
