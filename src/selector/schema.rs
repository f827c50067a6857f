use crate::ast::expression::Expression;

use super::list::SelectorList;

/// An unparsed selector containing `#{}` interpolants; re-parsed as a
/// `SelectorList` once the schema's fragments are evaluated during
/// expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorSchema {
    pub contents: Expression,
}

/// A ruleset's selector is either already a concrete list or still an
/// unparsed schema waiting on interpolation.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorOrSchema {
    List(SelectorList),
    Schema(SelectorSchema),
}

impl SelectorOrSchema {
    pub fn as_list(&self) -> Option<&SelectorList> {
        match self {
            SelectorOrSchema::List(l) => Some(l),
            SelectorOrSchema::Schema(_) => None,
        }
    }
}
