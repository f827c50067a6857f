use std::fmt;

use super::complex::ComplexSelector;

/// Comma-separated alternatives (glossary: "selector list / selector
/// group"), .
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectorList {
    pub items: Vec<ComplexSelector>,
}

impl SelectorList {
    pub fn new(items: Vec<ComplexSelector>) -> Self {
        SelectorList { items }
    }

    pub fn contains_parent_ref(&self) -> bool {
        self.items.iter().any(ComplexSelector::contains_parent_ref)
    }

    pub fn has_placeholder(&self) -> bool {
        self.items.iter().any(ComplexSelector::has_placeholder)
    }
}

impl fmt::Display for SelectorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.items.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", rendered.join(", "))
    }
}
