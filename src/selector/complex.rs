use std::fmt;

use crate::common::Combinator;

use super::compound::CompoundSelector;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ComplexComponent {
    Compound(CompoundSelector),
    Combinator(Combinator),
}

/// A sequence of compound selectors joined by combinators, e.g.
/// `a.x > b.y ~ c`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComplexSelector {
    pub components: Vec<ComplexComponent>,
}

impl ComplexSelector {
    pub fn new(components: Vec<ComplexComponent>) -> Self {
        ComplexSelector { components }
    }

    pub fn from_compound(compound: CompoundSelector) -> Self {
        ComplexSelector {
            components: vec![ComplexComponent::Compound(compound)],
        }
    }

    pub fn compounds(&self) -> impl Iterator<Item = &CompoundSelector> {
        self.components.iter().filter_map(|c| match c {
            ComplexComponent::Compound(cs) => Some(cs),
            ComplexComponent::Combinator(_) => None,
        })
    }

    pub fn contains_parent_ref(&self) -> bool {
        self.compounds().any(CompoundSelector::contains_parent_ref)
    }

    pub fn has_placeholder(&self) -> bool {
        self.compounds().any(CompoundSelector::has_placeholder)
    }

    /// True iff the head (first) component is a compound containing
    /// `&`. Parent refs elsewhere in the complex selector (not at the
    /// head of a compound) are an error per the documented invariant, caught
    /// during expansion.
    pub fn head_is_parent(&self) -> bool {
        matches!(
            self.components.first(),
            Some(ComplexComponent::Compound(c)) if c.contains_parent_ref()
        )
    }

    /// Splice `tail` (everything after the leading `&`-bearing
    /// compound) onto `resolved_head`, producing one concrete complex
    /// selector. Used by parent resolution's N·M Cartesian product
    ///.
    pub fn with_resolved_head(&self, resolved_head: CompoundSelector) -> ComplexSelector {
        let mut components = vec![ComplexComponent::Compound(resolved_head)];
        components.extend(self.components.iter().skip(1).cloned());
        ComplexSelector::new(components)
    }
}

impl fmt::Display for ComplexSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Components alternate Compound, Combinator, Compound, ...; each
        // `Combinator`'s `Display` already carries its own surrounding
        // whitespace (descendant is a bare " "), so compounds are
        // written back to back with no extra separator of their own.
        for component in &self.components {
            match component {
                ComplexComponent::Compound(c) => write!(f, "{}", c)?,
                ComplexComponent::Combinator(comb) => write!(f, "{}", comb)?,
            }
        }
        Ok(())
    }
}
