//! `is_superselector_of`, selector unification and the embedding search
//! used by both. The long-vs-long complex-selector matching algorithm
//! here is re-derived directly from the documented behavior (see
//! DESIGN.md Open Question 1): `A` embeds into `B` by trying every
//! contiguous placement of `A`'s components inside `B` left to right
//! and succeeding on the first one whose combinators are all
//! compatible, rather than reverse-engineering a reference
//! implementation whose own loop for this case does not terminate.

use crate::common::Combinator;

use super::compound::CompoundSelector;
use super::complex::{ComplexComponent, ComplexSelector};
use super::list::SelectorList;

/// `A.is_superselector_of(B)`: every simple selector `A` requires must
/// also be present on `B` ("A's set of non-base simples is
/// a subset of B's"; the base/type case falls out of the same rule
/// since a type selector is just one more item in the set).
pub fn compound_is_superselector_of(a: &CompoundSelector, b: &CompoundSelector) -> bool {
    a.items.iter().all(|item| b.items.contains(item))
}

type Part<'a> = (Option<Combinator>, &'a CompoundSelector);

fn parts(c: &ComplexSelector) -> Vec<Part<'_>> {
    let mut out = Vec::new();
    let mut pending: Option<Combinator> = None;
    for component in &c.components {
        match component {
            ComplexComponent::Compound(cs) => {
                out.push((pending.take(), cs));
            }
            ComplexComponent::Combinator(comb) => pending = Some(*comb),
        }
    }
    out
}

/// A combinator in `a` is satisfied by a combinator in `b` when every
/// pair of elements `b` relates that way also relates under `a`'s
/// (weaker-or-equal) combinator: descendant accepts anything; child and
/// next-sibling require an exact match; following-sibling additionally
/// accepts next-sibling (`+` is a stricter case of `~`).
fn combinator_compatible(a: Combinator, b: Combinator) -> bool {
    match a {
        Combinator::Descendant => true,
        Combinator::Child => b == Combinator::Child,
        Combinator::NextSibling => b == Combinator::NextSibling,
        Combinator::FollowingSibling => {
            b == Combinator::FollowingSibling || b == Combinator::NextSibling
        }
    }
}

/// Try to embed `a` into `b` from the right: the rightmost compound of
/// each must always align (that's the actual matched element); ancestor
/// compounds may be skipped over only when the connecting combinator is
/// `descendant`.
fn embed(a: &[Part<'_>], b: &[Part<'_>]) -> bool {
    if a.is_empty() {
        return true;
    }
    if b.is_empty() {
        return false;
    }
    let (a_last_comb, a_last) = *a.last().unwrap();
    let (_b_last_comb, b_last) = *b.last().unwrap();
    if !compound_is_superselector_of(a_last, b_last) {
        return false;
    }
    if a.len() == 1 {
        return true;
    }
    let comb = match a_last_comb {
        Some(c) => c,
        None => return true,
    };
    let a_rest = &a[..a.len() - 1];
    let b_rest = &b[..b.len() - 1];
    match comb {
        Combinator::Descendant => {
            // The next ancestor up from `a`'s point of view may match any
            // ancestor at or above the corresponding point in `b`: try
            // every suffix of `b_rest`, longest first.
            for i in (0..=b_rest.len()).rev() {
                if embed(a_rest, &b_rest[..i]) {
                    return true;
                }
            }
            false
        }
        _ => {
            if b.len() < 2 {
                return false;
            }
            let (b_prev_comb, _) = b[b.len() - 2];
            match b_prev_comb {
                Some(bc) if combinator_compatible(comb, bc) => embed(a_rest, b_rest),
                _ => false,
            }
        }
    }
}

pub fn complex_is_superselector_of(a: &ComplexSelector, b: &ComplexSelector) -> bool {
    embed(&parts(a), &parts(b))
}

pub fn list_is_superselector_of(a: &SelectorList, b: &SelectorList) -> bool {
    b.items
        .iter()
        .all(|cb| a.items.iter().any(|ca| complex_is_superselector_of(ca, cb)))
}

/// Unify the compound left over after subtracting an extendee (`k -
/// k'`) with an extender complex selector, splicing the result onto the
/// extender's last compound and keeping its ancestor chain intact
/// (point 2). Returns `None` when the two compounds carry
/// conflicting type selectors and cannot unify.
pub fn unify_complex_with_compound(
    extender: &ComplexSelector,
    remaining: &CompoundSelector,
) -> Option<ComplexSelector> {
    let mut components = extender.components.clone();
    let last_idx = components.iter().rposition(|c| matches!(c, ComplexComponent::Compound(_)))?;
    if let ComplexComponent::Compound(last) = &components[last_idx] {
        let merged = last.unify(remaining)?;
        components[last_idx] = ComplexComponent::Compound(merged);
        Some(ComplexSelector::new(components))
    } else {
        None
    }
}

// Note on `permute`: the glossary lists `permute` as an operation
// used for selector-schema re-parsing. This crate resolves a
// `SelectorSchema` by evaluating its interpolants to literal text and
// re-parsing that text with the ordinary selector parser (// step 1), which already produces every combination a cartesian-product
// `permute` step would — so no separate permutation function is needed
// here; see `expander::resolve_selector`.

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::simple::SimpleSelector;

    fn class(name: &str) -> CompoundSelector {
        CompoundSelector::new(vec![SimpleSelector::Class(name.to_owned())])
    }

    fn complex(compounds: Vec<CompoundSelector>, combs: Vec<Combinator>) -> ComplexSelector {
        let mut components = Vec::new();
        let mut combs = combs.into_iter();
        for (i, c) in compounds.into_iter().enumerate() {
            if i > 0 {
                components.push(ComplexComponent::Combinator(combs.next().unwrap()));
            }
            components.push(ComplexComponent::Compound(c));
        }
        ComplexSelector::new(components)
    }

    #[test]
    fn reflexive() {
        let a = complex(vec![class("a"), class("b")], vec![Combinator::Descendant]);
        assert!(complex_is_superselector_of(&a, &a));
    }

    #[test]
    fn transitive() {
        // A = .a, B = .x .a, C = .y .x .a
        let a = complex(vec![class("a")], vec![]);
        let b = complex(vec![class("x"), class("a")], vec![Combinator::Descendant]);
        let c = complex(
            vec![class("y"), class("x"), class("a")],
            vec![Combinator::Descendant, Combinator::Descendant],
        );
        assert!(complex_is_superselector_of(&a, &b));
        assert!(complex_is_superselector_of(&b, &c));
        assert!(complex_is_superselector_of(&a, &c));
    }

    #[test]
    fn child_combinator_requires_exact_match() {
        let a = complex(vec![class("a"), class("b")], vec![Combinator::Child]);
        let b_descendant = complex(vec![class("a"), class("b")], vec![Combinator::Descendant]);
        assert!(!complex_is_superselector_of(&a, &b_descendant));
    }

    #[test]
    fn compound_superset_is_superselector() {
        let a = class("a");
        let mut ab = class("a");
        ab.items.push(SimpleSelector::Class("b".to_owned()));
        assert!(compound_is_superselector_of(&a, &ab));
        assert!(!compound_is_superselector_of(&ab, &a));
    }
}
