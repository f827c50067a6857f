//! The `@extend` subset map:
//! a multimap from a compound selector's canonical key to every
//! extender that targets it, collected by the expander and consumed
//! by the extend pass.
//!
//! Keyed by normalized string rather than structural equality so that
//! `.a.b` and `.b.a` hash identically. Extender complex selectors are
//! stored in an `Arena<ComplexSelector>` and referenced by `Id` rather
//! than cloned into every matching entry, since one extender can be
//! targeted by many compounds and needs to outlive whichever ruleset
//! originally declared it.

use std::collections::HashMap;

use crate::arena::{Arena, Id};
use crate::selector::compound::CompoundSelector;
use crate::selector::complex::ComplexSelector;

#[derive(Debug, Clone)]
pub struct Extension {
    pub extender: Id<ComplexSelector>,
    /// The compound selector written after `@extend`, kept for
    /// diagnostics (`ExtendRule`).
    pub original_extendee: CompoundSelector,
    pub is_optional: bool,
    /// Insertion order, independent of which `by_key` bucket an
    /// extension lands in — `matches_for` sorts by this so a compound
    /// matched by extensions from more than one key still comes back
    /// in the deterministic, left-to-right source order spec.md §5/§4.4
    /// require, rather than `HashMap` iteration order.
    seq: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SubsetMap {
    extenders: Arena<ComplexSelector>,
    by_key: HashMap<String, Vec<Extension>>,
    next_seq: usize,
}

impl SubsetMap {
    pub fn new() -> Self {
        SubsetMap {
            extenders: Arena::new(),
            by_key: HashMap::new(),
            next_seq: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// Register `extender` as extending `extendee` (the compound named
    /// after `@extend`), keyed by `extendee`'s canonicalized form so
    /// later lookups by a superset compound can find it.
    pub fn insert(&mut self, extendee: CompoundSelector, extender: ComplexSelector, is_optional: bool) {
        let key = extendee.canonical_key();
        let id = self.extenders.alloc(extender);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.by_key.entry(key).or_default().push(Extension {
            extender: id,
            original_extendee: extendee,
            is_optional,
            seq,
        });
    }

    pub fn extender(&self, id: Id<ComplexSelector>) -> &ComplexSelector {
        self.extenders.get(id)
    }

    /// Every extension whose extendee key is a subset of `compound`'s
    /// canonical key set: looks up by each subset of `compound`'s
    /// simples (a compound `k` matches a registered extendee `k'` when
    /// `k'`'s simples are all present in `k`, per point 1). Returned in
    /// source (insertion) order, not `HashMap` bucket order.
    pub fn matches_for(&self, compound: &CompoundSelector) -> Vec<&Extension> {
        let mut out = Vec::new();
        for exts in self.by_key.values() {
            for ext in exts {
                if ext
                    .original_extendee
                    .items
                    .iter()
                    .all(|simple| compound.items.contains(simple))
                {
                    out.push(ext);
                }
            }
        }
        out.sort_by_key(|ext| ext.seq);
        out
    }
}
