use std::fmt;

use super::simple::SimpleSelector;

/// An unordered-but-emitted-ordered AND of simple selectors, e.g.
/// `div.foo[x]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompoundSelector {
    pub items: Vec<SimpleSelector>,
}

impl CompoundSelector {
    pub fn new(items: Vec<SimpleSelector>) -> Self {
        CompoundSelector { items }
    }

    pub fn contains_parent_ref(&self) -> bool {
        self.items.iter().any(SimpleSelector::is_parent)
    }

    pub fn has_placeholder(&self) -> bool {
        self.items.iter().any(SimpleSelector::is_placeholder)
    }

    /// Normalized key used by the subset map: simples sorted by
    /// `sort_rank` then rendered, so `.a.b` and `.b.a` canonicalize
    /// identically (DESIGN.md Open Question 2).
    pub fn canonical_key(&self) -> String {
        let mut items: Vec<&SimpleSelector> = self.items.iter().collect();
        items.sort_by(|a, b| a.sort_rank().cmp(&b.sort_rank()).then_with(|| {
            a.normalized().cmp(&b.normalized())
        }));
        items.iter().map(|s| s.normalized()).collect()
    }

    /// True if every simple selector in `other` is also present in
    /// `self` (self is a superset, i.e. a more specific compound) —
    /// the per-compound half of `is_superselector_of`.
    pub fn is_superset_of(&self, other: &CompoundSelector) -> bool {
        other.items.iter().all(|item| self.items.contains(item))
    }

    /// Merge two compounds, deduplicating, for `unify`.
    /// Returns `None` if the two compounds have conflicting type
    /// selectors (e.g. `div` and `span`) or conflicting namespaces.
    pub fn unify(&self, other: &CompoundSelector) -> Option<CompoundSelector> {
        let mut items = self.items.clone();
        let self_type = items.iter().find(|s| matches!(s, SimpleSelector::Type { .. }));
        let other_type = other
            .items
            .iter()
            .find(|s| matches!(s, SimpleSelector::Type { .. }));
        if let (Some(a), Some(b)) = (self_type, other_type) {
            if a != b {
                return None;
            }
        }
        for item in &other.items {
            if !items.contains(item) {
                items.push(item.clone());
            }
        }
        Some(CompoundSelector::new(items))
    }

    /// `self` minus `other`: remove every simple in `other` from
    /// `self`. Used when rewriting `k` to `k - k'` during extension
    /// (point 2).
    pub fn subtract(&self, other: &CompoundSelector) -> CompoundSelector {
        CompoundSelector::new(
            self.items
                .iter()
                .filter(|item| !other.items.contains(item))
                .cloned()
                .collect(),
        )
    }

    /// Replace the (single, head-position) `&` with `parent`'s items,
    /// or concatenate trailing simples onto the parent's last simple
    /// when `&` is followed by more simples in the same compound
    /// (parent resolution, `&-bar` case). Returns `Err`
    /// with a message when `&` is not at the head or concatenation
    /// doesn't parse as an identifier.
    pub fn resolve_parent(&self, parent: &CompoundSelector) -> Result<CompoundSelector, String> {
        let parent_pos = self.items.iter().position(SimpleSelector::is_parent);
        let parent_idx = match parent_pos {
            Some(i) => i,
            None => return Ok(self.clone()),
        };
        if parent_idx != 0 {
            return Err("\"&\" may only used at the beginning of a compound selector.".into());
        }
        if self.items.len() == 1 {
            return Ok(parent.clone());
        }
        // `&` followed by more simples: concatenate onto parent's last
        // simple textually (e.g. parent `.foo` + child `&-bar` ->
        // `.foo-bar`), only valid when parent's last simple is a
        // class/type/id/placeholder (identifier-shaped).
        let mut parent_items = parent.items.clone();
        let trailing = &self.items[1..];
        let tail_text: String = trailing.iter().map(|s| s.to_string()).collect();
        match parent_items.pop() {
            Some(SimpleSelector::Class(name)) => {
                parent_items.push(SimpleSelector::Class(format!("{}{}", name, tail_text)));
            }
            Some(SimpleSelector::Type { name, namespace }) => {
                parent_items.push(SimpleSelector::Type {
                    name: format!("{}{}", name, tail_text),
                    namespace,
                });
            }
            Some(SimpleSelector::Id(name)) => {
                parent_items.push(SimpleSelector::Id(format!("{}{}", name, tail_text)));
            }
            Some(SimpleSelector::Placeholder(name)) => {
                parent_items.push(SimpleSelector::Placeholder(format!("{}{}", name, tail_text)));
            }
            Some(other) => {
                return Err(format!(
                    "Parent \"{}\" is incompatible with this selector.",
                    other
                ))
            }
            None => return Err("\"&\" used with empty parent selector.".into()),
        }
        Ok(CompoundSelector::new(parent_items))
    }
}

impl fmt::Display for CompoundSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.items.is_empty() {
            return write!(f, "*");
        }
        for item in &self.items {
            write!(f, "{}", item)?;
        }
        Ok(())
    }
}
