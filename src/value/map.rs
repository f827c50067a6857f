use std::slice::Iter;
use std::vec::IntoIter;

use crate::ast::expression::Expression;
use crate::common::{Brackets, ListSeparator};
use crate::value::equals;

/// An ordered map of `Expression` values (the `Map` value variant): a
/// `Vec<(Expression, Expression)>` newtype rather than a `HashMap`,
/// since map entries must round-trip in source/insertion order and
/// `Expression` has no blanket `Hash` impl.
#[derive(Debug, Clone, PartialEq)]
pub struct SassMap(Vec<(Expression, Expression)>);

impl SassMap {
    pub const fn new() -> SassMap {
        SassMap(Vec::new())
    }

    pub fn from_pairs(pairs: Vec<(Expression, Expression)>) -> SassMap {
        SassMap(pairs)
    }

    pub fn get(&self, key: &Expression) -> Option<&Expression> {
        self.0.iter().find(|(k, _)| equals(k, key)).map(|(_, v)| v)
    }

    pub fn remove(&mut self, key: &Expression) {
        self.0.retain(|(k, ..)| !equals(k, key));
    }

    /// Merge `other` in, overwriting duplicate keys with `other`'s
    /// value (ambient additions, `map-merge`). A duplicate
    /// key encountered while *parsing* a map literal is instead an
    /// evaluation error — that check lives in the parser,
    /// not here.
    pub fn merge(&mut self, other: SassMap) {
        for (key, value) in other {
            self.insert(key, value);
        }
    }

    pub fn iter(&self) -> Iter<'_, (Expression, Expression)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> Vec<Expression> {
        self.0.iter().map(|(k, ..)| k.clone()).collect()
    }

    pub fn values(&self) -> Vec<Expression> {
        self.0.iter().map(|(.., v)| v.clone()).collect()
    }

    pub fn as_list(&self) -> Vec<Expression> {
        self.0
            .iter()
            .map(|(k, v)| Expression::List {
                items: vec![k.clone(), v.clone()],
                separator: ListSeparator::Space,
                brackets: Brackets::None,
            })
            .collect()
    }

    /// Returns true if the key already existed (and was overwritten).
    pub fn insert(&mut self, key: Expression, value: Expression) -> bool {
        for (k, v) in &mut self.0 {
            if equals(k, &key) {
                *v = value;
                return true;
            }
        }
        self.0.push((key, value));
        false
    }
}

impl Default for SassMap {
    fn default() -> Self {
        Self::new()
    }
}

impl IntoIterator for SassMap {
    type Item = (Expression, Expression);
    type IntoIter = IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
