//! Unordered, deduplicated grant sets (roles or permissions).

use std::borrow::Borrow;
use std::collections::{HashSet, hash_set};
use std::hash::Hash;

use serde::{Deserialize, Serialize};

/// A set of granted names. Equality is set membership, never ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
#[serde(bound(
    serialize = "T: Serialize",
    deserialize = "T: Deserialize<'de> + Eq + Hash"
))]
pub struct GrantSet<T: Eq + Hash> {
    items: HashSet<T>,
}

impl<T: Eq + Hash> GrantSet<T> {
    pub fn new() -> Self {
        Self {
            items: HashSet::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> hash_set::Iter<'_, T> {
        self.items.iter()
    }

    /// Returns `false` if the grant was already present.
    pub fn insert(&mut self, item: T) -> bool {
        self.items.insert(item)
    }
}

impl<T: Eq + Hash + Borrow<str>> GrantSet<T> {
    pub fn contains(&self, name: &str) -> bool {
        self.items.contains(name)
    }

    /// True if at least one of `names` is granted.
    ///
    /// An empty requirement is never satisfied: "any of nothing" is false.
    pub fn contains_any<I, S>(&self, names: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names.into_iter().any(|name| self.contains(name.as_ref()))
    }

    /// True if every one of `names` is granted.
    ///
    /// An empty requirement is vacuously satisfied.
    pub fn contains_all<I, S>(&self, names: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names.into_iter().all(|name| self.contains(name.as_ref()))
    }

    /// Names from `names` that are not granted, in input order.
    pub fn missing<I, S>(&self, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .filter(|name| !self.contains(name.as_ref()))
            .map(|name| name.as_ref().to_string())
            .collect()
    }

    /// Granted names, sorted (for logs and diagnostics).
    pub fn sorted(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.items.iter().map(Borrow::<str>::borrow).collect();
        names.sort_unstable();
        names
    }
}

impl<T: Eq + Hash> Default for GrantSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Eq + Hash> FromIterator<T> for GrantSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<T: Eq + Hash> Extend<T> for GrantSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

impl<'a, T: Eq + Hash> IntoIterator for &'a GrantSet<T> {
    type Item = &'a T;
    type IntoIter = hash_set::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
