use std::collections::btree_map;
use std::collections::BTreeMap;

/// Map keyed by SQL identifiers, compared without regard to case.
///
/// Iteration is in lexical order of the normalized key, which makes it the
/// deterministic traversal order for everything keyed by name.
#[derive(Debug, Clone)]
pub struct IdentMap<V> {
    entries: BTreeMap<String, V>,
}

impl<V> Default for IdentMap<V> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

/// Normalized form of an identifier used as a map key.
pub fn normalize(name: &str) -> String {
    name.to_lowercase()
}

impl<V> IdentMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning the previous value stored under a name that
    /// differs at most in case.
    pub fn insert(&mut self, name: &str, value: V) -> Option<V> {
        self.entries.insert(normalize(name), value)
    }

    pub fn get(&self, name: &str) -> Option<&V> {
        self.entries.get(&normalize(name))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut V> {
        self.entries.get_mut(&normalize(name))
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.contains_key(&normalize(name))
    }

    pub fn remove(&mut self, name: &str) -> Option<V> {
        self.entries.remove(&normalize(name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn values(&self) -> btree_map::Values<'_, String, V> {
        self.entries.values()
    }

    /// Iterate `(normalized key, value)` pairs in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, V> {
        self.entries.iter()
    }
}

impl<'a, V> IntoIterator for &'a IdentMap<V> {
    type Item = (&'a String, &'a V);
    type IntoIter = btree_map::Iter<'a, String, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
