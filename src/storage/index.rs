//! Reverse Index Set
//!
//! Three secondary structures for point-in-time lookup:
//!
//! - **value index**: stringified value → set of keys holding it
//! - **prefix index**: every prefix of a key → set of keys starting with it
//! - **suffix index**: every suffix of a key → set of keys ending with it
//!
//! A key of length N (in characters) lands in N prefix entries and N suffix
//! entries, so searches are exact-match map lookups rather than scans.
//! Member sets are never left empty: when the last key leaves an entry the
//! entry itself is dropped.
//!
//! The engine guards the whole set with one reader/writer lock: exclusive
//! for `add`/`remove`, shared for searches.

use std::collections::{HashMap, HashSet};

use super::value::Value;

/// Which of the three indexes a [`ReverseIndex`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Value,
    Prefix,
    Suffix,
}

impl IndexKind {
    /// The label used in the on-disk index dump.
    pub fn label(&self) -> &'static str {
        match self {
            IndexKind::Value => "VALUE",
            IndexKind::Prefix => "PREFIX",
            IndexKind::Suffix => "SUFFIX",
        }
    }
}

/// One mapping from index key to the set of store keys that match it.
#[derive(Debug)]
pub struct ReverseIndex {
    kind: IndexKind,
    entries: HashMap<String, HashSet<String>>,
}

impl ReverseIndex {
    fn new(kind: IndexKind) -> Self {
        Self {
            kind,
            entries: HashMap::new(),
        }
    }

    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    pub fn entries(&self) -> &HashMap<String, HashSet<String>> {
        &self.entries
    }

    fn add_key(&mut self, index_key: &str, store_key: &str) {
        self.entries
            .entry(index_key.to_string())
            .or_default()
            .insert(store_key.to_string());
    }

    fn remove_key(&mut self, index_key: &str, store_key: &str) {
        if let Some(members) = self.entries.get_mut(index_key) {
            members.remove(store_key);
            if members.is_empty() {
                self.entries.remove(index_key);
            }
        }
    }

    /// A snapshot copy of the member set for `index_key` (empty if absent).
    pub fn lookup(&self, index_key: &str) -> Vec<String> {
        self.entries
            .get(index_key)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }
}

/// Every prefix of `key`, shortest first, split at char boundaries.
fn prefixes(key: &str) -> impl Iterator<Item = &str> {
    key.char_indices().map(|(i, c)| &key[..i + c.len_utf8()])
}

/// Every suffix of `key`, longest first, split at char boundaries.
fn suffixes(key: &str) -> impl Iterator<Item = &str> {
    key.char_indices().map(|(i, _)| &key[i..])
}

/// The three reverse indexes, mutated together so they stay in step with
/// the store.
#[derive(Debug)]
pub struct IndexSet {
    value: ReverseIndex,
    prefix: ReverseIndex,
    suffix: ReverseIndex,
}

impl Default for IndexSet {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexSet {
    pub fn new() -> Self {
        Self {
            value: ReverseIndex::new(IndexKind::Value),
            prefix: ReverseIndex::new(IndexKind::Prefix),
            suffix: ReverseIndex::new(IndexKind::Suffix),
        }
    }

    /// Registers a live `(key, value)` pair in all three indexes.
    pub fn add(&mut self, key: &str, value: &Value) {
        self.value.add_key(&value.to_string(), key);
        for prefix in prefixes(key) {
            self.prefix.add_key(prefix, key);
        }
        for suffix in suffixes(key) {
            self.suffix.add_key(suffix, key);
        }
    }

    /// Inverse of [`IndexSet::add`]. `value` must be the value the key was
    /// registered with, otherwise the value-index entry cannot be found.
    pub fn remove(&mut self, key: &str, value: &Value) {
        self.value.remove_key(&value.to_string(), key);
        for prefix in prefixes(key) {
            self.prefix.remove_key(prefix, key);
        }
        for suffix in suffixes(key) {
            self.suffix.remove_key(suffix, key);
        }
    }

    /// Rebuilds all three indexes from scratch.
    pub fn rebuild<'a>(&mut self, live: impl Iterator<Item = (&'a String, &'a Value)>) {
        self.value.entries.clear();
        self.prefix.entries.clear();
        self.suffix.entries.clear();
        for (key, value) in live {
            self.add(key, value);
        }
    }

    pub fn search_value(&self, value: &str) -> Vec<String> {
        self.value.lookup(value)
    }

    pub fn search_prefix(&self, prefix: &str) -> Vec<String> {
        self.prefix.lookup(prefix)
    }

    pub fn search_suffix(&self, suffix: &str) -> Vec<String> {
        self.suffix.lookup(suffix)
    }

    pub fn value_index(&self) -> &ReverseIndex {
        &self.value
    }

    pub fn prefix_index(&self) -> &ReverseIndex {
        &self.prefix
    }

    pub fn suffix_index(&self) -> &ReverseIndex {
        &self.suffix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut v: Vec<String>) -> Vec<String> {
        v.sort();
        v
    }

    #[test]
    fn test_add_registers_all_affixes() {
        let mut indexes = IndexSet::new();
        indexes.add("user:1", &Value::String("john".into()));

        assert_eq!(indexes.search_value("john"), vec!["user:1"]);
        for prefix in ["u", "us", "use", "user", "user:", "user:1"] {
            assert_eq!(indexes.search_prefix(prefix), vec!["user:1"], "{prefix}");
        }
        for suffix in ["user:1", "ser:1", "er:1", "r:1", ":1", "1"] {
            assert_eq!(indexes.search_suffix(suffix), vec!["user:1"], "{suffix}");
        }
    }

    #[test]
    fn test_remove_prunes_empty_entries() {
        let mut indexes = IndexSet::new();
        indexes.add("ab", &Value::Int(1));
        indexes.remove("ab", &Value::Int(1));

        assert!(indexes.value_index().entries().is_empty());
        assert!(indexes.prefix_index().entries().is_empty());
        assert!(indexes.suffix_index().entries().is_empty());
    }

    #[test]
    fn test_shared_value_entry() {
        let mut indexes = IndexSet::new();
        indexes.add("a", &Value::String("x".into()));
        indexes.add("b", &Value::String("x".into()));

        assert_eq!(sorted(indexes.search_value("x")), vec!["a", "b"]);

        indexes.remove("a", &Value::String("x".into()));
        assert_eq!(indexes.search_value("x"), vec!["b"]);
    }

    #[test]
    fn test_typed_values_collide_by_stringification() {
        let mut indexes = IndexSet::new();
        indexes.add("a", &Value::Int(1));
        indexes.add("b", &Value::String("1".into()));

        assert_eq!(sorted(indexes.search_value("1")), vec!["a", "b"]);
    }

    #[test]
    fn test_missing_lookup_is_empty() {
        let indexes = IndexSet::new();
        assert!(indexes.search_value("nope").is_empty());
        assert!(indexes.search_prefix("nope").is_empty());
        assert!(indexes.search_suffix("nope").is_empty());
    }

    #[test]
    fn test_multibyte_keys() {
        let mut indexes = IndexSet::new();
        indexes.add("héllo", &Value::Int(1));

        assert_eq!(indexes.search_prefix("hé"), vec!["héllo"]);
        assert_eq!(indexes.search_suffix("éllo"), vec!["héllo"]);

        indexes.remove("héllo", &Value::Int(1));
        assert!(indexes.prefix_index().entries().is_empty());
        assert!(indexes.suffix_index().entries().is_empty());
    }

    #[test]
    fn test_rebuild() {
        let mut indexes = IndexSet::new();
        indexes.add("stale", &Value::Int(9));

        let live = vec![
            ("a".to_string(), Value::Int(1)),
            ("b".to_string(), Value::Int(2)),
        ];
        indexes.rebuild(live.iter().map(|(k, v)| (k, v)));

        assert!(indexes.search_value("9").is_empty());
        assert_eq!(indexes.search_value("1"), vec!["a"]);
        assert_eq!(indexes.search_value("2"), vec!["b"]);
    }
}
