//! Authoritative In-Memory Store
//!
//! Two parallel maps: key to value, and key to absolute expiration deadline
//! (seconds since the Unix epoch). The deadline map is always a subset of
//! the value map; [`Store::remove`] drops both entries together so the maps
//! cannot drift apart.
//!
//! `Store` has no locking of its own. The engine wraps it in the store
//! mutex and every caller goes through that.

use std::collections::HashMap;

use super::value::Value;

/// The in-memory key-value mapping plus expiration deadlines.
#[derive(Debug, Default)]
pub struct Store {
    entries: HashMap<String, Value>,
    deadlines: HashMap<String, i64>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a value. Does not touch the deadline map.
    pub fn insert(&mut self, key: String, value: Value) {
        self.entries.insert(key, value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Removes a key from both maps, returning the value if it was present.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.deadlines.remove(key);
        self.entries.remove(key)
    }

    /// Removes the key only if its deadline has passed (`now > deadline`).
    ///
    /// # Returns
    ///
    /// The evicted value, or `None` if the key has no deadline or is still
    /// live.
    pub fn remove_if_expired(&mut self, key: &str, now: i64) -> Option<Value> {
        match self.deadlines.get(key) {
            Some(&deadline) if now > deadline => self.remove(key),
            _ => None,
        }
    }

    /// The absolute deadline for a key, if one is set.
    pub fn deadline(&self, key: &str) -> Option<i64> {
        self.deadlines.get(key).copied()
    }

    /// Sets the deadline for a key. The key is expected to be present; the
    /// subset invariant is the caller's responsibility on this path.
    pub fn set_deadline(&mut self, key: &str, deadline: i64) {
        self.deadlines.insert(key.to_string(), deadline);
    }

    /// Clears any deadline for a key, making it persistent.
    pub fn clear_deadline(&mut self, key: &str) {
        self.deadlines.remove(key);
    }

    /// Keys whose deadline is strictly in the past.
    pub fn expired_keys(&self, now: i64) -> Vec<String> {
        self.deadlines
            .iter()
            .filter(|(_, &deadline)| now > deadline)
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Keys whose deadline is at or before `now`. The snapshot path uses
    /// this inclusive form.
    pub fn due_keys(&self, now: i64) -> Vec<String> {
        self.deadlines
            .iter()
            .filter(|(_, &deadline)| deadline <= now)
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn deadline_keys(&self) -> impl Iterator<Item = &String> {
        self.deadlines.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_remove() {
        let mut store = Store::new();
        store.insert("a".into(), Value::Int(1));

        assert_eq!(store.get("a"), Some(&Value::Int(1)));
        assert_eq!(store.remove("a"), Some(Value::Int(1)));
        assert_eq!(store.get("a"), None);
        assert_eq!(store.remove("a"), None);
    }

    #[test]
    fn test_remove_drops_deadline() {
        let mut store = Store::new();
        store.insert("a".into(), Value::Bool(true));
        store.set_deadline("a", 100);

        store.remove("a");
        assert_eq!(store.deadline("a"), None);
        assert_eq!(store.deadline_keys().count(), 0);
    }

    #[test]
    fn test_remove_if_expired() {
        let mut store = Store::new();
        store.insert("a".into(), Value::Int(1));
        store.set_deadline("a", 100);

        // Still live at the deadline itself.
        assert_eq!(store.remove_if_expired("a", 100), None);
        assert!(store.contains("a"));

        assert_eq!(store.remove_if_expired("a", 101), Some(Value::Int(1)));
        assert!(!store.contains("a"));
    }

    #[test]
    fn test_expired_and_due_keys() {
        let mut store = Store::new();
        for (key, deadline) in [("a", 99), ("b", 100), ("c", 101)] {
            store.insert(key.into(), Value::Int(0));
            store.set_deadline(key, deadline);
        }

        let mut expired = store.expired_keys(100);
        expired.sort();
        assert_eq!(expired, vec!["a"]);

        let mut due = store.due_keys(100);
        due.sort();
        assert_eq!(due, vec!["a", "b"]);
    }

    #[test]
    fn test_clear_deadline() {
        let mut store = Store::new();
        store.insert("a".into(), Value::Int(1));
        store.set_deadline("a", 100);
        store.clear_deadline("a");

        assert_eq!(store.deadline("a"), None);
        assert!(store.contains("a"));
    }
}
