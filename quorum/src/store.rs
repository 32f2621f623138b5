//! The decided key/value state. Mutated only from the learner's apply
//! step and the transaction coordinator's compensation step.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Thread-safe key/value mapping. Cheap to clone; clones share the map.
///
/// Reads are local last-applied state and never wait on consensus, so a
/// read may observe a stale value while a decision is in flight.
#[derive(Clone, Debug, Default)]
pub struct Store {
    map: Arc<Mutex<HashMap<String, String>>>,
}

impl Store {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value for `key`, if any.
    pub fn get(&self, key: &str) -> Option<String> {
        self.map.lock().unwrap().get(key).cloned()
    }

    /// Insert (`Some`) or remove (`None`) and return the prior value.
    pub fn apply(&self, key: &str, value: Option<String>) -> Option<String> {
        let mut map = self.map.lock().unwrap();
        match value {
            Some(v) => map.insert(key.to_string(), v),
            None => map.remove(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_returns_prior_value() {
        let store = Store::new();
        assert_eq!(store.apply("k", Some("1".into())), None);
        assert_eq!(store.apply("k", Some("2".into())), Some("1".into()));
        assert_eq!(store.get("k"), Some("2".into()));
    }

    #[test]
    fn none_removes_the_key() {
        let store = Store::new();
        store.apply("k", Some("1".into()));
        assert_eq!(store.apply("k", None), Some("1".into()));
        assert_eq!(store.get("k"), None);
        assert_eq!(store.apply("k", None), None);
    }

    #[test]
    fn clones_share_state() {
        let a = Store::new();
        let b = a.clone();
        a.apply("k", Some("v".into()));
        assert_eq!(b.get("k"), Some("v".into()));
    }
}
