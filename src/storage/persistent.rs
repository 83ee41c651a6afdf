use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::storage::{load_json, save_json, Store};

/// A single value kept under one store key, decoded at most once.
///
/// The decoded value is cached after the first [`get`](Self::get);
/// [`set`](Self::set) replaces the cache and writes through. A failed write
/// still updates the cache so readers see the newest value.
pub struct Persistent<T> {
    store: Arc<dyn Store>,
    key: String,
    cached: Option<Option<T>>,
}

impl<T: Serialize + DeserializeOwned> Persistent<T> {
    pub fn new(store: Arc<dyn Store>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            cached: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn get(&mut self) -> Option<&T> {
        if self.cached.is_none() {
            self.cached = Some(load_json(self.store.as_ref(), &self.key));
        }
        self.cached.as_ref().and_then(Option::as_ref)
    }

    /// Returns whether the value reached the store.
    pub fn set(&mut self, value: T) -> bool {
        let written = save_json(self.store.as_ref(), &self.key, &value);
        self.cached = Some(Some(value));
        written
    }

    pub fn clear(&mut self) {
        if let Err(err) = self.store.remove(&self.key) {
            log::warn!("failed to remove `{}`: {err:#}", self.key);
        }
        self.cached = Some(None);
    }

    /// Drop the cached value; the next `get` decodes from the store again.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn caches_until_invalidated() {
        let store = Arc::new(MemoryStore::new());
        let mut value: Persistent<u32> = Persistent::new(store.clone(), "counter");
        assert_eq!(value.get(), None);

        assert!(value.set(3));
        assert_eq!(value.get(), Some(&3));

        let mut other: Persistent<u32> = Persistent::new(store.clone(), "counter");
        assert!(other.set(9));
        assert_eq!(value.get(), Some(&3));
        value.invalidate();
        assert_eq!(value.get(), Some(&9));
    }

    #[test]
    fn failed_write_keeps_memory_value() {
        let store = Arc::new(MemoryStore::new());
        store.set_fail_writes(true);
        let mut value: Persistent<String> = Persistent::new(store.clone(), "name");
        assert!(!value.set("easy".to_string()));
        assert_eq!(value.get().map(String::as_str), Some("easy"));
        value.invalidate();
        assert_eq!(value.get(), None);
    }

    #[test]
    fn clear_removes_document() {
        let store = Arc::new(MemoryStore::new());
        let mut value: Persistent<u8> = Persistent::new(store.clone(), "flag");
        value.set(1);
        value.clear();
        assert_eq!(value.get(), None);
        assert!(!store.contains("flag").expect("contains"));
    }
}
