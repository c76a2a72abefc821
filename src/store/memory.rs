//! In-memory store.

use std::cell::RefCell;

use futures::FutureExt;
use futures::future::{self, LocalBoxFuture};
use serde_json::{Map, Value};

use super::{KeyValueStore, StoreError};

/// Volatile [`KeyValueStore`] backed by a JSON map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<Map<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get<'a>(&'a self, key: &'a str) -> LocalBoxFuture<'a, Result<Option<Value>, StoreError>> {
        let value = self.entries.borrow().get(key).cloned();
        future::ready(Ok(value)).boxed_local()
    }

    fn set<'a>(&'a self, key: &'a str, value: Value) -> LocalBoxFuture<'a, Result<(), StoreError>> {
        self.entries.borrow_mut().insert(key.to_string(), value);
        future::ready(Ok(())).boxed_local()
    }

    fn remove<'a>(&'a self, keys: &'a [String]) -> LocalBoxFuture<'a, Result<(), StoreError>> {
        let mut entries = self.entries.borrow_mut();
        for key in keys {
            entries.remove(key);
        }
        future::ready(Ok(())).boxed_local()
    }

    fn entries(&self) -> LocalBoxFuture<'_, Result<Map<String, Value>, StoreError>> {
        let snapshot = self.entries.borrow().clone();
        future::ready(Ok(snapshot)).boxed_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn set_then_get() {
        let store = MemoryStore::new();
        store.set("k", json!({"a": 1})).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(json!({"a": 1})));
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_overwrites() {
        let store = MemoryStore::new();
        store.set("k", json!(1)).await.unwrap();
        store.set("k", json!(2)).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(json!(2)));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn remove_ignores_missing_keys() {
        let store = MemoryStore::new();
        store.set("a", json!(true)).await.unwrap();
        store.set("b", json!(true)).await.unwrap();
        store
            .remove(&["a".to_string(), "zzz".to_string()])
            .await
            .unwrap();
        let all = store.entries().await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(all.contains_key("b"));
    }
}
