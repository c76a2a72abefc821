//! Key-value storage abstraction.
//!
//! Both the persisted settings and the resolver cache live in an
//! external asynchronous key-value service. The only ordering guarantee
//! is per-key last-write-wins. Implementations are single-threaded; the
//! returned futures are not `Send`.

pub mod file;
pub mod memory;

use futures::future::LocalBoxFuture;
use serde_json::{Map, Value};

pub use file::JsonFileStore;
pub use memory::MemoryStore;

/// Errors returned by storage backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("corrupt store {path}: {source}")]
    Corrupt {
        path: std::path::PathBuf,
        source: serde_json::Error,
    },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// An asynchronous string-keyed store of JSON values.
pub trait KeyValueStore {
    /// Read a single key. `Ok(None)` if the key is absent.
    fn get<'a>(&'a self, key: &'a str) -> LocalBoxFuture<'a, Result<Option<Value>, StoreError>>;

    /// Write a single key, replacing any previous value.
    fn set<'a>(&'a self, key: &'a str, value: Value) -> LocalBoxFuture<'a, Result<(), StoreError>>;

    /// Remove every listed key. Missing keys are ignored.
    fn remove<'a>(&'a self, keys: &'a [String]) -> LocalBoxFuture<'a, Result<(), StoreError>>;

    /// Enumerate every stored entry.
    fn entries(&self) -> LocalBoxFuture<'_, Result<Map<String, Value>, StoreError>>;
}
