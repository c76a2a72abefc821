//! JSON-file store.
//!
//! The whole store is a single JSON object on disk. A handle reads the
//! file once, keeps the map in memory and flushes the full map after
//! every change. Flushes are serialised and land via temp file + rename,
//! so an interrupted write never leaves a half-written store behind.
//!
//! An unparseable file fails reads, but the next write replaces it.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use super::{KeyValueStore, StoreError};

/// Persistent [`KeyValueStore`] backed by one JSON file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: RefCell<Option<Map<String, Value>>>,
    flush_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open a store at `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: RefCell::new(None),
            flush_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Map<String, Value>, StoreError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(Map::new());
        }
        serde_json::from_slice(&raw).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    async fn ensure_loaded(&self) -> Result<(), StoreError> {
        if self.entries.borrow().is_some() {
            return Ok(());
        }
        let map = self.load().await?;
        // Another operation may have loaded the file while we awaited.
        self.entries.borrow_mut().get_or_insert(map);
        Ok(())
    }

    /// Apply `change` to the in-memory map and flush if it reports a
    /// modification. A corrupt file is discarded.
    async fn modify(
        &self,
        change: impl FnOnce(&mut Map<String, Value>) -> bool,
    ) -> Result<(), StoreError> {
        match self.ensure_loaded().await {
            Ok(()) => {}
            Err(e @ StoreError::Corrupt { .. }) => {
                tracing::warn!(error = %e, "replacing unreadable store file");
            }
            Err(e) => return Err(e),
        }
        let changed = change(self.entries.borrow_mut().get_or_insert_with(Map::new));
        if !changed {
            return Ok(());
        }
        self.flush().await
    }

    async fn flush(&self) -> Result<(), StoreError> {
        let _guard = self.flush_lock.lock().await;
        // Snapshot under the lock so the last flush carries every change.
        let snapshot = self.entries.borrow().clone().unwrap_or_default();
        self.save(&snapshot).await
    }

    async fn save(&self, entries: &Map<String, Value>) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        let body = serde_json::to_vec_pretty(entries).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        let temp_path = self.temp_path();
        tokio::fs::write(&temp_path, body).await.map_err(io_err)?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(io_err)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl KeyValueStore for JsonFileStore {
    fn get<'a>(&'a self, key: &'a str) -> LocalBoxFuture<'a, Result<Option<Value>, StoreError>> {
        async move {
            self.ensure_loaded().await?;
            Ok(self
                .entries
                .borrow()
                .as_ref()
                .and_then(|entries| entries.get(key).cloned()))
        }
        .boxed_local()
    }

    fn set<'a>(&'a self, key: &'a str, value: Value) -> LocalBoxFuture<'a, Result<(), StoreError>> {
        self.modify(move |entries| {
            entries.insert(key.to_string(), value);
            true
        })
        .boxed_local()
    }

    fn remove<'a>(&'a self, keys: &'a [String]) -> LocalBoxFuture<'a, Result<(), StoreError>> {
        self.modify(move |entries| {
            let before = entries.len();
            for key in keys {
                entries.remove(key);
            }
            entries.len() != before
        })
        .boxed_local()
    }

    fn entries(&self) -> LocalBoxFuture<'_, Result<Map<String, Value>, StoreError>> {
        async move {
            self.ensure_loaded().await?;
            Ok(self.entries.borrow().clone().unwrap_or_default())
        }
        .boxed_local()
    }
}
