//! Resolver cache: time-bounded `(provider, id) → keyword` lookups.
//!
//! Entries are stored in an external [`KeyValueStore`] under
//! `"{provider}_{id}"` as `{"text": keyword, "timestamp": epoch_ms}`.
//! An entry is fresh while `now - timestamp < ttl`. Expired entries are
//! treated as absent on read and only physically removed by [`sweep`].
//!
//! Every store failure degrades silently: a failed read is a miss and a
//! failed write is dropped. The next resolution retries either way.
//!
//! [`sweep`]: ResolverCache::sweep

use std::rc::Rc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::emote::Provider;
use crate::store::KeyValueStore;

/// Default entry lifetime: 10 days.
pub const DEFAULT_TTL: Duration = Duration::from_secs(10 * 24 * 60 * 60);

/// Cache tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// How long a resolved keyword stays valid.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl: DEFAULT_TTL }
    }
}

/// Source of wall-clock time in Unix epoch milliseconds.
pub trait Clock {
    fn now_millis(&self) -> u64;
}

/// [`Clock`] reading the system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        epoch_millis()
    }
}

/// Current time as Unix epoch milliseconds.
///
/// A clock set before 1970 reads as 0, which makes every entry look
/// fresh rather than failing.
pub fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// A persisted resolution. Never mutated, only replaced or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The resolved keyword.
    pub text: String,
    /// Unix epoch milliseconds when the keyword was resolved.
    pub timestamp: u64,
}

impl CacheEntry {
    fn is_fresh(&self, now: u64, ttl_ms: u64) -> bool {
        now.saturating_sub(self.timestamp) < ttl_ms
    }
}

/// Storage key for a cached emote.
pub fn cache_key(provider: Provider, id: &str) -> String {
    format!("{provider}_{id}")
}

/// Time-bounded keyword cache over a [`KeyValueStore`].
pub struct ResolverCache {
    store: Rc<dyn KeyValueStore>,
    clock: Rc<dyn Clock>,
    ttl_ms: u64,
}

impl ResolverCache {
    pub fn new(store: Rc<dyn KeyValueStore>, config: CacheConfig) -> Self {
        Self::with_clock(store, config, Rc::new(SystemClock))
    }

    pub fn with_clock(
        store: Rc<dyn KeyValueStore>,
        config: CacheConfig,
        clock: Rc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            clock,
            ttl_ms: u64::try_from(config.ttl.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Return the cached keyword if present and unexpired.
    pub async fn get(&self, provider: Provider, id: &str) -> Option<String> {
        let key = cache_key(provider, id);
        let value = match self.store.get(&key).await {
            Ok(Some(value)) => value,
            Ok(None) => return None,
            Err(e) => {
                tracing::debug!(%key, error = %e, "cache read failed, treating as miss");
                return None;
            }
        };
        let entry: CacheEntry = match serde_json::from_value(value) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(%key, error = %e, "unreadable cache entry, treating as miss");
                return None;
            }
        };
        if !entry.is_fresh(self.clock.now_millis(), self.ttl_ms) || entry.text.is_empty() {
            return None;
        }
        Some(entry.text)
    }

    /// Store `keyword` as resolved now, replacing any previous entry.
    pub async fn put(&self, provider: Provider, id: &str, keyword: &str) {
        let key = cache_key(provider, id);
        let entry = CacheEntry {
            text: keyword.to_string(),
            timestamp: self.clock.now_millis(),
        };
        let value = match serde_json::to_value(&entry) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(%key, error = %e, "cache entry not serializable");
                return;
            }
        };
        if let Err(e) = self.store.set(&key, value).await {
            tracing::debug!(%key, error = %e, "cache write dropped");
        }
    }

    /// Delete every stored entry whose age is at least the TTL.
    ///
    /// Only values carrying a numeric `timestamp` are considered. Returns
    /// the number of removed entries; a store failure removes nothing.
    pub async fn sweep(&self) -> usize {
        let entries = match self.store.entries().await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, "cache sweep skipped");
                return 0;
            }
        };
        let now = self.clock.now_millis();
        let expired: Vec<String> = entries
            .into_iter()
            .filter(|(_, value)| {
                value
                    .get("timestamp")
                    .and_then(serde_json::Value::as_u64)
                    .is_some_and(|ts| now.saturating_sub(ts) >= self.ttl_ms)
            })
            .map(|(key, _)| key)
            .collect();

        if expired.is_empty() {
            return 0;
        }
        if let Err(e) = self.store.remove(&expired).await {
            tracing::warn!(error = %e, count = expired.len(), "cache sweep failed");
            return 0;
        }
        tracing::info!(removed = expired.len(), "cleaned up expired cache entries");
        expired.len()
    }
}
