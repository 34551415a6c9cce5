//! TTL cache for rendered embed snippets, layered over a [`KeyValueStore`].
//!
//! One row per `(resource_type, slug, variant)`. Rows are JSON
//! `{"values": [...], "storedAt": <ms>, "ttlMs": <ms>}`. Expiry is checked
//! lazily on read and expired rows are left in place; they are overwritten on
//! the next write or swept by [`EmbedCache::clear_all`].
//!
//! Caching is best-effort: no operation returns an error. Store failures and
//! corrupt rows go to the [`WarningSink`] and read as a miss.

use crate::clock::{Clock, SystemClock};
use crate::json::parse_json_with_context;
use crate::store::{KeyValueStore, StoreError};
use crate::utils::log_if_slow;
use crate::warnings::{TracingSink, WarningSink};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Reserved prefix for every row this cache owns in a shared store.
pub const DEFAULT_KEY_PREFIX: &str = "eventscape.embed:";

pub const DEFAULT_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

const SLOW_STORE_OP: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub values: Vec<String>,
    /// Milliseconds since the Unix epoch.
    pub stored_at: i64,
    pub ttl_ms: u64,
}

impl CacheEntry {
    /// Valid iff `now - stored_at < ttl`.
    pub fn is_fresh(&self, now_ms: i64) -> bool {
        let ttl = i64::try_from(self.ttl_ms).unwrap_or(i64::MAX);
        now_ms.saturating_sub(self.stored_at) < ttl
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("failed to read cache row {key}")]
    Read {
        key: String,
        #[source]
        source: StoreError,
    },
    #[error("failed to write cache row {key}")]
    Write {
        key: String,
        #[source]
        source: StoreError,
    },
    #[error("failed to remove cache row {key}")]
    Remove {
        key: String,
        #[source]
        source: StoreError,
    },
    #[error("failed to enumerate store keys")]
    Enumerate(#[source] StoreError),
    #[error("cache row {key} is corrupt: {detail}")]
    Corrupt { key: String, detail: String },
    #[error("failed to serialize cache entry")]
    Serialize(#[source] serde_json::Error),
}

pub struct EmbedCache<S> {
    store: S,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn WarningSink>,
    prefix: String,
    default_ttl: Duration,
}

impl<S: KeyValueStore> EmbedCache<S> {
    /// Wall clock, `tracing` warnings, default prefix and a 7 day TTL.
    pub fn new(store: S) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            sink: Arc::new(TracingSink),
            prefix: DEFAULT_KEY_PREFIX.to_owned(),
            default_ttl: DEFAULT_TTL,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn WarningSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Replace the reserved key prefix. It must not be a prefix of any key
    /// owned by someone else in the same store, or `clear_all` will remove it.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Derive the store key for a resource.
    ///
    /// Components are percent-encoded, so none of them can contain the `:`
    /// separator and distinct tuples always map to distinct keys.
    pub fn key(&self, resource_type: &str, slug: &str, variant: &str) -> String {
        format!(
            "{}{}:{}:{}",
            self.prefix,
            urlencoding::encode(resource_type),
            urlencoding::encode(slug),
            urlencoding::encode(variant),
        )
    }

    /// Return the cached values if the row exists, parses and is fresh.
    pub fn get(&self, resource_type: &str, slug: &str, variant: &str) -> Option<Vec<String>> {
        let key = self.key(resource_type, slug, variant);

        let start = Instant::now();
        let raw = self.store.get_item(&key);
        log_if_slow(start, SLOW_STORE_OP, "embed cache read");

        let raw = match raw {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key, "embed cache miss");
                return None;
            }
            Err(source) => {
                self.report(
                    "Failed to read embed cache",
                    CacheError::Read { key, source },
                );
                return None;
            }
        };

        let entry: CacheEntry = match parse_json_with_context(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                self.report(
                    "Discarding corrupt embed cache row",
                    CacheError::Corrupt {
                        key,
                        detail: e.to_string(),
                    },
                );
                return None;
            }
        };

        if !entry.is_fresh(self.clock.now_millis()) {
            debug!(key, stored_at = entry.stored_at, "embed cache entry expired");
            return None;
        }

        debug!(key, values = entry.values.len(), "embed cache hit");
        Some(entry.values)
    }

    /// Store values under the default TTL.
    pub fn set(&self, resource_type: &str, slug: &str, values: Vec<String>, variant: &str) {
        self.set_with_ttl(resource_type, slug, values, variant, self.default_ttl);
    }

    /// Store values, overwriting any previous row for the same key.
    pub fn set_with_ttl(
        &self,
        resource_type: &str,
        slug: &str,
        values: Vec<String>,
        variant: &str,
        ttl: Duration,
    ) {
        let key = self.key(resource_type, slug, variant);
        let entry = CacheEntry {
            values,
            stored_at: self.clock.now_millis(),
            ttl_ms: u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX),
        };

        let body = match serde_json::to_string(&entry) {
            Ok(body) => body,
            Err(e) => {
                self.report("Failed to serialize embed cache entry", CacheError::Serialize(e));
                return;
            }
        };

        let start = Instant::now();
        let result = self.store.set_item(&key, &body);
        log_if_slow(start, SLOW_STORE_OP, "embed cache write");

        match result {
            Ok(()) => debug!(key, ttl_ms = entry.ttl_ms, "embed cache stored"),
            Err(source) => self.report(
                "Failed to write embed cache",
                CacheError::Write { key, source },
            ),
        }
    }

    /// Remove the single row for this resource.
    pub fn clear(&self, resource_type: &str, slug: &str, variant: &str) {
        let key = self.key(resource_type, slug, variant);
        if let Err(source) = self.store.remove_item(&key) {
            self.report(
                "Failed to clear embed cache",
                CacheError::Remove { key, source },
            );
        }
    }

    /// Remove every row carrying this cache's prefix and nothing else.
    ///
    /// Returns the number of rows removed.
    pub fn clear_all(&self) -> usize {
        let keys = match self.store.keys() {
            Ok(keys) => keys,
            Err(source) => {
                self.report(
                    "Failed to enumerate embed cache rows",
                    CacheError::Enumerate(source),
                );
                return 0;
            }
        };

        let mut removed = 0;
        for key in keys.into_iter().filter(|k| k.starts_with(&self.prefix)) {
            match self.store.remove_item(&key) {
                Ok(()) => removed += 1,
                Err(source) => self.report(
                    "Failed to clear embed cache row",
                    CacheError::Remove { key, source },
                ),
            }
        }

        debug!(removed, "embed cache cleared");
        removed
    }

    fn report(&self, message: &str, error: CacheError) {
        self.sink.warn(message, &error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn key_layout() {
        let cache = EmbedCache::new(MemoryStore::new());
        assert_eq!(
            cache.key("events", "jazz-night", "minimal"),
            "eventscape.embed:events:jazz-night:minimal"
        );
    }

    #[test]
    fn key_components_cannot_collide() {
        let cache = EmbedCache::new(MemoryStore::new());
        // Without encoding both of these would be "...a:b:c:d".
        let left = cache.key("a:b", "c", "d");
        let right = cache.key("a", "b:c", "d");
        assert_ne!(left, right);
        assert!(left.starts_with(DEFAULT_KEY_PREFIX));
        assert_eq!(left, "eventscape.embed:a%3Ab:c:d");
    }

    #[test]
    fn freshness_boundary() {
        let entry = CacheEntry {
            values: vec![],
            stored_at: 1_000,
            ttl_ms: 500,
        };
        assert!(entry.is_fresh(1_000));
        assert!(entry.is_fresh(1_499));
        assert!(!entry.is_fresh(1_500));
    }

    #[test]
    fn entry_wire_format() {
        let entry = CacheEntry {
            values: vec!["<iframe></iframe>".into()],
            stored_at: 42,
            ttl_ms: 1000,
        };
        assert_eq!(
            serde_json::to_string(&entry).unwrap(),
            r#"{"values":["<iframe></iframe>"],"storedAt":42,"ttlMs":1000}"#
        );
    }

    #[test]
    fn default_ttl_is_seven_days() {
        let cache = EmbedCache::new(MemoryStore::new());
        assert_eq!(cache.default_ttl().as_millis(), 604_800_000);
    }
}
