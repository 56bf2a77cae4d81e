//! In-process expiring store.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;

use crate::cache::{CacheResult, CacheStore, CacheValue};
use crate::clock::{Clock, SystemClock};
use crate::observability::metrics;

#[derive(Debug, Clone)]
struct Entry {
    value: CacheValue,
    expires_at: DateTime<Utc>,
}

impl Entry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// A thread-safe store with per-entry expiry.
///
/// Cloning shares the underlying map.
#[derive(Clone)]
pub struct MemoryCache {
    inner: Arc<DashMap<String, Entry>>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCache {
    /// Create an empty store on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty store that measures expiry against `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            clock,
        }
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.inner.len();
        self.inner.retain(|_, entry| entry.is_live(now));
        let removed = before.saturating_sub(self.inner.len());
        if removed > 0 {
            tracing::debug!(removed, remaining = self.inner.len(), "Purged expired cache entries");
        }
        metrics::record_cache_entries(self.inner.len());
        removed
    }
}

impl CacheStore for MemoryCache {
    fn set(&self, key: &str, value: CacheValue, ttl: Duration) -> CacheResult<()> {
        let now = self.clock.now();
        let expires_at = TimeDelta::from_std(ttl)
            .ok()
            .and_then(|delta| now.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        self.inner.insert(key.to_string(), Entry { value, expires_at });
        metrics::record_cache_entries(self.inner.len());
        Ok(())
    }

    fn get(&self, key: &str) -> CacheResult<Option<CacheValue>> {
        let now = self.clock.now();
        match self.inner.get(key) {
            Some(entry) if entry.is_live(now) => return Ok(Some(entry.value.clone())),
            Some(_) => {}
            None => return Ok(None),
        }

        // Read guard is gone; re-check under the write lock so a concurrent refresh survives.
        self.inner.remove_if(key, |_, entry| !entry.is_live(now));
        Ok(None)
    }
}
