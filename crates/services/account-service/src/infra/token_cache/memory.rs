//! Process-local recovery token cache.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use common::AppResult;
use domain::TOKEN_CACHE_MAX_ENTRIES;

use super::RecoveryTokenCache;
use crate::infra::clock::{Clock, SystemClock};

/// Longest lifetime honoured (100 years); larger values are clamped.
const MAX_TTL_SECONDS: u64 = 100 * 365 * 24 * 60 * 60;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: DateTime<Utc>,
}

/// In-memory cache with expire-after-write and a bounded entry count.
///
/// Expired entries are dropped lazily on read, and in bulk when the cache is
/// full. If it is still full after that, the entry closest to expiry goes.
pub struct MemoryTokenCache {
    entries: DashMap<String, Entry>,
    ttl: Duration,
    max_entries: usize,
    clock: Arc<dyn Clock>,
}

impl MemoryTokenCache {
    /// Create a cache on the system clock with the default capacity.
    pub fn new(ttl_seconds: u64) -> Self {
        Self::with_clock(ttl_seconds, TOKEN_CACHE_MAX_ENTRIES, Arc::new(SystemClock))
    }

    /// Create a cache with an explicit capacity and time source.
    pub fn with_clock(ttl_seconds: u64, max_entries: usize, clock: Arc<dyn Clock>) -> Self {
        let ttl = Duration::seconds(ttl_seconds.min(MAX_TTL_SECONDS) as i64);
        Self {
            entries: DashMap::new(),
            ttl,
            max_entries: max_entries.max(1),
            clock,
        }
    }

    /// Number of entries currently held, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn make_room(&self, now: DateTime<Utc>) {
        self.entries.retain(|_, entry| entry.expires_at > now);

        if self.entries.len() < self.max_entries {
            return;
        }

        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.value().expires_at)
            .map(|entry| entry.key().clone());

        if let Some(key) = oldest {
            self.entries.remove(&key);
            tracing::debug!(key = %key, "Evicted recovery token, cache full");
        }
    }
}

#[async_trait]
impl RecoveryTokenCache for MemoryTokenCache {
    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let now = self.clock.now();

        if !self.entries.contains_key(key) && self.entries.len() >= self.max_entries {
            self.make_room(now);
        }

        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: now + self.ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let now = self.clock.now();

        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > now {
                return Ok(Some(entry.value.clone()));
            }
        }

        self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
        Ok(None)
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
