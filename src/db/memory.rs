use moka::{future::Cache, Expiry};
use std::time::{Duration, Instant};

use crate::{db::cache::CacheStore, error::AppResult};

/// Longest TTL an entry may carry; larger requests are clamped to it
pub const MAX_ENTRY_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

#[derive(Clone)]
struct MemoryEntry {
    value: String,
    ttl: Duration,
}

/// Expires every entry after the TTL it was written with
struct PerEntryTtl;

impl Expiry<String, MemoryEntry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &MemoryEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &MemoryEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

fn entry_ttl(ttl_secs: u64) -> Duration {
    Duration::from_secs(ttl_secs).min(MAX_ENTRY_TTL)
}

/// In-process cache store for single-instance deployments and tests
///
/// Bounded to `max_entries`; the least valuable entries are evicted first.
#[derive(Clone)]
pub struct MemoryStore {
    entries: Cache<String, MemoryEntry>,
}

impl MemoryStore {
    pub fn new(max_entries: u64) -> Self {
        let entries = Cache::builder()
            .max_capacity(max_entries)
            .expire_after(PerEntryTtl)
            .build();

        Self { entries }
    }

    fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.to_string())
            .collect()
    }
}

#[async_trait::async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.entries.get(key).await.map(|entry| entry.value))
    }

    async fn put(&self, key: String, value: String, ttl_secs: u64) {
        let entry = MemoryEntry {
            value,
            ttl: entry_ttl(ttl_secs),
        };
        self.entries.insert(key, entry).await;
    }

    async fn count_prefix(&self, prefix: &str) -> AppResult<usize> {
        // Settle pending evictions so the count matches what readers see
        self.entries.run_pending_tasks().await;
        Ok(self.keys_with_prefix(prefix).len())
    }

    async fn delete_prefix(&self, prefix: &str) -> AppResult<usize> {
        let keys = self.keys_with_prefix(prefix);
        for key in &keys {
            self.entries.invalidate(key).await;
        }
        Ok(keys.len())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
