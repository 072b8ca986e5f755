use serde::Serialize;
use std::{fmt::Display, sync::Arc, time::Duration};

use crate::{
    error::{AppError, AppResult},
    models::{ContentId, Domain},
};

const KEY_PREFIX: &str = "nextup:";

/// Independent groups of cache entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheNamespace {
    /// Raw vector index query results
    Vector,
    /// Aggregated per-user recommendation results
    Recommendations,
}

impl CacheNamespace {
    pub const ALL: [CacheNamespace; 2] = [CacheNamespace::Vector, CacheNamespace::Recommendations];

    pub fn prefix(&self) -> &'static str {
        match self {
            CacheNamespace::Vector => "nextup:vec:",
            CacheNamespace::Recommendations => "nextup:recs:",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    VectorQuery {
        item_id: ContentId,
        domain: Domain,
        count: usize,
    },
    UserRecommendations {
        user_id: String,
        per_domain: usize,
    },
}

impl CacheKey {
    pub fn namespace(&self) -> CacheNamespace {
        match self {
            CacheKey::VectorQuery { .. } => CacheNamespace::Vector,
            CacheKey::UserRecommendations { .. } => CacheNamespace::Recommendations,
        }
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::VectorQuery {
                item_id,
                domain,
                count,
            } => write!(f, "{}vec:{}:{}:{}", KEY_PREFIX, domain, item_id, count),
            CacheKey::UserRecommendations {
                user_id,
                per_domain,
            } => write!(f, "{}recs:{}:{}", KEY_PREFIX, user_id, per_domain),
        }
    }
}

/// Key/value store behind the result cache
///
/// Implementations must be safe to share across concurrent requests. Two
/// writers racing on one key may both land; the last one wins.
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Stores a value; write-behind stores return before the write lands
    async fn put(&self, key: String, value: String, ttl_secs: u64);

    /// Number of live entries whose key starts with `prefix`
    async fn count_prefix(&self, prefix: &str) -> AppResult<usize>;

    /// Removes every entry whose key starts with `prefix`, returning how many were removed
    async fn delete_prefix(&self, prefix: &str) -> AppResult<usize>;

    fn backend(&self) -> &'static str;
}

/// Entry counts and settings reported by the admin surface
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub backend: &'static str,
    pub vector_entries: usize,
    pub recommendation_entries: usize,
    pub vector_ttl_secs: u64,
    pub recommendation_ttl_secs: u64,
}

/// Result cache shared by all requests
///
/// Constructed once at startup and handed to the recommender. Values are
/// stored as JSON so any store can hold them. Reads that take longer than
/// `read_timeout` count as misses.
#[derive(Clone)]
pub struct ResultCache {
    store: Arc<dyn CacheStore>,
    vector_ttl_secs: u64,
    recommendation_ttl_secs: u64,
    read_timeout: Duration,
}

impl ResultCache {
    pub fn new(
        store: Arc<dyn CacheStore>,
        vector_ttl_secs: u64,
        recommendation_ttl_secs: u64,
        read_timeout: Duration,
    ) -> Self {
        Self {
            store,
            vector_ttl_secs,
            recommendation_ttl_secs,
            read_timeout,
        }
    }

    /// TTL configured for the namespace of `key`
    pub fn ttl_for(&self, key: &CacheKey) -> u64 {
        match key.namespace() {
            CacheNamespace::Vector => self.vector_ttl_secs,
            CacheNamespace::Recommendations => self.recommendation_ttl_secs,
        }
    }

    /// Retrieves a value from the cache by key
    ///
    /// Returns `None` on a miss, after the entry's TTL elapsed, or when the
    /// store does not answer within the read timeout.
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let raw_key = key.to_string();
        let read = self.store.get(&raw_key);
        let Ok(lookup) = tokio::time::timeout(self.read_timeout, read).await else {
            tracing::warn!(
                key = %key,
                timeout_ms = self.read_timeout.as_millis() as u64,
                "Cache read timed out, treating as miss"
            );
            return Ok(None);
        };

        match lookup? {
            Some(json) => {
                let data = serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })?;
                tracing::debug!(key = %key, "Cache hit");
                Ok(Some(data))
            }
            None => {
                tracing::debug!(key = %key, "Cache miss");
                Ok(None)
            }
        }
    }

    /// Stores a value in the cache
    ///
    /// Serialization failures are logged and the value is dropped.
    pub async fn set_in_cache<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Cache serialization error");
                return;
            }
        };

        self.store.put(key.to_string(), json, ttl).await;
    }

    /// Entry counts per namespace
    pub async fn stats(&self) -> AppResult<CacheStats> {
        Ok(CacheStats {
            backend: self.store.backend(),
            vector_entries: self.store.count_prefix(CacheNamespace::Vector.prefix()).await?,
            recommendation_entries: self
                .store
                .count_prefix(CacheNamespace::Recommendations.prefix())
                .await?,
            vector_ttl_secs: self.vector_ttl_secs,
            recommendation_ttl_secs: self.recommendation_ttl_secs,
        })
    }

    /// Drops every entry in both namespaces
    pub async fn clear(&self) -> AppResult<usize> {
        let mut removed = 0;
        for namespace in CacheNamespace::ALL {
            removed += self.store.delete_prefix(namespace.prefix()).await?;
        }
        tracing::info!(removed, "Cache cleared");
        Ok(removed)
    }
}
