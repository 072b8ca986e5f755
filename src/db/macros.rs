/// A macro to simplify read-through caching.
///
/// This macro checks if a value is present in the cache.
/// If found, it returns the cached value.
/// If not found, or if the cache itself fails or times out, it executes the
/// provided block to compute the value, stores it in the cache, and returns
/// it. Errors from the block are returned as-is and never cached.
///
/// # Arguments
/// * `$cache`: A [`ResultCache`](crate::db::ResultCache).
/// * `$key`: The [`CacheKey`](crate::db::CacheKey) to read and write.
/// * `$ttl`: The time-to-live (TTL) for the cached value in seconds.
/// * `$block`: The future to await if the value is not found in cache.
///
/// # Example
/// ```rust,ignore
/// let matches = cached!(cache, key, ttl, async move {
///     index.query_by_item_id(&id, top_k, &filter).await
/// });
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        match $cache.get_from_cache(&$key).await {
            Ok(Some(cached)) => Ok(cached),
            lookup => {
                if let Err(e) = lookup {
                    tracing::warn!(key = %$key, error = %e, "Cache read failed, recomputing");
                }
                let value = $block.await?;
                $cache.set_in_cache(&$key, &value, $ttl).await;
                Ok(value)
            }
        }
    }};
}
