/// Read-through caching for lookups that may legitimately find nothing.
///
/// Returns the cached value when present. Otherwise awaits `$block`, which must
/// yield `AppResult<Option<T>>`; a `Some` result is written to the cache with
/// `$ttl` before being returned, a `None` result is returned without caching so
/// that a later request can still find the value.
///
/// # Arguments
/// * `$cache`: A [`crate::db::Cache`].
/// * `$key`: The [`crate::db::CacheKey`] to read and write.
/// * `$ttl`: Time-to-live in seconds for a stored value.
/// * `$block`: Future computing the value on a miss.
///
/// # Example
/// ```rust,ignore
/// let details = cached!(cache, CacheKey::movie(title, year), 86400, async move {
///     fetch_details(title, year).await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        if let Some(cached) = $cache.get_from_cache(&key).await {
            Ok(Some(cached))
        } else {
            match $block.await {
                Ok(Some(value)) => {
                    $cache.set_in_cache(&key, &value, $ttl).await;
                    Ok(Some(value))
                }
                Ok(None) => Ok(None),
                Err(e) => Err(e),
            }
        }
    }};
}
