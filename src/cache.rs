//! Single-flight TTL cache in front of the solver.
//!
//! Backed by `moka`: concurrent `try_get` calls for one key share a single
//! producer run, failed runs are never stored, and each entry expires after
//! the TTL it was inserted with.

use moka::future::Cache;
use moka::Expiry;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Clone)]
struct Expiring<V> {
    value: V,
    ttl: Duration,
}

struct PerEntryTtl;

impl<V> Expiry<String, Expiring<V>> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Expiring<V>,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

pub struct FeedCache<V> {
    inner: Cache<String, Expiring<V>>,
}

impl<V> FeedCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(max_capacity: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .build();
        Self { inner }
    }

    /// Return the live value for `key`, or run `producer` once and cache its
    /// result for `ttl`. Stale entries are never served.
    ///
    /// An error from `producer` reaches every caller that was waiting on the
    /// same run and leaves `key` uncached.
    pub async fn try_get<F, E>(&self, key: &str, ttl: Duration, producer: F) -> Result<V, Arc<E>>
    where
        F: Future<Output = Result<V, E>>,
        E: Send + Sync + 'static,
    {
        let entry = self
            .inner
            .try_get_with(key.to_string(), async {
                debug!(key, ttl_secs = ttl.as_secs(), "cache miss");
                producer.await.map(|value| Expiring { value, ttl })
            })
            .await?;
        Ok(entry.value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }
}

pub fn user_cache_key(id: &str) -> String {
    format!("sotwe:user:{}", id)
}
