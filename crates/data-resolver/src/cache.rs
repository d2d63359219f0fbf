use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use hype_core::{Capability, FetchResult};

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub ticker: String,
    pub capability: Capability,
    /// Extra request parameters such as a limit or search query.
    pub window: String,
}

impl CacheKey {
    pub fn new(ticker: &str, capability: Capability, window: impl Into<String>) -> Self {
        Self {
            ticker: ticker.trim().to_uppercase(),
            capability,
            window: window.into(),
        }
    }
}

struct CacheEntry<T> {
    data: FetchResult<T>,
    cached_at: DateTime<Utc>,
    generation: u64,
}

/// Memoized resolutions with a TTL. A write is dropped when the stored
/// entry came from a newer request generation; generations are issued by
/// the caller, so several caches can share one request counter.
pub struct ResolutionCache<T> {
    entries: DashMap<CacheKey, CacheEntry<T>>,
    ttl: Duration,
}

impl<T: Clone> ResolutionCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    fn is_fresh(&self, cached_at: DateTime<Utc>) -> bool {
        (Utc::now() - cached_at)
            .to_std()
            .map(|age| age < self.ttl)
            .unwrap_or(true)
    }

    /// Expired entries are evicted on lookup.
    pub fn get(&self, key: &CacheKey) -> Option<FetchResult<T>> {
        {
            let entry = self.entries.get(key)?;
            if self.is_fresh(entry.cached_at) {
                return Some(entry.data.clone());
            }
        }
        self.entries
            .remove_if(key, |_, entry| !self.is_fresh(entry.cached_at));
        None
    }

    /// Drop every expired entry.
    pub fn evict_expired(&self) {
        self.entries.retain(|_, entry| self.is_fresh(entry.cached_at));
    }

    /// Returns whether the value was stored.
    pub fn insert(&self, key: CacheKey, data: FetchResult<T>, generation: u64) -> bool {
        self.evict_expired();
        let entry = CacheEntry {
            data,
            cached_at: Utc::now(),
            generation,
        };
        match self.entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                if generation < occupied.get().generation {
                    return false;
                }
                occupied.insert(entry);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(entry);
            }
        }
        true
    }

    /// Serve a fresh entry or run `resolve`. Synthetic results are never
    /// stored so the providers get another chance on the next request.
    pub async fn get_or_resolve<Fut>(
        &self,
        key: CacheKey,
        generation: u64,
        resolve: Fut,
    ) -> FetchResult<T>
    where
        Fut: Future<Output = FetchResult<T>>,
    {
        if let Some(hit) = self.get(&key) {
            tracing::debug!(ticker = %key.ticker, capability = %key.capability, "cache hit");
            return hit;
        }
        let result = resolve.await;
        if !result.is_synthetic && !self.insert(key.clone(), result.clone(), generation) {
            tracing::debug!(
                ticker = %key.ticker,
                capability = %key.capability,
                generation,
                "discarding write from superseded request"
            );
        }
        result
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}
