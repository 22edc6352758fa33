//! Advisory query-result cache.
//!
//! Keys are (normalized query text, k). The shipped backend is in-process
//! with LRU capacity eviction plus a per-entry TTL; the trait leaves room
//! for a networked backend. Callers must treat every cache failure as a
//! miss — the cache is never allowed to fail a query.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use core_types::SearchHit;
use lru::LruCache;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
}

/// Normalized lookup key: trimmed, lower-cased query text plus k.
///
/// Exact match only — no fuzzy matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    query: String,
    k: usize,
}

impl CacheKey {
    pub fn new(query: &str, k: usize) -> Self {
        Self {
            query: query.trim().to_lowercase(),
            k,
        }
    }
}

/// Counters exposed on the cache-stats surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Backend contract; implementations may live in-process or across the
/// network. Absence of a key is `Ok(None)`, not an error.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<SearchHit>>, CacheError>;
    async fn put(&self, key: CacheKey, hits: Vec<SearchHit>) -> Result<(), CacheError>;
    async fn clear(&self) -> Result<(), CacheError>;
    async fn stats(&self) -> Result<CacheStats, CacheError>;
}

struct Cached {
    hits: Vec<SearchHit>,
    stored_at: Instant,
}

struct MemoryInner {
    map: LruCache<CacheKey, Cached>,
    hits: u64,
    misses: u64,
}

/// In-process LRU cache with a per-entry TTL. Both policies are always
/// active; the constants come from configuration.
pub struct MemoryCache {
    inner: Mutex<MemoryInner>,
    ttl: Duration,
}

impl MemoryCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(MemoryInner {
                map: LruCache::new(capacity),
                hits: 0,
                misses: 0,
            }),
            ttl,
        }
    }

    fn lookup(&self, key: &CacheKey) -> Option<Vec<SearchHit>> {
        let mut inner = self.inner.lock();
        if let Some(cached) = inner.map.pop(key) {
            if cached.stored_at.elapsed() <= self.ttl {
                let hits = cached.hits.clone();
                // Re-inserting marks the key most-recently-used.
                inner.map.put(key.clone(), cached);
                inner.hits += 1;
                return Some(hits);
            }
            debug!(?key, "cache entry expired");
        }
        inner.misses += 1;
        None
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<SearchHit>>, CacheError> {
        Ok(self.lookup(key))
    }

    async fn put(&self, key: CacheKey, hits: Vec<SearchHit>) -> Result<(), CacheError> {
        self.inner.lock().map.put(
            key,
            Cached {
                hits,
                stored_at: Instant::now(),
            },
        );
        Ok(())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.inner.lock().map.clear();
        Ok(())
    }

    async fn stats(&self) -> Result<CacheStats, CacheError> {
        let inner = self.inner.lock();
        Ok(CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            entries: inner.map.len(),
        })
    }
}
