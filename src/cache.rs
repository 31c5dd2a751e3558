//! Result cache in front of a lookup source

use crate::database::LookupSource;
use crate::error::LookupError;
use crate::rangedb::QueryMask;
use crate::record::ResultRecord;
use lru::LruCache;
use std::fmt;
use std::hash::BuildHasherDefault;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

type QueryCache = LruCache<(String, QueryMask), ResultRecord, BuildHasherDefault<rustc_hash::FxHasher>>;

/// Statistics for cache performance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Queries answered from the cache
    pub hits: u64,
    /// Queries passed through to the wrapped source
    pub misses: u64,
    /// Entries currently held
    pub entries: usize,
    /// Maximum number of entries (0 = disabled)
    pub capacity: usize,
}

impl CacheStats {
    /// Calculate cache hit rate (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// LRU cache of successful results, keyed by address text and mask.
///
/// Errors are never cached. The same address spelled differently (for
/// example `::ffff:1.2.3.4` and `1.2.3.4`) occupies separate entries.
pub struct CachedSource<S> {
    inner: S,
    cache: Option<Mutex<QueryCache>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<S: LookupSource> CachedSource<S> {
    /// Wrap `inner` with room for `capacity` results; 0 disables caching.
    pub fn new(inner: S, capacity: usize) -> Self {
        let cache = NonZeroUsize::new(capacity)
            .map(|cap| Mutex::new(LruCache::with_hasher(cap, BuildHasherDefault::default())));
        Self {
            inner,
            cache,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Snapshot of the hit/miss counters
    pub fn stats(&self) -> CacheStats {
        let (entries, capacity) = match &self.cache {
            Some(cache) => match cache.lock() {
                Ok(cache) => (cache.len(), cache.cap().get()),
                Err(poisoned) => {
                    let cache = poisoned.into_inner();
                    (cache.len(), cache.cap().get())
                }
            },
            None => (0, 0),
        };
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries,
            capacity,
        }
    }

    /// Drop every cached result
    pub fn clear(&self) {
        if let Some(cache) = &self.cache {
            if let Ok(mut cache) = cache.lock() {
                cache.clear();
            }
        }
    }

    /// Wrapped source
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: LookupSource> LookupSource for CachedSource<S> {
    fn query(&self, ip: &str, mask: QueryMask) -> Result<ResultRecord, LookupError> {
        let Some(cache) = &self.cache else {
            return self.inner.query(ip, mask);
        };

        let key = (ip.to_string(), mask);
        if let Ok(mut guard) = cache.lock() {
            if let Some(record) = guard.get(&key) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(record.clone());
            }
        }

        // Lock released while the wrapped source works
        self.misses.fetch_add(1, Ordering::Relaxed);
        let record = self.inner.query(ip, mask)?;
        if let Ok(mut guard) = cache.lock() {
            guard.put(key, record.clone());
        }
        Ok(record)
    }

    fn close(&self) {
        self.clear();
        self.inner.close();
    }
}

impl<S> fmt::Debug for CachedSource<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedSource")
            .field("enabled", &self.cache.is_some())
            .field("hits", &self.hits.load(Ordering::Relaxed))
            .field("misses", &self.misses.load(Ordering::Relaxed))
            .finish()
    }
}
