use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;
use tracing::debug;

use crate::pipeline::chunker::Chunk;

/// A memoized answer and the chunks it was synthesized from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResult {
    pub answer: String,
    pub source_documents: Vec<Chunk>,
}

/// Bounded LRU map from sanitized query to its result.
///
/// Each `get` and `set` is atomic under one lock. Two concurrent misses on the
/// same key both run the pipeline and the later `set` wins; this only costs a
/// redundant oracle call.
pub struct QueryCache {
    entries: Mutex<LruCache<String, CachedResult>>,
}

impl QueryCache {
    /// Create a cache holding up to `capacity` entries (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Look up `key`, marking it most recently used on a hit.
    pub fn get(&self, key: &str) -> Option<CachedResult> {
        let mut entries = self.lock();
        let hit = entries.get(key).cloned();
        debug!(hit = hit.is_some(), "Query cache lookup");
        hit
    }

    /// Insert or replace `key`, evicting the least recently used entry when
    /// full.
    pub fn set(&self, key: String, result: CachedResult) {
        let mut entries = self.lock();
        let replaced = entries.contains(&key);
        if entries.push(key, result).is_some() && !replaced {
            debug!(capacity = entries.cap().get(), "Evicted least recently used query");
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<String, CachedResult>> {
        // Entries are replaced whole, so a poisoned map is still consistent.
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
impl QueryCache {
    pub(crate) fn contains(&self, key: &str) -> bool {
        self.lock().contains(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
