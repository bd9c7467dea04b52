// Bounded parsed-file cache.
//
// Keyed by `(path, content hash)` so a changed file never serves stale
// results. A hit must return exactly what a fresh parse would produce; the
// cache therefore stores the complete extracted outline, which is the only
// thing downstream passes read. Entries evict least-recently-used when
// capacity is exceeded.
//
// The cache is an explicit instance injected into the pipeline — scoped to
// one run or shared across runs behind an `Arc` — never ambient global
// state. It is also the one structure parsing workers may touch
// concurrently, so the interior lives behind a mutex.

use std::collections::HashMap;
use std::sync::Mutex;

use carto_graphs::FileOutline;
use serde::Serialize;

#[derive(Debug, Clone)]
struct CacheEntry {
    content_hash: u64,
    outline: FileOutline,
    file_size: usize,
    /// Logical clock tick of the last access, for LRU ordering.
    last_accessed: u64,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    tick: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
    corruptions: u64,
}

/// Counters exposed in the diagnostic report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub corruptions: u64,
    pub entries: usize,
    /// Total source bytes the cached outlines were extracted from.
    pub bytes: u64,
}

#[derive(Debug)]
pub struct ParseCache {
    inner: Mutex<CacheInner>,
    capacity: usize,
}

impl ParseCache {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner::default()),
            capacity: capacity.max(1),
        }
    }

    /// Look up a cached outline for `(path, content_hash)`.
    ///
    /// A stored entry whose internal state disagrees with its key is
    /// corruption: it is evicted, counted, and reported as a miss rather
    /// than served.
    pub fn get(&self, path: &str, content_hash: u64) -> Option<FileOutline> {
        let mut guard = self.inner.lock().expect("cache lock poisoned");
        let inner = &mut *guard;
        inner.tick += 1;
        let tick = inner.tick;

        let corrupted = match inner.entries.get_mut(&key(path, content_hash)) {
            Some(entry) => {
                if entry.content_hash == content_hash && entry.outline.file_path == path {
                    entry.last_accessed = tick;
                    inner.hits += 1;
                    return Some(entry.outline.clone());
                }
                true
            }
            None => false,
        };

        if corrupted {
            inner.entries.remove(&key(path, content_hash));
            inner.corruptions += 1;
        }
        inner.misses += 1;
        None
    }

    /// Insert an outline, evicting the least-recently-used entries if the
    /// capacity is exceeded. Insert-or-fetch semantics: if another worker
    /// already stored this key, the existing entry wins and is returned.
    pub fn insert(
        &self,
        path: &str,
        content_hash: u64,
        file_size: usize,
        outline: FileOutline,
    ) -> FileOutline {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        inner.tick += 1;
        let tick = inner.tick;

        let k = key(path, content_hash);
        if let Some(existing) = inner.entries.get_mut(&k) {
            existing.last_accessed = tick;
            return existing.outline.clone();
        }

        inner.entries.insert(
            k,
            CacheEntry {
                content_hash,
                outline: outline.clone(),
                file_size,
                last_accessed: tick,
            },
        );

        Self::evict_to(&mut inner, self.capacity);
        outline
    }

    /// Memory-pressure hook run between batches: drop down to capacity.
    pub fn trim(&self) {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        Self::evict_to(&mut inner, self.capacity);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("cache lock poisoned").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().expect("cache lock poisoned");
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            corruptions: inner.corruptions,
            entries: inner.entries.len(),
            bytes: inner.entries.values().map(|e| e.file_size as u64).sum(),
        }
    }

    fn evict_to(inner: &mut CacheInner, capacity: usize) {
        while inner.entries.len() > capacity {
            let Some(oldest) = inner
                .entries
                .iter()
                .min_by_key(|(k, e)| (e.last_accessed, k.clone()))
                .map(|(k, _)| k.clone())
            else {
                break;
            };
            inner.entries.remove(&oldest);
            inner.evictions += 1;
        }
    }
}

fn key(path: &str, content_hash: u64) -> String {
    format!("{path}#{content_hash:016x}")
}
