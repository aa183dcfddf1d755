//! Fingerprint-keyed preview result cache.

use std::num::NonZeroUsize;

use lru::LruCache;
use tracing::debug;

use crate::fingerprint::ParameterFingerprint;
use crate::image::PixelBuffer;

/// Default cache capacity in entries. With 256x256 8-bit previews a full
/// cache stays under 7 MB.
pub const DEFAULT_PREVIEW_CACHE_CAPACITY: usize = 100;

/// Bounded least-recently-used cache of rendered previews.
///
/// Every operation here runs on the execution queue's single worker thread,
/// which is the cache's concurrency boundary; no internal locking is needed.
/// Eviction is strict LRU with ties broken by oldest insertion, which is what
/// the backing `LruCache` implements.
pub struct PreviewCache {
    entries: LruCache<ParameterFingerprint, PixelBuffer>,
}

impl PreviewCache {
    /// Create a cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
        }
    }

    /// Look up a preview, refreshing its recency on a hit.
    pub fn get(&mut self, key: &ParameterFingerprint) -> Option<&PixelBuffer> {
        let hit = self.entries.get(key);
        debug!(hit = hit.is_some(), "preview cache lookup");
        hit
    }

    /// Insert or refresh an entry, evicting the least-recently-used one when
    /// the capacity is exceeded.
    pub fn put(&mut self, key: ParameterFingerprint, image: PixelBuffer) {
        self.entries.put(key, image);
    }

    /// Remove every entry. Used on epoch bumps.
    pub fn clear(&mut self) {
        debug!(entries = self.entries.len(), "clearing preview cache");
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }
}

// =============================================================================
// Tests
// =============================================================================
