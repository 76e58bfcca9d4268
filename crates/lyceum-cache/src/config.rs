//! Configuration for the query cache.

use std::time::Duration;

/// Default maximum number of cached queries.
pub const DEFAULT_MAX_ENTRIES: usize = 1024;

/// Default stale-after bound (none: results stay fresh until invalidated).
pub const DEFAULT_STALE_AFTER: Option<Duration> = None;

/// Configuration for the query cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries before LRU eviction.
    pub max_entries: usize,

    /// Optional age after which a successful result is re-fetched on the
    /// next read, even without an invalidation.
    pub stale_after: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            stale_after: DEFAULT_STALE_AFTER,
        }
    }
}

impl CacheConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of cached entries.
    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = max;
        self
    }

    /// Re-fetch results older than `age`.
    pub fn with_stale_after(mut self, age: Duration) -> Self {
        self.stale_after = Some(age);
        self
    }

    /// Keep results until invalidated.
    pub fn without_stale_after(mut self) -> Self {
        self.stale_after = None;
        self
    }
}
