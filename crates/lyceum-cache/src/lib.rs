//! Keyed query cache for remote reads.
//!
//! This crate caches the results of remote reads under structural keys:
//! - At most one fetch in flight per key; concurrent readers share it
//! - Successful results are served until invalidated (exact key or prefix)
//! - Reads are inert while the read gate is closed
//! - LRU eviction and an optional stale-after bound keep memory in check
//!
//! # Example
//!
//! ```rust,ignore
//! use lyceum_cache::{CacheConfig, QueryCache, QueryKey};
//!
//! let cache = QueryCache::new(CacheConfig::default());
//! let key = QueryKey::new(["courses"]);
//!
//! let courses = cache.read(&key, || client.courses().all()).await?;
//!
//! // After a write that changes the catalog:
//! cache.invalidate_prefix(&key);
//! ```

mod cache;
mod config;
mod error;
mod key;
mod stale;

pub use cache::{CacheStats, EntrySnapshot, EntryStatus, QueryCache, ReadGate};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use key::QueryKey;
pub use stale::StaleTracker;
