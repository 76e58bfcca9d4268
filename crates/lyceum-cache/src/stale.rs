//! Fetch-age tracking for stale-after expiry.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::key::QueryKey;

/// Tracks when each key last fetched successfully.
#[derive(Debug)]
pub struct StaleTracker {
    /// Completion time of the last successful fetch per key.
    fetched_at: HashMap<QueryKey, Instant>,

    /// Age bound (None means results never go stale on their own).
    stale_after: Option<Duration>,
}

impl StaleTracker {
    /// Create a new tracker with the given bound.
    pub fn new(stale_after: Option<Duration>) -> Self {
        Self {
            fetched_at: HashMap::new(),
            stale_after,
        }
    }

    /// Record a successful fetch for a key.
    pub fn record(&mut self, key: &QueryKey) {
        self.fetched_at.insert(key.clone(), Instant::now());
    }

    /// When the key last fetched successfully.
    pub fn fetched_at(&self, key: &QueryKey) -> Option<Instant> {
        self.fetched_at.get(key).copied()
    }

    /// Check if a key's result is older than the bound.
    pub fn is_stale(&self, key: &QueryKey) -> bool {
        match self.stale_after {
            None => false,
            Some(bound) => match self.fetched_at.get(key) {
                None => true,
                Some(at) => at.elapsed() > bound,
            },
        }
    }

    /// Stop tracking a key.
    pub fn remove(&mut self, key: &QueryKey) {
        self.fetched_at.remove(key);
    }

    /// Get the number of tracked keys.
    pub fn len(&self) -> usize {
        self.fetched_at.len()
    }

    /// Check if there are no tracked keys.
    pub fn is_empty(&self) -> bool {
        self.fetched_at.is_empty()
    }

    /// Clear all tracking data.
    pub fn clear(&mut self) {
        self.fetched_at.clear();
    }

    /// Get the configured bound.
    pub fn stale_after(&self) -> Option<Duration> {
        self.stale_after
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_no_bound_never_stale() {
        let mut tracker = StaleTracker::new(None);
        let key = QueryKey::new(["courses"]);
        tracker.record(&key);

        assert!(!tracker.is_stale(&key));
        assert!(!tracker.is_stale(&QueryKey::new(["never-fetched"])));
    }

    #[test]
    fn test_goes_stale_after_bound() {
        let mut tracker = StaleTracker::new(Some(Duration::from_millis(10)));
        let key = QueryKey::new(["courses"]);
        tracker.record(&key);
        assert!(!tracker.is_stale(&key));

        thread::sleep(Duration::from_millis(20));
        assert!(tracker.is_stale(&key));

        // A new fetch resets the age.
        tracker.record(&key);
        assert!(!tracker.is_stale(&key));
    }

    #[test]
    fn test_remove() {
        let mut tracker = StaleTracker::new(Some(Duration::from_secs(60)));
        let a = QueryKey::new(["a"]);
        tracker.record(&a);
        tracker.record(&QueryKey::new(["b"]));

        tracker.remove(&a);

        assert_eq!(tracker.len(), 1);
        assert!(tracker.is_stale(&a));
        assert!(tracker.fetched_at(&a).is_none());
    }
}
