use std::{
    collections::HashMap,
    hash::Hash,
    time::{Duration, Instant},
};

/// Key to (value, stored-at) map with a fixed time-to-live.
///
/// Nothing here reads the clock; callers pass `now` so freshness is decided by
/// whoever owns the cache.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: HashMap<K, (V, Instant)>,
}

impl<K: Eq + Hash, V> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// True when the key is absent or older than the ttl.
    pub fn is_stale(&self, key: &K, now: Instant) -> bool {
        match self.entries.get(key) {
            Some((_, stored_at)) => now.saturating_duration_since(*stored_at) >= self.ttl,
            None => true,
        }
    }

    pub fn get(&self, key: &K, now: Instant) -> Option<&V> {
        if self.is_stale(key, now) {
            return None;
        }
        self.entries.get(key).map(|(value, _)| value)
    }

    pub fn set(&mut self, key: K, value: V, now: Instant) {
        self.entries.insert(key, (value, now));
    }

    pub fn invalidate(&mut self, key: &K) {
        self.entries.remove(key);
    }
}
