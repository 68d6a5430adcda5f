//! Cache Layer.
//!
//! A bounded, concurrent, in-process memoization store keyed by
//! `(normalized_query_text, lane, top_k)`. Built on `dashmap`'s lock-free
//! concurrent map, with an explicit recency counter layered on top for LRU
//! eviction.

use crate::evidence::LaneResult;
use crate::lane::LaneID;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Normalized cache key: hash of `(normalized_query_text, lane, top_k)`.
pub type Fingerprint = String;

/// Normalize query text for fingerprinting: lowercase, collapse whitespace,
/// strip surrounding punctuation.
pub fn normalize_query(text: &str) -> String {
    let collapsed = text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    collapsed
        .trim_matches(|c: char| c.is_ascii_punctuation())
        .to_string()
}

pub fn fingerprint(text: &str, lane: LaneID, top_k: usize) -> Fingerprint {
    let normalized = normalize_query(text);
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    hasher.update([0u8]);
    hasher.update(lane.to_string().as_bytes());
    hasher.update([0u8]);
    hasher.update(top_k.to_le_bytes());
    format!("{:x}", hasher.finalize())
}

struct CacheEntry {
    result: LaneResult,
    expires_at: Instant,
    last_access_tick: AtomicU64,
}

/// Bounded, concurrent, TTL + LRU cache of successful lane results.
pub struct Cache {
    entries: DashMap<Fingerprint, CacheEntry>,
    max_entries: usize,
    tick: AtomicU64,
}

impl Cache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries,
            tick: AtomicU64::new(0),
        }
    }

    fn next_tick(&self) -> u64 {
        self.tick.fetch_add(1, Ordering::Relaxed)
    }

    /// Look up a fingerprint. Expired entries are lazily removed. A hit
    /// refreshes recency but never extends TTL.
    pub fn get(&self, key: &Fingerprint, now: Instant) -> Option<LaneResult> {
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at <= now {
                drop(entry);
                self.entries.remove(key);
                return None;
            }
            entry.last_access_tick.store(self.next_tick(), Ordering::Relaxed);
            return Some(entry.result.clone());
        }
        None
    }

    /// Insert a `Success` result with the given TTL. Only `Success` results
    /// are cacheable; last-writer-wins on key collision.
    pub fn put(&self, key: Fingerprint, result: LaneResult, ttl: Duration, now: Instant) {
        if !matches!(result, LaneResult::Success { .. }) {
            return;
        }
        let entry = CacheEntry {
            result,
            expires_at: now + ttl,
            last_access_tick: AtomicU64::new(self.next_tick()),
        };
        self.entries.insert(key, entry);
        self.evict_if_over_capacity();
    }

    fn evict_if_over_capacity(&self) {
        while self.entries.len() > self.max_entries {
            let lru_key = self
                .entries
                .iter()
                .min_by_key(|e| e.last_access_tick.load(Ordering::Relaxed))
                .map(|e| e.key().clone());
            match lru_key {
                Some(key) => {
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::Evidence;
    use chrono::Utc;

    fn success(score: f64) -> LaneResult {
        LaneResult::Success {
            items: vec![Evidence {
                lane: LaneID::Web,
                source_id: "s1".into(),
                title: "t".into(),
                snippet: "s".into(),
                score,
                url: None,
                fetched_at: Utc::now(),
            }],
            elapsed_ms: 5,
            cache_hit: false,
        }
    }

    #[test]
    fn normalization_collapses_whitespace_case_and_punctuation() {
        assert_eq!(normalize_query("  Capital   OF France! "), "capital of france");
    }

    #[test]
    fn hit_returns_identical_items() {
        let cache = Cache::new(10);
        let now = Instant::now();
        let key = fingerprint("transformer architecture", LaneID::Vector, 5);
        cache.put(key.clone(), success(0.9), Duration::from_secs(3600), now);

        let first = cache.get(&key, now).unwrap();
        let second = cache.get(&key, now).unwrap();
        assert_eq!(format!("{:?}", first), format!("{:?}", second));
    }

    #[test]
    fn expired_entry_is_not_returned() {
        let cache = Cache::new(10);
        let now = Instant::now();
        let key = fingerprint("q", LaneID::Web, 5);
        cache.put(key.clone(), success(0.5), Duration::from_millis(10), now);

        let later = now + Duration::from_millis(20);
        assert!(cache.get(&key, later).is_none());
    }

    #[test]
    fn only_success_results_are_cached() {
        let cache = Cache::new(10);
        let now = Instant::now();
        let key = fingerprint("q", LaneID::Web, 5);
        cache.put(key.clone(), LaneResult::Timeout { elapsed_ms: 10 }, Duration::from_secs(60), now);
        assert!(cache.get(&key, now).is_none());
    }

    #[test]
    fn evicts_least_recently_used_over_capacity() {
        let cache = Cache::new(2);
        let now = Instant::now();
        let k1 = fingerprint("one", LaneID::Web, 5);
        let k2 = fingerprint("two", LaneID::Web, 5);
        let k3 = fingerprint("three", LaneID::Web, 5);

        cache.put(k1.clone(), success(0.1), Duration::from_secs(60), now);
        cache.put(k2.clone(), success(0.2), Duration::from_secs(60), now);
        // Touch k1 so it is more recently used than k2.
        cache.get(&k1, now);
        cache.put(k3.clone(), success(0.3), Duration::from_secs(60), now);

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&k1, now).is_some());
        assert!(cache.get(&k2, now).is_none());
        assert!(cache.get(&k3, now).is_some());
    }
}
