//! Bounded per-thread cache amortizing the tetree's O(ℓ) key computation
//! (`SPEC_FULL.md` §3, §4.1).
//!
//! FIFO-bounded rather than true LRU: eviction order doesn't need to be
//! access-recency-accurate, just cheap, since the cache exists purely to
//! avoid repeating `tmIndex`-style ancestor walks on clustered, repeated
//! lookups within one thread's bulk-load or query batch. One instance per
//! thread avoids the cross-thread contention a shared cache would add in
//! exactly the hot path it's meant to speed up.
//!
//! A second parent-chain cache (`SPEC_FULL.md` §4.1 "Caching") has no
//! counterpart here: `TetreeKey::parent` is O(1) in this packed-word
//! representation (a mask over the existing ancestor-type word), not an
//! ancestor walk, so there is nothing left for that cache to amortize.
//! See `DESIGN.md`.

use crate::key::tetree::TetreeKey;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

const DEFAULT_CAPACITY: usize = 1 << 16;

struct BoundedCache<K, V> {
    capacity: usize,
    map: HashMap<K, V>,
    order: VecDeque<K>,
}

impl<K: Eq + Hash + Clone, V: Clone> BoundedCache<K, V> {
    fn new(capacity: usize) -> Self {
        BoundedCache {
            capacity,
            map: HashMap::with_capacity(capacity.min(1024)),
            order: VecDeque::with_capacity(capacity.min(1024)),
        }
    }

    fn get(&self, key: &K) -> Option<V> {
        self.map.get(key).cloned()
    }

    fn insert(&mut self, key: K, value: V) {
        if self.map.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.map.remove(&oldest);
            }
        }
        self.order.push_back(key.clone());
        self.map.insert(key, value);
    }
}

type TetreeKeyCache = BoundedCache<(u32, u32, u32, u8), TetreeKey>;

thread_local! {
    static KEY_CACHE: RefCell<TetreeKeyCache> = RefCell::new(BoundedCache::new(DEFAULT_CAPACITY));
}

/// Looks up (or computes and caches) the packed key for grid coordinates
/// `(x, y, z)` at `level`, keyed on this thread's cache.
pub fn cached_tetree_key(
    x: u32,
    y: u32,
    z: u32,
    level: u8,
    compute: impl FnOnce() -> TetreeKey,
) -> TetreeKey {
    let cache_key = (x, y, z, level);
    KEY_CACHE.with(|cache| {
        if let Some(hit) = cache.borrow().get(&cache_key) {
            return hit;
        }
        let value = compute();
        cache.borrow_mut().insert(cache_key, value);
        value
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point3;

    #[test]
    fn cached_key_matches_direct_computation() {
        let point = Point3::new(33.0, 44.0, 55.0);
        let direct = TetreeKey::from_point(&point, 9).unwrap();
        let via_cache =
            cached_tetree_key(33, 44, 55, 9, || TetreeKey::from_point(&point, 9).unwrap());
        assert_eq!(direct, via_cache);
        let cached_again =
            cached_tetree_key(33, 44, 55, 9, || panic!("should have hit the cache"));
        assert_eq!(direct, cached_again);
    }

    #[test]
    fn bounded_cache_evicts_oldest() {
        let mut cache: BoundedCache<u32, u32> = BoundedCache::new(2);
        cache.insert(1, 1);
        cache.insert(2, 2);
        cache.insert(3, 3);
        assert!(cache.get(&1).is_none());
        assert_eq!(cache.get(&2), Some(2));
        assert_eq!(cache.get(&3), Some(3));
    }
}
