//! Entity registry: `id -> (content, position, bounds?, nodeKeySet)`
//! (`SPEC_FULL.md` §3, §4.3).
//!
//! Same concurrency treatment as the node map (`SPEC_FULL.md` §9
//! "concurrent ordered map" / ambient stack "concurrency primitives"): a
//! `DashMap` gives fine-grained per-key locking and lock-free reads without
//! a bespoke structure.

use crate::error::{LucienError, Result};
use crate::geometry::{Aabb, Point3};
use dashmap::DashMap;
use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;

/// One entity's state: content plus everything the engine needs to find
/// and relocate it. `nodeKeySet` is a singleton for point entities and the
/// spanning set for bounded entities (`SPEC_FULL.md` §3 "Spanning").
#[derive(Clone, Debug)]
pub struct EntityRecord<K, C> {
    pub content: C,
    pub position: Point3,
    pub bounds: Option<Aabb>,
    pub level: u8,
    pub node_keys: HashSet<K>,
}

impl<K: Eq + Hash + Clone, C> EntityRecord<K, C> {
    pub fn new(content: C, position: Point3, bounds: Option<Aabb>, level: u8) -> Self {
        EntityRecord {
            content,
            position,
            bounds,
            level,
            node_keys: HashSet::new(),
        }
    }
}

/// Process-local registry mapping entity identifier to its record
/// (`SPEC_FULL.md` §4.3). Generic over the key family `K` so one registry
/// type serves both the octree and tetree engine instantiations.
#[derive(Debug)]
pub struct EntityManager<Id, K, C> {
    records: DashMap<Id, EntityRecord<K, C>>,
}

impl<Id, K, C> Default for EntityManager<Id, K, C>
where
    Id: Eq + Hash,
{
    fn default() -> Self {
        EntityManager {
            records: DashMap::new(),
        }
    }
}

impl<Id, K, C> EntityManager<Id, K, C>
where
    Id: Copy + Eq + Hash + std::fmt::Debug,
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Fails with [`LucienError::DuplicateId`] if `id` is already present.
    pub fn create(
        &self,
        id: Id,
        content: C,
        position: Point3,
        bounds: Option<Aabb>,
        level: u8,
    ) -> Result<()> {
        match self.records.entry(id) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(LucienError::duplicate_id(id)),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(EntityRecord::new(content, position, bounds, level));
                Ok(())
            }
        }
    }

    pub fn contains(&self, id: &Id) -> bool {
        self.records.contains_key(id)
    }

    pub fn position(&self, id: &Id) -> Option<Point3> {
        self.records.get(id).map(|r| r.position)
    }

    pub fn bounds(&self, id: &Id) -> Option<Option<Aabb>> {
        self.records.get(id).map(|r| r.bounds)
    }

    pub fn node_keys(&self, id: &Id) -> Option<HashSet<K>> {
        self.records.get(id).map(|r| r.node_keys.clone())
    }

    pub fn level(&self, id: &Id) -> Option<u8> {
        self.records.get(id).map(|r| r.level)
    }

    /// Runs `f` with a read-only view of the full record, for callers
    /// (collision/k-nearest inner loops) that want content without
    /// cloning it.
    pub fn with_record<R>(&self, id: &Id, f: impl FnOnce(&EntityRecord<K, C>) -> R) -> Option<R> {
        self.records.get(id).map(|r| f(&r))
    }

    pub fn add_node(&self, id: &Id, key: K) {
        if let Some(mut record) = self.records.get_mut(id) {
            record.node_keys.insert(key);
        }
    }

    pub fn remove_node(&self, id: &Id, key: &K) {
        if let Some(mut record) = self.records.get_mut(id) {
            record.node_keys.remove(key);
        }
    }

    /// In-place position/bounds update; the engine is responsible for
    /// issuing the corresponding node relocations (`SPEC_FULL.md` §4.4
    /// `update`).
    pub fn set_position(&self, id: &Id, position: Point3, bounds: Option<Aabb>) -> Result<()> {
        match self.records.get_mut(id) {
            Some(mut record) => {
                record.position = position;
                record.bounds = bounds;
                Ok(())
            }
            None => Err(LucienError::not_found(id)),
        }
    }

    /// Fails with [`LucienError::NotFound`] if `id` is absent.
    pub fn destroy(&self, id: &Id) -> Result<EntityRecord<K, C>> {
        self.records
            .remove(id)
            .map(|(_, record)| record)
            .ok_or_else(|| LucienError::not_found(id))
    }
}

/// Bounded LRU cache of `(position, bounds)` for hot-path lookups inside
/// the k-nearest and ray-traversal inner loops (`SPEC_FULL.md` §4.3).
/// Lock-free losers on a concurrent miss simply redundantly recompute —
/// safe per `SPEC_FULL.md` §5.
pub struct EntityCache<Id> {
    capacity: usize,
    inner: DashMap<Id, Arc<(Point3, Option<Aabb>)>>,
    order: parking_lot::Mutex<std::collections::VecDeque<Id>>,
}

impl<Id: Copy + Eq + Hash> EntityCache<Id> {
    pub fn new(capacity: usize) -> Self {
        EntityCache {
            capacity,
            inner: DashMap::new(),
            order: parking_lot::Mutex::new(std::collections::VecDeque::new()),
        }
    }

    pub fn get(&self, id: &Id) -> Option<Arc<(Point3, Option<Aabb>)>> {
        self.inner.get(id).map(|v| v.clone())
    }

    pub fn insert(&self, id: Id, position: Point3, bounds: Option<Aabb>) {
        if self.capacity == 0 {
            return;
        }
        if self.inner.insert(id, Arc::new((position, bounds))).is_none() {
            let mut order = self.order.lock();
            order.push_back(id);
            if order.len() > self.capacity {
                if let Some(oldest) = order.pop_front() {
                    self.inner.remove(&oldest);
                }
            }
        }
    }

    pub fn invalidate(&self, id: &Id) {
        self.inner.remove(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_duplicate_fails() {
        let manager: EntityManager<u32, u64, &str> = EntityManager::new();
        manager.create(1, "a", Point3::ZERO, None, 10).unwrap();
        assert!(matches!(
            manager.create(1, "b", Point3::ZERO, None, 10),
            Err(LucienError::DuplicateId { .. })
        ));
    }

    #[test]
    fn destroy_unknown_fails() {
        let manager: EntityManager<u32, u64, &str> = EntityManager::new();
        assert!(matches!(
            manager.destroy(&99),
            Err(LucienError::NotFound { .. })
        ));
    }

    #[test]
    fn node_keys_round_trip() {
        let manager: EntityManager<u32, u64, &str> = EntityManager::new();
        manager.create(1, "a", Point3::ZERO, None, 10).unwrap();
        manager.add_node(&1, 42);
        manager.add_node(&1, 43);
        let keys = manager.node_keys(&1).unwrap();
        assert_eq!(keys.len(), 2);
        manager.remove_node(&1, &42);
        assert_eq!(manager.node_keys(&1).unwrap().len(), 1);
    }

    #[test]
    fn cache_evicts_oldest() {
        let cache: EntityCache<u32> = EntityCache::new(2);
        cache.insert(1, Point3::ZERO, None);
        cache.insert(2, Point3::ZERO, None);
        cache.insert(3, Point3::ZERO, None);
        assert!(cache.get(&1).is_none());
        assert!(cache.get(&3).is_some());
    }
}
