//! The spatial index engine (`SPEC_FULL.md` §2 "~60%", §4.4).
//!
//! [`SpatialIndex`] is generic over a [`scheme::Scheme`] (which supplies
//! the one genuinely scheme-dependent operation, `enclosing`) and an
//! entity id/content pair. Two concrete aliases, [`Octree`] and [`Tetree`],
//! are the crate's two interchangeable partition schemes "unified behind
//! one abstract data type" (§1).

pub mod balance;
pub mod bulk;
pub mod query;
pub mod scheme;

pub use bulk::BatchEntity;
pub use query::{Neighbor, RangeQueryIter, RayHit, POINT_ENTITY_RADIUS};
pub use scheme::{OctreeScheme, Scheme, TetreeScheme};

use crate::config::{Configuration, RebalanceThrottle};
use crate::entity::{EntityCache, EntityManager};
use crate::error::{LucienError, Result};
use crate::geometry::{Aabb, Point3};
use crate::key::SpatialKey;
use crate::node::SpatialNode;
use crate::EntityId;
use dashmap::DashMap;
use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Default capacity of the per-engine hot-path entity cache
/// (`SPEC_FULL.md` §4.3).
const DEFAULT_ENTITY_CACHE_CAPACITY: usize = 4096;

/// The hierarchical spatial index, generic over partition scheme `S`,
/// entity id `Id`, and user-opaque content `C` (`SPEC_FULL.md` §4.4).
/// Holds no mutable global state beyond its maps: every operation is a
/// method here, parameterized by the `Configuration` passed at
/// construction.
pub struct SpatialIndex<S: Scheme, Id: EntityId, C> {
    config: Configuration,
    nodes: DashMap<S::Key, Arc<SpatialNode<Id>>>,
    entities: EntityManager<Id, S::Key, C>,
    entity_cache: EntityCache<Id>,
    rebalance_throttle: RebalanceThrottle,
    _scheme: PhantomData<S>,
}

/// The octree instantiation: cubic subdivision, Morton-encoded keys.
pub type Octree<Id, C> = SpatialIndex<OctreeScheme, Id, C>;

/// The tetree instantiation: tetrahedral subdivision, type-encoded keys.
pub type Tetree<Id, C> = SpatialIndex<TetreeScheme, Id, C>;

impl<S: Scheme, Id: EntityId, C> SpatialIndex<S, Id, C> {
    pub fn new(config: Configuration) -> Self {
        let rebalance_throttle = RebalanceThrottle::new(config.balancing_strategy.clone());
        SpatialIndex {
            config,
            nodes: DashMap::new(),
            entities: EntityManager::new(),
            entity_cache: EntityCache::new(DEFAULT_ENTITY_CACHE_CAPACITY),
            rebalance_throttle,
            _scheme: PhantomData,
        }
    }

    /// Runs [`SpatialIndex::rebalance`] if `auto_balance` is enabled and the
    /// configured strategy's `should_rebalance`/`min_rebalance_interval`
    /// both agree it's warranted (`SPEC_FULL.md` §4.4 "A full tree
    /// rebalance is only invoked explicitly or when
    /// `strategy.shouldRebalance` signals"). Unlike split (checked
    /// synchronously on every `insert`), this is O(node_count) — too
    /// costly to run on every mutation — so it is not called from
    /// `insert`/`remove`/`update`. Callers that want this auto-rebalance
    /// signal poll it from a maintenance thread or after a batch of
    /// mutations; the `RebalanceThrottle` still enforces the strategy's
    /// `min_rebalance_interval` regardless of how often it's polled.
    pub fn try_auto_rebalance(&self) -> bool {
        if !self.config.auto_balance {
            return false;
        }
        let stats = self.stats();
        if self.rebalance_throttle.try_rebalance(&stats) {
            self.rebalance();
            true
        } else {
            false
        }
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, id: &Id) -> bool {
        self.entities.contains(id)
    }

    pub fn position(&self, id: &Id) -> Option<Point3> {
        self.entities.position(id)
    }

    /// The set of node keys `id` is currently listed under: a singleton for
    /// point entities, the spanning set for bounded ones (`SPEC_FULL.md`
    /// §3 "Spanning").
    pub fn node_keys(&self, id: &Id) -> Option<HashSet<S::Key>> {
        self.entities.node_keys(id)
    }

    /// Entities currently listed in the node at `key`, if any
    /// (`SPEC_FULL.md` §4.2 snapshot read).
    pub fn node_entities(&self, key: &S::Key) -> Option<Arc<Vec<Id>>> {
        self.nodes.get(key).map(|n| n.snapshot())
    }

    pub(crate) fn node_map(&self) -> &DashMap<S::Key, Arc<SpatialNode<Id>>> {
        &self.nodes
    }

    /// A point-in-time copy of every key currently present in the node map.
    pub fn node_keys_snapshot(&self) -> Vec<S::Key> {
        self.nodes.iter().map(|entry| *entry.key()).collect()
    }

    pub(crate) fn entities(&self) -> &EntityManager<Id, S::Key, C> {
        &self.entities
    }

    pub(crate) fn entity_cache(&self) -> &EntityCache<Id> {
        &self.entity_cache
    }

    /// Position and bounds for `id`, through the hot-path cache: a hit
    /// avoids touching the entity registry's `DashMap` entirely
    /// (`SPEC_FULL.md` §4.3 "hot-path lookups inside collision and
    /// k-nearest inner loops"); a miss populates the cache from the
    /// registry for next time.
    pub(crate) fn cached_geometry(&self, id: &Id) -> Option<Arc<(Point3, Option<Aabb>)>> {
        if let Some(hit) = self.entity_cache.get(id) {
            return Some(hit);
        }
        let (position, bounds) = self.entities.with_record(id, |r| (r.position, r.bounds))?;
        self.entity_cache.insert(*id, position, bounds);
        self.entity_cache.get(id)
    }

    fn check_level(&self, level: u8) -> Result<()> {
        if level > self.config.max_level {
            return Err(LucienError::MaxDepth { level });
        }
        Ok(())
    }

    /// The spanning set: keys at `level` whose cells intersect `bounds`,
    /// found by descending from `root` and pruning subtrees whose cell
    /// doesn't intersect (`SPEC_FULL.md` §4.4 insert, §3 "Spanning").
    pub(crate) fn spanning_keys(root: S::Key, bounds: &Aabb, level: u8) -> Vec<S::Key> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(key) = stack.pop() {
            if !key.bounding_box().intersects(bounds) {
                continue;
            }
            if key.level() == level {
                out.push(key);
            } else if key.level() < level {
                stack.extend(key.children());
            }
        }
        out
    }

    /// Keys at `level` for a single point or bounded entity
    /// (`SPEC_FULL.md` §4.4 `insert`/`update`).
    fn target_keys(&self, position: &Point3, bounds: Option<&Aabb>, level: u8) -> Result<Vec<S::Key>> {
        match bounds {
            Some(bounds) => Ok(Self::spanning_keys(S::root(), bounds, level)),
            None => Ok(vec![S::enclosing(position, level)?]),
        }
    }

    /// Atomically get-or-create the node at `key` and append `id`, then
    /// apply the auto-balance split check (`SPEC_FULL.md` §4.2, §4.4).
    fn place_in_node(&self, key: &S::Key, id: Id) -> Result<()> {
        let node = self
            .nodes
            .entry(key.clone())
            .or_insert_with(|| Arc::new(SpatialNode::new()))
            .clone();
        node.insert_id(id);
        if self.config.auto_balance
            && key.level() < self.config.max_level
            && self
                .config
                .balancing_strategy
                .should_split(node.len(), self.config.max_entities_per_node, key.level())
        {
            self.try_split(key, &node);
        }
        Ok(())
    }

    /// Removes `id` from the node at `key`; if the node is now empty and
    /// not mid-split/merge, removes the node entirely
    /// (`SPEC_FULL.md` §3 "no empty nodes", §4.4 `remove`).
    fn remove_from_node(&self, key: &S::Key, id: &Id) {
        let Some(node) = self.nodes.get(key).map(|n| n.clone()) else {
            return;
        };
        node.remove_id(id);
        if node.is_empty() {
            use crate::node::NodeState;
            if matches!(node.state(), NodeState::Present) {
                self.nodes.remove_if(key, |_, n| n.is_empty() && matches!(n.state(), NodeState::Present));
            }
        }
    }

    /// `insert(id, content, position, ℓ, bounds?)` (`SPEC_FULL.md` §4.4).
    #[instrument(level = "debug", skip(self, content))]
    pub fn insert(
        &self,
        id: Id,
        content: C,
        position: Point3,
        level: u8,
        bounds: Option<Aabb>,
    ) -> Result<()> {
        position
            .check_in_domain()
            .map_err(|(axis, value)| LucienError::OutOfDomain { axis, value })?;
        self.check_level(level)?;
        let keys = self.target_keys(&position, bounds.as_ref(), level)?;
        self.entities.create(id, content, position, bounds, level)?;
        for key in &keys {
            self.place_in_node(key, id)?;
            self.entities.add_node(&id, key.clone());
        }
        debug!(nodes = keys.len(), "entity inserted");
        Ok(())
    }

    /// `remove(id)` (`SPEC_FULL.md` §4.4).
    #[instrument(level = "debug", skip(self))]
    pub fn remove(&self, id: Id) -> Result<()> {
        let keys = self
            .entities
            .node_keys(&id)
            .ok_or_else(|| LucienError::not_found(id))?;
        for key in &keys {
            self.remove_from_node(key, &id);
        }
        self.entities.destroy(&id)?;
        self.entity_cache.invalidate(&id);
        Ok(())
    }

    /// `update(id, newPosition, newBounds?)` (`SPEC_FULL.md` §4.4).
    /// Idempotent when `newPosition == oldPosition` and bounds are
    /// unchanged, since the old/new key sets are then equal and neither
    /// difference set has anything to do.
    #[instrument(level = "debug", skip(self))]
    pub fn update(&self, id: Id, new_position: Point3, new_bounds: Option<Aabb>) -> Result<()> {
        new_position
            .check_in_domain()
            .map_err(|(axis, value)| LucienError::OutOfDomain { axis, value })?;
        let level = self
            .entities
            .level(&id)
            .ok_or_else(|| LucienError::not_found(id))?;
        let old_keys = self
            .entities
            .node_keys(&id)
            .ok_or_else(|| LucienError::not_found(id))?;
        let new_keys: HashSet<S::Key> = self
            .target_keys(&new_position, new_bounds.as_ref(), level)?
            .into_iter()
            .collect();

        for key in old_keys.difference(&new_keys) {
            self.remove_from_node(key, &id);
            self.entities.remove_node(&id, key);
        }
        for key in new_keys.difference(&old_keys) {
            self.place_in_node(key, id)?;
            self.entities.add_node(&id, key.clone());
        }
        self.entities.set_position(&id, new_position, new_bounds)?;
        self.entity_cache.invalidate(&id);
        Ok(())
    }
}
