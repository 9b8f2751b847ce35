//! Query algorithms: k-nearest, range, ray, frustum cull, collision
//! (`SPEC_FULL.md` §4.4 "Operations").

use super::{Scheme, SpatialIndex};
use crate::cancel::CancelToken;
use crate::error::{LucienError, Result};
use crate::geometry::{aabb_normal_at, Point3, Ray, Region};
use crate::key::SpatialKey;
use crate::pool::{take_heap, take_set, PooledSet};
use crate::EntityId;
use itertools::Itertools;
use ordered_float::OrderedFloat;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;

/// Fixed radius point entities present as, for ray/sphere intersection
/// tests (`SPEC_FULL.md` §4.4 `rayIntersect`).
pub const POINT_ENTITY_RADIUS: f64 = 0.5;

/// One k-nearest result: the entity id and its distance from the query
/// point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor<Id> {
    pub id: Id,
    pub distance: f64,
}

/// One ray-intersection result (`SPEC_FULL.md` §4.4 `rayIntersect`).
#[derive(Clone, Copy, Debug)]
pub struct RayHit<Id> {
    pub id: Id,
    pub t: f64,
    pub point: Point3,
    pub normal: Point3,
}

/// Lazy, restartable traversal for [`SpatialIndex::range_query_iter`]
/// (`SPEC_FULL.md` §4.4 "Lazy iteration... Memory O(depth), not
/// O(#keys in range)"). Holds a DFS stack of pending keys plus the
/// current node's entity snapshot and a cursor into it — the same
/// descend-and-prune shape `k_nearest`/`ray_traverse` use for their
/// distance/`t` bounds, here pruning by [`crate::geometry::CellClass`]
/// instead. The pending-key stack never exceeds (branching factor - 1)
/// times the tree's depth, since every `next()` call immediately
/// consumes the most recently pushed key before pushing any more.
pub struct RangeQueryIter<'a, S: Scheme, Id: EntityId, C> {
    index: &'a SpatialIndex<S, Id, C>,
    region: Region,
    cancel: &'a dyn CancelToken,
    stack: Vec<S::Key>,
    current: Option<(Arc<Vec<Id>>, usize, bool)>,
    seen: PooledSet<Id>,
    cancelled: bool,
}

impl<'a, S: Scheme, Id: EntityId, C> Iterator for RangeQueryIter<'a, S, Id, C> {
    type Item = Result<Id>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.cancelled {
                return None;
            }
            if let Some((snapshot, mut idx, inside)) = self.current.take() {
                while let Some(&id) = snapshot.get(idx) {
                    idx += 1;
                    if !self.seen.get_mut().insert(id) {
                        continue;
                    }
                    let hit = inside
                        || self
                            .index
                            .entities()
                            .with_record(&id, |record| match record.bounds {
                                Some(bounds) => self.region.intersects_bounds(&bounds),
                                None => self.region.contains_point(&record.position),
                            })
                            .unwrap_or(false);
                    if hit {
                        self.current = Some((snapshot, idx, inside));
                        return Some(Ok(id));
                    }
                }
            }

            if self.cancel.is_cancelled() {
                self.cancelled = true;
                return Some(Err(LucienError::Cancelled));
            }

            let Some(key) = self.stack.pop() else {
                return None;
            };
            let class = self.region.classify(&key.bounding_box());
            if matches!(class, crate::geometry::CellClass::Outside) {
                continue;
            }
            if key.level() < self.index.config().max_level {
                self.stack.extend(key.children());
            }
            if let Some(node) = self.index.node_map().get(&key) {
                let inside = matches!(class, crate::geometry::CellClass::Inside);
                self.current = Some((node.snapshot(), 0, inside));
            }
        }
    }
}

/// Best-first queue entry: ordered by ascending lower-bound distance
/// (`Reverse` via a manual `Ord` so `BinaryHeap`, a max-heap, pops the
/// smallest bound first).
struct BoundEntry<K> {
    bound: OrderedFloat<f64>,
    key: K,
}

impl<K> PartialEq for BoundEntry<K> {
    fn eq(&self, other: &Self) -> bool {
        self.bound == other.bound
    }
}
impl<K> Eq for BoundEntry<K> {}
impl<K> PartialOrd for BoundEntry<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl<K> Ord for BoundEntry<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        other.bound.cmp(&self.bound)
    }
}

/// A best-k candidate: ordered by descending distance so the bounded
/// max-heap's peek is always the current worst kept candidate.
struct Candidate<Id> {
    distance: OrderedFloat<f64>,
    id: Id,
}
impl<Id: Eq> PartialEq for Candidate<Id> {
    fn eq(&self, other: &Self) -> bool {
        self.distance == other.distance && self.id == other.id
    }
}
impl<Id: Eq> Eq for Candidate<Id> {}
impl<Id: Ord> PartialOrd for Candidate<Id> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl<Id: Ord> Ord for Candidate<Id> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .cmp(&other.distance)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl<S: Scheme, Id: EntityId, C> SpatialIndex<S, Id, C> {
    /// `kNearest(point, k, maxDistance?)` (`SPEC_FULL.md` §4.4, invariant
    /// 5). Best-first search over nodes keyed by minimum-possible-distance
    /// from cell to point.
    pub fn k_nearest(
        &self,
        point: Point3,
        k: usize,
        max_distance: Option<f64>,
        cancel: &dyn CancelToken,
    ) -> Result<Vec<Neighbor<Id>>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let max_sq = max_distance.map(|d| d * d);
        let mut queue: BinaryHeap<BoundEntry<S::Key>> = BinaryHeap::new();
        queue.push(BoundEntry {
            bound: OrderedFloat(0.0),
            key: S::root(),
        });

        let mut best = take_heap::<Candidate<Id>>();
        let mut visited = take_set::<Id>();

        while let Some(BoundEntry { bound, key }) = queue.pop() {
            if cancel.is_cancelled() {
                break;
            }
            if best.get_mut().len() >= k {
                if let Some(worst) = best.get_mut().peek() {
                    if bound.0 > worst.distance.0 {
                        break;
                    }
                }
            }
            if let Some(max_sq) = max_sq {
                if bound.0 > max_sq {
                    break;
                }
            }

            if let Some(node) = self.node_map().get(&key) {
                let snapshot = node.snapshot();
                for &id in snapshot.iter() {
                    if !visited.get_mut().insert(id) {
                        continue;
                    }
                    let Some(geometry) = self.cached_geometry(&id) else {
                        continue;
                    };
                    let dist_sq = point.distance_squared(&geometry.0);
                    if let Some(max_sq) = max_sq {
                        if dist_sq > max_sq {
                            continue;
                        }
                    }
                    best.get_mut().push(Candidate {
                        distance: OrderedFloat(dist_sq),
                        id,
                    });
                    while best.get_mut().len() > k {
                        best.get_mut().pop();
                    }
                }
            }

            if key.level() < self.config().max_level {
                for child in key.children() {
                    let child_bound = child.bounding_box().distance_squared_to_point(&point);
                    if let Some(max_sq) = max_sq {
                        if child_bound > max_sq {
                            continue;
                        }
                    }
                    queue.push(BoundEntry {
                        bound: OrderedFloat(child_bound),
                        key: child,
                    });
                }
            }
        }

        let mut results: Vec<Neighbor<Id>> = best
            .into_inner()
            .into_iter()
            .map(|c| Neighbor {
                id: c.id,
                distance: c.distance.0.sqrt(),
            })
            .collect();
        results.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(results)
    }

    /// `rangeQuery(region)` (`SPEC_FULL.md` §4.4, invariant 6). Returns a
    /// restartable, lazily-advancing iterator: each `next()` descends one
    /// more step rather than materializing every hit up front (§4.4 "Lazy
    /// iteration... Memory O(depth)").
    pub fn range_query_iter<'a>(
        &'a self,
        region: Region,
        cancel: &'a dyn CancelToken,
    ) -> RangeQueryIter<'a, S, Id, C> {
        RangeQueryIter {
            index: self,
            region,
            cancel,
            stack: vec![S::root()],
            current: None,
            seen: take_set::<Id>(),
            cancelled: false,
        }
    }

    /// `rangeQuery(region)` collected eagerly, for callers that just want
    /// every match at once. Built on [`SpatialIndex::range_query_iter`];
    /// the traversal itself still descends from the root pruning by
    /// `CellClass` rather than scanning every occupied node in the tree.
    pub fn range_query(&self, region: &Region, cancel: &dyn CancelToken) -> Result<Vec<Id>> {
        self.range_query_iter(*region, cancel).collect()
    }

    /// `rayIntersectAll` (`SPEC_FULL.md` §4.4). Results sorted by `t`.
    pub fn ray_intersect_all(
        &self,
        ray: Ray,
        max_distance: Option<f64>,
        cancel: &dyn CancelToken,
    ) -> Result<Vec<RayHit<Id>>> {
        let mut hits = self.ray_traverse(ray, max_distance, cancel, false)?;
        hits.sort_by(|a, b| a.t.partial_cmp(&b.t).unwrap_or(Ordering::Equal));
        Ok(hits)
    }

    /// `rayIntersectFirst` (`SPEC_FULL.md` §4.4): terminates as soon as a
    /// hit's `t` is less than the current node's lower bound.
    pub fn ray_intersect_first(
        &self,
        ray: Ray,
        max_distance: Option<f64>,
        cancel: &dyn CancelToken,
    ) -> Result<Option<RayHit<Id>>> {
        let hits = self.ray_traverse(ray, max_distance, cancel, true)?;
        Ok(hits
            .into_iter()
            .min_by(|a, b| a.t.partial_cmp(&b.t).unwrap_or(Ordering::Equal)))
    }

    fn ray_traverse(
        &self,
        ray: Ray,
        max_distance: Option<f64>,
        cancel: &dyn CancelToken,
        stop_early: bool,
    ) -> Result<Vec<RayHit<Id>>> {
        let t_max = max_distance.unwrap_or(f64::MAX);
        let mut queue: BinaryHeap<BoundEntry<S::Key>> = BinaryHeap::new();
        let root = S::root();
        if let Some((t_min, _)) = root.bounding_box().intersect_ray(&ray, t_max) {
            queue.push(BoundEntry {
                bound: OrderedFloat(t_min),
                key: root,
            });
        }

        let mut hits = Vec::new();
        let mut best_t = f64::MAX;
        let mut seen = take_set::<Id>();

        while let Some(BoundEntry { bound, key }) = queue.pop() {
            if cancel.is_cancelled() {
                break;
            }
            if stop_early && bound.0 > best_t {
                break;
            }

            if let Some(node) = self.node_map().get(&key) {
                for &id in node.snapshot().iter() {
                    if !seen.get_mut().insert(id) {
                        continue;
                    }
                    let Some(hit) = self.test_ray_against_entity(&ray, &id, t_max) else {
                        continue;
                    };
                    if hit.t < best_t {
                        best_t = hit.t;
                    }
                    hits.push(hit);
                }
            }

            if key.level() < self.config().max_level {
                for child in key.children() {
                    if let Some((t_min, _)) = child.bounding_box().intersect_ray(&ray, t_max) {
                        queue.push(BoundEntry {
                            bound: OrderedFloat(t_min),
                            key: child,
                        });
                    }
                }
            }
        }
        Ok(hits)
    }

    fn test_ray_against_entity(&self, ray: &Ray, id: &Id, t_max: f64) -> Option<RayHit<Id>> {
        let geometry = self.cached_geometry(id)?;
        let (position, bounds) = (geometry.0, geometry.1);
        match bounds {
            Some(bounds) => {
                let (t_min, _) = bounds.intersect_ray(ray, t_max)?;
                if t_min < 0.0 {
                    return None;
                }
                let point = ray.at(t_min);
                let normal = aabb_normal_at(&bounds, &point);
                Some(RayHit {
                    id: *id,
                    t: t_min,
                    point,
                    normal,
                })
            }
            None => {
                let t = ray.intersect_sphere(&position, POINT_ENTITY_RADIUS, t_max)?;
                let point = ray.at(t);
                let normal = point.sub(&position).normalized().unwrap_or(Point3::ZERO);
                Some(RayHit {
                    id: *id,
                    t,
                    point,
                    normal,
                })
            }
        }
    }

    /// `frustumCull(frustum)` (`SPEC_FULL.md` §4.4). Inside cells add all
    /// entities unconditionally; intersecting cells test each entity;
    /// outside cells prune.
    pub fn frustum_cull(&self, frustum: &crate::geometry::Frustum, cancel: &dyn CancelToken) -> Result<Vec<Id>> {
        self.range_query(&Region::Frustum(*frustum), cancel)
    }

    /// `findCollisions()` (`SPEC_FULL.md` §4.4): same-node pairs plus
    /// pairs against topological-neighbor nodes, deduplicated.
    pub fn find_collisions(
        &self,
        filter: Option<&dyn Fn(&Id, &Id) -> bool>,
    ) -> Result<Vec<(Id, Id)>> {
        let mut pairs = take_set::<(Id, Id)>();
        for entry in self.node_map().iter() {
            let key = *entry.key();
            let own = entry.value().snapshot();
            self.collect_pairs(&own, &own, filter, pairs.get_mut());

            for neighbor_key in self.topological_neighbors(&key) {
                if let Some(neighbor_node) = self.node_map().get(&neighbor_key) {
                    let other = neighbor_node.snapshot();
                    self.collect_pairs(&own, &other, filter, pairs.get_mut());
                }
            }
        }
        Ok(pairs.into_inner().into_iter().collect())
    }

    /// `findCollisions(id)`: pairs involving one specific entity.
    pub fn find_collisions_for(
        &self,
        id: Id,
        filter: Option<&dyn Fn(&Id, &Id) -> bool>,
    ) -> Result<Vec<(Id, Id)>> {
        let keys = self
            .entities()
            .node_keys(&id)
            .ok_or_else(|| LucienError::not_found(id))?;
        let mut pairs = take_set::<(Id, Id)>();
        for key in &keys {
            if let Some(node) = self.node_map().get(key) {
                let own = node.snapshot();
                for &other in own.iter() {
                    if other == id {
                        continue;
                    }
                    push_pair(id, other, filter, pairs.get_mut());
                }
            }
            for neighbor_key in self.topological_neighbors(key) {
                if let Some(neighbor_node) = self.node_map().get(&neighbor_key) {
                    for &other in neighbor_node.snapshot().iter() {
                        push_pair(id, other, filter, pairs.get_mut());
                    }
                }
            }
        }
        Ok(pairs.into_inner().into_iter().collect())
    }

    fn topological_neighbors(&self, key: &S::Key) -> Vec<S::Key> {
        use crate::key::{EDGE_DIRECTIONS, FACE_DIRECTIONS, VERTEX_DIRECTIONS};
        FACE_DIRECTIONS
            .iter()
            .chain(EDGE_DIRECTIONS.iter())
            .chain(VERTEX_DIRECTIONS.iter())
            .filter_map(|&dir| key.neighbor(dir))
            .unique()
            .collect()
    }

    fn collect_pairs(
        &self,
        lhs: &Arc<Vec<Id>>,
        rhs: &Arc<Vec<Id>>,
        filter: Option<&dyn Fn(&Id, &Id) -> bool>,
        out: &mut std::collections::HashSet<(Id, Id)>,
    ) {
        for (i, &a) in lhs.iter().enumerate() {
            let start = if std::ptr::eq(lhs.as_ptr(), rhs.as_ptr()) {
                i + 1
            } else {
                0
            };
            for &b in rhs.iter().skip(start) {
                if a == b {
                    continue;
                }
                push_pair(a, b, filter, out);
            }
        }
    }
}

fn push_pair<Id: EntityId>(
    a: Id,
    b: Id,
    filter: Option<&dyn Fn(&Id, &Id) -> bool>,
    out: &mut std::collections::HashSet<(Id, Id)>,
) {
    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
    if let Some(filter) = filter {
        if !filter(&lo, &hi) {
            return;
        }
    }
    out.insert((lo, hi));
}
