//! Universal invariants (`SPEC_FULL.md` §8 "Universal invariants").
//!
//! Each property drives the engine through `proptest`-generated operation
//! sequences and checks one invariant on a quiescent snapshot, the way
//! property suites in this corpus check tree invariants after randomized
//! mutation rather than against one fixed example.

use lucien::{Aabb, Configuration, NeverCancel, Octree, PartitionScheme, Point3, Region};
use proptest::collection::vec;
use proptest::prelude::*;
use std::collections::HashSet;

const DOMAIN_MAX: f64 = 2000.0;

fn point_strategy() -> impl Strategy<Value = Point3> {
    (0.0..DOMAIN_MAX, 0.0..DOMAIN_MAX, 0.0..DOMAIN_MAX).prop_map(|(x, y, z)| Point3::new(x, y, z))
}

fn small_index(max_entities_per_node: u16) -> Octree<u32, ()> {
    Octree::new(
        Configuration::builder()
            .scheme(PartitionScheme::Octree)
            .max_entities_per_node(max_entities_per_node)
            .build(),
    )
}

proptest! {
    /// Invariant 1: bidirectional consistency between entity node-key sets
    /// and node id-vectors, after an arbitrary insert sequence.
    #[test]
    fn bidirectional_consistency(points in vec(point_strategy(), 1..80)) {
        let index = small_index(8);
        for (id, p) in points.iter().enumerate() {
            index.insert(id as u32, (), *p, 10, None).unwrap();
        }

        for (id, _) in points.iter().enumerate() {
            let id = id as u32;
            let keys = index.node_keys(&id).unwrap();
            for key in &keys {
                let snapshot = index.node_entities(key).unwrap();
                prop_assert!(snapshot.contains(&id));
            }
        }
    }

    /// Invariant 2: no node in the map is ever empty on a quiescent check,
    /// across insert and remove churn.
    #[test]
    fn no_empty_nodes(points in vec(point_strategy(), 1..80), removed in vec(any::<bool>(), 1..80)) {
        let index = small_index(8);
        for (id, p) in points.iter().enumerate() {
            index.insert(id as u32, (), *p, 10, None).unwrap();
        }
        for (id, should_remove) in removed.iter().enumerate() {
            if *should_remove && (id as usize) < points.len() {
                let _ = index.remove(id as u32);
            }
        }

        for key in index.node_keys_snapshot() {
            let count = index.node_entities(&key).map(|s| s.len()).unwrap_or(0);
            prop_assert!(count > 0);
        }
    }

    /// Invariant 3: a point entity's level-ℓ node keys all contain its
    /// position.
    #[test]
    fn containment_holds(points in vec(point_strategy(), 1..60)) {
        let index = small_index(8);
        for (id, p) in points.iter().enumerate() {
            index.insert(id as u32, (), *p, 9, None).unwrap();
        }
        for (id, p) in points.iter().enumerate() {
            let id = id as u32;
            let keys = index.node_keys(&id).unwrap();
            for key in &keys {
                if key.level() == 9 {
                    prop_assert!(key.contains(p));
                }
            }
        }
    }

    /// Invariant 4: parent/child algebra holds for every occupied key.
    #[test]
    fn parent_child_algebra(points in vec(point_strategy(), 1..60)) {
        let index = small_index(8);
        for (id, p) in points.iter().enumerate() {
            index.insert(id as u32, (), *p, 10, None).unwrap();
        }
        for key in index.node_keys_snapshot() {
            if key.level() >= 1 {
                let parent = key.parent().unwrap();
                let child_index = key.child_index();
                prop_assert_eq!(parent.child(child_index).unwrap(), key);
            }
        }
    }

    /// Invariant 5: k-nearest returns non-decreasing distances.
    #[test]
    fn k_nearest_monotone(points in vec(point_strategy(), 5..60), query in point_strategy()) {
        let index = small_index(8);
        for (id, p) in points.iter().enumerate() {
            index.insert(id as u32, (), *p, 10, None).unwrap();
        }
        let neighbors = index.k_nearest(query, 5, None, &NeverCancel).unwrap();
        for window in neighbors.windows(2) {
            prop_assert!(window[0].distance <= window[1].distance + 1e-9);
        }
    }

    /// Invariant 8: insert then remove restores the prior node-map shape.
    #[test]
    fn insert_remove_is_inverse(points in vec(point_strategy(), 1..40), p in point_strategy()) {
        let index = small_index(8);
        for (id, existing) in points.iter().enumerate() {
            index.insert(id as u32, (), *existing, 10, None).unwrap();
        }
        let before_nodes = index.node_count();
        let before_entities = index.entity_count();

        let probe_id = points.len() as u32;
        index.insert(probe_id, (), p, 10, None).unwrap();
        index.remove(probe_id).unwrap();

        prop_assert_eq!(index.node_count(), before_nodes);
        prop_assert_eq!(index.entity_count(), before_entities);
    }

    /// Invariant 6: range query completeness, checked against a
    /// brute-force scan of every inserted point's position.
    #[test]
    fn range_query_is_complete(
        points in vec(point_strategy(), 1..80),
        region_min in point_strategy(),
        region_extent in (10.0..500.0, 10.0..500.0, 10.0..500.0),
    ) {
        let index = small_index(8);
        for (id, p) in points.iter().enumerate() {
            index.insert(id as u32, (), *p, 10, None).unwrap();
        }

        let region_max = Point3::new(
            (region_min.x + region_extent.0).min(DOMAIN_MAX),
            (region_min.y + region_extent.1).min(DOMAIN_MAX),
            (region_min.z + region_extent.2).min(DOMAIN_MAX),
        );
        let region = Region::Aabb(Aabb::new(region_min, region_max));

        let expected: HashSet<u32> = points
            .iter()
            .enumerate()
            .filter(|(_, p)| region.contains_point(p))
            .map(|(id, _)| id as u32)
            .collect();

        let found: HashSet<u32> = index
            .range_query(&region, &NeverCancel)
            .unwrap()
            .into_iter()
            .collect();

        prop_assert_eq!(found, expected);
    }

    /// Invariant 9: a repeated identical update is a no-op on observable
    /// state (node-key set and position).
    #[test]
    fn update_is_idempotent(points in vec(point_strategy(), 1..40), new_pos in point_strategy()) {
        let index = small_index(8);
        for (id, p) in points.iter().enumerate() {
            index.insert(id as u32, (), *p, 10, None).unwrap();
        }
        let id = 0u32;
        index.update(id, new_pos, None).unwrap();
        let keys_once = index.node_keys(&id).unwrap();
        let pos_once = index.position(&id).unwrap();

        index.update(id, new_pos, None).unwrap();
        let keys_twice = index.node_keys(&id).unwrap();
        let pos_twice = index.position(&id).unwrap();

        prop_assert_eq!(keys_once, keys_twice);
        prop_assert_eq!(pos_once, pos_twice);
    }
}
