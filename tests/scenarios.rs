//! End-to-end scenarios A-F (`SPEC_FULL.md` §8 "End-to-end scenarios").

use lucien::{
    Aabb, Configuration, NeverCancel, Octree, PartitionScheme, Point3, Ray, Region, Tetree,
};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

fn octree_config(max_entities_per_node: u16) -> Configuration {
    Configuration::builder()
        .scheme(PartitionScheme::Octree)
        .max_entities_per_node(max_entities_per_node)
        .build()
}

/// Scenario A - point entity, octree.
#[test]
fn scenario_a_point_entities_cluster_without_subdividing() {
    let index: Octree<u32, ()> = Octree::new(octree_config(4));

    index.insert(1, (), Point3::new(10.0, 10.0, 10.0), 10, None).unwrap();
    index.insert(2, (), Point3::new(10.0, 10.0, 11.0), 10, None).unwrap();
    index.insert(3, (), Point3::new(10.0, 11.0, 10.0), 10, None).unwrap();
    index.insert(4, (), Point3::new(11.0, 10.0, 10.0), 10, None).unwrap();
    index.insert(5, (), Point3::new(100.0, 100.0, 100.0), 10, None).unwrap();

    assert_eq!(index.entity_count(), 5);
    // Threshold is 4; the cluster lands on exactly 4, the 5th is
    // elsewhere, so neither node exceeds its threshold yet.
    assert_eq!(index.node_count(), 2);

    let neighbors = index
        .k_nearest(Point3::new(10.0, 10.0, 10.0), 3, None, &NeverCancel)
        .unwrap();
    assert_eq!(neighbors.len(), 3);
    assert_eq!(neighbors[0].id, 1);
    assert!((neighbors[0].distance - 0.0).abs() < 1e-9);
    assert!((neighbors[1].distance - 1.0).abs() < 1e-9);
    assert!((neighbors[2].distance - 1.0).abs() < 1e-9);
    // Tie broken by ascending id.
    assert!(neighbors[1].id < neighbors[2].id);
}

/// Scenario B - subdivision, octree.
#[test]
fn scenario_b_overflowing_node_splits_into_children() {
    let index: Octree<u32, ()> = Octree::new(octree_config(4));

    for (i, id) in (0..5).enumerate() {
        let offset = i as f64;
        index
            .insert(
                id,
                (),
                Point3::new(20.0 + offset * 0.1, 20.0 + offset * 0.1, 20.0 + offset * 0.1),
                10,
                None,
            )
            .unwrap();
    }

    assert_eq!(index.entity_count(), 5);
    // The level-10 node the 5 points share overflowed and split; every
    // entity redistributed into level-11 children close enough together
    // to stay in one child cell, so the original parent key disappears.
    let parent_key = lucien::MortonKey::from_point(&Point3::new(20.0, 20.0, 20.0), 10).unwrap();
    assert!(index.node_entities(&parent_key).is_none());
    assert!(index.node_count() >= 1);

    let mut total = 0;
    for id in 0u32..5 {
        assert!(index.contains(&id));
        total += 1;
    }
    assert_eq!(total, 5);
}

/// Scenario C - bounded entity spanning, tetree.
#[test]
fn scenario_c_bounded_entity_spans_multiple_tetree_nodes() {
    let index: Tetree<u32, ()> = Tetree::new(
        Configuration::builder()
            .scheme(PartitionScheme::Tetree)
            .build(),
    );

    let bounds = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(200.0, 200.0, 200.0));
    index
        .insert(1, (), Point3::new(100.0, 100.0, 100.0), 5, Some(bounds))
        .unwrap();

    let keys = index.node_keys(&1).unwrap();
    assert!(!keys.is_empty());
    for key in &keys {
        let snapshot = index.node_entities(key).unwrap();
        assert!(snapshot.contains(&1));
    }

    index.remove(1).unwrap();
    assert!(!index.contains(&1));
    for key in &keys {
        assert!(index.node_entities(key).is_none());
    }
}

/// Scenario D - ray intersection, octree.
#[test]
fn scenario_d_ray_intersection_orders_hits_by_t() {
    let index: Octree<u32, ()> = Octree::new(octree_config(16));
    index.insert(1, (), Point3::new(50.0, 50.0, 50.0), 10, None).unwrap();
    index.insert(2, (), Point3::new(100.0, 50.0, 50.0), 10, None).unwrap();

    let ray = Ray::new(Point3::new(0.0, 50.0, 50.0), Point3::new(1.0, 0.0, 0.0));

    let first = index.ray_intersect_first(ray, None, &NeverCancel).unwrap().unwrap();
    assert_eq!(first.id, 1);
    assert!((first.t - 50.0).abs() < 1.0);

    let all = index.ray_intersect_all(ray, None, &NeverCancel).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, 1);
    assert_eq!(all[1].id, 2);
    assert!(all[0].t < all[1].t);
}

/// Scenario E - concurrent insert/query.
#[test]
fn scenario_e_concurrent_insert_and_query() {
    use rand::Rng;
    use std::thread;

    let index: Arc<Octree<u64, ()>> = Arc::new(Octree::new(octree_config(16)));
    let mut handles = Vec::new();

    for t in 0..8u64 {
        let index = index.clone();
        handles.push(thread::spawn(move || {
            let mut rng = rand::thread_rng();
            for i in 0..200u64 {
                let id = t * 1_000_000 + i;
                let p = Point3::new(
                    rng.gen_range(0.0..1000.0),
                    rng.gen_range(0.0..1000.0),
                    rng.gen_range(0.0..1000.0),
                );
                index.insert(id, (), p, 12, None).unwrap();
            }
        }));
    }
    for t in 0..4u64 {
        let index = index.clone();
        handles.push(thread::spawn(move || {
            for _ in 0..50 {
                let _ = index.k_nearest(
                    Point3::new(500.0, 500.0, 500.0),
                    10,
                    None,
                    &NeverCancel,
                );
            }
            let _ = t;
        }));
    }
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(index.entity_count(), 8 * 200);
    // Invariant 1 (bidirectional consistency) on a quiescent check.
    for t in 0..8u64 {
        for i in 0..200u64 {
            let id = t * 1_000_000 + i;
            let keys = index.node_keys(&id).unwrap();
            for key in &keys {
                let snapshot = index.node_entities(key).unwrap();
                assert!(snapshot.contains(&id));
            }
            let position = index.position(&id).unwrap();
            let found = index
                .k_nearest(position, 1, None, &NeverCancel)
                .unwrap();
            assert!(found.iter().any(|n| n.id == id));
        }
    }
}

/// Scenario F - bulk load ordering.
#[test]
fn scenario_f_bulk_load_matches_sequential_after_rebalance() {
    use lucien::BatchEntity;
    use rand::Rng;

    let mut rng = rand::thread_rng();
    let mut points = Vec::new();
    for i in 0..2000u32 {
        points.push((
            i,
            Point3::new(
                rng.gen_range(0.0..2000.0),
                rng.gen_range(0.0..2000.0),
                rng.gen_range(0.0..2000.0),
            ),
        ));
    }

    let bulk: Octree<u32, ()> = Octree::new(octree_config(16));
    let batch = points
        .iter()
        .map(|(id, p)| BatchEntity::new(*id, (), *p, 10, None))
        .collect();
    bulk.insert_batch(batch).unwrap();

    let sequential: Octree<u32, ()> = Octree::new(octree_config(16));
    for (id, p) in &points {
        sequential.insert(*id, (), *p, 10, None).unwrap();
    }
    sequential.rebalance();
    bulk.rebalance();

    assert_eq!(bulk.entity_count(), sequential.entity_count());

    for (id, _) in &points {
        let bulk_keys = bulk.node_keys(id).unwrap();
        let seq_keys = sequential.node_keys(id).unwrap();
        assert_eq!(bulk_keys, seq_keys);
    }
}

#[test]
fn cancel_token_stops_range_query() {
    let index: Octree<u32, ()> = Octree::new(octree_config(16));
    for i in 0..10u32 {
        index
            .insert(i, (), Point3::new(i as f64, i as f64, i as f64), 10, None)
            .unwrap();
    }
    let region = Region::Aabb(Aabb::new(Point3::ZERO, Point3::new(2048.0, 2048.0, 2048.0)));
    let cancelled = Arc::new(AtomicBool::new(true));
    let result = index.range_query(&region, &cancelled);
    assert!(result.is_err());
    let cancelled = Arc::new(AtomicBool::new(false));
    let result = index.range_query(&region, &cancelled).unwrap();
    assert_eq!(result.len(), 10);
}

/// `range_query_iter` advances one step at a time rather than resolving
/// every match up front: stopping after a partial pull and resuming with
/// a fresh iterator over the same region reaches the same total.
#[test]
fn range_query_iter_is_lazily_restartable() {
    let index: Octree<u32, ()> = Octree::new(octree_config(4));
    for i in 0..40u32 {
        index
            .insert(i, (), Point3::new(i as f64 * 10.0, i as f64 * 5.0, i as f64 * 3.0), 10, None)
            .unwrap();
    }
    let region = Region::Aabb(Aabb::new(Point3::ZERO, Point3::new(2048.0, 2048.0, 2048.0)));

    let mut iter = index.range_query_iter(region, &NeverCancel);
    let first_three: Vec<u32> = (&mut iter).take(3).map(|r| r.unwrap()).collect();
    assert_eq!(first_three.len(), 3);
    let rest: Vec<u32> = iter.map(|r| r.unwrap()).collect();

    let mut all = first_three;
    all.extend(rest);
    all.sort_unstable();

    let mut expected: Vec<u32> = (0..40).collect();
    expected.sort_unstable();
    assert_eq!(all, expected);
}
