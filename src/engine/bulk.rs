//! Bulk loading (`SPEC_FULL.md` §4.4 "Bulk loading", §5 "bulk-loading
//! threads coordinate at a barrier between the insertion phase and the
//! balancing phase").
//!
//! `rayon` drives the parallel key resolution and the parallel per-key
//! population phase; an explicit barrier (the phases simply run as two
//! sequential `rayon`-parallel passes, joined by collecting the first
//! into a `Vec` before starting the second) separates insertion from the
//! single final subdivision pass, avoiding the cost of a subdivision
//! check on every one of the batch's inserts.

use super::{Scheme, SpatialIndex};
use crate::error::Result;
use crate::geometry::{Aabb, Point3};
use crate::EntityId;
use rayon::prelude::*;
use tracing::{info, instrument};

/// One entity to insert via [`SpatialIndex::insert_batch`].
pub struct BatchEntity<Id, C> {
    pub id: Id,
    pub content: C,
    pub position: Point3,
    pub level: u8,
    pub bounds: Option<Aabb>,
}

impl<Id, C> BatchEntity<Id, C> {
    pub fn new(id: Id, content: C, position: Point3, level: u8, bounds: Option<Aabb>) -> Self {
        BatchEntity {
            id,
            content,
            position,
            level,
            bounds,
        }
    }
}

impl<S: Scheme, Id: EntityId, C> SpatialIndex<S, Id, C> {
    /// `insertBatch(records)` (`SPEC_FULL.md` §4.4). Resolves each
    /// entity's spanning keys in parallel (sorted by first key afterward
    /// for locality — the "sort by SFC key first" optimization), then
    /// populates nodes with per-insert subdivision checks suppressed, and
    /// finally runs one [`SpatialIndex::rebalance`] pass.
    #[instrument(level = "debug", skip(self, records))]
    pub fn insert_batch(&self, records: Vec<BatchEntity<Id, C>>) -> Result<()>
    where
        C: Send + Sync,
        Id: Send + Sync,
    {
        let use_cache = self.config().use_bulk_lazy_keys;
        let mut resolved: Vec<(BatchEntity<Id, C>, Vec<S::Key>)> = records
            .into_par_iter()
            .map(|record| {
                let keys = if use_cache {
                    match record.bounds {
                        Some(bounds) => Self::spanning_keys(S::root(), &bounds, record.level),
                        None => vec![S::batch_enclosing(&record.position, record.level)?],
                    }
                } else {
                    match record.bounds {
                        Some(bounds) => Self::spanning_keys(S::root(), &bounds, record.level),
                        None => vec![S::enclosing(&record.position, record.level)?],
                    }
                };
                Ok((record, keys))
            })
            .collect::<Result<Vec<_>>>()?;

        resolved.sort_by(|(_, a), (_, b)| a.first().cmp(&b.first()));

        // Barrier: every key is resolved and the batch is locality-sorted
        // before any node is touched.
        for (record, keys) in resolved {
            self.entities().create(
                record.id,
                record.content,
                record.position,
                record.bounds,
                record.level,
            )?;
            for key in &keys {
                let node = self
                    .node_map()
                    .entry(*key)
                    .or_insert_with(|| std::sync::Arc::new(crate::node::SpatialNode::new()))
                    .clone();
                node.insert_id(record.id);
                self.entities().add_node(&record.id, *key);
            }
        }

        self.rebalance();
        info!(entities = self.entity_count(), nodes = self.node_count(), "bulk load complete");
        Ok(())
    }
}
