//! Subdivision and balancing (`SPEC_FULL.md` §4.4 "Subdivision and
//! balancing", §4.4 "State machine (per node)").
//!
//! Splits run synchronously on the inserting thread under the node's own
//! state transition, the "simplest correct scheme" `SPEC_FULL.md` §9
//! calls out as one of two acceptable choices for auto-balance/concurrent-
//! insert interaction. Merges only run during an explicit [`rebalance`]
//! pass — `SPEC_FULL.md` §4.4 reserves synchronous per-op balancing for
//! splits ("insert/remove check per-node thresholds and synchronously
//! split/merge") but gates a *full* tree rebalance on an explicit call or
//! `strategy.shouldRebalance`; treating merge the same way as full
//! rebalance avoids the ambiguity of merging a subtree mid-insert on
//! another thread.

use super::{Scheme, SpatialIndex};
use crate::config::TreeStats;
use crate::node::NodeState;
use crate::EntityId;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

impl<S: Scheme, Id: EntityId, C> SpatialIndex<S, Id, C> {
    /// Attempts to claim `node` for splitting and, on success, distributes
    /// its entities among `key`'s children at `key.level() + 1`
    /// (`SPEC_FULL.md` §4.4 "Split").
    pub(crate) fn try_split(&self, key: &S::Key, node: &Arc<crate::node::SpatialNode<Id>>) {
        if !node.try_transition_from_present(NodeState::Splitting) {
            return;
        }
        let snapshot = node.snapshot();
        let children = key.children();
        let mut per_child: HashMap<S::Key, Vec<Id>> = HashMap::new();
        let mut retained: Vec<Id> = Vec::new();

        for &id in snapshot.iter() {
            let matches: Vec<S::Key> = self
                .entities()
                .with_record(&id, |record| {
                    children
                        .iter()
                        .filter(|child| match record.bounds {
                            Some(bounds) => child.bounding_box().intersects(&bounds),
                            None => child.contains(&record.position),
                        })
                        .copied()
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default();

            if matches.is_empty() {
                // Geometric edge case (tetree gaps, or a boundary point):
                // keep the entity at the parent rather than drop it.
                retained.push(id);
                continue;
            }
            for child_key in matches {
                per_child.entry(child_key).or_default().push(id);
            }
        }

        for (child_key, ids) in per_child {
            let child_node = self
                .node_map()
                .entry(child_key)
                .or_insert_with(|| Arc::new(crate::node::SpatialNode::new()))
                .clone();
            for id in ids {
                child_node.insert_id(id);
                self.entities().remove_node(&id, key);
                self.entities().add_node(&id, child_key);
            }
        }

        if retained.is_empty() {
            node.set_state(NodeState::Removed);
            self.node_map().remove(key);
        } else {
            let current = node.snapshot();
            for id in current.iter() {
                if !retained.contains(id) {
                    node.remove_id(id);
                }
            }
            node.set_state(NodeState::Present);
        }
        debug!(?key, retained = retained.len(), "node split");
    }

    /// Pulls a subtree's entities back up into `key`'s node when `key`'s
    /// existing children together fall below the merge threshold
    /// (`SPEC_FULL.md` §4.4 "Merge").
    pub(crate) fn try_merge(&self, key: &S::Key) {
        let children: Vec<S::Key> = key.children();
        let child_nodes: Vec<(S::Key, Arc<crate::node::SpatialNode<Id>>)> = children
            .into_iter()
            .filter_map(|child_key| self.node_map().get(&child_key).map(|n| (child_key, n.clone())))
            .collect();
        if child_nodes.is_empty() {
            return;
        }
        let combined: usize = child_nodes.iter().map(|(_, node)| node.len()).sum();
        if !self
            .config()
            .balancing_strategy
            .should_merge(combined, self.config().max_entities_per_node)
        {
            return;
        }

        let parent_node = self
            .node_map()
            .entry(*key)
            .or_insert_with(|| Arc::new(crate::node::SpatialNode::new()))
            .clone();
        if !parent_node.try_transition_from_present(NodeState::Merging) {
            return;
        }

        for (child_key, child_node) in &child_nodes {
            if !child_node.try_transition_from_present(NodeState::Merging) {
                continue;
            }
            for &id in child_node.snapshot().iter() {
                parent_node.insert_id(id);
                self.entities().remove_node(&id, child_key);
                self.entities().add_node(&id, *key);
            }
            child_node.set_state(NodeState::Removed);
            self.node_map().remove(child_key);
        }
        parent_node.set_state(NodeState::Present);
        trace!(?key, merged = child_nodes.len(), "siblings merged into parent");
    }

    /// Aggregate node-occupancy stats for [`crate::config::BalancingStrategy::should_rebalance`].
    pub fn stats(&self) -> TreeStats {
        let mut node_count = 0usize;
        let mut entity_count = 0usize;
        let mut max_entities_in_node = 0usize;
        for entry in self.node_map().iter() {
            let len = entry.value().len();
            node_count += 1;
            entity_count += len;
            max_entities_in_node = max_entities_in_node.max(len);
        }
        TreeStats {
            node_count,
            entity_count,
            max_entities_in_node,
            mean_entities_per_node: if node_count == 0 {
                0.0
            } else {
                entity_count as f64 / node_count as f64
            },
        }
    }

    /// A full explicit rebalance pass: attempts a merge at every occupied
    /// key's parent, then a split at every occupied key still over
    /// threshold (`SPEC_FULL.md` §4.4 "Balancing strategies").
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn rebalance(&self) {
        let parents: std::collections::HashSet<S::Key> = self
            .node_map()
            .iter()
            .filter_map(|entry| entry.key().parent().ok())
            .collect();
        for parent in parents {
            self.try_merge(&parent);
        }

        let overflowing: Vec<(S::Key, Arc<crate::node::SpatialNode<Id>>)> = self
            .node_map()
            .iter()
            .filter(|entry| {
                entry.key().level() < self.config().max_level
                    && self.config().balancing_strategy.should_split(
                        entry.value().len(),
                        self.config().max_entities_per_node,
                        entry.key().level(),
                    )
            })
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        for (key, node) in overflowing {
            self.try_split(&key, &node);
        }
        debug!(nodes = self.node_count(), "rebalance complete");
    }
}
