//! `SpatialNode`: the payload attached to one key (`SPEC_FULL.md` §3, §4.2).
//!
//! The id list is a copy-on-write vector behind a `parking_lot::RwLock`:
//! readers clone the inner `Arc` (cheap, stable for the duration of a scan)
//! and writers install a new `Arc` built from a copy, giving §4.2's
//! "readers see a stable vector reference for the duration of a scan"
//! without a bespoke lock-free vector.

use bitflags::bitflags;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

bitflags! {
    /// Small per-node bit-set (`SPEC_FULL.md` §3 "a small bit-set of
    /// flags").
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct NodeFlags: u8 {
        const SUBDIVISION_PENDING = 0b0000_0001;
        const MERGE_PENDING       = 0b0000_0010;
    }
}

/// The node state machine from `SPEC_FULL.md` §4.4. Readers must never
/// observe `Splitting`/`Merging` as simultaneously empty — the state byte
/// and the entity vector swap happen under the same per-key lock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum NodeState {
    Present = 0,
    Splitting = 1,
    Merging = 2,
    Removed = 3,
}

impl NodeState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => NodeState::Present,
            1 => NodeState::Splitting,
            2 => NodeState::Merging,
            _ => NodeState::Removed,
        }
    }
}

/// A concurrent container of entity ids plus metadata, one per occupied
/// key. Created lazily on first entity placement, destroyed when empty
/// (`SPEC_FULL.md` §3 "Lifecycles").
#[derive(Debug)]
pub struct SpatialNode<Id> {
    ids: RwLock<Arc<Vec<Id>>>,
    flags: RwLock<NodeFlags>,
    state: AtomicU8,
}

impl<Id: Copy + Eq> SpatialNode<Id> {
    pub fn new() -> Self {
        SpatialNode {
            ids: RwLock::new(Arc::new(Vec::new())),
            flags: RwLock::new(NodeFlags::empty()),
            state: AtomicU8::new(NodeState::Present as u8),
        }
    }

    pub fn with_id(id: Id) -> Self {
        SpatialNode {
            ids: RwLock::new(Arc::new(vec![id])),
            flags: RwLock::new(NodeFlags::empty()),
            state: AtomicU8::new(NodeState::Present as u8),
        }
    }

    /// A stable snapshot of this node's ids, safe to iterate while other
    /// threads mutate the node (`SPEC_FULL.md` §4.2, §5).
    pub fn snapshot(&self) -> Arc<Vec<Id>> {
        self.ids.read().clone()
    }

    pub fn len(&self) -> usize {
        self.ids.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends `id` if not already present. Returns `true` if it was added.
    pub fn insert_id(&self, id: Id) -> bool {
        let mut guard = self.ids.write();
        if guard.contains(&id) {
            return false;
        }
        let mut next = (**guard).clone();
        next.push(id);
        *guard = Arc::new(next);
        true
    }

    /// Removes `id` if present. Returns `true` if it was removed.
    pub fn remove_id(&self, id: &Id) -> bool {
        let mut guard = self.ids.write();
        if !guard.contains(id) {
            return false;
        }
        let next: Vec<Id> = guard.iter().filter(|existing| *existing != id).copied().collect();
        *guard = Arc::new(next);
        true
    }

    pub fn flags(&self) -> NodeFlags {
        *self.flags.read()
    }

    pub fn set_flags(&self, flags: NodeFlags) {
        *self.flags.write() = flags;
    }

    pub fn insert_flag(&self, flag: NodeFlags) {
        *self.flags.write() |= flag;
    }

    pub fn remove_flag(&self, flag: NodeFlags) {
        self.flags.write().remove(flag);
    }

    pub fn state(&self) -> NodeState {
        NodeState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn set_state(&self, state: NodeState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Transitions `Present -> to` only if currently `Present`, returning
    /// whether the transition happened. Used to claim exclusive rights to
    /// drive a split/merge without a separate lock.
    pub fn try_transition_from_present(&self, to: NodeState) -> bool {
        self.state
            .compare_exchange(
                NodeState::Present as u8,
                to as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}

impl<Id: Copy + Eq> Default for SpatialNode<Id> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_remove_round_trip() {
        let node: SpatialNode<u32> = SpatialNode::new();
        assert!(node.is_empty());
        assert!(node.insert_id(1));
        assert!(!node.insert_id(1));
        assert_eq!(node.len(), 1);
        assert!(node.remove_id(&1));
        assert!(node.is_empty());
    }

    #[test]
    fn snapshot_is_stable_during_concurrent_mutation() {
        let node: SpatialNode<u32> = SpatialNode::new();
        node.insert_id(1);
        node.insert_id(2);
        let snap = node.snapshot();
        node.insert_id(3);
        assert_eq!(snap.len(), 2);
        assert_eq!(node.len(), 3);
    }

    #[test]
    fn state_transitions_require_present() {
        let node: SpatialNode<u32> = SpatialNode::new();
        assert!(node.try_transition_from_present(NodeState::Splitting));
        assert!(!node.try_transition_from_present(NodeState::Merging));
        node.set_state(NodeState::Present);
        assert!(node.try_transition_from_present(NodeState::Merging));
    }

    #[test]
    fn flags_set_and_clear() {
        let node: SpatialNode<u32> = SpatialNode::new();
        node.insert_flag(NodeFlags::SUBDIVISION_PENDING);
        assert!(node.flags().contains(NodeFlags::SUBDIVISION_PENDING));
        node.remove_flag(NodeFlags::SUBDIVISION_PENDING);
        assert!(!node.flags().contains(NodeFlags::SUBDIVISION_PENDING));
    }
}
