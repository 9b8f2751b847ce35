//! Lucien: hierarchical spatial indexing over bounded 3D Euclidean space.
//!
//! Two interchangeable partition schemes — an octree (cubic subdivision,
//! Morton-encoded keys) and a tetree (tetrahedral subdivision, type-encoded
//! keys) — sit behind one abstract [`SpatialIndex`]. See the crate's
//! `SPEC_FULL.md` for the full design.
//!
//! [`SpatialIndex`]: engine::SpatialIndex

pub mod cancel;
pub mod config;
pub mod entity;
pub mod error;
pub mod geometry;
pub mod key;
pub mod node;
pub mod pool;

pub mod engine;

pub use cancel::{CancelToken, NeverCancel};
pub use config::{BalancingStrategy, Configuration, Scheme as PartitionScheme};
pub use engine::{BatchEntity, Neighbor, Octree, RangeQueryIter, RayHit, SpatialIndex, Tetree};
pub use error::{LucienError, Result};
pub use geometry::{Aabb, Frustum, Plane, Point3, Ray, Region, Sphere};
pub use key::{morton::MortonKey, tetree::TetreeKey, SpatialKey};

/// Marker trait for entity identifiers: opaque, totally ordered, hashable.
///
/// The engine never interprets an id's contents; it only stores, compares
/// and hashes it. Any type satisfying the bounds gets this for free.
pub trait EntityId: Copy + Eq + Ord + std::hash::Hash + Send + Sync + std::fmt::Debug + 'static {}

impl<T> EntityId for T where
    T: Copy + Eq + Ord + std::hash::Hash + Send + Sync + std::fmt::Debug + 'static
{
}

/// Coordinates live in `[0, 2^21)` along each axis.
pub const MAX_COORD: u32 = 1 << 21;

/// Deepest refinement level supported by either key scheme.
pub const MAX_LEVEL: u8 = 21;
