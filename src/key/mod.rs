//! Spatial key algebra (`SPEC_FULL.md` §3, §4.1).
//!
//! A key identifies exactly one cell at exactly one refinement level. Two
//! families implement [`SpatialKey`]: [`morton::MortonKey`] (cubic
//! subdivision) and [`tetree::TetreeKey`] (tetrahedral subdivision). The
//! engine is generic over this trait; it never needs to know which family
//! it is holding.

pub mod cache;
pub mod morton;
pub mod tetree;

use crate::error::Result;
use crate::geometry::{Aabb, Point3};
use std::hash::Hash;

/// A coordinate offset toward a topological neighbor: exactly one non-zero
/// component is a face direction, exactly two a edge direction, exactly
/// three a vertex direction. Mirrors the integer-offset neighbor algebra
/// both key families are built on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Direction {
    pub dx: i32,
    pub dy: i32,
    pub dz: i32,
}

impl Direction {
    pub const fn new(dx: i32, dy: i32, dz: i32) -> Self {
        Direction { dx, dy, dz }
    }

    pub fn as_array(&self) -> [i32; 3] {
        [self.dx, self.dy, self.dz]
    }

    fn nonzero_count(&self) -> u32 {
        (self.dx != 0) as u32 + (self.dy != 0) as u32 + (self.dz != 0) as u32
    }

    pub fn is_face(&self) -> bool {
        self.nonzero_count() == 1
    }

    pub fn is_edge(&self) -> bool {
        self.nonzero_count() == 2
    }

    pub fn is_vertex(&self) -> bool {
        self.nonzero_count() == 3
    }
}

/// The six face directions of a cube (±x, ±y, ±z).
pub const FACE_DIRECTIONS: [Direction; 6] = [
    Direction::new(1, 0, 0),
    Direction::new(-1, 0, 0),
    Direction::new(0, 1, 0),
    Direction::new(0, -1, 0),
    Direction::new(0, 0, 1),
    Direction::new(0, 0, -1),
];

/// The twelve edge directions of a cube.
pub const EDGE_DIRECTIONS: [Direction; 12] = [
    Direction::new(1, 1, 0),
    Direction::new(1, -1, 0),
    Direction::new(-1, 1, 0),
    Direction::new(-1, -1, 0),
    Direction::new(1, 0, 1),
    Direction::new(1, 0, -1),
    Direction::new(-1, 0, 1),
    Direction::new(-1, 0, -1),
    Direction::new(0, 1, 1),
    Direction::new(0, 1, -1),
    Direction::new(0, -1, 1),
    Direction::new(0, -1, -1),
];

/// The eight vertex directions of a cube.
pub const VERTEX_DIRECTIONS: [Direction; 8] = [
    Direction::new(1, 1, 1),
    Direction::new(1, 1, -1),
    Direction::new(1, -1, 1),
    Direction::new(1, -1, -1),
    Direction::new(-1, 1, 1),
    Direction::new(-1, 1, -1),
    Direction::new(-1, -1, 1),
    Direction::new(-1, -1, -1),
];

/// A key uniquely identifies one cell at one refinement level. Implemented
/// once per partition scheme (octree, tetree); the engine is generic over
/// this trait (`SPEC_FULL.md` §9 "dual-scheme polymorphism").
pub trait SpatialKey:
    Copy + Eq + Ord + Hash + Send + Sync + std::fmt::Debug + 'static
{
    /// Number of children a key at any level below the max has (8 for both
    /// schemes).
    const CHILDREN: u8;

    fn level(&self) -> u8;

    /// Fails with [`crate::LucienError::AtRoot`] at level 0.
    fn parent(&self) -> Result<Self>;

    /// Fails with [`crate::LucienError::MaxDepth`] at the deepest level.
    fn child(&self, index: u8) -> Result<Self>;

    /// This key's index (0..CHILDREN) within its parent's children. Used to
    /// verify `parent(child(k, i)) == k` (invariant 4).
    fn child_index(&self) -> u8;

    /// All `CHILDREN` children in child-index order.
    fn children(&self) -> Vec<Self> {
        (0..Self::CHILDREN)
            .filter_map(|i| self.child(i).ok())
            .collect()
    }

    /// Whether this key's cell contains `point`.
    fn contains(&self, point: &Point3) -> bool;

    /// The axis-aligned bounding box of this key's cell.
    fn bounding_box(&self) -> Aabb;

    /// Raw coordinate-offset neighbor lookup; `face_neighbor`,
    /// `edge_neighbor` and `vertex_neighbor` are this validated by
    /// direction class. Returns `None` at domain boundaries.
    fn neighbor(&self, direction: Direction) -> Option<Self>;

    fn face_neighbor(&self, direction: Direction) -> Option<Self> {
        debug_assert!(direction.is_face(), "not a face direction");
        self.neighbor(direction)
    }

    fn edge_neighbor(&self, direction: Direction) -> Option<Self> {
        debug_assert!(direction.is_edge(), "not an edge direction");
        self.neighbor(direction)
    }

    fn vertex_neighbor(&self, direction: Direction) -> Option<Self> {
        debug_assert!(direction.is_vertex(), "not a vertex direction");
        self.neighbor(direction)
    }

    fn is_boundary(&self, direction: Direction) -> bool {
        self.neighbor(direction).is_none()
    }

    /// All strict ancestors, root-first.
    fn ancestors(&self) -> Vec<Self> {
        let mut out = Vec::with_capacity(self.level() as usize);
        let mut current = *self;
        while let Ok(parent) = current.parent() {
            out.push(parent);
            current = parent;
        }
        out.reverse();
        out
    }

    fn is_ancestor_of(&self, other: &Self) -> bool {
        if self.level() >= other.level() {
            return false;
        }
        let mut current = *other;
        while let Ok(parent) = current.parent() {
            if parent == *self {
                return true;
            }
            current = parent;
        }
        false
    }

    /// A fixed-width, externally-stable byte encoding of this key, for
    /// ghost/forest layers that need to serialize keys across processes
    /// (`SPEC_FULL.md` §6). Lucien itself never reads this back.
    fn to_stable_bytes(&self) -> Vec<u8>;
}
