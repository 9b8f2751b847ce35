//! `MortonKey`: one 64-bit Morton (Z-order) key for cubic (octree)
//! subdivision (`SPEC_FULL.md` §3, §4.1).
//!
//! Bits `[0, 3*level)` hold the interleaved `(x, y, z)` prefix at `level`;
//! bit `3*level` is a sentinel "1" marking where the level ends. Level is
//! therefore recovered from the position of the highest set bit rather
//! than stored in a side field, so the whole key — level included — really
//! is one 64-bit integer. This is the same trick used by linear-octree
//! Morton codes elsewhere in the wild (e.g. the
//! `isosurface` crate's `Morton` type): `root = 1`, `child = (code << 3) |
//! which`, `parent = code >> 3`.

use crate::error::{LucienError, Result};
use crate::geometry::{Aabb, Point3};
use crate::key::{Direction, SpatialKey};
use std::cmp::Ordering;

/// A quantized grid coordinate: `[0, 2^21)`, one unit per deepest-level cell.
pub type GridCoord = u32;

const COORD_BITS: u32 = 21;
pub const MAX_LEVEL: u8 = 21;

#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub struct MortonKey(u64);

impl MortonKey {
    /// The level-0 key spanning the whole domain.
    pub const ROOT: MortonKey = MortonKey(1);

    /// Builds the key for the cell at `level` containing grid coordinates
    /// `(x, y, z)`.
    pub fn from_grid(x: GridCoord, y: GridCoord, z: GridCoord, level: u8) -> Self {
        debug_assert!(level <= MAX_LEVEL);
        let shift = COORD_BITS - level as u32;
        let xs = (x >> shift) as u64;
        let ys = (y >> shift) as u64;
        let zs = (z >> shift) as u64;
        let data = split_by_3(xs) | (split_by_3(ys) << 1) | (split_by_3(zs) << 2);
        let sentinel = 1u64 << (3 * level as u32);
        MortonKey(data | sentinel)
    }

    /// Builds the key for the cell at `level` containing `point`.
    pub fn from_point(point: &Point3, level: u8) -> Result<Self> {
        point
            .check_in_domain()
            .map_err(|(axis, value)| LucienError::OutOfDomain { axis, value })?;
        let x = point.x as GridCoord;
        let y = point.y as GridCoord;
        let z = point.z as GridCoord;
        Ok(Self::from_grid(x, y, z, level))
    }

    /// Raw 64-bit representation, matching this key's externally-stable
    /// byte encoding.
    pub fn raw(&self) -> u64 {
        self.0
    }

    pub fn from_raw(raw: u64) -> Self {
        MortonKey(raw)
    }

    /// The `level`-bit lane values packed into this key (not yet shifted
    /// to full grid resolution).
    fn lanes(&self) -> (u32, u32, u32, u8) {
        let level = self.level();
        let sentinel = 1u64 << (3 * level as u32);
        let data = self.0 ^ sentinel;
        let xs = compact_by_3(data) as u32;
        let ys = compact_by_3(data >> 1) as u32;
        let zs = compact_by_3(data >> 2) as u32;
        (xs, ys, zs, level)
    }

    /// The minimum-corner grid coordinates of this key's cell, at full
    /// (deepest-level) resolution.
    pub fn anchor(&self) -> (GridCoord, GridCoord, GridCoord) {
        let (xs, ys, zs, level) = self.lanes();
        let shift = COORD_BITS - level as u32;
        (xs << shift, ys << shift, zs << shift)
    }

    /// Side length of this key's cell.
    pub fn cell_size(&self) -> u32 {
        1 << (COORD_BITS - self.level() as u32)
    }
}

impl std::fmt::Debug for MortonKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let anchor = self.anchor();
        f.debug_struct("MortonKey")
            .field("level", &self.level())
            .field("anchor", &anchor)
            .finish()
    }
}

impl Ord for MortonKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for MortonKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl SpatialKey for MortonKey {
    const CHILDREN: u8 = 8;

    fn level(&self) -> u8 {
        ((63 - self.0.leading_zeros()) / 3) as u8
    }

    fn parent(&self) -> Result<Self> {
        if self.level() == 0 {
            return Err(LucienError::AtRoot);
        }
        Ok(MortonKey(self.0 >> 3))
    }

    fn child(&self, index: u8) -> Result<Self> {
        if self.level() >= MAX_LEVEL {
            return Err(LucienError::MaxDepth {
                level: self.level() + 1,
            });
        }
        debug_assert!(index < 8);
        Ok(MortonKey((self.0 << 3) | index as u64))
    }

    fn child_index(&self) -> u8 {
        (self.0 & 0b111) as u8
    }

    fn contains(&self, point: &Point3) -> bool {
        let bb = self.bounding_box();
        point.x >= bb.min.x
            && point.x < bb.max.x
            && point.y >= bb.min.y
            && point.y < bb.max.y
            && point.z >= bb.min.z
            && point.z < bb.max.z
    }

    fn bounding_box(&self) -> Aabb {
        let (x, y, z) = self.anchor();
        let size = self.cell_size() as f64;
        Aabb::new(
            Point3::new(x as f64, y as f64, z as f64),
            Point3::new(x as f64 + size, y as f64 + size, z as f64 + size),
        )
    }

    fn neighbor(&self, direction: Direction) -> Option<Self> {
        let (xs, ys, zs, level) = self.lanes();
        let max_cells = 1i64 << level;
        let nx = xs as i64 + direction.dx as i64;
        let ny = ys as i64 + direction.dy as i64;
        let nz = zs as i64 + direction.dz as i64;
        if nx < 0 || ny < 0 || nz < 0 || nx >= max_cells || ny >= max_cells || nz >= max_cells {
            return None;
        }
        let shift = COORD_BITS - level as u32;
        Some(MortonKey::from_grid(
            (nx as u32) << shift,
            (ny as u32) << shift,
            (nz as u32) << shift,
            level,
        ))
    }

    fn to_stable_bytes(&self) -> Vec<u8> {
        self.0.to_be_bytes().to_vec()
    }
}

/// Spreads the low 21 bits of `a` so each occupies every third bit,
/// starting at bit 0 (`0b...001001001`). The companion to [`compact_by_3`].
fn split_by_3(a: u64) -> u64 {
    let mut x = a & 0x1f_ffff;
    x = (x | (x << 32)) & 0x1f00000000ffff;
    x = (x | (x << 16)) & 0x1f0000ff0000ff;
    x = (x | (x << 8)) & 0x100f00f00f00f00f;
    x = (x | (x << 4)) & 0x10c30c30c30c30c3;
    x = (x | (x << 2)) & 0x1249249249249249;
    x
}

/// Inverse of [`split_by_3`]: gathers every third bit of `a` (starting at
/// bit 0) back into a contiguous 21-bit value.
fn compact_by_3(a: u64) -> u64 {
    let mut x = a & 0x1249249249249249;
    x = (x ^ (x >> 2)) & 0x10c30c30c30c30c3;
    x = (x ^ (x >> 4)) & 0x100f00f00f00f00f;
    x = (x ^ (x >> 8)) & 0x1f0000ff0000ff;
    x = (x ^ (x >> 16)) & 0x1f00000000ffff;
    x = (x ^ (x >> 32)) & 0x1f_ffff;
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_is_level_zero() {
        assert_eq!(MortonKey::ROOT.level(), 0);
        assert_eq!(MortonKey::ROOT.anchor(), (0, 0, 0));
    }

    #[test]
    fn split_compact_round_trip() {
        for value in [0u64, 1, 5, 0x1fffff, 123456, 987] {
            assert_eq!(compact_by_3(split_by_3(value)), value);
        }
    }

    #[test]
    fn from_grid_round_trips_anchor() {
        let key = MortonKey::from_grid(12345, 54321, 98765, 21);
        assert_eq!(key.anchor(), (12345, 54321, 98765));
    }

    #[test]
    fn parent_child_inverse() {
        let key = MortonKey::from_grid(100, 200, 300, 10);
        for i in 0..8 {
            let child = key.child(i).unwrap();
            assert_eq!(child.parent().unwrap(), key);
            assert_eq!(child.child_index(), i);
        }
    }

    #[test]
    fn root_has_no_parent() {
        assert!(matches!(MortonKey::ROOT.parent(), Err(LucienError::AtRoot)));
    }

    #[test]
    fn deepest_level_has_no_children() {
        let key = MortonKey::from_grid(0, 0, 0, MAX_LEVEL);
        assert!(matches!(
            key.child(0),
            Err(LucienError::MaxDepth { level: 22 })
        ));
    }

    #[test]
    fn contains_point_inside_cell() {
        let key = MortonKey::from_grid(0, 0, 0, 10);
        let bb = key.bounding_box();
        let mid = bb.center();
        assert!(key.contains(&mid));
    }

    #[test]
    fn ordering_matches_raw_code() {
        let a = MortonKey::from_grid(0, 0, 0, 5);
        let b = MortonKey::from_grid(1, 0, 0, 5);
        assert!((a < b) == (a.raw() < b.raw()));
    }

    #[test]
    fn face_neighbor_crosses_cell_boundary() {
        let key = MortonKey::from_grid(10, 10, 10, 10);
        let east = key.face_neighbor(Direction::new(1, 0, 0)).unwrap();
        assert_eq!(east.anchor().0, key.anchor().0 + key.cell_size());
    }

    #[test]
    fn neighbor_out_of_domain_is_none() {
        let key = MortonKey::ROOT;
        assert!(key.face_neighbor(Direction::new(-1, 0, 0)).is_none());
    }
}
