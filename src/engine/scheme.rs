//! The "small set of virtual operations" each partition scheme provides so
//! the engine can be expressed once against [`crate::key::SpatialKey`] and
//! specialized per scheme (`SPEC_FULL.md` §2, §9 "dual-scheme
//! polymorphism").

use crate::error::Result;
use crate::geometry::Point3;
use crate::key::morton::MortonKey;
use crate::key::tetree::TetreeKey;
use crate::key::SpatialKey;

/// A partition scheme: the root key and the one genuinely
/// scheme-dependent operation, `enclosing`. Everything else the engine
/// needs (parent, child, neighbors, ordering) already lives on
/// [`SpatialKey`] itself.
pub trait Scheme: Send + Sync + 'static {
    type Key: SpatialKey;

    fn root() -> Self::Key;

    /// The unique key at `level` whose cell contains `point`
    /// (`SPEC_FULL.md` §4.1 `enclosing`).
    fn enclosing(point: &Point3, level: u8) -> Result<Self::Key>;

    /// Same result as [`Scheme::enclosing`], routed through whatever
    /// per-thread cache this scheme maintains when bulk loading is asked
    /// to use one (`SPEC_FULL.md` §4.1 "Caching", §4.4 "Bulk loading").
    /// The octree's `enclosing` is already O(1), so the default just calls
    /// it directly; the tetree overrides this to amortize its O(ℓ)
    /// ancestor-type walk via [`crate::key::cache`].
    fn batch_enclosing(point: &Point3, level: u8) -> Result<Self::Key> {
        Self::enclosing(point, level)
    }
}

/// Cubic subdivision, Morton-encoded keys. `enclosing` is O(1) bit
/// interleaving.
#[derive(Clone, Copy, Debug, Default)]
pub struct OctreeScheme;

impl Scheme for OctreeScheme {
    type Key = MortonKey;

    fn root() -> MortonKey {
        MortonKey::ROOT
    }

    fn enclosing(point: &Point3, level: u8) -> Result<MortonKey> {
        MortonKey::from_point(point, level)
    }
}

/// Tetrahedral subdivision. `enclosing` walks the ancestor-type chain —
/// O(ℓ) per `SPEC_FULL.md` §4.1.
#[derive(Clone, Copy, Debug, Default)]
pub struct TetreeScheme;

impl Scheme for TetreeScheme {
    type Key = TetreeKey;

    fn root() -> TetreeKey {
        TetreeKey::ROOT
    }

    fn enclosing(point: &Point3, level: u8) -> Result<TetreeKey> {
        TetreeKey::from_point(point, level)
    }

    fn batch_enclosing(point: &Point3, level: u8) -> Result<TetreeKey> {
        point
            .check_in_domain()
            .map_err(|(axis, value)| crate::error::LucienError::OutOfDomain { axis, value })?;
        let x = point.x as u32;
        let y = point.y as u32;
        let z = point.z as u32;
        let point = *point;
        Ok(crate::key::cache::cached_tetree_key(x, y, z, level, || {
            TetreeKey::from_point(&point, level).expect("domain already checked above")
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn octree_enclosing_matches_morton_key() {
        let p = Point3::new(10.0, 20.0, 30.0);
        let direct = MortonKey::from_point(&p, 8).unwrap();
        assert_eq!(OctreeScheme::enclosing(&p, 8).unwrap(), direct);
    }

    #[test]
    fn tetree_enclosing_matches_tetree_key() {
        let p = Point3::new(10.0, 20.0, 30.0);
        let direct = TetreeKey::from_point(&p, 8).unwrap();
        assert_eq!(TetreeScheme::enclosing(&p, 8).unwrap(), direct);
    }
}
