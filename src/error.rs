//! Crate-wide error type.
//!
//! Preconditions (positive coordinates, valid level) are checked eagerly and
//! reported synchronously; they are not recovered. Concurrent races that
//! produce stale reads are not errors — see the consistency model in
//! `SPEC_FULL.md` §5.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, LucienError>;

/// Every error kind the engine can surface at the API boundary.
#[derive(Debug, Error)]
pub enum LucienError {
    /// A position's coordinate was negative or reached/exceeded `2^21` on
    /// the named axis.
    #[error("position coordinate on axis {axis} ({value}) is out of domain [0, 2^21)")]
    OutOfDomain {
        /// 0 = x, 1 = y, 2 = z.
        axis: u8,
        /// The offending coordinate value.
        value: f64,
    },

    /// `insert` was called with an id already present in the registry.
    #[error("entity {id:?} already exists")]
    DuplicateId {
        /// Debug rendering of the offending id.
        id: String,
    },

    /// `remove`/`update`/`lookup` referenced an id that isn't registered.
    #[error("entity {id:?} not found")]
    NotFound {
        /// Debug rendering of the offending id.
        id: String,
    },

    /// `parent()` was called on a level-0 key.
    #[error("key is already at the root level")]
    AtRoot,

    /// `child()` was called on a key at the deepest level, or `insert` was
    /// asked to place an entity past the deepest level.
    #[error("level {level} exceeds the maximum depth")]
    MaxDepth {
        /// The level that was rejected.
        level: u8,
    },

    /// A query was terminated by its [`CancelToken`](crate::cancel::CancelToken).
    #[error("query cancelled")]
    Cancelled,

    /// An internal invariant did not hold. This should never fire; if it
    /// does, it indicates a bug and the operation is aborted rather than
    /// recovered from.
    #[error("internal invariant violated: {0}")]
    InvariantViolation(&'static str),
}

impl LucienError {
    pub(crate) fn duplicate_id(id: impl std::fmt::Debug) -> Self {
        LucienError::DuplicateId {
            id: format!("{id:?}"),
        }
    }

    pub(crate) fn not_found(id: impl std::fmt::Debug) -> Self {
        LucienError::NotFound {
            id: format!("{id:?}"),
        }
    }
}
