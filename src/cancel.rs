//! Cooperative query cancellation (`SPEC_FULL.md` §5, §6).
//!
//! Queries check a token once per key popped from their traversal queue.
//! A cancelled query returns whatever partial result it has accumulated —
//! callers that want an empty result on cancellation can simply discard it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Checked cooperatively by traversal loops; never blocks.
pub trait CancelToken: Send + Sync {
    fn is_cancelled(&self) -> bool;
}

/// The default token for callers that never cancel.
#[derive(Clone, Copy, Debug, Default)]
pub struct NeverCancel;

impl CancelToken for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

impl CancelToken for Arc<AtomicBool> {
    fn is_cancelled(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

/// A shareable, settable cancel token: clone it to hand a query a way to
/// stop it, and call [`AtomicCancelToken::cancel`] from another thread.
#[derive(Clone, Debug, Default)]
pub struct AtomicCancelToken(Arc<AtomicBool>);

impl AtomicCancelToken {
    pub fn new() -> Self {
        AtomicCancelToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

impl CancelToken for AtomicCancelToken {
    fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_cancel_is_never_cancelled() {
        assert!(!NeverCancel.is_cancelled());
    }

    #[test]
    fn atomic_cancel_token_flips() {
        let token = AtomicCancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
