//! Thread-local object pools for hot-path allocations (`SPEC_FULL.md`
//! §4.4, §9 "object pools", ambient stack "concurrency primitives").
//!
//! K-nearest, collision, and frustum traversal each need a priority
//! queue, result vector, or visited-set per call. Each one is borrowed
//! from a `crossbeam::queue::SegQueue` that is declared as a
//! `thread_local!` *inside* the generic accessor function below — the
//! static is monomorphized together with the function, so every distinct
//! `T` this crate ever pools gets its own per-thread queue without a
//! type-erased registry. Pools are uncapped on push (bounded implicitly
//! by how many calls are in flight on one thread) and a pop on an empty
//! queue falls back to a fresh allocation, exactly as `SPEC_FULL.md`
//! specifies.

use crossbeam::queue::SegQueue;
use std::collections::{BinaryHeap, HashSet};
use std::hash::Hash;
use std::thread::LocalKey;

fn vec_pool<T: 'static>() -> &'static LocalKey<SegQueue<Vec<T>>> {
    thread_local! {
        static POOL: SegQueue<Vec<T>> = SegQueue::new();
    }
    &POOL
}

fn heap_pool<T: Ord + 'static>() -> &'static LocalKey<SegQueue<BinaryHeap<T>>> {
    thread_local! {
        static POOL: SegQueue<BinaryHeap<T>> = SegQueue::new();
    }
    &POOL
}

fn set_pool<T: Eq + Hash + 'static>() -> &'static LocalKey<SegQueue<HashSet<T>>> {
    thread_local! {
        static POOL: SegQueue<HashSet<T>> = SegQueue::new();
    }
    &POOL
}

/// A pooled `Vec<T>`, returned to its thread-local pool on drop.
pub struct PooledVec<T: 'static> {
    inner: Option<Vec<T>>,
}

impl<T: 'static> PooledVec<T> {
    pub fn get_mut(&mut self) -> &mut Vec<T> {
        self.inner.as_mut().expect("PooledVec used after drop")
    }

    pub fn into_inner(mut self) -> Vec<T> {
        self.inner.take().expect("PooledVec used after drop")
    }
}

impl<T: 'static> std::ops::Deref for PooledVec<T> {
    type Target = Vec<T>;
    fn deref(&self) -> &Vec<T> {
        self.inner.as_ref().expect("PooledVec used after drop")
    }
}

impl<T: 'static> std::ops::DerefMut for PooledVec<T> {
    fn deref_mut(&mut self) -> &mut Vec<T> {
        self.get_mut()
    }
}

impl<T: 'static> Drop for PooledVec<T> {
    fn drop(&mut self) {
        if let Some(mut v) = self.inner.take() {
            v.clear();
            vec_pool::<T>().with(|pool| pool.push(v));
        }
    }
}

/// Takes a (possibly reused) result vector for `T` (`SPEC_FULL.md` §4.4
/// k-nearest/range/collision/frustum result accumulation).
pub fn take_result_vec<T: 'static>() -> PooledVec<T> {
    let v = vec_pool::<T>().with(|pool| pool.pop()).unwrap_or_default();
    PooledVec { inner: Some(v) }
}

/// A pooled max-heap used as the size-bounded "best k" structure in
/// k-nearest (`SPEC_FULL.md` §4.4).
pub struct PooledHeap<T: Ord + 'static> {
    inner: Option<BinaryHeap<T>>,
}

impl<T: Ord + 'static> PooledHeap<T> {
    pub fn get_mut(&mut self) -> &mut BinaryHeap<T> {
        self.inner.as_mut().expect("PooledHeap used after drop")
    }

    pub fn into_inner(mut self) -> BinaryHeap<T> {
        self.inner.take().expect("PooledHeap used after drop")
    }
}

impl<T: Ord + 'static> Drop for PooledHeap<T> {
    fn drop(&mut self) {
        if let Some(mut h) = self.inner.take() {
            h.clear();
            heap_pool::<T>().with(|pool| pool.push(h));
        }
    }
}

pub fn take_heap<T: Ord + 'static>() -> PooledHeap<T> {
    let h = heap_pool::<T>().with(|pool| pool.pop()).unwrap_or_default();
    PooledHeap { inner: Some(h) }
}

/// A pooled visited-set, used by k-nearest/collision enumeration to
/// suppress duplicate ids or pairs within one query (`SPEC_FULL.md` §4.4).
pub struct PooledSet<T: Eq + Hash + 'static> {
    inner: Option<HashSet<T>>,
}

impl<T: Eq + Hash + 'static> PooledSet<T> {
    pub fn get_mut(&mut self) -> &mut HashSet<T> {
        self.inner.as_mut().expect("PooledSet used after drop")
    }

    pub fn into_inner(mut self) -> HashSet<T> {
        self.inner.take().expect("PooledSet used after drop")
    }
}

impl<T: Eq + Hash + 'static> Drop for PooledSet<T> {
    fn drop(&mut self) {
        if let Some(mut s) = self.inner.take() {
            s.clear();
            set_pool::<T>().with(|pool| pool.push(s));
        }
    }
}

pub fn take_set<T: Eq + Hash + 'static>() -> PooledSet<T> {
    let s = set_pool::<T>().with(|pool| pool.pop()).unwrap_or_default();
    PooledSet { inner: Some(s) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pooled_vec_usable() {
        let mut v = take_result_vec::<u32>();
        v.get_mut().push(1);
        v.get_mut().push(2);
        assert_eq!(v.into_inner(), vec![1, 2]);
    }

    #[test]
    fn pooled_heap_orders() {
        let mut h = take_heap::<i32>();
        h.get_mut().push(3);
        h.get_mut().push(1);
        h.get_mut().push(2);
        let mut inner = h.into_inner();
        assert_eq!(inner.pop(), Some(3));
    }

    #[test]
    fn pooled_set_dedups() {
        let mut s = take_set::<u32>();
        s.get_mut().insert(1);
        s.get_mut().insert(1);
        assert_eq!(s.into_inner().len(), 1);
    }

    #[test]
    fn dropped_vec_is_recycled() {
        {
            let mut v = take_result_vec::<u64>();
            v.get_mut().push(42);
        }
        let recycled = take_result_vec::<u64>();
        assert!(recycled.is_empty());
    }
}
