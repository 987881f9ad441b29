//! # Deferred-Mutation Object Pool
//!
//! Pre-allocated storage for engine objects (entities, emitters, sprites,
//! state machines, offscreen targets) that are created and destroyed *around*
//! parallel phases, never during them.
//!
//! The pool keeps two views of the same live set:
//! - `live`: a dense array where `object.index == position` - the array every
//!   parallel job iterates
//! - `sorted`: an independently reorderable permutation of the same objects,
//!   e.g. by view depth
//!
//! Births and deaths are staged in queues and applied by [`Pool::purge`] in a
//! single-threaded compaction pass between frame phases. The dense arrays
//! never change shape while a job is iterating them; that discipline is what
//! makes "create/destroy while N threads are mid-iteration" safe without a
//! single lock.

use std::cmp::Ordering;

/// Identity block embedded in every pooled object.
#[derive(Clone, Copy, Debug)]
pub struct PoolHeader {
    /// Position in the dense live array, `-1` until the first purge commits
    /// the object.
    pub index: i32,
    /// Position in the sorted permutation, `-1` until committed.
    pub sorted_index: i32,
    /// Soft-delete flag. Set by [`Pool::release`], honored at the next purge.
    pub dead: bool,
}

impl PoolHeader {
    /// A header for an object that has not been committed yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            index: -1,
            sorted_index: -1,
            dead: false,
        }
    }
}

impl Default for PoolHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// Trait for objects managed by a [`Pool`].
pub trait Poolable {
    /// Read access to the identity block.
    fn header(&self) -> &PoolHeader;
    /// Write access to the identity block. Only the owning pool mutates it.
    fn header_mut(&mut self) -> &mut PoolHeader;
}

/// Handle to an object inside a [`Pool`].
///
/// Handles stay valid across purges until the object is released and the
/// following purge physically removes it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PoolHandle {
    slot: u32,
}

/// Deferred-mutation pool.
///
/// All storage is pre-allocated at construction; `create`/`release` touch
/// staging queues only, and [`Pool::purge`] performs the one compaction pass
/// per frame.
pub struct Pool<T: Poolable> {
    /// Slot arena. A slot's position never changes while its object lives.
    slots: Vec<Option<T>>,
    /// Free slot indices, ready for reuse.
    free: Vec<u32>,
    /// Dense live array: `slots[live[i]].header().index == i`.
    live: Vec<u32>,
    /// Render-order permutation of `live`'s contents.
    sorted: Vec<u32>,
    /// Staged births, applied at the next purge.
    born: Vec<u32>,
    /// Staged deaths, applied at the next purge.
    dead: Vec<u32>,
}

impl<T: Poolable> Pool<T> {
    /// Creates a pool with the given fixed capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "Pool capacity must be greater than zero");
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            free: (0..capacity as u32).rev().collect(),
            live: Vec::with_capacity(capacity),
            sorted: Vec::with_capacity(capacity),
            born: Vec::with_capacity(capacity),
            dead: Vec::with_capacity(capacity),
        }
    }

    /// Total slot capacity.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of committed live objects. Staged births are not counted.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Returns true if no objects are committed.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Stages a new object for commit at the next purge.
    ///
    /// The object is not visible to [`Pool::iter`] until then. Returns `None`
    /// when the pool is full - callers degrade by omission, they do not fail.
    pub fn create(&mut self, mut value: T) -> Option<PoolHandle> {
        let slot = self.free.pop()?;
        *value.header_mut() = PoolHeader::new();
        self.slots[slot as usize] = Some(value);
        self.born.push(slot);
        Some(PoolHandle { slot })
    }

    /// Stages an object for removal at the next purge.
    ///
    /// Idempotent: releasing an invalid handle or an already-dead object is
    /// a no-op, so at most one death is ever staged per object.
    pub fn release(&mut self, handle: PoolHandle) {
        let Some(object) = self.slots.get_mut(handle.slot as usize).and_then(Option::as_mut)
        else {
            return;
        };
        if object.header().dead {
            return;
        }
        object.header_mut().dead = true;
        self.dead.push(handle.slot);
    }

    /// Resolves a handle. Released objects remain resolvable until the purge
    /// that removes them.
    #[inline]
    #[must_use]
    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        self.slots.get(handle.slot as usize)?.as_ref()
    }

    /// Mutable handle resolution.
    #[inline]
    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        self.slots.get_mut(handle.slot as usize)?.as_mut()
    }

    /// Applies all staged births, then all staged deaths.
    ///
    /// Must run single-threaded, strictly between parallel phases. Births
    /// append to both the dense array and the sorted permutation; deaths
    /// swap-remove from both, patching the moved object's header. An object
    /// staged as dead before ever being committed is deleted outright, never
    /// swap-removed.
    pub fn purge(&mut self) {
        // Births first: a same-frame create+release pair resolves here.
        for i in 0..self.born.len() {
            let slot = self.born[i];
            let Some(object) = self.slots[slot as usize].as_mut() else {
                continue;
            };
            if object.header().dead {
                // Released before its first commit: delete outright.
                self.slots[slot as usize] = None;
                self.free.push(slot);
                continue;
            }
            object.header_mut().index = self.live.len() as i32;
            object.header_mut().sorted_index = self.sorted.len() as i32;
            self.live.push(slot);
            self.sorted.push(slot);
        }
        self.born.clear();

        // Deaths second: swap-remove from both views.
        for i in 0..self.dead.len() {
            let slot = self.dead[i];
            let Some(object) = self.slots[slot as usize].as_ref() else {
                // Deleted outright during the birth pass above.
                continue;
            };
            let index = object.header().index;
            let sorted_index = object.header().sorted_index;
            debug_assert!(index >= 0 && sorted_index >= 0, "committed object has dense indices");

            let last = self.live.len() - 1;
            self.live.swap(index as usize, last);
            self.live.pop();
            if (index as usize) < self.live.len() {
                let moved = self.live[index as usize];
                if let Some(moved_object) = self.slots[moved as usize].as_mut() {
                    moved_object.header_mut().index = index;
                }
            }

            let last = self.sorted.len() - 1;
            self.sorted.swap(sorted_index as usize, last);
            self.sorted.pop();
            if (sorted_index as usize) < self.sorted.len() {
                let moved = self.sorted[sorted_index as usize];
                if let Some(moved_object) = self.slots[moved as usize].as_mut() {
                    moved_object.header_mut().sorted_index = sorted_index;
                }
            }

            self.slots[slot as usize] = None;
            self.free.push(slot);
        }
        self.dead.clear();

        debug_assert!(self.born.is_empty() && self.dead.is_empty());
    }

    /// Iterates the dense live array in index order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.live
            .iter()
            .filter_map(move |&slot| self.slots[slot as usize].as_ref())
    }

    /// Mutably iterates the committed live set. Order is unspecified (arena
    /// order, not dense order); staged births are not visited until the
    /// purge that commits them.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        // A flat walk over the arena filtered to committed objects visits
        // exactly the live set and keeps the borrow checker out of the way.
        self.slots
            .iter_mut()
            .filter_map(Option::as_mut)
            .filter(|object| object.header().index >= 0)
    }

    /// Iterates in the sorted permutation's order.
    pub fn iter_sorted(&self) -> impl Iterator<Item = &T> {
        self.sorted
            .iter()
            .filter_map(move |&slot| self.slots[slot as usize].as_ref())
    }

    /// Reorders the sorted permutation without touching the dense array.
    ///
    /// Runs between phases, typically right after purge (e.g. a back-to-front
    /// depth sort for rendering).
    pub fn sort_by<F>(&mut self, mut compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let slots = &self.slots;
        self.sorted.sort_by(|&a, &b| {
            match (slots[a as usize].as_ref(), slots[b as usize].as_ref()) {
                (Some(x), Some(y)) => compare(x, y),
                _ => Ordering::Equal,
            }
        });
        // Headers are patched after the sort; a second pass keeps the
        // comparator borrow-free.
        for position in 0..self.sorted.len() {
            let slot = self.sorted[position];
            if let Some(object) = self.slots[slot as usize].as_mut() {
                object.header_mut().sorted_index = position as i32;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dummy {
        header: PoolHeader,
        value: u32,
    }

    impl Dummy {
        fn new(value: u32) -> Self {
            Self {
                header: PoolHeader::new(),
                value,
            }
        }
    }

    impl Poolable for Dummy {
        fn header(&self) -> &PoolHeader {
            &self.header
        }
        fn header_mut(&mut self) -> &mut PoolHeader {
            &mut self.header
        }
    }

    fn assert_dense_invariant(pool: &Pool<Dummy>) {
        for (i, object) in pool.iter().enumerate() {
            assert_eq!(object.header().index, i as i32);
        }
        let mut seen: Vec<i32> = pool.iter().map(|o| o.header().index).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), pool.len(), "no two live objects share an index");
    }

    #[test]
    fn test_create_commits_at_purge() {
        let mut pool: Pool<Dummy> = Pool::with_capacity(8);
        let handle = pool.create(Dummy::new(7)).unwrap();
        assert_eq!(pool.len(), 0);
        assert_eq!(pool.get(handle).unwrap().header().index, -1);

        pool.purge();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.get(handle).unwrap().header().index, 0);
        assert_dense_invariant(&pool);
    }

    #[test]
    fn test_double_release_stages_one_death() {
        let mut pool: Pool<Dummy> = Pool::with_capacity(8);
        let a = pool.create(Dummy::new(1)).unwrap();
        let b = pool.create(Dummy::new(2)).unwrap();
        pool.purge();
        assert_eq!(pool.len(), 2);

        pool.release(a);
        pool.release(a);
        pool.purge();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.get(b).unwrap().value, 2);
        assert_dense_invariant(&pool);
    }

    #[test]
    fn test_release_before_commit_deletes_outright() {
        let mut pool: Pool<Dummy> = Pool::with_capacity(2);
        let handle = pool.create(Dummy::new(1)).unwrap();
        pool.release(handle);
        pool.purge();
        assert_eq!(pool.len(), 0);
        assert!(pool.get(handle).is_none());

        // The slot is reusable again.
        assert!(pool.create(Dummy::new(2)).is_some());
        assert!(pool.create(Dummy::new(3)).is_some());
    }

    #[test]
    fn test_staged_births_are_invisible_to_iteration() {
        let mut pool: Pool<Dummy> = Pool::with_capacity(4);
        pool.create(Dummy::new(1)).unwrap();
        assert_eq!(pool.iter().count(), 0);
        assert_eq!(pool.iter_mut().count(), 0);
        pool.purge();
        assert_eq!(pool.iter().count(), 1);
        assert_eq!(pool.iter_mut().count(), 1);
    }

    #[test]
    fn test_full_pool_degrades_by_omission() {
        let mut pool: Pool<Dummy> = Pool::with_capacity(1);
        assert!(pool.create(Dummy::new(1)).is_some());
        assert!(pool.create(Dummy::new(2)).is_none());
    }

    #[test]
    fn test_swap_remove_patches_moved_object() {
        let mut pool: Pool<Dummy> = Pool::with_capacity(8);
        let handles: Vec<_> = (0..5).map(|i| pool.create(Dummy::new(i)).unwrap()).collect();
        pool.purge();

        // Remove from the middle; the former last object takes its place.
        pool.release(handles[1]);
        pool.purge();
        assert_eq!(pool.len(), 4);
        assert_dense_invariant(&pool);
        assert_eq!(pool.get(handles[4]).unwrap().header().index, 1);
    }

    #[test]
    fn test_sort_reorders_permutation_only() {
        let mut pool: Pool<Dummy> = Pool::with_capacity(8);
        for value in [3, 1, 2] {
            pool.create(Dummy::new(value)).unwrap();
        }
        pool.purge();

        pool.sort_by(|a, b| a.value.cmp(&b.value));

        let sorted: Vec<u32> = pool.iter_sorted().map(|o| o.value).collect();
        assert_eq!(sorted, vec![1, 2, 3]);

        // Dense order is untouched.
        let dense: Vec<u32> = pool.iter().map(|o| o.value).collect();
        assert_eq!(dense, vec![3, 1, 2]);

        for (position, object) in pool.iter_sorted().enumerate() {
            assert_eq!(object.header().sorted_index, position as i32);
        }
        assert_dense_invariant(&pool);
    }

    #[test]
    fn test_churn_preserves_invariants() {
        let mut pool: Pool<Dummy> = Pool::with_capacity(64);
        let mut handles = Vec::new();
        for round in 0..10u32 {
            for i in 0..6 {
                if let Some(h) = pool.create(Dummy::new(round * 100 + i)) {
                    handles.push(h);
                }
            }
            // Release every third tracked handle, keep the rest.
            let mut kept = Vec::new();
            for (i, h) in handles.drain(..).enumerate() {
                if i % 3 == 0 {
                    pool.release(h);
                } else {
                    kept.push(h);
                }
            }
            handles = kept;
            pool.purge();
            assert_dense_invariant(&pool);
        }
    }
}
