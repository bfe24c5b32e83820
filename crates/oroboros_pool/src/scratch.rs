//! # Scratch Collection Pools
//!
//! Temporary working buffers for algorithms that run every frame. Each
//! container comes back cleared, so callers never see a previous user's data.

use std::collections::{HashSet, LinkedList, VecDeque};
use std::hash::Hash;

use crate::free_list::{FreeListPool, Poolable};

impl<T> Poolable for Vec<T> {
    fn on_initialize(&mut self) {
        self.clear();
    }
}

impl<T> Poolable for VecDeque<T> {
    fn on_initialize(&mut self) {
        self.clear();
    }
}

impl<T, S> Poolable for HashSet<T, S> {
    fn on_initialize(&mut self) {
        self.clear();
    }
}

impl<T> Poolable for LinkedList<T> {
    fn on_initialize(&mut self) {
        self.clear();
    }
}

/// One free list per scratch container shape, for a single element type.
#[derive(Debug)]
pub struct ScratchPools<T> {
    /// Sequences.
    lists: FreeListPool<Vec<T>>,
    /// Stacks (push/pop at the back).
    stacks: FreeListPool<Vec<T>>,
    /// FIFO queues.
    queues: FreeListPool<VecDeque<T>>,
    /// Hash sets.
    sets: FreeListPool<HashSet<T>>,
    /// Doubly-linked sequences.
    linked: FreeListPool<LinkedList<T>>,
}

impl<T> Default for ScratchPools<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ScratchPools<T> {
    /// Creates empty pools.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lists: FreeListPool::new(),
            stacks: FreeListPool::new(),
            queues: FreeListPool::new(),
            sets: FreeListPool::new(),
            linked: FreeListPool::new(),
        }
    }

    /// Spawns a cleared sequence.
    pub fn spawn_list(&mut self) -> Vec<T> {
        self.lists.spawn()
    }

    /// Returns a sequence.
    pub fn recycle_list(&mut self, list: Vec<T>) {
        self.lists.recycle(list);
    }

    /// Spawns a cleared stack.
    pub fn spawn_stack(&mut self) -> Vec<T> {
        self.stacks.spawn()
    }

    /// Returns a stack.
    pub fn recycle_stack(&mut self, stack: Vec<T>) {
        self.stacks.recycle(stack);
    }

    /// Spawns a cleared queue.
    pub fn spawn_queue(&mut self) -> VecDeque<T> {
        self.queues.spawn()
    }

    /// Returns a queue.
    pub fn recycle_queue(&mut self, queue: VecDeque<T>) {
        self.queues.recycle(queue);
    }

    /// Spawns a cleared linked sequence.
    pub fn spawn_linked(&mut self) -> LinkedList<T> {
        self.linked.spawn()
    }

    /// Returns a linked sequence.
    pub fn recycle_linked(&mut self, linked: LinkedList<T>) {
        self.linked.recycle(linked);
    }

    /// Returns the number of containers waiting for reuse, all shapes combined.
    #[must_use]
    pub fn pooled_count(&self) -> usize {
        self.lists.len() + self.stacks.len() + self.queues.len() + self.sets.len() + self.linked.len()
    }

    /// Drops every pooled container. Storage of the pools is kept.
    pub fn clear(&mut self) {
        self.lists.clear();
        self.stacks.clear();
        self.queues.clear();
        self.sets.clear();
        self.linked.clear();
    }

    /// Drops every pooled container and releases the pools' storage.
    pub fn dispose(&mut self) {
        self.lists.dispose();
        self.stacks.dispose();
        self.queues.dispose();
        self.sets.dispose();
        self.linked.dispose();
    }
}

impl<T: Eq + Hash> ScratchPools<T> {
    /// Spawns a cleared set.
    pub fn spawn_set(&mut self) -> HashSet<T> {
        self.sets.spawn()
    }

    /// Returns a set.
    pub fn recycle_set(&mut self, set: HashSet<T>) {
        self.sets.recycle(set);
    }
}
