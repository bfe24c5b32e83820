//! # Pool Registry
//!
//! The one place that owns every per-type free list and scratch pool. The
//! composition root creates it at startup and tears it down explicitly; no
//! pool lives in global state.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use crate::free_list::{FreeListPool, Poolable};
use crate::scratch::ScratchPools;

/// Type-erased view of a registered pool.
trait RegisteredPool: Any {
    /// Number of instances waiting for reuse.
    fn pooled(&self) -> usize;
    /// Empties the pool without hooks.
    fn clear(&mut self);
    /// Empties the pool and releases its storage.
    fn dispose(&mut self);
    /// Downcast support.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: 'static> RegisteredPool for FreeListPool<T> {
    fn pooled(&self) -> usize {
        self.len()
    }

    fn clear(&mut self) {
        FreeListPool::clear(self);
    }

    fn dispose(&mut self) {
        FreeListPool::dispose(self);
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl<T: 'static> RegisteredPool for ScratchPools<T> {
    fn pooled(&self) -> usize {
        self.pooled_count()
    }

    fn clear(&mut self) {
        ScratchPools::clear(self);
    }

    fn dispose(&mut self) {
        ScratchPools::dispose(self);
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Registry of free lists and scratch pools, indexed by pool type.
///
/// # Example
///
/// ```rust,ignore
/// let mut registry = PoolRegistry::new();
///
/// let mut open = registry.scratch::<TileCoord>().spawn_list();
/// // ... work ...
/// registry.scratch::<TileCoord>().recycle_list(open);
///
/// registry.dispose();
/// ```
#[derive(Default)]
pub struct PoolRegistry {
    /// Pools keyed by their concrete pool type.
    pools: HashMap<TypeId, Box<dyn RegisteredPool>>,
}

impl std::fmt::Debug for PoolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolRegistry")
            .field("pools", &self.pools.len())
            .field("pooled", &self.pooled_count())
            .finish()
    }
}

impl PoolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of registered pools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pools.len()
    }

    /// Returns true if no pool has been registered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// Returns the number of pooled instances across all pools.
    #[must_use]
    pub fn pooled_count(&self) -> usize {
        self.pools.values().map(|pool| pool.pooled()).sum()
    }

    /// Returns the free list for `T`, registering it on first use.
    pub fn pool<T: 'static>(&mut self) -> &mut FreeListPool<T> {
        self.entry::<FreeListPool<T>>()
    }

    /// Returns the scratch pools for element type `T`, registering them on
    /// first use.
    pub fn scratch<T: 'static>(&mut self) -> &mut ScratchPools<T> {
        self.entry::<ScratchPools<T>>()
    }

    /// Spawns a `T` from its free list.
    pub fn spawn<T: Poolable + Default + 'static>(&mut self) -> T {
        self.pool::<T>().spawn()
    }

    /// Returns a `T` to its free list.
    pub fn recycle<T: Poolable + 'static>(&mut self, item: T) {
        self.pool::<T>().recycle(item);
    }

    /// Empties every registered pool without running hooks.
    pub fn clear(&mut self) {
        for pool in self.pools.values_mut() {
            pool.clear();
        }
        tracing::debug!("Pool registry cleared ({} pools)", self.pools.len());
    }

    /// Disposes every registered pool and the registry itself.
    pub fn dispose(mut self) {
        let count = self.pools.len();
        for (_, mut pool) in self.pools.drain() {
            pool.dispose();
        }
        tracing::debug!("Pool registry disposed ({} pools)", count);
    }

    /// Returns the pool of type `P`, inserting a default one if missing.
    fn entry<P: RegisteredPool + Default>(&mut self) -> &mut P {
        self.pools
            .entry(TypeId::of::<P>())
            .or_insert_with(|| Box::new(P::default()))
            .as_any_mut()
            .downcast_mut::<P>()
            .expect("registry entries are keyed by their own TypeId")
    }
}
