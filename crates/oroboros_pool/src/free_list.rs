//! # Free-List Pool
//!
//! Stack of reusable instances for values that are spawned and recycled every
//! frame (scratch buffers, small value containers).

/// Hooks a type can opt into when it lives in a [`FreeListPool`].
///
/// All hooks default to doing nothing.
pub trait Poolable {
    /// Runs once, the first time a brand-new instance is handed out.
    fn on_create(&mut self) {}

    /// Runs on every spawn, new or reused, before the instance is handed out.
    fn on_initialize(&mut self) {}

    /// Runs when the instance is returned to the pool.
    fn on_recycle(&mut self) {}
}

/// Allocation accounting for a [`FreeListPool`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FreeListStats {
    /// Instances constructed because the stack was empty.
    pub created: usize,
    /// Spawns served from the stack.
    pub reused: usize,
}

/// A stack of retired instances.
///
/// There is no identity tracking: recycling the same instance twice simply
/// pushes it twice. Use [`crate::ActivationTrackingPool`] or
/// [`crate::KeyedResourcePool`] where provenance matters.
///
/// # Thread Safety
///
/// This pool is NOT thread-safe. Use one pool per thread.
///
/// # Example
///
/// ```rust,ignore
/// let mut pool: FreeListPool<Vec<u32>> = FreeListPool::new();
///
/// let mut buffer = pool.spawn();   // cleared, possibly reused
/// buffer.push(7);
/// pool.recycle(buffer);            // back on the stack
/// ```
#[derive(Debug)]
pub struct FreeListPool<T> {
    /// Retired instances, most recently recycled on top.
    items: Vec<T>,
    /// Allocation accounting.
    stats: FreeListStats,
}

impl<T> Default for FreeListPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FreeListPool<T> {
    /// Creates an empty pool.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            items: Vec::new(),
            stats: FreeListStats {
                created: 0,
                reused: 0,
            },
        }
    }

    /// Creates an empty pool with storage reserved for `capacity` instances.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            stats: FreeListStats::default(),
        }
    }

    /// Returns the number of retired instances waiting for reuse.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if no instance is waiting for reuse.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns allocation accounting.
    #[inline]
    #[must_use]
    pub const fn stats(&self) -> FreeListStats {
        self.stats
    }

    /// Pops the most recently pushed instance without running hooks.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    /// Pushes an instance without running hooks, returning it in place.
    #[inline]
    pub fn push(&mut self, item: T) -> &mut T {
        let index = self.items.len();
        self.items.push(item);
        &mut self.items[index]
    }

    /// Iterates over the retired instances, bottom of the stack first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Empties the stack without running hooks. Storage is kept.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Empties the stack and releases its storage.
    pub fn dispose(&mut self) {
        self.items = Vec::new();
    }
}

impl<T: Poolable> FreeListPool<T> {
    /// Spawns an instance, constructing it with `create` if the stack is empty.
    ///
    /// New instances get [`Poolable::on_create`]; every spawned instance gets
    /// [`Poolable::on_initialize`].
    pub fn spawn_with(&mut self, create: impl FnOnce() -> T) -> T {
        let mut item = if let Some(item) = self.items.pop() {
            self.stats.reused += 1;
            item
        } else {
            self.stats.created += 1;
            let mut item = create();
            item.on_create();
            item
        };
        item.on_initialize();
        item
    }

    /// Returns an instance to the pool after running [`Poolable::on_recycle`].
    pub fn recycle(&mut self, mut item: T) {
        item.on_recycle();
        self.items.push(item);
    }
}

impl<T: Poolable + Default> FreeListPool<T> {
    /// Spawns an instance, constructing it with `Default` if the stack is empty.
    pub fn spawn(&mut self) -> T {
        self.spawn_with(T::default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Probe {
        created: u32,
        initialized: u32,
        recycled: u32,
        serial: u32,
    }

    impl Poolable for Probe {
        fn on_create(&mut self) {
            self.created += 1;
        }

        fn on_initialize(&mut self) {
            self.initialized += 1;
        }

        fn on_recycle(&mut self) {
            self.recycled += 1;
        }
    }

    #[test]
    fn test_spawn_creates_then_reuses() {
        let mut pool: FreeListPool<Probe> = FreeListPool::new();

        let mut first = pool.spawn();
        assert_eq!((first.created, first.initialized, first.recycled), (1, 1, 0));
        first.serial = 42;

        pool.recycle(first);
        assert_eq!(pool.len(), 1);

        let again = pool.spawn();
        assert_eq!(again.serial, 42); // Same instance
        assert_eq!((again.created, again.initialized, again.recycled), (1, 2, 1));
        assert_eq!(pool.stats(), FreeListStats { created: 1, reused: 1 });
    }

    #[test]
    fn test_spawn_with_factory() {
        let mut pool: FreeListPool<Probe> = FreeListPool::with_capacity(4);
        let item = pool.spawn_with(|| Probe {
            serial: 9,
            ..Probe::default()
        });
        assert_eq!(item.serial, 9);
        assert_eq!(item.created, 1);
    }

    #[test]
    fn test_duplicate_recycle_grows_stack() {
        let mut pool: FreeListPool<u8> = FreeListPool::new();
        pool.push(1);
        pool.push(1);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.iter().copied().collect::<Vec<_>>(), vec![1, 1]);
    }

    #[test]
    fn test_clear_skips_hooks_and_keeps_storage() {
        let mut pool: FreeListPool<Probe> = FreeListPool::with_capacity(8);
        pool.recycle(Probe::default());
        pool.clear();
        assert!(pool.is_empty());
        assert!(pool.items.capacity() >= 8);

        pool.dispose();
        assert_eq!(pool.items.capacity(), 0);
    }

    #[test]
    fn test_raw_push_pop_run_no_hooks() {
        let mut pool: FreeListPool<Probe> = FreeListPool::new();
        pool.push(Probe::default()).serial = 5;
        let item = pool.pop().unwrap();
        assert_eq!(item.serial, 5);
        assert_eq!((item.created, item.initialized, item.recycled), (0, 0, 0));
        assert!(pool.pop().is_none());
    }
}
