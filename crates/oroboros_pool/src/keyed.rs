//! # Keyed Resource Pool
//!
//! Maps caller-chosen keys to live items attached to an external hierarchy.
//!
//! ## Layout
//!
//! ```text
//! ┌─────────────────────────┐        ┌─────────────────────┐
//! │ live: IndexMap<K, Item> │ ─────► │ available: FreeList │
//! │ (insertion/sort order)  │ ◄───── │ (retired items)     │
//! └─────────────────────────┘        └─────────────────────┘
//!            ▲                                  ▲
//!            │ Recycler<K> requests             │ CreationStrategy
//!            └── flush_recycle_requests()       └── (only when empty)
//! ```
//!
//! Every transition does the attachment bookkeeping: spawned items are moved
//! to the end of their siblings, named after their key and enabled; recycled
//! items are disabled and parked under the holding area.

use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;

use crossbeam_channel::{unbounded, Receiver, Sender};
use indexmap::IndexMap;

use crate::attach::AttachmentHost;
use crate::config::PoolConfig;
use crate::error::{PoolError, PoolResult};
use crate::free_list::FreeListPool;
use crate::lifecycle::{PoolCallback, Recycler};
use crate::strategy::CreationStrategy;

/// Pool of items addressed by key.
///
/// Invariant: an item is either live under exactly one key or in the
/// available set, never both.
///
/// # Example
///
/// ```rust,ignore
/// let config = PoolConfig::named("tiles").with_prewarm(8);
/// let mut tiles = KeyedResourcePool::new(&mut scene, template, Direct, &config)?;
///
/// tiles.spawn(&mut scene, TileCoord::new(0, 0))?;
/// tiles.recycle(&mut scene, &TileCoord::new(0, 0))?;
/// tiles.dispose(&mut scene);
/// ```
pub struct KeyedResourcePool<H, K, S>
where
    H: AttachmentHost,
    S: CreationStrategy<H>,
{
    /// Used in logs and errors.
    name: String,
    /// Live set.
    live: IndexMap<K, S::Item>,
    /// Available set.
    available: FreeListPool<S::Item>,
    strategy: S,
    /// Duplicated for every new item. Disabled.
    template: H::Handle,
    /// Parent of retired items.
    holding: Option<H::Handle>,
    /// Successful spawns since construction or the last `clear_all`.
    spawn_count: usize,
    /// Items ever built by the strategy.
    created_count: usize,
    /// Cloned into every item's recycler.
    request_sender: Sender<K>,
    request_receiver: Receiver<K>,
    /// Requests received but not yet applied.
    pending: Vec<K>,
}

impl<H, K, S> fmt::Debug for KeyedResourcePool<H, K, S>
where
    H: AttachmentHost,
    S: CreationStrategy<H>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedResourcePool")
            .field("name", &self.name)
            .field("live", &self.live.len())
            .field("available", &self.available.len())
            .field("template", &self.template)
            .field("spawn_count", &self.spawn_count)
            .field("created_count", &self.created_count)
            .finish_non_exhaustive()
    }
}

impl<H, K, S> KeyedResourcePool<H, K, S>
where
    H: AttachmentHost,
    K: Clone + Eq + Hash + fmt::Display,
    S: CreationStrategy<H>,
    S::Item: PoolCallback<K>,
{
    /// Creates a pool whose holding area is the template's parent.
    ///
    /// # Arguments
    ///
    /// * `host` - Hierarchy the items are attached to
    /// * `template` - Node duplicated for every new item (disabled here)
    /// * `strategy` - How an item is built from a duplicated node
    /// * `config` - Name, prewarm count and capacity hint
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfig`] for an invalid configuration, or
    /// the strategy's error if prewarming fails.
    pub fn new(
        host: &mut H,
        template: H::Handle,
        strategy: S,
        config: &PoolConfig,
    ) -> PoolResult<Self> {
        let holding = host.parent_of(template);
        Self::new_in(host, template, holding, strategy, config)
    }

    /// Creates a pool with an explicit holding area.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn new_in(
        host: &mut H,
        template: H::Handle,
        holding: Option<H::Handle>,
        strategy: S,
        config: &PoolConfig,
    ) -> PoolResult<Self> {
        config.validate()?;
        host.set_enabled(template, false);

        let (request_sender, request_receiver) = unbounded();
        let mut pool = Self {
            name: config.name.clone(),
            live: IndexMap::with_capacity(config.capacity_hint),
            available: FreeListPool::with_capacity(config.capacity_hint.max(config.prewarm)),
            strategy,
            template,
            holding,
            spawn_count: 0,
            created_count: 0,
            request_sender,
            request_receiver,
            pending: Vec::new(),
        };

        for _ in 0..config.prewarm {
            let item = match pool.create(host) {
                Ok(item) => item,
                Err(err) => {
                    // Items built before the failure must not outlive the pool
                    let count = pool.destroy_available(host);
                    tracing::warn!(
                        "Pool '{}' prewarm failed after {} items: {}",
                        pool.name,
                        count,
                        err
                    );
                    return Err(err);
                }
            };
            host.set_enabled(pool.strategy.handle_of(&item), false);
            pool.available.push(item);
        }
        if config.prewarm > 0 {
            tracing::debug!("Pool '{}' prewarmed {} items", pool.name, config.prewarm);
        }

        Ok(pool)
    }

    /// Builds a brand-new item and runs `on_pool_create`.
    fn create(&mut self, host: &mut H) -> PoolResult<S::Item> {
        let handle = host.instantiate(self.template, self.holding)?;
        let mut item = match self.strategy.create(host, handle) {
            Ok(item) => item,
            Err(err) => {
                host.destroy(handle);
                return Err(err);
            }
        };

        item.on_pool_create(Recycler::new(self.request_sender.clone()));
        self.created_count += 1;
        tracing::debug!(
            "Pool '{}' created item #{} ({:?})",
            self.name,
            self.created_count,
            handle
        );
        Ok(item)
    }

    /// Makes an item live under `key`.
    ///
    /// Reuses a retired item if there is one, otherwise builds one through the
    /// creation strategy.
    ///
    /// # Errors
    ///
    /// - [`PoolError::DuplicateKey`] if `key` is already live. Nothing changes:
    ///   the existing item stays, no item is taken or built.
    /// - [`PoolError::Construction`] if a new item cannot be built.
    pub fn spawn(&mut self, host: &mut H, key: K) -> PoolResult<&mut S::Item> {
        if self.live.contains_key(&key) {
            tracing::error!("Pool '{}': key {} is already live", self.name, key);
            return Err(PoolError::DuplicateKey {
                pool: self.name.clone(),
                key: key.to_string(),
            });
        }

        let mut item = match self.available.pop() {
            Some(item) => item,
            None => self.create(host)?,
        };

        let handle = self.strategy.handle_of(&item);
        host.set_last_sibling(handle);
        host.set_name(handle, &key.to_string());
        host.set_enabled(handle, true);
        item.on_pool_spawn(key.clone());
        self.spawn_count += 1;

        Ok(self.live.entry(key).or_insert(item))
    }

    /// Returns the live item for `key`, spawning one if the key is not live.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Construction`] if a new item cannot be built.
    pub fn get_or_spawn(&mut self, host: &mut H, key: K) -> PoolResult<&mut S::Item> {
        if let Some(index) = self.live.get_index_of(&key) {
            return Ok(&mut self.live[index]);
        }
        self.spawn(host, key)
    }

    /// Retires the item live under `key` and returns it, now in the
    /// available set.
    ///
    /// Pending recycle requests for `key` are discarded.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::MissingKey`] if `key` is not live. Nothing changes.
    pub fn recycle(&mut self, host: &mut H, key: &K) -> PoolResult<&mut S::Item> {
        let Some(mut item) = self.live.shift_remove(key) else {
            return Err(self.missing(key));
        };

        self.collect_requests();
        self.pending.retain(|pending| pending != key);

        Self::retire(host, &self.strategy, self.holding, &mut item);
        Ok(self.available.push(item))
    }

    /// Recycles `key` if it is live.
    ///
    /// Returns true if an item was recycled.
    pub fn try_recycle(&mut self, host: &mut H, key: &K) -> bool {
        self.live.contains_key(key) && self.recycle(host, key).is_ok()
    }

    /// Applies the recycle requests items sent through their [`Recycler`].
    ///
    /// Call once at the end of the update pass. Requests for keys that are no
    /// longer live are ignored.
    ///
    /// Returns the number of items recycled.
    pub fn flush_recycle_requests(&mut self, host: &mut H) -> usize {
        self.collect_requests();
        if self.pending.is_empty() {
            return 0;
        }

        let mut recycled = 0;
        for key in std::mem::take(&mut self.pending) {
            match self.live.shift_remove(&key) {
                Some(mut item) => {
                    Self::retire(host, &self.strategy, self.holding, &mut item);
                    self.available.push(item);
                    recycled += 1;
                }
                None => {
                    tracing::warn!(
                        "Pool '{}': ignoring recycle request for key {} (not live)",
                        self.name,
                        key
                    );
                }
            }
        }
        recycled
    }

    /// Re-orders the live set and the attachment order to match.
    ///
    /// The last item in `compare` order becomes the last sibling. Key to item
    /// associations are unchanged.
    pub fn sort<F>(&mut self, host: &mut H, mut compare: F)
    where
        F: FnMut(&K, &S::Item, &K, &S::Item) -> Ordering,
    {
        self.live.sort_by(|k1, v1, k2, v2| compare(k1, v1, k2, v2));
        for item in self.live.values() {
            host.set_last_sibling(self.strategy.handle_of(item));
        }
    }

    /// Recycles every live item and resets the spawn counter.
    ///
    /// All pending recycle requests are discarded.
    pub fn clear_all(&mut self, host: &mut H) {
        self.collect_requests();
        self.pending.clear();

        let count = self.live.len();
        for (_, mut item) in self.live.drain(..) {
            Self::retire(host, &self.strategy, self.holding, &mut item);
            self.available.push(item);
        }
        self.spawn_count = 0;

        tracing::debug!("Pool '{}' cleared ({} items recycled)", self.name, count);
    }

    /// Tears the pool down.
    ///
    /// Recycles every live item, then runs `on_pool_dispose` on every item
    /// and destroys its node. Recyclers held by items fail afterwards.
    pub fn dispose(mut self, host: &mut H) {
        self.clear_all(host);
        let count = self.destroy_available(host);
        self.available.dispose();

        tracing::debug!("Pool '{}' disposed ({} items)", self.name, count);
    }

    /// Runs `on_pool_dispose` on every available item and destroys its node.
    ///
    /// Returns the number of items destroyed.
    fn destroy_available(&mut self, host: &mut H) -> usize {
        let count = self.available.len();
        while let Some(mut item) = self.available.pop() {
            item.on_pool_dispose();
            host.destroy(self.strategy.handle_of(&item));
        }
        count
    }

    /// Gets the live item for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::MissingKey`] if `key` is not live.
    pub fn get(&self, key: &K) -> PoolResult<&S::Item> {
        self.live.get(key).ok_or_else(|| self.missing(key))
    }

    /// Gets the live item for `key` mutably.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::MissingKey`] if `key` is not live.
    pub fn get_mut(&mut self, key: &K) -> PoolResult<&mut S::Item> {
        match self.live.get_index_of(key) {
            Some(index) => Ok(&mut self.live[index]),
            None => Err(self.missing(key)),
        }
    }

    /// Gets the live item for `key`, if any.
    #[inline]
    #[must_use]
    pub fn try_get(&self, key: &K) -> Option<&S::Item> {
        self.live.get(key)
    }

    /// Gets the live item for `key` mutably, if any.
    #[inline]
    pub fn try_get_mut(&mut self, key: &K) -> Option<&mut S::Item> {
        self.live.get_mut(key)
    }

    /// Checks if `key` is live.
    #[inline]
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.live.contains_key(key)
    }

    /// Disables and parks an item, then runs `on_pool_recycle`.
    fn retire(host: &mut H, strategy: &S, holding: Option<H::Handle>, item: &mut S::Item) {
        let handle = strategy.handle_of(item);
        host.set_enabled(handle, false);
        host.set_parent(handle, holding);
        item.on_pool_recycle();
    }

    fn collect_requests(&mut self) {
        self.pending.extend(self.request_receiver.try_iter());
    }

    fn missing(&self, key: &K) -> PoolError {
        PoolError::MissingKey {
            pool: self.name.clone(),
            key: key.to_string(),
        }
    }
}

impl<H, S> KeyedResourcePool<H, usize, S>
where
    H: AttachmentHost,
    S: CreationStrategy<H>,
    S::Item: PoolCallback<usize>,
{
    /// Spawns under the next counter value and returns the key with the item.
    ///
    /// # Errors
    ///
    /// Same as [`spawn`](Self::spawn). The counter value can collide with a
    /// key spawned explicitly.
    pub fn spawn_next(&mut self, host: &mut H) -> PoolResult<(usize, &mut S::Item)> {
        let key = self.spawn_count;
        let item = self.spawn(host, key)?;
        Ok((key, item))
    }
}

impl<H, K, S> KeyedResourcePool<H, K, S>
where
    H: AttachmentHost,
    S: CreationStrategy<H>,
{
    /// Pool name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Template node.
    #[inline]
    #[must_use]
    pub fn template(&self) -> H::Handle {
        self.template
    }

    /// Number of live items.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Checks if no item is live.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Number of retired items waiting for reuse.
    #[inline]
    #[must_use]
    pub fn available_count(&self) -> usize {
        self.available.len()
    }

    /// Successful spawns since construction or the last `clear_all`.
    #[inline]
    #[must_use]
    pub const fn spawn_count(&self) -> usize {
        self.spawn_count
    }

    /// Items ever built by the creation strategy.
    #[inline]
    #[must_use]
    pub const fn created_count(&self) -> usize {
        self.created_count
    }

    /// Iterates over live items in live-set order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &S::Item)> {
        self.live.iter()
    }

    /// Iterates mutably over live items in live-set order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&K, &mut S::Item)> {
        self.live.iter_mut()
    }

    /// Iterates over live keys.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.live.keys()
    }

    /// Iterates over live items.
    pub fn values(&self) -> impl Iterator<Item = &S::Item> {
        self.live.values()
    }

    /// Iterates mutably over live items.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut S::Item> {
        self.live.values_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::PoolMember;
    use crate::mock_host::{MockHost, Probe};
    use crate::strategy::{BehaviourLookup, Direct, Parameterized};
    use proptest::prelude::*;
    use std::cell::Cell;
    use std::rc::Rc;

    type ProbePool = KeyedResourcePool<MockHost, u32, BehaviourLookup<Probe>>;

    fn setup() -> (MockHost, u32, u32) {
        let mut host = MockHost::new();
        let holding = host.add_node("Pools", None);
        let template = host.add_node("probe", Some(holding));
        host.attach_probe(template);
        (host, holding, template)
    }

    fn probe_pool(host: &mut MockHost, template: u32) -> ProbePool {
        KeyedResourcePool::new(host, template, BehaviourLookup::new(), &PoolConfig::named("probes"))
            .unwrap()
    }

    #[test]
    fn test_spawn_recycle_respawn_scenario() {
        let (mut host, _, template) = setup();
        let mut pool = probe_pool(&mut host, template);

        for key in 1..=3 {
            pool.spawn(&mut host, key).unwrap();
        }
        assert_eq!(pool.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(pool.spawn_count(), 3);

        let recycled = pool.recycle(&mut host, &2).unwrap().handle;
        assert_eq!(pool.keys().copied().collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(pool.available_count(), 1);
        assert_eq!(pool.spawn_count(), 3);

        let reused = pool.spawn(&mut host, 4).unwrap();
        assert_eq!(reused.handle, recycled);
        assert_eq!(reused.spawns, 2);
        assert_eq!(reused.created, 1);
        assert_eq!(pool.keys().copied().collect::<Vec<_>>(), vec![1, 3, 4]);
        assert_eq!(pool.spawn_count(), 4);
        assert_eq!(pool.available_count(), 0);
        assert_eq!(pool.created_count(), 3); // Reuse before allocation
    }

    #[test]
    fn test_recycle_missing_key_changes_nothing() {
        let (mut host, _, template) = setup();
        let mut pool = probe_pool(&mut host, template);
        pool.spawn(&mut host, 1).unwrap();

        let err = pool.recycle(&mut host, &5).unwrap_err();
        assert_eq!(
            err,
            PoolError::MissingKey {
                pool: "probes".to_string(),
                key: "5".to_string(),
            }
        );
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.available_count(), 0);
        assert!(!pool.try_recycle(&mut host, &5));
        assert!(pool.get(&5).is_err());
    }

    #[test]
    fn test_duplicate_spawn_has_no_side_effects() {
        let (mut host, _, template) = setup();
        let mut pool = probe_pool(&mut host, template);
        let original = pool.spawn(&mut host, 1).unwrap().handle;
        let nodes = host.alive_count();

        let err = pool.spawn(&mut host, 1).unwrap_err();
        assert!(matches!(err, PoolError::DuplicateKey { .. }));

        let kept = pool.get(&1).unwrap();
        assert_eq!(kept.handle, original);
        assert_eq!(kept.spawns, 1);
        assert_eq!(pool.spawn_count(), 1);
        assert_eq!(pool.created_count(), 1);
        assert_eq!(host.alive_count(), nodes);
    }

    #[test]
    fn test_attachment_bookkeeping() {
        let (mut host, holding, template) = setup();
        let mut pool = probe_pool(&mut host, template);
        assert!(!host.is_enabled(template));

        let a = pool.spawn(&mut host, 10).unwrap().handle;
        let b = pool.spawn(&mut host, 20).unwrap().handle;
        assert_eq!(host.name(a), "10");
        assert!(host.is_enabled(a));
        assert_eq!(host.children(Some(holding)), &[template, a, b]);

        pool.recycle(&mut host, &10).unwrap();
        assert!(!host.is_enabled(a));
        assert_eq!(host.parent_of(a), Some(holding));

        // Reused item moves to the end and takes the new name
        pool.spawn(&mut host, 30).unwrap();
        assert_eq!(host.name(a), "30");
        assert_eq!(host.children(Some(holding)), &[template, b, a]);
    }

    #[test]
    fn test_spawn_resets_transient_state() {
        let (mut host, _, template) = setup();
        let mut pool = probe_pool(&mut host, template);

        pool.spawn(&mut host, 1).unwrap().scratch.extend([1, 2, 3]);
        let recycled = pool.recycle(&mut host, &1).unwrap();
        assert_eq!(recycled.recycles, 1);
        assert!(!recycled.member.is_live());

        let item = pool.spawn(&mut host, 2).unwrap();
        assert!(item.scratch.is_empty());
        assert_eq!(item.member.key(), Some(&2));
    }

    #[test]
    fn test_sort_preserves_associations() {
        let (mut host, holding, template) = setup();
        let mut pool = probe_pool(&mut host, template);
        let mut handles = Vec::new();
        for key in [3, 1, 2] {
            let handle = pool.spawn(&mut host, key).unwrap().handle;
            handles.push((key, handle));
        }

        pool.sort(&mut host, |k1, _, k2, _| k2.cmp(k1));
        assert_eq!(pool.keys().copied().collect::<Vec<_>>(), vec![3, 2, 1]);
        for (key, handle) in handles {
            assert_eq!(pool.get(&key).unwrap().handle, handle);
        }

        let order: Vec<u32> = pool.values().map(|item| item.handle).collect();
        assert_eq!(&host.children(Some(holding))[1..], order.as_slice());
    }

    #[test]
    fn test_clear_all_recycles_everything() {
        let (mut host, _, template) = setup();
        let mut pool = probe_pool(&mut host, template);
        for key in 0..4 {
            pool.spawn(&mut host, key).unwrap();
        }

        pool.clear_all(&mut host);
        assert!(pool.is_empty());
        assert_eq!(pool.available_count(), 4);
        assert_eq!(pool.spawn_count(), 0);

        let item = pool.spawn(&mut host, 0).unwrap();
        assert_eq!(item.recycles, 1);
        assert_eq!(pool.created_count(), 4);
    }

    #[test]
    fn test_dispose_runs_hooks_and_destroys_nodes() {
        let (mut host, _, template) = setup();
        let disposals = Rc::new(Cell::new(0));
        let shared = Rc::clone(&disposals);
        let strategy: Parameterized<Probe, _> =
            Parameterized::new(move |_: &mut MockHost, handle: u32| -> PoolResult<Probe> {
                let mut probe = Probe::new(handle);
                probe.disposals = Rc::clone(&shared);
                Ok(probe)
            });
        let mut pool =
            KeyedResourcePool::new(&mut host, template, strategy, &PoolConfig::named("fx")).unwrap();

        let live = pool.spawn(&mut host, 1).unwrap().handle;
        pool.spawn(&mut host, 2).unwrap();
        pool.recycle(&mut host, &2).unwrap();

        // Keep a bound member alive past the pool
        let mut survivor = PoolMember::new();
        std::mem::swap(&mut survivor, &mut pool.get_mut(&1).unwrap().member);

        pool.dispose(&mut host);
        assert_eq!(disposals.get(), 2);
        assert!(!host.is_alive(live));
        assert!(host.is_alive(template));
        assert_eq!(survivor.request_recycle(), Err(PoolError::Disposed));
    }

    #[test]
    fn test_self_recycle_applies_on_flush() {
        let (mut host, _, template) = setup();
        let mut pool = probe_pool(&mut host, template);
        for key in 0..3 {
            pool.spawn(&mut host, key).unwrap();
        }

        // Items request their own recycle during iteration
        for item in pool.values_mut() {
            if item.member.key().is_some_and(|key| key % 2 == 0) {
                assert_eq!(item.member.request_recycle(), Ok(true));
            }
        }
        assert_eq!(pool.len(), 3);

        assert_eq!(pool.flush_recycle_requests(&mut host), 2);
        assert_eq!(pool.keys().copied().collect::<Vec<_>>(), vec![1]);
        assert_eq!(pool.flush_recycle_requests(&mut host), 0);
    }

    #[test]
    fn test_explicit_recycle_discards_stale_request() {
        let (mut host, _, template) = setup();
        let mut pool = probe_pool(&mut host, template);

        pool.spawn(&mut host, 7).unwrap().member.request_recycle().unwrap();
        pool.recycle(&mut host, &7).unwrap();
        pool.spawn(&mut host, 7).unwrap();

        assert_eq!(pool.flush_recycle_requests(&mut host), 0);
        assert!(pool.contains(&7));
    }

    #[test]
    fn test_construction_failure_leaves_no_trace() {
        let mut host = MockHost::new();
        let template = host.add_node("bare", None);
        let mut pool: ProbePool =
            KeyedResourcePool::new(&mut host, template, BehaviourLookup::new(), &PoolConfig::named("bare"))
                .unwrap();
        let nodes = host.alive_count();

        let err = pool.spawn(&mut host, 1).unwrap_err();
        assert!(matches!(err, PoolError::Construction(_)));
        assert!(pool.is_empty());
        assert_eq!(pool.created_count(), 0);
        assert_eq!(pool.spawn_count(), 0);
        assert_eq!(host.alive_count(), nodes);
    }

    #[test]
    fn test_failed_prewarm_destroys_built_items() {
        let (mut host, _, template) = setup();
        let nodes = host.alive_count();
        let disposals = Rc::new(Cell::new(0));
        let shared = Rc::clone(&disposals);
        let calls = Cell::new(0);
        let strategy: Parameterized<Probe, _> =
            Parameterized::new(move |_: &mut MockHost, handle: u32| -> PoolResult<Probe> {
                calls.set(calls.get() + 1);
                if calls.get() == 3 {
                    return Err(PoolError::Construction("out of decals".into()));
                }
                let mut probe = Probe::new(handle);
                probe.disposals = Rc::clone(&shared);
                Ok(probe)
            });
        let config = PoolConfig::named("warm").with_prewarm(5);

        let result = KeyedResourcePool::<MockHost, u32, _>::new(&mut host, template, strategy, &config);
        assert!(matches!(result, Err(PoolError::Construction(_))));
        assert_eq!(host.alive_count(), nodes);
        assert_eq!(disposals.get(), 2);
        assert!(host.is_alive(template));
    }

    #[test]
    fn test_prewarm_creates_available_items() {
        let (mut host, _, template) = setup();
        let config = PoolConfig::named("warm").with_prewarm(3);
        let mut pool: ProbePool =
            KeyedResourcePool::new(&mut host, template, BehaviourLookup::new(), &config).unwrap();
        assert_eq!(pool.created_count(), 3);
        assert_eq!(pool.available_count(), 3);

        let item = pool.spawn(&mut host, 1).unwrap();
        assert_eq!(item.created, 1);
        assert_eq!(pool.created_count(), 3);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let (mut host, _, template) = setup();
        let result: PoolResult<ProbePool> = KeyedResourcePool::new(
            &mut host,
            template,
            BehaviourLookup::new(),
            &PoolConfig::named(""),
        );
        assert!(matches!(result, Err(PoolError::InvalidConfig(_))));
    }

    #[test]
    fn test_spawn_next_and_get_or_spawn() {
        let mut host = MockHost::new();
        let template = host.add_node("tile", None);
        let mut pool: KeyedResourcePool<MockHost, usize, Direct> =
            KeyedResourcePool::new_in(&mut host, template, None, Direct, &PoolConfig::named("tiles"))
                .unwrap();

        let (first, _) = pool.spawn_next(&mut host).unwrap();
        let (second, handle) = pool.spawn_next(&mut host).unwrap();
        let handle = *handle;
        assert_eq!((first, second), (0, 1));

        assert_eq!(*pool.get_or_spawn(&mut host, 1).unwrap(), handle);
        assert_eq!(pool.spawn_count(), 2);
        pool.get_or_spawn(&mut host, 9).unwrap();
        assert_eq!(pool.spawn_count(), 3);
        assert_eq!(pool.name(), "tiles");
        assert_eq!(pool.template(), template);

        assert!(pool.try_recycle(&mut host, &0));
        assert_eq!(pool.try_get(&0), None);
        assert!(pool.try_get_mut(&9).is_some());
        assert!(pool.get_mut(&0).is_err());
        assert_eq!(pool.iter().count(), 2);
        assert_eq!(pool.iter_mut().count(), 2);
    }

    #[derive(Clone, Debug)]
    enum Op {
        Spawn(u32),
        Recycle(u32),
        Clear,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => (0u32..8).prop_map(Op::Spawn),
            3 => (0u32..8).prop_map(Op::Recycle),
            1 => Just(Op::Clear),
        ]
    }

    proptest! {
        #[test]
        fn test_live_and_available_stay_disjoint(ops in prop::collection::vec(op_strategy(), 1..64)) {
            let (mut host, _, template) = setup();
            let mut pool = probe_pool(&mut host, template);
            let mut expected_count = 0;

            for op in ops {
                match op {
                    Op::Spawn(key) => {
                        if pool.spawn(&mut host, key).is_ok() {
                            expected_count += 1;
                        }
                    }
                    Op::Recycle(key) => {
                        let _ = pool.recycle(&mut host, &key);
                    }
                    Op::Clear => {
                        pool.clear_all(&mut host);
                        expected_count = 0;
                    }
                }

                prop_assert_eq!(pool.spawn_count(), expected_count);
                prop_assert_eq!(pool.len() + pool.available_count(), pool.created_count());
                for parked in pool.available.iter() {
                    prop_assert!(pool.values().all(|live| live.handle != parked.handle));
                }
            }
        }

        #[test]
        fn test_sort_keeps_membership(keys in prop::collection::hash_set(0u32..64, 0..16)) {
            let (mut host, _, template) = setup();
            let mut pool = probe_pool(&mut host, template);
            for &key in &keys {
                pool.spawn(&mut host, key).unwrap();
            }

            pool.sort(&mut host, |k1, _, k2, _| k1.cmp(k2));
            let sorted: Vec<u32> = pool.keys().copied().collect();
            let mut expected: Vec<u32> = keys.into_iter().collect();
            expected.sort_unstable();
            prop_assert_eq!(sorted, expected);
        }
    }
}
