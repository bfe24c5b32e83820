//! # Lifecycle Protocol
//!
//! Four ordered phases the keyed pool drives on every item:
//!
//! ```text
//! on_pool_create(recycler) ── once, brand-new instance
//!        │
//!        ▼
//! on_pool_spawn(key) ◄──────┐ every activation
//!        │                  │
//!        ▼                  │
//! on_pool_recycle() ────────┘ every return to the available set
//!        │
//!        ▼
//! on_pool_dispose() ── once, pool teardown
//! ```
//!
//! Self-recycling goes through a [`Recycler`]: the item sends its key back to
//! the pool, which applies the request at the end of the update pass.

use crossbeam_channel::Sender;

use crate::error::{PoolError, PoolResult};

/// Lifecycle callbacks for items of a [`crate::KeyedResourcePool`].
///
/// Every method has an empty default, so items that do not care implement
/// the trait with no body.
pub trait PoolCallback<K> {
    /// Called once when a brand-new instance is produced.
    fn on_pool_create(&mut self, _recycler: Recycler<K>) {}

    /// Called every time the item becomes live under `key`.
    ///
    /// Must reset all transient state to a fresh-looking baseline.
    fn on_pool_spawn(&mut self, _key: K) {}

    /// Called every time the item returns to the available set.
    ///
    /// Must release external references so they do not leak into the next
    /// activation.
    fn on_pool_recycle(&mut self) {}

    /// Called once when the owning pool is torn down.
    fn on_pool_dispose(&mut self) {}
}

/// Handle an item uses to ask its pool to recycle it.
#[derive(Debug)]
pub struct Recycler<K> {
    sender: Sender<K>,
}

impl<K> Clone for Recycler<K> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<K> Recycler<K> {
    pub(crate) const fn new(sender: Sender<K>) -> Self {
        Self { sender }
    }

    /// Requests that the item live under `key` be recycled.
    ///
    /// The request takes effect when the pool flushes its requests.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Disposed`] if the pool no longer exists.
    pub fn request(&self, key: K) -> PoolResult<()> {
        self.sender.send(key).map_err(|_| PoolError::Disposed)
    }
}

/// Pool bookkeeping an item carries to recycle itself.
///
/// Forward the lifecycle callbacks to [`bind`](Self::bind),
/// [`activate`](Self::activate), [`deactivate`](Self::deactivate) and
/// [`release`](Self::release), then call
/// [`request_recycle`](Self::request_recycle) from the item's update.
#[derive(Clone, Debug)]
pub struct PoolMember<K> {
    /// Bound at creation, dropped at dispose.
    recycler: Option<Recycler<K>>,
    /// Key of the current activation.
    key: Option<K>,
    /// A recycle request was sent for the current activation.
    requested: bool,
}

impl<K> Default for PoolMember<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> PoolMember<K> {
    /// Creates an unbound member.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            recycler: None,
            key: None,
            requested: false,
        }
    }

    /// Stores the recycler (`on_pool_create`).
    pub fn bind(&mut self, recycler: Recycler<K>) {
        self.recycler = Some(recycler);
    }

    /// Records the activation key (`on_pool_spawn`).
    pub fn activate(&mut self, key: K) {
        self.key = Some(key);
        self.requested = false;
    }

    /// Forgets the activation key (`on_pool_recycle`).
    pub fn deactivate(&mut self) {
        self.key = None;
        self.requested = false;
    }

    /// Drops the recycler and the key (`on_pool_dispose`).
    pub fn release(&mut self) {
        self.recycler = None;
        self.key = None;
        self.requested = false;
    }

    /// Key of the current activation, if live.
    #[must_use]
    pub const fn key(&self) -> Option<&K> {
        self.key.as_ref()
    }

    /// Returns true between spawn and recycle.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.key.is_some()
    }

    /// Returns true once a recycle was requested for this activation.
    #[must_use]
    pub const fn is_recycle_requested(&self) -> bool {
        self.requested
    }
}

impl<K: Clone> PoolMember<K> {
    /// Asks the pool to recycle this item.
    ///
    /// One-shot per activation: returns `Ok(false)` if the item is not live
    /// or a request was already sent.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Disposed`] if the item was never bound or its pool
    /// no longer exists.
    pub fn request_recycle(&mut self) -> PoolResult<bool> {
        let Some(recycler) = &self.recycler else {
            return Err(PoolError::Disposed);
        };
        let Some(key) = &self.key else {
            return Ok(false);
        };
        if self.requested {
            return Ok(false);
        }

        recycler.request(key.clone())?;
        self.requested = true;
        Ok(true)
    }
}
