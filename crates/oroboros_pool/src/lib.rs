//! # OROBOROS Pool
//!
//! Object pooling for short-lived game objects (decals, sparks, streamed
//! tiles, scratch collections) with zero allocation churn once warm.
//!
//! ## Pools
//!
//! 1. [`FreeListPool`] - per-type stack of reusable instances
//! 2. [`ScratchPools`] - free lists for common scratch collections
//! 3. [`ActivationTrackingPool`] - two-set pool that rejects foreign tickets
//! 4. [`KeyedResourcePool`] - key to item mapping driving the four-phase
//!    lifecycle and attachment bookkeeping
//!
//! Items of a keyed pool are built by a [`CreationStrategy`] and attached to
//! an [`AttachmentHost`]. Per-type pools are owned by a [`PoolRegistry`]
//! instead of living in process-wide statics.
//!
//! ## Example
//!
//! ```rust,ignore
//! use oroboros_pool::{Direct, KeyedResourcePool, PoolConfig};
//!
//! let mut tiles = KeyedResourcePool::new(&mut scene, template, Direct, &PoolConfig::named("tiles"))?;
//! tiles.spawn(&mut scene, 0usize)?;
//! tiles.recycle(&mut scene, &0)?;
//! tiles.dispose(&mut scene);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod attach;
pub mod config;
pub mod error;
pub mod free_list;
pub mod keyed;
pub mod lifecycle;
pub mod registry;
pub mod scratch;
pub mod slot_id;
pub mod strategy;
pub mod tracking;

#[cfg(test)]
mod mock_host;

pub use attach::{Attached, AttachmentHost, BehaviourHost};
pub use config::{PoolConfig, PoolConfigSet, MAX_PREWARM};
pub use error::{PoolError, PoolResult};
pub use free_list::{FreeListPool, FreeListStats, Poolable};
pub use keyed::KeyedResourcePool;
pub use lifecycle::{PoolCallback, PoolMember, Recycler};
pub use registry::PoolRegistry;
pub use scratch::ScratchPools;
pub use slot_id::SlotId;
pub use strategy::{BehaviourLookup, CreationStrategy, Direct, Parameterized};
pub use tracking::{ActivationTrackingPool, Ticket};
