//! # Pool Error Types
//!
//! All errors that can occur while spawning, recycling or configuring pools.
//! None of them is fatal: every variant tells the caller to change its request.

use thiserror::Error;

/// Errors that can occur in the pooling system.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// Tried to spawn a key that is already live.
    #[error("key {key} already exists in pool `{pool}`")]
    DuplicateKey {
        /// The pool that rejected the spawn.
        pool: String,
        /// Display form of the key.
        key: String,
    },

    /// Tried to recycle or look up a key that is not live.
    #[error("key {key} is not live in pool `{pool}`")]
    MissingKey {
        /// The pool that was queried.
        pool: String,
        /// Display form of the key.
        key: String,
    },

    /// Pushed a ticket that is not currently activated (foreign or stale).
    #[error("ticket {index}:{generation} is not activated in this pool")]
    Identity {
        /// Slot index carried by the ticket.
        index: u32,
        /// Generation carried by the ticket.
        generation: u32,
    },

    /// A creation strategy or the attachment host failed to build an item.
    #[error("failed to construct pooled item: {0}")]
    Construction(String),

    /// The owning pool has been disposed.
    #[error("pool has been disposed")]
    Disposed,

    /// Invalid pool configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for pool operations.
pub type PoolResult<T> = Result<T, PoolError>;
