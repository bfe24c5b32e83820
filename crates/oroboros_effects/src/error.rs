//! # Effects Error Types

use oroboros_pool::PoolError;
use oroboros_scene::SceneError;
use thiserror::Error;

/// Errors that can occur while driving pooled effects.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EffectsError {
    /// A pool rejected the request.
    #[error("pool error: {0}")]
    Pool(#[from] PoolError),

    /// The scene rejected the request.
    #[error("scene error: {0}")]
    Scene(#[from] SceneError),

    /// Effect settings the system cannot honour.
    #[error("invalid effect settings: {0}")]
    InvalidSettings(String),
}

/// Result type for effect operations.
pub type EffectsResult<T> = Result<T, EffectsError>;
