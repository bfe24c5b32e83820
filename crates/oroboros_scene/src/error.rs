//! # Scene Error Types

use oroboros_pool::PoolError;
use thiserror::Error;

use crate::node::NodeId;

/// Errors that can occur when editing the scene graph.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneError {
    /// The node was destroyed, or its slot has been reused.
    #[error("{0} does not exist (destroyed or stale)")]
    StaleNode(NodeId),

    /// Reparenting would make a node its own ancestor.
    #[error("cannot move {node} under its descendant {parent}")]
    Cycle {
        /// The node being moved.
        node: NodeId,
        /// The requested parent.
        parent: NodeId,
    },
}

/// Result type for scene operations.
pub type SceneResult<T> = Result<T, SceneError>;

impl From<SceneError> for PoolError {
    fn from(err: SceneError) -> Self {
        Self::Construction(err.to_string())
    }
}
