//! # Pool Host
//!
//! Lets keyed pools attach their items to a [`SceneTree`]. A plain
//! [`NodeId`] is itself a valid pooled item (Direct strategy); behaviours
//! carried by the template can be pooled through behaviour lookup.

use oroboros_pool::{Attached, AttachmentHost, BehaviourHost, PoolCallback, PoolResult};

use crate::behaviour::Behaviour;
use crate::error::SceneResult;
use crate::node::NodeId;
use crate::tree::SceneTree;

/// Logs a bookkeeping call the scene could not honour.
fn log_ignored(operation: &str, node: NodeId, result: SceneResult<()>) {
    if let Err(err) = result {
        tracing::warn!("Scene ignored {} on {:?}: {}", operation, node, err);
    }
}

impl AttachmentHost for SceneTree {
    type Handle = NodeId;

    fn instantiate(&mut self, template: NodeId, parent: Option<NodeId>) -> PoolResult<NodeId> {
        Ok(SceneTree::instantiate(self, template, parent)?)
    }

    fn parent_of(&self, handle: NodeId) -> Option<NodeId> {
        self.parent(handle).ok().flatten()
    }

    fn set_parent(&mut self, handle: NodeId, parent: Option<NodeId>) {
        let result = SceneTree::set_parent(self, handle, parent);
        log_ignored("set_parent", handle, result);
    }

    fn set_last_sibling(&mut self, handle: NodeId) {
        let result = SceneTree::set_last_sibling(self, handle);
        log_ignored("set_last_sibling", handle, result);
    }

    fn set_name(&mut self, handle: NodeId, name: &str) {
        let result = SceneTree::set_name(self, handle, name);
        log_ignored("set_name", handle, result);
    }

    fn set_enabled(&mut self, handle: NodeId, enabled: bool) {
        let result = SceneTree::set_enabled(self, handle, enabled);
        log_ignored("set_enabled", handle, result);
    }

    fn destroy(&mut self, handle: NodeId) {
        let result = SceneTree::destroy(self, handle);
        log_ignored("destroy", handle, result);
    }
}

impl<B: Behaviour> BehaviourHost<B> for SceneTree {
    fn take_behaviour(&mut self, handle: NodeId) -> Option<B> {
        self.detach_behaviour::<B>(handle)
    }
}

impl Attached<SceneTree> for NodeId {
    #[inline]
    fn handle(&self) -> NodeId {
        *self
    }
}

impl<K> PoolCallback<K> for NodeId {}
