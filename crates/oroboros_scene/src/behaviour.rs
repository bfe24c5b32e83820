//! # Behaviours
//!
//! Behaviours are components attached to nodes. They are cloned along with
//! their node when a subtree is instantiated, and told which node they now
//! belong to.

use std::any::{type_name, Any};

use crate::node::NodeId;

/// A component that can be attached to a scene node.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Clone)]
/// struct Spin { node: NodeId, speed: f32 }
///
/// impl Behaviour for Spin {
///     fn on_attach(&mut self, node: NodeId) {
///         self.node = node;
///     }
/// }
/// ```
pub trait Behaviour: Any + Clone {
    /// Called when the behaviour is attached to `node`, including clones made
    /// by [`crate::SceneTree::instantiate`].
    fn on_attach(&mut self, _node: NodeId) {}
}

/// Object-safe view of a [`Behaviour`].
pub(crate) trait BehaviourSlot: Any {
    fn clone_slot(&self) -> Box<dyn BehaviourSlot>;
    fn attach(&mut self, node: NodeId);
    fn type_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<B: Behaviour> BehaviourSlot for B {
    fn clone_slot(&self) -> Box<dyn BehaviourSlot> {
        Box::new(self.clone())
    }

    fn attach(&mut self, node: NodeId) {
        self.on_attach(node);
    }

    fn type_name(&self) -> &'static str {
        type_name::<B>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}
