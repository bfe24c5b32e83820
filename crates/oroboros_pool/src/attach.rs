//! # Attachment Capability
//!
//! Pooled items live in an external parent/child hierarchy (a scene graph,
//! a UI tree). The pool only needs structural operations on it: duplicate a
//! template, reparent, reorder siblings, rename, enable/disable, destroy.
//! It never inspects what a node renders or simulates.

use std::fmt;

use crate::error::PoolResult;

/// A hierarchy the pool can attach its items to.
///
/// Bookkeeping calls are infallible: a host that cannot honour one (stale
/// handle) logs and ignores it. Only duplication can fail, because the pool
/// must not register an item that has no attachment.
pub trait AttachmentHost {
    /// Handle to one node of the hierarchy.
    type Handle: Copy + Eq + fmt::Debug;

    /// Duplicates `template` (with its subtree) as the last child of `parent`
    /// (`None` = top level).
    ///
    /// # Errors
    ///
    /// Returns [`crate::PoolError::Construction`] if the template cannot be
    /// duplicated.
    fn instantiate(
        &mut self,
        template: Self::Handle,
        parent: Option<Self::Handle>,
    ) -> PoolResult<Self::Handle>;

    /// Returns the parent of `handle`.
    fn parent_of(&self, handle: Self::Handle) -> Option<Self::Handle>;

    /// Moves `handle` under `parent` (`None` = top level), as last child.
    fn set_parent(&mut self, handle: Self::Handle, parent: Option<Self::Handle>);

    /// Moves `handle` to the end of its siblings.
    fn set_last_sibling(&mut self, handle: Self::Handle);

    /// Assigns the diagnostic name of `handle`.
    fn set_name(&mut self, handle: Self::Handle, name: &str);

    /// Enables or disables `handle`.
    fn set_enabled(&mut self, handle: Self::Handle, enabled: bool);

    /// Destroys `handle` and its subtree.
    fn destroy(&mut self, handle: Self::Handle);
}

/// A host whose nodes can carry a `B` behaviour.
pub trait BehaviourHost<B>: AttachmentHost {
    /// Detaches the `B` behaviour carried by `handle` and hands it over.
    ///
    /// Returns `None` if the node carries no `B`.
    fn take_behaviour(&mut self, handle: Self::Handle) -> Option<B>;
}

/// An item that owns one node of host `H`.
pub trait Attached<H: AttachmentHost> {
    /// The node this item is attached to.
    fn handle(&self) -> H::Handle;
}
