//! # Creation Strategies
//!
//! How a brand-new item is built once the pool has duplicated its template.
//! Strategies only run when the free list is empty; reuse never calls them.
//!
//! | Strategy | Item |
//! |---|---|
//! | [`Direct`] | the attachment handle itself |
//! | [`BehaviourLookup`] | a behaviour carried by the duplicated node |
//! | [`Parameterized`] | whatever a caller-supplied factory builds |

use std::any::type_name;
use std::marker::PhantomData;

use crate::attach::{Attached, AttachmentHost, BehaviourHost};
use crate::error::{PoolError, PoolResult};

/// Builds items for a [`crate::KeyedResourcePool`] attached to host `H`.
pub trait CreationStrategy<H: AttachmentHost> {
    /// The pooled item.
    type Item;

    /// Builds an item for the freshly duplicated node `handle`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Construction`] if no item can be built. The pool
    /// destroys `handle` in that case.
    fn create(&mut self, host: &mut H, handle: H::Handle) -> PoolResult<Self::Item>;

    /// Returns the node `item` is attached to.
    fn handle_of(&self, item: &Self::Item) -> H::Handle;
}

/// The item is the attachment handle.
#[derive(Clone, Copy, Debug, Default)]
pub struct Direct;

impl<H: AttachmentHost> CreationStrategy<H> for Direct {
    type Item = H::Handle;

    #[inline]
    fn create(&mut self, _host: &mut H, handle: H::Handle) -> PoolResult<H::Handle> {
        Ok(handle)
    }

    #[inline]
    fn handle_of(&self, item: &H::Handle) -> H::Handle {
        *item
    }
}

/// The item is the `B` behaviour found on the duplicated node.
#[derive(Debug)]
pub struct BehaviourLookup<B> {
    _behaviour: PhantomData<fn() -> B>,
}

impl<B> BehaviourLookup<B> {
    /// Creates the strategy.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _behaviour: PhantomData,
        }
    }
}

impl<B> Default for BehaviourLookup<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> Clone for BehaviourLookup<B> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<H, B> CreationStrategy<H> for BehaviourLookup<B>
where
    H: BehaviourHost<B>,
    B: Attached<H>,
{
    type Item = B;

    fn create(&mut self, host: &mut H, handle: H::Handle) -> PoolResult<B> {
        host.take_behaviour(handle).ok_or_else(|| {
            PoolError::Construction(format!(
                "node {handle:?} carries no {} behaviour",
                type_name::<B>()
            ))
        })
    }

    #[inline]
    fn handle_of(&self, item: &B) -> H::Handle {
        item.handle()
    }
}

/// The item is built by a factory supplied at pool construction.
///
/// The factory receives the host and the duplicated node; any extra
/// construction arguments are captured by the closure. It runs once per new
/// instance.
pub struct Parameterized<Y, F> {
    factory: F,
    _item: PhantomData<fn() -> Y>,
}

impl<Y, F> std::fmt::Debug for Parameterized<Y, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parameterized")
            .field("item", &type_name::<Y>())
            .finish_non_exhaustive()
    }
}

impl<Y, F> Parameterized<Y, F> {
    /// Wraps `factory`.
    #[must_use]
    pub const fn new(factory: F) -> Self {
        Self {
            factory,
            _item: PhantomData,
        }
    }
}

impl<H, Y, F> CreationStrategy<H> for Parameterized<Y, F>
where
    H: AttachmentHost,
    Y: Attached<H>,
    F: FnMut(&mut H, H::Handle) -> PoolResult<Y>,
{
    type Item = Y;

    fn create(&mut self, host: &mut H, handle: H::Handle) -> PoolResult<Y> {
        (self.factory)(host, handle)
    }

    #[inline]
    fn handle_of(&self, item: &Y) -> H::Handle {
        item.handle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_host::{MockHost, Probe};

    #[test]
    fn test_direct_returns_the_handle() {
        let mut host = MockHost::new();
        let node = host.add_node("template", None);
        let mut strategy = Direct;

        let item = CreationStrategy::<MockHost>::create(&mut strategy, &mut host, node).unwrap();
        assert_eq!(item, node);
        assert_eq!(CreationStrategy::<MockHost>::handle_of(&strategy, &item), node);
    }

    #[test]
    fn test_behaviour_lookup_takes_the_behaviour() {
        let mut host = MockHost::new();
        let with = host.add_node("with", None);
        let without = host.add_node("without", None);
        host.attach_probe(with);

        let mut strategy: BehaviourLookup<Probe> = BehaviourLookup::new();
        let probe = strategy.create(&mut host, with).unwrap();
        assert_eq!(CreationStrategy::<MockHost>::handle_of(&strategy, &probe), with);

        let err = strategy.create(&mut host, without).unwrap_err();
        assert!(matches!(err, PoolError::Construction(_)));
    }

    #[test]
    fn test_parameterized_passes_captured_arguments() {
        let mut host = MockHost::new();
        let node = host.add_node("node", None);
        let label = String::from("spark");

        let mut strategy: Parameterized<Probe, _> =
            Parameterized::new(move |_: &mut MockHost, handle: u32| -> PoolResult<Probe> {
                let mut probe = Probe::new(handle);
                probe.label.clone_from(&label);
                Ok(probe)
            });

        let probe = strategy.create(&mut host, node).unwrap();
        assert_eq!(probe.label, "spark");
        assert_eq!(CreationStrategy::<MockHost>::handle_of(&strategy, &probe), node);
    }
}
