//! # Activation-Tracking Pool
//!
//! A two-set pool (available vs. activated) that validates the provenance of
//! every returned item. Items are addressed by generational [`Ticket`]s, so a
//! foreign, double-pushed or stale ticket is always rejected.

use crate::error::{PoolError, PoolResult};
use crate::slot_id::SlotId;

/// Identifier of one activation of a pooled item.
pub type Ticket = SlotId;

/// One storage slot.
#[derive(Debug)]
struct Slot<T> {
    /// The pooled value, kept across activations.
    value: T,
    /// Bumped every time the slot leaves the activated set.
    generation: u32,
    /// Membership in the activated set.
    activated: bool,
}

/// Pool that tracks which of its items are currently handed out.
///
/// Invariant: every slot is either in the available set or activated, never
/// both.
///
/// # Example
///
/// ```rust,ignore
/// let mut pool: ActivationTrackingPool<Path> = ActivationTrackingPool::new();
///
/// let ticket = pool.pop();
/// pool.get_mut(ticket).unwrap().clear();
///
/// pool.push(ticket)?;                 // Ok
/// assert!(pool.push(ticket).is_err()); // Double push rejected
/// ```
pub struct ActivationTrackingPool<T> {
    /// All slots ever created.
    slots: Vec<Slot<T>>,
    /// Indices of slots in the available set.
    available: Vec<u32>,
    /// Number of activated slots.
    activated_count: usize,
    /// Builds new values when the available set is empty.
    factory: Box<dyn FnMut() -> T>,
}

impl<T> std::fmt::Debug for ActivationTrackingPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivationTrackingPool")
            .field("slots", &self.slots.len())
            .field("available", &self.available.len())
            .field("activated", &self.activated_count)
            .finish()
    }
}

impl<T: Default + 'static> Default for ActivationTrackingPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Default + 'static> ActivationTrackingPool<T> {
    /// Creates a pool that builds values with `Default`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_factory(T::default)
    }
}

impl<T> ActivationTrackingPool<T> {
    /// Creates a pool that builds values with `factory`.
    #[must_use]
    pub fn with_factory(factory: impl FnMut() -> T + 'static) -> Self {
        Self {
            slots: Vec::new(),
            available: Vec::new(),
            activated_count: 0,
            factory: Box::new(factory),
        }
    }

    /// Returns the number of activated items.
    #[inline]
    #[must_use]
    pub const fn activated_count(&self) -> usize {
        self.activated_count
    }

    /// Returns the number of items waiting in the available set.
    #[inline]
    #[must_use]
    pub fn available_count(&self) -> usize {
        self.available.len()
    }

    /// Activates an item and returns its ticket.
    ///
    /// Reuses an available item if there is one; otherwise the newly built
    /// item is the one placed in the activated set and returned.
    #[allow(clippy::cast_possible_truncation)]
    pub fn pop(&mut self) -> Ticket {
        if let Some(index) = self.available.pop() {
            let slot = &mut self.slots[index as usize];
            slot.activated = true;
            self.activated_count += 1;
            return Ticket::new(index, slot.generation);
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            value: (self.factory)(),
            generation: 0,
            activated: true,
        });
        self.activated_count += 1;
        Ticket::new(index, 0)
    }

    /// Returns an activated item to the available set.
    ///
    /// The ticket is stale afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Identity`] if the ticket does not name a currently
    /// activated item. Both sets are left unchanged in that case.
    pub fn push(&mut self, ticket: Ticket) -> PoolResult<()> {
        let index = ticket.index();
        match self.slots.get_mut(index as usize) {
            Some(slot) if slot.activated && slot.generation == ticket.generation() => {
                slot.activated = false;
                slot.generation = slot.generation.wrapping_add(1);
                self.available.push(index);
                self.activated_count -= 1;
                Ok(())
            }
            _ => Err(PoolError::Identity {
                index,
                generation: ticket.generation(),
            }),
        }
    }

    /// Checks if a ticket names a currently activated item.
    #[inline]
    #[must_use]
    pub fn is_activated(&self, ticket: Ticket) -> bool {
        self.slots
            .get(ticket.index() as usize)
            .is_some_and(|slot| slot.activated && slot.generation == ticket.generation())
    }

    /// Gets an activated item.
    #[must_use]
    pub fn get(&self, ticket: Ticket) -> Option<&T> {
        if !self.is_activated(ticket) {
            return None;
        }
        Some(&self.slots[ticket.index() as usize].value)
    }

    /// Gets an activated item mutably.
    pub fn get_mut(&mut self, ticket: Ticket) -> Option<&mut T> {
        if !self.is_activated(ticket) {
            return None;
        }
        Some(&mut self.slots[ticket.index() as usize].value)
    }

    /// Iterates over activated items with their tickets.
    #[allow(clippy::cast_possible_truncation)]
    pub fn iter_activated(&self) -> impl Iterator<Item = (Ticket, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.activated)
            .map(|(index, slot)| (Ticket::new(index as u32, slot.generation), &slot.value))
    }

    /// Moves every activated item into the available set.
    ///
    /// All outstanding tickets become stale.
    #[allow(clippy::cast_possible_truncation)]
    pub fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.activated {
                slot.activated = false;
                slot.generation = slot.generation.wrapping_add(1);
                self.available.push(index as u32);
            }
        }
        self.activated_count = 0;
    }

    /// Clears the pool and releases both sets.
    pub fn dispose(mut self) {
        self.clear();
        tracing::debug!(
            "Activation-tracking pool disposed ({} items)",
            self.slots.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_returns_the_activated_instance() {
        let mut next = 0;
        let mut pool = ActivationTrackingPool::with_factory(move || {
            next += 1;
            next
        });

        let ticket = pool.pop();
        assert!(pool.is_activated(ticket));
        assert_eq!(pool.get(ticket), Some(&1));
        assert_eq!(pool.activated_count(), 1);

        // Exactly one construction per new activation
        let second = pool.pop();
        assert_eq!(pool.get(second), Some(&2));
    }

    #[test]
    fn test_push_then_reuse() {
        let mut pool: ActivationTrackingPool<Vec<u8>> = ActivationTrackingPool::new();

        let ticket = pool.pop();
        pool.get_mut(ticket).unwrap().push(9);
        pool.push(ticket).unwrap();
        assert_eq!(pool.available_count(), 1);
        assert_eq!(pool.activated_count(), 0);

        let reused = pool.pop();
        assert_eq!(reused.index(), ticket.index()); // Same slot reused
        assert_ne!(reused, ticket);
        assert_eq!(pool.get(reused), Some(&vec![9]));
        assert_eq!(pool.get(ticket), None); // Stale
    }

    #[test]
    fn test_double_push_is_identity_error() {
        let mut pool: ActivationTrackingPool<u32> = ActivationTrackingPool::new();
        let ticket = pool.pop();
        pool.push(ticket).unwrap();

        let err = pool.push(ticket).unwrap_err();
        assert_eq!(
            err,
            PoolError::Identity {
                index: ticket.index(),
                generation: ticket.generation(),
            }
        );
        assert_eq!(pool.available_count(), 1);
        assert_eq!(pool.activated_count(), 0);
    }

    #[test]
    fn test_foreign_ticket_is_rejected() {
        let mut pool: ActivationTrackingPool<u32> = ActivationTrackingPool::new();
        let _ = pool.pop();

        assert!(pool.push(Ticket::new(7, 0)).is_err());
        assert!(pool.push(Ticket::NULL).is_err());
        assert_eq!(pool.activated_count(), 1);
        assert_eq!(pool.available_count(), 0);
    }

    #[test]
    fn test_clear_moves_activated_to_available() {
        let mut pool: ActivationTrackingPool<u32> = ActivationTrackingPool::new();
        let a = pool.pop();
        let b = pool.pop();
        let c = pool.pop();
        pool.push(b).unwrap();

        pool.clear();
        assert_eq!(pool.activated_count(), 0);
        assert_eq!(pool.available_count(), 3);
        assert!(!pool.is_activated(a));
        assert!(pool.push(c).is_err());
        assert_eq!(pool.iter_activated().count(), 0);

        pool.dispose();
    }

    #[test]
    fn test_iter_activated_yields_live_tickets() {
        let mut pool: ActivationTrackingPool<u32> = ActivationTrackingPool::new();
        let a = pool.pop();
        let b = pool.pop();
        pool.push(a).unwrap();

        let live: Vec<Ticket> = pool.iter_activated().map(|(ticket, _)| ticket).collect();
        assert_eq!(live, vec![b]);
    }
}
