//! # Slot Ids
//!
//! Handles into slot tables whose slots are reused. Each reuse bumps the
//! slot's generation, so a handle kept past a release no longer matches.

use std::fmt;

/// Generational handle into a slot table.
///
/// Shared by [`crate::ActivationTrackingPool`] tickets and by hosts that
/// reuse node slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SlotId {
    index: u32,
    generation: u32,
}

impl SlotId {
    /// Handle that names no slot.
    pub const NULL: Self = Self {
        index: u32::MAX,
        generation: u32::MAX,
    };

    /// Creates a handle to `index` at `generation`.
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Slot generation.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }

    /// Handle to the same slot after its next reuse.
    #[inline]
    #[must_use]
    pub const fn next_generation(self) -> Self {
        Self::new(self.index, self.generation.wrapping_add(1))
    }

    /// Checks if this is [`SlotId::NULL`].
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.index == u32::MAX && self.generation == u32::MAX
    }
}

impl Default for SlotId {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}
