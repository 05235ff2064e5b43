use std::fmt;

/// Generational reference to a slot in a [`HierarchyStore`](super::HierarchyStore).
///
/// A handle is only honoured while its generation matches the generation
/// currently stored in its slot. Once the node is removed every copy of the
/// handle is rejected, even after the slot has been handed to a new node.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle {
    pub(crate) index: u32,
    pub(crate) generation: u64,
}

impl NodeHandle {
    /// Reserved slot index carried by [`NodeHandle::INVALID`].
    pub const SENTINEL_INDEX: u32 = u32::MAX;

    /// The handle that refers to nothing.
    pub const INVALID: Self = Self {
        index: Self::SENTINEL_INDEX,
        generation: 0,
    };

    #[inline]
    pub(crate) const fn new(index: u32, generation: u64) -> Self {
        Self { index, generation }
    }

    /// Returns `false` for the sentinel handle.
    ///
    /// A valid handle may still be stale; only the store can tell.
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.index != Self::SENTINEL_INDEX
    }

    /// Slot index this handle points at.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Generation of the slot at the time the handle was issued.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u64 {
        self.generation
    }

    #[inline]
    pub(crate) const fn slot(self) -> usize {
        self.index as usize
    }
}

impl Default for NodeHandle {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "NodeHandle({}v{})", self.index, self.generation)
        } else {
            f.write_str("NodeHandle(INVALID)")
        }
    }
}
