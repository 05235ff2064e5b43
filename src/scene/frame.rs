use std::time::Duration;

/// Context handed to [`HierarchyStore::update`](crate::HierarchyStore::update)
/// once per frame.
///
/// Propagation does not depend on it. The index and delta are carried so
/// trace output can be correlated with the caller's frame loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameContext {
    index: u64,
    delta: Duration,
}

impl FrameContext {
    #[must_use]
    pub const fn new(index: u64, delta: Duration) -> Self {
        Self { index, delta }
    }

    /// The context for the frame after this one, `delta` later.
    #[must_use]
    pub const fn next(self, delta: Duration) -> Self {
        Self {
            index: self.index.wrapping_add(1),
            delta,
        }
    }

    #[inline]
    #[must_use]
    pub const fn index(&self) -> u64 {
        self.index
    }

    #[inline]
    #[must_use]
    pub const fn delta(&self) -> Duration {
        self.delta
    }
}
