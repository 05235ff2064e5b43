//! Hierarchy Settings
//!
//! Construction-time configuration for a [`HierarchyStore`](crate::HierarchyStore).
//!
//! ```rust,ignore
//! use scene_hierarchy::{HierarchySettings, HierarchyStore, PropagationPolicy};
//!
//! let store = HierarchyStore::with_settings(HierarchySettings {
//!     initial_capacity: 256,
//!     propagation: PropagationPolicy::PassThrough,
//! });
//! ```

// ---------------------------------------------------------------------------
// PropagationPolicy
// ---------------------------------------------------------------------------

/// Decides what world-matrix propagation does when it reaches a node that
/// has no transform bound (a pure grouping node).
///
/// | Policy                | Group node's children                          |
/// |-----------------------|------------------------------------------------|
/// | `StopAtUntransformed` | not visited, keep last frame's world matrices  |
/// | `PassThrough`         | visited, composed with nearest transformed ancestor |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PropagationPolicy {
    /// A transform-less node ends traversal of its subtree.
    ///
    /// Everything below it keeps whatever world matrix it had before. This
    /// matches the engine's historical behaviour.
    #[default]
    StopAtUntransformed,

    /// A transform-less node contributes no transformation of its own, and
    /// traversal continues into its children.
    PassThrough,
}

impl PropagationPolicy {
    /// Returns `true` when traversal descends below transform-less nodes.
    #[inline]
    #[must_use]
    pub fn descends_through_groups(self) -> bool {
        matches!(self, Self::PassThrough)
    }
}

// ---------------------------------------------------------------------------
// HierarchySettings
// ---------------------------------------------------------------------------

/// Configuration for a hierarchy store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HierarchySettings {
    /// Number of free slots allocated up front. Zero defers all allocation
    /// to the first insert. Growth afterwards doubles the capacity.
    pub initial_capacity: usize,

    /// Behaviour of propagation at transform-less nodes.
    pub propagation: PropagationPolicy,
}
