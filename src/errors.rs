//! Error Types
//!
//! This module defines the error types used by the scene hierarchy.
//!
//! # Overview
//!
//! [`HierarchyError`] covers the failure modes of structural operations:
//! - Rejected node handles (the sentinel handle, or a stale generation)
//! - Slot table growth failures
//! - Reparenting that would create a cycle
//!
//! Queries never surface these errors. They log the failure and return a
//! safe default instead, so a single bad scene-graph entry cannot halt a
//! frame.
//!
//! # Usage
//!
//! ```rust,ignore
//! use scene_hierarchy::{HierarchyStore, Result};
//!
//! fn spawn(store: &mut HierarchyStore) -> Result<()> {
//!     let root = store.add_root()?;
//!     store.add_child(root)?;
//!     Ok(())
//! }
//! ```

use std::collections::TryReserveError;

use thiserror::Error;

/// The error type for structural hierarchy operations.
#[derive(Error, Debug)]
pub enum HierarchyError {
    // ========================================================================
    // Handle Errors
    // ========================================================================
    /// The sentinel handle was passed where a live node was required.
    #[error("Invalid node handle")]
    InvalidHandle,

    /// The handle's generation no longer matches its slot (the node was
    /// removed, and possibly the slot reused).
    #[error("Stale node handle: slot {index}, generation {generation}")]
    StaleHandle {
        /// Slot index carried by the handle
        index: u32,
        /// Generation carried by the handle
        generation: u64,
    },

    // ========================================================================
    // Allocation Errors
    // ========================================================================
    /// Growing the slot table failed.
    #[error("Failed to grow hierarchy storage to {requested} slots")]
    AllocationFailed {
        /// Slot count that was being allocated
        requested: usize,
        /// Underlying allocator failure
        #[source]
        source: TryReserveError,
    },

    /// The slot table cannot grow past the range of a slot index.
    #[error("Hierarchy capacity exceeded (limit: {limit} slots)")]
    CapacityExceeded {
        /// Maximum number of addressable slots
        limit: usize,
    },

    // ========================================================================
    // Structural Errors
    // ========================================================================
    /// Attaching would make a node its own ancestor.
    #[error("Attach would create a cycle in the hierarchy")]
    CycleDetected,
}

/// Alias for `Result<T, HierarchyError>`.
pub type Result<T> = std::result::Result<T, HierarchyError>;
