//! Scene Graph Module
//!
//! Manages the node hierarchy and world-transform propagation:
//! - [`NodeHandle`]: generation-checked reference to a hierarchy slot
//! - [`FrameContext`]: per-frame context passed to updates
//! - [`HierarchyStore`]: flat struct-of-arrays node table
//! - [`ViewTree`]: traversal tree rebuilt every update
//! - [`transform_system`]: parent-before-child world matrix propagation
//! - [`Transform`] / [`TransformPool`]: the transform component
//! - [`Scene`]: convenience container owning a store and its transforms

pub mod frame;
pub mod handle;
pub mod hierarchy;
pub mod query;
pub mod scene;
pub mod transform;
pub mod transform_pool;
pub mod transform_system;
pub mod view_tree;

pub use frame::FrameContext;
pub use handle::NodeHandle;
pub use hierarchy::HierarchyStore;
pub use scene::{NodeBuilder, Scene};
pub use transform::Transform;
pub use transform_pool::{TransformComponent, TransformPool};
pub use view_tree::{ViewNode, ViewTree};

use slotmap::new_key_type;

new_key_type! {
    /// Handle into a [`TransformComponent`]. `TransformKey::null()` marks a
    /// node without a transform.
    pub struct TransformKey;
}
