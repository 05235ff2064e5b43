#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

//! Scene hierarchy and transform propagation.
//!
//! A sparse forest of nodes, each optionally bound to a [`Transform`], stored
//! in a flat generation-checked slot table. Once per frame
//! [`HierarchyStore::update`] rebuilds a traversal tree from the table and
//! writes every node's world matrix back into the transform component,
//! strictly parent-before-child.
//!
//! ```rust,ignore
//! use scene_hierarchy::{Scene, Transform};
//! use glam::Vec3;
//!
//! let mut scene = Scene::new();
//! let root = scene.add_node(Transform::from_translation(Vec3::new(10.0, 0.0, 0.0)))?;
//! let child = scene.add_to_parent(Transform::from_translation(Vec3::Y * 5.0), root)?;
//! scene.update();
//! assert_eq!(scene.world_position(child), Vec3::new(10.0, 5.0, 0.0));
//! ```

pub mod errors;
pub mod scene;
pub mod settings;

pub use errors::{HierarchyError, Result};
pub use scene::{
    FrameContext, HierarchyStore, NodeBuilder, NodeHandle, Scene, Transform, TransformComponent,
    TransformKey, TransformPool, ViewNode, ViewTree,
};
pub use settings::{HierarchySettings, PropagationPolicy};
