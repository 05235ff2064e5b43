use std::time::{Duration, Instant};

use glam::{Affine3A, Quat, Vec3};

use crate::errors::Result;
use crate::scene::frame::FrameContext;
use crate::scene::handle::NodeHandle;
use crate::scene::hierarchy::HierarchyStore;
use crate::scene::transform::Transform;
use crate::scene::transform_pool::{TransformComponent, TransformPool};
use crate::settings::HierarchySettings;

/// Scene container.
///
/// Owns a [`HierarchyStore`], the [`TransformPool`] its nodes point into,
/// and the current [`FrameContext`]. Nodes added through the scene get their
/// transform allocated in the pool; removing them releases it.
///
/// Structural edits and [`update`](Self::update) need `&mut self`, which
/// keeps mutation and propagation on one thread.
#[derive(Debug, Default)]
pub struct Scene {
    pub hierarchy: HierarchyStore,
    pub transforms: TransformPool,
    frame: FrameContext,
    last_update: Option<Instant>,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_settings(settings: HierarchySettings) -> Self {
        Self {
            hierarchy: HierarchyStore::with_settings(settings),
            transforms: TransformPool::new(),
            frame: FrameContext::default(),
            last_update: None,
        }
    }

    /// Starts building a node.
    pub fn build_node(&mut self) -> NodeBuilder<'_> {
        NodeBuilder::new(self)
    }

    // ========================================================================
    // Structure
    // ========================================================================

    /// Adds a root node owning `transform`.
    pub fn add_node(&mut self, transform: Transform) -> Result<NodeHandle> {
        self.insert(transform, NodeHandle::INVALID)
    }

    /// Adds a child of `parent` owning `transform`.
    pub fn add_to_parent(&mut self, transform: Transform, parent: NodeHandle) -> Result<NodeHandle> {
        self.insert(transform, parent)
    }

    /// Adds a root node with no transform.
    pub fn add_group(&mut self) -> Result<NodeHandle> {
        self.hierarchy.add_root()
    }

    /// Adds a transform-less child of `parent`.
    pub fn add_group_to_parent(&mut self, parent: NodeHandle) -> Result<NodeHandle> {
        self.hierarchy.add_child(parent)
    }

    fn insert(&mut self, transform: Transform, parent: NodeHandle) -> Result<NodeHandle> {
        let key = self.transforms.insert(transform);
        self.hierarchy
            .add_child_with_transform(parent, key)
            .inspect_err(|_| {
                // Don't leak the transform of a node that was never created.
                self.transforms.remove(key);
            })
    }

    /// Removes a node and destroys its transform. Children move up to the
    /// node's parent.
    pub fn remove_node(&mut self, handle: &mut NodeHandle) -> bool {
        self.hierarchy.remove(handle, &mut self.transforms, true)
    }

    /// Removes a node but leaves its transform in the pool, returning it.
    pub fn detach_node(&mut self, handle: &mut NodeHandle) -> Option<Transform> {
        let key = self.hierarchy.transform(*handle);
        if !self.hierarchy.remove(handle, &mut self.transforms, false) {
            return None;
        }
        key.and_then(|key| self.transforms.remove(key))
    }

    /// Moves `child` under `parent` (`None` makes it a root).
    pub fn attach(&mut self, child: NodeHandle, parent: Option<NodeHandle>) -> Result<()> {
        self.hierarchy.attach(child, parent)?;
        if let Some(t) = self.transform_mut(child) {
            t.mark_dirty();
        }
        Ok(())
    }

    // ========================================================================
    // Component access
    // ========================================================================

    #[must_use]
    pub fn transform(&self, handle: NodeHandle) -> Option<&Transform> {
        let key = self.hierarchy.transform(handle)?;
        self.transforms.get(key)
    }

    pub fn transform_mut(&mut self, handle: NodeHandle) -> Option<&mut Transform> {
        let key = self.hierarchy.transform(handle)?;
        self.transforms.get_mut(key)
    }

    /// World matrix from the last update; identity for group nodes and bad
    /// handles.
    #[must_use]
    pub fn world_matrix(&self, handle: NodeHandle) -> Affine3A {
        self.hierarchy
            .transform(handle)
            .map_or(Affine3A::IDENTITY, |key| self.transforms.world_matrix(key))
    }

    #[must_use]
    pub fn world_position(&self, handle: NodeHandle) -> Vec3 {
        self.hierarchy.world_position(&self.transforms, handle)
    }

    #[must_use]
    pub fn world_rotation(&self, handle: NodeHandle) -> Quat {
        self.hierarchy.world_rotation(&self.transforms, handle)
    }

    #[must_use]
    pub fn world_scale(&self, handle: NodeHandle) -> Vec3 {
        self.hierarchy.world_scale(&self.transforms, handle)
    }

    #[inline]
    #[must_use]
    pub fn frame(&self) -> FrameContext {
        self.frame
    }

    // ========================================================================
    // Frame update
    // ========================================================================

    /// Advances to the next frame and propagates world matrices. Call once
    /// per frame, before rendering.
    ///
    /// The first update reports a zero delta.
    pub fn update(&mut self) {
        let now = Instant::now();
        let delta = self
            .last_update
            .map_or(Duration::ZERO, |last| now.duration_since(last));
        self.last_update = Some(now);
        self.frame = self.frame.next(delta);
        self.hierarchy.update(&mut self.transforms, self.frame);
    }
}

/// Fluent node construction for [`Scene`].
pub struct NodeBuilder<'a> {
    scene: &'a mut Scene,
    transform: Option<Transform>,
    parent: NodeHandle,
}

impl<'a> NodeBuilder<'a> {
    pub fn new(scene: &'a mut Scene) -> Self {
        Self {
            scene,
            transform: Some(Transform::new()),
            parent: NodeHandle::INVALID,
        }
    }

    // === Configuration ===

    #[must_use]
    pub fn with_position(mut self, x: f32, y: f32, z: f32) -> Self {
        self.transform
            .get_or_insert_with(Transform::new)
            .position = Vec3::new(x, y, z);
        self
    }

    #[must_use]
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.transform
            .get_or_insert_with(Transform::new)
            .rotation = rotation;
        self
    }

    #[must_use]
    pub fn with_scale(mut self, s: f32) -> Self {
        self.transform.get_or_insert_with(Transform::new).scale = Vec3::splat(s);
        self
    }

    #[must_use]
    pub fn with_parent(mut self, parent: NodeHandle) -> Self {
        self.parent = parent;
        self
    }

    /// Builds a group node: no transform is allocated.
    #[must_use]
    pub fn without_transform(mut self) -> Self {
        self.transform = None;
        self
    }

    // === Finish ===

    /// Inserts the node into the scene.
    pub fn build(self) -> Result<NodeHandle> {
        match self.transform {
            Some(transform) => self.scene.insert(transform, self.parent),
            None => self.scene.hierarchy.add_child(self.parent),
        }
    }
}
