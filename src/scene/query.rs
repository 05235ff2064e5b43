//! World-space queries.
//!
//! Position comes straight from the world matrix written by the last
//! update. Rotation and scale are recomposed from the local components up
//! the parent chain instead: pulling them back out of a matrix is lossy
//! once non-uniform scale introduces shear.
//!
//! Nodes without a transform contribute nothing to either composition.

use glam::{Quat, Vec3};
use slotmap::Key;
use smallvec::SmallVec;

use crate::scene::TransformKey;
use crate::scene::handle::NodeHandle;
use crate::scene::hierarchy::HierarchyStore;
use crate::scene::transform_pool::TransformComponent;

impl HierarchyStore {
    /// Translation of the node's world matrix as of the last update.
    ///
    /// The origin for bad handles (logged) and for nodes without a transform.
    #[must_use]
    pub fn world_position<T: TransformComponent + ?Sized>(
        &self,
        transforms: &T,
        handle: NodeHandle,
    ) -> Vec3 {
        let Some(slot) = self.slot_of(handle, "world_position") else {
            return Vec3::ZERO;
        };
        let xform = self.xform_handles[slot];
        if xform.is_null() {
            log::debug!("world_position: {handle:?} has no transform");
            return Vec3::ZERO;
        }
        transforms.world_matrix(xform).translation.into()
    }

    /// Composition of the local rotations from the root down to the node,
    /// `q_root * ... * q_node`.
    ///
    /// Identity for bad handles (logged).
    #[must_use]
    pub fn world_rotation<T: TransformComponent + ?Sized>(
        &self,
        transforms: &T,
        handle: NodeHandle,
    ) -> Quat {
        let Some(slot) = self.slot_of(handle, "world_rotation") else {
            return Quat::IDENTITY;
        };

        // Node first, root last.
        let stack: SmallVec<[Quat; 16]> = self
            .transformed_ancestry(slot)
            .map(|key| transforms.local_rotation(key))
            .collect();

        stack
            .iter()
            .rev()
            .fold(Quat::IDENTITY, |world, &local| world * local)
    }

    /// Component-wise product of the local scales from the node up to the
    /// root.
    ///
    /// `(1, 1, 1)` for bad handles (logged).
    #[must_use]
    pub fn world_scale<T: TransformComponent + ?Sized>(
        &self,
        transforms: &T,
        handle: NodeHandle,
    ) -> Vec3 {
        let Some(slot) = self.slot_of(handle, "world_scale") else {
            return Vec3::ONE;
        };

        let stack: SmallVec<[Vec3; 16]> = self
            .transformed_ancestry(slot)
            .map(|key| transforms.local_scale(key))
            .collect();

        stack
            .iter()
            .rev()
            .fold(Vec3::ONE, |world, &local| world * local)
    }

    /// Transform keys from `slot` up to its root, skipping group nodes.
    fn transformed_ancestry(&self, slot: usize) -> impl Iterator<Item = TransformKey> + '_ {
        std::iter::successors(Some(slot), |&s| self.parent_slot(s))
            .map(|s| self.xform_handles[s])
            .filter(|key| !key.is_null())
    }
}
