//! Transform System
//!
//! Per-frame world matrix propagation.
//!
//! [`HierarchyStore::update`] rebuilds the [`ViewTree`] from the flat store
//! and then walks it depth-first from every root. A node's world matrix is
//! its local matrix composed with the world matrix of its nearest ancestor
//! that has a transform:
//!
//! ```text
//! world = ancestor_world * local     (glam, column vectors)
//! ```
//!
//! Nodes are visited in pre-order, so an ancestor's world matrix has always
//! been written before any descendant reads it. The walk uses an explicit
//! stack and has no depth limit.
//!
//! What happens at a node without a transform depends on
//! [`PropagationPolicy`]: by default its subtree is skipped and keeps last
//! frame's matrices; with `PassThrough` the node is transparent.

use glam::Affine3A;

use crate::scene::frame::FrameContext;
use crate::scene::hierarchy::HierarchyStore;
use crate::scene::transform_pool::TransformComponent;
use crate::scene::view_tree::ViewTree;
use crate::settings::PropagationPolicy;

impl HierarchyStore {
    /// Recomputes every reachable node's world matrix for this frame.
    ///
    /// The previous view tree is discarded, a new one is built from the
    /// current parent relation, and only then does propagation start. All
    /// dirty flags are cleared afterwards.
    pub fn update<T: TransformComponent + ?Sized>(&mut self, transforms: &mut T, frame: FrameContext) {
        let mut view = std::mem::take(&mut self.view);
        view.rebuild(self);

        let visited = propagate(&view, transforms, self.settings.propagation);
        log::trace!(
            "Frame {} ({:?}): propagated {visited} of {} nodes from {} roots",
            frame.index(),
            frame.delta(),
            view.len(),
            view.roots().len()
        );

        self.view = view;
        self.clear_dirty_flags();
    }
}

/// Walks `view` from every root, writing world matrices into `transforms`.
///
/// Returns the number of nodes whose world matrix was written.
pub fn propagate<T: TransformComponent + ?Sized>(
    view: &ViewTree,
    transforms: &mut T,
    policy: PropagationPolicy,
) -> usize {
    // Work stack: (view index, world matrix of nearest transformed ancestor)
    let mut stack: Vec<(usize, Option<Affine3A>)> = Vec::with_capacity(64);
    let mut visited = 0;

    for &root in view.roots() {
        stack.push((root, None));

        while let Some((index, ancestor_world)) = stack.pop() {
            let node = &view.nodes()[index];

            let inherited = if node.has_transform() {
                let key = node.transform();

                // 1. Local matrix
                transforms.compute_local_matrix(key);
                let local = transforms.local_matrix(key);

                // 2. World matrix
                let world = match ancestor_world {
                    Some(parent_world) => parent_world * local,
                    None => local,
                };
                transforms.set_world_matrix(key, world);
                visited += 1;

                Some(world)
            } else if policy.descends_through_groups() {
                ancestor_world
            } else {
                continue;
            };

            // 3. Children, reversed so they pop in slot order
            for &child in node.children().iter().rev() {
                stack.push((child, inherited));
            }
        }
    }

    visited
}
