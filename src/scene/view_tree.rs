//! View Tree
//!
//! The hierarchy store only records each node's parent. Propagation needs to
//! walk downward, so every update projects the store into a tree of
//! [`ViewNode`]s with explicit child lists. The projection is valid for the
//! current update only.
//!
//! Building is linear in the slot count: one pass buckets every live slot
//! under its parent slot, then an explicit-stack walk from each root emits
//! the view nodes. All buffers are kept between frames and cleared, not
//! freed, so steady-state updates do not allocate.

use slotmap::Key;
use smallvec::SmallVec;

use crate::scene::TransformKey;
use crate::scene::handle::NodeHandle;
use crate::scene::hierarchy::HierarchyStore;

/// One node of the traversal tree.
#[derive(Debug, Clone)]
pub struct ViewNode {
    pub(crate) node: NodeHandle,
    pub(crate) transform: TransformKey,
    pub(crate) slot: usize,
    pub(crate) parent: Option<usize>,
    pub(crate) children: SmallVec<[usize; 4]>,
}

impl ViewNode {
    fn from_slot(store: &HierarchyStore, slot: usize, parent: Option<usize>) -> Self {
        Self {
            node: store.node_handles[slot],
            transform: store.xform_handles[slot],
            slot,
            parent,
            children: SmallVec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn node(&self) -> NodeHandle {
        self.node
    }

    /// Bound transform; null for group nodes.
    #[inline]
    #[must_use]
    pub fn transform(&self) -> TransformKey {
        self.transform
    }

    #[inline]
    #[must_use]
    pub fn has_transform(&self) -> bool {
        !self.transform.is_null()
    }

    /// Store slot this view node was projected from.
    #[inline]
    #[must_use]
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// View index of the parent; `None` for roots.
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    /// View indices of the children, in store slot order.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[usize] {
        &self.children
    }
}

/// Per-update traversal tree.
#[derive(Debug, Default)]
pub struct ViewTree {
    nodes: Vec<ViewNode>,
    roots: Vec<usize>,
    /// Scratch: child slots bucketed by parent slot.
    slot_children: Vec<SmallVec<[u32; 4]>>,
    /// Scratch: pending view indices during the walk.
    stack: Vec<usize>,
}

impl ViewTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops the current projection, keeping allocations for the next build.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.roots.clear();
        for bucket in &mut self.slot_children {
            bucket.clear();
        }
        self.stack.clear();
    }

    /// Replaces the tree with a fresh projection of `store`.
    pub(crate) fn rebuild(&mut self, store: &HierarchyStore) {
        self.clear();

        let capacity = store.capacity();
        self.slot_children.resize_with(capacity, SmallVec::new);

        // 1. Bucket children under their parent slot
        for slot in 0..capacity {
            if !store.is_live_slot(slot) {
                continue;
            }
            let Some(parent) = store.parent_slot(slot) else {
                continue;
            };
            debug_assert!(
                store.is_live_slot(parent),
                "slot {slot} has free parent slot {parent}"
            );
            if !store.is_live_slot(parent) {
                log::error!("Hierarchy corrupted: slot {slot} has free parent slot {parent}");
                continue;
            }
            self.slot_children[parent].push(slot as u32);
        }

        // 2. Emit every root and its subtree
        for slot in 0..capacity {
            if store.is_live_slot(slot) && store.parent_slot(slot).is_none() {
                let root = self.nodes.len();
                self.nodes.push(ViewNode::from_slot(store, slot, None));
                self.roots.push(root);
                self.emit_subtree(store, root);
            }
        }
    }

    fn emit_subtree(&mut self, store: &HierarchyStore, root: usize) {
        let Self {
            nodes,
            slot_children,
            stack,
            ..
        } = self;

        stack.push(root);
        while let Some(parent_view) = stack.pop() {
            let parent_slot = nodes[parent_view].slot;
            for &child_slot in &slot_children[parent_slot] {
                let child_view = nodes.len();
                nodes.push(ViewNode::from_slot(
                    store,
                    child_slot as usize,
                    Some(parent_view),
                ));
                nodes[parent_view].children.push(child_view);
                stack.push(child_view);
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn nodes(&self) -> &[ViewNode] {
        &self.nodes
    }

    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ViewNode> {
        self.nodes.get(index)
    }

    /// View indices of every root.
    #[inline]
    #[must_use]
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// View index of the node built from `handle`, if it was part of this
    /// projection.
    #[must_use]
    pub fn find(&self, handle: NodeHandle) -> Option<usize> {
        self.nodes.iter().position(|n| n.node == handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projects_forest_with_ordered_children() {
        let mut store = HierarchyStore::new();
        let a = store.add_root().unwrap();
        let b = store.add_root().unwrap();
        let a1 = store.add_child(a).unwrap();
        let a2 = store.add_child(a).unwrap();
        let a1x = store.add_child(a1).unwrap();

        let mut view = ViewTree::new();
        view.rebuild(&store);

        assert_eq!(view.len(), 5);
        assert_eq!(view.roots().len(), 2);

        let root_a = view.find(a).unwrap();
        assert_eq!(view.roots()[0], root_a);
        assert!(view.roots().contains(&view.find(b).unwrap()));

        let kids: Vec<NodeHandle> = view.nodes()[root_a]
            .children()
            .iter()
            .map(|&i| view.nodes()[i].node())
            .collect();
        assert_eq!(kids, vec![a1, a2]);

        let leaf = &view.nodes()[view.find(a1x).unwrap()];
        assert_eq!(leaf.parent(), view.find(a1));
        assert!(leaf.children().is_empty());
        assert!(!leaf.has_transform());
    }

    #[test]
    fn rebuild_replaces_previous_projection() {
        let mut store = HierarchyStore::new();
        let a = store.add_root().unwrap();
        store.add_child(a).unwrap();

        let mut view = ViewTree::new();
        view.rebuild(&store);
        assert_eq!(view.len(), 2);

        store.add_root().unwrap();
        view.rebuild(&store);
        assert_eq!(view.len(), 3);
        assert_eq!(view.roots().len(), 2);

        view.clear();
        assert!(view.is_empty());
        assert!(view.roots().is_empty());
    }
}
