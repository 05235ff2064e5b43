//! Hierarchy Store
//!
//! The flat node table. Every field lives in its own array, all indexed by
//! slot, so the per-frame passes walk contiguous memory:
//!
//! | Array            | Free slot value          |
//! |------------------|--------------------------|
//! | `node_handles`   | [`NodeHandle::INVALID`]  |
//! | `parent_indices` | `SENTINEL_INDEX`         |
//! | `levels`         | `SENTINEL_LEVEL`         |
//! | `dirty_flags`    | `false`                  |
//! | `xform_handles`  | `TransformKey::null()`   |
//!
//! A slot is live iff its `node_handles` entry is valid. The table never
//! shrinks; when no free slot is left its capacity doubles.

use slotmap::Key;

use crate::errors::{HierarchyError, Result};
use crate::scene::TransformKey;
use crate::scene::handle::NodeHandle;
use crate::scene::transform_pool::TransformComponent;
use crate::scene::view_tree::ViewTree;
use crate::settings::HierarchySettings;

/// Parent index of a root or free slot.
pub(crate) const SENTINEL_INDEX: u32 = NodeHandle::SENTINEL_INDEX;
/// Level of a free slot.
pub(crate) const SENTINEL_LEVEL: u8 = u8::MAX;
/// Deepest level recorded; deeper nodes saturate here.
pub(crate) const MAX_LEVEL: u8 = SENTINEL_LEVEL - 1;
/// Slot count limit: slot indices must stay below the sentinel.
const MAX_SLOTS: usize = SENTINEL_INDEX as usize;

/// Flat, generation-checked scene hierarchy.
///
/// Nodes are added as roots or under a parent, optionally bound to a
/// transform in some [`TransformComponent`]. [`update`](Self::update)
/// rebuilds the traversal tree and propagates world matrices; see
/// [`transform_system`](crate::scene::transform_system).
#[derive(Debug)]
pub struct HierarchyStore {
    pub(crate) node_handles: Vec<NodeHandle>,
    pub(crate) parent_indices: Vec<u32>,
    pub(crate) levels: Vec<u8>,
    pub(crate) dirty_flags: Vec<bool>,
    pub(crate) xform_handles: Vec<TransformKey>,

    next_generation: u64,
    live_count: usize,

    pub(crate) view: ViewTree,
    pub(crate) settings: HierarchySettings,
}

impl Default for HierarchyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HierarchyStore {
    /// Creates an empty store with no slots allocated.
    #[must_use]
    pub fn new() -> Self {
        Self {
            node_handles: Vec::new(),
            parent_indices: Vec::new(),
            levels: Vec::new(),
            dirty_flags: Vec::new(),
            xform_handles: Vec::new(),
            next_generation: 1,
            live_count: 0,
            view: ViewTree::new(),
            settings: HierarchySettings::default(),
        }
    }

    /// Creates a store configured by `settings`, pre-allocating
    /// `settings.initial_capacity` free slots.
    ///
    /// An initial capacity that cannot be allocated is logged and ignored;
    /// the store then grows on demand.
    #[must_use]
    pub fn with_settings(settings: HierarchySettings) -> Self {
        let mut store = Self::new();
        store.settings = settings;
        let capacity = settings.initial_capacity.min(MAX_SLOTS);
        if capacity > 0
            && let Err(err) = store.resize_slots(capacity)
        {
            log::error!("Hierarchy pre-allocation skipped: {err}");
        }
        store
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &HierarchySettings {
        &self.settings
    }

    // ========================================================================
    // Handle resolution
    // ========================================================================

    /// Maps a handle to its slot, rejecting sentinel and stale handles.
    pub(crate) fn resolve(&self, handle: NodeHandle) -> Result<usize> {
        if !handle.is_valid() {
            return Err(HierarchyError::InvalidHandle);
        }
        let slot = handle.slot();
        match self.node_handles.get(slot) {
            Some(current) if *current == handle => Ok(slot),
            _ => Err(HierarchyError::StaleHandle {
                index: handle.index,
                generation: handle.generation,
            }),
        }
    }

    /// [`resolve`](Self::resolve) for accessors: failures are logged, not returned.
    pub(crate) fn slot_of(&self, handle: NodeHandle, op: &str) -> Option<usize> {
        match self.resolve(handle) {
            Ok(slot) => Some(slot),
            Err(err) => {
                log::error!("{op}: {err}");
                None
            }
        }
    }

    #[inline]
    pub(crate) fn is_live_slot(&self, slot: usize) -> bool {
        self.node_handles
            .get(slot)
            .is_some_and(|handle| handle.is_valid())
    }

    #[inline]
    pub(crate) fn parent_slot(&self, slot: usize) -> Option<usize> {
        match self.parent_indices[slot] {
            SENTINEL_INDEX => None,
            parent => Some(parent as usize),
        }
    }

    // ========================================================================
    // Insertion
    // ========================================================================

    /// Adds a root node with no transform.
    pub fn add_root(&mut self) -> Result<NodeHandle> {
        self.insert(NodeHandle::INVALID, TransformKey::null())
    }

    /// Adds a root node bound to `xform`.
    pub fn add_root_with_transform(&mut self, xform: TransformKey) -> Result<NodeHandle> {
        self.insert(NodeHandle::INVALID, xform)
    }

    /// Adds a transform-less node under `parent`.
    ///
    /// [`NodeHandle::INVALID`] as parent adds a root. A stale parent is an error.
    pub fn add_child(&mut self, parent: NodeHandle) -> Result<NodeHandle> {
        self.insert(parent, TransformKey::null())
    }

    /// Adds a node under `parent` bound to `xform`.
    pub fn add_child_with_transform(
        &mut self,
        parent: NodeHandle,
        xform: TransformKey,
    ) -> Result<NodeHandle> {
        self.insert(parent, xform)
    }

    fn insert(&mut self, parent: NodeHandle, xform: TransformKey) -> Result<NodeHandle> {
        let parent_slot = if parent.is_valid() {
            Some(self.resolve(parent)?)
        } else {
            None
        };

        let slot = self.acquire_slot()?;

        let generation = self.next_generation;
        self.next_generation += 1;
        let handle = NodeHandle::new(slot as u32, generation);

        self.node_handles[slot] = handle;
        self.levels[slot] = self.child_level(parent_slot);
        self.parent_indices[slot] = parent_slot.map_or(SENTINEL_INDEX, |p| p as u32);
        self.dirty_flags[slot] = false;
        self.xform_handles[slot] = xform;
        self.live_count += 1;

        Ok(handle)
    }

    /// Finds a free slot, growing the table when none is left.
    fn acquire_slot(&mut self) -> Result<usize> {
        if let Some(slot) = self.node_handles.iter().position(|h| !h.is_valid()) {
            return Ok(slot);
        }

        let old_capacity = self.capacity();
        if old_capacity >= MAX_SLOTS {
            return Err(HierarchyError::CapacityExceeded { limit: MAX_SLOTS });
        }
        let new_capacity = (old_capacity * 2).clamp(1, MAX_SLOTS);
        self.resize_slots(new_capacity)?;
        log::debug!("Hierarchy grew from {old_capacity} to {new_capacity} slots");

        // First slot of the freshly grown region.
        Ok(old_capacity)
    }

    /// Grows every array to `new_capacity`, filling the new tail with free
    /// slots. All reservations happen before any array is resized, so a
    /// failed allocation leaves the table untouched.
    fn resize_slots(&mut self, new_capacity: usize) -> Result<()> {
        let additional = new_capacity.saturating_sub(self.capacity());
        let alloc_err = |source| HierarchyError::AllocationFailed {
            requested: new_capacity,
            source,
        };

        self.node_handles.try_reserve_exact(additional).map_err(alloc_err)?;
        self.parent_indices.try_reserve_exact(additional).map_err(alloc_err)?;
        self.levels.try_reserve_exact(additional).map_err(alloc_err)?;
        self.dirty_flags.try_reserve_exact(additional).map_err(alloc_err)?;
        self.xform_handles.try_reserve_exact(additional).map_err(alloc_err)?;

        self.node_handles.resize(new_capacity, NodeHandle::INVALID);
        self.parent_indices.resize(new_capacity, SENTINEL_INDEX);
        self.levels.resize(new_capacity, SENTINEL_LEVEL);
        self.dirty_flags.resize(new_capacity, false);
        self.xform_handles.resize(new_capacity, TransformKey::null());
        Ok(())
    }

    fn child_level(&self, parent_slot: Option<usize>) -> u8 {
        parent_slot.map_or(0, |p| self.levels[p].saturating_add(1).min(MAX_LEVEL))
    }

    // ========================================================================
    // Removal
    // ========================================================================

    /// Removes a node.
    ///
    /// Its direct children are handed to its own parent (or become roots),
    /// with levels recomputed for their whole subtrees. With
    /// `release_transform` the bound transform is destroyed in `transforms`;
    /// otherwise it is only unbound. On success `handle` is overwritten with
    /// [`NodeHandle::INVALID`].
    ///
    /// Returns `false` (and logs) for an invalid or stale handle.
    pub fn remove<T: TransformComponent + ?Sized>(
        &mut self,
        handle: &mut NodeHandle,
        transforms: &mut T,
        release_transform: bool,
    ) -> bool {
        let Some(slot) = self.slot_of(*handle, "remove") else {
            return false;
        };

        // 1. Hand the children to this node's parent
        let new_parent = self.parent_indices[slot];
        let orphans: Vec<usize> = self.child_slots(slot).collect();
        for &child in &orphans {
            self.parent_indices[child] = new_parent;
        }
        for &child in &orphans {
            self.relevel_subtree(child);
        }

        // 2. Clear the slot
        self.parent_indices[slot] = SENTINEL_INDEX;
        self.levels[slot] = SENTINEL_LEVEL;
        self.dirty_flags[slot] = false;

        // 3. Transform
        let xform = std::mem::replace(&mut self.xform_handles[slot], TransformKey::null());
        if release_transform && !xform.is_null() {
            transforms.destroy(xform);
        }

        // 4. Invalidate every copy of the handle
        self.node_handles[slot] = NodeHandle::INVALID;
        self.live_count -= 1;
        log::debug!(
            "Removed {:?}, re-parented {} children",
            *handle,
            orphans.len()
        );
        *handle = NodeHandle::INVALID;

        true
    }

    /// Slots whose parent is `slot`, in ascending order.
    fn child_slots(&self, slot: usize) -> impl Iterator<Item = usize> + '_ {
        let target = slot as u32;
        self.parent_indices
            .iter()
            .enumerate()
            .filter(move |&(i, &p)| p == target && self.node_handles[i].is_valid())
            .map(|(i, _)| i)
    }

    /// Recomputes `levels` for `root` (from its current parent) and every
    /// descendant, top-down.
    fn relevel_subtree(&mut self, root: usize) {
        let mut stack = vec![(root, self.child_level(self.parent_slot(root)))];
        while let Some((slot, level)) = stack.pop() {
            self.levels[slot] = level;
            let child_level = level.saturating_add(1).min(MAX_LEVEL);
            stack.extend(self.child_slots(slot).map(|child| (child, child_level)));
        }
    }

    // ========================================================================
    // Restructuring
    // ========================================================================

    /// Moves `child` under `parent`, or makes it a root with `None`.
    ///
    /// The moved subtree's levels are recomputed. Attaching a node to itself
    /// or to one of its descendants is rejected.
    pub fn attach(&mut self, child: NodeHandle, parent: Option<NodeHandle>) -> Result<()> {
        let child_slot = self.resolve(child)?;
        let parent_slot = parent.map(|p| self.resolve(p)).transpose()?;

        if let Some(parent_slot) = parent_slot {
            if parent_slot == child_slot {
                log::warn!("Cannot attach {child:?} to itself");
                return Err(HierarchyError::CycleDetected);
            }
            let mut cursor = self.parent_slot(parent_slot);
            while let Some(ancestor) = cursor {
                if ancestor == child_slot {
                    return Err(HierarchyError::CycleDetected);
                }
                cursor = self.parent_slot(ancestor);
            }
        }

        self.parent_indices[child_slot] = parent_slot.map_or(SENTINEL_INDEX, |p| p as u32);
        self.relevel_subtree(child_slot);
        self.dirty_flags[child_slot] = true;
        Ok(())
    }

    /// Binds `xform` to a node, replacing any previous binding (which is not
    /// destroyed). A null key unbinds.
    pub fn set_transform(&mut self, handle: NodeHandle, xform: TransformKey) -> bool {
        let Some(slot) = self.slot_of(handle, "set_transform") else {
            return false;
        };
        if xform.is_null() {
            log::warn!("{handle:?} bound to a null transform; it becomes a group node");
        }
        self.xform_handles[slot] = xform;
        self.dirty_flags[slot] = true;
        true
    }

    /// Flags a node as changed. Propagation still recomputes every node; the
    /// flag is bookkeeping for callers and is cleared by [`update`](Self::update).
    pub fn mark_dirty(&mut self, handle: NodeHandle) -> bool {
        let Some(slot) = self.slot_of(handle, "mark_dirty") else {
            return false;
        };
        self.dirty_flags[slot] = true;
        true
    }

    pub(crate) fn clear_dirty_flags(&mut self) {
        self.dirty_flags.fill(false);
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Whether `handle` refers to a live node. Never logs.
    #[must_use]
    pub fn is_alive(&self, handle: NodeHandle) -> bool {
        self.resolve(handle).is_ok()
    }

    /// Number of live nodes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.live_count
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live_count == 0
    }

    /// Number of allocated slots, live or free.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.node_handles.len()
    }

    #[must_use]
    pub fn parent(&self, handle: NodeHandle) -> Option<NodeHandle> {
        let slot = self.slot_of(handle, "parent")?;
        self.parent_slot(slot).map(|p| self.node_handles[p])
    }

    /// Depth below the nearest root (roots are level 0).
    #[must_use]
    pub fn level(&self, handle: NodeHandle) -> Option<u8> {
        let slot = self.slot_of(handle, "level")?;
        Some(self.levels[slot])
    }

    #[must_use]
    pub fn is_dirty(&self, handle: NodeHandle) -> bool {
        self.slot_of(handle, "is_dirty")
            .is_some_and(|slot| self.dirty_flags[slot])
    }

    /// Transform bound to the node; `None` for group nodes and bad handles.
    #[must_use]
    pub fn transform(&self, handle: NodeHandle) -> Option<TransformKey> {
        let slot = self.slot_of(handle, "transform")?;
        let xform = self.xform_handles[slot];
        (!xform.is_null()).then_some(xform)
    }

    /// Direct children of a node, in slot order.
    #[must_use]
    pub fn children(&self, handle: NodeHandle) -> Vec<NodeHandle> {
        self.slot_of(handle, "children")
            .map(|slot| {
                self.child_slots(slot)
                    .map(|child| self.node_handles[child])
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Live node handles, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = NodeHandle> + '_ {
        self.node_handles.iter().copied().filter(|h| h.is_valid())
    }

    /// Live root handles, in slot order.
    pub fn roots(&self) -> impl Iterator<Item = NodeHandle> + '_ {
        self.node_handles
            .iter()
            .zip(&self.parent_indices)
            .filter(|(h, p)| h.is_valid() && **p == SENTINEL_INDEX)
            .map(|(h, _)| *h)
    }

    /// Traversal tree built by the most recent [`update`](Self::update).
    #[inline]
    #[must_use]
    pub fn view(&self) -> &ViewTree {
        &self.view
    }
}
