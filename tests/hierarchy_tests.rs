//! HierarchyStore tests
//!
//! Tests for:
//! - Handle validity before and after removal
//! - Generation growth on slot reuse
//! - Child re-parenting and level repair on removal
//! - Doubling growth without data loss
//! - Transform binding and release
//! - attach / reparenting

use scene_hierarchy::scene::TransformKey;
use scene_hierarchy::{HierarchyError, HierarchyStore, NodeHandle, Transform, TransformPool};
use slotmap::Key;

// ============================================================================
// Helper
// ============================================================================

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn store_and_pool() -> (HierarchyStore, TransformPool) {
    init_logger();
    (HierarchyStore::new(), TransformPool::new())
}

// ============================================================================
// Handle lifecycle
// ============================================================================

#[test]
fn handle_round_trip() -> anyhow::Result<()> {
    let (mut store, mut pool) = store_and_pool();
    let key = pool.insert(Transform::new());
    let root = store.add_root()?;
    let mut node = store.add_child_with_transform(root, key)?;
    let copy = node;

    assert!(store.is_alive(node));
    assert_eq!(store.parent(node), Some(root));
    assert_eq!(store.level(node), Some(1));
    assert_eq!(store.transform(node), Some(key));
    assert_eq!(store.len(), 2);

    assert!(store.remove(&mut node, &mut pool, false));
    assert_eq!(node, NodeHandle::INVALID, "caller's handle is invalidated");

    // The copy taken before removal is stale everywhere.
    assert!(!store.is_alive(copy));
    assert_eq!(store.parent(copy), None);
    assert_eq!(store.level(copy), None);
    assert_eq!(store.transform(copy), None);
    assert!(store.children(copy).is_empty());
    assert!(!store.mark_dirty(copy));
    assert!(!store.set_transform(copy, key));
    assert_eq!(store.len(), 1);

    let mut again = copy;
    assert!(!store.remove(&mut again, &mut pool, true));
    assert_eq!(again, copy, "failed removal leaves the handle untouched");
    Ok(())
}

#[test]
fn stale_handle_rejected_after_slot_reuse() -> anyhow::Result<()> {
    let (mut store, mut pool) = store_and_pool();
    let mut first = store.add_root()?;
    let stale = first;
    store.remove(&mut first, &mut pool, false);

    let second = store.add_root()?;
    assert_eq!(second.index(), stale.index());
    assert!(store.is_alive(second));
    assert!(!store.is_alive(stale));
    assert!(matches!(
        store.add_child(stale),
        Err(HierarchyError::StaleHandle { .. })
    ));
    Ok(())
}

#[test]
fn generation_strictly_increases_on_reuse() -> anyhow::Result<()> {
    let (mut store, mut pool) = store_and_pool();

    let mut previous = 0;
    for _ in 0..8 {
        let mut node = store.add_root()?;
        assert_eq!(node.index(), 0);
        assert!(node.generation() > previous);
        previous = node.generation();
        assert!(store.remove(&mut node, &mut pool, false));
    }
    assert_eq!(store.capacity(), 1);
    Ok(())
}

#[test]
fn invalid_handle_is_a_logged_no_op() {
    let (mut store, mut pool) = store_and_pool();
    let mut invalid = NodeHandle::INVALID;

    assert!(!store.remove(&mut invalid, &mut pool, true));
    assert!(!store.is_alive(invalid));
    assert_eq!(store.parent(invalid), None);
    assert!(!store.is_dirty(invalid));
    assert!(matches!(
        store.attach(invalid, None),
        Err(HierarchyError::InvalidHandle)
    ));
}

// ============================================================================
// Removal
// ============================================================================

#[test]
fn removing_middle_node_reparents_grandchild() -> anyhow::Result<()> {
    let (mut store, mut pool) = store_and_pool();
    let a = store.add_root()?;
    let mut b = store.add_child(a)?;
    let c = store.add_child(b)?;
    assert_eq!(store.level(c), Some(2));

    assert!(store.remove(&mut b, &mut pool, false));

    assert_eq!(store.parent(c), Some(a));
    assert_eq!(store.level(c), Some(1));
    assert_eq!(store.children(a), vec![c]);
    Ok(())
}

#[test]
fn removing_root_promotes_children() -> anyhow::Result<()> {
    let (mut store, mut pool) = store_and_pool();
    let mut a = store.add_root()?;
    let b = store.add_child(a)?;
    let b1 = store.add_child(b)?;

    assert!(store.remove(&mut a, &mut pool, false));

    assert_eq!(store.parent(b), None);
    assert_eq!(store.level(b), Some(0));
    assert_eq!(store.level(b1), Some(1));
    assert_eq!(store.roots().collect::<Vec<_>>(), vec![b]);
    Ok(())
}

#[test]
fn removal_fixes_levels_of_whole_subtree() -> anyhow::Result<()> {
    let (mut store, mut pool) = store_and_pool();
    let a = store.add_root()?;
    let mut b = store.add_child(a)?;
    let c = store.add_child(b)?;
    let d = store.add_child(c)?;
    let e = store.add_child(d)?;
    let sibling = store.add_child(b)?;

    store.remove(&mut b, &mut pool, false);

    assert_eq!(store.level(c), Some(1));
    assert_eq!(store.level(d), Some(2));
    assert_eq!(store.level(e), Some(3));
    assert_eq!(store.level(sibling), Some(1));
    assert_eq!(store.children(a), vec![c, sibling]);
    Ok(())
}

#[test]
fn release_transform_controls_destruction() -> anyhow::Result<()> {
    let (mut store, mut pool) = store_and_pool();
    let kept_key = pool.insert(Transform::new());
    let released_key = pool.insert(Transform::new());
    let mut kept = store.add_root_with_transform(kept_key)?;
    let mut released = store.add_root_with_transform(released_key)?;

    store.remove(&mut kept, &mut pool, false);
    store.remove(&mut released, &mut pool, true);

    assert!(pool.contains(kept_key));
    assert!(!pool.contains(released_key));
    Ok(())
}

// ============================================================================
// Growth
// ============================================================================

#[test]
fn growth_preserves_existing_nodes() -> anyhow::Result<()> {
    let (mut store, mut pool) = store_and_pool();
    let k = 8;

    // (handle, parent, level, transform)
    let mut expected: Vec<(NodeHandle, Option<NodeHandle>, u8, Option<TransformKey>)> = Vec::new();
    for i in 0..(2 * k + 1) {
        let key = (i % 3 != 0).then(|| pool.insert(Transform::new()));
        let parent = (i % 4 != 0).then(|| expected[i - 1].0);
        let level = parent.map_or(0, |_| expected[i - 1].2 + 1);
        let handle = store.add_child_with_transform(
            parent.unwrap_or(NodeHandle::INVALID),
            key.unwrap_or_else(TransformKey::null),
        )?;
        expected.push((handle, parent, level, key));
    }

    assert_eq!(store.capacity(), 32);
    assert_eq!(store.len(), 2 * k + 1);
    for (handle, parent, level, key) in expected {
        assert!(store.is_alive(handle));
        assert_eq!(store.parent(handle), parent);
        assert_eq!(store.level(handle), Some(level));
        assert_eq!(store.transform(handle), key);
    }
    Ok(())
}

// ============================================================================
// Restructuring
// ============================================================================

#[test]
fn invalid_parent_adds_root() -> anyhow::Result<()> {
    let (mut store, _) = store_and_pool();
    let node = store.add_child(NodeHandle::INVALID)?;
    assert_eq!(store.parent(node), None);
    assert_eq!(store.level(node), Some(0));
    Ok(())
}

#[test]
fn attach_moves_subtree_and_relevels() -> anyhow::Result<()> {
    let (mut store, _) = store_and_pool();
    let a = store.add_root()?;
    let b = store.add_root()?;
    let b1 = store.add_child(b)?;
    let b2 = store.add_child(b1)?;

    store.attach(b, Some(a))?;
    assert_eq!(store.parent(b), Some(a));
    assert_eq!(store.level(b), Some(1));
    assert_eq!(store.level(b2), Some(3));
    assert!(store.is_dirty(b));

    store.attach(b1, None)?;
    assert_eq!(store.parent(b1), None);
    assert_eq!(store.level(b2), Some(1));
    assert_eq!(store.roots().count(), 2);
    Ok(())
}

#[test]
fn set_transform_binds_and_unbinds() -> anyhow::Result<()> {
    let (mut store, mut pool) = store_and_pool();
    let node = store.add_root()?;
    assert_eq!(store.transform(node), None);

    let key = pool.insert(Transform::new());
    assert!(store.set_transform(node, key));
    assert_eq!(store.transform(node), Some(key));

    assert!(store.set_transform(node, TransformKey::null()));
    assert_eq!(store.transform(node), None);
    assert!(pool.contains(key), "unbinding does not destroy");
    Ok(())
}
