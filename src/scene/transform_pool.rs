//! Transform Component Storage
//!
//! The hierarchy never owns transform data. It holds [`TransformKey`]s and
//! talks to whatever stores the transforms through [`TransformComponent`].
//! [`TransformPool`] is the engine's default implementation, backed by a
//! `SlotMap` so stale keys are detected the same way stale node handles are.

use glam::{Affine3A, Quat, Vec3};
use slotmap::{Key, SlotMap};

use crate::scene::TransformKey;
use crate::scene::transform::Transform;

/// Operations the hierarchy needs from a transform store.
///
/// Implementations must tolerate null or stale keys: log, and fall back to
/// identity values (or do nothing, for the mutating calls).
pub trait TransformComponent {
    /// Recomputes the cached local matrix from the stored TRS fields.
    ///
    /// Called for every transformed node on every update, so it must be
    /// idempotent and cheap when nothing changed.
    fn compute_local_matrix(&mut self, key: TransformKey);

    fn local_matrix(&self, key: TransformKey) -> Affine3A;

    fn set_world_matrix(&mut self, key: TransformKey, world: Affine3A);

    fn world_matrix(&self, key: TransformKey) -> Affine3A;

    fn local_rotation(&self, key: TransformKey) -> Quat;

    fn local_scale(&self, key: TransformKey) -> Vec3;

    /// Releases the transform's storage.
    fn destroy(&mut self, key: TransformKey);
}

/// SlotMap-backed transform storage.
#[derive(Debug, Default, Clone)]
pub struct TransformPool {
    transforms: SlotMap<TransformKey, Transform>,
}

impl TransformPool {
    #[must_use]
    pub fn new() -> Self {
        Self {
            transforms: SlotMap::with_key(),
        }
    }

    pub fn insert(&mut self, transform: Transform) -> TransformKey {
        self.transforms.insert(transform)
    }

    /// Removes and returns a transform without going through the hierarchy.
    pub fn remove(&mut self, key: TransformKey) -> Option<Transform> {
        self.transforms.remove(key)
    }

    #[must_use]
    pub fn get(&self, key: TransformKey) -> Option<&Transform> {
        self.transforms.get(key)
    }

    pub fn get_mut(&mut self, key: TransformKey) -> Option<&mut Transform> {
        self.transforms.get_mut(key)
    }

    #[must_use]
    pub fn contains(&self, key: TransformKey) -> bool {
        self.transforms.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    fn lookup(&self, key: TransformKey, op: &str) -> Option<&Transform> {
        let found = self.transforms.get(key);
        if found.is_none() {
            report_missing(key, op);
        }
        found
    }

    fn lookup_mut(&mut self, key: TransformKey, op: &str) -> Option<&mut Transform> {
        let found = self.transforms.get_mut(key);
        if found.is_none() {
            report_missing(key, op);
        }
        found
    }
}

fn report_missing(key: TransformKey, op: &str) {
    if key.is_null() {
        log::error!("{op}: null transform key");
    } else {
        log::error!("{op}: stale transform key {key:?}");
    }
}

impl TransformComponent for TransformPool {
    fn compute_local_matrix(&mut self, key: TransformKey) {
        if let Some(t) = self.lookup_mut(key, "compute_local_matrix") {
            t.update_local_matrix();
        }
    }

    fn local_matrix(&self, key: TransformKey) -> Affine3A {
        self.lookup(key, "local_matrix")
            .map_or(Affine3A::IDENTITY, |t| *t.local_matrix())
    }

    fn set_world_matrix(&mut self, key: TransformKey, world: Affine3A) {
        if let Some(t) = self.lookup_mut(key, "set_world_matrix") {
            t.set_world_matrix(world);
        }
    }

    fn world_matrix(&self, key: TransformKey) -> Affine3A {
        self.lookup(key, "world_matrix")
            .map_or(Affine3A::IDENTITY, |t| *t.world_matrix())
    }

    fn local_rotation(&self, key: TransformKey) -> Quat {
        self.lookup(key, "local_rotation")
            .map_or(Quat::IDENTITY, |t| t.rotation)
    }

    fn local_scale(&self, key: TransformKey) -> Vec3 {
        self.lookup(key, "local_scale").map_or(Vec3::ONE, |t| t.scale)
    }

    fn destroy(&mut self, key: TransformKey) {
        if self.transforms.remove(key).is_none() {
            report_missing(key, "destroy");
        }
    }
}
