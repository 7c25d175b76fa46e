//! Canonical body storage plus lazy world-transform resolution.
//!
//! A body whose transform changed is marked dirty and queued in a pooled
//! queue. Its posed shape and grid cells are recomputed only when something
//! pulls it ([`BodyRegistry::ensure_transform`]) or at the flush point.

use super::{
    rigidbody::{BodyBuilder, RigidBody},
    types::BodyKind,
};
use crate::{
    collision::broadphase::SpatialGrid,
    utils::{
        allocator::{Arena, BodyHandle},
        pool::PooledQueue,
    },
};

#[derive(Debug, Clone)]
pub struct BodyRegistry {
    bodies: Arena<BodyHandle, RigidBody>,
    order: Vec<BodyHandle>,
    by_kind: [Vec<BodyHandle>; 3],
    dirty: PooledQueue<BodyHandle>,
    grid: SpatialGrid,
}

impl BodyRegistry {
    pub fn new(grid: SpatialGrid, dirty_capacity: usize) -> Self {
        Self {
            bodies: Arena::new(),
            order: Vec::new(),
            by_kind: Default::default(),
            dirty: PooledQueue::with_capacity(dirty_capacity),
            grid,
        }
    }

    /// Registers a body; it joins the grid at its first transform resolution.
    pub fn insert(&mut self, builder: BodyBuilder) -> BodyHandle {
        let kind = builder.kind();
        let handle = self.bodies.insert(builder.build(BodyHandle::default()));
        if let Some(stored) = self.bodies.get_mut(handle) {
            stored.handle = handle;
        }
        self.order.push(handle);
        self.by_kind[kind.index()].push(handle);
        self.make_transform_dirty(handle);
        handle
    }

    /// Unregisters a body, returning its queue node and grid cells.
    /// Collisions must already have been detached.
    pub fn remove(&mut self, handle: BodyHandle) -> Option<RigidBody> {
        let body = self.bodies.get_mut(handle)?;
        debug_assert!(body.collisions.is_empty(), "body removed with live collisions");
        if let Some(slot) = body.dirty_slot.take() {
            self.dirty.remove(slot);
        }
        self.grid.remove_body(handle, body.kind, &mut body.grid_range);
        let kind = body.kind;
        Self::unlist(&mut self.order, handle);
        Self::unlist(&mut self.by_kind[kind.index()], handle);
        self.bodies.remove(handle)
    }

    fn unlist(list: &mut Vec<BodyHandle>, handle: BodyHandle) {
        if let Some(index) = list.iter().position(|h| *h == handle) {
            list.remove(index);
        }
    }

    /// Moves a body into another kind list, resetting its grid cache and mass.
    pub fn set_kind(&mut self, handle: BodyHandle, kind: BodyKind) -> bool {
        let Some(body) = self.bodies.get_mut(handle) else {
            return false;
        };
        let old = body.kind;
        if old == kind {
            return true;
        }
        self.grid.remove_body(handle, old, &mut body.grid_range);
        body.kind = kind;
        body.refresh_mass();
        body.static_collision_count = 0;
        Self::unlist(&mut self.by_kind[old.index()], handle);
        self.by_kind[kind.index()].push(handle);
        self.make_transform_dirty(handle);
        true
    }

    /// Queues `handle` for transform resolution. Marking twice is a no-op.
    pub fn make_transform_dirty(&mut self, handle: BodyHandle) {
        if let Some(body) = self.bodies.get_mut(handle) {
            if body.dirty_slot.is_none() {
                body.dirty_slot = Some(self.dirty.push_back(handle));
            }
        }
    }

    /// Resolves the posed shape and grid membership of `handle` if it is dirty.
    /// Returns false for unknown handles.
    pub fn ensure_transform(&mut self, handle: BodyHandle) -> bool {
        let Some(body) = self.bodies.get_mut(handle) else {
            return false;
        };
        if let Some(slot) = body.dirty_slot.take() {
            self.dirty.remove(slot);
            body.pose_shape();
            self.grid
                .update_membership(handle, body.kind, &body.instance.aabb, &mut body.grid_range);
        }
        true
    }

    /// Drains the dirty queue. Returns the number of bodies resolved.
    pub fn flush_dirty(&mut self) -> usize {
        let mut resolved = 0;
        while let Some(handle) = self.dirty.front() {
            if self.ensure_transform(handle) {
                resolved += 1;
            } else {
                self.dirty.pop_front();
            }
        }
        resolved
    }

    pub fn get(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle)
    }

    pub fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle)
    }

    pub fn get2_mut(
        &mut self,
        a: BodyHandle,
        b: BodyHandle,
    ) -> Option<(&mut RigidBody, &mut RigidBody)> {
        self.bodies.get2_mut(a, b)
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.bodies.contains(handle)
    }

    /// All bodies in registration order.
    pub fn handles(&self) -> &[BodyHandle] {
        &self.order
    }

    pub fn of_kind(&self, kind: BodyKind) -> &[BodyHandle] {
        &self.by_kind[kind.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &RigidBody> + '_ {
        self.order.iter().filter_map(|h| self.bodies.get(*h))
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub(crate) fn bodies_and_grid(&mut self) -> (&mut Arena<BodyHandle, RigidBody>, &SpatialGrid) {
        (&mut self.bodies, &self.grid)
    }

    pub(crate) fn arena(&self) -> &Arena<BodyHandle, RigidBody> {
        &self.bodies
    }

    pub fn dirty_len(&self) -> usize {
        self.dirty.len()
    }

    pub fn dirty_pool_capacity(&self) -> usize {
        self.dirty.capacity()
    }

    pub fn clear(&mut self) {
        self.bodies.clear();
        self.order.clear();
        self.by_kind.iter_mut().for_each(Vec::clear);
        self.dirty.clear();
        self.grid.clear();
    }
}
