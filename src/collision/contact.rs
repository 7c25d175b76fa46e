use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::narrowphase::Contact;
use crate::utils::allocator::{Arena, BodyHandle, CollisionHandle};

/// Live contact between two bodies.
///
/// `a` is always the dynamic participant that found the contact. `normal` is
/// `mtv` normalized; moving `a` by `mtv` separates the pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Collision {
    pub a: BodyHandle,
    pub b: BodyHandle,
    pub normal: Vec2,
    pub mtv: Vec2,
    pub point: Vec2,
    /// Set when `b` is a trigger; such collisions carry no resolution data.
    pub is_trigger: bool,
    pub(crate) found: bool,
    pub(crate) newly_found: bool,
}

impl Collision {
    pub(crate) fn new(a: BodyHandle, b: BodyHandle, is_trigger: bool, contact: Contact) -> Self {
        let mut collision = Self {
            a,
            b,
            normal: Vec2::ZERO,
            mtv: Vec2::ZERO,
            point: Vec2::ZERO,
            is_trigger,
            found: true,
            newly_found: true,
        };
        collision.refresh(contact);
        collision
    }

    /// Overwrites geometric data with a fresh test result oriented from `b` to `a`.
    pub(crate) fn refresh(&mut self, contact: Contact) {
        if self.is_trigger {
            return;
        }
        self.mtv = contact.mtv;
        self.normal = contact.normal();
        self.point = contact.point;
    }

    pub fn involves(&self, body: BodyHandle) -> bool {
        self.a == body || self.b == body
    }

    /// The participant that is not `body`.
    pub fn other(&self, body: BodyHandle) -> BodyHandle {
        if self.a == body {
            self.b
        } else {
            self.a
        }
    }

    pub fn is_newly_found(&self) -> bool {
        self.newly_found
    }
}

/// Arena of live collisions plus their creation order.
#[derive(Debug, Clone, Default)]
pub struct CollisionSet {
    arena: Arena<CollisionHandle, Collision>,
    order: Vec<CollisionHandle>,
}

impl CollisionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, collision: Collision) -> CollisionHandle {
        let handle = self.arena.insert(collision);
        self.order.push(handle);
        handle
    }

    /// Removes every collision matching `predicate`, keeping creation order.
    pub(crate) fn drain_where<F>(&mut self, mut predicate: F) -> Vec<(CollisionHandle, Collision)>
    where
        F: FnMut(&Collision) -> bool,
    {
        let mut drained = Vec::new();
        let arena = &mut self.arena;
        self.order.retain(|handle| {
            let matches = arena.get(*handle).map(&mut predicate).unwrap_or(true);
            if matches {
                if let Some(collision) = arena.remove(*handle) {
                    drained.push((*handle, collision));
                }
            }
            !matches
        });
        drained
    }

    pub fn get(&self, handle: CollisionHandle) -> Option<&Collision> {
        self.arena.get(handle)
    }

    pub(crate) fn get_mut(&mut self, handle: CollisionHandle) -> Option<&mut Collision> {
        self.arena.get_mut(handle)
    }

    /// Handles in creation order.
    pub fn handles(&self) -> &[CollisionHandle] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = (CollisionHandle, &Collision)> + '_ {
        self.order
            .iter()
            .filter_map(|handle| self.arena.get(*handle).map(|c| (*handle, c)))
    }

    pub(crate) fn mark_all_not_found(&mut self) {
        for collision in self.arena.values_mut() {
            collision.found = false;
            collision.newly_found = false;
        }
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.arena.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::allocator::GenerationalId;

    fn body(index: usize) -> BodyHandle {
        BodyHandle(GenerationalId::new(index, 0))
    }

    fn contact() -> Contact {
        Contact {
            mtv: Vec2::new(0.0, -2.0),
            point: Vec2::new(1.0, 1.0),
        }
    }

    #[test]
    fn trigger_collision_keeps_zero_geometry() {
        let collision = Collision::new(body(0), body(1), true, contact());
        assert_eq!(collision.mtv, Vec2::ZERO);
        assert!(collision.is_newly_found());
        assert_eq!(collision.other(body(1)), body(0));
    }

    #[test]
    fn drain_where_preserves_order_of_survivors() {
        let mut set = CollisionSet::new();
        let first = set.insert(Collision::new(body(0), body(1), false, contact()));
        let second = set.insert(Collision::new(body(0), body(2), false, contact()));
        let third = set.insert(Collision::new(body(3), body(1), false, contact()));

        let drained = set.drain_where(|c| c.b == body(2));
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].0, second);
        assert_eq!(set.handles(), &[first, third]);
        assert!(set.get(second).is_none());
        assert_eq!(set.get(first).map(|c| c.normal), Some(Vec2::new(0.0, -1.0)));
    }
}
