//! Positional correction: moves overlapping bodies apart before any velocity
//! response is computed.

use glam::Vec2;

use crate::{
    collision::{contact::CollisionSet, narrowphase::intersect},
    config::DEFAULT_POSITION_DAMPING,
    core::{registry::BodyRegistry, types::BodyKind},
    utils::{
        allocator::{BodyHandle, CollisionHandle},
        math::is_zero,
    },
};

#[derive(Debug, Clone)]
pub struct PositionalCorrector {
    damping: f32,
    scratch: Vec<CollisionHandle>,
}

impl Default for PositionalCorrector {
    fn default() -> Self {
        Self::new(DEFAULT_POSITION_DAMPING)
    }
}

impl PositionalCorrector {
    pub fn new(damping: f32) -> Self {
        Self {
            damping,
            scratch: Vec::new(),
        }
    }

    pub fn damping(&self) -> f32 {
        self.damping
    }

    /// Corrects every body of `order` once, in order. Returns how many moved.
    pub fn correct(
        &mut self,
        order: &[BodyHandle],
        registry: &mut BodyRegistry,
        collisions: &mut CollisionSet,
    ) -> usize {
        for &handle in order {
            if let Some(body) = registry.get_mut(handle) {
                body.corrected = false;
            }
        }

        let mut moved = 0;
        for &handle in order {
            if self.correct_body(handle, registry, collisions) {
                moved += 1;
            }
        }
        moved
    }

    fn correct_body(
        &mut self,
        handle: BodyHandle,
        registry: &mut BodyRegistry,
        collisions: &mut CollisionSet,
    ) -> bool {
        let Some(body) = registry.get_mut(handle) else {
            return false;
        };
        body.accumulated_translation = Vec2::ZERO;
        self.scratch.clear();
        self.scratch.extend_from_slice(&body.collisions);
        registry.ensure_transform(handle);

        let mut translation = Vec2::ZERO;
        for &collision_handle in &self.scratch {
            let Some(collision) = collisions.get_mut(collision_handle) else {
                continue;
            };
            if collision.is_trigger {
                continue;
            }
            let other = collision.other(handle);
            let other_corrected = registry.get(other).map(|b| b.corrected).unwrap_or(true);
            if !other_corrected {
                registry.ensure_transform(other);
            }

            let Some((body_a, body_b)) = registry
                .get(collision.a)
                .zip(registry.get(collision.b))
            else {
                continue;
            };
            let Some(contact) = intersect(&body_a.instance, &body_b.instance) else {
                continue;
            };
            collision.refresh(contact);
            let mtv = collision.mtv * self.damping;

            let (share_a, share_b) = if body_b.kind == BodyKind::Static {
                (1.0, 0.0)
            } else if body_a.corrected {
                (0.0, 1.0)
            } else if body_b.corrected {
                (1.0, 0.0)
            } else {
                split_ratio(
                    body_a.velocity_at(collision.point).length(),
                    body_b.velocity_at(collision.point).length(),
                )
            };

            if collision.a == handle {
                translation += mtv * share_a;
            } else {
                translation -= mtv * share_b;
            }
        }

        let Some(body) = registry.get_mut(handle) else {
            return false;
        };
        body.accumulated_translation = translation;
        body.corrected = true;
        if translation == Vec2::ZERO {
            return false;
        }
        body.transform.position += translation;
        registry.make_transform_dirty(handle);
        registry.ensure_transform(handle);
        true
    }
}

/// Shares of a separation for two uncorrected bodies moving at `speed_a` and
/// `speed_b` at the contact point. The faster body takes the larger share.
pub fn split_ratio(speed_a: f32, speed_b: f32) -> (f32, f32) {
    match (is_zero(speed_a), is_zero(speed_b)) {
        (true, true) => (0.5, 0.5),
        (true, false) => (0.0, 1.0),
        (false, true) => (1.0, 0.0),
        (false, false) => {
            let total = speed_a + speed_b;
            (speed_a / total, speed_b / total)
        }
    }
}
