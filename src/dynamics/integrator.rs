use glam::Vec2;

use crate::{
    core::{registry::BodyRegistry, rigidbody::RigidBody, types::BodyKind},
    utils::math::{is_zero, EPSILON},
};

/// Semi-implicit Euler stepping of dynamic bodies.
#[derive(Debug, Clone)]
pub struct Integrator {
    pub dt: f32,
    pub gravity: Vec2,
}

impl Integrator {
    pub fn new(dt: f32, gravity: Vec2) -> Self {
        Self { dt, gravity }
    }

    /// Advances one body. Returns true when its transform changed.
    pub fn integrate_body(&self, body: &mut RigidBody) -> bool {
        if body.kind != BodyKind::Dynamic {
            return false;
        }
        body.previous_transform = body.transform;

        if body.velocity.linear.length() < EPSILON {
            body.velocity.linear = Vec2::ZERO;
        }
        if is_zero(body.velocity.angular) || body.fixed_rotation {
            body.velocity.angular = 0.0;
        }

        let moved = body.velocity.linear != Vec2::ZERO || body.velocity.angular != 0.0;
        body.transform.position += body.velocity.linear * self.dt;
        body.transform.rotation += body.velocity.angular.to_degrees() * self.dt;

        // Gravity lands after displacement.
        body.velocity.linear += self.gravity * self.dt;
        moved
    }

    /// Advances every dynamic body and queues the moved ones for transform resolution.
    pub fn step(&self, registry: &mut BodyRegistry) -> usize {
        let mut moved = 0;
        for index in 0..registry.of_kind(BodyKind::Dynamic).len() {
            let handle = registry.of_kind(BodyKind::Dynamic)[index];
            let changed = registry
                .get_mut(handle)
                .map(|body| self.integrate_body(body))
                .unwrap_or(false);
            if changed {
                registry.make_transform_dirty(handle);
                moved += 1;
            }
        }
        moved
    }
}
