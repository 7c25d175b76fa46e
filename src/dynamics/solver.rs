use std::fmt::Debug;

use glam::Vec2;

use crate::{
    collision::contact::{Collision, CollisionSet},
    config::{DEFAULT_DYNAMIC_FRICTION, DEFAULT_STATIC_FRICTION},
    core::{registry::BodyRegistry, rigidbody::RigidBody, types::BodyKind},
    utils::math::{cross, is_zero, EPSILON},
};

/// Impulse magnitudes applied to one contact.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct AppliedImpulse {
    pub normal: f32,
    pub tangent: f32,
}

#[derive(Debug, Default, Clone)]
pub struct ImpulseStepMetrics {
    pub contacts_resolved: usize,
    pub contacts_separating: usize,
    pub normal_impulse_sum: f32,
    pub tangent_impulse_sum: f32,
}

impl ImpulseStepMetrics {
    pub fn record(&mut self, applied: Option<AppliedImpulse>) {
        match applied {
            Some(impulse) => {
                self.contacts_resolved += 1;
                self.normal_impulse_sum += impulse.normal.abs();
                self.tangent_impulse_sum += impulse.tangent.abs();
            }
            None => self.contacts_separating += 1,
        }
    }
}

/// Velocity response for one solid collision.
///
/// `a` is the dynamic participant; `b` may be static. Implementations must
/// leave a static `b` untouched.
pub trait ImpulseLaw: Send + Sync + Debug {
    fn resolve(&self, a: &mut RigidBody, b: &mut RigidBody, collision: &Collision) -> Option<AppliedImpulse>;
}

/// Restitution impulse along the contact normal plus Coulomb friction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoulombImpulse {
    pub static_friction: f32,
    pub dynamic_friction: f32,
}

impl Default for CoulombImpulse {
    fn default() -> Self {
        Self::new(DEFAULT_STATIC_FRICTION, DEFAULT_DYNAMIC_FRICTION)
    }
}

impl CoulombImpulse {
    pub fn new(static_friction: f32, dynamic_friction: f32) -> Self {
        Self {
            static_friction,
            dynamic_friction,
        }
    }
}

fn effective_mass_denominator(a: &RigidBody, b: &RigidBody, ra: Vec2, rb: Vec2, axis: Vec2) -> f32 {
    let ra_n = cross(ra, axis);
    let rb_n = cross(rb, axis);
    a.mass.inverse_mass
        + b.mass.inverse_mass
        + ra_n * ra_n * a.effective_inverse_inertia()
        + rb_n * rb_n * b.effective_inverse_inertia()
}

impl ImpulseLaw for CoulombImpulse {
    fn resolve(&self, a: &mut RigidBody, b: &mut RigidBody, collision: &Collision) -> Option<AppliedImpulse> {
        let b_static = b.kind == BodyKind::Static;
        // From a towards b.
        let normal = -collision.normal;
        let ra = collision.point - a.transform.position;
        let rb = collision.point - b.transform.position;

        let relative = b.velocity_at(collision.point) - a.velocity_at(collision.point);
        let normal_speed = relative.dot(normal);
        if normal_speed > -EPSILON {
            return None;
        }

        let denominator = effective_mass_denominator(a, b, ra, rb, normal);
        if denominator <= 0.0 {
            return None;
        }
        let restitution = a.material.combined_restitution(&b.material, b_static);
        let j = -(1.0 + restitution) * normal_speed / denominator;

        let impulse = normal * j;
        a.apply_impulse(-impulse, ra);
        if !b_static {
            b.apply_impulse(impulse, rb);
        }

        let relative = b.velocity_at(collision.point) - a.velocity_at(collision.point);
        let tangent = relative - normal * relative.dot(normal);
        if is_zero(tangent.length()) {
            return Some(AppliedImpulse { normal: j, tangent: 0.0 });
        }
        let tangent = tangent.normalize();

        let denominator_t = effective_mass_denominator(a, b, ra, rb, tangent);
        if denominator_t <= 0.0 {
            return Some(AppliedImpulse { normal: j, tangent: 0.0 });
        }
        let jt = -relative.dot(tangent) / denominator_t;
        let jt = if jt.abs() <= j * self.static_friction {
            jt
        } else {
            -j * self.dynamic_friction
        };

        let friction = tangent * jt;
        a.apply_impulse(-friction, ra);
        if !b_static {
            b.apply_impulse(friction, rb);
        }

        Some(AppliedImpulse { normal: j, tangent: jt })
    }
}

/// Runs an [`ImpulseLaw`] over every solid collision in creation order.
#[derive(Debug)]
pub struct ImpulseResolver {
    law: Box<dyn ImpulseLaw>,
    metrics: ImpulseStepMetrics,
}

impl Default for ImpulseResolver {
    fn default() -> Self {
        Self::new(Box::new(CoulombImpulse::default()))
    }
}

impl ImpulseResolver {
    pub fn new(law: Box<dyn ImpulseLaw>) -> Self {
        Self {
            law,
            metrics: ImpulseStepMetrics::default(),
        }
    }

    pub fn set_law(&mut self, law: Box<dyn ImpulseLaw>) {
        self.law = law;
    }

    pub fn law(&self) -> &dyn ImpulseLaw {
        self.law.as_ref()
    }

    pub fn metrics(&self) -> &ImpulseStepMetrics {
        &self.metrics
    }

    pub fn resolve_all(&mut self, registry: &mut BodyRegistry, collisions: &CollisionSet) -> &ImpulseStepMetrics {
        self.metrics = ImpulseStepMetrics::default();
        for (_, collision) in collisions.iter() {
            if collision.is_trigger {
                continue;
            }
            let Some((a, b)) = registry.get2_mut(collision.a, collision.b) else {
                continue;
            };
            let applied = self.law.resolve(a, b, collision);
            self.metrics.record(applied);
        }
        &self.metrics
    }
}
