use std::collections::HashSet;

use glam::Vec2;

use super::{
    collider::Shape,
    types::{BodyKind, MassProperties, Material, Transform2D, Velocity},
};
use crate::{
    collision::{broadphase::CellRange, shapes::ShapeInstance},
    utils::{
        allocator::{BodyHandle, CollisionHandle},
        math::{cross, point_velocity},
    },
};

/// A physical participant: shape, kinematic state and per-step bookkeeping.
///
/// Structural state (kind, shape, layer, transform) changes through
/// [`crate::PhysicsWorld`] so grid membership and collisions stay consistent.
#[derive(Debug, Clone)]
pub struct RigidBody {
    pub(crate) handle: BodyHandle,
    pub(crate) kind: BodyKind,
    pub(crate) transform: Transform2D,
    pub(crate) previous_transform: Transform2D,
    pub velocity: Velocity,
    pub(crate) mass: MassProperties,
    pub(crate) material: Material,
    pub(crate) shape: Shape,
    pub(crate) instance: ShapeInstance,
    pub fixed_rotation: bool,
    pub(crate) layer: u8,
    /// Opaque value for the owning game object.
    pub user_data: u64,

    pub(crate) collisions: Vec<CollisionHandle>,
    pub(crate) static_collision_count: usize,
    pub(crate) grid_range: Option<CellRange>,
    /// Neighbours already paired with this body during the current detection pass,
    /// one set per neighbour kind.
    pub(crate) collected: [HashSet<BodyHandle>; 3],
    pub(crate) dirty_slot: Option<usize>,
    pub(crate) scheduled: bool,
    pub(crate) corrected: bool,
    pub(crate) accumulated_translation: Vec2,
}

impl RigidBody {
    pub fn handle(&self) -> BodyHandle {
        self.handle
    }

    pub fn kind(&self) -> BodyKind {
        self.kind
    }

    pub fn is_dynamic(&self) -> bool {
        self.kind == BodyKind::Dynamic
    }

    pub fn transform(&self) -> &Transform2D {
        &self.transform
    }

    pub fn position(&self) -> Vec2 {
        self.transform.position
    }

    /// Rotation in degrees.
    pub fn rotation(&self) -> f32 {
        self.transform.rotation
    }

    pub fn previous_transform(&self) -> &Transform2D {
        &self.previous_transform
    }

    /// Blend between the transform before and after the last step.
    pub fn interpolated_transform(&self, alpha: f32) -> Transform2D {
        self.previous_transform.lerp(&self.transform, alpha.clamp(0.0, 1.0))
    }

    pub fn mass_properties(&self) -> &MassProperties {
        &self.mass
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// World-space shape as of the last transform resolution.
    pub fn shape_instance(&self) -> &ShapeInstance {
        &self.instance
    }

    pub fn layer(&self) -> u8 {
        self.layer
    }

    /// Live collisions this body takes part in.
    pub fn collisions(&self) -> &[CollisionHandle] {
        &self.collisions
    }

    pub fn static_collision_count(&self) -> usize {
        self.static_collision_count
    }

    /// Cells the body occupied at its last grid update.
    pub fn grid_range(&self) -> Option<CellRange> {
        self.grid_range
    }

    pub fn is_transform_dirty(&self) -> bool {
        self.dirty_slot.is_some()
    }

    /// Velocity of the world point `point` treated as attached to this body.
    pub fn velocity_at(&self, point: Vec2) -> Vec2 {
        point_velocity(
            self.velocity.linear,
            self.velocity.angular,
            point - self.transform.position,
        )
    }

    pub(crate) fn effective_inverse_inertia(&self) -> f32 {
        if self.fixed_rotation {
            0.0
        } else {
            self.mass.inverse_inertia
        }
    }

    /// Applies `impulse` at offset `r` from the body center.
    pub fn apply_impulse(&mut self, impulse: Vec2, r: Vec2) {
        self.velocity.linear += impulse * self.mass.inverse_mass;
        if !self.fixed_rotation {
            self.velocity.angular += self.mass.inverse_inertia * cross(r, impulse);
        }
    }

    /// Derives mass from shape area and material density; zero for non-dynamic kinds.
    pub(crate) fn refresh_mass(&mut self) {
        if self.kind != BodyKind::Dynamic {
            self.mass = MassProperties::ZERO;
            return;
        }
        let area = self.shape.area();
        debug_assert!(area > 0.0, "mass requested for a zero-area shape");
        let mass = area * self.material.density;
        self.mass = MassProperties::new(mass, self.shape.inertia(mass));
    }

    pub(crate) fn pose_shape(&mut self) {
        self.instance = ShapeInstance::prepare(&self.shape, &self.transform);
    }

    pub(crate) fn clear_collected(&mut self) {
        self.collected.iter_mut().for_each(HashSet::clear);
    }
}

/// Builder describing a body before it is added to a world.
#[derive(Debug, Clone)]
pub struct BodyBuilder {
    kind: BodyKind,
    shape: Shape,
    transform: Transform2D,
    velocity: Velocity,
    material: Material,
    layer: u8,
    fixed_rotation: bool,
    user_data: u64,
}

impl BodyBuilder {
    pub fn new(kind: BodyKind, shape: Shape) -> Self {
        Self {
            kind,
            shape,
            transform: Transform2D::default(),
            velocity: Velocity::default(),
            material: Material::default(),
            layer: 0,
            fixed_rotation: false,
            user_data: 0,
        }
    }

    pub fn dynamic(shape: Shape) -> Self {
        Self::new(BodyKind::Dynamic, shape)
    }

    pub fn fixed(shape: Shape) -> Self {
        Self::new(BodyKind::Static, shape)
    }

    pub fn trigger(shape: Shape) -> Self {
        Self::new(BodyKind::Trigger, shape)
    }

    pub fn position(mut self, position: Vec2) -> Self {
        self.transform.position = position;
        self
    }

    /// Rotation in degrees.
    pub fn rotation(mut self, degrees: f32) -> Self {
        self.transform.rotation = degrees;
        self
    }

    pub fn velocity(mut self, linear: Vec2) -> Self {
        self.velocity.linear = linear;
        self
    }

    pub fn angular_velocity(mut self, angular: f32) -> Self {
        self.velocity.angular = angular;
        self
    }

    pub fn material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn density(mut self, density: f32) -> Self {
        self.material.density = density;
        self
    }

    pub fn restitution(mut self, restitution: f32) -> Self {
        self.material.restitution = restitution;
        self
    }

    pub fn layer(mut self, layer: u8) -> Self {
        self.layer = layer;
        self
    }

    pub fn fixed_rotation(mut self, fixed_rotation: bool) -> Self {
        self.fixed_rotation = fixed_rotation;
        self
    }

    pub fn user_data(mut self, user_data: u64) -> Self {
        self.user_data = user_data;
        self
    }

    pub fn kind(&self) -> BodyKind {
        self.kind
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn layer_value(&self) -> u8 {
        self.layer
    }

    pub fn material_value(&self) -> &Material {
        &self.material
    }

    pub(crate) fn build(self, handle: BodyHandle) -> RigidBody {
        let instance = ShapeInstance::prepare(&self.shape, &self.transform);
        let mut body = RigidBody {
            handle,
            kind: self.kind,
            transform: self.transform,
            previous_transform: self.transform,
            velocity: self.velocity,
            mass: MassProperties::ZERO,
            material: self.material,
            shape: self.shape,
            instance,
            fixed_rotation: self.fixed_rotation,
            layer: self.layer,
            user_data: self.user_data,
            collisions: Vec::new(),
            static_collision_count: 0,
            grid_range: None,
            collected: Default::default(),
            dirty_slot: None,
            scheduled: false,
            corrected: false,
            accumulated_translation: Vec2::ZERO,
        };
        body.refresh_mass();
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn dynamic_circle_mass_follows_density() {
        let body = BodyBuilder::dynamic(Shape::circle(10.0))
            .density(2.0)
            .build(BodyHandle::default());
        let expected = std::f32::consts::PI * 100.0 * 2.0;
        assert_relative_eq!(body.mass.mass, expected, epsilon = 1e-2);
        assert_relative_eq!(body.mass.inverse_mass, 1.0 / expected, epsilon = 1e-7);
        assert_relative_eq!(body.mass.inertia, 0.5 * expected * 100.0, epsilon = 1.0);
    }

    #[test]
    fn non_dynamic_bodies_have_exact_zero_mass() {
        for builder in [
            BodyBuilder::fixed(Shape::cuboid(Vec2::splat(5.0))),
            BodyBuilder::trigger(Shape::circle(3.0)),
        ] {
            let body = builder.build(BodyHandle::default());
            assert_eq!(body.mass, MassProperties::ZERO);
        }
    }

    #[test]
    fn fixed_rotation_ignores_angular_part_of_impulse() {
        let mut body = BodyBuilder::dynamic(Shape::circle(1.0))
            .fixed_rotation(true)
            .build(BodyHandle::default());
        body.apply_impulse(Vec2::new(0.0, 1.0), Vec2::new(1.0, 0.0));
        assert_eq!(body.velocity.angular, 0.0);
        assert!(body.velocity.linear.y > 0.0);
        assert_eq!(body.effective_inverse_inertia(), 0.0);
    }

    #[test]
    fn point_velocity_includes_spin() {
        let body = BodyBuilder::dynamic(Shape::circle(1.0))
            .velocity(Vec2::new(1.0, 0.0))
            .angular_velocity(2.0)
            .build(BodyHandle::default());
        let v = body.velocity_at(Vec2::new(0.0, 1.0));
        assert_relative_eq!(v.x, -1.0, epsilon = 1e-6);
        assert_relative_eq!(v.y, 0.0, epsilon = 1e-6);
    }
}
