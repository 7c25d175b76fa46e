use glam::{Affine2, Vec2};
use serde::{Deserialize, Serialize};

/// World position and rotation of a body. Rotation is stored in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform2D {
    pub position: Vec2,
    pub rotation: f32,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
        }
    }
}

impl Transform2D {
    pub fn new(position: Vec2, rotation: f32) -> Self {
        Self { position, rotation }
    }

    pub fn from_position(position: Vec2) -> Self {
        Self::new(position, 0.0)
    }

    /// Builds the affine matrix mapping local shape space to world space.
    pub fn to_affine(&self) -> Affine2 {
        Affine2::from_angle_translation(self.rotation.to_radians(), self.position)
    }

    /// Linear blend between two transforms, used for render interpolation.
    pub fn lerp(&self, other: &Transform2D, alpha: f32) -> Transform2D {
        Transform2D {
            position: self.position.lerp(other.position, alpha),
            rotation: self.rotation + (other.rotation - self.rotation) * alpha,
        }
    }
}

/// Linear velocity (world units per second) and angular velocity (radians per second).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub linear: Vec2,
    pub angular: f32,
}

impl Velocity {
    pub fn new(linear: Vec2, angular: f32) -> Self {
        Self { linear, angular }
    }
}

/// Mass and rotational inertia together with their reciprocals.
///
/// Non-dynamic bodies carry all four values as exactly zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MassProperties {
    pub mass: f32,
    pub inverse_mass: f32,
    pub inertia: f32,
    pub inverse_inertia: f32,
}

impl MassProperties {
    pub const ZERO: Self = Self {
        mass: 0.0,
        inverse_mass: 0.0,
        inertia: 0.0,
        inverse_inertia: 0.0,
    };

    pub fn new(mass: f32, inertia: f32) -> Self {
        let inverse = |value: f32| if value > 0.0 { 1.0 / value } else { 0.0 };
        Self {
            mass,
            inverse_mass: inverse(mass),
            inertia,
            inverse_inertia: inverse(inertia),
        }
    }
}

/// Material coefficients that affect interactions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    pub density: f32,
    pub restitution: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            density: 1.0,
            restitution: 1.0,
        }
    }
}

impl Material {
    pub fn new(density: f32, restitution: f32) -> Self {
        Self {
            density,
            restitution,
        }
    }

    pub fn rubber() -> Self {
        Self::new(1.4, 0.8)
    }

    pub fn wood() -> Self {
        Self::new(0.7, 0.3)
    }

    pub fn stone() -> Self {
        Self::new(2.5, 0.1)
    }

    /// Restitution used for a contact between `self` (the dynamic side) and `other`.
    pub fn combined_restitution(&self, other: &Material, other_is_static: bool) -> f32 {
        if other_is_static {
            self.restitution
        } else {
            self.restitution.min(other.restitution)
        }
    }
}

/// Role a body plays in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BodyKind {
    /// Moved by velocity, gravity and contact resolution.
    #[default]
    Dynamic,
    /// Immovable, infinite mass.
    Static,
    /// Reports overlaps, never displaces anything.
    Trigger,
}

impl BodyKind {
    pub const ALL: [BodyKind; 3] = [BodyKind::Dynamic, BodyKind::Static, BodyKind::Trigger];

    /// Position of this kind in per-kind lists.
    pub fn index(self) -> usize {
        match self {
            BodyKind::Dynamic => 0,
            BodyKind::Static => 1,
            BodyKind::Trigger => 2,
        }
    }

    pub fn is_dynamic(self) -> bool {
        self == BodyKind::Dynamic
    }
}
