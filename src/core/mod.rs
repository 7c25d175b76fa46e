//! Core types describing bodies, their shapes and the events they receive.

pub mod types;
pub mod rigidbody;
pub mod collider;
pub mod registry;
pub mod events;

pub use types::{BodyKind, MassProperties, Material, Transform2D, Velocity};
pub use rigidbody::{BodyBuilder, RigidBody};
pub use collider::Shape;
pub use registry::BodyRegistry;
pub use events::{CollisionInfo, EventQueue, PhysicsEvent};
