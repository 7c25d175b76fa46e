//! Swarm Physics 2D – rigid-body simulation core for 2D games.
//!
//! Bodies live on a uniform spatial grid centered on the origin. Each fixed
//! step integrates dynamic bodies, detects collisions incrementally, pushes
//! overlapping bodies apart in static-first order and applies an impulse law.
//! Contact and trigger events are queued for the game layer to drain.

pub mod collision;
pub mod config;
pub mod core;
pub mod dynamics;
pub mod error;
pub mod utils;
pub mod world;

pub use glam::{Affine2, Vec2};

pub use collision::{
    broadphase::{CellRange, GridCell, SpatialGrid},
    contact::{Collision, CollisionSet},
    layers::LayerMatrix,
    narrowphase::Contact,
    queries::{Ray, Raycast, RaycastHit},
    shapes::{Aabb, ShapeInstance},
};
pub use config::WorldConfig;
pub use core::{
    collider::Shape,
    events::{CollisionInfo, PhysicsEvent},
    rigidbody::{BodyBuilder, RigidBody},
    types::{BodyKind, MassProperties, Material, Transform2D, Velocity},
};
pub use dynamics::solver::{AppliedImpulse, CoulombImpulse, ImpulseLaw};
pub use error::{PhysicsError, Result};
pub use utils::allocator::{BodyHandle, CollisionHandle, GenerationalId};
pub use utils::profiling::PhysicsProfiler;
pub use world::{DebugPhase, PhysicsWorld};
