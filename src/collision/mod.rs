//! Collision detection: spatial grid, posed shapes, exact tests, live collisions and queries.

pub mod shapes;
pub mod broadphase;
pub mod narrowphase;
pub mod contact;
pub mod detector;
pub mod layers;
pub mod queries;

pub use broadphase::SpatialGrid;
pub use contact::{Collision, CollisionSet};
pub use detector::{CollisionDetector, DetectionReport};
pub use queries::{Ray, Raycast, RaycastHit};
