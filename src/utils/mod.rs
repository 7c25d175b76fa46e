//! Utility helpers: generational handles, pooled queues, 2D math, logging and profiling.

pub mod allocator;
pub mod logging;
pub mod math;
pub mod pool;
pub mod profiling;

pub use allocator::{Arena, BodyHandle, CollisionHandle, GenerationalId};
pub use math::*;
pub use pool::PooledQueue;
