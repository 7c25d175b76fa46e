//! Error types returned by world operations.

use thiserror::Error;

use crate::utils::allocator::BodyHandle;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PhysicsError {
    #[error("body {0:?} is not registered in this world")]
    StaleHandle(BodyHandle),
    #[error("collision layer {0} is out of range (0..32)")]
    InvalidLayer(u8),
    #[error("degenerate shape: {0}")]
    DegenerateShape(&'static str),
    #[error("invalid world configuration: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = std::result::Result<T, PhysicsError>;
