//! Global configuration for the Swarm Physics 2D engine.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{PhysicsError, Result};

/// Default gravity in pixels per second squared (screen space, Y-down, 100 px = 1 m).
pub const DEFAULT_GRAVITY: [f32; 2] = [0.0, 981.0];

/// Default integration timestep (in seconds).
pub const DEFAULT_TIME_STEP: f32 = 1.0 / 60.0;

/// Maximum number of fixed steps the frame driver runs to catch up in one frame.
pub const DEFAULT_MAX_STEPS_PER_FRAME: u32 = 10;

/// Edge length of one broad-phase grid cell.
pub const DEFAULT_GRID_CELL_LENGTH: f32 = 64.0;

/// Number of grid cells along each axis; the grid is centered on the origin.
pub const DEFAULT_GRID_SIZE: usize = 512;

/// Fraction of the minimum translation applied during positional correction.
pub const DEFAULT_POSITION_DAMPING: f32 = 0.99;

/// Friction coefficient used while the tangential impulse stays inside the cone.
pub const DEFAULT_STATIC_FRICTION: f32 = 0.4;

/// Friction coefficient used once the contact slides.
pub const DEFAULT_DYNAMIC_FRICTION: f32 = 0.2;

/// Nodes preallocated for the dirty-transform queue.
pub const DEFAULT_DIRTY_QUEUE_CAPACITY: usize = 1024;

/// Frame budget used for the overrun warning.
pub const DEFAULT_FRAME_BUDGET_MS: f32 = 16.0;

/// Number of collision layers.
pub const LAYER_COUNT: usize = 32;

/// World construction parameters.
///
/// Grid dimensions are consumed once by [`crate::PhysicsWorld::with_config`]
/// and cannot change afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub gravity: Vec2,
    pub time_step: f32,
    pub max_steps_per_frame: u32,
    pub grid_cell_length: f32,
    pub grid_size: usize,
    pub simulation_enabled: bool,
    pub position_damping: f32,
    pub static_friction: f32,
    pub dynamic_friction: f32,
    pub dirty_queue_capacity: usize,
    pub frame_budget_ms: f32,
    pub parallel: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::from_array(DEFAULT_GRAVITY),
            time_step: DEFAULT_TIME_STEP,
            max_steps_per_frame: DEFAULT_MAX_STEPS_PER_FRAME,
            grid_cell_length: DEFAULT_GRID_CELL_LENGTH,
            grid_size: DEFAULT_GRID_SIZE,
            simulation_enabled: true,
            position_damping: DEFAULT_POSITION_DAMPING,
            static_friction: DEFAULT_STATIC_FRICTION,
            dynamic_friction: DEFAULT_DYNAMIC_FRICTION,
            dirty_queue_capacity: DEFAULT_DIRTY_QUEUE_CAPACITY,
            frame_budget_ms: DEFAULT_FRAME_BUDGET_MS,
            parallel: false,
        }
    }
}

impl WorldConfig {
    pub fn with_gravity(mut self, gravity: Vec2) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_time_step(mut self, time_step: f32) -> Self {
        self.time_step = time_step;
        self
    }

    pub fn with_grid(mut self, cell_length: f32, size: usize) -> Self {
        self.grid_cell_length = cell_length;
        self.grid_size = size;
        self
    }

    pub fn with_max_steps_per_frame(mut self, steps: u32) -> Self {
        self.max_steps_per_frame = steps;
        self
    }

    /// Rejects values the simulation cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !(self.time_step > 0.0 && self.time_step.is_finite()) {
            return Err(PhysicsError::InvalidConfig("time_step must be positive"));
        }
        if !(self.grid_cell_length > 0.0 && self.grid_cell_length.is_finite()) {
            return Err(PhysicsError::InvalidConfig(
                "grid_cell_length must be positive",
            ));
        }
        if self.grid_size == 0 {
            return Err(PhysicsError::InvalidConfig("grid_size must be non-zero"));
        }
        if self.max_steps_per_frame == 0 {
            return Err(PhysicsError::InvalidConfig(
                "max_steps_per_frame must be non-zero",
            ));
        }
        if !(0.0..=1.0).contains(&self.position_damping) {
            return Err(PhysicsError::InvalidConfig(
                "position_damping must lie in [0, 1]",
            ));
        }
        if self.static_friction < 0.0 || self.dynamic_friction < 0.0 {
            return Err(PhysicsError::InvalidConfig(
                "friction coefficients must be non-negative",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(WorldConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_grid_is_rejected() {
        let config = WorldConfig::default().with_grid(64.0, 0);
        assert!(matches!(
            config.validate(),
            Err(PhysicsError::InvalidConfig(_))
        ));
    }

    #[test]
    fn non_positive_time_step_is_rejected() {
        let config = WorldConfig::default().with_time_step(0.0);
        assert!(config.validate().is_err());
    }
}
