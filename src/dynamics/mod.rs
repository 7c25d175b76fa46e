//! Simulation dynamics: integration, correction ordering, positional correction and impulses.

pub mod integrator;
pub mod positional;
pub mod scheduler;
pub mod solver;

pub use integrator::Integrator;
pub use positional::PositionalCorrector;
pub use scheduler::RepositionScheduler;
pub use solver::{CoulombImpulse, ImpulseLaw, ImpulseResolver};
