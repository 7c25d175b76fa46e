use std::time::{Duration, Instant};

/// Per-phase timings of the most recent simulation step.
#[derive(Debug, Default, Clone, Copy)]
pub struct PhysicsProfiler {
    pub flush_time: Duration,
    pub integrator_time: Duration,
    pub detection_time: Duration,
    pub scheduler_time: Duration,
    pub correction_time: Duration,
    pub impulse_time: Duration,
    pub total_step_time: Duration,

    pub body_count: usize,
    pub collision_count: usize,
    pub collisions_started: usize,
    pub collisions_ended: usize,
}

impl PhysicsProfiler {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Writes the profile through `log::debug!`.
    pub fn report(&self) {
        let total_us = self.total_step_time.as_micros() as f32;
        if total_us < 1.0 {
            return;
        }

        let share = |phase: Duration| (phase.as_micros() as f32 / total_us) * 100.0;
        log::debug!(
            "physics step {:.3} ms | bodies {} collisions {} (+{} / -{})",
            self.total_step_time.as_secs_f32() * 1000.0,
            self.body_count,
            self.collision_count,
            self.collisions_started,
            self.collisions_ended
        );
        log::debug!(
            "  flush {:.1}% integrate {:.1}% detect {:.1}% schedule {:.1}% correct {:.1}% impulse {:.1}%",
            share(self.flush_time),
            share(self.integrator_time),
            share(self.detection_time),
            share(self.scheduler_time),
            share(self.correction_time),
            share(self.impulse_time)
        );
    }
}

/// Adds the elapsed time of its scope to a profiler slot.
pub struct PhaseTimer<'a> {
    start: Instant,
    output: &'a mut Duration,
}

impl<'a> PhaseTimer<'a> {
    pub fn new(output: &'a mut Duration) -> Self {
        Self {
            start: Instant::now(),
            output,
        }
    }
}

impl<'a> Drop for PhaseTimer<'a> {
    fn drop(&mut self) {
        *self.output += self.start.elapsed();
    }
}
