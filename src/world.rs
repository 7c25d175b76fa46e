use std::time::Instant;

use glam::Vec2;
use log::debug;

use crate::{
    collision::{
        broadphase::SpatialGrid,
        contact::{Collision, CollisionSet},
        detector::{detach, CollisionDetector, DetectionReport},
        layers::LayerMatrix,
        queries::{body_at_point, query_bodies_near, Ray, Raycast, RaycastHit},
    },
    config::WorldConfig,
    core::{
        events::{EventQueue, PhysicsEvent},
        registry::BodyRegistry,
        rigidbody::{BodyBuilder, RigidBody},
        types::{BodyKind, Material, Transform2D},
    },
    dynamics::{
        integrator::Integrator,
        positional::PositionalCorrector,
        scheduler::RepositionScheduler,
        solver::{CoulombImpulse, ImpulseLaw, ImpulseResolver},
    },
    error::{PhysicsError, Result},
    utils::{
        allocator::BodyHandle,
        logging::{warn_dropped_steps, warn_if_frame_budget_exceeded, ScopedTimer},
        profiling::{PhaseTimer, PhysicsProfiler},
    },
};

/// Phase run by [`PhysicsWorld::step_phase`] while the simulation is paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DebugPhase {
    #[default]
    UpdatePositions,
    CheckCollisions,
    ResolveCollisions,
}

impl DebugPhase {
    pub fn next(self) -> Self {
        match self {
            DebugPhase::UpdatePositions => DebugPhase::CheckCollisions,
            DebugPhase::CheckCollisions => DebugPhase::ResolveCollisions,
            DebugPhase::ResolveCollisions => DebugPhase::UpdatePositions,
        }
    }
}

/// Central simulation container orchestrating all subsystems.
#[derive(Debug)]
pub struct PhysicsWorld {
    config: WorldConfig,
    registry: BodyRegistry,
    collisions: CollisionSet,
    layers: LayerMatrix,
    detector: CollisionDetector,
    scheduler: RepositionScheduler,
    corrector: PositionalCorrector,
    resolver: ImpulseResolver,
    events: EventQueue,
    profiler: PhysicsProfiler,
    time_accumulated: f32,
    steps_simulated: u64,
    debug_phase: DebugPhase,
    debug_report: Option<DetectionReport>,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    pub fn new() -> Self {
        Self::build(WorldConfig::default())
    }

    /// Creates a world from a validated configuration. Grid dimensions cannot
    /// change afterwards.
    pub fn with_config(config: WorldConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: WorldConfig) -> Self {
        let grid = SpatialGrid::new(config.grid_cell_length, config.grid_size);
        let mut detector = CollisionDetector::new();
        detector.set_parallel(config.parallel);
        Self {
            registry: BodyRegistry::new(grid, config.dirty_queue_capacity),
            collisions: CollisionSet::new(),
            layers: LayerMatrix::default(),
            detector,
            scheduler: RepositionScheduler::new(),
            corrector: PositionalCorrector::new(config.position_damping),
            resolver: ImpulseResolver::new(Box::new(CoulombImpulse::new(
                config.static_friction,
                config.dynamic_friction,
            ))),
            events: EventQueue::new(),
            profiler: PhysicsProfiler::default(),
            time_accumulated: 0.0,
            steps_simulated: 0,
            debug_phase: DebugPhase::default(),
            debug_report: None,
            config,
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn add_body(&mut self, builder: BodyBuilder) -> Result<BodyHandle> {
        LayerMatrix::validate_layer(builder.layer_value())?;
        builder.shape().validate()?;
        if builder.kind() == BodyKind::Dynamic && builder.material_value().density <= 0.0 {
            return Err(PhysicsError::DegenerateShape(
                "dynamic bodies need a positive density",
            ));
        }
        let kind = builder.kind();
        let handle = self.registry.insert(builder);
        debug!("added {:?} body {:?}", kind, handle);
        Ok(handle)
    }

    /// Removes a body. Surviving participants of its collisions receive exit events.
    pub fn remove_body(&mut self, handle: BodyHandle) -> Result<RigidBody> {
        self.check(handle)?;
        self.detach_collisions(handle, true);
        let body = self
            .registry
            .remove(handle)
            .ok_or(PhysicsError::StaleHandle(handle))?;
        debug!("removed body {:?}", handle);
        Ok(body)
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.registry.get(handle)
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.registry.get_mut(handle)
    }

    fn check(&self, handle: BodyHandle) -> Result<()> {
        if self.registry.contains(handle) {
            Ok(())
        } else {
            Err(PhysicsError::StaleHandle(handle))
        }
    }

    fn with_body<F>(&mut self, handle: BodyHandle, f: F) -> Result<()>
    where
        F: FnOnce(&mut RigidBody),
    {
        let body = self
            .registry
            .get_mut(handle)
            .ok_or(PhysicsError::StaleHandle(handle))?;
        f(body);
        Ok(())
    }

    fn with_transform<F>(&mut self, handle: BodyHandle, f: F) -> Result<()>
    where
        F: FnOnce(&mut Transform2D),
    {
        self.with_body(handle, |body| f(&mut body.transform))?;
        self.registry.make_transform_dirty(handle);
        Ok(())
    }

    pub fn set_position(&mut self, handle: BodyHandle, position: Vec2) -> Result<()> {
        self.with_transform(handle, |t| t.position = position)
    }

    /// Rotation in degrees.
    pub fn set_rotation(&mut self, handle: BodyHandle, degrees: f32) -> Result<()> {
        self.with_transform(handle, |t| t.rotation = degrees)
    }

    pub fn set_transform(&mut self, handle: BodyHandle, transform: Transform2D) -> Result<()> {
        self.with_transform(handle, |t| *t = transform)
    }

    pub fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec2) -> Result<()> {
        self.with_body(handle, |body| body.velocity.linear = velocity)
    }

    /// Angular velocity in radians per second.
    pub fn set_angular_velocity(&mut self, handle: BodyHandle, angular: f32) -> Result<()> {
        self.with_body(handle, |body| body.velocity.angular = angular)
    }

    pub fn set_fixed_rotation(&mut self, handle: BodyHandle, fixed: bool) -> Result<()> {
        self.with_body(handle, |body| body.fixed_rotation = fixed)
    }

    pub fn set_material(&mut self, handle: BodyHandle, material: Material) -> Result<()> {
        let dynamic = self.registry.get(handle).map(|b| b.is_dynamic()).unwrap_or(false);
        if dynamic && material.density <= 0.0 {
            return Err(PhysicsError::DegenerateShape(
                "dynamic bodies need a positive density",
            ));
        }
        self.with_body(handle, |body| {
            body.material = material;
            body.refresh_mass();
        })
    }

    pub fn set_layer(&mut self, handle: BodyHandle, layer: u8) -> Result<()> {
        LayerMatrix::validate_layer(layer)?;
        self.with_body(handle, |body| body.layer = layer)
    }

    /// Re-registers a body under another kind. Its collisions end first, with events.
    pub fn set_body_kind(&mut self, handle: BodyHandle, kind: BodyKind) -> Result<()> {
        let current = self
            .registry
            .get(handle)
            .map(|b| b.kind)
            .ok_or(PhysicsError::StaleHandle(handle))?;
        if current == kind {
            return Ok(());
        }
        self.detach_collisions(handle, false);
        self.registry.set_kind(handle, kind);
        debug!("body {:?} changed kind {:?} -> {:?}", handle, current, kind);
        Ok(())
    }

    /// Ends every collision involving `handle`.
    fn detach_collisions(&mut self, handle: BodyHandle, removing: bool) {
        let drained = self.collisions.drain_where(|c| c.involves(handle));
        for (collision_handle, collision) in drained {
            detach(&mut self.registry, collision_handle, &collision);
            if removing {
                self.events.collision_detached(&collision, handle);
            } else {
                self.events.collision_ended(&collision);
            }
        }
        if let Some(report) = self.debug_report.as_mut() {
            report
                .started
                .retain(|h| self.collisions.get(*h).is_some());
            if removing {
                let events = &mut self.events;
                report.ended.retain(|collision| {
                    if !collision.involves(handle) {
                        return true;
                    }
                    events.collision_detached(collision, handle);
                    false
                });
            }
        }
    }

    pub fn make_transform_dirty(&mut self, handle: BodyHandle) {
        self.registry.make_transform_dirty(handle);
    }

    pub fn flush_dirty_transforms(&mut self) -> usize {
        self.registry.flush_dirty()
    }

    pub fn set_layer_collision(&mut self, layer_a: u8, layer_b: u8, allowed: bool) -> Result<()> {
        self.layers.set(layer_a, layer_b, allowed)
    }

    pub fn layers_collide(&self, layer_a: u8, layer_b: u8) -> Result<bool> {
        self.layers.collides(layer_a, layer_b)
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.config.gravity = gravity;
    }

    pub fn gravity(&self) -> Vec2 {
        self.config.gravity
    }

    /// Pausing enables [`Self::step_phase`]. Resuming dispatches the events
    /// of a half-finished debug cycle and starts the next step from scratch.
    pub fn set_simulation_enabled(&mut self, enabled: bool) {
        self.config.simulation_enabled = enabled;
        if enabled {
            if let Some(report) = self.debug_report.take() {
                self.dispatch(report);
            }
            self.debug_phase = DebugPhase::default();
        }
    }

    pub fn simulation_enabled(&self) -> bool {
        self.config.simulation_enabled
    }

    pub fn set_parallel_enabled(&mut self, enabled: bool) {
        self.config.parallel = enabled;
        self.detector.set_parallel(enabled);
    }

    pub fn parallel_enabled(&self) -> bool {
        self.config.parallel
    }

    pub fn set_impulse_law<L>(&mut self, law: L)
    where
        L: ImpulseLaw + 'static,
    {
        self.resolver.set_law(Box::new(law));
    }

    /// Advances the simulation using a fixed timestep accumulator.
    ///
    /// At most `max_steps_per_frame` steps run; further pending steps are
    /// dropped. Returns the number of steps executed.
    pub fn step(&mut self, dt: f32) -> u32 {
        if !self.config.simulation_enabled {
            return 0;
        }
        let frame_start = Instant::now();
        let time_step = self.config.time_step;

        self.time_accumulated += dt.max(0.0);
        let pending = (self.time_accumulated / time_step).floor() as u32;
        let steps = pending.min(self.config.max_steps_per_frame);
        self.time_accumulated = (self.time_accumulated - pending as f32 * time_step).max(0.0);

        for _ in 0..steps {
            self.simulate_step();
        }

        warn_dropped_steps(pending, steps);
        warn_if_frame_budget_exceeded(frame_start.elapsed(), self.config.frame_budget_ms);
        steps
    }

    /// Fraction of a fixed step left in the accumulator, for render interpolation.
    pub fn interpolation_alpha(&self) -> f32 {
        (self.time_accumulated / self.config.time_step).clamp(0.0, 1.0)
    }

    /// Runs exactly one fixed step regardless of the simulation-enabled flag.
    pub fn simulate_step(&mut self) {
        let _timer = ScopedTimer::new("physics::step");
        let start = Instant::now();
        let mut profile = PhysicsProfiler::default();

        self.update_positions(&mut profile);
        let report = self.check_collisions(&mut profile);
        self.resolve_collisions(report, &mut profile);

        profile.total_step_time = start.elapsed();
        self.finish_profile(profile);
        self.steps_simulated += 1;
    }

    /// Runs the next phase of a step while the simulation is paused.
    /// Returns `None` when the simulation is running.
    pub fn step_phase(&mut self) -> Option<DebugPhase> {
        if self.config.simulation_enabled {
            return None;
        }
        let phase = self.debug_phase;
        let mut profile = self.profiler;
        match phase {
            DebugPhase::UpdatePositions => {
                profile = PhysicsProfiler::default();
                self.update_positions(&mut profile);
            }
            DebugPhase::CheckCollisions => {
                self.debug_report = Some(self.check_collisions(&mut profile));
            }
            DebugPhase::ResolveCollisions => {
                let report = self.debug_report.take().unwrap_or_default();
                self.resolve_collisions(report, &mut profile);
                self.steps_simulated += 1;
            }
        }
        self.finish_profile(profile);
        self.debug_phase = phase.next();
        Some(phase)
    }

    /// Phase the next [`Self::step_phase`] call will run.
    pub fn debug_phase(&self) -> DebugPhase {
        self.debug_phase
    }

    fn update_positions(&mut self, profile: &mut PhysicsProfiler) {
        {
            let _timer = ScopedTimer::new("transforms::flush");
            let _phase = PhaseTimer::new(&mut profile.flush_time);
            self.registry.flush_dirty();
        }
        {
            let _timer = ScopedTimer::new("integrator");
            let _phase = PhaseTimer::new(&mut profile.integrator_time);
            Integrator::new(self.config.time_step, self.config.gravity).step(&mut self.registry);
        }
        {
            let _timer = ScopedTimer::new("transforms::flush");
            let _phase = PhaseTimer::new(&mut profile.flush_time);
            self.registry.flush_dirty();
        }
    }

    fn check_collisions(&mut self, profile: &mut PhysicsProfiler) -> DetectionReport {
        let _timer = ScopedTimer::new("collisions::detect");
        let _phase = PhaseTimer::new(&mut profile.detection_time);
        // Bodies moved through the setters since the last flush.
        self.registry.flush_dirty();
        let report = self
            .detector
            .detect(&mut self.registry, &mut self.collisions, &self.layers);
        profile.collisions_started = report.started.len();
        profile.collisions_ended = report.ended.len();
        report
    }

    fn resolve_collisions(&mut self, report: DetectionReport, profile: &mut PhysicsProfiler) {
        let order = {
            let _timer = ScopedTimer::new("collisions::schedule");
            let _phase = PhaseTimer::new(&mut profile.scheduler_time);
            self.scheduler.schedule(&mut self.registry, &self.collisions)
        };
        {
            let _timer = ScopedTimer::new("collisions::correct");
            let _phase = PhaseTimer::new(&mut profile.correction_time);
            self.corrector
                .correct(order, &mut self.registry, &mut self.collisions);
        }
        {
            let _timer = ScopedTimer::new("collisions::impulse");
            let _phase = PhaseTimer::new(&mut profile.impulse_time);
            self.resolver.resolve_all(&mut self.registry, &self.collisions);
        }
        let _timer = ScopedTimer::new("events::dispatch");
        self.dispatch(report);
    }

    fn dispatch(&mut self, report: DetectionReport) {
        for collision in &report.ended {
            self.events.collision_ended(collision);
        }
        for handle in report.started {
            if let Some(collision) = self.collisions.get(handle) {
                self.events.collision_started(collision);
            }
        }
    }

    fn finish_profile(&mut self, mut profile: PhysicsProfiler) {
        profile.body_count = self.registry.len();
        profile.collision_count = self.collisions.len();
        self.profiler = profile;
        self.profiler.report();
    }

    /// Nearest non-trigger body hit within `max_distance`.
    pub fn raycast(&mut self, ray: Ray, max_distance: f32) -> Option<RaycastHit> {
        self.registry.flush_dirty();
        Raycast::cast(&ray, max_distance, &self.registry)
    }

    pub fn query_bodies_near(&mut self, point: Vec2, radius: f32, include_triggers: bool) -> Vec<BodyHandle> {
        self.registry.flush_dirty();
        query_bodies_near(&self.registry, point, radius, include_triggers)
    }

    /// First body containing `point`, triggers only when `include_triggers` is set.
    pub fn body_at_point(&mut self, point: Vec2, include_triggers: bool) -> Option<BodyHandle> {
        self.registry.flush_dirty();
        body_at_point(&self.registry, point, include_triggers)
    }

    pub fn is_point_inside(&mut self, handle: BodyHandle, point: Vec2) -> Result<bool> {
        if !self.registry.ensure_transform(handle) {
            return Err(PhysicsError::StaleHandle(handle));
        }
        Ok(self
            .registry
            .get(handle)
            .map(|body| body.instance.contains_point(point))
            .unwrap_or(false))
    }

    pub fn collisions(&self) -> &CollisionSet {
        &self.collisions
    }

    pub fn collision_count(&self) -> usize {
        self.collisions.len()
    }

    /// Live collisions involving `handle`, triggers included.
    pub fn collisions_of(&self, handle: BodyHandle) -> Vec<Collision> {
        self.collisions
            .iter()
            .filter(|(_, c)| c.involves(handle))
            .map(|(_, c)| *c)
            .collect()
    }

    pub fn drain_events(&mut self) -> std::vec::Drain<'_, PhysicsEvent> {
        self.events.drain()
    }

    pub fn pending_events(&self) -> &[PhysicsEvent] {
        self.events.as_slice()
    }

    pub fn profiler(&self) -> &PhysicsProfiler {
        &self.profiler
    }

    pub fn grid(&self) -> &SpatialGrid {
        self.registry.grid()
    }

    pub fn dynamic_bodies(&self) -> &[BodyHandle] {
        self.registry.of_kind(BodyKind::Dynamic)
    }

    pub fn static_bodies(&self) -> &[BodyHandle] {
        self.registry.of_kind(BodyKind::Static)
    }

    pub fn triggers(&self) -> &[BodyHandle] {
        self.registry.of_kind(BodyKind::Trigger)
    }

    /// All bodies in registration order.
    pub fn bodies(&self) -> impl Iterator<Item = &RigidBody> + '_ {
        self.registry.iter()
    }

    pub fn body_count(&self) -> usize {
        self.registry.len()
    }

    pub fn steps_simulated(&self) -> u64 {
        self.steps_simulated
    }

    /// Drops every body, collision and pending event without notifying anyone.
    pub fn clear(&mut self) {
        self.registry.clear();
        self.collisions.clear();
        self.events.clear();
        self.time_accumulated = 0.0;
        self.debug_phase = DebugPhase::default();
        self.debug_report = None;
        self.profiler.reset();
    }
}
