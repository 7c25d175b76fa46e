use log::debug;

use super::{
    contact::{Collision, CollisionSet},
    layers::LayerMatrix,
    narrowphase::{intersect, overlaps, passes_prefilter, Contact},
};
use crate::{
    core::{registry::BodyRegistry, rigidbody::RigidBody, types::BodyKind},
    utils::allocator::{Arena, BodyHandle, CollisionHandle},
};
use glam::Vec2;

/// Candidate pair: dynamic body, neighbour, neighbour kind.
type Candidate = (BodyHandle, BodyHandle, BodyKind);

/// Collisions whose lifecycle changed during one detection pass.
#[derive(Debug, Default, Clone)]
pub struct DetectionReport {
    pub started: Vec<CollisionHandle>,
    pub ended: Vec<Collision>,
}

/// Grid-driven broad phase, narrow phase and incremental collision bookkeeping.
#[derive(Debug, Default, Clone)]
pub struct CollisionDetector {
    dynamic_scratch: Vec<BodyHandle>,
    candidates: Vec<Candidate>,
    parallel: bool,
}

impl CollisionDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the narrow-phase test pass on the rayon pool when the
    /// `parallel` feature is compiled in.
    pub fn set_parallel(&mut self, enabled: bool) {
        self.parallel = enabled;
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    /// One detection pass. All transforms must have been resolved beforehand.
    pub fn detect(
        &mut self,
        registry: &mut BodyRegistry,
        collisions: &mut CollisionSet,
        layers: &LayerMatrix,
    ) -> DetectionReport {
        collisions.mark_all_not_found();
        self.collect_candidates(registry, layers);
        let results = self.narrow_phase(registry.arena());

        let mut pending = Vec::new();
        for (&(a, b, kind), contact) in self.candidates.iter().zip(results) {
            let Some(contact) = contact else {
                continue;
            };
            match find_existing(registry, collisions, a, b) {
                Some(handle) => {
                    if let Some(collision) = collisions.get_mut(handle) {
                        let oriented = if collision.a == a {
                            contact
                        } else {
                            Contact {
                                mtv: -contact.mtv,
                                point: contact.point,
                            }
                        };
                        collision.refresh(oriented);
                        collision.found = true;
                        collision.newly_found = false;
                    }
                }
                None => pending.push(Collision::new(a, b, kind == BodyKind::Trigger, contact)),
            }
        }

        let mut report = DetectionReport::default();
        for (handle, collision) in collisions.drain_where(|c| !c.found) {
            detach(registry, handle, &collision);
            report.ended.push(collision);
        }
        for collision in pending {
            let handle = collisions.insert(collision);
            attach(registry, handle, &collision);
            report.started.push(handle);
        }

        if !report.started.is_empty() || !report.ended.is_empty() {
            debug!(
                "collisions: {} live, {} started, {} ended",
                collisions.len(),
                report.started.len(),
                report.ended.len()
            );
        }
        report
    }

    fn collect_candidates(&mut self, registry: &mut BodyRegistry, layers: &LayerMatrix) {
        self.candidates.clear();
        self.dynamic_scratch.clear();
        self.dynamic_scratch
            .extend_from_slice(registry.of_kind(BodyKind::Dynamic));

        let (bodies, grid) = registry.bodies_and_grid();
        for &handle in &self.dynamic_scratch {
            let Some((range, layer)) = bodies.get(handle).and_then(|b| b.grid_range.map(|r| (r, b.layer)))
            else {
                continue;
            };

            for (x, y) in range.cells() {
                let cell = grid.cell(x, y);
                for kind in [BodyKind::Static, BodyKind::Trigger] {
                    for &other in cell.bodies(kind) {
                        if !layer_allows(bodies, layers, layer, other) {
                            continue;
                        }
                        let newly_collected = bodies
                            .get_mut(handle)
                            .map(|b| b.collected[kind.index()].insert(other))
                            .unwrap_or(false);
                        if newly_collected {
                            self.candidates.push((handle, other, kind));
                        }
                    }
                }

                let slot = BodyKind::Dynamic.index();
                for &other in cell.bodies(BodyKind::Dynamic) {
                    if other == handle || !layer_allows(bodies, layers, layer, other) {
                        continue;
                    }
                    let Some((body, neighbour)) = bodies.get2_mut(handle, other) else {
                        continue;
                    };
                    if body.collected[slot].contains(&other) {
                        continue;
                    }
                    body.collected[slot].insert(other);
                    neighbour.collected[slot].insert(handle);
                    self.candidates.push((handle, other, BodyKind::Dynamic));
                }
            }
        }

        for &handle in &self.dynamic_scratch {
            if let Some(body) = bodies.get_mut(handle) {
                body.clear_collected();
            }
        }
    }

    #[cfg(feature = "parallel")]
    fn narrow_phase(&self, bodies: &Arena<BodyHandle, RigidBody>) -> Vec<Option<Contact>> {
        use rayon::prelude::*;

        if self.parallel {
            self.candidates
                .par_iter()
                .map(|&(a, b, kind)| test_pair(bodies, a, b, kind))
                .collect()
        } else {
            self.sequential_narrow_phase(bodies)
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn narrow_phase(&self, bodies: &Arena<BodyHandle, RigidBody>) -> Vec<Option<Contact>> {
        self.sequential_narrow_phase(bodies)
    }

    fn sequential_narrow_phase(&self, bodies: &Arena<BodyHandle, RigidBody>) -> Vec<Option<Contact>> {
        self.candidates
            .iter()
            .map(|&(a, b, kind)| test_pair(bodies, a, b, kind))
            .collect()
    }
}

fn layer_allows(
    bodies: &Arena<BodyHandle, RigidBody>,
    layers: &LayerMatrix,
    layer: u8,
    other: BodyHandle,
) -> bool {
    bodies
        .get(other)
        .map(|b| layers.allows(layer, b.layer))
        .unwrap_or(false)
}

/// Bounding circle, then AABB, then the exact test.
fn test_pair(
    bodies: &Arena<BodyHandle, RigidBody>,
    a: BodyHandle,
    b: BodyHandle,
    kind: BodyKind,
) -> Option<Contact> {
    let shape_a = &bodies.get(a)?.instance;
    let shape_b = &bodies.get(b)?.instance;
    if !passes_prefilter(shape_a, shape_b) {
        return None;
    }
    if kind == BodyKind::Trigger {
        overlaps(shape_a, shape_b).then_some(Contact {
            mtv: Vec2::ZERO,
            point: Vec2::ZERO,
        })
    } else {
        intersect(shape_a, shape_b)
    }
}

fn find_existing(
    registry: &BodyRegistry,
    collisions: &CollisionSet,
    a: BodyHandle,
    b: BodyHandle,
) -> Option<CollisionHandle> {
    registry.get(a)?.collisions.iter().copied().find(|handle| {
        collisions
            .get(*handle)
            .map(|c| c.involves(b))
            .unwrap_or(false)
    })
}

fn is_static(registry: &BodyRegistry, handle: BodyHandle) -> bool {
    registry
        .get(handle)
        .map(|b| b.kind == BodyKind::Static)
        .unwrap_or(false)
}

/// Adds `handle` to the collision lists of its participants. Triggers get no back-reference.
pub(crate) fn attach(registry: &mut BodyRegistry, handle: CollisionHandle, collision: &Collision) {
    let a_static = is_static(registry, collision.a);
    let b_static = is_static(registry, collision.b);

    if let Some(body) = registry.get_mut(collision.a) {
        body.collisions.push(handle);
        if b_static {
            body.static_collision_count += 1;
        }
    }
    if collision.is_trigger {
        return;
    }
    if let Some(body) = registry.get_mut(collision.b) {
        body.collisions.push(handle);
        if a_static {
            body.static_collision_count += 1;
        }
    }
}

/// Removes `handle` from the collision lists of its participants.
pub(crate) fn detach(registry: &mut BodyRegistry, handle: CollisionHandle, collision: &Collision) {
    let a_static = is_static(registry, collision.a);
    let b_static = is_static(registry, collision.b);

    for (participant, other_static) in [(collision.a, b_static), (collision.b, a_static)] {
        let Some(body) = registry.get_mut(participant) else {
            continue;
        };
        if let Some(index) = body.collisions.iter().position(|h| *h == handle) {
            body.collisions.swap_remove(index);
            if other_static {
                body.static_collision_count = body.static_collision_count.saturating_sub(1);
            }
        }
    }
}
