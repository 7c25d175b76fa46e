use std::collections::HashSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{
    narrowphase::overlaps,
    shapes::{Aabb, ShapeInstance},
};
use crate::{
    core::{registry::BodyRegistry, types::BodyKind},
    utils::allocator::BodyHandle,
};

/// Half-line with a unit direction. A zero direction hits nothing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    pub origin: Vec2,
    pub direction: Vec2,
}

impl Ray {
    pub fn new(origin: Vec2, direction: Vec2) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn point_at(&self, distance: f32) -> Vec2 {
        self.origin + self.direction * distance
    }
}

/// Result of a ray cast against body shapes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RaycastHit {
    pub body: BodyHandle,
    pub point: Vec2,
    pub normal: Vec2,
    pub distance: f32,
}

pub struct Raycast;

impl Raycast {
    /// Nearest hit along `ray` within `max_distance`. Triggers are ignored.
    pub fn cast(ray: &Ray, max_distance: f32, registry: &BodyRegistry) -> Option<RaycastHit> {
        Self::cast_all(ray, max_distance, registry).into_iter().next()
    }

    /// Every non-trigger body hit along `ray`, nearest first.
    pub fn cast_all(ray: &Ray, max_distance: f32, registry: &BodyRegistry) -> Vec<RaycastHit> {
        if ray.direction == Vec2::ZERO || max_distance.is_nan() || max_distance <= 0.0 {
            return Vec::new();
        }
        let end = ray.point_at(max_distance);
        let bounds = Aabb::new(ray.origin.min(end), ray.origin.max(end));
        let grid = registry.grid();
        let Some(range) = grid.clamped_range(&bounds) else {
            return Vec::new();
        };

        let mut visited = HashSet::new();
        let mut hits = Vec::new();
        for (_, _, cell) in grid.occupied_cells(range) {
            for kind in [BodyKind::Dynamic, BodyKind::Static] {
                for &handle in cell.bodies(kind) {
                    if !visited.insert(handle) {
                        continue;
                    }
                    let Some(body) = registry.get(handle) else {
                        continue;
                    };
                    let instance = &body.instance;
                    if !instance.aabb.overlaps(&bounds) {
                        continue;
                    }
                    if let Some((distance, point, normal)) =
                        instance.ray_intersection(ray.origin, ray.direction, max_distance)
                    {
                        hits.push(RaycastHit {
                            body: handle,
                            point,
                            normal,
                            distance,
                        });
                    }
                }
            }
        }

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}

/// Bodies whose shapes overlap the circle at `point` with `radius`, in
/// discovery order.
pub fn query_bodies_near(
    registry: &BodyRegistry,
    point: Vec2,
    radius: f32,
    include_triggers: bool,
) -> Vec<BodyHandle> {
    let disc = ShapeInstance::circle(point, radius.max(0.0));
    let grid = registry.grid();
    let Some(range) = grid.clamped_range(&disc.aabb) else {
        return Vec::new();
    };

    let kinds: &[BodyKind] = if include_triggers {
        &BodyKind::ALL
    } else {
        &[BodyKind::Dynamic, BodyKind::Static]
    };

    let mut seen = HashSet::new();
    let mut found = Vec::new();
    for (x, y, cell) in grid.occupied_cells(range) {
        let cell_inside = cell_within_circle(&grid.cell_bounds(x, y), point, radius);
        for &kind in kinds {
            for &handle in cell.bodies(kind) {
                if seen.contains(&handle) {
                    continue;
                }
                let hit = cell_inside
                    || registry
                        .get(handle)
                        .map(|body| overlaps(&disc, &body.instance))
                        .unwrap_or(false);
                if hit {
                    seen.insert(handle);
                    found.push(handle);
                }
            }
        }
    }
    found
}

fn cell_within_circle(bounds: &Aabb, center: Vec2, radius: f32) -> bool {
    let r2 = radius * radius;
    [
        bounds.min,
        bounds.max,
        Vec2::new(bounds.min.x, bounds.max.y),
        Vec2::new(bounds.max.x, bounds.min.y),
    ]
    .iter()
    .all(|corner| corner.distance_squared(center) <= r2)
}

/// First body whose shape contains `point`. Triggers count only when `include_triggers` is set.
pub fn body_at_point(registry: &BodyRegistry, point: Vec2, include_triggers: bool) -> Option<BodyHandle> {
    let grid = registry.grid();
    let range = grid.clamped_range(&Aabb::new(point, point))?;
    let (_, _, cell) = grid.occupied_cells(range).next()?;
    BodyKind::ALL
        .iter()
        .filter(|kind| include_triggers || **kind != BodyKind::Trigger)
        .flat_map(|kind| cell.bodies(*kind).iter().copied())
        .find(|handle| {
            registry
                .get(*handle)
                .map(|body| body.instance.contains_point(point))
                .unwrap_or(false)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        collision::broadphase::SpatialGrid,
        core::{collider::Shape, rigidbody::BodyBuilder},
    };
    use approx::assert_relative_eq;

    fn registry_with(builders: Vec<BodyBuilder>) -> (BodyRegistry, Vec<BodyHandle>) {
        let mut registry = BodyRegistry::new(SpatialGrid::new(10.0, 32), 8);
        let handles = builders.into_iter().map(|b| registry.insert(b)).collect();
        registry.flush_dirty();
        (registry, handles)
    }

    #[test]
    fn raycast_returns_the_nearest_solid_body() {
        let (registry, handles) = registry_with(vec![
            BodyBuilder::fixed(Shape::cuboid(Vec2::splat(5.0))).position(Vec2::new(60.0, 0.0)),
            BodyBuilder::dynamic(Shape::circle(2.0)).position(Vec2::new(30.0, 0.0)),
            BodyBuilder::trigger(Shape::circle(3.0)).position(Vec2::new(10.0, 0.0)),
        ]);
        let ray = Ray::new(Vec2::ZERO, Vec2::new(1.0, 0.0));

        let hit = Raycast::cast(&ray, 100.0, &registry).expect("circle in the way");
        assert_eq!(hit.body, handles[1]);
        assert_relative_eq!(hit.distance, 28.0, epsilon = 1e-4);
        assert_relative_eq!(hit.normal.x, -1.0, epsilon = 1e-4);

        let all = Raycast::cast_all(&ray, 100.0, &registry);
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].body, handles[0]);
        assert_relative_eq!(all[1].point.x, 55.0, epsilon = 1e-4);
    }

    #[test]
    fn raycast_respects_max_distance() {
        let (registry, _) = registry_with(vec![
            BodyBuilder::fixed(Shape::circle(1.0)).position(Vec2::new(20.0, 0.0)),
        ]);
        let ray = Ray::new(Vec2::ZERO, Vec2::new(1.0, 0.0));
        assert!(Raycast::cast(&ray, 10.0, &registry).is_none());
        assert!(Raycast::cast(&Ray::new(Vec2::ZERO, Vec2::ZERO), 50.0, &registry).is_none());
    }

    #[test]
    fn query_near_filters_triggers_and_deduplicates() {
        let (registry, handles) = registry_with(vec![
            // Spans four cells around the origin.
            BodyBuilder::fixed(Shape::cuboid(Vec2::splat(4.0))),
            BodyBuilder::trigger(Shape::circle(1.0)).position(Vec2::new(3.0, 3.0)),
            BodyBuilder::dynamic(Shape::circle(1.0)).position(Vec2::new(40.0, 40.0)),
        ]);

        let near = query_bodies_near(&registry, Vec2::ZERO, 6.0, false);
        assert_eq!(near, vec![handles[0]]);

        let mut with_triggers = query_bodies_near(&registry, Vec2::ZERO, 6.0, true);
        with_triggers.sort_by_key(|h| h.index());
        assert_eq!(with_triggers, vec![handles[0], handles[1]]);
    }

    #[test]
    fn point_lookup_tests_the_exact_shape() {
        let (registry, handles) = registry_with(vec![
            BodyBuilder::fixed(Shape::circle(2.0)).position(Vec2::new(5.0, 5.0)),
        ]);
        assert_eq!(body_at_point(&registry, Vec2::new(5.5, 5.5), false), Some(handles[0]));
        // Inside the bounding box, outside the circle.
        assert_eq!(body_at_point(&registry, Vec2::new(6.9, 6.9), false), None);
    }
}
