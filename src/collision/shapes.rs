use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::core::{collider::Shape, types::Transform2D};
use crate::utils::math::{normalize_or, segment_intersection};

/// World-space axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Default for Aabb {
    fn default() -> Self {
        Self {
            min: Vec2::ZERO,
            max: Vec2::ZERO,
        }
    }
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn from_center_half_extents(center: Vec2, half_extents: Vec2) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    pub fn from_points(points: &[Vec2]) -> Self {
        let mut min = Vec2::splat(f32::MAX);
        let mut max = Vec2::splat(f32::MIN);
        for point in points {
            min = min.min(*point);
            max = max.max(*point);
        }
        Self { min, max }
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        !(self.max.x < other.min.x
            || self.min.x > other.max.x
            || self.max.y < other.min.y
            || self.min.y > other.max.y)
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb::new(self.min.min(other.min), self.max.max(other.max))
    }
}

/// Geometry of a posed polygon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolygonInstance {
    pub vertices: Vec<Vec2>,
    /// Outward unit normal of the edge starting at the vertex with the same index.
    pub normals: Vec<Vec2>,
}

impl PolygonInstance {
    pub fn edges(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }
}

/// World-space posed geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShapeGeometry {
    Circle { radius: f32 },
    Polygon(PolygonInstance),
}

/// A shape transformed into world space, ready for intersection tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeInstance {
    /// World-space area centroid; the body position for circles.
    pub center: Vec2,
    pub bounding_radius: f32,
    pub aabb: Aabb,
    pub geometry: ShapeGeometry,
}

impl ShapeInstance {
    /// Poses `shape` with `transform`.
    pub fn prepare(shape: &Shape, transform: &Transform2D) -> Self {
        match shape {
            Shape::Circle { radius } => Self::circle(transform.position, *radius),
            Shape::Polygon { vertices } => {
                let affine = transform.to_affine();
                let world: Vec<Vec2> = vertices.iter().map(|v| affine.transform_point2(*v)).collect();
                // Rigid transforms keep the winding, so its sign fixes the outward side.
                let winding = if Shape::signed_double_area(&world) < 0.0 { -1.0 } else { 1.0 };
                let n = world.len();
                let normals = (0..n)
                    .map(|i| {
                        let edge = world[(i + 1) % n] - world[i];
                        normalize_or(Vec2::new(edge.y, -edge.x) * winding, Vec2::X)
                    })
                    .collect();
                Self {
                    center: affine.transform_point2(shape.centroid()),
                    bounding_radius: shape.bounding_radius(),
                    aabb: Aabb::from_points(&world),
                    geometry: ShapeGeometry::Polygon(PolygonInstance {
                        vertices: world,
                        normals,
                    }),
                }
            }
        }
    }

    /// A free-standing world-space circle, used by proximity queries.
    pub fn circle(center: Vec2, radius: f32) -> Self {
        Self {
            center,
            bounding_radius: radius,
            aabb: Aabb::from_center_half_extents(center, Vec2::splat(radius)),
            geometry: ShapeGeometry::Circle { radius },
        }
    }

    /// Projects the shape onto `axis`, returning `(min, max)`.
    pub fn project(&self, axis: Vec2) -> (f32, f32) {
        match &self.geometry {
            ShapeGeometry::Circle { radius } => {
                let c = self.center.dot(axis);
                (c - radius, c + radius)
            }
            ShapeGeometry::Polygon(polygon) => polygon.vertices.iter().fold(
                (f32::MAX, f32::MIN),
                |(min, max), v| {
                    let d = v.dot(axis);
                    (min.min(d), max.max(d))
                },
            ),
        }
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        match &self.geometry {
            ShapeGeometry::Circle { radius } => self.center.distance_squared(point) <= radius * radius,
            ShapeGeometry::Polygon(polygon) => polygon
                .vertices
                .iter()
                .zip(&polygon.normals)
                .all(|(vertex, normal)| normal.dot(point - *vertex) <= 0.0),
        }
    }

    /// Nearest intersection of the segment `origin + direction * t`, `t` in `0..=max_distance`.
    /// Returns `(distance, point, outward normal)`.
    pub fn ray_intersection(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
    ) -> Option<(f32, Vec2, Vec2)> {
        match &self.geometry {
            ShapeGeometry::Circle { radius } => {
                let oc = origin - self.center;
                let b = oc.dot(direction);
                let c = oc.length_squared() - radius * radius;
                let discriminant = b * b - c;
                if discriminant < 0.0 {
                    return None;
                }
                let root = discriminant.sqrt();
                // Origins inside the circle report the exit point.
                let t = if -b - root >= 0.0 { -b - root } else { -b + root };
                if t < 0.0 || t > max_distance {
                    return None;
                }
                let point = origin + direction * t;
                Some((t, point, normalize_or(point - self.center, -direction)))
            }
            ShapeGeometry::Polygon(polygon) => {
                let end = origin + direction * max_distance;
                polygon
                    .edges()
                    .zip(&polygon.normals)
                    .filter_map(|((p0, p1), normal)| {
                        let point = segment_intersection(origin, end, p0, p1)?;
                        Some((origin.distance(point), point, *normal))
                    })
                    .min_by(|a, b| a.0.total_cmp(&b.0))
            }
        }
    }

    pub fn is_circle(&self) -> bool {
        matches!(self.geometry, ShapeGeometry::Circle { .. })
    }
}

/// Average of all crossing points between the edges of two polygons.
pub(crate) fn edge_crossings_centroid(a: &PolygonInstance, b: &PolygonInstance) -> Option<Vec2> {
    let mut sum = Vec2::ZERO;
    let mut count = 0u32;
    for (a0, a1) in a.edges() {
        for (b0, b1) in b.edges() {
            if let Some(point) = segment_intersection(a0, a1, b0, b1) {
                sum += point;
                count += 1;
            }
        }
    }
    if count == 0 {
        None
    } else {
        Some(sum / count as f32)
    }
}
