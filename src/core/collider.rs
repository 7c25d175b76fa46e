use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{PhysicsError, Result};
use crate::utils::math::{cross, EPSILON};

/// Local-space geometry attached to a body. Vertices are relative to the body origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Circle { radius: f32 },
    /// Convex polygon, either winding.
    Polygon { vertices: Vec<Vec2> },
}

impl Shape {
    pub fn circle(radius: f32) -> Self {
        Shape::Circle { radius }
    }

    /// Axis-aligned box centred on the body origin.
    pub fn cuboid(half_extents: Vec2) -> Self {
        let Vec2 { x, y } = half_extents;
        Shape::Polygon {
            vertices: vec![
                Vec2::new(-x, -y),
                Vec2::new(x, -y),
                Vec2::new(x, y),
                Vec2::new(-x, y),
            ],
        }
    }

    pub fn polygon(vertices: Vec<Vec2>) -> Self {
        Shape::Polygon { vertices }
    }

    /// Signed shoelace sum over the polygon edges; positive for counter-clockwise.
    pub(crate) fn signed_double_area(vertices: &[Vec2]) -> f32 {
        (0..vertices.len())
            .map(|i| cross(vertices[i], vertices[(i + 1) % vertices.len()]))
            .sum()
    }

    pub fn area(&self) -> f32 {
        match self {
            Shape::Circle { radius } => std::f32::consts::PI * radius * radius,
            Shape::Polygon { vertices } => {
                if vertices.len() < 3 {
                    return 0.0;
                }
                Self::signed_double_area(vertices).abs() * 0.5
            }
        }
    }

    /// Moment of inertia about the body origin for the given total mass.
    pub fn inertia(&self, mass: f32) -> f32 {
        match self {
            Shape::Circle { radius } => 0.5 * mass * radius * radius,
            Shape::Polygon { vertices } => {
                let mut numerator = 0.0;
                let mut denominator = 0.0;
                for i in 0..vertices.len() {
                    let p0 = vertices[i];
                    let p1 = vertices[(i + 1) % vertices.len()];
                    let weight = cross(p0, p1).abs();
                    numerator += weight * (p0.dot(p0) + p0.dot(p1) + p1.dot(p1));
                    denominator += weight;
                }
                if denominator < EPSILON {
                    return 0.0;
                }
                mass * numerator / (6.0 * denominator)
            }
        }
    }

    /// Area centroid in body space. Circles are centred on the body origin.
    pub fn centroid(&self) -> Vec2 {
        match self {
            Shape::Circle { .. } => Vec2::ZERO,
            Shape::Polygon { vertices } => polygon_centroid(vertices),
        }
    }

    /// Radius of the smallest centroid-centred circle enclosing the shape.
    pub fn bounding_radius(&self) -> f32 {
        match self {
            Shape::Circle { radius } => *radius,
            Shape::Polygon { vertices } => {
                let centroid = polygon_centroid(vertices);
                vertices
                    .iter()
                    .map(|v| v.distance(centroid))
                    .fold(0.0, f32::max)
            }
        }
    }

    /// Checks that the shape can take part in intersection tests.
    pub fn validate(&self) -> Result<()> {
        match self {
            Shape::Circle { radius } => {
                if !(*radius > 0.0 && radius.is_finite()) {
                    return Err(PhysicsError::DegenerateShape("circle radius must be positive"));
                }
            }
            Shape::Polygon { vertices } => {
                if vertices.len() < 3 {
                    return Err(PhysicsError::DegenerateShape(
                        "polygon needs at least three vertices",
                    ));
                }
                let n = vertices.len();
                let mut sign = 0.0f32;
                for i in 0..n {
                    let edge = vertices[(i + 1) % n] - vertices[i];
                    let next = vertices[(i + 2) % n] - vertices[(i + 1) % n];
                    let turn = cross(edge, next);
                    if turn.abs() < EPSILON {
                        continue;
                    }
                    if sign != 0.0 && turn.signum() != sign {
                        return Err(PhysicsError::DegenerateShape("polygon must be convex"));
                    }
                    sign = turn.signum();
                }
                if self.area() < EPSILON {
                    return Err(PhysicsError::DegenerateShape("polygon has zero area"));
                }
            }
        }
        Ok(())
    }
}

/// Area centroid of a simple polygon; falls back to the vertex mean when the area vanishes.
pub(crate) fn polygon_centroid(vertices: &[Vec2]) -> Vec2 {
    if vertices.is_empty() {
        return Vec2::ZERO;
    }
    let n = vertices.len();
    let double_area = Shape::signed_double_area(vertices);
    if double_area.abs() < EPSILON {
        return vertices.iter().copied().sum::<Vec2>() / n as f32;
    }
    let weighted: Vec2 = (0..n)
        .map(|i| {
            let (p0, p1) = (vertices[i], vertices[(i + 1) % n]);
            (p0 + p1) * cross(p0, p1)
        })
        .sum();
    weighted / (3.0 * double_area)
}
