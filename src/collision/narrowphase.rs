//! Exact pairwise intersection tests on posed shapes.
//!
//! Every MTV returned here separates A from B: moving A by `mtv` (or B by
//! `-mtv`) removes the overlap.

use glam::Vec2;

use super::shapes::{edge_crossings_centroid, PolygonInstance, ShapeGeometry, ShapeInstance};
use crate::utils::math::{normalize_or, EPSILON};

/// Result of a positive exact intersection test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub mtv: Vec2,
    pub point: Vec2,
}

impl Contact {
    pub fn normal(&self) -> Vec2 {
        self.mtv.normalize_or_zero()
    }

    fn flipped(self) -> Self {
        Self {
            mtv: -self.mtv,
            point: self.point,
        }
    }
}

/// Bounding-circle early-out: false when `(ra + rb)^2 < |ca - cb|^2`.
#[inline]
pub fn bounding_circles_overlap(a: &ShapeInstance, b: &ShapeInstance) -> bool {
    let sum = a.bounding_radius + b.bounding_radius;
    sum * sum >= a.center.distance_squared(b.center)
}

/// Both cheap rejection stages of the narrow phase.
#[inline]
pub fn passes_prefilter(a: &ShapeInstance, b: &ShapeInstance) -> bool {
    bounding_circles_overlap(a, b) && a.aabb.overlaps(&b.aabb)
}

/// Boolean overlap test, used against triggers.
pub fn overlaps(a: &ShapeInstance, b: &ShapeInstance) -> bool {
    match (&a.geometry, &b.geometry) {
        (ShapeGeometry::Circle { radius: ra }, ShapeGeometry::Circle { radius: rb }) => {
            let sum = ra + rb;
            a.center.distance_squared(b.center) < sum * sum
        }
        _ => least_penetration(a, b).is_some(),
    }
}

/// Exact intersection yielding the MTV and a contact point.
pub fn intersect(a: &ShapeInstance, b: &ShapeInstance) -> Option<Contact> {
    match (&a.geometry, &b.geometry) {
        (ShapeGeometry::Circle { radius: ra }, ShapeGeometry::Circle { radius: rb }) => {
            circle_circle(a.center, *ra, b.center, *rb)
        }
        (ShapeGeometry::Polygon(_), ShapeGeometry::Circle { radius }) => {
            polygon_circle(a, b.center, *radius)
        }
        (ShapeGeometry::Circle { radius }, ShapeGeometry::Polygon(_)) => {
            polygon_circle(b, a.center, *radius).map(Contact::flipped)
        }
        (ShapeGeometry::Polygon(poly_a), ShapeGeometry::Polygon(poly_b)) => {
            polygon_polygon(a, poly_a, b, poly_b)
        }
    }
}

fn circle_circle(center_a: Vec2, radius_a: f32, center_b: Vec2, radius_b: f32) -> Option<Contact> {
    let delta = center_a - center_b;
    let distance = delta.length();
    let overlap = radius_a + radius_b - distance;
    if overlap <= EPSILON {
        return None;
    }
    let direction = normalize_or(delta, Vec2::Y);
    Some(Contact {
        mtv: direction * overlap,
        point: center_b + direction * (radius_b - overlap * 0.5),
    })
}

fn polygon_circle(polygon: &ShapeInstance, circle_center: Vec2, radius: f32) -> Option<Contact> {
    let circle = ShapeInstance::circle(circle_center, radius);
    let (mtv, overlap) = least_penetration(polygon, &circle)?;
    let direction = mtv / overlap;
    Some(Contact {
        mtv,
        point: circle_center + direction * (radius - overlap * 0.5),
    })
}

fn polygon_polygon(
    a: &ShapeInstance,
    poly_a: &PolygonInstance,
    b: &ShapeInstance,
    poly_b: &PolygonInstance,
) -> Option<Contact> {
    let (mtv, _) = least_penetration(a, b)?;
    let point = edge_crossings_centroid(poly_a, poly_b)
        .or_else(|| contained_vertices_centroid(poly_a, b, poly_b, a))
        .unwrap_or((a.center + b.center) * 0.5);
    Some(Contact { mtv, point })
}

/// Average of the vertices of either polygon lying inside the other.
fn contained_vertices_centroid(
    poly_a: &PolygonInstance,
    b: &ShapeInstance,
    poly_b: &PolygonInstance,
    a: &ShapeInstance,
) -> Option<Vec2> {
    let inside: Vec<Vec2> = poly_a
        .vertices
        .iter()
        .filter(|v| b.contains_point(**v))
        .chain(poly_b.vertices.iter().filter(|v| a.contains_point(**v)))
        .copied()
        .collect();
    if inside.is_empty() {
        return None;
    }
    Some(inside.iter().copied().sum::<Vec2>() / inside.len() as f32)
}

/// Candidate separating axes for a pair that contains at least one polygon.
fn separating_axes(a: &ShapeInstance, b: &ShapeInstance) -> Vec<Vec2> {
    let mut axes = Vec::new();
    for (shape, other) in [(a, b), (b, a)] {
        match &shape.geometry {
            ShapeGeometry::Polygon(poly) => axes.extend_from_slice(&poly.normals),
            ShapeGeometry::Circle { .. } => {
                if let ShapeGeometry::Polygon(poly) = &other.geometry {
                    let closest = poly
                        .vertices
                        .iter()
                        .copied()
                        .min_by(|p, q| {
                            p.distance_squared(shape.center)
                                .total_cmp(&q.distance_squared(shape.center))
                        })
                        .unwrap_or(other.center);
                    axes.push(normalize_or(shape.center - closest, Vec2::X));
                }
            }
        }
    }
    axes
}

/// Separating-axis test. Returns the MTV (oriented from B towards A) and its length,
/// or `None` as soon as an axis separates the shapes.
fn least_penetration(a: &ShapeInstance, b: &ShapeInstance) -> Option<(Vec2, f32)> {
    let mut best_axis = Vec2::ZERO;
    let mut best_overlap = f32::MAX;

    for axis in separating_axes(a, b) {
        let (min_a, max_a) = a.project(axis);
        let (min_b, max_b) = b.project(axis);
        let overlap = max_a.min(max_b) - min_a.max(min_b);
        if overlap <= EPSILON {
            return None;
        }
        if overlap < best_overlap {
            best_overlap = overlap;
            best_axis = axis;
        }
    }

    if best_overlap == f32::MAX {
        return None;
    }

    if best_axis.dot(a.center - b.center) < 0.0 {
        best_axis = -best_axis;
    }
    Some((best_axis * best_overlap, best_overlap))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{collider::Shape, types::Transform2D};
    use approx::assert_abs_diff_eq;

    fn posed(shape: Shape, x: f32, y: f32) -> ShapeInstance {
        ShapeInstance::prepare(&shape, &Transform2D::from_position(Vec2::new(x, y)))
    }

    #[test]
    fn circle_mtv_points_from_b_to_a() {
        let a = posed(Shape::circle(1.0), 0.0, 0.0);
        let b = posed(Shape::circle(1.0), 1.5, 0.0);
        let contact = intersect(&a, &b).expect("circles overlap");
        assert_abs_diff_eq!(contact.mtv.x, -0.5, epsilon = 1e-5);
        assert_abs_diff_eq!(contact.mtv.y, 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(contact.point.x, 0.75, epsilon = 1e-5);
    }

    #[test]
    fn touching_circles_do_not_intersect() {
        let a = posed(Shape::circle(1.0), 0.0, 0.0);
        let b = posed(Shape::circle(1.0), 2.0, 0.0);
        assert!(intersect(&a, &b).is_none());
        assert!(!overlaps(&a, &b));
    }

    #[test]
    fn box_on_box_picks_shallow_axis() {
        let a = posed(Shape::cuboid(Vec2::splat(15.0)), 0.0, 0.0);
        let floor = posed(Shape::cuboid(Vec2::new(200.0, 10.0)), 0.0, 22.0);
        let contact = intersect(&a, &floor).expect("box sinks into floor");
        assert_abs_diff_eq!(contact.mtv.x, 0.0, epsilon = 1e-4);
        assert_abs_diff_eq!(contact.mtv.y, -3.0, epsilon = 1e-4);
        assert_abs_diff_eq!(contact.point.y, 12.0, epsilon = 1e-4);
    }

    #[test]
    fn polygon_circle_orientation_flips_with_argument_order() {
        let square = posed(Shape::cuboid(Vec2::splat(1.0)), 0.0, 0.0);
        let ball = posed(Shape::circle(1.0), 1.5, 0.0);

        let square_first = intersect(&square, &ball).expect("overlap");
        let ball_first = intersect(&ball, &square).expect("overlap");
        assert_abs_diff_eq!(square_first.mtv.x, -0.5, epsilon = 1e-4);
        assert_abs_diff_eq!(ball_first.mtv.x, 0.5, epsilon = 1e-4);
        assert_abs_diff_eq!(square_first.point.x, 0.75, epsilon = 1e-4);
    }

    #[test]
    fn corner_circle_uses_vertex_axis() {
        let square = posed(Shape::cuboid(Vec2::splat(1.0)), 0.0, 0.0);
        // Diagonal distance to the corner is ~0.707, inside the unit radius.
        let ball = posed(Shape::circle(1.0), 1.5, 1.5);
        assert!(overlaps(&square, &ball));

        let far_ball = posed(Shape::circle(0.6), 1.5, 1.5);
        assert!(!overlaps(&square, &far_ball));
        assert!(intersect(&square, &far_ball).is_none());
    }

    #[test]
    fn prefilter_rejects_distant_shapes() {
        let a = posed(Shape::circle(1.0), 0.0, 0.0);
        let b = posed(Shape::cuboid(Vec2::splat(1.0)), 10.0, 0.0);
        assert!(!passes_prefilter(&a, &b));
    }

    #[test]
    fn offset_polygon_pushes_circle_away_from_its_centroid() {
        let offset = Shape::polygon(vec![
            Vec2::new(10.0, -1.0),
            Vec2::new(12.0, -1.0),
            Vec2::new(12.0, 1.0),
            Vec2::new(10.0, 1.0),
        ]);
        let square = posed(offset, 0.0, 0.0);
        let ball = posed(Shape::circle(1.0), 9.5, 0.0);
        assert!(passes_prefilter(&ball, &square));

        let contact = intersect(&ball, &square).expect("ball overlaps the square");
        assert_abs_diff_eq!(contact.mtv.x, -0.5, epsilon = 1e-4);
        assert_abs_diff_eq!(contact.mtv.y, 0.0, epsilon = 1e-4);
    }
}
