//! Scalar and 2D vector helpers layered on top of `glam`.

use glam::Vec2;

/// Threshold below which speeds, overlaps and denominators count as zero.
pub const EPSILON: f32 = 1e-5;

/// Returns true when `value` is within [`EPSILON`] of zero.
#[inline]
pub fn is_zero(value: f32) -> bool {
    value.abs() < EPSILON
}

/// Scalar 2D cross product `a.x * b.y - a.y * b.x`.
#[inline]
pub fn cross(a: Vec2, b: Vec2) -> f32 {
    a.perp_dot(b)
}

/// Tangential velocity produced by angular velocity `omega` at offset `r`.
#[inline]
pub fn cross_scalar(omega: f32, r: Vec2) -> Vec2 {
    Vec2::new(-omega * r.y, omega * r.x)
}

/// Velocity of a point at offset `r` from the center of a body.
#[inline]
pub fn point_velocity(linear: Vec2, angular: f32, r: Vec2) -> Vec2 {
    linear + cross_scalar(angular, r)
}

/// Normalizes `v`, falling back to `fallback` when `v` is degenerate.
#[inline]
pub fn normalize_or(v: Vec2, fallback: Vec2) -> Vec2 {
    v.try_normalize().unwrap_or(fallback)
}

/// Intersection point of segments `a0..a1` and `b0..b1`, endpoints included.
pub fn segment_intersection(a0: Vec2, a1: Vec2, b0: Vec2, b1: Vec2) -> Option<Vec2> {
    let r = a1 - a0;
    let s = b1 - b0;
    let denom = cross(r, s);
    if is_zero(denom) {
        return None;
    }
    let qp = b0 - a0;
    let t = cross(qp, s) / denom;
    let u = cross(qp, r) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(a0 + r * t)
    } else {
        None
    }
}
