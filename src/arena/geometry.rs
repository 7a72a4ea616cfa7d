//! Horizontal-plane geometry helpers.
//!
//! Positions are full `Vec3`s (y is kept for the presentation layer) but all
//! combat geometry (range, line of sight, collision) works on the XZ plane.

use bevy::math::{Vec2, Vec3};

/// Project a position onto the XZ plane.
#[inline]
pub fn flat(v: Vec3) -> Vec2 {
    Vec2::new(v.x, v.z)
}

/// Distance between two positions ignoring height.
#[inline]
pub fn horizontal_distance(a: Vec3, b: Vec3) -> f32 {
    flat(a).distance(flat(b))
}

/// Unit direction from `from` to `to` in the horizontal plane (zero if coincident).
pub fn horizontal_direction(from: Vec3, to: Vec3) -> Vec3 {
    Vec3::new(to.x - from.x, 0.0, to.z - from.z).normalize_or_zero()
}

/// Closed-form segment/circle test on the XZ plane.
///
/// Returns true when the segment `a -> b` passes within `radius` of `center`.
pub fn segment_intersects_circle(a: Vec3, b: Vec3, center: Vec3, radius: f32) -> bool {
    let (a, b, c) = (flat(a), flat(b), flat(center));
    let d = b - a;
    let len_sq = d.length_squared();
    let t = if len_sq <= f32::EPSILON {
        0.0
    } else {
        ((c - a).dot(d) / len_sq).clamp(0.0, 1.0)
    };
    let closest = a + d * t;
    closest.distance_squared(c) < radius * radius
}

/// Rotate a horizontal direction by `angle` radians around the Y axis.
pub fn rotate_horizontal(dir: Vec3, angle: f32) -> Vec3 {
    let (sin, cos) = angle.sin_cos();
    Vec3::new(dir.x * cos - dir.z * sin, 0.0, dir.x * sin + dir.z * cos)
}
