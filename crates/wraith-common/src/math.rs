//! Math helpers shared by the combat core.
//!
//! Vectors are `glam` types. The core never integrates positions; these
//! helpers only shape directions and blend scalars.

pub use glam::{Vec2, Vec3};

/// World up axis.
pub const UP: Vec3 = Vec3::Y;

/// Projects a vector onto the ground plane and normalizes it.
///
/// Returns `Vec3::ZERO` for vectors that are (nearly) vertical or zero.
#[must_use]
pub fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z).normalize_or_zero()
}

/// Planar distance between two points, ignoring height.
#[must_use]
pub fn planar_distance(a: Vec3, b: Vec3) -> f32 {
    let d = b - a;
    (d.x * d.x + d.z * d.z).sqrt()
}

/// Converts a 2D stick/WASD axis into a world direction relative to a camera.
///
/// `camera_forward` is flattened first, so pitch never leaks into movement.
#[must_use]
pub fn camera_relative(axis: Vec2, camera_forward: Vec3) -> Vec3 {
    let forward = flatten(camera_forward);
    if forward == Vec3::ZERO {
        return Vec3::new(axis.x, 0.0, axis.y).normalize_or_zero();
    }
    let right = UP.cross(forward);
    (right * axis.x + forward * axis.y).normalize_or_zero()
}

/// Rotates `from` toward `to` on the ground plane by at most `t` (0-1) of the arc.
#[must_use]
pub fn slerp_facing(from: Vec3, to: Vec3, t: f32) -> Vec3 {
    let a = flatten(from);
    let b = flatten(to);
    if a == Vec3::ZERO {
        return b;
    }
    if b == Vec3::ZERO {
        return a;
    }
    let t = t.clamp(0.0, 1.0);
    let blended = a.lerp(b, t);
    if blended.length_squared() < 1e-6 {
        // Opposite directions have no stable blend; snap to the nearer end.
        return if t < 0.5 { a } else { b };
    }
    blended.normalize()
}
