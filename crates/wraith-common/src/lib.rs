//! # Wraith Common
//!
//! Common types, utilities, and shared abstractions for Project Wraith.
//!
//! This crate provides foundational types used across all Wraith crates:
//! - ID types (EntityId)
//! - Shared error taxonomy
//! - Math re-exports and helpers
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod ids;
pub mod math;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::math::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_generation() {
        let id1 = EntityId::new();
        let id2 = EntityId::new();
        assert_ne!(id1, id2);
        assert!(id1.is_valid());
        assert!(!EntityId::NULL.is_valid());
    }

    #[test]
    fn test_missing_dependency_message() {
        let err = WraithError::missing("Ability", "gauge");
        assert_eq!(err.to_string(), "Ability requires gauge, but none was supplied");
    }

    #[test]
    fn test_flatten_drops_height() {
        let v = flatten(Vec3::new(3.0, 10.0, 4.0));
        assert!((v.length() - 1.0).abs() < 1e-5);
        assert_eq!(v.y, 0.0);
        assert_eq!(flatten(Vec3::Y), Vec3::ZERO);
    }

    #[test]
    fn test_planar_distance() {
        let d = planar_distance(Vec3::ZERO, Vec3::new(3.0, 5.0, 4.0));
        assert!((d - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_camera_relative_forward() {
        let dir = camera_relative(Vec2::new(0.0, 1.0), Vec3::new(0.0, -0.5, 1.0));
        assert!((dir - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_slerp_facing_endpoints() {
        let a = Vec3::X;
        let b = Vec3::Z;
        assert!((slerp_facing(a, b, 0.0) - a).length() < 1e-5);
        assert!((slerp_facing(a, b, 1.0) - b).length() < 1e-5);
    }
}
