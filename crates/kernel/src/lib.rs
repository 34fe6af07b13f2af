pub mod geometry;

// Re-export the primitives at crate root for convenience.
pub use geometry::{Placement, Quaternion, Rotation, RotationError, Transform, Vec3, signed_angle_about};

/// Tolerance configuration for comparing placements.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Translations closer than this are considered equal (length units).
    pub linear: f64,
    /// Rotations whose relative angle is below this (radians) are considered equal.
    pub angular: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            linear: 1e-9,
            angular: 1e-9,
        }
    }
}
