use serde::{Deserialize, Serialize};

use super::rotation::Rotation;
use super::vector::Vec3;
use crate::Tolerance;

/// A rigid transform: rotate about the origin, then translate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub rotation: Rotation,
    pub translation: Vec3,
}

/// The rigid transform handed to the renderer for a placed attachment.
pub type Placement = Transform;

impl Transform {
    pub fn identity() -> Self {
        Self {
            rotation: Rotation::identity(),
            translation: Vec3::ZERO,
        }
    }

    pub fn new(rotation: Rotation, translation: Vec3) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    pub fn from_rotation(rotation: Rotation) -> Self {
        Self::new(rotation, Vec3::ZERO)
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self::new(Rotation::identity(), translation)
    }

    /// Transform a point (applies translation).
    pub fn apply_point(&self, p: Vec3) -> Vec3 {
        self.rotation.apply(p) + self.translation
    }

    /// Transform a direction (no translation).
    pub fn apply_vector(&self, v: Vec3) -> Vec3 {
        self.rotation.apply(v)
    }

    /// Composite transform: apply `self` first, then `next`.
    pub fn then(&self, next: &Transform) -> Transform {
        Transform {
            rotation: self.rotation.then(&next.rotation),
            translation: next.rotation.apply(self.translation) + next.translation,
        }
    }

    pub fn inverse(&self) -> Transform {
        let inv = self.rotation.inverse();
        Transform {
            rotation: inv,
            translation: -inv.apply(self.translation),
        }
    }

    /// Equal within `tol.linear` on translation and `tol.angular` on rotation.
    pub fn approx_eq(&self, other: &Transform, tol: &Tolerance) -> bool {
        (self.translation - other.translation).length() <= tol.linear
            && self.rotation.angle_to(&other.rotation) <= tol.angular
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}
