pub mod vector;
pub mod rotation;
pub mod transform;

pub use rotation::{Quaternion, Rotation, RotationError, signed_angle_about};
pub use transform::{Placement, Transform};
pub use vector::Vec3;
