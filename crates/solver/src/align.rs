//! Alignment solver: turns an accepted feature match into a rigid placement.
//!
//! All directions and points are in the owner's frame, except the attachment's
//! own normal, centre and orientation which are in the attachment's local frame.
//! The resulting [`Placement`] maps attachment-local coordinates into the owner frame.

use std::f64::consts::PI;

use mount_kernel::{Placement, Rotation, Vec3, signed_angle_about};
use mount_types::Category;
use tracing::{debug, instrument, warn};

use crate::rules::{AlignmentRule, Correction, OrientationTarget};

/// Geometry of one accepted match, ready for alignment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentInput {
    pub category: Category,
    pub base_normal: Vec3,
    pub base_center: Vec3,
    pub attach_normal: Vec3,
    pub attach_center: Vec3,
    pub base_orientation: Option<Vec3>,
    pub attach_orientation: Option<Vec3>,
    /// World up, expressed in the owner's frame.
    pub up: Vec3,
}

/// Rotate `r` further by `angle` about `axis`; logs and leaves `r` unchanged
/// if the axis is degenerate.
fn turn(r: Rotation, axis: Vec3, angle: f64) -> Rotation {
    match Rotation::about_axis(axis, angle) {
        Ok(step) => r.then(&step),
        Err(err) => {
            warn!(%err, ?axis, "skipping rotation step");
            r
        }
    }
}

/// Half turn about the base normal when the rotated orientation points below the horizon.
fn flip_if_inverted(r: Rotation, input: &AlignmentInput) -> Rotation {
    match input.attach_orientation {
        Some(o) if r.apply(o).dot(&input.up) < 0.0 => {
            debug!("orientation points down, flipping about base normal");
            turn(r, input.base_normal, PI)
        }
        _ => r,
    }
}

/// Principal axis perpendicular to `normal` closest to `v`.
fn nearest_axis(v: Vec3, normal: Vec3) -> Option<Vec3> {
    let v = v.reject_from(&normal);
    [Vec3::X, -Vec3::X, Vec3::Y, -Vec3::Y, Vec3::Z, -Vec3::Z]
        .into_iter()
        .filter(|c| c.dot(&normal).abs() < 0.5)
        .max_by(|a, b| a.dot(&v).total_cmp(&b.dot(&v)))
}

/// Compute the placement of the attachment relative to its owner.
#[instrument(skip(input, rule), fields(category = %input.category))]
pub fn compute_placement(input: &AlignmentInput, rule: &AlignmentRule) -> Placement {
    if rule.correction == Correction::InheritParent {
        let mut r = Rotation::identity();
        if rule.flip_correction {
            r = flip_if_inverted(r, input);
        }
        return Placement::from_rotation(r);
    }

    let mount_normal = -input.base_normal;
    let mut r = Rotation::between(input.attach_normal, mount_normal).unwrap_or_else(|err| {
        warn!(%err, "normals unusable, keeping identity rotation");
        Rotation::identity()
    });

    if let Some(o) = input.attach_orientation {
        let target = match rule.orientation {
            OrientationTarget::WorldUp => input.up,
            OrientationTarget::BaseOrientation => input.base_orientation.unwrap_or(input.up),
        };
        if let Some(angle) = signed_angle_about(r.apply(o), target, mount_normal) {
            r = turn(r, mount_normal, angle);
        }
    }

    if rule.flip_correction {
        r = flip_if_inverted(r, input);
    }

    match rule.correction {
        Correction::SnapToAxis => {
            if let Some(o) = input.attach_orientation {
                let rotated = r.apply(o);
                let snapped = nearest_axis(rotated, mount_normal)
                    .and_then(|axis| signed_angle_about(rotated, axis, mount_normal));
                if let Some(angle) = snapped {
                    r = turn(r, mount_normal, angle);
                }
            }
        }
        Correction::HalfTurnLocalZ => r = Rotation::about_z(PI).then(&r),
        Correction::None | Correction::InheritParent => {}
    }

    let translation = input.base_center - r.apply(input.attach_center) + input.base_normal * rule.standoff;
    debug!(?translation, angle = r.angle(), "placement computed");
    Placement::new(r, translation)
}
