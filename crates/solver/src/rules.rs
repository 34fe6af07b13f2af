//! Per-category matching and alignment conventions.

use mount_types::Category;

use crate::holes::RotationSet;

/// Which direction an attachment's orientation vector is turned towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrientationTarget {
    /// The configured world up direction.
    WorldUp,
    /// The owning part's orientation vector, already in the owner's frame.
    BaseOrientation,
}

/// Extra rotation applied after the flip correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correction {
    None,
    /// Quarter-turn snap about the mount normal onto the nearest principal axis.
    SnapToAxis,
    /// Half turn about the attachment's local Z axis.
    HalfTurnLocalZ,
    /// Keep the owner's frame and only apply the flip correction.
    ///
    /// No translation is applied. The flip is a half turn about the base
    /// normal through the owner's origin, not through the mated pattern's
    /// centre, so a flipped part lands mirrored across that origin.
    InheritParent,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchRule {
    pub rotations: RotationSet,
    pub mirrored: bool,
    pub required_hole_count: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentRule {
    pub orientation: OrientationTarget,
    pub flip_correction: bool,
    pub correction: Correction,
    /// Offset along the base normal added to the translation.
    pub standoff: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryRule {
    pub matching: MatchRule,
    pub alignment: AlignmentRule,
}

/// Clearance between a hot-end and its carriage face.
pub const HOTEND_STANDOFF: f64 = -0.2;

/// Gantry adapters bolt on through a four-hole rectangle.
pub const GANTRY_HOLE_COUNT: usize = 4;

pub fn rule_for(category: Category) -> CategoryRule {
    let mut matching = MatchRule {
        rotations: RotationSet::Planar,
        mirrored: false,
        required_hole_count: None,
    };
    let mut alignment = AlignmentRule {
        orientation: OrientationTarget::BaseOrientation,
        flip_correction: true,
        correction: Correction::None,
        standoff: 0.0,
    };

    match category {
        Category::Hotend => alignment.standoff = HOTEND_STANDOFF,
        Category::Gantry => {
            matching.rotations = RotationSet::Full;
            matching.required_hole_count = Some(GANTRY_HOLE_COUNT);
            alignment.orientation = OrientationTarget::WorldUp;
            alignment.correction = Correction::SnapToAxis;
        }
        Category::DirectDrive => {
            alignment.orientation = OrientationTarget::WorldUp;
            alignment.correction = Correction::HalfTurnLocalZ;
        }
        Category::Spacer => {
            matching.mirrored = true;
            alignment.correction = Correction::InheritParent;
        }
        Category::Skirt
        | Category::FanGuard
        | Category::GantryClip
        | Category::PartCooling
        | Category::Wing
        | Category::Probe
        | Category::Adxl => {}
    }

    CategoryRule { matching, alignment }
}
