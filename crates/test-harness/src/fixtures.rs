//! Canned descriptors: a carriage base and one attachment per slot it exposes.
//!
//! Coordinates are chosen so that every placement lands on round numbers.

use mount_kernel::Vec3;
use mount_types::{Category, GeometryDescriptor};

use crate::helpers::{rect_holes, DescriptorBuilder};

pub const CARRIAGE: &str = "carriage/Core";
pub const HOTEND: &str = "hotend/Dragon";
pub const PROBE: &str = "probe/BLTouch";
pub const ODD_PROBE: &str = "probe/Odd";
pub const SKIRT: &str = "skirt/Stock";
pub const FAN_GUARD: &str = "fanguard/Mesh";
pub const WING_LEFT: &str = "wing/Wing_left";
pub const WING_RIGHT: &str = "wing/Wing_right";
pub const SINGLE_DUCT: &str = "partcooling/Duct_left";
pub const DUAL_DUCT: &str = "partcooling/Dual";
pub const DIRECT_DRIVE: &str = "directdrive/Orbiter";

/// Base part.
///
/// | slot | feature | pattern |
/// |---|---|---|
/// | `hotend` | face 1, +Z | (-10,0,0) (10,0,0) |
/// | `probe` | face 2, +Z | (0,30,0) (20,30,0) |
/// | `skirt` | face 3, +Z | 30 x 20 rectangle from (40,0,0) |
/// | `wing` | face 4, +X | (80,0,0) (80,10,0) |
/// | `wing_opposite` | face 5, -X | (-80,0,0) (-80,10,0) |
/// | `directdrive` | face 6, +Z | 20 x 10 rectangle centred on (0,-25,0) |
/// | `partcooling` | duct at x = -30 | gap 10 |
/// | `partcooling_opposite` | duct at x = 30 | gap 10 |
pub fn carriage() -> GeometryDescriptor {
    DescriptorBuilder::new()
        .slot(1, Vec3::Z, Category::Hotend, &[[-10.0, 0.0, 0.0], [10.0, 0.0, 0.0]])
        .slot(2, Vec3::Z, Category::Probe, &[[0.0, 30.0, 0.0], [20.0, 30.0, 0.0]])
        .slot(3, Vec3::Z, Category::Skirt, &rect_holes(40.0, 0.0, 0.0, 30.0, 20.0))
        .slot(4, Vec3::X, Category::Wing, &[[80.0, 0.0, 0.0], [80.0, 10.0, 0.0]])
        .slot(5, -Vec3::X, Category::Wing, &[[-80.0, 0.0, 0.0], [-80.0, 10.0, 0.0]])
        .slot(6, Vec3::Z, Category::DirectDrive, &rect_holes(-10.0, -30.0, 0.0, 20.0, 10.0))
        .duct(-30.0, 10.0)
        .duct(30.0, 10.0)
        .build()
}

pub fn hotend() -> GeometryDescriptor {
    DescriptorBuilder::new()
        .mating(7, -Vec3::Z, &[[-10.0, 0.0, 0.0], [10.0, 0.0, 0.0]])
        .build()
}

pub fn probe() -> GeometryDescriptor {
    DescriptorBuilder::new()
        .mating(1, -Vec3::Z, &[[0.0, 0.0, 0.0], [20.0, 0.0, 0.0]])
        .build()
}

/// Three holes: never matches a two-hole slot.
pub fn odd_probe() -> GeometryDescriptor {
    DescriptorBuilder::new()
        .mating(1, -Vec3::Z, &[[0.0, 0.0, 0.0], [20.0, 0.0, 0.0], [10.0, 15.0, 0.0]])
        .build()
}

/// Skirt carrying a `fanguard` slot 5 above its mounting face.
pub fn skirt() -> GeometryDescriptor {
    DescriptorBuilder::new()
        .mating(1, -Vec3::Z, &rect_holes(0.0, 0.0, 0.0, 30.0, 20.0))
        .slot(2, Vec3::Z, Category::FanGuard, &[[0.0, 0.0, 5.0], [30.0, 0.0, 5.0]])
        .build()
}

pub fn fan_guard() -> GeometryDescriptor {
    DescriptorBuilder::new()
        .mating(1, -Vec3::Z, &[[0.0, 0.0, 0.0], [30.0, 0.0, 0.0]])
        .build()
}

pub fn wing() -> GeometryDescriptor {
    DescriptorBuilder::new()
        .mating(1, -Vec3::X, &[[0.0, 0.0, 0.0], [0.0, 10.0, 0.0]])
        .build()
}

pub fn single_duct() -> GeometryDescriptor {
    DescriptorBuilder::new().duct(0.0, 10.0).build()
}

/// Two channels 60 apart, spanning both carriage ducts.
pub fn dual_duct() -> GeometryDescriptor {
    DescriptorBuilder::new().duct(-30.0, 10.5).duct(30.0, 9.5).build()
}

pub fn direct_drive() -> GeometryDescriptor {
    DescriptorBuilder::new()
        .mating(1, -Vec3::Z, &rect_holes(-10.0, -5.0, 0.0, 20.0, 10.0))
        .build()
}

/// Every fixture attachment under its model id.
pub fn attachments() -> Vec<(&'static str, GeometryDescriptor)> {
    vec![
        (HOTEND, hotend()),
        (PROBE, probe()),
        (ODD_PROBE, odd_probe()),
        (SKIRT, skirt()),
        (FAN_GUARD, fan_guard()),
        (WING_LEFT, wing()),
        (WING_RIGHT, wing()),
        (SINGLE_DUCT, single_duct()),
        (DUAL_DUCT, dual_duct()),
        (DIRECT_DRIVE, direct_drive()),
    ]
}
