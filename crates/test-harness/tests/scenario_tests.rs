//! End-to-end assembly scenarios driven through the harness.

use approx::assert_relative_eq;
use mount_kernel::Vec3;
use mount_session::{PlacementError, SessionConfig};
use mount_types::{Category, FeatureRef, ModelId, PartKey};
use test_harness::fixtures::*;
use test_harness::{AssemblyBuilder, DescriptorBuilder, HarnessError};

const TOL: f64 = 1e-6;

fn carriage() -> AssemblyBuilder {
    AssemblyBuilder::carriage().unwrap().with_auto_check()
}

// ── Single Placements ───────────────────────────────────────────────────

#[test]
fn probe_on_bare_plate_needs_no_motion() {
    let plate = DescriptorBuilder::new()
        .slot(1, Vec3::Z, Category::Probe, &[[0.0, 0.0, 0.0], [20.0, 0.0, 0.0]])
        .build();
    let mut m = AssemblyBuilder::new("base/Plate", plate, SessionConfig::default()).unwrap();
    m.register(
        "probe/Plain",
        DescriptorBuilder::new()
            .mating(1, -Vec3::Z, &[[0.0, 0.0, 0.0], [20.0, 0.0, 0.0]])
            .build(),
    )
    .unwrap();

    m.attach("probe", "probe", "probe/Plain").unwrap();

    let part = m.part("probe").unwrap();
    assert_relative_eq!(part.score, 1.0);
    assert!(part.transform.rotation.angle() < 1e-9);
    assert!(part.transform.translation.length() < 1e-9);
    let ledger = m.session.ledger();
    assert!(ledger.is_used(&PartKey::base(), FeatureRef::Face(1)));
    assert!(ledger.is_used(&part.key, FeatureRef::Face(1)));
    assert!(m.open_points(None).unwrap().is_empty());
    m.assert_consistent().unwrap();
}

#[test]
fn hotend_sits_on_standoff() {
    let mut m = carriage();
    m.attach("hotend", "hotend", HOTEND).unwrap();
    m.assert_translation("hotend", [0.0, 0.0, -0.2], TOL).unwrap();
}

#[test]
fn wings_mount_on_both_sides() {
    let mut m = carriage();
    m.attach("left", "wing", WING_LEFT).unwrap();
    m.attach("right", "wing_opposite", WING_RIGHT).unwrap();

    m.assert_translation("left", [80.0, 0.0, 0.0], TOL).unwrap();
    m.assert_translation("right", [-80.0, 0.0, 0.0], TOL).unwrap();
    // The right wing is turned half way round so its face points at the carriage.
    let right = m.part("right").unwrap();
    assert_relative_eq!(right.transform.apply_vector(-Vec3::X).x, 1.0, epsilon = TOL);
    assert_relative_eq!(right.transform.apply_vector(Vec3::Y).y, 1.0, epsilon = TOL);
}

#[test]
fn direct_drive_turned_about_its_own_axis() {
    let mut m = carriage();
    m.attach("extruder", "directdrive", DIRECT_DRIVE).unwrap();
    m.assert_translation("extruder", [0.0, -25.0, 0.0], TOL).unwrap();
    let part = m.part("extruder").unwrap();
    assert_relative_eq!(part.transform.rotation.angle(), std::f64::consts::PI, epsilon = TOL);
}

#[test]
fn single_duct_takes_the_named_side() {
    let mut m = carriage();
    m.attach("duct", "partcooling_opposite", SINGLE_DUCT).unwrap();

    m.assert_translation("duct", [30.0, 0.0, 0.0], TOL).unwrap();
    let ledger = m.session.ledger();
    assert!(ledger.is_used(&PartKey::base(), FeatureRef::SlideGroup(1)));
    assert!(!ledger.is_used(&PartKey::base(), FeatureRef::SlideGroup(0)));
    assert_eq!(m.open_points(None).unwrap().iter().filter(|p| p.starts_with("partcooling")).count(), 1);
}

#[test]
fn dual_duct_consumes_both_channels() {
    let mut m = carriage();
    m.attach("ducts", "partcooling", DUAL_DUCT).unwrap();

    m.assert_translation("ducts", [0.0, 0.0, 0.0], TOL).unwrap();
    let open = m.open_points(None).unwrap();
    assert!(!open.iter().any(|p| p.starts_with("partcooling")), "{open:?}");
    assert_eq!(m.part("ducts").unwrap().own_features.len(), 2);
}

#[test]
fn missing_descriptor_falls_back_to_placeholder() {
    let base = DescriptorBuilder::new()
        .slot(1, Vec3::Z, Category::Adxl, &[[5.0, 5.0, 0.0]])
        .build();
    let mut m = AssemblyBuilder::new("base/Plate", base, SessionConfig::default())
        .unwrap()
        .with_auto_check();

    m.attach("adxl", "adxl", "adxl/Missing").unwrap();

    let part = m.part("adxl").unwrap();
    assert!(part.degraded);
    m.assert_translation("adxl", [5.0, 5.0, 0.0], TOL).unwrap();
    // Failed fetches are not cached.
    assert!(m.cache().get(&ModelId::new("adxl/Missing")).is_none());
}

// ── Failures ────────────────────────────────────────────────────────────

#[test]
fn failed_match_changes_nothing() {
    let mut m = carriage();
    let before = m.open_points(None).unwrap();

    let err = m.attach("probe", "probe", ODD_PROBE).unwrap_err();

    assert!(matches!(
        err,
        HarnessError::Placement {
            source: PlacementError::NoCompatibleFeature { .. },
            ..
        }
    ));
    assert_eq!(m.session.part_count(), 0);
    assert!(m.session.ledger().is_empty());
    assert_eq!(m.open_points(None).unwrap(), before);
}

#[test]
fn consumed_point_cannot_be_reused() {
    let mut m = carriage();
    m.attach("probe", "probe", PROBE).unwrap();
    let err = m.attach("probe2", "probe", PROBE).unwrap_err();
    assert!(matches!(
        err,
        HarnessError::Placement {
            source: PlacementError::PointUnavailable { .. },
            ..
        }
    ));
    assert_eq!(m.session.part_count(), 1);
}

#[test]
fn duplicate_harness_name_rejected() {
    let mut m = carriage();
    m.attach("part", "probe", PROBE).unwrap();
    assert!(matches!(
        m.attach("part", "hotend", HOTEND),
        Err(HarnessError::DuplicateName { .. })
    ));
}

// ── Hierarchy ───────────────────────────────────────────────────────────

#[test]
fn fan_guard_follows_skirt() {
    let mut m = carriage();
    m.attach("skirt", "skirt", SKIRT).unwrap();
    assert_eq!(m.open_points(Some("skirt")).unwrap(), vec!["fanguard".to_string()]);

    m.attach_to("guard", "skirt", "fanguard", FAN_GUARD).unwrap();

    m.assert_translation("skirt", [40.0, 0.0, 0.0], TOL).unwrap();
    m.assert_translation("guard", [40.0, 0.0, 5.0], TOL).unwrap();
    let guard = m.part("guard").unwrap();
    assert_relative_eq!(guard.local.translation.z, 5.0, epsilon = TOL);
    assert!(m.open_points(Some("skirt")).unwrap().is_empty());
}

#[test]
fn detaching_skirt_takes_guard_with_it() {
    let mut m = carriage();
    m.attach("skirt", "skirt", SKIRT).unwrap();
    m.attach_to("guard", "skirt", "fanguard", FAN_GUARD).unwrap();
    m.attach("probe", "probe", PROBE).unwrap();

    let removed = m.detach("skirt").unwrap();

    assert_eq!(removed, vec!["skirt".to_string(), "guard".to_string()]);
    assert_eq!(m.session.part_count(), 1);
    assert!(m.open_points(None).unwrap().contains(&"skirt".to_string()));
    assert!(matches!(m.part("guard"), Err(HarnessError::PartNotFound { .. })));
    // Only the base's probe face and the probe itself remain consumed.
    let ledger = m.session.ledger();
    assert_eq!(ledger.used_features(&PartKey::base()), vec![FeatureRef::Face(2)]);
    assert_eq!(ledger.parts().count(), 2);
}

#[test]
fn reattached_skirt_offers_fresh_slot() {
    let mut m = carriage();
    m.attach("skirt", "skirt", SKIRT).unwrap();
    m.attach_to("guard", "skirt", "fanguard", FAN_GUARD).unwrap();
    m.detach("skirt").unwrap();

    m.attach("skirt2", "skirt", SKIRT).unwrap();

    assert_eq!(m.open_points(Some("skirt2")).unwrap(), vec!["fanguard".to_string()]);
    m.attach_to("guard2", "skirt2", "fanguard", FAN_GUARD).unwrap();
    m.assert_translation("guard2", [40.0, 0.0, 5.0], TOL).unwrap();
}

#[test]
fn full_carriage_stays_consistent() {
    let mut m = carriage();
    m.attach("hotend", "hotend", HOTEND).unwrap();
    m.attach("probe", "probe", PROBE).unwrap();
    m.attach("skirt", "skirt", SKIRT).unwrap();
    m.attach_to("guard", "skirt", "fanguard", FAN_GUARD).unwrap();
    m.attach("left", "wing", WING_LEFT).unwrap();
    m.attach("right", "wing_opposite", WING_RIGHT).unwrap();
    m.attach("extruder", "directdrive", DIRECT_DRIVE).unwrap();
    m.attach("duct", "partcooling_opposite", SINGLE_DUCT).unwrap();

    assert_eq!(m.session.part_count(), 8);
    assert_eq!(m.open_points(None).unwrap(), vec!["partcooling".to_string()]);
    assert_eq!(m.history().len(), 8);
    let verdicts = m.check_all();
    assert_eq!(verdicts.len(), 8 * 3 + 2);
    assert!(verdicts.iter().all(|v| v.passed));
}

// ── Survey ──────────────────────────────────────────────────────────────

#[test]
fn survey_lists_only_the_slot_face() {
    let mut m = carriage();
    let entries = m.survey("skirt", SKIRT);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].base_face, 3);
    assert_eq!(entries[0].attach_face, 1);
    assert_eq!(entries[0].hole_count, 4);
    assert_relative_eq!(entries[0].score, 1.0);
    assert_eq!(m.session.part_count(), 0);
}
