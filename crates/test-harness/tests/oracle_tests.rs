//! Tests for verification oracles.

use approx::assert_relative_eq;
use mount_kernel::Vec3;
use mount_session::SessionConfig;
use mount_types::Category;
use test_harness::fixtures::*;
use test_harness::oracle::*;
use test_harness::{AssemblyBuilder, DescriptorBuilder};

fn with_skirt_and_guard() -> AssemblyBuilder {
    let mut m = AssemblyBuilder::carriage().unwrap();
    m.attach("skirt", "skirt", SKIRT).unwrap();
    m.attach_to("guard", "skirt", "fanguard", FAN_GUARD).unwrap();
    m
}

// ── Placement Oracle Tests ──────────────────────────────────────────────

#[test]
fn normals_opposed_reports_dot_product() {
    let m = with_skirt_and_guard();
    let result = check_normals_opposed(&m.session, m.id("guard").unwrap());
    assert!(result.passed, "{}", result.detail);
    assert_relative_eq!(result.value.unwrap(), -1.0, epsilon = 1e-9);
}

#[test]
fn centers_coincide_includes_standoff() {
    let mut m = AssemblyBuilder::carriage().unwrap();
    m.attach("hotend", "hotend", HOTEND).unwrap();
    let result = check_centers_coincide(&m.session, m.id("hotend").unwrap());
    assert!(result.passed, "{}", result.detail);
    assert!(result.value.unwrap() < LINEAR_TOLERANCE);
}

#[test]
fn world_composition_holds_for_child() {
    let m = with_skirt_and_guard();
    let result = check_world_composition(&m.session, m.id("guard").unwrap());
    assert!(result.passed, "{}", result.detail);
}

#[test]
fn spacer_inherits_owner_frame() {
    let base = DescriptorBuilder::new()
        .slot(1, Vec3::Z, Category::Spacer, &[[0.0, 0.0, 0.0], [10.0, 0.0, 0.0]])
        .build();
    let mut m = AssemblyBuilder::new("base/Plate", base, SessionConfig::default()).unwrap();
    m.register(
        "spacer/Thin",
        DescriptorBuilder::new()
            .mating(1, -Vec3::Z, &[[0.0, 0.0, 0.0], [10.0, 0.0, 0.0]])
            .build(),
    )
    .unwrap();

    let id = m.attach("spacer", "spacer", "spacer/Thin").unwrap();

    let part = m.part("spacer").unwrap();
    assert!(part.transform.translation.length() < 1e-9);
    let normals = check_normals_opposed(&m.session, id);
    assert!(normals.passed);
    assert!(normals.detail.contains("inherits"), "{}", normals.detail);
    assert!(check_centers_coincide(&m.session, id).passed);
}

#[test]
fn removed_part_fails_every_placement_oracle() {
    let mut m = with_skirt_and_guard();
    let guard = m.id("guard").unwrap();
    m.detach("skirt").unwrap();

    assert!(!check_normals_opposed(&m.session, guard).passed);
    assert!(!check_centers_coincide(&m.session, guard).passed);
    assert!(!check_world_composition(&m.session, guard).passed);
}

// ── Bookkeeping Oracle Tests ────────────────────────────────────────────

#[test]
fn ledger_consistent_after_cascade() {
    let mut m = with_skirt_and_guard();
    m.attach("probe", "probe", PROBE).unwrap();
    m.detach("skirt").unwrap();

    let result = check_ledger_consistency(&m.session);
    assert!(result.passed, "{}", result.detail);
    assert!(result.detail.contains("1 parts"));
}

#[test]
fn points_mirror_ledger_on_fresh_session() {
    let m = AssemblyBuilder::carriage().unwrap();
    let result = check_points_mirror_ledger(&m.session);
    assert!(result.passed, "{}", result.detail);
    assert!(result.detail.starts_with("8 points"), "{}", result.detail);
}

#[test]
fn check_session_covers_every_part() {
    let m = with_skirt_and_guard();
    let verdicts = check_session(&m.session);
    assert_eq!(verdicts.len(), 2 * 3 + 2);
    let failures: Vec<_> = verdicts.iter().filter(|v| !v.passed).collect();
    assert!(failures.is_empty(), "{failures:?}");
}
