//! Verification oracles: pure functions returning pass/fail verdicts.
//!
//! Each oracle returns an `OracleVerdict` with diagnostic detail, not panics.
//! This lets a scenario collect all failures in one pass.

use mount_kernel::{Placement, Tolerance, Vec3};
use mount_session::{PlacedPart, SessionState};
use mount_solver::{rule_for, Correction};
use mount_types::{FeatureRef, GeometryDescriptor, PartKey, PlacedPartId};

/// Distance below which two world points count as coincident.
pub const LINEAR_TOLERANCE: f64 = 1e-6;

/// The result of a single oracle check.
#[derive(Debug, Clone)]
pub struct OracleVerdict {
    pub oracle_name: String,
    pub passed: bool,
    pub detail: String,
    pub value: Option<f64>,
}

impl OracleVerdict {
    fn pass(name: &str, detail: String) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: true,
            detail,
            value: None,
        }
    }

    fn pass_val(name: &str, detail: String, value: f64) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: true,
            detail,
            value: Some(value),
        }
    }

    fn fail(name: &str, detail: String) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: false,
            detail,
            value: None,
        }
    }

    fn fail_val(name: &str, detail: String, value: f64) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: false,
            detail,
            value: Some(value),
        }
    }
}

/// World frame and descriptor of the part that owns `part`'s slot.
fn owner_frame<'a>(session: &'a SessionState, part: &PlacedPart) -> Option<(Placement, &'a GeometryDescriptor)> {
    match part.owner {
        None => Some((Placement::identity(), session.base_descriptor())),
        Some(owner) => session.part(owner).map(|o| (o.transform, o.descriptor.as_ref())),
    }
}

fn feature_normal(descriptor: &GeometryDescriptor, feature: FeatureRef) -> Option<Vec3> {
    match feature {
        FeatureRef::Face(id) => descriptor.face(id).map(|f| f.normal),
        FeatureRef::SlideGroup(index) => descriptor.slide_group(index).and_then(|g| g.normal()),
    }
}

/// Mean reference point of `features`: hole centroids for faces, midpoints for slide groups.
fn features_center(descriptor: &GeometryDescriptor, features: &[FeatureRef]) -> Option<Vec3> {
    let points = features
        .iter()
        .map(|&feature| match feature {
            FeatureRef::Face(id) => descriptor.face(id).and_then(|f| f.hole_centroid()),
            FeatureRef::SlideGroup(index) => descriptor.slide_group(index).and_then(|g| g.midpoint()),
        })
        .collect::<Option<Vec<_>>>()?;
    Vec3::centroid(&points)
}

fn inherits_owner_frame(part: &PlacedPart) -> bool {
    rule_for(part.category).alignment.correction == Correction::InheritParent
}

// ── Placement Oracles ───────────────────────────────────────────────────────

/// Check that the mated features face each other in world space.
pub fn check_normals_opposed(session: &SessionState, id: PlacedPartId) -> OracleVerdict {
    const NAME: &str = "normals_opposed";
    let Some(part) = session.part(id) else {
        return OracleVerdict::fail(NAME, format!("part {id:?} not placed"));
    };
    if inherits_owner_frame(part) {
        return OracleVerdict::pass(NAME, format!("{} inherits its owner's frame", part.key));
    }
    let normals = owner_frame(session, part).and_then(|(world, owner)| {
        let owner_normal = world.apply_vector(feature_normal(owner, *part.owner_features.first()?)?);
        let own_normal = part
            .transform
            .apply_vector(feature_normal(&part.descriptor, *part.own_features.first()?)?);
        Some((owner_normal, own_normal))
    });
    let Some((owner_normal, own_normal)) = normals else {
        return OracleVerdict::fail(NAME, format!("{}: mated features missing", part.key));
    };

    let dot = owner_normal.dot(&own_normal);
    if (dot + 1.0).abs() < LINEAR_TOLERANCE {
        OracleVerdict::pass_val(NAME, format!("{}: normals opposed", part.key), dot)
    } else {
        OracleVerdict::fail_val(
            NAME,
            format!("{}: owner {owner_normal:?} vs part {own_normal:?}, dot {dot:.6}", part.key),
            dot,
        )
    }
}

/// Check that the attachment's feature centre lands on the owner's feature
/// centre, offset by the category's standoff.
pub fn check_centers_coincide(session: &SessionState, id: PlacedPartId) -> OracleVerdict {
    const NAME: &str = "centers_coincide";
    let Some(part) = session.part(id) else {
        return OracleVerdict::fail(NAME, format!("part {id:?} not placed"));
    };
    if inherits_owner_frame(part) {
        return OracleVerdict::pass(NAME, format!("{} inherits its owner's frame", part.key));
    }
    let standoff = rule_for(part.category).alignment.standoff;
    let centers = owner_frame(session, part).and_then(|(world, owner)| {
        let normal = feature_normal(owner, *part.owner_features.first()?)?;
        let target = world.apply_point(features_center(owner, &part.owner_features)? + normal * standoff);
        let landed = part
            .transform
            .apply_point(features_center(&part.descriptor, &part.own_features)?);
        Some((target, landed))
    });
    let Some((target, landed)) = centers else {
        return OracleVerdict::fail(NAME, format!("{}: mated features missing", part.key));
    };

    let gap = target.distance_to(&landed);
    if gap < LINEAR_TOLERANCE {
        OracleVerdict::pass_val(NAME, format!("{}: centre at {landed:?}", part.key), gap)
    } else {
        OracleVerdict::fail_val(
            NAME,
            format!("{}: expected {target:?}, landed {landed:?} ({gap:.6} apart)", part.key),
            gap,
        )
    }
}

/// Check that the world transform is the local transform followed by the owner's.
pub fn check_world_composition(session: &SessionState, id: PlacedPartId) -> OracleVerdict {
    const NAME: &str = "world_composition";
    let Some(part) = session.part(id) else {
        return OracleVerdict::fail(NAME, format!("part {id:?} not placed"));
    };
    let Some((owner_world, _)) = owner_frame(session, part) else {
        return OracleVerdict::fail(NAME, format!("{}: owner {:?} missing", part.key, part.owner));
    };
    let expected = part.local.then(&owner_world);
    if expected.approx_eq(&part.transform, &Tolerance::default()) {
        OracleVerdict::pass(NAME, format!("{}: local then owner", part.key))
    } else {
        OracleVerdict::fail(
            NAME,
            format!("{}: expected {expected:?}, stored {:?}", part.key, part.transform),
        )
    }
}

// ── Bookkeeping Oracles ─────────────────────────────────────────────────────

/// Check that every placed part's mated features are consumed and that the
/// ledger holds nothing for parts that are gone.
pub fn check_ledger_consistency(session: &SessionState) -> OracleVerdict {
    const NAME: &str = "ledger_consistency";
    let ledger = session.ledger();
    let mut problems = Vec::new();

    for (_, part) in session.parts() {
        for feature in &part.owner_features {
            if !ledger.is_used(&part.owner_key, *feature) {
                problems.push(format!("{} {feature:?} free under {}", part.owner_key, part.key));
            }
        }
        for feature in &part.own_features {
            if !ledger.is_used(&part.key, *feature) {
                problems.push(format!("{} {feature:?} free", part.key));
            }
        }
    }
    for key in ledger.parts() {
        let live = *key == PartKey::base() || session.parts().any(|(_, p)| &p.key == key);
        if !live {
            problems.push(format!("stale entry for {key}"));
        }
    }

    if problems.is_empty() {
        OracleVerdict::pass(NAME, format!("{} parts accounted for", session.part_count()))
    } else {
        OracleVerdict::fail(NAME, problems.join("; "))
    }
}

/// Check that every attachment point's `consumed` flag mirrors the ledger.
pub fn check_points_mirror_ledger(session: &SessionState) -> OracleVerdict {
    const NAME: &str = "points_mirror_ledger";
    let ledger = session.ledger();
    let stale: Vec<String> = session
        .points()
        .filter(|p| p.consumed != ledger.is_used(&p.owner_key, p.feature))
        .map(|p| format!("{}:{}", p.owner_key, p.name))
        .collect();

    if stale.is_empty() {
        OracleVerdict::pass(NAME, format!("{} points in sync", session.points().count()))
    } else {
        OracleVerdict::fail(NAME, format!("out of sync: {}", stale.join(", ")))
    }
}

// ── Aggregate ───────────────────────────────────────────────────────────────

/// Run every oracle: the placement checks per part, then the bookkeeping checks.
pub fn check_session(session: &SessionState) -> Vec<OracleVerdict> {
    let mut verdicts = Vec::new();
    for (id, _) in session.parts() {
        verdicts.push(check_normals_opposed(session, id));
        verdicts.push(check_centers_coincide(session, id));
        verdicts.push(check_world_composition(session, id));
    }
    verdicts.push(check_ledger_consistency(session));
    verdicts.push(check_points_mirror_ledger(session));
    verdicts
}
