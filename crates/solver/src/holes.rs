//! Hole-pattern matching.
//!
//! Two faces are compared by the sorted multiset of pairwise distances between
//! their hole centres. The comparison is index-aligned: the i-th shortest
//! distance of one face is compared against the i-th shortest of the other.

use std::f64::consts::{FRAC_PI_2, PI};

use mount_kernel::{Rotation, Vec3};
use mount_types::{Category, Face, FeatureRef, GeometryDescriptor, ModelId, PartKey, PatternMapping};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::config::MatchConfig;
use crate::ledger::Ledger;

/// Hole-count of the rectangular patterns that get the extra cyclic trial.
const RECTANGLE_HOLES: usize = 4;

/// Discrete rotations tried on a candidate face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationSet {
    /// Identity, ±90° about X and Y, and 90/180/270° about Z.
    Full,
    /// 0/90/180/270° about Z only.
    Planar,
}

impl RotationSet {
    pub fn rotations(self) -> Vec<Rotation> {
        let planar = [0.0, FRAC_PI_2, PI, 3.0 * FRAC_PI_2].map(Rotation::about_z);
        match self {
            RotationSet::Planar => planar.to_vec(),
            RotationSet::Full => {
                let mut set = planar.to_vec();
                set.extend([
                    Rotation::about_x(FRAC_PI_2),
                    Rotation::about_x(-FRAC_PI_2),
                    Rotation::about_y(FRAC_PI_2),
                    Rotation::about_y(-FRAC_PI_2),
                ]);
                set
            }
        }
    }
}

/// Sorted pairwise distances between `positions`. Independent of input order.
pub fn inter_hole_distances(positions: &[Vec3]) -> Vec<f64> {
    let mut distances = Vec::with_capacity(positions.len() * positions.len().saturating_sub(1) / 2);
    for (i, a) in positions.iter().enumerate() {
        for b in &positions[i + 1..] {
            distances.push(a.distance_to(b));
        }
    }
    distances.sort_by(f64::total_cmp);
    distances
}

/// Fraction of index-aligned distance pairs within `tolerance`.
///
/// Lists of different length never match; two empty lists score 0.
pub fn aligned_score(base: &[f64], candidate: &[f64], tolerance: f64) -> f64 {
    if base.is_empty() || base.len() != candidate.len() {
        return 0.0;
    }
    let matched = base
        .iter()
        .zip(candidate)
        .filter(|(a, b)| (*a - *b).abs() <= tolerance)
        .count();
    matched as f64 / base.len() as f64
}

/// Score two hole layouts against each other, in `[0, 1]`.
///
/// Hole counts must agree. A single hole against a single hole is a trivial
/// full match. Four-hole patterns also try the candidate distances shifted
/// cyclically by two in each direction and keep the best result.
pub fn pattern_score(base: &[Vec3], candidate: &[Vec3], tolerance: f64) -> f64 {
    if base.is_empty() || base.len() != candidate.len() {
        return 0.0;
    }
    if base.len() == 1 {
        return 1.0;
    }

    let base_d = inter_hole_distances(base);
    let cand_d = inter_hole_distances(candidate);
    let mut score = aligned_score(&base_d, &cand_d, tolerance);

    if base.len() == RECTANGLE_HOLES {
        for shifted in [cyclic(&cand_d, 2), cyclic(&cand_d, cand_d.len() - 2)] {
            score = score.max(aligned_score(&base_d, &shifted, tolerance));
        }
    }
    score
}

fn cyclic(values: &[f64], by: usize) -> Vec<f64> {
    let mut out = values.to_vec();
    out.rotate_left(by);
    out
}

fn mirror(p: Vec3) -> Vec3 {
    Vec3::new(-p.x, p.y, p.z)
}

/// Score `candidate` against `base` after rotating the candidate's holes by
/// `rotation`, optionally reflecting them across the local YZ plane first.
pub fn score_face_pair(base: &Face, candidate: &Face, rotation: &Rotation, mirrored: bool, tolerance: f64) -> f64 {
    let moved: Vec<Vec3> = candidate
        .holes
        .iter()
        .map(|h| if mirrored { mirror(h.position) } else { h.position })
        .map(|p| rotation.apply(p))
        .collect();
    pattern_score(&base.hole_positions(), &moved, tolerance)
}

/// Best-scoring candidate for a base face.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceMatch {
    pub face_id: u32,
    pub score: f64,
    /// Discrete rotation that produced the score.
    pub rotation: Rotation,
    /// Whether the reflected hole set produced the score.
    pub mirrored: bool,
}

/// Pick the best candidate for `base` over every rotation in `rotations`.
///
/// Candidates whose hole count differs from the base are skipped. Ties keep
/// the first candidate seen. Returns `None` unless the best score is strictly
/// above `config.accept_threshold`.
pub fn find_hole_match<'a>(
    base: &Face,
    candidates: impl IntoIterator<Item = &'a Face>,
    rotations: RotationSet,
    mirrored: bool,
    config: &MatchConfig,
) -> Option<FaceMatch> {
    if !base.has_holes() {
        return None;
    }
    let rotation_list = rotations.rotations();
    let mirror_trials: &[bool] = if mirrored { &[false, true] } else { &[false] };

    let mut best: Option<FaceMatch> = None;
    for candidate in candidates {
        if candidate.holes.len() != base.holes.len() {
            continue;
        }
        for rotation in &rotation_list {
            for &reflect in mirror_trials {
                let score = score_face_pair(base, candidate, rotation, reflect, config.hole_tolerance);
                if best.as_ref().is_none_or(|b| score > b.score) {
                    best = Some(FaceMatch {
                        face_id: candidate.face_id,
                        score,
                        rotation: *rotation,
                        mirrored: reflect,
                    });
                }
            }
        }
        debug!(
            base_face = base.face_id,
            candidate = candidate.face_id,
            best = best.as_ref().map(|b| b.score),
            "scored candidate"
        );
    }

    best.filter(|b| b.score > config.accept_threshold)
}

/// Everything needed to match an attachment's faces against one base face.
#[derive(Debug, Clone, Copy)]
pub struct HoleMatchRequest<'a> {
    pub base_model: &'a ModelId,
    pub base_key: &'a PartKey,
    pub base_face: &'a Face,
    pub attach_model: &'a ModelId,
    pub attach_key: &'a PartKey,
    pub attach: &'a GeometryDescriptor,
    pub category: Category,
    pub rotations: RotationSet,
    pub mirrored: bool,
    /// Only faces with exactly this many holes are eligible.
    pub required_hole_count: Option<usize>,
}

/// An accepted hole match that has not necessarily been committed yet.
#[derive(Debug, Clone, PartialEq)]
pub struct HoleMatch {
    pub base_key: PartKey,
    pub attach_key: PartKey,
    pub found: FaceMatch,
    pub mapping: PatternMapping,
}

impl HoleMatch {
    /// Mark both faces consumed for their owning parts.
    pub fn commit(&self, ledger: &mut Ledger) {
        ledger.mark_used(&self.base_key, self.mapping.base_feature);
        ledger.mark_used(&self.attach_key, self.mapping.attachment_feature);
    }
}

/// Faces of the attachment that are still free and satisfy the hole-count filter.
pub fn eligible_faces<'a>(request: HoleMatchRequest<'a>, ledger: &'a Ledger) -> impl Iterator<Item = &'a Face> + 'a {
    let attach_key = request.attach_key;
    let required = request.required_hole_count;
    request
        .attach
        .faces
        .iter()
        .filter(|f| f.has_holes())
        .filter(move |f| !ledger.is_used(attach_key, FeatureRef::Face(f.face_id)))
        .filter(move |f| required.is_none_or(|n| f.holes.len() == n))
}

/// Find the best match without touching the ledger.
#[instrument(skip(request, ledger, config), fields(base_face = request.base_face.face_id, category = %request.category))]
pub fn plan_hole_match(request: &HoleMatchRequest<'_>, ledger: &Ledger, config: &MatchConfig) -> Option<HoleMatch> {
    let found = find_hole_match(
        request.base_face,
        eligible_faces(*request, ledger),
        request.rotations,
        request.mirrored,
        config,
    )?;
    let mapping = PatternMapping {
        base_feature: FeatureRef::Face(request.base_face.face_id),
        attachment_feature: FeatureRef::Face(found.face_id),
        base_model: request.base_model.clone(),
        attachment_model: request.attach_model.clone(),
        original_category: request.category,
    };
    Some(HoleMatch {
        base_key: request.base_key.clone(),
        attach_key: request.attach_key.clone(),
        found,
        mapping,
    })
}

/// Find the best match and, on acceptance, consume both faces in `ledger`.
/// On rejection the ledger is left untouched.
pub fn match_hole_pattern(request: &HoleMatchRequest<'_>, ledger: &mut Ledger, config: &MatchConfig) -> Option<HoleMatch> {
    let accepted = plan_hole_match(request, ledger, config)?;
    accepted.commit(ledger);
    info!(
        base_face = request.base_face.face_id,
        attach_face = accepted.found.face_id,
        score = accepted.found.score,
        "hole pattern matched"
    );
    Some(accepted)
}

/// One compatible (base face, attachment face) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurveyEntry {
    pub base_face: u32,
    pub attach_face: u32,
    pub hole_count: usize,
    pub score: f64,
}

/// Every face pair with equal, non-zero hole count and a positive score,
/// best first. Ignores the ledger and the acceptance threshold.
pub fn survey_matches(base: &GeometryDescriptor, attach: &GeometryDescriptor, config: &MatchConfig) -> Vec<SurveyEntry> {
    let mut entries = Vec::new();
    for b in base.faces.iter().filter(|f| f.has_holes()) {
        for a in attach.faces.iter().filter(|f| f.holes.len() == b.holes.len()) {
            let score = pattern_score(&b.hole_positions(), &a.hole_positions(), config.hole_tolerance);
            if score > 0.0 {
                entries.push(SurveyEntry {
                    base_face: b.face_id,
                    attach_face: a.face_id,
                    hole_count: b.holes.len(),
                    score,
                });
            }
        }
    }
    entries.sort_by(|x, y| y.score.total_cmp(&x.score));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mount_types::Hole;

    fn face(id: u32, normal: Vec3, points: &[(f64, f64, f64)]) -> Face {
        Face {
            face_id: id,
            normal,
            holes: points
                .iter()
                .enumerate()
                .map(|(i, &(x, y, z))| Hole {
                    id: i as u32,
                    diameter: 3.0,
                    position: Vec3::new(x, y, z),
                    rotation: None,
                })
                .collect(),
            attachment_type: None,
            name: None,
        }
    }

    fn rect(id: u32, w: f64, h: f64) -> Face {
        face(id, Vec3::Z, &[(0.0, 0.0, 0.0), (w, 0.0, 0.0), (w, h, 0.0), (0.0, h, 0.0)])
    }

    #[test]
    fn test_distances_sorted() {
        let d = inter_hole_distances(&[Vec3::ZERO, Vec3::new(3.0, 0.0, 0.0), Vec3::new(0.0, 4.0, 0.0)]);
        assert_eq!(d, vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_single_hole_distances_empty() {
        assert!(inter_hole_distances(&[Vec3::ZERO]).is_empty());
        assert!(inter_hole_distances(&[]).is_empty());
    }

    #[test]
    fn test_rotation_sets() {
        assert_eq!(RotationSet::Full.rotations().len(), 8);
        assert_eq!(RotationSet::Planar.rotations().len(), 4);
        assert_eq!(RotationSet::Planar.rotations()[0], Rotation::identity());
    }

    #[test]
    fn test_zero_holes_score_zero() {
        let empty = face(0, Vec3::Z, &[]);
        assert_eq!(score_face_pair(&empty, &empty, &Rotation::identity(), false, 1.0), 0.0);
    }

    #[test]
    fn test_single_hole_pair_is_full_match() {
        let a = face(0, Vec3::Z, &[(0.0, 0.0, 0.0)]);
        let b = face(1, Vec3::Z, &[(5.0, 5.0, 0.0)]);
        assert_eq!(score_face_pair(&a, &b, &Rotation::identity(), false, 1.0), 1.0);
    }

    #[test]
    fn test_hole_count_mismatch_rejected() {
        let base = face(0, Vec3::Z, &[(0.0, 0.0, 0.0), (20.0, 0.0, 0.0)]);
        let three = face(1, Vec3::Z, &[(0.0, 0.0, 0.0), (20.0, 0.0, 0.0), (0.0, 20.0, 0.0)]);
        assert_eq!(pattern_score(&base.hole_positions(), &three.hole_positions(), 1.0), 0.0);
        assert!(find_hole_match(&base, [&three], RotationSet::Full, false, &MatchConfig::default()).is_none());
    }

    #[test]
    fn test_rectangle_accepted_within_tolerance() {
        let base = rect(0, 30.0, 20.0);
        let cand = rect(1, 30.5, 19.6);
        let found = find_hole_match(&base, [&cand], RotationSet::Full, false, &MatchConfig::default()).unwrap();
        assert_eq!(found.face_id, 1);
        assert_relative_eq!(found.score, 1.0);
    }

    #[test]
    fn test_perturbed_rectangle_rejected() {
        let base = rect(0, 30.0, 20.0);
        // One hole pulled 5 units off the corner changes three of the six distances.
        let cand = face(1, Vec3::Z, &[(0.0, 0.0, 0.0), (30.0, 0.0, 0.0), (35.0, 25.0, 0.0), (0.0, 20.0, 0.0)]);
        for r in RotationSet::Full.rotations() {
            assert!(score_face_pair(&base, &cand, &r, false, 1.0) < 0.6);
        }
        assert!(find_hole_match(&base, [&cand], RotationSet::Full, false, &MatchConfig::default()).is_none());
    }

    #[test]
    fn test_threshold_is_strict() {
        let config = MatchConfig {
            accept_threshold: 1.0,
            ..MatchConfig::default()
        };
        let base = rect(0, 30.0, 20.0);
        assert!(find_hole_match(&base, [&base.clone()], RotationSet::Planar, false, &config).is_none());
    }

    #[test]
    fn test_first_candidate_wins_tie() {
        let base = rect(0, 30.0, 20.0);
        let a = rect(7, 30.0, 20.0);
        let b = rect(3, 30.0, 20.0);
        let found = find_hole_match(&base, [&a, &b], RotationSet::Full, false, &MatchConfig::default()).unwrap();
        assert_eq!(found.face_id, 7);
        assert_eq!(found.rotation, Rotation::identity());
    }

    #[test]
    fn test_mirrored_riser_scores_at_least_unmirrored() {
        let riser = face(
            0,
            Vec3::Z,
            &[(-10.0, 0.0, 0.0), (10.0, 0.0, 0.0), (-10.0, 20.0, 0.0), (10.0, 20.0, 0.0)],
        );
        let plain = find_hole_match(&riser, [&riser], RotationSet::Full, false, &MatchConfig::default()).unwrap();
        let mirrored = find_hole_match(&riser, [&riser], RotationSet::Full, true, &MatchConfig::default()).unwrap();
        assert!(mirrored.score >= plain.score);
        assert_eq!(mirrored.score, 1.0);
    }

    #[test]
    fn test_rotation_score_symmetry() {
        let a = face(0, Vec3::Z, &[(0.0, 0.0, 0.0), (12.0, 0.0, 0.0), (3.0, 9.0, 0.0), (14.0, 7.0, 0.0)]);
        let b = face(1, Vec3::Z, &[(0.0, 0.0, 0.0), (12.5, 0.0, 0.0), (3.0, 8.0, 0.0), (20.0, 7.0, 0.0)]);
        for r in RotationSet::Full.rotations() {
            let ab = score_face_pair(&a, &b, &r, false, 1.0);
            let ba = score_face_pair(&b, &a, &r.inverse(), false, 1.0);
            assert_eq!(ab, ba);
        }
    }

    #[test]
    fn test_match_commits_only_on_success() {
        let base_model = ModelId::new("base");
        let attach_model = ModelId::new("hotend/Dragon");
        let base_key = PartKey::base();
        let attach_key = PartKey::instance(&attach_model, 1);
        let base_face = rect(4, 30.0, 20.0);
        let attach = GeometryDescriptor {
            faces: vec![rect(9, 30.0, 20.0)],
            slide_faces: vec![],
            orientation_face: None,
        };
        let request = HoleMatchRequest {
            base_model: &base_model,
            base_key: &base_key,
            base_face: &base_face,
            attach_model: &attach_model,
            attach_key: &attach_key,
            attach: &attach,
            category: Category::Hotend,
            rotations: RotationSet::Full,
            mirrored: false,
            required_hole_count: None,
        };

        let mut ledger = Ledger::new();
        let m = match_hole_pattern(&request, &mut ledger, &MatchConfig::default()).unwrap();
        assert_eq!(m.mapping.attachment_feature, FeatureRef::Face(9));
        assert_eq!(m.mapping.original_category, Category::Hotend);
        assert!(ledger.is_used(&base_key, FeatureRef::Face(4)));
        assert!(ledger.is_used(&attach_key, FeatureRef::Face(9)));

        // The only face is now consumed, so a second attempt finds nothing and changes nothing.
        let before = ledger.clone();
        assert!(match_hole_pattern(&request, &mut ledger, &MatchConfig::default()).is_none());
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_required_hole_count_filters_faces() {
        let base_model = ModelId::new("base");
        let attach_model = ModelId::new("gantry/MGN12");
        let base_key = PartKey::base();
        let attach_key = PartKey::instance(&attach_model, 1);
        let base_face = face(0, Vec3::Z, &[(0.0, 0.0, 0.0), (20.0, 0.0, 0.0)]);
        let attach = GeometryDescriptor {
            faces: vec![face(1, Vec3::Z, &[(0.0, 0.0, 0.0), (20.0, 0.0, 0.0)])],
            slide_faces: vec![],
            orientation_face: None,
        };
        let request = HoleMatchRequest {
            base_model: &base_model,
            base_key: &base_key,
            base_face: &base_face,
            attach_model: &attach_model,
            attach_key: &attach_key,
            attach: &attach,
            category: Category::Gantry,
            rotations: RotationSet::Full,
            mirrored: false,
            required_hole_count: Some(4),
        };
        assert!(plan_hole_match(&request, &Ledger::new(), &MatchConfig::default()).is_none());
    }

    #[test]
    fn test_survey_sorted_best_first() {
        let base = GeometryDescriptor {
            faces: vec![rect(0, 30.0, 20.0), face(1, Vec3::Z, &[])],
            slide_faces: vec![],
            orientation_face: None,
        };
        let attach = GeometryDescriptor {
            faces: vec![
                face(5, Vec3::Z, &[(0.0, 0.0, 0.0), (30.0, 0.0, 0.0), (30.0, 24.0, 0.0), (0.0, 24.0, 0.0)]),
                rect(6, 30.0, 20.0),
                face(7, Vec3::Z, &[(0.0, 0.0, 0.0)]),
            ],
            slide_faces: vec![],
            orientation_face: None,
        };
        let survey = survey_matches(&base, &attach, &MatchConfig::default());
        assert_eq!(survey.len(), 2);
        assert_eq!(survey[0].attach_face, 6);
        assert_relative_eq!(survey[0].score, 1.0);
        assert!(survey[1].score < 1.0);
    }
}
