pub mod align;
pub mod config;
pub mod holes;
pub mod ledger;
pub mod rules;
pub mod slide;

pub use align::{AlignmentInput, compute_placement};
pub use config::{AlignConfig, MatchConfig};
pub use holes::{
    FaceMatch, HoleMatch, HoleMatchRequest, RotationSet, SurveyEntry, find_hole_match, inter_hole_distances,
    match_hole_pattern, pattern_score, plan_hole_match, score_face_pair, survey_matches,
};
pub use ledger::{Ledger, LedgerEntry};
pub use rules::{AlignmentRule, CategoryRule, Correction, MatchRule, OrientationTarget, rule_for};
pub use slide::{SlideMatch, SlideMatchRequest, distance_set_score, match_slide_group, plan_slide_match};
