//! Slide-face (push-fit duct) matching.

use mount_kernel::Vec3;
use mount_types::{FeatureRef, GeometryDescriptor, PartKey, SlideFaceGroup};
use tracing::{debug, info, instrument};

use crate::config::MatchConfig;
use crate::ledger::Ledger;

/// Fraction of the smaller distance set that has a partner in the other set
/// within `tolerance`. Either set being empty scores 0.
pub fn distance_set_score(a: &[f64], b: &[f64], tolerance: f64) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if small.is_empty() {
        return 0.0;
    }
    let matched = small
        .iter()
        .filter(|d| large.iter().any(|e| (*d - e).abs() <= tolerance))
        .count();
    matched as f64 / small.len() as f64
}

pub fn group_score(base: &SlideFaceGroup, attach: &SlideFaceGroup, tolerance: f64) -> f64 {
    distance_set_score(&base.distance_values(), &attach.distance_values(), tolerance)
}

/// Inputs for matching an attachment's slide groups against a base's.
#[derive(Debug, Clone, Copy)]
pub struct SlideMatchRequest<'a> {
    pub base_key: &'a PartKey,
    pub base: &'a GeometryDescriptor,
    pub attach_key: &'a PartKey,
    pub attach: &'a GeometryDescriptor,
    /// Base group targeted by a single-sided attachment; ignored for dual-sided ones.
    pub base_index: usize,
}

/// An accepted slide-group match.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideMatch {
    pub base_key: PartKey,
    pub attach_key: PartKey,
    /// `(base group index, attachment group index)`; two pairs for dual-sided ducts.
    pub pairs: Vec<(usize, usize)>,
    pub score: f64,
    pub base_center: Vec3,
    pub attach_center: Vec3,
    pub base_normal: Vec3,
    pub attach_normal: Vec3,
}

impl SlideMatch {
    pub fn is_dual(&self) -> bool {
        self.pairs.len() > 1
    }

    /// Mark every matched group consumed for its owning part.
    pub fn commit(&self, ledger: &mut Ledger) {
        for &(b, a) in &self.pairs {
            ledger.mark_used(&self.base_key, FeatureRef::SlideGroup(b));
            ledger.mark_used(&self.attach_key, FeatureRef::SlideGroup(a));
        }
    }
}

fn free(ledger: &Ledger, key: &PartKey, index: usize) -> bool {
    !ledger.is_used(key, FeatureRef::SlideGroup(index))
}

/// Select the group pairs to compare: both slots for a dual-sided attachment,
/// otherwise the requested base group against the first free attachment group.
fn select_pairs(request: &SlideMatchRequest<'_>, ledger: &Ledger) -> Option<Vec<(usize, usize)>> {
    let base_count = request.base.slide_faces.len();
    let attach_count = request.attach.slide_faces.len();

    if attach_count > 1 {
        if base_count < 2 {
            return None;
        }
        let pairs = vec![(0, 0), (1, 1)];
        let all_free = pairs
            .iter()
            .all(|&(b, a)| free(ledger, request.base_key, b) && free(ledger, request.attach_key, a));
        return all_free.then_some(pairs);
    }

    let base_index = request.base_index;
    if base_index >= base_count || !free(ledger, request.base_key, base_index) {
        return None;
    }
    let attach_index = (0..attach_count).find(|&i| free(ledger, request.attach_key, i))?;
    Some(vec![(base_index, attach_index)])
}

/// Find the slide match without touching the ledger.
#[instrument(skip(request, ledger, config), fields(base_index = request.base_index))]
pub fn plan_slide_match(request: &SlideMatchRequest<'_>, ledger: &Ledger, config: &MatchConfig) -> Option<SlideMatch> {
    let pairs = select_pairs(request, ledger)?;

    let mut score = f64::INFINITY;
    let mut base_mids = Vec::with_capacity(pairs.len());
    let mut attach_mids = Vec::with_capacity(pairs.len());
    for &(b, a) in &pairs {
        let base_group = request.base.slide_group(b)?;
        let attach_group = request.attach.slide_group(a)?;
        let s = group_score(base_group, attach_group, config.slide_tolerance);
        debug!(base_group = b, attach_group = a, score = s, "scored slide pair");
        score = score.min(s);
        base_mids.push(base_group.midpoint()?);
        attach_mids.push(attach_group.midpoint()?);
    }

    if score <= config.accept_threshold {
        return None;
    }

    let (first_base, first_attach) = pairs[0];
    Some(SlideMatch {
        base_key: request.base_key.clone(),
        attach_key: request.attach_key.clone(),
        base_normal: request.base.slide_group(first_base)?.normal()?,
        attach_normal: request.attach.slide_group(first_attach)?.normal()?,
        base_center: Vec3::centroid(&base_mids)?,
        attach_center: Vec3::centroid(&attach_mids)?,
        pairs,
        score,
    })
}

/// Find the slide match and, on acceptance, consume the matched groups.
pub fn match_slide_group(request: &SlideMatchRequest<'_>, ledger: &mut Ledger, config: &MatchConfig) -> Option<SlideMatch> {
    let accepted = plan_slide_match(request, ledger, config)?;
    accepted.commit(ledger);
    info!(pairs = ?accepted.pairs, score = accepted.score, "slide group matched");
    Some(accepted)
}
