//! The assembly session: base part, placed parts, ledger and the pending
//! placement request.

use std::collections::HashSet;
use std::sync::Arc;

use mount_kernel::Placement;
use mount_library::{DescriptorCache, DescriptorSource, Fetched};
use mount_solver::{
    compute_placement, plan_hole_match, plan_slide_match, rule_for, survey_matches, AlignmentInput,
    HoleMatchRequest, Ledger, SlideMatchRequest, SurveyEntry,
};
use mount_types::{
    AttachmentPoint, Category, FeatureRef, GeometryDescriptor, ModelId, PartKey, PatternMapping, PlacedPartId,
};
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use tracing::{debug, info, instrument, warn};

use crate::config::SessionConfig;
use crate::errors::PlacementError;
use crate::points::{enumerate_points, PointRef};

/// A part instance placed in the assembly.
#[derive(Debug, Clone)]
pub struct PlacedPart {
    pub model: ModelId,
    pub key: PartKey,
    pub category: Category,
    /// The owner's slot this part occupies.
    pub point: PointRef,
    pub owner: Option<PlacedPartId>,
    pub owner_key: PartKey,
    /// Placement relative to the owner's frame.
    pub local: Placement,
    /// Placement in the world frame; what the renderer applies to the mesh.
    pub transform: Placement,
    /// Owner features this part consumes.
    pub owner_features: Vec<FeatureRef>,
    /// This part's own features consumed by the mount.
    pub own_features: Vec<FeatureRef>,
    pub mapping: PatternMapping,
    pub score: f64,
    /// Placed against the placeholder descriptor.
    pub degraded: bool,
    pub descriptor: Arc<GeometryDescriptor>,
    pub child_points: Vec<AttachmentPoint>,
}

/// Ticket for an outstanding placement request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAttach {
    pub ticket: u64,
    pub point: PointRef,
    pub model: ModelId,
}

/// Everything about the part that owns the targeted point.
struct OwnerView {
    model: ModelId,
    key: PartKey,
    descriptor: Arc<GeometryDescriptor>,
    world: Placement,
}

/// A match ready to be committed, with its alignment geometry.
struct Planned {
    input: AlignmentInput,
    pairs: Vec<(FeatureRef, FeatureRef)>,
    mapping: PatternMapping,
    score: f64,
}

/// State of one assembly session.
///
/// Every mutation happens in [`SessionState::complete_attach`] or
/// [`SessionState::detach`]; a failed call leaves the session untouched.
#[derive(Debug)]
pub struct SessionState {
    config: SessionConfig,
    base_model: ModelId,
    base_key: PartKey,
    base: Arc<GeometryDescriptor>,
    base_points: Vec<AttachmentPoint>,
    parts: SlotMap<PlacedPartId, PlacedPart>,
    ledger: Ledger,
    pending: Option<PendingAttach>,
    next_ticket: u64,
    next_serial: u64,
}

impl SessionState {
    pub fn new(base_model: ModelId, base: Arc<GeometryDescriptor>, config: SessionConfig) -> Self {
        let mut session = Self {
            config,
            base_model,
            base_key: PartKey::base(),
            base,
            base_points: Vec::new(),
            parts: SlotMap::with_key(),
            ledger: Ledger::new(),
            pending: None,
            next_ticket: 1,
            next_serial: 1,
        };
        session.refresh_points();
        session
    }

    /// Start a session on `base_model` fetched through `cache`.
    pub fn from_cache<S: DescriptorSource>(
        cache: &mut DescriptorCache<S>,
        base_model: ModelId,
        config: SessionConfig,
    ) -> Self {
        let fetched = cache.fetch(&base_model);
        if fetched.degraded {
            warn!(%base_model, "base part descriptor unavailable, session uses placeholder");
        }
        Self::new(base_model, fetched.descriptor, config)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn base_model(&self) -> &ModelId {
        &self.base_model
    }

    pub fn base_descriptor(&self) -> &GeometryDescriptor {
        &self.base
    }

    pub fn part(&self, id: PlacedPartId) -> Option<&PlacedPart> {
        self.parts.get(id)
    }

    pub fn parts(&self) -> impl Iterator<Item = (PlacedPartId, &PlacedPart)> {
        self.parts.iter()
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    pub fn pending(&self) -> Option<&PendingAttach> {
        self.pending.as_ref()
    }

    /// Every attachment point, base first, consumed ones included.
    pub fn points(&self) -> impl Iterator<Item = &AttachmentPoint> {
        self.base_points
            .iter()
            .chain(self.parts.values().flat_map(|p| p.child_points.iter()))
    }

    /// Points the user may still select.
    pub fn visible_points(&self) -> impl Iterator<Item = &AttachmentPoint> {
        self.points().filter(|p| p.is_visible())
    }

    pub fn point(&self, point: &PointRef) -> Option<&AttachmentPoint> {
        let candidates = match point.owner {
            None => &self.base_points,
            Some(owner) => &self.parts.get(owner)?.child_points,
        };
        candidates.iter().find(|p| p.name == point.name)
    }

    /// Face pairs between the point's owner and `attach`, best first, for
    /// the point's face only.
    pub fn survey_point(&self, point: &PointRef, attach: &GeometryDescriptor) -> Vec<SurveyEntry> {
        let (Some(target), Some(owner)) = (self.point(point), self.owner_view(point.owner)) else {
            return Vec::new();
        };
        let FeatureRef::Face(face_id) = target.feature else {
            return Vec::new();
        };
        survey_matches(&owner.descriptor, attach, &self.config.matching)
            .into_iter()
            .filter(|e| e.base_face == face_id)
            .collect()
    }

    fn owner_view(&self, owner: Option<PlacedPartId>) -> Option<OwnerView> {
        match owner {
            None => Some(OwnerView {
                model: self.base_model.clone(),
                key: self.base_key.clone(),
                descriptor: Arc::clone(&self.base),
                world: Placement::identity(),
            }),
            Some(id) => self.parts.get(id).map(|p| OwnerView {
                model: p.model.clone(),
                key: p.key.clone(),
                descriptor: Arc::clone(&p.descriptor),
                world: p.transform,
            }),
        }
    }

    /// Register a placement request for `model` at `point`, superseding any
    /// request still outstanding.
    #[instrument(skip(self, point), fields(point_name = %point.name))]
    pub fn begin_attach(&mut self, point: PointRef, model: ModelId) -> Result<PendingAttach, PlacementError> {
        if !self.point(&point).is_some_and(AttachmentPoint::is_visible) {
            return Err(PlacementError::PointUnavailable { point: point.name });
        }
        let pending = PendingAttach {
            ticket: self.next_ticket,
            point,
            model,
        };
        self.next_ticket += 1;
        if let Some(old) = self.pending.replace(pending.clone()) {
            debug!(superseded = old.ticket, ticket = pending.ticket, "placement request superseded");
        }
        Ok(pending)
    }

    /// Drop the outstanding request, if any.
    pub fn cancel_pending(&mut self) -> Option<PendingAttach> {
        self.pending.take()
    }

    /// Finish a placement request once its descriptor is available.
    ///
    /// Stale tickets are rejected with [`PlacementError::Superseded`]. On any
    /// error the ledger, parts and points are unchanged.
    #[instrument(skip(self, fetched), fields(ticket = pending.ticket, model = %pending.model))]
    pub fn complete_attach(&mut self, pending: PendingAttach, fetched: Fetched) -> Result<PlacedPartId, PlacementError> {
        if self.pending.as_ref().map(|p| p.ticket) != Some(pending.ticket) {
            debug!("discarding stale placement result");
            return Err(PlacementError::Superseded { ticket: pending.ticket });
        }
        self.pending = None;

        let unavailable = || PlacementError::PointUnavailable {
            point: pending.point.name.clone(),
        };
        let point = self
            .point(&pending.point)
            .filter(|p| p.is_visible())
            .cloned()
            .ok_or_else(unavailable)?;
        let owner = self.owner_view(point.owner).ok_or_else(unavailable)?;
        let key = PartKey::instance(&pending.model, self.next_serial);
        let attach = fetched.descriptor;

        let planned = self
            .plan(&point, &owner, &key, &pending.model, &attach)
            .ok_or_else(|| PlacementError::NoCompatibleFeature {
                point: point.name.clone(),
                model: pending.model.clone(),
            })?;

        let rule = rule_for(point.category);
        let local = compute_placement(&planned.input, &rule.alignment);
        let transform = local.then(&owner.world);

        for (owner_feature, own_feature) in &planned.pairs {
            self.ledger.mark_used(&owner.key, *owner_feature);
            self.ledger.mark_used(&key, *own_feature);
        }
        self.ledger.link_child(&key, &owner.key);

        let id = self.parts.insert(PlacedPart {
            model: pending.model.clone(),
            key: key.clone(),
            category: point.category,
            point: PointRef::of(&point),
            owner: point.owner,
            owner_key: owner.key.clone(),
            local,
            transform,
            owner_features: planned.pairs.iter().map(|(o, _)| *o).collect(),
            own_features: planned.pairs.iter().map(|(_, a)| *a).collect(),
            mapping: planned.mapping,
            score: planned.score,
            degraded: fetched.degraded,
            descriptor: attach,
            child_points: Vec::new(),
        });
        self.next_serial += 1;
        self.refresh_points();

        info!(%key, point = %point.name, score = planned.score, degraded = fetched.degraded, "part attached");
        Ok(id)
    }

    /// Fetch the descriptor through `cache` and place `model` at `point` in one step.
    pub fn attach<S: DescriptorSource>(
        &mut self,
        cache: &mut DescriptorCache<S>,
        point: PointRef,
        model: ModelId,
    ) -> Result<PlacedPartId, PlacementError> {
        let pending = self.begin_attach(point, model)?;
        let fetched = cache.fetch(&pending.model);
        self.complete_attach(pending, fetched)
    }

    /// Match the attachment against the point's feature without touching the ledger.
    fn plan(
        &self,
        point: &AttachmentPoint,
        owner: &OwnerView,
        key: &PartKey,
        model: &ModelId,
        attach: &GeometryDescriptor,
    ) -> Option<Planned> {
        let rule = rule_for(point.category);
        let up = owner.world.inverse().apply_vector(self.config.alignment.up);

        match point.feature {
            FeatureRef::Face(face_id) => {
                let base_face = owner.descriptor.face(face_id)?;
                let request = HoleMatchRequest {
                    base_model: &owner.model,
                    base_key: &owner.key,
                    base_face,
                    attach_model: model,
                    attach_key: key,
                    attach,
                    category: point.category,
                    rotations: rule.matching.rotations,
                    mirrored: rule.matching.mirrored,
                    required_hole_count: rule.matching.required_hole_count,
                };
                let found = plan_hole_match(&request, &self.ledger, &self.config.matching)?;
                let attach_face = attach.face(found.found.face_id)?;
                Some(Planned {
                    input: AlignmentInput {
                        category: point.category,
                        base_normal: base_face.normal,
                        base_center: base_face.hole_centroid()?,
                        attach_normal: attach_face.normal,
                        attach_center: attach_face.hole_centroid()?,
                        base_orientation: owner.descriptor.orientation(),
                        attach_orientation: attach.orientation(),
                        up,
                    },
                    pairs: vec![(found.mapping.base_feature, found.mapping.attachment_feature)],
                    mapping: found.mapping,
                    score: found.found.score,
                })
            }
            FeatureRef::SlideGroup(index) => {
                let request = SlideMatchRequest {
                    base_key: &owner.key,
                    base: &owner.descriptor,
                    attach_key: key,
                    attach,
                    base_index: index,
                };
                let found = plan_slide_match(&request, &self.ledger, &self.config.matching)?;
                if !found.pairs.iter().any(|&(b, _)| b == index) {
                    debug!(index, pairs = ?found.pairs, "slide match does not cover the selected slot");
                    return None;
                }
                let pairs: Vec<(FeatureRef, FeatureRef)> = found
                    .pairs
                    .iter()
                    .map(|&(b, a)| (FeatureRef::SlideGroup(b), FeatureRef::SlideGroup(a)))
                    .collect();
                let (base_feature, attachment_feature) = pairs[0];
                Some(Planned {
                    input: AlignmentInput {
                        category: point.category,
                        base_normal: found.base_normal,
                        base_center: found.base_center,
                        attach_normal: found.attach_normal,
                        attach_center: found.attach_center,
                        base_orientation: owner.descriptor.orientation(),
                        attach_orientation: attach.orientation(),
                        up,
                    },
                    mapping: PatternMapping {
                        base_feature,
                        attachment_feature,
                        base_model: owner.model.clone(),
                        attachment_model: model.clone(),
                        original_category: point.category,
                    },
                    pairs,
                    score: found.score,
                })
            }
        }
    }

    /// Remove a placed part and everything mounted on it.
    ///
    /// The owner-side features it consumed are released, the ledger is reset
    /// for the part and its descendants, and only then are attachment points
    /// recomputed. Returns the removed ids, `id` first.
    #[instrument(skip(self))]
    pub fn detach(&mut self, id: PlacedPartId) -> Result<Vec<PlacedPartId>, PlacementError> {
        let part = self.parts.get(id).ok_or(PlacementError::PartNotFound(id))?;
        for feature in &part.owner_features {
            self.ledger.release(&part.owner_key, *feature);
        }
        let key = part.key.clone();

        let mut removed = vec![id];
        let mut cursor = 0;
        while cursor < removed.len() {
            let current = removed[cursor];
            removed.extend(
                self.parts
                    .iter()
                    .filter(|(_, p)| p.owner == Some(current))
                    .map(|(child, _)| child),
            );
            cursor += 1;
        }

        self.ledger.reset_for_part(&key, true);
        for gone in &removed {
            self.parts.remove(*gone);
        }

        let live: HashSet<PartKey> = self
            .parts
            .values()
            .map(|p| p.key.clone())
            .chain([self.base_key.clone()])
            .collect();
        self.ledger.cleanup_orphans(|k| live.contains(k));

        let orphaned_request = self
            .pending
            .as_ref()
            .is_some_and(|p| p.point.owner.is_some_and(|o| removed.contains(&o)));
        if orphaned_request {
            debug!("dropping placement request on a removed part");
            self.pending = None;
        }

        self.refresh_points();
        info!(%key, removed = removed.len(), "part detached");
        Ok(removed)
    }

    fn refresh_points(&mut self) {
        self.base_points = enumerate_points(&self.base, None, &self.base_key, None, &self.ledger);
        for (id, part) in self.parts.iter_mut() {
            part.child_points = enumerate_points(&part.descriptor, Some(id), &part.key, Some(part.category), &self.ledger);
        }
    }
}
