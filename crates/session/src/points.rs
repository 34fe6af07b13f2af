//! Attachment point enumeration.

use std::collections::HashMap;

use mount_solver::Ledger;
use mount_types::{point_name, AttachmentPoint, Category, FeatureRef, GeometryDescriptor, PartKey, PlacedPartId};
use serde::{Deserialize, Serialize};

/// Stable address of an attachment point: its owner and its name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PointRef {
    /// `None` for points on the base part.
    pub owner: Option<PlacedPartId>,
    pub name: String,
}

impl PointRef {
    pub fn base(name: impl Into<String>) -> Self {
        Self {
            owner: None,
            name: name.into(),
        }
    }

    pub fn on(owner: PlacedPartId, name: impl Into<String>) -> Self {
        Self {
            owner: Some(owner),
            name: name.into(),
        }
    }

    pub fn of(point: &AttachmentPoint) -> Self {
        Self {
            owner: point.owner,
            name: point.name.clone(),
        }
    }
}

/// Slots exposed by one part.
///
/// A face contributes a slot when it has holes and declares an attachment
/// category that mounts on `owner_category`; a slide group contributes a slot
/// of its own category under the same rule. Names are numbered per category
/// in declaration order, faces before slide groups.
pub fn enumerate_points(
    descriptor: &GeometryDescriptor,
    owner: Option<PlacedPartId>,
    owner_key: &PartKey,
    owner_category: Option<Category>,
    ledger: &Ledger,
) -> Vec<AttachmentPoint> {
    let mut ordinals: HashMap<Category, usize> = HashMap::new();
    let mut points = Vec::new();
    let mut push = |category: Category, feature: FeatureRef, normal| {
        let ordinal = ordinals.entry(category).or_insert(0);
        points.push(AttachmentPoint {
            category,
            name: point_name(category, *ordinal),
            owner,
            owner_key: owner_key.clone(),
            feature,
            normal,
            consumed: ledger.is_used(owner_key, feature),
        });
        *ordinal += 1;
    };

    for face in descriptor.faces.iter().filter(|f| f.has_holes()) {
        if let Some(category) = face.attachment_type.filter(|c| c.mounts_on(owner_category)) {
            push(category, FeatureRef::Face(face.face_id), face.normal);
        }
    }
    for (index, group) in descriptor.slide_faces.iter().enumerate() {
        let category = group.category();
        if !category.mounts_on(owner_category) {
            continue;
        }
        if let Some(normal) = group.normal() {
            push(category, FeatureRef::SlideGroup(index), normal);
        }
    }
    points
}
