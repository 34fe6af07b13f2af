use mount_kernel::Vec3;
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use std::fmt;

use crate::category::Category;

new_key_type! {
    /// Arena key of a placed attachment within a session.
    pub struct PlacedPartId;
}

/// Identity of a part model in the library, e.g. `hotend/Dragon`.
/// Also the descriptor cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(pub String);

impl ModelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of one part instance in an assembly; the consumption ledger key.
/// Two placed copies of the same model have different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartKey(pub String);

impl PartKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Key of the fixed base part.
    pub fn base() -> Self {
        Self("base".to_string())
    }

    /// Key for the `serial`-th placed instance of `model`.
    pub fn instance(model: &ModelId, serial: u64) -> Self {
        Self(format!("{model}#{serial}"))
    }
}

impl fmt::Display for PartKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A consumable mounting feature of a part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum FeatureRef {
    /// A hole-pattern face, by `faceId`.
    Face(u32),
    /// A slide-face group, by index into `slideFaces`.
    SlideGroup(usize),
}

/// Which of a base's two symmetric slots a single-sided attachment targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Primary,
    Opposite,
}

impl Side {
    pub const OPPOSITE_SUFFIX: &'static str = "_opposite";

    pub fn from_point_name(name: &str) -> Self {
        if name.ends_with(Self::OPPOSITE_SUFFIX) {
            Side::Opposite
        } else {
            Side::Primary
        }
    }
}

/// Slot name for the `ordinal`-th feature of `category` on one owner:
/// `hotend`, `hotend_opposite`, `hotend_2`, ...
pub fn point_name(category: Category, ordinal: usize) -> String {
    match ordinal {
        0 => category.as_str().to_string(),
        1 => format!("{category}{}", Side::OPPOSITE_SUFFIX),
        n => format!("{category}_{n}"),
    }
}

/// A mounting slot exposed by a part (the base or a placed attachment).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentPoint {
    pub category: Category,
    /// Includes the side suffix, e.g. `wing_opposite`.
    pub name: String,
    /// Placed part owning the slot; `None` for base-level slots.
    pub owner: Option<PlacedPartId>,
    pub owner_key: PartKey,
    pub feature: FeatureRef,
    /// Slot normal in the owner's local frame.
    pub normal: Vec3,
    pub consumed: bool,
}

impl AttachmentPoint {
    pub fn side(&self) -> Side {
        Side::from_point_name(&self.name)
    }

    pub fn is_visible(&self) -> bool {
        !self.consumed
    }
}

/// Bookkeeping record attached to an accepted match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternMapping {
    pub base_feature: FeatureRef,
    pub attachment_feature: FeatureRef,
    pub base_model: ModelId,
    pub attachment_model: ModelId,
    pub original_category: Category,
}
