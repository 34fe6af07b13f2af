use mount_kernel::Vec3;
use serde::{Deserialize, Serialize};

use crate::category::Category;

/// A circular mounting hole on a planar face, in the part-local frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hole {
    pub id: u32,
    /// Always positive once loaded through the validating loader.
    pub diameter: f64,
    pub position: Vec3,
    /// Hole axis as Euler degrees; only used for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Vec3>,
}

/// A planar mounting face with its hole pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Face {
    /// Unique within the owning part.
    pub face_id: u32,
    /// Unit length once loaded through the validating loader.
    pub normal: Vec3,
    #[serde(default)]
    pub holes: Vec<Hole>,
    /// Category this face accepts, when the face exposes an attachment slot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_type: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Face {
    /// Hole centres in declaration order.
    pub fn hole_positions(&self) -> Vec<Vec3> {
        self.holes.iter().map(|h| h.position).collect()
    }

    /// Mean of the hole centres, or `None` for a face without holes.
    pub fn hole_centroid(&self) -> Option<Vec3> {
        Vec3::centroid(&self.hole_positions())
    }

    pub fn has_holes(&self) -> bool {
        !self.holes.is_empty()
    }
}

/// 2D point in a slide face's own plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

/// Extent of a rectangular slide face.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SlideDimensions {
    pub width: f64,
    pub height: f64,
    #[serde(rename = "center2D", default)]
    pub center_2d: Point2,
}

/// One wall of a push-fit duct channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideFace {
    pub normal: Vec3,
    pub position: Vec3,
    /// Euler degrees.
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default)]
    pub dimensions: SlideDimensions,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlideDistance {
    pub distance: f64,
}

/// Two facing walls a fixed gap apart, plus their precomputed separations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideFaceGroup {
    pub faces: Vec<SlideFace>,
    #[serde(default)]
    pub distances: Vec<SlideDistance>,
    /// Defaults to [`Category::PartCooling`] when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_type: Option<Category>,
}

impl SlideFaceGroup {
    /// Reference point of the group: the mean of its wall positions.
    pub fn midpoint(&self) -> Option<Vec3> {
        let positions: Vec<Vec3> = self.faces.iter().map(|f| f.position).collect();
        Vec3::centroid(&positions)
    }

    /// Normal of the group's first wall.
    pub fn normal(&self) -> Option<Vec3> {
        self.faces.first().map(|f| f.normal)
    }

    pub fn distance_values(&self) -> Vec<f64> {
        self.distances.iter().map(|d| d.distance).collect()
    }

    pub fn category(&self) -> Category {
        self.attachment_type.unwrap_or(Category::PartCooling)
    }
}

/// Face whose normal designates "up" for its part.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientationFace {
    pub normal: Vec3,
}

/// Mounting geometry of one physical part. Loaded once, immutable for the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeometryDescriptor {
    #[serde(default)]
    pub faces: Vec<Face>,
    #[serde(default)]
    pub slide_faces: Vec<SlideFaceGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation_face: Option<OrientationFace>,
}

/// Diameter of the single hole in [`GeometryDescriptor::placeholder`].
pub const PLACEHOLDER_HOLE_DIAMETER: f64 = 6.0;

impl GeometryDescriptor {
    /// Stand-in used when a part's real descriptor cannot be fetched.
    ///
    /// One face with normal (0,0,1) and a single 6.0 hole at the origin. It is
    /// not a real pattern and matches only other single-hole faces.
    pub fn placeholder() -> Self {
        Self {
            faces: vec![Face {
                face_id: 0,
                normal: Vec3::Z,
                holes: vec![Hole {
                    id: 0,
                    diameter: PLACEHOLDER_HOLE_DIAMETER,
                    position: Vec3::ZERO,
                    rotation: None,
                }],
                attachment_type: None,
                name: None,
            }],
            slide_faces: Vec::new(),
            orientation_face: Some(OrientationFace { normal: Vec3::Y }),
        }
    }

    pub fn face(&self, face_id: u32) -> Option<&Face> {
        self.faces.iter().find(|f| f.face_id == face_id)
    }

    pub fn slide_group(&self, index: usize) -> Option<&SlideFaceGroup> {
        self.slide_faces.get(index)
    }

    pub fn orientation(&self) -> Option<Vec3> {
        self.orientation_face.map(|f| f.normal)
    }
}
