//! Error type and descriptor construction helpers for harness scenarios.

use mount_kernel::Vec3;
use mount_library::DescriptorError;
use mount_session::PlacementError;
use mount_types::{
    Category, Face, GeometryDescriptor, Hole, OrientationFace, SlideDistance, SlideFace, SlideFaceGroup,
};

/// Hole diameter used by every fixture face.
pub const FIXTURE_HOLE_DIAMETER: f64 = 3.2;

/// Errors surfaced by the harness.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("part not found: {name}")]
    PartNotFound { name: String },

    #[error("part name already used: {name}")]
    DuplicateName { name: String },

    #[error("placement of {name} failed: {source}")]
    Placement {
        name: String,
        #[source]
        source: PlacementError,
    },

    #[error("descriptor rejected: {0}")]
    Descriptor(#[from] DescriptorError),

    #[error("assertion failed: {detail}")]
    AssertionFailed { detail: String },

    #[error("oracle failure ({oracle}): {detail}")]
    OracleFailure { oracle: String, detail: String },
}

// ── Feature Builders ────────────────────────────────────────────────────────

/// A face whose holes sit at `holes`, numbered in order.
pub fn hole_face(id: u32, normal: Vec3, category: Option<Category>, holes: &[[f64; 3]]) -> Face {
    Face {
        face_id: id,
        normal,
        holes: holes
            .iter()
            .enumerate()
            .map(|(i, &[x, y, z])| Hole {
                id: i as u32,
                diameter: FIXTURE_HOLE_DIAMETER,
                position: Vec3::new(x, y, z),
                rotation: None,
            })
            .collect(),
        attachment_type: category,
        name: None,
    }
}

/// Corners of a `w` x `h` rectangle in the plane `z`, starting at (`x`, `y`),
/// listed counter-clockwise.
pub fn rect_holes(x: f64, y: f64, z: f64, w: f64, h: f64) -> Vec<[f64; 3]> {
    vec![[x, y, z], [x + w, y, z], [x + w, y + h, z], [x, y + h, z]]
}

/// A duct channel centred at `x`: two walls 10 apart along X facing each other.
pub fn duct_group(x: f64, distance: f64) -> SlideFaceGroup {
    let wall = |offset: f64, nx: f64| SlideFace {
        normal: Vec3::new(nx, 0.0, 0.0),
        position: Vec3::new(x + offset, 0.0, 0.0),
        rotation: Vec3::ZERO,
        dimensions: Default::default(),
    };
    SlideFaceGroup {
        faces: vec![wall(-5.0, 1.0), wall(5.0, -1.0)],
        distances: vec![SlideDistance { distance }],
        attachment_type: None,
    }
}

// ── Descriptor Builder ──────────────────────────────────────────────────────

/// Fluent construction of a [`GeometryDescriptor`]. The orientation face
/// defaults to +Y.
#[derive(Debug, Clone)]
pub struct DescriptorBuilder {
    descriptor: GeometryDescriptor,
}

impl Default for DescriptorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DescriptorBuilder {
    pub fn new() -> Self {
        Self {
            descriptor: GeometryDescriptor {
                faces: Vec::new(),
                slide_faces: Vec::new(),
                orientation_face: Some(OrientationFace { normal: Vec3::Y }),
            },
        }
    }

    /// Add a mounting face that exposes a `category` slot.
    pub fn slot(self, id: u32, normal: Vec3, category: Category, holes: &[[f64; 3]]) -> Self {
        self.face(hole_face(id, normal, Some(category), holes))
    }

    /// Add a face that only mates with a slot on another part.
    pub fn mating(self, id: u32, normal: Vec3, holes: &[[f64; 3]]) -> Self {
        self.face(hole_face(id, normal, None, holes))
    }

    pub fn face(mut self, face: Face) -> Self {
        self.descriptor.faces.push(face);
        self
    }

    pub fn duct(mut self, x: f64, distance: f64) -> Self {
        self.descriptor.slide_faces.push(duct_group(x, distance));
        self
    }

    pub fn orientation(mut self, normal: Option<Vec3>) -> Self {
        self.descriptor.orientation_face = normal.map(|normal| OrientationFace { normal });
        self
    }

    pub fn build(self) -> GeometryDescriptor {
        self.descriptor
    }
}
