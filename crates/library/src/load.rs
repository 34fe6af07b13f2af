use std::collections::HashSet;

use mount_kernel::Vec3;
use mount_types::GeometryDescriptor;
use tracing::debug;

use crate::errors::LoadError;

/// Deserialize and validate a descriptor from a JSON string.
///
/// Normals are normalized; hole diameters must be positive, face ids unique
/// and every slide group must carry at least two faces.
pub fn load_descriptor(json: &str) -> Result<GeometryDescriptor, LoadError> {
    let raw: GeometryDescriptor =
        serde_json::from_str(json).map_err(|e| LoadError::ParseError(e.to_string()))?;
    validate_descriptor(raw)
}

/// Validate an already-deserialized descriptor, returning it with unit normals.
pub fn validate_descriptor(mut descriptor: GeometryDescriptor) -> Result<GeometryDescriptor, LoadError> {
    let mut seen = HashSet::new();
    for face in &mut descriptor.faces {
        let id = face.face_id;
        if !seen.insert(id) {
            return Err(LoadError::DuplicateFaceId(id));
        }
        face.normal = unit(face.normal, || format!("face {id}"))?;
        if let Some(hole) = face.holes.iter().find(|h| !(h.diameter > 0.0)) {
            return Err(LoadError::InvalidHole {
                face_id: id,
                hole_id: hole.id,
                diameter: hole.diameter,
            });
        }
    }

    for (index, group) in descriptor.slide_faces.iter_mut().enumerate() {
        if group.faces.len() < 2 {
            return Err(LoadError::MalformedSlideGroup {
                index,
                faces: group.faces.len(),
            });
        }
        for (i, wall) in group.faces.iter_mut().enumerate() {
            wall.normal = unit(wall.normal, || format!("slide group {index} face {i}"))?;
        }
    }

    if let Some(orientation) = descriptor.orientation_face.as_mut() {
        orientation.normal = unit(orientation.normal, || "orientation face".to_string())?;
    }

    debug!(
        faces = descriptor.faces.len(),
        slide_groups = descriptor.slide_faces.len(),
        "descriptor validated"
    );
    Ok(descriptor)
}

fn unit(v: Vec3, context: impl FnOnce() -> String) -> Result<Vec3, LoadError> {
    if !v.is_finite() {
        return Err(LoadError::ZeroNormal(context()));
    }
    v.normalized().ok_or_else(|| LoadError::ZeroNormal(context()))
}

/// Serialize a descriptor to pretty-printed JSON.
pub fn save_descriptor(descriptor: &GeometryDescriptor) -> Result<String, LoadError> {
    serde_json::to_string_pretty(descriptor).map_err(|e| LoadError::ParseError(e.to_string()))
}
