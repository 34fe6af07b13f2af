use std::path::PathBuf;

use mount_types::ModelId;

/// Errors while parsing or validating a geometry descriptor document.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LoadError {
    #[error("failed to parse descriptor: {0}")]
    ParseError(String),

    #[error("hole {hole_id} on face {face_id} has non-positive diameter {diameter}")]
    InvalidHole { face_id: u32, hole_id: u32, diameter: f64 },

    #[error("zero-length normal on {0}")]
    ZeroNormal(String),

    #[error("face id {0} appears more than once")]
    DuplicateFaceId(u32),

    #[error("slide group {index} has {faces} faces, expected at least 2")]
    MalformedSlideGroup { index: usize, faces: usize },
}

/// Errors while fetching a descriptor from a [`crate::DescriptorSource`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DescriptorError {
    #[error("no descriptor for model {0}")]
    NotFound(ModelId),

    #[error("failed to read descriptor for {model}: {message}")]
    Io { model: ModelId, message: String },

    #[error("invalid descriptor for {model}: {source}")]
    Invalid { model: ModelId, source: LoadError },
}

/// Errors while scanning the part library.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LibraryError {
    #[error("cannot read library directory {path}: {message}")]
    Unreadable { path: PathBuf, message: String },
}
