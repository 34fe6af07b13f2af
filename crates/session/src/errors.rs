use mount_types::{ModelId, PlacedPartId};

/// Errors from a placement or detach request. All of them leave the session
/// exactly as it was before the request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlacementError {
    #[error("no matching pattern found for {model} at {point}")]
    NoCompatibleFeature { point: String, model: ModelId },

    #[error("placement request {ticket} was superseded by a newer selection")]
    Superseded { ticket: u64 },

    #[error("attachment point {point} is not available")]
    PointUnavailable { point: String },

    #[error("placed part {0:?} not found")]
    PartNotFound(PlacedPartId),
}
