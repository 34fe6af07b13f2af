pub mod config;
pub mod errors;
pub mod points;
pub mod session;

pub use config::{ConfigError, SessionConfig};
pub use errors::PlacementError;
pub use points::{enumerate_points, PointRef};
pub use session::{PendingAttach, PlacedPart, SessionState};
