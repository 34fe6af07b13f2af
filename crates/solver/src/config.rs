use mount_kernel::Vec3;
use serde::{Deserialize, Serialize};

/// Tolerances and acceptance threshold for the feature matchers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Absolute tolerance when comparing inter-hole distances (length units).
    pub hole_tolerance: f64,
    /// Absolute tolerance when comparing slide-group distances (length units).
    pub slide_tolerance: f64,
    /// A match is accepted only when its score is strictly greater than this.
    pub accept_threshold: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            hole_tolerance: 1.0,
            slide_tolerance: 2.0,
            accept_threshold: 0.6,
        }
    }
}

/// Reference directions for the alignment solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignConfig {
    /// Canonical "sky" direction that free-standing parts orient towards.
    pub up: Vec3,
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self { up: Vec3::Y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: MatchConfig = serde_json::from_str(r#"{"hole_tolerance": 0.5}"#).unwrap();
        assert_eq!(config.hole_tolerance, 0.5);
        assert_eq!(config.slide_tolerance, 2.0);
        assert_eq!(config.accept_threshold, 0.6);
    }

    #[test]
    fn test_align_config_default_up() {
        assert_eq!(AlignConfig::default().up, Vec3::Y);
    }
}
