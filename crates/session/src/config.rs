use mount_solver::{AlignConfig, MatchConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse session config: {0}")]
    ParseError(String),

    #[error("invalid session config: {0}")]
    Invalid(String),
}

/// Tunables for one assembly session. Missing JSON fields take their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub matching: MatchConfig,
    pub alignment: AlignConfig,
}

impl SessionConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let m = &self.matching;
        if !(m.hole_tolerance >= 0.0) || !(m.slide_tolerance >= 0.0) {
            return Err(ConfigError::Invalid("tolerances must be non-negative".into()));
        }
        if !(0.0..1.0).contains(&m.accept_threshold) {
            return Err(ConfigError::Invalid(format!(
                "accept_threshold {} outside [0, 1)",
                m.accept_threshold
            )));
        }
        if self.alignment.up.normalized().is_none() {
            return Err(ConfigError::Invalid("up direction has zero length".into()));
        }
        Ok(())
    }
}
