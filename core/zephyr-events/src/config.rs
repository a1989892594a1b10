//! Emitter configuration

use crate::error::{EmitterError, Result};
use serde::{Deserialize, Serialize};

/// Upper bound for `initial_capacity`
pub const MAX_INITIAL_CAPACITY: usize = 1 << 20;

/// Settings for [`Emitter::with_config`](crate::Emitter::with_config)
///
/// ```toml
/// initial_capacity = 64
/// track_stats = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    /// Number of event keys to pre-allocate room for
    pub initial_capacity: usize,

    /// Keep per-key emission counters
    pub track_stats: bool,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 16,
            track_stats: true,
        }
    }
}

impl EmitterConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.initial_capacity > MAX_INITIAL_CAPACITY {
            return Err(EmitterError::Config(format!(
                "initial_capacity {} exceeds {}",
                self.initial_capacity, MAX_INITIAL_CAPACITY
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = EmitterConfig::from_toml_str("").unwrap();
        assert_eq!(config, EmitterConfig::default());
    }

    #[test]
    fn test_partial_document() {
        let config = EmitterConfig::from_toml_str("track_stats = false").unwrap();
        assert!(!config.track_stats);
        assert_eq!(config.initial_capacity, 16);
    }

    #[test]
    fn test_rejects_oversized_capacity() {
        let err = EmitterConfig::from_toml_str("initial_capacity = 2000000").unwrap_err();
        assert!(matches!(err, EmitterError::Config(_)));
    }

    #[test]
    fn test_rejects_wrong_type() {
        let err = EmitterConfig::from_toml_str("track_stats = \"yes\"").unwrap_err();
        assert!(matches!(err, EmitterError::Config(_)));
    }
}
