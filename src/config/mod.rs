//! Configuration types for the impedance pivot pipeline.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Marker that opens the measurement-result section of an instrument log.
pub const SECTION_MARKER: &str = "List_Meas_Result";

/// Frequency-match tolerance in kHz.
pub const DEFAULT_EPSILON: f64 = 1e-3;

/// Unit every primary/secondary value is normalized to.
pub const CANONICAL_UNIT: &str = "kohm";

/// Upper bound on display label length, in characters.
pub const DEFAULT_MAX_LABEL_LEN: usize = 127;

/// What to do with a record whose unit tag is not a known
/// [`Unit`](crate::processors::units::Unit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitPolicy {
    /// Drop the whole record unless both tags are recognized.
    #[default]
    Strict,
    /// Treat unknown tags as already canonical.
    Lenient,
}

/// Configuration for log parsing and frequency matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Substring that starts the data section
    #[serde(default = "default_section_marker")]
    pub section_marker: String,

    /// Frequencies closer than this are merged into one row
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,

    /// Handling of unrecognized unit tags
    #[serde(default)]
    pub unit_policy: UnitPolicy,

    /// Maximum characters kept from a file's basename
    #[serde(default = "default_max_label_len")]
    pub max_label_len: usize,

    /// Extract files on the rayon pool
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

fn default_section_marker() -> String {
    SECTION_MARKER.to_string()
}

fn default_epsilon() -> f64 {
    DEFAULT_EPSILON
}

fn default_max_label_len() -> usize {
    DEFAULT_MAX_LABEL_LEN
}

fn default_parallel() -> bool {
    true
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            section_marker: default_section_marker(),
            epsilon: default_epsilon(),
            unit_policy: UnitPolicy::default(),
            max_label_len: default_max_label_len(),
            parallel: default_parallel(),
        }
    }
}

/// Factors applied by the `scale` command.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScalingConfig {
    /// Multiplier for every `Primary*` column
    #[serde(default = "default_primary_factor")]
    pub primary_factor: f64,

    /// Multiplier for every `Secondary*` column
    #[serde(default = "default_secondary_factor")]
    pub secondary_factor: f64,
}

fn default_primary_factor() -> f64 {
    1000.0
}

fn default_secondary_factor() -> f64 {
    -1000.0
}

impl Default for ScalingConfig {
    fn default() -> Self {
        Self {
            primary_factor: default_primary_factor(),
            secondary_factor: default_secondary_factor(),
        }
    }
}

/// Main pipeline configuration combining all sub-configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub extraction: ExtractionConfig,

    #[serde(default)]
    pub scaling: ScalingConfig,
}

impl PipelineConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<(), String> {
        let eps = self.extraction.epsilon;
        if !eps.is_finite() || eps <= 0.0 {
            return Err(format!("epsilon must be a positive finite number, got {eps}"));
        }
        if self.extraction.max_label_len == 0 {
            return Err("max_label_len must be at least 1".to_string());
        }
        if self.extraction.section_marker.is_empty() {
            return Err("section_marker must not be empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_pipeline_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.extraction.section_marker, "List_Meas_Result");
        assert_eq!(config.extraction.epsilon, 1e-3);
        assert_eq!(config.extraction.unit_policy, UnitPolicy::Strict);
        assert_eq!(config.extraction.max_label_len, 127);
        assert_eq!(config.scaling.primary_factor, 1000.0);
        assert_eq!(config.scaling.secondary_factor, -1000.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: PipelineConfig =
            serde_yaml::from_str("extraction:\n  epsilon: 0.000001\n  unit_policy: lenient\n")
                .unwrap();
        assert_eq!(config.extraction.epsilon, 1e-6);
        assert_eq!(config.extraction.unit_policy, UnitPolicy::Lenient);
        assert_eq!(config.extraction.section_marker, SECTION_MARKER);
        assert!(config.extraction.parallel);
    }

    #[test]
    fn test_yaml_round_trip_through_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pivot.yaml");

        let mut config = PipelineConfig::default();
        config.extraction.max_label_len = 16;
        config.to_yaml(&path).unwrap();

        let loaded = PipelineConfig::from_yaml(&path).unwrap();
        assert_eq!(loaded.extraction.max_label_len, 16);
    }

    #[test]
    fn test_validate_rejects_bad_epsilon() {
        let mut config = PipelineConfig::default();
        config.extraction.epsilon = 0.0;
        assert!(config.validate().is_err());

        config.extraction.epsilon = f64::NAN;
        assert!(config.validate().is_err());
    }
}
