//! Tunables for the card pipeline

use crate::error::{CardError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Minimum time between two full analyses
    pub throttle_interval_ms: u64,
    /// Card background: saturation at most this (0-255)
    pub saturation_max: u8,
    /// Card background: value at least this (0-255)
    pub value_min: u8,
    /// Structuring element radius; 2 gives a 5x5 square
    pub morph_radius: u8,
    pub min_area: f32,
    pub min_aspect: f32,
    pub max_aspect: f32,
    /// Correlation a template must beat to be accepted
    pub match_threshold: f32,
    pub tint: [u8; 3],
    /// Share of the tint in the blended overlay
    pub tint_weight: f32,
    pub text_anchor: (i32, i32),
    pub text_scale: f32,
    pub no_cards_text: String,
    pub ocr_error_text: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            throttle_interval_ms: 2000,
            saturation_max: 50,
            value_min: 200,
            morph_radius: 2,
            min_area: 500.0,
            min_aspect: 0.4,
            max_aspect: 1.0,
            match_threshold: 0.7,
            tint: [0, 255, 0],
            tint_weight: 0.2,
            text_anchor: (10, 10),
            text_scale: 24.0,
            no_cards_text: "No cards identified".to_string(),
            ocr_error_text: "OCR Error".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load a JSON config file; missing fields take their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn throttle_interval(&self) -> Duration {
        Duration::from_millis(self.throttle_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.throttle_interval_ms == 0 {
            return Err(CardError::Config("Throttle interval must be positive".to_string()));
        }
        if self.min_aspect <= 0.0 || self.max_aspect <= 0.0 {
            return Err(CardError::Config("Aspect bounds must be positive".to_string()));
        }
        if self.min_aspect > self.max_aspect {
            return Err(CardError::Config(format!(
                "min_aspect {} exceeds max_aspect {}",
                self.min_aspect, self.max_aspect
            )));
        }
        if !(-1.0..=1.0).contains(&self.match_threshold) {
            return Err(CardError::Config("Match threshold must lie in [-1, 1]".to_string()));
        }
        if !(0.0..=1.0).contains(&self.tint_weight) {
            return Err(CardError::Config("Tint weight must lie in [0, 1]".to_string()));
        }
        if self.text_scale <= 0.0 {
            return Err(CardError::Config("Text scale must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = PipelineConfig::default();
        assert_eq!(config.throttle_interval(), Duration::from_millis(2000));
        assert_eq!(config.saturation_max, 50);
        assert_eq!(config.value_min, 200);
        assert_eq!(config.min_area, 500.0);
        assert_eq!(config.match_threshold, 0.7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_rejects_inverted_aspect() {
        let config = PipelineConfig {
            min_aspect: 1.2,
            max_aspect: 1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_rejects_zero_interval() {
        let config = PipelineConfig {
            throttle_interval_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_partial_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "throttle_interval_ms": 500, "tint": [255, 0, 0] }"#).unwrap();

        let config = PipelineConfig::from_file(&path).unwrap();
        assert_eq!(config.throttle_interval_ms, 500);
        assert_eq!(config.tint, [255, 0, 0]);
        assert_eq!(config.no_cards_text, "No cards identified");
    }
}
