//! Session configuration.
//!
//! One TOML file per sensor session: statistics geometry and the scene
//! simulation used by [`SyntheticSource`](super::SyntheticSource), the
//! PredictK and stability tuning, and output settings.

use crate::analysis::{PredictKTuningParams, StabilityConfig, TuningViolation};
use crate::extraction::{ExposureFrameCount, InvalidFrameCount};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Statistics geometry and scene simulation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Exposures merged per frame (1, 2 or 3).
    pub exposure_frame_count: ExposureFrameCount,
    /// Pixels aggregated into each luma zone.
    pub pixels_per_zone: u32,
    /// Sensor black level in luma codes.
    pub black_level: f64,
    /// Long-exposure luma of the scene at the initial exposure.
    pub base_luma: f64,
    /// Luma auto-exposure converges toward.
    pub target_luma: f64,
    /// Initial long-exposure integration time in microseconds.
    pub base_integration_us: f64,
    /// Integration time ratio between adjacent exposures.
    pub hdr_ratio: f64,
    /// Frame at which the scene illumination changes (0 = never).
    pub step_frame: u32,
    /// Illumination multiplier applied at `step_frame`.
    pub step_gain: f64,
    /// Fraction of the remaining error AE corrects per frame.
    pub ae_convergence: f64,
    /// Relative luma error below which AE reports zero deviation.
    pub settle_tolerance: f64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            exposure_frame_count: ExposureFrameCount::Hdr2,
            pixels_per_zone: 4096,
            black_level: 64.0,
            base_luma: 180.0,
            target_luma: 180.0,
            base_integration_us: 10000.0,
            hdr_ratio: 4.0,
            step_frame: 30,
            step_gain: 2.0,
            ae_convergence: 0.5,
            settle_tolerance: 0.01,
        }
    }
}

impl SourceConfig {
    /// Creates a default configuration for the given exposure mode.
    pub fn with_frame_count(exposure_frame_count: ExposureFrameCount) -> Self {
        Self {
            exposure_frame_count,
            ..Default::default()
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pixels_per_zone == 0 {
            return Err(ConfigError::InvalidPixelsPerZone);
        }
        if !self.black_level.is_finite() || self.black_level < 0.0 {
            return Err(ConfigError::InvalidSimulation("black_level"));
        }
        let positive = [
            ("base_luma", self.base_luma),
            ("target_luma", self.target_luma),
            ("base_integration_us", self.base_integration_us),
            ("step_gain", self.step_gain),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, v)| !(v.is_finite() && *v > 0.0)) {
            return Err(ConfigError::InvalidSimulation(*name));
        }
        if !(self.hdr_ratio >= 1.0 && self.hdr_ratio.is_finite()) {
            return Err(ConfigError::InvalidSimulation("hdr_ratio"));
        }
        if !(self.ae_convergence > 0.0 && self.ae_convergence <= 1.0) {
            return Err(ConfigError::InvalidSimulation("ae_convergence"));
        }
        if !(self.settle_tolerance >= 0.0 && self.settle_tolerance.is_finite()) {
            return Err(ConfigError::InvalidSimulation("settle_tolerance"));
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    InvalidFrameCount(#[from] InvalidFrameCount),
    #[error("pixels per zone must be non-zero")]
    InvalidPixelsPerZone,
    #[error("invalid scene simulation parameter: {0}")]
    InvalidSimulation(&'static str),
    #[error("invalid tuning: {0}")]
    InvalidTuning(#[from] TuningViolation),
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SessionFile {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub predict_k: PredictKTuningParams,
    #[serde(default)]
    pub stability: StabilityConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Run continuously (true) or process fixed number of frames (false).
    pub continuous: bool,
    /// Number of frames to process if not continuous.
    pub frame_count: u32,
    /// Metrics server port (0 to disable).
    pub metrics_port: u16,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            continuous: false,
            frame_count: 100,
            metrics_port: 9090,
        }
    }
}

impl SessionFile {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: SessionFile =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.source.validate()?;
        self.predict_k.validate()?;
        self.stability.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(SessionFile::default().validate().is_ok());
    }

    #[test]
    fn test_zero_pixels_per_zone_invalid() {
        let mut config = SourceConfig::default();
        config.pixels_per_zone = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPixelsPerZone)
        ));
    }

    #[test]
    fn test_convergence_range() {
        let mut config = SourceConfig::default();
        config.ae_convergence = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSimulation("ae_convergence"))
        ));
    }

    #[test]
    fn test_parse_full_file() {
        let text = r#"
            [source]
            exposure_frame_count = 3
            pixels_per_zone = 1024
            black_level = 0.0

            [predict_k]
            correction_factor = 1.2
            use_long_low_threshold = 1.05
            use_long_high_threshold = 0.95

            [stability]
            stability_threshold = 0.1

            [output]
            frame_count = 12
            metrics_port = 0
        "#;

        let config = SessionFile::from_toml(text).unwrap();

        assert_eq!(config.source.exposure_frame_count, ExposureFrameCount::Hdr3);
        assert_eq!(config.source.pixels_per_zone, 1024);
        assert_eq!(config.source.hdr_ratio, 4.0);
        assert_eq!(config.predict_k.correction_factor, 1.2);
        assert_eq!(config.predict_k.hdr3x_long_percent, 0.5);
        assert_eq!(config.stability.stability_threshold, 0.1);
        assert_eq!(config.output.frame_count, 12);
        assert!(!config.output.continuous);
    }

    #[test]
    fn test_bad_frame_count_rejected() {
        let result = SessionFile::from_toml("[source]\nexposure_frame_count = 4\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_invalid_tuning_rejected() {
        let result = SessionFile::from_toml("[predict_k]\ncorrection_factor = -1.0\n");
        assert!(matches!(result, Err(ConfigError::InvalidTuning(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = SessionFile::from_file("/nonexistent/session.toml");
        assert!(matches!(result, Err(ConfigError::FileReadError(_))));
    }
}
