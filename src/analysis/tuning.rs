//! Per-sensor tuning for PredictK and scene stability.
//!
//! Loaded once per session from the calibration file and read-only
//! afterwards.

use serde::{Deserialize, Serialize};

/// Tuning parameters of the PredictK calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictKTuningParams {
    /// Scale applied to the driving ratio before the log mapping.
    pub correction_factor: f64,
    /// Offset applied to the driving ratio before the log mapping.
    pub correction_offset: f64,
    /// The long channel drives the result when its ratio exceeds this.
    pub use_long_low_threshold: f64,
    /// The long channel drives the result when its ratio is below this.
    pub use_long_high_threshold: f64,
    /// Weight of the long ratio against the mid ratio in 3-exposure mode.
    pub hdr3x_long_percent: f64,
}

impl Default for PredictKTuningParams {
    fn default() -> Self {
        Self {
            correction_factor: 1.0,
            correction_offset: 0.0,
            use_long_low_threshold: 1.02,
            use_long_high_threshold: 0.98,
            hdr3x_long_percent: 0.5,
        }
    }
}

impl PredictKTuningParams {
    /// Wide hysteresis band; the long channel only drives on large changes.
    pub fn conservative() -> Self {
        Self {
            use_long_low_threshold: 1.1,
            use_long_high_threshold: 0.9,
            hdr3x_long_percent: 0.3,
            ..Default::default()
        }
    }

    /// Narrow hysteresis band; the long channel drives on almost any change.
    pub fn responsive() -> Self {
        Self {
            use_long_low_threshold: 1.005,
            use_long_high_threshold: 0.995,
            hdr3x_long_percent: 0.7,
            ..Default::default()
        }
    }

    /// Checks that the parameters describe a usable mapping.
    pub fn validate(&self) -> Result<(), TuningViolation> {
        let fields = [
            ("correction_factor", self.correction_factor),
            ("correction_offset", self.correction_offset),
            ("use_long_low_threshold", self.use_long_low_threshold),
            ("use_long_high_threshold", self.use_long_high_threshold),
            ("hdr3x_long_percent", self.hdr3x_long_percent),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, value)| !value.is_finite()) {
            return Err(TuningViolation::NotFinite { field: *name });
        }

        if self.correction_factor <= 0.0 {
            return Err(TuningViolation::CorrectionFactor {
                observed: self.correction_factor,
            });
        }

        if !(0.0..=1.0).contains(&self.hdr3x_long_percent) {
            return Err(TuningViolation::LongPercent {
                observed: self.hdr3x_long_percent,
            });
        }

        if self.use_long_high_threshold > self.use_long_low_threshold {
            tracing::warn!(
                low = self.use_long_low_threshold,
                high = self.use_long_high_threshold,
                "Long-channel band is inverted; long ratio will always drive"
            );
        }

        Ok(())
    }
}

/// Tuning of the scene stability detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilityConfig {
    /// Deviation at or below which the scene counts as stable.
    pub stability_threshold: f64,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            stability_threshold: 0.05,
        }
    }
}

impl StabilityConfig {
    pub fn validate(&self) -> Result<(), TuningViolation> {
        if !self.stability_threshold.is_finite() || self.stability_threshold < 0.0 {
            return Err(TuningViolation::StabilityThreshold {
                observed: self.stability_threshold,
            });
        }
        Ok(())
    }
}

/// Tuning validation failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TuningViolation {
    #[error("{field} must be finite")]
    NotFinite { field: &'static str },

    #[error("correction factor {observed} must be positive")]
    CorrectionFactor { observed: f64 },

    #[error("hdr3x long percent {observed} outside [0, 1]")]
    LongPercent { observed: f64 },

    #[error("stability threshold {observed} must be a non-negative number")]
    StabilityThreshold { observed: f64 },
}
