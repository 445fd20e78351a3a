//! Statistics source abstraction.
//!
//! The capture pipeline and AE algorithm are external; this trait is the
//! seam they plug into. [`SyntheticSource`] simulates a scene with one
//! illumination step and an AE loop converging on it, which is enough to
//! drive the engine through a full disturb/settle cycle.

use super::frame::{ExposureDescriptor, FrameStats, GainTime, RawLumaStats};
use super::SourceConfig;
use crate::extraction::{ExposureFrameCount, MAX_EXPOSURES, ZONE_COUNT};
use thiserror::Error;

/// Saturation level of the simulated sensor in luma codes.
const MAX_LUMA: f64 = 1023.0;

/// Integration time beyond which AE raises analog gain instead.
const MAX_INTEGRATION_US: f64 = 33000.0;

/// Errors that can occur while pulling statistics.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to configure statistics source: {0}")]
    ConfigFailed(String),
    #[error("failed to capture statistics: {0}")]
    CaptureFailed(String),
    #[error("statistics source not initialized")]
    NotInitialized,
}

/// Trait for per-frame statistics producers.
pub trait StatsSource {
    /// Opens the source with the given configuration.
    fn open(&mut self, config: &SourceConfig) -> Result<(), SourceError>;

    /// Pulls the statistics of the next frame.
    fn capture(&mut self) -> Result<FrameStats, SourceError>;

    /// Checks if the source is currently open.
    fn is_open(&self) -> bool;

    /// Closes the source.
    fn close(&mut self);
}

/// Deterministic scene and AE simulation.
#[derive(Debug, Default)]
pub struct SyntheticSource {
    config: Option<SourceConfig>,
    frame_id: u32,
    /// Long-exposure value (gain × integration) of the current frame.
    exposure: f64,
}

impl SyntheticSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Illumination multiplier in effect at a frame.
    fn illumination(config: &SourceConfig, frame_id: u32) -> f64 {
        if config.step_frame != 0 && frame_id >= config.step_frame {
            config.step_gain
        } else {
            1.0
        }
    }

    /// Exposure values per raw index (0 = longest) for a long exposure.
    fn exposure_ladder(config: &SourceConfig, long: f64) -> [f64; MAX_EXPOSURES] {
        let mut ladder = [0.0; MAX_EXPOSURES];
        let mut value = long;
        for slot in ladder.iter_mut().take(config.exposure_frame_count.get()) {
            *slot = value;
            value /= config.hdr_ratio;
        }
        ladder
    }

    /// Mean luma produced by an exposure value, before black level.
    fn luma(config: &SourceConfig, illumination: f64, exposure: f64) -> f64 {
        (config.base_luma * illumination * exposure / config.base_integration_us).clamp(0.0, MAX_LUMA)
    }

    /// Splits an exposure value into integration time and analog gain.
    fn gain_time(exposure: f64) -> GainTime {
        if exposure <= MAX_INTEGRATION_US {
            GainTime::new(1.0, exposure)
        } else {
            GainTime::new(exposure / MAX_INTEGRATION_US, MAX_INTEGRATION_US)
        }
    }

    fn descriptor(config: &SourceConfig, long: f64) -> ExposureDescriptor {
        let ladder = Self::exposure_ladder(config, long);
        match config.exposure_frame_count {
            ExposureFrameCount::Linear => ExposureDescriptor::linear(Self::gain_time(ladder[0])),
            _ => ExposureDescriptor::hdr(ladder.map(|value| {
                if value > 0.0 {
                    Self::gain_time(value)
                } else {
                    GainTime::default()
                }
            })),
        }
    }

    fn raw_luma(config: &SourceConfig, illumination: f64, long: f64) -> RawLumaStats {
        let ladder = Self::exposure_ladder(config, long);
        let ppz = config.pixels_per_zone as f64;
        let mut sums = [[0u32; ZONE_COUNT]; MAX_EXPOSURES];

        for (index, &exposure) in ladder.iter().enumerate() {
            if exposure <= 0.0 {
                continue;
            }
            let mean = Self::luma(config, illumination, exposure);
            for (zone, sum) in sums[index].iter_mut().enumerate() {
                let level = mean * zone_weight(zone) + config.black_level;
                *sum = (level * ppz).round() as u32;
            }
        }

        RawLumaStats::new(sums)
    }

    /// Relative distance to the AE target per channel, shortest first.
    fn deviation(config: &SourceConfig, illumination: f64, long: f64) -> [f64; MAX_EXPOSURES] {
        let count = config.exposure_frame_count.get();
        let ladder = Self::exposure_ladder(config, long);
        let mut deviation = [0.0; MAX_EXPOSURES];

        for (channel, value) in deviation.iter_mut().take(count).enumerate() {
            // Shortest exposure lives at the highest raw index.
            let raw_index = count - 1 - channel;
            let target = config.target_luma / config.hdr_ratio.powi(raw_index as i32);
            let luma = Self::luma(config, illumination, ladder[raw_index]);
            let error = (luma - target).abs() / target;
            *value = if error < config.settle_tolerance { 0.0 } else { error };
        }

        deviation
    }
}

/// Vignetting falloff over the 4x4 zone grid.
fn zone_weight(zone: usize) -> f64 {
    let (row, col) = ((zone / 4) as f64, (zone % 4) as f64);
    let distance = ((row - 1.5).powi(2) + (col - 1.5).powi(2)).sqrt();
    1.0 - 0.05 * distance
}

impl StatsSource for SyntheticSource {
    fn open(&mut self, config: &SourceConfig) -> Result<(), SourceError> {
        config
            .validate()
            .map_err(|e| SourceError::ConfigFailed(e.to_string()))?;
        self.config = Some(config.clone());
        self.frame_id = 0;
        self.exposure = config.base_integration_us;
        tracing::info!(
            frame_count = %config.exposure_frame_count,
            step_frame = config.step_frame,
            step_gain = config.step_gain,
            "SyntheticSource opened"
        );
        Ok(())
    }

    fn capture(&mut self) -> Result<FrameStats, SourceError> {
        let config = self.config.as_ref().ok_or(SourceError::NotInitialized)?;

        let frame_id = self.frame_id;
        let illumination = Self::illumination(config, frame_id);
        let current = self.exposure;

        // AE moves a fraction of the way toward the exposure that hits target.
        let luma = Self::luma(config, illumination, current);
        let ideal = if luma > 0.0 {
            current * config.target_luma / luma
        } else {
            current * 2.0
        };
        let next = current + (ideal - current) * config.ae_convergence;

        let stats = FrameStats {
            frame_id,
            frame_count: config.exposure_frame_count,
            current_luma: Self::raw_luma(config, illumination, current),
            next_luma: Self::raw_luma(config, illumination, next),
            current_exposure: Self::descriptor(config, current),
            next_exposure: Self::descriptor(config, next),
            deviation: Self::deviation(config, illumination, current),
            pixels_per_zone: config.pixels_per_zone,
            black_level: config.black_level,
        };

        self.exposure = next;
        self.frame_id = self.frame_id.wrapping_add(1);
        Ok(stats)
    }

    fn is_open(&self) -> bool {
        self.config.is_some()
    }

    fn close(&mut self) {
        self.config = None;
        tracing::info!("SyntheticSource closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_lifecycle() {
        let mut source = SyntheticSource::new();
        assert!(!source.is_open());

        source.open(&SourceConfig::default()).unwrap();
        assert!(source.is_open());

        let first = source.capture().unwrap();
        assert_eq!(first.frame_id, 0);
        let second = source.capture().unwrap();
        assert_eq!(second.frame_id, 1);

        source.close();
        assert!(!source.is_open());
    }

    #[test]
    fn test_capture_without_open() {
        let mut source = SyntheticSource::new();
        assert!(matches!(source.capture(), Err(SourceError::NotInitialized)));
    }

    #[test]
    fn test_open_rejects_invalid_config() {
        let mut source = SyntheticSource::new();
        let config = SourceConfig {
            pixels_per_zone: 0,
            ..Default::default()
        };
        assert!(matches!(
            source.open(&config),
            Err(SourceError::ConfigFailed(_))
        ));
    }

    #[test]
    fn test_settled_scene_has_zero_deviation() {
        let mut source = SyntheticSource::new();
        source
            .open(&SourceConfig {
                step_frame: 0,
                ..Default::default()
            })
            .unwrap();

        for _ in 0..5 {
            let stats = source.capture().unwrap();
            assert_eq!(stats.deviation, [0.0; MAX_EXPOSURES]);
        }
    }

    #[test]
    fn test_step_disturbs_then_converges() {
        let config = SourceConfig {
            step_frame: 3,
            step_gain: 2.0,
            ae_convergence: 0.5,
            ..Default::default()
        };
        let mut source = SyntheticSource::new();
        source.open(&config).unwrap();

        let frames: Vec<_> = (0..40).map(|_| source.capture().unwrap()).collect();

        assert_eq!(frames[2].deviation[1], 0.0);
        assert!(frames[3].deviation[1] > 0.5);
        assert_eq!(frames[39].deviation, [0.0; MAX_EXPOSURES]);
    }

    #[test]
    fn test_linear_mode_fills_index_zero_only() {
        let mut source = SyntheticSource::new();
        source
            .open(&SourceConfig::with_frame_count(ExposureFrameCount::Linear))
            .unwrap();

        let stats = source.capture().unwrap();

        assert!(stats.current_luma.exposure(0).iter().all(|&sum| sum > 0));
        assert!(stats.current_luma.exposure(1).iter().all(|&sum| sum == 0));
        assert!(stats.current_exposure.linear.value() > 0.0);
    }
}
