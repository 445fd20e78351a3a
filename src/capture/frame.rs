//! Per-frame statistics delivered by the capture pipeline.

use crate::extraction::{ExposureFrameCount, MAX_EXPOSURES, ZONE_COUNT};

/// Raw per-zone luma accumulators for one frame.
///
/// Index 0 always holds the longest active exposure.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawLumaStats {
    /// Per-exposure, per-zone luma sums.
    pub sums: [[u32; ZONE_COUNT]; MAX_EXPOSURES],
}

impl RawLumaStats {
    /// Creates accumulators from per-exposure zone sums.
    pub fn new(sums: [[u32; ZONE_COUNT]; MAX_EXPOSURES]) -> Self {
        Self { sums }
    }

    /// Creates accumulators where every zone of an exposure holds the same sum.
    pub fn uniform(per_exposure: [u32; MAX_EXPOSURES]) -> Self {
        Self {
            sums: per_exposure.map(|sum| [sum; ZONE_COUNT]),
        }
    }

    /// Returns the zone sums for a raw exposure index.
    #[inline]
    pub fn exposure(&self, index: usize) -> &[u32; ZONE_COUNT] {
        &self.sums[index]
    }
}

/// Analog gain and integration time of one exposure.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GainTime {
    pub analog_gain: f64,
    pub integration_time: f64,
}

impl GainTime {
    pub fn new(analog_gain: f64, integration_time: f64) -> Self {
        Self {
            analog_gain,
            integration_time,
        }
    }

    /// Exposure value (gain × integration time).
    #[inline]
    pub fn value(&self) -> f64 {
        self.analog_gain * self.integration_time
    }

    /// True if either factor is zero.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.analog_gain == 0.0 || self.integration_time == 0.0
    }
}

/// Exposure settings reported by auto-exposure for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExposureDescriptor {
    /// Single-exposure settings, used in linear mode.
    pub linear: GainTime,
    /// HDR settings, index 0 = longest exposure.
    pub hdr: [GainTime; MAX_EXPOSURES],
}

impl ExposureDescriptor {
    /// Creates a linear-mode descriptor.
    pub fn linear(exposure: GainTime) -> Self {
        Self {
            linear: exposure,
            ..Default::default()
        }
    }

    /// Creates an HDR-mode descriptor.
    pub fn hdr(exposures: [GainTime; MAX_EXPOSURES]) -> Self {
        Self {
            linear: GainTime::default(),
            hdr: exposures,
        }
    }
}

/// Everything the engine consumes for one frame.
#[derive(Clone)]
pub struct FrameStats {
    /// Frame id; 0 marks a stream restart.
    pub frame_id: u32,
    /// Exposure mode the statistics were captured in.
    pub frame_count: ExposureFrameCount,
    /// Luma accumulators of the current frame.
    pub current_luma: RawLumaStats,
    /// Luma accumulators predicted for the next frame.
    pub next_luma: RawLumaStats,
    /// Exposure of the current frame.
    pub current_exposure: ExposureDescriptor,
    /// Exposure AE programmed for the next frame.
    pub next_exposure: ExposureDescriptor,
    /// Per-channel luma deviation, index 0 = shortest exposure.
    pub deviation: [f64; MAX_EXPOSURES],
    /// Pixels aggregated per zone.
    pub pixels_per_zone: u32,
    /// Black level subtracted from each zone mean.
    pub black_level: f64,
}

impl std::fmt::Debug for FrameStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameStats")
            .field("frame_id", &self.frame_id)
            .field("frame_count", &self.frame_count)
            .field("deviation", &self.deviation)
            .field("pixels_per_zone", &self.pixels_per_zone)
            .field("black_level", &self.black_level)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gain_time_value() {
        let exposure = GainTime::new(2.0, 0.01);
        assert!((exposure.value() - 0.02).abs() < 1e-12);
        assert!(!exposure.is_degenerate());
        assert!(GainTime::new(0.0, 0.01).is_degenerate());
    }

    #[test]
    fn test_uniform_luma() {
        let raw = RawLumaStats::uniform([100, 50, 10]);
        assert!(raw.exposure(0).iter().all(|&v| v == 100));
        assert!(raw.exposure(2).iter().all(|&v| v == 10));
    }

    #[test]
    fn test_linear_descriptor_clears_hdr() {
        let descriptor = ExposureDescriptor::linear(GainTime::new(1.0, 100.0));
        assert_eq!(descriptor.linear.value(), 100.0);
        assert!(descriptor.hdr.iter().all(|pair| pair.value() == 0.0));
    }
}
