//! PredictK: log-domain TMO gain correction.
//!
//! Compares next-frame luma against current-frame luma per exposure
//! channel, picks the channel that drives the correction, maps the ratio
//! into log2 space and scales it to Q11. A noise gate based on the
//! luma-per-exposure change of a reference channel zeroes the result for
//! spurious changes.

use super::tuning::PredictKTuningParams;
use crate::extraction::{Channel, ChannelSet, ExposureFrameCount, ExposureInfo, LumaStats};

/// Scale of the Q11 fixed-point output.
pub const Q11_SCALE: f64 = 2048.0;

/// Environment change at or below which the correction is suppressed.
pub const ENV_CHANGE_GATE: f64 = 0.005;

/// Reference-channel luma delta at or above which the correction is suppressed.
pub const REF_DELTA_GATE: f64 = 1.0;

/// Lower clamp of the log argument for falling ratios.
const MIN_LOG_ARGUMENT: f64 = 0.00001;

/// Channel (or blend) that produced the driving ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrivingSource {
    Short,
    Long,
    /// Long/mid blend in three-exposure mode.
    BlendedLong,
}

/// Why a frame produced a zero correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suppression {
    /// Environment luminance barely changed.
    EnvironmentSteady,
    /// Reference channel luma moved by a full code or more.
    ReferenceSwing,
    /// Exposure data could not produce a usable ratio.
    InvalidExposure,
}

/// Full breakdown of one PredictK calculation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictKReport {
    /// Guarded next/current luma ratio per channel (1.0 for inactive channels).
    pub ratios: ChannelSet<f64>,
    pub driving_source: DrivingSource,
    pub driving_ratio: f64,
    pub reference_channel: Channel,
    pub env_lv_change: f64,
    pub reference_delta: f64,
    /// Log2 value before the gate.
    pub raw_predict_k: f64,
    pub suppression: Option<Suppression>,
    /// Q11 output.
    pub value: i32,
}

impl PredictKReport {
    /// True if the correction survived the gate.
    #[inline]
    pub fn is_applied(&self) -> bool {
        self.suppression.is_none()
    }
}

/// Next/current ratio with non-positive operands clamped to 1.
#[inline]
pub fn guarded_ratio(next: f64, current: f64) -> f64 {
    let next = if next <= 0.0 { 1.0 } else { next };
    let current = if current <= 0.0 { 1.0 } else { current };
    next / current
}

/// Computes the Q11 PredictK value.
#[derive(Debug, Clone, Copy)]
pub struct PredictKCalculator {
    params: PredictKTuningParams,
}

impl PredictKCalculator {
    pub fn new(params: PredictKTuningParams) -> Self {
        Self { params }
    }

    /// Returns the tuning in use.
    pub fn params(&self) -> &PredictKTuningParams {
        &self.params
    }

    /// Computes the Q11 correction for one frame.
    pub fn calculate(
        &self,
        luma: &LumaStats,
        exposure: &ExposureInfo,
        frame_count: ExposureFrameCount,
    ) -> i32 {
        self.evaluate(luma, exposure, frame_count).value
    }

    /// Computes the correction and returns every intermediate value.
    pub fn evaluate(
        &self,
        luma: &LumaStats,
        exposure: &ExposureInfo,
        frame_count: ExposureFrameCount,
    ) -> PredictKReport {
        let (cur_mean, next_mean) = luma.means();

        let mut ratios = ChannelSet {
            short: 1.0,
            mid: 1.0,
            long: 1.0,
        };
        for &(_, channel) in frame_count.luma_map() {
            *ratios.get_mut(channel) = guarded_ratio(*next_mean.get(channel), *cur_mean.get(channel));
        }

        let (driving_source, driving_ratio) = self.driving_ratio(&ratios, frame_count);

        let reference_channel = frame_count.reference_channel();
        let cur_ref = *cur_mean.get(reference_channel);
        let next_ref = *next_mean.get(reference_channel);
        let env_lv_change = env_lv_change(
            cur_ref,
            *exposure.current.get(reference_channel),
            next_ref,
            *exposure.next.get(reference_channel),
        );
        let reference_delta = (cur_ref - next_ref).abs();

        let mapped = self.log_map(driving_ratio);
        let raw_predict_k = mapped.unwrap_or(0.0);

        let suppression = if mapped.is_none() || !reference_delta.is_finite() {
            Some(Suppression::InvalidExposure)
        } else if env_lv_change <= ENV_CHANGE_GATE {
            Some(Suppression::EnvironmentSteady)
        } else if reference_delta >= REF_DELTA_GATE {
            Some(Suppression::ReferenceSwing)
        } else {
            None
        };

        let predict_k = if suppression.is_none() { raw_predict_k } else { 0.0 };
        let value = (predict_k * Q11_SCALE).round() as i32;

        tracing::trace!(
            %frame_count,
            driving_ratio,
            env_lv_change,
            reference_delta,
            raw_predict_k,
            value,
            "PredictK evaluated"
        );

        PredictKReport {
            ratios,
            driving_source,
            driving_ratio,
            reference_channel,
            env_lv_change,
            reference_delta,
            raw_predict_k,
            suppression,
            value,
        }
    }

    fn driving_ratio(
        &self,
        ratios: &ChannelSet<f64>,
        frame_count: ExposureFrameCount,
    ) -> (DrivingSource, f64) {
        let candidate = match frame_count {
            ExposureFrameCount::Linear => None,
            ExposureFrameCount::Hdr2 => Some((DrivingSource::Long, ratios.long)),
            ExposureFrameCount::Hdr3 => {
                let p = self.params.hdr3x_long_percent;
                Some((DrivingSource::BlendedLong, p * ratios.long + (1.0 - p) * ratios.mid))
            }
        };

        match candidate {
            Some((source, ratio)) if self.outside_long_band(ratio) => (source, ratio),
            _ => (DrivingSource::Short, ratios.short),
        }
    }

    #[inline]
    fn outside_long_band(&self, ratio: f64) -> bool {
        ratio > self.params.use_long_low_threshold || ratio < self.params.use_long_high_threshold
    }

    /// Maps a ratio into log2 space. `None` if the ratio or the log
    /// argument is unusable.
    fn log_map(&self, ratio: f64) -> Option<f64> {
        let PredictKTuningParams {
            correction_factor,
            correction_offset,
            ..
        } = self.params;

        if !(ratio > 0.0) {
            tracing::warn!(ratio, "Non-positive luma ratio, wrong exposure data");
            return None;
        }

        let value = if ratio >= 1.0 {
            let argument = correction_factor * ratio + correction_offset;
            if argument <= 0.0 {
                tracing::warn!(ratio, argument, "Non-positive log argument");
                return None;
            }
            argument.log2()
        } else {
            (ratio / correction_factor - correction_offset)
                .clamp(MIN_LOG_ARGUMENT, 1.0)
                .log2()
        };

        if value.is_finite() {
            Some(value)
        } else {
            tracing::warn!(ratio, value, "Non-finite PredictK");
            None
        }
    }
}

impl Default for PredictKCalculator {
    fn default() -> Self {
        Self::new(PredictKTuningParams::default())
    }
}

/// Relative change of luma per unit exposure on one channel.
///
/// Returns 0 when the current luma per exposure is zero or any input
/// exposure is non-positive.
pub fn env_lv_change(cur_luma: f64, cur_expo: f64, next_luma: f64, next_expo: f64) -> f64 {
    if cur_expo <= 0.0 || next_expo <= 0.0 {
        tracing::warn!(cur_expo, next_expo, "Zero exposure on reference channel");
        return 0.0;
    }

    let cur_lv = cur_luma / cur_expo;
    let next_lv = next_luma / next_expo;
    if cur_lv == 0.0 {
        return 0.0;
    }

    let change = (next_lv - cur_lv).abs() / cur_lv;
    if change.is_finite() {
        change
    } else {
        0.0
    }
}
