//! Per-sensor PredictK engine.
//!
//! Runs the extractors, the PredictK calculator and the stability
//! detector on each frame's statistics. One engine per sensor context;
//! engines share nothing.

use crate::analysis::{
    PredictKCalculator, PredictKReport, PredictKTuningParams, SceneStabilityDetector,
    StabilityConfig, StabilityReading, Suppression,
};
use crate::capture::{FrameStats, SessionFile};
use crate::extraction::{ExposureInfoExtractor, LumaStatsExtractor};

/// Engine output for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameOutcome {
    pub frame_id: u32,
    /// Q11 correction for the TMO curve.
    pub predict_k: i32,
    /// Whether the scene is stable enough to apply `predict_k`.
    pub stable: bool,
    /// Calculation breakdown; `None` if the statistics were unusable.
    pub report: Option<PredictKReport>,
    pub stability: StabilityReading,
}

/// Running counters of an engine.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EngineStats {
    /// Frames processed.
    pub frames: u64,
    /// Frames whose correction survived the gate.
    pub applied: u64,
    /// Frames suppressed because the environment did not change.
    pub suppressed_steady: u64,
    /// Frames suppressed because the reference channel swung.
    pub suppressed_swing: u64,
    /// Frames degraded to zero by invalid data.
    pub degraded: u64,
    /// Frames reported stable.
    pub stable_frames: u64,
    /// Stability detector resets.
    pub detector_resets: u64,
    pub last_predict_k: i32,
    pub last_raw_predict_k: f64,
    pub last_driving_ratio: f64,
    pub last_env_lv_change: f64,
    pub last_stable: bool,
}

/// Combines extraction, PredictK and scene stability for one sensor.
pub struct PredictEngine {
    calculator: PredictKCalculator,
    detector: SceneStabilityDetector,
    exposure_extractor: ExposureInfoExtractor,
    stats: EngineStats,
}

impl PredictEngine {
    pub fn new(params: PredictKTuningParams, stability: StabilityConfig) -> Self {
        Self {
            calculator: PredictKCalculator::new(params),
            detector: SceneStabilityDetector::new(stability),
            exposure_extractor: ExposureInfoExtractor::new(),
            stats: EngineStats::default(),
        }
    }

    /// Creates an engine from a loaded session file.
    pub fn from_session(session: &SessionFile) -> Self {
        Self::new(session.predict_k, session.stability)
    }

    /// Processes one frame.
    pub fn process(&mut self, frame: &FrameStats) -> FrameOutcome {
        let report = self.predict(frame);
        let stability = self
            .detector
            .update(frame.frame_id, frame.frame_count, &frame.deviation);

        let predict_k = report.map(|r| r.value).unwrap_or(0);
        self.record(&report, &stability, predict_k);

        tracing::debug!(
            frame_id = frame.frame_id,
            predict_k,
            stable = stability.stable,
            "Frame processed"
        );

        FrameOutcome {
            frame_id: frame.frame_id,
            predict_k,
            stable: stability.stable,
            report,
            stability,
        }
    }

    fn predict(&self, frame: &FrameStats) -> Option<PredictKReport> {
        if frame.pixels_per_zone == 0 {
            tracing::warn!(frame_id = frame.frame_id, "Zero pixels per zone, skipping PredictK");
            return None;
        }

        for (label, descriptor) in [
            ("current", &frame.current_exposure),
            ("next", &frame.next_exposure),
        ] {
            for channel in ExposureInfoExtractor::degenerate_channels(descriptor, frame.frame_count) {
                tracing::warn!(
                    frame_id = frame.frame_id,
                    frame = label,
                    %channel,
                    "Zero gain or integration time on active channel"
                );
            }
        }

        let luma = LumaStatsExtractor::new(frame.pixels_per_zone, frame.black_level).extract(
            &frame.next_luma,
            &frame.current_luma,
            frame.frame_count,
        );
        let exposure = self.exposure_extractor.extract(
            &frame.current_exposure,
            &frame.next_exposure,
            frame.frame_count,
        );

        Some(self.calculator.evaluate(&luma, &exposure, frame.frame_count))
    }

    fn record(&mut self, report: &Option<PredictKReport>, stability: &StabilityReading, predict_k: i32) {
        let stats = &mut self.stats;
        stats.frames += 1;
        stats.last_predict_k = predict_k;
        stats.last_stable = stability.stable;
        if stability.stable {
            stats.stable_frames += 1;
        }
        if stability.reset {
            stats.detector_resets += 1;
        }

        match report {
            Some(report) => {
                stats.last_raw_predict_k = report.raw_predict_k;
                stats.last_driving_ratio = report.driving_ratio;
                stats.last_env_lv_change = report.env_lv_change;
                match report.suppression {
                    None => stats.applied += 1,
                    Some(Suppression::EnvironmentSteady) => stats.suppressed_steady += 1,
                    Some(Suppression::ReferenceSwing) => stats.suppressed_swing += 1,
                    Some(Suppression::InvalidExposure) => stats.degraded += 1,
                }
            }
            None => stats.degraded += 1,
        }
    }

    /// Returns the running counters.
    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    /// Returns the stability detector.
    pub fn detector(&self) -> &SceneStabilityDetector {
        &self.detector
    }

    /// Discards detector history and counters.
    pub fn reset(&mut self) {
        self.detector.reset();
        self.stats = EngineStats::default();
    }
}

impl Default for PredictEngine {
    fn default() -> Self {
        Self::new(PredictKTuningParams::default(), StabilityConfig::default())
    }
}
