//! Metrics collection and registry.

use crate::engine::EngineStats;
use prometheus::{Encoder, Gauge, IntCounter, IntGauge, Registry, TextEncoder};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of engine state for metrics update.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Last Q11 correction.
    pub predict_k: i32,
    /// Last log2 value before the gate.
    pub raw_predict_k: f64,
    /// Last driving ratio.
    pub driving_ratio: f64,
    /// Last environment luminance change.
    pub env_lv_change: f64,
    /// Whether the scene was stable on the last frame.
    pub is_stable: bool,
    /// Total frames processed.
    pub frames: u64,
    /// Frames whose correction was applied.
    pub applied: u64,
    /// Frames suppressed by the gate (steady environment or reference swing).
    pub suppressed: u64,
    /// Frames degraded by invalid data.
    pub degraded: u64,
    /// Stability detector resets.
    pub detector_resets: u64,
}

/// Prometheus metrics registry for PredictK monitoring.
pub struct MetricsRegistry {
    registry: Registry,

    // Output metrics
    predict_k: IntGauge,
    raw_predict_k: Gauge,
    driving_ratio: Gauge,
    env_lv_change: Gauge,
    scene_stable: IntGauge,

    // Frame counters
    frames_total: TotalCounter,
    applied_total: TotalCounter,
    suppressed_total: TotalCounter,
    degraded_total: TotalCounter,
    detector_resets_total: TotalCounter,
}

/// A Prometheus counter fed from an engine running total.
///
/// The engine total starts over from zero when the engine is reset, so a
/// total below the last one seen counts in full.
struct TotalCounter {
    counter: IntCounter,
    last_total: AtomicU64,
}

impl TotalCounter {
    fn new(counter: IntCounter) -> Self {
        Self {
            counter,
            last_total: AtomicU64::new(0),
        }
    }

    fn advance(&self, total: u64) {
        let last = self.last_total.swap(total, Ordering::Relaxed);
        let delta = if total >= last { total - last } else { total };
        if delta > 0 {
            self.counter.inc_by(delta);
        }
    }
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all PredictK metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let predict_k = IntGauge::new(
            "hdr_predict_k_q11",
            "Last PredictK correction in Q11 fixed point",
        )?;
        let raw_predict_k = Gauge::new(
            "hdr_predict_k_raw",
            "Last log2 PredictK before the noise gate",
        )?;
        let driving_ratio = Gauge::new(
            "hdr_predict_driving_ratio",
            "Last next/current luma ratio driving PredictK",
        )?;
        let env_lv_change = Gauge::new(
            "hdr_predict_env_lv_change",
            "Last relative luma-per-exposure change of the reference channel",
        )?;
        let scene_stable = IntGauge::new(
            "hdr_predict_scene_stable",
            "Scene stability (1=stable, 0=disturbed)",
        )?;

        let frames_total = IntCounter::new(
            "hdr_predict_frames_total",
            "Total number of frames processed",
        )?;
        let applied_total = IntCounter::new(
            "hdr_predict_applied_total",
            "Frames whose PredictK correction passed the noise gate",
        )?;
        let suppressed_total = IntCounter::new(
            "hdr_predict_suppressed_total",
            "Frames whose PredictK correction was zeroed by the noise gate",
        )?;
        let degraded_total = IntCounter::new(
            "hdr_predict_degraded_total",
            "Frames degraded to zero correction by invalid statistics",
        )?;
        let detector_resets_total = IntCounter::new(
            "hdr_predict_detector_resets_total",
            "Scene stability detector resets (mode change or stream restart)",
        )?;

        registry.register(Box::new(predict_k.clone()))?;
        registry.register(Box::new(raw_predict_k.clone()))?;
        registry.register(Box::new(driving_ratio.clone()))?;
        registry.register(Box::new(env_lv_change.clone()))?;
        registry.register(Box::new(scene_stable.clone()))?;
        registry.register(Box::new(frames_total.clone()))?;
        registry.register(Box::new(applied_total.clone()))?;
        registry.register(Box::new(suppressed_total.clone()))?;
        registry.register(Box::new(degraded_total.clone()))?;
        registry.register(Box::new(detector_resets_total.clone()))?;

        Ok(Self {
            registry,
            predict_k,
            raw_predict_k,
            driving_ratio,
            env_lv_change,
            scene_stable,
            frames_total: TotalCounter::new(frames_total),
            applied_total: TotalCounter::new(applied_total),
            suppressed_total: TotalCounter::new(suppressed_total),
            degraded_total: TotalCounter::new(degraded_total),
            detector_resets_total: TotalCounter::new(detector_resets_total),
        })
    }

    /// Updates all metrics from a snapshot of engine state.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        self.predict_k.set(snapshot.predict_k as i64);
        self.raw_predict_k.set(snapshot.raw_predict_k);
        self.driving_ratio.set(snapshot.driving_ratio);
        self.env_lv_change.set(snapshot.env_lv_change);
        self.scene_stable.set(if snapshot.is_stable { 1 } else { 0 });

        self.frames_total.advance(snapshot.frames);
        self.applied_total.advance(snapshot.applied);
        self.suppressed_total.advance(snapshot.suppressed);
        self.degraded_total.advance(snapshot.degraded);
        self.detector_resets_total.advance(snapshot.detector_resets);
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

impl MetricsSnapshot {
    /// Creates a snapshot from engine counters.
    pub fn from_engine(stats: &EngineStats) -> Self {
        Self {
            predict_k: stats.last_predict_k,
            raw_predict_k: stats.last_raw_predict_k,
            driving_ratio: stats.last_driving_ratio,
            env_lv_change: stats.last_env_lv_change,
            is_stable: stats.last_stable,
            frames: stats.frames,
            applied: stats.applied,
            suppressed: stats.suppressed_steady + stats.suppressed_swing,
            degraded: stats.degraded,
            detector_resets: stats.detector_resets,
        }
    }
}
