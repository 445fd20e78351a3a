//! Prometheus metrics exporter for PredictK monitoring.
//!
//! # Metrics Exposed
//!
//! ## Output Metrics
//! - `hdr_predict_k_q11` - Last PredictK correction (Q11)
//! - `hdr_predict_k_raw` - Last log2 PredictK before the noise gate
//! - `hdr_predict_driving_ratio` - Last driving luma ratio
//! - `hdr_predict_env_lv_change` - Last environment luminance change
//! - `hdr_predict_scene_stable` - Scene stability (1=stable, 0=disturbed)
//!
//! ## Frame Counters
//! - `hdr_predict_frames_total` - Frames processed
//! - `hdr_predict_applied_total` - Frames whose correction passed the gate
//! - `hdr_predict_suppressed_total` - Frames zeroed by the gate
//! - `hdr_predict_degraded_total` - Frames zeroed by invalid statistics
//! - `hdr_predict_detector_resets_total` - Stability detector resets
//!
//! # Example
//!
//! ```no_run
//! use hdr_predict::engine::PredictEngine;
//! use hdr_predict::metrics::{MetricsRegistry, MetricsSnapshot};
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//! let engine = PredictEngine::default();
//!
//! registry.update(&MetricsSnapshot::from_engine(engine.stats()));
//! ```

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, MetricsServerConfig, MetricsState, ServerError};
