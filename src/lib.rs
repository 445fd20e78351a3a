//! HDR PredictK Library
//!
//! Temporal prediction for multi-exposure HDR tone mapping. Every frame,
//! the engine compares current and next-frame luma statistics against
//! the exposure change auto-exposure programmed, and produces a Q11
//! log2-domain correction ("PredictK") that keeps the TMO merge curve
//! from flickering while exposure ratios move. A scene stability detector
//! runs alongside and tells the caller whether the correction can be
//! trusted this frame.
//!
//! # Architecture
//!
//! ```text
//! capture (statistics source) → extraction → analysis (PredictK)
//!                                    ↘ analysis (scene stability)
//! ```
//!
//! # Design Principles
//!
//! - **Never stall the frame**: bad data degrades to a zero correction, never an error
//! - **Explicit session state**: each sensor owns its detector; no globals
//! - **Fixed cost**: 16 zones × 3 channels, no per-frame allocation
//!
//! # Example
//!
//! ```no_run
//! use hdr_predict::{
//!     capture::{SourceConfig, StatsSource, SyntheticSource},
//!     engine::PredictEngine,
//! };
//!
//! let mut source = SyntheticSource::new();
//! source.open(&SourceConfig::default()).unwrap();
//!
//! let mut engine = PredictEngine::default();
//!
//! for _ in 0..10 {
//!     let stats = source.capture().unwrap();
//!     let outcome = engine.process(&stats);
//!
//!     if outcome.stable {
//!         // program outcome.predict_k into the TMO block
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod analysis;
pub mod capture;
pub mod engine;
pub mod extraction;
pub mod metrics;

// Re-export commonly used types at crate root
pub use analysis::{
    PredictKCalculator, PredictKReport, PredictKTuningParams, SceneStabilityDetector,
    SceneStabilityState, StabilityConfig,
};
pub use capture::{FrameStats, SessionFile, SourceConfig, StatsSource, SyntheticSource};
pub use engine::{EngineStats, FrameOutcome, PredictEngine};
pub use extraction::{
    Channel, ExposureFrameCount, ExposureInfo, ExposureInfoExtractor, LumaStats,
    LumaStatsExtractor,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
