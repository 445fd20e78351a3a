//! Temporal analysis of the extracted statistics.
//!
//! Holds the PredictK calculator, the scene stability detector and the
//! per-sensor tuning both read.

mod predict;
mod stability;
mod tuning;

pub use predict::{
    env_lv_change, guarded_ratio, DrivingSource, PredictKCalculator, PredictKReport, Suppression,
    ENV_CHANGE_GATE, Q11_SCALE, REF_DELTA_GATE,
};
pub use stability::{
    final_deviation, SceneStabilityDetector, SceneStabilityState, StabilityPhase,
    StabilityReading,
};
pub use tuning::{PredictKTuningParams, StabilityConfig, TuningViolation};
