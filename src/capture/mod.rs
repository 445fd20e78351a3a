//! Per-frame statistics input.
//!
//! Defines the statistics the capture pipeline and AE algorithm hand
//! over every frame, the source trait they are pulled through, and the
//! session configuration. The real pipeline is external; a synthetic
//! source stands in for it in the CLI, tests and benchmarks.

mod config;
mod frame;
mod source;

pub use config::{ConfigError, OutputConfig, SessionFile, SourceConfig};
pub use frame::{ExposureDescriptor, FrameStats, GainTime, RawLumaStats};
pub use source::{SourceError, StatsSource, SyntheticSource};
