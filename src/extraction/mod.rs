//! Per-frame statistics extraction.
//!
//! Converts raw luma accumulators and exposure descriptors into a
//! uniform short/mid/long channel layout for current and next frame.
//! The raw layout stores the longest exposure first, so the mapping
//! depends on the exposure mode; see [`ExposureFrameCount::luma_map`].

mod channel;
mod exposure;
mod luma;

pub use channel::{
    Channel, ChannelSet, ExposureFrameCount, ExposureSlot, InvalidFrameCount, ZoneLumaTable,
    MAX_EXPOSURES, ZONE_COUNT,
};
pub use exposure::{ExposureInfo, ExposureInfoExtractor};
pub use luma::{zone_mean, LumaStats, LumaStatsExtractor};
