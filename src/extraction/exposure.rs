//! Exposure value extraction for current and next frame.

use super::channel::{ChannelSet, ExposureFrameCount, ExposureSlot};
use crate::capture::{ExposureDescriptor, GainTime};

/// Exposure values (gain × integration time) per channel.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExposureInfo {
    pub current: ChannelSet<f64>,
    pub next: ChannelSet<f64>,
}

impl ExposureInfo {
    /// Flattens to `[cur_short, cur_mid, cur_long, next_short, next_mid, next_long]`.
    pub fn to_array(&self) -> [f64; 6] {
        [
            self.current.short,
            self.current.mid,
            self.current.long,
            self.next.short,
            self.next.mid,
            self.next.long,
        ]
    }
}

/// Converts exposure descriptors into per-channel exposure values.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExposureInfoExtractor;

impl ExposureInfoExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Produces current and next exposure values for the exposure mode.
    pub fn extract(
        &self,
        current: &ExposureDescriptor,
        next: &ExposureDescriptor,
        frame_count: ExposureFrameCount,
    ) -> ExposureInfo {
        ExposureInfo {
            current: Self::channels(current, frame_count),
            next: Self::channels(next, frame_count),
        }
    }

    /// Channels of the mode whose gain or integration time is zero.
    pub fn degenerate_channels(
        descriptor: &ExposureDescriptor,
        frame_count: ExposureFrameCount,
    ) -> impl Iterator<Item = super::Channel> + '_ {
        frame_count
            .exposure_map()
            .iter()
            .filter(move |(slot, _)| Self::pair(descriptor, *slot).is_degenerate())
            .map(|(_, channel)| *channel)
    }

    fn channels(descriptor: &ExposureDescriptor, frame_count: ExposureFrameCount) -> ChannelSet<f64> {
        let mut values = ChannelSet::<f64>::default();
        for &(slot, channel) in frame_count.exposure_map() {
            *values.get_mut(channel) = Self::pair(descriptor, slot).value();
        }
        values
    }

    fn pair(descriptor: &ExposureDescriptor, slot: ExposureSlot) -> &GainTime {
        match slot {
            ExposureSlot::Linear => &descriptor.linear,
            ExposureSlot::Hdr(index) => &descriptor.hdr[index],
        }
    }
}
