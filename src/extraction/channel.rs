//! Exposure channels and the raw-index lookup tables.
//!
//! The statistics hardware stores the longest active exposure at raw
//! index 0, so the raw-index to channel mapping changes with the number
//! of exposures. Both extractors read the mapping from the tables here.

use serde::{Deserialize, Serialize};

/// Number of luma zones reported per exposure.
pub const ZONE_COUNT: usize = 16;

/// Maximum number of exposures merged into one image.
pub const MAX_EXPOSURES: usize = 3;

/// Per-zone mean luma for a single channel.
pub type ZoneLumaTable = [f64; ZONE_COUNT];

/// Number of exposures merged per output frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ExposureFrameCount {
    /// Single exposure.
    Linear,
    /// Two-exposure HDR (short + long).
    Hdr2,
    /// Three-exposure HDR (short + mid + long).
    Hdr3,
}

impl ExposureFrameCount {
    /// Returns the number of exposures as an integer.
    #[inline]
    pub fn get(self) -> usize {
        match self {
            Self::Linear => 1,
            Self::Hdr2 => 2,
            Self::Hdr3 => 3,
        }
    }

    /// Channel whose luma-per-exposure drives the environment change estimate.
    pub fn reference_channel(self) -> Channel {
        match self {
            Self::Linear => Channel::Short,
            Self::Hdr2 => Channel::Long,
            Self::Hdr3 => Channel::Mid,
        }
    }

    /// Raw luma index to channel mapping.
    pub fn luma_map(self) -> &'static [(usize, Channel)] {
        match self {
            Self::Linear => &LUMA_MAP_LINEAR,
            Self::Hdr2 => &LUMA_MAP_HDR2,
            Self::Hdr3 => &LUMA_MAP_HDR3,
        }
    }

    /// Raw exposure index to channel mapping.
    ///
    /// Two-exposure mode has no real mid exposure; the long pair is
    /// reported for both mid and long.
    pub fn exposure_map(self) -> &'static [(ExposureSlot, Channel)] {
        match self {
            Self::Linear => &EXPOSURE_MAP_LINEAR,
            Self::Hdr2 => &EXPOSURE_MAP_HDR2,
            Self::Hdr3 => &EXPOSURE_MAP_HDR3,
        }
    }
}

impl TryFrom<u8> for ExposureFrameCount {
    type Error = InvalidFrameCount;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Linear),
            2 => Ok(Self::Hdr2),
            3 => Ok(Self::Hdr3),
            other => Err(InvalidFrameCount(other)),
        }
    }
}

impl From<ExposureFrameCount> for u8 {
    fn from(count: ExposureFrameCount) -> Self {
        count.get() as u8
    }
}

impl std::fmt::Display for ExposureFrameCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// Rejected exposure frame count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("exposure frame count must be 1, 2 or 3 (got {0})")]
pub struct InvalidFrameCount(pub u8);

/// Logical exposure channel, ordered from shortest to longest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Short,
    Mid,
    Long,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Short => "short",
            Self::Mid => "mid",
            Self::Long => "long",
        };
        f.write_str(name)
    }
}

/// Where an exposure value is read from in an exposure descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExposureSlot {
    /// The single-exposure (linear) pair.
    Linear,
    /// HDR pair at the given raw index (0 = longest).
    Hdr(usize),
}

const LUMA_MAP_LINEAR: [(usize, Channel); 1] = [(0, Channel::Short)];
const LUMA_MAP_HDR2: [(usize, Channel); 2] = [(1, Channel::Short), (0, Channel::Long)];
const LUMA_MAP_HDR3: [(usize, Channel); 3] =
    [(2, Channel::Short), (1, Channel::Mid), (0, Channel::Long)];

const EXPOSURE_MAP_LINEAR: [(ExposureSlot, Channel); 1] =
    [(ExposureSlot::Linear, Channel::Short)];
const EXPOSURE_MAP_HDR2: [(ExposureSlot, Channel); 3] = [
    (ExposureSlot::Hdr(1), Channel::Short),
    (ExposureSlot::Hdr(0), Channel::Mid),
    (ExposureSlot::Hdr(0), Channel::Long),
];
const EXPOSURE_MAP_HDR3: [(ExposureSlot, Channel); 3] = [
    (ExposureSlot::Hdr(2), Channel::Short),
    (ExposureSlot::Hdr(1), Channel::Mid),
    (ExposureSlot::Hdr(0), Channel::Long),
];

/// One value per exposure channel.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChannelSet<T> {
    pub short: T,
    pub mid: T,
    pub long: T,
}

impl<T> ChannelSet<T> {
    /// Returns the value for a channel.
    #[inline]
    pub fn get(&self, channel: Channel) -> &T {
        match channel {
            Channel::Short => &self.short,
            Channel::Mid => &self.mid,
            Channel::Long => &self.long,
        }
    }

    /// Returns a mutable reference to the value for a channel.
    #[inline]
    pub fn get_mut(&mut self, channel: Channel) -> &mut T {
        match channel {
            Channel::Short => &mut self.short,
            Channel::Mid => &mut self.mid,
            Channel::Long => &mut self.long,
        }
    }

    /// Applies `f` to every channel.
    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> ChannelSet<U> {
        ChannelSet {
            short: f(&self.short),
            mid: f(&self.mid),
            long: f(&self.long),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_count_conversion() {
        assert_eq!(ExposureFrameCount::try_from(1), Ok(ExposureFrameCount::Linear));
        assert_eq!(ExposureFrameCount::try_from(3), Ok(ExposureFrameCount::Hdr3));
        assert_eq!(ExposureFrameCount::try_from(0), Err(InvalidFrameCount(0)));
        assert_eq!(ExposureFrameCount::try_from(4), Err(InvalidFrameCount(4)));
        assert_eq!(u8::from(ExposureFrameCount::Hdr2), 2);
    }

    #[test]
    fn test_luma_map_longest_at_index_zero() {
        for count in [ExposureFrameCount::Hdr2, ExposureFrameCount::Hdr3] {
            let long = count
                .luma_map()
                .iter()
                .find(|(_, channel)| *channel == Channel::Long)
                .map(|(index, _)| *index);
            assert_eq!(long, Some(0));
        }
    }

    #[test]
    fn test_luma_map_short_is_last_index() {
        for count in [
            ExposureFrameCount::Linear,
            ExposureFrameCount::Hdr2,
            ExposureFrameCount::Hdr3,
        ] {
            let short = count
                .luma_map()
                .iter()
                .find(|(_, channel)| *channel == Channel::Short)
                .map(|(index, _)| *index);
            assert_eq!(short, Some(count.get() - 1));
        }
    }

    #[test]
    fn test_hdr2_exposure_map_shares_long_pair() {
        let map = ExposureFrameCount::Hdr2.exposure_map();
        let slot_for = |wanted: Channel| {
            map.iter()
                .find(|(_, channel)| *channel == wanted)
                .map(|(slot, _)| *slot)
        };
        assert_eq!(slot_for(Channel::Mid), Some(ExposureSlot::Hdr(0)));
        assert_eq!(slot_for(Channel::Long), Some(ExposureSlot::Hdr(0)));
        assert_eq!(slot_for(Channel::Short), Some(ExposureSlot::Hdr(1)));
    }

    #[test]
    fn test_reference_channel() {
        assert_eq!(ExposureFrameCount::Linear.reference_channel(), Channel::Short);
        assert_eq!(ExposureFrameCount::Hdr2.reference_channel(), Channel::Long);
        assert_eq!(ExposureFrameCount::Hdr3.reference_channel(), Channel::Mid);
    }

    #[test]
    fn test_frame_count_deserializes_from_integer() {
        #[derive(Deserialize)]
        struct Wrapper {
            count: ExposureFrameCount,
        }
        let parsed: Wrapper = toml::from_str("count = 2").unwrap();
        assert_eq!(parsed.count, ExposureFrameCount::Hdr2);
        assert!(toml::from_str::<Wrapper>("count = 5").is_err());
    }
}
