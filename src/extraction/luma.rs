//! Normalization of raw luma accumulators into per-channel zone tables.

use super::channel::{ChannelSet, ExposureFrameCount, ZoneLumaTable, ZONE_COUNT};
use crate::capture::RawLumaStats;

/// Normalized per-zone luma for current and next frame.
///
/// Channels that are not active for the exposure mode are all zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LumaStats {
    pub current: ChannelSet<ZoneLumaTable>,
    pub next: ChannelSet<ZoneLumaTable>,
}

impl LumaStats {
    /// Arithmetic mean of every channel table, for current and next frame.
    pub fn means(&self) -> (ChannelSet<f64>, ChannelSet<f64>) {
        (self.current.map(zone_mean), self.next.map(zone_mean))
    }
}

/// Mean of a zone table.
#[inline]
pub fn zone_mean(table: &ZoneLumaTable) -> f64 {
    table.iter().sum::<f64>() / ZONE_COUNT as f64
}

/// Converts raw luma sums into normalized zone tables.
#[derive(Debug, Clone, Copy)]
pub struct LumaStatsExtractor {
    pixels_per_zone: f64,
    black_level: f64,
}

impl LumaStatsExtractor {
    /// Creates an extractor.
    ///
    /// `pixels_per_zone` must be non-zero; session configuration
    /// validation rejects zero before an extractor is built.
    pub fn new(pixels_per_zone: u32, black_level: f64) -> Self {
        debug_assert!(pixels_per_zone > 0);
        Self {
            pixels_per_zone: pixels_per_zone as f64,
            black_level,
        }
    }

    /// Produces the six channel tables for the given exposure mode.
    pub fn extract(
        &self,
        next: &RawLumaStats,
        current: &RawLumaStats,
        frame_count: ExposureFrameCount,
    ) -> LumaStats {
        LumaStats {
            current: self.normalize(current, frame_count),
            next: self.normalize(next, frame_count),
        }
    }

    fn normalize(
        &self,
        raw: &RawLumaStats,
        frame_count: ExposureFrameCount,
    ) -> ChannelSet<ZoneLumaTable> {
        let mut tables = ChannelSet::<ZoneLumaTable>::default();

        for &(index, channel) in frame_count.luma_map() {
            let table = tables.get_mut(channel);
            for (out, &sum) in table.iter_mut().zip(raw.exposure(index)) {
                *out = sum as f64 / self.pixels_per_zone - self.black_level;
            }
        }

        tables
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_populates_short_only() {
        let extractor = LumaStatsExtractor::new(4, 0.0);
        let raw = RawLumaStats::uniform([400, 800, 1200]);

        let stats = extractor.extract(&raw, &raw, ExposureFrameCount::Linear);

        assert!(stats.current.short.iter().all(|&v| v == 100.0));
        assert!(stats.next.short.iter().all(|&v| v == 100.0));
        for tables in [&stats.current, &stats.next] {
            assert!(tables.mid.iter().all(|&v| v == 0.0));
            assert!(tables.long.iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn test_hdr2_mapping() {
        let extractor = LumaStatsExtractor::new(1, 0.0);
        let raw = RawLumaStats::uniform([200, 40, 7]);

        let stats = extractor.extract(&raw, &raw, ExposureFrameCount::Hdr2);

        assert!(stats.current.long.iter().all(|&v| v == 200.0));
        assert!(stats.current.short.iter().all(|&v| v == 40.0));
        assert!(stats.current.mid.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_hdr3_mapping() {
        let extractor = LumaStatsExtractor::new(1, 0.0);
        let raw = RawLumaStats::uniform([100, 50, 10]);

        let stats = extractor.extract(&raw, &raw, ExposureFrameCount::Hdr3);

        assert_eq!(stats.current.long, [100.0; ZONE_COUNT]);
        assert_eq!(stats.current.mid, [50.0; ZONE_COUNT]);
        assert_eq!(stats.current.short, [10.0; ZONE_COUNT]);
        assert_eq!(stats.next, stats.current);
    }

    #[test]
    fn test_black_level_and_pixel_normalization() {
        let extractor = LumaStatsExtractor::new(16, 4.0);
        let current = RawLumaStats::uniform([1600, 0, 0]);
        let next = RawLumaStats::uniform([3200, 0, 0]);

        let stats = extractor.extract(&next, &current, ExposureFrameCount::Linear);

        assert_eq!(stats.current.short[0], 96.0);
        assert_eq!(stats.next.short[0], 196.0);
    }

    #[test]
    fn test_next_and_current_are_not_swapped() {
        let extractor = LumaStatsExtractor::new(1, 0.0);
        let current = RawLumaStats::uniform([10, 0, 0]);
        let next = RawLumaStats::uniform([20, 0, 0]);

        let (cur, nxt) = extractor
            .extract(&next, &current, ExposureFrameCount::Linear)
            .means();

        assert_eq!(cur.short, 10.0);
        assert_eq!(nxt.short, 20.0);
    }

    #[test]
    fn test_zone_mean() {
        let mut table = [0.0; ZONE_COUNT];
        table[0] = 160.0;
        assert_eq!(zone_mean(&table), 10.0);
    }
}
