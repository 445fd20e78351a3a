//! Scene stability detection.
//!
//! A hysteresis state machine over the AE luma-deviation signal. The
//! scene is reported stable until one full disturb/settle cycle has been
//! observed since the last reset; from then on every frame compares the
//! live deviation against the stability threshold.

use super::tuning::StabilityConfig;
use crate::extraction::ExposureFrameCount;

/// Phase of the stability state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StabilityPhase {
    /// No disturbance since the last reset.
    Init,
    /// A non-zero deviation was seen; waiting for it to settle.
    Disturbed,
    /// The deviation returned to zero but the cycle markers are incomplete.
    Settling,
    /// Both cycle markers are known; the threshold decides every frame.
    Evaluating,
}

/// Session-resident detector state. One instance per sensor context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneStabilityState {
    /// Exposure mode seen on the previous call.
    pub previous_frame_count: Option<ExposureFrameCount>,
    pub disturbance_started: bool,
    /// Frame id at which the first disturbance was seen (0 = unset).
    pub disturbance_start_frame: u32,
    pub disturbance_ended: bool,
    /// Frame id at which the disturbance settled (0 = unset).
    pub disturbance_end_frame: u32,
}

impl SceneStabilityState {
    /// Current phase derived from the markers.
    pub fn phase(&self) -> StabilityPhase {
        match (self.disturbance_started, self.disturbance_ended) {
            (false, _) => StabilityPhase::Init,
            (true, false) => StabilityPhase::Disturbed,
            (true, true) if self.cycle_complete() => StabilityPhase::Evaluating,
            (true, true) => StabilityPhase::Settling,
        }
    }

    /// True once both cycle markers hold a frame id.
    #[inline]
    pub fn cycle_complete(&self) -> bool {
        self.disturbance_start_frame != 0 && self.disturbance_end_frame != 0
    }

    fn clear(&mut self, frame_count: ExposureFrameCount) {
        *self = Self {
            previous_frame_count: Some(frame_count),
            ..Default::default()
        };
    }
}

/// Result of one detector update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilityReading {
    /// Whether the scene is considered stable this frame.
    pub stable: bool,
    /// Deviation selected from the input vector.
    pub final_deviation: f64,
    /// Phase after the update.
    pub phase: StabilityPhase,
    /// True if this call reset the state.
    pub reset: bool,
}

/// Selects the deviation that drives the state machine.
///
/// `deviation` is ordered shortest exposure first; missing entries read
/// as zero.
pub fn final_deviation(frame_count: ExposureFrameCount, deviation: &[f64]) -> f64 {
    let at = |index: usize| deviation.get(index).copied().unwrap_or(0.0);

    match frame_count {
        ExposureFrameCount::Linear => at(0),
        ExposureFrameCount::Hdr2 => {
            let (short, long) = (at(0), at(1));
            if long > 0.0 {
                long
            } else if short > 0.0 {
                short
            } else {
                0.0
            }
        }
        ExposureFrameCount::Hdr3 => {
            let (short, mid, long) = (at(0), at(1), at(2));
            if mid > 0.0 {
                mid
            } else if mid == 0.0 && long > 0.0 {
                long
            } else if mid == 0.0 && long == 0.0 {
                short
            } else {
                0.0
            }
        }
    }
}

/// Decides per frame whether the scene is stable.
#[derive(Debug, Clone)]
pub struct SceneStabilityDetector {
    config: StabilityConfig,
    state: SceneStabilityState,
    resets: u64,
}

impl SceneStabilityDetector {
    /// Creates a detector with a fresh state.
    pub fn new(config: StabilityConfig) -> Self {
        Self::with_state(config, SceneStabilityState::default())
    }

    /// Creates a detector resuming from an existing state.
    pub fn with_state(config: StabilityConfig, state: SceneStabilityState) -> Self {
        Self {
            config,
            state,
            resets: 0,
        }
    }

    /// Feeds one frame's deviation vector and returns the stability decision.
    pub fn update(
        &mut self,
        frame_id: u32,
        frame_count: ExposureFrameCount,
        deviation: &[f64],
    ) -> StabilityReading {
        let reset = self.state.previous_frame_count != Some(frame_count) || frame_id == 0;
        if reset {
            tracing::debug!(
                frame_id,
                previous = ?self.state.previous_frame_count,
                current = %frame_count,
                "Scene stability state reset"
            );
            self.state.clear(frame_count);
            self.resets += 1;
        }

        let final_deviation = final_deviation(frame_count, deviation);

        if final_deviation != 0.0 && !self.state.disturbance_started {
            self.state.disturbance_started = true;
            self.state.disturbance_start_frame = frame_id;
            tracing::debug!(frame_id, final_deviation, "Scene disturbance started");
        } else if final_deviation == 0.0
            && self.state.disturbance_started
            && !self.state.disturbance_ended
        {
            self.state.disturbance_ended = true;
            self.state.disturbance_end_frame = frame_id;
            tracing::debug!(
                frame_id,
                started = self.state.disturbance_start_frame,
                "Scene disturbance settled"
            );
        }

        let stable = if self.state.cycle_complete() {
            final_deviation <= self.config.stability_threshold
        } else {
            true
        };

        tracing::trace!(
            frame_id,
            final_deviation,
            stable,
            phase = ?self.state.phase(),
            "Stability update"
        );

        StabilityReading {
            stable,
            final_deviation,
            phase: self.state.phase(),
            reset,
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> &SceneStabilityState {
        &self.state
    }

    /// Number of resets since creation, including the first frame.
    pub fn reset_count(&self) -> u64 {
        self.resets
    }

    /// Discards all history.
    pub fn reset(&mut self) {
        self.state = SceneStabilityState::default();
        tracing::info!("Scene stability detector reset");
    }
}

impl Default for SceneStabilityDetector {
    fn default() -> Self {
        Self::new(StabilityConfig::default())
    }
}
