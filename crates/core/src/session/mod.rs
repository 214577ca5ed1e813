//! Per-recording ownership and the per-tick driver.

use serde::{Deserialize, Serialize};

use crate::{
    Autopilot, MusicMap, SessionConfig, SignalAnalyzer, TrackData, TrackGenerator,
};

/// How quickly the lane offset eases toward the target lane, per second.
const LANE_BLEND_RATE: f32 = 8.0;

/// A discrete lane-change request from the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SteerDirection {
    Left,
    Right,
}

/// Progress and lane state for the controlled object. `distance` is
/// monotonic non-decreasing while playing; `lane_offset` trails `lane` for
/// smooth lateral movement.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RunState {
    pub distance: f32,
    pub lane: i32,
    pub lane_offset: f32,
}

/// Owns everything derived from one loaded recording: the feature map, the
/// generated track, the run state, and the autopilot. Reloading a recording
/// replaces the session wholesale.
///
/// Ticks must be serialized by the caller; each tick is read-only over the
/// track punctuated by at most one lane write and one timestamp write.
#[derive(Debug)]
pub struct RunSession {
    map: MusicMap,
    track: TrackData,
    state: RunState,
    autopilot: Autopilot,
    speed: f32,
    lane_width: f32,
    last_clock: f32,
}

impl RunSession {
    /// Analyses a decoded recording and generates its track with default
    /// configuration.
    pub fn load(samples: &[f32], sample_rate: u32, duration: f32) -> Self {
        Self::load_with(samples, sample_rate, duration, SessionConfig::default())
    }

    pub fn load_with(
        samples: &[f32],
        sample_rate: u32,
        duration: f32,
        config: SessionConfig,
    ) -> Self {
        let map = SignalAnalyzer::with_config(config.analysis.clone()).analyze(samples, sample_rate, duration);
        Self::from_map(map, config)
    }

    /// Builds a session from an already-analysed feature map.
    pub fn from_map(map: MusicMap, config: SessionConfig) -> Self {
        let track = TrackGenerator::with_config(config.track.clone()).generate(&map);
        Self {
            map,
            track,
            state: RunState::default(),
            autopilot: Autopilot::new(config.avoidance),
            speed: config.track.speed,
            lane_width: config.track.lane_width,
            last_clock: 0.0,
        }
    }

    pub fn map(&self) -> &MusicMap {
        &self.map
    }

    pub fn track(&self) -> &TrackData {
        &self.track
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Lateral world-space offset of the controlled object, for placement.
    pub fn lane_world_offset(&self) -> f32 {
        self.state.lane_offset * self.lane_width
    }

    /// Advances the session to the given playback time. Maps the clock to a
    /// distance along the track, runs the avoidance heuristic, and eases the
    /// lane offset toward the current lane.
    pub fn tick(&mut self, clock_seconds: f32) {
        let delta = (clock_seconds - self.last_clock).max(0.0);
        self.last_clock = clock_seconds;

        let distance = (clock_seconds * self.speed).clamp(0.0, self.track.length);
        self.state.distance = self.state.distance.max(distance);

        if let Some(lane) = self.autopilot.evaluate(
            &self.track.treble_pulses,
            self.state.distance,
            self.state.lane,
            clock_seconds,
        ) {
            self.state.lane = lane;
        }

        let blend = (delta * LANE_BLEND_RATE).min(1.0);
        self.state.lane_offset += (self.state.lane as f32 - self.state.lane_offset) * blend;
    }

    /// Applies a manual lane change. Manual input always wins: it takes
    /// effect immediately and restarts the autopilot cooldown so the next
    /// automatic decision cannot fire right on top of it.
    pub fn steer(&mut self, direction: SteerDirection) {
        let delta = match direction {
            SteerDirection::Left => -1,
            SteerDirection::Right => 1,
        };
        let lane = (self.state.lane + delta).clamp(-1, 1);
        if lane != self.state.lane {
            self.state.lane = lane;
            self.autopilot.suppress(self.last_clock);
        }
    }
}
