use serde::{Deserialize, Serialize};

/// Top-level configuration aggregating every tunable subsystem.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    pub analysis: AnalysisConfig,
    pub track: TrackConfig,
    pub avoidance: AvoidanceConfig,
}

/// Configuration for the signal analysis pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Duration of one analysis window in seconds. One energy sample is
    /// emitted per window; the final window may be shorter.
    pub window_seconds: f32,
    /// How many standard deviations above the series mean a value must sit
    /// before a local maximum counts as an event.
    pub threshold_deviation: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_seconds: 0.075,
            threshold_deviation: 0.5,
        }
    }
}

/// Configuration for track generation. `speed` and `lane_width` are shared
/// with the per-tick driver; every consumer reads them from here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackConfig {
    /// Forward speed in distance units per second of playback. Defines the
    /// time-to-distance mapping used everywhere in the system.
    pub speed: f32,
    /// Lateral distance between adjacent lanes in world units.
    pub lane_width: f32,
    /// Lower bound on the number of path stations, so very short recordings
    /// still produce a usable path.
    pub min_nodes: usize,
    /// Station density for everything longer than the minimum.
    pub nodes_per_second: f32,
    /// Angular frequency of the lateral sinusoid (radians per second).
    pub curve_frequency: f32,
    /// Amplitude of the lateral sinusoid in world units.
    pub curve_amplitude: f32,
    /// Vertical scale applied to the smoothed energy curve.
    pub height_scale: f32,
    /// A beat is "strong" when its strength exceeds this multiple of the
    /// median strength.
    pub strong_beat_ratio: f32,
    /// A station is flagged as a jump when its time lies within this many
    /// seconds of a jump timestamp.
    pub jump_tolerance: f32,
    /// Height of the weakest hazard above its station.
    pub hazard_base_height: f32,
    /// Additional height of the strongest hazard above the weakest.
    pub hazard_rise: f32,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            speed: 50.0,
            lane_width: 2.5,
            min_nodes: 100,
            nodes_per_second: 10.0,
            curve_frequency: 0.1,
            curve_amplitude: 2.0,
            height_scale: 6.0,
            strong_beat_ratio: 1.2,
            jump_tolerance: 0.1,
            hazard_base_height: 0.6,
            hazard_rise: 1.8,
        }
    }
}

/// Configuration for the automatic lane-avoidance heuristic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvoidanceConfig {
    /// Minimum time between accepted lane changes, in seconds.
    pub cooldown_seconds: f32,
    /// How far ahead (in distance units) hazards are considered at all.
    pub lookahead: f32,
    /// A hazard closer than this in the current lane forces a change; a
    /// candidate lane with one this close is unsafe.
    pub conflict_range: f32,
    /// Score penalty per lane of lateral movement.
    pub lane_change_cost: f32,
    /// Upper bound of the random score term, drawn from `[0, jitter)`.
    pub jitter: f32,
    /// Fixed RNG seed for reproducible runs. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for AvoidanceConfig {
    fn default() -> Self {
        Self {
            cooldown_seconds: 0.4,
            lookahead: 25.0,
            conflict_range: 8.0,
            lane_change_cost: 0.35,
            jitter: 0.15,
            seed: None,
        }
    }
}
