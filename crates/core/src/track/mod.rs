//! Procedural track generation from an analysed recording.
//!
//! The path advances along +Z at a fixed speed, so a point's depth doubles
//! as its arc length. Stations are built in two phases: raw positions
//! first, then a second pass derives the adjacency-dependent orientation.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::{BeatMarker, EnergySample, MusicMap, TrackConfig};

/// Lane cycle applied to hazards by ordinal position.
const HAZARD_LANE_CYCLE: [i32; 3] = [-1, 1, 0];

/// Every 4th strong beat, starting with the 4th, becomes a jump.
const JUMP_PHASE: usize = 3;
const JUMP_STRIDE: usize = 4;

/// One sampled station along the generated path.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrackNode {
    /// Normalized progress in `[0, 1]`.
    pub progress: f32,
    /// Cumulative arc length in distance units.
    pub distance: f32,
    pub pos: Vec3,
    /// Unit direction toward the next station. The last station reuses the
    /// direction of the one before it.
    pub forward: Vec3,
    pub up: Vec3,
    pub is_jump: bool,
}

/// A lane-tagged obstacle marker derived from a treble transient.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TreblePulse {
    /// Time of the underlying treble peak in seconds.
    pub time: f32,
    pub pos: Vec3,
    /// Peak strength relative to the strongest peak, in `[0, 1]`.
    pub intensity: f32,
    /// Lane index in `{-1, 0, 1}`.
    pub lane: i32,
}

impl TreblePulse {
    /// Distance of this hazard along the track. Depth carries arc length
    /// because the path advances along +Z.
    pub fn track_distance(&self) -> f32 {
        self.pos.z
    }
}

/// The generated path and its hazards. Immutable once generated, owned by
/// the active session, and replaced wholesale on reload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackData {
    pub nodes: Vec<TrackNode>,
    pub treble_pulses: Vec<TreblePulse>,
    /// Total arc length in distance units.
    pub length: f32,
}

/// Builds a [`TrackData`] from a [`MusicMap`]. Runs once per recording and
/// must complete before the first simulation tick that references the path.
#[derive(Debug, Clone, Default)]
pub struct TrackGenerator {
    config: TrackConfig,
}

impl TrackGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TrackConfig) -> Self {
        Self { config }
    }

    pub fn generate(&self, map: &MusicMap) -> TrackData {
        let cfg = &self.config;
        let duration = map.duration.max(0.0);
        let count = ((duration * cfg.nodes_per_second) as usize)
            .max(cfg.min_nodes)
            .max(2);

        let heights = resample_energy(&map.energy_samples, duration, count);
        let jump_times = jump_times(&map.beats, cfg.strong_beat_ratio);

        let mut nodes = Vec::with_capacity(count);
        for i in 0..count {
            let progress = i as f32 / (count - 1) as f32;
            let time = progress * duration;
            let distance = time * cfg.speed;
            let pos = Vec3::new(
                (time * cfg.curve_frequency).sin() * cfg.curve_amplitude,
                heights[i] * cfg.height_scale,
                distance,
            );
            let is_jump = jump_times
                .iter()
                .any(|&jump| (time - jump).abs() <= cfg.jump_tolerance);

            nodes.push(TrackNode {
                progress,
                distance,
                pos,
                forward: Vec3::Z,
                up: Vec3::Y,
                is_jump,
            });
        }

        orient_nodes(&mut nodes);

        let treble_pulses = place_pulses(map, &nodes, cfg);
        let length = nodes.last().map(|node| node.distance).unwrap_or(0.0);

        TrackData {
            nodes,
            treble_pulses,
            length,
        }
    }
}

/// Resamples an energy series to `count` evenly spaced values using a
/// triangular kernel of half-width twice the average sample spacing.
/// Targets with no sample in range resolve to 0.
fn resample_energy(samples: &[EnergySample], duration: f32, count: usize) -> Vec<f32> {
    if samples.is_empty() || duration <= 0.0 {
        return vec![0.0; count];
    }

    let half_width = 2.0 * (duration / samples.len() as f32);
    (0..count)
        .map(|i| {
            let target = if count > 1 {
                i as f32 / (count - 1) as f32 * duration
            } else {
                0.0
            };

            let mut weighted = 0.0;
            let mut total = 0.0;
            for sample in samples {
                let offset = (sample.time - target).abs();
                if offset < half_width {
                    let weight = 1.0 - offset / half_width;
                    weighted += sample.rms * weight;
                    total += weight;
                }
            }

            if total > 0.0 {
                weighted / total
            } else {
                0.0
            }
        })
        .collect()
}

/// Timestamps at which the track asks for a jump: every [`JUMP_STRIDE`]th
/// strong beat, where a strong beat exceeds `strong_beat_ratio` times the
/// median strength.
fn jump_times(beats: &[BeatMarker], strong_beat_ratio: f32) -> Vec<f32> {
    if beats.is_empty() {
        return Vec::new();
    }

    let mut strengths: Vec<f32> = beats.iter().map(|beat| beat.strength).collect();
    strengths.sort_by(f32::total_cmp);
    let cutoff = strengths[strengths.len() / 2] * strong_beat_ratio;

    let mut strong: Vec<f32> = beats
        .iter()
        .filter(|beat| beat.strength > cutoff)
        .map(|beat| beat.time)
        .collect();
    strong.sort_by(f32::total_cmp);

    strong
        .into_iter()
        .skip(JUMP_PHASE)
        .step_by(JUMP_STRIDE)
        .collect()
}

/// Second build phase: derive forward vectors from neighbouring positions.
/// Zero-length segments fall back to world forward instead of producing NaN.
fn orient_nodes(nodes: &mut [TrackNode]) {
    for i in 0..nodes.len() {
        nodes[i].forward = if i + 1 < nodes.len() {
            (nodes[i + 1].pos - nodes[i].pos)
                .try_normalize()
                .unwrap_or(Vec3::Z)
        } else if i > 0 {
            nodes[i - 1].forward
        } else {
            Vec3::Z
        };
    }
}

/// Places one hazard per treble peak, snapped to the nearest station and
/// offset into its lane. Degenerate maps yield an empty list.
fn place_pulses(map: &MusicMap, nodes: &[TrackNode], cfg: &TrackConfig) -> Vec<TreblePulse> {
    if map.treble_peaks.is_empty() || nodes.is_empty() || map.duration <= 0.0 {
        return Vec::new();
    }

    let max_strength = map
        .treble_peaks
        .iter()
        .map(|peak| peak.strength)
        .fold(0.0_f32, f32::max);

    map.treble_peaks
        .iter()
        .enumerate()
        .map(|(ordinal, peak)| {
            let t = (peak.time / map.duration).clamp(0.0, 1.0);
            let node = &nodes[(t * (nodes.len() - 1) as f32).round() as usize];

            let lane = HAZARD_LANE_CYCLE[ordinal % HAZARD_LANE_CYCLE.len()];
            let right = node
                .forward
                .cross(node.up)
                .try_normalize()
                .unwrap_or(Vec3::X);
            let intensity = if max_strength > 0.0 {
                peak.strength / max_strength
            } else {
                0.0
            };
            let pos = node.pos
                + right * (lane as f32 * cfg.lane_width)
                + node.up * (cfg.hazard_base_height + intensity * cfg.hazard_rise);

            TreblePulse {
                time: peak.time,
                pos,
                intensity,
                lane,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn flat_map(duration: f32) -> MusicMap {
        let samples = (0..(duration / 0.075) as usize)
            .map(|i| EnergySample {
                time: i as f32 * 0.075,
                rms: 0.5,
            })
            .collect();
        MusicMap {
            duration,
            energy_samples: samples,
            ..MusicMap::default()
        }
    }

    fn peaks(times_strengths: &[(f32, f32)]) -> Vec<BeatMarker> {
        times_strengths
            .iter()
            .map(|&(time, strength)| BeatMarker { time, strength })
            .collect()
    }

    #[test]
    fn ten_seconds_gives_hundred_nodes_and_length_500() {
        let track = TrackGenerator::new().generate(&flat_map(10.0));
        assert_eq!(track.nodes.len(), 100);
        assert_relative_eq!(track.length, 500.0);
    }

    #[test]
    fn distances_increase_and_forwards_are_unit() {
        let track = TrackGenerator::new().generate(&flat_map(30.0));
        assert!(track
            .nodes
            .windows(2)
            .all(|w| w[0].distance < w[1].distance));
        for node in &track.nodes {
            assert_relative_eq!(node.forward.length(), 1.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn last_two_nodes_share_forward() {
        let track = TrackGenerator::new().generate(&flat_map(12.0));
        let n = track.nodes.len();
        assert_eq!(track.nodes[n - 1].forward, track.nodes[n - 2].forward);
    }

    #[test]
    fn resampling_constant_series_is_constant() {
        let map = flat_map(10.0);
        let resampled = resample_energy(&map.energy_samples, 10.0, 40);
        for value in resampled {
            assert_relative_eq!(value, 0.5, epsilon = 1e-4);
        }
    }

    #[test]
    fn resampling_empty_series_is_zero() {
        assert_eq!(resample_energy(&[], 10.0, 4), vec![0.0; 4]);
    }

    #[test]
    fn hazard_lanes_cycle_by_ordinal() {
        let mut map = flat_map(10.0);
        map.treble_peaks = peaks(&[
            (1.0, 0.5),
            (2.0, 0.5),
            (3.0, 0.5),
            (4.0, 0.5),
            (5.0, 0.5),
        ]);

        let track = TrackGenerator::new().generate(&map);
        let lanes: Vec<i32> = track.treble_pulses.iter().map(|p| p.lane).collect();
        assert_eq!(lanes, vec![-1, 1, 0, -1, 1]);
    }

    #[test]
    fn strongest_peak_has_intensity_one() {
        let mut map = flat_map(10.0);
        map.treble_peaks = peaks(&[(2.0, 0.2), (5.0, 0.8), (8.0, 0.4)]);

        let track = TrackGenerator::new().generate(&map);
        assert_relative_eq!(track.treble_pulses[1].intensity, 1.0);
        assert_relative_eq!(track.treble_pulses[0].intensity, 0.25);
    }

    #[test]
    fn no_peaks_means_no_hazards() {
        let track = TrackGenerator::new().generate(&flat_map(10.0));
        assert!(track.treble_pulses.is_empty());
    }

    #[test]
    fn degenerate_duration_still_generates_nodes() {
        let track = TrackGenerator::new().generate(&MusicMap::default());
        assert_eq!(track.nodes.len(), 100);
        assert!(track.treble_pulses.is_empty());
        // Zero-length segments fall back to a defined direction.
        assert!(track.nodes.iter().all(|n| n.forward == Vec3::Z));
    }

    #[test]
    fn every_fourth_strong_beat_becomes_a_jump() {
        let mut map = flat_map(30.0);
        // Seven weak beats pin the median at 1.0; five strong beats clear
        // the 1.2x cutoff, so only the 4th strong beat (index 3) jumps.
        let mut beats = peaks(&[
            (0.5, 1.0),
            (1.0, 1.0),
            (1.5, 1.0),
            (2.0, 1.0),
            (2.5, 1.0),
            (3.0, 1.0),
            (3.5, 1.0),
        ]);
        beats.extend(peaks(&[
            (5.0, 5.0),
            (9.0, 5.0),
            (13.0, 5.0),
            (17.0, 5.0),
            (21.0, 5.0),
        ]));
        map.beats = beats;

        let track = TrackGenerator::new().generate(&map);
        let jump_nodes: Vec<&TrackNode> =
            track.nodes.iter().filter(|node| node.is_jump).collect();
        assert!(!jump_nodes.is_empty());
        for node in &jump_nodes {
            let time = node.progress * 30.0;
            assert!((time - 17.0).abs() <= 0.1 + 1e-4);
        }
    }

    #[test]
    fn hazard_depth_matches_station_depth() {
        let mut map = flat_map(10.0);
        map.treble_peaks = peaks(&[(5.0, 0.5)]);

        let track = TrackGenerator::new().generate(&map);
        let pulse = &track.treble_pulses[0];
        // Peak at half the duration snaps to the middle station.
        let node = &track.nodes[50];
        assert_relative_eq!(pulse.track_distance(), node.pos.z, epsilon = 0.05);
    }

    #[test]
    fn track_round_trips_through_json() {
        let mut map = flat_map(5.0);
        map.treble_peaks = peaks(&[(1.0, 0.3), (3.0, 0.9)]);

        let track = TrackGenerator::new().generate(&map);
        let json = serde_json::to_string(&track).unwrap();
        let parsed: TrackData = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.nodes.len(), track.nodes.len());
        assert_eq!(parsed.treble_pulses.len(), 2);
        assert_eq!(parsed.length, track.length);
    }
}
