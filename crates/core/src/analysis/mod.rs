use serde::{Deserialize, Serialize};

use crate::AnalysisConfig;

/// Broadband or treble energy measured over one analysis window.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EnergySample {
    /// Start time of the window in seconds.
    pub time: f32,
    pub rms: f32,
}

/// A detected rhythmic or transient event.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BeatMarker {
    pub time: f32,
    pub strength: f32,
}

/// The complete feature map extracted from one recording. Immutable once
/// produced; the session that loaded the audio owns it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MusicMap {
    pub duration: f32,
    /// Broadband onset events, ordered by time.
    pub beats: Vec<BeatMarker>,
    /// Broadband energy envelope, one sample per window.
    pub energy_samples: Vec<EnergySample>,
    /// First-difference energy envelope, one sample per window.
    pub treble_samples: Vec<EnergySample>,
    /// High-frequency transient events, ordered by time.
    pub treble_peaks: Vec<BeatMarker>,
}

impl MusicMap {
    /// Returns true when analysis produced no usable features, which happens
    /// for empty or zero-length input.
    pub fn is_empty(&self) -> bool {
        self.energy_samples.is_empty()
    }
}

/// Batch feature extractor. Runs once per loaded recording over the whole
/// decoded sample buffer; it has no internal state between runs.
///
/// The "treble" series is deliberately the RMS of the first difference of
/// the samples in each window, not a true band filter. Hazard placement
/// downstream depends on the statistical behaviour of exactly this proxy.
#[derive(Debug, Clone, Default)]
pub struct SignalAnalyzer {
    config: AnalysisConfig,
}

impl SignalAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Extracts the feature map from a mono sample buffer.
    ///
    /// Degenerate input (no samples, zero sample rate, non-positive
    /// duration) yields a map with empty sequences rather than an error, so
    /// downstream generation degrades to a minimal-but-valid path.
    pub fn analyze(&self, samples: &[f32], sample_rate: u32, duration: f32) -> MusicMap {
        if samples.is_empty() || sample_rate == 0 || duration <= 0.0 {
            return MusicMap {
                duration: duration.max(0.0),
                ..MusicMap::default()
            };
        }

        let window = ((self.config.window_seconds * sample_rate as f32) as usize).max(1);
        let count = samples.len().div_ceil(window);
        let mut energy_samples = Vec::with_capacity(count);
        let mut treble_samples = Vec::with_capacity(count);

        for (index, chunk) in samples.chunks(window).enumerate() {
            let time = (index * window) as f32 / sample_rate as f32;
            energy_samples.push(EnergySample {
                time,
                rms: window_rms(chunk),
            });
            treble_samples.push(EnergySample {
                time,
                rms: difference_rms(chunk),
            });
        }

        let beats = detect_events(&energy_samples, self.config.threshold_deviation);
        let treble_peaks = detect_events(&treble_samples, self.config.threshold_deviation);

        MusicMap {
            duration,
            beats,
            energy_samples,
            treble_samples,
            treble_peaks,
        }
    }
}

/// Event threshold for an energy series: mean plus `deviation` standard
/// deviations. An empty series yields 0.
pub fn detection_threshold(series: &[EnergySample], deviation: f32) -> f32 {
    if series.is_empty() {
        return 0.0;
    }

    let len = series.len() as f32;
    let mean = series.iter().map(|s| s.rms).sum::<f32>() / len;
    let variance = series
        .iter()
        .map(|s| {
            let d = s.rms - mean;
            d * d
        })
        .sum::<f32>()
        / len;

    mean + deviation * variance.sqrt()
}

/// A sample is an event iff it is a strict local maximum above the series
/// threshold. The first and last windows never qualify.
fn detect_events(series: &[EnergySample], deviation: f32) -> Vec<BeatMarker> {
    let threshold = detection_threshold(series, deviation);
    series
        .windows(3)
        .filter(|w| w[0].rms < w[1].rms && w[1].rms > w[2].rms && w[1].rms > threshold)
        .map(|w| BeatMarker {
            time: w[1].time,
            strength: w[1].rms,
        })
        .collect()
}

fn window_rms(chunk: &[f32]) -> f32 {
    if chunk.is_empty() {
        return 0.0;
    }

    let sum: f32 = chunk.iter().map(|sample| sample * sample).sum();
    (sum / chunk.len() as f32).sqrt()
}

/// RMS of the first differences within a window, a cheap high-pass proxy.
/// A one-sample window has no differences and yields 0.
fn difference_rms(chunk: &[f32]) -> f32 {
    if chunk.len() < 2 {
        return 0.0;
    }

    let sum: f32 = chunk
        .windows(2)
        .map(|pair| {
            let d = pair[1] - pair[0];
            d * d
        })
        .sum();
    (sum / (chunk.len() - 1) as f32).sqrt()
}
