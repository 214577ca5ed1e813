//! Core library for the Wavetrail rhythm runner.
//!
//! Everything in this crate is a pure, synchronous data transformation:
//! decoded audio goes in one end, and a feature map, a procedurally
//! generated track with hazards, and a per-tick lane decision come out the
//! other. Rendering, audio decoding/playback, and input handling live with
//! external collaborators (the command line crate is the reference one) and
//! only exchange the data types defined here.

pub mod analysis;
pub mod autopilot;
pub mod config;
pub mod error;
pub mod session;
pub mod timeline;
pub mod track;

pub use analysis::{BeatMarker, EnergySample, MusicMap, SignalAnalyzer};
pub use autopilot::{plan_change, Autopilot, LANES};
pub use config::{AnalysisConfig, AvoidanceConfig, SessionConfig, TrackConfig};
pub use error::{Result, WavetrailError};
pub use session::{RunSession, RunState, SteerDirection};
pub use timeline::PlaybackClock;
pub use track::{TrackData, TrackGenerator, TrackNode, TreblePulse};
