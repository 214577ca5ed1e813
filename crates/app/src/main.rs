use std::fs::File;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use wavetrail_core::{
    PlaybackClock, RunSession, SessionConfig, SignalAnalyzer, TrackGenerator, WavetrailError,
};

fn main() -> wavetrail_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze { input, output } => run_analyze(&input, output.as_deref()),
        Commands::Track { input, output } => run_track(&input, output.as_deref()),
        Commands::Simulate {
            input,
            seed,
            tick_hz,
        } => run_simulate(&input, seed, tick_hz),
    }
}

fn run_analyze(input: &Path, output: Option<&Path>) -> wavetrail_core::Result<()> {
    let recording = decode_first_channel(input)?;
    tracing::info!(
        ?input,
        sample_rate = recording.sample_rate,
        duration = recording.duration,
        "decoded recording"
    );

    let map = SignalAnalyzer::new().analyze(
        &recording.samples,
        recording.sample_rate,
        recording.duration,
    );
    tracing::info!(
        beats = map.beats.len(),
        treble_peaks = map.treble_peaks.len(),
        windows = map.energy_samples.len(),
        "analysis complete"
    );

    if let Some(path) = output {
        serde_json::to_writer_pretty(File::create(path)?, &map)?;
        tracing::info!(?path, "wrote feature map");
    }
    Ok(())
}

fn run_track(input: &Path, output: Option<&Path>) -> wavetrail_core::Result<()> {
    let recording = decode_first_channel(input)?;
    let map = SignalAnalyzer::new().analyze(
        &recording.samples,
        recording.sample_rate,
        recording.duration,
    );
    let track = TrackGenerator::new().generate(&map);
    tracing::info!(
        nodes = track.nodes.len(),
        hazards = track.treble_pulses.len(),
        length = track.length,
        "track generated"
    );

    if let Some(path) = output {
        serde_json::to_writer_pretty(File::create(path)?, &track)?;
        tracing::info!(?path, "wrote track");
    }
    Ok(())
}

fn run_simulate(input: &Path, seed: Option<u64>, tick_hz: f32) -> wavetrail_core::Result<()> {
    if tick_hz <= 0.0 {
        return Err(WavetrailError::InvalidInput("tick rate must be positive"));
    }

    let recording = decode_first_channel(input)?;
    let mut config = SessionConfig::default();
    config.avoidance.seed = seed;

    let mut session = RunSession::load_with(
        &recording.samples,
        recording.sample_rate,
        recording.duration,
        config,
    );
    tracing::info!(
        hazards = session.track().treble_pulses.len(),
        length = session.track().length,
        ?seed,
        "starting headless run"
    );

    let step = 1.0 / tick_hz;
    let mut clock = PlaybackClock::start();
    let mut lane = session.state().lane;
    let mut changes = 0u32;

    while clock.seconds() < recording.duration {
        clock.advance(step);
        session.tick(clock.seconds());

        let state = session.state();
        if state.lane != lane {
            changes += 1;
            tracing::info!(
                time = clock.seconds(),
                distance = state.distance,
                from = lane,
                to = state.lane,
                "lane change"
            );
            lane = state.lane;
        }
    }

    tracing::info!(
        distance = session.state().distance,
        lane_changes = changes,
        "run finished"
    );
    Ok(())
}

/// A decoded recording reduced to what analysis needs: the first channel as
/// floats in [-1, 1], the sample rate, and the duration.
struct Recording {
    samples: Vec<f32>,
    sample_rate: u32,
    duration: f32,
}

fn decode_first_channel(path: &Path) -> wavetrail_core::Result<Recording> {
    let mut reader =
        hound::WavReader::open(path).map_err(|e| WavetrailError::msg(e.to_string()))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .step_by(channels)
            .collect::<Result<_, _>>()
            .map_err(|e| WavetrailError::msg(e.to_string()))?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .step_by(channels)
                .map(|sample| sample.map(|value| value as f32 / scale))
                .collect::<Result<_, _>>()
                .map_err(|e| WavetrailError::msg(e.to_string()))?
        }
    };

    if samples.is_empty() {
        return Err(WavetrailError::InvalidInput("audio stream has no samples"));
    }

    let duration = samples.len() as f32 / spec.sample_rate as f32;
    Ok(Recording {
        samples,
        sample_rate: spec.sample_rate,
        duration,
    })
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Music-driven track generation and autopilot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract the musical feature map from a WAV file.
    Analyze {
        /// Path to the recording to analyse.
        input: PathBuf,
        /// Optional path for the feature map as JSON.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Generate the 3D track and hazards for a WAV file.
    Track {
        /// Path to the recording to analyse.
        input: PathBuf,
        /// Optional path for the generated track as JSON.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run a headless end-to-end simulation over a WAV file.
    Simulate {
        /// Path to the recording to analyse.
        input: PathBuf,
        /// Fixed seed for the avoidance jitter, for reproducible runs.
        #[arg(short, long)]
        seed: Option<u64>,
        /// Simulation tick rate in Hz.
        #[arg(long, default_value_t = 60.0)]
        tick_hz: f32,
    },
}
