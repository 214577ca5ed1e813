use serde::{Deserialize, Serialize};

/// Elapsed-time source for a run: monotonic while playing, frozen while
/// paused. This clock is the only driver of progress along the track.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct PlaybackClock {
    elapsed: f32,
    playing: bool,
}

impl PlaybackClock {
    /// Creates a paused clock at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a clock at zero that is already running.
    pub fn start() -> Self {
        Self {
            elapsed: 0.0,
            playing: true,
        }
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }

    /// Advances the clock by `delta` seconds. Paused clocks do not move.
    pub fn advance(&mut self, delta: f32) {
        if self.playing {
            self.elapsed += delta.max(0.0);
        }
    }

    pub fn seconds(&self) -> f32 {
        self.elapsed
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paused_clock_does_not_advance() {
        let mut clock = PlaybackClock::new();
        clock.advance(1.0);
        assert_eq!(clock.seconds(), 0.0);

        clock.play();
        clock.advance(1.0);
        assert_eq!(clock.seconds(), 1.0);

        clock.pause();
        clock.advance(1.0);
        assert_eq!(clock.seconds(), 1.0);
    }

    #[test]
    fn negative_deltas_are_ignored() {
        let mut clock = PlaybackClock::start();
        clock.advance(0.5);
        clock.advance(-2.0);
        assert_eq!(clock.seconds(), 0.5);
    }
}
