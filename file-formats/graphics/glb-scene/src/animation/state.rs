//! Playback state tracking

/// Playback status of an animation player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    /// Time is 0 and does not advance
    #[default]
    Stopped,
    /// Time advances on every update
    Playing,
    /// Time is frozen at its current value
    Paused,
}

/// Per-instance playback state
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    /// Index of the active clip
    pub clip: usize,
    /// Current time within the clip (seconds)
    pub time: f32,
    pub status: PlaybackStatus,
    /// Wrap around at the clip ends instead of pausing
    pub looping: bool,
    /// Time multiplier; negative values play backwards
    pub speed: f32,
}

impl PlaybackState {
    /// Create a stopped state for the given clip
    pub fn new(clip: usize) -> Self {
        Self {
            clip,
            time: 0.0,
            status: PlaybackStatus::Stopped,
            looping: true,
            speed: 1.0,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    /// Stopped/Paused -> Playing
    pub fn play(&mut self) {
        self.status = PlaybackStatus::Playing;
    }

    /// Playing -> Paused, keeping the current time
    pub fn pause(&mut self) {
        if self.status == PlaybackStatus::Playing {
            self.status = PlaybackStatus::Paused;
        }
    }

    /// Any -> Stopped, resetting time to 0
    pub fn stop(&mut self) {
        self.status = PlaybackStatus::Stopped;
        self.time = 0.0;
    }

    /// Advance time by `delta * speed` inside a clip of length `duration`
    ///
    /// Returns true if time was advanced. Non-looping playback that runs off
    /// either end is clamped to that end and paused.
    pub fn advance(&mut self, delta: f32, duration: f32) -> bool {
        if self.status != PlaybackStatus::Playing || !delta.is_finite() {
            return false;
        }

        let step = delta * self.speed;
        if !step.is_finite() {
            log::warn!(
                "Ignoring playback step of {} x {} that overflows",
                delta,
                self.speed
            );
            return false;
        }

        let time = self.time + step;
        if duration <= 0.0 {
            self.time = 0.0;
            if !self.looping {
                self.status = PlaybackStatus::Paused;
            }
            return true;
        }

        if (0.0..=duration).contains(&time) {
            self.time = time;
        } else if self.looping {
            // Reduce the step first so huge steps cannot overflow the sum
            self.time = (self.time + step.rem_euclid(duration)).rem_euclid(duration);
        } else {
            self.time = time.clamp(0.0, duration);
            self.status = PlaybackStatus::Paused;
            log::debug!("Clip {} reached its end at {:.3}s", self.clip, self.time);
        }
        true
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new(0)
    }
}
