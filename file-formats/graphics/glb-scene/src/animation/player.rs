//! Animation playback control
//!
//! The AnimationPlayer owns the playback state of one animated object and
//! writes sampled clip values onto that object's nodes.

use std::sync::Arc;

use super::state::{PlaybackState, PlaybackStatus};
use super::types::AnimationClip;
use crate::error::{GltfError, Result};
use crate::node::Node;

/// Playback controller over a shared set of clips
#[derive(Debug, Clone)]
pub struct AnimationPlayer {
    clips: Vec<Arc<AnimationClip>>,
    state: PlaybackState,
}

impl AnimationPlayer {
    /// Create a stopped player with the first clip selected
    ///
    /// Returns None when there are no clips to play.
    pub fn new(clips: Vec<Arc<AnimationClip>>) -> Option<Self> {
        if clips.is_empty() {
            return None;
        }
        Some(Self {
            clips,
            state: PlaybackState::new(0),
        })
    }

    /// Names of the available clips, in document order
    pub fn clip_names(&self) -> impl Iterator<Item = &str> {
        self.clips.iter().map(|clip| clip.name())
    }

    pub fn clips(&self) -> &[Arc<AnimationClip>] {
        &self.clips
    }

    /// The active clip
    pub fn current_clip(&self) -> &AnimationClip {
        &self.clips[self.state.clip]
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn time(&self) -> f32 {
        self.state.time
    }

    pub fn status(&self) -> PlaybackStatus {
        self.state.status
    }

    pub fn speed(&self) -> f32 {
        self.state.speed
    }

    pub fn is_looping(&self) -> bool {
        self.state.looping
    }

    pub fn play(&mut self) {
        self.state.play();
    }

    pub fn pause(&mut self) {
        self.state.pause();
    }

    pub fn stop(&mut self) {
        self.state.stop();
    }

    /// Select a clip by name
    ///
    /// Time resets to 0; the playback status is kept. An unknown name leaves
    /// the player untouched.
    pub fn set_clip(&mut self, name: &str) -> Result<()> {
        match self.clips.iter().position(|clip| clip.name() == name) {
            Some(index) => {
                log::debug!("Switching to clip '{}' (index {})", name, index);
                self.state.clip = index;
                self.state.time = 0.0;
                Ok(())
            }
            None => {
                log::warn!("No animation clip named '{}'", name);
                Err(GltfError::UnknownClip(name.to_string()))
            }
        }
    }

    pub fn set_speed(&mut self, speed: f32) {
        if speed.is_finite() {
            self.state.speed = speed;
        } else {
            log::warn!("Ignoring non-finite playback speed {}", speed);
        }
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.state.looping = looping;
    }

    /// Jump to `time`, clamped to the clip range
    pub fn seek(&mut self, time: f32) {
        let duration = self.current_clip().duration();
        if time.is_finite() {
            self.state.time = time.clamp(0.0, duration);
        }
    }

    /// Advance playback and pose `nodes`
    ///
    /// Returns true if the nodes were written. Nothing happens unless the
    /// player is playing.
    pub fn update(&mut self, delta: f32, nodes: &mut [Node]) -> bool {
        let duration = self.current_clip().duration();
        if !self.state.advance(delta, duration) {
            return false;
        }
        self.apply(nodes);
        true
    }

    /// Pose `nodes` at the current time without advancing
    pub fn apply(&self, nodes: &mut [Node]) {
        self.current_clip().apply(self.state.time, nodes);
    }
}
