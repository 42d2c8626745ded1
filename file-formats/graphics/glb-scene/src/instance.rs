//! Animated scene instances
//!
//! An [`AnimatedInstance`] owns a scene together with the playback state that
//! drives it, and runs the per-frame update in the required order:
//! animation, then world matrices, then skins.

use crate::animation::{AnimationPlayer, PlaybackStatus};
use crate::error::{GltfError, Result};
use crate::scene::Scene;

/// A scene plus its (optional) animation player
#[derive(Debug, Clone)]
pub struct AnimatedInstance {
    scene: Scene,
    player: Option<AnimationPlayer>,
}

impl AnimatedInstance {
    /// Wrap a scene; a player is created when the scene has animations
    pub fn new(scene: Scene) -> Self {
        let player = AnimationPlayer::new(scene.animations().to_vec());
        if player.is_none() {
            log::debug!("Scene has no animations; instance is static");
        }
        Self { scene, player }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn player(&self) -> Option<&AnimationPlayer> {
        self.player.as_ref()
    }

    pub fn into_scene(self) -> Scene {
        self.scene
    }

    /// Current playback status, `Stopped` for static instances
    pub fn status(&self) -> PlaybackStatus {
        self.player
            .as_ref()
            .map_or(PlaybackStatus::Stopped, AnimationPlayer::status)
    }

    pub fn play(&mut self) {
        match self.player.as_mut() {
            Some(player) => player.play(),
            None => log::warn!("play() on an instance without animations"),
        }
    }

    pub fn pause(&mut self) {
        if let Some(player) = self.player.as_mut() {
            player.pause();
        }
    }

    /// Stop playback and pose the scene at time 0
    pub fn stop(&mut self) {
        if let Some(player) = self.player.as_mut() {
            player.stop();
            player.apply(self.scene.nodes_mut());
            self.refresh();
        }
    }

    /// Switch to the clip called `name`
    ///
    /// Both failure cases leave the instance unchanged.
    pub fn set_clip(&mut self, name: &str) -> Result<()> {
        let Some(player) = self.player.as_mut() else {
            log::warn!("Cannot select clip '{}': no animation player", name);
            return Err(GltfError::NoAnimationPlayer);
        };
        player.set_clip(name)
    }

    pub fn set_speed(&mut self, speed: f32) {
        if let Some(player) = self.player.as_mut() {
            player.set_speed(speed);
        }
    }

    pub fn set_looping(&mut self, looping: bool) {
        if let Some(player) = self.player.as_mut() {
            player.set_looping(looping);
        }
    }

    /// Advance the instance by `delta` seconds
    ///
    /// World and joint matrices are recomputed on every call, so edits made
    /// through [`scene_mut`](Self::scene_mut) show up even while playback is
    /// paused or the scene has no animations. Returns true if the animation
    /// advanced.
    pub fn update(&mut self, delta: f32) -> bool {
        let advanced = self
            .player
            .as_mut()
            .is_some_and(|player| player.update(delta, self.scene.nodes_mut()));
        self.refresh();
        advanced
    }

    /// World matrices first, then skins
    fn refresh(&mut self) {
        self.scene.update_world_matrices();
        self.scene.update_skins();
    }
}
