//! Keyframe animation
//!
//! This module provides:
//! - Clips made of channels, each binding a keyframe sampler to a node property
//! - STEP, LINEAR (spherical for rotations) and CUBICSPLINE interpolation
//! - A playback state machine with looping, clamping and speed control
//!
//! # Example
//!
//! ```rust,ignore
//! use glb_scene::animation::AnimationPlayer;
//!
//! let mut player = AnimationPlayer::new(scene.animations().to_vec()).unwrap();
//! player.set_clip("Walk")?;
//! player.play();
//!
//! // Once per frame
//! player.update(delta_seconds, scene.graph_mut().nodes_mut());
//! ```

mod interpolation;
mod player;
mod state;
mod types;

pub use interpolation::{Bracket, find_bracket, hermite};
pub use player::AnimationPlayer;
pub use state::{PlaybackState, PlaybackStatus};
pub use types::{
    AnimationChannel, AnimationClip, AnimationSampler, Interpolation, PropertyValue,
    TargetProperty,
};
