//! Loader and skeletal-animation runtime for binary glTF (GLB) files.
//!
//! This crate reads GLB containers, exposes their buffer views and typed
//! accessors without copying the binary payload, assembles the node
//! hierarchy, skins and animation clips, and drives per-frame playback:
//!
//! 1. [`AnimationPlayer`] advances time and writes sampled values onto nodes
//! 2. [`SceneGraph`] recomputes world matrices from the roots down
//! 3. [`Skin`] recomputes joint matrices from those world matrices
//!
//! [`AnimatedInstance`] bundles a [`Scene`] with its player and runs the
//! three steps in that order.

#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod accessor;
pub mod animation;
pub mod buffer_view;
pub mod container;
pub mod error;
pub mod instance;
pub mod mesh;
pub mod node;
pub mod options;
pub mod scene;
pub mod schema;
pub mod skin;

pub use accessor::{Accessor, ComponentType, StructureType};
pub use animation::{
    AnimationChannel, AnimationClip, AnimationPlayer, AnimationSampler, Interpolation,
    PlaybackState, PlaybackStatus, PropertyValue, TargetProperty,
};
pub use buffer_view::{BufferUsage, BufferView, GpuDevice};
pub use container::{GlbContainer, GlbHeader};
pub use error::{GltfError, Result};
pub use instance::AnimatedInstance;
pub use mesh::{Mesh, Primitive};
pub use node::{FlattenedNode, Node, SceneGraph};
pub use options::LoadOptions;
pub use scene::Scene;
pub use skin::Skin;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
