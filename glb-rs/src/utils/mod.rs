//! Shared utilities for the glb-rs CLI

pub mod format;
pub mod tree;

pub use format::*;
pub use tree::*;
