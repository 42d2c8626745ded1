//! glb-rs library
//!
//! Command implementations and output helpers behind the `glb-rs` binary.

pub mod cli;
pub mod commands;
pub mod utils;
