//! Root CLI structure for glb-rs

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "glb-rs")]
#[command(about = "Command-line tools for binary glTF (GLB) scenes", long_about = None)]
#[command(version)]
#[command(author)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Require the header length to match the file size exactly
    #[arg(long, global = true)]
    pub strict: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Display information about a GLB file
    Info {
        /// Path to the GLB file
        file: PathBuf,

        /// Show buffer views, accessors and clip details
        #[arg(short, long)]
        detailed: bool,
    },

    /// Display the node hierarchy as a tree
    Tree {
        /// Path to the GLB file
        file: PathBuf,

        /// Maximum depth to display
        #[arg(short, long)]
        depth: Option<usize>,

        /// Show local transforms of each node
        #[arg(short = 'm', long)]
        metadata: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Play an animation clip and print the resulting joint matrices
    Animate {
        /// Path to the GLB file
        file: PathBuf,

        /// Clip to play (defaults to the first clip)
        #[arg(short, long)]
        clip: Option<String>,

        /// Seconds of playback to simulate
        #[arg(short, long, default_value = "1.0")]
        time: f32,

        /// Frames per second of the simulated render loop
        #[arg(short, long, default_value = "60")]
        fps: f32,

        /// Playback speed multiplier
        #[arg(short, long, default_value = "1.0", allow_negative_numbers = true)]
        speed: f32,

        /// Clamp at the end of the clip instead of wrapping around
        #[arg(long)]
        no_loop: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
