//! Main entry point for the glb-rs CLI

mod cli;
mod commands;
mod utils;

use anyhow::Result;
use clap::CommandFactory;
use clap::Parser;
use clap_complete::{Generator, generate};
use glb_scene::LoadOptions;
use std::io;

use crate::cli::{Cli, Commands};

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // Parse command line arguments
    let cli = Cli::parse();

    // Set verbosity
    if cli.verbose > 0 {
        log::set_max_level(match cli.verbose {
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        });
    } else if cli.quiet {
        log::set_max_level(log::LevelFilter::Error);
    }

    let options = LoadOptions {
        strict_length: cli.strict,
        ..Default::default()
    };

    // Execute command
    match cli.command {
        Commands::Info { file, detailed } => commands::info::execute(&file, detailed, &options),
        Commands::Tree {
            file,
            depth,
            metadata,
            no_color,
        } => commands::tree::execute(&file, depth, metadata, no_color, &options),
        Commands::Animate {
            file,
            clip,
            time,
            fps,
            speed,
            no_loop,
        } => commands::animate::execute(
            &file,
            &commands::animate::AnimateArgs {
                clip,
                time,
                fps,
                speed,
                looping: !no_loop,
            },
            &options,
        ),
        Commands::Completions { shell } => {
            print_completions(shell, &mut Cli::command());
            Ok(())
        }
    }
}

fn print_completions<G: Generator>(generator: G, cmd: &mut clap::Command) {
    generate(
        generator,
        cmd,
        cmd.get_name().to_string(),
        &mut io::stdout(),
    );
}
