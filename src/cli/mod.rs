//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod build;
mod info;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

pub use info::PaletteAction;

use crate::pi::DEFAULT_PORT;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// mcpaint - Render images into a block world
#[derive(Parser)]
#[command(name = "mcpaint")]
#[command(about = "mcpaint - Quantize images to block palettes and build them in Minecraft: Pi Edition")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build an image in the world, starting at the player's position
    Build {
        /// Image file (PNG, JPEG, BMP, GIF)
        image: PathBuf,

        /// World Y coordinate for every block (default from config)
        #[arg(long)]
        height: Option<i32>,

        /// Longest side of the built image in blocks (default from config)
        #[arg(long)]
        max_size: Option<u32>,

        /// Palette (colormap) name (default from config)
        #[arg(short, long)]
        palette: Option<String>,

        /// Reverse the palette (light blocks for dark pixels)
        #[arg(long)]
        flip: bool,

        /// Host running the Pi API
        #[arg(long, default_value = "localhost")]
        host: String,

        /// Pi API port
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Socket timeout in seconds (no timeout when omitted)
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Config file (default: discovered mcpaint.toml or built-in)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print placements instead of connecting (anchor 0,0,0)
        #[arg(long)]
        dry_run: bool,

        /// Report progress as JSON lines
        #[arg(long)]
        json: bool,

        /// Also append logs to this file
        #[arg(long)]
        log_file: Option<PathBuf>,

        /// Debug logging and per-row progress
        #[arg(short, long)]
        verbose: bool,
    },

    /// List or show configured palettes
    Palettes {
        #[command(subcommand)]
        action: PaletteAction,

        /// Config file (default: discovered mcpaint.toml or built-in)
        #[arg(short, long, global = true)]
        config: Option<PathBuf>,
    },
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            image,
            height,
            max_size,
            palette,
            flip,
            host,
            port,
            timeout_secs,
            config,
            dry_run,
            json,
            log_file,
            verbose,
        } => build::run_build(build::BuildArgs {
            image,
            height,
            max_size,
            palette,
            flip,
            host,
            port,
            timeout_secs,
            config,
            dry_run,
            json,
            log_file,
            verbose,
        }),
        Commands::Palettes { action, config } => info::run_palettes(action, config.as_deref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_build_args() {
        let cli = Cli::try_parse_from([
            "mcpaint", "build", "fox.jpg", "--max-size", "256", "-p", "one_value.grayscale", "--flip",
            "--dry-run",
        ])
        .unwrap();
        match cli.command {
            Commands::Build { image, max_size, palette, flip, dry_run, port, height, .. } => {
                assert_eq!(image, PathBuf::from("fox.jpg"));
                assert_eq!(max_size, Some(256));
                assert_eq!(palette.as_deref(), Some("one_value.grayscale"));
                assert!(flip);
                assert!(dry_run);
                assert_eq!(port, DEFAULT_PORT);
                assert_eq!(height, None);
            }
            _ => panic!("expected build command"),
        }
    }

    #[test]
    fn test_negative_height_accepted() {
        let cli = Cli::try_parse_from(["mcpaint", "build", "a.png", "--height=-5"]).unwrap();
        assert!(matches!(cli.command, Commands::Build { height: Some(-5), .. }));
    }
}
