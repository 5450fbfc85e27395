//! CLI module for the timelapse tool
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::error::TimelapseError;

pub mod args;
pub mod commands;

/// Timelapse retime and two-pass encoder
///
/// Retimes videos to a target duration and re-encodes them with a two-pass
/// H.264 VBR encode, one file at a time, per folder, or merged.
#[derive(Parser)]
#[command(name = "timelapse")]
#[command(about = "Retime videos to a target duration with a two-pass H.264 encode")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Logging level (RUST_LOG takes precedence)
    #[arg(long, env = "TIMELAPSE_LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    /// Emit console logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Config file (default: timelapse.toml in the working directory, if present)
    #[arg(long, env = "TIMELAPSE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Retime a single video
    Run(args::RunArgs),
    /// Retime every matching video in a folder independently
    Batch(args::BatchArgs),
    /// Concatenate a folder's videos, then retime the result
    Merge(args::MergeArgs),
    /// Report the duration of every matching video
    Durations(args::DurationsArgs),
}

/// Process exit code for a failed command
pub fn exit_code(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<TimelapseError>())
        .map(TimelapseError::exit_code)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_exit_code_walks_context_chain() {
        let err = Err::<(), _>(TimelapseError::MergeFailed {
            message: "boom".to_string(),
        })
        .context("merge failed")
        .unwrap_err();
        assert_eq!(exit_code(&err), 7);
        assert_eq!(exit_code(&anyhow::anyhow!("plain")), 1);
    }

    #[test]
    fn test_log_flag_forms() {
        let cli = Cli::try_parse_from(["timelapse", "run", "in.mp4", "--log"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.encode.overlay().log.as_deref(), Some("AUTO"));

        let cli = Cli::try_parse_from(["timelapse", "run", "in.mp4", "--no-log"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.encode.overlay().log.as_deref(), Some("off"));
    }

    #[test]
    fn test_unset_flags_leave_layers_alone() {
        let cli = Cli::try_parse_from(["timelapse", "batch", "/videos", "--fps", "25"]).unwrap();
        let Commands::Batch(args) = cli.command else {
            panic!("expected batch");
        };
        let overlay = args.collect.extend(args.encode.overlay());
        assert_eq!(overlay.fps, Some(25));
        assert_eq!(overlay.quiet, None);
        assert_eq!(overlay.pattern, None);
        assert_eq!(overlay.recurse, None);
    }
}
