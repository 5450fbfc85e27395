//! Timelapse CLI
//!
//! Retimes videos to a target duration and re-encodes them with a two-pass
//! H.264 VBR encode through `ffmpeg`.
//!
//! # Usage
//!
//! ```bash
//! timelapse run clip.mp4 --target 1:30 --res 1080p --fit pad
//! timelapse batch ./footage --pattern "*.mov" --skip-existing
//! timelapse merge ./footage --target 60 --yes
//! timelapse merge ./footage --merge-only
//! timelapse durations ./footage --recurse
//! ```

use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use timelapse_cli::cli::{self, Cli};
use timelapse_cli::utils::interrupt;

/// Main entry point for the timelapse CLI
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over --log-level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    debug!("Starting timelapse CLI");

    if let Err(e) = interrupt::install() {
        warn!("Failed to install Ctrl-C handler: {}", e);
    }

    match cli::commands::execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(cli::exit_code(&e))
        }
    }
}
