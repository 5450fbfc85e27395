//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;

use crate::config_initialization::SettingsOverlay;

/// Encode parameters shared by run, batch and merge
#[derive(Args, Debug, Clone, Default)]
pub struct EncodeArgs {
    /// Target duration: seconds (30), M:SS (1:30) or H:MM:SS (01:02:03)
    #[arg(short, long)]
    pub target: Option<String>,

    /// Output frame rate
    #[arg(long)]
    pub fps: Option<u32>,

    /// Target video bitrate, e.g. 6000k
    #[arg(long = "b", value_name = "BITRATE")]
    pub bitrate: Option<String>,

    /// Maximum video bitrate, e.g. 24000k
    #[arg(long = "max", value_name = "BITRATE")]
    pub max_bitrate: Option<String>,

    /// VBV buffer size, e.g. 48000k
    #[arg(long = "buf", value_name = "SIZE")]
    pub buffer_size: Option<String>,

    /// H.264 profile
    #[arg(long)]
    pub profile: Option<String>,

    /// H.264 level
    #[arg(long)]
    pub level: Option<String>,

    /// Resolution keyword: source, 1080p, 720p, 4k
    #[arg(long = "res", value_name = "RES")]
    pub resolution: Option<String>,

    /// Explicit size such as 1920x1080 (wins over --res)
    #[arg(long)]
    pub size: Option<String>,

    /// Fit mode: contain, pad, crop, stretch
    #[arg(long)]
    pub fit: Option<String>,

    /// Write a job log: bare flag for AUTO, or a directory / file path
    #[arg(long, num_args = 0..=1, default_missing_value = "AUTO", value_name = "PATH")]
    pub log: Option<String>,

    /// Do not write job log files
    #[arg(long, conflicts_with = "log")]
    pub no_log: bool,

    /// Only show encoder errors
    #[arg(long)]
    pub quiet: bool,

    /// Treat an existing output as done
    #[arg(long)]
    pub skip_existing: bool,

    /// Output container extension
    #[arg(long = "ext", value_name = "EXT")]
    pub extension: Option<String>,
}

impl EncodeArgs {
    /// Configuration layer for the flags that were given
    pub fn overlay(&self) -> SettingsOverlay {
        SettingsOverlay {
            target: self.target.clone(),
            fps: self.fps,
            bitrate: self.bitrate.clone(),
            max_bitrate: self.max_bitrate.clone(),
            buffer_size: self.buffer_size.clone(),
            profile: self.profile.clone(),
            level: self.level.clone(),
            resolution: self.resolution.clone(),
            size: self.size.clone(),
            fit: self.fit.clone(),
            log: if self.no_log {
                Some("off".to_string())
            } else {
                self.log.clone()
            },
            quiet: self.quiet.then_some(true),
            skip_existing: self.skip_existing.then_some(true),
            extension: self.extension.clone(),
            ..Default::default()
        }
    }
}

/// Folder scan parameters
#[derive(Args, Debug, Clone)]
pub struct CollectArgs {
    /// Folder to scan
    pub folder: PathBuf,

    /// File name pattern, e.g. "*.mp4"
    #[arg(long)]
    pub pattern: Option<String>,

    /// Descend into subfolders
    #[arg(long)]
    pub recurse: bool,
}

impl CollectArgs {
    /// Add the scan flags to a configuration layer
    pub fn extend(&self, mut overlay: SettingsOverlay) -> SettingsOverlay {
        if self.pattern.is_some() {
            overlay.pattern = self.pattern.clone();
        }
        if self.recurse {
            overlay.recurse = Some(true);
        }
        overlay
    }
}

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Input video file path
    pub input: PathBuf,

    #[command(flatten)]
    pub encode: EncodeArgs,
}

/// Arguments for the batch command
#[derive(Args, Debug)]
pub struct BatchArgs {
    #[command(flatten)]
    pub collect: CollectArgs,

    #[command(flatten)]
    pub encode: EncodeArgs,
}

/// Arguments for the merge command
#[derive(Args, Debug)]
pub struct MergeArgs {
    #[command(flatten)]
    pub collect: CollectArgs,

    #[command(flatten)]
    pub encode: EncodeArgs,

    /// Concatenate only, without retiming
    #[arg(long)]
    pub merge_only: bool,

    /// Accept the default order without prompting
    #[arg(short = 'y', long)]
    pub yes: bool,
}

/// Arguments for the durations command
#[derive(Args, Debug)]
pub struct DurationsArgs {
    #[command(flatten)]
    pub collect: CollectArgs,
}
