//! Error handling module for the timelapse tool

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for timelapse operations
#[derive(Error, Debug)]
pub enum TimelapseError {
    /// Target duration could not be parsed or is not positive
    #[error("Invalid duration '{value}': {reason}. Expected 30, 1:30 or 01:02:03")]
    InvalidDuration { value: String, reason: String },

    /// Size or resolution keyword could not be parsed
    #[error("Invalid size '{value}': {reason}")]
    InvalidSize { value: String, reason: String },

    /// Fit mode outside contain/pad/crop/stretch
    #[error("Invalid fit mode '{value}'. Supported: contain, pad, crop, stretch")]
    InvalidFitMode { value: String },

    /// Configuration file or environment override is malformed
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Input file not found at job start
    #[error("Input file not found: {}", path.display())]
    MissingInput { path: PathBuf },

    /// Collector found nothing to work on
    #[error("No matching files in {} (pattern {pattern}, recurse={recurse})", folder.display())]
    NoInputs {
        folder: PathBuf,
        pattern: String,
        recurse: bool,
    },

    /// External binary missing from PATH
    #[error("External tool '{tool}' not found. Make sure it is installed and on PATH")]
    ToolNotFound { tool: String },

    /// Duration unreadable or not positive
    #[error("Failed to probe {}: {message}", path.display())]
    ProbeFailed { path: PathBuf, message: String },

    /// Encoder exited with a nonzero status
    #[error("Encoder pass {pass} failed with exit status {status}")]
    EncodeFailed { pass: u8, status: i32 },

    /// Encoder ran out of disk space
    #[error("Encoder pass {pass} failed: disk is full. Free up space or choose another output location")]
    DiskFull { pass: u8 },

    /// Stream-copy concatenation failed
    #[error("Failed to concatenate inputs: {message}")]
    MergeFailed { message: String },

    /// Ctrl-C while an external tool was running
    #[error("Interrupted by user")]
    Interrupted,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TimelapseError {
    /// Process exit code for this error category
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::InvalidDuration { .. }
            | Self::InvalidSize { .. }
            | Self::InvalidFitMode { .. }
            | Self::InvalidConfig { .. } => 2,
            Self::MissingInput { .. } | Self::NoInputs { .. } => 3,
            Self::ToolNotFound { .. } => 4,
            Self::ProbeFailed { .. } => 5,
            Self::EncodeFailed { .. } | Self::DiskFull { .. } => 6,
            Self::MergeFailed { .. } => 7,
            Self::Interrupted => 130,
            Self::Io(_) => 1,
        }
    }
}

/// Result type alias for timelapse operations
pub type TimelapseResult<T> = std::result::Result<T, TimelapseError>;
