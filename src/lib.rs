//! Timelapse CLI library
//!
//! Retimes videos to a target duration by driving an external two-pass
//! H.264 encoder, for single files, whole folders, or a merged folder.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config_initialization;
pub mod domain;
pub mod error;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use domain::model::{EncodeOptions, EncodeOutcome, EncodeStats, FitMode, TargetDuration, TargetGeometry};
pub use error::{TimelapseError, TimelapseResult};
