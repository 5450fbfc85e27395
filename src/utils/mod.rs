//! Common utilities and helpers

pub mod interrupt;
pub mod time;

pub use time::{format_elapsed, format_hms};
