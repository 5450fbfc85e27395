//! Ctrl-C handling
//!
//! The first interrupt only raises a flag: child tools see the same signal and
//! exit, errors unwind, and the scoped temp-file guards run. A second
//! interrupt exits immediately.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::warn;

/// Exit status of a forced exit on the second interrupt
pub const FORCED_EXIT_CODE: i32 = 130;

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Install the process-wide Ctrl-C handler
pub fn install() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(|| {
        if INTERRUPTED.swap(true, Ordering::SeqCst) {
            std::process::exit(FORCED_EXIT_CODE);
        }
        warn!("Interrupted, cleaning up. Press Ctrl-C again to exit immediately");
    })
}

/// True once Ctrl-C has been received
pub fn interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}
