// Tracing log adapter - Console logging via tracing, optionally tee'd to a job file

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::error::TimelapseResult;
use crate::ports::*;

/// Opens job log sinks
#[derive(Debug, Default, Clone)]
pub struct TracingLogAdapter;

impl TracingLogAdapter {
    /// Create new tracing log adapter
    pub fn new() -> Self {
        Self
    }
}

impl LogSinkFactory for TracingLogAdapter {
    fn open(&self, file: Option<&Path>) -> TimelapseResult<Arc<dyn LogPort>> {
        Ok(Arc::new(JobLog::open(file)?))
    }
}

/// One job's log: every line goes to tracing and, if enabled, to the file
pub struct JobLog {
    path: Option<PathBuf>,
    writer: Option<Mutex<BufWriter<File>>>,
}

impl JobLog {
    /// Console-only sink
    pub fn console() -> Self {
        Self {
            path: None,
            writer: None,
        }
    }

    /// Open (append) the log file, creating its directory
    pub fn open(file: Option<&Path>) -> TimelapseResult<Self> {
        let Some(path) = file else {
            return Ok(Self::console());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let handle = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: Some(path.to_path_buf()),
            writer: Some(Mutex::new(BufWriter::new(handle))),
        })
    }

    fn append(&self, line: &str) {
        let Some(writer) = &self.writer else {
            return;
        };
        let Ok(mut writer) = writer.lock() else {
            return;
        };
        // A failing log file must never abort the encode.
        if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
            warn!("Failed to write job log: {}", e);
        }
    }
}

impl LogPort for JobLog {
    fn info(&self, message: &str) {
        info!("{}", message);
        self.append(message);
    }

    fn warn(&self, message: &str) {
        warn!("{}", message);
        self.append(&format!("WARNING: {}", message));
    }

    fn file_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
