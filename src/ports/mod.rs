// Ports - Interface definitions (contracts)

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::model::*;
use crate::error::TimelapseResult;

/// One external program invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<String>,
    /// Capture stdout instead of inheriting the terminal
    pub capture_stdout: bool,
}

impl ToolInvocation {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            capture_stdout: false,
        }
    }

    pub fn capturing(mut self) -> Self {
        self.capture_stdout = true;
        self
    }
}

/// Outcome of a finished child process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `None` when killed by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Port for running external programs to completion
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run the program and wait for it to exit.
    ///
    /// A missing binary is reported as `ToolNotFound`; a nonzero exit is not
    /// an error at this level.
    async fn run(&self, invocation: &ToolInvocation) -> TimelapseResult<ToolOutput>;
}

/// Port for media probing
#[async_trait]
pub trait ProbePort: Send + Sync {
    /// Probe `path`; the duration is always > 0 on success
    async fn probe(&self, path: &Path) -> TimelapseResult<SourceMedia>;
}

/// Where a pass writes its video
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutput {
    /// Platform null sink
    Discard,
    File(PathBuf),
}

/// One encoder pass of a two-pass job
#[derive(Debug, Clone)]
pub struct PassRequest {
    pub input: PathBuf,
    pub filter_graph: String,
    pub pass: EncodePass,
    pub output: PassOutput,
    pub codec: CodecParams,
    pub passlog: PathBuf,
}

/// Port for the two-pass encoder
#[async_trait]
pub trait EncodePort: Send + Sync {
    /// Run one pass; nonzero exit maps to `EncodeFailed` / `DiskFull`
    async fn run_pass(&self, request: &PassRequest) -> TimelapseResult<()>;
}

/// Port for stream-copy concatenation
#[async_trait]
pub trait ConcatPort: Send + Sync {
    /// Concatenate the files listed in `manifest` into `output` without re-encoding
    async fn concat(&self, manifest: &Path, output: &Path) -> TimelapseResult<()>;
}

/// Line-oriented job log sink
pub trait LogPort: Send + Sync {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    /// File backing this sink, if any
    fn file_path(&self) -> Option<&Path>;
}

/// Opens a job log sink, optionally backed by a file
pub trait LogSinkFactory: Send + Sync {
    fn open(&self, file: Option<&Path>) -> TimelapseResult<Arc<dyn LogPort>>;
}

/// Terminal line I/O used by the reorder protocol
pub trait PromptPort {
    /// Print one line
    fn show(&mut self, line: &str);
    /// Ask for one line; `None` on end-of-input or interrupt
    fn ask(&mut self, prompt: &str) -> Option<String>;
}
