//! Child process runner on top of `tokio::process`

use std::io;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::{TimelapseError, TimelapseResult};
use crate::ports::*;
use crate::utils::interrupt;

/// Runs external tools and waits for them to exit
#[derive(Debug, Default, Clone)]
pub struct TokioProcessAdapter;

impl TokioProcessAdapter {
    /// Create new process adapter
    pub fn new() -> Self {
        Self
    }

    /// Resolve a program name on PATH (or an explicit path)
    pub fn locate(program: &str) -> TimelapseResult<PathBuf> {
        which::which(program).map_err(|_| TimelapseError::ToolNotFound {
            tool: program.to_string(),
        })
    }
}

fn spawn_error(program: &str, err: io::Error) -> TimelapseError {
    if err.kind() == io::ErrorKind::NotFound {
        TimelapseError::ToolNotFound {
            tool: program.to_string(),
        }
    } else {
        TimelapseError::Io(err)
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessAdapter {
    async fn run(&self, invocation: &ToolInvocation) -> TimelapseResult<ToolOutput> {
        let program = Self::locate(&invocation.program)?;
        debug!(program = %program.display(), args = ?invocation.args, "Spawning external tool");

        if interrupt::interrupted() {
            return Err(TimelapseError::Interrupted);
        }

        let mut command = Command::new(&program);
        command.args(&invocation.args).stdin(Stdio::null());

        if invocation.capture_stdout {
            let output = command
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .output()
                .await
                .map_err(|e| spawn_error(&invocation.program, e))?;
            if interrupt::interrupted() {
                return Err(TimelapseError::Interrupted);
            }
            Ok(ToolOutput {
                status: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        } else {
            let status = command
                .status()
                .await
                .map_err(|e| spawn_error(&invocation.program, e))?;
            if interrupt::interrupted() {
                return Err(TimelapseError::Interrupted);
            }
            Ok(ToolOutput {
                status: status.code(),
                stdout: String::new(),
                stderr: String::new(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_missing_binary() {
        let err = TokioProcessAdapter::locate("definitely-not-a-real-tool-7f3a").unwrap_err();
        assert!(matches!(err, TimelapseError::ToolNotFound { ref tool } if tool == "definitely-not-a-real-tool-7f3a"));
    }

    #[tokio::test]
    async fn test_run_missing_binary_is_tool_not_found() {
        let runner = TokioProcessAdapter::new();
        let invocation = ToolInvocation::new("definitely-not-a-real-tool-7f3a", vec![]);
        let err = runner.run(&invocation).await.unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_spawn_error_mapping() {
        let not_found = spawn_error("ffmpeg", io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert!(matches!(not_found, TimelapseError::ToolNotFound { .. }));
        let denied = spawn_error("ffmpeg", io::Error::new(io::ErrorKind::PermissionDenied, "no"));
        assert!(matches!(denied, TimelapseError::Io(_)));
    }
}
