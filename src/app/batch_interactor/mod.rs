// Batch interactor - Encodes every collected file independently

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::app::collect_interactor::CollectInteractor;
use crate::app::encode_interactor::EncodeInteractor;
use crate::domain::model::*;
use crate::error::{TimelapseError, TimelapseResult};
use crate::utils::{format_elapsed, interrupt};

/// Failures listed in full before the summary is truncated
pub const MAX_LISTED_FAILURES: usize = 20;

/// Outcome of a batch run
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    /// Outputs written
    pub succeeded: Vec<PathBuf>,
    /// Outputs that already existed
    pub skipped: Vec<PathBuf>,
    /// Inputs that failed, with the reason
    pub failed: Vec<(PathBuf, String)>,
    pub elapsed: Duration,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.skipped.len() + self.failed.len()
    }

    /// Human-readable summary, at most [`MAX_LISTED_FAILURES`] failure details
    pub fn report_lines(&self) -> Vec<String> {
        let mut lines = vec![
            "========== Batch summary ==========".to_string(),
            format!("[stats] elapsed: {}", format_elapsed(self.elapsed)),
            format!(
                "[stats] succeeded: {} | skipped: {} | failed: {}",
                self.succeeded.len(),
                self.skipped.len(),
                self.failed.len()
            ),
        ];
        if !self.failed.is_empty() {
            lines.push(String::new());
            lines.push("[failures]".to_string());
            for (path, message) in self.failed.iter().take(MAX_LISTED_FAILURES) {
                lines.push(format!("- {}", path.display()));
                lines.push(format!("  {}", message));
            }
            if self.failed.len() > MAX_LISTED_FAILURES {
                lines.push(format!(
                    "... {} more failures not shown",
                    self.failed.len() - MAX_LISTED_FAILURES
                ));
            }
        }
        lines
    }
}

/// Interactor for batch mode
pub struct BatchInteractor {
    collect_interactor: CollectInteractor,
    encode_interactor: Arc<EncodeInteractor>,
}

impl BatchInteractor {
    /// Create new batch interactor
    pub fn new(collect_interactor: CollectInteractor, encode_interactor: Arc<EncodeInteractor>) -> Self {
        Self {
            collect_interactor,
            encode_interactor,
        }
    }

    /// Encode every collected file; one failure never stops the batch, Ctrl-C does
    pub async fn execute(
        &self,
        collect: &CollectOptions,
        options: &EncodeOptions,
    ) -> TimelapseResult<BatchSummary> {
        let started = Instant::now();
        let files = self.collect_interactor.execute(collect)?;
        let mut summary = BatchSummary::default();

        if files.is_empty() {
            info!(
                "No matching files: {} / {} (recurse={})",
                collect.folder.display(),
                collect.pattern,
                collect.recurse
            );
            return Ok(summary);
        }

        info!("Batch started: {}", collect.folder.display());
        info!(
            "Pattern: {} | recurse={} | {} file(s)",
            collect.pattern,
            collect.recurse,
            files.len()
        );
        info!(
            "Parameters: target={} fps={} geometry={} 2-pass VBR target={} max={}",
            options.target,
            options.fps,
            options
                .geometry
                .as_ref()
                .map(TargetGeometry::tag)
                .unwrap_or_else(|| "source".to_string()),
            options.codec.target_bitrate,
            options.codec.max_bitrate
        );

        for (index, input) in files.iter().enumerate() {
            if interrupt::interrupted() {
                return Err(TimelapseError::Interrupted);
            }
            info!("===== [{}/{}] {} =====", index + 1, files.len(), input.display());
            match self.encode_interactor.execute(input, options).await {
                Ok(outcome) if outcome.is_skipped() => {
                    info!("Skipped, output exists: {}", outcome.output.display());
                    summary.skipped.push(outcome.output);
                }
                Ok(outcome) => summary.succeeded.push(outcome.output),
                Err(TimelapseError::Interrupted) => {
                    warn!(
                        "Batch interrupted at {} after {} file(s)",
                        input.display(),
                        summary.total()
                    );
                    return Err(TimelapseError::Interrupted);
                }
                Err(e) => {
                    warn!("Failed: {}: {}", input.display(), e);
                    summary.failed.push((input.clone(), e.to_string()));
                }
            }
        }

        summary.elapsed = started.elapsed();
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_caps_failure_list() {
        let summary = BatchSummary {
            failed: (0..25)
                .map(|i| (PathBuf::from(format!("clip_{}.mp4", i)), "boom".to_string()))
                .collect(),
            ..Default::default()
        };
        let lines = summary.report_lines();

        let listed = lines.iter().filter(|l| l.starts_with("- ")).count();
        assert_eq!(listed, MAX_LISTED_FAILURES);
        assert_eq!(lines.last().map(String::as_str), Some("... 5 more failures not shown"));
        assert!(lines[2].ends_with("failed: 25"));
    }

    #[test]
    fn test_report_without_failures() {
        let summary = BatchSummary {
            succeeded: vec![PathBuf::from("a_timelapse_30s_src_PR.mp4")],
            ..Default::default()
        };
        let lines = summary.report_lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(summary.total(), 1);
    }
}
