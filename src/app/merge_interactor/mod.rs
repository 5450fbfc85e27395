// Merge interactor - Concatenate collected files, then optionally retime the result

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use glob::Pattern;
use tracing::{info, warn};

use crate::app::collect_interactor::CollectInteractor;
use crate::app::encode_interactor::EncodeInteractor;
use crate::app::reorder_interactor::ReorderInteractor;
use crate::domain::model::*;
use crate::domain::rules::*;
use crate::error::{TimelapseError, TimelapseResult};
use crate::ports::*;
use crate::utils::{format_elapsed, format_hms};

/// How a merge run ended
#[derive(Debug, Clone)]
pub enum MergeOutcome {
    /// Concatenated and retimed
    Encoded(EncodeOutcome),
    /// Concatenated only
    Merged { output: PathBuf, elapsed: Duration },
    /// The user cancelled the ordering prompt; nothing was written
    Cancelled,
}

/// Probed duration of one collected file
#[derive(Debug, Clone, PartialEq)]
pub struct DurationEntry {
    pub path: PathBuf,
    pub duration: Result<f64, String>,
}

/// Result of a duration-only run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DurationReport {
    pub entries: Vec<DurationEntry>,
}

impl DurationReport {
    pub fn succeeded(&self) -> usize {
        self.entries.iter().filter(|e| e.duration.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.entries.len() - self.succeeded()
    }

    /// Sum of every readable duration
    pub fn total(&self) -> f64 {
        self.entries
            .iter()
            .filter_map(|e| e.duration.as_ref().ok())
            .sum()
    }

    /// Mean over readable files, `None` when nothing could be read
    pub fn average(&self) -> Option<f64> {
        match self.succeeded() {
            0 => None,
            n => Some(self.total() / n as f64),
        }
    }

    pub fn report_lines(&self) -> Vec<String> {
        let count = self.entries.len();
        let mut lines = Vec::with_capacity(count * 2 + 6);
        for (index, entry) in self.entries.iter().enumerate() {
            lines.push(format!("  [{}/{}] {}", index + 1, count, display_name(&entry.path)));
            match &entry.duration {
                Ok(seconds) => lines.push(format!(
                    "           duration: {} ({:.2}s)",
                    format_hms(*seconds),
                    seconds
                )),
                Err(message) => lines.push(format!("           [failed] {}", message)),
            }
        }

        lines.push(String::new());
        lines.push("========== Duration summary ==========".to_string());
        lines.push(format!("[stats] readable: {}", self.succeeded()));
        if self.failed() > 0 {
            lines.push(format!("[stats] failed: {}", self.failed()));
        }
        let total = self.total();
        lines.push(format!("[stats] total: {} ({:.2}s)", format_hms(total), total));
        if let Some(average) = self.average() {
            lines.push(format!("[stats] average: {} ({:.2}s)", format_hms(average), average));
        }
        lines
    }
}

fn remove_best_effort(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => info!("Removed temporary file: {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove temporary file {}: {}", path.display(), e),
    }
}

/// Concat manifest on disk, deleted on drop
struct ConcatManifest {
    path: PathBuf,
}

impl ConcatManifest {
    fn write(folder: &Path, files: &[PathBuf], stamp: i64) -> TimelapseResult<Self> {
        let path = folder.join(format!("{}{}.txt", CONCAT_LIST_PREFIX, stamp));
        // Own the path before writing so a partial file is still removed.
        let manifest = Self { path };

        let mut writer = BufWriter::new(File::create(&manifest.path)?);
        for file in files {
            writeln!(writer, "{}", Self::line(&absolute(file)?))?;
        }
        writer.flush()?;
        Ok(manifest)
    }

    /// `file '...'` with single quotes escaped for the concat demuxer
    fn line(path: &Path) -> String {
        format!("file '{}'", path.to_string_lossy().replace('\'', "'\\''"))
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ConcatManifest {
    fn drop(&mut self) {
        remove_best_effort(&self.path);
    }
}

/// Temporary merged video plus any pass-log files derived from it
struct TempArtifact {
    path: PathBuf,
}

impl TempArtifact {
    fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    /// `{stem}*_passlog*` next to the artifact
    fn orphan_pattern(&self) -> Option<String> {
        let parent = self.path.parent()?.to_str()?;
        let stem = self.path.file_stem()?.to_str()?;
        let parent = if parent.is_empty() { "." } else { parent };
        Some(format!(
            "{}/{}*_passlog*",
            Pattern::escape(parent),
            Pattern::escape(stem)
        ))
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        remove_best_effort(&self.path);

        let Some(pattern) = self.orphan_pattern() else {
            return;
        };
        match glob::glob(&pattern) {
            Ok(paths) => {
                for orphan in paths.flatten() {
                    remove_best_effort(&orphan);
                }
            }
            Err(e) => warn!("Failed to scan for pass-log leftovers: {}", e),
        }
    }
}

fn absolute(path: &Path) -> TimelapseResult<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Interactor for merge, merge-only and duration-only runs
pub struct MergeInteractor {
    collect_interactor: CollectInteractor,
    reorder_interactor: ReorderInteractor,
    encode_interactor: Arc<EncodeInteractor>,
    probe_port: Arc<dyn ProbePort>,
    concat_port: Arc<dyn ConcatPort>,
}

impl MergeInteractor {
    /// Create new merge interactor with injected ports
    pub fn new(
        collect_interactor: CollectInteractor,
        reorder_interactor: ReorderInteractor,
        encode_interactor: Arc<EncodeInteractor>,
        probe_port: Arc<dyn ProbePort>,
        concat_port: Arc<dyn ConcatPort>,
    ) -> Self {
        Self {
            collect_interactor,
            reorder_interactor,
            encode_interactor,
            probe_port,
            concat_port,
        }
    }

    /// Concatenate every collected file and retime the result as one job
    pub async fn merge_and_process(
        &self,
        collect: &CollectOptions,
        options: &EncodeOptions,
        auto_confirm: bool,
        prompt: &mut dyn PromptPort,
    ) -> TimelapseResult<MergeOutcome> {
        let files = self.collect_nonempty(collect)?;
        info!("Merge mode: found {} file(s)", files.len());

        let Some(order) = self.reorder_interactor.execute(files, auto_confirm, prompt) else {
            return Ok(MergeOutcome::Cancelled);
        };

        let stamp = chrono::Utc::now().timestamp_millis();
        let temp = TempArtifact::new(collect.folder.join(format!(
            "{}{}.{}",
            TEMP_MERGED_PREFIX, stamp, collect.extension
        )));
        self.concat(&collect.folder, order.files(), temp.path(), stamp).await?;

        info!("Encoding merged video");
        let outcome = self
            .encode_interactor
            .execute(temp.path(), &options.without_skip())
            .await?;

        let final_output =
            OutputNaming::merged_timelapse_output(&collect.folder, options.target, &collect.extension);
        fs::rename(&outcome.output, &final_output)?;

        let log_file = outcome.log_file.as_deref().map(|log| {
            let renamed = log.with_file_name(format!("{}.log.txt", file_stem(&final_output)));
            match fs::rename(log, &renamed) {
                Ok(()) => {
                    info!("Log file renamed: {}", renamed.display());
                    renamed
                }
                Err(e) => {
                    warn!("Failed to rename log file {}: {}", log.display(), e);
                    log.to_path_buf()
                }
            }
        });

        info!("Merge output: {}", final_output.display());
        Ok(MergeOutcome::Encoded(EncodeOutcome {
            output: final_output,
            log_file,
            stats: outcome.stats,
        }))
    }

    /// Concatenate every collected file into `{folder}_merged.{ext}` without retiming
    pub async fn merge_only(
        &self,
        collect: &CollectOptions,
        auto_confirm: bool,
        prompt: &mut dyn PromptPort,
    ) -> TimelapseResult<MergeOutcome> {
        let files = self.collect_nonempty(collect)?;
        info!("Merge-only mode: found {} file(s)", files.len());

        let Some(order) = self.reorder_interactor.execute(files, auto_confirm, prompt) else {
            return Ok(MergeOutcome::Cancelled);
        };

        let output = OutputNaming::merged_only_output(&collect.folder, &collect.extension);
        let started = Instant::now();
        let stamp = chrono::Utc::now().timestamp_millis();
        self.concat(&collect.folder, order.files(), &output, stamp).await?;
        let elapsed = started.elapsed();

        info!("[stats] merge: {}", format_elapsed(elapsed));
        info!("Merge-only output: {}", output.display());
        Ok(MergeOutcome::Merged { output, elapsed })
    }

    /// Probe every collected file; read-only
    pub async fn duration_report(&self, collect: &CollectOptions) -> TimelapseResult<DurationReport> {
        let files = self.collect_interactor.execute(collect)?;
        if files.is_empty() {
            info!(
                "No matching files: {} / {} (recurse={})",
                collect.folder.display(),
                collect.pattern,
                collect.recurse
            );
            return Ok(DurationReport::default());
        }

        info!("Duration-only mode: found {} file(s)", files.len());
        let mut report = DurationReport::default();
        for path in files {
            let duration = match self.probe_port.probe(&path).await {
                Ok(media) => Ok(media.duration),
                Err(TimelapseError::Interrupted) => return Err(TimelapseError::Interrupted),
                Err(e) => Err(e.to_string()),
            };
            report.entries.push(DurationEntry { path, duration });
        }
        Ok(report)
    }

    fn collect_nonempty(&self, collect: &CollectOptions) -> TimelapseResult<Vec<PathBuf>> {
        let files = self.collect_interactor.execute(collect)?;
        if files.is_empty() {
            return Err(TimelapseError::NoInputs {
                folder: collect.folder.clone(),
                pattern: collect.pattern.clone(),
                recurse: collect.recurse,
            });
        }
        Ok(files)
    }

    async fn concat(&self, folder: &Path, files: &[PathBuf], output: &Path, stamp: i64) -> TimelapseResult<()> {
        let manifest = ConcatManifest::write(folder, files, stamp)?;
        info!("Concatenating {} video(s)", files.len());
        self.concat_port.concat(manifest.path(), output).await?;
        info!("Concatenated: {}", output.display());
        Ok(())
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
