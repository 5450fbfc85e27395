// Encode interactor - Two-pass retime encode of one input

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::domain::model::*;
use crate::domain::rules::*;
use crate::error::{TimelapseError, TimelapseResult};
use crate::ports::*;
use crate::utils::format_elapsed;

/// Pass-log sidecar files of one job, removed on drop unless cleaned explicitly
struct PassLogSidecar {
    base: PathBuf,
    log: Arc<dyn LogPort>,
    armed: bool,
}

impl PassLogSidecar {
    fn new(base: PathBuf, log: Arc<dyn LogPort>) -> Self {
        Self {
            base,
            log,
            armed: true,
        }
    }

    /// `X`, `X.mbtree`, and the `X-0.log` pair x264 actually writes
    fn files(&self) -> [PathBuf; 4] {
        let with = |suffix: &str| {
            let mut name = self.base.clone().into_os_string();
            name.push(suffix);
            PathBuf::from(name)
        };
        [with(""), with(".mbtree"), with("-0.log"), with("-0.log.mbtree")]
    }

    fn remove_all(&self) {
        for file in self.files() {
            match fs::remove_file(&file) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => self
                    .log
                    .warn(&format!("Failed to remove {}: {}", file.display(), e)),
            }
        }
    }

    fn cleanup(mut self) {
        self.remove_all();
        self.armed = false;
    }
}

impl Drop for PassLogSidecar {
    fn drop(&mut self) {
        if self.armed {
            self.remove_all();
        }
    }
}

/// Interactor for the two-pass encode of a single input
pub struct EncodeInteractor {
    probe_port: Arc<dyn ProbePort>,
    encode_port: Arc<dyn EncodePort>,
    log_factory: Arc<dyn LogSinkFactory>,
}

impl EncodeInteractor {
    /// Create new encode interactor with injected ports
    pub fn new(
        probe_port: Arc<dyn ProbePort>,
        encode_port: Arc<dyn EncodePort>,
        log_factory: Arc<dyn LogSinkFactory>,
    ) -> Self {
        Self {
            probe_port,
            encode_port,
            log_factory,
        }
    }

    /// Probe, plan and encode `input` to its deterministic output path
    pub async fn execute(&self, input: &Path, options: &EncodeOptions) -> TimelapseResult<EncodeOutcome> {
        if !input.exists() {
            return Err(TimelapseError::MissingInput {
                path: input.to_path_buf(),
            });
        }
        let started = Instant::now();

        let probe_started = Instant::now();
        let source = self.probe_port.probe(input).await?;
        let probe = probe_started.elapsed();
        let source_duration = source.duration;
        if !source_duration.is_finite() || source_duration <= 0.0 {
            return Err(TimelapseError::ProbeFailed {
                path: source.path,
                message: format!("duration must be > 0, got {}", source_duration),
            });
        }

        let plan_started = Instant::now();
        let plan = RetimePlanner::plan(source_duration, options.target, options.geometry, options.fps)?;
        let output = OutputNaming::timelapse_output(input, options.target, plan.geometry(), &options.extension);
        let filter_plan = plan_started.elapsed();

        if options.skip_existing && output.exists() {
            info!("Output already exists, skipping: {}", output.display());
            return Ok(EncodeOutcome {
                output,
                log_file: None,
                stats: EncodeStats::skipped(source_duration, plan.speed_ratio()),
            });
        }

        let log = self.open_log(options.log.log_path_for(&output).as_deref())?;
        let job = EncodeJob {
            input: input.to_path_buf(),
            passlog: OutputNaming::passlog_base(&output),
            plan,
            codec: options.codec.clone(),
            output,
        };
        self.describe(&job, &source, options, log.as_ref());

        let sidecar = PassLogSidecar::new(job.passlog.clone(), Arc::clone(&log));

        let pass1 = self
            .run_pass(&job, EncodePass::First, PassOutput::Discard, log.as_ref())
            .await?;
        let pass2 = self
            .run_pass(
                &job,
                EncodePass::Second,
                PassOutput::File(job.output.clone()),
                log.as_ref(),
            )
            .await?;

        let cleanup_started = Instant::now();
        sidecar.cleanup();
        let cleanup = cleanup_started.elapsed();

        let stats = EncodeStats {
            source_duration,
            speed_ratio: job.plan.speed_ratio(),
            probe,
            filter_plan,
            pass1,
            pass2,
            cleanup,
            total: started.elapsed(),
            skipped: false,
        };
        Self::report(&stats, log.as_ref());
        log.info(&format!("Done: {}", job.output.display()));

        Ok(EncodeOutcome {
            output: job.output,
            log_file: log.file_path().map(Path::to_path_buf),
            stats,
        })
    }

    fn open_log(&self, file: Option<&Path>) -> TimelapseResult<Arc<dyn LogPort>> {
        self.log_factory.open(file).or_else(|e| {
            warn!("Failed to open job log, logging to console only: {}", e);
            self.log_factory.open(None)
        })
    }

    fn describe(&self, job: &EncodeJob, source: &SourceMedia, options: &EncodeOptions, log: &dyn LogPort) {
        log.info(&format!(
            "Start time: {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        ));
        if let Some(file) = log.file_path() {
            log.info(&format!("Log file: {}", file.display()));
        }
        log.info(&format!("Input: {}", job.input.display()));
        log.info(&format!("Input duration: {:.2}s", source.duration));
        log.info(&format!(
            "Target: {} | speed ratio: {:.2}x (>1 faster, <1 slower)",
            options.target,
            job.plan.speed_ratio()
        ));
        match job.plan.geometry() {
            None => log.info("Resolution: source"),
            Some(geometry) => log.info(&format!(
                "Resolution: {} | fit: {} | scaler: lanczos",
                geometry.size, geometry.fit
            )),
        }
        if let Some(frame_size) = source.frame_size {
            log.info(&format!(
                "Frame size: {} -> {}",
                frame_size,
                job.plan.resulting_size(frame_size)
            ));
        }
        log.info(&format!(
            "Export: {}fps | 2-pass VBR | target {} / max {} | {}@{}",
            job.plan.output_fps(),
            job.codec.target_bitrate,
            job.codec.max_bitrate,
            job.codec.profile,
            job.codec.level
        ));
        log.info(&format!("Output: {}", job.output.display()));
    }

    async fn run_pass(
        &self,
        job: &EncodeJob,
        pass: EncodePass,
        output: PassOutput,
        log: &dyn LogPort,
    ) -> TimelapseResult<std::time::Duration> {
        let started = Instant::now();
        log.info(&format!("Pass {} started", pass.number()));

        let request = PassRequest {
            input: job.input.clone(),
            filter_graph: job.plan.filter_graph(),
            pass,
            output,
            codec: job.codec.clone(),
            passlog: job.passlog.clone(),
        };
        if let Err(e) = self.encode_port.run_pass(&request).await {
            log.warn(&e.to_string());
            return Err(e);
        }

        log.info(&format!("Pass {} finished", pass.number()));
        Ok(started.elapsed())
    }

    fn report(stats: &EncodeStats, log: &dyn LogPort) {
        log.info(&format!("[stats] probe: {}", format_elapsed(stats.probe)));
        log.info(&format!("[stats] filterprep: {}", format_elapsed(stats.filter_plan)));
        log.info(&format!("[stats] pass1: {}", format_elapsed(stats.pass1)));
        log.info(&format!("[stats] pass2: {}", format_elapsed(stats.pass2)));
        log.info(&format!("[stats] cleanup: {}", format_elapsed(stats.cleanup)));
        log.info(&format!("[stats] total: {}", format_elapsed(stats.total)));
        log.info(&format!(
            "[stats] throughput: {:.2}x realtime (input duration / total)",
            stats.realtime()
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_sidecar_files() {
        let sidecar = PassLogSidecar::new(
            PathBuf::from("/v/out_passlog"),
            Arc::new(crate::adapters::JobLog::console()),
        );
        let files = sidecar.files();
        sidecar.cleanup();
        assert_eq!(
            files,
            [
                PathBuf::from("/v/out_passlog"),
                PathBuf::from("/v/out_passlog.mbtree"),
                PathBuf::from("/v/out_passlog-0.log"),
                PathBuf::from("/v/out_passlog-0.log.mbtree"),
            ]
        );
    }

    #[test]
    fn test_sidecar_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("out_passlog");
        let log_file = dir.path().join("out_passlog-0.log");
        fs::write(&log_file, b"stats").unwrap();

        {
            let _sidecar = PassLogSidecar::new(base, Arc::new(crate::adapters::JobLog::console()));
        }
        assert!(!log_file.exists());
    }
}
