//! FFmpeg execution adapter
//!
//! Builds the two-pass H.264 and stream-copy concat command lines and maps
//! exit statuses onto the error taxonomy.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::model::*;
use crate::error::{TimelapseError, TimelapseResult};
use crate::ports::*;

/// ENOSPC as reported by ffmpeg: `-28` on Windows, its low byte elsewhere
const DISK_FULL_STATUSES: [i32; 2] = [-28, 228];

/// FFmpeg-based execution adapter
pub struct FFmpegAdapter {
    runner: Arc<dyn ProcessRunner>,
    binary: String,
    quiet: bool,
}

impl FFmpegAdapter {
    /// Create new FFmpeg adapter
    pub fn new(runner: Arc<dyn ProcessRunner>, binary: impl Into<String>, quiet: bool) -> Self {
        Self {
            runner,
            binary: binary.into(),
            quiet,
        }
    }

    fn null_sink() -> &'static str {
        if cfg!(windows) {
            "NUL"
        } else {
            "/dev/null"
        }
    }

    fn prefix(&self) -> Vec<String> {
        let mut args = vec!["-hide_banner".to_string()];
        if self.quiet {
            args.extend(["-loglevel".to_string(), "error".to_string()]);
        }
        args
    }

    /// Full argument list for one encoder pass
    pub fn pass_args(&self, request: &PassRequest) -> Vec<String> {
        let codec = &request.codec;
        let input = request.input.to_string_lossy().into_owned();
        let passlog = request.passlog.to_string_lossy().into_owned();
        let pass = request.pass.number().to_string();

        let mut args = self.prefix();
        args.extend(
            [
                "-y",
                "-i",
                input.as_str(),
                "-vf",
                request.filter_graph.as_str(),
                "-an",
                "-map_metadata",
                "-1",
                "-map_chapters",
                "-1",
                "-c:v",
                "libx264",
                "-profile:v",
                codec.profile.as_str(),
                "-level:v",
                codec.level.as_str(),
                "-pix_fmt",
                "yuv420p",
                "-b:v",
                codec.target_bitrate.as_str(),
                "-maxrate",
                codec.max_bitrate.as_str(),
                "-bufsize",
                codec.buffer_size.as_str(),
                "-passlogfile",
                passlog.as_str(),
                "-pass",
                pass.as_str(),
            ]
            .iter()
            .map(|s| s.to_string()),
        );

        match &request.output {
            PassOutput::Discard => {
                args.extend(["-f", "null", Self::null_sink()].iter().map(|s| s.to_string()));
            }
            PassOutput::File(path) => {
                args.push("-movflags".to_string());
                args.push("+faststart".to_string());
                args.push(path.to_string_lossy().into_owned());
            }
        }
        args
    }

    /// Full argument list for a stream-copy concat
    pub fn concat_args(&self, manifest: &Path, output: &Path) -> Vec<String> {
        let manifest = manifest.to_string_lossy().into_owned();
        let output = output.to_string_lossy().into_owned();

        let mut args = self.prefix();
        args.extend(
            [
                "-f",
                "concat",
                "-safe",
                "0",
                "-i",
                manifest.as_str(),
                "-c",
                "copy",
                "-y",
                output.as_str(),
            ]
            .iter()
            .map(|s| s.to_string()),
        );
        args
    }

    fn pass_failure(pass: EncodePass, status: Option<i32>) -> TimelapseError {
        match status {
            Some(code) if DISK_FULL_STATUSES.contains(&code) => TimelapseError::DiskFull {
                pass: pass.number(),
            },
            Some(code) => TimelapseError::EncodeFailed {
                pass: pass.number(),
                status: code,
            },
            None => TimelapseError::EncodeFailed {
                pass: pass.number(),
                status: -1,
            },
        }
    }
}

#[async_trait]
impl EncodePort for FFmpegAdapter {
    async fn run_pass(&self, request: &PassRequest) -> TimelapseResult<()> {
        let invocation = ToolInvocation::new(&self.binary, self.pass_args(request));
        debug!(pass = request.pass.number(), "Running encoder pass");

        let output = self.runner.run(&invocation).await?;
        if output.success() {
            Ok(())
        } else {
            Err(Self::pass_failure(request.pass, output.status))
        }
    }
}

#[async_trait]
impl ConcatPort for FFmpegAdapter {
    async fn concat(&self, manifest: &Path, output: &Path) -> TimelapseResult<()> {
        let invocation = ToolInvocation::new(&self.binary, self.concat_args(manifest, output));
        let result = self.runner.run(&invocation).await?;
        if result.success() {
            Ok(())
        } else {
            Err(TimelapseError::MergeFailed {
                message: format!("ffmpeg concat exited with status {:?}", result.status),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;

    struct ScriptedRunner {
        status: Option<i32>,
        seen: Mutex<Vec<ToolInvocation>>,
    }

    #[async_trait]
    impl ProcessRunner for ScriptedRunner {
        async fn run(&self, invocation: &ToolInvocation) -> TimelapseResult<ToolOutput> {
            self.seen.lock().unwrap().push(invocation.clone());
            Ok(ToolOutput {
                status: self.status,
                stdout: String::new(),
                stderr: String::new(),
            })
        }
    }

    fn adapter(status: Option<i32>, quiet: bool) -> (FFmpegAdapter, Arc<ScriptedRunner>) {
        let runner = Arc::new(ScriptedRunner {
            status,
            seen: Mutex::new(Vec::new()),
        });
        (FFmpegAdapter::new(runner.clone(), "ffmpeg", quiet), runner)
    }

    fn request(pass: EncodePass, output: PassOutput) -> PassRequest {
        PassRequest {
            input: PathBuf::from("/v/in.mp4"),
            filter_graph: "setpts=PTS/4,fps=60".to_string(),
            pass,
            output,
            codec: CodecParams::default(),
            passlog: PathBuf::from("/v/out_passlog"),
        }
    }

    #[test]
    fn test_first_pass_discards_output() {
        let (ffmpeg, _) = adapter(Some(0), false);
        let args = ffmpeg.pass_args(&request(EncodePass::First, PassOutput::Discard));

        assert_eq!(&args[..4], &["-hide_banner", "-y", "-i", "/v/in.mp4"]);
        let tail: Vec<&str> = args.iter().rev().take(5).rev().map(String::as_str).collect();
        assert_eq!(tail, vec!["-pass", "1", "-f", "null", FFmpegAdapter::null_sink()]);
        assert!(args.windows(2).any(|w| w == ["-passlogfile", "/v/out_passlog"]));
        assert!(args.windows(2).any(|w| w == ["-b:v", "6000k"]));
        assert!(args.contains(&"-an".to_string()));
    }

    #[test]
    fn test_second_pass_writes_faststart_output() {
        let (ffmpeg, _) = adapter(Some(0), true);
        let args = ffmpeg.pass_args(&request(
            EncodePass::Second,
            PassOutput::File(PathBuf::from("/v/out.mp4")),
        ));

        assert_eq!(&args[..3], &["-hide_banner", "-loglevel", "error"]);
        assert_eq!(args.last().map(String::as_str), Some("/v/out.mp4"));
        assert!(args.windows(2).any(|w| w == ["-movflags", "+faststart"]));
        assert!(args.windows(2).any(|w| w == ["-pass", "2"]));
        assert!(args.windows(2).any(|w| w == ["-map_metadata", "-1"]));
        assert!(args.windows(2).any(|w| w == ["-map_chapters", "-1"]));
    }

    #[tokio::test]
    async fn test_nonzero_exit_maps_to_encode_failed() {
        let (ffmpeg, _) = adapter(Some(1), false);
        let err = ffmpeg
            .run_pass(&request(EncodePass::Second, PassOutput::Discard))
            .await
            .unwrap_err();
        assert!(matches!(err, TimelapseError::EncodeFailed { pass: 2, status: 1 }));
    }

    #[tokio::test]
    async fn test_disk_full_is_distinct() {
        let (ffmpeg, _) = adapter(Some(228), false);
        let err = ffmpeg
            .run_pass(&request(EncodePass::First, PassOutput::Discard))
            .await
            .unwrap_err();
        assert!(matches!(err, TimelapseError::DiskFull { pass: 1 }));
    }

    #[tokio::test]
    async fn test_concat_uses_stream_copy() {
        let (ffmpeg, runner) = adapter(Some(0), false);
        ffmpeg
            .concat(Path::new("/v/_concat_list_1.txt"), Path::new("/v/_temp_merged_1.mp4"))
            .await
            .unwrap();

        let seen = runner.seen.lock().unwrap();
        assert_eq!(
            seen[0].args,
            vec![
                "-hide_banner",
                "-f",
                "concat",
                "-safe",
                "0",
                "-i",
                "/v/_concat_list_1.txt",
                "-c",
                "copy",
                "-y",
                "/v/_temp_merged_1.mp4"
            ]
        );
    }

    #[tokio::test]
    async fn test_concat_failure_is_merge_failed() {
        let (ffmpeg, _) = adapter(Some(1), false);
        let err = ffmpeg
            .concat(Path::new("list.txt"), Path::new("out.mp4"))
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), 7);
    }
}
