//! FFprobe adapter for media duration and frame size probing

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::model::{FrameSize, SourceMedia};
use crate::error::{TimelapseError, TimelapseResult};
use crate::ports::*;

#[derive(Debug, Deserialize)]
struct ProbeReport {
    format: Option<ProbeFormat>,
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<Value>,
}

/// FFprobe-based probe adapter
pub struct FFprobeAdapter {
    runner: Arc<dyn ProcessRunner>,
    binary: String,
}

impl FFprobeAdapter {
    /// Create new FFprobe adapter
    pub fn new(runner: Arc<dyn ProcessRunner>, binary: impl Into<String>) -> Self {
        Self {
            runner,
            binary: binary.into(),
        }
    }

    fn probe_args(path: &Path) -> Vec<String> {
        vec![
            "-v".to_string(),
            "error".to_string(),
            "-select_streams".to_string(),
            "v:0".to_string(),
            "-show_entries".to_string(),
            "format=duration:stream=width,height".to_string(),
            "-of".to_string(),
            "json".to_string(),
            path.to_string_lossy().into_owned(),
        ]
    }

    /// Extract `format.duration` from ffprobe JSON
    pub fn parse_duration(json: &str) -> Result<f64, String> {
        Self::parse_report(json).map(|(duration, _)| duration)
    }

    /// Duration plus the first video stream's size, if any
    fn parse_report(json: &str) -> Result<(f64, Option<FrameSize>), String> {
        let report: ProbeReport =
            serde_json::from_str(json).map_err(|e| format!("malformed ffprobe output: {}", e))?;
        let frame_size = report.streams.first().and_then(|stream| {
            match (stream.width, stream.height) {
                (Some(width), Some(height)) => FrameSize::new(width, height).ok(),
                _ => None,
            }
        });
        let raw = report
            .format
            .and_then(|f| f.duration)
            .ok_or_else(|| "ffprobe reported no duration".to_string())?;

        let duration = match raw {
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("unreadable duration '{}'", s))?,
            Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| format!("unreadable duration '{}'", n))?,
            other => return Err(format!("unexpected duration value {}", other)),
        };

        if !duration.is_finite() || duration <= 0.0 {
            return Err(format!("duration must be > 0, got {}", duration));
        }
        Ok((duration, frame_size))
    }
}

#[async_trait]
impl ProbePort for FFprobeAdapter {
    async fn probe(&self, path: &Path) -> TimelapseResult<SourceMedia> {
        let invocation = ToolInvocation::new(&self.binary, Self::probe_args(path)).capturing();
        let output = self.runner.run(&invocation).await?;

        if !output.success() {
            let detail = output.stderr.trim();
            return Err(TimelapseError::ProbeFailed {
                path: path.to_path_buf(),
                message: if detail.is_empty() {
                    format!("ffprobe exited with status {:?}", output.status)
                } else {
                    detail.to_string()
                },
            });
        }

        let (duration, frame_size) =
            Self::parse_report(&output.stdout).map_err(|message| TimelapseError::ProbeFailed {
                path: path.to_path_buf(),
                message,
            })?;
        Ok(SourceMedia {
            path: path.to_path_buf(),
            duration,
            frame_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct CannedRunner {
        output: ToolOutput,
        seen: Mutex<Vec<ToolInvocation>>,
    }

    #[async_trait]
    impl ProcessRunner for CannedRunner {
        async fn run(&self, invocation: &ToolInvocation) -> TimelapseResult<ToolOutput> {
            self.seen.lock().unwrap().push(invocation.clone());
            Ok(self.output.clone())
        }
    }

    fn runner(status: i32, stdout: &str) -> Arc<CannedRunner> {
        Arc::new(CannedRunner {
            output: ToolOutput {
                status: Some(status),
                stdout: stdout.to_string(),
                stderr: String::new(),
            },
            seen: Mutex::new(Vec::new()),
        })
    }

    #[test]
    fn test_parse_duration_string_and_number() {
        assert_eq!(
            FFprobeAdapter::parse_duration(r#"{"format": {"duration": "12.500000"}}"#).unwrap(),
            12.5
        );
        assert_eq!(
            FFprobeAdapter::parse_duration(r#"{"format": {"duration": 3}}"#).unwrap(),
            3.0
        );
    }

    #[test]
    fn test_parse_duration_rejects_bad_output() {
        assert!(FFprobeAdapter::parse_duration("not json").is_err());
        assert!(FFprobeAdapter::parse_duration(r#"{"format": {}}"#).is_err());
        assert!(FFprobeAdapter::parse_duration(r#"{"format": {"duration": "0.0"}}"#).is_err());
        assert!(FFprobeAdapter::parse_duration(r#"{"format": {"duration": "N/A"}}"#).is_err());
    }

    #[tokio::test]
    async fn test_probe_builds_json_query() {
        let fake = runner(
            0,
            r#"{"streams": [{"width": 1920, "height": 1080}], "format": {"duration": "42.0"}}"#,
        );
        let adapter = FFprobeAdapter::new(fake.clone(), "ffprobe");

        let media = adapter.probe(Path::new("/v/in.mp4")).await.unwrap();
        assert_eq!(media.duration, 42.0);
        assert_eq!(media.frame_size, Some(FrameSize { width: 1920, height: 1080 }));
        assert_eq!(media.path, Path::new("/v/in.mp4"));

        let seen = fake.seen.lock().unwrap();
        assert_eq!(seen[0].program, "ffprobe");
        assert!(seen[0].capture_stdout);
        assert_eq!(
            seen[0].args,
            vec![
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "format=duration:stream=width,height",
                "-of",
                "json",
                "/v/in.mp4"
            ]
        );
    }

    #[tokio::test]
    async fn test_probe_nonzero_exit_is_probe_failed() {
        let adapter = FFprobeAdapter::new(runner(1, ""), "ffprobe");
        let err = adapter.probe(Path::new("broken.mp4")).await.unwrap_err();
        assert!(matches!(err, TimelapseError::ProbeFailed { .. }));
    }

    #[tokio::test]
    async fn test_probe_without_video_stream_has_no_frame_size() {
        let fake = runner(0, r#"{"streams": [], "format": {"duration": "8.0"}}"#);
        let media = FFprobeAdapter::new(fake, "ffprobe")
            .probe(Path::new("/v/audio.m4a"))
            .await
            .unwrap();
        assert_eq!(media.frame_size, None);
    }
}
