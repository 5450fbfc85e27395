// Domain models - Core types and data structures

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{TimelapseError, TimelapseResult};

/// Target duration of the retimed output, always strictly positive
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct TargetDuration {
    seconds: f64,
}

impl TargetDuration {
    /// Create a target duration, rejecting non-positive and non-finite values
    pub fn from_seconds(seconds: f64) -> TimelapseResult<Self> {
        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(TimelapseError::InvalidDuration {
                value: seconds.to_string(),
                reason: "target duration must be > 0".to_string(),
            });
        }
        Ok(Self { seconds })
    }

    /// Parse `30`, `30.5`, `1:30` or `01:02:03`
    pub fn parse(duration_str: &str) -> TimelapseResult<Self> {
        let trimmed = duration_str.trim();
        let invalid = |reason: &str| TimelapseError::InvalidDuration {
            value: trimmed.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = trimmed.split(':').collect();
        let total = match parts.as_slice() {
            [secs] => secs
                .trim()
                .parse::<f64>()
                .map_err(|_| invalid("not a number"))?,
            [mins, secs] => {
                let minutes = parse_whole(mins).ok_or_else(|| invalid("invalid minutes"))?;
                let seconds = secs
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| invalid("invalid seconds"))?;
                minutes as f64 * 60.0 + seconds
            }
            [hours, mins, secs] => {
                let hours = parse_whole(hours).ok_or_else(|| invalid("invalid hours"))?;
                let minutes = parse_whole(mins).ok_or_else(|| invalid("invalid minutes"))?;
                let seconds = secs
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| invalid("invalid seconds"))?;
                hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds
            }
            _ => return Err(invalid("expected 1, 2 or 3 colon-separated fields")),
        };

        if !total.is_finite() || total <= 0.0 {
            return Err(invalid("target duration must be > 0"));
        }
        Ok(Self { seconds: total })
    }

    pub fn seconds(&self) -> f64 {
        self.seconds
    }

    /// Filename tag, e.g. `30s` or `1p5s`.
    ///
    /// `f64`'s `Display` is the shortest representation that round-trips, so
    /// two different durations never share a tag.
    pub fn tag(&self) -> String {
        format!("{}s", self.seconds).replace('.', "p")
    }
}

fn parse_whole(field: &str) -> Option<i64> {
    field.trim().parse::<i64>().ok()
}

impl fmt::Display for TargetDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}s", self.seconds)
    }
}

/// Frame size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    /// Create a frame size; both dimensions must be positive
    pub fn new(width: u32, height: u32) -> TimelapseResult<Self> {
        if width == 0 || height == 0 {
            return Err(TimelapseError::InvalidSize {
                value: format!("{}x{}", width, height),
                reason: "width and height must be > 0".to_string(),
            });
        }
        Ok(Self { width, height })
    }

    /// Parse `1920x1080` (case-insensitive, `×` accepted)
    pub fn parse(size_str: &str) -> TimelapseResult<Self> {
        let normalized = size_str.trim().to_lowercase().replace('×', "x");
        let invalid = |reason: &str| TimelapseError::InvalidSize {
            value: size_str.trim().to_string(),
            reason: reason.to_string(),
        };

        let (w, h) = normalized
            .split_once('x')
            .ok_or_else(|| invalid("expected WIDTHxHEIGHT, e.g. 1920x1080"))?;
        let width = w
            .trim()
            .parse::<i64>()
            .map_err(|_| invalid("width is not an integer"))?;
        let height = h
            .trim()
            .parse::<i64>()
            .map_err(|_| invalid("height is not an integer"))?;

        if width <= 0 || height <= 0 {
            return Err(invalid("width and height must be > 0"));
        }
        let width = u32::try_from(width).map_err(|_| invalid("width is too large"))?;
        let height = u32::try_from(height).map_err(|_| invalid("height is too large"))?;
        Ok(Self { width, height })
    }
}

impl fmt::Display for FrameSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Symbolic resolution keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Keep the source resolution
    Source,
    Hd720,
    Hd1080,
    Uhd2160,
}

impl Resolution {
    /// Parse resolution keyword
    pub fn parse(res_str: &str) -> TimelapseResult<Self> {
        match res_str.trim().to_lowercase().as_str() {
            "" | "source" => Ok(Resolution::Source),
            "720p" => Ok(Resolution::Hd720),
            "1080p" => Ok(Resolution::Hd1080),
            "4k" | "2160p" => Ok(Resolution::Uhd2160),
            _ => Err(TimelapseError::InvalidSize {
                value: res_str.trim().to_string(),
                reason: "resolution must be one of source, 1080p, 720p, 4k".to_string(),
            }),
        }
    }

    /// Concrete pixel size, `None` for source
    pub fn size(&self) -> Option<FrameSize> {
        match self {
            Resolution::Source => None,
            Resolution::Hd720 => Some(FrameSize { width: 1280, height: 720 }),
            Resolution::Hd1080 => Some(FrameSize { width: 1920, height: 1080 }),
            Resolution::Uhd2160 => Some(FrameSize { width: 3840, height: 2160 }),
        }
    }
}

/// How the source aspect ratio maps onto the target box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Exact width, height follows the aspect ratio
    Contain,
    /// Fit inside and letterbox to the exact size
    Pad,
    /// Cover and crop to the exact size
    Crop,
    /// Exact size, aspect ratio ignored
    Stretch,
}

impl FitMode {
    /// Parse fit mode from string
    pub fn parse(fit_str: &str) -> TimelapseResult<Self> {
        match fit_str.trim().to_lowercase().as_str() {
            "contain" => Ok(FitMode::Contain),
            "pad" => Ok(FitMode::Pad),
            "crop" => Ok(FitMode::Crop),
            "stretch" => Ok(FitMode::Stretch),
            _ => Err(TimelapseError::InvalidFitMode {
                value: fit_str.trim().to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FitMode::Contain => "contain",
            FitMode::Pad => "pad",
            FitMode::Crop => "crop",
            FitMode::Stretch => "stretch",
        }
    }
}

impl fmt::Display for FitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested output geometry. Absence (`None` at use sites) means the
/// source resolution is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetGeometry {
    pub size: FrameSize,
    pub fit: FitMode,
}

impl TargetGeometry {
    pub fn new(size: FrameSize, fit: FitMode) -> Self {
        Self { size, fit }
    }

    /// Resolve resolution keyword, explicit size and fit mode.
    ///
    /// An explicit size wins over the keyword. The fit mode is validated even
    /// when the result is "no geometry".
    pub fn resolve(
        resolution: &str,
        size: Option<&str>,
        fit: &str,
    ) -> TimelapseResult<Option<Self>> {
        let fit = FitMode::parse(fit)?;
        let size = match size.map(str::trim).filter(|s| !s.is_empty()) {
            Some(explicit) => Some(FrameSize::parse(explicit)?),
            None => Resolution::parse(resolution)?.size(),
        };
        Ok(size.map(|size| Self { size, fit }))
    }

    /// Filename tag, e.g. `1920x1080_pad`
    pub fn tag(&self) -> String {
        format!("{}_{}", self.size, self.fit)
    }
}

/// H.264 rate-control and compatibility parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecParams {
    pub target_bitrate: String,
    pub max_bitrate: String,
    pub buffer_size: String,
    pub profile: String,
    pub level: String,
}

impl Default for CodecParams {
    fn default() -> Self {
        Self {
            target_bitrate: "6000k".to_string(),
            max_bitrate: "24000k".to_string(),
            buffer_size: "48000k".to_string(),
            profile: "high".to_string(),
            level: "4.0".to_string(),
        }
    }
}

/// One stage of the video filter chain
#[derive(Debug, Clone, PartialEq)]
pub enum FilterStage {
    /// Presentation timestamps divided by the speed ratio
    Retime { speed_ratio: f64 },
    /// Constant output frame rate
    FrameRate { fps: u32 },
    /// Scale / pad / crop to the target geometry
    Geometry(TargetGeometry),
}

impl fmt::Display for FilterStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterStage::Retime { speed_ratio } => write!(f, "setpts=PTS/{}", speed_ratio),
            FilterStage::FrameRate { fps } => write!(f, "fps={}", fps),
            FilterStage::Geometry(geometry) => {
                let FrameSize { width: w, height: h } = geometry.size;
                match geometry.fit {
                    FitMode::Contain => write!(f, "scale={}:-2:flags=lanczos", w),
                    FitMode::Pad => write!(
                        f,
                        "scale={w}:{h}:force_original_aspect_ratio=decrease:flags=lanczos,\
                         pad={w}:{h}:(ow-iw)/2:(oh-ih)/2"
                    ),
                    FitMode::Crop => write!(
                        f,
                        "scale={w}:{h}:force_original_aspect_ratio=increase:flags=lanczos,\
                         crop={w}:{h}"
                    ),
                    FitMode::Stretch => write!(f, "scale={}:{}:flags=lanczos", w, h),
                }
            }
        }
    }
}

/// Immutable retiming plan for one input
#[derive(Debug, Clone, PartialEq)]
pub struct RetimePlan {
    speed_ratio: f64,
    output_fps: u32,
    stages: Vec<FilterStage>,
}

impl RetimePlan {
    pub(crate) fn new(speed_ratio: f64, output_fps: u32, stages: Vec<FilterStage>) -> Self {
        Self {
            speed_ratio,
            output_fps,
            stages,
        }
    }

    /// `source / target`; > 1 speeds up, < 1 slows down
    pub fn speed_ratio(&self) -> f64 {
        self.speed_ratio
    }

    pub fn output_fps(&self) -> u32 {
        self.output_fps
    }

    pub fn stages(&self) -> &[FilterStage] {
        &self.stages
    }

    pub fn geometry(&self) -> Option<&TargetGeometry> {
        self.stages.iter().find_map(|stage| match stage {
            FilterStage::Geometry(geometry) => Some(geometry),
            _ => None,
        })
    }

    /// Comma-joined filter expression for `-vf`
    pub fn filter_graph(&self) -> String {
        self.stages
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Predicted output frame size for a given source size.
    ///
    /// Contain mirrors the scaler's `-2` rule: height is the aspect-correct
    /// value rounded to the nearest even number (never below 2).
    pub fn resulting_size(&self, source: FrameSize) -> FrameSize {
        let Some(geometry) = self.geometry() else {
            return source;
        };
        match geometry.fit {
            FitMode::Pad | FitMode::Crop | FitMode::Stretch => geometry.size,
            FitMode::Contain => {
                let width = geometry.size.width;
                let exact = width as f64 * source.height as f64 / source.width as f64;
                let height = ((exact / 2.0).round() as u32 * 2).max(2);
                FrameSize { width, height }
            }
        }
    }
}

/// Probed source file
#[derive(Debug, Clone, PartialEq)]
pub struct SourceMedia {
    pub path: PathBuf,
    /// Container duration in seconds
    pub duration: f64,
    /// First video stream size, when the container reports one
    pub frame_size: Option<FrameSize>,
}

/// Fully resolved encode job for one input
#[derive(Debug, Clone)]
pub struct EncodeJob {
    pub input: PathBuf,
    pub plan: RetimePlan,
    pub codec: CodecParams,
    pub output: PathBuf,
    pub passlog: PathBuf,
}

/// Encoder pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodePass {
    /// Statistics gathering, output discarded
    First,
    /// Real output using the statistics
    Second,
}

impl EncodePass {
    pub fn number(&self) -> u8 {
        match self {
            EncodePass::First => 1,
            EncodePass::Second => 2,
        }
    }
}

/// Timing breakdown for one job
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeStats {
    pub source_duration: f64,
    pub speed_ratio: f64,
    pub probe: Duration,
    pub filter_plan: Duration,
    pub pass1: Duration,
    pub pass2: Duration,
    pub cleanup: Duration,
    pub total: Duration,
    pub skipped: bool,
}

impl EncodeStats {
    /// Stats for a job short-circuited by skip-existing
    pub fn skipped(source_duration: f64, speed_ratio: f64) -> Self {
        Self {
            source_duration,
            speed_ratio,
            probe: Duration::ZERO,
            filter_plan: Duration::ZERO,
            pass1: Duration::ZERO,
            pass2: Duration::ZERO,
            cleanup: Duration::ZERO,
            total: Duration::ZERO,
            skipped: true,
        }
    }

    /// Source seconds processed per wall-clock second, 0 when nothing ran
    pub fn realtime(&self) -> f64 {
        let total = self.total.as_secs_f64();
        if total > 0.0 {
            self.source_duration / total
        } else {
            0.0
        }
    }
}

/// Result of one orchestrated encode
#[derive(Debug, Clone)]
pub struct EncodeOutcome {
    pub output: PathBuf,
    pub log_file: Option<PathBuf>,
    pub stats: EncodeStats,
}

impl EncodeOutcome {
    pub fn is_skipped(&self) -> bool {
        self.stats.skipped
    }
}

/// Ordered, complete set of files to merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOrder {
    files: Vec<PathBuf>,
}

impl FileOrder {
    /// Accept the collector's order as-is
    pub fn from_collected(files: Vec<PathBuf>) -> Self {
        Self { files }
    }

    /// Build an order from zero-based picks into `candidates`.
    ///
    /// Returns `None` unless `picks` is a permutation of all candidate indices.
    pub fn from_picks(candidates: &[PathBuf], picks: &[usize]) -> Option<Self> {
        if picks.len() != candidates.len() {
            return None;
        }
        let mut seen = vec![false; candidates.len()];
        for &idx in picks {
            if idx >= candidates.len() || seen[idx] {
                return None;
            }
            seen[idx] = true;
        }
        Some(Self {
            files: picks.iter().map(|&idx| candidates[idx].clone()).collect(),
        })
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

}

/// Validated parameters shared by every encode job of a run
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeOptions {
    pub target: TargetDuration,
    pub geometry: Option<TargetGeometry>,
    pub fps: u32,
    pub codec: CodecParams,
    /// Output container extension without the dot
    pub extension: String,
    pub skip_existing: bool,
    pub log: LogTarget,
}

impl EncodeOptions {
    /// Same options with skip-existing forced off
    pub fn without_skip(&self) -> Self {
        Self {
            skip_existing: false,
            ..self.clone()
        }
    }
}

/// Which files the collector picks up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectOptions {
    pub folder: PathBuf,
    /// Glob matched against file names, e.g. `*.mp4`
    pub pattern: String,
    pub recurse: bool,
    /// Extension used to recognise this tool's own outputs
    pub extension: String,
}

/// Where per-job log files go
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogTarget {
    /// No log file, console only
    Off,
    /// `{output}.log.txt` next to the output
    #[default]
    Auto,
    /// A directory, or a file whose directory receives one log per job
    Path(PathBuf),
}

impl LogTarget {
    /// Parse `off` / `none`, `auto` or a path
    pub fn parse(spec: &str) -> Self {
        match spec.trim() {
            "" => LogTarget::Off,
            s if s.eq_ignore_ascii_case("off") || s.eq_ignore_ascii_case("none") => LogTarget::Off,
            s if s.eq_ignore_ascii_case("auto") => LogTarget::Auto,
            s => LogTarget::Path(PathBuf::from(s)),
        }
    }

    /// Log file for a job writing `output`.
    ///
    /// A path that is not an existing directory (and does not end in a
    /// separator) is treated as a file hint: its parent receives one log per
    /// output so batch jobs never share a file.
    pub fn log_path_for(&self, output: &Path) -> Option<PathBuf> {
        let per_output = || {
            let stem = output
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            format!("{}.log.txt", stem)
        };
        match self {
            LogTarget::Off => None,
            LogTarget::Auto => Some(output.with_extension("log.txt")),
            LogTarget::Path(path) => {
                let raw = path.to_string_lossy();
                if path.is_dir() || raw.ends_with('/') || raw.ends_with('\\') {
                    Some(path.join(per_output()))
                } else {
                    let parent = path.parent().unwrap_or_else(|| Path::new(""));
                    Some(parent.join(per_output()))
                }
            }
        }
    }
}

/// Display name for a path in listings
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
