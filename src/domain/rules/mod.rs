// Business rules - Retime planning, output naming and file ordering

use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::domain::model::*;
use crate::error::{TimelapseError, TimelapseResult};

/// Prefix of the temporary concatenation result
pub const TEMP_MERGED_PREFIX: &str = "_temp_merged_";
/// Prefix of the concat manifest
pub const CONCAT_LIST_PREFIX: &str = "_concat_list_";

/// Builds the retiming filter chain
pub struct RetimePlanner;

impl RetimePlanner {
    /// Plan the filter chain for one input.
    ///
    /// Stages are emitted as retime, frame rate, then the optional geometry
    /// stage; the encoder applies them in that order.
    pub fn plan(
        source_duration: f64,
        target: TargetDuration,
        geometry: Option<TargetGeometry>,
        output_fps: u32,
    ) -> TimelapseResult<RetimePlan> {
        if !source_duration.is_finite() || source_duration <= 0.0 {
            return Err(TimelapseError::InvalidDuration {
                value: source_duration.to_string(),
                reason: "source duration must be > 0".to_string(),
            });
        }
        if output_fps == 0 {
            return Err(TimelapseError::InvalidConfig {
                message: "output fps must be > 0".to_string(),
            });
        }

        let speed_ratio = source_duration / target.seconds();
        let mut stages = vec![
            FilterStage::Retime { speed_ratio },
            FilterStage::FrameRate { fps: output_fps },
        ];
        if let Some(geometry) = geometry {
            stages.push(FilterStage::Geometry(geometry));
        }

        Ok(RetimePlan::new(speed_ratio, output_fps, stages))
    }
}

/// Deterministic output names
pub struct OutputNaming;

impl OutputNaming {
    /// `{stem}_timelapse_{tag}_{geometry}_PR.{ext}` next to the input
    pub fn timelapse_output(
        input: &Path,
        target: TargetDuration,
        geometry: Option<&TargetGeometry>,
        extension: &str,
    ) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let geometry_tag = geometry
            .map(TargetGeometry::tag)
            .unwrap_or_else(|| "src".to_string());
        input.with_file_name(format!(
            "{}_timelapse_{}_{}_PR.{}",
            stem,
            target.tag(),
            geometry_tag,
            extension
        ))
    }

    /// `{folder}_merged_timelapse_{tag}.{ext}` inside the folder
    pub fn merged_timelapse_output(folder: &Path, target: TargetDuration, extension: &str) -> PathBuf {
        folder.join(format!(
            "{}_merged_timelapse_{}.{}",
            folder_name(folder),
            target.tag(),
            extension
        ))
    }

    /// `{folder}_merged.{ext}` inside the folder
    pub fn merged_only_output(folder: &Path, extension: &str) -> PathBuf {
        folder.join(format!("{}_merged.{}", folder_name(folder), extension))
    }

    /// Pass-log base path derived from the output path
    pub fn passlog_base(output: &Path) -> PathBuf {
        let mut base = output.with_extension("").into_os_string();
        base.push("_passlog");
        PathBuf::from(base)
    }

    /// True for files this tool generated itself
    pub fn is_generated_artifact(file_name: &str, extension: &str) -> bool {
        let pr_suffix = format!("_PR.{}", extension);
        let merged_suffix = format!("_merged.{}", extension);

        file_name.starts_with(TEMP_MERGED_PREFIX)
            || file_name.starts_with(CONCAT_LIST_PREFIX)
            || (file_name.contains("_timelapse_") && file_name.ends_with(&pr_suffix))
            || file_name.ends_with(&merged_suffix)
            || file_name.contains("_merged_timelapse_")
    }
}

fn folder_name(folder: &Path) -> String {
    folder
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .or_else(|| {
            folder
                .canonicalize()
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        })
        .unwrap_or_else(|| "output".to_string())
}

/// Ordering that puts capture-device numbering before plain names
pub struct SmartSort;

fn underscore_number() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"_(\d+)$").expect("valid regex"))
}

fn letter_number() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[a-zA-Z](\d+)$").expect("valid regex"))
}

impl SmartSort {
    /// Trailing number of a file name: `part_10.mp4` and `part10.mp4` give 10.
    ///
    /// Only the stem is searched, so the extension (`mp4`) never counts. The
    /// underscore form is tried first; `a_1b2.mp4` resolves through the letter
    /// form to 2. Numbers past `u64::MAX` saturate.
    pub fn trailing_number(file_name: &str) -> Option<u64> {
        let stem = Path::new(file_name).file_stem()?.to_str()?;
        [underscore_number(), letter_number()]
            .into_iter()
            .find_map(|re| re.captures(stem))
            .and_then(|caps| caps.get(1))
            // All digits, so parsing fails only on overflow
            .map(|m| m.as_str().parse::<u64>().unwrap_or(u64::MAX))
    }

    /// Numbered files by (number, name), then the rest by name
    pub fn sort(mut files: Vec<PathBuf>) -> Vec<PathBuf> {
        files.sort_by(|a, b| Self::compare(a, b));
        files
    }

    fn compare(a: &Path, b: &Path) -> Ordering {
        let key = |p: &Path| {
            let name = display_name(p);
            let number = Self::trailing_number(&name);
            (number.is_none(), number.unwrap_or(0), name.to_lowercase())
        };
        key(a).cmp(&key(b))
    }
}

#[cfg(test)]
mod tests;
