//! Configuration initialization and hierarchy management
//!
//! Precedence, lowest to highest: built-in defaults, TOML file, `TIMELAPSE_*`
//! environment variables, command-line flags. Every layer is a
//! [`SettingsOverlay`] applied field by field on top of [`Settings`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::adapters::TomlConfigAdapter;
use crate::domain::model::*;
use crate::error::{TimelapseError, TimelapseResult};

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "timelapse.toml";

/// Prefix of environment overrides, e.g. `TIMELAPSE_FPS=30`
pub const ENV_PREFIX: &str = "TIMELAPSE_";

/// Fully layered, not yet validated settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub target: String,
    pub fps: u32,
    pub bitrate: String,
    pub max_bitrate: String,
    pub buffer_size: String,
    pub profile: String,
    pub level: String,
    pub resolution: String,
    pub size: Option<String>,
    pub fit: String,
    pub pattern: String,
    pub recurse: bool,
    pub skip_existing: bool,
    pub log: String,
    pub quiet: bool,
    pub extension: String,
    pub ffmpeg: String,
    pub ffprobe: String,
}

impl Default for Settings {
    fn default() -> Self {
        let codec = CodecParams::default();
        Self {
            target: "30".to_string(),
            fps: 60,
            bitrate: codec.target_bitrate,
            max_bitrate: codec.max_bitrate,
            buffer_size: codec.buffer_size,
            profile: codec.profile,
            level: codec.level,
            resolution: "source".to_string(),
            size: None,
            fit: "contain".to_string(),
            pattern: "*.mp4".to_string(),
            recurse: false,
            skip_existing: false,
            log: "AUTO".to_string(),
            quiet: false,
            extension: "mp4".to_string(),
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
        }
    }
}

/// One configuration layer; `None` leaves the lower layer's value in place
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsOverlay {
    pub target: Option<String>,
    pub fps: Option<u32>,
    pub bitrate: Option<String>,
    pub max_bitrate: Option<String>,
    pub buffer_size: Option<String>,
    pub profile: Option<String>,
    pub level: Option<String>,
    pub resolution: Option<String>,
    pub size: Option<String>,
    pub fit: Option<String>,
    pub pattern: Option<String>,
    pub recurse: Option<bool>,
    pub skip_existing: Option<bool>,
    pub log: Option<String>,
    pub quiet: Option<bool>,
    pub extension: Option<String>,
    pub ffmpeg: Option<String>,
    pub ffprobe: Option<String>,
}

macro_rules! overlay_fields {
    ($settings:expr, $overlay:expr, [$($field:ident),* $(,)?]) => {
        $(
            if let Some(value) = $overlay.$field {
                $settings.$field = value;
            }
        )*
    };
}

impl Settings {
    /// Apply one layer on top of these settings
    pub fn apply(&mut self, overlay: SettingsOverlay) {
        if let Some(size) = overlay.size {
            self.size = Some(size).filter(|s| !s.trim().is_empty());
        }
        overlay_fields!(
            self,
            overlay,
            [
                target,
                fps,
                bitrate,
                max_bitrate,
                buffer_size,
                profile,
                level,
                resolution,
                fit,
                pattern,
                recurse,
                skip_existing,
                log,
                quiet,
                extension,
                ffmpeg,
                ffprobe,
            ]
        );
    }

    /// Validate and convert into typed encode options.
    ///
    /// Runs before any external tool is spawned.
    pub fn encode_options(&self) -> TimelapseResult<EncodeOptions> {
        let target = TargetDuration::parse(&self.target)?;
        let geometry = TargetGeometry::resolve(&self.resolution, self.size.as_deref(), &self.fit)?;
        if self.fps == 0 {
            return Err(TimelapseError::InvalidConfig {
                message: "fps must be > 0".to_string(),
            });
        }
        Ok(EncodeOptions {
            target,
            geometry,
            fps: self.fps,
            codec: CodecParams {
                target_bitrate: self.bitrate.clone(),
                max_bitrate: self.max_bitrate.clone(),
                buffer_size: self.buffer_size.clone(),
                profile: self.profile.clone(),
                level: self.level.clone(),
            },
            extension: self.container_extension(),
            skip_existing: self.skip_existing,
            log: LogTarget::parse(&self.log),
        })
    }

    /// Collector options for `folder`
    pub fn collect_options(&self, folder: &Path) -> CollectOptions {
        CollectOptions {
            folder: folder.to_path_buf(),
            pattern: self.pattern.clone(),
            recurse: self.recurse,
            extension: self.container_extension(),
        }
    }

    fn container_extension(&self) -> String {
        self.extension.trim().trim_start_matches('.').to_string()
    }
}

impl SettingsOverlay {
    /// Overlay from `TIMELAPSE_*` variables of the current process
    pub fn from_env() -> TimelapseResult<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Overlay from arbitrary `(name, value)` pairs; unrelated names are ignored
    pub fn from_vars<I>(vars: I) -> TimelapseResult<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut overlay = Self::default();
        for (name, value) in vars {
            let Some(key) = name.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let key = key.to_ascii_lowercase();
            match key.as_str() {
                "target" => overlay.target = Some(value),
                "fps" => overlay.fps = Some(parse_env(&name, &value)?),
                "bitrate" => overlay.bitrate = Some(value),
                "max_bitrate" => overlay.max_bitrate = Some(value),
                "buffer_size" => overlay.buffer_size = Some(value),
                "profile" => overlay.profile = Some(value),
                "level" => overlay.level = Some(value),
                "resolution" | "res" => overlay.resolution = Some(value),
                "size" => overlay.size = Some(value),
                "fit" => overlay.fit = Some(value),
                "pattern" => overlay.pattern = Some(value),
                "recurse" => overlay.recurse = Some(parse_env_bool(&name, &value)?),
                "skip_existing" => overlay.skip_existing = Some(parse_env_bool(&name, &value)?),
                "log" => overlay.log = Some(value),
                "quiet" => overlay.quiet = Some(parse_env_bool(&name, &value)?),
                "extension" | "ext" => overlay.extension = Some(value),
                "ffmpeg" => overlay.ffmpeg = Some(value),
                "ffprobe" => overlay.ffprobe = Some(value),
                "log_level" | "config" => {}
                _ => debug!("Ignoring unknown environment override {}", name),
            }
        }
        Ok(overlay)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> TimelapseResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| TimelapseError::InvalidConfig {
            message: format!("{} has an invalid value '{}'", name, value),
        })
}

fn parse_env_bool(name: &str, value: &str) -> TimelapseResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(TimelapseError::InvalidConfig {
            message: format!("{} must be a boolean, got '{}'", name, value),
        }),
    }
}

/// Initialize configuration hierarchy following precedence: CLI > Env > File > Defaults
pub fn initialize_configuration_hierarchy(
    config_file: Option<&Path>,
    cli_overrides: SettingsOverlay,
) -> TimelapseResult<Settings> {
    let mut settings = Settings::default();

    if let Some(file_overlay) = load_config_file(config_file)? {
        settings.apply(file_overlay);
    }

    let env_overlay = SettingsOverlay::from_env()?;
    if env_overlay != SettingsOverlay::default() {
        info!("Applied environment overrides");
    }
    settings.apply(env_overlay);

    settings.apply(cli_overrides);
    debug!(?settings, "Configuration resolved");
    Ok(settings)
}

/// Load the explicit config file, or `timelapse.toml` from the working directory if present
fn load_config_file(explicit: Option<&Path>) -> TimelapseResult<Option<SettingsOverlay>> {
    let path: PathBuf = match explicit {
        Some(path) => {
            if !path.is_file() {
                return Err(TimelapseError::InvalidConfig {
                    message: format!("config file does not exist: {}", path.display()),
                });
            }
            path.to_path_buf()
        }
        None => {
            let candidate = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !candidate.is_file() {
                return Ok(None);
            }
            candidate
        }
    };

    info!("Loading configuration from: {}", path.display());
    TomlConfigAdapter::load(&path).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_produce_valid_options() {
        let options = Settings::default().encode_options().unwrap();
        assert_eq!(options.target.seconds(), 30.0);
        assert_eq!(options.fps, 60);
        assert_eq!(options.geometry, None);
        assert_eq!(options.codec, CodecParams::default());
        assert_eq!(options.extension, "mp4");
        assert_eq!(options.log, LogTarget::Auto);
        assert!(!options.skip_existing);
    }

    #[test]
    fn test_later_layer_wins_field_by_field() {
        let mut settings = Settings::default();
        settings.apply(SettingsOverlay {
            fps: Some(25),
            fit: Some("pad".to_string()),
            ..Default::default()
        });
        settings.apply(SettingsOverlay {
            fps: Some(30),
            ..Default::default()
        });
        assert_eq!(settings.fps, 30);
        assert_eq!(settings.fit, "pad");
        assert_eq!(settings.pattern, "*.mp4");
    }

    #[test]
    fn test_env_overlay() {
        let overlay = SettingsOverlay::from_vars(vars(&[
            ("TIMELAPSE_FPS", "25"),
            ("TIMELAPSE_RECURSE", "true"),
            ("TIMELAPSE_RES", "720p"),
            ("PATH", "/usr/bin"),
        ]))
        .unwrap();
        assert_eq!(overlay.fps, Some(25));
        assert_eq!(overlay.recurse, Some(true));
        assert_eq!(overlay.resolution.as_deref(), Some("720p"));
        assert_eq!(overlay.target, None);
    }

    #[test]
    fn test_env_overlay_rejects_bad_values() {
        let err = SettingsOverlay::from_vars(vars(&[("TIMELAPSE_FPS", "fast")])).unwrap_err();
        assert!(matches!(err, TimelapseError::InvalidConfig { .. }));
        let err = SettingsOverlay::from_vars(vars(&[("TIMELAPSE_QUIET", "maybe")])).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        let mut settings = Settings::default();
        settings.fit = "zoom".to_string();
        assert!(matches!(
            settings.encode_options(),
            Err(TimelapseError::InvalidFitMode { .. })
        ));

        let mut settings = Settings::default();
        settings.fps = 0;
        assert_eq!(settings.encode_options().unwrap_err().exit_code(), 2);
    }

    #[test]
    fn test_blank_size_clears_override() {
        let mut settings = Settings::default();
        settings.apply(SettingsOverlay {
            size: Some("800x600".to_string()),
            ..Default::default()
        });
        assert_eq!(settings.size.as_deref(), Some("800x600"));
        settings.apply(SettingsOverlay {
            size: Some(String::new()),
            ..Default::default()
        });
        assert_eq!(settings.size, None);
    }

    #[test]
    fn test_missing_explicit_config_is_invalid() {
        let err = load_config_file(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, TimelapseError::InvalidConfig { .. }));
    }

    #[test]
    fn test_collect_options_strip_dot() {
        let mut settings = Settings::default();
        settings.extension = ".mkv".to_string();
        let options = settings.collect_options(Path::new("/videos"));
        assert_eq!(options.extension, "mkv");
        assert_eq!(options.pattern, "*.mp4");
    }
}
