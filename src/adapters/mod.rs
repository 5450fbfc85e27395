// Adapters - External system implementations

pub mod exec_ffmpeg;
pub mod probe_ffprobe;
pub mod process_tokio;
pub mod terminal_prompt;
pub mod toml_config;
pub mod tracing_log;

// Re-export adapters
pub use exec_ffmpeg::FFmpegAdapter;
pub use probe_ffprobe::FFprobeAdapter;
pub use process_tokio::TokioProcessAdapter;
pub use terminal_prompt::StdinPromptAdapter;
pub use toml_config::TomlConfigAdapter;
pub use tracing_log::{JobLog, TracingLogAdapter};
