// Collect interactor - Finds the input files of a folder run

use std::path::PathBuf;

use glob::{MatchOptions, Pattern};
use tracing::debug;
use walkdir::WalkDir;

use crate::domain::model::*;
use crate::domain::rules::*;
use crate::error::{TimelapseError, TimelapseResult};

/// Interactor for file collection and default ordering
#[derive(Debug, Default, Clone)]
pub struct CollectInteractor;

impl CollectInteractor {
    /// Create new collect interactor
    pub fn new() -> Self {
        Self
    }

    /// Regular files under `options.folder` whose name matches the pattern,
    /// minus this tool's own artifacts, in smart-sort order.
    ///
    /// An empty result is not an error here; callers decide.
    pub fn execute(&self, options: &CollectOptions) -> TimelapseResult<Vec<PathBuf>> {
        if !options.folder.is_dir() {
            return Err(TimelapseError::MissingInput {
                path: options.folder.clone(),
            });
        }

        let pattern = Pattern::new(&options.pattern).map_err(|e| TimelapseError::InvalidConfig {
            message: format!("invalid pattern '{}': {}", options.pattern, e),
        })?;
        let match_options = MatchOptions {
            case_sensitive: !cfg!(windows),
            ..MatchOptions::new()
        };
        let max_depth = if options.recurse { usize::MAX } else { 1 };

        let files: Vec<PathBuf> = WalkDir::new(&options.folder)
            .min_depth(1)
            .max_depth(max_depth)
            .follow_links(true)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                let name = entry.file_name().to_string_lossy();
                pattern.matches_with(&name, match_options)
                    && !OutputNaming::is_generated_artifact(&name, &options.extension)
            })
            .map(|entry| entry.into_path())
            .collect();

        debug!(count = files.len(), "Collected input files");
        Ok(SmartSort::sort(files))
    }
}
