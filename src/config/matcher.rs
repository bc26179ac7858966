//! Source file pattern matcher.

use std::path::{
    Path,
    PathBuf,
};

use globset::{
    Glob,
    GlobSet,
    GlobSetBuilder,
};

use super::I18nSettings;

/// Glob compilation failures.
#[derive(Debug, thiserror::Error)]
pub enum MatcherError {
    /// An `includePatterns` entry is not a valid glob.
    #[error("Invalid source include pattern '{pattern}': {source}")]
    InvalidSourceIncludePattern {
        /// The offending pattern.
        pattern: String,
        /// Underlying glob error.
        #[source]
        source: globset::Error,
    },

    /// An `excludePatterns` entry is not a valid glob.
    #[error("Invalid exclude pattern '{pattern}': {source}")]
    InvalidExcludePattern {
        /// The offending pattern.
        pattern: String,
        /// Underlying glob error.
        #[source]
        source: globset::Error,
    },

    /// The compiled set could not be built.
    #[error("Failed to build glob set: {0}")]
    GlobSetBuild(#[from] globset::Error),
}

/// Decides which candidate paths handed in by the host build tool are extracted.
#[derive(Debug, Clone)]
pub struct FileMatcher {
    /// Root that absolute paths are made relative to.
    workspace_root: PathBuf,
    /// Compiled `includePatterns`.
    source_include_set: GlobSet,
    /// Compiled `excludePatterns`.
    exclude_set: GlobSet,
}

impl FileMatcher {
    /// Creates a new matcher from settings.
    pub fn new(workspace_root: PathBuf, settings: &I18nSettings) -> Result<Self, MatcherError> {
        let source_include_set =
            Self::build_glob_set(&settings.include_patterns, |pattern, source| {
                MatcherError::InvalidSourceIncludePattern { pattern, source }
            })?;

        let exclude_set = Self::build_glob_set(&settings.exclude_patterns, |pattern, source| {
            MatcherError::InvalidExcludePattern { pattern, source }
        })?;

        Ok(Self { workspace_root, source_include_set, exclude_set })
    }

    /// Compiles `patterns` into one set, mapping bad globs through `make_error`.
    fn build_glob_set<F>(patterns: &[String], make_error: F) -> Result<GlobSet, MatcherError>
    where
        F: Fn(String, globset::Error) -> MatcherError,
    {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern).map_err(|e| make_error(pattern.clone(), e))?;
            builder.add(glob);
        }
        Ok(builder.build()?)
    }

    /// Root that absolute paths are made relative to.
    #[must_use]
    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Returns true if the path matches `includePatterns` but not `excludePatterns`.
    ///
    /// Absolute paths must lie under the workspace root; relative paths are
    /// taken as relative to it.
    #[must_use]
    pub fn is_source_file(&self, path: &Path) -> bool {
        let relative_path = if path.is_absolute() {
            match path.strip_prefix(&self.workspace_root) {
                Ok(relative) => relative,
                Err(_) => return false,
            }
        } else {
            path
        };

        self.source_include_set.is_match(relative_path) && !self.exclude_set.is_match(relative_path)
    }
}
