//! Indexer type definitions.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::config::MatcherError;
use crate::syntax::{
    AnalyzerError,
    ExtractionDiagnostic,
};

/// Workspace indexing failures.
#[derive(Error, Debug)]
pub enum IndexerError {
    /// Error when the workspace itself cannot be read
    #[error("Failed to read '{}': {source}", path.display())]
    Io {
        /// Path that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Extraction failed for a file.
    #[error(transparent)]
    Analyzer(#[from] AnalyzerError),
    /// Include or exclude globs are invalid.
    #[error(transparent)]
    Matcher(#[from] MatcherError),
    /// Extraction worker panicked or was cancelled
    #[error("Extraction task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Outcome of one indexing pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexReport {
    /// Files that were read and parsed.
    pub files_indexed: usize,
    /// Files registered in the key store as translating.
    pub translating_files: usize,
    /// Requested files that could not be read and were dropped from the key store.
    pub files_removed: usize,
    /// Non-literal arguments found while extracting.
    pub diagnostics: Vec<ExtractionDiagnostic>,
}
