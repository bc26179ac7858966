//! Parallel extraction over a workspace, folded into a `KeyStore`.

use std::collections::HashSet;
use std::path::{
    Path,
    PathBuf,
};
use std::sync::Arc;

use futures::stream::{
    self,
    StreamExt,
};
use ignore::WalkBuilder;

use crate::config::{
    ConfigManager,
    FileMatcher,
    I18nSettings,
};
use crate::indexer::key_store::KeyStore;
use crate::indexer::types::{
    IndexReport,
    IndexerError,
};
use crate::input::source::SourceFile;
use crate::syntax::{
    ExtractOptions,
    FileExtraction,
    extract_source,
};

/// Finds source files and extracts them concurrently.
///
/// Extraction shares no state between files; only the final fold into the
/// `KeyStore` is sequential, and it happens on the calling task.
#[derive(Clone, Debug)]
pub struct WorkspaceIndexer {
    /// Include and exclude globs.
    matcher: FileMatcher,
    /// Extraction options shared with blocking tasks.
    options: Arc<ExtractOptions>,
    /// Files extracted concurrently.
    num_threads: usize,
}

impl WorkspaceIndexer {
    /// # Errors
    /// Returns `IndexerError::Matcher` when a glob pattern is invalid.
    pub fn new(workspace_root: PathBuf, settings: &I18nSettings) -> Result<Self, IndexerError> {
        Ok(Self {
            matcher: FileMatcher::new(workspace_root, settings)?,
            options: Arc::new(ExtractOptions::from(settings)),
            num_threads: settings.indexing.effective_threads(),
        })
    }

    /// Builds an indexer from loaded settings; the workspace root defaults to `.`.
    ///
    /// # Errors
    /// Returns `IndexerError::Matcher` when a glob pattern is invalid.
    pub fn from_config(config_manager: &ConfigManager) -> Result<Self, IndexerError> {
        let root = config_manager.workspace_root().cloned().unwrap_or_else(|| PathBuf::from("."));
        Self::new(root, config_manager.get_settings())
    }

    /// Root of the indexed workspace.
    #[must_use]
    pub fn workspace_root(&self) -> &Path {
        self.matcher.workspace_root()
    }

    /// Walks the workspace (honouring `.gitignore`) and returns matching source files.
    ///
    /// # Errors
    /// Returns `IndexerError::Io` when the workspace root cannot be read.
    pub fn find_source_files(&self) -> Result<Vec<PathBuf>, IndexerError> {
        let root = self.workspace_root();
        std::fs::metadata(root)
            .map_err(|source| IndexerError::Io { path: root.to_path_buf(), source })?;

        let mut found_files = Vec::new();
        for result in WalkBuilder::new(root)
            .hidden(false)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .follow_links(false)
            .build()
        {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!(?err, "Failed to read directory entry");
                    continue;
                }
            };

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let path = entry.path();
            if self.matcher.is_source_file(path) {
                found_files.push(path.to_path_buf());
            }
        }

        found_files.sort();
        tracing::debug!(count = found_files.len(), "Found source files");
        Ok(found_files)
    }

    /// File identifier used in locations and module ids: workspace-relative, `/`-separated.
    #[must_use]
    pub fn file_id(&self, path: &Path) -> String {
        let relative = path.strip_prefix(self.workspace_root()).unwrap_or(path);
        relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Extracts the given files concurrently, returning results in input order.
    ///
    /// Unreadable files and files with an unsupported extension are skipped.
    ///
    /// # Errors
    /// Returns the first analyzer or worker failure.
    pub async fn extract_files(
        &self,
        paths: Vec<PathBuf>,
    ) -> Result<Vec<FileExtraction>, IndexerError> {
        let results: Vec<Result<Option<FileExtraction>, IndexerError>> = stream::iter(paths)
            .map(|path| self.extract_file(path))
            .buffered(self.num_threads)
            .collect()
            .await;

        results.into_iter().filter_map(Result::transpose).collect()
    }

    /// Reads and extracts one file on the blocking pool.
    async fn extract_file(&self, path: PathBuf) -> Result<Option<FileExtraction>, IndexerError> {
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(file = %path.display(), "Failed to read file: {e}");
                return Ok(None);
            }
        };

        let Some(source) = SourceFile::new(self.file_id(&path), text) else {
            tracing::debug!(file = %path.display(), "Skipping file with unsupported extension");
            return Ok(None);
        };

        let options = Arc::clone(&self.options);
        let extraction =
            tokio::task::spawn_blocking(move || extract_source(&source, &options)).await??;
        Ok(Some(extraction))
    }

    /// Folds extraction results into `store` one file at a time.
    ///
    /// Files that no longer use translations are removed from the store.
    pub fn fold(store: &mut KeyStore, extractions: Vec<FileExtraction>) -> IndexReport {
        let mut report = IndexReport { files_indexed: extractions.len(), ..IndexReport::default() };
        for extraction in extractions {
            if extraction.uses_translations {
                store.add_file_keys(&extraction.file, extraction.occurrences);
            } else {
                store.remove_file(&extraction.file);
            }
            report.diagnostics.extend(extraction.diagnostics);
        }
        report.translating_files = store.translating_files().count();
        report
    }

    /// Re-extracts specific files (e.g. after a change notification).
    ///
    /// Requested files that can no longer be read (deleted or renamed) are
    /// removed from `store`.
    ///
    /// # Errors
    /// Returns the first analyzer or worker failure.
    pub async fn index_files(
        &self,
        paths: Vec<PathBuf>,
        store: &mut KeyStore,
    ) -> Result<IndexReport, IndexerError> {
        let paths: Vec<PathBuf> =
            paths.into_iter().filter(|path| self.matcher.is_source_file(path)).collect();
        let requested: Vec<String> = paths.iter().map(|path| self.file_id(path)).collect();
        let extractions = self.extract_files(paths).await?;

        let extracted: HashSet<&str> = extractions.iter().map(|e| e.file.as_str()).collect();
        let unreadable: Vec<&String> =
            requested.iter().filter(|file| !extracted.contains(file.as_str())).collect();
        let mut removed = 0;
        for file in unreadable {
            if store.remove_file(file) {
                tracing::debug!(file = %file, "Removed unreadable file from key store");
                removed += 1;
            }
        }

        let mut report = Self::fold(store, extractions);
        report.files_removed = removed;
        report.translating_files = store.translating_files().count();
        Ok(report)
    }

    /// Extracts every source file in the workspace into `store`.
    ///
    /// # Errors
    /// Returns an error when the workspace cannot be walked or a file fails to parse.
    pub async fn index_workspace(&self, store: &mut KeyStore) -> Result<IndexReport, IndexerError> {
        tracing::debug!(workspace_path = %self.workspace_root().display(), "Indexing workspace");
        let files = self.find_source_files()?;
        let extractions = self.extract_files(files).await?;
        let report = Self::fold(store, extractions);
        tracing::debug!(
            files = report.files_indexed,
            translating = report.translating_files,
            keys = store.extracted_keys().len(),
            "Workspace indexed"
        );
        Ok(report)
    }
}
