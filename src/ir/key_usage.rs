//! Call-site occurrences and their deduplicated projection.

use serde::{
    Deserialize,
    Serialize,
};

use super::meta::TranslationMeta;
use crate::types::SourceLocation;

/// One translation call site found by a single extraction pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    /// Translation key (first call argument).
    pub key: String,
    /// Metadata from the second call argument.
    pub meta: TranslationMeta,
    /// Workspace-relative file id.
    pub file: String,
    /// 1-based line of the call.
    pub line: u32,
}

impl Occurrence {
    /// Occurrence of `key` at `file:line`.
    #[must_use]
    pub fn new(key: impl Into<String>, meta: TranslationMeta, file: impl Into<String>, line: u32) -> Self {
        Self { key: key.into(), meta, file: file.into(), line }
    }

    /// `file:line` of the call.
    #[must_use]
    pub fn location(&self) -> SourceLocation {
        SourceLocation::new(self.file.clone(), self.line)
    }
}

/// All live occurrences of one key folded together.
///
/// `meta` is the metadata of the most recently folded occurrence; `files`
/// keeps every distinct `file:line` in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedKey {
    /// The key.
    pub key: String,
    /// Metadata of the last occurrence folded in.
    pub meta: TranslationMeta,
    /// `file:line` of every live occurrence, without duplicates.
    pub files: Vec<String>,
}

impl ExtractedKey {
    /// Entry for a single occurrence.
    #[must_use]
    pub fn from_occurrence(occurrence: &Occurrence) -> Self {
        Self {
            key: occurrence.key.clone(),
            meta: occurrence.meta.clone(),
            files: vec![occurrence.location().to_string()],
        }
    }

    /// Folds another occurrence of the same key into this entry.
    pub fn absorb(&mut self, occurrence: &Occurrence) {
        self.meta = occurrence.meta.clone();
        let location = occurrence.location().to_string();
        if !self.files.contains(&location) {
            self.files.push(location);
        }
    }
}
