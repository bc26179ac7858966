//! Deduplicating store of translation call sites.

use std::collections::{
    HashMap,
    HashSet,
};
use std::fmt;

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

use crate::config::ConsistencyLevel;
use crate::ir::{
    ExtractedKey,
    MetaField,
    Occurrence,
    TranslationMeta,
};
use crate::types::SourceLocation;

/// The same key was authored with different metadata at two call sites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyIssue {
    /// The key with mismatched metadata.
    pub key: String,
    /// Which part of the metadata differs.
    pub field: MetaField,
    /// Location of the first occurrence seen for the key.
    pub first: SourceLocation,
    /// Location of the occurrence that disagrees.
    pub conflicting: SourceLocation,
}

impl fmt::Display for ConsistencyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' has a different {} at {} than at {}",
            self.key, self.field, self.conflicting, self.first
        )
    }
}

/// Failures reported when a build step ends.
#[derive(Error, Debug)]
pub enum KeyStoreError {
    /// Consistency issues recorded in `error` mode.
    #[error("Inconsistent translation metadata:\n{}", format_issues(.0))]
    Inconsistent(Vec<ConsistencyIssue>),
}

/// Numbered list, one issue per line.
fn format_issues(issues: &[ConsistencyIssue]) -> String {
    issues
        .iter()
        .enumerate()
        .map(|(i, issue)| format!("  {}. {issue}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Occurrence counts before and after replacing a file's entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileKeysDelta {
    /// Count before the call; `None` for a new file.
    pub previous: Option<usize>,
    /// Count after the call.
    pub current: usize,
}

impl FileKeysDelta {
    /// True when the occurrence count differs.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.previous != Some(self.current)
    }
}

/// Per-file occurrence lists folded into one entry per key.
///
/// Files keep the position of their first registration, so folding order
/// (and therefore which occurrence's metadata wins) is stable across
/// re-extraction.
#[derive(Debug, Default)]
pub struct KeyStore {
    /// How metadata mismatches are reported.
    consistency: ConsistencyLevel,
    /// Live occurrences per file, in registration order.
    files: Vec<(String, Vec<Occurrence>)>,
    /// File → position in `files`.
    file_index: HashMap<String, usize>,
    /// Metadata of the first occurrence ever added per key.
    first_seen: HashMap<String, (TranslationMeta, SourceLocation)>,
    /// (key, field) pairs already reported.
    reported: HashSet<(String, MetaField)>,
    /// Every recorded issue.
    issues: Vec<ConsistencyIssue>,
}

impl KeyStore {
    /// Empty store with the default consistency level.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty store reporting mismatches at `consistency`.
    #[must_use]
    pub fn with_consistency(consistency: ConsistencyLevel) -> Self {
        Self { consistency, ..Self::default() }
    }

    /// Configured consistency level.
    #[must_use]
    pub const fn consistency(&self) -> ConsistencyLevel {
        self.consistency
    }

    /// Replaces every occurrence attributed to `file` with `occurrences`.
    pub fn add_file_keys(&mut self, file: &str, occurrences: Vec<Occurrence>) -> FileKeysDelta {
        self.reseed_first_seen(file);
        for occurrence in &occurrences {
            self.check_consistency(occurrence);
        }

        let current = occurrences.len();
        let previous = if let Some(&index) = self.file_index.get(file) {
            self.files
                .get_mut(index)
                .map(|(_, existing)| std::mem::replace(existing, occurrences).len())
        } else {
            self.file_index.insert(file.to_string(), self.files.len());
            self.files.push((file.to_string(), occurrences));
            None
        };

        let delta = FileKeysDelta { previous, current };
        if delta.changed() {
            tracing::debug!(file, previous = ?delta.previous, current, "Occurrence count changed");
        }
        delta
    }

    /// Forgets a file entirely, e.g. when it no longer imports the translation runtime.
    pub fn remove_file(&mut self, file: &str) -> bool {
        let Some(index) = self.file_index.remove(file) else {
            return false;
        };
        self.files.remove(index);
        for position in self.file_index.values_mut() {
            if *position > index {
                *position -= 1;
            }
        }
        self.reseed_first_seen(file);
        true
    }

    /// Moves first-seen metadata recorded at `file` to the earliest live
    /// occurrence in another file, or drops it when there is none.
    fn reseed_first_seen(&mut self, file: &str) {
        let stale: Vec<String> = self
            .first_seen
            .iter()
            .filter(|(_, (_, location))| location.file == file)
            .map(|(key, _)| key.clone())
            .collect();

        for key in stale {
            let replacement = self
                .files
                .iter()
                .filter(|(other, _)| other != file)
                .flat_map(|(_, occurrences)| occurrences)
                .find(|occurrence| occurrence.key == key)
                .map(|occurrence| (occurrence.meta.clone(), occurrence.location()));
            match replacement {
                Some(seed) => {
                    self.first_seen.insert(key, seed);
                }
                None => {
                    self.first_seen.remove(&key);
                }
            }
        }
    }

    /// Compares `occurrence` with the first-seen metadata for its key.
    fn check_consistency(&mut self, occurrence: &Occurrence) {
        if self.consistency == ConsistencyLevel::Off {
            return;
        }
        if !self.first_seen.contains_key(&occurrence.key) {
            self.first_seen
                .insert(occurrence.key.clone(), (occurrence.meta.clone(), occurrence.location()));
            return;
        }
        let Some((first_meta, first_location)) = self.first_seen.get(&occurrence.key) else {
            return;
        };

        for field in first_meta.diff(&occurrence.meta) {
            if !self.reported.insert((occurrence.key.clone(), field)) {
                continue;
            }
            let issue = ConsistencyIssue {
                key: occurrence.key.clone(),
                field,
                first: first_location.clone(),
                conflicting: occurrence.location(),
            };
            match self.consistency {
                ConsistencyLevel::Error => tracing::error!("{issue}"),
                _ => tracing::warn!("{issue}"),
            }
            self.issues.push(issue);
        }
    }

    /// Combines a store populated elsewhere (e.g. by another worker).
    ///
    /// Files known to both take `other`'s occurrences.
    pub fn merge(&mut self, other: Self) {
        for (file, occurrences) in other.files {
            self.add_file_keys(&file, occurrences);
        }
    }

    /// One entry per distinct key across all live occurrences.
    #[must_use]
    pub fn extracted_keys(&self) -> Vec<ExtractedKey> {
        let mut keys: Vec<ExtractedKey> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        for occurrence in self.files.iter().flat_map(|(_, occurrences)| occurrences) {
            match index.get(occurrence.key.as_str()).and_then(|&i| keys.get_mut(i)) {
                Some(entry) => entry.absorb(occurrence),
                None => {
                    index.insert(&occurrence.key, keys.len());
                    keys.push(ExtractedKey::from_occurrence(occurrence));
                }
            }
        }
        keys
    }

    /// File → distinct keys in first-use order.
    #[must_use]
    pub fn file_keys(&self) -> HashMap<String, Vec<String>> {
        self.files
            .iter()
            .map(|(file, occurrences)| {
                let mut keys: Vec<String> = Vec::new();
                for occurrence in occurrences {
                    if !keys.contains(&occurrence.key) {
                        keys.push(occurrence.key.clone());
                    }
                }
                (file.clone(), keys)
            })
            .collect()
    }

    /// Files that performed extraction, including ones with zero keys.
    pub fn translating_files(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|(file, _)| file.as_str())
    }

    /// True when `file` is registered as translating.
    #[must_use]
    pub fn contains_file(&self, file: &str) -> bool {
        self.file_index.contains_key(file)
    }

    /// Issues recorded so far.
    #[must_use]
    pub fn issues(&self) -> &[ConsistencyIssue] {
        &self.issues
    }

    /// Ends a build step.
    ///
    /// # Errors
    /// In `error` mode, returns every recorded consistency issue.
    pub fn finish(&self) -> Result<(), KeyStoreError> {
        if self.consistency == ConsistencyLevel::Error && !self.issues.is_empty() {
            return Err(KeyStoreError::Inconsistent(self.issues.clone()));
        }
        Ok(())
    }
}
