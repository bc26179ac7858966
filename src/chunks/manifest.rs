//! Serialized record of extracted keys and chunk mappings.

use std::collections::{
    BTreeMap,
    BTreeSet,
    HashMap,
};

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

use crate::ir::ExtractedKey;

/// Manifest lookup and serialization failures.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// The chunk is not in the manifest.
    #[error("Unknown chunk '{0}'")]
    UnknownChunk(String),
    /// JSON encoding or decoding failed.
    #[error("Failed to (de)serialize manifest: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Produced once per build; read live in development or from a frozen
/// snapshot in production.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Manifest {
    /// One entry per distinct extracted key.
    pub keys: Vec<ExtractedKey>,
    /// Chunk → keys used by modules placed in it.
    pub chunks: BTreeMap<String, BTreeSet<String>>,
    /// Chunk → translating chunks it imports, directly or transitively.
    pub imports: BTreeMap<String, BTreeSet<String>>,
}

impl Manifest {
    /// # Errors
    /// Returns `ManifestError::Serialize` if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, ManifestError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// # Errors
    /// Returns `ManifestError::Serialize` when `json` is not a manifest.
    pub fn from_json(json: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(json)?)
    }

    /// True for carrier chunks.
    #[must_use]
    pub fn contains_chunk(&self, chunk: &str) -> bool {
        self.chunks.contains_key(chunk)
    }

    /// # Errors
    /// Returns `ManifestError::UnknownChunk` when no such chunk carries translations.
    pub fn chunk_keys(&self, chunk: &str) -> Result<&BTreeSet<String>, ManifestError> {
        self.chunks.get(chunk).ok_or_else(|| ManifestError::UnknownChunk(chunk.to_string()))
    }

    /// Translating chunks `chunk` depends on; empty for unknown chunks.
    pub fn chunk_imports(&self, chunk: &str) -> impl Iterator<Item = &str> {
        self.imports.get(chunk).into_iter().flatten().map(String::as_str)
    }

    /// Extracted fallback text of `key`.
    #[must_use]
    pub fn fallback_for(&self, key: &str) -> Option<&str> {
        self.keys.iter().find(|entry| entry.key == key).map(|entry| entry.meta.fallback.as_str())
    }

    /// Key → extracted fallback text for every key.
    #[must_use]
    pub fn fallbacks(&self) -> HashMap<&str, &str> {
        self.keys.iter().map(|entry| (entry.key.as_str(), entry.meta.fallback.as_str())).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;

    use super::*;
    use crate::ir::{
        Occurrence,
        TranslationMeta,
    };

    #[fixture]
    fn manifest() -> Manifest {
        let occurrence = Occurrence::new("greet", TranslationMeta::new("Hi {$name}"), "a.ts", 3);
        Manifest {
            keys: vec![ExtractedKey::from_occurrence(&occurrence)],
            chunks: BTreeMap::from([("main".to_string(), BTreeSet::from(["greet".to_string()]))]),
            imports: BTreeMap::from([("main".to_string(), BTreeSet::new())]),
        }
    }

    #[rstest]
    fn json_uses_camel_case_record(manifest: Manifest) {
        let json = manifest.to_json_pretty().unwrap();

        assert_that!(json, contains_substring(r#""keys""#));
        assert_that!(json, contains_substring(r#""fallback": "Hi {$name}""#));
        assert_that!(json, contains_substring(r#""files": ["#));
        assert_eq!(Manifest::from_json(&json).unwrap(), manifest);
    }

    #[rstest]
    fn lookups(manifest: Manifest) {
        assert_that!(manifest.fallback_for("greet"), some(eq("Hi {$name}")));
        assert_that!(manifest.fallback_for("missing"), none());
        assert_that!(manifest.chunk_keys("main").unwrap(), elements_are![eq("greet")]);
        assert_that!(
            manifest.chunk_keys("nope"),
            err(displays_as(eq("Unknown chunk 'nope'")))
        );
        assert_that!(manifest.chunk_imports("nope").count(), eq(0));
    }

    #[rstest]
    fn from_json_rejects_garbage() {
        assert_that!(Manifest::from_json("{ nope"), err(anything()));
    }
}
