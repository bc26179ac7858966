//! Per-locale translation layers.
//!
//! A `LocaleState` is immutable apart from its lazily filled layers. Replacing
//! translations publishes a whole new state, so readers holding the old one
//! never see a mix of old and new layers. Hashes cover the merged layer, the
//! same strings a chunk payload serves.

use std::collections::{
    BTreeMap,
    HashMap,
};
use std::sync::{
    Arc,
    OnceLock,
};

use parking_lot::Mutex;

use super::client::{
    ClientSettings,
    ClientState,
};
use crate::chunks::{
    Manifest,
    chunk_hash,
};
use crate::ir::RawTranslations;
use crate::message::{
    CompiledMessage,
    MessageCompiler,
};

/// Immutable translation layers of one locale.
#[derive(Debug)]
pub(super) struct LocaleState {
    /// Locale identifier.
    locale: String,
    /// Manifest the layers were built against.
    manifest: Arc<Manifest>,
    /// `None` until translations were set for the locale.
    raw: Option<Arc<RawTranslations>>,
    /// Raw translations plus the fallback of every manifest key they lack.
    merged: HashMap<String, String>,
    /// Chunk name to hash of the chunk's merged strings.
    hashes: BTreeMap<String, String>,
    /// Compiled merged entries, built on first lookup.
    compiled: OnceLock<HashMap<String, Arc<CompiledMessage>>>,
    /// Boot script, built on first request.
    boot_script: OnceLock<Arc<str>>,
    /// Encoded chunk payloads by chunk name.
    payloads: Mutex<HashMap<String, Arc<[u8]>>>,
}

impl LocaleState {
    /// Merged strings and hashes are computed here; every other layer on first use.
    pub(super) fn new(locale: &str, manifest: Arc<Manifest>, raw: Option<Arc<RawTranslations>>) -> Self {
        let mut merged = raw.as_deref().cloned().unwrap_or_default();
        for entry in &manifest.keys {
            merged.entry(entry.key.clone()).or_insert_with(|| entry.meta.fallback.clone());
        }
        let hashes = manifest
            .chunks
            .iter()
            .map(|(chunk, keys)| (chunk.clone(), chunk_hash(&merged, keys)))
            .collect();
        tracing::debug!(locale, entries = merged.len(), chunks = manifest.chunks.len(), "Merged translations");

        Self {
            locale: locale.to_string(),
            manifest,
            raw,
            merged,
            hashes,
            compiled: OnceLock::new(),
            boot_script: OnceLock::new(),
            payloads: Mutex::new(HashMap::new()),
        }
    }

    /// Same translations against another manifest.
    pub(super) fn rebuild(&self, manifest: Arc<Manifest>) -> Self {
        Self::new(&self.locale, manifest, self.raw.clone())
    }

    /// True once translations were set.
    pub(super) const fn has_translations(&self) -> bool {
        self.raw.is_some()
    }

    /// Manifest the layers were built against.
    pub(super) fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Chunk name → hash.
    pub(super) const fn hashes(&self) -> &BTreeMap<String, String> {
        &self.hashes
    }

    /// Raw translations plus the extracted fallback of every manifest key they lack.
    pub(super) const fn merged(&self) -> &HashMap<String, String> {
        &self.merged
    }

    /// Compiled merged entries; empty while no translations were set.
    pub(super) fn compiled(&self, compiler: &MessageCompiler) -> &HashMap<String, Arc<CompiledMessage>> {
        self.compiled.get_or_init(|| {
            if !self.has_translations() {
                return HashMap::new();
            }
            let compiled: HashMap<_, _> = self
                .merged()
                .iter()
                .map(|(key, template)| (key.clone(), compiler.compile(&self.locale, template)))
                .collect();
            tracing::debug!(locale = %self.locale, entries = compiled.len(), "Compiled translations");
            compiled
        })
    }

    /// Ambient state for the boot script; translations arrive with payloads.
    pub(super) fn client_state(&self) -> ClientState {
        ClientState {
            locale: self.locale.clone(),
            hashes: self.hashes.clone(),
            translations: BTreeMap::new(),
            imports: self.manifest.imports.clone(),
        }
    }

    /// Cached boot script.
    pub(super) fn boot_script(&self, settings: &ClientSettings) -> Arc<str> {
        Arc::clone(self.boot_script.get_or_init(|| settings.boot_script(&self.client_state()).into()))
    }

    /// Encoded payload for a chunk in the manifest; `None` for unknown chunks.
    pub(super) fn payload(&self, chunk: &str, settings: &ClientSettings) -> Option<Arc<[u8]>> {
        let keys = self.manifest.chunk_keys(chunk).ok()?;
        let mut payloads = self.payloads.lock();
        if let Some(bytes) = payloads.get(chunk) {
            return Some(Arc::clone(bytes));
        }

        let merged = self.merged();
        let translations: BTreeMap<&str, &str> = keys
            .iter()
            .filter_map(|key| merged.get(key).map(|value| (key.as_str(), value.as_str())))
            .collect();
        let bytes: Arc<[u8]> = settings.payload_script(&translations).into_bytes().into();
        tracing::debug!(locale = %self.locale, chunk, bytes = bytes.len(), "Encoded chunk payload");
        payloads.insert(chunk.to_string(), Arc::clone(&bytes));
        Some(bytes)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;

    use super::*;
    use crate::test_utils::sample_manifest;

    #[rstest]
    fn merged_fills_missing_keys_with_fallbacks() {
        let raw = RawTranslations::from([("greet".to_string(), "Hallo {$name}".to_string())]);
        let state = LocaleState::new("de", Arc::new(sample_manifest()), Some(Arc::new(raw)));

        let merged = state.merged();

        assert_that!(merged.get("greet"), some(eq(&"Hallo {$name}".to_string())));
        assert_that!(merged.get("cart.total"), some(eq(&"Total: {$amount}".to_string())));
    }

    #[rstest]
    fn compiled_is_empty_without_translations() {
        let state = LocaleState::new("de", Arc::new(sample_manifest()), None);

        assert_that!(state.has_translations(), eq(false));
        assert_that!(state.compiled(&MessageCompiler::new()).len(), eq(0));
        assert_that!(state.merged().len(), eq(2));
    }

    #[rstest]
    fn payload_is_cached_and_limited_to_chunk_keys() {
        let raw = RawTranslations::from([("greet".to_string(), "Hallo".to_string())]);
        let state = LocaleState::new("de", Arc::new(sample_manifest()), Some(Arc::new(raw)));
        let settings = ClientSettings::default();

        let first = state.payload("main", &settings).unwrap();
        let second = state.payload("main", &settings).unwrap();
        let body = String::from_utf8(first.to_vec()).unwrap();

        assert_that!(Arc::ptr_eq(&first, &second), eq(true));
        assert_that!(body, contains_substring(r#"{"greet":"Hallo"}"#));
        assert_that!(state.payload("unknown", &settings), none());
    }

    #[rstest]
    fn hashes_cover_every_manifest_chunk() {
        let state = LocaleState::new("de", Arc::new(sample_manifest()), None);

        let chunks: Vec<String> = state.hashes().keys().cloned().collect();
        assert_that!(chunks, elements_are![eq("cart"), eq("main")]);
        assert_that!(state.hashes()["cart"], not(eq(&state.hashes()["main"])));
    }

    #[rstest]
    fn hash_follows_a_changed_fallback() {
        let before = LocaleState::new("de", Arc::new(sample_manifest()), None);
        let mut manifest = sample_manifest();
        for entry in &mut manifest.keys {
            if entry.key == "greet" {
                entry.meta.fallback = "Welcome {$name}".to_string();
            }
        }
        let after = before.rebuild(Arc::new(manifest));
        let settings = ClientSettings::default();

        let body = String::from_utf8(after.payload("main", &settings).unwrap().to_vec()).unwrap();

        assert_that!(body, contains_substring(r#"{"greet":"Welcome {$name}"}"#));
        assert_that!(after.hashes()["main"], not(eq(&before.hashes()["main"])));
        assert_that!(after.hashes()["cart"], eq(&before.hashes()["cart"]));
    }

    #[rstest]
    fn translation_equal_to_fallback_keeps_the_hash() {
        let raw = RawTranslations::from([("greet".to_string(), "Hi {$name}".to_string())]);
        let untranslated = LocaleState::new("de", Arc::new(sample_manifest()), None);
        let translated = LocaleState::new("de", Arc::new(sample_manifest()), Some(Arc::new(raw)));

        assert_that!(translated.hashes(), eq(untranslated.hashes()));
    }
}
