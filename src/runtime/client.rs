//! What the browser sees: ambient state, boot script, chunk payloads and their URLs.

use std::collections::{
    BTreeMap,
    BTreeSet,
};
use std::sync::Arc;

use serde::Serialize;

use crate::config::I18nSettings;

/// URL scheme and global name for client payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Leading `/`, no trailing `/`.
    pub chunk_path_prefix: String,
    /// Payload file extension, without the dot.
    pub payload_extension: String,
    /// Client-side global holding the ambient translation table.
    pub global_name: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self::from(&I18nSettings::default())
    }
}

impl From<&I18nSettings> for ClientSettings {
    fn from(settings: &I18nSettings) -> Self {
        Self {
            chunk_path_prefix: settings.chunk_path_prefix.trim_end_matches('/').to_string(),
            payload_extension: settings.payload_extension.clone(),
            global_name: settings.global_name.clone(),
        }
    }
}

/// Ambient client state installed by the boot script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientState {
    /// Locale of the page.
    pub locale: String,
    /// Chunk name → content hash.
    pub hashes: BTreeMap<String, String>,
    /// Filled in by chunk payloads as they load.
    pub translations: BTreeMap<String, String>,
    /// Chunk name → translating chunks it depends on.
    pub imports: BTreeMap<String, BTreeSet<String>>,
}

/// Outcome of a chunk payload request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkResponse {
    /// Encoded payload.
    Found(Arc<[u8]>),
    /// Unknown locale or chunk.
    NotFound,
}

impl ChunkResponse {
    /// Payload bytes, if found.
    #[must_use]
    pub fn body(&self) -> Option<&[u8]> {
        match self {
            Self::Found(bytes) => Some(bytes.as_ref()),
            Self::NotFound => None,
        }
    }
}

/// A parsed `{prefix}/{locale}/{chunk}.{hash}.{ext}` path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPath {
    /// Locale segment.
    pub locale: String,
    /// Chunk name, possibly containing `/`.
    pub chunk: String,
    /// Hash segment.
    pub hash: String,
}

impl ClientSettings {
    /// `{prefix}/{locale}/{chunk}.{hash}.{ext}`
    #[must_use]
    pub fn chunk_url(&self, locale: &str, chunk: &str, hash: &str) -> String {
        format!("{}/{locale}/{chunk}.{hash}.{}", self.chunk_path_prefix, self.payload_extension)
    }

    /// Chunk names may contain `/`; locales may not.
    #[must_use]
    pub fn parse_chunk_path(&self, path: &str) -> Option<ChunkPath> {
        let rest = path.strip_prefix(self.chunk_path_prefix.as_str())?.strip_prefix('/')?;
        let (locale, file) = rest.split_once('/')?;
        let stem = file.strip_suffix(self.payload_extension.as_str())?.strip_suffix('.')?;
        let (chunk, hash) = stem.rsplit_once('.')?;
        if locale.is_empty() || chunk.is_empty() || hash.is_empty() {
            return None;
        }
        Some(ChunkPath { locale: locale.to_string(), chunk: chunk.to_string(), hash: hash.to_string() })
    }

    /// `g["<global name>"]` with the name JSON-escaped.
    fn global(&self) -> String {
        format!("g[{}]", script_json(&self.global_name))
    }

    /// Installs the ambient state, keeping translations already on the page.
    #[must_use]
    pub fn boot_script(&self, state: &ClientState) -> String {
        let global = self.global();
        format!(
            "(function(g){{var p={global}||{{}};var s={};s.translations=Object.assign(p.translations||{{}},s.translations);{global}=s;}})(globalThis);",
            script_json(state)
        )
    }

    /// Merges `translations` into the ambient table.
    #[must_use]
    pub fn payload_script(&self, translations: &BTreeMap<&str, &str>) -> String {
        let global = self.global();
        format!(
            "(function(g){{var s={global}||({global}={{translations:{{}}}});s.translations=Object.assign(s.translations||{{}},{});}})(globalThis);",
            script_json(translations)
        )
    }
}

/// JSON safe to embed in an inline `<script>`.
fn script_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_default()
        .replace("</", "<\\/")
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}
