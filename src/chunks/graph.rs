//! Bundler facts consumed by the manifest builder.

use std::collections::{
    BTreeMap,
    BTreeSet,
    HashMap,
};

use serde::{
    Deserialize,
    Serialize,
};

/// One output chunk and the modules placed in it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChunkInfo {
    /// Chunk name as the bundler reports it.
    pub name: String,
    /// Module ids, in the same form as key store file ids.
    pub modules: Vec<String>,
    /// Chunk names this chunk imports directly, when the bundler reports them.
    pub imports: Vec<String>,
}

impl ChunkInfo {
    /// A chunk with its member module ids.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            modules: modules.into_iter().map(Into::into).collect(),
            imports: Vec::new(),
        }
    }
}

/// Complete, closed snapshot of bundle output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BundleGraph {
    /// Every emitted chunk.
    pub chunks: Vec<ChunkInfo>,
    /// Module-level import edges, `importer → [imported]`.
    pub module_imports: BTreeMap<String, Vec<String>>,
}

impl BundleGraph {
    /// Empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a chunk.
    #[must_use]
    pub fn with_chunk(mut self, chunk: ChunkInfo) -> Self {
        self.chunks.push(chunk);
        self
    }

    /// Records that module `from` imports module `to`.
    #[must_use]
    pub fn with_module_import(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.module_imports.entry(from.into()).or_default().push(to.into());
        self
    }

    /// # Errors
    /// Returns a parse error when `json` is not a valid bundle graph.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Module → chunks containing it. A module may be duplicated into several chunks.
    fn module_chunks(&self) -> HashMap<&str, Vec<&str>> {
        let mut index: HashMap<&str, Vec<&str>> = HashMap::new();
        for chunk in &self.chunks {
            for module in &chunk.modules {
                index.entry(module.as_str()).or_default().push(chunk.name.as_str());
            }
        }
        index
    }

    /// Direct chunk → chunk edges.
    ///
    /// Unions reported chunk imports with module imports projected onto
    /// chunks. Modules outside every chunk are ignored, and self edges dropped.
    #[must_use]
    pub fn chunk_edges(&self) -> BTreeMap<String, BTreeSet<String>> {
        let module_chunks = self.module_chunks();
        let mut edges: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for chunk in &self.chunks {
            let targets = edges.entry(chunk.name.clone()).or_default();
            for imported in &chunk.imports {
                if *imported != chunk.name {
                    targets.insert(imported.clone());
                }
            }
            for module in &chunk.modules {
                let Some(imported_modules) = self.module_imports.get(module) else {
                    continue;
                };
                for target_chunk in imported_modules
                    .iter()
                    .filter_map(|imported| module_chunks.get(imported.as_str()))
                    .flatten()
                {
                    if *target_chunk != chunk.name {
                        targets.insert((*target_chunk).to_string());
                    }
                }
            }
        }
        edges
    }
}
