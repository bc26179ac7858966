//! Maps chunks to keys and flattens the chunk import graph.

use std::collections::{
    BTreeMap,
    BTreeSet,
    HashSet,
};

use super::graph::BundleGraph;
use super::manifest::Manifest;
use crate::indexer::KeyStore;

/// Shared empty edge set for chunks without imports.
static NO_EDGES: BTreeSet<String> = BTreeSet::new();

/// Single sweep over a finished bundle.
///
/// The graph must be complete: run only after extraction has stopped
/// discovering files.
#[derive(Debug, Clone, Copy)]
pub struct ChunkManifestBuilder<'a> {
    /// Bundler facts: chunk membership and module imports.
    graph: &'a BundleGraph,
    /// Per-file keys and translating files.
    store: &'a KeyStore,
}

impl<'a> ChunkManifestBuilder<'a> {
    /// Borrows both inputs for one build.
    #[must_use]
    pub const fn new(graph: &'a BundleGraph, store: &'a KeyStore) -> Self {
        Self { graph, store }
    }

    /// Builds the manifest in one sweep over the closed bundle graph.
    #[must_use]
    pub fn build(&self) -> Manifest {
        let file_keys = self.store.file_keys();

        let mut chunks: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for chunk in &self.graph.chunks {
            // A translating module with zero keys (e.g. a barrel) still makes
            // its chunk a carrier.
            let mut member_keys = chunk
                .modules
                .iter()
                .filter_map(|module| file_keys.get(module))
                .peekable();
            if member_keys.peek().is_none() {
                continue;
            }
            let keys = chunks.entry(chunk.name.clone()).or_default();
            keys.extend(member_keys.flatten().cloned());
        }

        let carriers: BTreeSet<&str> = chunks.keys().map(String::as_str).collect();
        let edges = self.graph.chunk_edges();
        let imports: BTreeMap<String, BTreeSet<String>> = edges
            .keys()
            .map(|chunk| (chunk.clone(), translating_descendants(chunk, &edges, &carriers)))
            .collect();

        let keys = self.store.extracted_keys();
        tracing::debug!(
            keys = keys.len(),
            chunks = chunks.len(),
            graph_chunks = edges.len(),
            "Chunk manifest built"
        );

        Manifest { keys, chunks, imports }
    }
}

/// Translating chunks reachable from `root`, excluding `root` itself.
///
/// Depth-first with a visited set scoped to the current path: a chunk reached
/// again through a different path is explored again, while a chunk already on
/// the path (a cycle) ends that branch.
#[must_use]
pub fn translating_descendants(
    root: &str,
    edges: &BTreeMap<String, BTreeSet<String>>,
    carriers: &BTreeSet<&str>,
) -> BTreeSet<String> {
    let children = |chunk: &str| edges.get(chunk).unwrap_or(&NO_EDGES).iter();

    let mut found = BTreeSet::new();
    let mut path: Vec<&str> = vec![root];
    let mut on_path: HashSet<&str> = HashSet::from([root]);
    let mut stack = vec![children(root)];

    loop {
        let Some(pending) = stack.last_mut() else {
            break;
        };
        let Some(child) = pending.next() else {
            stack.pop();
            if let Some(done) = path.pop() {
                on_path.remove(done);
            }
            continue;
        };

        if on_path.contains(child.as_str()) {
            continue;
        }
        if carriers.contains(child.as_str()) {
            found.insert(child.clone());
        }
        on_path.insert(child.as_str());
        path.push(child.as_str());
        stack.push(children(child.as_str()));
    }

    found
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;

    use super::*;
    use crate::chunks::graph::ChunkInfo;
    use crate::ir::{
        Occurrence,
        TranslationMeta,
    };

    fn edges(pairs: &[(&str, &str)]) -> BTreeMap<String, BTreeSet<String>> {
        let mut edges: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (from, to) in pairs {
            edges.entry((*from).to_string()).or_default().insert((*to).to_string());
            edges.entry((*to).to_string()).or_default();
        }
        edges
    }

    fn occ(key: &str, file: &str) -> Occurrence {
        Occurrence::new(key, TranslationMeta::new(key.to_uppercase()), file, 1)
    }

    #[rstest]
    fn cycle_terminates_and_excludes_self() {
        let edges = edges(&[("A", "B"), ("B", "C"), ("C", "A")]);
        let carriers = BTreeSet::from(["C"]);

        let result = translating_descendants("A", &edges, &carriers);

        assert_that!(result, elements_are![eq("C")]);
    }

    #[rstest]
    fn cycle_through_carrying_root_excludes_root() {
        let edges = edges(&[("A", "B"), ("B", "A")]);
        let carriers = BTreeSet::from(["A", "B"]);

        assert_that!(translating_descendants("A", &edges, &carriers), elements_are![eq("B")]);
        assert_that!(translating_descendants("B", &edges, &carriers), elements_are![eq("A")]);
    }

    #[rstest]
    fn reaches_through_non_translating_chunks() {
        let edges = edges(&[("A", "B"), ("B", "C"), ("C", "D")]);
        let carriers = BTreeSet::from(["D"]);

        assert_that!(translating_descendants("A", &edges, &carriers), elements_are![eq("D")]);
    }

    #[rstest]
    fn same_chunk_via_different_paths() {
        // D, E and B are reached again via C after the B branch finished.
        let edges = edges(&[("A", "B"), ("A", "C"), ("B", "D"), ("C", "D"), ("D", "E"), ("E", "B")]);
        let carriers = BTreeSet::from(["B", "E"]);

        assert_that!(translating_descendants("A", &edges, &carriers), elements_are![eq("B"), eq("E")]);
        assert_that!(translating_descendants("D", &edges, &carriers), elements_are![eq("B"), eq("E")]);
    }

    #[rstest]
    fn unknown_root_has_no_descendants() {
        assert_that!(translating_descendants("X", &BTreeMap::new(), &BTreeSet::new()), is_empty());
    }

    #[rstest]
    fn builds_chunk_keys_and_imports() {
        let mut store = KeyStore::new();
        store.add_file_keys("src/main.ts", vec![occ("title", "src/main.ts")]);
        store.add_file_keys("src/cart.ts", vec![occ("cart.total", "src/cart.ts"), occ("title", "src/cart.ts")]);
        store.add_file_keys("src/barrel.ts", vec![]);
        let graph = BundleGraph::new()
            .with_chunk(ChunkInfo::new("main", ["src/main.ts", "src/router.ts"]))
            .with_chunk(ChunkInfo::new("lazy", ["src/lazy.ts"]))
            .with_chunk(ChunkInfo::new("barrel", ["src/barrel.ts"]))
            .with_chunk(ChunkInfo::new("cart", ["src/cart.ts"]))
            .with_module_import("src/main.ts", "src/lazy.ts")
            .with_module_import("src/lazy.ts", "src/barrel.ts")
            .with_module_import("src/barrel.ts", "src/cart.ts")
            .with_module_import("src/cart.ts", "src/main.ts");

        let manifest = ChunkManifestBuilder::new(&graph, &store).build();

        let chunk_names: Vec<String> = manifest.chunks.keys().cloned().collect();
        assert_that!(chunk_names, elements_are![eq("barrel"), eq("cart"), eq("main")]);
        assert_that!(manifest.chunks["cart"], elements_are![eq("cart.total"), eq("title")]);
        assert_that!(manifest.chunks["barrel"], is_empty());
        assert_that!(manifest.imports["main"], elements_are![eq("barrel"), eq("cart")]);
        assert_that!(manifest.imports["lazy"], elements_are![eq("barrel"), eq("cart"), eq("main")]);
        assert_that!(manifest.imports["cart"], elements_are![eq("barrel"), eq("main")]);
        assert_that!(manifest.keys, len(eq(2)));
    }
}
