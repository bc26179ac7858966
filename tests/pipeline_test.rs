//! Extraction → key store → chunk manifest → runtime, end to end.

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]
#![allow(clippy::indexing_slicing)]

use std::fs;
use std::path::Path;

use googletest::prelude::*;
use js_i18n_chunks::chunks::{
    BundleGraph,
    ChunkManifestBuilder,
    Manifest,
};
use js_i18n_chunks::config::{
    ConsistencyLevel,
    I18nSettings,
    RuntimeOptions,
};
use js_i18n_chunks::indexer::{
    KeyStore,
    WorkspaceIndexer,
};
use js_i18n_chunks::ir::RawTranslations;
use js_i18n_chunks::message::MessageArgs;
use js_i18n_chunks::runtime::{
    ChunkResponse,
    FallbackPolicy,
    I18nRuntime,
};
use rstest::*;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[fixture]
fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        root,
        "src/main.ts",
        "import { t } from '@app/i18n';\nexport const title = t('title', 'Cart');\nexport const hi = t('greet', 'Hi {$name}');\n",
    );
    write(
        root,
        "src/cart.tsx",
        "import { t } from '@app/i18n';\nexport const Total = () => <p>{t('cart.total', { fallback: 'Total: {$amount}', description: 'Footer' })}</p>;\nexport const heading = t('title', 'Basket');\n",
    );
    write(root, "src/lazy.js", "export * from './cart';\n");
    dir
}

fn graph() -> BundleGraph {
    BundleGraph::from_json(
        r#"{
            "chunks": [
                { "name": "main", "modules": ["src/main.ts"] },
                { "name": "lazy", "modules": ["src/lazy.js"] },
                { "name": "cart", "modules": ["src/cart.tsx"] }
            ],
            "moduleImports": {
                "src/main.ts": ["src/lazy.js"],
                "src/lazy.js": ["src/cart.tsx"],
                "src/cart.tsx": ["src/main.ts"]
            }
        }"#,
    )
    .unwrap()
}

async fn build_manifest(root: &Path, consistency: ConsistencyLevel) -> (KeyStore, Manifest) {
    let settings = I18nSettings {
        consistency,
        module_specifiers: vec!["@app/i18n".to_string()],
        ..I18nSettings::default()
    };
    let indexer = WorkspaceIndexer::new(root.to_path_buf(), &settings).unwrap();
    let mut store = KeyStore::with_consistency(consistency);
    indexer.index_workspace(&mut store).await.unwrap();
    let manifest = ChunkManifestBuilder::new(&graph(), &store).build();
    (store, manifest)
}

#[rstest]
#[tokio::test]
async fn manifest_maps_keys_to_chunks(workspace: TempDir) {
    let (store, manifest) = build_manifest(workspace.path(), ConsistencyLevel::Warn).await;

    let keys: Vec<String> = manifest.keys.iter().map(|entry| entry.key.clone()).collect();
    assert_that!(keys, elements_are![eq("cart.total"), eq("title"), eq("greet")]);
    // Files fold in path order, so src/main.ts is the last writer of `title`.
    assert_eq!(manifest.fallback_for("title"), Some("Cart"));
    assert_that!(manifest.chunks["main"], elements_are![eq("greet"), eq("title")]);
    assert_that!(manifest.chunks["cart"], elements_are![eq("cart.total"), eq("title")]);
    assert_that!(manifest.contains_chunk("lazy"), eq(false));
    assert_that!(manifest.imports["main"], elements_are![eq("cart")]);
    assert_that!(manifest.imports["lazy"], elements_are![eq("cart"), eq("main")]);

    assert_that!(store.issues().len(), eq(1));
    assert_that!(store.finish(), ok(anything()));
}

#[rstest]
#[tokio::test]
async fn error_mode_fails_the_build(workspace: TempDir) {
    let (store, _) = build_manifest(workspace.path(), ConsistencyLevel::Error).await;

    assert_that!(store.finish(), err(displays_as(contains_substring("'title' has a different fallback"))));
}

#[rstest]
#[tokio::test]
async fn runtime_serves_manifest(workspace: TempDir) {
    let (_, manifest) = build_manifest(workspace.path(), ConsistencyLevel::Off).await;
    let json = manifest.to_json_pretty().unwrap();
    let frozen = Manifest::from_json(&json).unwrap();

    let options = RuntimeOptions::new(["en", "de"]).with_fallback(FallbackPolicy::Key);
    let runtime = I18nRuntime::configure(options, frozen).unwrap();
    runtime
        .set_translations(
            "de",
            RawTranslations::from([("greet".to_string(), "Hallo {$name}".to_string())]),
        )
        .unwrap();

    let args = MessageArgs::new().with("name", "Sam");
    let greet = runtime.scope("de", async { runtime.t("greet", None, &args) }).await;
    let missing = runtime.scope("en", async { runtime.t("greet", None, &args) }).await;
    assert_that!(greet, ok(eq("Hallo Sam")));
    assert_that!(missing, ok(eq("greet")));

    let url = runtime.chunk_url("de", "cart").unwrap();
    let ChunkResponse::Found(body) = runtime.serve_path(&url) else { panic!("expected a payload") };
    let body = String::from_utf8(body.to_vec()).unwrap();
    assert_that!(body, contains_substring(r#""cart.total":"Total: {$amount}""#));
    assert_that!(body, contains_substring(r#""title":"Cart""#));
    assert_that!(body, not(contains_substring("greet")));

    let state = runtime.client_state("de").unwrap();
    assert_that!(state.imports["main"], elements_are![eq("cart")]);
    assert_that!(runtime.serve_path("/_i18n/de/lazy.00000000.js"), eq(&ChunkResponse::NotFound));
}
