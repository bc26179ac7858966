//! Command line entry point: extracts keys and builds chunk manifests.
//!
//! JSON goes to stdout, logs to stderr (`RUST_LOG` sets the level).

use std::path::{
    Path,
    PathBuf,
};
use std::process::ExitCode;

use js_i18n_chunks::chunks::{
    BundleGraph,
    ChunkManifestBuilder,
    Manifest,
    ManifestError,
};
use js_i18n_chunks::config::{
    ConfigError,
    ConfigManager,
};
use js_i18n_chunks::indexer::{
    IndexerError,
    KeyStore,
    KeyStoreError,
    WorkspaceIndexer,
};
use clap::{
    Parser,
    Subcommand,
};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "js-i18n-chunks",
    about = "Extracts translation keys and builds chunk manifests for JS/TS bundles",
    version
)]
/// Command line arguments.
struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand, PartialEq, Eq)]
enum Command {
    /// Print the keys extracted from a workspace.
    Extract {
        /// Workspace root holding `.js-i18n-chunks.json`.
        #[arg(default_value = ".")]
        root: PathBuf,
    },
    /// Print the full manifest for a workspace and its bundle graph.
    Manifest {
        /// Workspace root holding `.js-i18n-chunks.json`.
        root: PathBuf,
        /// Bundle graph JSON exported by the build tool.
        bundle: PathBuf,
    },
}

/// Everything that makes the CLI exit with a failure.
#[derive(Error, Debug)]
enum CliError {
    /// Settings could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The workspace could not be indexed.
    #[error(transparent)]
    Indexer(#[from] IndexerError),
    /// Consistency errors in `error` mode.
    #[error(transparent)]
    KeyStore(#[from] KeyStoreError),
    /// The manifest could not be serialized.
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    /// The bundle graph file could not be read.
    #[error("Failed to read bundle graph '{}': {source}", path.display())]
    Bundle {
        /// Bundle graph path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The bundle graph is not valid JSON.
    #[error("Invalid bundle graph: {0}")]
    BundleFormat(#[from] serde_json::Error),
}

/// Initializes logging, runs the subcommand and prints its JSON.
#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli.command).await {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            tracing::error!("{error}");
            ExitCode::FAILURE
        }
    }
}

/// Dispatches a parsed subcommand.
async fn run(command: Command) -> Result<String, CliError> {
    match command {
        Command::Extract { root } => extract(root).await,
        Command::Manifest { root, bundle } => manifest(root, &bundle).await,
    }
}

/// Loads settings from `root` and indexes the workspace into a fresh store.
async fn index(root: PathBuf) -> Result<KeyStore, CliError> {
    let mut config = ConfigManager::new();
    config.load_settings(Some(root))?;
    let indexer = WorkspaceIndexer::from_config(&config)?;

    let mut store = KeyStore::with_consistency(config.get_settings().consistency);
    let report = indexer.index_workspace(&mut store).await?;
    tracing::info!(
        files = report.files_indexed,
        translating_files = report.translating_files,
        diagnostics = report.diagnostics.len(),
        issues = store.issues().len(),
        "Workspace indexed"
    );
    store.finish()?;
    Ok(store)
}

/// Keys only.
async fn extract(root: PathBuf) -> Result<String, CliError> {
    let store = index(root).await?;
    let manifest = Manifest { keys: store.extracted_keys(), ..Manifest::default() };
    Ok(manifest.to_json_pretty()?)
}

/// Keys, carrier chunks and flattened imports.
async fn manifest(root: PathBuf, bundle: &Path) -> Result<String, CliError> {
    let json = tokio::fs::read_to_string(bundle)
        .await
        .map_err(|source| CliError::Bundle { path: bundle.to_path_buf(), source })?;
    let graph = BundleGraph::from_json(&json)?;
    let store = index(root).await?;
    Ok(ChunkManifestBuilder::new(&graph, &store).build().to_json_pretty()?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rstest::*;

    use super::*;

    #[rstest]
    #[case::default_root(&["js-i18n-chunks", "extract"], Command::Extract { root: PathBuf::from(".") })]
    #[case::explicit_root(&["js-i18n-chunks", "extract", "web"], Command::Extract { root: PathBuf::from("web") })]
    #[case::manifest(
        &["js-i18n-chunks", "manifest", "web", "dist/graph.json"],
        Command::Manifest { root: PathBuf::from("web"), bundle: PathBuf::from("dist/graph.json") }
    )]
    fn parses_subcommands(#[case] args: &[&str], #[case] expected: Command) {
        assert_eq!(Cli::try_parse_from(args).unwrap().command, expected);
    }

    #[rstest]
    #[case::no_subcommand(&["js-i18n-chunks"])]
    #[case::manifest_without_bundle(&["js-i18n-chunks", "manifest", "web"])]
    #[case::unknown_subcommand(&["js-i18n-chunks", "serve"])]
    fn rejects_bad_arguments(#[case] args: &[&str]) {
        assert!(Cli::try_parse_from(args).is_err());
    }
}
