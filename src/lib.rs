//! js-i18n-chunks
//!
//! Extracts translation calls from JavaScript/TypeScript sources, maps the
//! keys onto bundler chunks and serves per-chunk translations at runtime.

pub mod chunks;
pub mod config;
pub mod indexer;
pub mod input;
pub mod ir;
pub mod message;
pub mod rich;
pub mod runtime;
pub mod syntax;
pub mod types;

#[cfg(test)]
mod test_utils;

pub use chunks::{
    BundleGraph,
    ChunkManifestBuilder,
    Manifest,
};
pub use indexer::{
    KeyStore,
    WorkspaceIndexer,
};
pub use runtime::I18nRuntime;
