//! Post-bundle chunk mapping: which keys each chunk needs and which
//! translating chunks it pulls in.

pub mod builder;
pub mod graph;
pub mod hash;
pub mod manifest;

pub use builder::ChunkManifestBuilder;
pub use graph::{
    BundleGraph,
    ChunkInfo,
};
pub use hash::{
    HASH_LEN,
    chunk_hash,
};
pub use manifest::{
    Manifest,
    ManifestError,
};
