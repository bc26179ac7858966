//! Key collection across a workspace.

pub mod key_store;
pub mod types;
pub mod workspace;

pub use key_store::{
    ConsistencyIssue,
    FileKeysDelta,
    KeyStore,
    KeyStoreError,
};
pub use types::{
    IndexReport,
    IndexerError,
};
pub use workspace::WorkspaceIndexer;
