//! Serving translations: per-locale caches, request scoping, fallback policy
//! and the client payload surface.

mod client;
mod context;
mod engine;
mod error;
mod fallback;
mod state;

pub use client::{
    ChunkPath,
    ChunkResponse,
    ClientSettings,
    ClientState,
};
pub use context::{
    I18nContext,
    current_locale,
};
pub use engine::{
    I18nRuntime,
    translate_unscoped,
};
pub use error::{
    RuntimeError,
    TranslateError,
};
pub use fallback::FallbackPolicy;
