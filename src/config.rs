//! Build-side settings and the runtime `configure()` surface.

/// Settings file loader
mod loader;
/// Configuration manager
mod manager;
/// Source file pattern matcher
mod matcher;
/// Runtime locale options
mod runtime;
/// Configuration types and settings
mod types;

pub use manager::ConfigManager;
pub use matcher::{
    FileMatcher,
    MatcherError,
};
pub use runtime::RuntimeOptions;
pub use types::{
    ConfigError,
    ConsistencyLevel,
    I18nSettings,
    IndexingConfig,
    ValidationError,
};
