//! Errors returned by translation lookups.

use thiserror::Error;

use crate::config::ConfigError;

/// Translation failures surfaced to callers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    /// No translation and no fallback for the key.
    #[error("Missing translation for '{key}' in locale '{locale}'")]
    MissingTranslation {
        /// Requested key.
        key: String,
        /// Requested locale.
        locale: String,
    },

    /// The locale is not configured.
    #[error("Locale '{0}' is not configured")]
    UnknownLocale(String),
}

/// Errors from configuring or updating a runtime.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Invalid runtime options.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Translation update failed.
    #[error(transparent)]
    Translate(#[from] TranslateError),
}
