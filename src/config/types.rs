use std::collections::HashSet;

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

/// One rejected settings field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "includePatterns[0]")
    pub field_path: String,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    /// Validation error for `field_path`.
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

/// Settings loading and validation failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// One or more fields were rejected.
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    /// The settings file could not be read.
    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    /// The settings file is not valid JSON for these settings.
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Numbered list, one error per line.
fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// How metadata drift between occurrences of the same key is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConsistencyLevel {
    /// No checks.
    Off,
    /// Log mismatches and continue.
    #[default]
    Warn,
    /// Mismatches are recorded and fail the build step at `KeyStore::finish`.
    Error,
}

/// Build-side settings read from `.js-i18n-chunks.json`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct I18nSettings {
    /// Globs selecting source files.
    pub include_patterns: Vec<String>,
    /// Globs removed from the included set.
    pub exclude_patterns: Vec<String>,

    /// Callee names treated as translation calls (`t`, `i18n.t`, ...).
    pub translation_functions: Vec<String>,

    /// Import sources that mark a module as translating.
    ///
    /// A file with at least one translation call counts either way.
    pub module_specifiers: Vec<String>,

    /// How mismatched metadata for one key is handled.
    pub consistency: ConsistencyLevel,

    /// Extraction parallelism.
    pub indexing: IndexingConfig,

    /// URL prefix for chunk payloads: `{prefix}/{locale}/{chunk}.{hash}.{ext}`.
    pub chunk_path_prefix: String,
    /// Payload file extension, without the dot.
    pub payload_extension: String,

    /// Client-side global holding the ambient translation table.
    pub global_name: String,
}

/// Indexing settings.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct IndexingConfig {
    /// Parallel extraction tasks.
    /// Default: 80% of CPU cores (minimum 1).
    pub num_threads: Option<usize>,
}

impl IndexingConfig {
    /// Configured thread count, or the CPU-based default.
    #[must_use]
    pub fn effective_threads(&self) -> usize {
        self.num_threads.unwrap_or_else(|| (num_cpus::get() * 4 / 5).max(1)).max(1)
    }
}

impl I18nSettings {
    /// # Errors
    /// - Required field is empty
    /// - Invalid glob pattern
    /// - Duplicate translation function names
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.include_patterns.is_empty() {
            errors.push(ValidationError::new(
                "includePatterns",
                "At least one pattern is required. Example: [\"**/*.{js,ts,tsx}\"]",
            ));
        }

        for (index, pattern) in self.include_patterns.iter().enumerate() {
            if let Err(e) = globset::Glob::new(pattern) {
                errors.push(ValidationError::new(
                    format!("includePatterns[{index}]"),
                    format!("Invalid glob pattern '{pattern}': {e}"),
                ));
            }
        }

        for (index, pattern) in self.exclude_patterns.iter().enumerate() {
            if let Err(e) = globset::Glob::new(pattern) {
                errors.push(ValidationError::new(
                    format!("excludePatterns[{index}]"),
                    format!("Invalid glob pattern '{pattern}': {e}"),
                ));
            }
        }

        if self.translation_functions.is_empty() {
            errors.push(ValidationError::new(
                "translationFunctions",
                "At least one function name is required. Example: [\"t\"]",
            ));
        }

        let mut seen = HashSet::new();
        for (index, name) in self.translation_functions.iter().enumerate() {
            if name.trim().is_empty() {
                errors.push(ValidationError::new(
                    format!("translationFunctions[{index}]"),
                    "The function name cannot be empty",
                ));
            } else if !seen.insert(name.as_str()) {
                errors.push(ValidationError::new(
                    format!("translationFunctions[{index}]"),
                    format!("Duplicate function name '{name}'"),
                ));
            }
        }

        if !self.chunk_path_prefix.starts_with('/') {
            errors.push(ValidationError::new(
                "chunkPathPrefix",
                "The prefix must start with '/'. Example: \"/_i18n\"",
            ));
        }

        if self.payload_extension.is_empty() || self.payload_extension.contains('.') {
            errors.push(ValidationError::new(
                "payloadExtension",
                "The extension cannot be empty or contain '.'. Example: \"js\"",
            ));
        }

        if self.global_name.is_empty() {
            errors.push(ValidationError::new("globalName", "The global name cannot be empty"));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl Default for I18nSettings {
    fn default() -> Self {
        Self {
            include_patterns: vec!["**/*.{js,jsx,ts,tsx}".to_string()],
            exclude_patterns: vec!["node_modules/**".to_string()],
            translation_functions: vec!["t".to_string()],
            module_specifiers: Vec::new(),
            consistency: ConsistencyLevel::default(),
            indexing: IndexingConfig::default(),
            chunk_path_prefix: "/_i18n".to_string(),
            payload_extension: "js".to_string(),
            global_name: "__I18N__".to_string(),
        }
    }
}
