//! What `t` returns for keys without a translation.

use std::fmt;
use std::sync::Arc;

/// Caller-supplied resolver: `(key, locale) -> text`.
type CustomFallback = Arc<dyn Fn(&str, &str) -> String + Send + Sync>;

/// Fixed for the lifetime of one configuration.
#[derive(Clone, Default)]
pub enum FallbackPolicy {
    /// The fallback text authored at the call site (or extracted into the manifest).
    #[default]
    Fallback,
    /// The key itself.
    Key,
    /// A `TranslateError::MissingTranslation`.
    Throw,
    /// `handler(key, locale)` returns the template to use.
    Custom(CustomFallback),
}

impl FallbackPolicy {
    /// Policy resolving missing keys through `handler`.
    #[must_use]
    pub fn custom<F>(handler: F) -> Self
    where
        F: Fn(&str, &str) -> String + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(handler))
    }
}

impl fmt::Debug for FallbackPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fallback => f.write_str("Fallback"),
            Self::Key => f.write_str("Key"),
            Self::Throw => f.write_str("Throw"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
