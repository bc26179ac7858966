//! Options accepted by `I18nRuntime::configure`.

use std::collections::HashSet;

use unic_langid::LanguageIdentifier;

use super::{
    ConfigError,
    ValidationError,
};
use crate::runtime::FallbackPolicy;

/// Locale set and fallback policy for the runtime.
#[derive(Debug, Clone, Default)]
pub struct RuntimeOptions {
    /// Configured locale identifiers, in order.
    pub locales: Vec<String>,
    /// Must be one of `locales`; the first locale is used when unset.
    pub default_locale: Option<String>,
    /// How missing keys resolve.
    pub fallback: FallbackPolicy,
}

impl RuntimeOptions {
    /// Options for `locales` with the first as default and the `fallback` policy.
    #[must_use]
    pub fn new<I, S>(locales: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { locales: locales.into_iter().map(Into::into).collect(), ..Self::default() }
    }

    /// Sets the default locale.
    #[must_use]
    pub fn with_default_locale(mut self, locale: impl Into<String>) -> Self {
        self.default_locale = Some(locale.into());
        self
    }

    /// Sets the fallback policy.
    #[must_use]
    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    /// Resolved default locale. Only meaningful after `validate` succeeded.
    #[must_use]
    pub fn effective_default_locale(&self) -> Option<&str> {
        self.default_locale.as_deref().or_else(|| self.locales.first().map(String::as_str))
    }

    /// # Errors
    /// - Empty locale list
    /// - Empty, whitespace-padded, duplicate or unparsable locale identifiers
    /// - `default_locale` not among `locales`
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.locales.is_empty() {
            errors.push(ValidationError::new("locales", "At least one locale is required"));
        }

        let mut seen = HashSet::new();
        for (index, locale) in self.locales.iter().enumerate() {
            let path = format!("locales[{index}]");
            if locale.is_empty() {
                errors.push(ValidationError::new(path, "The locale cannot be empty"));
            } else if locale.trim() != locale {
                errors.push(ValidationError::new(
                    path,
                    format!("The locale '{locale}' must not have surrounding whitespace"),
                ));
            } else if !seen.insert(locale.as_str()) {
                errors.push(ValidationError::new(path, format!("Duplicate locale '{locale}'")));
            } else if locale.parse::<LanguageIdentifier>().is_err() {
                errors.push(ValidationError::new(
                    path,
                    format!("'{locale}' is not a valid BCP 47 language identifier"),
                ));
            }
        }

        if let Some(default_locale) = &self.default_locale
            && !self.locales.contains(default_locale)
        {
            errors.push(ValidationError::new(
                "defaultLocale",
                format!("'{default_locale}' is not one of the configured locales"),
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Validates and converts failures into a `ConfigError`.
    pub fn check(&self) -> Result<(), ConfigError> {
        self.validate().map_err(ConfigError::ValidationErrors)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn valid_options() {
        let options = RuntimeOptions::new(["en", "de-CH"]).with_default_locale("de-CH");

        assert_that!(options.validate(), ok(anything()));
        assert_eq!(options.effective_default_locale(), Some("de-CH"));
    }

    #[rstest]
    fn default_locale_falls_back_to_first() {
        let options = RuntimeOptions::new(["fr", "en"]);

        assert_eq!(options.effective_default_locale(), Some("fr"));
    }

    #[rstest]
    #[case::empty_list(vec![], "locales")]
    #[case::empty_locale(vec!["en", ""], "locales[1]")]
    #[case::padded(vec![" en"], "locales[0]")]
    #[case::duplicate(vec!["en", "en"], "locales[1]")]
    #[case::not_bcp47(vec!["en_US!!"], "locales[0]")]
    fn invalid_locales(#[case] locales: Vec<&str>, #[case] expected_path: &str) {
        let options = RuntimeOptions::new(locales);

        assert_that!(
            options.validate(),
            err(elements_are![field!(ValidationError.field_path, eq(expected_path))])
        );
    }

    #[rstest]
    fn default_locale_must_be_configured() {
        let options = RuntimeOptions::new(["en"]).with_default_locale("ja");

        assert_that!(
            options.check(),
            err(displays_as(contains_substring("'ja' is not one of the configured locales")))
        );
    }
}
