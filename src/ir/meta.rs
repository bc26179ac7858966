//! Call-site metadata attached to a translation key.

use std::collections::BTreeMap;
use std::fmt;

use serde::{
    Deserialize,
    Serialize,
};

/// Metadata for one interpolation variable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableMeta {
    /// Fallback used for this variable when no value is passed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
    /// Note for translators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Metadata authored inline at a translation call site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationMeta {
    /// Human-readable text used when no runtime translation exists.
    pub fallback: String,
    /// Note for translators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Documented message variables by name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<BTreeMap<String, VariableMeta>>,
}

impl TranslationMeta {
    /// Metadata carrying only a fallback.
    #[must_use]
    pub fn new(fallback: impl Into<String>) -> Self {
        Self { fallback: fallback.into(), description: None, variables: None }
    }

    /// Adds a translator note.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Documents one message variable.
    #[must_use]
    pub fn with_variable(mut self, name: impl Into<String>, variable: VariableMeta) -> Self {
        self.variables.get_or_insert_with(BTreeMap::new).insert(name.into(), variable);
        self
    }

    /// Canonical JSON for `variables`, used for drift comparison.
    #[must_use]
    pub fn serialized_variables(&self) -> String {
        self.variables
            .as_ref()
            .and_then(|vars| serde_json::to_string(vars).ok())
            .unwrap_or_default()
    }

    /// Returns the fields whose values differ between `self` and `other`.
    #[must_use]
    pub fn diff(&self, other: &Self) -> Vec<MetaField> {
        let mut fields = Vec::new();
        if self.fallback != other.fallback {
            fields.push(MetaField::Fallback);
        }
        if self.description != other.description {
            fields.push(MetaField::Description);
        }
        if self.serialized_variables() != other.serialized_variables() {
            fields.push(MetaField::Variables);
        }
        fields
    }
}

/// A metadata field checked for consistency across occurrences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetaField {
    /// `fallback`
    Fallback,
    /// `description`
    Description,
    /// `variables`
    Variables,
}

impl fmt::Display for MetaField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fallback => "fallback",
            Self::Description => "description",
            Self::Variables => "variables",
        })
    }
}
