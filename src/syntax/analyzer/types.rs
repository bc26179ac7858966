//! Types for the analyzer module

use std::fmt;
use std::str::FromStr;

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

use crate::ir::Occurrence;
use crate::types::SourceLocation;

/// Capture names used in `queries/extract.scm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureName {
    /// The whole call expression (e.g., `t("key", "Fallback")`)
    Call,
    /// Callee of the call (`t`, `i18n.t`)
    CallFnName,
    /// Argument list of the call
    CallArgs,
    /// Module specifier of an import statement
    ImportSource,
}

impl CaptureName {
    /// String used in the tree-sitter query.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Call => "i18n.call",
            Self::CallFnName => "i18n.call_fn_name",
            Self::CallArgs => "i18n.call_args",
            Self::ImportSource => "i18n.import_source",
        }
    }
}

/// Error converting a string into a `CaptureName`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseCaptureNameError;

impl FromStr for CaptureName {
    type Err = ParseCaptureNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "i18n.call" => Ok(Self::Call),
            "i18n.call_fn_name" => Ok(Self::CallFnName),
            "i18n.call_args" => Ok(Self::CallArgs),
            "i18n.import_source" => Ok(Self::ImportSource),
            _ => Err(ParseCaptureNameError),
        }
    }
}

/// Why a call site's metadata could not be read statically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DiagnosticKind {
    /// `t("key")` without a second argument
    MissingMeta,
    /// Second argument is neither a string nor an object literal
    NonLiteralMeta {
        /// Source text of the argument.
        source: String,
    },
    /// A property of the meta object is computed, spread or non-literal
    NonLiteralProperty {
        /// Property name.
        property: String,
    },
    /// Meta object without a `fallback` property
    MissingFallback,
}

/// A non-fatal problem found while extracting one call site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionDiagnostic {
    /// Where the call is.
    pub location: SourceLocation,
    /// Key of the call.
    pub key: String,
    /// What was wrong.
    pub kind: DiagnosticKind,
}

impl fmt::Display for ExtractionDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::MissingMeta => {
                write!(f, "{}: '{}' has no fallback argument", self.location, self.key)
            }
            DiagnosticKind::NonLiteralMeta { source } => write!(
                f,
                "{}: metadata for '{}' must be a string or object literal, found `{source}`",
                self.location, self.key
            ),
            DiagnosticKind::NonLiteralProperty { property } => write!(
                f,
                "{}: metadata property `{property}` of '{}' is not a literal",
                self.location, self.key
            ),
            DiagnosticKind::MissingFallback => {
                write!(f, "{}: metadata for '{}' has no `fallback`", self.location, self.key)
            }
        }
    }
}

/// Result of extracting one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileExtraction {
    /// Workspace-relative file id.
    pub file: String,
    /// Call sites in source order.
    pub occurrences: Vec<Occurrence>,
    /// Non-literal arguments found in the file.
    pub diagnostics: Vec<ExtractionDiagnostic>,
    /// Module specifiers imported by the file.
    pub imports: Vec<String>,
    /// True when the file imports the translation runtime or calls it.
    pub uses_translations: bool,
}

/// Defines errors that may occur during the analysis process
#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// Error when failing to set the language for the parser
    #[error("Failed to set language for parser: {0}")]
    LanguageSetup(#[from] tree_sitter::LanguageError),
    /// Error when failing to parse source code
    #[error("Failed to parse source code")]
    ParseFailed,
    /// Error when the extraction query is unavailable
    #[error("Query execution failed: {0}")]
    QueryExecution(String),
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(CaptureName::Call)]
    #[case(CaptureName::CallFnName)]
    #[case(CaptureName::CallArgs)]
    #[case(CaptureName::ImportSource)]
    fn capture_name_round_trips_through_str(#[case] name: CaptureName) {
        assert_eq!(name.as_str().parse::<CaptureName>(), Ok(name));
    }

    #[rstest]
    fn unknown_capture_name() {
        assert_eq!("i18n.other".parse::<CaptureName>(), Err(ParseCaptureNameError));
    }

    #[rstest]
    fn diagnostic_display_names_location() {
        let diagnostic = ExtractionDiagnostic {
            location: SourceLocation::new("a.ts", 3),
            key: "greet".to_string(),
            kind: DiagnosticKind::NonLiteralMeta { source: "meta".to_string() },
        };

        assert_eq!(
            diagnostic.to_string(),
            "a.ts:3: metadata for 'greet' must be a string or object literal, found `meta`"
        );
    }
}
