//! Source analysis: translation calls and chunk imports.

pub mod analyzer;

pub use analyzer::extractor::ExtractOptions;
pub use analyzer::types::{
    AnalyzerError,
    DiagnosticKind,
    ExtractionDiagnostic,
    FileExtraction,
};

use crate::config::I18nSettings;
use crate::input::source::SourceFile;

impl From<&I18nSettings> for ExtractOptions {
    fn from(settings: &I18nSettings) -> Self {
        Self {
            translation_functions: settings.translation_functions.clone(),
            module_specifiers: settings.module_specifiers.clone(),
        }
    }
}

/// Extracts translation call sites from a source file.
///
/// Independent per file: safe to run for many files concurrently.
///
/// # Errors
/// Returns `AnalyzerError` when the file cannot be parsed or the query is unavailable.
pub fn extract_source(
    file: &SourceFile,
    options: &ExtractOptions,
) -> Result<FileExtraction, AnalyzerError> {
    let query = analyzer::query_loader::load_query(file.language).ok_or_else(|| {
        AnalyzerError::QueryExecution(format!("no extraction query for {:?}", file.language))
    })?;
    let language = file.language.tree_sitter_language();

    analyzer::extractor::analyze_file(&file.path, &file.text, &language, query, options)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;
    use crate::ir::Occurrence;

    #[rstest]
    fn extract_source_uses_settings() {
        let settings = I18nSettings {
            translation_functions: vec!["msg".to_string()],
            ..I18nSettings::default()
        };
        let file = SourceFile::new("a.tsx", r#"msg("a", "A"); t("b", "B");"#).unwrap();

        let result = extract_source(&file, &ExtractOptions::from(&settings)).unwrap();

        assert_that!(result.occurrences, elements_are![field!(Occurrence.key, eq("a"))]);
    }
}
