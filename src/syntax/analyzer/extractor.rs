//! Extracts translation calls from a source file using Tree-sitter.

use tree_sitter::{
    Language,
    Node,
    Parser,
    Query,
    QueryCursor,
    StreamingIterator,
};

use super::literal::{
    MetaLiteralError,
    leading_arguments,
    meta_value,
    string_value,
};
use super::types::{
    AnalyzerError,
    CaptureName,
    DiagnosticKind,
    ExtractionDiagnostic,
    FileExtraction,
};
use crate::ir::{
    Occurrence,
    TranslationMeta,
};
use crate::types::SourceLocation;

/// Which calls and imports count as translation usage.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Callee names such as `t` or `i18n.t`.
    pub translation_functions: Vec<String>,
    /// Import sources marking a module as translating; empty accepts every file.
    pub module_specifiers: Vec<String>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self { translation_functions: vec!["t".to_string()], module_specifiers: Vec::new() }
    }
}

/// Callee text with whitespace removed, so `i18n . t` compares as `i18n.t`.
fn callee_name(node: Node<'_>, source_bytes: &[u8]) -> Option<String> {
    let text = node.utf8_text(source_bytes).ok()?;
    Some(text.chars().filter(|c| !c.is_whitespace()).collect())
}

/// One call capture before it is turned into an occurrence.
struct CallCapture<'a> {
    /// The whole call expression.
    call: Node<'a>,
    /// Callee, e.g. `t` or `i18n.t`.
    callee: Option<Node<'a>>,
    /// Argument list.
    args: Option<Node<'a>>,
}

/// Extracts translation call sites and imports from source text.
///
/// # Errors
/// Returns `AnalyzerError` if:
/// - Language setup fails
/// - Source code parsing fails
pub fn analyze_file(
    file: &str,
    source: &str,
    language: &Language,
    query: &Query,
    options: &ExtractOptions,
) -> Result<FileExtraction, AnalyzerError> {
    let mut parser = Parser::new();
    parser.set_language(language).map_err(AnalyzerError::LanguageSetup)?;
    let tree = parser.parse(source, None).ok_or(AnalyzerError::ParseFailed)?;

    let source_bytes = source.as_bytes();
    let root_node = tree.root_node();
    let cap_names = query.capture_names();

    let mut calls: Vec<CallCapture<'_>> = Vec::new();
    let mut imports = Vec::new();

    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, root_node, source_bytes);
    while let Some(match_) = matches.next() {
        let mut call = None;
        let mut callee = None;
        let mut args = None;
        for capture in match_.captures {
            let Some(cap_name) = cap_names.get(capture.index as usize) else {
                continue;
            };
            let Ok(capture_name) = cap_name.parse::<CaptureName>() else {
                continue;
            };
            match capture_name {
                CaptureName::Call => call = Some(capture.node),
                CaptureName::CallFnName => callee = Some(capture.node),
                CaptureName::CallArgs => args = Some(capture.node),
                CaptureName::ImportSource => {
                    if let Some(specifier) = string_value(capture.node, source_bytes) {
                        imports.push(specifier);
                    }
                }
            }
        }
        if let Some(call) = call {
            calls.push(CallCapture { call, callee, args });
        }
    }

    calls.sort_by_key(|capture| capture.call.start_byte());

    let mut result = FileExtraction { file: file.to_string(), ..FileExtraction::default() };
    for capture in calls {
        let (Some(callee), Some(args)) = (capture.callee, capture.args) else {
            continue;
        };
        let Some(name) = callee_name(callee, source_bytes) else {
            continue;
        };

        // CommonJS `require("@app/i18n")` counts as an import
        if name == "require" {
            if let (Some(first), _) = leading_arguments(args)
                && let Some(specifier) = string_value(first, source_bytes)
            {
                imports.push(specifier);
            }
            continue;
        }

        if !options.translation_functions.contains(&name) {
            continue;
        }

        let (Some(key_node), meta_node) = leading_arguments(args) else {
            continue;
        };
        // t(someVar), t(`a.${b}`) etc. are not static keys
        let Some(key) = string_value(key_node, source_bytes) else {
            continue;
        };

        let location = SourceLocation::from_node(file, &capture.call);
        let meta = match meta_node {
            None => {
                result.diagnostics.push(ExtractionDiagnostic {
                    location: location.clone(),
                    key: key.clone(),
                    kind: DiagnosticKind::MissingMeta,
                });
                TranslationMeta::default()
            }
            Some(node) => meta_value(node, source_bytes).unwrap_or_else(|error| {
                let kind = match error {
                    MetaLiteralError::NotLiteral(source) => DiagnosticKind::NonLiteralMeta { source },
                    MetaLiteralError::Property(property) => {
                        DiagnosticKind::NonLiteralProperty { property }
                    }
                    MetaLiteralError::MissingFallback => DiagnosticKind::MissingFallback,
                };
                result.diagnostics.push(ExtractionDiagnostic {
                    location: location.clone(),
                    key: key.clone(),
                    kind,
                });
                TranslationMeta::default()
            }),
        };

        result.occurrences.push(Occurrence::new(key, meta, file, location.line));
    }

    for diagnostic in &result.diagnostics {
        tracing::warn!(file, "{diagnostic}");
    }

    result.uses_translations = !result.occurrences.is_empty()
        || imports.iter().any(|specifier| options.module_specifiers.contains(specifier));
    result.imports = imports;

    Ok(result)
}
