//! Source file input definitions.

use std::path::Path;

/// A source file to extract translation call sites from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// File identifier as reported in `file:line` locations.
    pub path: String,
    /// Full file contents.
    pub text: String,
    /// Grammar chosen from the extension.
    pub language: ProgrammingLanguage,
}

impl SourceFile {
    /// Creates a source file, inferring the language from the extension.
    #[must_use]
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Option<Self> {
        let path = path.into();
        let language = ProgrammingLanguage::from_uri(&path)?;
        Some(Self { path, text: text.into(), language })
    }
}

/// Supported programming languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgrammingLanguage {
    /// `.js`, `.mjs`, `.cjs`
    JavaScript,
    /// `.jsx`
    Jsx,
    /// `.ts`, `.mts`, `.cts`
    TypeScript,
    /// `.tsx`
    Tsx,
}

impl ProgrammingLanguage {
    /// Infers the programming language from file extension.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        let file_path = Path::new(uri);
        match file_path.extension().and_then(|ext| ext.to_str()) {
            Some("tsx") => Some(Self::Tsx),
            Some("ts" | "mts" | "cts") => Some(Self::TypeScript),
            Some("jsx") => Some(Self::Jsx),
            Some("js" | "mjs" | "cjs") => Some(Self::JavaScript),
            _ => None,
        }
    }

    /// Tree-sitter grammar for this language.
    #[must_use]
    pub fn tree_sitter_language(&self) -> tree_sitter::Language {
        match self {
            Self::JavaScript | Self::Jsx => tree_sitter_javascript::LANGUAGE.into(),
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Self::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::expect_used, clippy::panic)]
mod tests {
    use rstest::*;

    use super::*;

    #[rstest]
    #[case::tsx("file.tsx", Some(ProgrammingLanguage::Tsx))]
    #[case::ts("file.ts", Some(ProgrammingLanguage::TypeScript))]
    #[case::mts("file.mts", Some(ProgrammingLanguage::TypeScript))]
    #[case::jsx("file.jsx", Some(ProgrammingLanguage::Jsx))]
    #[case::js("file.js", Some(ProgrammingLanguage::JavaScript))]
    #[case::mjs("file.mjs", Some(ProgrammingLanguage::JavaScript))]
    #[case::multiple_dots("file.config.ts", Some(ProgrammingLanguage::TypeScript))]
    #[case::json("file.json", None)]
    #[case::no_ext("file", None)]
    fn test_from_uri(#[case] uri: &str, #[case] expected: Option<ProgrammingLanguage>) {
        assert_eq!(ProgrammingLanguage::from_uri(uri), expected);
    }

    #[rstest]
    fn test_source_file_new() {
        assert!(SourceFile::new("a.ts", "").is_some());
        assert!(SourceFile::new("styles.css", "").is_none());
    }
}
