//! Load the extraction query.

use std::sync::OnceLock;

use tree_sitter::Query;

use crate::input::source::ProgrammingLanguage;

/// Query shared by every grammar.
const EXTRACT_QUERY: &str = include_str!("../../../queries/extract.scm");

/// Compiled query for JavaScript and JSX.
static JS_QUERY_CACHE: OnceLock<Option<Query>> = OnceLock::new();
/// Compiled query for TypeScript.
static TS_QUERY_CACHE: OnceLock<Option<Query>> = OnceLock::new();
/// Compiled query for TSX.
static TSX_QUERY_CACHE: OnceLock<Option<Query>> = OnceLock::new();

/// Compiles the query for `language`, logging failures.
fn parse_query(language: ProgrammingLanguage) -> Option<Query> {
    let tree_sitter_lang = language.tree_sitter_language();
    Query::new(&tree_sitter_lang, EXTRACT_QUERY)
        .map_err(|e| tracing::error!(?language, "Failed to parse extraction query: {e:?}"))
        .ok()
}

/// Loads the cached extraction query for a language. Parsed once per language.
#[must_use]
pub fn load_query(language: ProgrammingLanguage) -> Option<&'static Query> {
    let cache = match language {
        ProgrammingLanguage::JavaScript | ProgrammingLanguage::Jsx => &JS_QUERY_CACHE,
        ProgrammingLanguage::TypeScript => &TS_QUERY_CACHE,
        ProgrammingLanguage::Tsx => &TSX_QUERY_CACHE,
    };
    cache.get_or_init(|| parse_query(language)).as_ref()
}
