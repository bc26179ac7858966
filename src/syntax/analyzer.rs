//! Tree-sitter based call-site analysis.

pub mod extractor;
pub mod literal;
pub mod query_loader;
pub mod types;
