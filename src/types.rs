//! Core types used throughout the project.

use std::fmt;

use serde::{
    Deserialize,
    Serialize,
};

/// A call-site location: source file plus 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Workspace-relative file id.
    pub file: String,
    /// 1-based line.
    pub line: u32,
}

impl SourceLocation {
    /// Location at `file:line`.
    #[must_use]
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self { file: file.into(), line }
    }

    /// Builds a location from a tree-sitter node, converting the 0-indexed row.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_node(file: impl Into<String>, node: &tree_sitter::Node<'_>) -> Self {
        Self::new(file, node.start_position().row as u32 + 1)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::relative("src/a.ts", 10, "src/a.ts:10")]
    #[case::first_line("b.tsx", 1, "b.tsx:1")]
    #[case::absolute("/abs/c.js", 120, "/abs/c.js:120")]
    fn test_display(#[case] file: &str, #[case] line: u32, #[case] expected: &str) {
        assert_that!(SourceLocation::new(file, line).to_string(), eq(expected));
    }

    #[rstest]
    fn test_from_node_is_one_based() {
        let mut parser = tree_sitter::Parser::new();
        parser.set_language(&tree_sitter_javascript::LANGUAGE.into()).unwrap();
        let tree = parser.parse("\n\nfoo();", None).unwrap();
        let call = tree.root_node().named_child(0).unwrap();

        assert_that!(SourceLocation::from_node("x.js", &call).line, eq(3));
    }
}
