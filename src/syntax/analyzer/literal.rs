//! Static evaluation of JavaScript literals.

use std::collections::BTreeMap;

use tree_sitter::Node;

use crate::ir::{
    TranslationMeta,
    VariableMeta,
};

/// Reason a meta argument could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaLiteralError {
    /// The value is not a literal; carries its source text.
    NotLiteral(String),
    /// A property is computed, shorthand, spread or non-literal.
    Property(String),
    /// An object literal without `fallback`.
    MissingFallback,
}

/// Iterates named children, skipping comments.
fn named_children<'a>(node: Node<'a>) -> impl Iterator<Item = Node<'a>> {
    (0..node.named_child_count())
        .filter_map(move |i| node.named_child(i))
        .filter(|child| child.kind() != "comment")
}

/// Evaluates a string literal or substitution-free template string.
#[must_use]
pub fn string_value(node: Node<'_>, source: &[u8]) -> Option<String> {
    match node.kind() {
        "string" => {}
        "template_string" => {
            if named_children(node).any(|child| child.kind() == "template_substitution") {
                return None;
            }
        }
        _ => return None,
    }
    let raw = node.utf8_text(source).ok()?;
    let inner = raw.get(1..raw.len().checked_sub(1)?)?;
    Some(unescape(inner))
}

/// Decodes JavaScript escape sequences.
#[must_use]
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('v') => out.push('\u{b}'),
            Some('0') => out.push('\0'),
            Some('x') => {
                let hex: String = chars.by_ref().take(2).collect();
                push_code_point(&mut out, &hex, "\\x");
            }
            Some('u') => {
                let hex: String = if chars.peek() == Some(&'{') {
                    chars.next();
                    chars.by_ref().take_while(|c| *c != '}').collect()
                } else {
                    chars.by_ref().take(4).collect()
                };
                push_code_point(&mut out, &hex, "\\u");
            }
            // line continuation
            Some('\r') => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            Some('\n' | '\u{2028}' | '\u{2029}') => {}
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Decodes `hex` as a code point; invalid ones are kept as written.
fn push_code_point(out: &mut String, hex: &str, prefix: &str) {
    match u32::from_str_radix(hex, 16).ok().and_then(char::from_u32) {
        Some(c) => out.push(c),
        None => {
            out.push_str(prefix);
            out.push_str(hex);
        }
    }
}

/// Static property name of an object pair key.
fn property_name(key: Node<'_>, source: &[u8]) -> Option<String> {
    match key.kind() {
        "property_identifier" | "number" => key.utf8_text(source).ok().map(ToString::to_string),
        "string" => string_value(key, source),
        _ => None,
    }
}

/// Evaluates an object literal as `(name, value node)` pairs.
fn object_entries<'a>(
    object: Node<'a>,
    source: &[u8],
) -> Result<Vec<(String, Node<'a>)>, MetaLiteralError> {
    let mut entries = Vec::new();
    for child in named_children(object) {
        if child.kind() != "pair" {
            let text = child.utf8_text(source).unwrap_or_default();
            return Err(MetaLiteralError::Property(text.to_string()));
        }
        let (Some(key), Some(value)) =
            (child.child_by_field_name("key"), child.child_by_field_name("value"))
        else {
            return Err(MetaLiteralError::Property(
                child.utf8_text(source).unwrap_or_default().to_string(),
            ));
        };
        let Some(name) = property_name(key, source) else {
            return Err(MetaLiteralError::Property(
                key.utf8_text(source).unwrap_or_default().to_string(),
            ));
        };
        entries.push((name, value));
    }
    Ok(entries)
}

/// String literal value of property `name`.
fn string_property(name: &str, value: Node<'_>, source: &[u8]) -> Result<String, MetaLiteralError> {
    string_value(value, source).ok_or_else(|| MetaLiteralError::Property(name.to_string()))
}

/// Decodes a `variables` object literal.
fn variables_value(
    value: Node<'_>,
    source: &[u8],
) -> Result<BTreeMap<String, VariableMeta>, MetaLiteralError> {
    if value.kind() != "object" {
        return Err(MetaLiteralError::Property("variables".to_string()));
    }
    let mut variables = BTreeMap::new();
    for (name, variable) in object_entries(value, source)? {
        if variable.kind() != "object" {
            return Err(MetaLiteralError::Property(format!("variables.{name}")));
        }
        let mut meta = VariableMeta::default();
        for (field, field_value) in object_entries(variable, source)? {
            let path = format!("variables.{name}.{field}");
            match field.as_str() {
                "fallback" => meta.fallback = Some(string_property(&path, field_value, source)?),
                "description" => {
                    meta.description = Some(string_property(&path, field_value, source)?);
                }
                _ => {}
            }
        }
        variables.insert(name, meta);
    }
    Ok(variables)
}

/// Evaluates the metadata argument of a translation call.
///
/// Accepts a string literal (the fallback) or an object literal
/// `{ fallback, description?, variables? }`.
pub fn meta_value(node: Node<'_>, source: &[u8]) -> Result<TranslationMeta, MetaLiteralError> {
    if let Some(fallback) = string_value(node, source) {
        return Ok(TranslationMeta::new(fallback));
    }
    if node.kind() != "object" {
        let text = node.utf8_text(source).unwrap_or_default();
        return Err(MetaLiteralError::NotLiteral(text.to_string()));
    }

    let mut fallback = None;
    let mut meta = TranslationMeta::default();
    for (name, value) in object_entries(node, source)? {
        match name.as_str() {
            "fallback" => fallback = Some(string_property(&name, value, source)?),
            "description" => meta.description = Some(string_property(&name, value, source)?),
            "variables" => meta.variables = Some(variables_value(value, source)?),
            _ => tracing::debug!(property = %name, "Ignoring unknown metadata property"),
        }
    }
    meta.fallback = fallback.ok_or(MetaLiteralError::MissingFallback)?;
    Ok(meta)
}

/// First two non-comment arguments of an `arguments` node.
#[must_use]
pub fn leading_arguments(args: Node<'_>) -> (Option<Node<'_>>, Option<Node<'_>>) {
    let mut iter = named_children(args);
    (iter.next(), iter.next())
}
