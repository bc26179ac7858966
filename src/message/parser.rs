//! Recursive-descent parser for message templates.
//!
//! Supports simple messages (text with `{...}` placeholders), complex
//! messages with `.input`, `.local` and `.match`, quoted patterns `{{...}}`,
//! `\` escapes and markup placeholders.

use thiserror::Error;

use super::ast::{
    Body,
    Declaration,
    Expression,
    FunctionRef,
    Markup,
    MarkupKind,
    Message,
    Operand,
    Options,
    Pattern,
    PatternPart,
    Variant,
    VariantKey,
};

/// What went wrong while parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Input ended inside a construct.
    #[error("unexpected end of message")]
    UnexpectedEnd,
    /// A character that cannot appear here.
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    /// A required token is missing.
    #[error("expected {0}")]
    Expected(&'static str),
    /// Backslash before a character that needs no escape.
    #[error("invalid escape sequence '\\{0}'")]
    InvalidEscape(char),
    /// A variable is declared more than once.
    #[error("'${0}' is declared twice")]
    DuplicateDeclaration(String),
    /// Statement other than `.input`, `.local` or `.match`.
    #[error("unknown statement '.{0}'")]
    UnknownStatement(String),
    /// `.match` without selectors.
    #[error(".match needs at least one selector")]
    MissingSelector,
    /// Variant key count differs from the selector count.
    #[error("variant has {found} keys for {expected} selectors")]
    KeyCountMismatch {
        /// Selector count.
        expected: usize,
        /// Keys on the variant.
        found: usize,
    },
    /// `.match` without a `*` variant.
    #[error(".match has no catch-all variant")]
    MissingCatchAll,
}

/// Syntax error with its position.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} at offset {offset}")]
pub struct ParseError {
    /// Byte offset into the template.
    pub offset: usize,
    /// What went wrong.
    pub kind: ParseErrorKind,
}

/// Parses a template into a `Message`.
///
/// # Errors
/// Returns the first syntax error with its byte offset.
pub fn parse(source: &str) -> Result<Message, ParseError> {
    Parser { source, pos: 0 }.parse_message()
}

/// First character of a name.
fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

/// Later characters of a name.
fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '_' | '.')
}

/// Characters of an unquoted literal.
fn is_unquoted_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '+')
}

/// Cursor over a template.
struct Parser<'a> {
    /// Template text.
    source: &'a str,
    /// Byte offset of the cursor.
    pos: usize,
}

impl Parser<'_> {
    /// Unparsed input.
    fn rest(&self) -> &str {
        self.source.get(self.pos..).unwrap_or_default()
    }

    /// Next character.
    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Consumes the next character.
    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// True when the unparsed input starts with `prefix`.
    fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }

    /// Consumes `expected` if it is next.
    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    /// Skips whitespace.
    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    /// Error at the cursor.
    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError { offset: self.pos, kind }
    }

    /// Error for whatever is at the cursor.
    fn unexpected(&self) -> ParseError {
        match self.peek() {
            Some(c) => self.error(ParseErrorKind::UnexpectedChar(c)),
            None => self.error(ParseErrorKind::UnexpectedEnd),
        }
    }

    /// Consumes `expected` or fails.
    fn expect(&mut self, expected: char) -> Result<(), ParseError> {
        if self.eat(expected) { Ok(()) } else { Err(self.unexpected()) }
    }

    /// Fails unless all input was consumed.
    fn expect_end(&self) -> Result<(), ParseError> {
        if self.peek().is_none() { Ok(()) } else { Err(self.unexpected()) }
    }

    /// Simple or complex message.
    fn parse_message(mut self) -> Result<Message, ParseError> {
        let trimmed = self.source.trim_start();
        if !(trimmed.starts_with('.') || trimmed.starts_with("{{")) {
            let pattern = self.parse_pattern(false)?;
            return Ok(Message { declarations: Vec::new(), body: Body::Pattern(pattern) });
        }

        let mut declarations: Vec<Declaration> = Vec::new();
        loop {
            self.skip_ws();
            if self.starts_with("{{") {
                let pattern = self.parse_quoted_pattern()?;
                self.skip_ws();
                self.expect_end()?;
                return Ok(Message { declarations, body: Body::Pattern(pattern) });
            }

            let keyword_start = self.pos;
            self.expect('.')?;
            let keyword = self.parse_name()?;
            let declaration = match keyword.as_str() {
                "input" => {
                    self.skip_ws();
                    self.expect('{')?;
                    let expression = self.parse_expression_body()?;
                    let Some(Operand::Variable(name)) = expression.operand.clone() else {
                        return Err(ParseError {
                            offset: keyword_start,
                            kind: ParseErrorKind::Expected("a variable in .input"),
                        });
                    };
                    Declaration::Input { name, expression }
                }
                "local" => {
                    self.skip_ws();
                    self.expect('$')?;
                    let name = self.parse_name()?;
                    self.skip_ws();
                    self.expect('=')?;
                    self.skip_ws();
                    self.expect('{')?;
                    let expression = self.parse_expression_body()?;
                    Declaration::Local { name, expression }
                }
                "match" => {
                    let body = self.parse_match()?;
                    self.skip_ws();
                    self.expect_end()?;
                    return Ok(Message { declarations, body });
                }
                _ => {
                    return Err(ParseError {
                        offset: keyword_start,
                        kind: ParseErrorKind::UnknownStatement(keyword),
                    });
                }
            };

            if declarations.iter().any(|existing| existing.name() == declaration.name()) {
                return Err(ParseError {
                    offset: keyword_start,
                    kind: ParseErrorKind::DuplicateDeclaration(declaration.name().to_string()),
                });
            }
            declarations.push(declaration);
        }
    }

    /// `.match` selectors and variants.
    fn parse_match(&mut self) -> Result<Body, ParseError> {
        let mut selectors = Vec::new();
        loop {
            self.skip_ws();
            if self.eat('$') {
                let name = self.parse_name()?;
                selectors.push(Expression { operand: Some(Operand::Variable(name)), function: None });
            } else if self.peek() == Some('{') && !self.starts_with("{{") {
                self.bump();
                selectors.push(self.parse_expression_body()?);
            } else {
                break;
            }
        }
        if selectors.is_empty() {
            return Err(self.error(ParseErrorKind::MissingSelector));
        }

        let mut variants: Vec<Variant> = Vec::new();
        loop {
            self.skip_ws();
            if self.peek().is_none() {
                break;
            }
            let variant_start = self.pos;
            let mut keys = Vec::new();
            loop {
                self.skip_ws();
                if self.starts_with("{{") {
                    break;
                }
                let key = match self.peek() {
                    Some('*') => {
                        self.bump();
                        VariantKey::CatchAll
                    }
                    Some('|') => VariantKey::Literal(self.parse_quoted_literal()?),
                    Some(c) if is_unquoted_char(c) => VariantKey::Literal(self.parse_unquoted_literal()),
                    _ => return Err(self.unexpected()),
                };
                keys.push(key);
            }
            if keys.len() != selectors.len() {
                return Err(ParseError {
                    offset: variant_start,
                    kind: ParseErrorKind::KeyCountMismatch {
                        expected: selectors.len(),
                        found: keys.len(),
                    },
                });
            }
            let pattern = self.parse_quoted_pattern()?;
            variants.push(Variant { keys, pattern });
        }

        if !variants.iter().any(Variant::is_catch_all) {
            return Err(self.error(ParseErrorKind::MissingCatchAll));
        }
        Ok(Body::Match { selectors, variants })
    }

    /// `{{...}}`
    fn parse_quoted_pattern(&mut self) -> Result<Pattern, ParseError> {
        self.expect('{')?;
        self.expect('{')?;
        let pattern = self.parse_pattern(true)?;
        self.expect('}')?;
        self.expect('}')?;
        Ok(pattern)
    }

    /// Reads text and placeholders. A quoted pattern stops before its closing `}`.
    fn parse_pattern(&mut self, quoted: bool) -> Result<Pattern, ParseError> {
        let mut parts = Vec::new();
        let mut text = String::new();
        loop {
            match self.peek() {
                None if quoted => return Err(self.error(ParseErrorKind::UnexpectedEnd)),
                None => break,
                Some('}') if quoted => break,
                Some('}') => return Err(self.unexpected()),
                Some('\\') => {
                    self.bump();
                    text.push(self.parse_escape()?);
                }
                Some('{') => {
                    self.bump();
                    if !text.is_empty() {
                        parts.push(PatternPart::Text(std::mem::take(&mut text)));
                    }
                    parts.push(self.parse_placeholder()?);
                }
                Some(c) => {
                    self.bump();
                    text.push(c);
                }
            }
        }
        if !text.is_empty() {
            parts.push(PatternPart::Text(text));
        }
        Ok(parts)
    }

    /// Character after a backslash.
    fn parse_escape(&mut self) -> Result<char, ParseError> {
        match self.peek() {
            Some(c @ ('\\' | '{' | '}' | '|')) => {
                self.bump();
                Ok(c)
            }
            Some(c) => Err(self.error(ParseErrorKind::InvalidEscape(c))),
            None => Err(self.error(ParseErrorKind::UnexpectedEnd)),
        }
    }

    /// After `{`: markup or an expression.
    fn parse_placeholder(&mut self) -> Result<PatternPart, ParseError> {
        self.skip_ws();
        let kind = if self.eat('#') {
            MarkupKind::Open
        } else if self.eat('/') {
            MarkupKind::Close
        } else {
            return self.parse_expression_body().map(PatternPart::Expression);
        };

        let name = self.parse_identifier()?;
        let options = self.parse_options()?;
        self.skip_attributes()?;
        self.skip_ws();
        let kind = if kind == MarkupKind::Open && self.eat('/') { MarkupKind::Standalone } else { kind };
        self.expect('}')?;
        Ok(PatternPart::Markup(Markup { kind, name, options }))
    }

    /// After `{`: `operand? (:function options)? attributes }`.
    fn parse_expression_body(&mut self) -> Result<Expression, ParseError> {
        self.skip_ws();
        let operand = match self.peek() {
            Some('$') => {
                self.bump();
                Some(Operand::Variable(self.parse_name()?))
            }
            Some('|') => Some(Operand::Literal(self.parse_quoted_literal()?)),
            Some(c) if is_unquoted_char(c) => Some(Operand::Literal(self.parse_unquoted_literal())),
            _ => None,
        };
        self.skip_ws();

        let function = if self.eat(':') {
            let name = self.parse_identifier()?;
            let options = self.parse_options()?;
            Some(FunctionRef { name, options })
        } else {
            None
        };
        if operand.is_none() && function.is_none() {
            return Err(self.error(ParseErrorKind::Expected("an expression")));
        }

        self.skip_attributes()?;
        self.skip_ws();
        self.expect('}')?;
        Ok(Expression { operand, function })
    }

    /// Options after a function name.
    fn parse_options(&mut self) -> Result<Options, ParseError> {
        let mut options = Vec::new();
        loop {
            self.skip_ws();
            if !self.peek().is_some_and(is_name_start) {
                return Ok(options);
            }
            let name = self.parse_identifier()?;
            self.skip_ws();
            self.expect('=')?;
            self.skip_ws();
            let value = self.parse_value()?;
            options.push((name, value));
        }
    }

    /// `@name` or `@name=literal`; accepted and discarded.
    fn skip_attributes(&mut self) -> Result<(), ParseError> {
        loop {
            self.skip_ws();
            if !self.eat('@') {
                return Ok(());
            }
            self.parse_identifier()?;
            self.skip_ws();
            if self.eat('=') {
                self.skip_ws();
                self.parse_value()?;
            }
        }
    }

    /// Variable or literal operand.
    fn parse_value(&mut self) -> Result<Operand, ParseError> {
        match self.peek() {
            Some('$') => {
                self.bump();
                Ok(Operand::Variable(self.parse_name()?))
            }
            Some('|') => Ok(Operand::Literal(self.parse_quoted_literal()?)),
            Some(c) if is_unquoted_char(c) => Ok(Operand::Literal(self.parse_unquoted_literal())),
            _ => Err(self.error(ParseErrorKind::Expected("an option value"))),
        }
    }

    /// Name of a variable, function, option or tag.
    fn parse_name(&mut self) -> Result<String, ParseError> {
        if !self.peek().is_some_and(is_name_start) {
            return Err(self.error(ParseErrorKind::Expected("a name")));
        }
        let mut name = String::new();
        while let Some(c) = self.peek().filter(|c| is_name_char(*c)) {
            self.bump();
            name.push(c);
        }
        Ok(name)
    }

    /// `name` or `namespace:name`.
    fn parse_identifier(&mut self) -> Result<String, ParseError> {
        let mut identifier = self.parse_name()?;
        if self.peek() == Some(':') && self.rest().chars().nth(1).is_some_and(is_name_start) {
            self.bump();
            identifier.push(':');
            identifier.push_str(&self.parse_name()?);
        }
        Ok(identifier)
    }

    /// Unquoted literal, possibly empty.
    fn parse_unquoted_literal(&mut self) -> String {
        let mut literal = String::new();
        while let Some(c) = self.peek().filter(|c| is_unquoted_char(*c)) {
            self.bump();
            literal.push(c);
        }
        literal
    }

    /// `|...|` literal.
    fn parse_quoted_literal(&mut self) -> Result<String, ParseError> {
        self.expect('|')?;
        let mut literal = String::new();
        loop {
            match self.bump() {
                Some('|') => return Ok(literal),
                Some('\\') => literal.push(self.parse_escape()?),
                Some(c) => literal.push(c),
                None => return Err(self.error(ParseErrorKind::UnexpectedEnd)),
            }
        }
    }
}
