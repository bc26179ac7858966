//! Syntax tree of a parsed message template.

/// A whole message: declarations followed by a pattern or a `.match`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// `.input` and `.local` statements in source order.
    pub declarations: Vec<Declaration>,
    /// What the message renders.
    pub body: Body,
}

/// A named binding introduced before the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    /// `.input {$name :fn opts}` annotates an argument in place.
    Input {
        /// Variable name.
        name: String,
        /// Annotated reference to the argument.
        expression: Expression,
    },
    /// `.local $name = {expression}`
    Local {
        /// Variable name.
        name: String,
        /// Bound expression.
        expression: Expression,
    },
}

impl Declaration {
    /// Variable the declaration binds.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Input { name, .. } | Self::Local { name, .. } => name,
        }
    }
}

/// Message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// A single pattern.
    Pattern(Pattern),
    /// `.match` over one or more selectors.
    Match {
        /// Values the keys are matched against.
        selectors: Vec<Expression>,
        /// Branches in source order.
        variants: Vec<Variant>,
    },
}

/// Text, placeholders and markup in order.
pub type Pattern = Vec<PatternPart>;

/// One element of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternPart {
    /// Literal text with escapes resolved.
    Text(String),
    /// A `{...}` placeholder.
    Expression(Expression),
    /// A `{#tag}`, `{/tag}` or `{#tag/}` element.
    Markup(Markup),
}

/// One `.match` branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    /// One key per selector.
    pub keys: Vec<VariantKey>,
    /// Pattern rendered when the keys match.
    pub pattern: Pattern,
}

impl Variant {
    /// True when every key is `*`.
    #[must_use]
    pub fn is_catch_all(&self) -> bool {
        self.keys.iter().all(|key| matches!(key, VariantKey::CatchAll))
    }
}

/// A variant key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantKey {
    /// Matches a literal or plural category.
    Literal(String),
    /// `*`
    CatchAll,
}

/// Value position of an expression or option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// `$name`
    Variable(String),
    /// Quoted, unquoted or numeric literal.
    Literal(String),
}

impl Operand {
    /// Source form used when formatting fails: `$name` or `|literal|`.
    #[must_use]
    pub fn fallback_text(&self) -> String {
        match self {
            Self::Variable(name) => format!("${name}"),
            Self::Literal(value) => format!("|{}|", value.replace('\\', "\\\\").replace('|', "\\|")),
        }
    }
}

/// `name=value` pairs in source order.
pub type Options = Vec<(String, Operand)>;

/// `:function` annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionRef {
    /// Function name without the colon.
    pub name: String,
    /// Options passed to the function.
    pub options: Options,
}

/// Placeholder or selector expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expression {
    /// Value being formatted, if any.
    pub operand: Option<Operand>,
    /// Annotation, if any.
    pub function: Option<FunctionRef>,
}

impl Expression {
    /// Text shown in place of the expression when it cannot be formatted.
    #[must_use]
    pub fn fallback_text(&self) -> String {
        match (&self.operand, &self.function) {
            (Some(operand), _) => format!("{{{}}}", operand.fallback_text()),
            (None, Some(function)) => format!("{{:{}}}", function.name),
            (None, None) => "{\u{fffd}}".to_string(),
        }
    }
}

/// Shape of a markup element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupKind {
    /// `{#tag}`
    Open,
    /// `{/tag}`
    Close,
    /// `{#tag/}`
    Standalone,
}

/// Markup element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markup {
    /// Open, close or standalone.
    pub kind: MarkupKind,
    /// Tag name.
    pub name: String,
    /// Options on the tag.
    pub options: Options,
}
