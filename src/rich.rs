//! Turns formatted message parts with markup into a tree of UI nodes.
//!
//! Tags with a registered handler are replaced by the node the handler
//! builds from their children. Tags without one pass their children through.

use std::collections::HashMap;
use std::fmt;

use crate::message::MessagePart;

/// Node kinds the UI layer distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Rendered in lists; needs a stable identity key.
    Element,
    /// Grouping node without its own identity.
    Fragment,
}

/// Capability interface for nodes produced by tag handlers.
pub trait RenderNode {
    /// Which kind of node this is.
    fn kind(&self) -> NodeKind;
    /// Identity key, if one was assigned.
    fn key(&self) -> Option<&str>;
    /// Assigns an identity key.
    fn set_key(&mut self, key: String);
}

/// A rendered child: plain text or a handler-built node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RichChild<N> {
    /// Literal text.
    Text(String),
    /// Node built by a tag handler.
    Node(N),
}

impl<N> RichChild<N> {
    /// The text, for text children.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Node(_) => None,
        }
    }
}

/// Default node type: a named element wrapping its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Tag name.
    pub tag: String,
    /// Identity key for list rendering.
    pub key: Option<String>,
    /// Rendered children.
    pub children: Vec<RichChild<Self>>,
}

impl Element {
    /// Keyless element.
    #[must_use]
    pub fn new(tag: impl Into<String>, children: Vec<RichChild<Self>>) -> Self {
        Self { tag: tag.into(), key: None, children }
    }

    /// Concatenated text of the subtree.
    #[must_use]
    pub fn text(&self) -> String {
        self.children
            .iter()
            .map(|child| match child {
                RichChild::Text(text) => text.clone(),
                RichChild::Node(node) => node.text(),
            })
            .collect()
    }
}

impl RenderNode for Element {
    fn kind(&self) -> NodeKind {
        NodeKind::Element
    }

    fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    fn set_key(&mut self, key: String) {
        self.key = Some(key);
    }
}

/// Builds a node from rendered children.
type Handler<'a, N> = Box<dyn Fn(Vec<RichChild<N>>) -> N + Send + Sync + 'a>;

/// Tag name → node builder.
pub struct TagHandlers<'a, N> {
    /// Registered handlers by tag name.
    handlers: HashMap<String, Handler<'a, N>>,
}

impl<N> Default for TagHandlers<'_, N> {
    fn default() -> Self {
        Self { handlers: HashMap::new() }
    }
}

impl<N> fmt::Debug for TagHandlers<'_, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        tags.sort_unstable();
        f.debug_struct("TagHandlers").field("tags", &tags).finish()
    }
}

impl<'a, N> TagHandlers<'a, N> {
    /// No handlers: every tag passes through.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `tag`.
    #[must_use]
    pub fn with<F>(mut self, tag: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Vec<RichChild<N>>) -> N + Send + Sync + 'a,
    {
        self.handlers.insert(tag.into(), Box::new(handler));
        self
    }

    /// Builds the node for `tag`, or hands the children back when no handler is registered.
    fn call(&self, tag: &str, children: Vec<RichChild<N>>) -> Result<N, Vec<RichChild<N>>> {
        match self.handlers.get(tag) {
            Some(handler) => Ok(handler(children)),
            None => Err(children),
        }
    }
}

/// An open tag still collecting children.
struct Frame<N> {
    /// Name of the open tag.
    tag: String,
    /// Children collected so far.
    children: Vec<RichChild<N>>,
}

/// Children list of the innermost open tag, or the root.
fn current<'s, N>(root: &'s mut Vec<RichChild<N>>, stack: &'s mut [Frame<N>]) -> &'s mut Vec<RichChild<N>> {
    match stack.last_mut() {
        Some(frame) => &mut frame.children,
        None => root,
    }
}

/// Appends `node`, keying keyless elements by position.
fn push_node<N: RenderNode>(target: &mut Vec<RichChild<N>>, mut node: N) {
    if node.kind() == NodeKind::Element && node.key().is_none() {
        node.set_key(format!("i18n-{}", target.len()));
    }
    target.push(RichChild::Node(node));
}

/// Renders parts into children of an implicit root.
///
/// Unterminated tags are flattened into their parent; a close tag with no
/// matching open tag is dropped.
pub fn render<N: RenderNode>(parts: &[MessagePart], handlers: &TagHandlers<'_, N>) -> Vec<RichChild<N>> {
    let mut root = Vec::new();
    let mut stack: Vec<Frame<N>> = Vec::new();

    for part in parts {
        match part {
            MessagePart::Text(text) | MessagePart::Value(text) => {
                current(&mut root, &mut stack).push(RichChild::Text(text.clone()));
            }
            MessagePart::MarkupOpen { name, .. } => {
                stack.push(Frame { tag: name.clone(), children: Vec::new() });
            }
            MessagePart::MarkupClose { name } => {
                let Some(depth) = stack.iter().rposition(|frame| frame.tag == *name) else {
                    tracing::debug!(tag = %name, "Dropping close tag without open tag");
                    continue;
                };
                while stack.len() > depth + 1 {
                    if let Some(unclosed) = stack.pop() {
                        current(&mut root, &mut stack).extend(unclosed.children);
                    }
                }
                if let Some(frame) = stack.pop() {
                    let target = current(&mut root, &mut stack);
                    match handlers.call(&frame.tag, frame.children) {
                        Ok(node) => push_node(target, node),
                        Err(children) => target.extend(children),
                    }
                }
            }
            MessagePart::MarkupStandalone { name, .. } => {
                if let Ok(node) = handlers.call(name, Vec::new()) {
                    push_node(current(&mut root, &mut stack), node);
                }
            }
        }
    }

    while let Some(unclosed) = stack.pop() {
        current(&mut root, &mut stack).extend(unclosed.children);
    }
    root
}
