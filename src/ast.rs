use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::Language;
use crate::error::Diagnostic;
use crate::html::TEXT_TAG;
use crate::line_map::{Cursor, LineMap};
pub use crate::parser::attributes::{AttrValue, Attributes};
pub use crate::parser::tokenizer::{Position, Span};
use crate::style::StyleMap;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Node identifier, unique for the lifetime of the process.
///
/// Ids are handed out by a global counter, so two parses of the same text
/// never share ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    pub fn next() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeKind {
    Element,
    Text,
}

/// Tree node
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind")]
pub enum Node {
    Element(ElementNode),
    Text(TextNode),
}

/// Element with attributes, resolved style and children
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementNode {
    pub id: NodeId,
    /// Normalized tag: lowercase, aliases applied
    pub tag: String,
    pub attributes: Attributes,
    pub style: StyleMap,
    pub children: Vec<Node>,
    pub source_start_line: usize,
    pub source_end_line: usize,
    /// False when the closing tag was never found or the open tag lacked `>`
    pub is_complete: bool,
    pub is_self_closing: bool,
    /// Span of the opening tag
    #[serde(skip)]
    pub span: Span,
}

/// Text content (trimmed)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextNode {
    pub id: NodeId,
    pub content: String,
    pub source_start_line: usize,
    pub source_end_line: usize,
    #[serde(skip)]
    pub span: Span,
}

impl Node {
    pub fn id(&self) -> NodeId {
        match self {
            Node::Element(el) => el.id,
            Node::Text(text) => text.id,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Element(_) => NodeKind::Element,
            Node::Text(_) => NodeKind::Text,
        }
    }

    /// Normalized tag; text nodes report `#text`.
    pub fn tag(&self) -> &str {
        match self {
            Node::Element(el) => &el.tag,
            Node::Text(_) => TEXT_TAG,
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Element(el) => &el.children,
            Node::Text(_) => &[],
        }
    }

    /// Inclusive source line range
    pub fn source_lines(&self) -> (usize, usize) {
        match self {
            Node::Element(el) => (el.source_start_line, el.source_end_line),
            Node::Text(text) => (text.source_start_line, text.source_end_line),
        }
    }

    pub fn as_element(&self) -> Option<&ElementNode> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextNode> {
        match self {
            Node::Text(text) => Some(text),
            Node::Element(_) => None,
        }
    }
}

impl ElementNode {
    /// String value of an attribute (boolean attributes have none)
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(AttrValue::as_str)
    }
}

/// Find a node by id, depth-first.
pub fn find(nodes: &[Node], id: NodeId) -> Option<&Node> {
    let mut stack = vec![nodes.iter()];
    while let Some(level) = stack.last_mut() {
        match level.next() {
            Some(node) if node.id() == id => return Some(node),
            Some(node) => stack.push(node.children().iter()),
            None => {
                stack.pop();
            }
        }
    }
    None
}

/// Visit every node depth-first in document order.
pub fn walk<'a>(nodes: &'a [Node], f: &mut dyn FnMut(&'a Node)) {
    let mut stack = vec![nodes.iter()];
    while let Some(level) = stack.last_mut() {
        match level.next() {
            Some(node) => {
                f(node);
                stack.push(node.children().iter());
            }
            None => {
                stack.pop();
            }
        }
    }
}

/// Result of one parse: the forest, its line map and any diagnostics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub language: Language,
    pub nodes: Vec<Node>,
    pub line_map: LineMap,
    pub diagnostics: Vec<Diagnostic>,
    #[serde(skip)]
    pub source: Arc<str>,
}

impl Document {
    pub fn find(&self, id: NodeId) -> Option<&Node> {
        find(&self.nodes, id)
    }

    /// Node whose opening tag is at, or nearest above, the cursor line.
    pub fn node_at(&self, cursor: Cursor) -> Option<&Node> {
        self.line_map.node_at(cursor).and_then(|id| self.find(id))
    }

    /// Overlay class declarations from `css` onto this document's nodes.
    pub fn with_stylesheet(mut self, css: &str) -> Self {
        self.nodes = crate::css::resolve(self.nodes, css);
        self
    }

    pub fn outline(&self) -> String {
        outline(&self.nodes)
    }
}

/// Render a tree as indented text, one node per line. Ids are left out so
/// the output is stable across parses.
///
/// ```text
/// <div> lines 1-3 style {color: red}
///   <button className="btn"> lines 2-2
///     "Click" lines 2-2
/// ```
pub fn outline(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_outline(node, 0, &mut out);
    }
    out
}

fn write_outline(node: &Node, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    match node {
        Node::Element(el) => {
            out.push_str(&indent);
            out.push('<');
            out.push_str(&el.tag);
            for (name, value) in &el.attributes {
                match value {
                    AttrValue::Text(v) => out.push_str(&format!(" {}=\"{}\"", name, v)),
                    AttrValue::Flag(true) => out.push_str(&format!(" {}", name)),
                    AttrValue::Flag(false) => out.push_str(&format!(" {}={{false}}", name)),
                }
            }
            out.push_str(if el.is_self_closing { " />" } else { ">" });
            out.push_str(&format!(" lines {}-{}", el.source_start_line, el.source_end_line));
            if !el.is_complete {
                out.push_str(" incomplete");
            }
            if !el.style.is_empty() {
                let decls: Vec<String> = el
                    .style
                    .iter()
                    .map(|(prop, value)| format!("{}: {}", prop, value))
                    .collect();
                out.push_str(&format!(" style {{{}}}", decls.join("; ")));
            }
            out.push('\n');
            for child in &el.children {
                write_outline(child, depth + 1, out);
            }
        }
        Node::Text(text) => {
            out.push_str(&format!(
                "{}{:?} lines {}-{}\n",
                indent, text.content, text.source_start_line, text.source_end_line
            ));
        }
    }
}
