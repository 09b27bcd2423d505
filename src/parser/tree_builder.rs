use super::attributes::parse_attributes;
use super::tokenizer::{Span, Token};
use crate::ast::{ElementNode, Node, NodeId, TextNode};
use crate::error::{Diagnostic, DiagnosticKind};
use crate::html;
use crate::line_map::LineMap;
use crate::style::{self, StyleMap};
use log::{debug, trace};

/// Deepest element nesting the builder creates. Open tags beyond it are
/// attached as childless siblings at the deepest level.
pub const MAX_NESTING_DEPTH: usize = 512;

/// Output of one build: forest, line map and diagnostics
#[derive(Debug, Clone, Default)]
pub struct BuildOutput {
    pub nodes: Vec<Node>,
    pub line_map: LineMap,
    pub diagnostics: Vec<Diagnostic>,
}

/// An element waiting for its close tag
struct OpenElement {
    /// Lowercased raw tag; closes pair on this, not on the aliased tag
    name: String,
    element: ElementNode,
}

/// Builds a node forest from a token stream.
///
/// Never fails: unmatched closes are dropped, unclosed elements are
/// finalized at end of input, and each case is recorded as a diagnostic.
pub struct TreeBuilder {
    tokens: Vec<Token>,
    class_heuristics: bool,
    /// Open elements, innermost last
    stack: Vec<OpenElement>,
    forest: Vec<Node>,
    line_map: LineMap,
    diagnostics: Vec<Diagnostic>,
    /// Set once the nesting cap has been reported
    too_deep: bool,
}

impl TreeBuilder {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            class_heuristics: true,
            stack: Vec::new(),
            forest: Vec::new(),
            line_map: LineMap::new(),
            diagnostics: Vec::new(),
            too_deep: false,
        }
    }

    /// Toggle the utility-class style heuristics (on by default).
    pub fn with_class_heuristics(mut self, enabled: bool) -> Self {
        self.class_heuristics = enabled;
        self
    }

    pub fn build(mut self) -> BuildOutput {
        let tokens = std::mem::take(&mut self.tokens);
        let max_line = tokens
            .iter()
            .map(|t| t.span().end.line)
            .max()
            .unwrap_or(1);

        for token in tokens {
            match token {
                Token::Text { text, span } => {
                    let node = Node::Text(TextNode {
                        id: NodeId::next(),
                        content: text.trim().to_string(),
                        source_start_line: span.start.line,
                        source_end_line: span.end.line,
                        span,
                    });
                    self.attach(node);
                }

                Token::Open {
                    tag,
                    raw_attributes,
                    well_formed,
                    span,
                } => {
                    let mut element = self.create_element(&tag, &raw_attributes, span);

                    if !well_formed {
                        self.diagnostics.push(
                            Diagnostic::new(
                                DiagnosticKind::UnterminatedTag,
                                format!("<{}> is missing its closing '>'.", tag),
                                span,
                            )
                            .with_help(format!("End the tag with '>' or '/>': <{} ...>", tag)),
                        );
                    }

                    if well_formed && html::is_void_element(&tag) {
                        // Void elements never take children
                        element.is_self_closing = true;
                        element.is_complete = true;
                        self.attach(Node::Element(element));
                    } else if self.stack.len() >= MAX_NESTING_DEPTH {
                        self.flatten(element);
                    } else {
                        self.stack.push(OpenElement {
                            name: html::element_name(&tag),
                            element,
                        });
                    }
                }

                Token::SelfClose {
                    tag,
                    raw_attributes,
                    span,
                } => {
                    let mut element = self.create_element(&tag, &raw_attributes, span);
                    element.is_self_closing = true;
                    element.is_complete = true;
                    self.attach(Node::Element(element));
                }

                Token::Close {
                    tag,
                    well_formed,
                    span,
                } => self.close(&tag, well_formed, span),
            }
        }

        // End of input: whatever is still open stays incomplete
        while let Some(OpenElement { mut element, .. }) = self.stack.pop() {
            element.source_end_line = max_line.max(element.source_start_line);
            element.is_complete = false;
            self.diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::UnclosedElement,
                    format!("<{}> is never closed.", element.tag),
                    element.span,
                )
                .with_help(format!("Add </{}> to close it.", element.tag)),
            );
            self.attach(Node::Element(element));
        }

        debug!(
            "built {} root node(s), {} line entries, {} diagnostic(s)",
            self.forest.len(),
            self.line_map.len(),
            self.diagnostics.len()
        );

        BuildOutput {
            nodes: self.forest,
            line_map: self.line_map,
            diagnostics: self.diagnostics,
        }
    }

    /// Create an element, register its start line and populate its style.
    fn create_element(&mut self, raw_tag: &str, raw_attributes: &str, span: Span) -> ElementNode {
        let id = NodeId::next();
        let attributes = parse_attributes(raw_attributes);

        let mut style = StyleMap::new();
        if self.class_heuristics {
            if let Some(classes) = attributes.get("className").and_then(|v| v.as_str()) {
                style.extend(style::heuristic_styles(classes));
            }
        }
        if let Some(inline) = attributes.get("style").and_then(|v| v.as_str()) {
            style.extend(style::parse_inline_style(inline));
        }

        self.line_map.insert(span.start.line, id);

        ElementNode {
            id,
            tag: html::normalize_tag(raw_tag),
            attributes,
            style,
            children: Vec::new(),
            source_start_line: span.start.line,
            source_end_line: span.end.line,
            is_complete: false,
            is_self_closing: false,
            span,
        }
    }

    /// Attach an element that would nest too deep without pushing it. Its
    /// content lands in its deepest ancestor.
    fn flatten(&mut self, element: ElementNode) {
        if !self.too_deep {
            self.too_deep = true;
            self.diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::NestingTooDeep,
                    format!(
                        "<{}> is nested deeper than {} elements and was not opened.",
                        element.tag, MAX_NESTING_DEPTH
                    ),
                    element.span,
                )
                .with_help("Close some of the enclosing elements."),
            );
        }
        trace!("flattening <{}> at depth {}", element.tag, self.stack.len());
        self.attach(Node::Element(element));
    }

    /// Close the nearest open element with a matching tag, popping any
    /// unmatched elements above it.
    fn close(&mut self, raw_tag: &str, well_formed: bool, span: Span) {
        let name = html::element_name(raw_tag);
        let close_line = span.start.line;

        let Some(depth) = self.stack.iter().rposition(|open| open.name == name) else {
            trace!("discarding </{}> at line {}: nothing to close", raw_tag, close_line);
            self.diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::UnmatchedCloseTag,
                    format!("</{}> does not match any open element.", raw_tag),
                    span,
                )
                .with_help(format!("Remove </{}> or add a matching <{}>.", raw_tag, raw_tag)),
            );
            return;
        };

        while self.stack.len() > depth + 1 {
            let Some(OpenElement { element: mut inner, .. }) = self.stack.pop() else {
                break;
            };
            inner.source_end_line = close_line.max(inner.source_end_line);
            inner.is_complete = false;
            self.diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::ImplicitlyClosed,
                    format!("<{}> was closed by </{}>.", inner.tag, raw_tag),
                    span,
                )
                .with_related(inner.span)
                .with_help(format!("Add </{}> before </{}>.", inner.tag, raw_tag)),
            );
            self.attach(Node::Element(inner));
        }

        if let Some(OpenElement { element: mut matched, .. }) = self.stack.pop() {
            matched.source_end_line = close_line.max(matched.source_end_line);
            matched.is_complete = well_formed;
            if !well_formed {
                self.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::UnterminatedTag,
                    format!("</{}> is missing its closing '>'.", raw_tag),
                    span,
                ));
            }
            self.attach(Node::Element(matched));
        }
    }

    /// Attach to the innermost open element, or to the forest root.
    fn attach(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(parent) => parent.element.children.push(node),
            None => self.forest.push(node),
        }
    }
}
