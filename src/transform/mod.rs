use crate::ast::Node;

/// Visitor over a mutable node tree
pub trait Visitor {
    /// Called before visiting children. Return `false` to skip children.
    fn enter(&mut self, _node: &mut Node) -> bool {
        true
    }

    /// Called after visiting children.
    fn exit(&mut self, _node: &mut Node) {}
}

/// Applies a series of visitors to a forest, one full pass per visitor
pub struct Transformer<'a> {
    plugins: Vec<Box<dyn Visitor + 'a>>,
}

impl<'a> Transformer<'a> {
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
        }
    }

    pub fn add<V: Visitor + 'a>(mut self, visitor: V) -> Self {
        self.plugins.push(Box::new(visitor));
        self
    }

    pub fn transform(&mut self, nodes: &mut [Node]) {
        for plugin in &mut self.plugins {
            Self::visit_nodes(nodes, plugin.as_mut());
        }
    }

    fn visit_nodes(nodes: &mut [Node], visitor: &mut dyn Visitor) {
        for node in nodes {
            if visitor.enter(node) {
                if let Node::Element(el) = node {
                    Self::visit_nodes(&mut el.children, visitor);
                }
            }
            visitor.exit(node);
        }
    }
}

impl Default for Transformer<'_> {
    fn default() -> Self {
        Self::new()
    }
}
