pub mod attributes;
pub mod script;
pub mod tokenizer;
mod tree_builder;

pub use attributes::{AttrValue, Attributes, parse_attributes};
pub use tokenizer::{Position, Span, Token, TokenKind, Tokenizer, tokenize, tokenize_line};
pub use tree_builder::{BuildOutput, MAX_NESTING_DEPTH, TreeBuilder};

use crate::ast::Document;
use crate::{Language, Options};
use log::debug;
use std::sync::Arc;

/// Parser trait - converts source text to a document
pub trait Parser {
    fn parse(&self, source: &str) -> Document;
}

/// Tolerant markup/JSX parser
#[derive(Debug, Clone, Default)]
pub struct MarkupParser {
    options: Options,
}

impl MarkupParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: Options) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }
}

impl Parser for MarkupParser {
    fn parse(&self, source: &str) -> Document {
        let range = match self.options.language {
            Language::Markup => 0..source.len(),
            Language::Script => script::extract_markup(source),
        };

        // Tokenize
        let tokens = Tokenizer::with_range(source, range).tokenize();
        debug!("tokenized {} bytes into {} tokens", source.len(), tokens.len());

        // Build tree
        let output = TreeBuilder::new(tokens)
            .with_class_heuristics(self.options.class_heuristics)
            .build();

        let nodes = match &self.options.stylesheet {
            Some(css) => crate::css::resolve(output.nodes, css),
            None => output.nodes,
        };

        Document {
            language: self.options.language,
            nodes,
            line_map: output.line_map,
            diagnostics: output.diagnostics,
            source: Arc::from(source),
        }
    }
}

/// Build a forest and line map from tokens.
pub fn build(tokens: Vec<Token>) -> BuildOutput {
    TreeBuilder::new(tokens).build()
}
