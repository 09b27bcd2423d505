//! Tolerant markup/JSX parsing with line-to-node source mapping.
//!
//! Parse partial or malformed HTML/JSX into a node forest, resolve each
//! element's style from inline declarations, utility-class heuristics and
//! an optional stylesheet, and map editor cursor lines back to nodes.

use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod ast;
pub mod css;
pub mod deletion;
pub mod error;
pub mod html;
pub mod line_map;
pub mod parser;
pub mod session;
pub mod style;
pub mod transform;

pub use ast::{Document, ElementNode, Node, NodeId, NodeKind, TextNode};
pub use deletion::{Change, detect_deletion};
pub use error::{Diagnostic, DiagnosticKind, Error};
pub use line_map::{Cursor, LineMap, node_at_line};
pub use parser::{MarkupParser, Parser, build, tokenize};
pub use session::{Edit, EditSession};

/// Source language of the parsed text.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Plain HTML-like markup, parsed as a whole
    #[default]
    Markup,
    /// JSX/TSX component source; only the rendered markup is parsed
    Script,
}

/// File extensions read as [`Language::Markup`]
pub const MARKUP_EXTENSIONS: &[&str] = &["html", "htm"];

/// File extensions read as [`Language::Script`]
pub const SCRIPT_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx", "mjs"];

impl Language {
    /// Guess the language from a file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if SCRIPT_EXTENSIONS.contains(&ext) => Language::Script,
            _ => Language::Markup,
        }
    }

    /// True when `path` has an extension of either language.
    pub fn is_source(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| MARKUP_EXTENSIONS.contains(&ext) || SCRIPT_EXTENSIONS.contains(&ext))
    }
}

/// Configuration for parsing.
#[derive(Debug, Clone)]
pub struct Options {
    pub language: Language,
    /// Derive styles from utility class names (default: true)
    pub class_heuristics: bool,
    /// Stylesheet whose class rules are overlaid after parsing
    pub stylesheet: Option<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            language: Language::Markup,
            class_heuristics: true,
            stylesheet: None,
        }
    }
}

/// Parse with default options for `language`.
pub fn parse(text: &str, language: Language) -> Document {
    parse_with(
        text,
        &Options {
            language,
            ..Options::default()
        },
    )
}

pub fn parse_with(text: &str, options: &Options) -> Document {
    MarkupParser::with_options(options.clone()).parse(text)
}

/// Overlay the class rules of `css` onto an already built forest.
pub fn resolve(nodes: Vec<Node>, css: &str) -> Vec<Node> {
    css::resolve(nodes, css)
}
