//! Per-document edit loop state.
//!
//! The parser itself keeps nothing between calls. An `EditSession` holds
//! the previous text and document so each keystroke can be classified
//! against the snapshot before it.

use serde::Serialize;

use crate::Options;
use crate::ast::{Document, Node, NodeId};
use crate::deletion::{Change, detect_deletion};
use crate::line_map::Cursor;
use crate::parser::{MarkupParser, Parser};

/// Outcome of one `EditSession::update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Edit {
    pub change: Change,
    /// Element the previous line map held for the cursor line, when the
    /// edit was classified as a deletion
    pub removed_node: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub struct EditSession {
    parser: MarkupParser,
    text: String,
    document: Document,
}

impl EditSession {
    /// Session over an empty document.
    pub fn new(options: Options) -> Self {
        Self::open(String::new(), options)
    }

    pub fn open(text: impl Into<String>, options: Options) -> Self {
        let text = text.into();
        let parser = MarkupParser::with_options(options);
        let document = parser.parse(&text);
        Self {
            parser,
            text,
            document,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the text, re-parse and classify the edit at `cursor_line`.
    pub fn update(&mut self, text: impl Into<String>, cursor_line: usize) -> Edit {
        let text = text.into();
        let change = detect_deletion(&self.text, &text, cursor_line);
        let removed_node = if change.is_deletion() {
            self.document.line_map.get(cursor_line)
        } else {
            None
        };

        self.document = self.parser.parse(&text);
        self.text = text;

        Edit {
            change,
            removed_node,
        }
    }

    pub fn node_at(&self, cursor: Cursor) -> Option<&Node> {
        self.document.node_at(cursor)
    }
}
