//! Source line -> node id index for cursor queries.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ast::NodeId;

/// Editor cursor, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub line: usize,
    pub column: usize,
}

impl Cursor {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Maps the line of each element's opening tag to that element's id.
///
/// At most one id per line; the first element registered on a line keeps
/// it. Text nodes are never registered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LineMap {
    entries: BTreeMap<usize, NodeId>,
}

impl LineMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `id` for `line` unless the line is already taken.
    /// Returns whether the entry was inserted.
    pub fn insert(&mut self, line: usize, id: NodeId) -> bool {
        if self.entries.contains_key(&line) {
            return false;
        }
        self.entries.insert(line, id);
        true
    }

    /// Exact lookup
    pub fn get(&self, line: usize) -> Option<NodeId> {
        self.entries.get(&line).copied()
    }

    /// Exact match, else the entry with the greatest line `<= line`.
    pub fn node_at_line(&self, line: usize) -> Option<NodeId> {
        self.entries.range(..=line).next_back().map(|(_, id)| *id)
    }

    /// Column is not considered; one entry exists per line.
    pub fn node_at(&self, cursor: Cursor) -> Option<NodeId> {
        self.node_at_line(cursor.line)
    }

    /// Reverse lookup: the line an element was registered on.
    pub fn line_of(&self, id: NodeId) -> Option<usize> {
        self.entries
            .iter()
            .find(|(_, entry)| **entry == id)
            .map(|(line, _)| *line)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, NodeId)> + '_ {
        self.entries.iter().map(|(line, id)| (*line, *id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Node id for a line: exact match or nearest registered line above.
pub fn node_at_line(map: &LineMap, line: usize) -> Option<NodeId> {
    map.node_at_line(line)
}
