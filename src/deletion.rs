//! Line-local classification of structural deletions between two
//! snapshots of the same document.

use log::debug;
use serde::Serialize;

use crate::parser::tokenizer::tokenize_line;

/// What an edit did at the cursor line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum Change {
    NoChange,
    /// The document lost at least one line
    LineDeleted { line: usize },
    /// The cursor line used to open an element and no longer does
    ElementDeleted { line: usize },
}

impl Change {
    pub fn line(&self) -> Option<usize> {
        match self {
            Change::NoChange => None,
            Change::LineDeleted { line } | Change::ElementDeleted { line } => Some(*line),
        }
    }

    pub fn is_deletion(&self) -> bool {
        !matches!(self, Change::NoChange)
    }
}

/// Compare `old` and `new` around `cursor_line` (1-based).
///
/// A shorter document is always a `LineDeleted`. Otherwise only the cursor
/// line is re-tokenized in both versions; a line beyond either text's end
/// reads as empty.
pub fn detect_deletion(old: &str, new: &str, cursor_line: usize) -> Change {
    let old_lines: Vec<&str> = old.split('\n').collect();
    let new_lines: Vec<&str> = new.split('\n').collect();

    if old_lines.len() > new_lines.len() {
        debug!(
            "line count dropped from {} to {}",
            old_lines.len(),
            new_lines.len()
        );
        return Change::LineDeleted { line: cursor_line };
    }

    let Some(index) = cursor_line.checked_sub(1) else {
        return Change::NoChange;
    };
    let old_line = old_lines.get(index).copied().unwrap_or("");
    let new_line = new_lines.get(index).copied().unwrap_or("");
    if old_line == new_line {
        return Change::NoChange;
    }

    let opens_element = |line: &str| {
        tokenize_line(line, cursor_line)
            .iter()
            .any(|token| token.starts_element())
    };

    if opens_element(old_line) && !opens_element(new_line) {
        debug!("element removed from line {}", cursor_line);
        return Change::ElementDeleted { line: cursor_line };
    }
    Change::NoChange
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_removed_to_empty() {
        assert_eq!(
            detect_deletion("<button>X</button>", "", 1),
            Change::ElementDeleted { line: 1 }
        );
    }

    #[test]
    fn test_fewer_lines_is_line_deleted() {
        let old = "<div>\n  <p>a</p>\n</div>";
        let new = "<div>\n</div>";
        assert_eq!(detect_deletion(old, new, 2), Change::LineDeleted { line: 2 });
    }

    #[test]
    fn test_line_count_wins_over_line_content() {
        // Same first line, but one line fewer
        assert_eq!(
            detect_deletion("<a>\nb", "<a>", 1),
            Change::LineDeleted { line: 1 }
        );
    }

    #[test]
    fn test_unchanged_line() {
        assert_eq!(
            detect_deletion("<p>a</p>\nx", "<p>a</p>\ny", 1),
            Change::NoChange
        );
    }

    #[test]
    fn test_text_edit_is_no_change() {
        assert_eq!(detect_deletion("<p>a</p>", "<p>ab</p>", 1), Change::NoChange);
        assert_eq!(detect_deletion("hello", "", 1), Change::NoChange);
    }

    #[test]
    fn test_close_tag_only_is_not_element() {
        assert_eq!(detect_deletion("</div>", "", 1), Change::NoChange);
    }

    #[test]
    fn test_self_closing_removed() {
        assert_eq!(
            detect_deletion("a\n  <img src=\"x\" />\nb", "a\n  text\nb", 2),
            Change::ElementDeleted { line: 2 }
        );
    }

    #[test]
    fn test_added_line_is_no_change() {
        assert_eq!(detect_deletion("<p>a</p>", "<p>a</p>\n<p>b</p>", 2), Change::NoChange);
    }

    #[test]
    fn test_cursor_out_of_range() {
        assert_eq!(detect_deletion("<p>a</p>", "<p>a</p>", 0), Change::NoChange);
        assert_eq!(detect_deletion("<p>a</p>", "x", 5), Change::NoChange);
    }

    #[test]
    fn test_serializes_tagged() {
        let json = serde_json::to_value(Change::ElementDeleted { line: 3 }).unwrap();
        assert_eq!(json["type"], "ElementDeleted");
        assert_eq!(json["line"], 3);
        assert_eq!(Change::ElementDeleted { line: 3 }.line(), Some(3));
        assert!(!Change::NoChange.is_deletion());
    }
}
