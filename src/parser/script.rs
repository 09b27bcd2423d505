//! Locate the markup inside a script-language (JSX/TSX) source file.
//!
//! Heuristic, in order: the parenthesized or braced body following the
//! first `return` that has one, then the content of a `<body>` wrapper,
//! then the whole text.

use lazy_static::lazy_static;
use regex::Regex;
use std::ops::Range;

lazy_static! {
    static ref RETURN_KEYWORD: Regex = Regex::new(r"\breturn\b").unwrap();
    static ref BODY_OPEN: Regex = Regex::new(r"(?i)<body\b[^>]*>").unwrap();
    static ref BODY_CLOSE: Regex = Regex::new(r"(?i)</body\s*>").unwrap();
}

/// Byte range of `source` holding the markup to parse.
pub fn extract_markup(source: &str) -> Range<usize> {
    return_body(source)
        .or_else(|| document_body(source))
        .unwrap_or(0..source.len())
}

fn return_body(source: &str) -> Option<Range<usize>> {
    let bytes = source.as_bytes();

    for m in RETURN_KEYWORD.find_iter(source) {
        let rest = &source[m.end()..];
        let open = m.end() + (rest.len() - rest.trim_start().len());

        match bytes.get(open) {
            Some(&delim @ (b'(' | b'{')) => {
                let close_delim = if delim == b'(' { b')' } else { b'}' };
                let end = matching_close(bytes, open, delim, close_delim).unwrap_or(source.len());
                return Some(open + 1..end);
            }
            // `return <div>...</div>;` without parentheses
            Some(b'<') => {
                let end = source[open..]
                    .find(";\n")
                    .map(|i| open + i)
                    .unwrap_or(source.len());
                return Some(open..end);
            }
            _ => continue,
        }
    }
    None
}

fn document_body(source: &str) -> Option<Range<usize>> {
    let open = BODY_OPEN.find(source)?;
    let end = BODY_CLOSE
        .find(&source[open.end()..])
        .map(|m| open.end() + m.start())
        .unwrap_or(source.len());
    Some(open.end()..end)
}

/// Index of the delimiter closing the one at `open`. Only the delimiter
/// pair itself is counted, so apostrophes in JSX text do not derail it.
fn matching_close(bytes: &[u8], open: usize, opener: u8, closer: u8) -> Option<usize> {
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if b == opener {
            depth += 1;
        } else if b == closer {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}
