use crate::parser::tokenizer::Span;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Kind of recoverable problem found while building a tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagnosticKind {
    /// A tag ran to end of input without `>`
    UnterminatedTag,
    /// A closing tag that matches no open element
    UnmatchedCloseTag,
    /// An element still open at end of input
    UnclosedElement,
    /// An element popped because a closing tag matched one of its ancestors
    ImplicitlyClosed,
    /// An open tag past the nesting cap, attached without being opened
    NestingTooDeep,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::UnterminatedTag => "Unterminated tag",
            DiagnosticKind::UnmatchedCloseTag => "Unmatched close tag",
            DiagnosticKind::UnclosedElement => "Unclosed element",
            DiagnosticKind::ImplicitlyClosed => "Implicitly closed element",
            DiagnosticKind::NestingTooDeep => "Nesting too deep",
        }
    }
}

/// A recoverable problem. Diagnostics are collected, never raised: the tree
/// is always built.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub span: Span,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_span: Option<Span>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
            related_span: None,
            help: None,
        }
    }

    /// Add a related span (e.g., where the element was opened)
    pub fn with_related(mut self, span: Span) -> Self {
        self.related_span = Some(span);
        self
    }

    /// Add help text
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Render with source context
    pub fn render(&self, source: &str, filename: &str) -> String {
        self.render_inner(source, filename, false)
    }

    /// Render with ANSI color codes
    pub fn render_color(&self, source: &str, filename: &str) -> String {
        self.render_inner(source, filename, true)
    }

    fn render_inner(&self, source: &str, filename: &str, color: bool) -> String {
        let yellow = if color { "\x1b[1;33m" } else { "" };
        let dim = if color { "\x1b[2m" } else { "" };
        let cyan = if color { "\x1b[1;38;5;73m" } else { "" };
        let reset = if color { "\x1b[0m" } else { "" };

        let mut output = String::new();

        output.push_str(&format!(
            "{}warning:{} {}\n",
            yellow, reset, self.message
        ));
        output.push_str(&format!(
            " {}-->{} {}:{}:{}\n",
            dim, reset, filename, self.span.start.line, self.span.start.col
        ));

        output.push_str(&self.render_snippet(source, &self.span, None, color));
        if let Some(ref related) = self.related_span {
            output.push_str(&self.render_snippet(source, related, Some("opened here"), color));
        }

        if let Some(ref help) = self.help {
            output.push_str(&format!(" {}help:{} {}\n", cyan, reset, help));
        }

        output
    }

    /// One source line plus a caret underline.
    fn render_snippet(&self, source: &str, span: &Span, label: Option<&str>, color: bool) -> String {
        let red = if color { "\x1b[1;31m" } else { "" };
        let dim = if color { "\x1b[2m" } else { "" };
        let reset = if color { "\x1b[0m" } else { "" };

        let Some(source_line) = source.lines().nth(span.start.line.saturating_sub(1)) else {
            return String::new();
        };

        let width = format!("{}", span.start.line).len().max(2);
        let underline_start = span.start.col.saturating_sub(1);
        let line_chars = source_line.chars().count();
        let underline_len = if span.end.line == span.start.line {
            span.end.col.saturating_sub(span.start.col).max(1)
        } else {
            line_chars.saturating_sub(underline_start).max(1)
        };

        let mut output = String::new();
        output.push_str(&format!(
            "{}{:>width$} |{} {}\n",
            dim, span.start.line, reset, source_line,
            width = width
        ));
        output.push_str(&format!(
            "{}{:>width$} |{} {}{}{}{}{}\n",
            dim, "", reset,
            " ".repeat(underline_start),
            if label.is_some() { dim } else { red },
            "^".repeat(underline_len),
            label.map(|l| format!(" {}", l)).unwrap_or_default(),
            reset,
            width = width
        ));
        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {}",
            self.span.start.line, self.span.start.col, self.message
        )
    }
}

/// Errors at the I/O boundary of the command-line tool
#[derive(Debug)]
pub enum Error {
    Io { path: PathBuf, source: std::io::Error },
    Json(serde_json::Error),
    NoInput(PathBuf),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io { path, source } => write!(f, "{}: {}", path.display(), source),
            Error::Json(err) => write!(f, "JSON output error: {}", err),
            Error::NoInput(path) => write!(f, "no markup files found in {}", path.display()),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { source, .. } => Some(source),
            Error::Json(err) => Some(err),
            Error::NoInput(_) => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}
