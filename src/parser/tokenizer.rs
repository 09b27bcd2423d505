use log::trace;
use serde::Serialize;
use std::ops::Range;

/// Position in source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    /// Byte offset in source
    pub byte: usize,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed, in characters)
    pub col: usize,
}

impl Position {
    pub fn new() -> Self {
        Self { byte: 0, line: 1, col: 1 }
    }

    /// Move past `ch`, updating line and column.
    pub fn advance(&mut self, ch: char) {
        self.byte += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
    }

    /// Move past every character of `text`.
    pub fn advance_str(&mut self, text: &str) {
        for ch in text.chars() {
            self.advance(ch);
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

/// Span in source code (a range from start position to end position)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

/// Token classification, independent of payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    Open,
    Close,
    SelfClose,
    Text,
}

/// Tokens produced by the tokenizer
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Opening tag: `<tag attrs>`. `well_formed` is false when input ended before `>`.
    Open {
        tag: String,
        raw_attributes: String,
        well_formed: bool,
        span: Span,
    },
    /// Closing tag: `</tag>`
    Close {
        tag: String,
        well_formed: bool,
        span: Span,
    },
    /// Self-closing tag: `<tag attrs />`
    SelfClose {
        tag: String,
        raw_attributes: String,
        span: Span,
    },
    /// Text between tags. Whitespace-only runs are never emitted.
    Text { text: String, span: Span },
}

impl Token {
    pub fn span(&self) -> Span {
        match self {
            Token::Open { span, .. } => *span,
            Token::Close { span, .. } => *span,
            Token::SelfClose { span, .. } => *span,
            Token::Text { span, .. } => *span,
        }
    }

    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Open { .. } => TokenKind::Open,
            Token::Close { .. } => TokenKind::Close,
            Token::SelfClose { .. } => TokenKind::SelfClose,
            Token::Text { .. } => TokenKind::Text,
        }
    }

    /// Tag name for tag tokens, `None` for text.
    pub fn tag(&self) -> Option<&str> {
        match self {
            Token::Open { tag, .. } | Token::Close { tag, .. } | Token::SelfClose { tag, .. } => {
                Some(tag)
            }
            Token::Text { .. } => None,
        }
    }

    /// True for tokens that begin an element (open or self-closing).
    pub fn starts_element(&self) -> bool {
        matches!(self, Token::Open { .. } | Token::SelfClose { .. })
    }

    pub fn is_well_formed(&self) -> bool {
        match self {
            Token::Open { well_formed, .. } | Token::Close { well_formed, .. } => *well_formed,
            Token::SelfClose { .. } | Token::Text { .. } => true,
        }
    }
}

/// Tokenizer for markup and JSX-like source.
///
/// Total over all inputs: every call terminates and returns a token list,
/// whatever the input looks like.
pub struct Tokenizer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    /// Exclusive end of the scanned region
    end: usize,
    position: Position,
    /// Start of the pending text run, if any
    text_start: Option<Position>,
    /// Tag bodies starting before this byte end at the first `>`
    plain_until: usize,
    /// Bytes examined while looking for tag ends
    scanned: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            end: source.len(),
            position: Position::new(),
            text_start: None,
            plain_until: 0,
            scanned: 0,
        }
    }

    /// Tokenize only `range` of `source`, keeping positions relative to the
    /// whole source.
    pub fn with_range(source: &'a str, range: Range<usize>) -> Self {
        let mut end = range.end.min(source.len());
        while !source.is_char_boundary(end) {
            end -= 1;
        }
        let mut start = range.start.min(end);
        while !source.is_char_boundary(start) {
            start -= 1;
        }

        let mut position = Position::new();
        position.advance_str(&source[..start]);

        Self {
            source,
            bytes: source.as_bytes(),
            end,
            position,
            text_start: None,
            plain_until: 0,
            scanned: 0,
        }
    }

    /// Number the first line as `line` instead of 1.
    pub fn starting_at_line(mut self, line: usize) -> Self {
        self.position.line = line.max(1);
        self
    }

    /// Tokenize the whole region
    pub fn tokenize(mut self) -> Vec<Token> {
        self.run()
    }

    /// Tokenize and report how many bytes the tag-end search examined.
    #[cfg(test)]
    fn tokenize_counting(mut self) -> (Vec<Token>, usize) {
        let tokens = self.run();
        (tokens, self.scanned)
    }

    fn run(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        while !self.at_end() {
            if self.bytes[self.position.byte] == b'<' && self.try_markup(&mut tokens) {
                continue;
            }
            self.advance_text();
        }

        let end = self.position;
        self.flush_text(&mut tokens, end);
        tokens
    }

    /// Try to consume markup starting at the current `<`.
    /// Returns false when the `<` is ordinary text.
    fn try_markup(&mut self, tokens: &mut Vec<Token>) -> bool {
        let start = self.position;
        let rest = &self.source[start.byte..self.end];

        // Comments and declarations are dropped
        if rest.starts_with("<!--") {
            self.flush_text(tokens, start);
            let target = match rest[4..].find("-->") {
                Some(i) => start.byte + 4 + i + 3,
                None => self.end,
            };
            self.advance_to(target);
            return true;
        }
        if rest.starts_with("<!") || rest.starts_with("<?") {
            self.flush_text(tokens, start);
            let target = match rest.find('>') {
                Some(i) => start.byte + i + 1,
                None => self.end,
            };
            self.advance_to(target);
            return true;
        }

        // JSX fragments carry no element of their own
        if rest.starts_with("<>") || rest.starts_with("</>") {
            self.flush_text(tokens, start);
            let len = if rest.starts_with("<>") { 2 } else { 3 };
            self.advance_to(start.byte + len);
            return true;
        }

        let is_close = rest.as_bytes().get(1) == Some(&b'/');
        let name_offset = if is_close { 2 } else { 1 };
        let name_len = tag_name_len(&rest[name_offset..]);
        if name_len == 0 {
            trace!("stray '<' at {}:{} treated as text", start.line, start.col);
            return false;
        }

        self.flush_text(tokens, start);

        let tag = rest[name_offset..name_offset + name_len].to_string();
        let body_start = start.byte + name_offset + name_len;

        match self.find_tag_end(body_start) {
            Some(close_bracket) => {
                let inner = &self.source[body_start..close_bracket];
                self.advance_to(close_bracket + 1);
                let span = Span::new(start, self.position);

                let token = if is_close {
                    Token::Close { tag, well_formed: true, span }
                } else {
                    let trimmed = inner.trim_end();
                    match trimmed.strip_suffix('/') {
                        Some(attrs) => Token::SelfClose {
                            tag,
                            raw_attributes: attrs.trim().to_string(),
                            span,
                        },
                        None => Token::Open {
                            tag,
                            raw_attributes: trimmed.trim().to_string(),
                            well_formed: true,
                            span,
                        },
                    }
                };
                tokens.push(token);
            }
            None => {
                // Unterminated tag: nothing follows it, so emit and stop
                let inner = &self.source[body_start..self.end];
                self.advance_to(self.end);
                let span = Span::new(start, self.position);
                trace!("unterminated <{}> at {}:{}", tag, start.line, start.col);

                let token = if is_close {
                    Token::Close { tag, well_formed: false, span }
                } else {
                    let trimmed = inner.trim();
                    let attrs = trimmed.strip_suffix('/').unwrap_or(trimmed);
                    Token::Open {
                        tag,
                        raw_attributes: attrs.trim().to_string(),
                        well_formed: false,
                        span,
                    }
                };
                tokens.push(token);
            }
        }

        true
    }

    /// Find the byte index of the `>` that closes a tag whose body starts at
    /// `from`. Quoted strings and `{...}` regions are skipped. An open quote
    /// gives up at the next line that starts with a tag, and an open brace at
    /// the next blank line; the first `>` passed is used instead and the
    /// bytes up to that point are never brace-scanned again.
    fn find_tag_end(&mut self, from: usize) -> Option<usize> {
        if from < self.plain_until {
            return self.plain_tag_end(from);
        }

        let mut quote: Option<u8> = None;
        let mut depth = 0usize;
        let mut first_gt = None;
        let mut i = from;

        while i < self.end {
            self.scanned += 1;
            let b = self.bytes[i];
            if b == b'>' && first_gt.is_none() {
                first_gt = Some(i);
            }
            match quote {
                Some(q) => {
                    if b == q {
                        quote = None;
                    }
                }
                None => match b {
                    b'"' | b'\'' | b'`' => quote = Some(b),
                    b'{' => depth += 1,
                    b'}' => depth = depth.saturating_sub(1),
                    b'>' if depth == 0 => return Some(i),
                    _ => {}
                },
            }
            if b == b'\n' && (quote.is_some() || depth > 0) && self.gives_up_at(i, quote.is_some()) {
                break;
            }
            i += 1;
        }

        trace!("unbalanced tag body at byte {}, using the first '>'", from);
        self.plain_until = i;
        match first_gt {
            Some(gt) => Some(gt),
            None => self.plain_tag_end(i),
        }
    }

    /// Whether the line after the newline at `newline` ends an unbalanced
    /// scan: a blank line always does, a line opening with a tag only inside
    /// a quote.
    fn gives_up_at(&mut self, newline: usize, in_quote: bool) -> bool {
        let mut j = newline + 1;
        while j < self.end && matches!(self.bytes[j], b' ' | b'\t' | b'\r') {
            self.scanned += 1;
            j += 1;
        }
        match self.bytes.get(j..self.end) {
            Some([b'\n', ..]) => true,
            Some([b'<', next, ..]) => in_quote && (next.is_ascii_alphabetic() || *next == b'/'),
            _ => false,
        }
    }

    fn plain_tag_end(&mut self, from: usize) -> Option<usize> {
        let found = self.source[from..self.end].find('>');
        self.scanned += found.map_or(self.end - from, |i| i + 1);
        found.map(|i| from + i)
    }

    /// Emit the pending text run (if it holds anything but whitespace).
    fn flush_text(&mut self, tokens: &mut Vec<Token>, upto: Position) {
        let Some(text_start) = self.text_start.take() else {
            return;
        };
        let raw = &self.source[text_start.byte..upto.byte];
        if raw.trim().is_empty() {
            return;
        }

        let leading = raw.len() - raw.trim_start().len();
        let mut start = text_start;
        start.advance_str(&raw[..leading]);
        let mut end = start;
        end.advance_str(raw.trim());

        tokens.push(Token::Text {
            text: raw.to_string(),
            span: Span::new(start, end),
        });
    }

    fn advance_text(&mut self) {
        if self.text_start.is_none() {
            self.text_start = Some(self.position);
        }
        self.advance();
    }

    // === Low-level helpers ===

    fn at_end(&self) -> bool {
        self.position.byte >= self.end
    }

    fn peek_char(&self) -> Option<char> {
        if self.at_end() {
            return None;
        }
        let b = self.bytes[self.position.byte];
        if b < 128 {
            Some(b as char)
        } else {
            self.source[self.position.byte..].chars().next()
        }
    }

    fn advance(&mut self) {
        if let Some(ch) = self.peek_char() {
            self.position.advance(ch);
        }
    }

    fn advance_to(&mut self, target: usize) {
        let target = target.min(self.end);
        while self.position.byte < target {
            self.advance();
        }
    }
}

/// Length in bytes of the tag-name-shaped identifier at the start of `s`.
/// Zero when `s` does not start with an ASCII letter.
fn tag_name_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    match bytes.first() {
        Some(b) if b.is_ascii_alphabetic() => {}
        _ => return 0,
    }
    bytes
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b':'))
        .count()
}

/// Tokenize source code
pub fn tokenize(source: &str) -> Vec<Token> {
    Tokenizer::new(source).tokenize()
}

/// Tokenize a single line, numbering its tokens as `line_number`.
pub fn tokenize_line(line: &str, line_number: usize) -> Vec<Token> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    let line = line.strip_suffix('\r').unwrap_or(line);
    Tokenizer::new(line).starting_at_line(line_number).tokenize()
}
