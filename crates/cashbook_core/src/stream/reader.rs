//! Pull reader over the text form.
//!
//! # Responsibility
//! - Turn document text back into start/end/text tokens.
//! - Detect structural damage (mismatched or unterminated tags) as typed
//!   errors instead of producing a half-plausible token stream.
//!
//! # Invariants
//! - Tokens come out in document order; there is no backward seeking.
//! - Whitespace-only runs between tags are formatting and are never
//!   reported as text tokens.

use super::{ElementReader, StartTag, StreamError, StreamResult, Token};

/// Pull reader over one in-memory document.
pub struct TextReader {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    open: Vec<String>,
    /// Close token still owed for a self-closing tag.
    pending_end: Option<String>,
}

impl TextReader {
    pub fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            line: 1,
            open: Vec::new(),
            pending_end: None,
        }
    }

    /// Line of the character the reader will consume next.
    pub fn line(&self) -> usize {
        self.line
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.get(self.pos).copied();
        if let Some(ch) = ch {
            self.pos += 1;
            if ch == '\n' {
                self.line += 1;
            }
        }
        ch
    }

    fn syntax(&self, detail: impl Into<String>) -> StreamError {
        StreamError::Syntax {
            line: self.line,
            detail: detail.into(),
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(ch) if ch.is_whitespace()) {
            self.bump();
        }
    }

    fn skip_until(&mut self, marker: &str) -> StreamResult<()> {
        let marker: Vec<char> = marker.chars().collect();
        while self.pos < self.chars.len() {
            if self.chars[self.pos..].starts_with(marker.as_slice()) {
                for _ in 0..marker.len() {
                    self.bump();
                }
                return Ok(());
            }
            self.bump();
        }
        Err(StreamError::UnexpectedEof)
    }

    fn read_name(&mut self) -> StreamResult<String> {
        let mut name = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '-') {
                name.push(ch);
                self.bump();
            } else {
                break;
            }
        }
        if name.is_empty() {
            return Err(self.syntax("expected a name"));
        }
        Ok(name)
    }

    fn read_quoted(&mut self) -> StreamResult<String> {
        let quote = match self.bump() {
            Some(ch @ ('"' | '\'')) => ch,
            _ => return Err(self.syntax("expected a quoted value")),
        };
        let mut raw = String::new();
        loop {
            match self.bump() {
                Some(ch) if ch == quote => break,
                Some(ch) => raw.push(ch),
                None => return Err(StreamError::UnexpectedEof),
            }
        }
        Ok(unescape(&raw))
    }

    fn read_start_tag(&mut self) -> StreamResult<Token> {
        let name = self.read_name()?;
        let mut tag = StartTag::new(name.clone());
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('>') => {
                    self.bump();
                    self.open.push(name);
                    return Ok(Token::Start(tag));
                }
                Some('/') => {
                    self.bump();
                    if self.bump() != Some('>') {
                        return Err(self.syntax("expected `>` after `/`"));
                    }
                    self.open.push(name.clone());
                    self.pending_end = Some(name);
                    return Ok(Token::Start(tag));
                }
                Some(_) => {
                    let attr_name = self.read_name()?;
                    self.skip_whitespace();
                    if self.bump() != Some('=') {
                        return Err(self.syntax(format!("expected `=` after `{attr_name}`")));
                    }
                    self.skip_whitespace();
                    let value = self.read_quoted()?;
                    tag.push_attr(attr_name, value);
                }
                None => return Err(StreamError::UnexpectedEof),
            }
        }
    }

    fn read_end_tag(&mut self) -> StreamResult<Token> {
        let name = self.read_name()?;
        self.skip_whitespace();
        if self.bump() != Some('>') {
            return Err(self.syntax(format!("unterminated close tag `{name}`")));
        }
        match self.open.pop() {
            Some(expected) if expected == name => Ok(Token::End(name)),
            Some(expected) => Err(StreamError::MismatchedTag {
                expected,
                found: name,
            }),
            None => Err(StreamError::MismatchedTag {
                expected: String::new(),
                found: name,
            }),
        }
    }
}

impl ElementReader for TextReader {
    fn next_token(&mut self) -> StreamResult<Token> {
        if let Some(name) = self.pending_end.take() {
            self.open.pop();
            return Ok(Token::End(name));
        }

        let mut text = String::new();
        loop {
            match self.peek() {
                Some('<') => {
                    if !text.trim().is_empty() {
                        return Ok(Token::Text(unescape(&text)));
                    }
                    self.bump();
                    match self.peek() {
                        Some('/') => {
                            self.bump();
                            return self.read_end_tag();
                        }
                        Some('!') => self.skip_until("-->")?,
                        Some('?') => self.skip_until("?>")?,
                        Some(_) => return self.read_start_tag(),
                        None => return Err(StreamError::UnexpectedEof),
                    }
                }
                Some(_) => {
                    text.push(self.bump().unwrap_or_default());
                }
                None => {
                    if !self.open.is_empty() {
                        return Err(StreamError::UnexpectedEof);
                    }
                    return Ok(Token::Eof);
                }
            }
        }
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(idx) = rest.find('&') {
        out.push_str(&rest[..idx]);
        rest = &rest[idx..];
        let replaced = [
            ("&amp;", "&"),
            ("&lt;", "<"),
            ("&gt;", ">"),
            ("&quot;", "\""),
            ("&apos;", "'"),
        ]
        .iter()
        .find(|(entity, _)| rest.starts_with(entity));
        match replaced {
            Some((entity, ch)) => {
                out.push_str(ch);
                rest = &rest[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
