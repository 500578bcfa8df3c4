//! Push writer producing the indented text form.
//!
//! # Responsibility
//! - Turn open/attribute/text/close calls into bytes.
//! - Guarantee the produced text is re-readable by [`TextReader`].
//!
//! # Invariants
//! - Output depends only on the call sequence, never on ambient state, so
//!   identical walks produce byte-identical documents.
//! - Element and attribute names are validated before anything is emitted.
//!
//! [`TextReader`]: super::TextReader

use std::io::Write;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{ElementWriter, StreamError, StreamResult};

static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]*$").expect("static pattern"));

const INDENT: &str = "  ";

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Sequential writer over any [`std::io::Write`] destination.
pub struct TextWriter<W: Write> {
    dest: W,
    open: Vec<String>,
    /// The innermost element's open tag has not been terminated with `>` yet.
    tag_pending: bool,
    /// The innermost element received text content.
    has_text: bool,
}

impl<W: Write> TextWriter<W> {
    pub fn new(dest: W) -> Self {
        Self {
            dest,
            open: Vec::new(),
            tag_pending: false,
            has_text: false,
        }
    }

    /// Flushes the destination. All elements must already be closed.
    pub fn finish(mut self) -> StreamResult<W> {
        if !self.open.is_empty() {
            return Err(StreamError::UnexpectedEof);
        }
        self.dest.flush()?;
        Ok(self.dest)
    }

    fn settle_open_tag(&mut self) -> StreamResult<()> {
        if self.tag_pending {
            self.dest.write_all(b">\n")?;
            self.tag_pending = false;
        }
        Ok(())
    }

    fn indent(&mut self, depth: usize) -> StreamResult<()> {
        for _ in 0..depth {
            self.dest.write_all(INDENT.as_bytes())?;
        }
        Ok(())
    }

    fn check_name(name: &str) -> StreamResult<()> {
        if NAME_PATTERN.is_match(name) {
            Ok(())
        } else {
            Err(StreamError::InvalidName(name.to_string()))
        }
    }
}

impl<W: Write> ElementWriter for TextWriter<W> {
    fn open_element(&mut self, name: &str) -> StreamResult<()> {
        Self::check_name(name)?;
        self.settle_open_tag()?;
        self.indent(self.open.len())?;
        write!(self.dest, "<{name}")?;
        self.open.push(name.to_string());
        self.tag_pending = true;
        self.has_text = false;
        Ok(())
    }

    fn attribute(&mut self, name: &str, value: &str) -> StreamResult<()> {
        Self::check_name(name)?;
        if !self.tag_pending {
            return Err(StreamError::AttributeAfterChildren {
                element: self.open.last().cloned().unwrap_or_default(),
            });
        }
        write!(self.dest, " {name}=\"{}\"", escape(value))?;
        Ok(())
    }

    fn text(&mut self, content: &str) -> StreamResult<()> {
        if self.open.is_empty() {
            return Err(StreamError::UnexpectedEof);
        }
        if self.tag_pending {
            self.dest.write_all(b">")?;
            self.tag_pending = false;
        }
        self.dest.write_all(escape(content).as_bytes())?;
        self.has_text = true;
        Ok(())
    }

    fn close_element(&mut self) -> StreamResult<()> {
        let name = match self.open.pop() {
            Some(name) => name,
            None => return Err(StreamError::UnexpectedEof),
        };
        if self.tag_pending {
            self.dest.write_all(b"/>\n")?;
            self.tag_pending = false;
        } else if self.has_text {
            writeln!(self.dest, "</{name}>")?;
        } else {
            self.indent(self.open.len())?;
            writeln!(self.dest, "</{name}>")?;
        }
        self.has_text = false;
        Ok(())
    }
}
