//! Named-element text stream: the byte-level collaborator of the
//! serialization engine.
//!
//! # Responsibility
//! - Define the sequential push-writer and pull-reader contracts the engine
//!   consumes.
//! - Keep the concrete text form behind those contracts so the engine never
//!   touches bytes directly.
//!
//! # Invariants
//! - Writing is strictly forward: open element, attributes, text/children,
//!   close element. No backward seeking.
//! - Reading is strictly forward token pulling. A start token always carries
//!   the complete attribute list of its element.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;

mod reader;
mod writer;

pub use reader::TextReader;
pub use writer::TextWriter;

/// Result type for stream-level operations.
pub type StreamResult<T> = Result<T, StreamError>;

/// Byte-level and syntax-level stream failures.
///
/// These are the "fatal/structural" class of failures: the engine does not
/// recover from them within one document.
#[derive(Debug)]
pub enum StreamError {
    Io(io::Error),
    /// Malformed text at a known line.
    Syntax { line: usize, detail: String },
    /// A close tag did not match the innermost open element.
    MismatchedTag { expected: String, found: String },
    /// The document ended while elements were still open.
    UnexpectedEof,
    /// An inline attribute was written after the element already had
    /// children or text.
    AttributeAfterChildren { element: String },
    /// An element or attribute name the text form cannot represent.
    InvalidName(String),
}

impl Display for StreamError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::Syntax { line, detail } => write!(f, "syntax error at line {line}: {detail}"),
            Self::MismatchedTag { expected, found } => {
                write!(f, "mismatched close tag: expected `{expected}`, found `{found}`")
            }
            Self::UnexpectedEof => write!(f, "unexpected end of document"),
            Self::AttributeAfterChildren { element } => {
                write!(f, "attribute written after children of `{element}`")
            }
            Self::InvalidName(name) => write!(f, "invalid element or attribute name `{name}`"),
        }
    }
}

impl Error for StreamError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for StreamError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// An open tag together with its inline attributes, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag {
    pub name: String,
    attrs: Vec<(String, String)>,
}

impl StartTag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
        }
    }

    pub fn push_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attrs.push((name.into(), value.into()));
    }

    /// Value of one inline attribute, if present.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Inline attributes in document order.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Drops one inline attribute, used when an outer layer has already
    /// consumed it (for example the pointer type tag).
    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|(n, _)| n != name);
    }
}

/// One pull-reader step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Start(StartTag),
    End(String),
    Text(String),
    Eof,
}

/// Sequential push writer over a tree of named, attributed elements.
pub trait ElementWriter {
    /// Opens a nested element under the current one.
    fn open_element(&mut self, name: &str) -> StreamResult<()>;

    /// Writes one inline attribute on the most recently opened element.
    /// Only valid before that element gains text or children.
    fn attribute(&mut self, name: &str, value: &str) -> StreamResult<()>;

    /// Writes text content into the current element.
    fn text(&mut self, content: &str) -> StreamResult<()>;

    /// Closes the current element.
    fn close_element(&mut self) -> StreamResult<()>;
}

/// Sequential pull reader over a tree of named, attributed elements.
pub trait ElementReader {
    /// Advances to the next token.
    fn next_token(&mut self) -> StreamResult<Token>;

    /// Consumes the remainder of the element the reader is currently
    /// inside, including its close tag. Used to skip unknown subtrees.
    fn skip_subtree(&mut self) -> StreamResult<()> {
        let mut depth = 1usize;
        loop {
            match self.next_token()? {
                Token::Start(_) => depth += 1,
                Token::End(_) => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                Token::Text(_) => {}
                Token::Eof => return Err(StreamError::UnexpectedEof),
            }
        }
    }
}
