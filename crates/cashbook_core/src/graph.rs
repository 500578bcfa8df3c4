//! Top-level save/load entry points and the per-graph session.
//!
//! # Responsibility
//! - Open and close the stream around one root element.
//! - After a full load: register every reachable identity-bearing node and
//!   run the link repair pass exactly once per node.
//!
//! # Invariants
//! - One [`GraphSession`] scopes one identity registry; independent loads
//!   into separate sessions never share identities.
//! - Structural stream damage surfaces as a typed [`LoadError`]; tolerated
//!   problems land in the returned [`LoadReport`].

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{Read, Write};

use crate::link::{ensure_bidirectional_links, IdentityRegistry, Linkable, LinkableNode};
use crate::serial::{engine, LoadReport, Node, ReadContext, Serializable};
use crate::stream::{ElementReader, StreamError, TextReader, TextWriter, Token};

/// Result type for graph loads.
pub type LoadResult = Result<LoadReport, LoadError>;

/// Fatal problems of one load call.
#[derive(Debug)]
pub enum LoadError {
    Stream(StreamError),
    /// The document's root element does not carry the expected tag.
    UnexpectedRoot { expected: String, found: String },
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stream(err) => write!(f, "{err}"),
            Self::UnexpectedRoot { expected, found } => {
                write!(f, "expected root element `{expected}`, found `{found}`")
            }
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Stream(err) => Some(err),
            Self::UnexpectedRoot { .. } => None,
        }
    }
}

impl From<StreamError> for LoadError {
    fn from(value: StreamError) -> Self {
        Self::Stream(value)
    }
}

/// One loaded (or loading) object graph and its identity registry.
#[derive(Default)]
pub struct GraphSession {
    registry: IdentityRegistry,
}

impl GraphSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }
}

/// Writes the whole graph under `root` as one `tag` element.
pub fn save_graph<T: Serializable>(
    root: &Node<T>,
    tag: &str,
    dest: impl Write,
) -> Result<(), StreamError> {
    let mut writer = TextWriter::new(dest);
    engine::write_element(&mut *root.borrow_mut(), tag, &mut writer)?;
    writer.finish()?;
    Ok(())
}

/// Reads one `tag` element into `root`, then registers and repairs every
/// reachable linkable. Ambient lookups default to none.
pub fn load_graph<T: Serializable>(
    root: &Node<T>,
    tag: &str,
    source: impl Read,
    session: &GraphSession,
) -> LoadResult {
    let mut ctx = ReadContext::new();
    load_graph_with(root, tag, source, session, &mut ctx)
}

/// Reads one `tag` element into `root` with a caller-prepared context
/// (published ambient values survive into every nested read call).
pub fn load_graph_with<T: Serializable>(
    root: &Node<T>,
    tag: &str,
    mut source: impl Read,
    session: &GraphSession,
    ctx: &mut ReadContext,
) -> LoadResult {
    let mut text = String::new();
    source
        .read_to_string(&mut text)
        .map_err(StreamError::from)?;
    let mut reader = TextReader::new(&text);

    let start = loop {
        match reader.next_token()? {
            Token::Start(start) => break start,
            Token::Text(_) => {}
            Token::End(name) => {
                return Err(LoadError::Stream(StreamError::MismatchedTag {
                    expected: tag.to_string(),
                    found: name,
                }))
            }
            Token::Eof => return Err(LoadError::Stream(StreamError::UnexpectedEof)),
        }
    };
    if start.name != tag {
        return Err(LoadError::UnexpectedRoot {
            expected: tag.to_string(),
            found: start.name,
        });
    }

    ctx.set_bulk_load(true);
    engine::read_element(&mut *root.borrow_mut(), &start, &mut reader, ctx)?;
    ctx.set_bulk_load(false);

    let mut nodes: Vec<LinkableNode> = Vec::new();
    root.borrow()
        .visit_linkables(&mut |node| nodes.push(node.clone()));

    let mut registered = 0;
    for node in &nodes {
        let identity = node.borrow().anchor().identity();
        if identity.is_assigned() {
            session.registry().register(identity, node);
            registered += 1;
        }
    }

    let mut repaired = 0;
    for node in &nodes {
        repaired += ensure_bidirectional_links(node, session.registry());
    }

    Ok(LoadReport {
        issues: ctx.take_issues(),
        linkables_registered: registered,
        links_repaired: repaired,
    })
}
