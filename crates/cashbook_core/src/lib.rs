//! Persistence and cross-reference core for the Cashbook desktop
//! record-keeper.
//!
//! Domain objects declare, in one `setup` per type, which fields persist;
//! any two persisted objects reference each other by a stable integer
//! identity that survives a save/reload cycle. The crate is the single
//! source of truth for the document format and the link invariants.

pub mod graph;
pub mod link;
pub mod logging;
pub mod serial;
pub mod stream;

pub use graph::{load_graph, load_graph_with, save_graph, GraphSession, LoadError, LoadResult};
pub use link::{
    add_link, ensure_bidirectional_links, ensure_has_id, remove_link, Identity, IdentityRegistry,
    Link, LinkAnchor, Linkable, LinkableNode, LinkList,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use serial::{
    node, Accessor, LoadIssue, LoadIssueKind, LoadReport, Node, PointerFactory, Polymorphic,
    ReadContext, ScalarValue, Serializable,
};
pub use stream::{ElementReader, ElementWriter, StreamError, TextReader, TextWriter};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
