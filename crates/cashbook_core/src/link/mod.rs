//! Link and cross-reference subsystem.
//!
//! # Responsibility
//! - Stable integer identities and their per-graph owner registry.
//! - Directed, named, deduplicated edges with bidirectional maintenance
//!   and post-load repair.
//!
//! # Invariants
//! - Resolution is lazy and never cached; a dangling edge is invisible,
//!   not an error.
//! - Every resolved edge has a mirror once the repair pass has run.

pub mod identity;
pub mod link;
pub mod linkable;

pub use identity::{Identity, IdentityRegistry};
pub use link::{Link, LinkList, LinkListItem};
pub use linkable::{
    add_link, ensure_bidirectional_links, ensure_has_id, remove_link, LinkAnchor, Linkable,
    LinkableNode,
};
