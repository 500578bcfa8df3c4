//! Linkable mixin: identity plus symmetric edge maintenance.
//!
//! # Responsibility
//! - Give any persisted type a lazily assigned identity and an outgoing
//!   edge list by embedding one [`LinkAnchor`].
//! - Keep the bidirectional invariant: every resolved edge (A→B, name) has
//!   a mirror (B→A, name).
//!
//! # Invariants
//! - Both sides of an edge are added together and removed together.
//! - Linking is idempotent: re-linking an existing (target, name) pair
//!   changes nothing on either side.
//! - The repair pass only ever adds missing mirrors; running it twice is a
//!   no-op.

use std::cell::RefCell;
use std::rc::Rc;

use log::info;

use super::identity::{Identity, IdentityRegistry};
use super::link::{Link, LinkList};
use crate::serial::accessor::Serializable;

/// Shared handle to any identity-bearing object.
pub type LinkableNode = Rc<RefCell<dyn Linkable>>;

/// Embedded state of one linkable object: its identity and its outgoing
/// edges. Starts unassigned with no edges.
#[derive(Debug, Default)]
pub struct LinkAnchor {
    identity: Identity,
    links: LinkList,
}

impl LinkAnchor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    pub fn set_identity(&mut self, identity: Identity) {
        self.identity = identity;
    }

    pub fn links(&self) -> &LinkList {
        &self.links
    }

    pub fn links_mut(&mut self) -> &mut LinkList {
        &mut self.links
    }
}

/// Capability trait for objects that take part in cross-references.
///
/// Implementors embed a [`LinkAnchor`], expose it here, and also expose it
/// through [`Serializable::link_anchor`] so identity persistence is
/// automatic; the link list itself is registered in the type's own `setup`.
pub trait Linkable: Serializable {
    fn anchor(&self) -> &LinkAnchor;
    fn anchor_mut(&mut self) -> &mut LinkAnchor;

    /// Number of outgoing edges carrying `name`.
    fn has_named_links(&self, name: &str) -> usize {
        self.anchor().links().count_named(name)
    }
}

/// Assigns and registers an identity if the node has none yet; idempotent.
/// Re-registering an already assigned node is also a no-op.
pub fn ensure_has_id(node: &LinkableNode, registry: &IdentityRegistry) -> Identity {
    let identity = {
        let mut inner = node.borrow_mut();
        let anchor = inner.anchor_mut();
        if !anchor.identity().is_assigned() {
            anchor.set_identity(registry.assign());
        }
        anchor.identity()
    };
    registry.register(identity, node);
    identity
}

/// Creates the edge (a→b, name) together with its mirror (b→a, name).
///
/// Either side skips insertion when an edge with the same (resolved target,
/// name) already exists, so repeating the call changes nothing.
pub fn add_link(a: &LinkableNode, b: &LinkableNode, name: &str, registry: &IdentityRegistry) {
    let id_a = ensure_has_id(a, registry);
    let id_b = ensure_has_id(b, registry);

    if Rc::ptr_eq(a, b) {
        let mut inner = a.borrow_mut();
        inner
            .anchor_mut()
            .links_mut()
            .add_link(Link::new(id_a, name), registry);
        return;
    }

    a.borrow_mut()
        .anchor_mut()
        .links_mut()
        .add_link(Link::new(id_b, name), registry);
    b.borrow_mut()
        .anchor_mut()
        .links_mut()
        .add_link(Link::new(id_a, name), registry);
}

/// Removes every edge from `a` to `target` (restricted to `name` when
/// given), and for each removed edge the mirror on `target` tagged with
/// that edge's own name. Returns how many edges were removed from `a`.
pub fn remove_link(
    a: &LinkableNode,
    target: &LinkableNode,
    name: Option<&str>,
    registry: &IdentityRegistry,
) -> usize {
    let removed = a
        .borrow_mut()
        .anchor_mut()
        .links_mut()
        .remove_matching(target, name, registry);

    if !Rc::ptr_eq(a, target) {
        for link in &removed {
            target
                .borrow_mut()
                .anchor_mut()
                .links_mut()
                .remove_matching(a, Some(link.name()), registry);
        }
    }
    removed.len()
}

/// Post-load repair pass for one node: restores the mirror of every
/// resolved outgoing edge that lacks one. Returns the number of mirrors
/// created. Unresolved edges are left alone — their target may register
/// later. A source without an identity gets one assigned on the first
/// mirror it needs, so the mirror stays resolvable.
pub fn ensure_bidirectional_links(node: &LinkableNode, registry: &IdentityRegistry) -> usize {
    let (mut own_identity, outgoing) = {
        let inner = node.borrow();
        let anchor = inner.anchor();
        (
            anchor.identity(),
            anchor.links().iter().cloned().collect::<Vec<Link>>(),
        )
    };

    let mut repaired = 0;
    for link in outgoing {
        let target = match link.resolve(registry) {
            Some(target) => target,
            None => continue,
        };
        // A self-edge is its own mirror.
        if Rc::ptr_eq(&target, node) {
            continue;
        }
        let needs_mirror = !target
            .borrow()
            .anchor()
            .links()
            .has_link_to(node, Some(link.name()), registry);
        if !needs_mirror {
            continue;
        }
        if !own_identity.is_assigned() {
            own_identity = ensure_has_id(node, registry);
        }
        let added = target
            .borrow_mut()
            .anchor_mut()
            .links_mut()
            .add_link(Link::new(own_identity, link.name()), registry);
        if added {
            info!(
                "restored missing mirror link `{}` from {} back to {}",
                link.name(),
                link.target_identity(),
                own_identity
            );
            repaired += 1;
        }
    }
    repaired
}
