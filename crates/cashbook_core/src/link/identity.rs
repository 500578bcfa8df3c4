//! Stable object identity and the per-graph owner registry.
//!
//! # Responsibility
//! - Assign small stable integers that let objects reference each other
//!   across a save/reload cycle, independent of memory addresses.
//! - Resolve an identity back to the live object currently holding it.
//!
//! # Invariants
//! - Identity −1 means unassigned; assigned identities are ≥ 0.
//! - Uniqueness is best-effort: assignment probes randomly, duplicates are
//!   logged and resolved deterministically, never fatally.
//! - Unregistering the last owner leaves an empty owner set rather than
//!   deleting the entry, so lookups stay well-defined.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use log::warn;
use rand::Rng;

use super::linkable::{Linkable, LinkableNode};

/// Stable logical identity of one linkable object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity(i64);

impl Default for Identity {
    fn default() -> Self {
        Self::UNASSIGNED
    }
}

impl Identity {
    pub const UNASSIGNED: Identity = Identity(-1);

    pub fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> i64 {
        self.0
    }

    pub fn is_assigned(&self) -> bool {
        self.0 >= 0
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Table mapping each identity to the set of live objects holding it.
///
/// Scoped to one graph session; independent sessions never share
/// identities. Owners are weak handles, so dropping an object is its
/// unregistration.
#[derive(Default)]
pub struct IdentityRegistry {
    owners: RefCell<HashMap<Identity, Vec<Weak<RefCell<dyn Linkable>>>>>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws random identities until one is free, and returns it without
    /// registering anything — the caller registers after storing the value
    /// in the owning object.
    pub fn assign(&self) -> Identity {
        let owners = self.owners.borrow();
        let mut rng = rand::thread_rng();
        loop {
            let candidate = Identity(rng.gen_range(0..=i32::MAX as i64));
            match owners.get(&candidate) {
                None => return candidate,
                Some(set) if set.iter().all(|weak| weak.upgrade().is_none()) => return candidate,
                Some(_) => {}
            }
        }
    }

    /// Adds `node` to the owner set of `identity`. Registering the same
    /// node twice is a no-op.
    pub fn register(&self, identity: Identity, node: &LinkableNode) {
        if !identity.is_assigned() {
            return;
        }
        let mut owners = self.owners.borrow_mut();
        let set = owners.entry(identity).or_default();
        let already_present = set
            .iter()
            .any(|weak| matches!(weak.upgrade(), Some(live) if Rc::ptr_eq(&live, node)));
        if !already_present {
            set.push(Rc::downgrade(node));
        }
    }

    /// Removes `node` from the owner set of `identity`, keeping the (then
    /// possibly empty) set in place.
    pub fn unregister(&self, identity: Identity, node: &LinkableNode) {
        let mut owners = self.owners.borrow_mut();
        if let Some(set) = owners.get_mut(&identity) {
            set.retain(|weak| matches!(weak.upgrade(), Some(live) if !Rc::ptr_eq(&live, node)));
        }
    }

    /// Resolves an identity to the live object holding it.
    ///
    /// Returns `None` for unassigned or unknown identities and for empty
    /// owner sets. More than one live owner is a data-integrity problem:
    /// it is logged and the earliest-registered owner wins, deterministic
    /// while the owner set is unchanged.
    pub fn resolve(&self, identity: Identity) -> Option<LinkableNode> {
        if !identity.is_assigned() {
            return None;
        }
        let mut owners = self.owners.borrow_mut();
        let set = owners.get_mut(&identity)?;
        set.retain(|weak| weak.upgrade().is_some());
        let live: Vec<LinkableNode> = set.iter().filter_map(|weak| weak.upgrade()).collect();
        if live.len() > 1 {
            warn!(
                "identity {identity} has {} live owners, resolving to the earliest",
                live.len()
            );
        }
        live.into_iter().next()
    }

    /// Number of live owners currently registered for `identity`.
    pub fn owner_count(&self, identity: Identity) -> usize {
        self.owners
            .borrow()
            .get(&identity)
            .map(|set| set.iter().filter(|weak| weak.upgrade().is_some()).count())
            .unwrap_or(0)
    }
}
