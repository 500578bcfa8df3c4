//! Directed, named edges and the per-object edge collection.
//!
//! # Responsibility
//! - Model one edge as (target identity, edge name) and keep resolution
//!   lazy — objects arrive in document order, so a target may not exist yet
//!   when its edge is read.
//! - Keep one object's outgoing edges ordered and free of duplicates.
//!
//! # Invariants
//! - No two entries of one list share (resolved target, name).
//! - A dangling edge is not an error; it is skipped when listing resolved
//!   targets and may start resolving again once its target registers.

use std::rc::Rc;

use super::identity::{Identity, IdentityRegistry};
use super::linkable::LinkableNode;
use crate::serial::accessor::{Accessor, Attribute, Serializable};
use crate::serial::context::ReadContext;
use crate::serial::engine;
use crate::serial::issue::LoadIssueKind;
use crate::stream::{ElementReader, ElementWriter, StartTag, StreamResult, Token};

/// Element tag of one serialized edge.
const LINK_TAG: &str = "link";

/// One directed, named edge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Link {
    target: Identity,
    name: String,
}

impl Link {
    pub fn new(target: Identity, name: impl Into<String>) -> Self {
        Self {
            target,
            name: name.into(),
        }
    }

    pub fn target_identity(&self) -> Identity {
        self.target
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolves the target on every call, never caching the outcome.
    pub fn resolve(&self, registry: &IdentityRegistry) -> Option<LinkableNode> {
        registry.resolve(self.target)
    }
}

impl Serializable for Link {
    fn setup<'a>(&'a mut self, acc: &mut Accessor<'a>) {
        acc.add_scalar_attr("target", &mut self.target);
        acc.add_scalar_attr("name", &mut self.name);
    }
}

/// Ordered outgoing edges of one object.
#[derive(Debug, Default, Clone)]
pub struct LinkList {
    entries: Vec<Link>,
}

impl LinkList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Link> {
        self.entries.iter()
    }

    /// Dedup-and-append primitive: appends unless an entry with the same
    /// (resolved target, name) already exists. Returns whether the edge was
    /// added.
    pub fn add_link(&mut self, link: Link, registry: &IdentityRegistry) -> bool {
        let duplicate = self
            .entries
            .iter()
            .any(|existing| existing.name == link.name && same_target(existing, &link, registry));
        if duplicate {
            return false;
        }
        self.entries.push(link);
        true
    }

    /// Append during load: resolution is unavailable mid-read, so
    /// duplicates are detected by raw identity only.
    pub(crate) fn insert_loaded(&mut self, link: Link) {
        let duplicate = self
            .entries
            .iter()
            .any(|existing| existing.name == link.name && existing.target == link.target);
        if !duplicate {
            self.entries.push(link);
        }
    }

    /// Number of outgoing edges carrying `name`.
    pub fn count_named(&self, name: &str) -> usize {
        self.entries.iter().filter(|link| link.name == name).count()
    }

    /// Whether an edge to `target` exists, optionally restricted to `name`.
    pub fn has_link_to(
        &self,
        target: &LinkableNode,
        name: Option<&str>,
        registry: &IdentityRegistry,
    ) -> bool {
        self.entries.iter().any(|link| {
            name.map_or(true, |n| link.name == n) && resolves_to(link, target, registry)
        })
    }

    /// Removes every edge matching `target` (and `name`, when given);
    /// returns the removed edges in their original order.
    pub fn remove_matching(
        &mut self,
        target: &LinkableNode,
        name: Option<&str>,
        registry: &IdentityRegistry,
    ) -> Vec<Link> {
        let mut removed = Vec::new();
        self.entries.retain(|link| {
            let matches =
                name.map_or(true, |n| link.name == n) && resolves_to(link, target, registry);
            if matches {
                removed.push(link.clone());
            }
            !matches
        });
        removed
    }

    /// Live targets of the edges carrying `name`, in edge order. Dangling
    /// edges are silently skipped.
    pub fn resolved_targets(&self, name: &str, registry: &IdentityRegistry) -> Vec<LinkableNode> {
        self.entries
            .iter()
            .filter(|link| link.name == name)
            .filter_map(|link| link.resolve(registry))
            .collect()
    }
}

fn resolves_to(link: &Link, target: &LinkableNode, registry: &IdentityRegistry) -> bool {
    match link.resolve(registry) {
        Some(resolved) => Rc::ptr_eq(&resolved, target),
        None => false,
    }
}

/// Two edges point at the same object: compared by resolved handle when
/// both resolve, by raw identity otherwise.
fn same_target(a: &Link, b: &Link, registry: &IdentityRegistry) -> bool {
    match (a.resolve(registry), b.resolve(registry)) {
        (Some(ra), Some(rb)) => Rc::ptr_eq(&ra, &rb),
        _ => a.target == b.target,
    }
}

/// Serialization binding for one object's [`LinkList`].
pub struct LinkListItem<'a> {
    links: &'a mut LinkList,
}

impl<'a> LinkListItem<'a> {
    pub fn new(links: &'a mut LinkList) -> Self {
        Self { links }
    }
}

impl Attribute for LinkListItem<'_> {
    fn read_text(&mut self, _text: &str, ctx: &mut ReadContext) {
        ctx.issue(
            LoadIssueKind::ConversionFailure,
            "a link list has no inline attribute form",
        );
    }

    fn read_element(
        &mut self,
        start: &StartTag,
        reader: &mut dyn ElementReader,
        ctx: &mut ReadContext,
    ) -> StreamResult<()> {
        ctx.push_segment(&start.name);
        loop {
            match reader.next_token()? {
                Token::Start(child) if child.name == LINK_TAG => {
                    let mut entry = Link::default();
                    engine::read_element(&mut entry, &child, reader, ctx)?;
                    self.links.insert_loaded(entry);
                }
                Token::Start(child) => {
                    ctx.issue(
                        LoadIssueKind::UnknownElement,
                        format!("`{}` inside link list `{}`", child.name, start.name),
                    );
                    reader.skip_subtree()?;
                    reader.skip_subtree()?;
                    break;
                }
                Token::Text(_) => {}
                Token::End(_) => break,
                Token::Eof => return Err(crate::stream::StreamError::UnexpectedEof),
            }
        }
        ctx.pop_segment();
        Ok(())
    }

    fn write_element(&mut self, name: &str, writer: &mut dyn ElementWriter) -> StreamResult<()> {
        writer.open_element(name)?;
        for link in self.links.entries.iter_mut() {
            engine::write_element(link, LINK_TAG, writer)?;
        }
        writer.close_element()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_link_dedups_by_raw_identity_when_unresolved() {
        let registry = IdentityRegistry::new();
        let mut links = LinkList::new();

        assert!(links.add_link(Link::new(Identity::from_raw(7), "evidence"), &registry));
        assert!(!links.add_link(Link::new(Identity::from_raw(7), "evidence"), &registry));
        assert!(links.add_link(Link::new(Identity::from_raw(7), "receipt"), &registry));

        assert_eq!(links.len(), 2);
        assert_eq!(links.count_named("evidence"), 1);
    }

    #[test]
    fn dangling_links_are_invisible_in_resolved_targets() {
        let registry = IdentityRegistry::new();
        let mut links = LinkList::new();
        links.add_link(Link::new(Identity::from_raw(3), "evidence"), &registry);

        assert!(links.resolved_targets("evidence", &registry).is_empty());
        assert_eq!(links.count_named("evidence"), 1);
    }
}
