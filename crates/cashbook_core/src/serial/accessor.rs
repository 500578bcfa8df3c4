//! Serializable contract and the per-instance attribute registry.
//!
//! # Responsibility
//! - Define what a persisted type must provide: one `setup` declaration and
//!   four optional lifecycle hooks.
//! - Hold the named attribute bindings the engine walks, in registration
//!   order.
//!
//! # Invariants
//! - Attribute names are unique within one accessor; a duplicate
//!   registration is logged and ignored, the first binding wins.
//! - An accessor binds fields of exactly one instance and never outlives
//!   the call that built it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::warn;

use super::collection::{HashItem, ListItem};
use super::context::ReadContext;
use super::item::{PairItem, ScalarItem};
use super::pointer::{PointerFactory, PointerItem, Polymorphic};
use super::value::ScalarValue;
use super::Node;
use crate::link::{LinkAnchor, LinkList, LinkListItem, LinkableNode};
use crate::stream::{ElementReader, ElementWriter, StartTag, StreamResult};

/// Default key attribute for keyed-map entries.
pub const DEFAULT_HASH_KEY: &str = "name";

/// One registered field-to-behavior binding inside an [`Accessor`].
pub trait Attribute {
    /// Current value in inline tag-attribute form. `None` selects the
    /// nested-element form on write.
    fn inline_value(&self) -> Option<String> {
        None
    }

    /// Current value as plain text, when the attribute has one. Used for
    /// keyed-map key extraction.
    fn text_value(&self) -> Option<String> {
        None
    }

    /// Consumes an inline tag-attribute value.
    fn read_text(&mut self, text: &str, ctx: &mut ReadContext);

    /// Consumes the nested-element form; the reader is positioned just
    /// after `start`.
    fn read_element(
        &mut self,
        start: &StartTag,
        reader: &mut dyn ElementReader,
        ctx: &mut ReadContext,
    ) -> StreamResult<()>;

    /// Writes the nested-element form.
    fn write_element(&mut self, name: &str, writer: &mut dyn ElementWriter) -> StreamResult<()>;
}

/// Contract every persisted type implements.
///
/// `setup` registers one attribute per persisted field; the hooks default to
/// no-ops. Types that also carry a [`LinkAnchor`] expose it through
/// `link_anchor`, which makes identity persistence automatic — the engine
/// writes and reads the identity attribute itself, no registration needed.
///
/// `visit_linkables` reports every identity-bearing node reachable from
/// `self` (children first-hand, then recursively); containers forward to
/// their children. The post-load registration and repair passes depend on
/// it.
pub trait Serializable: 'static {
    /// Registers this instance's persisted attributes.
    fn setup<'a>(&'a mut self, acc: &mut Accessor<'a>);

    /// Runs before any field of this instance is read.
    fn prepare_read(&mut self, _ctx: &mut ReadContext) {}

    /// Runs after this instance's element is fully consumed, including
    /// after an aborted partial read.
    fn finished_read(&mut self, _ctx: &mut ReadContext) {}

    /// Runs before this instance's element is written.
    fn prepare_write(&mut self) {}

    /// Runs after this instance's element is written.
    fn finished_write(&mut self) {}

    fn link_anchor(&self) -> Option<&LinkAnchor> {
        None
    }

    fn link_anchor_mut(&mut self) -> Option<&mut LinkAnchor> {
        None
    }

    fn visit_linkables(&self, _visit: &mut dyn FnMut(&LinkableNode)) {}
}

/// Per-instance, per-call registry of named attribute bindings.
pub struct Accessor<'a> {
    attrs: Vec<(String, Box<dyn Attribute + 'a>)>,
}

impl<'a> Default for Accessor<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Accessor<'a> {
    pub fn new() -> Self {
        Self { attrs: Vec::new() }
    }

    /// Registers one attribute under a unique name.
    pub fn add_attribute(&mut self, name: &str, attr: Box<dyn Attribute + 'a>) {
        if self.attrs.iter().any(|(n, _)| n == name) {
            warn!("attribute `{name}` registered twice, keeping the first binding");
            return;
        }
        self.attrs.push((name.to_string(), attr));
    }

    /// Scalar field, nested-element form.
    pub fn add_scalar<T: ScalarValue>(&mut self, name: &str, field: &'a mut T) {
        self.add_attribute(name, Box::new(ScalarItem::nested(field)));
    }

    /// Scalar field, compact inline tag-attribute form.
    pub fn add_scalar_attr<T: ScalarValue>(&mut self, name: &str, field: &'a mut T) {
        self.add_attribute(name, Box::new(ScalarItem::inline(field)));
    }

    /// Getter/setter pair, nested-element form. The setter receives the
    /// read context for ambient lookups.
    pub fn add_pair(
        &mut self,
        name: &str,
        get: impl Fn() -> String + 'a,
        set: impl FnMut(&str, &mut ReadContext) + 'a,
    ) {
        self.add_attribute(name, Box::new(PairItem::nested(get, set)));
    }

    /// Getter/setter pair, inline tag-attribute form.
    pub fn add_pair_attr(
        &mut self,
        name: &str,
        get: impl Fn() -> String + 'a,
        set: impl FnMut(&str, &mut ReadContext) + 'a,
    ) {
        self.add_attribute(name, Box::new(PairItem::inline(get, set)));
    }

    /// Ordered collection of sub-objects, one `child_tag` element per entry.
    pub fn add_list<T: Serializable + Default>(
        &mut self,
        name: &str,
        child_tag: &str,
        entries: &'a mut Vec<Node<T>>,
    ) {
        self.add_attribute(name, Box::new(ListItem::new(child_tag, entries)));
    }

    /// Name-keyed collection of sub-objects, keyed by the entry's `name`
    /// attribute.
    pub fn add_hash<T: Serializable + Default>(
        &mut self,
        name: &str,
        child_tag: &str,
        entries: &'a mut HashMap<String, Node<T>>,
    ) {
        self.add_hash_keyed(name, child_tag, DEFAULT_HASH_KEY, entries);
    }

    /// Name-keyed collection with an explicit key attribute.
    pub fn add_hash_keyed<T: Serializable + Default>(
        &mut self,
        name: &str,
        child_tag: &str,
        key_attr: &str,
        entries: &'a mut HashMap<String, Node<T>>,
    ) {
        self.add_attribute(name, Box::new(HashItem::new(child_tag, key_attr, entries)));
    }

    /// Type-tagged polymorphic pointer slot.
    pub fn add_pointer<B: Polymorphic + ?Sized>(
        &mut self,
        name: &str,
        slot: &'a mut Option<Rc<RefCell<B>>>,
        factory: &'a PointerFactory<B>,
    ) {
        self.add_attribute(name, Box::new(PointerItem::new(slot, factory)));
    }

    /// Outgoing link collection of a linkable instance.
    pub fn add_links(&mut self, name: &str, links: &'a mut LinkList) {
        self.add_attribute(name, Box::new(LinkListItem::new(links)));
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// Current text value of the attribute registered under `name`.
    pub fn text_value(&self, name: &str) -> Option<String> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, attr)| attr.text_value())
    }

    pub(crate) fn find_mut(&mut self, name: &str) -> Option<&mut (dyn Attribute + 'a)> {
        self.attrs
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, attr)| attr.as_mut())
    }

    pub(crate) fn entries_mut(
        &mut self,
    ) -> impl Iterator<Item = (&str, &mut (dyn Attribute + 'a))> {
        self.attrs
            .iter_mut()
            .map(|(n, attr)| (n.as_str(), attr.as_mut()))
    }
}
