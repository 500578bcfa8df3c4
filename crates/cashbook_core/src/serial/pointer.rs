//! Type-tagged polymorphic pointer persistence.
//!
//! # Responsibility
//! - Persist an optional pointer to any subtype of a base trait as a type
//!   tag plus the subtype's own data.
//! - Rebuild the concrete subtype on read through a per-base factory.
//!
//! # Invariants
//! - An unknown type tag records an issue and leaves the slot empty; the
//!   enclosing element keeps reading.
//! - An empty slot writes nothing and reads back empty.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::accessor::{Attribute, Serializable};
use super::context::ReadContext;
use super::engine::{self, TYPE_ATTRIBUTE};
use super::issue::LoadIssueKind;
use crate::stream::{ElementReader, ElementWriter, StartTag, StreamResult};

/// A persisted type that can sit behind a polymorphic pointer.
pub trait Polymorphic: Serializable {
    /// Stable tag written into the document to identify the concrete type.
    fn type_tag(&self) -> &'static str;
}

/// Per-base registry mapping type tags to constructors.
///
/// Domain code keeps one static factory per base trait and registers every
/// concrete subtype once.
pub struct PointerFactory<B: ?Sized> {
    builders: BTreeMap<&'static str, fn() -> Rc<RefCell<B>>>,
}

impl<B: ?Sized> Default for PointerFactory<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: ?Sized> PointerFactory<B> {
    pub fn new() -> Self {
        Self {
            builders: BTreeMap::new(),
        }
    }

    /// Registers one concrete subtype under its tag. The last registration
    /// for a tag wins.
    pub fn register(&mut self, tag: &'static str, build: fn() -> Rc<RefCell<B>>) {
        self.builders.insert(tag, build);
    }

    pub fn build(&self, tag: &str) -> Option<Rc<RefCell<B>>> {
        self.builders.get(tag).map(|build| build())
    }

    /// Registered tags in sorted order.
    pub fn tags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.builders.keys().copied()
    }
}

/// Binds one optional polymorphic pointer slot.
pub struct PointerItem<'a, B: Polymorphic + ?Sized> {
    slot: &'a mut Option<Rc<RefCell<B>>>,
    factory: &'a PointerFactory<B>,
}

impl<'a, B: Polymorphic + ?Sized> PointerItem<'a, B> {
    pub fn new(slot: &'a mut Option<Rc<RefCell<B>>>, factory: &'a PointerFactory<B>) -> Self {
        Self { slot, factory }
    }
}

impl<B: Polymorphic + ?Sized> Attribute for PointerItem<'_, B> {
    fn read_text(&mut self, _text: &str, ctx: &mut ReadContext) {
        ctx.issue(
            LoadIssueKind::ConversionFailure,
            "a pointer has no inline attribute form",
        );
    }

    fn read_element(
        &mut self,
        start: &StartTag,
        reader: &mut dyn ElementReader,
        ctx: &mut ReadContext,
    ) -> StreamResult<()> {
        let tag = match start.attr(TYPE_ATTRIBUTE) {
            Some(tag) => tag.to_string(),
            None => {
                ctx.issue(
                    LoadIssueKind::UnknownTypeTag,
                    format!("`{}` carries no type tag", start.name),
                );
                return reader.skip_subtree();
            }
        };
        match self.factory.build(&tag) {
            Some(built) => {
                let mut inner = start.clone();
                inner.remove_attr(TYPE_ATTRIBUTE);
                engine::read_element(&mut *built.borrow_mut(), &inner, reader, ctx)?;
                *self.slot = Some(built);
                Ok(())
            }
            None => {
                let known: Vec<&str> = self.factory.tags().collect();
                ctx.issue(
                    LoadIssueKind::UnknownTypeTag,
                    format!(
                        "no constructor registered for `{tag}`, known tags: {}",
                        known.join(", ")
                    ),
                );
                *self.slot = None;
                reader.skip_subtree()
            }
        }
    }

    fn write_element(&mut self, name: &str, writer: &mut dyn ElementWriter) -> StreamResult<()> {
        if let Some(target) = self.slot.as_ref() {
            let mut target = target.borrow_mut();
            let tag = target.type_tag();
            engine::write_element_with(&mut *target, name, &[(TYPE_ATTRIBUTE, tag)], writer)?;
        }
        Ok(())
    }
}
