//! Collection attribute bindings: ordered lists and name-keyed maps.
//!
//! # Responsibility
//! - Persist attributes that are themselves collections of child persisted
//!   objects, each child delegating to its own accessor.
//!
//! # Invariants
//! - List growth during read is append-default-then-recurse, so entries
//!   land strictly in stream order; zero child tags leave the list empty.
//! - Map entries are written in ascending key order, so re-serializing
//!   unmodified data is byte-identical across runs.

use std::collections::HashMap;

use super::accessor::{Attribute, Serializable};
use super::context::ReadContext;
use super::engine;
use super::issue::LoadIssueKind;
use super::{node, Node};
use crate::stream::{ElementReader, ElementWriter, StartTag, StreamResult, Token};

/// Ordered sequence of child objects, one `child_tag` element per entry.
pub struct ListItem<'a, T: Serializable + Default> {
    child_tag: String,
    entries: &'a mut Vec<Node<T>>,
}

impl<'a, T: Serializable + Default> ListItem<'a, T> {
    pub fn new(child_tag: &str, entries: &'a mut Vec<Node<T>>) -> Self {
        Self {
            child_tag: child_tag.to_string(),
            entries,
        }
    }

    /// Appends one default entry and returns its handle for the recursing
    /// read.
    fn augment(&mut self) -> Node<T> {
        let entry = node(T::default());
        self.entries.push(entry.clone());
        entry
    }
}

impl<T: Serializable + Default> Attribute for ListItem<'_, T> {
    fn read_text(&mut self, _text: &str, ctx: &mut ReadContext) {
        ctx.issue(
            LoadIssueKind::ConversionFailure,
            "a list has no inline attribute form",
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
                Token::Start(child) if child.name == self.child_tag => {
                    let entry = self.augment();
                    engine::read_element(&mut *entry.borrow_mut(), &child, reader, ctx)?;
                }
                Token::Start(child) => {
                    ctx.issue(
                        LoadIssueKind::UnknownElement,
                        format!("`{}` inside list `{}`", child.name, start.name),
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
        for entry in self.entries.iter() {
            engine::write_element(&mut *entry.borrow_mut(), &self.child_tag, writer)?;
        }
        writer.close_element()
    }
}

/// Name-keyed map of child objects, keyed by a declared key attribute of
/// the child.
pub struct HashItem<'a, T: Serializable + Default> {
    child_tag: String,
    key_attr: String,
    entries: &'a mut HashMap<String, Node<T>>,
}

impl<'a, T: Serializable + Default> HashItem<'a, T> {
    pub fn new(child_tag: &str, key_attr: &str, entries: &'a mut HashMap<String, Node<T>>) -> Self {
        Self {
            child_tag: child_tag.to_string(),
            key_attr: key_attr.to_string(),
            entries,
        }
    }
}

impl<T: Serializable + Default> Attribute for HashItem<'_, T> {
    fn read_text(&mut self, _text: &str, ctx: &mut ReadContext) {
        ctx.issue(
            LoadIssueKind::ConversionFailure,
            "a keyed map has no inline attribute form",
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
                Token::Start(child) if child.name == self.child_tag => {
                    let entry = node(T::default());
                    engine::read_element(&mut *entry.borrow_mut(), &child, reader, ctx)?;
                    let key = engine::attribute_text(&mut *entry.borrow_mut(), &self.key_attr);
                    match key {
                        Some(key) => {
                            self.entries.insert(key, entry);
                        }
                        None => ctx.issue(
                            LoadIssueKind::MissingHashKey,
                            format!(
                                "`{}` entry without key attribute `{}`",
                                child.name, self.key_attr
                            ),
                        ),
                    }
                }
                Token::Start(child) => {
                    ctx.issue(
                        LoadIssueKind::UnknownElement,
                        format!("`{}` inside map `{}`", child.name, start.name),
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
        let mut keys: Vec<&String> = self.entries.keys().collect();
        keys.sort();
        for key in keys {
            if let Some(entry) = self.entries.get(key) {
                engine::write_element(&mut *entry.borrow_mut(), &self.child_tag, writer)?;
            }
        }
        writer.close_element()
    }
}
