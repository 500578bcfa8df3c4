//! Depth-first recursive descent over accessors.
//!
//! # Responsibility
//! - Drive one object's write: hooks, open tag, identity, inline
//!   attributes, nested attributes, close tag.
//! - Drive one object's read: hooks, identity, tag-attribute dispatch,
//!   child-element dispatch.
//!
//! # Invariants
//! - Inline attributes are written before any nested element, each group in
//!   registration order.
//! - An unknown tag attribute is skipped; an unknown child element aborts
//!   the rest of this object's read. Attribute-level additions to the
//!   format are forward-compatible, element-level additions are not — that
//!   asymmetry is the documented compatibility policy.

use super::accessor::{Accessor, Serializable};
use super::context::ReadContext;
use super::issue::LoadIssueKind;
use super::value::ScalarValue;
use crate::link::Identity;
use crate::stream::{ElementReader, ElementWriter, StartTag, StreamResult, Token};

/// Reserved inline attribute carrying an object's identity.
pub const IDENTITY_ATTRIBUTE: &str = "id";
/// Reserved inline attribute carrying a pointer's concrete type tag.
pub const TYPE_ATTRIBUTE: &str = "type";

/// Writes one object as the element `tag`.
pub fn write_element<T: Serializable + ?Sized>(
    obj: &mut T,
    tag: &str,
    writer: &mut dyn ElementWriter,
) -> StreamResult<()> {
    write_element_with(obj, tag, &[], writer)
}

/// Writes one object as the element `tag`, with extra engine-level inline
/// attributes (used for pointer type tags) emitted first.
pub fn write_element_with<T: Serializable + ?Sized>(
    obj: &mut T,
    tag: &str,
    extra: &[(&str, &str)],
    writer: &mut dyn ElementWriter,
) -> StreamResult<()> {
    obj.prepare_write();
    writer.open_element(tag)?;
    for (name, value) in extra {
        writer.attribute(name, value)?;
    }
    if let Some(anchor) = obj.link_anchor() {
        let identity = anchor.identity();
        if identity.is_assigned() {
            writer.attribute(IDENTITY_ATTRIBUTE, &identity.to_text())?;
        }
    }

    let mut acc = Accessor::new();
    obj.setup(&mut acc);
    for (name, attr) in acc.entries_mut() {
        if let Some(value) = attr.inline_value() {
            writer.attribute(name, &value)?;
        }
    }
    for (name, attr) in acc.entries_mut() {
        if attr.inline_value().is_none() {
            attr.write_element(name, writer)?;
        }
    }
    drop(acc);

    writer.close_element()?;
    obj.finished_write();
    Ok(())
}

/// Reads one object from the element `start`; the reader is positioned just
/// after the start tag.
///
/// Unknown tag attributes are recorded and skipped. An unknown child
/// element is recorded, then the rest of this element is skipped; fields
/// already set stay set and sibling elements of `start` are unaffected.
pub fn read_element<T: Serializable + ?Sized>(
    obj: &mut T,
    start: &StartTag,
    reader: &mut dyn ElementReader,
    ctx: &mut ReadContext,
) -> StreamResult<()> {
    ctx.push_segment(&start.name);
    obj.prepare_read(ctx);

    let is_linkable = obj.link_anchor().is_some();
    if is_linkable {
        if let Some(text) = start.attr(IDENTITY_ATTRIBUTE) {
            match Identity::parse_text(text) {
                Ok(identity) => {
                    if let Some(anchor) = obj.link_anchor_mut() {
                        anchor.set_identity(identity);
                    }
                }
                Err(err) => ctx.issue(LoadIssueKind::InvalidIdentity, err.to_string()),
            }
        }
    }

    let mut acc = Accessor::new();
    obj.setup(&mut acc);

    for (name, value) in start.attrs() {
        if is_linkable && name == IDENTITY_ATTRIBUTE {
            continue;
        }
        match acc.find_mut(name) {
            Some(attr) => attr.read_text(value, ctx),
            None => ctx.issue(
                LoadIssueKind::UnknownAttribute,
                format!("`{name}` on `{}`", start.name),
            ),
        }
    }

    loop {
        match reader.next_token()? {
            Token::Start(child) => match acc.find_mut(&child.name) {
                Some(attr) => attr.read_element(&child, reader, ctx)?,
                None => {
                    ctx.issue(
                        LoadIssueKind::UnknownElement,
                        format!("`{}` inside `{}`", child.name, start.name),
                    );
                    reader.skip_subtree()?;
                    reader.skip_subtree()?;
                    break;
                }
            },
            Token::Text(_) => {}
            Token::End(_) => break,
            Token::Eof => return Err(crate::stream::StreamError::UnexpectedEof),
        }
    }
    drop(acc);

    obj.finished_read(ctx);
    ctx.pop_segment();
    Ok(())
}

/// Current text value of one registered attribute, through a fresh
/// accessor. Used for keyed-map key extraction.
pub fn attribute_text<T: Serializable + ?Sized>(obj: &mut T, name: &str) -> Option<String> {
    let mut acc = Accessor::new();
    obj.setup(&mut acc);
    acc.text_value(name)
}
