//! Leaf attribute bindings: scalar fields and accessor pairs.
//!
//! # Responsibility
//! - Convert exactly one field (or getter/setter pair) to and from text.
//! - Carry the inline-vs-nested formatting choice of the declaring type.
//!
//! # Invariants
//! - Unconvertible text records an issue and leaves the field unchanged;
//!   sibling fields keep reading.
//! - The reader accepts both the inline and the nested form regardless of
//!   the declared write form.

use super::accessor::Attribute;
use super::context::ReadContext;
use super::issue::LoadIssueKind;
use super::value::ScalarValue;
use crate::stream::{ElementReader, ElementWriter, StartTag, StreamResult, Token};

/// Collects the text content of a leaf element, tolerating and skipping
/// unexpected child elements, and consumes the close tag.
fn collect_leaf_text(
    reader: &mut dyn ElementReader,
    ctx: &mut ReadContext,
) -> StreamResult<String> {
    let mut text = String::new();
    loop {
        match reader.next_token()? {
            Token::Text(chunk) => text.push_str(&chunk),
            Token::Start(child) => {
                ctx.issue(
                    LoadIssueKind::ConversionFailure,
                    format!("unexpected element `{}` inside a scalar value", child.name),
                );
                reader.skip_subtree()?;
            }
            Token::End(_) => return Ok(text),
            Token::Eof => return Err(crate::stream::StreamError::UnexpectedEof),
        }
    }
}

/// Binds one primitive-like field.
pub struct ScalarItem<'a, T: ScalarValue> {
    field: &'a mut T,
    inline: bool,
}

impl<'a, T: ScalarValue> ScalarItem<'a, T> {
    pub fn nested(field: &'a mut T) -> Self {
        Self {
            field,
            inline: false,
        }
    }

    pub fn inline(field: &'a mut T) -> Self {
        Self {
            field,
            inline: true,
        }
    }

    fn set_from_text(&mut self, text: &str, ctx: &mut ReadContext) {
        match T::parse_text(text) {
            Ok(value) => *self.field = value,
            Err(err) => ctx.issue(LoadIssueKind::ConversionFailure, err.to_string()),
        }
    }
}

impl<T: ScalarValue> Attribute for ScalarItem<'_, T> {
    fn inline_value(&self) -> Option<String> {
        self.inline.then(|| self.field.to_text())
    }

    fn text_value(&self) -> Option<String> {
        Some(self.field.to_text())
    }

    fn read_text(&mut self, text: &str, ctx: &mut ReadContext) {
        self.set_from_text(text, ctx);
    }

    fn read_element(
        &mut self,
        _start: &StartTag,
        reader: &mut dyn ElementReader,
        ctx: &mut ReadContext,
    ) -> StreamResult<()> {
        let text = collect_leaf_text(reader, ctx)?;
        self.set_from_text(&text, ctx);
        Ok(())
    }

    fn write_element(&mut self, name: &str, writer: &mut dyn ElementWriter) -> StreamResult<()> {
        writer.open_element(name)?;
        let text = self.field.to_text();
        if !text.is_empty() {
            writer.text(&text)?;
        }
        writer.close_element()
    }
}

/// Binds a getter/setter pair instead of a raw field.
///
/// Used when the stored text must be resolved through the read context, for
/// example a name looked up against the container currently being read.
pub struct PairItem<'a> {
    get: Box<dyn Fn() -> String + 'a>,
    set: Box<dyn FnMut(&str, &mut ReadContext) + 'a>,
    inline: bool,
}

impl<'a> PairItem<'a> {
    pub fn nested(
        get: impl Fn() -> String + 'a,
        set: impl FnMut(&str, &mut ReadContext) + 'a,
    ) -> Self {
        Self {
            get: Box::new(get),
            set: Box::new(set),
            inline: false,
        }
    }

    pub fn inline(
        get: impl Fn() -> String + 'a,
        set: impl FnMut(&str, &mut ReadContext) + 'a,
    ) -> Self {
        Self {
            get: Box::new(get),
            set: Box::new(set),
            inline: true,
        }
    }
}

impl Attribute for PairItem<'_> {
    fn inline_value(&self) -> Option<String> {
        self.inline.then(|| (self.get)())
    }

    fn text_value(&self) -> Option<String> {
        Some((self.get)())
    }

    fn read_text(&mut self, text: &str, ctx: &mut ReadContext) {
        (self.set)(text, ctx);
    }

    fn read_element(
        &mut self,
        _start: &StartTag,
        reader: &mut dyn ElementReader,
        ctx: &mut ReadContext,
    ) -> StreamResult<()> {
        let text = collect_leaf_text(reader, ctx)?;
        (self.set)(&text, ctx);
        Ok(())
    }

    fn write_element(&mut self, name: &str, writer: &mut dyn ElementWriter) -> StreamResult<()> {
        writer.open_element(name)?;
        let text = (self.get)();
        if !text.is_empty() {
            writer.text(&text)?;
        }
        writer.close_element()
    }
}
