//! Reflective attribute-accessor serialization engine.
//!
//! # Responsibility
//! - Let each domain type declare, in one place, which fields persist and
//!   how (scalar, accessor pair, list, keyed map, polymorphic pointer).
//! - Walk those declarations depth-first for both writing and reading.
//!
//! # Invariants
//! - An accessor is rebuilt fresh for every top-level read or write call and
//!   discarded afterwards; no attribute registry survives between calls.
//! - Tolerated read problems degrade one field or one element, never the
//!   whole document.

use std::cell::RefCell;
use std::rc::Rc;

pub mod accessor;
pub mod collection;
pub mod context;
pub mod engine;
pub mod issue;
pub mod item;
pub mod pointer;
pub mod value;

pub use accessor::{Accessor, Attribute, Serializable};
pub use context::ReadContext;
pub use engine::{
    attribute_text, read_element, write_element, write_element_with, IDENTITY_ATTRIBUTE,
    TYPE_ATTRIBUTE,
};
pub use issue::{LoadIssue, LoadIssueKind, LoadReport};
pub use item::{PairItem, ScalarItem};
pub use pointer::{PointerFactory, Polymorphic};
pub use value::{ScalarValue, ValueParseError};

/// Shared handle to one node of the persisted object tree.
///
/// Ownership of sub-objects is by shared handle so the identity registry can
/// hold weak references to the same nodes their containers own.
pub type Node<T> = Rc<RefCell<T>>;

/// Wraps a value into a [`Node`] handle.
pub fn node<T>(value: T) -> Node<T> {
    Rc::new(RefCell::new(value))
}
