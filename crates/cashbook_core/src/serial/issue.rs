//! Aggregated, typed read diagnostics.
//!
//! # Responsibility
//! - Record every tolerated problem encountered during one load, with the
//!   field path where it happened.
//! - Give callers one report object instead of scattered log lines.
//!
//! # Invariants
//! - Issues never abort more than the element that produced them; anything
//!   fatal is a `StreamError`, not an issue.
//! - The report is plain data and serde-serializable for UI display.

use std::fmt::{Display, Formatter};

use serde::Serialize;

/// What went wrong at one point of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadIssueKind {
    /// A tag attribute no registered attribute claims. Skipped.
    UnknownAttribute,
    /// A nested element no registered attribute claims. Aborts the rest of
    /// the enclosing element.
    UnknownElement,
    /// A polymorphic type tag missing from the factory. Slot stays empty.
    UnknownTypeTag,
    /// Text that does not convert into the field's type. Field unchanged.
    ConversionFailure,
    /// An identity attribute that is not a valid identity value.
    InvalidIdentity,
    /// A keyed-map entry without its declared key attribute. Entry dropped.
    MissingHashKey,
}

impl Display for LoadIssueKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::UnknownAttribute => "unknown attribute",
            Self::UnknownElement => "unknown element",
            Self::UnknownTypeTag => "unknown type tag",
            Self::ConversionFailure => "conversion failure",
            Self::InvalidIdentity => "invalid identity",
            Self::MissingHashKey => "missing hash key",
        };
        f.write_str(label)
    }
}

/// One tolerated problem, located by the element path that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadIssue {
    pub kind: LoadIssueKind,
    /// Slash-joined element names from the root to the reporting element.
    pub path: String,
    pub detail: String,
}

impl Display for LoadIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}: {}", self.kind, self.path, self.detail)
    }
}

/// Outcome summary of one `load_graph` call.
#[derive(Debug, Default, Clone, Serialize)]
pub struct LoadReport {
    pub issues: Vec<LoadIssue>,
    /// Identity-bearing nodes registered after the read.
    pub linkables_registered: usize,
    /// Mirror edges restored by the repair pass.
    pub links_repaired: usize,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}
