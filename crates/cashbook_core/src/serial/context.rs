//! Per-load read context threaded through every read call.
//!
//! # Responsibility
//! - Carry the ambient lookups accessor-pair setters need (the container
//!   currently being read, name tables, and similar), as explicit state
//!   instead of process globals.
//! - Collect issues with the element path where they occurred.
//! - Expose the bulk-load flag that suppresses per-field change
//!   notifications while a whole document is streaming in.
//!
//! # Invariants
//! - One context belongs to one load; independent loads never share state.
//! - Path segments are pushed and popped symmetrically by the engine and
//!   the container attributes.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::rc::Rc;

use log::warn;

use super::issue::{LoadIssue, LoadIssueKind};

/// Mutable state of one in-progress load.
pub struct ReadContext {
    ambient: HashMap<TypeId, Rc<dyn Any>>,
    issues: Vec<LoadIssue>,
    path: Vec<String>,
    bulk_load: bool,
}

impl Default for ReadContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadContext {
    pub fn new() -> Self {
        Self {
            ambient: HashMap::new(),
            issues: Vec::new(),
            path: Vec::new(),
            bulk_load: false,
        }
    }

    /// Publishes one ambient value, keyed by its type. A second value of the
    /// same type replaces the first.
    pub fn set_ambient<T: 'static>(&mut self, value: T) {
        self.ambient.insert(TypeId::of::<T>(), Rc::new(value));
    }

    /// Looks up the ambient value of type `T`, if one was published.
    pub fn ambient<T: 'static>(&self) -> Option<Rc<T>> {
        self.ambient
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|any| any.downcast::<T>().ok())
    }

    /// True while a whole document is streaming in; setters may skip
    /// per-field change notifications.
    pub fn is_bulk_load(&self) -> bool {
        self.bulk_load
    }

    pub fn set_bulk_load(&mut self, bulk: bool) {
        self.bulk_load = bulk;
    }

    /// Records one tolerated problem at the current path and logs it.
    pub fn issue(&mut self, kind: LoadIssueKind, detail: impl Into<String>) {
        let issue = LoadIssue {
            kind,
            path: self.current_path(),
            detail: detail.into(),
        };
        warn!("{issue}");
        self.issues.push(issue);
    }

    pub fn issues(&self) -> &[LoadIssue] {
        &self.issues
    }

    pub fn take_issues(&mut self) -> Vec<LoadIssue> {
        std::mem::take(&mut self.issues)
    }

    pub fn push_segment(&mut self, name: &str) {
        self.path.push(name.to_string());
    }

    pub fn pop_segment(&mut self) {
        self.path.pop();
    }

    /// Slash-joined path of the element currently being read.
    pub fn current_path(&self) -> String {
        self.path.join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambient_values_are_typed_slots() {
        struct CategoryNames(Vec<String>);

        let mut ctx = ReadContext::new();
        ctx.set_ambient(CategoryNames(vec!["food".into()]));

        let names = ctx.ambient::<CategoryNames>().unwrap();
        assert_eq!(names.0, vec!["food".to_string()]);
        assert!(ctx.ambient::<String>().is_none());
    }

    #[test]
    fn issues_capture_current_path() {
        let mut ctx = ReadContext::new();
        ctx.push_segment("ledger");
        ctx.push_segment("account");
        ctx.issue(LoadIssueKind::UnknownAttribute, "color");
        ctx.pop_segment();

        assert_eq!(ctx.issues().len(), 1);
        assert_eq!(ctx.issues()[0].path, "ledger/account");
    }
}
