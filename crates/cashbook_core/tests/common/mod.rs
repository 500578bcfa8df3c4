//! Shared domain fixtures for integration tests.
//!
//! A miniature ledger exercising the full attribute family: scalar and
//! inline scalar items, an accessor pair, an ordered list, a name-keyed
//! map, a polymorphic pointer slot and two linkable types.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use once_cell::sync::Lazy;

use cashbook_core::link::{LinkAnchor, Linkable, LinkableNode};
use cashbook_core::serial::{Accessor, Node, PointerFactory, Polymorphic, Serializable};

/// Ambient lookup table published by tests that exercise accessor pairs:
/// the category names known to the container currently being read.
pub struct KnownCategories(pub Vec<String>);

pub trait Attachment: Polymorphic {
    fn describe(&self) -> String;
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct FileAttachment {
    pub path: String,
}

impl Serializable for FileAttachment {
    fn setup<'a>(&'a mut self, acc: &mut Accessor<'a>) {
        acc.add_scalar("path", &mut self.path);
    }
}

impl Polymorphic for FileAttachment {
    fn type_tag(&self) -> &'static str {
        "file"
    }
}

impl Attachment for FileAttachment {
    fn describe(&self) -> String {
        format!("file:{}", self.path)
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct NoteAttachment {
    pub text: String,
}

impl Serializable for NoteAttachment {
    fn setup<'a>(&'a mut self, acc: &mut Accessor<'a>) {
        acc.add_scalar("text", &mut self.text);
    }
}

impl Polymorphic for NoteAttachment {
    fn type_tag(&self) -> &'static str {
        "note"
    }
}

impl Attachment for NoteAttachment {
    fn describe(&self) -> String {
        format!("note:{}", self.text)
    }
}

fn build_file_attachment() -> Rc<RefCell<dyn Attachment>> {
    Rc::new(RefCell::new(FileAttachment::default()))
}

fn build_note_attachment() -> Rc<RefCell<dyn Attachment>> {
    Rc::new(RefCell::new(NoteAttachment::default()))
}

pub static ATTACHMENT_FACTORY: Lazy<PointerFactory<dyn Attachment>> = Lazy::new(|| {
    let mut factory = PointerFactory::new();
    factory.register("file", build_file_attachment);
    factory.register("note", build_note_attachment);
    factory
});

#[derive(Default)]
pub struct Category {
    pub name: String,
    pub budget_cents: i64,
}

impl Serializable for Category {
    fn setup<'a>(&'a mut self, acc: &mut Accessor<'a>) {
        acc.add_scalar_attr("name", &mut self.name);
        acc.add_scalar("budget", &mut self.budget_cents);
    }
}

#[derive(Default)]
pub struct Transaction {
    pub anchor: LinkAnchor,
    pub memo: String,
    pub amount_cents: i64,
    pub cleared: bool,
}

impl Serializable for Transaction {
    fn setup<'a>(&'a mut self, acc: &mut Accessor<'a>) {
        acc.add_scalar_attr("memo", &mut self.memo);
        acc.add_scalar("amount", &mut self.amount_cents);
        acc.add_scalar("cleared", &mut self.cleared);
        acc.add_links("links", self.anchor.links_mut());
    }

    fn link_anchor(&self) -> Option<&LinkAnchor> {
        Some(&self.anchor)
    }

    fn link_anchor_mut(&mut self) -> Option<&mut LinkAnchor> {
        Some(&mut self.anchor)
    }
}

impl Linkable for Transaction {
    fn anchor(&self) -> &LinkAnchor {
        &self.anchor
    }

    fn anchor_mut(&mut self) -> &mut LinkAnchor {
        &mut self.anchor
    }
}

#[derive(Default)]
pub struct Document {
    pub anchor: LinkAnchor,
    pub title: String,
}

impl Serializable for Document {
    fn setup<'a>(&'a mut self, acc: &mut Accessor<'a>) {
        acc.add_scalar_attr("title", &mut self.title);
        acc.add_links("links", self.anchor.links_mut());
    }

    fn link_anchor(&self) -> Option<&LinkAnchor> {
        Some(&self.anchor)
    }

    fn link_anchor_mut(&mut self) -> Option<&mut LinkAnchor> {
        Some(&mut self.anchor)
    }
}

impl Linkable for Document {
    fn anchor(&self) -> &LinkAnchor {
        &self.anchor
    }

    fn anchor_mut(&mut self) -> &mut LinkAnchor {
        &mut self.anchor
    }
}

#[derive(Default)]
pub struct Account {
    pub name: String,
    pub currency: String,
    /// Category name resolved against the ambient [`KnownCategories`]
    /// table while reading; unknown names are kept verbatim.
    pub default_category: Rc<RefCell<String>>,
    pub transactions: Vec<Node<Transaction>>,
    pub categories: HashMap<String, Node<Category>>,
    pub attachment: Option<Rc<RefCell<dyn Attachment>>>,
}

impl Serializable for Account {
    fn setup<'a>(&'a mut self, acc: &mut Accessor<'a>) {
        acc.add_scalar_attr("name", &mut self.name);
        acc.add_scalar("currency", &mut self.currency);
        let get_store = self.default_category.clone();
        let set_store = self.default_category.clone();
        acc.add_pair(
            "default_category",
            move || get_store.borrow().clone(),
            move |text, ctx| {
                let resolved = match ctx.ambient::<KnownCategories>() {
                    Some(known) => known
                        .0
                        .iter()
                        .find(|name| name.eq_ignore_ascii_case(text))
                        .cloned()
                        .unwrap_or_else(|| text.to_string()),
                    None => text.to_string(),
                };
                *set_store.borrow_mut() = resolved;
            },
        );
        acc.add_list("transactions", "transaction", &mut self.transactions);
        acc.add_hash("categories", "category", &mut self.categories);
        acc.add_pointer("attachment", &mut self.attachment, &ATTACHMENT_FACTORY);
    }

    fn visit_linkables(&self, visit: &mut dyn FnMut(&LinkableNode)) {
        for transaction in &self.transactions {
            let handle: LinkableNode = transaction.clone();
            visit(&handle);
        }
    }
}

#[derive(Default)]
pub struct Ledger {
    pub accounts: Vec<Node<Account>>,
    pub documents: Vec<Node<Document>>,
}

impl Serializable for Ledger {
    fn setup<'a>(&'a mut self, acc: &mut Accessor<'a>) {
        acc.add_list("accounts", "account", &mut self.accounts);
        acc.add_list("documents", "document", &mut self.documents);
    }

    fn visit_linkables(&self, visit: &mut dyn FnMut(&LinkableNode)) {
        for account in &self.accounts {
            account.borrow().visit_linkables(visit);
        }
        for document in &self.documents {
            let handle: LinkableNode = document.clone();
            visit(&handle);
        }
    }
}
