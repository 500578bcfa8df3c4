//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `cashbook_core` linkage: build
//!   a two-entry graph, link it, save it, reload it, print the report.
//! - Keep output readable for quick local sanity checks.

use std::error::Error;

use cashbook_core::link::{add_link, LinkAnchor, Linkable, LinkableNode};
use cashbook_core::serial::{node, Accessor, Node, Serializable};
use cashbook_core::{load_graph, save_graph, GraphSession};

#[derive(Default)]
struct Entry {
    anchor: LinkAnchor,
    label: String,
}

impl Serializable for Entry {
    fn setup<'a>(&'a mut self, acc: &mut Accessor<'a>) {
        acc.add_scalar_attr("label", &mut self.label);
        acc.add_links("links", self.anchor.links_mut());
    }

    fn link_anchor(&self) -> Option<&LinkAnchor> {
        Some(&self.anchor)
    }

    fn link_anchor_mut(&mut self) -> Option<&mut LinkAnchor> {
        Some(&mut self.anchor)
    }
}

impl Linkable for Entry {
    fn anchor(&self) -> &LinkAnchor {
        &self.anchor
    }

    fn anchor_mut(&mut self) -> &mut LinkAnchor {
        &mut self.anchor
    }
}

#[derive(Default)]
struct Book {
    entries: Vec<Node<Entry>>,
}

impl Serializable for Book {
    fn setup<'a>(&'a mut self, acc: &mut Accessor<'a>) {
        acc.add_list("entries", "entry", &mut self.entries);
    }

    fn visit_linkables(&self, visit: &mut dyn FnMut(&LinkableNode)) {
        for entry in &self.entries {
            let handle: LinkableNode = entry.clone();
            visit(&handle);
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    println!("cashbook_core version={}", cashbook_core::core_version());

    let session = GraphSession::new();
    let payment = node(Entry {
        label: "payment".into(),
        ..Entry::default()
    });
    let receipt = node(Entry {
        label: "receipt".into(),
        ..Entry::default()
    });
    let payment_handle: LinkableNode = payment.clone();
    let receipt_handle: LinkableNode = receipt.clone();
    add_link(
        &payment_handle,
        &receipt_handle,
        "evidence",
        session.registry(),
    );

    let book = node(Book::default());
    book.borrow_mut().entries = vec![payment, receipt];

    let mut bytes = Vec::new();
    save_graph(&book, "book", &mut bytes)?;
    println!("--- saved document ---");
    print!("{}", String::from_utf8_lossy(&bytes));

    let fresh_session = GraphSession::new();
    let reloaded = node(Book::default());
    let report = load_graph(&reloaded, "book", bytes.as_slice(), &fresh_session)?;
    println!("--- reload report ---");
    println!(
        "entries={} issues={} registered={} repaired={}",
        reloaded.borrow().entries.len(),
        report.issues.len(),
        report.linkables_registered,
        report.links_repaired
    );
    Ok(())
}
