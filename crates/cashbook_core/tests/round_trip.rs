mod common;

use std::cell::{Cell, RefCell};
use std::fs::File;
use std::rc::Rc;

use cashbook_core::link::{add_link, Linkable, LinkableNode};
use cashbook_core::serial::{node, Accessor, Serializable};
use cashbook_core::{load_graph, load_graph_with, save_graph, GraphSession, ReadContext};

use common::{Account, Category, Document, KnownCategories, Ledger, Transaction};

fn sample_ledger(session: &GraphSession) -> cashbook_core::Node<Ledger> {
    let groceries = node(Transaction {
        memo: "groceries".into(),
        amount_cents: -4_350,
        cleared: true,
        ..Transaction::default()
    });
    let salary = node(Transaction {
        memo: "salary".into(),
        amount_cents: 250_000,
        ..Transaction::default()
    });
    let receipt = node(Document {
        title: "Receipt 42".into(),
        ..Document::default()
    });

    let groceries_handle: LinkableNode = groceries.clone();
    let receipt_handle: LinkableNode = receipt.clone();
    add_link(
        &groceries_handle,
        &receipt_handle,
        "evidence",
        session.registry(),
    );

    let account = node(Account {
        name: "Checking".into(),
        currency: "EUR".into(),
        ..Account::default()
    });
    account.borrow_mut().transactions = vec![groceries, salary];
    account.borrow_mut().categories.insert(
        "food".into(),
        node(Category {
            name: "food".into(),
            budget_cents: 30_000,
        }),
    );
    account.borrow_mut().categories.insert(
        "rent".into(),
        node(Category {
            name: "rent".into(),
            budget_cents: 80_000,
        }),
    );

    let ledger = node(Ledger::default());
    ledger.borrow_mut().accounts = vec![account];
    ledger.borrow_mut().documents = vec![receipt];
    ledger
}

#[test]
fn save_reload_repair_restores_scenario() {
    let session = GraphSession::new();
    let ledger = sample_ledger(&session);

    let mut bytes = Vec::new();
    save_graph(&ledger, "ledger", &mut bytes).unwrap();
    drop(ledger);
    drop(session);

    let fresh_session = GraphSession::new();
    let reloaded = node(Ledger::default());
    let report = load_graph(&reloaded, "ledger", bytes.as_slice(), &fresh_session).unwrap();
    assert!(report.is_clean(), "unexpected issues: {:?}", report.issues);

    let ledger = reloaded.borrow();
    assert_eq!(ledger.accounts.len(), 1);
    let account = ledger.accounts[0].borrow();
    assert_eq!(account.name, "Checking");
    assert_eq!(account.currency, "EUR");

    // List order and values survive.
    assert_eq!(account.transactions.len(), 2);
    let first = account.transactions[0].borrow();
    let second = account.transactions[1].borrow();
    assert_eq!(first.memo, "groceries");
    assert_eq!(first.amount_cents, -4_350);
    assert!(first.cleared);
    assert_eq!(second.memo, "salary");
    assert_eq!(second.amount_cents, 250_000);

    // Hash key set and values survive.
    let mut keys: Vec<&String> = account.categories.keys().collect();
    keys.sort();
    assert_eq!(keys, ["food", "rent"]);
    assert_eq!(account.categories["food"].borrow().budget_cents, 30_000);

    // The document holds exactly one back-edge named "evidence", resolving
    // to transaction #1.
    assert_eq!(ledger.documents.len(), 1);
    let document = ledger.documents[0].borrow();
    assert_eq!(document.anchor.links().count_named("evidence"), 1);
    let targets = document
        .anchor
        .links()
        .resolved_targets("evidence", fresh_session.registry());
    assert_eq!(targets.len(), 1);
    assert_eq!(
        targets[0].borrow().anchor().identity(),
        first.anchor.identity()
    );

    // The edge was saved symmetric, so the repair pass had nothing to do.
    // Only the two linked nodes carry identities; the salary transaction
    // was never linked and stays unassigned.
    assert_eq!(report.links_repaired, 0);
    assert_eq!(report.linkables_registered, 2);
}

#[test]
fn round_trip_through_a_file_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.cashbook");

    let session = GraphSession::new();
    let ledger = sample_ledger(&session);
    save_graph(&ledger, "ledger", File::create(&path).unwrap()).unwrap();

    let fresh_session = GraphSession::new();
    let reloaded = node(Ledger::default());
    let report = load_graph(
        &reloaded,
        "ledger",
        File::open(&path).unwrap(),
        &fresh_session,
    )
    .unwrap();

    assert!(report.is_clean());
    assert_eq!(reloaded.borrow().accounts.len(), 1);
    assert_eq!(reloaded.borrow().documents.len(), 1);
}

#[test]
fn accessor_pair_resolves_against_ambient_context() {
    let document = "<ledger>\n  <accounts>\n    <account name=\"Main\">\n      <default_category>FOOD</default_category>\n    </account>\n  </accounts>\n</ledger>\n";

    let session = GraphSession::new();
    let reloaded = node(Ledger::default());
    let mut ctx = ReadContext::new();
    ctx.set_ambient(KnownCategories(vec!["food".into(), "rent".into()]));
    let report = load_graph_with(
        &reloaded,
        "ledger",
        document.as_bytes(),
        &session,
        &mut ctx,
    )
    .unwrap();

    assert!(report.is_clean());
    let ledger = reloaded.borrow();
    let account = ledger.accounts[0].borrow();
    assert_eq!(*account.default_category.borrow(), "food");
}

#[test]
fn bulk_load_flag_is_raised_only_while_a_document_streams_in() {
    #[derive(Default)]
    struct Prefs {
        theme: Rc<RefCell<String>>,
        read_in_bulk: Rc<Cell<Option<bool>>>,
    }

    impl Serializable for Prefs {
        fn setup<'a>(&'a mut self, acc: &mut Accessor<'a>) {
            let get_store = self.theme.clone();
            let set_store = self.theme.clone();
            let observed = self.read_in_bulk.clone();
            acc.add_pair_attr(
                "theme",
                move || get_store.borrow().clone(),
                move |text, ctx| {
                    observed.set(Some(ctx.is_bulk_load()));
                    *set_store.borrow_mut() = text.to_string();
                },
            );
        }
    }

    // Outside a load call the flag is down.
    assert!(!ReadContext::new().is_bulk_load());

    let session = GraphSession::new();
    let prefs = node(Prefs::default());
    let mut ctx = ReadContext::new();
    let report = load_graph_with(
        &prefs,
        "prefs",
        "<prefs theme=\"dark\"/>\n".as_bytes(),
        &session,
        &mut ctx,
    )
    .unwrap();

    assert!(report.is_clean());
    assert_eq!(*prefs.borrow().theme.borrow(), "dark");
    // The setter saw the flag raised while the document streamed in.
    assert_eq!(prefs.borrow().read_in_bulk.get(), Some(true));
    // The flag drops again once the load call returns.
    assert!(!ctx.is_bulk_load());
}

#[test]
fn empty_list_elements_read_back_empty() {
    let document = "<ledger>\n  <accounts/>\n  <documents/>\n</ledger>\n";

    let session = GraphSession::new();
    let reloaded = node(Ledger::default());
    let report = load_graph(&reloaded, "ledger", document.as_bytes(), &session).unwrap();

    assert!(report.is_clean());
    assert!(reloaded.borrow().accounts.is_empty());
    assert!(reloaded.borrow().documents.is_empty());
}
