mod common;

use std::cell::RefCell;
use std::rc::Rc;

use cashbook_core::serial::node;
use cashbook_core::{load_graph, save_graph, GraphSession, LoadIssueKind};

use common::{Account, Attachment, FileAttachment, Ledger, NoteAttachment};

fn ledger_with_attachment(attachment: Rc<RefCell<dyn Attachment>>) -> cashbook_core::Node<Ledger> {
    let account = node(Account {
        name: "Checking".into(),
        ..Account::default()
    });
    account.borrow_mut().attachment = Some(attachment);
    let ledger = node(Ledger::default());
    ledger.borrow_mut().accounts = vec![account];
    ledger
}

fn reload(bytes: &[u8]) -> (cashbook_core::Node<Ledger>, cashbook_core::LoadReport) {
    let session = GraphSession::new();
    let reloaded = node(Ledger::default());
    let report = load_graph(&reloaded, "ledger", bytes, &session).unwrap();
    (reloaded, report)
}

#[test]
fn each_subtype_survives_a_round_trip() {
    for attachment in [
        Rc::new(RefCell::new(FileAttachment {
            path: "receipts/march.pdf".into(),
        })) as Rc<RefCell<dyn Attachment>>,
        Rc::new(RefCell::new(NoteAttachment {
            text: "paid in cash".into(),
        })) as Rc<RefCell<dyn Attachment>>,
    ] {
        let expected = attachment.borrow().describe();
        let ledger = ledger_with_attachment(attachment);

        let mut bytes = Vec::new();
        save_graph(&ledger, "ledger", &mut bytes).unwrap();

        let (reloaded, report) = reload(&bytes);
        assert!(report.is_clean());
        let ledger = reloaded.borrow();
        let account = ledger.accounts[0].borrow();
        let restored = account.attachment.as_ref().unwrap();
        assert_eq!(restored.borrow().describe(), expected);
    }
}

#[test]
fn empty_slot_writes_nothing_and_reads_back_empty() {
    let ledger = node(Ledger::default());
    ledger.borrow_mut().accounts = vec![node(Account {
        name: "Checking".into(),
        ..Account::default()
    })];

    let mut bytes = Vec::new();
    save_graph(&ledger, "ledger", &mut bytes).unwrap();
    let text = String::from_utf8(bytes.clone()).unwrap();
    assert!(!text.contains("attachment"));

    let (reloaded, report) = reload(&bytes);
    assert!(report.is_clean());
    assert!(reloaded.borrow().accounts[0]
        .borrow()
        .attachment
        .is_none());
}

#[test]
fn unknown_type_tag_leaves_the_slot_empty() {
    let document = concat!(
        "<ledger>\n",
        "  <accounts>\n",
        "    <account name=\"Checking\">\n",
        "      <attachment type=\"zip\">\n",
        "        <path>archive.zip</path>\n",
        "      </attachment>\n",
        "      <currency>EUR</currency>\n",
        "    </account>\n",
        "  </accounts>\n",
        "</ledger>\n",
    );

    let (reloaded, report) = reload(document.as_bytes());
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].kind, LoadIssueKind::UnknownTypeTag);
    // The diagnostic names the tags the factory does know.
    assert!(report.issues[0].detail.contains("file, note"));

    let ledger = reloaded.borrow();
    let account = ledger.accounts[0].borrow();
    assert!(account.attachment.is_none());
    // The pointer element is skipped in place; siblings still load.
    assert_eq!(account.currency, "EUR");
}

#[test]
fn missing_type_tag_is_reported() {
    let document = concat!(
        "<ledger>\n",
        "  <accounts>\n",
        "    <account name=\"Checking\">\n",
        "      <attachment>\n",
        "        <path>archive.zip</path>\n",
        "      </attachment>\n",
        "    </account>\n",
        "  </accounts>\n",
        "</ledger>\n",
    );

    let (reloaded, report) = reload(document.as_bytes());
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].kind, LoadIssueKind::UnknownTypeTag);
    assert!(reloaded.borrow().accounts[0]
        .borrow()
        .attachment
        .is_none());
}
