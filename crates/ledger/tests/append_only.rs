use chrono::Utc;
use ledger::{read_records, Ledger};
use shared::{domain::GameInput, protocol::LedgerRecord};

fn record(username: &str, input: GameInput) -> LedgerRecord {
    LedgerRecord {
        date: Utc::now(),
        username: username.to_string(),
        input,
    }
}

#[tokio::test]
async fn records_are_appended_in_call_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("inputs.log");
    let ledger = Ledger::open(&path);

    ledger.record(record("alice", GameInput::Up));
    ledger.record(record("bob", GameInput::A));
    ledger.record(record("alice", GameInput::Down));
    ledger.flush().await;

    let raw = std::fs::read_to_string(&path).expect("ledger text");
    assert_eq!(raw.lines().count(), 3);
    assert!(raw.ends_with('\n'));

    let inputs: Vec<_> = read_records(&path)
        .expect("records")
        .into_iter()
        .map(|r| (r.username, r.input))
        .collect();
    assert_eq!(
        inputs,
        vec![
            ("alice".to_string(), GameInput::Up),
            ("bob".to_string(), GameInput::A),
            ("alice".to_string(), GameInput::Down),
        ]
    );
}

#[tokio::test]
async fn existing_lines_are_never_rewritten() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("inputs.log");
    let existing = r#"{"date":"2024-03-01T10:00:00Z","username":"carol","input":"SELECT"}"#;
    std::fs::write(&path, format!("{existing}\n")).expect("seed");

    let ledger = Ledger::open(&path);
    ledger.record(record("dave", GameInput::B));
    ledger.flush().await;

    let raw = std::fs::read_to_string(&path).expect("ledger text");
    let mut lines = raw.lines();
    assert_eq!(lines.next(), Some(existing));
    assert!(lines.next().expect("appended").contains("\"dave\""));
}

#[tokio::test]
async fn write_failure_is_swallowed() {
    let dir = tempfile::tempdir().expect("tempdir");
    // A directory cannot be opened for appending.
    let ledger = Ledger::open(dir.path());
    ledger.record(record("erin", GameInput::Start));
    ledger.flush().await;

    ledger.record(record("erin", GameInput::Select));
    ledger.flush().await;
    assert!(dir.path().is_dir());
}
