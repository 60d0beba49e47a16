// tests/runner_catalog.rs
// Full catalog pass against mock feed + notifier, with a real state file.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use tg_gift_tracker::error::Error;
use tg_gift_tracker::feed::CatalogFeed;
use tg_gift_tracker::notify::{Alert, Delivery, Notify};
use tg_gift_tracker::runner;
use tg_gift_tracker::state::{CursorKind, StateStore};

struct MockCatalog {
    keys: Vec<&'static str>,
    fail: bool,
}

#[async_trait]
impl CatalogFeed for MockCatalog {
    async fn fetch(&self) -> Result<BTreeMap<String, Value>, Error> {
        if self.fail {
            return Err(Error::Fetch("connection refused".to_string()));
        }
        Ok(self
            .keys
            .iter()
            .map(|k| (k.to_string(), Value::Null))
            .collect())
    }
}

#[derive(Default)]
struct RecordingNotifier {
    alerts: Mutex<Vec<Alert>>,
    fail: bool,
}

#[async_trait]
impl Notify for RecordingNotifier {
    async fn notify(&self, alert: &Alert) -> Result<Delivery, Error> {
        self.alerts.lock().unwrap().push(alert.clone());
        if self.fail {
            Err(Error::Notify("webhook down".to_string()))
        } else {
            Ok(Delivery::Sent)
        }
    }
}

fn store_in(dir: &tempfile::TempDir) -> StateStore {
    StateStore::new(dir.path().join("gifts_data.json"), CursorKind::Keys)
}

#[tokio::test]
async fn detects_new_key_and_updates_state() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    std::fs::write(store.path(), r#"{"a": {"p": 1}, "b": {"p": 2}}"#).unwrap();

    let feed = MockCatalog {
        keys: vec!["a", "b", "c"],
        fail: false,
    };
    let notifier = RecordingNotifier::default();

    let summary = runner::run_catalog_once(&feed, &store, &notifier)
        .await
        .unwrap();
    assert_eq!(summary.new_items, 1);
    assert_eq!(summary.sent, 1);

    let alerts = notifier.alerts.lock().unwrap();
    assert_eq!(
        *alerts,
        vec![Alert::Gift {
            id: "c".to_string()
        }]
    );

    let saved = std::fs::read_to_string(store.path()).unwrap();
    let map: BTreeMap<String, Value> = serde_json::from_str(&saved).unwrap();
    let keys: Vec<&str> = map.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn identical_snapshot_is_quiet_on_second_run() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let feed = MockCatalog {
        keys: vec!["a", "b"],
        fail: false,
    };

    let first = RecordingNotifier::default();
    runner::run_catalog_once(&feed, &store, &first).await.unwrap();

    let second = RecordingNotifier::default();
    let summary = runner::run_catalog_once(&feed, &store, &second)
        .await
        .unwrap();
    assert_eq!(summary.new_items, 0);
    assert!(second.alerts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn fetch_failure_leaves_state_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let before = r#"{"a": null}"#;
    std::fs::write(store.path(), before).unwrap();

    let feed = MockCatalog {
        keys: vec![],
        fail: true,
    };
    let notifier = RecordingNotifier::default();

    let err = runner::run_catalog_once(&feed, &store, &notifier)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Fetch(_)));
    assert!(notifier.alerts.lock().unwrap().is_empty());

    let after = std::fs::read_to_string(store.path()).unwrap();
    assert_eq!(after, before);
}

#[tokio::test]
async fn notify_failure_does_not_abort_batch_or_persist() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    std::fs::write(store.path(), r#"{"a": null}"#).unwrap();

    let feed = MockCatalog {
        keys: vec!["a", "b", "c"],
        fail: false,
    };
    let notifier = RecordingNotifier {
        fail: true,
        ..RecordingNotifier::default()
    };

    let summary = runner::run_catalog_once(&feed, &store, &notifier)
        .await
        .unwrap();
    assert_eq!(summary.new_items, 2);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.sent, 0);
    // Both events were attempted despite the first failure.
    assert_eq!(notifier.alerts.lock().unwrap().len(), 2);

    // Cursor still advances: at-least-once, not at-most-once.
    let saved = std::fs::read_to_string(store.path()).unwrap();
    let map: BTreeMap<String, Value> = serde_json::from_str(&saved).unwrap();
    assert_eq!(map.len(), 3);
}

#[tokio::test]
async fn empty_catalog_resets_cursor_without_alerts() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    std::fs::write(store.path(), r#"{"a": null, "b": null}"#).unwrap();

    let feed = MockCatalog {
        keys: vec![],
        fail: false,
    };
    let notifier = RecordingNotifier::default();

    let summary = runner::run_catalog_once(&feed, &store, &notifier)
        .await
        .unwrap();
    assert_eq!(summary.new_items, 0);

    let saved = std::fs::read_to_string(store.path()).unwrap();
    let map: BTreeMap<String, Value> = serde_json::from_str(&saved).unwrap();
    assert!(map.is_empty());
}
