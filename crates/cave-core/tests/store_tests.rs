use cave_core::{FormDefaults, KeyValueStore, MemoryStore, SqliteStore};
use tempfile::tempdir;

#[test]
fn sqlite_store_round_trips_and_overwrites() {
    let dir = tempdir().unwrap();
    let store = SqliteStore::connect(&dir.path().join("state.db")).unwrap();
    assert!(store.get("missing").unwrap().is_none());

    store.set("k", "v1").unwrap();
    store.set("k", "v2").unwrap();
    assert_eq!(store.get("k").unwrap().as_deref(), Some("v2"));
}

#[test]
fn sqlite_store_persists_across_connections() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("state.db");
    {
        let store = SqliteStore::connect(&path).unwrap();
        store.set("acme||orders|host", r#"{"web1":"2024-05-01T00:00:00.000Z"}"#)
            .unwrap();
    }
    let reopened = SqliteStore::connect(&path).unwrap();
    assert!(reopened.get("acme||orders|host").unwrap().is_some());
}

#[test]
fn form_defaults_merge_per_page() {
    let defaults = FormDefaults::new(MemoryStore::new());
    defaults.remember("orders", "aggregator", "max").unwrap();
    defaults.remember("orders", "interval", "hour").unwrap();
    defaults.remember("refunds", "aggregator", "sum").unwrap();

    let orders = defaults.load("orders");
    assert_eq!(orders.get("aggregator").map(String::as_str), Some("max"));
    assert_eq!(orders.get("interval").map(String::as_str), Some("hour"));
    assert_eq!(defaults.load("refunds").len(), 1);
    assert!(defaults.load("unknown").is_empty());
}

#[test]
fn corrupt_form_defaults_are_ignored() {
    let store = MemoryStore::new();
    store.set("caveFormDefaults", "[[[").unwrap();
    let defaults = FormDefaults::new(&store);
    assert!(defaults.load("orders").is_empty());

    defaults.remember("orders", "aggregator", "max").unwrap();
    assert_eq!(defaults.load("orders").len(), 1);
}
