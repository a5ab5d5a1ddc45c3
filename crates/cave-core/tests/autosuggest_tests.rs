use cave_core::{AutosuggestStore, GraphContext, KeyValueStore, MemoryStore, Scope};
use time::macros::datetime;
use time::Duration;

fn ctx(metric: &str) -> GraphContext {
    GraphContext::new(Scope::team("acme", "payments"), metric)
}

#[test]
fn suggest_matches_case_insensitive_substrings() {
    let store = AutosuggestStore::new(MemoryStore::new());
    let c = ctx("orders");
    store.record(&c, "host", "Web-Frontend-1").unwrap();
    store.record(&c, "host", "db-primary").unwrap();

    assert_eq!(store.suggest(&c, "host", "FRONT"), vec!["Web-Frontend-1"]);
    assert_eq!(store.suggest(&c, "host", "prim"), vec!["db-primary"]);
    assert!(store.suggest(&c, "host", "cache").is_empty());
}

#[test]
fn suggest_treats_query_literally() {
    let store = AutosuggestStore::new(MemoryStore::new());
    let c = ctx("orders");
    store.record(&c, "alertCondition", "a.b > 1").unwrap();
    store.record(&c, "alertCondition", "axb > 1").unwrap();
    store.record(&c, "alertCondition", "count(*) > 3").unwrap();

    assert_eq!(store.suggest(&c, "alertCondition", "a.b"), vec!["a.b > 1"]);
    assert_eq!(
        store.suggest(&c, "alertCondition", "(*)"),
        vec!["count(*) > 3"]
    );
    assert!(store.suggest(&c, "alertCondition", "[").is_empty());
}

#[test]
fn history_is_scoped_per_metric_and_field() {
    let store = AutosuggestStore::new(MemoryStore::new());
    store.record(&ctx("orders"), "host", "web1").unwrap();

    assert!(store.suggest(&ctx("refunds"), "host", "web").is_empty());
    assert!(store.suggest(&ctx("orders"), "dc", "web").is_empty());
    assert_eq!(store.suggest(&ctx("orders"), "host", "web"), vec!["web1"]);
}

#[test]
fn repeated_value_is_deduplicated_and_refreshed() {
    let store = AutosuggestStore::new(MemoryStore::new());
    let c = ctx("orders");
    let t0 = datetime!(2024-05-01 00:00:00 UTC);
    store.record_at(&c, "host", "web1", t0).unwrap();
    store.record_at(&c, "host", "web2", t0 + Duration::minutes(1)).unwrap();
    store.record_at(&c, "host", "web1", t0 + Duration::minutes(2)).unwrap();

    assert_eq!(store.suggest(&c, "host", "web"), vec!["web1", "web2"]);
}

#[test]
fn empty_values_are_not_recorded() {
    let store = AutosuggestStore::new(MemoryStore::new());
    let c = ctx("orders");
    store.record(&c, "host", "").unwrap();
    assert!(store.store().get(&c.storage_key("host")).unwrap().is_none());
}

#[test]
fn corrupt_history_is_treated_as_empty() {
    let store = AutosuggestStore::new(MemoryStore::new());
    let c = ctx("orders");
    let key = c.storage_key("host");
    store.store().set(&key, "{not json").unwrap();

    assert!(store.suggest(&c, "host", "").is_empty());
    store.record(&c, "host", "web1").unwrap();
    assert_eq!(store.suggest(&c, "host", "web"), vec!["web1"]);
}

#[test]
fn eviction_drops_least_recently_used() {
    let store = AutosuggestStore::new(MemoryStore::new()).with_max_entries(Some(2));
    let c = ctx("orders");
    let t0 = datetime!(2024-05-01 00:00:00 UTC);
    store.record_at(&c, "host", "web1", t0).unwrap();
    store.record_at(&c, "host", "web2", t0 + Duration::minutes(1)).unwrap();
    store.record_at(&c, "host", "web3", t0 + Duration::minutes(2)).unwrap();

    assert_eq!(store.suggest(&c, "host", "web"), vec!["web3", "web2"]);
}

#[test]
fn storage_key_embeds_scope_and_metric() {
    assert_eq!(ctx("orders").storage_key("host"), "acme|payments|orders|host");
    let org_only = GraphContext::new(Scope::organization("acme"), "orders");
    assert_eq!(org_only.storage_key("host"), "acme||orders|host");
}
