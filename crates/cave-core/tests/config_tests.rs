use cave_core::Config;
use std::time::Duration;
use tempfile::NamedTempFile;

#[test]
fn defaults_expand_paths() {
    let cfg = Config::load(Some(std::path::Path::new("/nonexistent/graph.toml")))
        .expect("load default config");
    assert!(
        !cfg.store.path.to_string_lossy().contains('~'),
        "store path should be expanded"
    );
    assert_eq!(cfg.graph.default_range, Duration::from_secs(3600));
    assert_eq!(cfg.store.max_suggestions_per_field, Some(200));
}

#[test]
fn partial_file_keeps_defaults_for_missing_sections() {
    let tmp = NamedTempFile::new().unwrap();
    std::fs::write(
        tmp.path(),
        r#"
        [api]
        base_url = "https://cave.example"
        timeout = "5s"

        [graph]
        default_range = "15m"
        default_aggregator = "max"
        "#,
    )
    .unwrap();

    let cfg = Config::load(Some(tmp.path())).unwrap();
    assert_eq!(cfg.api.base_url, "https://cave.example");
    assert_eq!(cfg.api.timeout, Duration::from_secs(5));
    assert_eq!(cfg.graph.default_range, Duration::from_secs(900));
    assert_eq!(cfg.graph.default_aggregator, "max");
    assert_eq!(cfg.graph.default_interval, "minute");
    assert_eq!(cfg.logging.level, "info");
}
