//! Tests for configuration loading and validation

use std::collections::HashMap;
use std::io::Write;

use mine_search::config::{AppSettings, ConfigError, ConfigLoader, Environment, WorkerPoolConfig};

fn loader(vars: &[(&str, &str)]) -> ConfigLoader {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    ConfigLoader::with_lookup(move |key| map.get(key).cloned())
}

#[test]
fn test_worker_pool_config_validation() {
    assert!(WorkerPoolConfig::new().validate().is_ok());
    assert!(WorkerPoolConfig::new().with_worker_count(0).validate().is_err());
    assert!(WorkerPoolConfig::new().with_queue_capacity(0).validate().is_err());
}

#[test]
fn test_dev_environment_selects_dev_cluster() {
    let settings = loader(&[("IS_DEV", "1"), ("USE_PRODUCTION", "1")]).load().unwrap();
    assert_eq!(settings.environment, Environment::Dev);
    assert_eq!(settings.audit.brokers[0], "kafka-1:19092");
    assert_eq!(settings.audit.summary_topic, "dev-mine");
}

#[test]
fn test_staging_and_production_share_brokers() {
    let staging = loader(&[]).load().unwrap();
    let production = loader(&[("USE_PRODUCTION", "true")]).load().unwrap();
    assert_eq!(staging.audit.brokers, production.audit.brokers);
    assert_eq!(staging.audit.summary_topic, "stag-mine");
    assert_eq!(production.audit.summary_topic, "mine");
}

#[test]
fn test_env_overrides() {
    let settings = loader(&[
        ("KAFKA_BROKERS", "k1:9092,k2:9092"),
        ("KAFKA_TOPIC_NAME", "mine-detail"),
        ("KAFKA_TOPIC_NAME_ALL", "all-services"),
        ("AUDIT_WORKER_COUNT", "8"),
        ("AUDIT_QUEUE_CAPACITY", "1000"),
        ("AUDIT_WRITE_TIMEOUT_SECS", "5"),
        ("TYPESENSE_URL", "http://typesense:8108/"),
        ("TYPESENSE_KEY", "secret"),
        ("TYPESENSE_COLLECTION", "shops"),
        ("TYPESENSE_QUERY_BY", "name,address"),
    ])
    .load()
    .unwrap();

    assert_eq!(settings.audit.brokers, vec!["k1:9092", "k2:9092"]);
    assert_eq!(settings.audit.detailed_topic, "mine-detail");
    assert_eq!(settings.audit.summary_topic, "all-services");
    assert_eq!(settings.audit.worker_count, 8);
    assert_eq!(settings.audit.queue_capacity, 1000);
    assert_eq!(settings.audit.write_timeout_secs, 5);
    assert_eq!(settings.search.base_url, "http://typesense:8108");
    assert_eq!(settings.search.api_key, "secret");
    assert_eq!(settings.search.collection, "shops");
    assert_eq!(settings.search.query_by, "name,address");
}

#[test]
fn test_unparsable_number_is_reported() {
    let err = loader(&[("AUDIT_QUEUE_CAPACITY", "lots")]).load().unwrap_err();
    match err {
        ConfigError::InvalidValue { key, value, .. } => {
            assert_eq!(key, "AUDIT_QUEUE_CAPACITY");
            assert_eq!(value, "lots");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_zero_timeout_fails_validation() {
    let err = loader(&[("AUDIT_WRITE_TIMEOUT_SECS", "0")]).load().unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("write_timeout_secs")));
}

#[test]
fn test_env_file_is_read() {
    let dir = std::env::temp_dir().join(format!("mine-search-config-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("app.env");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "MINE_SEARCH_TEST_ONLY_KEY=from-file").unwrap();

    // The injected lookup ignores the process environment, so this only
    // checks that a present file loads without error.
    let settings = loader(&[]).with_env_file(&path).load().unwrap();
    assert_eq!(settings.environment, Environment::Staging);
    assert_eq!(std::env::var("MINE_SEARCH_TEST_ONLY_KEY").as_deref(), Ok("from-file"));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_missing_env_file_is_not_an_error() {
    let settings = loader(&[])
        .with_env_file("/nonexistent/mine-search/app.env")
        .load()
        .unwrap();
    assert_eq!(settings.environment, Environment::Staging);
}

#[test]
fn test_settings_from_json() {
    let settings = AppSettings::from_json_str(
        r#"{
            "environment": "production",
            "audit": {"brokers": ["k:9092"], "detailed_topic": "d", "summary_topic": "s"},
            "search": {"base_url": "https://ts.example", "collection": "c"}
        }"#,
    )
    .unwrap();
    assert_eq!(settings.environment, Environment::Production);
    assert_eq!(settings.audit.worker_count, 50);
    assert!(settings.validate().is_ok());
}
