// crates/screencli/tests/config_test.rs

use screencli::{AppConfig, DEFAULT_CONFIG_FILE};
use screenruntime::ErrorHandling;

#[test]
fn test_defaults_without_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig::load(None, dir.path()).unwrap();

    assert_eq!(config.screening.threshold, 75);
    assert_eq!(config.model.model, "llama-3.3-70b-versatile");
    assert_eq!(config.model.api_key_env, "GROQ_API_KEY");
    assert_eq!(config.runtime.on_error, ErrorHandling::Substitute);
    assert!(config.notify.webhook_url.is_none());
}

#[test]
fn test_partial_toml_keeps_other_defaults() {
    let config = AppConfig::from_toml(
        r#"
        [model]
        base_url = "http://localhost:11434/v1"
        model = "llama3"

        [runtime]
        on_error = "mark_degraded"
        node_timeout_ms = 60000

        [screening]
        threshold = 80
        "#,
    )
    .unwrap();

    assert_eq!(config.model.base_url, "http://localhost:11434/v1");
    assert_eq!(config.model.max_tokens, 2048);
    assert_eq!(config.runtime.on_error, ErrorHandling::MarkDegraded);
    assert_eq!(config.runtime.node_timeout_ms, Some(60000));
    assert_eq!(config.runtime.event_buffer_size, 1000);
    assert_eq!(config.screening.threshold, 80);
}

#[test]
fn test_config_file_in_directory_is_picked_up() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(DEFAULT_CONFIG_FILE),
        "[notify]\nwebhook_url = \"https://hooks.example.com/invite\"\nrecipient = \"hr@example.com\"\n",
    )
    .unwrap();

    let config = AppConfig::load(None, dir.path()).unwrap();
    assert_eq!(
        config.notify.webhook_url.as_deref(),
        Some("https://hooks.example.com/invite")
    );
    assert_eq!(config.notify.recipient.as_deref(), Some("hr@example.com"));
}

#[test]
fn test_explicit_path_must_exist() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");
    assert!(AppConfig::load(Some(&missing), dir.path()).is_err());
}

#[test]
fn test_invalid_toml_is_rejected() {
    assert!(AppConfig::from_toml("[screening]\nthreshold = \"high\"").is_err());
}

#[test]
fn test_toml_round_trip() {
    let mut config = AppConfig::default();
    config.screening.threshold = 60;
    config.notify.recipient = Some("hr@example.com".to_string());

    let reloaded = AppConfig::from_toml(&config.to_toml().unwrap()).unwrap();
    assert_eq!(reloaded.screening, config.screening);
    assert_eq!(reloaded.notify, config.notify);
    assert_eq!(reloaded.model, config.model);
}
