//! Tests for layered configuration loading.

use super::*;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Write JSON5 contents to a path, creating parent directories if needed.
fn write_json5(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("dir");
    }
    fs::write(path, contents).expect("write");
}

#[test]
fn parse_minimal_config() {
    let config = RapportConfig::load_from_str("{}").expect("config");
    assert_eq!(config.conversation.max_turns, 10);
    assert_eq!(config.conversation.summary_trigger, 25);
    assert_eq!(config.conversation.recall_k, 5);
    assert_eq!(config.conversation.history_max_words, 150);
    assert_eq!(config.conversation.history_edge_words, 75);
    assert_eq!(config.embedding.dimensions, 384);
    assert_eq!(config.generation.provider, "openai");
}

#[test]
fn parses_json5_comments_and_trailing_commas() {
    let json5 = r#"{
        // smaller window for tests
        conversation: { max_turns: 4, summary_trigger: 3, },
        storage: { path: "/tmp/rapport" },
    }"#;
    let config = RapportConfig::load_from_str(json5).expect("config");
    assert_eq!(config.conversation.max_turns, 4);
    assert_eq!(config.conversation.summary_trigger, 3);
    assert_eq!(config.storage.path.as_deref(), Some("/tmp/rapport"));
}

#[test]
fn rejects_unknown_top_level_key() {
    let err = RapportConfig::load_from_str(r#"{ unexpected: true }"#).unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("unknown key"));
    assert!(msg.contains("config:unexpected"));
}

#[test]
fn rejects_negative_window() {
    let err = RapportConfig::load_from_str(r#"{ conversation: { max_turns: -1 } }"#).unwrap_err();
    assert!(format!("{err}").contains("conversation.max_turns"));
}

#[test]
fn rejects_unsupported_provider() {
    let err = RapportConfig::load_from_str(r#"{ generation: { provider: "carrier-pigeon" } }"#)
        .unwrap_err();
    assert!(format!("{err}").contains("generation.provider"));
}

#[test]
fn validate_rejects_edges_wider_than_limit() {
    let json5 = r#"{ conversation: { history_max_words: 100, history_edge_words: 60 } }"#;
    let err = RapportConfig::load_from_str(json5).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn validate_rejects_zero_recall() {
    let err = RapportConfig::load_from_str(r#"{ conversation: { recall_k: 0 } }"#).unwrap_err();
    assert!(format!("{err}").contains("recall_k"));
}

#[test]
fn layered_config_applies_runtime_over_cwd_over_user() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    let cwd = root.join("work");
    fs::create_dir_all(&cwd).expect("cwd");

    let user_config = root.join("home").join(DEFAULT_CONFIG_FILE);
    write_json5(
        &user_config,
        r#"{ conversation: { max_turns: 12, recall_k: 3 }, storage: { path: "/user" } }"#,
    );
    write_json5(
        &cwd.join(DEFAULT_CONFIG_FILE),
        r#"{ conversation: { max_turns: 8 } }"#,
    );
    let runtime = root.join("override.json5");
    write_json5(&runtime, r#"{ storage: { path: "/runtime" } }"#);

    let options = LayeredConfigOptions {
        cwd: cwd.clone(),
        user_config_path: Some(user_config),
        runtime_paths: Vec::new(),
    }
    .with_runtime_path(&runtime);
    let layered = RapportConfig::load_layered_with_options(options).expect("layered");

    assert_eq!(layered.config.conversation.max_turns, 8);
    assert_eq!(layered.config.conversation.recall_k, 3);
    assert_eq!(layered.config.storage.path.as_deref(), Some("/runtime"));
    let sources = layered
        .layers
        .iter()
        .map(|layer| layer.source)
        .collect::<Vec<_>>();
    assert_eq!(
        sources,
        vec![
            ConfigLayerSource::User,
            ConfigLayerSource::Cwd,
            ConfigLayerSource::Runtime
        ]
    );
}

#[test]
fn layered_config_skips_missing_optional_layers() {
    let temp = TempDir::new().expect("tmp");
    let options = LayeredConfigOptions::new(temp.path()).without_user_layer();
    let layered = RapportConfig::load_layered_with_options(options).expect("layered");
    assert!(layered.layers.is_empty());
    assert_eq!(layered.config.conversation.max_turns, 10);
}

#[test]
fn layered_config_requires_runtime_layers() {
    let temp = TempDir::new().expect("tmp");
    let options = LayeredConfigOptions::new(temp.path())
        .without_user_layer()
        .with_runtime_path(temp.path().join("missing.json5"));
    let err = RapportConfig::load_layered_with_options(options).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFailed(_)));
}

#[test]
fn layer_errors_name_their_source() {
    let temp = TempDir::new().expect("tmp");
    write_json5(
        &temp.path().join(DEFAULT_CONFIG_FILE),
        r#"{ embedding: { dimensions: "wide" } }"#,
    );
    let options = LayeredConfigOptions::new(temp.path()).without_user_layer();
    let err = RapportConfig::load_layered_with_options(options).unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("cwd("));
    assert!(msg.contains("embedding.dimensions"));
}
