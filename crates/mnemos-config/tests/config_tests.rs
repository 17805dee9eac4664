// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Mnemos configuration system.

use mnemos_config::diagnostic::{closest, ConfigError};
use mnemos_config::model::{MnemosConfig, ProviderKind, RecallSelection};
use mnemos_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with all known sections deserializes successfully.
#[test]
fn valid_toml_deserializes_into_mnemos_config() {
    let toml = r#"
[agent]
name = "archivist"
default_model = "gpt-4"
persona = "I am a careful archivist."
context_window_limit = 8192
log_level = "debug"

[memory]
max_block_size = 256
max_messages = 50
archive_evicted_recall = true

[mailbox]
max_queue_size = 3

[context]
recall_window = 4
recall_selection = "relevant"
response_reserve_tokens = 128
temperature = 0.2
max_tokens = 512
search_limit = 7

[tools]
archival_tools = false
recall_tools = false

[provider]
kind = "openai"

[anthropic]
api_key = "sk-ant-123"
default_model = "claude-3-haiku-20240307"
max_tokens = 2048

[openai]
api_key = "sk-123"
organization = "org-1"
base_url = "http://localhost:9999/v1"
default_model = "gpt-4"

[storage]
database_path = "/tmp/test.db"
wal_mode = false

[server]
host = "0.0.0.0"
port = 9000
shutdown_timeout_secs = 5
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.agent.name, "archivist");
    assert_eq!(config.agent.default_model.as_deref(), Some("gpt-4"));
    assert_eq!(config.agent.context_window_limit, 8192);
    assert_eq!(config.memory.max_block_size, 256);
    assert_eq!(config.memory.max_messages, 50);
    assert!(config.memory.archive_evicted_recall);
    assert_eq!(config.mailbox.max_queue_size, 3);
    assert_eq!(config.context.recall_window, 4);
    assert_eq!(config.context.recall_selection, RecallSelection::Relevant);
    assert_eq!(config.context.response_reserve_tokens, 128);
    assert_eq!(config.context.max_tokens, Some(512));
    assert_eq!(config.context.search_limit, 7);
    assert!(!config.tools.archival_tools);
    assert!(!config.tools.recall_tools);
    assert_eq!(config.provider.kind, ProviderKind::OpenAi);
    assert_eq!(config.anthropic.max_tokens, 2048);
    assert_eq!(config.openai.organization.as_deref(), Some("org-1"));
    assert_eq!(config.openai.base_url, "http://localhost:9999/v1");
    assert_eq!(config.storage.database_path, "/tmp/test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.shutdown_timeout_secs, 5);
}

/// Unknown field in [memory] section produces an UnknownField error.
#[test]
fn unknown_field_in_memory_produces_error() {
    let toml = r#"
[memory]
max_mesages = 10
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("max_mesages"),
        "error should mention unknown field or the bad key, got: {err_str}"
    );
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_optional_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.agent.name, "mnemos");
    assert!(config.agent.default_model.is_none());
    assert_eq!(config.agent.context_window_limit, 4096);
    assert_eq!(config.agent.log_level, "info");
    assert_eq!(config.memory.max_block_size, 1024);
    assert_eq!(config.memory.max_messages, 1000);
    assert!(!config.memory.archive_evicted_recall);
    assert_eq!(config.mailbox.max_queue_size, 100);
    assert_eq!(config.context.recall_window, 10);
    assert_eq!(config.context.recall_selection, RecallSelection::Recent);
    assert_eq!(config.context.search_limit, 5);
    assert!(config.tools.archival_tools);
    assert!(config.tools.recall_tools);
    assert_eq!(config.provider.kind, ProviderKind::Anthropic);
    assert_eq!(config.anthropic.api_version, "2023-06-01");
    assert_eq!(config.anthropic.max_tokens, 1024);
    assert!(config.storage.database_path.ends_with("mnemos.db"));
    assert!(config.storage.wal_mode);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8000);
    assert_eq!(config.server.shutdown_timeout_secs, 30);
    assert_eq!(config.server.max_concurrent_requests, 256);
}

/// A dotted override (the shape `MNEMOS_SERVER_PORT` maps to) wins over TOML.
#[test]
fn dotted_override_beats_toml() {
    use figment::{
        providers::{Format, Serialized, Toml},
        Figment,
    };

    let toml_content = r#"
[server]
port = 8001
"#;

    let config: MnemosConfig = Figment::new()
        .merge(Serialized::defaults(MnemosConfig::default()))
        .merge(Toml::string(toml_content))
        .merge(("server.port", 9100))
        .extract()
        .expect("should merge env override");

    assert_eq!(config.server.port, 9100);
}

/// Underscored keys stay intact under their section.
#[test]
fn dotted_override_keeps_underscored_key() {
    use figment::{providers::Serialized, Figment};

    let config: MnemosConfig = Figment::new()
        .merge(Serialized::defaults(MnemosConfig::default()))
        .merge(("memory.max_block_size", 64))
        .extract()
        .expect("should set max_block_size via dot notation");

    assert_eq!(config.memory.max_block_size, 64);
}

/// Missing config files are silently skipped (Figment's Toml::file() behavior).
#[test]
fn missing_config_files_silently_skipped() {
    use figment::{
        providers::{Format, Serialized, Toml},
        Figment,
    };

    let config: MnemosConfig = Figment::new()
        .merge(Serialized::defaults(MnemosConfig::default()))
        .merge(Toml::file("/nonexistent/path/mnemos.toml"))
        .extract()
        .expect("missing file should be silently skipped");

    assert_eq!(config.agent.name, "mnemos");
}

/// Unexpected top-level section is rejected by deny_unknown_fields.
#[test]
fn deny_unknown_fields_at_top_level() {
    let toml = r#"
[logging]
level = "debug"
"#;

    let err = load_config_from_str(toml).expect_err("unknown top-level section should be rejected");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("logging"),
        "error should mention unknown field, got: {err_str}"
    );
}

/// Unknown recall selection policy is rejected.
#[test]
fn unknown_recall_selection_rejected() {
    let toml = r#"
[context]
recall_selection = "random"
"#;
    assert!(load_config_from_str(toml).is_err());
}

#[test]
fn diagnostic_no_suggestion_for_distant_typo() {
    let valid_keys = &["max_block_size", "max_messages", "archive_evicted_recall"];
    assert!(closest("zzzzzz", valid_keys).is_none());
}

/// A misspelled provider kind names the closest supported provider.
#[test]
fn diagnostic_unknown_provider_kind_suggests_variant() {
    let toml = r#"
[provider]
kind = "antropic"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown provider");
    let suggested = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownVariant { value, suggestion, allowed, .. } if {
            value == "antropic"
                && suggestion.as_deref() == Some("anthropic")
                && allowed.contains("openai")
        })
    });
    assert!(suggested, "expected a variant suggestion, got: {errors:?}");
}

/// Unknown keys carry the table they were found in.
#[test]
fn diagnostic_unknown_key_names_its_section() {
    let toml = r#"
[agent]
port = "not here"
"#;

    let errors = load_and_validate_str(toml).expect_err("should produce errors");
    assert!(
        errors.iter().any(|e| matches!(
            e,
            ConfigError::UnknownKey { section, key, .. } if section == "[agent]" && key == "port"
        )),
        "got: {errors:?}"
    );
}

/// Error output from load_and_validate_str includes the unknown key name.
#[test]
fn diagnostic_error_includes_unknown_key() {
    let toml = r#"
[agent]
naem = "test"
"#;

    let errors = load_and_validate_str(toml).expect_err("should produce errors");
    assert!(!errors.is_empty(), "should have at least one error");

    let has_unknown_key = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, suggestion, valid_keys, .. } if {
            key == "naem"
                && suggestion.as_deref() == Some("name")
                && valid_keys.contains("name")
        })
    });
    assert!(
        has_unknown_key,
        "should have UnknownKey error for 'naem' with suggestion 'name', got: {errors:?}"
    );
}

/// Error output includes the list of valid keys for the section.
#[test]
fn diagnostic_error_includes_valid_keys() {
    let toml = r#"
[server]
prot = 80
"#;

    let errors = load_and_validate_str(toml).expect_err("should produce errors");
    let has_valid_keys = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { valid_keys, .. } if {
            valid_keys.contains("host")
                && valid_keys.contains("port")
                && valid_keys.contains("shutdown_timeout_secs")
        })
    });
    assert!(has_valid_keys, "error should list valid keys for [server] section");
}

/// Invalid type (string where number expected) produces clear message.
#[test]
fn diagnostic_invalid_type_message() {
    let toml = r#"
[mailbox]
max_queue_size = "lots"
"#;

    let err = load_config_from_str(toml).expect_err("should reject invalid type");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("invalid type") || err_str.contains("max_queue_size"),
        "error should mention type mismatch, got: {err_str}"
    );
}

/// ConfigError can be rendered using miette's graphical handler.
#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let error = ConfigError::UnknownKey {
        section: "[agent]".to_string(),
        key: "naem".to_string(),
        suggestion: Some("name".to_string()),
        valid_keys: "name, default_model, persona".to_string(),
        span: None,
        src: None,
    };

    assert!(error.code().is_some(), "should have diagnostic code");
    let help = error.help().map(|h| h.to_string()).unwrap_or_default();
    assert!(help.contains("did you mean `name`"), "got: {help}");

    let handler = GraphicalReportHandler::new();
    let mut buf = String::new();
    handler
        .render_report(&mut buf, &error)
        .expect("should render without error");
    assert!(buf.contains("naem"), "rendered report should mention the key");
}

#[test]
fn load_and_validate_valid_toml() {
    let toml = r#"
[agent]
name = "test"
"#;

    let config = load_and_validate_str(toml).expect("valid TOML should validate");
    assert_eq!(config.agent.name, "test");
}

/// Semantic validation runs after a successful parse.
#[test]
fn validation_catches_zero_block_size() {
    let toml = r#"
[memory]
max_block_size = 0
"#;

    let errors = load_and_validate_str(toml).expect_err("zero block size should fail");
    let has_validation_error = errors.iter().any(|e| {
        matches!(e, ConfigError::Validation { message } if message.contains("max_block_size"))
    });
    assert!(has_validation_error, "should have validation error for block size");
}
