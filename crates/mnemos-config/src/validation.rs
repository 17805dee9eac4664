// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as positive limits, bounded temperatures, and non-empty paths.

use crate::diagnostic::ConfigError;
use crate::model::MnemosConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &MnemosConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let positive: [(&str, usize); 5] = [
        ("memory.max_block_size", config.memory.max_block_size),
        ("memory.max_messages", config.memory.max_messages),
        ("mailbox.max_queue_size", config.mailbox.max_queue_size),
        ("context.recall_window", config.context.recall_window),
        ("server.max_concurrent_requests", config.server.max_concurrent_requests),
    ];
    for (key, value) in positive {
        if value == 0 {
            errors.push(ConfigError::Validation {
                message: format!("{key} must be greater than 0"),
            });
        }
    }

    if config.agent.context_window_limit == 0 {
        errors.push(ConfigError::Validation {
            message: "agent.context_window_limit must be greater than 0".to_string(),
        });
    }

    let temperature = config.context.temperature;
    if !(0.0..=2.0).contains(&temperature) {
        errors.push(ConfigError::Validation {
            message: format!("context.temperature must be between 0 and 2, got {temperature}"),
        });
    }

    if config.server.host.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    } else {
        let addr = config.server.host.trim();
        let is_valid_ip = addr.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = addr
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("server.host `{addr}` is not a valid IP address or hostname"),
            });
        }
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
