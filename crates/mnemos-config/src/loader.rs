// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./mnemos.toml` > `~/.config/mnemos/mnemos.toml` > `/etc/mnemos/mnemos.toml`
//! with environment variable overrides via `MNEMOS_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::MnemosConfig;

/// Config sections that environment variables may address.
const SECTIONS: &[&str] = &[
    "agent",
    "memory",
    "mailbox",
    "context",
    "tools",
    "provider",
    "anthropic",
    "openai",
    "storage",
    "server",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/mnemos/mnemos.toml` (system-wide)
/// 3. `~/.config/mnemos/mnemos.toml` (user XDG config)
/// 4. `./mnemos.toml` (local directory)
/// 5. `MNEMOS_*` environment variables
pub fn load_config() -> Result<MnemosConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<MnemosConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MnemosConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<MnemosConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MnemosConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(MnemosConfig::default()))
        .merge(Toml::file("/etc/mnemos/mnemos.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("mnemos/mnemos.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("mnemos.toml"))
        .merge(env_provider())
}

/// Environment provider mapping `MNEMOS_<SECTION>_<KEY>` to `section.key`.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `MNEMOS_MEMORY_MAX_BLOCK_SIZE` must become
/// `memory.max_block_size`, not `memory.max.block.size`.
fn env_provider() -> Env {
    Env::prefixed("MNEMOS_").map(|key| map_env_key(key.as_str()).into())
}

/// Maps a lowercased, prefix-stripped env var name to a dotted config path.
pub(crate) fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_split_on_section_only() {
        assert_eq!(map_env_key("memory_max_block_size"), "memory.max_block_size");
        assert_eq!(map_env_key("server_port"), "server.port");
        assert_eq!(
            map_env_key("context_response_reserve_tokens"),
            "context.response_reserve_tokens"
        );
        assert_eq!(map_env_key("openai_api_key"), "openai.api_key");
    }

    #[test]
    fn unknown_section_passes_through() {
        assert_eq!(map_env_key("bogus_key"), "bogus_key");
    }
}
