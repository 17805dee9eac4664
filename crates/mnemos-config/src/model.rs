// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Mnemos agent memory service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Top-level Mnemos configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MnemosConfig {
    /// Defaults applied to newly created agents.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Memory tier limits.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Inter-agent mailbox limits.
    #[serde(default)]
    pub mailbox: MailboxConfig,

    /// Context assembly and token budgeting.
    #[serde(default)]
    pub context: ContextConfig,

    /// Which built-in memory tools agents receive.
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Provider selection.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Anthropic API settings.
    #[serde(default)]
    pub anthropic: AnthropicConfig,

    /// OpenAI API settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
}

/// Defaults for newly created agents and process-wide logging.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Name given to agents created without one.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Model used when a create request names none. `None` uses the provider default.
    #[serde(default)]
    pub default_model: Option<String>,

    /// Persona seeded into core memory when a create request names none.
    #[serde(default)]
    pub persona: String,

    /// Per-agent context window ceiling in tokens.
    #[serde(default = "default_context_window_limit")]
    pub context_window_limit: u32,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            default_model: None,
            persona: String::new(),
            context_window_limit: default_context_window_limit(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "mnemos".to_string()
}

fn default_context_window_limit() -> u32 {
    4096
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Memory tier limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Maximum characters per core memory block. Longer values are truncated on write.
    #[serde(default = "default_max_block_size")]
    pub max_block_size: usize,

    /// Maximum recall entries kept in memory. Oldest entries are evicted first.
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,

    /// Move recall entries evicted by overflow into archival memory.
    #[serde(default)]
    pub archive_evicted_recall: bool,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_block_size: default_max_block_size(),
            max_messages: default_max_messages(),
            archive_evicted_recall: false,
        }
    }
}

fn default_max_block_size() -> usize {
    1024
}

fn default_max_messages() -> usize {
    1000
}

/// Inter-agent mailbox configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MailboxConfig {
    /// Maximum queued messages per agent. Oldest messages are dropped first.
    #[serde(default = "default_max_queue_size")]
    pub max_queue_size: usize,
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            max_queue_size: default_max_queue_size(),
        }
    }
}

fn default_max_queue_size() -> usize {
    100
}

/// How the recall slice for a generation call is chosen.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RecallSelection {
    /// The last `recall_window` entries.
    #[default]
    Recent,
    /// Entries matching the inbound message, plus the inbound message itself.
    Relevant,
}

/// Context assembly configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ContextConfig {
    /// Maximum recall entries considered for one generation call.
    #[serde(default = "default_recall_window")]
    pub recall_window: usize,

    /// Recall slice selection policy.
    #[serde(default)]
    pub recall_selection: RecallSelection,

    /// Tokens held back from the budget for the model's reply.
    #[serde(default)]
    pub response_reserve_tokens: usize,

    /// Sampling temperature sent to the provider.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate. `None` defers to the provider default.
    #[serde(default)]
    pub max_tokens: Option<u32>,

    /// Default result limit for memory searches.
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            recall_window: default_recall_window(),
            recall_selection: RecallSelection::default(),
            response_reserve_tokens: 0,
            temperature: default_temperature(),
            max_tokens: None,
            search_limit: default_search_limit(),
        }
    }
}

fn default_recall_window() -> usize {
    10
}

fn default_temperature() -> f32 {
    0.7
}

fn default_search_limit() -> usize {
    5
}

/// Built-in tool registration.
///
/// The three core memory tools are always registered.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ToolsConfig {
    /// Register `archival_memory_insert` and `archival_memory_search`.
    #[serde(default = "default_true")]
    pub archival_tools: bool,

    /// Register `conversation_search`.
    #[serde(default = "default_true")]
    pub recall_tools: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            archival_tools: true,
            recall_tools: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Which LLM provider backs generation.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Anthropic,
    OpenAi,
}

/// Provider selection.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    #[serde(default)]
    pub kind: ProviderKind,
}

/// Anthropic API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnthropicConfig {
    /// Anthropic API key. `None` requires the `ANTHROPIC_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Default model to use for LLM requests.
    #[serde(default = "default_anthropic_model")]
    pub default_model: String,

    /// Maximum tokens to generate when a request does not specify one.
    #[serde(default = "default_anthropic_max_tokens")]
    pub max_tokens: u32,

    /// Anthropic API version string.
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_model: default_anthropic_model(),
            max_tokens: default_anthropic_max_tokens(),
            api_version: default_api_version(),
        }
    }
}

fn default_anthropic_model() -> String {
    "claude-3-sonnet-20240229".to_string()
}

fn default_anthropic_max_tokens() -> u32 {
    1024
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

/// OpenAI API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAiConfig {
    /// OpenAI API key. `None` requires the `OPENAI_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Optional organization id sent as `OpenAI-Organization`.
    #[serde(default)]
    pub organization: Option<String>,

    /// Chat Completions base URL.
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Default model to use for LLM requests.
    #[serde(default = "default_openai_model")]
    pub default_model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            organization: None,
            base_url: default_openai_base_url(),
            default_model: default_openai_model(),
        }
    }
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-4-turbo".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("mnemos").join("mnemos.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("mnemos.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind the HTTP server to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind the HTTP server to.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Upper bound on graceful shutdown (request drain plus storage close).
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,

    /// Requests served at once; further requests wait for a free slot.
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
            max_concurrent_requests: default_max_concurrent_requests(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_shutdown_timeout_secs() -> u64 {
    30
}

fn default_max_concurrent_requests() -> usize {
    256
}
