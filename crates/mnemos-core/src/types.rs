// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Mnemos service.

use std::collections::BTreeMap;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Free-form metadata attached to messages and archival items.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a [`PluginAdapter`](crate::PluginAdapter).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Provider,
    Storage,
}

// --- Agent records ---

/// Persisted description of an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
    pub id: String,
    pub name: String,
    pub model: String,
    pub persona: String,
    pub system_prompt: String,
    pub context_window_limit: u32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AgentRecord {
    /// Creates an active record with an empty persona and prompt.
    pub fn new(id: impl Into<String>, name: impl Into<String>, model: impl Into<String>) -> Self {
        let now = Utc::now().trunc_subsecs(6);
        Self {
            id: id.into(),
            name: name.into(),
            model: model.into(),
            persona: String::new(),
            system_prompt: String::new(),
            context_window_limit: 4096,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

// --- Messages ---

/// Kind of an exchanged message.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    #[default]
    Text,
    ToolCall,
    ToolResult,
    System,
}

/// A message exchanged with an agent.
///
/// The same shape is used for recall log entries and for mailbox messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMessage {
    pub content: String,
    pub sender_id: String,
    pub receiver_id: String,
    /// Seconds since the Unix epoch, with sub-second precision.
    pub timestamp: f64,
    #[serde(default)]
    pub message_type: MessageType,
    #[serde(default)]
    pub metadata: Metadata,
}

impl AgentMessage {
    /// Creates a text message stamped with the current time.
    pub fn new(
        sender_id: impl Into<String>,
        receiver_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            sender_id: sender_id.into(),
            receiver_id: receiver_id.into(),
            timestamp: unix_timestamp(),
            message_type: MessageType::Text,
            metadata: Metadata::new(),
        }
    }

    pub fn with_type(mut self, message_type: MessageType) -> Self {
        self.message_type = message_type;
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Current time as fractional seconds since the Unix epoch.
pub fn unix_timestamp() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

// --- Archival memory ---

/// An immutable item in archival memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchivalItem {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
}

// --- Tool schemas ---

/// Description of a single tool parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    #[serde(rename = "type")]
    pub param_type: String,
    pub description: String,
}

impl ParameterSpec {
    pub fn string(description: impl Into<String>) -> Self {
        Self {
            param_type: "string".to_string(),
            description: description.into(),
        }
    }

    pub fn integer(description: impl Into<String>) -> Self {
        Self {
            param_type: "integer".to_string(),
            description: description.into(),
        }
    }
}

/// The model-facing description of a registered tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: BTreeMap<String, ParameterSpec>,
    pub required: Vec<String>,
}

impl ToolSchema {
    /// Renders the parameters as a JSON Schema object.
    pub fn input_schema(&self) -> serde_json::Value {
        let properties: serde_json::Map<String, serde_json::Value> = self
            .parameters
            .iter()
            .map(|(name, spec)| {
                (
                    name.clone(),
                    serde_json::json!({
                        "type": spec.param_type,
                        "description": spec.description,
                    }),
                )
            })
            .collect();
        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": self.required,
        })
    }

    /// Name, description, and input schema as one JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "description": self.description,
            "input_schema": self.input_schema(),
        })
    }
}

// --- Provider types ---

/// Speaker of a conversation turn sent to a provider.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single conversation turn sent to a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A request to an LLM provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderRequest {
    pub model: String,
    pub system_prompt: String,
    pub messages: Vec<ChatMessage>,
    pub tools: Option<Vec<ToolSchema>>,
    pub max_tokens: Option<u32>,
    pub temperature: f32,
}

impl ProviderRequest {
    /// The texts a token counter is charged for: the system prompt, the
    /// tool schemas as one JSON array, then each message. Empty parts are
    /// skipped.
    pub fn countable_texts(&self) -> Vec<String> {
        let mut texts = Vec::with_capacity(self.messages.len() + 2);
        texts.push(self.system_prompt.clone());
        if let Some(tools) = self.tools.as_ref().filter(|t| !t.is_empty()) {
            let rendered: Vec<_> = tools.iter().map(ToolSchema::to_json).collect();
            texts.push(serde_json::Value::Array(rendered).to_string());
        }
        texts.extend(self.messages.iter().map(|m| m.content.clone()));
        texts.retain(|t| !t.is_empty());
        texts
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned call id, when the provider supplies one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub arguments: Metadata,
}

/// Why the provider stopped generating.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    ToolUse,
    MaxTokens,
    ContentFilter,
    Unknown,
}

/// Normalized provider output. Every provider adapter produces this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub content: String,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
    pub finish_reason: FinishReason,
}

impl ProviderResponse {
    /// A plain text response with no tool calls.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
            finish_reason: FinishReason::Stop,
        }
    }
}
