// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic Claude provider adapter for the Mnemos agent memory service.
//!
//! This crate implements [`ProviderAdapter`] for the Anthropic Messages API.
//! Responses are normalized into [`ProviderResponse`] so callers never see
//! Anthropic content blocks.

pub mod client;
pub mod types;

use async_trait::async_trait;
use mnemos_config::model::AnthropicConfig;
use mnemos_core::error::MnemosError;
use mnemos_core::traits::{PluginAdapter, ProviderAdapter};
use mnemos_core::types::{
    AdapterType, ChatMessage, FinishReason, HealthStatus, Metadata, ProviderRequest,
    ProviderResponse, Role, ToolCall,
};
use tracing::{debug, info};

use crate::client::AnthropicClient;
use crate::types::{ApiMessage, CountTokensRequest, MessageRequest, ResponseContentBlock};

/// Context window sizes of known models, in tokens.
const MODEL_CONTEXT_LIMITS: &[(&str, usize)] = &[
    ("claude-3-opus-20240229", 200_000),
    ("claude-3-sonnet-20240229", 200_000),
    ("claude-3-haiku-20240307", 200_000),
    ("claude-2.1", 200_000),
    ("claude-2.0", 100_000),
    ("claude-instant-1.2", 100_000),
];

/// Context window assumed for models missing from the table.
const DEFAULT_CONTEXT_LIMIT: usize = 100_000;

/// Placeholder user turn for conversations whose first turn is the assistant's.
const CONVERSATION_START: &str = "(conversation start)";

/// Anthropic Claude provider implementing [`ProviderAdapter`].
///
/// API key resolution order: config -> `ANTHROPIC_API_KEY` env var -> error.
pub struct AnthropicProvider {
    client: AnthropicClient,
    default_max_tokens: u32,
}

impl AnthropicProvider {
    /// Creates a new Anthropic provider from the given configuration.
    pub fn new(config: &AnthropicConfig) -> Result<Self, MnemosError> {
        let api_key = resolve_api_key(config.api_key.as_deref())?;
        let client = AnthropicClient::new(&api_key, &config.api_version)?;
        info!(model = %config.default_model, "Anthropic provider initialized");
        Ok(Self::with_client(client, config.max_tokens))
    }

    /// Creates a provider around an existing client.
    pub fn with_client(client: AnthropicClient, default_max_tokens: u32) -> Self {
        Self {
            client,
            default_max_tokens,
        }
    }

    /// Converts a [`ProviderRequest`] to an Anthropic [`MessageRequest`].
    fn to_message_request(&self, request: &ProviderRequest) -> MessageRequest {
        let tools = request.tools.as_ref().filter(|t| !t.is_empty()).map(|tools| {
            tools
                .iter()
                .map(|schema| types::ToolDefinition {
                    name: schema.name.clone(),
                    description: schema.description.clone(),
                    input_schema: schema.input_schema(),
                })
                .collect()
        });

        MessageRequest {
            model: request.model.clone(),
            messages: to_api_messages(&request.messages),
            system: Some(request.system_prompt.clone()).filter(|s| !s.is_empty()),
            max_tokens: request.max_tokens.unwrap_or(self.default_max_tokens),
            temperature: request.temperature,
            tools,
        }
    }
}

#[async_trait]
impl PluginAdapter for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, MnemosError> {
        // Avoid consuming tokens on health checks.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MnemosError> {
        debug!("Anthropic provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicProvider {
    async fn count_tokens(&self, text: &str, model: &str) -> Result<Option<usize>, MnemosError> {
        let request = CountTokensRequest {
            model: model.to_string(),
            messages: vec![ApiMessage {
                role: Role::User.to_string(),
                content: text.to_string(),
            }],
            system: None,
            tools: None,
        };
        self.client.count_tokens(&request).await.map(Some)
    }

    /// One `count_tokens` call for the whole request, shaped exactly as
    /// `generate` would send it.
    async fn count_request_tokens(
        &self,
        request: &ProviderRequest,
    ) -> Result<Option<usize>, MnemosError> {
        let count = CountTokensRequest::from(self.to_message_request(request));
        self.client.count_tokens(&count).await.map(Some)
    }

    fn max_context_size(&self, model: &str) -> usize {
        MODEL_CONTEXT_LIMITS
            .iter()
            .find(|(name, _)| *name == model)
            .map_or(DEFAULT_CONTEXT_LIMIT, |(_, limit)| *limit)
    }

    async fn generate(&self, request: ProviderRequest) -> Result<ProviderResponse, MnemosError> {
        let api_request = self.to_message_request(&request);
        let response = self.client.complete_message(&api_request).await?;
        debug!(
            id = %response.id,
            model = %response.model,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "Anthropic completion received"
        );

        let mut content = String::new();
        let mut tool_calls = Vec::new();
        for block in response.content {
            match block {
                ResponseContentBlock::Text { text } => content.push_str(&text),
                ResponseContentBlock::ToolUse { id, name, input } => tool_calls.push(ToolCall {
                    id: Some(id),
                    name,
                    arguments: tool_arguments(input),
                }),
            }
        }

        Ok(ProviderResponse {
            content,
            tool_calls,
            finish_reason: map_stop_reason(response.stop_reason.as_deref()),
        })
    }
}

/// Converts chat turns to the strictly alternating, user-first shape the
/// Messages API accepts. Consecutive turns of one role are joined.
fn to_api_messages(messages: &[ChatMessage]) -> Vec<ApiMessage> {
    let mut api: Vec<ApiMessage> = Vec::with_capacity(messages.len() + 1);
    for message in messages {
        let role = message.role.to_string();
        match api.last_mut() {
            Some(last) if last.role == role => {
                last.content.push_str("\n\n");
                last.content.push_str(&message.content);
            }
            _ => api.push(ApiMessage {
                role,
                content: message.content.clone(),
            }),
        }
    }
    if api.first().is_none_or(|m| m.role != Role::User.to_string()) {
        api.insert(
            0,
            ApiMessage {
                role: Role::User.to_string(),
                content: CONVERSATION_START.to_string(),
            },
        );
    }
    api
}

/// Tool input objects become arguments directly; anything else is wrapped.
fn tool_arguments(input: serde_json::Value) -> Metadata {
    match input {
        serde_json::Value::Object(map) => map,
        other => {
            let mut wrapped = Metadata::new();
            wrapped.insert("raw_arguments".to_string(), other);
            wrapped
        }
    }
}

fn map_stop_reason(reason: Option<&str>) -> FinishReason {
    match reason {
        Some("end_turn" | "stop_sequence") => FinishReason::Stop,
        Some("tool_use") => FinishReason::ToolUse,
        Some("max_tokens") => FinishReason::MaxTokens,
        Some("refusal") => FinishReason::ContentFilter,
        _ => FinishReason::Unknown,
    }
}

/// Resolves the API key from config or environment.
fn resolve_api_key(config_key: Option<&str>) -> Result<String, MnemosError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.to_string());
    }

    std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
        MnemosError::Config(
            "Anthropic API key not found. Set anthropic.api_key in config or ANTHROPIC_API_KEY environment variable.".into(),
        )
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use mnemos_core::types::{ParameterSpec, ToolSchema};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(base_url: &str) -> AnthropicProvider {
        let client = AnthropicClient::new("test-key", "2023-06-01")
            .unwrap()
            .with_base_url(base_url)
            .with_retry_delay(Duration::from_millis(10));
        AnthropicProvider::with_client(client, 1024)
    }

    fn request(messages: Vec<ChatMessage>) -> ProviderRequest {
        ProviderRequest {
            model: "claude-3-sonnet-20240229".into(),
            system_prompt: "You are Ada.".into(),
            messages,
            tools: None,
            max_tokens: None,
            temperature: 0.7,
        }
    }

    #[test]
    fn resolve_api_key_from_config() {
        assert_eq!(resolve_api_key(Some("sk-test-123")).unwrap(), "sk-test-123");
    }

    #[test]
    fn resolve_api_key_empty_config_falls_back_to_env() {
        // Fails unless ANTHROPIC_API_KEY is set; never yields the empty string.
        if let Ok(key) = resolve_api_key(Some("")) {
            assert!(!key.is_empty());
        }
    }

    #[test]
    fn model_table_and_unknown_default() {
        let provider = provider("http://localhost");
        assert_eq!(provider.max_context_size("claude-3-opus-20240229"), 200_000);
        assert_eq!(provider.max_context_size("claude-2.0"), 100_000);
        assert_eq!(provider.max_context_size("claude-unknown"), 100_000);
    }

    #[test]
    fn consecutive_roles_are_merged_and_first_turn_is_user() {
        let messages = to_api_messages(&[
            ChatMessage::assistant("earlier reply"),
            ChatMessage::user("one"),
            ChatMessage::user("two"),
            ChatMessage::assistant("answer"),
        ]);
        let roles: Vec<_> = messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["user", "assistant", "user", "assistant"]);
        assert_eq!(messages[0].content, CONVERSATION_START);
        assert_eq!(messages[2].content, "one\n\ntwo");
    }

    #[test]
    fn to_message_request_conversion() {
        let provider = provider("http://localhost");
        let mut req = request(vec![ChatMessage::user("hi")]);
        req.tools = Some(vec![ToolSchema {
            name: "core_memory_get".into(),
            description: "Get a core memory block by key".into(),
            parameters: [("key".to_string(), ParameterSpec::string("Key"))]
                .into_iter()
                .collect(),
            required: vec!["key".into()],
        }]);

        let api = provider.to_message_request(&req);
        assert_eq!(api.system.as_deref(), Some("You are Ada."));
        assert_eq!(api.max_tokens, 1024);
        let tools = api.tools.unwrap();
        assert_eq!(tools[0].name, "core_memory_get");
        assert_eq!(tools[0].input_schema["required"][0], "key");

        req.tools = Some(Vec::new());
        req.max_tokens = Some(64);
        let api = provider.to_message_request(&req);
        assert!(api.tools.is_none());
        assert_eq!(api.max_tokens, 64);
    }

    #[test]
    fn stop_reasons_normalize() {
        assert_eq!(map_stop_reason(Some("end_turn")), FinishReason::Stop);
        assert_eq!(map_stop_reason(Some("tool_use")), FinishReason::ToolUse);
        assert_eq!(map_stop_reason(Some("max_tokens")), FinishReason::MaxTokens);
        assert_eq!(map_stop_reason(None), FinishReason::Unknown);
    }

    #[tokio::test]
    async fn generate_normalizes_text_and_tool_use() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(body_partial_json(serde_json::json!({"system": "You are Ada."})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "msg_1",
                "type": "message",
                "role": "assistant",
                "content": [
                    {"type": "text", "text": "Noted."},
                    {"type": "tool_use", "id": "toolu_1", "name": "core_memory_add",
                     "input": {"key": "human", "value": "likes tea"}}
                ],
                "model": "claude-3-sonnet-20240229",
                "stop_reason": "tool_use",
                "usage": {"input_tokens": 20, "output_tokens": 12}
            })))
            .mount(&server)
            .await;

        let response = provider(&server.uri())
            .generate(request(vec![ChatMessage::user("I like tea")]))
            .await
            .unwrap();
        assert_eq!(response.content, "Noted.");
        assert_eq!(response.finish_reason, FinishReason::ToolUse);
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].id.as_deref(), Some("toolu_1"));
        assert_eq!(response.tool_calls[0].arguments["value"], "likes tea");
    }

    #[tokio::test]
    async fn count_tokens_uses_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages/count_tokens"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"input_tokens": 7})),
            )
            .mount(&server)
            .await;

        let count = provider(&server.uri())
            .count_tokens("hello there", "claude-3-haiku-20240307")
            .await
            .unwrap();
        assert_eq!(count, Some(7));
    }

    #[tokio::test]
    async fn whole_request_is_counted_in_one_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages/count_tokens"))
            .and(body_partial_json(serde_json::json!({"system": "You are helpful."})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"input_tokens": 42})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut req = request(vec![
            ChatMessage::user("hello"),
            ChatMessage::assistant("hi"),
            ChatMessage::user("remember me"),
        ]);
        req.system_prompt = "You are helpful.".into();
        req.tools = Some(vec![ToolSchema {
            name: "core_memory_get".into(),
            description: "Read a core block".into(),
            parameters: Default::default(),
            required: Vec::new(),
        }]);

        let count = provider(&server.uri()).count_request_tokens(&req).await.unwrap();
        assert_eq!(count, Some(42));
    }

    #[tokio::test]
    async fn auth_failure_is_a_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "type": "error",
                "error": {"type": "authentication_error", "message": "invalid x-api-key"}
            })))
            .mount(&server)
            .await;

        let err = provider(&server.uri())
            .generate(request(vec![ChatMessage::user("hi")]))
            .await
            .unwrap_err();
        assert!(matches!(err, MnemosError::Provider { .. }));
        assert!(err.to_string().contains("authentication_error"));
    }

    #[test]
    fn plugin_adapter_metadata() {
        let provider = provider("http://localhost");
        assert_eq!(provider.name(), "anthropic");
        assert_eq!(provider.adapter_type(), AdapterType::Provider);
    }
}
