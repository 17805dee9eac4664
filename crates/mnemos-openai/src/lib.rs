// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI provider adapter for the Mnemos agent memory service.
//!
//! Implements [`ProviderAdapter`] over the Chat Completions API. Token counts
//! come from local tiktoken encodings; responses are normalized into
//! [`ProviderResponse`].

pub mod client;
pub mod tokens;
pub mod types;

use async_trait::async_trait;
use mnemos_config::model::OpenAiConfig;
use mnemos_core::error::MnemosError;
use mnemos_core::traits::{PluginAdapter, ProviderAdapter};
use mnemos_core::types::{
    AdapterType, FinishReason, HealthStatus, Metadata, ProviderRequest, ProviderResponse, ToolCall,
};
use tracing::{debug, info};

use crate::client::OpenAiClient;
use crate::tokens::TokenCounter;
use crate::types::{ChatCompletionMessage, ChatRequest, FunctionDefinition, FunctionTool};

/// Context window sizes of known models, in tokens.
const MODEL_CONTEXT_LIMITS: &[(&str, usize)] = &[
    ("gpt-4-turbo", 128_000),
    ("gpt-4-0125-preview", 128_000),
    ("gpt-4-1106-preview", 128_000),
    ("gpt-4", 8_192),
    ("gpt-4-32k", 32_768),
    ("gpt-3.5-turbo", 16_385),
    ("gpt-3.5-turbo-16k", 16_385),
];

/// Context window assumed for models missing from the table.
const DEFAULT_CONTEXT_LIMIT: usize = 4_096;

/// OpenAI provider implementing [`ProviderAdapter`].
///
/// API key resolution order: config -> `OPENAI_API_KEY` env var -> error.
pub struct OpenAiProvider {
    client: OpenAiClient,
    counter: TokenCounter,
}

impl OpenAiProvider {
    pub fn new(config: &OpenAiConfig) -> Result<Self, MnemosError> {
        let api_key = resolve_api_key(config.api_key.as_deref())?;
        let client = OpenAiClient::new(
            &api_key,
            config.organization.as_deref(),
            &config.base_url,
        )?;
        info!(model = %config.default_model, "OpenAI provider initialized");
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: OpenAiClient) -> Self {
        Self {
            client,
            counter: TokenCounter::new(),
        }
    }
}

fn to_chat_request(request: &ProviderRequest) -> ChatRequest {
    let mut messages = Vec::with_capacity(request.messages.len() + 1);
    if !request.system_prompt.is_empty() {
        messages.push(ChatCompletionMessage {
            role: "system".to_string(),
            content: request.system_prompt.clone(),
        });
    }
    messages.extend(request.messages.iter().map(|m| ChatCompletionMessage {
        role: m.role.to_string(),
        content: m.content.clone(),
    }));

    let tools = request.tools.as_ref().filter(|t| !t.is_empty()).map(|tools| {
        tools
            .iter()
            .map(|schema| FunctionTool {
                tool_type: "function",
                function: FunctionDefinition {
                    name: schema.name.clone(),
                    description: schema.description.clone(),
                    parameters: schema.input_schema(),
                },
            })
            .collect()
    });

    ChatRequest {
        model: request.model.clone(),
        messages,
        temperature: request.temperature,
        max_tokens: request.max_tokens,
        tools,
    }
}

#[async_trait]
impl PluginAdapter for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, MnemosError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MnemosError> {
        debug!("OpenAI provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiProvider {
    async fn count_tokens(&self, text: &str, model: &str) -> Result<Option<usize>, MnemosError> {
        self.counter.count(text, model).map(Some)
    }

    fn max_context_size(&self, model: &str) -> usize {
        MODEL_CONTEXT_LIMITS
            .iter()
            .find(|(name, _)| *name == model)
            .map_or(DEFAULT_CONTEXT_LIMIT, |(_, limit)| *limit)
    }

    async fn generate(&self, request: ProviderRequest) -> Result<ProviderResponse, MnemosError> {
        let response = self.client.chat_completion(&to_chat_request(&request)).await?;
        if let Some(usage) = &response.usage {
            debug!(
                id = %response.id,
                model = %response.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "OpenAI completion received"
            );
        }

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| MnemosError::Provider {
                message: "OpenAI response contained no choices".into(),
                source: None,
            })?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolCall {
                id: Some(call.id),
                arguments: parse_arguments(&call.function.arguments),
                name: call.function.name,
            })
            .collect();

        Ok(ProviderResponse {
            content: choice.message.content.unwrap_or_default(),
            tool_calls,
            finish_reason: map_finish_reason(choice.finish_reason.as_deref()),
        })
    }
}

/// Decodes JSON-encoded arguments. Unparseable input is kept verbatim under
/// `raw_arguments` so the executor reports the missing parameters.
fn parse_arguments(raw: &str) -> Metadata {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Object(map)) => map,
        _ => {
            let mut wrapped = Metadata::new();
            wrapped.insert("raw_arguments".to_string(), raw.into());
            wrapped
        }
    }
}

fn map_finish_reason(reason: Option<&str>) -> FinishReason {
    match reason {
        Some("stop") => FinishReason::Stop,
        Some("tool_calls" | "function_call") => FinishReason::ToolUse,
        Some("length") => FinishReason::MaxTokens,
        Some("content_filter") => FinishReason::ContentFilter,
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

    std::env::var("OPENAI_API_KEY").map_err(|_| {
        MnemosError::Config(
            "OpenAI API key not found. Set openai.api_key in config or OPENAI_API_KEY environment variable.".into(),
        )
    })
}
