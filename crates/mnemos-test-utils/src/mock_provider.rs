// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock LLM provider adapter for deterministic testing.
//!
//! `MockProvider` implements `ProviderAdapter` with pre-configured responses,
//! enabling fast, CI-runnable tests without external API calls. Every
//! `generate` call is counted and its request recorded, so tests can assert
//! that a call never happened.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use mnemos_core::traits::{PluginAdapter, ProviderAdapter};
use mnemos_core::types::{
    AdapterType, FinishReason, HealthStatus, ProviderRequest, ProviderResponse, ToolCall,
};
use mnemos_core::MnemosError;

/// Context size reported for every model unless overridden.
pub const DEFAULT_MAX_CONTEXT: usize = 100_000;

/// A mock LLM provider that returns pre-configured responses.
///
/// Responses are popped from a FIFO queue. When the queue is empty,
/// a default "mock response" text is returned.
pub struct MockProvider {
    responses: Arc<Mutex<VecDeque<Result<ProviderResponse, String>>>>,
    requests: Arc<Mutex<Vec<ProviderRequest>>>,
    generate_calls: AtomicUsize,
    max_context: usize,
    count_words: bool,
}

impl MockProvider {
    /// Create a new mock provider with an empty response queue.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            generate_calls: AtomicUsize::new(0),
            max_context: DEFAULT_MAX_CONTEXT,
            count_words: false,
        }
    }

    /// Create a mock provider pre-loaded with the given text responses.
    pub fn with_responses(responses: Vec<String>) -> Self {
        let provider = Self::new();
        let queue = responses
            .into_iter()
            .map(|text| Ok(ProviderResponse::text(text)))
            .collect();
        Self {
            responses: Arc::new(Mutex::new(queue)),
            ..provider
        }
    }

    /// Report `tokens` as the context size of every model.
    pub fn with_max_context(mut self, tokens: usize) -> Self {
        self.max_context = tokens;
        self
    }

    /// Count one token per whitespace-separated word instead of deferring
    /// to the character approximation.
    pub fn with_word_counting(mut self) -> Self {
        self.count_words = true;
        self
    }

    /// Add a text response to the end of the queue.
    pub async fn add_response(&self, text: String) {
        self.push_response(ProviderResponse::text(text)).await;
    }

    /// Add a full response to the end of the queue.
    pub async fn push_response(&self, response: ProviderResponse) {
        self.responses.lock().await.push_back(Ok(response));
    }

    /// Queue a response that asks for `calls`.
    pub async fn push_tool_calls(&self, calls: Vec<ToolCall>) {
        self.push_response(ProviderResponse {
            content: String::new(),
            tool_calls: calls,
            finish_reason: FinishReason::ToolUse,
        })
        .await;
    }

    /// Queue a provider failure.
    pub async fn push_error(&self, message: impl Into<String>) {
        self.responses.lock().await.push_back(Err(message.into()));
    }

    /// Number of `generate` calls so far.
    pub fn generate_calls(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    /// Every request passed to `generate`, oldest first.
    pub async fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().await.clone()
    }

    /// Pop the next response, or return the default.
    async fn next_response(&self) -> Result<ProviderResponse, String> {
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(ProviderResponse::text("mock response")))
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
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
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    async fn count_tokens(&self, text: &str, _model: &str) -> Result<Option<usize>, MnemosError> {
        Ok(self.count_words.then(|| text.split_whitespace().count()))
    }

    fn max_context_size(&self, _model: &str) -> usize {
        self.max_context
    }

    async fn generate(&self, request: ProviderRequest) -> Result<ProviderResponse, MnemosError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push(request);
        self.next_response()
            .await
            .map_err(|message| MnemosError::Provider {
                message,
                source: None,
            })
    }
}
