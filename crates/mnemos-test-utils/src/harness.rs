// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a complete agent service with a mock provider and
//! a temp SQLite database. Provides `send_message()` to drive the full turn
//! pipeline in tests.

use std::sync::Arc;

use mnemos_agent::{AgentService, NewAgent, TurnReply};
use mnemos_config::model::{MnemosConfig, StorageConfig};
use mnemos_core::types::{AgentRecord, Metadata};
use mnemos_core::{MnemosError, StorageAdapter};
use mnemos_storage::SqliteStorage;

use crate::mock_provider::MockProvider;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    responses: Vec<String>,
    max_context: Option<usize>,
    config: MnemosConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            responses: Vec::new(),
            max_context: None,
            config: MnemosConfig::default(),
        }
    }

    /// Set mock provider responses.
    pub fn with_mock_responses(mut self, responses: Vec<String>) -> Self {
        self.responses = responses;
        self
    }

    /// Make the mock provider report `tokens` as its context size.
    pub fn with_max_context(mut self, tokens: usize) -> Self {
        self.max_context = Some(tokens);
        self
    }

    /// Adjust the configuration before the service is built.
    pub fn with_config(mut self, tweak: impl FnOnce(&mut MnemosConfig)) -> Self {
        tweak(&mut self.config);
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, MnemosError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| MnemosError::Storage { source: e.into() })?;
        let mut config = self.config;
        config.storage = StorageConfig {
            database_path: temp_dir.path().join("test.db").to_string_lossy().into_owned(),
            wal_mode: true,
        };

        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;
        let storage: Arc<dyn StorageAdapter> = Arc::new(storage);

        let mut provider = MockProvider::with_responses(self.responses);
        if let Some(tokens) = self.max_context {
            provider = provider.with_max_context(tokens);
        }
        let mock_provider = Arc::new(provider);

        let service = Arc::new(AgentService::new(
            &config,
            "mock-model",
            mock_provider.clone(),
            Arc::clone(&storage),
        ));

        Ok(TestHarness {
            mock_provider,
            storage,
            service,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with a mock provider and temp storage.
pub struct TestHarness {
    /// The mock LLM provider.
    pub mock_provider: Arc<MockProvider>,
    /// SQLite storage adapter (temp DB, cleaned up on drop).
    pub storage: Arc<dyn StorageAdapter>,
    /// The agent service under test, shareable with a gateway router.
    pub service: Arc<AgentService>,
    /// Configuration the service was built from.
    pub config: MnemosConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Creates an agent with config defaults.
    pub async fn create_agent(&self) -> Result<AgentRecord, MnemosError> {
        self.service.create_agent(NewAgent::default()).await
    }

    /// Sends `text` from `test-user` to `agent_id` and returns the reply.
    pub async fn send_message(&self, agent_id: &str, text: &str) -> Result<TurnReply, MnemosError> {
        self.service
            .send_message(agent_id, text, "test-user", Metadata::new())
            .await
    }
}
