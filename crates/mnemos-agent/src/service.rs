// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The agent service: the only entry point the HTTP layer talks to.

use std::collections::BTreeMap;
use std::sync::Arc;

use mnemos_bus::PostOffice;
use mnemos_config::model::{AgentConfig, MnemosConfig};
use mnemos_core::traits::{PluginAdapter, ProviderAdapter, StorageAdapter};
use mnemos_core::types::{AgentMessage, AgentRecord, ArchivalItem, HealthStatus, MessageType, Metadata};
use mnemos_core::MnemosError;
use mnemos_memory::MemoryStats;
use serde::Deserialize;
use tracing::{info, warn};

use crate::agent::{Agent, AgentRuntime, TurnReply};
use crate::registry::AgentRegistry;

/// Fields of a create request. Absent fields fall back to `[agent]` config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAgent {
    #[serde(default)]
    pub name: Option<String>,
    /// Model id passed to the provider.
    #[serde(default)]
    pub model: Option<String>,
    /// Seeds the `persona` core block.
    #[serde(default)]
    pub persona: Option<String>,
    /// Replaces the base system prompt.
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Per-agent context window cap in tokens.
    #[serde(default)]
    pub context_window_limit: Option<u32>,
}

/// Creates, loads, and drives agents on behalf of callers.
#[derive(Debug)]
pub struct AgentService {
    registry: AgentRegistry,
    defaults: AgentConfig,
    default_model: String,
    search_limit: usize,
}

impl AgentService {
    /// `default_model` is used when neither the request nor `[agent]` names one.
    pub fn new(
        config: &MnemosConfig,
        default_model: impl Into<String>,
        provider: Arc<dyn ProviderAdapter>,
        storage: Arc<dyn StorageAdapter>,
    ) -> Self {
        let runtime = AgentRuntime::from_config(config, provider, storage);
        Self::with_runtime(config, default_model, runtime)
    }

    /// Builds the service over a prepared runtime, e.g. one with a custom
    /// tool round limit.
    pub fn with_runtime(
        config: &MnemosConfig,
        default_model: impl Into<String>,
        runtime: AgentRuntime,
    ) -> Self {
        Self {
            registry: AgentRegistry::new(Arc::new(runtime)),
            defaults: config.agent.clone(),
            default_model: default_model.into(),
            search_limit: config.context.search_limit,
        }
    }

    /// The registry of agents currently held in memory.
    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Per-agent mailboxes shared by every loaded agent.
    pub fn post_office(&self) -> &PostOffice {
        &self.registry.runtime().post_office
    }

    fn storage(&self) -> &dyn StorageAdapter {
        self.registry.runtime().storage.as_ref()
    }

    async fn agent(&self, id: &str) -> Result<Arc<Agent>, MnemosError> {
        self.registry.load(id).await
    }

    // --- Agents ---

    /// Creates and persists a new agent with a fresh `agent-xxxxxxxx` id.
    ///
    /// Unset fields take the `[agent]` defaults; a persona seeds the
    /// `persona` core block.
    pub async fn create_agent(&self, request: NewAgent) -> Result<AgentRecord, MnemosError> {
        let model = request
            .model
            .or_else(|| self.defaults.default_model.clone())
            .unwrap_or_else(|| self.default_model.clone());
        let mut record = AgentRecord::new(
            new_agent_id(),
            request.name.unwrap_or_else(|| self.defaults.name.clone()),
            model,
        );
        record.persona = request
            .persona
            .unwrap_or_else(|| self.defaults.persona.clone());
        record.system_prompt = request.system_prompt.unwrap_or_default();
        record.context_window_limit = request
            .context_window_limit
            .unwrap_or(self.defaults.context_window_limit);

        let agent = self.registry.create(record).await?;
        Ok(agent.record().await)
    }

    /// The agent's record, loading it from storage if needed.
    pub async fn get_agent(&self, id: &str) -> Result<AgentRecord, MnemosError> {
        Ok(self.agent(id).await?.record().await)
    }

    /// Every stored agent, loaded or not, oldest first.
    pub async fn list_agents(&self) -> Result<Vec<AgentRecord>, MnemosError> {
        self.storage().list_agents().await
    }

    /// Deletes the agent and all of its memory. Unknown ids are `NotFound`.
    pub async fn delete_agent(&self, id: &str) -> Result<(), MnemosError> {
        if self.registry.delete(id).await? {
            Ok(())
        } else {
            Err(MnemosError::agent_not_found(id))
        }
    }

    // --- Conversation ---

    /// Runs one turn of agent `id` for a message from `sender_id`.
    ///
    /// Pending mail is appended to recall before the message itself. Fails
    /// with `ContextOverflow` before any generation call when the assembled
    /// context does not fit.
    pub async fn send_message(
        &self,
        id: &str,
        content: &str,
        sender_id: &str,
        metadata: Metadata,
    ) -> Result<TurnReply, MnemosError> {
        let agent = self.agent(id).await?;
        let inbound = AgentMessage::new(sender_id, id, content).with_metadata(metadata);
        agent.handle_message(inbound).await
    }

    /// Sends a message from one agent to another's mailbox. The receiver
    /// reads it at the start of its next turn.
    pub async fn send_mail(
        &self,
        sender_id: &str,
        receiver_id: &str,
        content: &str,
        message_type: MessageType,
        metadata: Metadata,
    ) -> Result<AgentMessage, MnemosError> {
        let sender = self.agent(sender_id).await?;
        // Loading the receiver proves it exists and opens its mailbox.
        self.agent(receiver_id).await?;

        let message = self.post_office().send(
            sender_id,
            receiver_id,
            content,
            message_type,
            metadata,
        )?;
        sender.record_outgoing(message.clone()).await?;
        info!(sender_id, receiver_id, "mail sent");
        Ok(message)
    }

    // --- Memory ---

    /// Every core block of the agent, ordered by key.
    pub async fn core_memory(&self, id: &str) -> Result<BTreeMap<String, String>, MnemosError> {
        Ok(self.agent(id).await?.core_blocks().await)
    }

    /// Stores a core block and returns the value as stored.
    pub async fn set_core_memory(
        &self,
        id: &str,
        key: &str,
        value: &str,
    ) -> Result<String, MnemosError> {
        self.agent(id).await?.set_core(key, value).await
    }

    /// Removes a core block. Returns false if the key was not set.
    pub async fn delete_core_memory(&self, id: &str, key: &str) -> Result<bool, MnemosError> {
        self.agent(id).await?.delete_core(key).await
    }

    /// The newest `limit` recall entries, oldest first.
    pub async fn recall(&self, id: &str, limit: usize) -> Result<Vec<AgentMessage>, MnemosError> {
        Ok(self.agent(id).await?.recent_recall(limit).await)
    }

    /// Recall entries containing `query`, ignoring case, newest first.
    /// `None` uses `[context].search_limit`.
    pub async fn search_recall(
        &self,
        id: &str,
        query: &str,
        limit: Option<usize>,
    ) -> Result<Vec<AgentMessage>, MnemosError> {
        let limit = limit.unwrap_or(self.search_limit);
        Ok(self.agent(id).await?.search_recall(query, limit).await)
    }

    /// Stores a new archival item and persists it.
    pub async fn insert_archival(
        &self,
        id: &str,
        content: &str,
        metadata: Metadata,
    ) -> Result<ArchivalItem, MnemosError> {
        self.agent(id).await?.insert_archival(content, metadata).await
    }

    /// Archival items containing `query`, ignoring case, in insertion
    /// order. `None` uses `[context].search_limit`.
    pub async fn search_archival(
        &self,
        id: &str,
        query: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ArchivalItem>, MnemosError> {
        let limit = limit.unwrap_or(self.search_limit);
        Ok(self.agent(id).await?.search_archival(query, limit).await)
    }

    /// One archival item by id. Unknown items are `NotFound`.
    pub async fn get_archival(&self, id: &str, item_id: &str) -> Result<ArchivalItem, MnemosError> {
        self.agent(id).await?.get_archival(item_id).await
    }

    /// Deletes one archival item. Unknown items are `NotFound`.
    pub async fn delete_archival(&self, id: &str, item_id: &str) -> Result<(), MnemosError> {
        self.agent(id).await?.delete_archival(item_id).await
    }

    /// Entry counts and content sizes for each memory tier.
    pub async fn memory_stats(&self, id: &str) -> Result<MemoryStats, MnemosError> {
        Ok(self.agent(id).await?.stats().await)
    }

    // --- Lifecycle ---

    /// Storage health. Fails once storage has been closed.
    pub async fn health(&self) -> Result<HealthStatus, MnemosError> {
        self.storage().health_check().await
    }

    /// Waits for in-flight turns, evicts every agent, then closes storage.
    pub async fn shutdown(&self) -> Result<(), MnemosError> {
        let evicted = self.registry.evict_all().await;
        let runtime = self.registry.runtime();
        if let Err(e) = runtime.provider.shutdown().await {
            warn!(error = %e, "provider shutdown failed");
        }
        runtime.storage.close().await?;
        info!(evicted, "agent service shut down");
        Ok(())
    }
}

/// `agent-` followed by eight lowercase hex characters.
fn new_agent_id() -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    format!("agent-{}", &hex[..8])
}
