// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends (SQLite, etc.).

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::MnemosError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{AgentMessage, AgentRecord, ArchivalItem};

/// Adapter for durable storage of agents and their memory tiers.
///
/// Every operation is keyed by agent id. Search operations follow the same
/// ordering contract as the in-memory stores: archival results in insertion
/// order, message results most recent first.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), MnemosError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), MnemosError>;

    // --- Agents ---

    /// Inserts or replaces an agent record.
    async fn save_agent(&self, record: &AgentRecord) -> Result<(), MnemosError>;

    async fn get_agent(&self, id: &str) -> Result<Option<AgentRecord>, MnemosError>;

    /// Lists all agents, oldest first.
    async fn list_agents(&self) -> Result<Vec<AgentRecord>, MnemosError>;

    /// Deletes an agent and all of its memory. Returns false if it did not exist.
    async fn delete_agent(&self, id: &str) -> Result<bool, MnemosError>;

    // --- Core memory ---

    async fn save_memory_block(
        &self,
        agent_id: &str,
        key: &str,
        value: &str,
    ) -> Result<(), MnemosError>;

    async fn delete_memory_block(&self, agent_id: &str, key: &str) -> Result<(), MnemosError>;

    async fn get_memory_blocks(
        &self,
        agent_id: &str,
    ) -> Result<BTreeMap<String, String>, MnemosError>;

    // --- Archival memory ---

    /// Persists an archival item under the id already assigned to it. Returns that id.
    async fn save_archival_item(
        &self,
        agent_id: &str,
        item: &ArchivalItem,
    ) -> Result<String, MnemosError>;

    /// All archival items for an agent in insertion order.
    async fn get_archival_items(&self, agent_id: &str) -> Result<Vec<ArchivalItem>, MnemosError>;

    async fn search_archival(
        &self,
        agent_id: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<ArchivalItem>, MnemosError>;

    async fn delete_archival_item(&self, agent_id: &str, id: &str) -> Result<bool, MnemosError>;

    // --- Messages ---

    /// Persists a message and returns its storage id.
    async fn save_message(
        &self,
        agent_id: &str,
        message: &AgentMessage,
    ) -> Result<String, MnemosError>;

    /// The last `limit` messages in chronological order.
    async fn get_recent_messages(
        &self,
        agent_id: &str,
        limit: usize,
    ) -> Result<Vec<AgentMessage>, MnemosError>;

    async fn search_messages(
        &self,
        agent_id: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<AgentMessage>, MnemosError>;
}
