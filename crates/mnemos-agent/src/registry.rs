// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Loaded agents of one process, with an explicit load/evict lifecycle.

use std::sync::Arc;

use dashmap::DashMap;
use mnemos_core::types::AgentRecord;
use mnemos_core::MnemosError;
use mnemos_memory::MemoryManager;
use tracing::{debug, info};

use crate::agent::{Agent, AgentRuntime};

/// Agents currently held in memory, keyed by id.
///
/// Nothing is loaded implicitly at startup. `load` rehydrates an agent from
/// storage; `evict` drops it from memory without touching storage.
pub struct AgentRegistry {
    agents: DashMap<String, Arc<Agent>>,
    runtime: Arc<AgentRuntime>,
}

impl AgentRegistry {
    pub fn new(runtime: Arc<AgentRuntime>) -> Self {
        Self {
            agents: DashMap::new(),
            runtime,
        }
    }

    pub fn runtime(&self) -> &Arc<AgentRuntime> {
        &self.runtime
    }

    /// Persists a new record and loads an agent for it with empty memory.
    pub async fn create(&self, record: AgentRecord) -> Result<Arc<Agent>, MnemosError> {
        self.runtime.storage.save_agent(&record).await?;
        let id = record.id.clone();
        let memory = MemoryManager::new(self.runtime.limits);
        let agent = Arc::new(Agent::open(record, memory, Arc::clone(&self.runtime)).await?);
        self.runtime.post_office.open(&id);
        self.agents.insert(id.clone(), Arc::clone(&agent));
        info!(agent_id = %id, "agent created");
        Ok(agent)
    }

    /// Rehydrates an agent from storage: core blocks, archival items, and
    /// the last `max_messages` recall entries.
    ///
    /// Returns the already loaded agent if there is one.
    pub async fn load(&self, id: &str) -> Result<Arc<Agent>, MnemosError> {
        if let Some(agent) = self.get(id) {
            return Ok(agent);
        }

        let storage = &self.runtime.storage;
        let record = storage
            .get_agent(id)
            .await?
            .ok_or_else(|| MnemosError::agent_not_found(id))?;
        let blocks = storage.get_memory_blocks(id).await?;
        let archival = storage.get_archival_items(id).await?;
        let messages = storage
            .get_recent_messages(id, self.runtime.limits.max_messages)
            .await?;
        debug!(
            agent_id = %id,
            blocks = blocks.len(),
            archival = archival.len(),
            messages = messages.len(),
            "rehydrating agent"
        );

        let memory = MemoryManager::restore(self.runtime.limits, blocks, archival, messages);
        let agent = Arc::new(Agent::open(record, memory, Arc::clone(&self.runtime)).await?);
        self.runtime.post_office.open(id);

        // A concurrent load may have won the race; keep the first one in.
        let entry = self.agents.entry(id.to_string()).or_insert(agent);
        Ok(Arc::clone(entry.value()))
    }

    pub fn get(&self, id: &str) -> Option<Arc<Agent>> {
        self.agents.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Drops an agent from memory. Its mailbox stays open so mail sent while
    /// it is unloaded is still delivered on the next turn.
    pub fn evict(&self, id: &str) -> bool {
        let evicted = self.agents.remove(id).is_some();
        if evicted {
            debug!(agent_id = %id, "agent evicted");
        }
        evicted
    }

    /// Waits for each loaded agent's in-flight turn, then evicts it.
    pub async fn evict_all(&self) -> usize {
        let ids = self.loaded();
        let mut count = 0;
        for id in ids {
            if let Some((_, agent)) = self.agents.remove(&id) {
                agent.idle().await;
                count += 1;
            }
        }
        info!(count, "evicted all agents");
        count
    }

    /// Ids of the agents currently in memory.
    pub fn loaded(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.agents.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn is_loaded(&self, id: &str) -> bool {
        self.agents.contains_key(id)
    }

    /// Evicts the agent, closes its mailbox, and deletes it with all of its
    /// memory from storage. Returns false if storage had no such agent.
    ///
    /// Handles resolved before the delete are retired: their next turn or
    /// mutation fails with `NotFound` without reaching the provider.
    pub async fn delete(&self, id: &str) -> Result<bool, MnemosError> {
        if let Some((_, agent)) = self.agents.remove(id) {
            agent.retire().await;
        }
        self.runtime.post_office.close(id);
        let deleted = self.runtime.storage.delete_agent(id).await?;
        if deleted {
            info!(agent_id = %id, "agent deleted");
        }
        Ok(deleted)
    }
}

impl std::fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRegistry")
            .field("loaded", &self.agents.len())
            .finish_non_exhaustive()
    }
}
