// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Write-ahead record of memory mutations made during one turn.
//!
//! Memory is mutated in place under the agent lock. Every mutation is also
//! recorded here and flushed to storage before the lock is released, so the
//! persisted state follows the in-memory state.

use mnemos_core::traits::{
    ArchivalMemoryCapability, CoreMemoryCapability, RecallMemoryCapability, StorageAdapter,
};
use mnemos_core::types::{AgentMessage, ArchivalItem, Metadata};
use mnemos_core::MnemosError;
use mnemos_memory::MemoryManager;
use tracing::debug;

/// One change to persist.
#[derive(Debug, Clone, PartialEq)]
pub enum MemoryMutation {
    CoreSet { key: String, value: String },
    CoreDelete { key: String },
    ArchivalAdd(ArchivalItem),
    ArchivalDelete { id: String },
    Message(AgentMessage),
}

/// Ordered mutations awaiting a flush.
#[derive(Debug, Default)]
pub struct MemoryJournal {
    entries: Vec<MemoryMutation>,
}

impl MemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, mutation: MemoryMutation) {
        self.entries.push(mutation);
    }

    pub fn entries(&self) -> &[MemoryMutation] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes every entry to `storage` in order and empties the journal.
    ///
    /// Stops at the first failure. Entries already written stay written and
    /// the rest are discarded.
    pub async fn flush(
        &mut self,
        storage: &dyn StorageAdapter,
        agent_id: &str,
    ) -> Result<usize, MnemosError> {
        let entries = std::mem::take(&mut self.entries);
        let count = entries.len();
        for entry in entries {
            match entry {
                MemoryMutation::CoreSet { key, value } => {
                    storage.save_memory_block(agent_id, &key, &value).await?;
                }
                MemoryMutation::CoreDelete { key } => {
                    storage.delete_memory_block(agent_id, &key).await?;
                }
                MemoryMutation::ArchivalAdd(item) => {
                    storage.save_archival_item(agent_id, &item).await?;
                }
                MemoryMutation::ArchivalDelete { id } => {
                    storage.delete_archival_item(agent_id, &id).await?;
                }
                MemoryMutation::Message(message) => {
                    storage.save_message(agent_id, &message).await?;
                }
            }
        }
        if count > 0 {
            debug!(agent_id, count, "flushed memory journal");
        }
        Ok(count)
    }
}

/// An agent's memory with every mutation mirrored into a journal.
///
/// This is what tools receive as `&mut dyn MemoryCapabilities`.
pub struct JournaledMemory<'a> {
    memory: &'a mut MemoryManager,
    journal: &'a mut MemoryJournal,
}

impl<'a> JournaledMemory<'a> {
    pub fn new(memory: &'a mut MemoryManager, journal: &'a mut MemoryJournal) -> Self {
        Self { memory, journal }
    }

    pub fn memory(&self) -> &MemoryManager {
        self.memory
    }

    /// Appends to recall, journaling the message and any eviction hand-off.
    pub fn append_recall(&mut self, message: AgentMessage) {
        let outcome = self.memory.append_recall(message.clone());
        self.journal.record(MemoryMutation::Message(message));
        for item in outcome.archived {
            self.journal.record(MemoryMutation::ArchivalAdd(item));
        }
    }

    pub fn delete_archival(&mut self, id: &str) -> bool {
        let deleted = self.memory.delete_archival(id);
        if deleted {
            self.journal.record(MemoryMutation::ArchivalDelete { id: id.to_string() });
        }
        deleted
    }
}

impl CoreMemoryCapability for JournaledMemory<'_> {
    fn set_core(&mut self, key: &str, value: &str) -> String {
        let stored = self.memory.set_core(key, value);
        self.journal.record(MemoryMutation::CoreSet {
            key: key.to_string(),
            value: stored.clone(),
        });
        stored
    }

    fn get_core(&self, key: &str) -> Option<String> {
        self.memory.get_core(key).map(str::to_string)
    }

    fn delete_core(&mut self, key: &str) -> bool {
        let deleted = self.memory.delete_core(key);
        if deleted {
            self.journal.record(MemoryMutation::CoreDelete { key: key.to_string() });
        }
        deleted
    }
}

impl ArchivalMemoryCapability for JournaledMemory<'_> {
    fn add_archival(&mut self, content: &str, metadata: Metadata) -> ArchivalItem {
        let item = self.memory.add_archival(content, metadata);
        self.journal.record(MemoryMutation::ArchivalAdd(item.clone()));
        item
    }

    fn search_archival(&self, query: &str, limit: usize) -> Vec<ArchivalItem> {
        self.memory.search_archival(query, limit)
    }
}

impl RecallMemoryCapability for JournaledMemory<'_> {
    fn search_recall(&self, query: &str, limit: usize) -> Vec<AgentMessage> {
        self.memory.search_recall(query, limit)
    }
}
