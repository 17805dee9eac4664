// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Facade over the three memory tiers.

use std::collections::BTreeMap;

use mnemos_core::traits::{ArchivalMemoryCapability, CoreMemoryCapability, RecallMemoryCapability};
use mnemos_core::types::{AgentMessage, ArchivalItem, Metadata};
use serde::Serialize;

use crate::archival::ArchivalMemoryStore;
use crate::core_memory::CoreMemoryStore;
use crate::recall::RecallMemoryStore;

/// Metadata `source` value marking archival items produced by recall eviction.
pub const RECALL_EVICTION_SOURCE: &str = "recall_eviction";

/// Size limits for one agent's memory.
#[derive(Debug, Clone, Copy)]
pub struct MemoryLimits {
    pub max_block_size: usize,
    pub max_messages: usize,
    /// Copy recall entries lost to overflow into archival memory.
    pub archive_evicted_recall: bool,
}

impl Default for MemoryLimits {
    fn default() -> Self {
        Self {
            max_block_size: 1024,
            max_messages: 1000,
            archive_evicted_recall: false,
        }
    }
}

/// Count and character size of one tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TierStats {
    pub count: usize,
    pub total_size: usize,
}

/// Per-tier statistics, used by callers to decide when to archive or evict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemoryStats {
    pub core_memory: TierStats,
    pub archival_memory: TierStats,
    pub recall_memory: TierStats,
}

/// Outcome of a recall append.
#[derive(Debug, Default)]
pub struct RecallAppend {
    /// Entries pushed out by FIFO overflow, oldest first.
    pub evicted: Vec<AgentMessage>,
    /// Archival items created from `evicted` when hand-off is enabled.
    pub archived: Vec<ArchivalItem>,
}

/// One agent's memory. Every operation delegates to exactly one store,
/// except recall appends with eviction hand-off, which also write archival.
#[derive(Debug, Clone)]
pub struct MemoryManager {
    core: CoreMemoryStore,
    archival: ArchivalMemoryStore,
    recall: RecallMemoryStore,
    archive_evicted_recall: bool,
}

impl MemoryManager {
    pub fn new(limits: MemoryLimits) -> Self {
        Self {
            core: CoreMemoryStore::new(limits.max_block_size),
            archival: ArchivalMemoryStore::new(),
            recall: RecallMemoryStore::new(limits.max_messages),
            archive_evicted_recall: limits.archive_evicted_recall,
        }
    }

    /// Rebuilds memory from persisted state.
    ///
    /// Blocks are re-truncated against the current cap and recall keeps only
    /// the newest `max_messages` entries. No eviction hand-off happens here.
    pub fn restore(
        limits: MemoryLimits,
        blocks: BTreeMap<String, String>,
        archival: Vec<ArchivalItem>,
        messages: Vec<AgentMessage>,
    ) -> Self {
        let mut manager = Self::new(limits);
        for (key, value) in &blocks {
            manager.core.set(key, value);
        }
        for item in archival {
            manager.archival.insert(item);
        }
        for message in messages {
            manager.recall.append(message);
        }
        manager
    }

    pub fn core(&self) -> &CoreMemoryStore {
        &self.core
    }

    pub fn archival(&self) -> &ArchivalMemoryStore {
        &self.archival
    }

    pub fn recall(&self) -> &RecallMemoryStore {
        &self.recall
    }

    // --- Core ---

    pub fn set_core(&mut self, key: &str, value: &str) -> String {
        self.core.set(key, value)
    }

    pub fn get_core(&self, key: &str) -> Option<&str> {
        self.core.get(key)
    }

    pub fn delete_core(&mut self, key: &str) -> bool {
        self.core.delete(key)
    }

    pub fn core_blocks(&self) -> BTreeMap<String, String> {
        self.core.all()
    }

    // --- Archival ---

    pub fn add_archival(&mut self, content: &str, metadata: Metadata) -> ArchivalItem {
        self.archival.add(content, metadata)
    }

    pub fn search_archival(&self, query: &str, limit: usize) -> Vec<ArchivalItem> {
        self.archival.search(query, limit)
    }

    pub fn get_archival(&self, id: &str) -> Option<&ArchivalItem> {
        self.archival.get(id)
    }

    pub fn delete_archival(&mut self, id: &str) -> bool {
        self.archival.delete(id)
    }

    // --- Recall ---

    /// Appends to recall and applies FIFO eviction.
    pub fn append_recall(&mut self, message: AgentMessage) -> RecallAppend {
        let evicted = self.recall.append(message);
        if evicted.is_empty() {
            return RecallAppend::default();
        }

        metrics::counter!("mnemos_recall_evicted_total").increment(evicted.len() as u64);
        tracing::debug!(count = evicted.len(), "evicted recall entries");

        let archived = if self.archive_evicted_recall {
            evicted
                .iter()
                .map(|message| {
                    let mut metadata = Metadata::new();
                    metadata.insert("source".into(), RECALL_EVICTION_SOURCE.into());
                    metadata.insert("sender_id".into(), message.sender_id.clone().into());
                    metadata.insert("timestamp".into(), message.timestamp.into());
                    self.archival.add(&message.content, metadata)
                })
                .collect()
        } else {
            Vec::new()
        };

        RecallAppend { evicted, archived }
    }

    pub fn search_recall(&self, query: &str, limit: usize) -> Vec<AgentMessage> {
        self.recall.search(query, limit)
    }

    pub fn recent_recall(&self, limit: usize) -> Vec<AgentMessage> {
        self.recall.recent(limit)
    }

    pub fn recall_range(&self, start: usize, end: Option<usize>) -> Vec<AgentMessage> {
        self.recall.range(start, end)
    }

    // --- Cross-tier ---

    pub fn stats(&self) -> MemoryStats {
        MemoryStats {
            core_memory: TierStats {
                count: self.core.count(),
                total_size: self.core.total_size(),
            },
            archival_memory: TierStats {
                count: self.archival.count(),
                total_size: self.archival.total_size(),
            },
            recall_memory: TierStats {
                count: self.recall.count(),
                total_size: self.recall.total_size(),
            },
        }
    }

    /// Empties all three tiers. Never called implicitly.
    pub fn clear_all(&mut self) {
        self.core.clear();
        self.archival.clear();
        self.recall.clear();
    }
}

impl CoreMemoryCapability for MemoryManager {
    fn set_core(&mut self, key: &str, value: &str) -> String {
        MemoryManager::set_core(self, key, value)
    }

    fn get_core(&self, key: &str) -> Option<String> {
        MemoryManager::get_core(self, key).map(str::to_string)
    }

    fn delete_core(&mut self, key: &str) -> bool {
        MemoryManager::delete_core(self, key)
    }
}

impl ArchivalMemoryCapability for MemoryManager {
    fn add_archival(&mut self, content: &str, metadata: Metadata) -> ArchivalItem {
        MemoryManager::add_archival(self, content, metadata)
    }

    fn search_archival(&self, query: &str, limit: usize) -> Vec<ArchivalItem> {
        MemoryManager::search_archival(self, query, limit)
    }
}

impl RecallMemoryCapability for MemoryManager {
    fn search_recall(&self, query: &str, limit: usize) -> Vec<AgentMessage> {
        MemoryManager::search_recall(self, query, limit)
    }
}
