// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Archival memory: unbounded, out-of-context, searched on demand.

use chrono::{SubsecRound, Utc};
use mnemos_core::text::{char_len, matches_query};
use mnemos_core::types::{ArchivalItem, Metadata};

/// Append-only list of immutable archival items.
///
/// Ids are UUIDv7 strings, so they sort by creation time and are never
/// reused after a delete.
#[derive(Debug, Clone, Default)]
pub struct ArchivalMemoryStore {
    items: Vec<ArchivalItem>,
}

impl ArchivalMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates and stores a new item. Returns a copy of it.
    pub fn add(&mut self, content: &str, metadata: Metadata) -> ArchivalItem {
        let item = ArchivalItem {
            id: uuid::Uuid::now_v7().to_string(),
            content: content.to_string(),
            metadata,
            // Microsecond precision survives a storage round trip unchanged.
            created_at: Utc::now().trunc_subsecs(6),
        };
        self.items.push(item.clone());
        item
    }

    /// Appends an item that already has an id, e.g. when rehydrating from storage.
    pub fn insert(&mut self, item: ArchivalItem) {
        self.items.push(item);
    }

    /// The item with `id`, if it exists.
    pub fn get(&self, id: &str) -> Option<&ArchivalItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Up to `limit` items whose content contains `query`, ignoring case,
    /// in insertion order.
    pub fn search(&self, query: &str, limit: usize) -> Vec<ArchivalItem> {
        self.items
            .iter()
            .filter(|item| matches_query(&item.content, query))
            .take(limit)
            .cloned()
            .collect()
    }

    /// Removes the item with `id`. Returns false if no such item exists.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.items.len() != before
    }

    /// All items in insertion order.
    pub fn items(&self) -> &[ArchivalItem] {
        &self.items
    }

    /// Number of stored items.
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Sum of the content lengths of all items, in characters.
    pub fn total_size(&self) -> usize {
        self.items.iter().map(|item| char_len(&item.content)).sum()
    }

    /// Removes every item.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}
