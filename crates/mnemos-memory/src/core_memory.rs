// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core memory: small keyed blocks that are always part of the context.

use std::collections::BTreeMap;

use mnemos_core::text::{char_len, truncate_chars};

/// Keyed text blocks capped at `max_block_size` characters.
///
/// The cap is enforced on write. A value longer than the cap is cut to its
/// first `max_block_size` characters and stored without error.
#[derive(Debug, Clone)]
pub struct CoreMemoryStore {
    blocks: BTreeMap<String, String>,
    max_block_size: usize,
}

impl CoreMemoryStore {
    pub fn new(max_block_size: usize) -> Self {
        Self {
            blocks: BTreeMap::new(),
            max_block_size,
        }
    }

    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    /// Stores `value` under `key`, overwriting any previous value.
    ///
    /// Returns the value as stored, after truncation.
    pub fn set(&mut self, key: &str, value: &str) -> String {
        let stored = truncate_chars(value, self.max_block_size);
        if char_len(value) > self.max_block_size {
            tracing::debug!(
                key,
                original_chars = char_len(value),
                max_block_size = self.max_block_size,
                "truncated core memory block"
            );
        }
        self.blocks.insert(key.to_string(), stored.clone());
        stored
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.blocks.get(key).map(String::as_str)
    }

    pub fn has(&self, key: &str) -> bool {
        self.blocks.contains_key(key)
    }

    /// Removes `key`. Deleting an absent key is a no-op that returns false.
    pub fn delete(&mut self, key: &str) -> bool {
        self.blocks.remove(key).is_some()
    }

    /// Snapshot of every block, ordered by key.
    ///
    /// The returned map is a copy; mutating it leaves the store untouched.
    pub fn all(&self) -> BTreeMap<String, String> {
        self.blocks.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.blocks.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn count(&self) -> usize {
        self.blocks.len()
    }

    /// Sum of stored value lengths in characters.
    pub fn total_size(&self) -> usize {
        self.blocks.values().map(|v| char_len(v)).sum()
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
    }
}
