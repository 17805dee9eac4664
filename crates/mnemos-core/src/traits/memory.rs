// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory capability traits through which tools reach an agent's stores.
//!
//! Tool handlers never hold a store directly. The executor receives the
//! agent's memory as `&mut dyn MemoryCapabilities` for the duration of one
//! call, which keeps every mutation inside the agent's lock scope.

use crate::types::{AgentMessage, ArchivalItem, Metadata};

/// Keyed, size-capped blocks that are always in context.
pub trait CoreMemoryCapability {
    /// Stores `value` under `key`, truncating to the store's block size.
    /// Returns the value as stored.
    fn set_core(&mut self, key: &str, value: &str) -> String;

    fn get_core(&self, key: &str) -> Option<String>;

    /// Removes `key`. Returns false if it was absent.
    fn delete_core(&mut self, key: &str) -> bool;
}

/// Unbounded out-of-context storage searched on demand.
pub trait ArchivalMemoryCapability {
    fn add_archival(&mut self, content: &str, metadata: Metadata) -> ArchivalItem;

    /// Up to `limit` matches in insertion order.
    fn search_archival(&self, query: &str, limit: usize) -> Vec<ArchivalItem>;
}

/// Bounded conversation log.
pub trait RecallMemoryCapability {
    /// Up to `limit` matches, most recent first.
    fn search_recall(&self, query: &str, limit: usize) -> Vec<AgentMessage>;
}

/// Everything a built-in memory tool may touch.
pub trait MemoryCapabilities:
    CoreMemoryCapability + ArchivalMemoryCapability + RecallMemoryCapability + Send
{
}

impl<T> MemoryCapabilities for T where
    T: CoreMemoryCapability + ArchivalMemoryCapability + RecallMemoryCapability + Send
{
}
