// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recall memory: the bounded chronological conversation log.

use std::collections::VecDeque;

use mnemos_core::text::{char_len, matches_query};
use mnemos_core::types::AgentMessage;

/// Message log holding at most `max_messages` entries.
///
/// Insertion order is chronological order. Overflow evicts from the front
/// only, so the survivors are always the most recent entries in their
/// original relative order.
#[derive(Debug, Clone)]
pub struct RecallMemoryStore {
    entries: VecDeque<AgentMessage>,
    max_messages: usize,
}

impl RecallMemoryStore {
    pub fn new(max_messages: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_messages,
        }
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    /// Appends `message`, then evicts the oldest entries beyond the cap.
    ///
    /// Returns the evicted entries, oldest first.
    pub fn append(&mut self, message: AgentMessage) -> Vec<AgentMessage> {
        self.entries.push_back(message);
        let overflow = self.entries.len().saturating_sub(self.max_messages);
        self.entries.drain(..overflow).collect()
    }

    /// Up to `limit` entries containing `query`, ignoring case, most recent first.
    pub fn search(&self, query: &str, limit: usize) -> Vec<AgentMessage> {
        self.entries
            .iter()
            .rev()
            .filter(|m| matches_query(&m.content, query))
            .take(limit)
            .cloned()
            .collect()
    }

    /// The last `limit` entries in chronological order.
    pub fn recent(&self, limit: usize) -> Vec<AgentMessage> {
        let skip = self.entries.len().saturating_sub(limit);
        self.entries.iter().skip(skip).cloned().collect()
    }

    /// Chronological slice `[start, end)`. `None` runs to the end; bounds are clamped.
    pub fn range(&self, start: usize, end: Option<usize>) -> Vec<AgentMessage> {
        let len = self.entries.len();
        let end = end.unwrap_or(len).min(len);
        if start >= end {
            return Vec::new();
        }
        self.entries.range(start..end).cloned().collect()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &AgentMessage> {
        self.entries.iter()
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn total_size(&self) -> usize {
        self.entries.iter().map(|m| char_len(&m.content)).sum()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn msg(content: &str) -> AgentMessage {
        AgentMessage::new("user", "agent-1", content)
    }

    fn contents(messages: &[AgentMessage]) -> Vec<&str> {
        messages.iter().map(|m| m.content.as_str()).collect()
    }

    #[test]
    fn overflow_evicts_oldest_first() {
        let mut store = RecallMemoryStore::new(3);
        let mut evicted = Vec::new();
        for i in 0..5 {
            evicted.extend(store.append(msg(&format!("m{i}"))));
        }
        assert_eq!(contents(&store.recent(10)), vec!["m2", "m3", "m4"]);
        assert_eq!(contents(&evicted), vec!["m0", "m1"]);
    }

    #[test]
    fn search_scans_most_recent_first() {
        let mut store = RecallMemoryStore::new(10);
        store.append(msg("apple pie"));
        store.append(msg("banana"));
        store.append(msg("Apple tart"));
        assert_eq!(contents(&store.search("apple", 5)), vec!["Apple tart", "apple pie"]);
        assert_eq!(contents(&store.search("apple", 1)), vec!["Apple tart"]);
    }

    #[test]
    fn recent_and_range_are_chronological() {
        let mut store = RecallMemoryStore::new(10);
        for c in ["a", "b", "c", "d"] {
            store.append(msg(c));
        }
        assert_eq!(contents(&store.recent(2)), vec!["c", "d"]);
        assert_eq!(contents(&store.range(1, Some(3))), vec!["b", "c"]);
        assert_eq!(contents(&store.range(2, None)), vec!["c", "d"]);
        assert!(store.range(3, Some(1)).is_empty());
        assert!(store.range(9, None).is_empty());
    }

    #[test]
    fn total_size_sums_content_chars() {
        let mut store = RecallMemoryStore::new(10);
        store.append(msg("hello"));
        store.append(msg("héllo"));
        assert_eq!(store.total_size(), 10);
    }

    proptest! {
        #[test]
        fn keeps_exactly_the_last_max_messages(cap in 1usize..20, extra in 1usize..40) {
            let n = cap + extra;
            let mut store = RecallMemoryStore::new(cap);
            for i in 0..n {
                store.append(msg(&i.to_string()));
            }
            let expected: Vec<String> = (n - cap..n).map(|i| i.to_string()).collect();
            let actual: Vec<String> = store.recent(n).into_iter().map(|m| m.content).collect();
            prop_assert_eq!(actual, expected);
        }
    }
}
