// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Routes messages between agents' mailboxes.

use dashmap::DashMap;
use mnemos_core::types::{AgentMessage, MessageType, Metadata};
use mnemos_core::MnemosError;

use crate::mailbox::Mailbox;

/// All mailboxes of one process, keyed by agent id.
///
/// Each mailbox lives in a `DashMap` slot, so a delivery and a drain on the
/// same mailbox are serialized by the slot lock: a message is either in the
/// drained batch or still queued, never both and never lost.
#[derive(Debug)]
pub struct PostOffice {
    mailboxes: DashMap<String, Mailbox>,
    max_queue_size: usize,
}

impl PostOffice {
    pub fn new(max_queue_size: usize) -> Self {
        Self {
            mailboxes: DashMap::new(),
            max_queue_size,
        }
    }

    pub fn max_queue_size(&self) -> usize {
        self.max_queue_size
    }

    /// Ensures `agent_id` has a mailbox.
    pub fn open(&self, agent_id: &str) {
        self.mailboxes
            .entry(agent_id.to_string())
            .or_insert_with(|| Mailbox::new(agent_id, self.max_queue_size));
    }

    /// Removes an agent's mailbox, returning it with any undrained messages.
    pub fn close(&self, agent_id: &str) -> Option<Mailbox> {
        self.mailboxes.remove(agent_id).map(|(_, mailbox)| mailbox)
    }

    /// Composes a message from `sender_id` through the sender's own mailbox
    /// and delivers it to the receiver's.
    ///
    /// Returns the delivered message.
    pub fn send(
        &self,
        sender_id: &str,
        receiver_id: &str,
        content: &str,
        message_type: MessageType,
        metadata: Metadata,
    ) -> Result<AgentMessage, MnemosError> {
        // The sender's slot guard must be released before delivery, which may
        // lock the same shard.
        let message = {
            let sender = self
                .mailboxes
                .entry(sender_id.to_string())
                .or_insert_with(|| Mailbox::new(sender_id, self.max_queue_size));
            sender.send(receiver_id, content, message_type, metadata)
        };
        self.deliver(message.clone())?;
        Ok(message)
    }

    /// Delivers `message` to the mailbox of its receiver, opening it if needed.
    ///
    /// Returns the number of messages dropped to make room.
    pub fn deliver(&self, message: AgentMessage) -> Result<usize, MnemosError> {
        let receiver = message.receiver_id.clone();
        let mut mailbox = self
            .mailboxes
            .entry(receiver.clone())
            .or_insert_with(|| Mailbox::new(receiver.clone(), self.max_queue_size));
        let dropped = mailbox.receive(message)?;
        tracing::debug!(receiver = %receiver, queued = mailbox.len(), "delivered message");
        Ok(dropped.len())
    }

    /// Takes every queued message for `agent_id`, oldest first.
    pub fn drain(&self, agent_id: &str) -> Vec<AgentMessage> {
        self.mailboxes
            .get_mut(agent_id)
            .map(|mut mailbox| mailbox.drain())
            .unwrap_or_default()
    }

    pub fn has_pending(&self, agent_id: &str) -> bool {
        self.mailboxes
            .get(agent_id)
            .is_some_and(|mailbox| mailbox.has_pending())
    }

    pub fn pending_count(&self, agent_id: &str) -> usize {
        self.mailboxes.get(agent_id).map_or(0, |m| m.len())
    }
}
