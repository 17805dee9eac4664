// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A single agent's inbound message queue.

use std::collections::VecDeque;

use mnemos_core::types::{AgentMessage, MessageType, Metadata};
use mnemos_core::MnemosError;

/// Bounded FIFO queue of messages addressed to one agent.
///
/// When full, receiving a message drops the oldest queued one.
#[derive(Debug, Clone)]
pub struct Mailbox {
    agent_id: String,
    queue: VecDeque<AgentMessage>,
    max_queue_size: usize,
}

impl Mailbox {
    pub fn new(agent_id: impl Into<String>, max_queue_size: usize) -> Self {
        Self {
            agent_id: agent_id.into(),
            queue: VecDeque::new(),
            max_queue_size,
        }
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    /// Composes a message from this agent to `receiver_id`.
    ///
    /// Nothing is queued here; the caller delivers the message to the
    /// receiver's mailbox.
    pub fn send(
        &self,
        receiver_id: &str,
        content: &str,
        message_type: MessageType,
        metadata: Metadata,
    ) -> AgentMessage {
        AgentMessage::new(&self.agent_id, receiver_id, content)
            .with_type(message_type)
            .with_metadata(metadata)
    }

    /// Queues `message`, dropping the oldest entries beyond the cap.
    ///
    /// Fails with `RecipientMismatch` if the message is addressed to another
    /// agent. Returns the dropped messages.
    pub fn receive(&mut self, message: AgentMessage) -> Result<Vec<AgentMessage>, MnemosError> {
        if message.receiver_id != self.agent_id {
            return Err(MnemosError::RecipientMismatch {
                expected: self.agent_id.clone(),
                actual: message.receiver_id,
            });
        }
        self.queue.push_back(message);
        let overflow = self.queue.len().saturating_sub(self.max_queue_size);
        let dropped: Vec<_> = self.queue.drain(..overflow).collect();
        if !dropped.is_empty() {
            tracing::debug!(
                agent_id = %self.agent_id,
                dropped = dropped.len(),
                "mailbox full, dropped oldest messages"
            );
        }
        Ok(dropped)
    }

    /// Returns every queued message, oldest first, and leaves the queue empty.
    pub fn drain(&mut self) -> Vec<AgentMessage> {
        std::mem::take(&mut self.queue).into()
    }

    /// Non-destructive check for queued messages.
    pub fn has_pending(&self) -> bool {
        !self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
