// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A single agent: its record, memory, and tools behind one lock.
//!
//! Every operation that reads or mutates memory takes the agent's lock, so
//! two concurrent messages to the same agent run one after the other:
//! mailbox drain, recall append and eviction, context assembly, the
//! generation call, tool execution, and the storage flush all happen inside
//! one lock scope. Different agents never share a lock.

use std::collections::BTreeMap;
use std::sync::Arc;

use mnemos_bus::PostOffice;
use mnemos_config::model::MnemosConfig;
use mnemos_context::{build_system_prompt, ContextAssembler, ContextInput};
use mnemos_core::traits::{CoreMemoryCapability, PluginAdapter, ProviderAdapter, StorageAdapter};
use mnemos_core::types::{
    AgentMessage, AgentRecord, ArchivalItem, FinishReason, MessageType, Metadata,
    ProviderResponse,
};
use mnemos_core::{ArchivalMemoryCapability, MnemosError};
use mnemos_memory::{MemoryLimits, MemoryManager, MemoryStats};
use mnemos_skill::{register_memory_tools, MemoryToolOptions, ToolDefinition, ToolOutput, ToolRegistry};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::journal::{JournaledMemory, MemoryJournal};

/// Generation rounds that may follow tool calls within one turn.
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 5;

/// Collaborators and policy shared by every agent of a process.
pub struct AgentRuntime {
    pub provider: Arc<dyn ProviderAdapter>,
    pub storage: Arc<dyn StorageAdapter>,
    pub post_office: Arc<PostOffice>,
    pub assembler: ContextAssembler,
    pub limits: MemoryLimits,
    pub tool_options: MemoryToolOptions,
    pub max_tool_rounds: usize,
}

impl AgentRuntime {
    pub fn from_config(
        config: &MnemosConfig,
        provider: Arc<dyn ProviderAdapter>,
        storage: Arc<dyn StorageAdapter>,
    ) -> Self {
        Self {
            provider,
            storage,
            post_office: Arc::new(PostOffice::new(config.mailbox.max_queue_size)),
            assembler: ContextAssembler::new(&config.context),
            limits: MemoryLimits {
                max_block_size: config.memory.max_block_size,
                max_messages: config.memory.max_messages,
                archive_evicted_recall: config.memory.archive_evicted_recall,
            },
            tool_options: MemoryToolOptions {
                archival_tools: config.tools.archival_tools,
                recall_tools: config.tools.recall_tools,
                search_limit: config.context.search_limit,
            },
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
        }
    }

    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }
}

impl std::fmt::Debug for AgentRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRuntime")
            .field("provider", &self.provider.name())
            .field("storage", &self.storage.name())
            .field("limits", &self.limits)
            .field("max_tool_rounds", &self.max_tool_rounds)
            .finish_non_exhaustive()
    }
}

/// What a turn produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnReply {
    pub content: String,
    /// Timestamp of the reply as appended to recall.
    pub timestamp: f64,
    pub finish_reason: FinishReason,
    /// Tool calls executed during the turn.
    pub tool_calls: usize,
}

struct AgentState {
    record: AgentRecord,
    memory: MemoryManager,
    tools: ToolRegistry,
    /// Set once the agent is deleted; stale handles must not run turns.
    deleted: bool,
}

impl AgentState {
    fn ensure_live(&self) -> Result<(), MnemosError> {
        if self.deleted {
            return Err(MnemosError::agent_not_found(&self.record.id));
        }
        Ok(())
    }
}

/// One agent and its exclusively owned memory.
pub struct Agent {
    id: String,
    runtime: Arc<AgentRuntime>,
    state: Mutex<AgentState>,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent").field("id", &self.id).finish_non_exhaustive()
    }
}

impl Agent {
    /// Builds an agent over `memory` with the runtime's memory tools.
    ///
    /// If the record carries a persona and core memory has no `persona`
    /// block, one is seeded and persisted.
    pub async fn open(
        record: AgentRecord,
        mut memory: MemoryManager,
        runtime: Arc<AgentRuntime>,
    ) -> Result<Self, MnemosError> {
        let mut tools = ToolRegistry::new();
        register_memory_tools(&mut tools, runtime.tool_options)?;

        let mut journal = MemoryJournal::new();
        if !record.persona.is_empty() && memory.get_core("persona").is_none() {
            JournaledMemory::new(&mut memory, &mut journal).set_core("persona", &record.persona);
        }
        journal.flush(runtime.storage.as_ref(), &record.id).await?;

        Ok(Self {
            id: record.id.clone(),
            runtime,
            state: Mutex::new(AgentState {
                record,
                memory,
                tools,
                deleted: false,
            }),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn record(&self) -> AgentRecord {
        self.state.lock().await.record.clone()
    }

    /// Registers an additional tool. A tool with the same name is replaced.
    pub async fn register_tool(&self, tool: ToolDefinition) {
        self.state.lock().await.tools.register(tool);
    }

    pub async fn tool_names(&self) -> Vec<String> {
        let state = self.state.lock().await;
        state.tools.names().into_iter().map(str::to_string).collect()
    }

    /// Waits for any in-flight turn to finish.
    pub async fn idle(&self) {
        let _state = self.state.lock().await;
    }

    /// Waits for any in-flight turn, then marks the agent deleted. Later
    /// turns and mutations through this handle fail with `NotFound`.
    pub(crate) async fn retire(&self) {
        self.state.lock().await.deleted = true;
    }

    /// Runs one turn: drain mail, append the message, generate, apply tool
    /// calls, append the reply, persist.
    ///
    /// Context overflow fails the turn before any generation call. Memory
    /// changes made before a failure are kept and persisted.
    pub async fn handle_message(&self, inbound: AgentMessage) -> Result<TurnReply, MnemosError> {
        if inbound.receiver_id != self.id {
            error!(
                agent_id = %self.id,
                receiver_id = %inbound.receiver_id,
                "message handed to the wrong agent"
            );
            return Err(MnemosError::RecipientMismatch {
                expected: self.id.clone(),
                actual: inbound.receiver_id,
            });
        }

        let mut state = self.state.lock().await;
        state.ensure_live()?;
        let mut journal = MemoryJournal::new();
        let outcome = self.run_turn(&mut state, &mut journal, inbound).await;
        let flushed = journal
            .flush(self.runtime.storage.as_ref(), &self.id)
            .await;

        match (outcome, flushed) {
            (Ok(reply), Ok(_)) => {
                metrics::counter!("mnemos_messages_total").increment(1);
                info!(
                    agent_id = %self.id,
                    tool_calls = reply.tool_calls,
                    finish_reason = %reply.finish_reason,
                    "turn complete"
                );
                Ok(reply)
            }
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Err(flush_err)) => {
                warn!(agent_id = %self.id, error = %flush_err, "failed to persist memory after failed turn");
                Err(e)
            }
            (Err(e), Ok(_)) => Err(e),
        }
    }

    async fn run_turn(
        &self,
        state: &mut AgentState,
        journal: &mut MemoryJournal,
        inbound: AgentMessage,
    ) -> Result<TurnReply, MnemosError> {
        let AgentState {
            record,
            memory,
            tools,
            ..
        } = state;
        let mut memory = JournaledMemory::new(memory, journal);

        let mail = self.runtime.post_office.drain(&self.id);
        if !mail.is_empty() {
            debug!(agent_id = %self.id, count = mail.len(), "drained mailbox into recall");
        }
        for message in mail {
            memory.append_recall(message);
        }

        let reply_to = inbound.sender_id.clone();
        let mut last = inbound.clone();
        memory.append_recall(inbound);

        let system_prompt = build_system_prompt(record, &tools.list());
        let mut executed = 0;
        let mut round = 0;

        let response = loop {
            let assembled = self
                .runtime
                .assembler
                .assemble(
                    self.runtime.provider.as_ref(),
                    ContextInput {
                        agent_id: &self.id,
                        model: &record.model,
                        context_window_limit: record.context_window_limit as usize,
                        system_prompt: &system_prompt,
                        memory: memory.memory(),
                        tools: tools.schemas(),
                        inbound: &last,
                    },
                )
                .await?;

            debug!(
                agent_id = %self.id,
                round,
                estimated_tokens = assembled.estimate.tokens,
                limit = assembled.limit,
                "calling provider"
            );
            let response = self.runtime.provider.generate(assembled.request).await?;

            if response.tool_calls.is_empty() {
                break response;
            }
            if round >= self.runtime.max_tool_rounds {
                warn!(
                    agent_id = %self.id,
                    pending = response.tool_calls.len(),
                    "tool round limit reached, ignoring remaining tool calls"
                );
                break response;
            }
            round += 1;

            memory.append_recall(tool_call_message(&self.id, &response));
            for call in &response.tool_calls {
                let output = match tools.execute(&call.name, &call.arguments, &mut memory).await {
                    Ok(output) => output,
                    Err(e) if e.is_validation() => {
                        warn!(agent_id = %self.id, tool = %call.name, error = %e, "rejected tool call");
                        ToolOutput::error(e.to_string())
                    }
                    Err(e) => return Err(e),
                };
                executed += 1;

                let mut metadata = Metadata::new();
                metadata.insert("tool".into(), call.name.clone().into());
                if let Some(id) = &call.id {
                    metadata.insert("tool_call_id".into(), id.clone().into());
                }
                metadata.insert("is_error".into(), output.is_error.into());
                let result = AgentMessage::new(&self.id, &self.id, output.as_text())
                    .with_type(MessageType::ToolResult)
                    .with_metadata(metadata);
                last = result.clone();
                memory.append_recall(result);
            }
        };

        let reply = AgentMessage::new(&self.id, &reply_to, &response.content);
        let timestamp = reply.timestamp;
        memory.append_recall(reply);

        Ok(TurnReply {
            content: response.content,
            timestamp,
            finish_reason: response.finish_reason,
            tool_calls: executed,
        })
    }

    /// Runs `f` against journaled memory under the lock, then persists.
    async fn mutate<T>(
        &self,
        f: impl FnOnce(&mut JournaledMemory<'_>) -> T,
    ) -> Result<T, MnemosError> {
        let mut state = self.state.lock().await;
        state.ensure_live()?;
        let mut journal = MemoryJournal::new();
        let value = f(&mut JournaledMemory::new(&mut state.memory, &mut journal));
        journal.flush(self.runtime.storage.as_ref(), &self.id).await?;
        Ok(value)
    }

    // --- Core ---

    /// Stores a core block. Returns the value as stored, after truncation.
    pub async fn set_core(&self, key: &str, value: &str) -> Result<String, MnemosError> {
        self.mutate(|memory| memory.set_core(key, value)).await
    }

    pub async fn get_core(&self, key: &str) -> Option<String> {
        let state = self.state.lock().await;
        state.memory.get_core(key).map(str::to_string)
    }

    pub async fn delete_core(&self, key: &str) -> Result<bool, MnemosError> {
        self.mutate(|memory| memory.delete_core(key)).await
    }

    pub async fn core_blocks(&self) -> BTreeMap<String, String> {
        self.state.lock().await.memory.core_blocks()
    }

    // --- Archival ---

    pub async fn insert_archival(
        &self,
        content: &str,
        metadata: Metadata,
    ) -> Result<ArchivalItem, MnemosError> {
        self.mutate(|memory| memory.add_archival(content, metadata))
            .await
    }

    pub async fn search_archival(&self, query: &str, limit: usize) -> Vec<ArchivalItem> {
        self.state.lock().await.memory.search_archival(query, limit)
    }

    pub async fn get_archival(&self, id: &str) -> Result<ArchivalItem, MnemosError> {
        let state = self.state.lock().await;
        state
            .memory
            .get_archival(id)
            .cloned()
            .ok_or_else(|| MnemosError::NotFound {
                entity: "Archival item".into(),
                id: id.to_string(),
            })
    }

    /// Deletes an archival item. Unknown ids fail with `NotFound`.
    pub async fn delete_archival(&self, id: &str) -> Result<(), MnemosError> {
        let deleted = self.mutate(|memory| memory.delete_archival(id)).await?;
        if deleted {
            Ok(())
        } else {
            Err(MnemosError::NotFound {
                entity: "Archival item".into(),
                id: id.to_string(),
            })
        }
    }

    // --- Recall ---

    pub async fn recent_recall(&self, limit: usize) -> Vec<AgentMessage> {
        self.state.lock().await.memory.recent_recall(limit)
    }

    pub async fn search_recall(&self, query: &str, limit: usize) -> Vec<AgentMessage> {
        self.state.lock().await.memory.search_recall(query, limit)
    }

    /// Records a message this agent sent to another agent.
    pub async fn record_outgoing(&self, message: AgentMessage) -> Result<(), MnemosError> {
        self.mutate(|memory| memory.append_recall(message)).await
    }

    pub async fn stats(&self) -> MemoryStats {
        self.state.lock().await.memory.stats()
    }
}

/// The assistant's tool-call turn as a recall entry.
fn tool_call_message(agent_id: &str, response: &ProviderResponse) -> AgentMessage {
    let mut lines: Vec<String> = Vec::new();
    if !response.content.is_empty() {
        lines.push(response.content.clone());
    }
    for call in &response.tool_calls {
        lines.push(format!(
            "{}({})",
            call.name,
            serde_json::Value::Object(call.arguments.clone())
        ));
    }

    let mut metadata = Metadata::new();
    metadata.insert(
        "tool_calls".into(),
        serde_json::to_value(&response.tool_calls).unwrap_or_default(),
    );
    AgentMessage::new(agent_id, agent_id, lines.join("\n"))
        .with_type(MessageType::ToolCall)
        .with_metadata(metadata)
}
