// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agents and their lifecycle for the Mnemos service.
//!
//! - [`Agent`]: one agent's record, memory, and tools behind a per-agent lock
//! - [`AgentRegistry`]: agents loaded in this process, with explicit load and evict
//! - [`AgentService`]: the facade the HTTP layer calls
//! - [`shutdown`]: signal handling and the drain-then-close sequence

pub mod agent;
pub mod journal;
pub mod registry;
pub mod service;
pub mod shutdown;

pub use agent::{Agent, AgentRuntime, TurnReply, DEFAULT_MAX_TOOL_ROUNDS};
pub use journal::{JournaledMemory, MemoryJournal, MemoryMutation};
pub use registry::AgentRegistry;
pub use service::{AgentService, NewAgent};
