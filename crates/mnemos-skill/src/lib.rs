// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool definitions, registry, and built-in memory tools for Mnemos agents.
//!
//! Every registered tool carries a [`ToolHandler`] tag. Built-in memory tools
//! dispatch through the capability traits in `mnemos-core`, receiving the
//! agent's memory only for the duration of one call. Custom tools implement
//! the [`Tool`] trait.
//!
//! Built-in tools:
//! - `core_memory_add`, `core_memory_get`, `core_memory_delete` (always registered)
//! - `archival_memory_insert`, `archival_memory_search`
//! - `conversation_search`

pub mod memory_tools;
pub mod registry;
pub mod tool;

pub use memory_tools::{register_memory_tools, MemoryToolOptions};
pub use registry::ToolRegistry;
pub use tool::{
    ArchivalOp, CoreMemoryOp, RecallOp, Tool, ToolArgs, ToolDefinition, ToolHandler, ToolOutput,
};
