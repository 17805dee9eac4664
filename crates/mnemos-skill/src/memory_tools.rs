// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in memory tools and their dispatch onto memory capabilities.
//!
//! Tool names and parameter names (`key`, `value`, `content`, `query`,
//! `limit`) are part of the model-facing contract and must not change.

use std::collections::BTreeMap;

use mnemos_core::traits::MemoryCapabilities;
use mnemos_core::types::{Metadata, ParameterSpec, ToolSchema};
use mnemos_core::MnemosError;
use serde_json::json;

use crate::registry::ToolRegistry;
use crate::tool::{ArchivalOp, CoreMemoryOp, RecallOp, ToolArgs, ToolDefinition, ToolHandler, ToolOutput};

/// Which optional memory tools to register.
#[derive(Debug, Clone, Copy)]
pub struct MemoryToolOptions {
    pub archival_tools: bool,
    pub recall_tools: bool,
    /// Default `limit` for the search tools.
    pub search_limit: usize,
}

impl Default for MemoryToolOptions {
    fn default() -> Self {
        Self {
            archival_tools: true,
            recall_tools: true,
            search_limit: 5,
        }
    }
}

/// Registers the memory tools. The three core tools are always registered.
pub fn register_memory_tools(
    registry: &mut ToolRegistry,
    options: MemoryToolOptions,
) -> Result<(), MnemosError> {
    registry.register(core_memory_add()?);
    registry.register(core_memory_get()?);
    registry.register(core_memory_delete()?);
    if options.archival_tools {
        registry.register(archival_memory_insert()?);
        registry.register(archival_memory_search(options.search_limit)?);
    }
    if options.recall_tools {
        registry.register(conversation_search(options.search_limit)?);
    }
    Ok(())
}

fn define(
    name: &str,
    description: &str,
    params: &[(&str, ParameterSpec, bool)],
    handler: ToolHandler,
) -> Result<ToolDefinition, MnemosError> {
    let parameters: BTreeMap<String, ParameterSpec> = params
        .iter()
        .map(|(n, spec, _)| (n.to_string(), spec.clone()))
        .collect();
    let required = params
        .iter()
        .filter(|(_, _, required)| *required)
        .map(|(n, _, _)| n.to_string())
        .collect();
    ToolDefinition::new(
        ToolSchema {
            name: name.to_string(),
            description: description.to_string(),
            parameters,
            required,
        },
        handler,
    )
}

pub fn core_memory_add() -> Result<ToolDefinition, MnemosError> {
    define(
        "core_memory_add",
        "Add or update a core memory block",
        &[
            ("key", ParameterSpec::string("Key for the memory block"), true),
            (
                "value",
                ParameterSpec::string("Content to store in the memory block"),
                true,
            ),
        ],
        ToolHandler::Core(CoreMemoryOp::Add),
    )
}

pub fn core_memory_get() -> Result<ToolDefinition, MnemosError> {
    define(
        "core_memory_get",
        "Get a core memory block by key",
        &[(
            "key",
            ParameterSpec::string("Key for the memory block to retrieve"),
            true,
        )],
        ToolHandler::Core(CoreMemoryOp::Get),
    )
}

pub fn core_memory_delete() -> Result<ToolDefinition, MnemosError> {
    define(
        "core_memory_delete",
        "Delete a core memory block",
        &[(
            "key",
            ParameterSpec::string("Key for the memory block to delete"),
            true,
        )],
        ToolHandler::Core(CoreMemoryOp::Delete),
    )
}

pub fn archival_memory_insert() -> Result<ToolDefinition, MnemosError> {
    define(
        "archival_memory_insert",
        "Store content in archival memory for later retrieval",
        &[(
            "content",
            ParameterSpec::string("Content to archive"),
            true,
        )],
        ToolHandler::Archival(ArchivalOp::Insert),
    )
}

pub fn archival_memory_search(default_limit: usize) -> Result<ToolDefinition, MnemosError> {
    define(
        "archival_memory_search",
        "Search archival memory for items containing the query",
        &[
            ("query", ParameterSpec::string("Text to search for"), true),
            (
                "limit",
                ParameterSpec::integer("Maximum number of results"),
                false,
            ),
        ],
        ToolHandler::Archival(ArchivalOp::Search { default_limit }),
    )
}

pub fn conversation_search(default_limit: usize) -> Result<ToolDefinition, MnemosError> {
    define(
        "conversation_search",
        "Search past conversation messages, most recent first",
        &[
            ("query", ParameterSpec::string("Text to search for"), true),
            (
                "limit",
                ParameterSpec::integer("Maximum number of results"),
                false,
            ),
        ],
        ToolHandler::Recall(RecallOp::Search { default_limit }),
    )
}

impl CoreMemoryOp {
    pub(crate) fn apply(
        self,
        tool: &str,
        args: &ToolArgs,
        memory: &mut dyn MemoryCapabilities,
    ) -> Result<ToolOutput, MnemosError> {
        let key = string_arg(tool, args, "key")?;
        match self {
            Self::Add => {
                let value = string_arg(tool, args, "value")?;
                let stored = memory.set_core(&key, &value);
                Ok(ToolOutput::ok(json!({
                    "status": "success",
                    "key": key,
                    "value": stored,
                })))
            }
            Self::Get => Ok(ToolOutput::ok(
                memory
                    .get_core(&key)
                    .map(serde_json::Value::String)
                    .unwrap_or(serde_json::Value::Null),
            )),
            Self::Delete => {
                let deleted = memory.delete_core(&key);
                Ok(ToolOutput::ok(json!({ "key": key, "deleted": deleted })))
            }
        }
    }
}

impl ArchivalOp {
    pub(crate) fn apply(
        self,
        tool: &str,
        args: &ToolArgs,
        memory: &mut dyn MemoryCapabilities,
    ) -> Result<ToolOutput, MnemosError> {
        match self {
            Self::Insert => {
                let content = string_arg(tool, args, "content")?;
                let item = memory.add_archival(&content, Metadata::new());
                Ok(ToolOutput::ok(json!({ "memory_id": item.id })))
            }
            Self::Search { default_limit } => {
                let query = string_arg(tool, args, "query")?;
                let limit = limit_arg(tool, args, default_limit)?;
                let hits: Vec<_> = memory
                    .search_archival(&query, limit)
                    .into_iter()
                    .map(|item| json!({ "id": item.id, "content": item.content }))
                    .collect();
                Ok(ToolOutput::ok(hits))
            }
        }
    }
}

impl RecallOp {
    pub(crate) fn apply(
        self,
        tool: &str,
        args: &ToolArgs,
        memory: &dyn MemoryCapabilities,
    ) -> Result<ToolOutput, MnemosError> {
        let Self::Search { default_limit } = self;
        let query = string_arg(tool, args, "query")?;
        let limit = limit_arg(tool, args, default_limit)?;
        let hits: Vec<_> = memory
            .search_recall(&query, limit)
            .into_iter()
            .map(|m| {
                json!({
                    "content": m.content,
                    "sender_id": m.sender_id,
                    "timestamp": m.timestamp,
                })
            })
            .collect();
        Ok(ToolOutput::ok(hits))
    }
}

/// Reads a string parameter. Numbers and booleans are accepted in their
/// textual form; other shapes are rejected.
fn string_arg(tool: &str, args: &ToolArgs, name: &str) -> Result<String, MnemosError> {
    match args.get(name) {
        Some(serde_json::Value::String(s)) => Ok(s.clone()),
        Some(v @ (serde_json::Value::Number(_) | serde_json::Value::Bool(_))) => Ok(v.to_string()),
        Some(_) => Err(MnemosError::InvalidParameter {
            tool: tool.to_string(),
            parameter: name.to_string(),
            message: "expected a string".to_string(),
        }),
        None => Err(MnemosError::MissingParameter {
            tool: tool.to_string(),
            parameter: name.to_string(),
        }),
    }
}

/// Reads the optional `limit` parameter as a non-negative integer.
fn limit_arg(tool: &str, args: &ToolArgs, default: usize) -> Result<usize, MnemosError> {
    let invalid = || MnemosError::InvalidParameter {
        tool: tool.to_string(),
        parameter: "limit".to_string(),
        message: "expected a non-negative integer".to_string(),
    };
    match args.get("limit") {
        None | Some(serde_json::Value::Null) => Ok(default),
        Some(serde_json::Value::Number(n)) => n
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(invalid),
        Some(serde_json::Value::String(s)) => s.trim().parse().map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}
