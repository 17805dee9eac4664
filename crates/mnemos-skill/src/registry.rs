// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool registry and executor.
//!
//! The registry keeps tools in registration order, which is also the order
//! their schemas are handed to the provider.

use mnemos_core::traits::MemoryCapabilities;
use mnemos_core::types::ToolSchema;
use mnemos_core::MnemosError;

use crate::tool::{ToolArgs, ToolDefinition, ToolHandler, ToolOutput};

/// Registry of an agent's tools, indexed by name.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDefinition>,
}

impl ToolRegistry {
    /// Creates an empty tool registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool. A tool with the same name is removed first, so the
    /// new definition moves to the end and names stay unique.
    pub fn register(&mut self, tool: ToolDefinition) {
        self.tools.retain(|existing| existing.name() != tool.name());
        self.tools.push(tool);
    }

    /// Looks up a tool by name.
    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(ToolDefinition::name).collect()
    }

    /// Returns (name, description) pairs in registration order.
    pub fn list(&self) -> Vec<(&str, &str)> {
        self.tools
            .iter()
            .map(|t| (t.name(), t.description()))
            .collect()
    }

    /// Model-facing schemas for every tool, in registration order.
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|t| t.schema().clone()).collect()
    }

    /// Runs the tool `name` against `memory`.
    ///
    /// Fails with `UnknownTool` for an unregistered name and with
    /// `MissingParameter` when a required argument is absent. The handler's
    /// result is returned unmodified.
    pub async fn execute(
        &self,
        name: &str,
        args: &ToolArgs,
        memory: &mut dyn MemoryCapabilities,
    ) -> Result<ToolOutput, MnemosError> {
        let tool = self.get(name).ok_or_else(|| MnemosError::UnknownTool {
            name: name.to_string(),
        })?;

        if let Some(missing) = tool
            .schema()
            .required
            .iter()
            .find(|param| !args.contains_key(*param))
        {
            return Err(MnemosError::MissingParameter {
                tool: name.to_string(),
                parameter: missing.clone(),
            });
        }

        tracing::debug!(tool = name, "executing tool");
        metrics::counter!("mnemos_tool_calls_total", "tool" => name.to_string()).increment(1);

        match tool.handler() {
            ToolHandler::Core(op) => op.apply(name, args, memory),
            ToolHandler::Archival(op) => op.apply(name, args, memory),
            ToolHandler::Recall(op) => op.apply(name, args, &*memory),
            ToolHandler::Custom(custom) => custom.invoke(args).await,
        }
    }

    /// Returns the number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns true if no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
