// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool definitions and the handler tag that decides how a call is dispatched.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use mnemos_core::types::{Metadata, ToolSchema};
use mnemos_core::MnemosError;
use serde::{Deserialize, Serialize};

/// Arguments of one tool call, keyed by parameter name.
pub type ToolArgs = Metadata;

/// Output from a tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// The value returned by the tool.
    pub content: serde_json::Value,
    /// Whether the tool reported a failure it wants the model to see.
    pub is_error: bool,
}

impl ToolOutput {
    pub fn ok(content: impl Into<serde_json::Value>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: serde_json::Value::String(message.into()),
            is_error: true,
        }
    }

    /// Renders the content as text for the conversation log.
    pub fn as_text(&self) -> String {
        match &self.content {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Trait for tools that are not backed by agent memory.
///
/// Implementations receive the call arguments only. Parameter presence has
/// already been checked against the definition's `required` list.
#[async_trait]
pub trait Tool: Send + Sync {
    async fn invoke(&self, args: &ToolArgs) -> Result<ToolOutput, MnemosError>;
}

/// Operations on core memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreMemoryOp {
    Add,
    Get,
    Delete,
}

/// Operations on archival memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchivalOp {
    Insert,
    /// Search with `limit` defaulting to `default_limit`.
    Search { default_limit: usize },
}

/// Operations on recall memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecallOp {
    Search { default_limit: usize },
}

/// What a tool call dispatches to.
#[derive(Clone)]
pub enum ToolHandler {
    Core(CoreMemoryOp),
    Archival(ArchivalOp),
    Recall(RecallOp),
    Custom(Arc<dyn Tool>),
}

impl fmt::Debug for ToolHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Core(op) => f.debug_tuple("Core").field(op).finish(),
            Self::Archival(op) => f.debug_tuple("Archival").field(op).finish(),
            Self::Recall(op) => f.debug_tuple("Recall").field(op).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// A named tool: its model-facing schema plus the handler that runs it.
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    schema: ToolSchema,
    handler: ToolHandler,
}

impl ToolDefinition {
    /// Builds a definition, rejecting schemas whose `required` names are not
    /// all declared parameters.
    pub fn new(schema: ToolSchema, handler: ToolHandler) -> Result<Self, MnemosError> {
        if schema.name.trim().is_empty() {
            return Err(MnemosError::InvalidToolDefinition {
                tool: schema.name,
                message: "tool name must not be empty".to_string(),
            });
        }
        if let Some(undeclared) = schema
            .required
            .iter()
            .find(|name| !schema.parameters.contains_key(*name))
        {
            return Err(MnemosError::InvalidToolDefinition {
                message: format!("required parameter `{undeclared}` is not declared"),
                tool: schema.name,
            });
        }
        Ok(Self { schema, handler })
    }

    pub fn name(&self) -> &str {
        &self.schema.name
    }

    pub fn description(&self) -> &str {
        &self.schema.description
    }

    pub fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    pub fn handler(&self) -> &ToolHandler {
        &self.handler
    }
}
