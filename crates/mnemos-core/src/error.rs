// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Mnemos agent memory service.

use thiserror::Error;

/// The primary error type used across all Mnemos adapter traits and core operations.
#[derive(Debug, Error)]
pub enum MnemosError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// LLM provider errors (API failure, auth failure, malformed response).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A tool was invoked by a name that is not registered.
    #[error("tool `{name}` not found")]
    UnknownTool { name: String },

    /// A tool was invoked without one of its required parameters.
    #[error("missing required parameter `{parameter}` for tool `{tool}`")]
    MissingParameter { tool: String, parameter: String },

    /// A tool parameter was present but had an unusable value.
    #[error("invalid parameter `{parameter}` for tool `{tool}`: {message}")]
    InvalidParameter {
        tool: String,
        parameter: String,
        message: String,
    },

    /// A tool definition is internally inconsistent.
    #[error("invalid definition for tool `{tool}`: {message}")]
    InvalidToolDefinition { tool: String, message: String },

    /// The assembled context does not fit the provider's token budget.
    ///
    /// Raised before any generation call is made.
    #[error("context overflow: estimated {estimated_tokens} tokens exceeds limit of {limit}")]
    ContextOverflow { estimated_tokens: usize, limit: usize },

    /// A referenced entity (agent, archival item) does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: String, id: String },

    /// A mailbox received a message addressed to a different agent.
    #[error("message addressed to {actual} delivered to mailbox of {expected}")]
    RecipientMismatch { expected: String, actual: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MnemosError {
    /// Shorthand for an unknown agent.
    pub fn agent_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "Agent".to_string(),
            id: id.into(),
        }
    }

    /// Returns true for the validation class: unknown tools and bad parameters.
    ///
    /// Validation errors are always surfaced to the caller and never retried.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::UnknownTool { .. }
                | Self::MissingParameter { .. }
                | Self::InvalidParameter { .. }
                | Self::InvalidToolDefinition { .. }
        )
    }

    /// Returns true if this error indicates a missing entity.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
