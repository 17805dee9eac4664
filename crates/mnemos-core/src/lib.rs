// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Mnemos agent memory service.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the Mnemos workspace. Provider and storage
//! adapters implement traits defined here; the memory stores implement the
//! capability traits that tools dispatch through.

pub mod error;
pub mod text;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::MnemosError;
pub use types::{
    AdapterType, AgentMessage, AgentRecord, ArchivalItem, HealthStatus, MessageType, Metadata,
};

pub use traits::{
    ArchivalMemoryCapability, CoreMemoryCapability, MemoryCapabilities, PluginAdapter,
    ProviderAdapter, RecallMemoryCapability, StorageAdapter,
};
