// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter and capability trait definitions.
//!
//! Adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility. Memory capabilities
//! are synchronous and object safe.

pub mod adapter;
pub mod memory;
pub mod provider;
pub mod storage;

pub use adapter::PluginAdapter;
pub use memory::{
    ArchivalMemoryCapability, CoreMemoryCapability, MemoryCapabilities, RecallMemoryCapability,
};
pub use provider::ProviderAdapter;
pub use storage::StorageAdapter;
