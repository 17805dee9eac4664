// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Three-tier agent memory for the Mnemos service.
//!
//! ## Architecture
//!
//! - **CoreMemoryStore**: keyed blocks capped at `max_block_size` characters, always in context
//! - **ArchivalMemoryStore**: unbounded items retrieved only by search
//! - **RecallMemoryStore**: bounded chronological message log with FIFO eviction
//! - **MemoryManager**: facade over the three stores, owner of cross-tier stats
//!
//! None of the stores lock internally. Exclusive access is the caller's job;
//! the agent wraps its manager in a per-agent mutex.

pub mod archival;
pub mod core_memory;
pub mod manager;
pub mod recall;

pub use archival::ArchivalMemoryStore;
pub use core_memory::CoreMemoryStore;
pub use manager::{RECALL_EVICTION_SOURCE, MemoryLimits, MemoryManager, MemoryStats, RecallAppend, TierStats};
pub use recall::RecallMemoryStore;
