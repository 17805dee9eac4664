// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Mnemos agent service.
//!
//! Exposes agent creation, conversation, and the three memory tiers as a
//! JSON REST API over axum. All state lives in the [`AgentService`]; the
//! gateway only translates requests and maps errors onto status codes.
//!
//! [`AgentService`]: mnemos_agent::AgentService

pub mod error;
pub mod handlers;
pub mod server;

pub use error::{ApiError, ErrorResponse};
pub use server::{router, start_server, GatewayState, ServerConfig};
