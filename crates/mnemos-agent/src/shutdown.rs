// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graceful shutdown coordination with signal handling.
//!
//! Installs handlers for SIGTERM and SIGINT (Ctrl+C), triggering a
//! [`CancellationToken`] that the server monitors. In-flight turns are
//! drained and storage is closed before the process exits.

use std::time::Duration;

use mnemos_core::MnemosError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::service::AgentService;

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is received.
/// The signal handler task runs in the background until the token is cancelled.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        wait_for_signal().await;
        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let ctrl_c = tokio::signal::ctrl_c();
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = ctrl_c => {
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
                _ = sigterm.recv() => {
                    info!("received SIGTERM, initiating shutdown");
                }
            }
        }
        Err(e) => {
            warn!(error = %e, "failed to install SIGTERM handler, listening for Ctrl+C only");
            let _ = ctrl_c.await;
            info!("received SIGINT (Ctrl+C), initiating shutdown");
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("received Ctrl+C, initiating shutdown");
}

/// Drains in-flight turns, evicts all agents, and closes storage, giving up
/// after `timeout`.
pub async fn drain_and_close(service: &AgentService, timeout: Duration) -> Result<(), MnemosError> {
    info!(
        loaded = service.registry().loaded().len(),
        "waiting for in-flight turns to complete"
    );
    match tokio::time::timeout(timeout, service.shutdown()).await {
        Ok(result) => result,
        Err(_) => {
            warn!(?timeout, "timeout reached, shutdown interrupted");
            Err(MnemosError::Timeout { duration: timeout })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use mnemos_config::model::MnemosConfig;
    use mnemos_test_utils::MockProvider;

    use super::*;
    use crate::test_support::storage_in;

    #[tokio::test]
    async fn install_signal_handler_returns_token() {
        let token = install_signal_handler();
        // Token should not be cancelled yet.
        assert!(!token.is_cancelled());
        token.cancel();
    }

    #[tokio::test]
    async fn drain_and_close_with_no_agents() {
        let dir = tempfile::tempdir().unwrap();
        let service = AgentService::new(
            &MnemosConfig::default(),
            "mock-model",
            Arc::new(MockProvider::new()),
            storage_in(&dir).await,
        );
        drain_and_close(&service, Duration::from_secs(5)).await.unwrap();
        assert!(service.health().await.is_err());
    }
}
