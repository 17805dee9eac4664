// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `mnemos serve` command implementation.
//!
//! Wires the configured provider, SQLite storage, and the agent service
//! behind the HTTP gateway, then runs until SIGINT or SIGTERM. Shutdown
//! drains in-flight requests, evicts every agent, and closes storage, all
//! within `server.shutdown_timeout_secs`.

use std::sync::Arc;
use std::time::Duration;

use mnemos_agent::{shutdown, AgentService};
use mnemos_anthropic::AnthropicProvider;
use mnemos_config::model::MnemosConfig;
use mnemos_config::ProviderKind;
use mnemos_core::{MnemosError, PluginAdapter, ProviderAdapter, StorageAdapter};
use mnemos_gateway::{start_server, GatewayState, ServerConfig};
use mnemos_openai::OpenAiProvider;
use mnemos_storage::SqliteStorage;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Runs the `mnemos serve` command.
pub async fn run_serve(config: MnemosConfig) -> Result<(), MnemosError> {
    init_tracing(&config.agent.log_level);

    info!("starting mnemos serve");

    let (provider, provider_model) = build_provider(&config)?;
    let default_model = config
        .agent
        .default_model
        .clone()
        .unwrap_or(provider_model);
    info!(
        provider = provider.name(),
        version = %provider.version(),
        default_model = %default_model,
        "provider ready"
    );

    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    let storage: Arc<dyn StorageAdapter> = Arc::new(storage);

    let service = Arc::new(AgentService::new(&config, default_model, provider, storage));

    let cancel = shutdown::install_signal_handler();
    tokio::spawn(heap_monitor(cancel.clone().cancelled_owned()));
    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        max_concurrent_requests: config.server.max_concurrent_requests,
    };
    let state = GatewayState::new(Arc::clone(&service));
    let mut server = tokio::spawn({
        let cancel = cancel.clone();
        async move { start_server(&server_config, state, cancel).await }
    });

    // The server only returns on its own when binding or serving fails.
    let early_exit = tokio::select! {
        joined = &mut server => Some(joined),
        _ = cancel.cancelled() => None,
    };

    let budget = Duration::from_secs(config.server.shutdown_timeout_secs);
    let deadline = Instant::now() + budget;

    let served = match early_exit {
        Some(joined) => flatten(joined),
        None => match tokio::time::timeout_at(deadline, &mut server).await {
            Ok(joined) => flatten(joined),
            Err(_) => {
                warn!(?budget, "in-flight requests did not drain in time, aborting");
                server.abort();
                Ok(())
            }
        },
    };
    if let Err(e) = &served {
        error!(error = %e, "gateway failed");
    }

    let remaining = deadline.saturating_duration_since(Instant::now());
    shutdown::drain_and_close(&service, remaining).await?;
    served?;

    if let Some((allocated, resident)) = heap_stats() {
        info!(
            allocated_mb = allocated / MIB,
            resident_mb = resident / MIB,
            "heap usage at shutdown"
        );
    }
    info!("mnemos serve shutdown complete");
    Ok(())
}

const MIB: usize = 1024 * 1024;

/// How often the heap monitor logs jemalloc stats.
const HEAP_REPORT_INTERVAL: Duration = Duration::from_secs(60);

/// Allocated and resident heap bytes as reported by jemalloc.
#[cfg(not(target_env = "msvc"))]
fn heap_stats() -> Option<(usize, usize)> {
    tikv_jemalloc_ctl::epoch::advance().ok()?;
    let allocated = tikv_jemalloc_ctl::stats::allocated::read().ok()?;
    let resident = tikv_jemalloc_ctl::stats::resident::read().ok()?;
    Some((allocated, resident))
}

#[cfg(target_env = "msvc")]
fn heap_stats() -> Option<(usize, usize)> {
    None
}

/// Logs heap usage every `HEAP_REPORT_INTERVAL` until `shutdown` resolves.
async fn heap_monitor(shutdown: impl Future<Output = ()>) {
    let mut interval = tokio::time::interval(HEAP_REPORT_INTERVAL);
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Some((allocated, resident)) = heap_stats() {
                    debug!(
                        allocated_mb = allocated / MIB,
                        resident_mb = resident / MIB,
                        "heap usage"
                    );
                }
            }
            _ = &mut shutdown => break,
        }
    }
}

fn flatten(
    joined: Result<Result<(), MnemosError>, tokio::task::JoinError>,
) -> Result<(), MnemosError> {
    joined.map_err(|e| MnemosError::Internal(format!("gateway task failed: {e}")))?
}

/// Builds the provider named by `[provider].kind` and returns its default model.
fn build_provider(
    config: &MnemosConfig,
) -> Result<(Arc<dyn ProviderAdapter>, String), MnemosError> {
    match config.provider.kind {
        ProviderKind::Anthropic => Ok((
            Arc::new(AnthropicProvider::new(&config.anthropic)?),
            config.anthropic.default_model.clone(),
        )),
        ProviderKind::OpenAi => Ok((
            Arc::new(OpenAiProvider::new(&config.openai)?),
            config.openai.default_model.clone(),
        )),
    }
}

/// Initialize the tracing subscriber with the configured log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mnemos={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openai_provider_built_from_config() {
        let mut config = MnemosConfig::default();
        config.provider.kind = ProviderKind::OpenAi;
        config.openai.api_key = Some("sk-test".to_string());
        config.openai.default_model = "gpt-4o-mini".to_string();

        let (provider, model) = build_provider(&config).unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(model, "gpt-4o-mini");
    }

    #[test]
    fn anthropic_provider_built_from_config() {
        let mut config = MnemosConfig::default();
        config.anthropic.api_key = Some("sk-ant-test".to_string());

        let (provider, model) = build_provider(&config).unwrap();
        assert_eq!(provider.name(), "anthropic");
        assert_eq!(model, config.anthropic.default_model);
    }

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn heap_stats_report_allocations() {
        let (allocated, resident) = heap_stats().unwrap();
        assert!(allocated > 0);
        assert!(resident >= allocated);
    }

    #[tokio::test]
    async fn heap_monitor_stops_on_shutdown() {
        let stopped =
            tokio::time::timeout(Duration::from_secs(1), heap_monitor(std::future::ready(()))).await;
        assert!(stopped.is_ok());
    }

    #[test]
    fn join_failure_becomes_internal_error() {
        let ok: Result<Result<(), MnemosError>, tokio::task::JoinError> = Ok(Ok(()));
        assert!(flatten(ok).is_ok());
        let failed = Ok(Err(MnemosError::Internal("bind".into())));
        assert!(matches!(flatten(failed), Err(MnemosError::Internal(_))));
    }
}
