//! CLI commands

pub mod describe;
pub mod write;

use flushline_config::{EngineConfig as EngineSection, StoreConfig};
use flushline_writer::{EngineConfig, TransportConfig};
use tokio::signal;
use tracing::warn;

/// Transport settings from the `[store]` section
pub fn transport_config(store: &StoreConfig) -> TransportConfig {
    let config = TransportConfig::default()
        .with_url(&store.url)
        .with_database(&store.database)
        .with_request_timeout(store.timeout);

    match store.username {
        Some(ref username) => {
            config.with_credentials(username, store.password.as_deref().unwrap_or_default())
        }
        None => config,
    }
}

/// Engine settings from the `[engine]` section
pub fn engine_config(section: &EngineSection) -> EngineConfig {
    let config = EngineConfig::default()
        .with_flush_interval(section.flush_interval)
        .with_pool_size(section.pool_size)
        .with_error_log_interval(section.error_log_interval);

    match section.write_timeout {
        Some(timeout) => config.with_write_timeout(timeout),
        None => config,
    }
}

/// Wait for Ctrl+C or SIGTERM
///
/// A signal that cannot be installed is logged and never fires.
pub async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
