//! Server instance lifecycle.
//!
//! # Responsibilities
//! - Bind a listener for the configured address and start the engine on it
//! - Begin graceful close of an instance and hand back its completion signal
//!
//! # Design Decisions
//! - Bind errors carry the address so the operator can act on them
//! - Closing never blocks the caller; the close signal is awaited separately,
//!   so a new instance may start while the old one drains

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use crate::http::DevServer;
use crate::lifecycle::drain::InFlightTracker;
use crate::lifecycle::instance::{CloseSignal, InstanceId, ServerInstance};
use crate::options::{BundleOptions, ServerOptions};

const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

impl LifecycleError {
    /// Port the failed operation targeted.
    pub fn port(&self) -> u16 {
        match self {
            LifecycleError::Bind { addr, .. } => addr.port(),
        }
    }
}

/// Starts and stops dev server instances.
#[derive(Debug, Clone)]
pub struct ServerLifecycleManager {
    drain_timeout: Duration,
}

impl ServerLifecycleManager {
    pub fn new() -> Self {
        Self {
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }

    /// Deadline after which a closing instance is aborted.
    pub fn with_drain_timeout(mut self, drain_timeout: Duration) -> Self {
        self.drain_timeout = drain_timeout;
        self
    }

    /// Bind the configured address and start serving.
    pub async fn start(
        &self,
        server: &ServerOptions,
        bundle: &BundleOptions,
    ) -> Result<ServerInstance, LifecycleError> {
        let addr = server.bind_addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| LifecycleError::Bind { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| LifecycleError::Bind { addr, source })?;

        let id = InstanceId::next();
        let in_flight = InFlightTracker::new();
        let engine = DevServer::new(id, local_addr.port(), server, bundle, in_flight.clone());

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(engine.run(listener, shutdown_rx));

        tracing::info!(
            instance = %id,
            address = %local_addr,
            mode = %bundle.mode,
            "Server listening"
        );

        Ok(ServerInstance {
            id,
            local_addr,
            url: server.url_for_port(local_addr.port()),
            in_flight,
            shutdown_tx,
            task,
        })
    }

    /// Begin graceful shutdown of `instance`.
    ///
    /// The listener stops accepting right away; the returned signal resolves
    /// once in-flight requests have drained or the drain deadline passes.
    pub fn stop(&self, instance: ServerInstance) -> CloseSignal {
        let ServerInstance {
            id,
            local_addr,
            in_flight,
            shutdown_tx,
            task,
            ..
        } = instance;

        tracing::info!(
            instance = %id,
            in_flight = in_flight.active_count(),
            "Closing server"
        );
        let _ = shutdown_tx.send(());

        CloseSignal {
            id,
            local_addr,
            task,
            deadline: self.drain_timeout,
        }
    }
}

impl Default for ServerLifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DyteConfig;
    use crate::lifecycle::instance::CloseOutcome;
    use crate::options::{derive_bundle_options, derive_server_options, ToolingMetadata};
    use std::path::Path;

    fn options(port: u16) -> (ServerOptions, BundleOptions) {
        let mut config = DyteConfig::default();
        config.root = std::env::temp_dir();
        config.server.port = port;
        (
            derive_server_options(&config, Path::new("/")),
            derive_bundle_options(&config, &ToolingMetadata::default(), true),
        )
    }

    #[tokio::test]
    async fn start_then_stop_releases_port() {
        let manager = ServerLifecycleManager::new();
        let (server, bundle) = options(28711);

        let instance = manager.start(&server, &bundle).await.unwrap();
        assert_eq!(instance.port(), 28711);
        assert_eq!(instance.url(), "http://localhost:28711");
        assert!(tokio::net::TcpStream::connect("127.0.0.1:28711").await.is_ok());

        let outcome = manager.stop(instance).closed().await;
        assert_eq!(outcome, CloseOutcome::Drained);
        assert!(tokio::net::TcpStream::connect("127.0.0.1:28711").await.is_err());

        // The port can be bound again once the close completed.
        let again = manager.start(&server, &bundle).await.unwrap();
        let _ = manager.stop(again).closed().await;
    }

    #[tokio::test]
    async fn port_in_use_is_bind_error() {
        let _occupied = std::net::TcpListener::bind("127.0.0.1:28712").unwrap();
        let manager = ServerLifecycleManager::new();
        let (server, bundle) = options(28712);

        let err = manager.start(&server, &bundle).await.unwrap_err();
        assert!(matches!(err, LifecycleError::Bind { .. }));
        assert_eq!(err.port(), 28712);
    }

    #[tokio::test]
    async fn ephemeral_port_reports_actual_port() {
        let manager = ServerLifecycleManager::new();
        let (server, bundle) = options(0);

        let instance = manager.start(&server, &bundle).await.unwrap();
        assert_ne!(instance.port(), 0);
        assert!(instance.url().ends_with(&instance.port().to_string()));
        let _ = manager.stop(instance).closed().await;
    }
}
