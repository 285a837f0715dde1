//! Reload coordinator.
//!
//! # Responsibilities
//! - Start the first server from the initial configuration
//! - Consume watch events in arrival order, one batch at a time
//! - Replace the server when the diff policy asks for it
//! - Stop the active server on shutdown
//!
//! # Design Decisions
//! - Single owner: the active config, option bundles and instance live in
//!   `CoordinatorState` and are only changed through `&mut self`
//! - A reload completes (old instance closed, new one serving) before the
//!   next event is looked at
//! - Events already queued when a batch starts are coalesced: only the newest
//!   resolved config is applied
//! - Every resolved config is diffed against the active config, not against
//!   the watcher's previous resolution, so a rejected or unbindable config is
//!   retried on the next save instead of being adopted
//! - A broken watch source disables auto-reload, never the running server
//! - Shutdown is observed between batches: a reload already in progress runs
//!   to completion first, bounded by the lifecycle drain timeout

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::diff::ConfigChangeDiff;
use crate::config::loader::{ConfigOrigin, ResolvedConfig};
use crate::config::schema::DyteConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::config::watcher::WatchEvent;
use crate::context::RunContext;
use crate::lifecycle::{LifecycleError, ServerInstance, ServerLifecycleManager, ShutdownListener};
use crate::observability::metrics::{self, EventOutcome};
use crate::options::{
    derive_bundle_options, derive_server_options, BundleOptions, ServerOptions, ToolingMetadata,
};
use crate::reload::policy::DiffPolicy;
use crate::reload::state::{react, ActiveServer, CoordinatorState, Phase, Reaction};

#[derive(Debug, Error)]
pub enum ReloadError {
    #[error("Invalid configuration from {origin}: {}", join_errors(.errors))]
    Validation {
        origin: ConfigOrigin,
        errors: Vec<ValidationError>,
    },

    #[error("Cannot serve configuration from {origin} on port {port}: {source}")]
    Serve {
        origin: ConfigOrigin,
        port: u16,
        #[source]
        source: LifecycleError,
    },

    #[error("Coordinator already started (currently {0:?})")]
    AlreadyStarted(Phase),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Drives the dev server through config changes.
#[derive(Debug)]
pub struct ReloadCoordinator {
    ctx: RunContext,
    policy: DiffPolicy,
    lifecycle: ServerLifecycleManager,
    state: CoordinatorState,
    auto_reload: bool,
}

impl ReloadCoordinator {
    pub fn new(ctx: RunContext) -> Self {
        Self {
            ctx,
            policy: DiffPolicy::new(),
            lifecycle: ServerLifecycleManager::new(),
            state: CoordinatorState::Initializing,
            auto_reload: true,
        }
    }

    pub fn with_lifecycle(mut self, lifecycle: ServerLifecycleManager) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// The live server, when serving.
    pub fn active(&self) -> Option<&ActiveServer> {
        match &self.state {
            CoordinatorState::Serving(active) => Some(active),
            _ => None,
        }
    }

    pub fn active_instance(&self) -> Option<&ServerInstance> {
        self.active().map(|active| &active.instance)
    }

    /// Whether watch events are still being applied.
    pub fn auto_reload(&self) -> bool {
        self.auto_reload
    }

    /// Validate the initial configuration and start the first server.
    ///
    /// Any failure here is fatal and leaves the coordinator `Terminating`.
    pub async fn start(&mut self, initial: ResolvedConfig) -> Result<(), ReloadError> {
        let phase = self.phase();
        if phase != Phase::Initializing {
            return Err(ReloadError::AlreadyStarted(phase));
        }

        let ResolvedConfig { config, origin } = initial;
        tracing::info!(origin = %origin, mode = %config.mode, root = %config.root.display(), "Configuration loaded");

        if let Err(errors) = validate_config(&config) {
            self.state = CoordinatorState::Terminating;
            return Err(ReloadError::Validation { origin, errors });
        }

        let config = Arc::new(config);
        let (bundle, server) = self.derive(&config);
        match self.lifecycle.start(&server, &bundle).await {
            Ok(instance) => {
                self.serve(config, origin, bundle, server, instance);
                Ok(())
            }
            Err(source) => {
                self.state = CoordinatorState::Terminating;
                Err(ReloadError::Serve {
                    origin,
                    port: source.port(),
                    source,
                })
            }
        }
    }

    /// Process watch events until shutdown, then stop the active server.
    pub async fn run(
        &mut self,
        mut events: mpsc::UnboundedReceiver<WatchEvent>,
        mut shutdown: ShutdownListener,
    ) -> Result<(), ReloadError> {
        let result = loop {
            tokio::select! {
                biased;
                _ = shutdown.triggered() => break Ok(()),
                event = events.recv(), if self.auto_reload => match event {
                    Some(first) => {
                        let mut batch = vec![first];
                        while let Ok(next) = events.try_recv() {
                            batch.push(next);
                        }
                        if let Err(e) = self.handle_events(batch).await {
                            break Err(e);
                        }
                    }
                    None => self.degrade("watch channel closed"),
                },
            }
        };

        self.terminate().await;
        result
    }

    /// Handle a batch of events that arrived together.
    ///
    /// File events and failures are handled in order; of the resolved configs
    /// only the newest is applied.
    pub async fn handle_events(&mut self, events: Vec<WatchEvent>) -> Result<(), ReloadError> {
        let mut resolved = 0usize;
        let mut latest = None;

        for event in events {
            if matches!(event, WatchEvent::ConfigResolved { .. }) {
                resolved += 1;
                latest = Some(event);
            } else {
                self.handle_event(event).await?;
            }
        }

        if resolved > 1 {
            tracing::debug!(events = resolved, "Coalescing queued config changes");
        }
        match latest {
            Some(event) => self.handle_event(event).await,
            None => Ok(()),
        }
    }

    /// Apply a single watch event.
    ///
    /// A resolved config's diff is recomputed against the active config first.
    pub async fn handle_event(&mut self, event: WatchEvent) -> Result<(), ReloadError> {
        let event = self.rebase(event);
        match react(self.phase(), self.auto_reload, &self.policy, event) {
            Reaction::Announce { kind, path } => {
                tracing::info!("[watcher] {} {}", kind, path.display());
            }
            Reaction::Refresh { config, origin } => {
                if let CoordinatorState::Serving(active) = &mut self.state {
                    // Only an equivalent config may replace the one the instance runs.
                    if *config == *active.config {
                        active.config = config;
                        active.origin = origin;
                    }
                }
                metrics::record_config_event(EventOutcome::Unchanged);
            }
            Reaction::Reload { config, origin } => {
                metrics::record_config_event(EventOutcome::Reloaded);
                self.reload(config, origin).await?;
            }
            Reaction::Reject { origin, errors } => {
                metrics::record_config_event(EventOutcome::Rejected);
                tracing::error!(
                    origin = %origin,
                    "Rejected config change, keeping current server: {}",
                    join_errors(&errors)
                );
            }
            Reaction::Degrade { reason } => self.degrade(&reason),
            Reaction::Ignore => {
                metrics::record_config_event(EventOutcome::Ignored);
                tracing::debug!(phase = ?self.phase(), "Ignoring watch event");
            }
        }
        Ok(())
    }

    /// Stop the active server and wait for it to close.
    pub async fn terminate(&mut self) {
        if let CoordinatorState::Serving(active) =
            std::mem::replace(&mut self.state, CoordinatorState::Terminating)
        {
            tracing::info!(url = %active.instance.url(), "Stopping server");
            let _ = self.lifecycle.stop(active.instance).closed().await;
        }
    }

    async fn reload(
        &mut self,
        config: Arc<DyteConfig>,
        origin: ConfigOrigin,
    ) -> Result<(), ReloadError> {
        let pending = CoordinatorState::Reloading {
            pending: Arc::clone(&config),
        };
        let active = match std::mem::replace(&mut self.state, pending) {
            CoordinatorState::Serving(active) => active,
            other => {
                self.state = other;
                return Ok(());
            }
        };

        tracing::info!(origin = %origin, "Reloading server");
        let (bundle, server) = self.derive(&config);

        // A different port lets the new instance come up before the old one
        // drains; the same port has to be released first.
        let overlap = server.port == 0 || server.port != active.instance.port();

        if overlap {
            match self.lifecycle.start(&server, &bundle).await {
                Ok(instance) => {
                    self.close_previous(active.instance).await;
                    self.serve(config, origin, bundle, server, instance);
                    metrics::record_reload(true);
                }
                Err(e) => {
                    metrics::record_reload(false);
                    tracing::error!(
                        port = e.port(),
                        origin = %origin,
                        error = %e,
                        "Failed to start reloaded server, still serving previous config at {}",
                        active.instance.url()
                    );
                    self.state = CoordinatorState::Serving(active);
                }
            }
            return Ok(());
        }

        self.close_previous(active.instance).await;
        match self.lifecycle.start(&server, &bundle).await {
            Ok(instance) => {
                self.serve(config, origin, bundle, server, instance);
                metrics::record_reload(true);
                Ok(())
            }
            Err(source) => {
                metrics::record_reload(false);
                self.state = CoordinatorState::Terminating;
                Err(ReloadError::Serve {
                    origin,
                    port: source.port(),
                    source,
                })
            }
        }
    }

    async fn close_previous(&self, instance: ServerInstance) {
        let outcome = self.lifecycle.stop(instance).closed().await;
        tracing::info!(outcome = ?outcome, "Previous server closed");
    }

    fn serve(
        &mut self,
        config: Arc<DyteConfig>,
        origin: ConfigOrigin,
        bundle: BundleOptions,
        server: ServerOptions,
        instance: ServerInstance,
    ) {
        tracing::info!("App running on {}", instance.url());
        metrics::set_active_port(instance.port());

        self.state = CoordinatorState::Serving(Box::new(ActiveServer {
            config,
            origin,
            bundle,
            server,
            instance,
        }));
    }

    fn derive(&self, config: &DyteConfig) -> (BundleOptions, ServerOptions) {
        let tooling = ToolingMetadata::load_or_default(&config.root);
        let bundle = derive_bundle_options(config, &tooling, config.mode.is_development());
        let server = derive_server_options(config, &self.ctx.cwd);
        (bundle, server)
    }

    /// Recompute a resolved event's diff against the active config. The
    /// watcher diffs against its own previous resolution, which may have been
    /// coalesced away, rejected or failed to bind.
    fn rebase(&self, event: WatchEvent) -> WatchEvent {
        match (event, self.active()) {
            (WatchEvent::ConfigResolved { config, origin, .. }, Some(active)) => {
                WatchEvent::ConfigResolved {
                    diff: ConfigChangeDiff::between(&active.config, &config),
                    config,
                    origin,
                }
            }
            (event, _) => event,
        }
    }

    fn degrade(&mut self, reason: &str) {
        if self.auto_reload {
            tracing::warn!(
                reason,
                "Config watching stopped, auto-reload disabled; serving last-known-good config"
            );
        }
        self.auto_reload = false;
    }
}
