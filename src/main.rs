//! Dyte dev server (v0.1)
//!
//! Runs a local development server for a frontend project and restarts it
//! whenever the project's dyte config changes.
//!
//! # Architecture Overview
//!
//! ```text
//!   dyte.config.toml ──▶ ┌──────────────┐  WatchEvent   ┌────────────────────┐
//!   (notify)             │ ConfigWatcher│──────────────▶│ ReloadCoordinator  │
//!                        └──────────────┘               │  DiffPolicy        │
//!                                                       │  OptionDerivation  │
//!                                                       └─────────┬──────────┘
//!                                                                 │ start / stop
//!                                                                 ▼
//!                                                       ┌────────────────────┐
//!                                                       │ServerLifecycleMgr  │──▶ axum
//!                                                       └────────────────────┘
//! ```

use clap::Parser;

use dyte::cli::{launch_browser, Cli, Commands, RunArgs};
use dyte::config::ConfigWatcher;
use dyte::lifecycle::{signals, Shutdown};
use dyte::observability::logging;
use dyte::ReloadCoordinator;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init_logging()?;

    match cli.command {
        Commands::Run(args) => run(args).await,
    }
}

async fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let launch = args.launch;
    let cwd = std::env::current_dir()?;
    let ctx = args.into_context(cwd);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        cwd = %ctx.cwd.display(),
        mode = %ctx.mode,
        "dyte starting"
    );

    let (watcher, events) = ConfigWatcher::new(&ctx);
    let initial = watcher.initial().clone();

    let mut coordinator = ReloadCoordinator::new(ctx);
    coordinator.start(initial).await?;

    if launch {
        if let Some(instance) = coordinator.active_instance() {
            launch_browser(instance.url());
        }
    }

    // Keep the watcher alive for the whole run; on failure the event channel
    // closes and the coordinator stops auto-reloading.
    let _watcher = match watcher.run() {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to start config watcher");
            None
        }
    };

    let shutdown = Shutdown::new();
    let listener = shutdown.subscribe();
    signals::spawn_signal_listener(shutdown);

    coordinator.run(events, listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
