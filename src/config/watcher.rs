//! Configuration file watcher for hot reload.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::diff::ConfigChangeDiff;
use crate::config::loader::{self, is_config_file, ConfigOrigin, ResolvedConfig};
use crate::config::schema::DyteConfig;
use crate::context::RunContext;

/// Let the writer finish before the file is read back.
const SETTLE_DELAY: Duration = Duration::from_millis(50);

/// What happened to a watched config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEventKind {
    Created,
    Modified,
    Removed,
}

impl fmt::Display for FileEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FileEventKind::Created => "create",
            FileEventKind::Modified => "modify",
            FileEventKind::Removed => "remove",
        })
    }
}

/// Events emitted by the watch source, consumed by the reload coordinator.
#[derive(Debug, Clone)]
pub enum WatchEvent {
    /// A config file was touched on disk.
    ChangeDetected { kind: FileEventKind, path: PathBuf },

    /// The config was re-resolved after a change.
    ConfigResolved {
        config: Arc<DyteConfig>,
        origin: ConfigOrigin,
        /// Diff against the previously resolved configuration.
        diff: ConfigChangeDiff,
    },

    /// The underlying watch backend failed.
    Failed { reason: String },
}

/// A watcher that monitors the project's config files for changes.
pub struct ConfigWatcher {
    ctx: RunContext,
    initial: ResolvedConfig,
    update_tx: mpsc::UnboundedSender<WatchEvent>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// The initial configuration is resolved immediately. Returns the watcher
    /// and a receiver for watch events.
    pub fn new(ctx: &RunContext) -> (Self, mpsc::UnboundedReceiver<WatchEvent>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let initial = loader::resolve(ctx);

        (
            Self {
                ctx: ctx.clone(),
                initial,
                update_tx,
            },
            update_rx,
        )
    }

    /// The configuration resolved at construction.
    pub fn initial(&self) -> &ResolvedConfig {
        &self.initial
    }

    /// Start watching on the notify backend thread.
    ///
    /// The returned watcher must be kept alive for events to keep flowing. If
    /// this fails the event sender is dropped, closing the channel.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self {
            ctx,
            initial,
            update_tx: tx,
        } = self;
        let cwd = ctx.cwd.clone();
        let mut previous = initial.config;

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let Some(kind) = classify(&event.kind) else {
                        return;
                    };
                    let Some(path) = event.paths.iter().find(|p| is_config_file(p)) else {
                        return;
                    };

                    let _ = tx.send(WatchEvent::ChangeDetected {
                        kind,
                        path: path.clone(),
                    });

                    std::thread::sleep(SETTLE_DELAY);
                    let resolved = loader::resolve(&ctx);
                    let diff = ConfigChangeDiff::between(&previous, &resolved.config);
                    previous = resolved.config.clone();

                    let _ = tx.send(WatchEvent::ConfigResolved {
                        config: Arc::new(resolved.config),
                        origin: resolved.origin,
                        diff,
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "Watch error");
                    let _ = tx.send(WatchEvent::Failed {
                        reason: e.to_string(),
                    });
                }
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&cwd, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %cwd.display(), "Config watcher started");
        Ok(watcher)
    }
}

fn classify(kind: &EventKind) -> Option<FileEventKind> {
    match kind {
        EventKind::Create(_) => Some(FileEventKind::Created),
        EventKind::Modify(_) => Some(FileEventKind::Modified),
        EventKind::Remove(_) => Some(FileEventKind::Removed),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::Mode;
    use notify::event::{AccessKind, CreateKind, ModifyKind};

    #[test]
    fn classify_ignores_access_events() {
        assert_eq!(classify(&EventKind::Create(CreateKind::File)), Some(FileEventKind::Created));
        assert_eq!(classify(&EventKind::Modify(ModifyKind::Any)), Some(FileEventKind::Modified));
        assert_eq!(classify(&EventKind::Access(AccessKind::Any)), None);
    }

    #[test]
    fn initial_config_is_available_synchronously() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("dyte.config.toml"), "[server]\nport = 4321\n").unwrap();

        let ctx = RunContext::new(dir.path(), ".", Mode::Development);
        let (watcher, _rx) = ConfigWatcher::new(&ctx);

        assert_eq!(watcher.initial().config.server.port, 4321);
    }

    #[test]
    fn missing_directory_fails_to_start() {
        let ctx = RunContext::new("/nonexistent/dyte/project", ".", Mode::Development);
        let (watcher, _rx) = ConfigWatcher::new(&ctx);

        assert!(watcher.run().is_err());
    }
}
