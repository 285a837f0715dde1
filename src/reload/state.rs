//! Coordinator states and the reaction to each watch event.
//!
//! # State Machine
//! ```text
//! Initializing ──start──▶ Serving ──non-empty diff──▶ Reloading ──new instance up,
//!                           │  ▲                                    old one closed──▶ Serving
//!                           └──┘ empty diff (config refreshed)
//! any state ──shutdown──▶ Terminating
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::loader::ConfigOrigin;
use crate::config::schema::DyteConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::config::watcher::{FileEventKind, WatchEvent};
use crate::lifecycle::ServerInstance;
use crate::options::{BundleOptions, ServerOptions};
use crate::reload::policy::DiffPolicy;

/// Everything owned while a server is live.
#[derive(Debug)]
pub struct ActiveServer {
    pub config: Arc<DyteConfig>,
    pub origin: ConfigOrigin,
    pub bundle: BundleOptions,
    pub server: ServerOptions,
    pub instance: ServerInstance,
}

#[derive(Debug)]
pub enum CoordinatorState {
    Initializing,
    Serving(Box<ActiveServer>),
    Reloading { pending: Arc<DyteConfig> },
    Terminating,
}

/// Data-free view of [`CoordinatorState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initializing,
    Serving,
    Reloading,
    Terminating,
}

impl CoordinatorState {
    pub fn phase(&self) -> Phase {
        match self {
            CoordinatorState::Initializing => Phase::Initializing,
            CoordinatorState::Serving(_) => Phase::Serving,
            CoordinatorState::Reloading { .. } => Phase::Reloading,
            CoordinatorState::Terminating => Phase::Terminating,
        }
    }
}

/// Effect the coordinator should carry out for one event.
#[derive(Debug)]
pub enum Reaction {
    /// Log a raw file event.
    Announce { kind: FileEventKind, path: PathBuf },
    /// Keep the running server, adopt the (equivalent) new config value.
    Refresh {
        config: Arc<DyteConfig>,
        origin: ConfigOrigin,
    },
    /// Replace the running server with one built from `config`.
    Reload {
        config: Arc<DyteConfig>,
        origin: ConfigOrigin,
    },
    /// The new config is invalid; keep serving the current one.
    Reject {
        origin: ConfigOrigin,
        errors: Vec<ValidationError>,
    },
    /// The watch source broke; stop auto-reloading.
    Degrade { reason: String },
    Ignore,
}

/// Decide how to react to `event` in `phase`.
///
/// Only the diff policy logs; everything else here is free of side effects.
pub fn react(phase: Phase, auto_reload: bool, policy: &DiffPolicy, event: WatchEvent) -> Reaction {
    if phase == Phase::Terminating || !auto_reload {
        return Reaction::Ignore;
    }

    match event {
        WatchEvent::ChangeDetected { kind, path } => Reaction::Announce { kind, path },
        WatchEvent::Failed { reason } => Reaction::Degrade { reason },
        WatchEvent::ConfigResolved { .. } if phase != Phase::Serving => Reaction::Ignore,
        WatchEvent::ConfigResolved {
            config,
            origin,
            diff,
        } => {
            let reload = policy.should_reload(&diff);
            match validate_config(&config) {
                Err(errors) => Reaction::Reject { origin, errors },
                Ok(()) if reload => Reaction::Reload { config, origin },
                Ok(()) => Reaction::Refresh { config, origin },
            }
        }
    }
}
