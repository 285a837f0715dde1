//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once, from the binary
//! - Honour `RUST_LOG`, falling back to a dyte-focused default filter

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_FILTER: &str = "dyte=info,tower_http=warn";

/// Install the global subscriber.
///
/// Returns an error if a global subscriber is already set.
pub fn init_logging() -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init()
}
