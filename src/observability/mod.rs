//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters and gauges via the `metrics` facade)
//! ```
//!
//! # Design Decisions
//! - Logs are the operator-facing surface: watch events, diffs, reloads, URLs
//! - Metrics go through the facade only; with no recorder installed they are no-ops

pub mod logging;
pub mod metrics;
