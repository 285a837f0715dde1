//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Start (manager.rs):
//!     ServerOptions + BundleOptions → bind → spawn engine → ServerInstance
//!
//! Stop (manager.rs, instance.rs):
//!     ServerInstance → stop accepting → drain in-flight (drain.rs) → CloseSignal resolves
//!
//! Process shutdown (signals.rs, shutdown.rs):
//!     SIGTERM/SIGINT → Shutdown trigger → coordinator terminates
//! ```
//!
//! # Design Decisions
//! - Close is awaitable, so callers order transitions on it explicitly
//! - Close has a deadline: forced abort after it passes

pub mod drain;
pub mod instance;
pub mod manager;
pub mod shutdown;
pub mod signals;

pub use instance::{CloseOutcome, CloseSignal, InstanceId, ServerInstance};
pub use manager::{LifecycleError, ServerLifecycleManager};
pub use shutdown::{Shutdown, ShutdownListener};
