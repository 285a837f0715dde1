//! Reload coordination subsystem.
//!
//! # Data Flow
//! ```text
//! WatchEvent (config::watcher)
//!     → state.rs react() (policy.rs decides on the diff, validation gates it)
//!     → coordinator.rs carries out the reaction
//!         → options derived from the pending config
//!         → lifecycle starts the new instance / closes the old one
//! ```

pub mod coordinator;
pub mod policy;
pub mod state;

pub use coordinator::{ReloadCoordinator, ReloadError};
pub use policy::DiffPolicy;
pub use state::{ActiveServer, CoordinatorState, Phase, Reaction};
