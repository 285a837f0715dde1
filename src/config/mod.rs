//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! dyte.config.toml / dyte.config.json (or nothing)
//!     → loader.rs (find, parse, layer over generated defaults)
//!     → DyteConfig (immutable once produced)
//!     → validation.rs (semantic checks, before any server start)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs resolves the new config
//!     → diff.rs compares against the previous one
//!     → WatchEvent::ConfigResolved sent to the reload coordinator
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; a change produces a new value
//! - All fields have defaults to allow minimal configs
//! - Loading never fails; unusable files fall back to defaults

pub mod diff;
pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use diff::{ConfigChangeDiff, DiffEntry};
pub use loader::{resolve, ConfigOrigin, ResolvedConfig};
pub use schema::{DyteConfig, Mode, ServerConfig, TlsConfig};
pub use validation::{validate_config, ValidationError};
pub use watcher::{ConfigWatcher, WatchEvent};
