//! Dyte dev server orchestration library.

pub mod cli;
pub mod config;
pub mod context;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod options;
pub mod reload;

pub use config::schema::DyteConfig;
pub use context::RunContext;
pub use reload::ReloadCoordinator;
