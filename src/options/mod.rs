//! Option derivation subsystem.
//!
//! # Data Flow
//! ```text
//! DyteConfig + deno.json (tooling.rs)
//!     → bundle.rs → BundleOptions (input to the bundler)
//! DyteConfig + cwd
//!     → server.rs → ServerOptions (input to the server engine)
//! ```
//!
//! # Design Decisions
//! - Derivation is pure: same inputs, equivalent bundles
//! - Bundles are read-only and replaced, never mutated, on reload

pub mod bundle;
pub mod server;
pub mod tooling;

pub use bundle::{derive_bundle_options, BundleOptions, JsxOptions};
pub use server::{derive_server_options, ServerOptions, TlsPaths};
pub use tooling::ToolingMetadata;
