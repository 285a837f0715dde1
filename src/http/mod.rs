//! HTTP server engine.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → request.rs (x-request-id)
//!     → server.rs (status endpoint, static files from public dir then root)
//!     → Send to client
//! ```

pub mod request;
pub mod server;

pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use server::{DevServer, InstanceStatus, STATUS_PATH};
