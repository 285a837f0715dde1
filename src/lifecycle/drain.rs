//! In-flight request tracking for graceful close.
//!
//! # Responsibilities
//! - Count requests currently being served by one instance
//! - Report how much work a closing instance still has to drain

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

/// Tracks requests in flight on one server instance.
#[derive(Debug, Clone, Default)]
pub struct InFlightTracker {
    active_count: Arc<AtomicU64>,
}

impl InFlightTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new in-flight request. Returns a guard that decrements on drop.
    pub fn track(&self) -> RequestGuard {
        self.active_count.fetch_add(1, Ordering::SeqCst);
        RequestGuard {
            active_count: Arc::clone(&self.active_count),
        }
    }

    /// Current in-flight request count.
    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }
}

/// Guard for one request's lifetime.
/// Decrements the in-flight count when dropped, even if the handler panics.
#[derive(Debug)]
pub struct RequestGuard {
    active_count: Arc<AtomicU64>,
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        self.active_count.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Axum middleware counting requests against the instance's tracker.
pub async fn track_in_flight(
    State(tracker): State<InFlightTracker>,
    request: Request,
    next: Next,
) -> Response {
    let _guard = tracker.track();
    next.run(request).await
}
