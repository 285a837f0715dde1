//! Server instance handles and their close signals.

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::lifecycle::drain::InFlightTracker;

/// Using relaxed ordering is sufficient since we only need uniqueness.
static INSTANCE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a server instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(u64);

impl InstanceId {
    pub fn next() -> Self {
        Self(INSTANCE_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "server-{}", self.0)
    }
}

/// Handle to one running dev server.
///
/// Dropping the handle without stopping it also begins shutdown, since the
/// engine treats a dropped shutdown sender as the signal.
#[derive(Debug)]
pub struct ServerInstance {
    pub(crate) id: InstanceId,
    pub(crate) local_addr: SocketAddr,
    pub(crate) url: String,
    pub(crate) in_flight: InFlightTracker,
    pub(crate) shutdown_tx: oneshot::Sender<()>,
    pub(crate) task: JoinHandle<Result<(), std::io::Error>>,
}

impl ServerInstance {
    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Port actually bound.
    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    /// URL the instance is reachable at.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn in_flight(&self) -> u64 {
        self.in_flight.active_count()
    }
}

/// How an instance finished closing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseOutcome {
    /// All in-flight work finished before the deadline.
    Drained,
    /// The drain deadline passed and the server task was aborted.
    Forced,
    /// The server task ended with an error.
    Failed(String),
}

/// Completion signal for a closing instance.
///
/// The instance is already shutting down when this is created; awaiting
/// [`CloseSignal::closed`] only observes completion.
#[must_use = "a close signal does nothing unless awaited"]
#[derive(Debug)]
pub struct CloseSignal {
    pub(crate) id: InstanceId,
    pub(crate) local_addr: SocketAddr,
    pub(crate) task: JoinHandle<Result<(), std::io::Error>>,
    pub(crate) deadline: Duration,
}

impl CloseSignal {
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Wait until the instance has drained, or force it closed at the deadline.
    pub async fn closed(mut self) -> CloseOutcome {
        let outcome = match tokio::time::timeout(self.deadline, &mut self.task).await {
            Ok(Ok(Ok(()))) => CloseOutcome::Drained,
            Ok(Ok(Err(e))) => CloseOutcome::Failed(e.to_string()),
            Ok(Err(e)) => CloseOutcome::Failed(e.to_string()),
            Err(_) => {
                self.task.abort();
                CloseOutcome::Forced
            }
        };

        match &outcome {
            CloseOutcome::Drained => {
                tracing::info!(instance = %self.id, address = %self.local_addr, "Server closed")
            }
            CloseOutcome::Forced => tracing::warn!(
                instance = %self.id,
                deadline = ?self.deadline,
                "Server did not drain in time, forced close"
            ),
            CloseOutcome::Failed(reason) => {
                tracing::error!(instance = %self.id, error = %reason, "Server task failed while closing")
            }
        }

        outcome
    }
}
