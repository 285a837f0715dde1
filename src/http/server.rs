//! HTTP server engine for one dev server instance.
//!
//! # Responsibilities
//! - Create Axum Router with the status endpoint and static file serving
//! - Wire up middleware (timeout, request ID, cache headers, tracing)
//! - Count in-flight requests for graceful close
//! - Serve until the instance's shutdown signal fires, then drain

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderValue},
    middleware,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::schema::Mode;
use crate::http::request::{MakeRequestUuidV4, X_REQUEST_ID};
use crate::lifecycle::drain::{track_in_flight, InFlightTracker};
use crate::lifecycle::instance::InstanceId;
use crate::options::{BundleOptions, ServerOptions};

pub const STATUS_PATH: &str = "/__dyte/status";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Body of the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct InstanceStatus {
    pub instance: u64,
    pub mode: Mode,
    pub port: u16,
    pub root: PathBuf,
    pub entry: PathBuf,
}

/// Dev server engine built from one pair of option bundles.
pub struct DevServer {
    router: Router,
}

impl DevServer {
    pub fn new(
        id: InstanceId,
        port: u16,
        server: &ServerOptions,
        bundle: &BundleOptions,
        tracker: InFlightTracker,
    ) -> Self {
        if server.tls.is_some() {
            tracing::warn!(instance = %id, "TLS is experimental and not implemented; serving plain HTTP");
        }

        let status = Arc::new(InstanceStatus {
            instance: id.as_u64(),
            mode: bundle.mode,
            port,
            root: bundle.root.clone(),
            entry: bundle.entry_dir.clone(),
        });

        Self {
            router: Self::build_router(server, status, tracker),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(
        server: &ServerOptions,
        status: Arc<InstanceStatus>,
        tracker: InFlightTracker,
    ) -> Router {
        let files = ServeDir::new(&server.public_dir).fallback(ServeDir::new(&server.root));

        Router::new()
            .route(STATUS_PATH, get(status_handler))
            .with_state(status)
            .fallback_service(files)
            .layer(middleware::from_fn_with_state(tracker, track_in_flight))
            .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
            .layer(SetResponseHeaderLayer::overriding(
                header::CACHE_CONTROL,
                HeaderValue::from_static("no-cache"),
            ))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuidV4))
    }

    /// Serve on `listener` until `shutdown` fires (or its sender is dropped),
    /// then wait for in-flight connections to finish.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: oneshot::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.await;
            })
            .await
    }
}

async fn status_handler(State(status): State<Arc<InstanceStatus>>) -> Json<InstanceStatus> {
    Json(status.as_ref().clone())
}
