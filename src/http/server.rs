//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout)
//! - Serve on a listener until shutdown
//!
//! The API is a thin shell: handlers translate JSON to service calls and
//! `ProvisionError` to status codes.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, Mutex};
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ApiConfig;
use crate::http::handlers::*;
use crate::http::request::{make_span, propagate_request_id, set_request_id};
use crate::lifecycle::shutdown::recv_shutdown;
use crate::provisioning::ProvisioningService;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ProvisioningService>,
    /// Held by handlers that change the xray document.
    pub writer: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(service: ProvisioningService) -> Self {
        Self {
            service: Arc::new(service),
            writer: Arc::new(Mutex::new(())),
        }
    }
}

/// HTTP API exposing the provisioning operations.
pub struct ApiServer {
    router: Router,
}

impl ApiServer {
    pub fn new(service: ProvisioningService, config: &ApiConfig) -> Self {
        let router = Self::build_router(config, AppState::new(service));
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ApiConfig, state: AppState) -> Router {
        let middleware = ServiceBuilder::new()
            .layer(set_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
            .layer(propagate_request_id());

        Router::new()
            .route("/", get(root))
            .route("/clients", post(add_client).get(list_clients))
            .route("/clients/count", get(count_clients))
            .route("/clients/disconnect", post(disconnect_clients))
            .route("/clients/deactivate", post(deactivate_clients))
            .route("/clients/reactivate", post(reactivate_clients))
            .route("/clients/{identifier}", axum::routing::delete(disconnect_client))
            .route("/clients/{identifier}/link", get(client_link))
            .with_state(state)
            .layer(middleware)
    }

    /// The router, for serving elsewhere or driving in tests.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Serve until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "API server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(recv_shutdown(shutdown))
            .await?;

        tracing::info!("API server stopped");
        Ok(())
    }
}
