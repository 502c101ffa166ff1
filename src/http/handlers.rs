//! API handlers, one per provisioning operation.
//!
//! Mutating handlers run the operation on a task that owns the writer
//! lock. Dropping the request (timeout, disconnect) leaves the task and
//! the lock in place until the commit or its rollback has finished.

use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::http::server::AppState;
use crate::provisioning::{ProvisionError, ProvisionResult, Provisioned, ProvisioningService};
use crate::xray::TransportKind;

#[derive(Debug, Deserialize)]
pub struct AddClientRequest {
    pub config_name: String,
    #[serde(default)]
    pub identifier: Option<String>,
    /// Defaults to the configured transport.
    #[serde(default)]
    pub transport: Option<TransportKind>,
}

#[derive(Debug, Deserialize)]
pub struct IdentifiersRequest {
    pub identifiers: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CountQuery {
    #[serde(default)]
    pub transport: Option<TransportKind>,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub transport: TransportKind,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ClientsResponse {
    pub identifiers: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct LinkQuery {
    pub config_name: String,
}

#[derive(Debug, Serialize)]
pub struct LinkResponse {
    pub identifier: String,
    pub link: String,
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
}

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "API is working!",
    })
}

pub async fn add_client(
    State(state): State<AppState>,
    Json(request): Json<AddClientRequest>,
) -> Result<(StatusCode, Json<Provisioned>), ProvisionError> {
    if request.config_name.trim().is_empty() {
        return Err(ProvisionError::InvalidRequest("config_name must not be empty".into()));
    }
    let transport = request
        .transport
        .unwrap_or_else(|| state.service.configured_transport().clone());

    let provisioned = exclusive(&state, "add", move |service| async move {
        service
            .add(&request.config_name, request.identifier, &transport)
            .await
    })
    .await?;
    Ok((StatusCode::CREATED, Json(provisioned)))
}

pub async fn list_clients(State(state): State<AppState>) -> Result<Json<ClientsResponse>, ProvisionError> {
    let identifiers = state.service.list_all_identifiers().await?;
    Ok(Json(ClientsResponse { identifiers }))
}

pub async fn count_clients(
    State(state): State<AppState>,
    Query(query): Query<CountQuery>,
) -> Result<Json<CountResponse>, ProvisionError> {
    let transport = query
        .transport
        .unwrap_or_else(|| state.service.configured_transport().clone());
    let count = state.service.active_client_count(&transport).await?;
    Ok(Json(CountResponse { transport, count }))
}

pub async fn disconnect_client(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Result<StatusCode, ProvisionError> {
    exclusive(&state, "disconnect", move |service| async move {
        service.disconnect_one(&identifier).await
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn disconnect_clients(
    State(state): State<AppState>,
    Json(request): Json<IdentifiersRequest>,
) -> Result<StatusCode, ProvisionError> {
    exclusive(&state, "disconnect_many", move |service| async move {
        service.disconnect_many(&request.identifiers).await
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn deactivate_clients(
    State(state): State<AppState>,
    Json(request): Json<IdentifiersRequest>,
) -> Result<StatusCode, ProvisionError> {
    exclusive(&state, "deactivate", move |service| async move {
        service.deactivate_many(&request.identifiers).await
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reactivate_clients(
    State(state): State<AppState>,
    Json(request): Json<IdentifiersRequest>,
) -> Result<StatusCode, ProvisionError> {
    exclusive(&state, "reactivate", move |service| async move {
        service.reactivate_many(&request.identifiers).await
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn client_link(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
    Query(query): Query<LinkQuery>,
) -> Result<Json<LinkResponse>, ProvisionError> {
    let link = state.service.link_for(&identifier, &query.config_name).await?;
    Ok(Json(LinkResponse { identifier, link }))
}

/// Run a mutation on its own task while holding the writer lock.
async fn exclusive<T, F, Fut>(state: &AppState, operation: &'static str, run: F) -> ProvisionResult<T>
where
    F: FnOnce(Arc<ProvisioningService>) -> Fut + Send + 'static,
    Fut: Future<Output = ProvisionResult<T>> + Send + 'static,
    T: Send + 'static,
{
    let writer = state.writer.clone();
    let service = state.service.clone();
    let task = tokio::spawn(async move {
        let _writer = writer.lock_owned().await;
        run(service).await
    });

    task.await.map_err(|e| {
        tracing::error!(operation, error = %e, "Mutation task did not complete");
        ProvisionError::Interrupted { operation }
    })?
}
