//! Error responses.
//!
//! | Error | Status |
//! |---|---|
//! | InvalidRequest | 400 |
//! | UnknownClient | 404 |
//! | DuplicateIdentifier | 409 |
//! | ProvisioningFailed | 500 |
//! | StorageUnavailable, NoInbounds | 503 |

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::provisioning::ProvisionError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub fn status_for(error: &ProvisionError) -> StatusCode {
    match error {
        ProvisionError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        ProvisionError::UnknownClient(_) => StatusCode::NOT_FOUND,
        ProvisionError::DuplicateIdentifier(_) => StatusCode::CONFLICT,
        ProvisionError::ProvisioningFailed { .. } | ProvisionError::Interrupted { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        ProvisionError::StorageUnavailable(_) | ProvisionError::NoInbounds => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl IntoResponse for ProvisionError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Request failed");
        }
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}
