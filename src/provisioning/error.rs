//! Provisioning error definitions.

use thiserror::Error;

use crate::xray::store::StoreError;

/// Errors returned by provisioning operations.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The xray document could not be read or parsed.
    #[error("configuration storage unavailable: {0}")]
    StorageUnavailable(#[from] StoreError),

    /// The change was written and rolled back, or the reload failed.
    /// The document holds its previous contents.
    #[error("{operation} failed, previous configuration restored")]
    ProvisioningFailed { operation: &'static str },

    /// The task running the operation stopped before reporting back.
    #[error("{operation} did not complete")]
    Interrupted { operation: &'static str },

    /// The request itself is unusable.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The identifier is already provisioned under another inbound.
    #[error("client {0} is already provisioned under a different inbound")]
    DuplicateIdentifier(String),

    /// No inbound holds the identifier.
    #[error("client {0} not found")]
    UnknownClient(String),

    /// The document has no inbound to provision into.
    #[error("configuration has no inbounds")]
    NoInbounds,
}

/// Result type for provisioning operations.
pub type ProvisionResult<T> = Result<T, ProvisionError>;

impl ProvisionError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProvisionError::StorageUnavailable(_) => "storage_unavailable",
            ProvisionError::ProvisioningFailed { .. } => "provisioning_failed",
            ProvisionError::Interrupted { .. } => "interrupted",
            ProvisionError::InvalidRequest(_) => "invalid_request",
            ProvisionError::DuplicateIdentifier(_) => "duplicate_identifier",
            ProvisionError::UnknownClient(_) => "unknown_client",
            ProvisionError::NoInbounds => "no_inbounds",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProvisionError::ProvisioningFailed { operation: "add" };
        assert_eq!(err.to_string(), "add failed, previous configuration restored");

        let err = ProvisionError::InvalidRequest("empty identifier list".into());
        assert_eq!(err.kind(), "invalid_request");
        assert!(err.to_string().contains("empty identifier list"));
    }
}
