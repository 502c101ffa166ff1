//! Startup orchestration.
//!
//! # Responsibilities
//! - Turn a validated configuration into a ready ProvisioningService
//! - Check the xray document is readable before serving traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal

use std::sync::Arc;

use thiserror::Error;

use crate::config::ProvisionerConfig;
use crate::provisioning::ProvisioningService;
use crate::xray::{CommandReloader, ConfigStore, CredentialGenerator, LinkSettings, StoreError};

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("xray.reload_command is empty")]
    NoReloadCommand,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Wire the store, generator and link settings from `config`.
pub fn build_service(config: &ProvisionerConfig) -> Result<ProvisioningService, StartupError> {
    let store = build_store(config)?;
    Ok(assemble(config, store))
}

/// Build the service and make sure the xray document can be loaded.
pub async fn start(config: &ProvisionerConfig) -> Result<ProvisioningService, StartupError> {
    let store = build_store(config)?;
    let snapshot = store.load().await?;

    tracing::info!(
        path = %config.xray.config_path,
        transport = %config.xray.transport,
        inbounds = snapshot.document().inbounds.len(),
        clients = snapshot.document().client_count(),
        "Xray configuration loaded"
    );
    Ok(assemble(config, store))
}

fn build_store(config: &ProvisionerConfig) -> Result<ConfigStore, StartupError> {
    let reloader = CommandReloader::from_argv(&config.xray.reload_command).ok_or(StartupError::NoReloadCommand)?;
    Ok(ConfigStore::new(&config.xray.config_path, Arc::new(reloader)))
}

fn assemble(config: &ProvisionerConfig, store: ConfigStore) -> ProvisioningService {
    let generator = CredentialGenerator::new(config.clients.email_domain.clone());
    let links = LinkSettings::from_config(config);
    ProvisioningService::new(store, generator, links)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_reload_command_is_fatal() {
        let mut config = ProvisionerConfig::default();
        config.xray.reload_command.clear();
        assert!(matches!(build_service(&config), Err(StartupError::NoReloadCommand)));
    }

    #[tokio::test]
    async fn test_start_requires_readable_document() {
        let mut config = ProvisionerConfig::default();
        config.xray.config_path = "/nonexistent/config.json".into();
        assert!(matches!(start(&config).await, Err(StartupError::Store(_))));
    }

    #[tokio::test]
    async fn test_start_uses_configured_transport() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"inbounds": []}"#).unwrap();

        let mut config = ProvisionerConfig::default();
        config.xray.config_path = path.to_string_lossy().into_owned();
        config.xray.transport = crate::xray::TransportKind::Grpc;

        let service = start(&config).await.unwrap();
        assert_eq!(service.configured_transport(), &crate::xray::TransportKind::Grpc);
    }
}
