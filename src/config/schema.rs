//! Configuration schema definitions.
//!
//! This module defines the settings the provisioner reads at startup.
//! All types derive Serde traits for deserialization from the TOML file.

use serde::{Deserialize, Serialize};

use crate::xray::transport::TransportKind;

/// Root configuration for the provisioner.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProvisionerConfig {
    /// Public endpoint advertised in connection links.
    pub server: ServerConfig,

    /// Location of the xray document and how to reload the service.
    pub xray: XrayConfig,

    /// REALITY security parameters advertised in links.
    pub reality: RealityConfig,

    /// Client labelling and link naming.
    pub clients: ClientsConfig,

    /// HTTP API listener.
    pub api: ApiConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Public server endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address clients connect to (IP or hostname).
    pub address: String,

    /// Port clients connect to.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            port: 443,
        }
    }
}

/// Xray service integration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct XrayConfig {
    /// Path to the xray JSON configuration document.
    pub config_path: String,

    /// Transport new clients are provisioned under.
    pub transport: TransportKind,

    /// Request path for xhttp, service name for grpc.
    pub path: String,

    /// Command (argv) that restarts the xray service.
    pub reload_command: Vec<String>,
}

impl Default for XrayConfig {
    fn default() -> Self {
        Self {
            config_path: "/usr/local/etc/xray/config.json".to_string(),
            transport: TransportKind::Xhttp,
            path: "/update".to_string(),
            reload_command: vec![
                "systemctl".to_string(),
                "restart".to_string(),
                "xray".to_string(),
            ],
        }
    }
}

/// REALITY parameters shared by every issued link.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RealityConfig {
    /// Server name indication presented to clients.
    pub sni: String,

    /// X25519 public key (`pbk`).
    pub public_key: String,

    /// Short ID (`sid`), hex encoded.
    pub short_id: String,
}

/// Client labelling.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientsConfig {
    /// Prefix of the human-readable link fragment.
    pub config_prefix: String,

    /// Domain appended to identifiers to form client labels.
    pub email_domain: String,
}

impl Default for ClientsConfig {
    fn default() -> Self {
        Self {
            config_prefix: String::new(),
            email_domain: "example.com".to_string(),
        }
    }
}

/// HTTP API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Bind address (e.g., "127.0.0.1:8000").
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8000".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
