//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that every value a connection link needs is present
//! - Validate value ranges (ports, timeouts) and address formats
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProvisionerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::ProvisionerConfig;
use crate::xray::transport::TransportKind;

/// Maximum length of a REALITY short ID in hex characters.
const MAX_SHORT_ID_LEN: usize = 16;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ProvisionerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let required = [
        ("server.address", &config.server.address),
        ("reality.sni", &config.reality.sni),
        ("reality.public_key", &config.reality.public_key),
        ("reality.short_id", &config.reality.short_id),
        ("clients.config_prefix", &config.clients.config_prefix),
        ("clients.email_domain", &config.clients.email_domain),
        ("xray.config_path", &config.xray.config_path),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            errors.push(ValidationError::new(field, "must not be empty"));
        }
    }

    if config.server.port == 0 {
        errors.push(ValidationError::new("server.port", "must be non-zero"));
    }

    let short_id = &config.reality.short_id;
    if short_id.len() > MAX_SHORT_ID_LEN {
        errors.push(ValidationError::new(
            "reality.short_id",
            format!("must be at most {MAX_SHORT_ID_LEN} characters"),
        ));
    }
    if !short_id.chars().all(|c| c.is_ascii_hexdigit()) {
        errors.push(ValidationError::new("reality.short_id", "must be hex encoded"));
    }

    if config.xray.reload_command.is_empty() || config.xray.reload_command[0].trim().is_empty() {
        errors.push(ValidationError::new("xray.reload_command", "must name a program"));
    }

    if matches!(config.xray.transport, TransportKind::Xhttp | TransportKind::Grpc)
        && config.xray.path.trim().is_empty()
    {
        errors.push(ValidationError::new(
            "xray.path",
            format!("is required for transport {}", config.xray.transport),
        ));
    }

    if config.api.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new("api.bind_address", "must be a socket address"));
    }
    if config.api.request_timeout_secs == 0 {
        errors.push(ValidationError::new("api.request_timeout_secs", "must be non-zero"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "must be a socket address",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> ProvisionerConfig {
        let mut config = ProvisionerConfig::default();
        config.server.address = "203.0.113.10".into();
        config.reality.sni = "www.example.org".into();
        config.reality.public_key = "pbk".into();
        config.reality.short_id = "0123abcd".into();
        config.clients.config_prefix = "vpn".into();
        config
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_default_config_reports_every_missing_field() {
        let errors = validate_config(&ProvisionerConfig::default()).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert!(fields.contains(&"server.address"));
        assert!(fields.contains(&"reality.sni"));
        assert!(fields.contains(&"reality.public_key"));
        assert!(fields.contains(&"reality.short_id"));
        assert!(fields.contains(&"clients.config_prefix"));
    }

    #[test]
    fn test_short_id_must_be_hex() {
        let mut config = valid_config();
        config.reality.short_id = "xyz".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "reality.short_id");
    }

    #[test]
    fn test_path_required_for_multiplexed_transports() {
        let mut config = valid_config();
        config.xray.path.clear();
        config.xray.transport = TransportKind::Grpc;
        assert!(validate_config(&config).is_err());

        config.xray.transport = TransportKind::Tcp;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_reload_command_rejected() {
        let mut config = valid_config();
        config.xray.reload_command.clear();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].to_string(), "xray.reload_command: must name a program");
    }
}
