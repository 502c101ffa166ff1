//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! provisioner.toml
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ProvisionerConfig (validated, immutable)
//!     → lifecycle::startup builds LinkSettings, ConfigStore and the
//!       ProvisioningService from it
//! ```
//!
//! # Design Decisions
//! - Config is resolved once per process; there is no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - No global settings object: values are passed into the components

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::ProvisionerConfig;
pub use schema::{ApiConfig, ClientsConfig, ObservabilityConfig, RealityConfig, ServerConfig, XrayConfig};
