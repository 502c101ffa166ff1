//! Xray client provisioning library.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod provisioning;
pub mod xray;

pub use config::schema::ProvisionerConfig;
pub use http::ApiServer;
pub use lifecycle::Shutdown;
pub use provisioning::{ProvisionError, Provisioned, ProvisioningService};
