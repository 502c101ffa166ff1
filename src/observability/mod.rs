//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! provisioning + store produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (operation counters, reload and rollback counters)
//!
//! Consumers:
//!     → stdout
//!     → Metrics endpoint (Prometheus scrape), when enabled
//! ```

pub mod logging;
pub mod metrics;
