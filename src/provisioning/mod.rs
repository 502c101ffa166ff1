//! Provisioning subsystem.
//!
//! # Data Flow
//! ```text
//! add:        generate credential → load → route (exact, else first inbound)
//!             → append with transport flow → apply_or_rollback → build link
//! disconnect: load → drop ids from every inbound → apply_or_rollback
//!             (nothing matched: no write, no reload, success)
//! reactivate: reject empty list → load → append missing ids → apply_or_rollback
//! count/list: load → read only
//! ```
//!
//! # Design Decisions
//! - Removal always scans all inbounds so a client provisioned under an
//!   older transport cannot stay reachable
//! - Removing an absent client is success; reactivating nothing is an error
//! - No retries; failures surface as `ProvisionError`

pub mod error;
pub mod service;

pub use error::{ProvisionError, ProvisionResult};
pub use service::{Provisioned, ProvisioningService};
