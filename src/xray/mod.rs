//! Xray configuration mutation engine.
//!
//! # Data Flow
//! ```text
//! store.rs load()            → Snapshot (document + original bytes)
//!     → working copy (deep clone)
//!     → router.rs route()    → target inbound (exact match or first)
//!     → credentials.rs       → CredentialRecord, flow from inbound transport
//!     → mutate working copy
//!     → store.rs apply_or_rollback()
//!           write temp + rename → reload.rs Reloader
//!           on failure: write original bytes → reload again
//!     → link.rs build_link() → vless:// share link
//! ```
//!
//! # Design Decisions
//! - Inbounds are never created or deleted here, only their client lists
//! - The loaded document is never edited in place
//! - Unknown keys in the document are preserved on every write

pub mod credentials;
pub mod document;
pub mod link;
pub mod reload;
pub mod router;
pub mod store;
pub mod transport;

pub use credentials::{CredentialGenerator, CredentialRecord};
pub use document::{ClientEntry, Inbound, XrayDocument};
pub use link::{build_link, LinkSettings};
pub use reload::{CommandReloader, ReloadError, Reloader};
pub use router::Route;
pub use store::{ConfigStore, Snapshot, StoreError};
pub use transport::TransportKind;
