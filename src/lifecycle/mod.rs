//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Check xray document → Build service → Bind API
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger → API stops accepting → Exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then the document check, then the listener
//! - In-flight commits are not cancelled by shutdown

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
