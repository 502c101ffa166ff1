//! Inbound selection.
//!
//! # Design Decisions
//! - Exact transport match first, first match wins, document order only
//! - Fallback to the first inbound is an explicit second step so the
//!   caller can log it; it is never hidden inside the lookup
//! - Routing never creates or removes inbounds

use crate::xray::document::{Inbound, XrayDocument};
use crate::xray::transport::TransportKind;

/// Outcome of routing a transport kind to an inbound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// An inbound with the requested transport exists at this index.
    Matched(usize),
    /// No inbound matched; the first inbound is used instead.
    Fallback(usize),
}

impl Route {
    pub fn index(self) -> usize {
        match self {
            Route::Matched(index) | Route::Fallback(index) => index,
        }
    }

    pub fn is_fallback(self) -> bool {
        matches!(self, Route::Fallback(_))
    }
}

/// Index of the first inbound whose transport is exactly `kind`.
pub fn locate_index(doc: &XrayDocument, kind: &TransportKind) -> Option<usize> {
    doc.inbounds.iter().position(|inbound| &inbound.transport() == kind)
}

/// First inbound whose transport is exactly `kind`.
pub fn locate<'a>(doc: &'a XrayDocument, kind: &TransportKind) -> Option<&'a Inbound> {
    locate_index(doc, kind).map(|index| &doc.inbounds[index])
}

/// Exact match, then the first inbound. `None` only for a document
/// without inbounds.
pub fn route(doc: &XrayDocument, kind: &TransportKind) -> Option<Route> {
    match locate_index(doc, kind) {
        Some(index) => Some(Route::Matched(index)),
        None if !doc.inbounds.is_empty() => Some(Route::Fallback(0)),
        None => None,
    }
}
