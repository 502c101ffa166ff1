//! Typed view of the xray configuration document.
//!
//! Only the fields the provisioner reads or writes are modelled. Every
//! other key is kept in a flattened map so a load/save cycle never drops
//! settings that belong to the rest of the proxy configuration.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::xray::transport::TransportKind;

/// The full xray configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XrayDocument {
    /// Listener sections in document order.
    pub inbounds: Vec<Inbound>,

    /// `log`, `routing`, `outbounds` and anything else.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One listener definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inbound {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<InboundSettings>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_settings: Option<StreamSettings>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Protocol settings of an inbound.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InboundSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clients: Option<Vec<ClientEntry>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Transport settings of an inbound.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A client record inside `settings.clients`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientEntry {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Inbound {
    /// Transport kind of this inbound. Xray treats a missing network as tcp.
    pub fn transport(&self) -> TransportKind {
        self.stream_settings
            .as_ref()
            .and_then(|s| s.network.as_deref())
            .map(TransportKind::from)
            .unwrap_or(TransportKind::Tcp)
    }

    /// Clients of this inbound, empty when the inbound has none.
    pub fn clients(&self) -> &[ClientEntry] {
        self.settings
            .as_ref()
            .and_then(|s| s.clients.as_deref())
            .unwrap_or(&[])
    }

    /// Mutable client list, created on first use.
    pub fn clients_mut(&mut self) -> &mut Vec<ClientEntry> {
        self.settings
            .get_or_insert_with(InboundSettings::default)
            .clients
            .get_or_insert_with(Vec::new)
    }

    pub fn contains_client(&self, identifier: &str) -> bool {
        self.clients().iter().any(|c| c.id == identifier)
    }

    /// Name used in logs: the tag if present, otherwise the position.
    pub fn display_name(&self, index: usize) -> String {
        match &self.tag {
            Some(tag) => tag.clone(),
            None => format!("#{index}"),
        }
    }
}

impl XrayDocument {
    /// Index of the first inbound holding `identifier`.
    pub fn find_client(&self, identifier: &str) -> Option<usize> {
        self.inbounds.iter().position(|i| i.contains_client(identifier))
    }

    /// Total number of client entries across all inbounds.
    pub fn client_count(&self) -> usize {
        self.inbounds.iter().map(|i| i.clients().len()).sum()
    }

    /// Drop every client whose identifier satisfies `remove`, in every
    /// inbound. Returns how many entries were removed.
    pub fn retain_clients<F>(&mut self, mut remove: F) -> usize
    where
        F: FnMut(&str) -> bool,
    {
        let mut removed = 0;
        for inbound in &mut self.inbounds {
            let Some(clients) = inbound.settings.as_mut().and_then(|s| s.clients.as_mut()) else {
                continue;
            };
            let before = clients.len();
            clients.retain(|c| !remove(&c.id));
            removed += before - clients.len();
        }
        removed
    }
}
