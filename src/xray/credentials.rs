//! Client credential generation.

use serde_json::Map;
use uuid::Uuid;

use crate::xray::document::ClientEntry;
use crate::xray::transport::TransportKind;

/// One provisioned client before it is written into an inbound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub id: String,
    /// Display label, `<id>@<domain>`.
    pub label: String,
    /// Empty until the owning inbound is known.
    pub flow: String,
}

impl CredentialRecord {
    /// Set the flow mode from the transport of the inbound that will own
    /// this record.
    pub fn with_flow(mut self, transport: &TransportKind) -> Self {
        self.flow = transport.flow().to_string();
        self
    }

    pub fn into_client(self) -> ClientEntry {
        ClientEntry {
            id: self.id,
            email: Some(self.label),
            flow: Some(self.flow),
            extra: Map::new(),
        }
    }
}

/// Produces credential records.
#[derive(Debug, Clone)]
pub struct CredentialGenerator {
    label_domain: String,
}

impl CredentialGenerator {
    pub fn new(label_domain: impl Into<String>) -> Self {
        Self {
            label_domain: label_domain.into(),
        }
    }

    /// Build a record for `caller_id`, or for a fresh UUID v4 when none
    /// (or an empty one) is given. Uniqueness is checked at insertion.
    pub fn generate(&self, caller_id: Option<String>) -> CredentialRecord {
        let id = caller_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        self.record_for(id)
    }

    /// Record for a known identifier, used when restoring clients.
    pub fn record_for(&self, id: String) -> CredentialRecord {
        CredentialRecord {
            label: format!("{}@{}", id, self.label_domain),
            id,
            flow: String::new(),
        }
    }
}

impl Default for CredentialGenerator {
    fn default() -> Self {
        Self::new("example.com")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_id_is_uuid_v4() {
        let record = CredentialGenerator::default().generate(None);
        let parsed = Uuid::parse_str(&record.id).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
        assert_eq!(record.label, format!("{}@example.com", record.id));
        assert!(record.flow.is_empty());
    }

    #[test]
    fn test_caller_id_used_verbatim() {
        let record = CredentialGenerator::new("vpn.test").generate(Some("my-id".into()));
        assert_eq!(record.id, "my-id");
        assert_eq!(record.label, "my-id@vpn.test");
    }

    #[test]
    fn test_empty_caller_id_is_replaced() {
        let record = CredentialGenerator::default().generate(Some(String::new()));
        assert!(Uuid::parse_str(&record.id).is_ok());
    }

    #[test]
    fn test_flow_applied_per_transport() {
        let generator = CredentialGenerator::default();
        let tcp = generator.generate(None).with_flow(&TransportKind::Tcp);
        assert_eq!(tcp.flow, "xtls-rprx-vision");

        let client = generator.generate(None).with_flow(&TransportKind::Xhttp).into_client();
        assert_eq!(client.flow.as_deref(), Some(""));
    }
}
