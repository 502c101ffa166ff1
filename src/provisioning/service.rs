//! Client provisioning operations.
//!
//! Every operation is stateless: load the current document, change a
//! working copy, hand it to the store. Callers serialize mutating calls;
//! nothing here locks the file.

use std::collections::HashSet;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::observability::metrics;
use crate::provisioning::error::{ProvisionError, ProvisionResult};
use crate::xray::credentials::CredentialGenerator;
use crate::xray::document::XrayDocument;
use crate::xray::link::{build_link, LinkSettings};
use crate::xray::router::{self, Route};
use crate::xray::store::{ConfigStore, Snapshot};
use crate::xray::transport::TransportKind;

/// Result of a successful add.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provisioned {
    pub link: String,
    pub identifier: String,
}

/// Adds, removes and inspects xray clients.
#[derive(Clone)]
pub struct ProvisioningService {
    store: ConfigStore,
    generator: CredentialGenerator,
    links: LinkSettings,
}

impl ProvisioningService {
    pub fn new(store: ConfigStore, generator: CredentialGenerator, links: LinkSettings) -> Self {
        Self {
            store,
            generator,
            links,
        }
    }

    /// Transport new clients go to unless a caller asks otherwise.
    pub fn configured_transport(&self) -> &TransportKind {
        &self.links.transport
    }

    /// Provision a client under `transport` and return its link.
    ///
    /// Falls back to the first inbound when no inbound uses `transport`.
    /// Re-adding an identifier the target inbound already holds returns
    /// its link without writing.
    pub async fn add(
        &self,
        config_name: &str,
        caller_id: Option<String>,
        transport: &TransportKind,
    ) -> ProvisionResult<Provisioned> {
        let start = Instant::now();
        let result = self.add_client(config_name, caller_id, transport).await;
        observe("add", start, result)
    }

    async fn add_client(
        &self,
        config_name: &str,
        caller_id: Option<String>,
        transport: &TransportKind,
    ) -> ProvisionResult<Provisioned> {
        let credential = self.generator.generate(caller_id);

        let snapshot = self.store.load().await?;
        let mut working = snapshot.working_copy();
        let index = self.target_inbound(&working, transport)?;
        let kind = working.inbounds[index].transport();

        if working.inbounds[index].contains_client(&credential.id) {
            tracing::info!(identifier = %credential.id, "Client already provisioned");
            let link = self.link(&credential.id, config_name, kind);
            return Ok(Provisioned {
                link,
                identifier: credential.id,
            });
        }
        if working.find_client(&credential.id).is_some() {
            return Err(ProvisionError::DuplicateIdentifier(credential.id));
        }

        let credential = credential.with_flow(&kind);
        let identifier = credential.id.clone();
        working.inbounds[index].clients_mut().push(credential.into_client());

        self.commit("add", &working, &snapshot).await?;

        tracing::info!(
            identifier = %identifier,
            inbound = %working.inbounds[index].display_name(index),
            transport = %kind,
            "Client provisioned"
        );

        let link = self.link(&identifier, config_name, kind);
        Ok(Provisioned { link, identifier })
    }

    /// Remove `identifier` from every inbound.
    ///
    /// An identifier that is not present is a successful no-op: nothing is
    /// written and the service is not reloaded. Calling this twice is safe.
    pub async fn disconnect_one(&self, identifier: &str) -> ProvisionResult<()> {
        let start = Instant::now();
        let ids = HashSet::from([identifier]);
        let result = self.remove_clients("disconnect", &ids).await;
        observe("disconnect", start, result)
    }

    /// Remove every listed identifier from every inbound with one reload.
    /// Same no-op rule as [`disconnect_one`](Self::disconnect_one).
    pub async fn disconnect_many(&self, identifiers: &[String]) -> ProvisionResult<()> {
        let start = Instant::now();
        let ids: HashSet<&str> = identifiers.iter().map(String::as_str).collect();
        let result = self.remove_clients("disconnect_many", &ids).await;
        observe("disconnect_many", start, result)
    }

    /// Take clients offline. Nothing remembers them: callers keep the
    /// identifiers and pass them to [`reactivate_many`](Self::reactivate_many).
    pub async fn deactivate_many(&self, identifiers: &[String]) -> ProvisionResult<()> {
        let start = Instant::now();
        let ids: HashSet<&str> = identifiers.iter().map(String::as_str).collect();
        let result = self.remove_clients("deactivate", &ids).await;
        observe("deactivate", start, result)
    }

    async fn remove_clients(&self, operation: &'static str, ids: &HashSet<&str>) -> ProvisionResult<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let snapshot = self.store.load().await?;
        let mut working = snapshot.working_copy();
        let removed = working.retain_clients(|id| ids.contains(id));

        if removed == 0 {
            tracing::debug!(operation, requested = ids.len(), "No matching clients, nothing to do");
            return Ok(());
        }

        self.commit(operation, &working, &snapshot).await?;
        tracing::info!(operation, removed, "Clients removed");
        Ok(())
    }

    /// Restore clients under the configured transport.
    ///
    /// Identifiers already present anywhere are skipped. An empty list is
    /// rejected before the document is read.
    pub async fn reactivate_many(&self, identifiers: &[String]) -> ProvisionResult<()> {
        let start = Instant::now();
        let result = self.restore_clients(identifiers).await;
        observe("reactivate", start, result)
    }

    async fn restore_clients(&self, identifiers: &[String]) -> ProvisionResult<()> {
        if identifiers.is_empty() {
            return Err(ProvisionError::InvalidRequest("no identifiers to reactivate".into()));
        }
        if identifiers.iter().any(|id| id.is_empty()) {
            return Err(ProvisionError::InvalidRequest("empty identifier".into()));
        }

        let snapshot = self.store.load().await?;
        let mut working = snapshot.working_copy();
        let index = self.target_inbound(&working, &self.links.transport)?;
        let kind = working.inbounds[index].transport();

        let mut seen = HashSet::new();
        let mut restored = 0usize;
        for id in identifiers {
            if !seen.insert(id.as_str()) || working.find_client(id).is_some() {
                tracing::debug!(identifier = %id, "Client already present, skipping");
                continue;
            }
            let record = self.generator.record_for(id.clone()).with_flow(&kind);
            working.inbounds[index].clients_mut().push(record.into_client());
            restored += 1;
        }

        if restored == 0 {
            return Ok(());
        }

        self.commit("reactivate", &working, &snapshot).await?;
        tracing::info!(restored, transport = %kind, "Clients reactivated");
        Ok(())
    }

    /// Clients in the first inbound using `transport`, or in all inbounds
    /// when none does.
    pub async fn active_client_count(&self, transport: &TransportKind) -> ProvisionResult<usize> {
        let start = Instant::now();
        let result = self.count_clients(transport).await;
        observe("count", start, result)
    }

    async fn count_clients(&self, transport: &TransportKind) -> ProvisionResult<usize> {
        let snapshot = self.store.load().await?;
        let doc = snapshot.document();
        Ok(match router::locate(doc, transport) {
            Some(inbound) => inbound.clients().len(),
            None => doc.client_count(),
        })
    }

    /// Every identifier in the document, first occurrence order, no repeats.
    pub async fn list_all_identifiers(&self) -> ProvisionResult<Vec<String>> {
        let start = Instant::now();
        let result = self.list_identifiers().await;
        observe("list", start, result)
    }

    async fn list_identifiers(&self) -> ProvisionResult<Vec<String>> {
        let snapshot = self.store.load().await?;
        let mut seen = HashSet::new();
        Ok(snapshot
            .document()
            .inbounds
            .iter()
            .flat_map(|inbound| inbound.clients())
            .filter(|client| seen.insert(client.id.as_str()))
            .map(|client| client.id.clone())
            .collect())
    }

    /// Link for an existing client, rendered for the transport of the
    /// inbound that holds it.
    pub async fn link_for(&self, identifier: &str, config_name: &str) -> ProvisionResult<String> {
        let start = Instant::now();
        let result = self.existing_link(identifier, config_name).await;
        observe("link", start, result)
    }

    async fn existing_link(&self, identifier: &str, config_name: &str) -> ProvisionResult<String> {
        let snapshot = self.store.load().await?;
        let doc = snapshot.document();
        let index = doc
            .find_client(identifier)
            .ok_or_else(|| ProvisionError::UnknownClient(identifier.to_string()))?;
        Ok(self.link(identifier, config_name, doc.inbounds[index].transport()))
    }

    fn target_inbound(&self, doc: &XrayDocument, transport: &TransportKind) -> ProvisionResult<usize> {
        match router::route(doc, transport) {
            Some(Route::Matched(index)) => Ok(index),
            Some(Route::Fallback(index)) => {
                tracing::warn!(
                    requested = %transport,
                    inbound = %doc.inbounds[index].display_name(index),
                    actual = %doc.inbounds[index].transport(),
                    "No inbound uses the requested transport, using the first inbound"
                );
                Ok(index)
            }
            None => Err(ProvisionError::NoInbounds),
        }
    }

    async fn commit(&self, operation: &'static str, updated: &XrayDocument, snapshot: &Snapshot) -> ProvisionResult<()> {
        if self.store.apply_or_rollback(updated, snapshot).await {
            Ok(())
        } else {
            Err(ProvisionError::ProvisioningFailed { operation })
        }
    }

    fn link(&self, identifier: &str, config_name: &str, transport: TransportKind) -> String {
        build_link(identifier, config_name, &self.links.for_transport(transport))
    }
}

fn observe<T>(operation: &'static str, start: Instant, result: ProvisionResult<T>) -> ProvisionResult<T> {
    let outcome = match &result {
        Ok(_) => "success",
        Err(e) => e.kind(),
    };
    metrics::record_operation(operation, outcome, start);
    if let Err(e) = &result {
        tracing::warn!(operation, error = %e, "Provisioning operation failed");
    }
    result
}
