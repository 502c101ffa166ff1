//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tempfile::TempDir;
use xray_provisioner::xray::{ConfigStore, CredentialGenerator, LinkSettings, ReloadError, Reloader, TransportKind};
use xray_provisioner::ProvisioningService;

/// Reloader that counts calls and fails on demand.
#[derive(Default)]
pub struct RecordingReloader {
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl RecordingReloader {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Reloader for RecordingReloader {
    async fn reload(&self) -> Result<(), ReloadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            Err(ReloadError::Other("injected reload failure".into()))
        } else {
            Ok(())
        }
    }
}

/// A provisioning service over a temporary xray document.
pub struct Fixture {
    _dir: TempDir,
    pub path: PathBuf,
    pub reloader: Arc<RecordingReloader>,
    pub service: ProvisioningService,
}

impl Fixture {
    pub fn new(document: &Value, transport: TransportKind) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, serde_json::to_string_pretty(document).unwrap()).unwrap();
        Self::at(dir, path, transport)
    }

    /// Fixture whose document path does not exist.
    pub fn missing(transport: TransportKind) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        Self::at(dir, path, transport)
    }

    fn at(dir: TempDir, path: PathBuf, transport: TransportKind) -> Self {
        let reloader = Arc::new(RecordingReloader::default());
        let store = ConfigStore::new(&path, reloader.clone());
        let service = ProvisioningService::new(store, CredentialGenerator::default(), link_settings(transport));
        Self {
            _dir: dir,
            path,
            reloader,
            service,
        }
    }

    pub fn raw(&self) -> String {
        read_raw(&self.path)
    }

    pub fn document(&self) -> Value {
        serde_json::from_str(&self.raw()).unwrap()
    }

    /// Client entries of inbound `index`.
    pub fn clients(&self, index: usize) -> Vec<Value> {
        self.document()["inbounds"][index]["settings"]["clients"]
            .as_array()
            .cloned()
            .unwrap_or_default()
    }
}

pub fn read_raw(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

pub fn link_settings(transport: TransportKind) -> LinkSettings {
    LinkSettings {
        address: "203.0.113.10".into(),
        port: 443,
        sni: "www.example.org".into(),
        public_key: "PUBKEY".into(),
        short_id: "ab12".into(),
        path: "/update".into(),
        config_prefix: "vpn".into(),
        transport,
    }
}

fn inbound(tag: &str, network: &str, ids: &[&str]) -> Value {
    let flow = if network == "tcp" { "xtls-rprx-vision" } else { "" };
    let clients: Vec<Value> = ids
        .iter()
        .map(|id| json!({ "id": id, "email": format!("{id}@example.com"), "flow": flow }))
        .collect();
    json!({
        "tag": tag,
        "listen": "0.0.0.0",
        "port": 443,
        "protocol": "vless",
        "settings": { "clients": clients, "decryption": "none" },
        "streamSettings": { "network": network, "security": "reality" }
    })
}

/// One tcp inbound holding `tcp_ids`, one xhttp inbound holding `xhttp_ids`.
pub fn tcp_and_xhttp(tcp_ids: &[&str], xhttp_ids: &[&str]) -> Value {
    json!({
        "log": { "loglevel": "warning" },
        "inbounds": [inbound("vless-tcp", "tcp", tcp_ids), inbound("vless-xhttp", "xhttp", xhttp_ids)],
        "outbounds": [{ "protocol": "freedom", "tag": "direct" }]
    })
}

/// Inbounds with the given networks and no clients.
pub fn with_networks(networks: &[&str]) -> Value {
    let inbounds: Vec<Value> = networks
        .iter()
        .enumerate()
        .map(|(i, n)| inbound(&format!("in-{i}"), n, &[]))
        .collect();
    json!({ "inbounds": inbounds })
}
