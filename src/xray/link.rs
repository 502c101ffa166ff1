//! Connection link rendering.
//!
//! Produces `vless://` share links for REALITY inbounds. The function is
//! pure: everything it needs arrives through [`LinkSettings`].

use crate::config::ProvisionerConfig;
use crate::xray::transport::{TransportKind, VISION_FLOW};

/// Browser fingerprint advertised to clients.
pub const FINGERPRINT: &str = "chrome";

/// Server and security parameters shared by every link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSettings {
    pub address: String,
    pub port: u16,
    pub sni: String,
    pub public_key: String,
    pub short_id: String,
    /// Request path (xhttp) or service name (grpc).
    pub path: String,
    /// Fragment prefix, rendered as `<prefix>_<config name>`.
    pub config_prefix: String,
    pub transport: TransportKind,
}

impl LinkSettings {
    pub fn from_config(config: &ProvisionerConfig) -> Self {
        Self {
            address: config.server.address.clone(),
            port: config.server.port,
            sni: config.reality.sni.clone(),
            public_key: config.reality.public_key.clone(),
            short_id: config.reality.short_id.clone(),
            path: config.xray.path.clone(),
            config_prefix: config.clients.config_prefix.clone(),
            transport: config.xray.transport.clone(),
        }
    }

    /// Same settings for a client that ended up under `transport`.
    pub fn for_transport(&self, transport: TransportKind) -> Self {
        Self {
            transport,
            ..self.clone()
        }
    }
}

/// Render the share link for `identifier`.
pub fn build_link(identifier: &str, config_name: &str, settings: &LinkSettings) -> String {
    let mut link = format!(
        "vless://{id}@{address}:{port}?security=reality&sni={sni}&fp={fp}&pbk={pbk}&sid={sid}&encryption=none&type={transport}",
        id = identifier,
        address = settings.address,
        port = settings.port,
        sni = settings.sni,
        fp = FINGERPRINT,
        pbk = settings.public_key,
        sid = settings.short_id,
        transport = settings.transport,
    );

    match settings.transport {
        TransportKind::Xhttp => {
            link.push_str("&path=");
            link.push_str(&settings.path);
            link.push_str("&mode=auto");
        }
        TransportKind::Tcp => {
            link.push_str("&flow=");
            link.push_str(VISION_FLOW);
        }
        TransportKind::Grpc => {
            link.push_str("&serviceName=");
            link.push_str(&settings.path);
        }
        TransportKind::Other(_) => {}
    }

    let fragment = format!("{}_{}", settings.config_prefix, config_name);
    link.push('#');
    link.push_str(&urlencoding::encode(&fragment));
    link
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(transport: TransportKind) -> LinkSettings {
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

    #[test]
    fn test_xhttp_link() {
        let link = build_link("uuid-1", "cfg1", &settings(TransportKind::Xhttp));
        assert_eq!(
            link,
            "vless://uuid-1@203.0.113.10:443?security=reality&sni=www.example.org&fp=chrome\
             &pbk=PUBKEY&sid=ab12&encryption=none&type=xhttp&path=/update&mode=auto#vpn_cfg1"
        );
        assert!(!link.contains("flow="));
    }

    #[test]
    fn test_tcp_link() {
        let link = build_link("uuid-1", "cfg1", &settings(TransportKind::Tcp));
        assert!(link.contains("type=tcp"));
        assert!(link.contains("flow=xtls-rprx-vision"));
        assert!(!link.contains("path="));
        assert!(!link.contains("mode="));
    }

    #[test]
    fn test_grpc_link_reuses_path_as_service_name() {
        let link = build_link("uuid-1", "cfg1", &settings(TransportKind::Grpc));
        assert!(link.contains("type=grpc&serviceName=/update#"));
        assert!(!link.contains("flow="));
    }

    #[test]
    fn test_unknown_transport_has_no_suffix() {
        let link = build_link("uuid-1", "cfg1", &settings(TransportKind::Other("ws".into())));
        assert!(link.ends_with("encryption=none&type=ws#vpn_cfg1"));
    }

    #[test]
    fn test_fragment_is_percent_encoded() {
        let link = build_link("uuid-1", "my phone", &settings(TransportKind::Tcp));
        assert!(link.ends_with("#vpn_my%20phone"));
    }

    #[test]
    fn test_for_transport_only_changes_transport() {
        let base = settings(TransportKind::Xhttp);
        let tcp = base.for_transport(TransportKind::Tcp);
        assert_eq!(tcp.transport, TransportKind::Tcp);
        assert_eq!(tcp.address, base.address);
    }
}
