//! Transport kinds and the flow-mode rule.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Flow marker for raw-stream (tcp) clients.
pub const VISION_FLOW: &str = "xtls-rprx-vision";

/// Wire transport of an inbound, as named by `streamSettings.network`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TransportKind {
    /// Raw stream.
    Tcp,
    /// HTTP-multiplexed.
    Xhttp,
    /// gRPC-multiplexed.
    Grpc,
    /// Any transport this crate has no special rules for.
    Other(String),
}

impl TransportKind {
    /// Network name as written in the xray document.
    pub fn as_str(&self) -> &str {
        match self {
            TransportKind::Tcp => "tcp",
            TransportKind::Xhttp => "xhttp",
            TransportKind::Grpc => "grpc",
            TransportKind::Other(name) => name,
        }
    }

    /// Flow mode every client of this transport must carry.
    pub fn flow(&self) -> &'static str {
        match self {
            TransportKind::Tcp => VISION_FLOW,
            _ => "",
        }
    }
}

impl FromStr for TransportKind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "tcp" => TransportKind::Tcp,
            "xhttp" => TransportKind::Xhttp,
            "grpc" => TransportKind::Grpc,
            other => TransportKind::Other(other.to_string()),
        })
    }
}

impl From<&str> for TransportKind {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(kind) => kind,
            Err(never) => match never {},
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TransportKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TransportKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(TransportKind::from(name.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_names_round_trip() {
        for name in ["tcp", "xhttp", "grpc", "ws"] {
            assert_eq!(TransportKind::from(name).to_string(), name);
        }
        assert_eq!(TransportKind::from("ws"), TransportKind::Other("ws".into()));
    }

    #[test]
    fn test_flow_follows_transport() {
        assert_eq!(TransportKind::Tcp.flow(), "xtls-rprx-vision");
        assert_eq!(TransportKind::Xhttp.flow(), "");
        assert_eq!(TransportKind::Grpc.flow(), "");
        assert_eq!(TransportKind::Other("ws".into()).flow(), "");
    }

    #[test]
    fn test_matching_is_exact() {
        assert_ne!(TransportKind::from("TCP"), TransportKind::Tcp);
    }
}
