use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::models::domain::PacketLayers;

/// Per-frame predicate. Every condition that is set must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    /// Network-layer source or destination address
    pub address: Option<String>,
    /// Canonical layer name, matched exactly ("UDP", "HTTPRequest", ...)
    pub protocol: Option<String>,
    /// Transport-layer source or destination port
    pub port: Option<u16>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.address.is_none() && self.protocol.is_none() && self.port.is_none()
    }

    pub fn matches(&self, layers: &PacketLayers) -> bool {
        if let Some(protocol) = &self.protocol {
            if !layers.contains(protocol) {
                return false;
            }
        }

        if let Some(address) = &self.address {
            let Some((source, destination)) = layers.addresses() else {
                return false;
            };
            if !address_matches(address, source) && !address_matches(address, destination) {
                return false;
            }
        }

        if let Some(port) = self.port {
            match layers.ports() {
                Some((source, destination)) if source == port || destination == port => {}
                _ => return false,
            }
        }

        true
    }
}

// "::0001" and "::1" name the same host, so literals compare as addresses.
fn address_matches(wanted: &str, actual: IpAddr) -> bool {
    match wanted.trim().parse::<IpAddr>() {
        Ok(parsed) => parsed == actual,
        Err(_) => wanted == actual.to_string(),
    }
}
