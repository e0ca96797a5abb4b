use serde::{Deserialize, Serialize};

pub const DEFAULT_TOP_N: usize = 10;
pub const HTTP_PORTS: [u16; 2] = [80, 8080];
pub const DNS_PORT: u16 = 53;

/// Knobs for a single analysis pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Size bound for every ranking and sequence in the result
    pub top_n: usize,
    /// TCP ports whose payload is tried as HTTP/1.x
    pub http_ports: Vec<u16>,
    /// UDP ports whose payload is tried as DNS
    pub dns_ports: Vec<u16>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            top_n: DEFAULT_TOP_N,
            http_ports: HTTP_PORTS.to_vec(),
            dns_ports: vec![DNS_PORT],
        }
    }
}

impl AnalysisConfig {
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub(crate) fn is_http_port(&self, port: u16) -> bool {
        self.http_ports.contains(&port)
    }

    pub(crate) fn is_dns_port(&self, port: u16) -> bool {
        self.dns_ports.contains(&port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.top_n, 10);
        assert!(config.is_http_port(80));
        assert!(config.is_http_port(8080));
        assert!(!config.is_http_port(443));
        assert!(config.is_dns_port(53));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: AnalysisConfig = serde_json::from_str(r#"{"top_n": 3}"#).unwrap();
        assert_eq!(config.top_n, 3);
        assert_eq!(config.dns_ports, vec![53]);
        assert_eq!(config.http_ports, vec![80, 8080]);
    }
}
