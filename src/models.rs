pub mod domain {
    use chrono::{DateTime, Utc};
    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

    use super::dto::HttpRequest;

    pub const LINKTYPE_ETHERNET: u16 = 1;

    /// One captured record, exactly as stored in the container.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Frame {
        /// 1-based position in the file
        pub index: u64,
        pub timestamp: DateTime<Utc>,
        pub link_type: u16,
        pub original_len: u32,
        pub data: Vec<u8>,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum DecodedLayer {
        Ethernet {
            source: [u8; 6],
            destination: [u8; 6],
            ether_type: u16,
        },
        Ipv4 {
            source: Ipv4Addr,
            destination: Ipv4Addr,
            protocol: u8,
        },
        Ipv6 {
            source: Ipv6Addr,
            destination: Ipv6Addr,
            next_header: u8,
        },
        Tcp {
            source_port: u16,
            destination_port: u16,
        },
        Udp {
            source_port: u16,
            destination_port: u16,
        },
        Dns {
            id: u16,
            is_response: bool,
            query: Option<String>,
        },
        HttpRequest(HttpRequest),
        HttpResponse {
            status: u16,
        },
    }

    impl DecodedLayer {
        /// Canonical name used for protocol counts and the protocol filter.
        pub fn name(&self) -> &'static str {
            match self {
                DecodedLayer::Ethernet { .. } => "Ethernet",
                DecodedLayer::Ipv4 { .. } => "IPv4",
                DecodedLayer::Ipv6 { .. } => "IPv6",
                DecodedLayer::Tcp { .. } => "TCP",
                DecodedLayer::Udp { .. } => "UDP",
                DecodedLayer::Dns { .. } => "DNS",
                DecodedLayer::HttpRequest(_) => "HTTPRequest",
                DecodedLayer::HttpResponse { .. } => "HTTPResponse",
            }
        }
    }

    /// Layers found in one frame, outermost first.
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct PacketLayers(Vec<DecodedLayer>);

    impl PacketLayers {
        pub fn new() -> Self {
            PacketLayers(Vec::new())
        }

        pub fn push(&mut self, layer: DecodedLayer) {
            self.0.push(layer);
        }

        pub fn iter(&self) -> std::slice::Iter<'_, DecodedLayer> {
            self.0.iter()
        }

        pub fn len(&self) -> usize {
            self.0.len()
        }

        pub fn is_empty(&self) -> bool {
            self.0.is_empty()
        }

        pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
            self.0.iter().map(DecodedLayer::name)
        }

        pub fn contains(&self, name: &str) -> bool {
            self.names().any(|n| n == name)
        }

        /// Network-layer (source, destination), if an IP header was decoded.
        pub fn addresses(&self) -> Option<(IpAddr, IpAddr)> {
            self.0.iter().find_map(|layer| match layer {
                DecodedLayer::Ipv4 { source, destination, .. } => {
                    Some((IpAddr::V4(*source), IpAddr::V4(*destination)))
                }
                DecodedLayer::Ipv6 { source, destination, .. } => {
                    Some((IpAddr::V6(*source), IpAddr::V6(*destination)))
                }
                _ => None,
            })
        }

        pub fn ports(&self) -> Option<(u16, u16)> {
            self.0.iter().find_map(|layer| match layer {
                DecodedLayer::Tcp { source_port, destination_port }
                | DecodedLayer::Udp { source_port, destination_port } => {
                    Some((*source_port, *destination_port))
                }
                _ => None,
            })
        }

        pub fn http_request(&self) -> Option<&HttpRequest> {
            self.0.iter().find_map(|layer| match layer {
                DecodedLayer::HttpRequest(request) => Some(request),
                _ => None,
            })
        }

        /// Question name of a DNS query. Responses echo the question and are skipped.
        pub fn dns_query(&self) -> Option<&str> {
            self.0.iter().find_map(|layer| match layer {
                DecodedLayer::Dns { is_response: false, query: Some(name), .. } => {
                    Some(name.as_str())
                }
                _ => None,
            })
        }
    }
}

pub mod dto {
    use chrono::{DateTime, Utc};
    use serde::{Serialize, Serializer};

    #[derive(Debug, Serialize, Clone, PartialEq, Eq)]
    pub struct HttpRequest {
        pub method: String,
        pub host: String,
        pub path: String,
    }

    /// Key/count pairs in rank order. Serializes as a JSON object whose key
    /// order is the rank order.
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct Ranking(Vec<(String, u64)>);

    impl Ranking {
        pub(crate) fn from_ranked(entries: Vec<(String, u64)>) -> Self {
            Ranking(entries)
        }

        pub fn get(&self, key: &str) -> Option<u64> {
            self.0.iter().find(|(k, _)| k == key).map(|(_, count)| *count)
        }

        pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
            self.0.iter().map(|(k, count)| (k.as_str(), *count))
        }

        pub fn len(&self) -> usize {
            self.0.len()
        }

        pub fn is_empty(&self) -> bool {
            self.0.is_empty()
        }

        pub fn total(&self) -> u64 {
            self.0.iter().map(|(_, count)| count).sum()
        }
    }

    impl Serialize for Ranking {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_map(self.0.iter().map(|(k, count)| (k, count)))
        }
    }

    #[derive(Debug, Serialize, Clone, PartialEq, Eq)]
    pub struct AnalysisResult {
        pub total_packets: u64,
        pub total_bytes: u64,
        pub first_timestamp: Option<DateTime<Utc>>,
        pub last_timestamp: Option<DateTime<Utc>>,
        pub protocols: Ranking,
        pub ip_addresses: Ranking,
        pub http_requests: Vec<HttpRequest>,
        pub dns_queries: Vec<String>,
    }
}
