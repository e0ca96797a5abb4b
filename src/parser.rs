// src/parser.rs
use etherparse::{Ethernet2Header, Ipv4HeaderSlice, Ipv6HeaderSlice, TcpHeaderSlice, UdpHeaderSlice};
use tracing::trace;

use crate::config::AnalysisConfig;
use crate::dns;
use crate::models::domain::{DecodedLayer, Frame, PacketLayers, LINKTYPE_ETHERNET};
use crate::models::dto::HttpRequest;

const ETHERTYPE_IPV4: u16 = 0x0800;
const ETHERTYPE_IPV6: u16 = 0x86DD;
const IP_PROTO_TCP: u8 = 6;
const IP_PROTO_UDP: u8 = 17;
const UDP_HEADER_LEN: usize = 8;
const IPV6_HEADER_LEN: usize = 40;
const MAX_HEADERS: usize = 32;

/// Walks the frame from the link layer inwards and stops at the first layer
/// that does not decode. Never fails: a short walk is still a result.
pub fn decode_frame(frame: &Frame, config: &AnalysisConfig) -> PacketLayers {
    let mut layers = PacketLayers::new();
    if frame.link_type == LINKTYPE_ETHERNET {
        handle_ethernet(&frame.data, config, &mut layers);
    }
    trace!(frame = frame.index, layers = layers.len(), "decoded frame");
    layers
}

fn handle_ethernet(data: &[u8], config: &AnalysisConfig, layers: &mut PacketLayers) {
    // Layer 2 parsing
    let Ok((eth, payload)) = Ethernet2Header::from_slice(data) else {
        return;
    };
    let ether_type = eth.ether_type.0;
    layers.push(DecodedLayer::Ethernet {
        source: eth.source,
        destination: eth.destination,
        ether_type,
    });

    match ether_type {
        ETHERTYPE_IPV4 => handle_ipv4(payload, config, layers),
        ETHERTYPE_IPV6 => handle_ipv6(payload, config, layers),
        _ => {}
    }
}

fn handle_ipv4(payload: &[u8], config: &AnalysisConfig, layers: &mut PacketLayers) {
    let Ok(ip) = Ipv4HeaderSlice::from_slice(payload) else {
        return;
    };
    let protocol = ip.protocol().0;
    layers.push(DecodedLayer::Ipv4 {
        source: ip.source_addr(),
        destination: ip.destination_addr(),
        protocol,
    });

    // later fragments carry no transport header
    let raw = ip.slice();
    if u16::from_be_bytes([raw[6], raw[7]]) & 0x1FFF != 0 {
        return;
    }

    // total length bounds the datagram; anything past it is link padding
    let header_len = raw.len();
    let end = usize::from(ip.total_len()).clamp(header_len, payload.len());
    handle_transport(protocol, &payload[header_len..end], config, layers);
}

fn handle_ipv6(payload: &[u8], config: &AnalysisConfig, layers: &mut PacketLayers) {
    let Ok(ip) = Ipv6HeaderSlice::from_slice(payload) else {
        return;
    };
    let next_header = ip.next_header().0;
    layers.push(DecodedLayer::Ipv6 {
        source: ip.source_addr(),
        destination: ip.destination_addr(),
        next_header,
    });

    // extension headers are not walked; only a directly following TCP/UDP header decodes
    let end = (IPV6_HEADER_LEN + usize::from(ip.payload_length())).min(payload.len());
    handle_transport(next_header, &payload[IPV6_HEADER_LEN..end], config, layers);
}

fn handle_transport(protocol: u8, payload: &[u8], config: &AnalysisConfig, layers: &mut PacketLayers) {
    match protocol {
        IP_PROTO_TCP => handle_tcp(payload, config, layers),
        IP_PROTO_UDP => handle_udp(payload, config, layers),
        _ => {}
    }
}

fn handle_tcp(payload: &[u8], config: &AnalysisConfig, layers: &mut PacketLayers) {
    let Ok(tcp) = TcpHeaderSlice::from_slice(payload) else {
        return;
    };
    let (source_port, destination_port) = (tcp.source_port(), tcp.destination_port());
    layers.push(DecodedLayer::Tcp {
        source_port,
        destination_port,
    });

    let body = &payload[tcp.slice().len()..];
    if body.is_empty() {
        return;
    }
    if config.is_http_port(source_port) || config.is_http_port(destination_port) {
        if let Some(layer) = parse_http(body) {
            layers.push(layer);
        }
    }
}

fn handle_udp(payload: &[u8], config: &AnalysisConfig, layers: &mut PacketLayers) {
    let Ok(udp) = UdpHeaderSlice::from_slice(payload) else {
        return;
    };
    let (source_port, destination_port) = (udp.source_port(), udp.destination_port());
    layers.push(DecodedLayer::Udp {
        source_port,
        destination_port,
    });

    let end = usize::from(udp.length()).clamp(UDP_HEADER_LEN, payload.len());
    let body = &payload[UDP_HEADER_LEN..end];

    // DNS Processing
    if config.is_dns_port(source_port) || config.is_dns_port(destination_port) {
        if let Some(layer) = dns::parse_message(body) {
            layers.push(layer);
        }
    }
}

/// Request line (plus Host header) or status line from the start of a segment.
fn parse_http(body: &[u8]) -> Option<DecodedLayer> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut request = httparse::Request::new(&mut headers);
    if request.parse(body).is_ok() {
        if let (Some(method), Some(path)) = (request.method, request.path) {
            let host = request
                .headers
                .iter()
                .find(|h| h.name.eq_ignore_ascii_case("host"))
                .map(|h| String::from_utf8_lossy(h.value).trim().to_string())
                .unwrap_or_default();
            return Some(DecodedLayer::HttpRequest(HttpRequest {
                method: method.to_string(),
                host,
                path: path.to_string(),
            }));
        }
    }

    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut response = httparse::Response::new(&mut headers);
    if response.parse(body).is_ok() {
        if let Some(status) = response.code {
            return Some(DecodedLayer::HttpResponse { status });
        }
    }
    None
}
