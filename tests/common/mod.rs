//! Synthetic captures for integration tests.
#![allow(dead_code)]

use etherparse::PacketBuilder;

pub const CLIENT_MAC: [u8; 6] = [0x00, 0x11, 0x22, 0x33, 0x44, 0x55];
pub const ROUTER_MAC: [u8; 6] = [0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb];

/// Ethernet/IPv4/TCP to port 80 carrying a GET request.
pub fn http_get(src: [u8; 4], dst: [u8; 4], host: &str, path: &str) -> Vec<u8> {
    let payload = format!("GET {path} HTTP/1.1\r\nHost: {host}\r\nUser-Agent: test\r\n\r\n");
    let builder = PacketBuilder::ethernet2(CLIENT_MAC, ROUTER_MAC)
        .ipv4(src, dst, 64)
        .tcp(51515, 80, 1000, 64240);
    let mut out = Vec::with_capacity(builder.size(payload.len()));
    builder.write(&mut out, payload.as_bytes()).unwrap();
    out
}

/// Ethernet/IPv4/UDP to port 53 carrying a standard A query.
pub fn dns_query(src: [u8; 4], dst: [u8; 4], name: &str) -> Vec<u8> {
    let payload = dns_message(name, false);
    let builder = PacketBuilder::ethernet2(CLIENT_MAC, ROUTER_MAC)
        .ipv4(src, dst, 64)
        .udp(53000, 53);
    let mut out = Vec::with_capacity(builder.size(payload.len()));
    builder.write(&mut out, &payload).unwrap();
    out
}

/// Ethernet/IPv4/UDP from port 53 carrying a response that echoes the question.
pub fn dns_response(src: [u8; 4], dst: [u8; 4], name: &str) -> Vec<u8> {
    let payload = dns_message(name, true);
    let builder = PacketBuilder::ethernet2(ROUTER_MAC, CLIENT_MAC)
        .ipv4(src, dst, 64)
        .udp(53, 53000);
    let mut out = Vec::new();
    builder.write(&mut out, &payload).unwrap();
    out
}

/// ARP request: Ethernet only as far as the analyzer is concerned.
pub fn arp_request() -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&[0xff; 6]);
    out.extend_from_slice(&CLIENT_MAC);
    out.extend_from_slice(&[0x08, 0x06]);
    out.extend_from_slice(&[0x00, 0x01, 0x08, 0x00, 0x06, 0x04, 0x00, 0x01]);
    out.extend_from_slice(&CLIENT_MAC);
    out.extend_from_slice(&[192, 168, 1, 10]);
    out.extend_from_slice(&[0x00; 6]);
    out.extend_from_slice(&[192, 168, 1, 1]);
    out
}

fn dns_message(name: &str, response: bool) -> Vec<u8> {
    let flags: [u8; 2] = if response { [0x81, 0x80] } else { [0x01, 0x00] };
    let mut msg = vec![0x12, 0x34, flags[0], flags[1], 0x00, 0x01, 0, 0, 0, 0, 0, 0];
    for label in name.split('.') {
        msg.push(label.len() as u8);
        msg.extend_from_slice(label.as_bytes());
    }
    msg.push(0);
    msg.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]);
    msg
}

/// Little-endian microsecond pcap; frame `i` is stamped `1_700_000_000 + i` seconds.
pub fn pcap(frames: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&0xa1b2c3d4u32.to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&4u16.to_le_bytes());
    out.extend_from_slice(&0i32.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&65535u32.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes());

    for (i, data) in frames.iter().enumerate() {
        out.extend_from_slice(&(1_700_000_000u32 + i as u32).to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(data);
    }
    out
}

/// Single-section pcapng with one Ethernet interface and one EPB per frame,
/// stamped the same way as [`pcap`].
pub fn pcapng(frames: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();

    // section header block
    out.extend_from_slice(&0x0A0D0D0Au32.to_le_bytes());
    out.extend_from_slice(&28u32.to_le_bytes());
    out.extend_from_slice(&0x1A2B3C4Du32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&(-1i64).to_le_bytes());
    out.extend_from_slice(&28u32.to_le_bytes());

    // interface description block
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&20u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&20u32.to_le_bytes());

    for (i, data) in frames.iter().enumerate() {
        let padded = (data.len() + 3) & !3;
        let total = (32 + padded) as u32;
        let ts = (1_700_000_000u64 + i as u64) * 1_000_000;
        out.extend_from_slice(&6u32.to_le_bytes());
        out.extend_from_slice(&total.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&((ts >> 32) as u32).to_le_bytes());
        out.extend_from_slice(&(ts as u32).to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(data);
        out.resize(out.len() + padded - data.len(), 0);
        out.extend_from_slice(&total.to_le_bytes());
    }
    out
}

/// The three-frame scenario: HTTP GET, DNS query, ARP.
pub fn mixed_capture_frames() -> Vec<Vec<u8>> {
    vec![
        http_get([192, 168, 1, 10], [93, 184, 216, 34], "example.com", "/"),
        dns_query([192, 168, 1, 10], [192, 168, 1, 1], "example.com"),
        arp_request(),
    ]
}
