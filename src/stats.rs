use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::models::domain::{Frame, PacketLayers};
use crate::models::dto::{AnalysisResult, HttpRequest, Ranking};

/// Occurrence counts that remember first-seen order for tie breaking.
#[derive(Debug, Default)]
pub(crate) struct FrequencyCounter {
    index: HashMap<String, usize>,
    counts: Vec<(String, u64)>,
}

impl FrequencyCounter {
    pub fn increment(&mut self, key: &str) {
        match self.index.get(key) {
            Some(&slot) => self.counts[slot].1 += 1,
            None => {
                self.index.insert(key.to_owned(), self.counts.len());
                self.counts.push((key.to_owned(), 1));
            }
        }
    }

    /// Highest counts first; the sort is stable so equal counts stay in first-seen order.
    pub fn top(mut self, n: usize) -> Ranking {
        self.counts.sort_by(|a, b| b.1.cmp(&a.1));
        self.counts.truncate(n);
        Ranking::from_ranked(self.counts)
    }
}

/// Accumulator owned by one analysis pass.
#[derive(Debug, Default)]
pub(crate) struct NetworkStats {
    total_packets: u64,
    total_bytes: u64,
    first_timestamp: Option<DateTime<Utc>>,
    last_timestamp: Option<DateTime<Utc>>,
    protocol_counts: FrequencyCounter,
    address_counts: FrequencyCounter,
    http_requests: Vec<HttpRequest>,
    dns_queries: Vec<String>,
}

impl NetworkStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, frame: &Frame, layers: &PacketLayers) {
        self.total_packets += 1;
        self.total_bytes += frame.data.len() as u64;
        self.first_timestamp.get_or_insert(frame.timestamp);
        self.last_timestamp = Some(frame.timestamp);

        for name in layers.names() {
            self.protocol_counts.increment(name);
        }

        if let Some((source, destination)) = layers.addresses() {
            self.address_counts.increment(&source.to_string());
            self.address_counts.increment(&destination.to_string());
        }

        if let Some(request) = layers.http_request() {
            self.http_requests.push(request.clone());
        }

        if let Some(query) = layers.dns_query() {
            self.dns_queries.push(query.to_owned());
        }
    }

    pub fn total_packets(&self) -> u64 {
        self.total_packets
    }

    pub fn finish(mut self, limit: usize) -> AnalysisResult {
        self.http_requests.truncate(limit);
        self.dns_queries.truncate(limit);
        AnalysisResult {
            total_packets: self.total_packets,
            total_bytes: self.total_bytes,
            first_timestamp: self.first_timestamp,
            last_timestamp: self.last_timestamp,
            protocols: self.protocol_counts.top(limit),
            ip_addresses: self.address_counts.top(limit),
            http_requests: self.http_requests,
            dns_queries: self.dns_queries,
        }
    }
}
