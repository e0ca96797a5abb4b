//! Packet capture analysis.
//!
//! [`capture`] turns a pcap/pcapng container into [`Frame`]s; [`analyzer`]
//! decodes each frame's Ethernet/IP/TCP/UDP/DNS/HTTP layers, applies an
//! optional [`Filter`] and reduces everything to an [`AnalysisResult`].
//!
//! ```no_run
//! use capstat::{analyze_file, AnalysisConfig, Filter};
//!
//! let filter = Filter::new().with_protocol("DNS");
//! let result = analyze_file("capture.pcap", Some(&filter), &AnalysisConfig::default())?;
//! println!("{}", serde_json::to_string_pretty(&result).unwrap());
//! # Ok::<(), capstat::Error>(())
//! ```

pub mod analyzer;
pub mod capture;
pub mod config;
pub mod dns;
pub mod error;
pub mod filter;
pub mod models;
pub mod parser;
mod stats;

use std::io::Read;
use std::path::Path;

pub use analyzer::PacketAnalyzer;
pub use capture::{read_frames, CaptureReader, ContainerFormat};
pub use config::AnalysisConfig;
pub use error::{ContainerError, Error, Result};
pub use filter::Filter;
pub use models::domain::{DecodedLayer, Frame, PacketLayers};
pub use models::dto::{AnalysisResult, HttpRequest, Ranking};

/// Analyze already-read frames with the default configuration.
pub fn analyze<'a, I>(frames: I, filter: Option<&Filter>) -> Result<AnalysisResult>
where
    I: IntoIterator<Item = &'a Frame>,
{
    PacketAnalyzer::default().analyze(frames, filter)
}

pub fn analyze_capture<R: Read>(
    source: R,
    filter: Option<&Filter>,
    config: &AnalysisConfig,
) -> Result<AnalysisResult> {
    PacketAnalyzer::new(config.clone()).analyze_capture(source, filter)
}

pub fn analyze_file<P: AsRef<Path>>(
    path: P,
    filter: Option<&Filter>,
    config: &AnalysisConfig,
) -> Result<AnalysisResult> {
    PacketAnalyzer::new(config.clone()).analyze_file(path, filter)
}
