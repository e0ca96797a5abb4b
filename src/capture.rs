// src/capture.rs
use chrono::{DateTime, Utc};
use pcap_parser::traits::PcapReaderIterator;
use pcap_parser::{pcapng::Block, LegacyPcapReader, PcapBlockOwned, PcapError, PcapNGReader};
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::domain::{Frame, LINKTYPE_ETHERNET};

const MIN_BUFFER_SIZE: usize = 65536;
// pcapng if_tsresol default: microseconds
const DEFAULT_TS_RESOLUTION: u64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerFormat {
    Legacy { nanosecond: bool },
    PcapNg,
}

impl ContainerFormat {
    /// Identify the container from its first four bytes (either byte order).
    pub fn detect(data: &[u8]) -> Result<Self> {
        let Some(magic) = data.get(..4) else {
            return Err(Error::format(
                "missing global header",
                format!("input is {} bytes", data.len()),
            ));
        };
        match magic {
            [0xd4, 0xc3, 0xb2, 0xa1] | [0xa1, 0xb2, 0xc3, 0xd4] => {
                Ok(ContainerFormat::Legacy { nanosecond: false })
            }
            [0x4d, 0x3c, 0xb2, 0xa1] | [0xa1, 0xb2, 0x3c, 0x4d] => {
                Ok(ContainerFormat::Legacy { nanosecond: true })
            }
            [0x0a, 0x0d, 0x0d, 0x0a] => Ok(ContainerFormat::PcapNg),
            _ => Err(Error::format(
                format!(
                    "unknown capture magic 0x{:02x}{:02x}{:02x}{:02x}",
                    magic[0], magic[1], magic[2], magic[3]
                ),
                "header not recognized",
            )),
        }
    }
}

enum Container {
    Legacy(LegacyPcapReader<Cursor<Vec<u8>>>),
    Ng(PcapNGReader<Cursor<Vec<u8>>>),
}

/// Yields frames in on-disk order. The first error ends iteration.
pub struct CaptureReader {
    inner: Option<Container>,
    format: ContainerFormat,
    next_index: u64,
    link_type: u16,
    // pcapng: indexed by interface id
    interfaces: Vec<Interface>,
}

#[derive(Debug, Clone, Copy)]
struct Interface {
    link_type: u16,
    // timestamp units per second
    ts_resolution: u64,
    ts_offset: i64,
}

impl CaptureReader {
    /// Reads `source` to the end, then validates the global header.
    pub fn new<R: Read>(mut source: R) -> Result<Self> {
        let mut data = Vec::new();
        source.read_to_end(&mut data)?;
        Self::from_bytes(data)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::new(file)
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let format = ContainerFormat::detect(&data)?;
        debug!(?format, bytes = data.len(), "opening capture");

        // the whole input fits in the parse buffer, so a record still
        // incomplete after one refill is cut short
        let capacity = (data.len() + 1).max(MIN_BUFFER_SIZE);
        let cursor = Cursor::new(data);

        let inner = match format {
            ContainerFormat::Legacy { .. } => LegacyPcapReader::new(capacity, cursor)
                .map(Container::Legacy)
                .map_err(|e| Error::format("invalid pcap global header", e))?,
            ContainerFormat::PcapNg => PcapNGReader::new(capacity, cursor)
                .map(Container::Ng)
                .map_err(|e| Error::format("invalid pcapng section header", e))?,
        };

        Ok(CaptureReader {
            inner: Some(inner),
            format,
            next_index: 1,
            link_type: LINKTYPE_ETHERNET,
            interfaces: Vec::new(),
        })
    }

    pub fn format(&self) -> ContainerFormat {
        self.format
    }

    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        let outcome = match self.inner.as_mut() {
            Some(Container::Legacy(reader)) => read_legacy(
                reader,
                self.next_index,
                self.format,
                &mut self.link_type,
            ),
            Some(Container::Ng(reader)) => read_pcapng(
                reader,
                self.next_index,
                &mut self.link_type,
                &mut self.interfaces,
            ),
            None => return Ok(None),
        };

        match outcome {
            Ok(Some(frame)) => {
                self.next_index += 1;
                Ok(Some(frame))
            }
            other => {
                // done or failed: release the buffered input
                self.inner = None;
                other
            }
        }
    }
}

impl Iterator for CaptureReader {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame().transpose()
    }
}

/// Eagerly read every frame. Any container error discards what was read.
pub fn read_frames<R: Read>(source: R) -> Result<Vec<Frame>> {
    let frames = CaptureReader::new(source)?.collect::<Result<Vec<_>>>()?;
    debug!(frames = frames.len(), "capture read complete");
    Ok(frames)
}

fn read_legacy(
    reader: &mut LegacyPcapReader<Cursor<Vec<u8>>>,
    index: u64,
    format: ContainerFormat,
    link_type: &mut u16,
) -> Result<Option<Frame>> {
    let nanosecond = matches!(format, ContainerFormat::Legacy { nanosecond: true });
    let mut refilled = false;

    loop {
        match reader.next() {
            Ok((offset, block)) => match block {
                PcapBlockOwned::Legacy(packet) => {
                    let frac_per_sec = if nanosecond { 1_000_000_000 } else { 1_000_000 };
                    let frame = Frame {
                        index,
                        timestamp: timestamp(
                            u64::from(packet.ts_sec),
                            u64::from(packet.ts_usec),
                            frac_per_sec,
                        ),
                        link_type: *link_type,
                        original_len: packet.origlen,
                        data: packet.data.to_vec(),
                    };
                    reader.consume(offset);
                    return Ok(Some(frame));
                }
                PcapBlockOwned::LegacyHeader(header) => {
                    *link_type = header.network.0 as u16;
                    reader.consume(offset);
                }
                _ => reader.consume(offset),
            },
            Err(PcapError::Eof) => return Ok(None),
            Err(PcapError::Incomplete(_) | PcapError::BufferTooSmall) if !refilled => {
                refilled = true;
                reader
                    .refill()
                    .map_err(|e| Error::format("pcap refill failed", e.to_owned_vec()))?;
            }
            // the buffer holds the whole input, so a record that still does
            // not fit declares more bytes than remain
            Err(
                e @ (PcapError::Incomplete(_)
                | PcapError::BufferTooSmall
                | PcapError::UnexpectedEof),
            ) => return Err(Error::truncated(index, e.to_owned_vec())),
            Err(e) => {
                return Err(Error::format(
                    format!("malformed pcap record {index}"),
                    e.to_owned_vec(),
                ))
            }
        }
    }
}

fn read_pcapng(
    reader: &mut PcapNGReader<Cursor<Vec<u8>>>,
    index: u64,
    link_type: &mut u16,
    interfaces: &mut Vec<Interface>,
) -> Result<Option<Frame>> {
    let mut refilled = false;

    loop {
        match reader.next() {
            Ok((offset, block)) => match block {
                PcapBlockOwned::NG(Block::SectionHeader(_)) => {
                    // interface ids restart with every section
                    interfaces.clear();
                    reader.consume(offset);
                }
                PcapBlockOwned::NG(Block::InterfaceDescription(idb)) => {
                    let Some(ts_resolution) = idb.ts_resolution() else {
                        return Err(Error::format(
                            format!("invalid interface timestamp resolution before record {index}"),
                            format!("if_tsresol = {:#04x}", idb.if_tsresol),
                        ));
                    };
                    let interface = Interface {
                        link_type: idb.linktype.0 as u16,
                        ts_resolution,
                        ts_offset: idb.ts_offset(),
                    };
                    if interfaces.is_empty() {
                        *link_type = interface.link_type;
                    }
                    interfaces.push(interface);
                    reader.consume(offset);
                }
                PcapBlockOwned::NG(Block::EnhancedPacket(epb)) => {
                    let interface = interfaces.get(epb.if_id as usize).copied().unwrap_or(Interface {
                        link_type: *link_type,
                        ts_resolution: DEFAULT_TS_RESOLUTION,
                        ts_offset: 0,
                    });
                    let ts = (u64::from(epb.ts_high) << 32) | u64::from(epb.ts_low);
                    let frame = Frame {
                        index,
                        timestamp: timestamp(
                            (ts / interface.ts_resolution).saturating_add_signed(interface.ts_offset),
                            ts % interface.ts_resolution,
                            interface.ts_resolution,
                        ),
                        link_type: interface.link_type,
                        original_len: epb.origlen,
                        data: epb.data[..(epb.caplen as usize).min(epb.data.len())].to_vec(),
                    };
                    reader.consume(offset);
                    return Ok(Some(frame));
                }
                PcapBlockOwned::NG(Block::SimplePacket(spb)) => {
                    let captured = (spb.origlen as usize).min(spb.data.len());
                    let frame = Frame {
                        index,
                        // simple packet blocks carry no timestamp
                        timestamp: timestamp(0, 0, 1),
                        link_type: interfaces.first().map_or(*link_type, |i| i.link_type),
                        original_len: spb.origlen,
                        data: spb.data[..captured].to_vec(),
                    };
                    reader.consume(offset);
                    return Ok(Some(frame));
                }
                _ => reader.consume(offset),
            },
            Err(PcapError::Eof) => return Ok(None),
            Err(PcapError::Incomplete(_) | PcapError::BufferTooSmall) if !refilled => {
                refilled = true;
                reader
                    .refill()
                    .map_err(|e| Error::format("pcapng refill failed", e.to_owned_vec()))?;
            }
            Err(
                e @ (PcapError::Incomplete(_)
                | PcapError::BufferTooSmall
                | PcapError::UnexpectedEof),
            ) => return Err(Error::truncated(index, e.to_owned_vec())),
            Err(e) => {
                return Err(Error::format(
                    format!("malformed pcapng block before record {index}"),
                    e.to_owned_vec(),
                ))
            }
        }
    }
}

fn timestamp(secs: u64, frac: u64, frac_per_sec: u64) -> DateTime<Utc> {
    let secs = secs.saturating_add(frac / frac_per_sec);
    // widened so binary and sub-nanosecond resolutions do not overflow
    let nanos = u128::from(frac % frac_per_sec) * 1_000_000_000 / u128::from(frac_per_sec);
    DateTime::from_timestamp(secs as i64, nanos as u32).unwrap_or_default()
}
