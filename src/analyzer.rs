use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::capture::read_frames;
use crate::config::AnalysisConfig;
use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::models::domain::Frame;
use crate::models::dto::AnalysisResult;
use crate::parser::decode_frame;
use crate::stats::NetworkStats;

/// Decodes frames and folds them into an [`AnalysisResult`].
///
/// Holds configuration only; every call to [`analyze`](Self::analyze) starts
/// from empty counters, so one analyzer can be cloned across threads.
#[derive(Debug, Clone, Default)]
pub struct PacketAnalyzer {
    config: AnalysisConfig,
    running: Option<Arc<AtomicBool>>,
}

impl PacketAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            running: None,
        }
    }

    /// Abandon the pass (with [`Error::Cancelled`]) once `running` is cleared.
    /// Checked before each frame.
    pub fn with_cancel(mut self, running: Arc<AtomicBool>) -> Self {
        self.running = Some(running);
        self
    }

    pub fn analyze<'a, I>(&self, frames: I, filter: Option<&Filter>) -> Result<AnalysisResult>
    where
        I: IntoIterator<Item = &'a Frame>,
    {
        let mut stats = NetworkStats::new();
        let mut processed = 0u64;

        for frame in frames {
            if !self.is_running() {
                debug!(processed, "analysis cancelled");
                return Err(Error::Cancelled { processed });
            }
            processed += 1;

            let layers = decode_frame(frame, &self.config);
            if let Some(filter) = filter {
                if !filter.matches(&layers) {
                    continue;
                }
            }
            stats.update(frame, &layers);
        }

        debug!(
            processed,
            counted = stats.total_packets(),
            filtered = filter.is_some_and(|f| !f.is_empty()),
            "analysis complete"
        );
        Ok(stats.finish(self.config.top_n))
    }

    /// Read the whole container, then analyze it.
    pub fn analyze_capture<R: Read>(&self, source: R, filter: Option<&Filter>) -> Result<AnalysisResult> {
        let frames = read_frames(source)?;
        self.analyze(&frames, filter)
    }

    pub fn analyze_file<P: AsRef<Path>>(&self, path: P, filter: Option<&Filter>) -> Result<AnalysisResult> {
        let path = path.as_ref();
        debug!(path = %path.display(), "analyzing capture file");
        let file = std::fs::File::open(path)?;
        self.analyze_capture(file, filter)
    }

    fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .map_or(true, |running| running.load(Ordering::SeqCst))
    }
}
