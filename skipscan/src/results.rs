use std::time::Duration;

use crate::errors::ScanResult;

/// Maximum number of preview bytes captured with a match. The report
/// layer appends a truncation marker whether or not the preview was cut.
pub const PREVIEW_LIMIT: usize = 64;

/// A single occurrence of the pattern in the scanned stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Absolute offset of the first pattern byte, from the start of the stream
    pub offset: u64,
    /// Up to [`PREVIEW_LIMIT`] bytes starting at `offset`. The preview is
    /// confined to the window block the match starts in, so it can be
    /// shorter than the limit even far from end of stream.
    pub preview: Vec<u8>,
}

impl Match {
    pub fn new(offset: u64, preview: Vec<u8>) -> Self {
        Self { offset, preview }
    }
}

/// Aggregate outcome of a completed scan
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    /// Number of confirmed matches
    pub total_matches: u64,
    /// Bytes filled into window blocks from the source
    pub bytes_read: u64,
    /// Blocks filled from the source
    pub blocks_read: u64,
    /// Forward probes taken by the engine
    pub probes: u64,
    /// Wall-clock duration of the scan
    pub elapsed: Duration,
}

/// Consumer of match events.
///
/// The engine reports matches in strictly increasing offset order and
/// stops the scan if the sink returns an error.
pub trait MatchSink {
    fn on_match(&mut self, matched: &Match) -> ScanResult<()>;
}

/// Collecting sink, mostly for tests and library callers
impl MatchSink for Vec<Match> {
    fn on_match(&mut self, matched: &Match) -> ScanResult<()> {
        self.push(matched.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_creation() {
        let m = Match::new(42, b"needle and what follows".to_vec());
        assert_eq!(m.offset, 42);
        assert_eq!(m.preview, b"needle and what follows");
    }

    #[test]
    fn test_vec_sink_collects_in_order() {
        let mut sink: Vec<Match> = Vec::new();
        sink.on_match(&Match::new(3, b"abc".to_vec())).unwrap();
        sink.on_match(&Match::new(9, b"abcxyz".to_vec())).unwrap();

        assert_eq!(sink.len(), 2);
        assert_eq!(sink[0].offset, 3);
        assert_eq!(sink[1].offset, 9);
        assert!(sink.windows(2).all(|w| w[0].offset < w[1].offset));
    }

    #[test]
    fn test_summary_default() {
        let summary = ScanSummary::default();
        assert_eq!(summary.total_matches, 0);
        assert_eq!(summary.bytes_read, 0);
        assert_eq!(summary.elapsed, Duration::ZERO);
    }
}
