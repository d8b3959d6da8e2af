//! Scan driver.
//!
//! The engine alternates between two states. In the align state the byte
//! under the cursor is looked up in the unique-run map; a hit names the
//! only alignment of the pattern that could place that byte here, so the
//! engine rewinds to it and compares once. In the fast state the cursor
//! strides a whole pattern length per probe and classifies the single
//! byte it lands on: a byte absent from the pattern rules out every
//! alignment touching it, a unique byte is verified directly, and a
//! repeated byte sends the engine back to the align state.
//!
//! Probes read exactly one byte. Full pattern-length reads happen only
//! when a candidate offset is verified, so a probe never drags the
//! window forward past data a following rewind still needs.

use std::io::Read;
use std::time::Instant;

use tracing::{debug, trace};

use crate::config::ScanConfig;
use crate::errors::{ScanError, ScanResult};
use crate::metrics::ScanMetrics;
use crate::progress::ScanProgress;
use crate::results::{Match, MatchSink, ScanSummary, PREVIEW_LIMIT};

use super::pattern::{ByteClass, PatternTable};
use super::window::{BlockWindow, ReadStatus};

/// Probes between progress position updates
const PROGRESS_PROBE_INTERVAL: u64 = 1000;

/// Scans `source` for `pattern` and feeds every match to `sink`.
///
/// Returns once the source is exhausted. The summary counts matches and
/// the work it took to find them.
pub fn scan<R, S>(
    source: R,
    pattern: &[u8],
    config: &ScanConfig,
    sink: &mut S,
) -> ScanResult<ScanSummary>
where
    R: Read,
    S: MatchSink,
{
    scan_with_progress(source, pattern, config, sink, &ScanProgress::hidden())
}

/// Like [`scan`], reporting the cursor position through `progress` as the
/// scan moves.
pub fn scan_with_progress<R, S>(
    source: R,
    pattern: &[u8],
    config: &ScanConfig,
    sink: &mut S,
    progress: &ScanProgress,
) -> ScanResult<ScanSummary>
where
    R: Read,
    S: MatchSink,
{
    config.validate()?;
    let started = Instant::now();
    let table = PatternTable::build(pattern)?;

    // Worst case the engine rewinds from a probe to the unique run and
    // from there to the start of a candidate; all of it must still be
    // resident in the window.
    let reach = table.len() + table.unique_run().start - 1;
    if reach > config.block_size {
        return Err(ScanError::invalid_pattern(format!(
            "pattern needs {} bytes of rewind reach but blocks hold {} bytes; raise block_size",
            reach, config.block_size
        )));
    }

    debug!(
        pattern_len = table.len(),
        run_start = table.unique_run().start,
        run_len = table.unique_run().len(),
        block_size = config.block_size,
        "scan starting"
    );

    let metrics = ScanMetrics::new();
    let window = BlockWindow::with_metrics(source, config.block_size, metrics.clone());
    let mut driver = Driver {
        window,
        table: &table,
        sink,
        progress,
        metrics: metrics.clone(),
        chunk: vec![0; table.len()],
        offset: 0,
        probes: 0,
    };
    driver.run()?;
    progress.update(driver.offset);

    let stats = metrics.snapshot();
    metrics.log_stats();
    Ok(ScanSummary {
        total_matches: stats.matches_found,
        bytes_read: stats.bytes_read,
        blocks_read: stats.blocks_read,
        probes: stats.probes,
        elapsed: started.elapsed(),
    })
}

/// Outcome of verifying one candidate offset
enum Candidate {
    /// Full comparison succeeded and the match went to the sink
    Matched,
    /// Full comparison failed
    Missed,
    /// Too few bytes remain for a whole pattern here or anywhere later
    Exhausted,
}

struct Driver<'a, R, S> {
    window: BlockWindow<R>,
    table: &'a PatternTable,
    sink: &'a mut S,
    progress: &'a ScanProgress,
    metrics: ScanMetrics,
    /// Pattern-length scratch; probes fill only its first byte
    chunk: Vec<u8>,
    /// Absolute stream offset of the byte under the cursor
    offset: u64,
    probes: u64,
}

impl<R: Read, S: MatchSink> Driver<'_, R, S> {
    /// Drives the scan to end of stream. `Ok` means the source was
    /// exhausted cleanly; matches were delivered through the sink.
    fn run(&mut self) -> ScanResult<()> {
        // The first probe sits at the start of the unique run, so an
        // occurrence at offset zero is still reachable by the align
        // rewind.
        let anchor = self.table.unique_run().start;
        if !self.probe_forward(anchor)? {
            debug!("stream ended before the first probe");
            return Ok(());
        }

        loop {
            // Align state: a unique-run byte admits exactly one pattern
            // alignment, `idx` back from the cursor.
            let mut correction = 0;
            if let Some(idx) = self.table.run_anchor(self.chunk[0]) {
                if idx as u64 <= self.offset {
                    match self.verify_candidate(idx)? {
                        Candidate::Exhausted => return Ok(()),
                        Candidate::Matched | Candidate::Missed => correction = idx,
                    }
                }
            }

            // Fast state: stride one pattern length per probe, stretched
            // by whatever the align rewind took back.
            loop {
                if !self.probe_forward(self.table.len() + correction)? {
                    return Ok(());
                }
                correction = 0;
                match self.table.classify(self.chunk[0]) {
                    ByteClass::Absent => {}
                    ByteClass::NotUnique => {
                        // A repeated byte pins nothing down. Step back to
                        // where the unique run would sit if a match ended
                        // at this probe, and re-anchor from there.
                        let back = self.table.len() - self.table.unique_run().len();
                        self.step_back(back)?;
                        break;
                    }
                    ByteClass::At(idx) => match self.verify_candidate(idx)? {
                        Candidate::Matched => {}
                        Candidate::Missed => correction = idx,
                        Candidate::Exhausted => return Ok(()),
                    },
                }
            }
        }
    }

    /// Moves the cursor forward by `by` bytes and reads the byte there.
    /// Returns false when the stream is exhausted, ending the scan.
    fn probe_forward(&mut self, by: usize) -> ScanResult<bool> {
        match self.window.read_at(by as isize, &mut self.chunk[..1]) {
            Ok(_) => {
                self.offset += by as u64;
                self.probes += 1;
                self.metrics.record_probe();
                if self.probes % PROGRESS_PROBE_INTERVAL == 0 {
                    self.progress.update(self.offset);
                }
                Ok(true)
            }
            Err(ScanError::EndOfStream) => {
                trace!(offset = self.offset, probes = self.probes, "source exhausted");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Moves the cursor back by `by` bytes and reads the byte there
    fn step_back(&mut self, by: usize) -> ScanResult<()> {
        debug_assert!(by as u64 <= self.offset);
        self.window.read_at(-(by as isize), &mut self.chunk[..1])?;
        self.offset -= by as u64;
        Ok(())
    }

    /// Rewinds `idx` bytes to a candidate start and compares a full
    /// pattern length. Only a complete read counts; a partial one proves
    /// that no occurrence fits here or at any later offset.
    fn verify_candidate(&mut self, idx: usize) -> ScanResult<Candidate> {
        debug_assert!(idx as u64 <= self.offset);
        let status = self.window.read_at(-(idx as isize), &mut self.chunk)?;
        self.offset -= idx as u64;
        match status {
            ReadStatus::Partial(_) => Ok(Candidate::Exhausted),
            ReadStatus::Complete => {
                self.metrics.record_verify();
                if self.chunk == self.table.pattern() {
                    self.emit()?;
                    Ok(Candidate::Matched)
                } else {
                    Ok(Candidate::Missed)
                }
            }
        }
    }

    /// Reports the match at the current offset, previewing what the
    /// current block holds from here
    fn emit(&mut self) -> ScanResult<()> {
        let preview = self.window.preview(PREVIEW_LIMIT).to_vec();
        trace!(offset = self.offset, "match");
        self.metrics.record_match();
        self.sink.on_match(&Match::new(self.offset, preview))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::PathBuf;

    fn test_config(block_size: usize) -> ScanConfig {
        ScanConfig {
            pattern: String::new(),
            input_path: PathBuf::new(),
            block_size,
            progress: false,
            log_level: "warn".to_string(),
        }
    }

    fn run_scan_with_block(
        data: &[u8],
        pattern: &[u8],
        block_size: usize,
    ) -> (Vec<Match>, ScanSummary) {
        let config = test_config(block_size);
        let mut matches = Vec::new();
        let summary = scan(Cursor::new(data.to_vec()), pattern, &config, &mut matches).unwrap();
        (matches, summary)
    }

    fn run_scan(data: &[u8], pattern: &[u8]) -> (Vec<Match>, ScanSummary) {
        run_scan_with_block(data, pattern, 4096)
    }

    #[test]
    fn test_single_match_with_preview() {
        let (matches, summary) = run_scan(b"xxabcyyy", b"abc");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].offset, 2);
        assert_eq!(matches[0].preview, b"abcyyy");
        assert_eq!(summary.total_matches, 1);
    }

    #[test]
    fn test_matches_reported_in_increasing_order() {
        let (matches, _) = run_scan(b"xxabcxxabcxx", b"abc");
        let offsets: Vec<u64> = matches.iter().map(|m| m.offset).collect();
        assert_eq!(offsets, vec![2, 7]);
        assert_eq!(matches[0].preview, b"abcxxabcxx");
        assert_eq!(matches[1].preview, b"abcxx");
    }

    #[test]
    fn test_match_at_offset_zero() {
        let (matches, _) = run_scan(b"abcxx", b"abc");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].offset, 0);
    }

    #[test]
    fn test_match_at_very_end_of_stream() {
        let (matches, _) = run_scan(b"xxxxabc", b"abc");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].offset, 4);
        assert_eq!(matches[0].preview, b"abc");
    }

    #[test]
    fn test_overlapping_occurrences_all_found() {
        let (matches, _) = run_scan(b"aaaa", b"aa");
        let offsets: Vec<u64> = matches.iter().map(|m| m.offset).collect();
        assert_eq!(offsets, vec![0, 1, 2]);
    }

    #[test]
    fn test_overlap_with_unique_byte() {
        let (matches, _) = run_scan(b"ababa", b"aba");
        let offsets: Vec<u64> = matches.iter().map(|m| m.offset).collect();
        assert_eq!(offsets, vec![0, 2]);
    }

    #[test]
    fn test_no_match_ends_cleanly() {
        let data = vec![b'x'; 500];
        let (matches, summary) = run_scan(&data, b"NEEDLE");
        assert!(matches.is_empty());
        assert_eq!(summary.total_matches, 0);
        assert_eq!(summary.bytes_read, 500);

        // Every probe byte was absent from the pattern, so the engine
        // strides a whole pattern length from the first probe at the
        // unique-run start: probes at 2, 8, ..., 494.
        assert_eq!(summary.probes, 83);
    }

    #[test]
    fn test_match_straddling_block_boundary() {
        let (matches, _) = run_scan_with_block(b"xyabcabqrs", b"abcab", 4);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].offset, 2);
        // The preview stops at the edge of the block the match starts in.
        assert_eq!(matches[0].preview, b"ab");
    }

    #[test]
    fn test_all_occurrences_across_many_blocks() {
        // Ten occurrences spaced so several straddle 16-byte boundaries.
        let mut data = Vec::new();
        let mut expected = Vec::new();
        for i in 0..10 {
            data.extend_from_slice(&vec![b'-'; 3 + i]);
            expected.push(data.len() as u64);
            data.extend_from_slice(b"needle");
        }
        let (matches, _) = run_scan_with_block(&data, b"needle", 16);
        let offsets: Vec<u64> = matches.iter().map(|m| m.offset).collect();
        assert_eq!(offsets, expected);
    }

    #[test]
    fn test_stream_shorter_than_pattern() {
        let (matches, summary) = run_scan(b"ab", b"abc");
        assert!(matches.is_empty());
        assert_eq!(summary.total_matches, 0);
    }

    #[test]
    fn test_empty_stream() {
        let (matches, summary) = run_scan(b"", b"abc");
        assert!(matches.is_empty());
        assert_eq!(summary.bytes_read, 0);
    }

    #[test]
    fn test_pattern_equal_to_whole_stream() {
        let (matches, _) = run_scan(b"abcab", b"abcab");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].offset, 0);
    }

    #[test]
    fn test_repeated_byte_pattern_near_end() {
        // The trailing 'Z's force align rewinds right at the stream tail.
        let mut data = vec![b'.'; 37];
        data.extend_from_slice(b"ZZZ");
        let (matches, _) = run_scan(&data, b"ZZZ");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].offset, 37);
    }

    #[test]
    fn test_no_false_match_from_stale_tail() {
        // The candidate at offset 1 cannot be fully read; it must be
        // dropped rather than compared against stale scratch bytes.
        let (matches, _) = run_scan(b"xxab", b"aba");
        assert!(matches.is_empty());
    }

    #[test]
    fn test_tail_candidate_still_verified() {
        let (matches, _) = run_scan(b"xxaba", b"aba");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].offset, 2);
    }

    #[test]
    fn test_pattern_too_long_for_block_rejected() {
        let config = test_config(4);
        let mut matches = Vec::new();
        // Reach is len + run_start - 1 = 5 + 1 - 1 = 5 > 4.
        let err = scan(
            Cursor::new(b"whatever".to_vec()),
            b"aabcd",
            &config,
            &mut matches,
        )
        .unwrap_err();
        assert!(matches!(err, ScanError::InvalidPattern(_)));
    }

    #[test]
    fn test_empty_pattern_rejected() {
        let config = test_config(4096);
        let mut matches = Vec::new();
        let err = scan(Cursor::new(b"data".to_vec()), b"", &config, &mut matches).unwrap_err();
        assert!(matches!(err, ScanError::InvalidPattern(_)));
    }

    #[test]
    fn test_zero_block_size_rejected() {
        let config = test_config(0);
        let mut matches = Vec::new();
        let err = scan(Cursor::new(b"data".to_vec()), b"ab", &config, &mut matches).unwrap_err();
        assert!(matches!(err, ScanError::ConfigError(_)));
    }

    #[test]
    fn test_sink_error_stops_scan() {
        struct FailingSink;
        impl MatchSink for FailingSink {
            fn on_match(&mut self, _: &Match) -> ScanResult<()> {
                Err(ScanError::config_error("sink refused the match"))
            }
        }

        let config = test_config(4096);
        let err = scan(
            Cursor::new(b"xxabcxx".to_vec()),
            b"abc",
            &config,
            &mut FailingSink,
        )
        .unwrap_err();
        assert!(matches!(err, ScanError::ConfigError(_)));
    }

    #[test]
    fn test_binary_pattern_with_nul_bytes() {
        let pattern = [0x00, 0xff, 0x00, 0x7f];
        let mut data = vec![0xaa; 21];
        data.extend_from_slice(&pattern);
        data.extend_from_slice(&[0xaa; 9]);
        let (matches, _) = run_scan_with_block(&data, &pattern, 8);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].offset, 21);
    }
}
