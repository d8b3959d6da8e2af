use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

/// Counters describing the work a scan performed.
///
/// Handles are cheap to clone and share one set of counters, so the
/// window and the engine can record into the same instance.
#[derive(Debug, Clone)]
pub struct ScanMetrics {
    blocks_read: Arc<AtomicU64>,
    blocks_reused: Arc<AtomicU64>,
    bytes_read: Arc<AtomicU64>,
    probes: Arc<AtomicU64>,
    verifies: Arc<AtomicU64>,
    matches_found: Arc<AtomicU64>,
}

/// Point-in-time copy of the scan counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub blocks_read: u64,
    pub blocks_reused: u64,
    pub bytes_read: u64,
    pub probes: u64,
    pub verifies: u64,
    pub matches_found: u64,
}

impl ScanMetrics {
    pub fn new() -> Self {
        Self {
            blocks_read: Arc::new(AtomicU64::new(0)),
            blocks_reused: Arc::new(AtomicU64::new(0)),
            bytes_read: Arc::new(AtomicU64::new(0)),
            probes: Arc::new(AtomicU64::new(0)),
            verifies: Arc::new(AtomicU64::new(0)),
            matches_found: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Records one block filled from the source and how many bytes it holds
    pub fn record_block_read(&self, bytes: u64) {
        self.blocks_read.fetch_add(1, Ordering::Relaxed);
        self.bytes_read.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Records a block served from the window cache without a source read
    pub fn record_block_reuse(&self) {
        self.blocks_reused.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one forward probe of the stream
    pub fn record_probe(&self) {
        self.probes.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a full pattern comparison at a candidate offset
    pub fn record_verify(&self) {
        self.verifies.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a confirmed match
    pub fn record_match(&self) {
        self.matches_found.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics as a snapshot
    pub fn snapshot(&self) -> ScanStats {
        ScanStats {
            blocks_read: self.blocks_read.load(Ordering::Relaxed),
            blocks_reused: self.blocks_reused.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            probes: self.probes.load(Ordering::Relaxed),
            verifies: self.verifies.load(Ordering::Relaxed),
            matches_found: self.matches_found.load(Ordering::Relaxed),
        }
    }

    /// Log current metrics at info level
    pub fn log_stats(&self) {
        let stats = self.snapshot();
        info!(
            "Scan statistics:\n\
             Blocks read: {}\n\
             Blocks reused: {}\n\
             Bytes read: {}\n\
             Probes: {}\n\
             Verifies: {}\n\
             Matches found: {}",
            stats.blocks_read,
            stats.blocks_reused,
            stats.bytes_read,
            stats.probes,
            stats.verifies,
            stats.matches_found,
        );
    }
}

impl Default for ScanMetrics {
    fn default() -> Self {
        Self::new()
    }
}
