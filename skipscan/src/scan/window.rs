//! Two-block sliding window over a byte stream.
//!
//! The scanner never holds more than two fixed-size blocks of the source
//! in memory: the block the cursor sits in and one neighbor. Forward
//! probes stream new blocks in on demand, and short backward rewinds
//! re-enter the previous block as long as it is still resident.
//!
//! Invariants:
//! - `cursor` addresses the current block and stays within `[0, filled)`
//!   between calls; it is only transiently out of range inside `read_at`.
//! - Block sequence numbers increase by one per source fill. A neighbor
//!   that already carries the wanted number is reused without a read, so
//!   a region read that crosses into the next block does not force a
//!   re-read when the cursor later advances into it.
//! - A rewind that reaches outside the two resident blocks fails with
//!   `OutOfWindow` and leaves the window exactly as it was.
//!
//! Edge cases worth knowing: a region that spans the block boundary is
//! served from both blocks while the logical position stays in the block
//! the region starts in; a source that ends mid-region yields
//! `ReadStatus::Partial` with the count of leading bytes that are valid;
//! a probe that starts at or past end of stream fails with `EndOfStream`.

use std::io::Read;

use tracing::trace;

use crate::errors::{ScanError, ScanResult};
use crate::metrics::ScanMetrics;

/// Default capacity of one window block (two blocks stay resident)
pub const DEFAULT_BLOCK_CAPACITY: usize = 1024 * 1024;

/// Outcome of a successful [`BlockWindow::read_at`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// The whole output buffer was filled
    Complete,
    /// The stream ended inside the region; only this many leading bytes
    /// of the output buffer are valid
    Partial(usize),
}

/// Which of the two resident blocks the cursor sits in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    A,
    B,
}

impl Side {
    fn flip(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    fn index(self) -> usize {
        match self {
            Side::A => 0,
            Side::B => 1,
        }
    }
}

/// One resident block of the source
#[derive(Debug)]
struct Block {
    buf: Vec<u8>,
    /// Valid bytes at the front of `buf`
    filled: usize,
    /// Position of this block in the stream, `None` until first filled
    sequence: Option<u64>,
    /// True once it is known that no block follows this one
    is_final: bool,
}

impl Block {
    fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0; capacity],
            filled: 0,
            sequence: None,
            is_final: false,
        }
    }
}

/// Sliding window holding two blocks of the source
pub struct BlockWindow<R> {
    source: R,
    blocks: [Block; 2],
    current: Side,
    /// Sequence number of the current block, `None` before the first fill
    seq: Option<u64>,
    /// Signed cursor into the current block
    cursor: isize,
    metrics: ScanMetrics,
}

impl<R: Read> BlockWindow<R> {
    pub fn new(source: R, capacity: usize) -> Self {
        Self::with_metrics(source, capacity, ScanMetrics::new())
    }

    /// Creates a window that records block reads into shared metrics
    pub fn with_metrics(source: R, capacity: usize, metrics: ScanMetrics) -> Self {
        Self {
            source,
            blocks: [Block::new(capacity), Block::new(capacity)],
            current: Side::A,
            seq: None,
            cursor: 0,
            metrics,
        }
    }

    pub fn capacity(&self) -> usize {
        self.blocks[0].buf.len()
    }

    pub fn metrics(&self) -> &ScanMetrics {
        &self.metrics
    }

    /// Makes the next block current, filling it from the source unless the
    /// neighbor slot already holds it. Fails with `EndOfStream` when the
    /// source has nothing left, leaving the window unchanged.
    fn advance(&mut self) -> ScanResult<()> {
        let next = self.seq.map_or(0, |s| s + 1);
        self.current = self.current.flip();
        let slot = &mut self.blocks[self.current.index()];
        if slot.sequence == Some(next) {
            self.metrics.record_block_reuse();
        } else {
            match fill_block(&mut self.source, &mut slot.buf) {
                Ok(0) => {
                    self.current = self.current.flip();
                    return Err(ScanError::EndOfStream);
                }
                Ok(filled) => {
                    slot.filled = filled;
                    slot.sequence = Some(next);
                    slot.is_final = filled < slot.buf.len();
                    self.metrics.record_block_read(filled as u64);
                    trace!(
                        sequence = next,
                        filled,
                        is_final = slot.is_final,
                        "filled window block"
                    );
                }
                Err(e) => {
                    self.current = self.current.flip();
                    return Err(ScanError::IoError(e));
                }
            }
        }
        self.seq = Some(next);
        Ok(())
    }

    /// Moves the cursor by `offset` bytes and reads `out.len()` bytes from
    /// the new position. The cursor is left at the start of the region, so
    /// a later relative move is measured from there.
    ///
    /// `out` may be at most one block plus one byte long; anything larger
    /// could span three blocks, which the window cannot hold, and fails
    /// with `RegionTooLarge` before the cursor moves.
    ///
    /// A forward move that reaches past the end of the stream fails with
    /// `EndOfStream` and leaves the logical position at `start + offset`,
    /// past the last byte: reading there again fails the same way, while
    /// backward moves measured from that position still reach whatever
    /// the two blocks retain. Blocks streamed through on the way stay
    /// consumed.
    pub fn read_at(&mut self, offset: isize, out: &mut [u8]) -> ScanResult<ReadStatus> {
        if out.len() > self.capacity() + 1 {
            return Err(ScanError::RegionTooLarge {
                len: out.len(),
                capacity: self.capacity(),
            });
        }
        let start = self.cursor;
        self.cursor += offset;

        // Backward moves can re-enter the previous block, never more.
        if self.cursor < 0 {
            let prior = match self.seq {
                Some(s) if s > 0 => s - 1,
                _ => {
                    self.cursor = start;
                    return Err(ScanError::OutOfWindow { offset });
                }
            };
            let back = self.current.flip();
            let slot = &self.blocks[back.index()];
            let rebased = self.cursor + slot.filled as isize;
            if slot.sequence != Some(prior) || rebased < 0 {
                self.cursor = start;
                return Err(ScanError::OutOfWindow { offset });
            }
            self.current = back;
            self.seq = Some(prior);
            self.cursor = rebased;
        }

        // Forward moves may outrun the current block, or even skip whole
        // blocks when the stride exceeds the capacity.
        while self.cursor >= self.blocks[self.current.index()].filled as isize {
            let filled = self.blocks[self.current.index()].filled as isize;
            self.cursor -= filled;
            if let Err(e) = self.advance() {
                self.cursor += filled;
                return Err(e);
            }
        }

        let cursor = self.cursor as usize;
        let block = &self.blocks[self.current.index()];
        let first = out.len().min(block.filled - cursor);
        out[..first].copy_from_slice(&block.buf[cursor..cursor + first]);
        if first == out.len() {
            return Ok(ReadStatus::Complete);
        }
        if block.is_final {
            return Ok(ReadStatus::Partial(first));
        }

        // The region continues into the next block. Fetch it, copy the
        // tail, then step back so the logical position stays at the start
        // of the region.
        match self.advance() {
            Ok(()) => {}
            Err(ScanError::EndOfStream) => {
                // The stream ended exactly on the block boundary.
                self.blocks[self.current.index()].is_final = true;
                return Ok(ReadStatus::Partial(first));
            }
            Err(e) => return Err(e),
        }
        let next = &self.blocks[self.current.index()];
        let rest = (out.len() - first).min(next.filled);
        out[first..first + rest].copy_from_slice(&next.buf[..rest]);
        self.current = self.current.flip();
        self.seq = self.seq.map(|s| s - 1);
        if first + rest < out.len() {
            Ok(ReadStatus::Partial(first + rest))
        } else {
            Ok(ReadStatus::Complete)
        }
    }

    /// Bytes visible at the cursor, confined to the current block and at
    /// most `max` long
    pub fn preview(&self, max: usize) -> &[u8] {
        let block = &self.blocks[self.current.index()];
        let cursor = (self.cursor.max(0) as usize).min(block.filled);
        let end = block.filled.min(cursor + max);
        &block.buf[cursor..end]
    }
}

/// Reads until `buf` is full or the source reports end of stream
fn fill_block<R: Read>(source: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
