//! Skip tables precomputed from the search pattern.
//!
//! Two lookups drive the scan. The full map classifies every byte value
//! against the whole pattern and decides how far the next probe may jump.
//! The run map covers only the longest run of pairwise-distinct bytes
//! inside the pattern; a byte from that run pins down exactly one
//! plausible alignment of the pattern under the cursor, which is what
//! makes re-synchronisation after a collision cheap.

use std::ops::Range;

use crate::errors::{ScanError, ScanResult};

/// Where a byte value sits in the pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteClass {
    /// The byte does not occur in the pattern
    Absent,
    /// The byte occurs more than once
    NotUnique,
    /// The byte occurs exactly once, at this index
    At(usize),
}

/// Immutable lookup tables for one pattern
#[derive(Debug, Clone)]
pub struct PatternTable {
    pattern: Vec<u8>,
    full_map: [ByteClass; 256],
    run: Range<usize>,
    run_map: [Option<usize>; 256],
}

impl PatternTable {
    /// Builds the tables. Fails on an empty pattern, which has no
    /// meaningful occurrence.
    pub fn build(pattern: &[u8]) -> ScanResult<Self> {
        if pattern.is_empty() {
            return Err(ScanError::invalid_pattern("pattern must not be empty"));
        }

        let mut full_map = [ByteClass::Absent; 256];
        for (i, &byte) in pattern.iter().enumerate() {
            full_map[byte as usize] = match full_map[byte as usize] {
                ByteClass::Absent => ByteClass::At(i),
                _ => ByteClass::NotUnique,
            };
        }

        let run = longest_unique_run(pattern);

        let mut run_map = [None; 256];
        for i in run.clone() {
            run_map[pattern[i] as usize] = Some(i);
        }

        Ok(Self {
            pattern: pattern.to_vec(),
            full_map,
            run,
            run_map,
        })
    }

    pub fn pattern(&self) -> &[u8] {
        &self.pattern
    }

    pub fn len(&self) -> usize {
        self.pattern.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pattern.is_empty()
    }

    /// Longest run of pairwise-distinct bytes, as pattern indices. Ties
    /// go to the earliest run.
    pub fn unique_run(&self) -> Range<usize> {
        self.run.clone()
    }

    /// Classifies a byte against the whole pattern
    pub fn classify(&self, byte: u8) -> ByteClass {
        self.full_map[byte as usize]
    }

    /// Pattern index of `byte` if it belongs to the unique run
    pub fn run_anchor(&self, byte: u8) -> Option<usize> {
        self.run_map[byte as usize]
    }
}

/// Finds the longest contiguous span of pairwise-distinct bytes. Stops
/// early once no later start could beat the best span found so far.
fn longest_unique_run(pattern: &[u8]) -> Range<usize> {
    let mut best = 0..0;
    for start in 0..pattern.len() {
        if best.len() >= pattern.len() - start {
            break;
        }
        let mut seen = [false; 256];
        let mut end = start;
        while end < pattern.len() && !seen[pattern[end] as usize] {
            seen[pattern[end] as usize] = true;
            end += 1;
        }
        if end - start > best.len() {
            best = start..end;
        }
    }
    best
}
