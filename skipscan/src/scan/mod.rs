//! Streaming skip search for a fixed byte pattern.
//!
//! The scanner works through arbitrarily large inputs while holding only
//! two fixed-size blocks in memory. It rests on three parts:
//!
//! - [`window::BlockWindow`] streams the source into a two-block window
//!   and serves relative reads, including short rewinds into the
//!   previous block and reads that straddle a block boundary.
//! - [`pattern::PatternTable`] classifies every byte value against the
//!   pattern and maps the bytes of its longest pairwise-distinct run to
//!   their pattern positions.
//! - [`engine`] drives probes over the window: most of the time it
//!   strides a full pattern length per one-byte probe, rewinding to
//!   verify a candidate only when the probed byte narrows the pattern's
//!   alignment down to a single possibility.
//!
//! On typical data the engine touches a small fraction of the input
//! bytes, and the window guarantees each block is read from the source
//! exactly once no matter how often the cursor crosses its edges.

pub mod engine;
pub mod pattern;
pub mod window;

pub use engine::{scan, scan_with_progress};
pub use pattern::{ByteClass, PatternTable};
pub use window::{BlockWindow, ReadStatus, DEFAULT_BLOCK_CAPACITY};
