pub mod config;
pub mod errors;
pub mod metrics;
pub mod progress;
pub mod report;
pub mod results;
pub mod scan;

pub use config::ScanConfig;
pub use errors::{ScanError, ScanResult};
pub use metrics::{ScanMetrics, ScanStats};
pub use report::ReportWriter;
pub use results::{Match, MatchSink, ScanSummary, PREVIEW_LIMIT};
pub use scan::{scan, scan_with_progress, DEFAULT_BLOCK_CAPACITY};
