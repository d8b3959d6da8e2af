use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for scan operations
pub type ScanResult<T> = Result<T, ScanError>;

/// Errors that can occur while preparing or running a scan
#[derive(Error, Debug)]
pub enum ScanError {
    /// File or directory not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Permission denied when accessing file
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Invalid search pattern
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The source had no further block to read
    #[error("End of stream: no further block to read")]
    EndOfStream,

    /// A relative read reached outside the two resident blocks
    #[error("Relative offset {offset} is outside the two-block window")]
    OutOfWindow { offset: isize },

    /// A read region too large to ever be served from two resident blocks
    #[error("Region of {len} bytes exceeds what {capacity}-byte window blocks can serve")]
    RegionTooLarge { len: usize, capacity: usize },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ScanError {
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        ScanError::FileNotFound(path.into())
    }

    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        ScanError::PermissionDenied(path.into())
    }

    pub fn invalid_pattern(msg: impl Into<String>) -> Self {
        ScanError::InvalidPattern(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        ScanError::ConfigError(msg.into())
    }

    /// Maps an error from opening a source file to a path-aware variant
    /// where the kind allows it.
    pub fn open_error(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => ScanError::FileNotFound(path.into()),
            std::io::ErrorKind::PermissionDenied => ScanError::PermissionDenied(path.into()),
            _ => ScanError::IoError(error),
        }
    }
}
