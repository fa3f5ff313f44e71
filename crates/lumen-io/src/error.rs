//! Error types for preset and config-export I/O.

/// Result type alias for I/O operations.
pub type Result<T> = std::result::Result<T, IoError>;

/// Error type for preset-store and exporter operations.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Core-side failure while assembling export data
    #[error(transparent)]
    Core(#[from] lumen_core::LumenError),
}
