use skyline_core::id::RecordId;
use thiserror::Error;

/// Result type local to skyline-heap.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("relation '{0}' not found")]
    RelationNotFound(String),

    #[error("relation '{0}' already exists")]
    RelationExists(String),

    #[error("invalid relation name '{0}'")]
    InvalidName(String),

    #[error("no live record at {0}")]
    InvalidRecord(RecordId),

    #[error("scan is closed")]
    ScanClosed,

    #[error("unsupported codec: {0}")]
    CodecUnsupported(&'static str),

    #[error("codec error: {0}")]
    Codec(String),

    #[error("checksum mismatch in {0}")]
    ChecksumMismatch(String),

    #[error("manifest error: {0}")]
    Manifest(#[from] serde_json::Error),
}
