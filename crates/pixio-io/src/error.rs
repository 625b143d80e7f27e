//! Error types for image reading and writing.

use std::io;

use pixio_meta::MetaError;
use thiserror::Error;

/// I/O operation error.
#[derive(Debug, Error)]
pub enum IoError {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Format not recognised, or recognised but without a reader/writer.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Reader or writer has no entry point for this sample type.
    #[error("unsupported bit depth: {0}")]
    UnsupportedBitDepth(String),

    /// Reader or writer does not implement the operation.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Required data (usually fileInfo metadata) is absent.
    #[error("missing data: {0}")]
    MissingData(String),

    /// Invalid or truncated file.
    #[error("invalid file: {0}")]
    InvalidFile(String),

    /// Codec failed to decode.
    #[error("decode error: {0}")]
    DecodeError(String),

    /// Codec failed to encode.
    #[error("encode error: {0}")]
    EncodeError(String),

    /// Image model error.
    #[error(transparent)]
    Core(#[from] pixio_core::Error),

    /// Metadata error.
    #[error(transparent)]
    Meta(#[from] MetaError),
}

impl IoError {
    pub(crate) fn decode(e: impl std::fmt::Display) -> Self {
        Self::DecodeError(e.to_string())
    }

    pub(crate) fn encode(e: impl std::fmt::Display) -> Self {
        Self::EncodeError(e.to_string())
    }
}

/// Result type for I/O operations.
pub type IoResult<T> = Result<T, IoError>;
