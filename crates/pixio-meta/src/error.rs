//! Error types for metadata operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Metadata error.
#[derive(Debug, Error)]
pub enum MetaError {
    /// Two structures that must agree in shape do not.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Sidecar file could not be read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// Image model error other than a shape mismatch.
    #[error(transparent)]
    Core(pixio_core::Error),

    /// Sidecar file content is not valid metadata.
    #[error("cannot parse metadata file {path}: {message}")]
    Parse {
        /// File involved
        path: PathBuf,
        /// Parser message
        message: String,
    },
}

impl MetaError {
    /// Creates a [`MetaError::Io`] error.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<pixio_core::Error> for MetaError {
    fn from(err: pixio_core::Error) -> Self {
        match err {
            pixio_core::Error::ShapeMismatch(msg) => Self::ShapeMismatch(msg),
            other => Self::Core(other),
        }
    }
}

/// Result type for metadata operations.
pub type MetaResult<T> = Result<T, MetaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_kept() {
        let err: MetaError = pixio_core::Error::shape_mismatch("gains", (2, 2), (3, 3)).into();
        assert!(matches!(err, MetaError::ShapeMismatch(msg) if msg.contains("2x2")));
    }

    #[test]
    fn test_other_core_errors_not_relabelled() {
        let err: MetaError = pixio_core::Error::invalid_layout("mask too large").into();
        assert!(matches!(
            err,
            MetaError::Core(pixio_core::Error::InvalidLayout(_))
        ));

        let err: MetaError = pixio_core::Error::BufferTooSmall { required: 4, actual: 1 }.into();
        assert!(matches!(
            err,
            MetaError::Core(pixio_core::Error::BufferTooSmall { .. })
        ));
        assert!(err.to_string().starts_with("buffer too small"));
    }
}
