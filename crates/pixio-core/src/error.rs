//! Error types for pixio-core operations.
//!
//! Every failure in the core is raised synchronously at construction or
//! serialization time and propagated to the caller unchanged. Malformed input
//! is rejected, never coerced.
//!
//! # Categories
//!
//! - **Layout errors**: [`InvalidLayout`](Error::InvalidLayout)
//! - **Interop errors**: [`IncompatibleFormat`](Error::IncompatibleFormat),
//!   [`IncompatibleBufferDimension`](Error::IncompatibleBufferDimension),
//!   [`BufferTooSmall`](Error::BufferTooSmall)
//! - **Shape errors**: [`ShapeMismatch`](Error::ShapeMismatch)
//! - **Capability errors**: [`UnsupportedPixelType`](Error::UnsupportedPixelType)
//!
//! # Usage
//!
//! ```rust
//! use pixio_core::{Error, LayoutDescriptor};
//!
//! let err = LayoutDescriptor::builder(0, 16).build().unwrap_err();
//! assert!(matches!(err, Error::InvalidLayout(_)));
//! ```

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the buffer and matrix model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Width/height, alignment or pixel type / layout combination rejected.
    #[error("invalid layout: {0}")]
    InvalidLayout(String),

    /// Element format of an external buffer does not match the target type,
    /// or the buffer is not C-contiguous.
    #[error("incompatible format: expected '{expected}', got '{actual}'")]
    IncompatibleFormat {
        /// Format code the target type requires
        expected: String,
        /// Format code (or stride description) the buffer declared
        actual: String,
    },

    /// Source buffer rank or shape is not acceptable.
    #[error("incompatible buffer dimension: {0}")]
    IncompatibleBufferDimension(String),

    /// Two structures that must agree in shape do not.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Storage is shorter than the descriptor requires.
    #[error("buffer too small: layout requires {required} elements, got {actual}")]
    BufferTooSmall {
        /// Elements required by the descriptor
        required: usize,
        /// Elements available
        actual: usize,
    },

    /// The operation has no meaning for this pixel type.
    #[error("unsupported pixel type: {0}")]
    UnsupportedPixelType(String),
}

impl Error {
    /// Creates an [`Error::InvalidLayout`] error.
    #[inline]
    pub fn invalid_layout(reason: impl Into<String>) -> Self {
        Self::InvalidLayout(reason.into())
    }

    /// Creates an [`Error::IncompatibleFormat`] error.
    #[inline]
    pub fn incompatible_format(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::IncompatibleFormat {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates an [`Error::IncompatibleBufferDimension`] error.
    #[inline]
    pub fn incompatible_dimension(reason: impl Into<String>) -> Self {
        Self::IncompatibleBufferDimension(reason.into())
    }

    /// Creates an [`Error::ShapeMismatch`] error from two `(rows, cols)` shapes.
    #[inline]
    pub fn shape_mismatch(what: &str, a: (usize, usize), b: (usize, usize)) -> Self {
        Self::ShapeMismatch(format!("{what}: {}x{} vs {}x{}", a.0, a.1, b.0, b.1))
    }
}
