//! # pixio-core
//!
//! Memory-layout-aware image buffers and float matrices.
//!
//! This crate provides the foundational types used throughout pixio:
//!
//! - [`PixelType`], [`ImageLayout`] - closed vocabularies for pixel semantics
//!   and memory arrangement
//! - [`LayoutDescriptor`] - per-channel strides, offsets and sizes computed
//!   from size, layout and alignment
//! - [`Image`], [`ImageRef`], [`ImageMut`] - owned and borrowed buffers
//! - [`BufferInfo`] - zero-copy exchange with external numeric arrays
//! - [`Matrix3`], [`DynamicMatrix`] - row-major `f32` matrices
//! - [`split_channels`], [`merge_channels`] - per-channel decomposition
//!
//! ## Crate Structure
//!
//! ```text
//! pixio-core (this crate)
//!    ^
//!    +-- pixio-meta (EXIF, image metadata)
//!    +-- pixio-io   (readers and writers)
//!    +-- pixio-cli
//! ```
//!
//! ## Example
//!
//! ```rust
//! use pixio_core::{BufferInfo, ImageLayout, ImageRef, ImageView, PixelType};
//!
//! // A 4x6 NV12 frame is exchanged as a (6, 4) array
//! let frame = vec![0u8; 24];
//! let info = BufferInfo::from_slice(&frame, vec![6, 4]);
//! let img = ImageRef::<u8>::from_buffer(&info, PixelType::Yuv, ImageLayout::Nv12, 8).unwrap();
//! assert_eq!((img.width(), img.height()), (4, 4));
//! assert_eq!(img.buffer_info().unwrap().shape, vec![6, 4]);
//! ```

pub mod buffer;
pub mod channels;
pub mod error;
pub mod image;
pub mod layout;
pub mod matrix;
pub mod pixel;

pub use buffer::{contiguous_strides, BufferInfo};
pub use channels::{channel_names, merge_channels, split_channels, Channel};
pub use error::{Error, Result};
pub use image::{Image, ImageMut, ImageRef, ImageView};
pub use layout::{align, LayoutBuilder, LayoutDescriptor, PlaneDescriptor};
pub use matrix::{DynamicMatrix, Matrix3};
pub use pixel::{BayerSite, ImageLayout, PixelType, Sample};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::image::{Image, ImageMut, ImageRef, ImageView};
    pub use crate::layout::LayoutDescriptor;
    pub use crate::matrix::{DynamicMatrix, Matrix3};
    pub use crate::pixel::{ImageLayout, PixelType, Sample};
}
