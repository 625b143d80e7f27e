//! Format adapters.
//!
//! Headerless formats ([`plain`], [`mipi`]) and the [`cfa`] container are
//! implemented here. PNG, TIFF, DNG, JPEG and BMP delegate decoding and
//! encoding to their codec crates and only translate between codec buffers
//! and [`Image`].
//!
//! Codecs have no notion of a colour filter array, so single-channel mosaics
//! are stored as grayscale; the pattern survives in the sidecar.

use pixio_core::{Image, ImageLayout, ImageRef, ImageView, LayoutDescriptor, PixelType, Sample};
use pixio_meta::{ImageMetadata, PixelRepresentation};

use crate::{IoError, IoResult};

pub mod cfa;
pub mod mipi;
pub mod plain;

#[cfg(feature = "bmp")]
pub mod bmp;
#[cfg(feature = "tiff")]
pub mod dng;
#[cfg(feature = "exif")]
pub mod exif_tags;
#[cfg(feature = "jpeg")]
pub mod jpeg;
#[cfg(feature = "png")]
pub mod png;
#[cfg(feature = "tiff")]
pub mod tiff;

/// Geometry a self-describing file reports before its pixels are decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Header {
    pub width: u32,
    pub height: u32,
    pub pixel_type: PixelType,
    pub precision: u8,
    pub representation: PixelRepresentation,
}

impl Header {
    /// Mosaics are planar, colour images interleaved.
    pub fn image_layout(&self) -> ImageLayout {
        if is_mosaic(self.pixel_type) {
            ImageLayout::Planar
        } else {
            ImageLayout::Interleaved
        }
    }

    /// Layout of the decoded samples, without padding.
    pub fn layout(&self) -> IoResult<LayoutDescriptor> {
        Ok(LayoutDescriptor::builder(self.width, self.height)
            .pixel_type(self.pixel_type)
            .image_layout(self.image_layout())
            .pixel_precision(self.precision)
            .build()?)
    }

    /// Wraps codec output, which is tightly packed.
    pub fn image<T: Sample>(&self, data: Vec<T>) -> IoResult<Image<T>> {
        let layout = self.layout()?;
        if data.len() != layout.required_len() {
            return Err(IoError::DecodeError(format!(
                "decoder produced {} samples, {}x{} {} needs {}",
                data.len(),
                self.width,
                self.height,
                self.pixel_type,
                layout.required_len()
            )));
        }
        Ok(Image::from_vec(layout, data)?)
    }

    /// Overwrites the fileInfo fields the file is authoritative for.
    pub fn describe(&self, hint: Option<ImageMetadata>) -> ImageMetadata {
        let mut meta = hint.unwrap_or_default();
        let file = &mut meta.file_info;
        file.width = Some(self.width);
        file.height = Some(self.height);
        file.pixel_type = Some(self.pixel_type);
        file.image_layout = Some(self.image_layout());
        file.pixel_precision = Some(self.precision);
        file.pixel_representation = Some(self.representation);
        meta.synchronize();
        meta
    }
}

/// Colour pixel type for a codec channel count.
pub(crate) fn color_pixel_type(channels: usize) -> Option<PixelType> {
    match channels {
        1 => Some(PixelType::Grayscale),
        2 => Some(PixelType::GrayAlpha),
        3 => Some(PixelType::Rgb),
        4 => Some(PixelType::Rgba),
        _ => None,
    }
}

/// Bayer or quad Bayer.
pub(crate) fn is_mosaic(pixel_type: PixelType) -> bool {
    pixel_type.is_bayer() || pixel_type.is_quad_bayer()
}

/// Channel count of a pixel type codecs can store directly.
///
/// Mosaics count as one gray channel.
pub(crate) fn color_channels(pixel_type: PixelType, format: &str) -> IoResult<usize> {
    match pixel_type {
        PixelType::Grayscale => Ok(1),
        mosaic if is_mosaic(mosaic) => Ok(1),
        PixelType::GrayAlpha => Ok(2),
        PixelType::Rgb => Ok(3),
        PixelType::Rgba => Ok(4),
        other => Err(IoError::UnsupportedOperation(format!(
            "{format} cannot store {other} images"
        ))),
    }
}

/// Copies samples into tightly packed interleaved order.
pub(crate) fn interleaved<T: Sample>(image: &ImageRef<'_, T>) -> Vec<T> {
    let (w, h, ch) = (
        image.width() as usize,
        image.height() as usize,
        image.num_channels(),
    );
    let len = w * h * ch;
    if image.image_layout() == ImageLayout::Interleaved && image.plane(0).row_stride == w * ch {
        return image.data()[..len].to_vec();
    }

    let mut out = Vec::with_capacity(len);
    for y in 0..h {
        for x in 0..w {
            for c in 0..ch {
                out.push(image.get(x, y, c));
            }
        }
    }
    out
}

/// Single-channel mosaic or grayscale images; the only kind raw packings hold.
pub(crate) fn check_single_channel(layout: &LayoutDescriptor, format: &str) -> IoResult<()> {
    if layout.num_channels() != 1 {
        return Err(IoError::UnsupportedOperation(format!(
            "{format} stores single-channel images, got {} with {} channels",
            layout.pixel_type(),
            layout.num_channels()
        )));
    }
    Ok(())
}
