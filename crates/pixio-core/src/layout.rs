//! Layout descriptors: per-plane geometry of an image buffer.
//!
//! A [`LayoutDescriptor`] is computed once from the image size, pixel type,
//! memory layout and alignment constraints, and is immutable afterwards.
//! All offsets and strides are counted in elements, never bytes.
//!
//! # Geometry
//!
//! With `align(v, a)` rounding `v` up to a multiple of the power of two `a`:
//!
//! ```text
//! PLANAR       rowStride = align(w, wa)           one plane per channel
//!              plane     = rowStride * align(h, ha)
//! INTERLEAVED  rowStride = align(w * ch, wa)      pixelStride = ch
//! YUV_420      Y rowStride = align(w, max(wa, 2)), rows = align(h, max(ha, 2))
//!              U, V: ceil(w/2) x ceil(h/2), rowStride = Y rowStride / 2
//! NV12         Y as above, UV: rowStride = Y rowStride, pixelStride = 2
//! ```
//!
//! The total length is the sum of plane extents rounded up to the size
//! alignment.
//!
//! # Usage
//!
//! ```rust
//! use pixio_core::{ImageLayout, LayoutDescriptor, PixelType};
//!
//! let layout = LayoutDescriptor::builder(640, 480)
//!     .pixel_type(PixelType::Yuv)
//!     .image_layout(ImageLayout::Nv12)
//!     .build()
//!     .unwrap();
//! assert_eq!(layout.num_planes(), 2);
//! assert_eq!(layout.required_len(), 640 * 480 * 3 / 2);
//! ```

use crate::{Error, ImageLayout, PixelType, Result};

/// Rounds `value` up to a multiple of `alignment` (a power of two).
#[inline]
pub const fn align(value: usize, alignment: usize) -> usize {
    (value + alignment - 1) & !(alignment - 1)
}

/// Geometry of one channel inside the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaneDescriptor {
    /// Element offset of the channel's first sample
    pub offset: usize,
    /// Samples per row
    pub width: usize,
    /// Rows
    pub height: usize,
    /// Elements between the starts of consecutive rows
    pub row_stride: usize,
    /// Elements between consecutive samples of a row
    pub pixel_stride: usize,
}

impl PlaneDescriptor {
    /// Element index of sample `(x, y)`.
    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        self.offset + y * self.row_stride + x * self.pixel_stride
    }

    /// One past the last element the channel touches.
    #[inline]
    pub fn end(&self) -> usize {
        if self.width == 0 || self.height == 0 {
            return self.offset;
        }
        self.index(self.width - 1, self.height - 1) + 1
    }
}

/// Immutable memory layout of an image.
///
/// Holds one [`PlaneDescriptor`] per channel. Use
/// [`num_planes`](Self::num_planes) for the number of memory planes, which
/// differs from the channel count for interleaved and NV12 layouts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LayoutDescriptor {
    width: u32,
    height: u32,
    pixel_precision: u8,
    image_layout: ImageLayout,
    pixel_type: PixelType,
    width_alignment: u32,
    height_alignment: u32,
    size_alignment: u32,
    num_planes: usize,
    channels: Vec<PlaneDescriptor>,
    required_len: usize,
}

/// Builder for [`LayoutDescriptor`].
///
/// Defaults: precision 0 (unspecified), PLANAR layout, CUSTOM pixel type,
/// all alignments 1.
#[derive(Debug, Clone)]
pub struct LayoutBuilder {
    width: u32,
    height: u32,
    pixel_precision: u8,
    image_layout: ImageLayout,
    pixel_type: PixelType,
    width_alignment: u32,
    height_alignment: u32,
    size_alignment: u32,
    num_channels: Option<usize>,
}

impl LayoutBuilder {
    /// Bits of precision per sample. 0 leaves it unspecified.
    pub fn pixel_precision(mut self, bits: u8) -> Self {
        self.pixel_precision = bits;
        self
    }

    /// Memory layout.
    pub fn image_layout(mut self, layout: ImageLayout) -> Self {
        self.image_layout = layout;
        self
    }

    /// Pixel semantics.
    pub fn pixel_type(mut self, pixel_type: PixelType) -> Self {
        self.pixel_type = pixel_type;
        self
    }

    /// Row alignment in elements.
    pub fn width_alignment(mut self, alignment: u32) -> Self {
        self.width_alignment = alignment;
        self
    }

    /// Row count alignment.
    pub fn height_alignment(mut self, alignment: u32) -> Self {
        self.height_alignment = alignment;
        self
    }

    /// Total buffer length alignment in elements.
    pub fn size_alignment(mut self, alignment: u32) -> Self {
        self.size_alignment = alignment;
        self
    }

    /// Channel count. Required for [`PixelType::Custom`].
    pub fn num_channels(mut self, channels: usize) -> Self {
        self.num_channels = Some(channels);
        self
    }

    /// Validates the parameters and computes the plane geometry.
    pub fn build(self) -> Result<LayoutDescriptor> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::invalid_layout(format!(
                "image size must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        for (name, value) in [
            ("width", self.width_alignment),
            ("height", self.height_alignment),
            ("size", self.size_alignment),
        ] {
            if !value.is_power_of_two() {
                return Err(Error::invalid_layout(format!(
                    "{name} alignment {value} is not a power of two"
                )));
            }
        }
        if self.pixel_precision > 32 {
            return Err(Error::invalid_layout(format!(
                "pixel precision {} exceeds 32 bits",
                self.pixel_precision
            )));
        }

        let channels = match (self.pixel_type.default_channels(), self.num_channels) {
            (None, None) => {
                return Err(Error::invalid_layout(
                    "CUSTOM pixel type requires an explicit channel count",
                ));
            }
            (None, Some(0)) => return Err(Error::invalid_layout("channel count must be positive")),
            (None, Some(n)) => n,
            (Some(n), Some(m)) if n != m => {
                return Err(Error::invalid_layout(format!(
                    "{} has {n} channels, {m} requested",
                    self.pixel_type
                )));
            }
            (Some(n), _) => n,
        };

        if self.image_layout.is_subsampled() && !self.pixel_type.is_yuv() {
            return Err(Error::invalid_layout(format!(
                "{} layout requires YUV pixel type, got {}",
                self.image_layout, self.pixel_type
            )));
        }

        let w = self.width as usize;
        let h = self.height as usize;
        let wa = self.width_alignment as usize;
        let ha = self.height_alignment as usize;

        let (num_planes, planes, extent) = match self.image_layout {
            ImageLayout::Planar | ImageLayout::Custom => {
                let row_stride = align(w, wa);
                let plane_len = row_stride * align(h, ha);
                let planes = (0..channels)
                    .map(|c| PlaneDescriptor {
                        offset: c * plane_len,
                        width: w,
                        height: h,
                        row_stride,
                        pixel_stride: 1,
                    })
                    .collect();
                (channels, planes, plane_len * channels)
            }
            ImageLayout::Interleaved => {
                let row_stride = align(w * channels, wa);
                let planes = (0..channels)
                    .map(|c| PlaneDescriptor {
                        offset: c,
                        width: w,
                        height: h,
                        row_stride,
                        pixel_stride: channels,
                    })
                    .collect();
                (1, planes, row_stride * align(h, ha))
            }
            ImageLayout::Yuv420 | ImageLayout::Nv12 => {
                let y_stride = align(w, wa.max(2));
                let y_rows = align(h, ha.max(2));
                let luma_len = y_stride * y_rows;
                let (cw, chh) = (w.div_ceil(2), h.div_ceil(2));
                let luma = PlaneDescriptor {
                    offset: 0,
                    width: w,
                    height: h,
                    row_stride: y_stride,
                    pixel_stride: 1,
                };
                if self.image_layout == ImageLayout::Yuv420 {
                    let c_stride = y_stride / 2;
                    let chroma_len = c_stride * (y_rows / 2);
                    let chroma = |offset| PlaneDescriptor {
                        offset,
                        width: cw,
                        height: chh,
                        row_stride: c_stride,
                        pixel_stride: 1,
                    };
                    (
                        3,
                        vec![luma, chroma(luma_len), chroma(luma_len + chroma_len)],
                        luma_len + 2 * chroma_len,
                    )
                } else {
                    let chroma = |offset| PlaneDescriptor {
                        offset,
                        width: cw,
                        height: chh,
                        row_stride: y_stride,
                        pixel_stride: 2,
                    };
                    (
                        2,
                        vec![luma, chroma(luma_len), chroma(luma_len + 1)],
                        luma_len + y_stride * (y_rows / 2),
                    )
                }
            }
        };

        Ok(LayoutDescriptor {
            width: self.width,
            height: self.height,
            pixel_precision: self.pixel_precision,
            image_layout: self.image_layout,
            pixel_type: self.pixel_type,
            width_alignment: self.width_alignment,
            height_alignment: self.height_alignment,
            size_alignment: self.size_alignment,
            num_planes,
            channels: planes,
            required_len: align(extent, self.size_alignment as usize),
        })
    }
}

impl LayoutDescriptor {
    /// Starts a builder for a `width` x `height` image.
    pub fn builder(width: u32, height: u32) -> LayoutBuilder {
        LayoutBuilder {
            width,
            height,
            pixel_precision: 0,
            image_layout: ImageLayout::Planar,
            pixel_type: PixelType::Custom,
            width_alignment: 1,
            height_alignment: 1,
            size_alignment: 1,
            num_channels: None,
        }
    }

    /// Builder pre-filled with every parameter of this descriptor.
    ///
    /// Handy for deriving a layout of a different size with the same
    /// packing rules.
    pub fn to_builder(&self) -> LayoutBuilder {
        LayoutBuilder {
            width: self.width,
            height: self.height,
            pixel_precision: self.pixel_precision,
            image_layout: self.image_layout,
            pixel_type: self.pixel_type,
            width_alignment: self.width_alignment,
            height_alignment: self.height_alignment,
            size_alignment: self.size_alignment,
            num_channels: Some(self.channels.len()),
        }
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bits of precision per sample, 0 if unspecified.
    #[inline]
    pub fn pixel_precision(&self) -> u8 {
        self.pixel_precision
    }

    #[inline]
    pub fn image_layout(&self) -> ImageLayout {
        self.image_layout
    }

    #[inline]
    pub fn pixel_type(&self) -> PixelType {
        self.pixel_type
    }

    #[inline]
    pub fn width_alignment(&self) -> u32 {
        self.width_alignment
    }

    #[inline]
    pub fn height_alignment(&self) -> u32 {
        self.height_alignment
    }

    #[inline]
    pub fn size_alignment(&self) -> u32 {
        self.size_alignment
    }

    /// Number of memory planes: 1 for INTERLEAVED, 3 for YUV_420, 2 for NV12,
    /// the channel count otherwise.
    #[inline]
    pub fn num_planes(&self) -> usize {
        self.num_planes
    }

    /// Number of channels.
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Geometry of channel `c`.
    ///
    /// # Panics
    ///
    /// Panics if `c >= num_channels()`.
    #[inline]
    pub fn plane(&self, c: usize) -> &PlaneDescriptor {
        &self.channels[c]
    }

    /// Geometry of every channel.
    #[inline]
    pub fn planes(&self) -> &[PlaneDescriptor] {
        &self.channels
    }

    /// Elements a buffer must hold to back this layout.
    #[inline]
    pub fn required_len(&self) -> usize {
        self.required_len
    }

    /// Element distance between channel 0 and channel 1 (0 for one channel).
    #[inline]
    pub fn channel_step(&self) -> usize {
        match self.channels.as_slice() {
            [a, b, ..] => b.offset - a.offset,
            _ => 0,
        }
    }

    /// Element index of sample `(x, y)` in channel `c`, in that channel's
    /// own coordinates (chroma planes are half size when subsampled).
    #[inline]
    pub fn index(&self, x: usize, y: usize, c: usize) -> usize {
        self.channels[c].index(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb(layout: ImageLayout) -> LayoutBuilder {
        LayoutDescriptor::builder(5, 3)
            .pixel_type(PixelType::Rgb)
            .image_layout(layout)
    }

    #[test]
    fn test_align() {
        assert_eq!(align(5, 1), 5);
        assert_eq!(align(5, 4), 8);
        assert_eq!(align(8, 4), 8);
        assert_eq!(align(0, 16), 0);
    }

    #[test]
    fn test_planar_geometry() {
        let l = rgb(ImageLayout::Planar).width_alignment(8).build().unwrap();
        assert_eq!(l.num_planes(), 3);
        assert_eq!(l.num_channels(), 3);
        assert_eq!(l.plane(0).row_stride, 8);
        assert_eq!(l.plane(1).offset, 24);
        assert_eq!(l.plane(2).offset, 48);
        assert_eq!(l.channel_step(), 24);
        assert_eq!(l.required_len(), 72);
    }

    #[test]
    fn test_interleaved_geometry() {
        let l = rgb(ImageLayout::Interleaved).width_alignment(4).build().unwrap();
        assert_eq!(l.num_planes(), 1);
        assert_eq!(l.num_channels(), 3);
        assert_eq!(l.plane(0).pixel_stride, 3);
        assert_eq!(l.plane(2).offset, 2);
        assert_eq!(l.plane(0).row_stride, 16);
        assert_eq!(l.channel_step(), 1);
        assert_eq!(l.required_len(), 48);
        assert_eq!(l.index(1, 2, 2), 2 * 16 + 3 + 2);
    }

    #[test]
    fn test_yuv420_geometry() {
        let l = LayoutDescriptor::builder(6, 4)
            .pixel_type(PixelType::Yuv)
            .image_layout(ImageLayout::Yuv420)
            .build()
            .unwrap();
        assert_eq!(l.num_planes(), 3);
        let (y, u, v) = (l.plane(0), l.plane(1), l.plane(2));
        assert_eq!((y.row_stride, y.width, y.height), (6, 6, 4));
        assert_eq!((u.offset, u.width, u.height, u.row_stride), (24, 3, 2, 3));
        assert_eq!(v.offset, 30);
        assert_eq!(l.required_len(), 36);
    }

    #[test]
    fn test_yuv420_odd_size_rounds_up() {
        let l = LayoutDescriptor::builder(5, 3)
            .pixel_type(PixelType::Yuv)
            .image_layout(ImageLayout::Yuv420)
            .build()
            .unwrap();
        let (y, u) = (l.plane(0), l.plane(1));
        assert_eq!(y.row_stride, 6);
        assert_eq!((u.width, u.height, u.row_stride), (3, 2, 3));
        assert_eq!(l.required_len(), 6 * 4 + 2 * 3 * 2);
    }

    #[test]
    fn test_nv12_geometry() {
        let l = LayoutDescriptor::builder(6, 4)
            .pixel_type(PixelType::Yuv)
            .image_layout(ImageLayout::Nv12)
            .build()
            .unwrap();
        assert_eq!(l.num_planes(), 2);
        let (u, v) = (l.plane(1), l.plane(2));
        assert_eq!((u.offset, u.pixel_stride, u.row_stride), (24, 2, 6));
        assert_eq!(v.offset, 25);
        assert_eq!(l.required_len(), 36);
    }

    #[test]
    fn test_size_alignment() {
        let l = LayoutDescriptor::builder(3, 3)
            .pixel_type(PixelType::Grayscale)
            .size_alignment(16)
            .build()
            .unwrap();
        assert_eq!(l.required_len(), 16);
    }

    #[test]
    fn test_invalid_layouts() {
        let zero = LayoutDescriptor::builder(0, 4).pixel_type(PixelType::Rgb).build();
        assert!(matches!(zero, Err(Error::InvalidLayout(_))));

        let bad_align = rgb(ImageLayout::Planar).width_alignment(3).build();
        assert!(matches!(bad_align, Err(Error::InvalidLayout(_))));

        let zero_align = rgb(ImageLayout::Planar).size_alignment(0).build();
        assert!(matches!(zero_align, Err(Error::InvalidLayout(_))));

        let custom = LayoutDescriptor::builder(4, 4).build();
        assert!(matches!(custom, Err(Error::InvalidLayout(_))));

        let yuv_rgb = rgb(ImageLayout::Nv12).build();
        assert!(matches!(yuv_rgb, Err(Error::InvalidLayout(_))));

        let wrong_channels = rgb(ImageLayout::Planar).num_channels(4).build();
        assert!(matches!(wrong_channels, Err(Error::InvalidLayout(_))));

        let precision = rgb(ImageLayout::Planar).pixel_precision(33).build();
        assert!(matches!(precision, Err(Error::InvalidLayout(_))));
    }

    #[test]
    fn test_custom_channels() {
        let l = LayoutDescriptor::builder(2, 2).num_channels(5).build().unwrap();
        assert_eq!(l.num_channels(), 5);
        assert_eq!(l.num_planes(), 5);
        assert_eq!(l.required_len(), 20);
    }

    #[test]
    fn test_to_builder_preserves_parameters() {
        let l = rgb(ImageLayout::Interleaved)
            .width_alignment(4)
            .pixel_precision(12)
            .build()
            .unwrap();
        let again = l.to_builder().build().unwrap();
        assert_eq!(l, again);
    }
}
