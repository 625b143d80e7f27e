//! Image buffer types.
//!
//! This module provides the image containers:
//! - [`Image`] - owned buffer sized from a [`LayoutDescriptor`]
//! - [`ImageRef`] - borrowed, read-only view over caller storage
//! - [`ImageMut`] - borrowed, mutable view over caller storage
//! - [`ImageView`] - geometry-only capability shared by all three
//!
//! # Ownership
//!
//! Owned and borrowed storage are distinct types. Wrapping a caller buffer
//! never copies, and the borrow checker ties the view to the buffer, so a
//! view cannot outlive the memory it describes.
//!
//! # Buffer exchange
//!
//! `buffer_info()` exposes the samples as a strided array:
//!
//! ```text
//! one channel          (h, w)       strides (rowStride, pixelStride) * size
//! several channels     (h, w, ch)   strides (rowStride, pixelStride, channelStep) * size
//! YUV_420 / NV12       (3h/2, w)    strides (Y rowStride, 1) * size
//! ```
//!
//! A 3-D array is read back the same way: INTERLEAVED takes a C-contiguous
//! `(h, w, ch)` array, PLANAR and CUSTOM take the planar strides above.
//! YUV_420 and NV12 need an even width and height and no padding rows
//! (YUV_420 no padding columns either), otherwise the chroma planes do not
//! fit a single `(3h/2, w)` view and the exchange fails with
//! [`Error::IncompatibleBufferDimension`].
//!
//! # Usage
//!
//! ```rust
//! use pixio_core::{Image, ImageLayout, ImageView, LayoutDescriptor, PixelType};
//!
//! let layout = LayoutDescriptor::builder(4, 2)
//!     .pixel_type(PixelType::Rgb)
//!     .image_layout(ImageLayout::Interleaved)
//!     .build()
//!     .unwrap();
//! let mut img: Image<u8> = Image::new(layout);
//! img.set(3, 1, 2, 200);
//! assert_eq!(img.get(3, 1, 2), 200);
//!
//! let info = img.buffer_info().unwrap();
//! assert_eq!(info.shape, vec![2, 4, 3]);
//! assert_eq!(info.strides, vec![12, 3, 1]);
//! ```

use std::fmt;

use crate::{
    BufferInfo, Error, ImageLayout, LayoutDescriptor, PixelType, PlaneDescriptor, Result, Sample,
};

/// Read-only geometry of an image.
pub trait ImageView {
    /// Layout the samples follow.
    fn descriptor(&self) -> &LayoutDescriptor;

    fn pixel_type(&self) -> PixelType {
        self.descriptor().pixel_type()
    }

    fn pixel_precision(&self) -> u8 {
        self.descriptor().pixel_precision()
    }

    fn image_layout(&self) -> ImageLayout {
        self.descriptor().image_layout()
    }

    fn width(&self) -> u32 {
        self.descriptor().width()
    }

    fn height(&self) -> u32 {
        self.descriptor().height()
    }

    fn num_planes(&self) -> usize {
        self.descriptor().num_planes()
    }

    fn num_channels(&self) -> usize {
        self.descriptor().num_channels()
    }
}

fn check_len(descriptor: &LayoutDescriptor, actual: usize) -> Result<()> {
    let required = descriptor.required_len();
    if actual < required {
        return Err(Error::BufferTooSmall { required, actual });
    }
    Ok(())
}

fn buffer_info_of<'a, T: Sample>(
    descriptor: &LayoutDescriptor,
    data: &'a [T],
) -> Result<BufferInfo<'a>> {
    let size = std::mem::size_of::<T>() as isize;
    let (w, h) = (descriptor.width() as usize, descriptor.height() as usize);
    let plane = descriptor.plane(0);
    let row = plane.row_stride as isize * size;
    let pixel = plane.pixel_stride as isize * size;

    let (shape, strides) = if descriptor.image_layout().is_subsampled() {
        check_subsampled_view(descriptor)?;
        (vec![3 * h / 2, w], vec![row, size])
    } else if descriptor.num_channels() == 1 {
        (vec![h, w], vec![row, pixel])
    } else {
        let step = descriptor.channel_step() as isize * size;
        (vec![h, w, descriptor.num_channels()], vec![row, pixel, step])
    };

    Ok(BufferInfo {
        data: bytemuck::cast_slice(data),
        item_size: size as usize,
        format: T::FORMAT,
        shape,
        strides,
    })
}

/// Whether a YUV_420 / NV12 layout fits one `(3h/2, w)` view.
///
/// The chroma rows must start right after `h` luma rows and fill whole view
/// rows, which rules out odd sizes and padding rows. YUV_420 packs two
/// chroma rows per view row, so it also rules out padding columns.
fn check_subsampled_view(descriptor: &LayoutDescriptor) -> Result<()> {
    let (w, h) = (descriptor.width() as usize, descriptor.height() as usize);
    let luma = descriptor.plane(0);
    let chroma = descriptor.plane(1);
    let dense_rows = chroma.offset == luma.row_stride * h;
    let dense_cols =
        descriptor.image_layout() != ImageLayout::Yuv420 || luma.row_stride == w;
    if w % 2 != 0 || h % 2 != 0 || !dense_rows || !dense_cols {
        return Err(Error::incompatible_dimension(format!(
            "{w}x{h} {} (row stride {}) has no (3h/2, w) view",
            descriptor.image_layout(),
            luma.row_stride
        )));
    }
    Ok(())
}

/// Owned image storage.
#[derive(Clone, PartialEq)]
pub struct Image<T: Sample> {
    descriptor: LayoutDescriptor,
    data: Vec<T>,
}

impl<T: Sample> Image<T> {
    /// Allocates zero-initialised storage for `descriptor`.
    pub fn new(descriptor: LayoutDescriptor) -> Self {
        let data = vec![T::default(); descriptor.required_len()];
        Self { descriptor, data }
    }

    /// Adopts `data` as storage.
    ///
    /// # Errors
    ///
    /// [`Error::BufferTooSmall`] if `data` is shorter than the layout needs.
    pub fn from_vec(descriptor: LayoutDescriptor, data: Vec<T>) -> Result<Self> {
        check_len(&descriptor, data.len())?;
        Ok(Self { descriptor, data })
    }

    /// All samples, including padding.
    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consumes the image and returns its storage.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Geometry of channel `c`.
    #[inline]
    pub fn plane(&self, c: usize) -> &PlaneDescriptor {
        self.descriptor.plane(c)
    }

    /// Sample `(x, y)` of channel `c`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates fall outside the buffer.
    #[inline]
    pub fn get(&self, x: usize, y: usize, c: usize) -> T {
        self.data[self.descriptor.index(x, y, c)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, c: usize, value: T) {
        let i = self.descriptor.index(x, y, c);
        self.data[i] = value;
    }

    /// Borrows the image read-only.
    pub fn view(&self) -> ImageRef<'_, T> {
        ImageRef {
            descriptor: self.descriptor.clone(),
            data: &self.data,
        }
    }

    /// Borrows the image mutably.
    pub fn view_mut(&mut self) -> ImageMut<'_, T> {
        ImageMut {
            descriptor: self.descriptor.clone(),
            data: &mut self.data,
        }
    }

    /// Strided description of the samples for external consumers.
    ///
    /// # Errors
    ///
    /// [`Error::IncompatibleBufferDimension`] for a YUV_420 / NV12 layout
    /// with no `(3h/2, w)` view.
    pub fn buffer_info(&self) -> Result<BufferInfo<'_>> {
        buffer_info_of(&self.descriptor, &self.data)
    }
}

impl<T: Sample> ImageView for Image<T> {
    fn descriptor(&self) -> &LayoutDescriptor {
        &self.descriptor
    }
}

impl<T: Sample> fmt::Debug for Image<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("type", &T::NAME)
            .field("width", &self.descriptor.width())
            .field("height", &self.descriptor.height())
            .field("pixel_type", &self.descriptor.pixel_type())
            .field("layout", &self.descriptor.image_layout())
            .field("len", &self.data.len())
            .finish()
    }
}

/// Read-only image over borrowed storage.
#[derive(Clone)]
pub struct ImageRef<'a, T: Sample> {
    descriptor: LayoutDescriptor,
    data: &'a [T],
}

impl<'a, T: Sample> ImageRef<'a, T> {
    /// Wraps `data` without copying.
    ///
    /// # Errors
    ///
    /// [`Error::BufferTooSmall`] if `data` is shorter than the layout needs.
    pub fn new(descriptor: LayoutDescriptor, data: &'a [T]) -> Result<Self> {
        check_len(&descriptor, data.len())?;
        Ok(Self { descriptor, data })
    }

    /// Wraps an external strided buffer without copying.
    ///
    /// Width is `shape[1]`; height is `shape[0]`, or `shape[0] * 2 / 3` for
    /// YUV_420 and NV12. A 3-D buffer's last axis is the channel count; an
    /// INTERLEAVED image takes it C-contiguous, a PLANAR or CUSTOM one with
    /// the `(w, 1, w * h)` element strides [`buffer_info`](Self::buffer_info)
    /// produces for it.
    ///
    /// # Errors
    ///
    /// - [`Error::IncompatibleFormat`] if the element format is not `T`'s or
    ///   the strides do not match the layout
    /// - [`Error::IncompatibleBufferDimension`] if the rank is outside
    ///   `[2, 3]`, the channel axis disagrees with `pixel_type`, or a
    ///   YUV_420 / NV12 shape is not `(3h/2, w)` with even `w` and `h`
    /// - [`Error::InvalidLayout`] / [`Error::BufferTooSmall`] from layout
    ///   construction
    pub fn from_buffer(
        info: &BufferInfo<'a>,
        pixel_type: PixelType,
        image_layout: ImageLayout,
        pixel_precision: u8,
    ) -> Result<Self> {
        info.check_format::<T>()?;
        info.check_ndim(2, 3)?;

        let subsampled = image_layout.is_subsampled();
        if subsampled && info.shape[0] % 3 != 0 {
            return Err(Error::incompatible_dimension(format!(
                "{image_layout} buffers have 3h/2 rows, got {}",
                info.shape[0]
            )));
        }
        let width = info.shape[1];
        let height = if subsampled {
            info.shape[0] * 2 / 3
        } else {
            info.shape[0]
        };

        let channels = match info.shape.get(2) {
            Some(_) if subsampled => {
                return Err(Error::incompatible_dimension(format!(
                    "{image_layout} buffers are two-dimensional, got shape {:?}",
                    info.shape
                )));
            }
            Some(&ch) => match pixel_type.default_channels() {
                Some(n) if n != ch => {
                    return Err(Error::incompatible_dimension(format!(
                        "{pixel_type} has {n} channels, buffer has {ch}"
                    )));
                }
                _ => ch,
            },
            None => pixel_type.default_channels().unwrap_or(1),
        };

        let planar = matches!(image_layout, ImageLayout::Planar | ImageLayout::Custom);
        if info.ndim() == 3 && planar && channels > 1 {
            let size = info.item_size as isize;
            let (w, plane) = (width as isize, (width * height) as isize);
            info.check_strides(&[w * size, size, plane * size])?;
        } else {
            info.check_contiguous()?;
        }

        let descriptor = LayoutDescriptor::builder(to_u32(width)?, to_u32(height)?)
            .pixel_precision(pixel_precision)
            .image_layout(image_layout)
            .pixel_type(pixel_type)
            .num_channels(channels)
            .build()?;
        if subsampled {
            check_subsampled_view(&descriptor)?;
        }
        Self::new(descriptor, info.typed::<T>()?)
    }

    #[inline]
    pub fn data(&self) -> &'a [T] {
        self.data
    }

    #[inline]
    pub fn plane(&self, c: usize) -> &PlaneDescriptor {
        self.descriptor.plane(c)
    }

    /// Sample `(x, y)` of channel `c`.
    #[inline]
    pub fn get(&self, x: usize, y: usize, c: usize) -> T {
        self.data[self.descriptor.index(x, y, c)]
    }

    /// Copies the borrowed samples into an owned image.
    pub fn to_image(&self) -> Image<T> {
        Image {
            descriptor: self.descriptor.clone(),
            data: self.data[..self.descriptor.required_len()].to_vec(),
        }
    }

    pub fn buffer_info(&self) -> Result<BufferInfo<'a>> {
        buffer_info_of(&self.descriptor, self.data)
    }
}

impl<T: Sample> ImageView for ImageRef<'_, T> {
    fn descriptor(&self) -> &LayoutDescriptor {
        &self.descriptor
    }
}

impl<T: Sample> fmt::Debug for ImageRef<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageRef")
            .field("type", &T::NAME)
            .field("width", &self.descriptor.width())
            .field("height", &self.descriptor.height())
            .field("pixel_type", &self.descriptor.pixel_type())
            .field("layout", &self.descriptor.image_layout())
            .finish()
    }
}

/// Mutable image over borrowed storage.
pub struct ImageMut<'a, T: Sample> {
    descriptor: LayoutDescriptor,
    data: &'a mut [T],
}

impl<'a, T: Sample> ImageMut<'a, T> {
    /// Wraps `data` without copying.
    pub fn new(descriptor: LayoutDescriptor, data: &'a mut [T]) -> Result<Self> {
        check_len(&descriptor, data.len())?;
        Ok(Self { descriptor, data })
    }

    #[inline]
    pub fn data(&self) -> &[T] {
        &*self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut *self.data
    }

    #[inline]
    pub fn plane(&self, c: usize) -> &PlaneDescriptor {
        self.descriptor.plane(c)
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize, c: usize) -> T {
        self.data[self.descriptor.index(x, y, c)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, c: usize, value: T) {
        let i = self.descriptor.index(x, y, c);
        self.data[i] = value;
    }

    /// Reborrows read-only.
    pub fn view(&self) -> ImageRef<'_, T> {
        ImageRef {
            descriptor: self.descriptor.clone(),
            data: &*self.data,
        }
    }

    pub fn buffer_info(&self) -> Result<BufferInfo<'_>> {
        buffer_info_of(&self.descriptor, &*self.data)
    }
}

impl<T: Sample> ImageView for ImageMut<'_, T> {
    fn descriptor(&self) -> &LayoutDescriptor {
        &self.descriptor
    }
}

fn to_u32(v: usize) -> Result<u32> {
    u32::try_from(v).map_err(|_| Error::incompatible_dimension(format!("extent {v} exceeds u32")))
}
