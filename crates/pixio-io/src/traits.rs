//! Reader and writer interfaces.
//!
//! Format adapters implement [`ImageReader`] / [`ImageWriter`] for the
//! sample types they support; the remaining entry points keep their default
//! `UnsupportedBitDepth` error. Callers that do not know the sample type
//! up front go through [`ImageReader::read`] and [`DynImage`].

use pixio_core::{Image, ImageRef, ImageView, LayoutDescriptor, PixelType, Sample};
use pixio_meta::{ExifMetadata, ImageMetadata, PixelRepresentation};

use crate::{IoError, IoResult};

/// Image with its sample type resolved at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum DynImage {
    U8(Image<u8>),
    U16(Image<u16>),
    F32(Image<f32>),
}

impl DynImage {
    /// Sample type of the stored image.
    pub fn pixel_representation(&self) -> PixelRepresentation {
        match self {
            Self::U8(_) => PixelRepresentation::Uint8,
            Self::U16(_) => PixelRepresentation::Uint16,
            Self::F32(_) => PixelRepresentation::Float,
        }
    }

    /// Relabels the samples with another pixel type of the same channel
    /// count, e.g. a grayscale codec image as the mosaic it holds.
    pub fn with_pixel_type(self, pixel_type: PixelType, precision: u8) -> IoResult<Self> {
        fn relabel<T: Sample>(img: Image<T>, pixel_type: PixelType, precision: u8) -> IoResult<Image<T>> {
            let layout = img
                .descriptor()
                .to_builder()
                .pixel_type(pixel_type)
                .pixel_precision(precision)
                .build()?;
            Ok(Image::from_vec(layout, img.into_vec())?)
        }

        Ok(match self {
            Self::U8(img) => relabel(img, pixel_type, precision)?.into(),
            Self::U16(img) => relabel(img, pixel_type, precision)?.into(),
            Self::F32(img) => relabel(img, pixel_type, precision)?.into(),
        })
    }

    pub fn as_u8(&self) -> Option<&Image<u8>> {
        match self {
            Self::U8(img) => Some(img),
            _ => None,
        }
    }

    pub fn as_u16(&self) -> Option<&Image<u16>> {
        match self {
            Self::U16(img) => Some(img),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<&Image<f32>> {
        match self {
            Self::F32(img) => Some(img),
            _ => None,
        }
    }
}

impl ImageView for DynImage {
    fn descriptor(&self) -> &LayoutDescriptor {
        match self {
            Self::U8(img) => img.descriptor(),
            Self::U16(img) => img.descriptor(),
            Self::F32(img) => img.descriptor(),
        }
    }
}

impl From<Image<u8>> for DynImage {
    fn from(img: Image<u8>) -> Self {
        Self::U8(img)
    }
}

impl From<Image<u16>> for DynImage {
    fn from(img: Image<u16>) -> Self {
        Self::U16(img)
    }
}

impl From<Image<f32>> for DynImage {
    fn from(img: Image<f32>) -> Self {
        Self::F32(img)
    }
}

/// Format reader bound to one file.
///
/// # Example
///
/// ```rust,ignore
/// use pixio_io::{make_reader, ReaderOptions};
///
/// let reader = make_reader("shot.png", ReaderOptions::default())?;
/// let meta = reader.read_metadata(None)?;
/// let image = reader.read()?;
/// ```
pub trait ImageReader {
    /// Sample type [`read`](Self::read) produces.
    fn pixel_representation(&self) -> PixelRepresentation;

    /// Merges what the file knows about itself into `hint`.
    fn read_metadata(&self, hint: Option<ImageMetadata>) -> IoResult<ImageMetadata>;

    fn read_8u(&self) -> IoResult<Image<u8>> {
        Err(IoError::UnsupportedBitDepth("8-bit read".into()))
    }

    fn read_16u(&self) -> IoResult<Image<u16>> {
        Err(IoError::UnsupportedBitDepth("16-bit read".into()))
    }

    fn read_f(&self) -> IoResult<Image<f32>> {
        Err(IoError::UnsupportedBitDepth("float read".into()))
    }

    fn read_exif(&self) -> IoResult<ExifMetadata> {
        Err(IoError::UnsupportedOperation("EXIF read".into()))
    }

    /// Reads pixels with the sample type of
    /// [`pixel_representation`](Self::pixel_representation).
    fn read(&self) -> IoResult<DynImage> {
        Ok(match self.pixel_representation() {
            PixelRepresentation::Uint8 => self.read_8u()?.into(),
            PixelRepresentation::Uint16 => self.read_16u()?.into(),
            PixelRepresentation::Float => self.read_f()?.into(),
        })
    }
}

/// Format writer bound to one output path.
pub trait ImageWriter {
    fn write_8u(&self, _image: &ImageRef<'_, u8>) -> IoResult<()> {
        Err(IoError::UnsupportedBitDepth("8-bit write".into()))
    }

    fn write_16u(&self, _image: &ImageRef<'_, u16>) -> IoResult<()> {
        Err(IoError::UnsupportedBitDepth("16-bit write".into()))
    }

    fn write_f(&self, _image: &ImageRef<'_, f32>) -> IoResult<()> {
        Err(IoError::UnsupportedBitDepth("float write".into()))
    }

    /// Stores `exif` in an already written file.
    fn write_exif(&self, _exif: &ExifMetadata) -> IoResult<()> {
        Err(IoError::UnsupportedOperation("EXIF write".into()))
    }

    /// Writes with the entry point matching the image's sample type.
    fn write(&self, image: &DynImage) -> IoResult<()> {
        match image {
            DynImage::U8(img) => self.write_8u(&img.view()),
            DynImage::U16(img) => self.write_16u(&img.view()),
            DynImage::F32(img) => self.write_f(&img.view()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixio_core::PixelType;

    struct GrayOnly;

    impl ImageReader for GrayOnly {
        fn pixel_representation(&self) -> PixelRepresentation {
            PixelRepresentation::Uint16
        }

        fn read_metadata(&self, hint: Option<ImageMetadata>) -> IoResult<ImageMetadata> {
            Ok(hint.unwrap_or_default())
        }

        fn read_16u(&self) -> IoResult<Image<u16>> {
            let desc = LayoutDescriptor::builder(2, 2)
                .pixel_type(PixelType::Grayscale)
                .build()?;
            Ok(Image::from_vec(desc, vec![1, 2, 3, 4])?)
        }
    }

    impl ImageWriter for GrayOnly {}

    #[test]
    fn test_read_dispatches_on_representation() {
        let img = GrayOnly.read().unwrap();
        assert_eq!(img.pixel_representation(), PixelRepresentation::Uint16);
        assert_eq!(img.as_u16().unwrap().data(), &[1, 2, 3, 4]);
        assert_eq!((img.width(), img.height()), (2, 2));
    }

    #[test]
    fn test_with_pixel_type() {
        let img = GrayOnly.read().unwrap();
        let bayer = img.clone().with_pixel_type(PixelType::BayerRggb, 12).unwrap();
        assert_eq!(bayer.pixel_type(), PixelType::BayerRggb);
        assert_eq!(bayer.pixel_precision(), 12);
        assert_eq!(bayer.as_u16().unwrap().data(), &[1, 2, 3, 4]);

        assert!(matches!(
            img.with_pixel_type(PixelType::Rgb, 8),
            Err(IoError::Core(_))
        ));
    }

    #[test]
    fn test_defaults_are_unsupported() {
        assert!(matches!(GrayOnly.read_8u(), Err(IoError::UnsupportedBitDepth(_))));
        assert!(matches!(GrayOnly.read_exif(), Err(IoError::UnsupportedOperation(_))));

        let img = GrayOnly.read().unwrap();
        assert!(matches!(GrayOnly.write(&img), Err(IoError::UnsupportedBitDepth(_))));
        assert!(matches!(
            GrayOnly.write_exif(&ExifMetadata::default()),
            Err(IoError::UnsupportedOperation(_))
        ));
    }
}
