//! # pixio-io
//!
//! Image readers and writers for camera pipelines.
//!
//! - **Plain** - headerless little-endian samples (`.plain`, `.raw`, `.yuv`, `.nv12`)
//! - **RAW10 / RAW12** - MIPI CSI-2 packed sensor data
//! - **CFA** - 16-bit Bayer mosaic behind a fixed header
//! - **PNG** - 8/16-bit gray, gray-alpha, RGB, RGBA
//! - **TIFF** - 8/16-bit and float, optional Deflate, EXIF read and write
//! - **DNG** - uncompressed Bayer raw data, EXIF read
//! - **JPEG** - 8-bit gray and RGB, EXIF read and write
//! - **BMP** - 8-bit gray, RGB, RGBA
//!
//! Headerless formats take their geometry from [`ImageMetadata`], normally
//! a JSON sidecar next to the image (`shot.raw10` + `shot.json`). PNG, TIFF
//! and BMP store mosaics as grayscale; the sidecar keeps the pattern.
//!
//! # Architecture
//!
//! - [`ImageReader`] / [`ImageWriter`] - per-format adapters
//! - [`FormatRegistry`] - format to factory mapping, resolved once per file
//! - [`make_reader`] / [`make_writer`] - adapter construction
//! - [`read_image`] / [`write_image`] - sidecar-aware high-level entry points
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use pixio_io::{read_image, write_image, WriterOptions};
//!
//! // shot.json describes the packed frame
//! let (image, meta) = read_image("shot.raw10", None)?;
//! write_image("shot.tif", &image, WriterOptions::default().with_metadata(meta))?;
//! ```
//!
//! # Feature Flags
//!
//! - `png` - PNG support (default)
//! - `jpeg` - JPEG support (default)
//! - `tiff` - TIFF and DNG support (default)
//! - `bmp` - BMP support (default)
//! - `exif` - EXIF blocks in JPEG and TIFF (default)

use std::path::Path;

use pixio_core::{ImageView, PixelType};
use pixio_meta::{parser, ExifMetadata, ImageMetadata};

use crate::formats::is_mosaic;
use tracing::{debug, info};

pub mod detect;
pub mod error;
pub mod formats;
pub mod options;
pub mod registry;
pub mod traits;

pub use detect::Format;
pub use error::{IoError, IoResult};
pub use options::{ReaderOptions, TiffCompression, WriterOptions};
pub use registry::{FormatInfo, FormatRegistry};
pub use traits::{DynImage, ImageReader, ImageWriter};

/// Creates a reader for `path` using the global registry.
///
/// # Errors
///
/// [`IoError::UnsupportedFormat`] for unknown or recognised-but-unsupported
/// formats; headerless formats fail with [`IoError::MissingData`] when
/// `options.metadata` is absent.
pub fn make_reader<P: AsRef<Path>>(path: P, options: ReaderOptions) -> IoResult<Box<dyn ImageReader>> {
    FormatRegistry::global().make_reader(path.as_ref(), options)
}

/// Creates a writer for `path` using the global registry.
pub fn make_writer<P: AsRef<Path>>(path: P, options: WriterOptions) -> IoResult<Box<dyn ImageWriter>> {
    FormatRegistry::global().make_writer(path.as_ref(), &options)
}

/// Reads an image and its metadata.
///
/// Metadata comes from `metadata_path` when given, otherwise from the
/// sidecar next to the image if one exists. The returned metadata records
/// the sample type and geometry of the decoded image.
///
/// A grayscale image whose metadata records a mosaic pixel type is
/// returned as that mosaic.
pub fn read_image<P: AsRef<Path>>(
    path: P,
    metadata_path: Option<&Path>,
) -> IoResult<(DynImage, ImageMetadata)> {
    let path = path.as_ref();
    let sidecar = parser::read_metadata(path, metadata_path)?;
    let recorded = sidecar
        .as_ref()
        .map(|m| (m.file_info.pixel_type, m.file_info.pixel_precision));
    let reader = make_reader(path, ReaderOptions::new(sidecar.clone()))?;

    let mut meta = reader.read_metadata(sidecar)?;
    let mut image = reader.read()?;
    if let Some((Some(pixel_type), precision)) = recorded {
        if is_mosaic(pixel_type) && image.pixel_type() == PixelType::Grayscale {
            let precision = precision.unwrap_or(image.pixel_precision());
            debug!(path = %path.display(), %pixel_type, "restoring mosaic pattern");
            image = image.with_pixel_type(pixel_type, precision)?;
        }
    }
    meta.file_info.pixel_representation = Some(image.pixel_representation());
    meta.fill_from_image(&image);

    info!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        pixel_type = %image.pixel_type(),
        "read image"
    );
    Ok((image, meta))
}

/// Reads the EXIF block of a JPEG or TIFF file.
pub fn read_exif<P: AsRef<Path>>(path: P) -> IoResult<ExifMetadata> {
    let path = path.as_ref();
    let reader = make_reader(path, ReaderOptions::default())?;
    reader.read_exif()
}

/// Writes an image.
///
/// Headerless outputs also get a JSON sidecar describing their geometry,
/// built from `options.metadata` and the image itself. So do mosaics
/// written to formats that can only label them grayscale.
pub fn write_image<P: AsRef<Path>>(path: P, image: &DynImage, options: WriterOptions) -> IoResult<()> {
    let path = path.as_ref();
    let format = Format::from_extension(path).with_file_format(options.requested_file_format());
    let needs_sidecar =
        format.is_headerless() || (is_mosaic(image.pixel_type()) && format != Format::Cfa);
    let sidecar = needs_sidecar.then(|| describe_output(image, format, options.metadata.clone()));

    let writer = make_writer(path, options)?;
    writer.write(image)?;

    if let Some(meta) = sidecar {
        let sidecar_path = parser::sidecar_path(path);
        parser::write_metadata(&sidecar_path, &meta)?;
        debug!(path = %sidecar_path.display(), "wrote sidecar");
    }
    info!(path = %path.display(), %format, "wrote image");
    Ok(())
}

/// Replaces the EXIF block of an existing file.
///
/// JPEG and TIFF support this; other formats fail with
/// [`IoError::UnsupportedOperation`].
pub fn write_exif<P: AsRef<Path>>(path: P, exif: &ExifMetadata) -> IoResult<()> {
    let writer = make_writer(path, WriterOptions::default())?;
    writer.write_exif(exif)
}

/// Sidecar contents for a headerless or mosaic output.
fn describe_output(image: &DynImage, format: Format, metadata: Option<ImageMetadata>) -> ImageMetadata {
    let mut meta = metadata.unwrap_or_default();
    meta.fill_from_image(image);
    let desc = image.descriptor();
    let file = &mut meta.file_info;
    file.file_format = format.file_format();
    file.pixel_representation = Some(image.pixel_representation());
    file.width_alignment = Some(desc.width_alignment());
    file.height_alignment = Some(desc.height_alignment());
    file.size_alignment = Some(desc.size_alignment());
    meta.synchronize();
    meta
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixio_core::{Image, ImageLayout, LayoutDescriptor, PixelType};
    use pixio_meta::{FileFormat, PixelRepresentation};

    fn bayer16() -> Image<u16> {
        let desc = LayoutDescriptor::builder(6, 2)
            .pixel_type(PixelType::BayerGrbg)
            .pixel_precision(10)
            .width_alignment(8)
            .build()
            .unwrap();
        let len = desc.required_len();
        Image::from_vec(desc, (0..len).map(|i| (i * 37 % 1024) as u16).collect()).unwrap()
    }

    #[test]
    fn test_describe_output_records_layout() {
        let image = DynImage::from(bayer16());
        let meta = describe_output(&image, Format::Raw10, None);
        let file = &meta.file_info;
        assert_eq!(file.width, Some(6));
        assert_eq!(file.file_format, Some(FileFormat::Raw10));
        assert_eq!(file.pixel_representation, Some(PixelRepresentation::Uint16));
        assert_eq!(file.width_alignment, Some(8));
        assert_eq!(file.image_layout, Some(ImageLayout::Planar));
        assert_eq!(meta.exif_metadata.image_width, Some(6));
    }

    #[test]
    fn test_plain_roundtrip_through_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.raw");
        let image = DynImage::from(bayer16());
        write_image(&path, &image, WriterOptions::default()).unwrap();
        assert!(dir.path().join("frame.json").is_file());

        let (back, meta) = read_image(&path, None).unwrap();
        assert_eq!(back, image);
        assert_eq!(meta.file_info.file_format, Some(FileFormat::Plain));
        assert_eq!(meta.file_info.pixel_precision, Some(10));
    }

    #[cfg(feature = "png")]
    #[test]
    fn test_mosaic_survives_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bayer.png");
        let image = DynImage::from(bayer16());
        write_image(&path, &image, WriterOptions::default()).unwrap();
        assert!(dir.path().join("bayer.json").is_file());

        let (back, meta) = read_image(&path, None).unwrap();
        assert_eq!(back.pixel_type(), PixelType::BayerGrbg);
        assert_eq!(back.pixel_precision(), 10);
        assert_eq!(meta.file_info.pixel_type, Some(PixelType::BayerGrbg));
        assert_eq!(meta.file_info.pixel_precision, Some(10));
        let (src, dst) = (image.as_u16().unwrap(), back.as_u16().unwrap());
        for y in 0..2 {
            for x in 0..6 {
                assert_eq!(dst.get(x, y, 0), src.get(x, y, 0));
            }
        }
    }

    #[test]
    fn test_cfa_needs_no_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.cfa");
        let image = DynImage::from(bayer16());
        write_image(&path, &image, WriterOptions::default()).unwrap();
        assert!(!dir.path().join("frame.json").exists());

        let (back, meta) = read_image(&path, None).unwrap();
        assert_eq!(back.pixel_type(), PixelType::BayerGrbg);
        assert_eq!(meta.file_info.pixel_precision, Some(10));
    }

    #[test]
    fn test_headerless_without_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orphan.raw12");
        std::fs::write(&path, [0u8; 12]).unwrap();
        assert!(matches!(read_image(&path, None), Err(IoError::MissingData(_))));
    }
}
