//! Plain headerless images.
//!
//! The file holds the samples of a [`LayoutDescriptor`] buffer verbatim,
//! little-endian, padding included. Nothing in the file describes them, so
//! reading needs `fileInfo` metadata (usually from a JSON sidecar).

use std::fs;
use std::path::{Path, PathBuf};

use byteorder::{ByteOrder, LittleEndian};
use pixio_core::{Image, ImageRef, ImageView, LayoutDescriptor, Sample};
use pixio_meta::{FileFormat, FileInfo, ImageMetadata, PixelRepresentation};
use tracing::{debug, warn};

use crate::{ImageReader, ImageWriter, IoError, IoResult, ReaderOptions};

/// Sample type of a plain file: explicit, or guessed from the precision.
pub fn representation_of(info: &FileInfo) -> PixelRepresentation {
    info.pixel_representation.unwrap_or(match info.pixel_precision {
        Some(bits) if bits > 16 => PixelRepresentation::Float,
        Some(bits) if bits > 8 => PixelRepresentation::Uint16,
        _ => PixelRepresentation::Uint8,
    })
}

/// Reader for plain files.
#[derive(Debug)]
pub struct PlainReader {
    path: PathBuf,
    metadata: ImageMetadata,
    layout: LayoutDescriptor,
    representation: PixelRepresentation,
}

impl PlainReader {
    /// Prepares a reader; geometry comes from `options.metadata.fileInfo`.
    pub fn open(path: &Path, options: ReaderOptions) -> IoResult<Self> {
        let metadata = options.metadata.ok_or_else(|| {
            IoError::MissingData(format!(
                "{} has no header; fileInfo metadata is required",
                path.display()
            ))
        })?;
        let layout = metadata.file_info.to_layout()?;
        let representation = representation_of(&metadata.file_info);
        Ok(Self {
            path: path.to_path_buf(),
            metadata,
            layout,
            representation,
        })
    }

    fn read_samples<T: Sample>(
        &self,
        representation: PixelRepresentation,
        decode: fn(&[u8], &mut [T]),
    ) -> IoResult<Image<T>> {
        if representation != self.representation {
            return Err(IoError::UnsupportedBitDepth(format!(
                "{} holds {} samples, {} requested",
                self.path.display(),
                self.representation,
                representation
            )));
        }

        let bytes = fs::read(&self.path)?;
        let len = self.layout.required_len();
        let needed = len * std::mem::size_of::<T>();
        if bytes.len() < needed {
            return Err(IoError::InvalidFile(format!(
                "{}: {} bytes, layout needs {needed}",
                self.path.display(),
                bytes.len()
            )));
        }
        if bytes.len() > needed {
            warn!(
                path = %self.path.display(),
                extra = bytes.len() - needed,
                "trailing bytes after image data"
            );
        }

        let mut data = vec![T::default(); len];
        decode(&bytes[..needed], &mut data);
        debug!(path = %self.path.display(), %representation, len, "read plain samples");
        Ok(Image::from_vec(self.layout.clone(), data)?)
    }
}

impl ImageReader for PlainReader {
    fn pixel_representation(&self) -> PixelRepresentation {
        self.representation
    }

    fn read_metadata(&self, hint: Option<ImageMetadata>) -> IoResult<ImageMetadata> {
        let mut meta = hint.unwrap_or_else(|| self.metadata.clone());
        let file = &mut meta.file_info;
        file.file_format.get_or_insert(FileFormat::Plain);
        file.pixel_representation = Some(self.representation);
        meta.synchronize();
        Ok(meta)
    }

    fn read_8u(&self) -> IoResult<Image<u8>> {
        self.read_samples::<u8>(PixelRepresentation::Uint8, |src, dst| dst.copy_from_slice(src))
    }

    fn read_16u(&self) -> IoResult<Image<u16>> {
        self.read_samples(PixelRepresentation::Uint16, LittleEndian::read_u16_into)
    }

    fn read_f(&self) -> IoResult<Image<f32>> {
        self.read_samples(PixelRepresentation::Float, LittleEndian::read_f32_into)
    }
}

/// Writer for plain files.
#[derive(Debug)]
pub struct PlainWriter {
    path: PathBuf,
}

impl PlainWriter {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    fn write_samples<T: Sample>(&self, image: &ImageRef<'_, T>, encode: fn(&[T], &mut [u8])) -> IoResult<()> {
        let samples = &image.data()[..image.descriptor().required_len()];
        let mut bytes = vec![0u8; std::mem::size_of_val(samples)];
        encode(samples, &mut bytes);
        fs::write(&self.path, &bytes)?;
        debug!(path = %self.path.display(), len = samples.len(), "wrote plain samples");
        Ok(())
    }
}

impl ImageWriter for PlainWriter {
    fn write_8u(&self, image: &ImageRef<'_, u8>) -> IoResult<()> {
        self.write_samples(image, |src, dst| dst.copy_from_slice(src))
    }

    fn write_16u(&self, image: &ImageRef<'_, u16>) -> IoResult<()> {
        self.write_samples(image, LittleEndian::write_u16_into)
    }

    fn write_f(&self, image: &ImageRef<'_, f32>) -> IoResult<()> {
        self.write_samples(image, LittleEndian::write_f32_into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixio_core::{ImageLayout, PixelType};

    fn gray_meta(precision: u8) -> ImageMetadata {
        let mut meta = ImageMetadata::default();
        let file = &mut meta.file_info;
        file.width = Some(3);
        file.height = Some(2);
        file.pixel_type = Some(PixelType::Grayscale);
        file.pixel_precision = Some(precision);
        meta
    }

    #[test]
    fn test_representation_guess() {
        let mut info = FileInfo::default();
        assert_eq!(representation_of(&info), PixelRepresentation::Uint8);
        info.pixel_precision = Some(10);
        assert_eq!(representation_of(&info), PixelRepresentation::Uint16);
        info.pixel_precision = Some(32);
        assert_eq!(representation_of(&info), PixelRepresentation::Float);
        info.pixel_representation = Some(PixelRepresentation::Uint8);
        assert_eq!(representation_of(&info), PixelRepresentation::Uint8);
    }

    #[test]
    fn test_reads_little_endian() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gray.plain");
        let samples: [u16; 6] = [1, 2, 0x0300, 4, 5, 0xFFFF];
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        fs::write(&path, bytes).unwrap();

        let reader = PlainReader::open(&path, ReaderOptions::new(Some(gray_meta(12)))).unwrap();
        assert_eq!(reader.pixel_representation(), PixelRepresentation::Uint16);
        let img = reader.read_16u().unwrap();
        assert_eq!(img.data(), &samples);
        assert_eq!(img.pixel_precision(), 12);
        assert!(matches!(reader.read_8u(), Err(IoError::UnsupportedBitDepth(_))));
    }

    #[test]
    fn test_short_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.plain");
        fs::write(&path, [0u8; 5]).unwrap();
        let reader = PlainReader::open(&path, ReaderOptions::new(Some(gray_meta(8)))).unwrap();
        assert!(matches!(reader.read_8u(), Err(IoError::InvalidFile(_))));
    }

    #[test]
    fn test_float_roundtrip_with_padding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rgb.plain");
        let desc = LayoutDescriptor::builder(3, 2)
            .pixel_type(PixelType::Rgb)
            .image_layout(ImageLayout::Interleaved)
            .width_alignment(4)
            .build()
            .unwrap();
        let mut img = Image::<f32>::new(desc);
        img.set(2, 1, 2, 0.75);
        img.set(0, 0, 0, -1.5);
        PlainWriter::new(&path).write_f(&img.view()).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().len(), 12 * 2 * 4);

        let mut meta = ImageMetadata::default();
        meta.file_info.width = Some(3);
        meta.file_info.height = Some(2);
        meta.file_info.pixel_type = Some(PixelType::Rgb);
        meta.file_info.image_layout = Some(ImageLayout::Interleaved);
        meta.file_info.width_alignment = Some(4);
        meta.file_info.pixel_representation = Some(PixelRepresentation::Float);
        let reader = PlainReader::open(&path, ReaderOptions::new(Some(meta))).unwrap();
        let back = reader.read_f().unwrap();
        assert_eq!(back, img);

        let meta = reader.read_metadata(None).unwrap();
        assert_eq!(meta.file_info.file_format, Some(FileFormat::Plain));
    }
}
