//! BMP format support.
//!
//! 8-bit RGB and RGBA through the `image` crate's BMP codec. Palette files
//! are expanded to RGB on read. Images are always returned interleaved.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use image::codecs::bmp::{BmpDecoder, BmpEncoder};
use image::{ColorType, ExtendedColorType, ImageDecoder, ImageEncoder};
use pixio_core::{Image, ImageRef, ImageView};
use pixio_meta::{ImageMetadata, PixelRepresentation};
use tracing::debug;

use crate::formats::{color_channels, color_pixel_type, interleaved, Header};
use crate::{ImageReader, ImageWriter, IoError, IoResult};

fn open_decoder(path: &Path) -> IoResult<BmpDecoder<BufReader<File>>> {
    let file = File::open(path)?;
    BmpDecoder::new(BufReader::new(file)).map_err(IoError::decode)
}

/// Reader for BMP files.
#[derive(Debug)]
pub struct BmpReader {
    path: PathBuf,
    header: Header,
}

impl BmpReader {
    /// Reads the bitmap header.
    pub fn open(path: &Path) -> IoResult<Self> {
        let decoder = open_decoder(path)?;
        let (width, height) = decoder.dimensions();
        let channels = match decoder.color_type() {
            ColorType::L8 => 1,
            ColorType::La8 => 2,
            ColorType::Rgb8 => 3,
            ColorType::Rgba8 => 4,
            other => {
                return Err(IoError::UnsupportedBitDepth(format!("BMP {other:?}")));
            }
        };
        let pixel_type = color_pixel_type(channels)
            .ok_or_else(|| IoError::UnsupportedFormat(format!("{channels}-channel BMP")))?;

        Ok(Self {
            path: path.to_path_buf(),
            header: Header {
                width,
                height,
                pixel_type,
                precision: 8,
                representation: PixelRepresentation::Uint8,
            },
        })
    }
}

impl ImageReader for BmpReader {
    fn pixel_representation(&self) -> PixelRepresentation {
        PixelRepresentation::Uint8
    }

    fn read_metadata(&self, hint: Option<ImageMetadata>) -> IoResult<ImageMetadata> {
        Ok(self.header.describe(hint))
    }

    fn read_8u(&self) -> IoResult<Image<u8>> {
        let decoder = open_decoder(&self.path)?;
        let len = usize::try_from(decoder.total_bytes())
            .map_err(|_| IoError::DecodeError("BMP too large for memory".into()))?;
        let mut buf = vec![0u8; len];
        decoder.read_image(&mut buf).map_err(IoError::decode)?;
        debug!(path = %self.path.display(), bytes = buf.len(), "decoded BMP");
        self.header.image(buf)
    }
}

/// Writer for BMP files.
#[derive(Debug)]
pub struct BmpWriter {
    path: PathBuf,
}

impl BmpWriter {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl ImageWriter for BmpWriter {
    fn write_8u(&self, image: &ImageRef<'_, u8>) -> IoResult<()> {
        let color_type = match color_channels(image.pixel_type(), "BMP")? {
            1 => ExtendedColorType::L8,
            2 => ExtendedColorType::La8,
            3 => ExtendedColorType::Rgb8,
            _ => ExtendedColorType::Rgba8,
        };

        let mut file = BufWriter::new(File::create(&self.path)?);
        BmpEncoder::new(&mut file)
            .write_image(&interleaved(image), image.width(), image.height(), color_type)
            .map_err(IoError::encode)?;
        debug!(path = %self.path.display(), ?color_type, "wrote BMP");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixio_core::{ImageLayout, LayoutDescriptor, PixelType};

    #[test]
    fn test_roundtrip_rgb8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rgb.bmp");
        // odd width exercises the 4-byte row padding
        let desc = LayoutDescriptor::builder(5, 3)
            .pixel_type(PixelType::Rgb)
            .image_layout(ImageLayout::Planar)
            .build()
            .unwrap();
        let len = desc.required_len();
        let img = Image::from_vec(desc, (0..len).map(|i| (i * 5) as u8).collect()).unwrap();
        BmpWriter::new(&path).write_8u(&img.view()).unwrap();

        let reader = BmpReader::open(&path).unwrap();
        let back = reader.read_8u().unwrap();
        assert_eq!(back.pixel_type(), PixelType::Rgb);
        assert_eq!(back.image_layout(), ImageLayout::Interleaved);
        for y in 0..3 {
            for x in 0..5 {
                for c in 0..3 {
                    assert_eq!(back.get(x, y, c), img.get(x, y, c));
                }
            }
        }

        let meta = reader.read_metadata(None).unwrap();
        assert_eq!(meta.file_info.width, Some(5));
        assert_eq!(meta.file_info.pixel_precision, Some(8));
    }

    #[test]
    fn test_no_16bit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deep.bmp");
        let desc = LayoutDescriptor::builder(2, 2)
            .pixel_type(PixelType::Rgb)
            .build()
            .unwrap();
        let img = Image::<u16>::new(desc);
        assert!(matches!(
            BmpWriter::new(&path).write_16u(&img.view()),
            Err(IoError::UnsupportedBitDepth(_))
        ));
    }
}
