//! PNG format support.
//!
//! 8-bit and 16-bit grayscale, gray-alpha, RGB and RGBA. Palette and
//! sub-byte images are expanded to 8-bit on read. Images are always
//! returned interleaved.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, ByteOrder};
use pixio_core::{Image, ImageRef, ImageView};
use pixio_meta::{ImageMetadata, PixelRepresentation};
use tracing::debug;

use crate::formats::{color_channels, color_pixel_type, interleaved, Header};
use crate::{ImageReader, ImageWriter, IoError, IoResult};

fn open_decoder(path: &Path) -> IoResult<png::Reader<BufReader<File>>> {
    let file = File::open(path)?;
    let mut decoder = png::Decoder::new(BufReader::new(file));
    decoder.set_transformations(png::Transformations::EXPAND);
    decoder.read_info().map_err(IoError::decode)
}

/// Reader for PNG files.
#[derive(Debug)]
pub struct PngReader {
    path: PathBuf,
    header: Header,
}

impl PngReader {
    /// Reads the PNG header.
    pub fn open(path: &Path) -> IoResult<Self> {
        let reader = open_decoder(path)?;
        let (color_type, bit_depth) = reader.output_color_type();
        let info = reader.info();

        let channels = color_type.samples();
        let pixel_type = color_pixel_type(channels).ok_or_else(|| {
            IoError::UnsupportedBitDepth(format!("{color_type:?} {bit_depth:?}"))
        })?;
        let (precision, representation) = match bit_depth {
            png::BitDepth::Sixteen => (16, PixelRepresentation::Uint16),
            _ => (8, PixelRepresentation::Uint8),
        };

        Ok(Self {
            path: path.to_path_buf(),
            header: Header {
                width: info.width,
                height: info.height,
                pixel_type,
                precision,
                representation,
            },
        })
    }

    fn decode(&self, representation: PixelRepresentation) -> IoResult<Vec<u8>> {
        if representation != self.header.representation {
            return Err(IoError::UnsupportedBitDepth(format!(
                "{} is {}, {} requested",
                self.path.display(),
                self.header.representation,
                representation
            )));
        }

        let mut reader = open_decoder(&self.path)?;
        let buf_size = reader
            .output_buffer_size()
            .ok_or_else(|| IoError::DecodeError("cannot determine output buffer size".into()))?;
        let mut buf = vec![0u8; buf_size];
        let info = reader.next_frame(&mut buf).map_err(IoError::decode)?;
        buf.truncate(info.buffer_size());
        debug!(path = %self.path.display(), bytes = buf.len(), "decoded PNG");
        Ok(buf)
    }
}

impl ImageReader for PngReader {
    fn pixel_representation(&self) -> PixelRepresentation {
        self.header.representation
    }

    fn read_metadata(&self, hint: Option<ImageMetadata>) -> IoResult<ImageMetadata> {
        Ok(self.header.describe(hint))
    }

    fn read_8u(&self) -> IoResult<Image<u8>> {
        let buf = self.decode(PixelRepresentation::Uint8)?;
        self.header.image(buf)
    }

    fn read_16u(&self) -> IoResult<Image<u16>> {
        let buf = self.decode(PixelRepresentation::Uint16)?;
        let mut data = vec![0u16; buf.len() / 2];
        BigEndian::read_u16_into(&buf, &mut data);
        self.header.image(data)
    }
}

/// Writer for PNG files.
#[derive(Debug)]
pub struct PngWriter {
    path: PathBuf,
}

impl PngWriter {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    fn encode(&self, image: &dyn ImageView, depth: png::BitDepth, bytes: &[u8]) -> IoResult<()> {
        let color_type = match color_channels(image.pixel_type(), "PNG")? {
            1 => png::ColorType::Grayscale,
            2 => png::ColorType::GrayscaleAlpha,
            3 => png::ColorType::Rgb,
            _ => png::ColorType::Rgba,
        };

        let file = BufWriter::new(File::create(&self.path)?);
        let mut encoder = png::Encoder::new(file, image.width(), image.height());
        encoder.set_color(color_type);
        encoder.set_depth(depth);

        let mut writer = encoder.write_header().map_err(IoError::encode)?;
        writer.write_image_data(bytes).map_err(IoError::encode)?;
        writer.finish().map_err(IoError::encode)?;
        debug!(path = %self.path.display(), ?color_type, ?depth, "wrote PNG");
        Ok(())
    }
}

impl ImageWriter for PngWriter {
    fn write_8u(&self, image: &ImageRef<'_, u8>) -> IoResult<()> {
        color_channels(image.pixel_type(), "PNG")?;
        self.encode(image, png::BitDepth::Eight, &interleaved(image))
    }

    fn write_16u(&self, image: &ImageRef<'_, u16>) -> IoResult<()> {
        color_channels(image.pixel_type(), "PNG")?;
        let samples = interleaved(image);
        let mut bytes = vec![0u8; samples.len() * 2];
        BigEndian::write_u16_into(&samples, &mut bytes);
        self.encode(image, png::BitDepth::Sixteen, &bytes)
    }
}
