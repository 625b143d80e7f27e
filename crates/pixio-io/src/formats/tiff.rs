//! TIFF format support.
//!
//! 8-bit, 16-bit and 32-bit float grayscale, RGB and RGBA, uncompressed or
//! Deflate. Mosaics are written as grayscale. With the `exif` feature EXIF
//! fields are read from the file's IFDs, and [`ImageWriter::write_exif`]
//! rewrites the file uncompressed with the new fields.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use pixio_core::{Image, ImageRef, ImageView};
use pixio_meta::{ImageMetadata, PixelRepresentation};
use tiff::ColorType;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::compression::DeflateLevel;
use tiff::encoder::{Compression, TiffEncoder, TiffValue, colortype};
use tracing::debug;

use crate::formats::{color_channels, color_pixel_type, interleaved, Header};
use crate::{ImageReader, ImageWriter, IoError, IoResult, TiffCompression};

fn open_decoder(path: &Path) -> IoResult<Decoder<BufReader<File>>> {
    let file = File::open(path)?;
    Decoder::new(BufReader::new(file)).map_err(IoError::decode)
}

/// Reader for TIFF files.
#[derive(Debug)]
pub struct TiffReader {
    path: PathBuf,
    header: Header,
}

impl TiffReader {
    /// Reads the first IFD's dimensions and colour type.
    pub fn open(path: &Path) -> IoResult<Self> {
        let mut decoder = open_decoder(path)?;
        let (width, height) = decoder.dimensions().map_err(IoError::decode)?;
        let color_type = decoder.colortype().map_err(IoError::decode)?;

        let (channels, bits) = match color_type {
            ColorType::Gray(bits) => (1, bits),
            ColorType::GrayA(bits) => (2, bits),
            ColorType::RGB(bits) => (3, bits),
            ColorType::RGBA(bits) => (4, bits),
            other => {
                return Err(IoError::UnsupportedFormat(format!(
                    "TIFF colour type {other:?}"
                )));
            }
        };
        let representation = match bits {
            8 => PixelRepresentation::Uint8,
            16 => PixelRepresentation::Uint16,
            32 => PixelRepresentation::Float,
            other => {
                return Err(IoError::UnsupportedBitDepth(format!("{other}-bit TIFF")));
            }
        };
        let pixel_type = color_pixel_type(channels)
            .ok_or_else(|| IoError::UnsupportedFormat(format!("{channels}-channel TIFF")))?;

        Ok(Self {
            path: path.to_path_buf(),
            header: Header {
                width,
                height,
                pixel_type,
                precision: bits,
                representation,
            },
        })
    }

    fn decode(&self) -> IoResult<DecodingResult> {
        let mut decoder = open_decoder(&self.path)?;
        let result = decoder.read_image().map_err(IoError::decode)?;
        debug!(path = %self.path.display(), "decoded TIFF");
        Ok(result)
    }

    fn mismatch(&self, requested: &str) -> IoError {
        IoError::UnsupportedBitDepth(format!(
            "{} is {}, {requested} requested",
            self.path.display(),
            self.header.representation
        ))
    }
}

impl ImageReader for TiffReader {
    fn pixel_representation(&self) -> PixelRepresentation {
        self.header.representation
    }

    fn read_metadata(&self, hint: Option<ImageMetadata>) -> IoResult<ImageMetadata> {
        #[cfg(feature = "exif")]
        let hint = crate::formats::exif_tags::merge_exif(&self.path, hint)?;
        Ok(self.header.describe(hint))
    }

    fn read_8u(&self) -> IoResult<Image<u8>> {
        match self.decode()? {
            DecodingResult::U8(buf) => self.header.image(buf),
            _ => Err(self.mismatch("UINT8")),
        }
    }

    fn read_16u(&self) -> IoResult<Image<u16>> {
        match self.decode()? {
            DecodingResult::U16(buf) => self.header.image(buf),
            _ => Err(self.mismatch("UINT16")),
        }
    }

    fn read_f(&self) -> IoResult<Image<f32>> {
        match self.decode()? {
            DecodingResult::F32(buf) => self.header.image(buf),
            _ => Err(self.mismatch("FLOAT")),
        }
    }

    #[cfg(feature = "exif")]
    fn read_exif(&self) -> IoResult<pixio_meta::ExifMetadata> {
        crate::formats::exif_tags::read_exif(&self.path)
    }
}

/// Writer for TIFF files.
#[derive(Debug)]
pub struct TiffWriter {
    path: PathBuf,
    compression: TiffCompression,
}

impl TiffWriter {
    pub fn new(path: &Path, compression: TiffCompression) -> Self {
        Self {
            path: path.to_path_buf(),
            compression,
        }
    }

    fn encode<C>(&self, width: u32, height: u32, data: &[C::Inner]) -> IoResult<()>
    where
        C: colortype::ColorType,
        [C::Inner]: TiffValue,
    {
        let compression = match self.compression {
            TiffCompression::None => Compression::Uncompressed,
            TiffCompression::Deflate => Compression::Deflate(DeflateLevel::default()),
        };
        let file = BufWriter::new(File::create(&self.path)?);
        TiffEncoder::new(file)
            .map_err(IoError::encode)?
            .with_compression(compression)
            .write_image::<C>(width, height, data)
            .map_err(IoError::encode)?;
        debug!(path = %self.path.display(), width, height, compression = ?self.compression, "wrote TIFF");
        Ok(())
    }
}

impl ImageWriter for TiffWriter {
    fn write_8u(&self, image: &ImageRef<'_, u8>) -> IoResult<()> {
        let (w, h) = (image.width(), image.height());
        match color_channels(image.pixel_type(), "TIFF")? {
            1 => self.encode::<colortype::Gray8>(w, h, &interleaved(image)),
            3 => self.encode::<colortype::RGB8>(w, h, &interleaved(image)),
            4 => self.encode::<colortype::RGBA8>(w, h, &interleaved(image)),
            _ => Err(unsupported_gray_alpha()),
        }
    }

    fn write_16u(&self, image: &ImageRef<'_, u16>) -> IoResult<()> {
        let (w, h) = (image.width(), image.height());
        match color_channels(image.pixel_type(), "TIFF")? {
            1 => self.encode::<colortype::Gray16>(w, h, &interleaved(image)),
            3 => self.encode::<colortype::RGB16>(w, h, &interleaved(image)),
            4 => self.encode::<colortype::RGBA16>(w, h, &interleaved(image)),
            _ => Err(unsupported_gray_alpha()),
        }
    }

    fn write_f(&self, image: &ImageRef<'_, f32>) -> IoResult<()> {
        let (w, h) = (image.width(), image.height());
        match color_channels(image.pixel_type(), "TIFF")? {
            1 => self.encode::<colortype::Gray32Float>(w, h, &interleaved(image)),
            3 => self.encode::<colortype::RGB32Float>(w, h, &interleaved(image)),
            4 => self.encode::<colortype::RGBA32Float>(w, h, &interleaved(image)),
            _ => Err(unsupported_gray_alpha()),
        }
    }

    #[cfg(feature = "exif")]
    fn write_exif(&self, exif: &pixio_meta::ExifMetadata) -> IoResult<()> {
        use byteorder::{ByteOrder, LittleEndian};
        use crate::formats::exif_tags::{encode_tiff, StripLayout};

        let reader = TiffReader::open(&self.path)?;
        let header = reader.header;
        let (bits, float, strip) = match reader.decode()? {
            DecodingResult::U8(buf) => (8, false, buf),
            DecodingResult::U16(buf) => {
                let mut bytes = vec![0u8; buf.len() * 2];
                LittleEndian::write_u16_into(&buf, &mut bytes);
                (16, false, bytes)
            }
            DecodingResult::F32(buf) => {
                let mut bytes = vec![0u8; buf.len() * 4];
                LittleEndian::write_f32_into(&buf, &mut bytes);
                (32, true, bytes)
            }
            _ => return Err(reader.mismatch("8-bit, 16-bit or float samples")),
        };
        let channels = color_channels(header.pixel_type, "TIFF")?;
        let layout = StripLayout {
            width: header.width,
            height: header.height,
            channels: u16::try_from(channels).map_err(IoError::encode)?,
            bits,
            float,
        };

        let file = encode_tiff(&layout, &strip, exif)?;
        std::fs::write(&self.path, file)?;
        debug!(path = %self.path.display(), "rewrote TIFF with EXIF");
        Ok(())
    }
}

fn unsupported_gray_alpha() -> IoError {
    IoError::UnsupportedOperation("TIFF writer has no GRAY_ALPHA colour type".into())
}
