//! JPEG format support.
//!
//! 8-bit grayscale and RGB. With the `exif` feature, EXIF is read from the
//! APP1 segment, written from `WriterOptions::metadata`, and can be replaced
//! in an existing file.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use pixio_core::{Image, ImageRef, ImageView, PixelType};
use pixio_meta::{ImageMetadata, PixelRepresentation};
use tracing::debug;

use crate::formats::{color_channels, interleaved, is_mosaic, Header};
use crate::{ImageReader, ImageWriter, IoError, IoResult, WriterOptions};

fn open_decoder(path: &Path) -> IoResult<jpeg_decoder::Decoder<BufReader<File>>> {
    let file = File::open(path)?;
    Ok(jpeg_decoder::Decoder::new(BufReader::new(file)))
}

/// Reader for JPEG files.
#[derive(Debug)]
pub struct JpegReader {
    path: PathBuf,
    header: Header,
}

impl JpegReader {
    /// Reads the frame header.
    pub fn open(path: &Path) -> IoResult<Self> {
        let mut decoder = open_decoder(path)?;
        decoder.read_info().map_err(IoError::decode)?;
        let info = decoder
            .info()
            .ok_or_else(|| IoError::DecodeError("missing JPEG info".into()))?;

        let pixel_type = match info.pixel_format {
            jpeg_decoder::PixelFormat::L8 => PixelType::Grayscale,
            jpeg_decoder::PixelFormat::RGB24 => PixelType::Rgb,
            other => {
                return Err(IoError::UnsupportedBitDepth(format!("JPEG {other:?}")));
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            header: Header {
                width: u32::from(info.width),
                height: u32::from(info.height),
                pixel_type,
                precision: 8,
                representation: PixelRepresentation::Uint8,
            },
        })
    }
}

impl ImageReader for JpegReader {
    fn pixel_representation(&self) -> PixelRepresentation {
        PixelRepresentation::Uint8
    }

    fn read_metadata(&self, hint: Option<ImageMetadata>) -> IoResult<ImageMetadata> {
        #[cfg(feature = "exif")]
        let hint = crate::formats::exif_tags::merge_exif(&self.path, hint)?;
        Ok(self.header.describe(hint))
    }

    fn read_8u(&self) -> IoResult<Image<u8>> {
        let mut decoder = open_decoder(&self.path)?;
        let pixels = decoder.decode().map_err(IoError::decode)?;
        debug!(path = %self.path.display(), bytes = pixels.len(), "decoded JPEG");
        self.header.image(pixels)
    }

    #[cfg(feature = "exif")]
    fn read_exif(&self) -> IoResult<pixio_meta::ExifMetadata> {
        crate::formats::exif_tags::read_exif(&self.path)
    }
}

/// Writer for JPEG files.
#[derive(Debug)]
pub struct JpegWriter {
    path: PathBuf,
    quality: u8,
    metadata: Option<ImageMetadata>,
}

impl JpegWriter {
    pub fn new(path: &Path, options: &WriterOptions) -> Self {
        Self {
            path: path.to_path_buf(),
            quality: options.jpeg_quality,
            metadata: options.metadata.clone(),
        }
    }
}

impl ImageWriter for JpegWriter {
    fn write_8u(&self, image: &ImageRef<'_, u8>) -> IoResult<()> {
        use jpeg_encoder::{ColorType, Encoder};

        let color_type = match color_channels(image.pixel_type(), "JPEG")? {
            // lossy compression mixes neighbouring filter sites
            1 if is_mosaic(image.pixel_type()) => {
                return Err(IoError::UnsupportedOperation(format!(
                    "JPEG cannot store {} images",
                    image.pixel_type()
                )));
            }
            1 => ColorType::Luma,
            3 => ColorType::Rgb,
            _ => {
                return Err(IoError::UnsupportedOperation(format!(
                    "JPEG cannot store {} images",
                    image.pixel_type()
                )));
            }
        };
        let (width, height) = (image.width(), image.height());
        let (w, h) = match (u16::try_from(width), u16::try_from(height)) {
            (Ok(w), Ok(h)) => (w, h),
            _ => {
                return Err(IoError::EncodeError(format!(
                    "{width}x{height} exceeds the JPEG size limit"
                )));
            }
        };

        let mut buffer = Vec::new();
        let encoder = Encoder::new(&mut buffer, self.quality);
        encoder
            .encode(&interleaved(image), w, h, color_type)
            .map_err(IoError::encode)?;

        #[cfg(feature = "exif")]
        if let Some(exif) = self
            .metadata
            .as_ref()
            .map(|m| &m.exif_metadata)
            .filter(|e| !e.is_empty())
        {
            let payload = crate::formats::exif_tags::app1_payload(exif)?;
            buffer = splice_app1(&buffer, &payload)?;
        }

        fs::write(&self.path, &buffer)?;
        debug!(path = %self.path.display(), quality = self.quality, "wrote JPEG");
        Ok(())
    }

    #[cfg(feature = "exif")]
    fn write_exif(&self, exif: &pixio_meta::ExifMetadata) -> IoResult<()> {
        let jpeg = fs::read(&self.path)?;
        let payload = crate::formats::exif_tags::app1_payload(exif)?;
        fs::write(&self.path, splice_app1(&jpeg, &payload)?)?;
        debug!(path = %self.path.display(), "replaced EXIF");
        Ok(())
    }
}

const SOI: [u8; 2] = [0xFF, 0xD8];
const APP0: u8 = 0xE0;
const APP1: u8 = 0xE1;

/// Inserts an APP1 segment after SOI and any APP0 (JFIF) segment,
/// dropping existing EXIF APP1 segments.
pub fn splice_app1(jpeg: &[u8], payload: &[u8]) -> IoResult<Vec<u8>> {
    if !jpeg.starts_with(&SOI) {
        return Err(IoError::InvalidFile("missing JPEG start-of-image marker".into()));
    }
    let segment_len = u16::try_from(payload.len() + 2)
        .map_err(|_| IoError::EncodeError(format!("APP1 payload of {} bytes", payload.len())))?;

    let mut head = SOI.to_vec();
    let mut rest = Vec::new();
    let mut pos = SOI.len();
    while pos + 4 <= jpeg.len() && jpeg[pos] == 0xFF && (0xE0..=0xEF).contains(&jpeg[pos + 1]) {
        let marker = jpeg[pos + 1];
        let len = usize::from(u16::from_be_bytes([jpeg[pos + 2], jpeg[pos + 3]]));
        let end = pos + 2 + len;
        if len < 2 || end > jpeg.len() {
            return Err(IoError::InvalidFile(format!("truncated APP{} segment", marker - APP0)));
        }
        let segment = &jpeg[pos..end];
        let is_exif = marker == APP1 && segment[4..].starts_with(b"Exif\0\0");
        if marker == APP0 {
            head.extend_from_slice(segment);
        } else if !is_exif {
            rest.extend_from_slice(segment);
        }
        pos = end;
    }

    let mut out = Vec::with_capacity(jpeg.len() + payload.len() + 4);
    out.extend_from_slice(&head);
    out.extend_from_slice(&[0xFF, APP1]);
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(payload);
    out.extend_from_slice(&rest);
    out.extend_from_slice(&jpeg[pos..]);
    Ok(out)
}
