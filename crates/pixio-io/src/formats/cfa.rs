//! CFA files: a Bayer mosaic behind a small fixed header.
//!
//! ```text
//! offset  size  field
//!      0     4  width
//!      4     4  height
//!      8     4  pattern (0 RGGB, 1 GRBG, 2 GBRG, 3 BGGR)
//!     12     4  bits per sample, 1..=16
//!     16     -  width * height u16 samples, row-major
//! ```
//!
//! Every field is little-endian. Unlike the headerless formats the file
//! describes itself, so no sidecar is needed to read it.

use std::fs;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use byteorder::{ByteOrder, LittleEndian};
use pixio_core::{Image, ImageRef, ImageView, PixelType};
use pixio_meta::{ImageMetadata, PixelRepresentation};
use tracing::{debug, warn};

use crate::formats::{check_single_channel, interleaved, Header};
use crate::{ImageReader, ImageWriter, IoError, IoResult};

/// Size of the fixed header in bytes.
pub const HEADER_LEN: usize = 16;

const PATTERNS: [PixelType; 4] = [
    PixelType::BayerRggb,
    PixelType::BayerGrbg,
    PixelType::BayerGbrg,
    PixelType::BayerBggr,
];

fn pattern_code(pixel_type: PixelType) -> Option<u32> {
    PATTERNS
        .iter()
        .position(|&p| p == pixel_type)
        .and_then(|i| u32::try_from(i).ok())
}

fn parse_header(path: &Path, bytes: &[u8; HEADER_LEN]) -> IoResult<Header> {
    let invalid = |what: String| IoError::InvalidFile(format!("{}: {what}", path.display()));
    let width = LittleEndian::read_u32(&bytes[0..4]);
    let height = LittleEndian::read_u32(&bytes[4..8]);
    let code = LittleEndian::read_u32(&bytes[8..12]);
    let bits = LittleEndian::read_u32(&bytes[12..16]);

    if width == 0 || height == 0 {
        return Err(invalid(format!("empty {width}x{height} mosaic")));
    }
    let pixel_type = usize::try_from(code)
        .ok()
        .and_then(|i| PATTERNS.get(i).copied())
        .ok_or_else(|| invalid(format!("unknown CFA pattern {code}")))?;
    let precision = u8::try_from(bits)
        .ok()
        .filter(|b| (1..=16).contains(b))
        .ok_or_else(|| invalid(format!("{bits} bits per sample")))?;

    Ok(Header {
        width,
        height,
        pixel_type,
        precision,
        representation: PixelRepresentation::Uint16,
    })
}

/// Reader for CFA files.
#[derive(Debug)]
pub struct CfaReader {
    path: PathBuf,
    header: Header,
}

impl CfaReader {
    /// Parses the fixed header.
    pub fn open(path: &Path) -> IoResult<Self> {
        let mut bytes = [0u8; HEADER_LEN];
        File::open(path)?.read_exact(&mut bytes).map_err(|e| match e.kind() {
            std::io::ErrorKind::UnexpectedEof => {
                IoError::InvalidFile(format!("{}: truncated CFA header", path.display()))
            }
            _ => IoError::Io(e),
        })?;
        let header = parse_header(path, &bytes)?;
        debug!(path = %path.display(), width = header.width, height = header.height, pattern = %header.pixel_type, "opened CFA");
        Ok(Self {
            path: path.to_path_buf(),
            header,
        })
    }
}

impl ImageReader for CfaReader {
    fn pixel_representation(&self) -> PixelRepresentation {
        PixelRepresentation::Uint16
    }

    fn read_metadata(&self, hint: Option<ImageMetadata>) -> IoResult<ImageMetadata> {
        Ok(self.header.describe(hint))
    }

    fn read_16u(&self) -> IoResult<Image<u16>> {
        let bytes = fs::read(&self.path)?;
        let len = self.header.width as usize * self.header.height as usize;
        let needed = HEADER_LEN + len * 2;
        if bytes.len() < needed {
            return Err(IoError::InvalidFile(format!(
                "{}: {} bytes, {}x{} mosaic needs {needed}",
                self.path.display(),
                bytes.len(),
                self.header.width,
                self.header.height
            )));
        }
        if bytes.len() > needed {
            warn!(
                path = %self.path.display(),
                extra = bytes.len() - needed,
                "trailing bytes after image data"
            );
        }

        let mut data = vec![0u16; len];
        LittleEndian::read_u16_into(&bytes[HEADER_LEN..needed], &mut data);
        self.header.image(data)
    }
}

/// Writer for CFA files.
#[derive(Debug)]
pub struct CfaWriter {
    path: PathBuf,
}

impl CfaWriter {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl ImageWriter for CfaWriter {
    /// Writes a 2x2 Bayer mosaic. A precision of 0 is stored as 16 bits.
    fn write_16u(&self, image: &ImageRef<'_, u16>) -> IoResult<()> {
        check_single_channel(image.descriptor(), "CFA")?;
        let code = pattern_code(image.pixel_type()).ok_or_else(|| {
            IoError::UnsupportedOperation(format!("CFA cannot store {} images", image.pixel_type()))
        })?;
        let bits = match image.pixel_precision() {
            0 => 16,
            bits => u32::from(bits.min(16)),
        };

        let samples = interleaved(image);
        let mut bytes = vec![0u8; HEADER_LEN + samples.len() * 2];
        LittleEndian::write_u32_into(&[image.width(), image.height(), code, bits], &mut bytes[..HEADER_LEN]);
        LittleEndian::write_u16_into(&samples, &mut bytes[HEADER_LEN..]);
        fs::write(&self.path, &bytes)?;
        debug!(path = %self.path.display(), pattern = %image.pixel_type(), bits, "wrote CFA");
        Ok(())
    }
}
