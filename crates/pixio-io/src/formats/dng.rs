//! DNG raw mosaics.
//!
//! The IFD chain and every SubIFD hanging off it are searched for the
//! full-resolution image (`NewSubfileType` 0) carrying a 2x2 `CFAPattern`.
//! Its samples must be uncompressed 8- or 16-bit strips. `WhiteLevel`, when
//! present, gives the pixel precision.
//!
//! The directories are parsed with the `tiff` crate, but the strips are read
//! directly: the crate does not decode the CFA photometric interpretation.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use pixio_core::{Image, PixelType};
use pixio_meta::{ImageMetadata, PixelRepresentation};
use tiff::decoder::Decoder;
use tiff::tags::{IfdPointer, Tag};
use tiff::TiffResult;
use tracing::debug;

use crate::formats::Header;
use crate::{ImageReader, IoError, IoResult};

const CFA_REPEAT_PATTERN_DIM: Tag = Tag::Unknown(33421);
const CFA_PATTERN: Tag = Tag::Unknown(33422);
const WHITE_LEVEL: Tag = Tag::Unknown(50717);

/// Guards against cyclic or absurdly long IFD chains.
const MAX_IFDS: usize = 64;

/// Tags of one image directory.
#[derive(Debug)]
struct RawIfd {
    width: u32,
    height: u32,
    bits: Option<Vec<u16>>,
    samples: u16,
    compression: u16,
    subfile_type: u32,
    pattern_dim: Option<Vec<u16>>,
    pattern: Option<Vec<u8>>,
    white_level: Option<u32>,
    strip_offsets: Option<Vec<u64>>,
    strip_byte_counts: Option<Vec<u64>>,
    sub_ifds: Vec<u64>,
    next: Option<IfdPointer>,
}

fn read_ifd<R: Read + Seek>(decoder: &mut Decoder<R>, ptr: IfdPointer) -> TiffResult<RawIfd> {
    let dir = decoder.read_directory(ptr)?;
    let next = dir.next();
    let mut tags = decoder.read_directory_tags(&dir);
    Ok(RawIfd {
        width: tags.find_tag_unsigned(Tag::ImageWidth)?.unwrap_or(0),
        height: tags.find_tag_unsigned(Tag::ImageLength)?.unwrap_or(0),
        bits: tags.find_tag_unsigned_vec(Tag::BitsPerSample)?,
        samples: tags.find_tag_unsigned(Tag::SamplesPerPixel)?.unwrap_or(1),
        compression: tags.find_tag_unsigned(Tag::Compression)?.unwrap_or(1),
        subfile_type: tags.find_tag_unsigned(Tag::NewSubfileType)?.unwrap_or(0),
        pattern_dim: tags.find_tag_unsigned_vec(CFA_REPEAT_PATTERN_DIM)?,
        pattern: tags.find_tag_unsigned_vec(CFA_PATTERN)?,
        white_level: tags.find_tag_unsigned(WHITE_LEVEL)?,
        strip_offsets: tags.find_tag_unsigned_vec(Tag::StripOffsets)?,
        strip_byte_counts: tags.find_tag_unsigned_vec(Tag::StripByteCounts)?,
        sub_ifds: tags.find_tag_unsigned_vec(Tag::SubIfd)?.unwrap_or_default(),
        next,
    })
}

/// Finds the first full-resolution CFA directory.
fn find_raw_ifd<R: Read + Seek>(decoder: &mut Decoder<R>) -> TiffResult<Option<RawIfd>> {
    let mut pending: Vec<IfdPointer> = decoder.ifd_pointer().into_iter().collect();
    let mut visited = 0;
    while let Some(ptr) = pending.pop() {
        visited += 1;
        if visited > MAX_IFDS {
            break;
        }
        let ifd = read_ifd(decoder, ptr)?;
        if ifd.subfile_type == 0 && ifd.pattern.is_some() {
            return Ok(Some(ifd));
        }
        // next in chain is searched after this directory's SubIFDs
        pending.extend(ifd.next);
        pending.extend(ifd.sub_ifds.iter().rev().map(|&p| IfdPointer(p)));
    }
    Ok(None)
}

fn bayer_pattern(pattern: &[u8]) -> Option<PixelType> {
    // 0 red, 1 green, 2 blue
    match pattern {
        [0, 1, 1, 2] => Some(PixelType::BayerRggb),
        [1, 0, 2, 1] => Some(PixelType::BayerGrbg),
        [1, 2, 0, 1] => Some(PixelType::BayerGbrg),
        [2, 1, 1, 0] => Some(PixelType::BayerBggr),
        _ => None,
    }
}

/// Significant bits of a white level, capped at the sample size.
fn precision_of(white_level: Option<u32>, bits: u8) -> u8 {
    match white_level {
        Some(level) if level > 0 => {
            let used = u8::try_from(32 - level.leading_zeros()).unwrap_or(bits);
            used.min(bits)
        }
        _ => bits,
    }
}

/// Reader for DNG files.
#[derive(Debug)]
pub struct DngReader {
    path: PathBuf,
    header: Header,
    big_endian: bool,
    strips: Vec<(u64, u64)>,
}

impl DngReader {
    /// Locates the raw directory and validates its sample layout.
    pub fn open(path: &Path) -> IoResult<Self> {
        let mut file = File::open(path)?;
        let mut order = [0u8; 2];
        file.read_exact(&mut order)?;
        file.seek(SeekFrom::Start(0))?;

        let mut decoder = Decoder::new(BufReader::new(file)).map_err(IoError::decode)?;
        let ifd = find_raw_ifd(&mut decoder)
            .map_err(IoError::decode)?
            .ok_or_else(|| IoError::UnsupportedFormat(format!("{}: no CFA image", path.display())))?;

        let unsupported = |what: String| IoError::UnsupportedFormat(format!("{}: {what}", path.display()));
        if ifd.compression != 1 {
            return Err(unsupported(format!("compressed raw data (compression {})", ifd.compression)));
        }
        if ifd.samples != 1 {
            return Err(unsupported(format!("{} samples per pixel", ifd.samples)));
        }
        if ifd.pattern_dim.as_deref().is_some_and(|dim| dim != [2, 2]) {
            return Err(unsupported(format!("CFA repeat pattern {:?}", ifd.pattern_dim)));
        }
        let pixel_type = ifd
            .pattern
            .as_deref()
            .and_then(bayer_pattern)
            .ok_or_else(|| unsupported(format!("CFA pattern {:?}", ifd.pattern)))?;

        let bits = ifd.bits.as_deref().and_then(|b| b.first().copied()).unwrap_or(1);
        let (bits, representation) = match bits {
            8 => (8, PixelRepresentation::Uint8),
            16 => (16, PixelRepresentation::Uint16),
            other => {
                return Err(IoError::UnsupportedBitDepth(format!("{other}-bit DNG raw data")));
            }
        };

        let strips: Vec<(u64, u64)> = match (ifd.strip_offsets, ifd.strip_byte_counts) {
            (Some(offsets), Some(counts)) if offsets.len() == counts.len() => {
                offsets.into_iter().zip(counts).collect()
            }
            _ => return Err(unsupported("raw data is not stored in strips".into())),
        };

        let header = Header {
            width: ifd.width,
            height: ifd.height,
            pixel_type,
            precision: precision_of(ifd.white_level, bits),
            representation,
        };
        debug!(path = %path.display(), width = header.width, height = header.height, pattern = %pixel_type, strips = strips.len(), "opened DNG");
        Ok(Self {
            path: path.to_path_buf(),
            header,
            big_endian: &order == b"MM",
            strips,
        })
    }

    /// Concatenated strip bytes, truncated to the image size.
    fn raw_bytes(&self) -> IoResult<Vec<u8>> {
        let sample_size = match self.header.representation {
            PixelRepresentation::Uint16 => 2,
            _ => 1,
        };
        let needed = self.header.width as usize * self.header.height as usize * sample_size;

        let mut file = BufReader::new(File::open(&self.path)?);
        let mut bytes = Vec::with_capacity(needed);
        for &(offset, count) in &self.strips {
            if bytes.len() >= needed {
                break;
            }
            let count = usize::try_from(count).map_err(|_| IoError::InvalidFile("strip too large".into()))?;
            let start = bytes.len();
            bytes.resize(start + count, 0);
            file.seek(SeekFrom::Start(offset))?;
            file.read_exact(&mut bytes[start..])?;
        }
        if bytes.len() < needed {
            return Err(IoError::InvalidFile(format!(
                "{}: {} bytes of raw data, {}x{} needs {needed}",
                self.path.display(),
                bytes.len(),
                self.header.width,
                self.header.height
            )));
        }
        bytes.truncate(needed);
        Ok(bytes)
    }

    fn mismatch(&self, requested: &str) -> IoError {
        IoError::UnsupportedBitDepth(format!(
            "{} is {}, {requested} requested",
            self.path.display(),
            self.header.representation
        ))
    }
}

impl ImageReader for DngReader {
    fn pixel_representation(&self) -> PixelRepresentation {
        self.header.representation
    }

    fn read_metadata(&self, hint: Option<ImageMetadata>) -> IoResult<ImageMetadata> {
        #[cfg(feature = "exif")]
        let hint = crate::formats::exif_tags::merge_exif(&self.path, hint)?;
        Ok(self.header.describe(hint))
    }

    fn read_8u(&self) -> IoResult<Image<u8>> {
        if self.header.representation != PixelRepresentation::Uint8 {
            return Err(self.mismatch("UINT8"));
        }
        self.header.image(self.raw_bytes()?)
    }

    fn read_16u(&self) -> IoResult<Image<u16>> {
        if self.header.representation != PixelRepresentation::Uint16 {
            return Err(self.mismatch("UINT16"));
        }
        let bytes = self.raw_bytes()?;
        let mut data = vec![0u16; bytes.len() / 2];
        if self.big_endian {
            BigEndian::read_u16_into(&bytes, &mut data);
        } else {
            LittleEndian::read_u16_into(&bytes, &mut data);
        }
        self.header.image(data)
    }

    /// Samples converted to float without rescaling.
    fn read_f(&self) -> IoResult<Image<f32>> {
        let data: Vec<f32> = match self.header.representation {
            PixelRepresentation::Uint8 => self.read_8u()?.into_vec().into_iter().map(f32::from).collect(),
            _ => self.read_16u()?.into_vec().into_iter().map(f32::from).collect(),
        };
        self.header.image(data)
    }

    #[cfg(feature = "exif")]
    fn read_exif(&self) -> IoResult<pixio_meta::ExifMetadata> {
        crate::formats::exif_tags::read_exif(&self.path)
    }
}
