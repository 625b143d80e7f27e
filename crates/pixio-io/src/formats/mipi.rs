//! MIPI CSI-2 packed raw formats.
//!
//! RAW10 stores 4 pixels in 5 bytes: the high 8 bits of each pixel, then
//! one byte holding the four 2-bit remainders (pixel 0 in the low bits).
//! RAW12 stores 2 pixels in 3 bytes: the high 8 bits of each, then one
//! byte with pixel 0's low nibble in bits 0-3 and pixel 1's in bits 4-7.
//!
//! Each row is packed on its own and padded with zero pixels to a whole
//! group. Geometry comes from the `fileInfo` metadata; pixels are
//! decoded to 16-bit.

use std::fs;
use std::path::{Path, PathBuf};

use pixio_core::{Image, ImageRef, ImageView, LayoutDescriptor};
use pixio_meta::{FileFormat, ImageMetadata, PixelRepresentation};
use tracing::debug;

use crate::formats::check_single_channel;
use crate::{ImageReader, ImageWriter, IoError, IoResult, ReaderOptions};

/// MIPI packing scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Packing {
    Raw10,
    Raw12,
}

impl Packing {
    pub const fn pixels_per_group(&self) -> usize {
        match self {
            Packing::Raw10 => 4,
            Packing::Raw12 => 2,
        }
    }

    pub const fn bytes_per_group(&self) -> usize {
        match self {
            Packing::Raw10 => 5,
            Packing::Raw12 => 3,
        }
    }

    /// Significant bits per pixel.
    pub const fn bits(&self) -> u8 {
        match self {
            Packing::Raw10 => 10,
            Packing::Raw12 => 12,
        }
    }

    pub const fn file_format(&self) -> FileFormat {
        match self {
            Packing::Raw10 => FileFormat::Raw10,
            Packing::Raw12 => FileFormat::Raw12,
        }
    }

    /// Packed size of a row of `width` pixels.
    pub const fn row_bytes(&self, width: usize) -> usize {
        width.div_ceil(self.pixels_per_group()) * self.bytes_per_group()
    }

    /// Packs one row. Bits above [`bits`](Self::bits) are dropped.
    ///
    /// # Panics
    ///
    /// Panics if `out` is shorter than `row_bytes(samples.len())`.
    pub fn pack_row(&self, samples: &[u16], out: &mut [u8]) {
        let ppg = self.pixels_per_group();
        for (px, group) in samples.chunks(ppg).zip(out.chunks_exact_mut(self.bytes_per_group())) {
            let mut p = [0u16; 4];
            p[..px.len()].copy_from_slice(px);
            match self {
                Packing::Raw10 => {
                    let mut low = 0u8;
                    for (i, &v) in p.iter().enumerate() {
                        group[i] = (v >> 2) as u8;
                        low |= ((v & 0x3) as u8) << (2 * i);
                    }
                    group[4] = low;
                }
                Packing::Raw12 => {
                    group[0] = (p[0] >> 4) as u8;
                    group[1] = (p[1] >> 4) as u8;
                    group[2] = (p[0] & 0xF) as u8 | (((p[1] & 0xF) as u8) << 4);
                }
            }
        }
    }

    /// Unpacks one row into `out`, whose length is the row width.
    ///
    /// # Panics
    ///
    /// Panics if `packed` is shorter than `row_bytes(out.len())`.
    pub fn unpack_row(&self, packed: &[u8], out: &mut [u16]) {
        let ppg = self.pixels_per_group();
        for (px, group) in out.chunks_mut(ppg).zip(packed.chunks_exact(self.bytes_per_group())) {
            match self {
                Packing::Raw10 => {
                    let low = group[4];
                    for (i, v) in px.iter_mut().enumerate() {
                        *v = (u16::from(group[i]) << 2) | u16::from((low >> (2 * i)) & 0x3);
                    }
                }
                Packing::Raw12 => {
                    let low = group[2];
                    let full = [
                        (u16::from(group[0]) << 4) | u16::from(low & 0xF),
                        (u16::from(group[1]) << 4) | u16::from(low >> 4),
                    ];
                    px.copy_from_slice(&full[..px.len()]);
                }
            }
        }
    }
}

/// Reader for RAW10 / RAW12 files.
#[derive(Debug)]
pub struct MipiReader {
    path: PathBuf,
    packing: Packing,
    metadata: ImageMetadata,
    layout: LayoutDescriptor,
}

impl MipiReader {
    /// Prepares a reader; geometry comes from `options.metadata.fileInfo`.
    ///
    /// # Errors
    ///
    /// [`IoError::MissingData`] without metadata, layout errors if fileInfo
    /// is incomplete, [`IoError::UnsupportedOperation`] for multi-channel
    /// pixel types.
    pub fn open(path: &Path, packing: Packing, options: ReaderOptions) -> IoResult<Self> {
        let metadata = options.metadata.ok_or_else(|| {
            IoError::MissingData(format!(
                "{} has no header; fileInfo metadata is required",
                path.display()
            ))
        })?;
        let mut layout = metadata.file_info.to_layout()?;
        check_single_channel(&layout, packing.file_format().name())?;
        if layout.pixel_precision() == 0 {
            layout = layout.to_builder().pixel_precision(packing.bits()).build()?;
        }
        Ok(Self {
            path: path.to_path_buf(),
            packing,
            metadata,
            layout,
        })
    }
}

impl ImageReader for MipiReader {
    fn pixel_representation(&self) -> PixelRepresentation {
        PixelRepresentation::Uint16
    }

    fn read_metadata(&self, hint: Option<ImageMetadata>) -> IoResult<ImageMetadata> {
        let mut meta = hint.unwrap_or_else(|| self.metadata.clone());
        let file = &mut meta.file_info;
        file.file_format = Some(self.packing.file_format());
        file.pixel_representation = Some(PixelRepresentation::Uint16);
        file.pixel_precision.get_or_insert(self.layout.pixel_precision());
        meta.synchronize();
        Ok(meta)
    }

    fn read_16u(&self) -> IoResult<Image<u16>> {
        let bytes = fs::read(&self.path)?;
        let width = self.layout.width() as usize;
        let height = self.layout.height() as usize;
        let row_bytes = self.packing.row_bytes(width);
        let needed = row_bytes * height;
        if bytes.len() < needed {
            return Err(IoError::InvalidFile(format!(
                "{}: {} bytes, {}x{} {} needs {needed}",
                self.path.display(),
                bytes.len(),
                width,
                height,
                self.packing.file_format()
            )));
        }

        let mut image = Image::<u16>::new(self.layout.clone());
        let plane = *self.layout.plane(0);
        let data = image.data_mut();
        for (y, packed) in bytes[..needed].chunks_exact(row_bytes).enumerate() {
            let start = plane.index(0, y);
            self.packing.unpack_row(packed, &mut data[start..start + width]);
        }
        debug!(path = %self.path.display(), width, height, "unpacked {}", self.packing.file_format());
        Ok(image)
    }
}

/// Writer for RAW10 / RAW12 files.
#[derive(Debug)]
pub struct MipiWriter {
    path: PathBuf,
    packing: Packing,
}

impl MipiWriter {
    pub fn new(path: &Path, packing: Packing) -> Self {
        Self {
            path: path.to_path_buf(),
            packing,
        }
    }
}

impl ImageWriter for MipiWriter {
    fn write_16u(&self, image: &ImageRef<'_, u16>) -> IoResult<()> {
        check_single_channel(image.descriptor(), self.packing.file_format().name())?;
        let width = image.width() as usize;
        let height = image.height() as usize;
        let row_bytes = self.packing.row_bytes(width);
        let plane = *image.plane(0);

        let mut out = vec![0u8; row_bytes * height];
        for (y, packed) in out.chunks_exact_mut(row_bytes).enumerate() {
            let start = plane.index(0, y);
            self.packing.pack_row(&image.data()[start..start + width], packed);
        }
        fs::write(&self.path, &out)?;
        debug!(path = %self.path.display(), width, height, "packed {}", self.packing.file_format());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixio_core::PixelType;

    #[test]
    fn test_raw10_group_layout() {
        let mut out = [0u8; 5];
        Packing::Raw10.pack_row(&[0x3FF, 0x001, 0x202, 0x103], &mut out);
        assert_eq!(out, [0xFF, 0x00, 0x80, 0x40, 0b11_10_01_11]);

        let mut back = [0u16; 4];
        Packing::Raw10.unpack_row(&out, &mut back);
        assert_eq!(back, [0x3FF, 0x001, 0x202, 0x103]);
    }

    #[test]
    fn test_raw12_group_layout() {
        let mut out = [0u8; 3];
        Packing::Raw12.pack_row(&[0xABC, 0x123], &mut out);
        assert_eq!(out, [0xAB, 0x12, 0x3C]);

        let mut back = [0u16; 2];
        Packing::Raw12.unpack_row(&out, &mut back);
        assert_eq!(back, [0xABC, 0x123]);
    }

    #[test]
    fn test_partial_group_is_padded() {
        assert_eq!(Packing::Raw10.row_bytes(6), 10);
        assert_eq!(Packing::Raw12.row_bytes(5), 9);

        let samples = [1u16, 2, 3, 4, 5, 6];
        let mut packed = vec![0u8; Packing::Raw10.row_bytes(6)];
        Packing::Raw10.pack_row(&samples, &mut packed);
        let mut back = [0u16; 6];
        Packing::Raw10.unpack_row(&packed, &mut back);
        assert_eq!(back, samples);
    }

    #[test]
    fn test_high_bits_dropped() {
        let mut out = [0u8; 3];
        Packing::Raw12.pack_row(&[0xFFFF, 0x1000], &mut out);
        let mut back = [0u16; 2];
        Packing::Raw12.unpack_row(&out, &mut back);
        assert_eq!(back, [0xFFF, 0x000]);
    }

    #[test]
    fn test_open_requires_metadata() {
        let err = MipiReader::open(Path::new("x.raw10"), Packing::Raw10, ReaderOptions::default())
            .unwrap_err();
        assert!(matches!(err, IoError::MissingData(_)));
    }

    #[test]
    fn test_rgb_rejected() {
        let mut meta = ImageMetadata::default();
        meta.file_info.width = Some(4);
        meta.file_info.height = Some(2);
        meta.file_info.pixel_type = Some(PixelType::Rgb);
        let err = MipiReader::open(
            Path::new("x.raw12"),
            Packing::Raw12,
            ReaderOptions::new(Some(meta)),
        )
        .unwrap_err();
        assert!(matches!(err, IoError::UnsupportedOperation(_)));
    }
}
