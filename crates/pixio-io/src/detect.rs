//! Format detection utilities.
//!
//! Detects image formats from file extensions and magic bytes.
//! Headerless formats (plain, MIPI raw) and CFA files carry no magic, so
//! their extension wins over whatever their first bytes happen to look like.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use pixio_meta::FileFormat;

use crate::IoResult;

/// Recognised image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Headerless samples, geometry from metadata.
    Plain,
    /// MIPI RAW10 packed samples.
    Raw10,
    /// MIPI RAW12 packed samples.
    Raw12,
    Png,
    Tiff,
    Jpeg,
    Bmp,
    /// Bayer mosaic behind a fixed 16-byte header.
    Cfa,
    /// Digital Negative (TIFF container).
    Dng,
    /// Unknown/unsupported format.
    Unknown,
}

impl Format {
    /// Detects format from file path.
    ///
    /// Extensions of formats without a signature are trusted as is.
    /// Otherwise magic bytes are checked first, falling back to the
    /// extension.
    pub fn detect<P: AsRef<Path>>(path: P) -> IoResult<Self> {
        let path = path.as_ref();
        let by_ext = Self::from_extension(path);
        if !by_ext.has_signature() {
            return Ok(by_ext);
        }

        if let Ok(format) = Self::from_magic_bytes(path) {
            // DNG shares the TIFF signature
            if format == Format::Tiff && by_ext == Format::Dng {
                return Ok(Format::Dng);
            }
            if format != Format::Unknown {
                return Ok(format);
            }
        }

        Ok(by_ext)
    }

    /// Detects format from file extension only.
    pub fn from_extension<P: AsRef<Path>>(path: P) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("plain") | Some("raw") | Some("yuv") | Some("nv12") => Format::Plain,
            Some("raw10") => Format::Raw10,
            Some("raw12") => Format::Raw12,
            Some("png") => Format::Png,
            Some("tif") | Some("tiff") => Format::Tiff,
            Some("jpg") | Some("jpeg") => Format::Jpeg,
            Some("bmp") => Format::Bmp,
            Some("cfa") => Format::Cfa,
            Some("dng") => Format::Dng,
            _ => Format::Unknown,
        }
    }

    /// Detects format from file magic bytes.
    pub fn from_magic_bytes<P: AsRef<Path>>(path: P) -> IoResult<Self> {
        let mut file = File::open(path)?;
        let mut header = [0u8; 8];

        let bytes_read = file.read(&mut header)?;
        Ok(Self::from_bytes(&header[..bytes_read]))
    }

    /// Detects format from raw bytes (magic number check).
    pub fn from_bytes(bytes: &[u8]) -> Self {
        // PNG: 0x89 0x50 0x4E 0x47 0x0D 0x0A 0x1A 0x0A
        if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Format::Png;
        }

        // JPEG: 0xFF 0xD8 0xFF
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Format::Jpeg;
        }

        // TIFF: II (little-endian) or MM (big-endian)
        if bytes.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || bytes.starts_with(&[0x4D, 0x4D, 0x00, 0x2A]) {
            return Format::Tiff;
        }

        // BMP: "BM"
        if bytes.len() >= 4 && bytes.starts_with(b"BM") {
            return Format::Bmp;
        }

        Format::Unknown
    }

    /// Refines a headerless format with the packing named in metadata.
    pub fn with_file_format(self, file_format: Option<FileFormat>) -> Self {
        match (self, file_format) {
            (Format::Plain, Some(FileFormat::Raw10)) => Format::Raw10,
            (Format::Plain, Some(FileFormat::Raw12)) => Format::Raw12,
            (format, _) => format,
        }
    }

    /// Whether the file has no header and depends on metadata for geometry.
    pub fn is_headerless(&self) -> bool {
        matches!(self, Format::Plain | Format::Raw10 | Format::Raw12)
    }

    /// Whether magic bytes can identify the file. Unknown extensions are
    /// assumed to have a signature.
    pub fn has_signature(&self) -> bool {
        !self.is_headerless() && *self != Format::Cfa
    }

    /// Packing recorded in `fileInfo.fileFormat` for headerless formats.
    pub fn file_format(&self) -> Option<FileFormat> {
        match self {
            Format::Plain => Some(FileFormat::Plain),
            Format::Raw10 => Some(FileFormat::Raw10),
            Format::Raw12 => Some(FileFormat::Raw12),
            _ => None,
        }
    }

    /// Returns the typical file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Plain => "plain",
            Format::Raw10 => "raw10",
            Format::Raw12 => "raw12",
            Format::Png => "png",
            Format::Tiff => "tif",
            Format::Jpeg => "jpg",
            Format::Bmp => "bmp",
            Format::Cfa => "cfa",
            Format::Dng => "dng",
            Format::Unknown => "",
        }
    }

    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            Format::Plain => "PLAIN",
            Format::Raw10 => "RAW10",
            Format::Raw12 => "RAW12",
            Format::Png => "PNG",
            Format::Tiff => "TIFF",
            Format::Jpeg => "JPEG",
            Format::Bmp => "BMP",
            Format::Cfa => "CFA",
            Format::Dng => "DNG",
            Format::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(Format::from_extension("a.PNG"), Format::Png);
        assert_eq!(Format::from_extension("a.jpeg"), Format::Jpeg);
        assert_eq!(Format::from_extension("a.tiff"), Format::Tiff);
        assert_eq!(Format::from_extension("a.nv12"), Format::Plain);
        assert_eq!(Format::from_extension("a.raw"), Format::Plain);
        assert_eq!(Format::from_extension("a.raw10"), Format::Raw10);
        assert_eq!(Format::from_extension("a.RAW12"), Format::Raw12);
        assert_eq!(Format::from_extension("a.dng"), Format::Dng);
        assert_eq!(Format::from_extension("a.exr"), Format::Unknown);
        assert_eq!(Format::from_extension("noext"), Format::Unknown);
    }

    #[test]
    fn test_from_bytes() {
        assert_eq!(
            Format::from_bytes(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]),
            Format::Png
        );
        assert_eq!(Format::from_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]), Format::Jpeg);
        assert_eq!(Format::from_bytes(b"II*\0"), Format::Tiff);
        assert_eq!(Format::from_bytes(b"MM\0*"), Format::Tiff);
        assert_eq!(Format::from_bytes(b"BM\x36\x00"), Format::Bmp);
        assert_eq!(Format::from_bytes(&[0x00; 8]), Format::Unknown);
        assert_eq!(Format::from_bytes(&[0xFF]), Format::Unknown);
    }

    #[test]
    fn test_headerless_extension_beats_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.raw");
        // first samples happen to spell "BM"
        std::fs::write(&path, b"BM\x00\x00\x00\x00").unwrap();
        assert_eq!(Format::detect(&path).unwrap(), Format::Plain);

        // a CFA header whose width spells "BM"
        let cfa = dir.path().join("mosaic.cfa");
        std::fs::write(&cfa, b"BM\x00\x00\x02\x00\x00\x00").unwrap();
        assert_eq!(Format::detect(&cfa).unwrap(), Format::Cfa);
    }

    #[test]
    fn test_signature_kinds() {
        assert!(Format::Raw10.is_headerless());
        assert!(!Format::Cfa.is_headerless());
        assert!(!Format::Cfa.has_signature());
        assert!(!Format::Plain.has_signature());
        assert!(Format::Dng.has_signature());
        assert!(Format::Bmp.has_signature());
        assert!(Format::Unknown.has_signature());
    }

    #[test]
    fn test_magic_beats_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("really_png.jpg");
        std::fs::write(&path, [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]).unwrap();
        assert_eq!(Format::detect(&path).unwrap(), Format::Png);

        let dng = dir.path().join("shot.dng");
        std::fs::write(&dng, b"II*\0\x08\x00\x00\x00").unwrap();
        assert_eq!(Format::detect(&dng).unwrap(), Format::Dng);
    }

    #[test]
    fn test_with_file_format() {
        assert_eq!(Format::Plain.with_file_format(Some(FileFormat::Raw10)), Format::Raw10);
        assert_eq!(Format::Plain.with_file_format(Some(FileFormat::Plain)), Format::Plain);
        assert_eq!(Format::Png.with_file_format(Some(FileFormat::Raw12)), Format::Png);
        assert_eq!(Format::Raw12.with_file_format(None), Format::Raw12);
    }
}
