//! Reader and writer options.

use pixio_meta::{FileFormat, ImageMetadata};

/// Options passed to [`make_reader`](crate::make_reader).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReaderOptions {
    /// Metadata known before opening the file, usually from a sidecar.
    ///
    /// Headerless formats take their geometry from `fileInfo`.
    pub metadata: Option<ImageMetadata>,
}

impl ReaderOptions {
    pub fn new(metadata: Option<ImageMetadata>) -> Self {
        Self { metadata }
    }
}

/// TIFF compression method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TiffCompression {
    /// No compression.
    #[default]
    None,
    /// ZIP/Deflate compression.
    Deflate,
}

/// Options passed to [`make_writer`](crate::make_writer).
#[derive(Debug, Clone, PartialEq)]
pub struct WriterOptions {
    /// Metadata written alongside the pixels.
    ///
    /// JPEG embeds its EXIF part, headerless formats store it in a sidecar.
    pub metadata: Option<ImageMetadata>,
    /// JPEG quality (1-100).
    pub jpeg_quality: u8,
    pub tiff_compression: TiffCompression,
    /// Packing for `.plain` / `.raw` outputs.
    pub file_format: Option<FileFormat>,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            metadata: None,
            jpeg_quality: 95,
            tiff_compression: TiffCompression::None,
            file_format: None,
        }
    }
}

impl WriterOptions {
    pub fn with_metadata(mut self, metadata: ImageMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn with_tiff_compression(mut self, compression: TiffCompression) -> Self {
        self.tiff_compression = compression;
        self
    }

    pub fn with_file_format(mut self, format: FileFormat) -> Self {
        self.file_format = Some(format);
        self
    }

    /// File format requested explicitly or through `metadata.fileInfo`.
    pub(crate) fn requested_file_format(&self) -> Option<FileFormat> {
        self.file_format.or_else(|| {
            self.metadata
                .as_ref()
                .and_then(|m| m.file_info.file_format)
        })
    }
}
