//! Format registry and reader/writer factories.
//!
//! The registry maps each [`Format`] to the factories that build its
//! [`ImageReader`] / [`ImageWriter`]. Built-in formats are registered
//! according to the enabled cargo features. Detection itself lives in
//! [`Format::detect`]; a detected format without an entry, or without the
//! requested factory (DNG has no writer), fails with
//! [`IoError::UnsupportedFormat`].
//!
//! # Example
//!
//! ```ignore
//! use pixio_io::registry::FormatRegistry;
//!
//! let registry = FormatRegistry::global();
//! for format in registry.formats() {
//!     println!("Format: {format}");
//! }
//! assert!(registry.supports_extension("raw10"));
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::formats::cfa::{CfaReader, CfaWriter};
use crate::formats::mipi::{MipiReader, MipiWriter, Packing};
use crate::formats::plain::{PlainReader, PlainWriter};
use crate::{Format, ImageReader, ImageWriter, IoError, IoResult, ReaderOptions, WriterOptions};

/// Builds a reader for a file.
pub type ReaderFactory = fn(&Path, ReaderOptions) -> IoResult<Box<dyn ImageReader>>;

/// Builds a writer for an output path.
pub type WriterFactory = fn(&Path, &WriterOptions) -> Box<dyn ImageWriter>;

/// Format information entry in the registry.
#[derive(Clone)]
pub struct FormatInfo {
    pub format: Format,
    /// File extensions without dots (e.g., ["jpg", "jpeg"]).
    pub extensions: &'static [&'static str],
    /// None if the format cannot be read.
    pub make_reader: Option<ReaderFactory>,
    /// None if the format cannot be written.
    pub make_writer: Option<WriterFactory>,
}

/// Central registry for image format handlers.
///
/// The global instance is initialised once and shared by every thread.
pub struct FormatRegistry {
    formats: HashMap<Format, Arc<FormatInfo>>,
    by_extension: HashMap<&'static str, Format>,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self {
            formats: HashMap::new(),
            by_extension: HashMap::new(),
        }
    }

    /// Returns the global registry instance with built-in formats.
    pub fn global() -> &'static FormatRegistry {
        static INSTANCE: OnceLock<FormatRegistry> = OnceLock::new();
        INSTANCE.get_or_init(|| {
            let mut registry = FormatRegistry::new();
            registry.register_builtin_formats();
            registry
        })
    }

    /// Registers built-in formats based on enabled features.
    fn register_builtin_formats(&mut self) {
        self.register(FormatInfo {
            format: Format::Plain,
            extensions: &["plain", "raw", "yuv", "nv12"],
            make_reader: Some(|p, o| Ok(Box::new(PlainReader::open(p, o)?) as Box<dyn ImageReader>)),
            make_writer: Some(|p, _| Box::new(PlainWriter::new(p)) as Box<dyn ImageWriter>),
        });

        self.register(FormatInfo {
            format: Format::Raw10,
            extensions: &["raw10"],
            make_reader: Some(|p, o| {
                Ok(Box::new(MipiReader::open(p, Packing::Raw10, o)?) as Box<dyn ImageReader>)
            }),
            make_writer: Some(|p, _| Box::new(MipiWriter::new(p, Packing::Raw10)) as Box<dyn ImageWriter>),
        });

        self.register(FormatInfo {
            format: Format::Raw12,
            extensions: &["raw12"],
            make_reader: Some(|p, o| {
                Ok(Box::new(MipiReader::open(p, Packing::Raw12, o)?) as Box<dyn ImageReader>)
            }),
            make_writer: Some(|p, _| Box::new(MipiWriter::new(p, Packing::Raw12)) as Box<dyn ImageWriter>),
        });

        self.register(FormatInfo {
            format: Format::Cfa,
            extensions: &["cfa"],
            make_reader: Some(|p, _| Ok(Box::new(CfaReader::open(p)?) as Box<dyn ImageReader>)),
            make_writer: Some(|p, _| Box::new(CfaWriter::new(p)) as Box<dyn ImageWriter>),
        });

        #[cfg(feature = "png")]
        self.register(FormatInfo {
            format: Format::Png,
            extensions: &["png"],
            make_reader: Some(|p, _| {
                Ok(Box::new(crate::formats::png::PngReader::open(p)?) as Box<dyn ImageReader>)
            }),
            make_writer: Some(|p, _| Box::new(crate::formats::png::PngWriter::new(p)) as Box<dyn ImageWriter>),
        });

        #[cfg(feature = "tiff")]
        self.register(FormatInfo {
            format: Format::Tiff,
            extensions: &["tiff", "tif"],
            make_reader: Some(|p, _| {
                Ok(Box::new(crate::formats::tiff::TiffReader::open(p)?) as Box<dyn ImageReader>)
            }),
            make_writer: Some(|p, o| {
                Box::new(crate::formats::tiff::TiffWriter::new(p, o.tiff_compression)) as Box<dyn ImageWriter>
            }),
        });

        #[cfg(feature = "tiff")]
        self.register(FormatInfo {
            format: Format::Dng,
            extensions: &["dng"],
            make_reader: Some(|p, _| {
                Ok(Box::new(crate::formats::dng::DngReader::open(p)?) as Box<dyn ImageReader>)
            }),
            make_writer: None,
        });

        #[cfg(feature = "bmp")]
        self.register(FormatInfo {
            format: Format::Bmp,
            extensions: &["bmp"],
            make_reader: Some(|p, _| {
                Ok(Box::new(crate::formats::bmp::BmpReader::open(p)?) as Box<dyn ImageReader>)
            }),
            make_writer: Some(|p, _| Box::new(crate::formats::bmp::BmpWriter::new(p)) as Box<dyn ImageWriter>),
        });

        #[cfg(feature = "jpeg")]
        self.register(FormatInfo {
            format: Format::Jpeg,
            extensions: &["jpg", "jpeg"],
            make_reader: Some(|p, _| {
                Ok(Box::new(crate::formats::jpeg::JpegReader::open(p)?) as Box<dyn ImageReader>)
            }),
            make_writer: Some(|p, o| {
                Box::new(crate::formats::jpeg::JpegWriter::new(p, o)) as Box<dyn ImageWriter>
            }),
        });
    }

    /// Registers a format, replacing any previous entry for it.
    pub fn register(&mut self, info: FormatInfo) {
        for ext in info.extensions {
            self.by_extension.insert(*ext, info.format);
        }
        self.formats.insert(info.format, Arc::new(info));
    }

    /// Registered formats, in no particular order.
    pub fn formats(&self) -> impl Iterator<Item = Format> + '_ {
        self.formats.keys().copied()
    }

    /// Returns format info.
    pub fn get(&self, format: Format) -> Option<&FormatInfo> {
        self.formats.get(&format).map(|arc| arc.as_ref())
    }

    /// Checks if an extension is supported.
    pub fn supports_extension(&self, ext: &str) -> bool {
        self.by_extension.contains_key(ext.to_lowercase().as_str())
    }

    /// Creates the reader for `path`.
    ///
    /// The format comes from [`Format::detect`], refined by
    /// `fileInfo.fileFormat` for headerless files.
    pub fn make_reader(&self, path: &Path, options: ReaderOptions) -> IoResult<Box<dyn ImageReader>> {
        let file_format = options
            .metadata
            .as_ref()
            .and_then(|m| m.file_info.file_format);
        let format = Format::detect(path)?.with_file_format(file_format);
        debug!(path = %path.display(), %format, "creating reader");

        let factory = self
            .get(format)
            .and_then(|info| info.make_reader)
            .ok_or_else(|| unsupported(format, path, "reader"))?;
        factory(path, options)
    }

    /// Creates the writer for `path`.
    ///
    /// The format comes from the extension, refined by the requested
    /// packing for headerless outputs.
    pub fn make_writer(&self, path: &Path, options: &WriterOptions) -> IoResult<Box<dyn ImageWriter>> {
        let format = Format::from_extension(path).with_file_format(options.requested_file_format());
        debug!(path = %path.display(), %format, "creating writer");

        let factory = self
            .get(format)
            .and_then(|info| info.make_writer)
            .ok_or_else(|| unsupported(format, path, "writer"))?;
        Ok(factory(path, options))
    }
}

fn unsupported(format: Format, path: &Path, what: &str) -> IoError {
    IoError::UnsupportedFormat(format!("no {format} {what} for {}", path.display()))
}
