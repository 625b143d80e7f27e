//! Format conversion command.
//!
//! Metadata read from the input travels with the image: JPEG outputs embed
//! its EXIF part, headerless outputs get a sidecar, and so do mosaics
//! written to PNG or TIFF.

use crate::{Compression, ConvertArgs, Packing};
use anyhow::Result;
use pixio_io::{Format, TiffCompression, WriterOptions};
use pixio_meta::FileFormat;
use tracing::info;

/// Runs the convert command.
pub fn run(args: ConvertArgs) -> Result<()> {
    let (image, mut meta) = super::load_image(&args.input, args.metadata.as_deref())?;

    info!(
        input = %args.input.display(),
        input_format = %Format::detect(&args.input).unwrap_or(Format::Unknown),
        output = %args.output.display(),
        "Converting image"
    );

    // The output's own geometry replaces the input's
    meta.file_info = Default::default();

    let mut options = WriterOptions::default()
        .with_metadata(meta)
        .with_jpeg_quality(args.quality)
        .with_tiff_compression(match args.compression {
            Compression::None => TiffCompression::None,
            Compression::Deflate => TiffCompression::Deflate,
        });
    if let Some(packing) = args.packing {
        options = options.with_file_format(match packing {
            Packing::Plain => FileFormat::Plain,
            Packing::Raw10 => FileFormat::Raw10,
            Packing::Raw12 => FileFormat::Raw12,
        });
    }

    super::save_image(&args.output, &image, options)
}
