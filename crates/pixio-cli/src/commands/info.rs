//! Image info command.
//!
//! Prints geometry, sample type and detected format, or the whole metadata
//! record as JSON.

use crate::InfoArgs;
use anyhow::{Context, Result};
use pixio_core::ImageView;
use pixio_io::{DynImage, Format};
use pixio_meta::ImageMetadata;
use std::fs;
use std::path::Path;

/// Runs the info command for every input.
pub fn run(args: InfoArgs, verbose: bool) -> Result<()> {
    for path in &args.input {
        let file_size = fs::metadata(path)
            .with_context(|| format!("Cannot stat {}", path.display()))?
            .len();
        let (image, meta) = super::load_image(path, args.metadata.as_deref())?;

        if args.json {
            let value = meta.to_value()?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        } else {
            print_text(path, &image, &meta, file_size, verbose);
        }

        if args.input.len() > 1 {
            println!();
        }
    }
    Ok(())
}

fn print_text(path: &Path, image: &DynImage, meta: &ImageMetadata, file_size: u64, verbose: bool) {
    let format = Format::detect(path).unwrap_or(Format::Unknown);

    println!("{}", path.display());
    println!("  Resolution: {}x{}", image.width(), image.height());
    println!("  Pixel type: {}", image.pixel_type());
    println!("  Layout:     {}", image.image_layout());
    println!("  Channels:   {}", image.num_channels());
    println!("  Samples:    {}", image.pixel_representation());
    if image.pixel_precision() > 0 {
        println!("  Precision:  {} bits", image.pixel_precision());
    }
    println!("  File size:  {}", super::format_size(file_size));

    if verbose {
        let format = meta
            .file_info
            .file_format
            .map(|f| f.to_string())
            .unwrap_or_else(|| format.to_string());
        println!("  Format:     {format}");
        let desc = image.descriptor();
        for (c, plane) in desc.planes().iter().enumerate() {
            println!(
                "  Plane {c}:    offset {} row stride {} pixel stride {}",
                plane.offset, plane.row_stride, plane.pixel_stride
            );
        }
    }

    let exif = &meta.exif_metadata;
    if let Some(make) = &exif.make {
        println!("  Camera:     {make} {}", exif.model.as_deref().unwrap_or(""));
    }
    let shooting = &meta.shooting_params;
    if let Some(t) = shooting.exposure_time {
        println!("  Exposure:   {t:.6} s");
    }
    if let Some(iso) = shooting.sensitivity {
        println!("  ISO:        {iso}");
    }
}
