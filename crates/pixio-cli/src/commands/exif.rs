//! EXIF dump command.

use crate::ExifArgs;
use anyhow::{Context, Result};

/// Prints the EXIF fields of a JPEG or TIFF.
pub fn run(args: ExifArgs) -> Result<()> {
    let exif = pixio_io::read_exif(&args.input)
        .with_context(|| format!("Failed to read EXIF: {}", args.input.display()))?;

    let value = exif.to_value()?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", args.input.display());
    if let Some(fields) = value.as_object() {
        for (name, field) in fields {
            println!("  {name:<24} {field}");
        }
    }
    Ok(())
}
