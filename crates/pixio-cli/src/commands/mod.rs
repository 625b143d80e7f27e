//! CLI command implementations

pub mod convert;
pub mod exif;
pub mod info;
pub mod split;

use anyhow::{Context, Result};
use pixio_io::{DynImage, WriterOptions};
use pixio_meta::ImageMetadata;
use std::path::Path;

/// Load image and metadata from path
pub fn load_image(path: &Path, metadata: Option<&Path>) -> Result<(DynImage, ImageMetadata)> {
    pixio_io::read_image(path, metadata)
        .with_context(|| format!("Failed to load: {}", path.display()))
}

/// Save image to path
pub fn save_image(path: &Path, image: &DynImage, options: WriterOptions) -> Result<()> {
    pixio_io::write_image(path, image, options)
        .with_context(|| format!("Failed to save: {}", path.display()))
}

/// Format file size in human-readable form
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
    }
}
