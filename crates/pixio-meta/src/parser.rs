//! JSON metadata sidecars.
//!
//! An image `shot.plain` may be accompanied by `shot.json` holding its
//! [`ImageMetadata`]. Raw formats depend on it for their geometry.
//!
//! ```rust,ignore
//! use pixio_meta::parser;
//!
//! // Uses shot.json next to the image when present
//! let meta = parser::read_metadata("shot.plain", None)?;
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{ImageMetadata, MetaError, MetaResult};

/// Sidecar path for an image: same directory and stem, `.json` extension.
pub fn sidecar_path(image_path: &Path) -> PathBuf {
    image_path.with_extension("json")
}

/// Reads the metadata for `image_path`.
///
/// When `metadata_path` is given it must exist. Otherwise the sidecar next
/// to the image is used if present, and `Ok(None)` is returned if not.
///
/// # Errors
///
/// [`MetaError::Io`] if the file cannot be read, [`MetaError::Parse`] if it
/// is not valid metadata.
pub fn read_metadata(
    image_path: impl AsRef<Path>,
    metadata_path: Option<&Path>,
) -> MetaResult<Option<ImageMetadata>> {
    let path = match metadata_path {
        Some(p) => p.to_path_buf(),
        None => {
            let candidate = sidecar_path(image_path.as_ref());
            if !candidate.is_file() {
                debug!(image = %image_path.as_ref().display(), "no metadata sidecar");
                return Ok(None);
            }
            candidate
        }
    };
    parse_file(&path).map(Some)
}

/// Parses one metadata file.
pub fn parse_file(path: &Path) -> MetaResult<ImageMetadata> {
    debug!(path = %path.display(), "reading metadata");
    let text = fs::read_to_string(path).map_err(|e| MetaError::io(path, e))?;
    serde_json::from_str(&text).map_err(|e| MetaError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Writes `metadata` as pretty-printed JSON.
pub fn write_metadata(path: impl AsRef<Path>, metadata: &ImageMetadata) -> MetaResult<()> {
    let path = path.as_ref();
    let value = metadata.to_value()?;
    let text = serde_json::to_string_pretty(&value)?;
    fs::write(path, text).map_err(|e| MetaError::io(path, e))?;
    debug!(path = %path.display(), "wrote metadata");
    Ok(())
}
