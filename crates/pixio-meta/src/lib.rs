//! # pixio-meta
//!
//! Image metadata model: EXIF fields, file info, shooting parameters,
//! calibration data, camera controls and semantic masks.
//!
//! Every field is optional and serialization emits only what is present.
//! Structures convert to and from `serde_json::Value` and JSON sidecar files.
//!
//! ## Example
//!
//! ```rust
//! use pixio_meta::{ImageMetadata, Rational};
//!
//! let mut meta = ImageMetadata::default();
//! meta.exif_metadata.image_width = Some(4000);
//! meta.exif_metadata.exposure_time = Some(Rational::new(1, 125));
//! meta.synchronize();
//!
//! assert_eq!(meta.file_info.width, Some(4000));
//! let value = meta.to_value().unwrap();
//! assert_eq!(value["fileInfo"]["width"], 4000);
//! ```

pub mod error;
pub mod exif;
pub mod metadata;
pub mod parser;

pub use error::{MetaError, MetaResult};
pub use exif::{ExifMetadata, Rational, SRational};
pub use metadata::{
    mask_from_matrix, CalibrationData, CameraControls, ColorShading, FileFormat, FileInfo,
    ImageMetadata, Level, PixelRepresentation, RgbColorSpace, Roi, SemanticLabel, SemanticMask,
    SemanticMasks, ShootingParams, WhiteBalance,
};
pub use parser::read_metadata;
