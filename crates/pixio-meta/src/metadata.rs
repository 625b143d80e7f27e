//! Image metadata aggregate.
//!
//! [`ImageMetadata`] groups every piece of side information an image may
//! carry. Each sub-structure is a set of optional fields:
//!
//! ```text
//! ImageMetadata
//! ├── fileInfo          FileInfo         size, precision, layout, alignment
//! ├── exifMetadata      ExifMetadata     see crate::exif
//! ├── shootingParams    ShootingParams   aperture, exposure, gains, zoom ROI
//! ├── calibrationData   CalibrationData  black/white level, vignetting, colour matrix
//! ├── cameraControls    CameraControls   white balance, colour shading, faces
//! └── semanticMasks     name -> SemanticMask
//! ```
//!
//! # Serialization
//!
//! `to_value()` yields a JSON object holding only present keys; a
//! sub-structure with nothing present is left out, so a default
//! [`ImageMetadata`] becomes `{}`. Enums become their canonical upper-case
//! names, ROIs `[x, y, width, height]`, white balance `[gainR, gainB]`,
//! colour shading `[gainR rows, gainB rows]`, and semantic masks a list of
//! `{name, label, mask}` objects in no particular order.
//!
//! Deserialization accepts the same shapes.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use pixio_core::{
    DynamicMatrix, Image, ImageLayout, ImageView, LayoutDescriptor, Matrix3, PixelType,
};
use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{ExifMetadata, MetaResult};

macro_rules! named_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $text)] $variant),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Canonical upper-case name.
            pub const fn name(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let upper = s.to_ascii_uppercase();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.name() == upper)
                    .ok_or_else(|| format!("unknown {}: {s}", stringify!($name)))
            }
        }
    };
}

named_enum! {
    /// On-disk packing of raw files.
    pub enum FileFormat {
        /// One sample per element, little-endian
        Plain => "PLAIN",
        /// MIPI RAW10: 4 pixels in 5 bytes
        Raw10 => "RAW10",
        /// MIPI RAW12: 2 pixels in 3 bytes
        Raw12 => "RAW12",
    }
}

named_enum! {
    /// Element type pixels are decoded to.
    pub enum PixelRepresentation {
        Uint8 => "UINT8",
        Uint16 => "UINT16",
        Float => "FLOAT",
    }
}

named_enum! {
    /// Class of a semantic mask.
    pub enum SemanticLabel {
        None => "NONE",
        Person => "PERSON",
        Skin => "SKIN",
        Sky => "SKY",
        Unknown => "UNKNOWN",
    }
}

named_enum! {
    /// Target colour space of a colour matrix.
    pub enum RgbColorSpace {
        AdobeRgb => "ADOBE_RGB",
        DisplayP3 => "DISPLAY_P3",
        Rec2020 => "REC2020",
        Srgb => "SRGB",
        XyzD50 => "XYZ_D50",
        XyzD65 => "XYZ_D65",
    }
}

/// Black or white level, integer or floating point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Level {
    Int(i32),
    Float(f32),
}

impl Level {
    pub fn as_f32(&self) -> f32 {
        match *self {
            Self::Int(v) => v as f32,
            Self::Float(v) => v,
        }
    }
}

impl From<i32> for Level {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<f32> for Level {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

/// Rectangle, serialized as `[x, y, width, height]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Roi {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Roi {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

impl Serialize for Roi {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        [self.x, self.y, self.width, self.height].serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Roi {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let [x, y, width, height] = <[f32; 4]>::deserialize(deserializer)?;
        Ok(Self::new(x, y, width, height))
    }
}

/// White balance scales relative to green, serialized as `[gainR, gainB]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WhiteBalance {
    pub gain_r: f32,
    pub gain_b: f32,
}

impl Serialize for WhiteBalance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        [self.gain_r, self.gain_b].serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for WhiteBalance {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let [gain_r, gain_b] = <[f32; 2]>::deserialize(deserializer)?;
        Ok(Self { gain_r, gain_b })
    }
}

/// Colour lens shading maps. Both maps must have the same shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorShading {
    /// R/G correction map
    pub gain_r: DynamicMatrix,
    /// B/G correction map
    pub gain_b: DynamicMatrix,
}

impl ColorShading {
    /// Pairs two maps, checking their shapes agree.
    pub fn new(gain_r: DynamicMatrix, gain_b: DynamicMatrix) -> MetaResult<Self> {
        let shading = Self { gain_r, gain_b };
        shading.validate()?;
        Ok(shading)
    }

    /// Fails with [`MetaError::ShapeMismatch`](crate::MetaError::ShapeMismatch) if the maps differ in shape.
    pub fn validate(&self) -> MetaResult<()> {
        if self.gain_r.shape() != self.gain_b.shape() {
            return Err(pixio_core::Error::shape_mismatch(
                "color shading gainR/gainB",
                self.gain_r.shape(),
                self.gain_b.shape(),
            )
            .into());
        }
        Ok(())
    }

    pub fn to_value(&self) -> MetaResult<serde_json::Value> {
        self.validate()?;
        Ok(serde_json::to_value(self)?)
    }
}

impl Serialize for ColorShading {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.validate().map_err(S::Error::custom)?;
        (&self.gain_r, &self.gain_b).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ColorShading {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (gain_r, gain_b) = <(DynamicMatrix, DynamicMatrix)>::deserialize(deserializer)?;
        Self::new(gain_r, gain_b).map_err(D::Error::custom)
    }
}

/// Storage and packing description of the image file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixel_precision: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_format: Option<FileFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_layout: Option<ImageLayout>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixel_type: Option<PixelType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixel_representation: Option<PixelRepresentation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width_alignment: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_alignment: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_alignment: Option<u32>,
}

impl FileInfo {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn to_value(&self) -> MetaResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Layout described by these fields.
    ///
    /// Width, height and pixel type are required; the layout defaults to
    /// PLANAR and alignments to 1.
    pub fn to_layout(&self) -> pixio_core::Result<LayoutDescriptor> {
        let missing = |field| pixio_core::Error::invalid_layout(format!("fileInfo.{field} is missing"));
        let width = self.width.ok_or_else(|| missing("width"))?;
        let height = self.height.ok_or_else(|| missing("height"))?;
        let pixel_type = self.pixel_type.ok_or_else(|| missing("pixelType"))?;
        LayoutDescriptor::builder(width, height)
            .pixel_type(pixel_type)
            .image_layout(self.image_layout.unwrap_or_default())
            .pixel_precision(self.pixel_precision.unwrap_or(0))
            .width_alignment(self.width_alignment.unwrap_or(1))
            .height_alignment(self.height_alignment.unwrap_or(1))
            .size_alignment(self.size_alignment.unwrap_or(1))
            .build()
    }
}

/// Capture settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShootingParams {
    /// F-number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aperture: Option<f32>,
    /// Seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exposure_time: Option<f32>,
    /// ISO sensitivity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensitivity: Option<f32>,
    /// `sensorGain * ispGain`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_gain: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensor_gain: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isp_gain: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom: Option<Roi>,
}

impl ShootingParams {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn to_value(&self) -> MetaResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Sensor calibration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CalibrationData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub black_level: Option<Level>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub white_level: Option<Level>,
    /// Luminance lens shading map
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vignetting: Option<DynamicMatrix>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_matrix: Option<Matrix3>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_matrix_target: Option<RgbColorSpace>,
}

impl CalibrationData {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn to_value(&self) -> MetaResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// 3A outputs applied to the image.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CameraControls {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub white_balance: Option<WhiteBalance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_shading: Option<ColorShading>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face_detection: Option<Vec<Roi>>,
}

impl CameraControls {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn validate(&self) -> MetaResult<()> {
        match &self.color_shading {
            Some(shading) => shading.validate(),
            None => Ok(()),
        }
    }

    pub fn to_value(&self) -> MetaResult<serde_json::Value> {
        self.validate()?;
        Ok(serde_json::to_value(self)?)
    }
}

/// Labelled per-pixel classification buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticMask {
    pub name: String,
    pub label: SemanticLabel,
    /// Single-channel mask, serialized as nested rows
    #[serde(with = "mask_rows")]
    pub mask: Image<f32>,
}

impl SemanticMask {
    /// Fails with [`MetaError::ShapeMismatch`](crate::MetaError::ShapeMismatch)
    /// unless `mask` has exactly one channel.
    pub fn new(name: impl Into<String>, label: SemanticLabel, mask: Image<f32>) -> MetaResult<Self> {
        check_mask(&mask)?;
        Ok(Self {
            name: name.into(),
            label,
            mask,
        })
    }

    pub fn to_value(&self) -> MetaResult<serde_json::Value> {
        check_mask(&self.mask)?;
        Ok(serde_json::to_value(self)?)
    }
}

fn check_mask(mask: &Image<f32>) -> MetaResult<()> {
    if mask.num_channels() != 1 {
        return Err(crate::MetaError::ShapeMismatch(format!(
            "semantic mask must have one channel, got {} {}",
            mask.num_channels(),
            mask.pixel_type()
        )));
    }
    Ok(())
}

/// Semantic masks keyed by name.
pub type SemanticMasks = HashMap<String, SemanticMask>;

mod mask_rows {
    use super::*;
    use serde::de::Error as _;

    pub fn serialize<S: Serializer>(mask: &Image<f32>, serializer: S) -> Result<S::Ok, S::Error> {
        check_mask(mask).map_err(<S::Error as serde::ser::Error>::custom)?;
        let (w, h) = (mask.width() as usize, mask.height() as usize);
        serializer.collect_seq((0..h).map(|y| (0..w).map(|x| mask.get(x, y, 0)).collect::<Vec<_>>()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Image<f32>, D::Error> {
        let rows = Vec::<Vec<f32>>::deserialize(deserializer)?;
        let matrix = DynamicMatrix::from_rows(rows).map_err(D::Error::custom)?;
        mask_from_matrix(&matrix).map_err(D::Error::custom)
    }
}

/// Single-channel GRAYSCALE mask image holding `matrix`.
pub fn mask_from_matrix(matrix: &DynamicMatrix) -> pixio_core::Result<Image<f32>> {
    let (rows, cols) = matrix.shape();
    let to_u32 = |v: usize| {
        u32::try_from(v).map_err(|_| pixio_core::Error::invalid_layout("mask too large"))
    };
    let layout = LayoutDescriptor::builder(to_u32(cols)?, to_u32(rows)?)
        .pixel_type(PixelType::Grayscale)
        .build()?;
    Image::from_vec(layout, matrix.data().to_vec())
}

mod mask_list {
    use super::*;

    pub fn serialize<S: Serializer>(masks: &SemanticMasks, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(masks.values())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SemanticMasks, D::Error> {
        let list = Vec::<SemanticMask>::deserialize(deserializer)?;
        Ok(list.into_iter().map(|m| (m.name.clone(), m)).collect())
    }
}

/// Every piece of side information attached to an image.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageMetadata {
    #[serde(skip_serializing_if = "FileInfo::is_empty")]
    pub file_info: FileInfo,
    #[serde(skip_serializing_if = "ExifMetadata::is_empty")]
    pub exif_metadata: ExifMetadata,
    #[serde(skip_serializing_if = "ShootingParams::is_empty")]
    pub shooting_params: ShootingParams,
    #[serde(skip_serializing_if = "CalibrationData::is_empty")]
    pub calibration_data: CalibrationData,
    #[serde(skip_serializing_if = "CameraControls::is_empty")]
    pub camera_controls: CameraControls,
    #[serde(skip_serializing_if = "HashMap::is_empty", with = "mask_list")]
    pub semantic_masks: SemanticMasks,
}

fn fill<T>(slot: &mut Option<T>, value: Option<T>) {
    if slot.is_none() {
        *slot = value;
    }
}

impl ImageMetadata {
    /// Whether nothing at all is present.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Fails with [`MetaError::ShapeMismatch`](crate::MetaError::ShapeMismatch) if a nested colour shading is
    /// inconsistent.
    pub fn validate(&self) -> MetaResult<()> {
        self.camera_controls.validate()
    }

    /// Key to value mapping of everything present.
    pub fn to_value(&self) -> MetaResult<serde_json::Value> {
        self.validate()?;
        Ok(serde_json::to_value(self)?)
    }

    /// Parses a mapping produced by [`to_value`](Self::to_value).
    pub fn from_value(value: serde_json::Value) -> MetaResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Adds a mask, replacing any mask with the same name.
    pub fn insert_mask(&mut self, mask: SemanticMask) -> Option<SemanticMask> {
        self.semantic_masks.insert(mask.name.clone(), mask)
    }

    /// Reconciles fields that describe the same thing.
    ///
    /// Absent fields are filled from their counterpart; present values are
    /// never overwritten:
    ///
    /// - fileInfo width/height and exif imageWidth/imageHeight, both ways
    /// - shootingParams exposureTime, aperture, sensitivity from exif
    /// - exif isoSpeedRatings from the rounded sensitivity
    /// - shootingParams totalGain as sensorGain * ispGain
    ///
    /// Rationals with a zero denominator are not propagated.
    pub fn synchronize(&mut self) {
        let file = &mut self.file_info;
        let exif = &mut self.exif_metadata;
        let shooting = &mut self.shooting_params;

        fill(&mut file.width, exif.image_width);
        fill(&mut file.height, exif.image_height);
        fill(&mut exif.image_width, file.width);
        fill(&mut exif.image_height, file.height);

        let ratio = |r: Option<crate::Rational>| r.filter(|r| r.denominator != 0).map(|r| r.as_f32());
        fill(&mut shooting.exposure_time, ratio(exif.exposure_time));
        fill(&mut shooting.aperture, ratio(exif.f_number));
        fill(&mut shooting.sensitivity, exif.iso_speed_ratings.map(f32::from));
        fill(
            &mut exif.iso_speed_ratings,
            shooting
                .sensitivity
                .filter(|s| s.is_finite() && *s >= 0.0)
                .map(|s| s.round().min(f32::from(u16::MAX)) as u16),
        );

        if let (Some(sensor), Some(isp)) = (shooting.sensor_gain, shooting.isp_gain) {
            fill(&mut shooting.total_gain, Some(sensor * isp));
        }
    }

    /// Records the geometry of a decoded image in fileInfo.
    pub fn fill_from_image(&mut self, image: &impl ImageView) {
        let file = &mut self.file_info;
        file.width = Some(image.width());
        file.height = Some(image.height());
        file.pixel_type = Some(image.pixel_type());
        file.image_layout = Some(image.image_layout());
        if image.pixel_precision() > 0 {
            file.pixel_precision = Some(image.pixel_precision());
        }
    }
}
