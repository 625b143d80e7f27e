//! EXIF fields and rational number types.
//!
//! Every [`ExifMetadata`] field is optional: absent stays distinguishable
//! from zero, and serialization emits only the fields that are present.
//! [`Rational`] and [`SRational`] serialize as `[numerator, denominator]`.
//!
//! # Usage
//!
//! ```rust
//! use pixio_meta::{ExifMetadata, Rational};
//!
//! let exif = ExifMetadata {
//!     image_width: Some(4000),
//!     exposure_time: Some(Rational::new(1, 125)),
//!     ..Default::default()
//! };
//! let v = exif.to_value().unwrap();
//! assert_eq!(v["exposureTime"], serde_json::json!([1, 125]));
//! assert!(v.get("make").is_none());
//! ```

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::MetaResult;

macro_rules! rational_type {
    ($(#[$meta:meta])* $name:ident, $int:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name {
            pub numerator: $int,
            pub denominator: $int,
        }

        impl $name {
            #[inline]
            pub const fn new(numerator: $int, denominator: $int) -> Self {
                Self { numerator, denominator }
            }

            /// `numerator / denominator` in double precision.
            ///
            /// The denominator is not checked: zero yields an infinity or NaN.
            #[inline]
            pub fn as_f64(&self) -> f64 {
                self.numerator as f64 / self.denominator as f64
            }

            /// `numerator / denominator` in single precision, unchecked.
            #[inline]
            pub fn as_f32(&self) -> f32 {
                self.numerator as f32 / self.denominator as f32
            }
        }

        impl From<($int, $int)> for $name {
            fn from((numerator, denominator): ($int, $int)) -> Self {
                Self::new(numerator, denominator)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}/{}", self.numerator, self.denominator)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                (self.numerator, self.denominator).serialize(serializer)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                <($int, $int)>::deserialize(deserializer).map(Self::from)
            }
        }
    };
}

rational_type!(
    /// Unsigned EXIF rational.
    Rational,
    u32
);

rational_type!(
    /// Signed EXIF rational.
    SRational,
    i32
);

/// EXIF fields carried alongside an image.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExifMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_description: Option<String>,
    /// Camera manufacturer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// EXIF orientation code, 1 to 8
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub software: Option<String>,
    /// Exposure time in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exposure_time: Option<Rational>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub f_number: Option<Rational>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iso_speed_ratings: Option<u16>,
    /// `YYYY:MM:DD HH:MM:SS` as written by the camera
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time_original: Option<String>,
    /// APEX brightness
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness_value: Option<SRational>,
    /// Exposure compensation in EV
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exposure_bias_value: Option<SRational>,
    /// Focal length in millimetres
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focal_length: Option<Rational>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focal_length_in_35mm_film: Option<u16>,
}

impl ExifMetadata {
    /// Whether no field is present.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Key to value mapping of the present fields.
    pub fn to_value(&self) -> MetaResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}
