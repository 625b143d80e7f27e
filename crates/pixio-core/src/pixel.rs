//! Pixel semantics, memory layouts and element types.
//!
//! # Types
//!
//! - [`PixelType`] - what each sample means (gray, RGB, YUV, Bayer mosaics)
//! - [`ImageLayout`] - how channels are arranged in memory
//! - [`Sample`] - element types an image can be built over
//!
//! Both enums have a canonical upper-case name (`"BAYER_RGGB"`, `"YUV_420"`)
//! used by [`Display`](std::fmt::Display), [`FromStr`] and serde.
//!
//! # Usage
//!
//! ```rust
//! use pixio_core::{ImageLayout, PixelType};
//!
//! let pt: PixelType = "BAYER_GRBG".parse().unwrap();
//! assert!(pt.is_bayer());
//! assert_eq!(pt.default_channels(), Some(1));
//! assert_eq!(ImageLayout::Nv12.to_string(), "NV12");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Pixel semantics of an image.
///
/// Determines the channel count and how each channel is interpreted.
/// Mosaic types carry the colour filter phase of the top-left 2x2 cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PixelType {
    /// User-defined semantics; channel count must be given explicitly.
    #[default]
    #[serde(rename = "CUSTOM")]
    Custom,
    #[serde(rename = "GRAYSCALE")]
    Grayscale,
    #[serde(rename = "GRAY_ALPHA")]
    GrayAlpha,
    #[serde(rename = "RGB")]
    Rgb,
    #[serde(rename = "RGBA")]
    Rgba,
    #[serde(rename = "YUV")]
    Yuv,
    #[serde(rename = "BAYER_RGGB")]
    BayerRggb,
    #[serde(rename = "BAYER_BGGR")]
    BayerBggr,
    #[serde(rename = "BAYER_GRBG")]
    BayerGrbg,
    #[serde(rename = "BAYER_GBRG")]
    BayerGbrg,
    #[serde(rename = "QUADBAYER_RGGB")]
    QuadBayerRggb,
    #[serde(rename = "QUADBAYER_BGGR")]
    QuadBayerBggr,
    #[serde(rename = "QUADBAYER_GRBG")]
    QuadBayerGrbg,
    #[serde(rename = "QUADBAYER_GBRG")]
    QuadBayerGbrg,
}

/// Colour filter site inside a 2x2 Bayer cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BayerSite {
    /// Red
    R,
    /// Green on a red row
    Gr,
    /// Green on a blue row
    Gb,
    /// Blue
    B,
}

impl BayerSite {
    /// Short channel name (`r`, `gr`, `gb`, `b`).
    pub const fn name(&self) -> &'static str {
        match self {
            Self::R => "r",
            Self::Gr => "gr",
            Self::Gb => "gb",
            Self::B => "b",
        }
    }
}

impl PixelType {
    /// Every pixel type, in declaration order.
    pub const ALL: [PixelType; 14] = [
        Self::Custom,
        Self::Grayscale,
        Self::GrayAlpha,
        Self::Rgb,
        Self::Rgba,
        Self::Yuv,
        Self::BayerRggb,
        Self::BayerBggr,
        Self::BayerGrbg,
        Self::BayerGbrg,
        Self::QuadBayerRggb,
        Self::QuadBayerBggr,
        Self::QuadBayerGrbg,
        Self::QuadBayerGbrg,
    ];

    /// Canonical upper-case name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Custom => "CUSTOM",
            Self::Grayscale => "GRAYSCALE",
            Self::GrayAlpha => "GRAY_ALPHA",
            Self::Rgb => "RGB",
            Self::Rgba => "RGBA",
            Self::Yuv => "YUV",
            Self::BayerRggb => "BAYER_RGGB",
            Self::BayerBggr => "BAYER_BGGR",
            Self::BayerGrbg => "BAYER_GRBG",
            Self::BayerGbrg => "BAYER_GBRG",
            Self::QuadBayerRggb => "QUADBAYER_RGGB",
            Self::QuadBayerBggr => "QUADBAYER_BGGR",
            Self::QuadBayerGrbg => "QUADBAYER_GRBG",
            Self::QuadBayerGbrg => "QUADBAYER_GBRG",
        }
    }

    /// Number of channels implied by the type.
    ///
    /// Returns `None` for [`PixelType::Custom`], whose channel count is
    /// supplied by the caller.
    pub const fn default_channels(&self) -> Option<usize> {
        match self {
            Self::Custom => None,
            Self::Grayscale => Some(1),
            Self::GrayAlpha => Some(2),
            Self::Rgb | Self::Yuv => Some(3),
            Self::Rgba => Some(4),
            _ => Some(1),
        }
    }

    /// Whether this is a 2x2 Bayer mosaic.
    #[inline]
    pub const fn is_bayer(&self) -> bool {
        matches!(
            self,
            Self::BayerRggb | Self::BayerBggr | Self::BayerGrbg | Self::BayerGbrg
        )
    }

    /// Whether this is a 4x4 quad Bayer mosaic.
    #[inline]
    pub const fn is_quad_bayer(&self) -> bool {
        matches!(
            self,
            Self::QuadBayerRggb | Self::QuadBayerBggr | Self::QuadBayerGrbg | Self::QuadBayerGbrg
        )
    }

    /// Whether this is YUV.
    #[inline]
    pub const fn is_yuv(&self) -> bool {
        matches!(self, Self::Yuv)
    }

    /// Sites of the top-left 2x2 cell in raster order
    /// (`(0,0)`, `(1,0)`, `(0,1)`, `(1,1)`), for Bayer types only.
    pub const fn bayer_sites(&self) -> Option<[BayerSite; 4]> {
        use BayerSite::*;
        match self {
            Self::BayerRggb => Some([R, Gr, Gb, B]),
            Self::BayerBggr => Some([B, Gb, Gr, R]),
            Self::BayerGrbg => Some([Gr, R, B, Gb]),
            Self::BayerGbrg => Some([Gb, B, R, Gr]),
            _ => None,
        }
    }
}

impl fmt::Display for PixelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PixelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|pt| pt.name() == upper)
            .ok_or_else(|| format!("unknown pixel type: {s}"))
    }
}

/// Arrangement of channels in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ImageLayout {
    /// Treated as planar.
    #[serde(rename = "CUSTOM")]
    Custom,
    /// One plane per channel.
    #[default]
    #[serde(rename = "PLANAR")]
    Planar,
    /// All channels of a pixel stored together in a single plane.
    #[serde(rename = "INTERLEAVED")]
    Interleaved,
    /// Full-resolution Y plane followed by quarter-size U and V planes.
    #[serde(rename = "YUV_420")]
    Yuv420,
    /// Full-resolution Y plane followed by one interleaved UV plane.
    #[serde(rename = "NV12")]
    Nv12,
}

impl ImageLayout {
    /// Every layout, in declaration order.
    pub const ALL: [ImageLayout; 5] = [
        Self::Custom,
        Self::Planar,
        Self::Interleaved,
        Self::Yuv420,
        Self::Nv12,
    ];

    /// Canonical upper-case name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Custom => "CUSTOM",
            Self::Planar => "PLANAR",
            Self::Interleaved => "INTERLEAVED",
            Self::Yuv420 => "YUV_420",
            Self::Nv12 => "NV12",
        }
    }

    /// Whether chroma is subsampled (YUV_420 or NV12).
    #[inline]
    pub const fn is_subsampled(&self) -> bool {
        matches!(self, Self::Yuv420 | Self::Nv12)
    }
}

impl fmt::Display for ImageLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ImageLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|l| l.name() == upper)
            .ok_or_else(|| format!("unknown image layout: {s}"))
    }
}

/// Element type an image can store.
///
/// Implemented for `i32`, `f32`, `u8`, `u16` and `f64`. [`FORMAT`](Self::FORMAT)
/// is the buffer-protocol format code used at the exchange boundary.
pub trait Sample: bytemuck::Pod + Default + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Buffer format code (`i`, `f`, `B`, `H`, `d`).
    const FORMAT: &'static str;
    /// Short type name for messages.
    const NAME: &'static str;
}

impl Sample for i32 {
    const FORMAT: &'static str = "i";
    const NAME: &'static str = "i32";
}

impl Sample for f32 {
    const FORMAT: &'static str = "f";
    const NAME: &'static str = "f32";
}

impl Sample for u8 {
    const FORMAT: &'static str = "B";
    const NAME: &'static str = "u8";
}

impl Sample for u16 {
    const FORMAT: &'static str = "H";
    const NAME: &'static str = "u16";
}

impl Sample for f64 {
    const FORMAT: &'static str = "d";
    const NAME: &'static str = "f64";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_type_names_roundtrip() {
        for pt in PixelType::ALL {
            assert_eq!(pt.to_string().parse::<PixelType>().unwrap(), pt);
        }
        assert_eq!("bayer_rggb".parse::<PixelType>().unwrap(), PixelType::BayerRggb);
        assert!("BAYER".parse::<PixelType>().is_err());
    }

    #[test]
    fn test_layout_names_roundtrip() {
        for layout in ImageLayout::ALL {
            assert_eq!(layout.name().parse::<ImageLayout>().unwrap(), layout);
        }
        assert_eq!(ImageLayout::Yuv420.to_string(), "YUV_420");
    }

    #[test]
    fn test_serde_names() {
        let s = serde_json::to_string(&PixelType::QuadBayerGbrg).unwrap();
        assert_eq!(s, "\"QUADBAYER_GBRG\"");
        let l: ImageLayout = serde_json::from_str("\"YUV_420\"").unwrap();
        assert_eq!(l, ImageLayout::Yuv420);
    }

    #[test]
    fn test_default_channels() {
        assert_eq!(PixelType::Custom.default_channels(), None);
        assert_eq!(PixelType::Grayscale.default_channels(), Some(1));
        assert_eq!(PixelType::GrayAlpha.default_channels(), Some(2));
        assert_eq!(PixelType::Rgb.default_channels(), Some(3));
        assert_eq!(PixelType::Rgba.default_channels(), Some(4));
        assert_eq!(PixelType::Yuv.default_channels(), Some(3));
        assert_eq!(PixelType::BayerGbrg.default_channels(), Some(1));
        assert_eq!(PixelType::QuadBayerRggb.default_channels(), Some(1));
    }

    #[test]
    fn test_bayer_sites() {
        use BayerSite::*;
        assert_eq!(PixelType::BayerRggb.bayer_sites(), Some([R, Gr, Gb, B]));
        assert_eq!(PixelType::BayerGbrg.bayer_sites(), Some([Gb, B, R, Gr]));
        assert_eq!(PixelType::QuadBayerRggb.bayer_sites(), None);
        assert!(PixelType::QuadBayerRggb.is_quad_bayer());
        assert!(!PixelType::QuadBayerRggb.is_bayer());
    }

    #[test]
    fn test_format_codes() {
        assert_eq!(<u8 as Sample>::FORMAT, "B");
        assert_eq!(<u16 as Sample>::FORMAT, "H");
        assert_eq!(<i32 as Sample>::FORMAT, "i");
        assert_eq!(<f32 as Sample>::FORMAT, "f");
        assert_eq!(<f64 as Sample>::FORMAT, "d");
    }
}
