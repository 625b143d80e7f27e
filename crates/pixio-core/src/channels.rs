//! Channel split and merge.
//!
//! [`split_channels`] turns any supported image into one single-channel
//! GRAYSCALE image per channel; [`merge_channels`] puts them back into a
//! target layout. Bayer mosaics split into their four colour filter sites,
//! each a half-resolution image:
//!
//! ```text
//! BAYER_RGGB   R  Gr R  Gr      r  = (0,0) (2,0) ...
//!              Gb B  Gb B       gr = (1,0) (3,0) ...
//!                               gb = (0,1) ...   b = (1,1) ...
//! ```
//!
//! YUV_420 and NV12 chroma come out at chroma resolution.

use std::fmt;

use crate::{
    BayerSite, Error, Image, ImageRef, ImageView, LayoutDescriptor, PixelType, PlaneDescriptor,
    Result, Sample,
};

/// Name of a split channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    R,
    G,
    B,
    A,
    Gr,
    Gb,
    Y,
    U,
    V,
}

impl Channel {
    /// Lower-case short name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::R => "r",
            Self::G => "g",
            Self::B => "b",
            Self::A => "a",
            Self::Gr => "gr",
            Self::Gb => "gb",
            Self::Y => "y",
            Self::U => "u",
            Self::V => "v",
        }
    }
}

impl From<BayerSite> for Channel {
    fn from(site: BayerSite) -> Self {
        match site {
            BayerSite::R => Self::R,
            BayerSite::Gr => Self::Gr,
            BayerSite::Gb => Self::Gb,
            BayerSite::B => Self::B,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Channels a pixel type splits into, in output order.
pub fn channel_names(pixel_type: PixelType) -> Result<Vec<Channel>> {
    use Channel::*;
    let names = match pixel_type {
        t if t.is_bayer() => vec![R, Gr, Gb, B],
        PixelType::Grayscale => vec![Y],
        PixelType::GrayAlpha => vec![Y, A],
        PixelType::Rgb => vec![R, G, B],
        PixelType::Rgba => vec![R, G, B, A],
        PixelType::Yuv => vec![Y, U, V],
        other => {
            return Err(Error::UnsupportedPixelType(format!(
                "cannot split {other} into named channels"
            )));
        }
    };
    Ok(names)
}

/// Sub-grid of a plane: origin and step in plane coordinates plus extent.
#[derive(Debug, Clone, Copy)]
struct Grid {
    x0: usize,
    y0: usize,
    step: usize,
    width: usize,
    height: usize,
}

impl Grid {
    fn full(plane: &PlaneDescriptor) -> Self {
        Self {
            x0: 0,
            y0: 0,
            step: 1,
            width: plane.width,
            height: plane.height,
        }
    }

    /// Bayer site at raster position `i` of the 2x2 cell.
    fn bayer(plane: &PlaneDescriptor, i: usize) -> Self {
        let (x0, y0) = (i % 2, i / 2);
        Self {
            x0,
            y0,
            step: 2,
            width: plane.width.saturating_sub(x0).div_ceil(2),
            height: plane.height.saturating_sub(y0).div_ceil(2),
        }
    }
}

fn gray_layout(width: usize, height: usize, precision: u8) -> Result<LayoutDescriptor> {
    let w = u32::try_from(width).map_err(|_| Error::invalid_layout("width exceeds u32"))?;
    let h = u32::try_from(height).map_err(|_| Error::invalid_layout("height exceeds u32"))?;
    LayoutDescriptor::builder(w, h)
        .pixel_type(PixelType::Grayscale)
        .pixel_precision(precision)
        .build()
}

fn gather<T: Sample>(
    data: &[T],
    plane: &PlaneDescriptor,
    grid: Grid,
    precision: u8,
) -> Result<Image<T>> {
    let mut out = Image::new(gray_layout(grid.width, grid.height, precision)?);
    for y in 0..grid.height {
        for x in 0..grid.width {
            let v = data[plane.index(grid.x0 + x * grid.step, grid.y0 + y * grid.step)];
            out.set(x, y, 0, v);
        }
    }
    Ok(out)
}

fn scatter<T: Sample>(
    dst: &mut Image<T>,
    plane: PlaneDescriptor,
    grid: Grid,
    src: &ImageRef<'_, T>,
    name: Channel,
) -> Result<()> {
    let (w, h) = (src.width() as usize, src.height() as usize);
    if (w, h) != (grid.width, grid.height) {
        return Err(Error::shape_mismatch(
            &format!("channel {name}"),
            (grid.height, grid.width),
            (h, w),
        ));
    }
    let data = dst.data_mut();
    for y in 0..h {
        for x in 0..w {
            data[plane.index(grid.x0 + x * grid.step, grid.y0 + y * grid.step)] = src.get(x, y, 0);
        }
    }
    Ok(())
}

/// Splits an image into named single-channel images.
///
/// # Errors
///
/// [`Error::UnsupportedPixelType`] for CUSTOM and quad Bayer images.
pub fn split_channels<T: Sample>(image: &ImageRef<'_, T>) -> Result<Vec<(Channel, Image<T>)>> {
    let desc = image.descriptor();
    let precision = desc.pixel_precision();
    let names = channel_names(desc.pixel_type())?;

    if let Some(sites) = desc.pixel_type().bayer_sites() {
        let plane = desc.plane(0);
        return names
            .into_iter()
            .map(|name| {
                let i = sites
                    .iter()
                    .position(|&s| Channel::from(s) == name)
                    .unwrap_or_default();
                Ok((name, gather(image.data(), plane, Grid::bayer(plane, i), precision)?))
            })
            .collect();
    }

    names
        .into_iter()
        .enumerate()
        .map(|(c, name)| {
            let plane = desc.plane(c);
            Ok((name, gather(image.data(), plane, Grid::full(plane), precision)?))
        })
        .collect()
}

/// Assembles single-channel images into a new image laid out by `descriptor`.
///
/// # Errors
///
/// - [`Error::ShapeMismatch`] if a channel is missing or has the wrong size
/// - [`Error::UnsupportedPixelType`] for CUSTOM and quad Bayer targets
pub fn merge_channels<T: Sample>(
    channels: &[(Channel, ImageRef<'_, T>)],
    descriptor: LayoutDescriptor,
) -> Result<Image<T>> {
    let names = channel_names(descriptor.pixel_type())?;
    let lookup = |name: Channel| {
        channels
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, img)| img)
            .ok_or_else(|| Error::ShapeMismatch(format!("missing channel {name}")))
    };

    let sites = descriptor.pixel_type().bayer_sites();
    let mut out = Image::new(descriptor);

    if let Some(sites) = sites {
        let plane = *out.plane(0);
        for (i, site) in sites.into_iter().enumerate() {
            let name = Channel::from(site);
            scatter(&mut out, plane, Grid::bayer(&plane, i), lookup(name)?, name)?;
        }
        return Ok(out);
    }

    for (c, name) in names.into_iter().enumerate() {
        let plane = *out.plane(c);
        scatter(&mut out, plane, Grid::full(&plane), lookup(name)?, name)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ImageLayout;

    #[test]
    fn test_bayer_split_sites() {
        let layout = LayoutDescriptor::builder(4, 2)
            .pixel_type(PixelType::BayerGrbg)
            .build()
            .unwrap();
        // G R G R / B G B G
        let data: Vec<u16> = vec![1, 2, 1, 2, 3, 4, 3, 4];
        let img = ImageRef::new(layout, &data).unwrap();
        let parts = split_channels(&img).unwrap();
        let names: Vec<_> = parts.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec![Channel::R, Channel::Gr, Channel::Gb, Channel::B]);
        for (name, part) in &parts {
            assert_eq!((part.width(), part.height()), (2, 1));
            let expected = match name {
                Channel::Gr => 1,
                Channel::R => 2,
                Channel::B => 3,
                _ => 4,
            };
            assert!(part.data().iter().all(|&v| v == expected));
        }
    }

    #[test]
    fn test_rgb_interleaved_split() {
        let layout = LayoutDescriptor::builder(2, 1)
            .pixel_type(PixelType::Rgb)
            .image_layout(ImageLayout::Interleaved)
            .build()
            .unwrap();
        let data = [10u8, 20, 30, 11, 21, 31];
        let parts = split_channels(&ImageRef::new(layout, &data).unwrap()).unwrap();
        assert_eq!(parts[1].0, Channel::G);
        assert_eq!(parts[1].1.data(), &[20, 21]);
    }

    #[test]
    fn test_yuv420_split_chroma_size() {
        let layout = LayoutDescriptor::builder(4, 4)
            .pixel_type(PixelType::Yuv)
            .image_layout(ImageLayout::Yuv420)
            .build()
            .unwrap();
        let img: Image<u8> = Image::new(layout);
        let parts = split_channels(&img.view()).unwrap();
        assert_eq!(parts[0].1.width(), 4);
        assert_eq!((parts[2].1.width(), parts[2].1.height()), (2, 2));
    }

    #[test]
    fn test_unsupported_types() {
        let layout = LayoutDescriptor::builder(4, 4)
            .pixel_type(PixelType::QuadBayerRggb)
            .build()
            .unwrap();
        let img: Image<u16> = Image::new(layout);
        assert!(matches!(
            split_channels(&img.view()),
            Err(Error::UnsupportedPixelType(_))
        ));
    }

    #[test]
    fn test_merge_missing_channel() {
        let layout = LayoutDescriptor::builder(2, 2)
            .pixel_type(PixelType::GrayAlpha)
            .build()
            .unwrap();
        let y: Image<f32> = Image::new(gray_layout(2, 2, 0).unwrap());
        let err = merge_channels(&[(Channel::Y, y.view())], layout).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch(_)));
    }
}
