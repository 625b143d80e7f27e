//! Channel split command.
//!
//! Writes `<stem>_<channel>.<ext>` per channel. Bayer mosaics produce the
//! four half-resolution site planes.

use crate::SplitArgs;
use anyhow::{Context, Result};
use pixio_core::{split_channels, Channel, Image};
use pixio_io::{DynImage, WriterOptions};
use std::fs;
use tracing::debug;

/// Runs the split command.
pub fn run(args: SplitArgs) -> Result<()> {
    let (image, meta) = super::load_image(&args.input, args.metadata.as_deref())?;
    let planes = split(&image)
        .with_context(|| format!("Cannot split {}", args.input.display()))?;

    fs::create_dir_all(&args.output)
        .with_context(|| format!("Cannot create {}", args.output.display()))?;

    let stem = args
        .input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    let ext = match &args.ext {
        Some(ext) => ext.trim_start_matches('.').to_string(),
        None => args
            .input
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("plain")
            .to_string(),
    };

    for (channel, plane) in &planes {
        let path = args.output.join(format!("{stem}_{channel}.{ext}"));
        let mut plane_meta = meta.clone();
        plane_meta.file_info = Default::default();
        debug!(channel = %channel, path = %path.display(), "writing plane");
        super::save_image(&path, plane, WriterOptions::default().with_metadata(plane_meta))?;
        println!("{}", path.display());
    }
    Ok(())
}

fn split(image: &DynImage) -> pixio_core::Result<Vec<(Channel, DynImage)>> {
    fn wrap<T: pixio_core::Sample>(planes: Vec<(Channel, Image<T>)>) -> Vec<(Channel, DynImage)>
    where
        DynImage: From<Image<T>>,
    {
        planes.into_iter().map(|(c, img)| (c, img.into())).collect()
    }

    Ok(match image {
        DynImage::U8(img) => wrap(split_channels(&img.view())?),
        DynImage::U16(img) => wrap(split_channels(&img.view())?),
        DynImage::F32(img) => wrap(split_channels(&img.view())?),
    })
}
