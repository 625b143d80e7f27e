//! Runs the `pixio` binary against scratch images.

use std::path::Path;
use std::process::Command;

use pixio_core::{Image, ImageView, LayoutDescriptor, PixelType};
use pixio_io::{read_image, write_image, DynImage, WriterOptions};
use pixio_meta::FileFormat;

fn pixio(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_pixio"))
        .args(args)
        .output()
        .expect("run pixio")
}

fn write_gray16(path: &Path) -> DynImage {
    let desc = LayoutDescriptor::builder(6, 4)
        .pixel_type(PixelType::BayerBggr)
        .pixel_precision(12)
        .build()
        .unwrap();
    let img = Image::from_vec(desc, (0..24u16).map(|i| i * 150).collect()).unwrap();
    let image = DynImage::from(img);
    write_image(path, &image, WriterOptions::default()).unwrap();
    image
}

#[test]
fn info_prints_json_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("frame.raw");
    write_gray16(&input);

    let out = pixio(&["info", input.to_str().unwrap(), "--json"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(value["fileInfo"]["width"], 6);
    assert_eq!(value["fileInfo"]["pixelType"], "BAYER_BGGR");
}

#[test]
fn convert_packs_raw12() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("frame.raw");
    let image = write_gray16(&input);
    let output = dir.path().join("packed.raw12");

    let out = pixio(&["convert", input.to_str().unwrap(), output.to_str().unwrap()]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let (back, meta) = read_image(&output, None).unwrap();
    assert_eq!(back, image);
    assert_eq!(meta.file_info.file_format, Some(FileFormat::Raw12));
}

#[test]
fn convert_raw10_to_tiff_keeps_mosaic() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("shot.raw10");
    let desc = LayoutDescriptor::builder(8, 4)
        .pixel_type(PixelType::BayerGrbg)
        .pixel_precision(10)
        .build()
        .unwrap();
    let img = Image::from_vec(desc, (0..32u16).map(|i| i * 31).collect()).unwrap();
    write_image(&input, &DynImage::from(img.clone()), WriterOptions::default()).unwrap();
    let output = dir.path().join("shot.tif");

    let out = pixio(&["convert", input.to_str().unwrap(), output.to_str().unwrap()]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let (back, meta) = read_image(&output, None).unwrap();
    assert_eq!(back.pixel_type(), PixelType::BayerGrbg);
    assert_eq!(meta.file_info.pixel_precision, Some(10));
    let back = back.as_u16().unwrap();
    for y in 0..4 {
        for x in 0..8 {
            assert_eq!(back.get(x, y, 0), img.get(x, y, 0));
        }
    }
}

#[test]
fn split_writes_bayer_sites() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("frame.raw");
    write_gray16(&input);
    let planes = dir.path().join("planes");

    let out = pixio(&["split", input.to_str().unwrap(), "-o", planes.to_str().unwrap()]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    for site in ["r", "gr", "gb", "b"] {
        let plane = planes.join(format!("frame_{site}.raw"));
        let (img, _) = read_image(&plane, None).unwrap();
        assert_eq!(img.as_u16().map(|i| i.data().len()), Some(6));
    }
}

#[test]
fn missing_sidecar_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("orphan.raw10");
    std::fs::write(&input, [0u8; 10]).unwrap();

    let out = pixio(&["info", input.to_str().unwrap()]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("orphan.raw10"));
}
