//! Translation between EXIF blocks and [`ExifMetadata`].
//!
//! Reading goes through `kamadak-exif`, which understands JPEG and TIFF
//! containers. Writing produces either a TIFF-structured block suitable for
//! a JPEG APP1 segment, or a complete single-strip TIFF file.

use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::Path;

use exif::experimental::Writer;
use exif::{Context, Exif, Field, In, Tag, Value};
use pixio_meta::{ExifMetadata, ImageMetadata, Rational, SRational};
use tracing::debug;

use crate::{IoError, IoResult};

/// Prefix of the APP1 payload that carries EXIF.
pub const APP1_EXIF_HEADER: &[u8] = b"Exif\0\0";

/// Reads the primary-image EXIF fields of a JPEG or TIFF file.
///
/// # Errors
///
/// [`IoError::MissingData`] if the file has no EXIF block,
/// [`IoError::DecodeError`] if the block is malformed.
pub fn read_exif(path: &Path) -> IoResult<ExifMetadata> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let exif = exif::Reader::new()
        .read_from_container(&mut reader)
        .map_err(|e| match e {
            exif::Error::NotFound(_) => {
                IoError::MissingData(format!("{} has no EXIF block", path.display()))
            }
            exif::Error::Io(io) => IoError::Io(io),
            other => IoError::decode(other),
        })?;
    debug!(path = %path.display(), fields = exif.fields().len(), "read EXIF");
    Ok(from_exif(&exif))
}

/// Fills `hint.exifMetadata` from the file when the hint carries none.
///
/// Files without an EXIF block leave the hint untouched.
pub fn merge_exif(path: &Path, hint: Option<ImageMetadata>) -> IoResult<Option<ImageMetadata>> {
    let mut meta = hint.unwrap_or_default();
    if meta.exif_metadata.is_empty() {
        match read_exif(path) {
            Ok(exif) => meta.exif_metadata = exif,
            Err(IoError::MissingData(_)) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(Some(meta))
}

fn uint(exif: &Exif, tag: Tag) -> Option<u32> {
    exif.get_field(tag, In::PRIMARY)?.value.get_uint(0)
}

fn short(exif: &Exif, tag: Tag) -> Option<u16> {
    uint(exif, tag).and_then(|v| u16::try_from(v).ok())
}

fn ascii(exif: &Exif, tag: Tag) -> Option<String> {
    match &exif.get_field(tag, In::PRIMARY)?.value {
        Value::Ascii(parts) => parts
            .first()
            .map(|s| String::from_utf8_lossy(s).trim_end_matches('\0').to_string()),
        _ => None,
    }
}

fn rational(exif: &Exif, tag: Tag) -> Option<Rational> {
    match &exif.get_field(tag, In::PRIMARY)?.value {
        Value::Rational(v) => v.first().map(|r| Rational::new(r.num, r.denom)),
        _ => None,
    }
}

fn srational(exif: &Exif, tag: Tag) -> Option<SRational> {
    match &exif.get_field(tag, In::PRIMARY)?.value {
        Value::SRational(v) => v.first().map(|r| SRational::new(r.num, r.denom)),
        _ => None,
    }
}

/// Picks the fields [`ExifMetadata`] models out of a parsed block.
pub fn from_exif(exif: &Exif) -> ExifMetadata {
    ExifMetadata {
        image_width: uint(exif, Tag::ImageWidth).or_else(|| uint(exif, Tag::PixelXDimension)),
        image_height: uint(exif, Tag::ImageLength).or_else(|| uint(exif, Tag::PixelYDimension)),
        image_description: ascii(exif, Tag::ImageDescription),
        make: ascii(exif, Tag::Make),
        model: ascii(exif, Tag::Model),
        orientation: short(exif, Tag::Orientation),
        software: ascii(exif, Tag::Software),
        exposure_time: rational(exif, Tag::ExposureTime),
        f_number: rational(exif, Tag::FNumber),
        iso_speed_ratings: short(exif, Tag::PhotographicSensitivity),
        date_time_original: ascii(exif, Tag::DateTimeOriginal),
        brightness_value: srational(exif, Tag::BrightnessValue),
        exposure_bias_value: srational(exif, Tag::ExposureBiasValue),
        focal_length: rational(exif, Tag::FocalLength),
        focal_length_in_35mm_film: short(exif, Tag::FocalLengthIn35mmFilm),
    }
}

fn to_fields(meta: &ExifMetadata) -> Vec<Field> {
    let mut fields = Vec::new();
    let mut push = |tag, value| {
        fields.push(Field {
            tag,
            ifd_num: In::PRIMARY,
            value,
        })
    };
    let ascii = |s: &String| Value::Ascii(vec![s.clone().into_bytes()]);
    let rational = |r: &Rational| Value::Rational(vec![(r.numerator, r.denominator).into()]);
    let srational = |r: &SRational| Value::SRational(vec![(r.numerator, r.denominator).into()]);

    if let Some(v) = meta.image_width {
        push(Tag::ImageWidth, Value::Long(vec![v]));
    }
    if let Some(v) = meta.image_height {
        push(Tag::ImageLength, Value::Long(vec![v]));
    }
    if let Some(v) = &meta.image_description {
        push(Tag::ImageDescription, ascii(v));
    }
    if let Some(v) = &meta.make {
        push(Tag::Make, ascii(v));
    }
    if let Some(v) = &meta.model {
        push(Tag::Model, ascii(v));
    }
    if let Some(v) = meta.orientation {
        push(Tag::Orientation, Value::Short(vec![v]));
    }
    if let Some(v) = &meta.software {
        push(Tag::Software, ascii(v));
    }
    if let Some(v) = &meta.exposure_time {
        push(Tag::ExposureTime, rational(v));
    }
    if let Some(v) = &meta.f_number {
        push(Tag::FNumber, rational(v));
    }
    if let Some(v) = meta.iso_speed_ratings {
        push(Tag::PhotographicSensitivity, Value::Short(vec![v]));
    }
    if let Some(v) = &meta.date_time_original {
        push(Tag::DateTimeOriginal, ascii(v));
    }
    if let Some(v) = &meta.brightness_value {
        push(Tag::BrightnessValue, srational(v));
    }
    if let Some(v) = &meta.exposure_bias_value {
        push(Tag::ExposureBiasValue, srational(v));
    }
    if let Some(v) = &meta.focal_length {
        push(Tag::FocalLength, rational(v));
    }
    if let Some(v) = meta.focal_length_in_35mm_film {
        push(Tag::FocalLengthIn35mmFilm, Value::Short(vec![v]));
    }
    fields
}

/// Serializes the present fields as a little-endian TIFF-structured block.
pub fn encode_exif(meta: &ExifMetadata) -> IoResult<Vec<u8>> {
    let fields = to_fields(meta);
    let mut writer = Writer::new();
    for field in &fields {
        writer.push_field(field);
    }
    let mut buf = Cursor::new(Vec::new());
    writer.write(&mut buf, true).map_err(IoError::encode)?;
    Ok(buf.into_inner())
}

/// Sample layout of an uncompressed, interleaved, single-strip TIFF image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripLayout {
    pub width: u32,
    pub height: u32,
    /// 1 to 4; two and four channels carry alpha.
    pub channels: u16,
    pub bits: u16,
    pub float: bool,
}

const EXTRA_SAMPLES: Tag = Tag(Context::Tiff, 338);
const SAMPLE_FORMAT: Tag = Tag(Context::Tiff, 339);

fn structure_fields(layout: &StripLayout) -> Vec<Field> {
    let short = |v: u16| Value::Short(vec![v]);
    let channels = usize::from(layout.channels);
    let mut fields = vec![
        (Tag::ImageWidth, Value::Long(vec![layout.width])),
        (Tag::ImageLength, Value::Long(vec![layout.height])),
        (Tag::BitsPerSample, Value::Short(vec![layout.bits; channels])),
        (Tag::Compression, short(1)),
        (Tag::PhotometricInterpretation, short(if channels < 3 { 1 } else { 2 })),
        (Tag::SamplesPerPixel, short(layout.channels)),
        (Tag::RowsPerStrip, Value::Long(vec![layout.height])),
        (Tag::PlanarConfiguration, short(1)),
        (SAMPLE_FORMAT, Value::Short(vec![if layout.float { 3 } else { 1 }; channels])),
    ];
    if channels == 2 || channels == 4 {
        // unassociated alpha
        fields.push((EXTRA_SAMPLES, short(2)));
    }
    fields
        .into_iter()
        .map(|(tag, value)| Field {
            tag,
            ifd_num: In::PRIMARY,
            value,
        })
        .collect()
}

/// Builds a little-endian TIFF holding `strip` and the present EXIF fields.
///
/// `strip` is the little-endian sample data of `layout`. The EXIF image
/// dimensions are replaced by the strip's own.
pub fn encode_tiff(layout: &StripLayout, strip: &[u8], meta: &ExifMetadata) -> IoResult<Vec<u8>> {
    let structure = structure_fields(layout);
    let tags = to_fields(meta);
    let strips = [strip];

    let mut writer = Writer::new();
    for field in &structure {
        writer.push_field(field);
    }
    for field in tags
        .iter()
        .filter(|f| f.tag != Tag::ImageWidth && f.tag != Tag::ImageLength)
    {
        writer.push_field(field);
    }
    writer.set_strips(&strips, In::PRIMARY);

    let mut buf = Cursor::new(Vec::new());
    writer.write(&mut buf, true).map_err(IoError::encode)?;
    debug!(width = layout.width, height = layout.height, fields = tags.len(), "encoded TIFF with EXIF");
    Ok(buf.into_inner())
}

/// APP1 payload: the EXIF header followed by the encoded block.
pub fn app1_payload(meta: &ExifMetadata) -> IoResult<Vec<u8>> {
    let block = encode_exif(meta)?;
    let mut payload = Vec::with_capacity(APP1_EXIF_HEADER.len() + block.len());
    payload.extend_from_slice(APP1_EXIF_HEADER);
    payload.extend_from_slice(&block);
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ExifMetadata {
        ExifMetadata {
            image_width: Some(640),
            image_height: Some(480),
            make: Some("Acme".into()),
            model: Some("Sensor 9".into()),
            orientation: Some(6),
            exposure_time: Some(Rational::new(1, 250)),
            f_number: Some(Rational::new(18, 10)),
            iso_speed_ratings: Some(400),
            date_time_original: Some("2024:05:06 07:08:09".into()),
            exposure_bias_value: Some(SRational::new(-2, 3)),
            focal_length_in_35mm_film: Some(28),
            ..Default::default()
        }
    }

    #[test]
    fn test_block_roundtrip() {
        let meta = sample();
        let block = encode_exif(&meta).unwrap();
        assert!(block.starts_with(b"II*\0"));

        let parsed = exif::Reader::new().read_raw(block).unwrap();
        assert_eq!(from_exif(&parsed), meta);
    }

    #[test]
    fn test_tiff_carries_strip_and_tags() {
        let layout = StripLayout {
            width: 2,
            height: 2,
            channels: 1,
            bits: 8,
            float: false,
        };
        let file = encode_tiff(&layout, &[10, 20, 30, 40], &sample()).unwrap();

        let parsed = exif::Reader::new().read_raw(file).unwrap();
        let exif = from_exif(&parsed);
        // dimensions come from the strip, not the metadata
        assert_eq!(exif.image_width, Some(2));
        assert_eq!(exif.image_height, Some(2));
        assert_eq!(exif.make.as_deref(), Some("Acme"));
        assert_eq!(exif.exposure_time, Some(Rational::new(1, 250)));
        assert_eq!(
            parsed
                .get_field(Tag::BitsPerSample, In::PRIMARY)
                .and_then(|f| f.value.get_uint(0)),
            Some(8)
        );
    }

    #[test]
    fn test_app1_header() {
        let payload = app1_payload(&sample()).unwrap();
        assert!(payload.starts_with(APP1_EXIF_HEADER));
    }
}
