//! Best-effort EXIF extraction for uploaded photos.
//!
//! Any failure yields an all-empty [`ExifData`]; item creation never waits
//! on a readable EXIF block.

use std::io::{BufReader, Cursor};
use std::path::Path;

use ::exif::{Exif, Field, In, Reader, Tag, Value};
use serde::Serialize;
use thiserror::Error;
use time::{format_description::well_known::Rfc3339, macros::format_description, PrimitiveDateTime};
use tracing::{debug, warn};

/// Metadata pulled from a photo. Every field is independently optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExifData {
    pub gps_lat: Option<f64>,
    pub gps_lon: Option<f64>,
    pub gps_alt: Option<f64>,
    /// Capture time as RFC 3339 UTC.
    pub datetime_original: Option<String>,
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
    pub software: Option<String>,
}

#[derive(Debug, Error)]
pub enum ExifError {
    #[error("read image: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse exif: {0}")]
    Parse(#[from] ::exif::Error),
}

/// Extracts metadata from an image held in memory.
pub fn extract_from_bytes(bytes: &[u8]) -> ExifData {
    let mut reader = Cursor::new(bytes);
    match Reader::new().read_from_container(&mut reader) {
        Ok(exif) => from_exif(&exif),
        Err(e) => recover(ExifError::from(e)),
    }
}

/// Extracts metadata from an image file on disk.
pub fn extract_from_path(path: impl AsRef<Path>) -> ExifData {
    let path = path.as_ref();
    let parsed = std::fs::File::open(path)
        .map_err(ExifError::from)
        .and_then(|file| {
            let mut reader = BufReader::new(file);
            Reader::new()
                .read_from_container(&mut reader)
                .map_err(ExifError::from)
        });
    match parsed {
        Ok(exif) => from_exif(&exif),
        Err(e) => recover(e),
    }
}

fn recover(err: ExifError) -> ExifData {
    match &err {
        // Plenty of valid uploads (PNG screenshots, stripped JPEGs) carry no EXIF.
        ExifError::Parse(::exif::Error::NotFound(_)) => debug!("image has no exif block"),
        _ => warn!(error = %err, "exif extraction failed"),
    }
    ExifData::default()
}

fn from_exif(exif: &Exif) -> ExifData {
    let field = |tag| exif.get_field(tag, In::PRIMARY);

    let gps_lat = field(Tag::GPSLatitude).and_then(|f| {
        dms_to_decimal(&rationals(f)?, field(Tag::GPSLatitudeRef).and_then(ascii).as_deref())
    });
    let gps_lon = field(Tag::GPSLongitude).and_then(|f| {
        dms_to_decimal(&rationals(f)?, field(Tag::GPSLongitudeRef).and_then(ascii).as_deref())
    });
    let gps_alt = field(Tag::GPSAltitude).and_then(|f| {
        let below_sea_level = field(Tag::GPSAltitudeRef)
            .map(|r| matches!(&r.value, Value::Byte(b) if b.first() == Some(&1)))
            .unwrap_or(false);
        signed_altitude(*rationals(f)?.first()?, below_sea_level)
    });

    ExifData {
        gps_lat,
        gps_lon,
        gps_alt,
        datetime_original: field(Tag::DateTimeOriginal)
            .and_then(ascii)
            .and_then(|s| exif_datetime_to_rfc3339(&s)),
        camera_make: field(Tag::Make).and_then(ascii),
        camera_model: field(Tag::Model).and_then(ascii),
        software: field(Tag::Software).and_then(ascii),
    }
}

fn rationals(field: &Field) -> Option<Vec<f64>> {
    match &field.value {
        Value::Rational(v) if !v.is_empty() => Some(v.iter().map(|r| r.to_f64()).collect()),
        _ => None,
    }
}

fn ascii(field: &Field) -> Option<String> {
    match &field.value {
        Value::Ascii(parts) => {
            let raw = parts.first()?;
            let s = String::from_utf8_lossy(raw);
            let s = s.trim_matches(|c: char| c == '\0' || c.is_whitespace());
            (!s.is_empty()).then(|| s.to_string())
        }
        _ => None,
    }
}

/// Degrees/minutes/seconds to signed decimal degrees. `S` and `W`
/// references flip the sign.
pub fn dms_to_decimal(dms: &[f64], reference: Option<&str>) -> Option<f64> {
    let degrees = *dms.first()?;
    let minutes = dms.get(1).copied().unwrap_or(0.0);
    let seconds = dms.get(2).copied().unwrap_or(0.0);
    let value = degrees + minutes / 60.0 + seconds / 3600.0;
    if !value.is_finite() {
        return None;
    }
    let negative = matches!(reference.map(str::trim), Some("S" | "s" | "W" | "w"));
    Some(if negative { -value } else { value })
}

fn signed_altitude(altitude: f64, below_sea_level: bool) -> Option<f64> {
    altitude
        .is_finite()
        .then(|| if below_sea_level { -altitude } else { altitude })
}

/// `"2023:05:01 14:22:10"` to `"2023-05-01T14:22:10Z"`. EXIF carries no
/// zone in this tag, so the value is taken as UTC.
pub fn exif_datetime_to_rfc3339(raw: &str) -> Option<String> {
    let fmt = format_description!("[year]:[month]:[day] [hour]:[minute]:[second]");
    let trimmed = raw.trim();
    // Some cameras append subseconds or junk after the 19-char timestamp.
    let head = trimmed.get(..19).unwrap_or(trimmed);
    let dt = PrimitiveDateTime::parse(head, &fmt).ok()?;
    dt.assume_utc().format(&Rfc3339).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_give_empty_record() {
        assert_eq!(extract_from_bytes(b"definitely not an image"), ExifData::default());
        assert_eq!(extract_from_bytes(&[]), ExifData::default());
    }

    #[test]
    fn png_without_exif_gives_empty_record() {
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        assert_eq!(extract_from_bytes(&png), ExifData::default());
    }

    #[test]
    fn missing_file_gives_empty_record() {
        let path = std::env::temp_dir().join("fitfolio-no-such-image.jpg");
        assert_eq!(extract_from_path(path), ExifData::default());
    }

    fn tiff_with(fields: &[::exif::Field]) -> Vec<u8> {
        let mut writer = ::exif::experimental::Writer::new();
        for f in fields {
            writer.push_field(f);
        }
        let mut out = Cursor::new(Vec::new());
        writer.write(&mut out, false).expect("write tiff");
        out.into_inner()
    }

    fn tag(tag: Tag, value: Value) -> ::exif::Field {
        ::exif::Field {
            tag,
            ifd_num: In::PRIMARY,
            value,
        }
    }

    fn text(s: &str) -> Value {
        Value::Ascii(vec![s.as_bytes().to_vec()])
    }

    fn dms(d: u32, m: u32, s: u32) -> Value {
        Value::Rational(vec![(d, 1).into(), (m, 1).into(), (s, 1).into()])
    }

    #[test]
    fn tags_map_to_record() {
        let fields = [
            tag(Tag::Make, text("Canon")),
            tag(Tag::Model, text("EOS R6")),
            tag(Tag::DateTimeOriginal, text("2023:05:01 14:22:10")),
            tag(Tag::GPSLatitudeRef, text("S")),
            tag(Tag::GPSLatitude, dms(33, 51, 58)),
            tag(Tag::GPSLongitudeRef, text("E")),
            tag(Tag::GPSLongitude, dms(151, 12, 0)),
            tag(Tag::GPSAltitudeRef, Value::Byte(vec![1])),
            tag(Tag::GPSAltitude, Value::Rational(vec![(5, 1).into()])),
        ];
        let data = extract_from_bytes(&tiff_with(&fields));

        let lat = data.gps_lat.expect("latitude");
        assert!((lat + 33.866_111).abs() < 1e-5, "{lat}");
        let lon = data.gps_lon.expect("longitude");
        assert!((lon - 151.2).abs() < 1e-9, "{lon}");
        assert_eq!(data.gps_alt, Some(-5.0));
        assert_eq!(data.datetime_original.as_deref(), Some("2023-05-01T14:22:10Z"));
        assert_eq!(data.camera_make.as_deref(), Some("Canon"));
        assert_eq!(data.camera_model.as_deref(), Some("EOS R6"));
        assert_eq!(data.software, None);
    }

    #[test]
    fn missing_refs_leave_coordinates_positive() {
        let fields = [
            tag(Tag::GPSLatitude, dms(10, 30, 0)),
            tag(Tag::GPSLongitude, dms(20, 0, 0)),
            tag(Tag::GPSAltitude, Value::Rational(vec![(12, 1).into()])),
            tag(Tag::Software, text("fw 1.2")),
        ];
        let data = extract_from_bytes(&tiff_with(&fields));
        assert_eq!(data.gps_lat, Some(10.5));
        assert_eq!(data.gps_lon, Some(20.0));
        assert_eq!(data.gps_alt, Some(12.0));
        assert_eq!(data.software.as_deref(), Some("fw 1.2"));
        assert_eq!(data.datetime_original, None);
    }

    #[test]
    fn dms_conversion_respects_hemisphere() {
        let lat = dms_to_decimal(&[48.0, 51.0, 29.5], Some("N")).unwrap();
        assert!((lat - 48.858_194).abs() < 1e-5);

        let lon = dms_to_decimal(&[2.0, 17.0, 40.2], Some("W")).unwrap();
        assert!((lon + 2.294_5).abs() < 1e-4);

        assert_eq!(dms_to_decimal(&[10.0], Some("S")), Some(-10.0));
        assert_eq!(dms_to_decimal(&[], Some("N")), None);
        assert_eq!(dms_to_decimal(&[f64::NAN, 0.0, 0.0], None), None);
    }

    #[test]
    fn altitude_sign() {
        assert_eq!(signed_altitude(35.0, false), Some(35.0));
        assert_eq!(signed_altitude(12.5, true), Some(-12.5));
        assert_eq!(signed_altitude(f64::INFINITY, false), None);
    }

    #[test]
    fn exif_datetime_formats_as_utc() {
        assert_eq!(
            exif_datetime_to_rfc3339("2023:05:01 14:22:10").as_deref(),
            Some("2023-05-01T14:22:10Z")
        );
        assert_eq!(
            exif_datetime_to_rfc3339("2023:05:01 14:22:10.123").as_deref(),
            Some("2023-05-01T14:22:10Z")
        );
        assert_eq!(exif_datetime_to_rfc3339("0000:00:00 00:00:00"), None);
        assert_eq!(exif_datetime_to_rfc3339("yesterday"), None);
    }
}
