//! EXIF metadata decoding.
//!
//! [`decode`] pulls the handful of fields the watermark can show out of an
//! image's EXIF block and returns them as a flat [`MetadataRecord`]. Every
//! field is optional: missing tags decode to an empty string or zero, and the
//! renderers treat those values as "unknown" and leave them out.
//!
//! | Field                | Tag(s)                                   |
//! |----------------------|------------------------------------------|
//! | `make`               | `Make`                                   |
//! | `model`              | `Model`                                  |
//! | `lens_model`         | `LensModel`                              |
//! | `focal_length_35mm`  | `FocalLengthIn35mmFilm`                  |
//! | `iso`                | `PhotographicSensitivity`                |
//! | `exposure_time`      | `ExposureTime` (seconds)                 |
//! | `f_number`           | `FNumber`                                |
//! | `capture_time`       | `DateTimeOriginal`, falling back to `DateTime` |
//! | `latitude/longitude` | `GPSLatitude(Ref)`, `GPSLongitude(Ref)`  |
//!
//! A file with no EXIF container at all is an error; a container with odd or
//! missing values is not.

use exif::{Exif, In, Reader, Tag, Value};
use serde::Serialize;
use std::io::Cursor;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("no readable EXIF data: {0}")]
    Exif(#[from] exif::Error),
}

/// The EXIF fields the watermark renders.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetadataRecord {
    pub make: String,
    pub model: String,
    pub lens_model: String,
    pub focal_length_35mm: u32,
    pub iso: u32,
    /// Shutter time in seconds.
    pub exposure_time: f64,
    pub f_number: f64,
    /// Raw EXIF timestamp, `YYYY:MM:DD HH:MM:SS`.
    pub capture_time: String,
    pub latitude: GpsCoordinate,
    pub longitude: GpsCoordinate,
}

/// One GPS axis in degrees/minutes/seconds plus hemisphere reference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GpsCoordinate {
    pub degrees: f64,
    pub minutes: f64,
    pub seconds: f64,
    /// `N`/`S` for latitude, `E`/`W` for longitude.
    pub hemisphere: Option<char>,
}

impl GpsCoordinate {
    pub fn is_unset(&self) -> bool {
        self.hemisphere.is_none() && self.degrees == 0.0 && self.minutes == 0.0 && self.seconds == 0.0
    }

    fn format(&self) -> String {
        let mut out = format!(
            "{}°{}'{}\"",
            self.degrees.trunc() as i64,
            self.minutes.trunc() as i64,
            self.seconds.trunc() as i64
        );
        if let Some(h) = self.hemisphere {
            out.push(h);
        }
        out
    }
}

/// Decode the EXIF block of a JPEG (or any container kamadak-exif
/// understands) into a [`MetadataRecord`].
pub fn decode(bytes: &[u8]) -> Result<MetadataRecord, DecodeError> {
    let exif = Reader::new().read_from_container(&mut Cursor::new(bytes))?;
    Ok(MetadataRecord::from_exif(&exif))
}

impl MetadataRecord {
    pub fn from_exif(exif: &Exif) -> Self {
        let capture_time = match ascii(exif, Tag::DateTimeOriginal) {
            t if t.is_empty() => ascii(exif, Tag::DateTime),
            t => t,
        };
        Self {
            make: ascii(exif, Tag::Make),
            model: ascii(exif, Tag::Model),
            lens_model: ascii(exif, Tag::LensModel),
            focal_length_35mm: uint(exif, Tag::FocalLengthIn35mmFilm),
            iso: uint(exif, Tag::PhotographicSensitivity),
            exposure_time: rational(exif, Tag::ExposureTime),
            f_number: rational(exif, Tag::FNumber),
            capture_time,
            latitude: gps(exif, Tag::GPSLatitude, Tag::GPSLatitudeRef),
            longitude: gps(exif, Tag::GPSLongitude, Tag::GPSLongitudeRef),
        }
    }

    /// Exposure line such as `35mm ISO200 1/250 f/2.8`.
    ///
    /// Zero values are unknown and dropped; a record with no exposure data
    /// yields an empty string.
    pub fn exposure_summary(&self) -> String {
        let mut parts = Vec::with_capacity(4);
        if self.focal_length_35mm > 0 {
            parts.push(format!("{}mm", self.focal_length_35mm));
        }
        if self.iso > 0 {
            parts.push(format!("ISO{}", self.iso));
        }
        if let Some(shutter) = format_shutter(self.exposure_time) {
            parts.push(shutter);
        }
        if self.f_number > 0.0 && self.f_number.is_finite() {
            parts.push(format!("f/{:.1}", self.f_number));
        }
        parts.join(" ")
    }

    /// Position such as `31°14'5"N 121°28'12"E`, or empty when the image
    /// carries no GPS data.
    pub fn gps_summary(&self) -> String {
        if self.latitude.is_unset() && self.longitude.is_unset() {
            return String::new();
        }
        format!("{} {}", self.latitude.format(), self.longitude.format())
    }
}

/// Shutter time as `1/N` below one second and `Ns` at or above it.
fn format_shutter(seconds: f64) -> Option<String> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return None;
    }
    if seconds >= 1.0 {
        let rounded = (seconds * 10.0).round() / 10.0;
        return Some(if rounded.fract() == 0.0 {
            format!("{}s", rounded as u64)
        } else {
            format!("{rounded:.1}s")
        });
    }
    Some(format!("1/{}", (1.0 / seconds).round() as u64))
}

fn ascii(exif: &Exif, tag: Tag) -> String {
    match exif.get_field(tag, In::PRIMARY).map(|f| &f.value) {
        Some(Value::Ascii(values)) => values
            .first()
            .map(|raw| {
                String::from_utf8_lossy(raw)
                    .trim_end_matches('\0')
                    .trim()
                    .to_string()
            })
            .unwrap_or_default(),
        _ => String::new(),
    }
}

fn uint(exif: &Exif, tag: Tag) -> u32 {
    exif.get_field(tag, In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
        .unwrap_or(0)
}

fn rational(exif: &Exif, tag: Tag) -> f64 {
    match exif.get_field(tag, In::PRIMARY).map(|f| &f.value) {
        Some(Value::Rational(values)) => values
            .first()
            .filter(|r| r.denom != 0)
            .map(|r| r.to_f64())
            .unwrap_or(0.0),
        Some(Value::SRational(values)) => values
            .first()
            .filter(|r| r.denom != 0)
            .map(|r| r.to_f64())
            .unwrap_or(0.0),
        _ => 0.0,
    }
}

fn gps(exif: &Exif, value_tag: Tag, ref_tag: Tag) -> GpsCoordinate {
    let mut coordinate = GpsCoordinate {
        hemisphere: ascii(exif, ref_tag).chars().next(),
        ..GpsCoordinate::default()
    };
    if let Some(Value::Rational(dms)) = exif.get_field(value_tag, In::PRIMARY).map(|f| &f.value) {
        let part = |i: usize| {
            dms.get(i)
                .filter(|r| r.denom != 0)
                .map(|r| r.to_f64())
                .unwrap_or(0.0)
        };
        coordinate.degrees = part(0);
        coordinate.minutes = part(1);
        coordinate.seconds = part(2);
    }
    coordinate
}
