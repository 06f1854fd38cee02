//! Shared test utilities for the frame-mark test suite.
//!
//! Fixtures are synthesized rather than checked in: a small JPEG is encoded
//! with the `image` crate and an EXIF block built with kamadak-exif's writer
//! is spliced in as an APP1 segment right after SOI.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let exif = ExifBuilder::new()
//!     .ascii(Tag::Make, "Canon")
//!     .short(Tag::PhotographicSensitivity, 100);
//! let bytes = jpeg_with_exif(40, 30, &exif);
//! ```

use exif::experimental::Writer;
use exif::{Field, In, Rational, Tag, Value};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};

// =========================================================================
// EXIF blocks
// =========================================================================

/// Collects EXIF fields and serializes them into a TIFF-structured block.
#[derive(Default)]
pub struct ExifBuilder {
    fields: Vec<Field>,
}

impl ExifBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, tag: Tag, value: Value) -> Self {
        self.fields.push(Field {
            tag,
            ifd_num: In::PRIMARY,
            value,
        });
        self
    }

    pub fn ascii(self, tag: Tag, text: &str) -> Self {
        self.push(tag, Value::Ascii(vec![text.as_bytes().to_vec()]))
    }

    pub fn short(self, tag: Tag, value: u16) -> Self {
        self.push(tag, Value::Short(vec![value]))
    }

    pub fn rational(self, tag: Tag, num: u32, denom: u32) -> Self {
        self.push(tag, Value::Rational(vec![Rational { num, denom }]))
    }

    pub fn rationals(self, tag: Tag, parts: &[(u32, u32)]) -> Self {
        let values = parts
            .iter()
            .map(|&(num, denom)| Rational { num, denom })
            .collect();
        self.push(tag, Value::Rational(values))
    }

    /// Serialize to a little-endian TIFF block.
    pub fn tiff(&self) -> Vec<u8> {
        let mut writer = Writer::new();
        for field in &self.fields {
            writer.push_field(field);
        }
        let mut buf = Cursor::new(Vec::new());
        writer.write(&mut buf, true).unwrap();
        buf.into_inner()
    }

    /// APP1 segment carrying the block, marker included.
    pub fn app1_segment(&self) -> Vec<u8> {
        let tiff = self.tiff();
        let len = (2 + 6 + tiff.len()) as u16;
        let mut segment = vec![0xFF, 0xE1];
        segment.extend_from_slice(&len.to_be_bytes());
        segment.extend_from_slice(b"Exif\0\0");
        segment.extend_from_slice(&tiff);
        segment
    }
}

// =========================================================================
// JPEG fixtures
// =========================================================================

/// A mid-gray JPEG with no metadata.
pub fn plain_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([128, 128, 128]));
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Jpeg)
        .unwrap();
    buf.into_inner()
}

/// A mid-gray JPEG carrying the given EXIF block.
pub fn jpeg_with_exif(width: u32, height: u32, exif: &ExifBuilder) -> Vec<u8> {
    let jpeg = plain_jpeg(width, height);
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8], "encoder must start with SOI");
    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(&exif.app1_segment());
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// Valid SOI and EXIF segment followed by bytes no decoder accepts.
pub fn truncated_jpeg(exif: &ExifBuilder) -> Vec<u8> {
    let mut out = vec![0xFF, 0xD8];
    out.extend_from_slice(&exif.app1_segment());
    out.extend_from_slice(b"\xFF\xDBnot really a quantization table");
    out
}

/// Camera fields most tests want present.
pub fn sample_exif() -> ExifBuilder {
    ExifBuilder::new()
        .ascii(Tag::Make, "Canon")
        .ascii(Tag::Model, "Canon EOS R5")
        .ascii(Tag::LensModel, "RF24-70mm F2.8 L IS USM")
        .short(Tag::FocalLengthIn35mmFilm, 35)
        .short(Tag::PhotographicSensitivity, 200)
        .rational(Tag::ExposureTime, 1, 250)
        .rational(Tag::FNumber, 28, 10)
        .ascii(Tag::DateTimeOriginal, "2024:03:09 10:11:12")
}

/// Write a fixture JPEG into `dir` and return its path.
pub fn write_jpeg(dir: &Path, name: &str, width: u32, height: u32, exif: &ExifBuilder) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, jpeg_with_exif(width, height, exif)).unwrap();
    path
}

/// Write a small RGBA PNG usable as a logo.
pub fn write_logo(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 0, 0, 255]));
    img.save_with_format(&path, ImageFormat::Png).unwrap();
    path
}
