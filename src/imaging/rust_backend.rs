//! Pure Rust raster backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG) + orientation | `image::ImageReader` → `ImageDecoder::orientation` → `apply_orientation` |
//! | Logo decode (PNG, JPEG, WebP) | `image::open` |
//! | Text metrics | `ab_glyph` advances + kerning, `ScaleFont::height` |
//! | Text drawing | `imageproc::drawing::draw_text_mut` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |

use super::backend::{BackendError, ImageBackend, TextExtent};
use super::fonts::FontBook;
use super::params::{Quality, TextStyle};
use ab_glyph::{Font, PxScale, ScaleFont};
use image::buffer::ConvertBuffer;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageEncoder, ImageReader, RgbImage, RgbaImage};
use std::io::Cursor;
use std::path::Path;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping. Holds the
/// font family for the whole run; with an empty [`FontBook`] every text
/// measures as zero and nothing is drawn.
#[derive(Debug, Default)]
pub struct RustBackend {
    fonts: FontBook,
}

impl RustBackend {
    pub fn new(fonts: FontBook) -> Self {
        Self { fonts }
    }
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<RgbaImage, BackendError> {
        let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
        let mut decoder = reader
            .into_decoder()
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
        let mut img =
            DynamicImage::from_decoder(decoder).map_err(|e| BackendError::Decode(e.to_string()))?;
        img.apply_orientation(orientation);
        Ok(img.into_rgba8())
    }

    fn load_logo(&self, path: &Path) -> Result<RgbaImage, BackendError> {
        let img = image::open(path).map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(img.into_rgba8())
    }

    fn measure_text(&self, text: &str, style: &TextStyle) -> TextExtent {
        let Some(face) = self.fonts.face(style.weight) else {
            return TextExtent::default();
        };
        if text.is_empty() || !style.is_visible() {
            return TextExtent::default();
        }
        let scaled = face.font.as_scaled(PxScale::from(style.size));

        let mut width = 0.0f32;
        let mut prev = None;
        for c in text.chars() {
            let glyph = scaled.glyph_id(c);
            if let Some(prev) = prev {
                width += scaled.kern(prev, glyph);
            }
            width += scaled.h_advance(glyph);
            prev = Some(glyph);
        }

        TextExtent {
            width: width.max(0.0).ceil() as u32,
            height: scaled.height().ceil() as u32,
        }
    }

    fn draw_text(&self, canvas: &mut RgbaImage, text: &str, style: &TextStyle, x: i32, y: i32) {
        let Some(face) = self.fonts.face(style.weight) else {
            return;
        };
        if text.is_empty() || !style.is_visible() {
            return;
        }
        imageproc::drawing::draw_text_mut(
            canvas,
            style.color,
            x,
            y,
            PxScale::from(style.size),
            &face.font,
            text,
        );
    }

    fn save_jpeg(&self, canvas: &RgbaImage, path: &Path, quality: Quality) -> Result<(), BackendError> {
        let rgb: RgbImage = canvas.convert();
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        image::codecs::jpeg::JpegEncoder::new_with_quality(writer, quality.as_u8())
            .write_image(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| BackendError::Encode(e.to_string()))
    }
}
