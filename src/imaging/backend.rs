//! Raster backend trait and shared types.
//!
//! The [`ImageBackend`] trait covers everything the compositor needs from a
//! graphics stack: decode a photo, load a logo, measure and draw text, and
//! encode the finished canvas as JPEG. Geometry, blitting and layout stay in
//! the compositor so they can be tested without fonts.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend): `image` for codecs,
//! `ab_glyph` + `imageproc` for text.

use super::params::{Quality, TextStyle};
use image::RgbaImage;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// Rendered size of a line of text. `height` is the full line height
/// (ascent + descent), not the ink bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextExtent {
    pub width: u32,
    pub height: u32,
}

/// Trait for raster backends.
///
/// `Send + Sync` so one backend can be shared by every worker in the pool.
pub trait ImageBackend: Send + Sync {
    /// Decode an encoded photo, with its EXIF orientation already applied.
    fn decode(&self, bytes: &[u8]) -> Result<RgbaImage, BackendError>;

    /// Load a logo image from disk.
    fn load_logo(&self, path: &Path) -> Result<RgbaImage, BackendError>;

    /// Measure one line of text.
    fn measure_text(&self, text: &str, style: &TextStyle) -> TextExtent;

    /// Draw one line of text with its line box's top-left corner at `(x, y)`.
    fn draw_text(&self, canvas: &mut RgbaImage, text: &str, style: &TextStyle, x: i32, y: i32);

    /// Encode the canvas as JPEG at `path`.
    fn save_jpeg(&self, canvas: &RgbaImage, path: &Path, quality: Quality) -> Result<(), BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::config::FontWeight;
    use image::Rgba;
    use std::sync::Mutex;

    /// Mock backend that records operations without touching fonts or codecs.
    /// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
    ///
    /// Text is measured as half the pixel size per character, and one line is
    /// 1.2 × the pixel size tall.
    pub struct MockBackend {
        /// Dimensions every successful decode returns.
        pub source_size: (u32, u32),
        /// Decode fails for inputs starting with this prefix.
        pub corrupt_prefix: Option<Vec<u8>>,
        /// Dimensions of every loaded logo; `None` makes logo loads fail.
        pub logo_size: Option<(u32, u32)>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Decode(usize),
        LoadLogo(String),
        DrawText {
            text: String,
            x: i32,
            y: i32,
            size: f32,
            weight: FontWeight,
        },
        SaveJpeg {
            path: String,
            width: u32,
            height: u32,
            quality: u32,
        },
    }

    impl Default for MockBackend {
        fn default() -> Self {
            Self {
                source_size: (400, 300),
                corrupt_prefix: None,
                logo_size: Some((100, 50)),
                operations: Mutex::new(Vec::new()),
            }
        }
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_source(width: u32, height: u32) -> Self {
            Self {
                source_size: (width, height),
                ..Self::default()
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        pub fn drawn_text(&self) -> Vec<String> {
            self.get_operations()
                .into_iter()
                .filter_map(|op| match op {
                    RecordedOp::DrawText { text, .. } => Some(text),
                    _ => None,
                })
                .collect()
        }

        fn record(&self, op: RecordedOp) {
            self.operations.lock().unwrap().push(op);
        }
    }

    impl ImageBackend for MockBackend {
        fn decode(&self, bytes: &[u8]) -> Result<RgbaImage, BackendError> {
            self.record(RecordedOp::Decode(bytes.len()));
            if self
                .corrupt_prefix
                .as_ref()
                .is_some_and(|prefix| bytes.starts_with(prefix))
            {
                return Err(BackendError::Decode("mock corrupt input".into()));
            }
            let (w, h) = self.source_size;
            Ok(RgbaImage::from_pixel(w, h, Rgba([10, 20, 30, 255])))
        }

        fn load_logo(&self, path: &Path) -> Result<RgbaImage, BackendError> {
            self.record(RecordedOp::LoadLogo(path.to_string_lossy().to_string()));
            let (w, h) = self
                .logo_size
                .ok_or_else(|| BackendError::Decode("mock logo failure".into()))?;
            Ok(RgbaImage::from_pixel(w, h, Rgba([200, 0, 0, 255])))
        }

        fn measure_text(&self, text: &str, style: &TextStyle) -> TextExtent {
            if text.is_empty() {
                return TextExtent::default();
            }
            TextExtent {
                width: (text.chars().count() as f32 * style.size * 0.5).ceil() as u32,
                height: (style.size * 6.0 / 5.0).ceil() as u32,
            }
        }

        fn draw_text(&self, _canvas: &mut RgbaImage, text: &str, style: &TextStyle, x: i32, y: i32) {
            self.record(RecordedOp::DrawText {
                text: text.to_string(),
                x,
                y,
                size: style.size,
                weight: style.weight,
            });
        }

        fn save_jpeg(&self, canvas: &RgbaImage, path: &Path, quality: Quality) -> Result<(), BackendError> {
            self.record(RecordedOp::SaveJpeg {
                path: path.to_string_lossy().to_string(),
                width: canvas.width(),
                height: canvas.height(),
                quality: quality.value(),
            });
            Ok(())
        }
    }

    #[test]
    fn mock_decode_returns_configured_size() {
        let backend = MockBackend::with_source(800, 600);
        let img = backend.decode(b"anything").unwrap();
        assert_eq!(img.dimensions(), (800, 600));
        assert_eq!(backend.get_operations(), vec![RecordedOp::Decode(8)]);
    }

    #[test]
    fn mock_decode_fails_on_corrupt_prefix() {
        let backend = MockBackend {
            corrupt_prefix: Some(b"BAD".to_vec()),
            ..MockBackend::default()
        };
        assert!(backend.decode(b"BAD bytes").is_err());
        assert!(backend.decode(b"good bytes").is_ok());
    }

    #[test]
    fn mock_measures_proportionally() {
        let backend = MockBackend::new();
        let style = TextStyle::top_row(20, FontWeight::NORMAL);
        assert_eq!(
            backend.measure_text("abcd", &style),
            TextExtent {
                width: 30,
                height: 18
            }
        );
        assert_eq!(backend.measure_text("", &style), TextExtent::default());
    }

    #[test]
    fn mock_records_save() {
        let backend = MockBackend::new();
        let canvas = RgbaImage::new(10, 20);
        backend
            .save_jpeg(&canvas, Path::new("/out/a.jpg"), Quality::new(95))
            .unwrap();
        assert_eq!(
            backend.get_operations(),
            vec![RecordedOp::SaveJpeg {
                path: "/out/a.jpg".into(),
                width: 10,
                height: 20,
                quality: 95
            }]
        );
    }
}
