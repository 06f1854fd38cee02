//! Raster work in pure Rust, statically linked.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image` (JPEG) with EXIF orientation applied |
//! | **Fonts** | `ab_glyph::FontVec`, discovered with `walkdir` |
//! | **Text** | `ab_glyph` metrics + `imageproc::drawing::draw_text_mut` |
//! | **Encode** | `image::codecs::jpeg::JpegEncoder` |
//!
//! The module is split into:
//! - **Parameters**: text styles, palette, JPEG quality
//! - **Fonts**: [`FontBook`] weight-aware face lookup
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
pub mod fonts;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend, TextExtent};
pub use fonts::FontBook;
pub use params::{CANVAS_WHITE, DIVIDER, Quality, TEXT_PRIMARY, TEXT_SECONDARY, TextStyle};
pub use rust_backend::RustBackend;
