//! Parameter types for drawing and encoding.
//!
//! These describe *what* to draw, not *how*. The compositor builds them from
//! the run config and hands them to the [`backend`](super::backend), which
//! owns fonts and pixels. Tests swap in a mock backend without touching the
//! compositor.
//!
//! ## Types
//!
//! - [`Quality`]: JPEG quality (1–100, default 100). Clamped on construction.
//! - [`TextStyle`]: pixel size, weight and color of one text run.
//! - Palette constants for the watermark band.

use image::Rgba;

use crate::config::FontWeight;

/// Quality setting for JPEG encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// JPEG encoders take a `u8`; the clamp keeps this lossless.
    pub fn as_u8(self) -> u8 {
        self.0.clamp(1, 100) as u8
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(100)
    }
}

pub const CANVAS_WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
/// Top row text, #212121.
pub const TEXT_PRIMARY: Rgba<u8> = Rgba([33, 33, 33, 255]);
/// Bottom row text, #727272.
pub const TEXT_SECONDARY: Rgba<u8> = Rgba([114, 114, 114, 255]);
/// Logo/text separator, #CCCCCC.
pub const DIVIDER: Rgba<u8> = Rgba([204, 204, 204, 255]);

/// Style of one run of text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Pixel height of the em square.
    pub size: f32,
    pub weight: FontWeight,
    pub color: Rgba<u8>,
}

impl TextStyle {
    /// Top row: 0.75 of the border, primary color.
    pub fn top_row(border_size: u32, weight: FontWeight) -> Self {
        Self {
            size: border_size as f32 * 0.75,
            weight,
            color: TEXT_PRIMARY,
        }
    }

    /// Bottom row: 0.7 of the border, secondary color.
    pub fn bottom_row(border_size: u32, weight: FontWeight) -> Self {
        Self {
            size: border_size as f32 * 0.7,
            weight,
            color: TEXT_SECONDARY,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.size.is_finite() && self.size > 0.0
    }
}
