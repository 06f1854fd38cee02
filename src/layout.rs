//! Pure geometry for the framed canvas and watermark band.
//!
//! All functions here are pure and testable without any I/O, fonts or images.
//!
//! ```text
//!  add_frame = true                      add_frame = false
//!  ┌──────────────────────────────┐      ┌──────────────────────────┐
//!  │  b                           │      │                          │
//!  │ ┌──────────────────────────┐ │      │          photo           │
//!  │b│          photo           │b│      │                          │
//!  │ └──────────────────────────┘ │      ├──────────────────────────┤
//!  │   LT            [logo]| RT   │ 4b   │ LT          [logo]| RT   │ 4b
//!  │   LB                  | RB   │      │ LB                | RB   │
//!  └──────────────────────────────┘      └──────────────────────────┘
//! ```
//!
//! `b` is the border size: `border_ratio × longer source edge`, rounded.
//! Text blocks are vertically centered in the band, the right block is
//! right-aligned to its margin, and the logo sits left of the right block
//! with a thin divider between them.

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Axis-aligned rectangle on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Canvas dimensions and fixed anchors for one source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasGeometry {
    pub border: u32,
    pub band_height: u32,
    pub canvas: Size,
    /// Where the top-left of the source photo lands.
    pub source_x: u32,
    pub source_y: u32,
    /// First canvas row of the watermark band.
    pub band_top: u32,
    /// Left edge of the left text block.
    pub left_x: i32,
    /// Right edge of the right text block.
    pub right_x: i32,
}

impl CanvasGeometry {
    /// Vertical center line of the band.
    pub fn band_mid(&self) -> f64 {
        self.band_top as f64 + self.band_height as f64 / 2.0
    }

    /// Top edge that vertically centers something `height` tall in the band.
    pub fn centered_top(&self, height: f64) -> i32 {
        (self.band_mid() - height / 2.0).round() as i32
    }
}

/// Border size: `ratio × max(width, height)`, rounded to whole pixels.
pub fn border_size(source: Size, ratio: f64) -> u32 {
    let longer = source.width.max(source.height) as f64;
    (ratio * longer).round().max(0.0) as u32
}

/// Compute canvas size and anchors for a source image.
///
/// # Examples
/// ```
/// # use frame_mark::layout::{canvas_geometry, Size};
/// let geom = canvas_geometry(Size::new(4000, 3000), 0.02, false);
/// assert_eq!(geom.border, 80);
/// assert_eq!(geom.canvas, Size::new(4000, 3320));
/// ```
pub fn canvas_geometry(source: Size, border_ratio: f64, add_frame: bool) -> CanvasGeometry {
    let b = border_size(source, border_ratio);
    let band_height = 4 * b;
    if add_frame {
        let canvas = Size::new(source.width + 2 * b, source.height + 5 * b);
        CanvasGeometry {
            border: b,
            band_height,
            canvas,
            source_x: b,
            source_y: b,
            band_top: b + source.height,
            left_x: (2 * b) as i32,
            right_x: canvas.width as i32 - (2 * b) as i32,
        }
    } else {
        let canvas = Size::new(source.width, source.height + band_height);
        CanvasGeometry {
            border: b,
            band_height,
            canvas,
            source_x: 0,
            source_y: 0,
            band_top: source.height,
            left_x: b as i32,
            right_x: canvas.width as i32 - b as i32,
        }
    }
}

/// Final positions of everything drawn in the band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatermarkLayout {
    pub left_block: Rect,
    pub right_block: Rect,
    pub logo: Option<Rect>,
    pub divider: Option<Rect>,
}

/// Place the text blocks, logo and divider inside the band.
///
/// `right_has_text` is false when the right block only holds placeholders;
/// the logo then falls back to a height of two borders and no divider is
/// drawn. `logo` is the loaded logo's pixel size, if any.
pub fn place_watermark(
    geom: &CanvasGeometry,
    left: Size,
    right: Size,
    right_has_text: bool,
    logo: Option<Size>,
) -> WatermarkLayout {
    let b = geom.border as f64;

    let left_block = Rect {
        x: geom.left_x,
        y: geom.centered_top(left.height as f64),
        width: left.width,
        height: left.height,
    };
    let right_block = Rect {
        x: geom.right_x - right.width as i32,
        y: geom.centered_top(right.height as f64),
        width: right.width,
        height: right.height,
    };

    let logo = logo.filter(|l| !l.is_empty()).and_then(|dims| {
        let height = if right_has_text {
            0.9 * right.height as f64
        } else {
            2.0 * b
        };
        let width = height * dims.width as f64 / dims.height as f64;
        let (width, height) = (width.round() as u32, height.round() as u32);
        if width == 0 || height == 0 {
            return None;
        }
        Some(Rect {
            x: right_block.x - (0.9 * b).round() as i32 - width as i32,
            y: geom.centered_top(height as f64),
            width,
            height,
        })
    });

    let divider = match logo {
        Some(logo) if right_has_text => {
            let stroke = (0.1 * b).round().max(1.0);
            let center = right_block.x as f64 - 0.5 * b;
            let span = 1.2 * logo.height as f64;
            Some(Rect {
                x: (center - stroke / 2.0).round() as i32,
                y: geom.centered_top(span),
                width: stroke as u32,
                height: span.round() as u32,
            })
        }
        _ => None,
    };

    WatermarkLayout {
        left_block,
        right_block,
        logo,
        divider,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn landscape(add_frame: bool) -> CanvasGeometry {
        canvas_geometry(Size::new(4000, 3000), 0.02, add_frame)
    }

    // =========================================================================
    // canvas_geometry
    // =========================================================================

    #[test]
    fn border_uses_longer_edge() {
        assert_eq!(border_size(Size::new(4000, 3000), 0.02), 80);
        assert_eq!(border_size(Size::new(3000, 4000), 0.02), 80);
        assert_eq!(border_size(Size::new(1000, 1000), 0.015), 15);
    }

    #[test]
    fn unframed_canvas_adds_band_only() {
        let geom = landscape(false);
        assert_eq!(geom.border, 80);
        assert_eq!(geom.band_height, 320);
        assert_eq!(geom.canvas, Size::new(4000, 3320));
        assert_eq!((geom.source_x, geom.source_y), (0, 0));
        assert_eq!(geom.band_top, 3000);
        assert_eq!(geom.left_x, 80);
        assert_eq!(geom.right_x, 3920);
    }

    #[test]
    fn framed_canvas_adds_border_all_round() {
        let geom = landscape(true);
        assert_eq!(geom.canvas, Size::new(4160, 3480));
        assert_eq!((geom.source_x, geom.source_y), (80, 80));
        assert_eq!(geom.band_top, 3080);
        assert_eq!(geom.left_x, 160);
        assert_eq!(geom.right_x, 4000);
    }

    #[test]
    fn band_is_below_photo_in_both_modes() {
        for add_frame in [true, false] {
            let geom = landscape(add_frame);
            assert_eq!(geom.band_top, geom.source_y + 3000);
            assert_eq!(geom.band_top + geom.band_height + geom.source_y, geom.canvas.height);
        }
    }

    #[test]
    fn tiny_image_may_have_zero_border() {
        let geom = canvas_geometry(Size::new(10, 8), 0.02, true);
        assert_eq!(geom.border, 0);
        assert_eq!(geom.canvas, Size::new(10, 8));
    }

    // =========================================================================
    // place_watermark
    // =========================================================================

    #[test]
    fn text_blocks_are_centered_and_aligned() {
        let geom = landscape(false);
        let layout = place_watermark(&geom, Size::new(600, 100), Size::new(500, 120), true, None);

        assert_eq!(layout.left_block.x, 80);
        assert_eq!(layout.left_block.y, 3000 + 160 - 50);
        assert_eq!(layout.right_block.x, 3920 - 500);
        assert_eq!(layout.right_block.y, 3000 + 160 - 60);
        assert_eq!(
            layout.right_block.x + layout.right_block.width as i32,
            geom.right_x
        );
        assert!(layout.logo.is_none());
        assert!(layout.divider.is_none());
    }

    #[test]
    fn logo_scales_to_right_block_and_sits_left_of_it() {
        let geom = landscape(false);
        let layout = place_watermark(
            &geom,
            Size::new(600, 100),
            Size::new(500, 100),
            true,
            Some(Size::new(200, 100)),
        );

        let logo = layout.logo.unwrap();
        assert_eq!((logo.width, logo.height), (180, 90));
        assert_eq!(logo.x, 3420 - 72 - 180);
        assert_eq!(logo.y, 3160 - 45);

        let divider = layout.divider.unwrap();
        assert_eq!(divider.width, 8);
        assert_eq!(divider.x, 3420 - 40 - 4);
        assert_eq!(divider.height, 108);
        assert_eq!(divider.y, 3160 - 54);
        // Divider sits between logo and text.
        assert!(divider.x > logo.x + logo.width as i32);
        assert!(divider.x + (divider.width as i32) < layout.right_block.x);
    }

    #[test]
    fn logo_without_right_text_uses_two_borders_and_no_divider() {
        let geom = landscape(true);
        let layout = place_watermark(
            &geom,
            Size::new(600, 100),
            Size::new(20, 60),
            false,
            Some(Size::new(100, 100)),
        );
        let logo = layout.logo.unwrap();
        assert_eq!((logo.width, logo.height), (160, 160));
        assert!(layout.divider.is_none());
    }

    #[test]
    fn empty_logo_image_is_ignored() {
        let geom = landscape(false);
        let layout = place_watermark(
            &geom,
            Size::default(),
            Size::new(500, 100),
            true,
            Some(Size::new(0, 0)),
        );
        assert!(layout.logo.is_none());
        assert!(layout.divider.is_none());
    }

    #[test]
    fn empty_blocks_collapse_to_band_center() {
        let geom = landscape(false);
        let layout = place_watermark(&geom, Size::default(), Size::default(), false, None);
        assert_eq!(layout.left_block.y, 3160);
        assert_eq!(layout.right_block.x, geom.right_x);
    }
}
