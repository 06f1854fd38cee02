//! Per-image composition.
//!
//! Turns one source JPEG into one framed, watermarked JPEG:
//!
//! 1. Read the file and decode its EXIF block ([`metadata::decode`]).
//!    No EXIF means no watermark content, so the image is skipped.
//! 2. Decode the pixels through the backend (orientation applied).
//! 3. Compute the canvas ([`layout::canvas_geometry`]) and paint it white.
//! 4. Blit the photo, measure both text blocks, resolve and load the logo.
//! 5. Place everything ([`layout::place_watermark`]) and draw it.
//! 6. Encode to `output_dir/<same file name>` at the configured quality.
//!
//! A missing or unreadable logo is logged and the image is composed without
//! one; every other failure is returned as a [`ProcessError`].

use crate::config::RunConfig;
use crate::imaging::{BackendError, CANVAS_WHITE, DIVIDER, ImageBackend, Quality};
use crate::layout::{self, Rect, Size};
use crate::logos::LogoResolver;
use crate::metadata::{self, DecodeError, MetadataRecord};
use crate::text::{MeasuredBlock, TextBlock};
use image::RgbaImage;
use image::imageops::{self, FilterType};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Metadata unreadable: {0}")]
    MetadataUnreadable(#[from] DecodeError),
    #[error("Image unreadable: {0}")]
    ImageUnreadable(#[source] BackendError),
    #[error("Encoding failed: {0}")]
    Encode(#[source] BackendError),
    #[error("Source has no file name: {0}")]
    NoFileName(PathBuf),
}

/// Everything one image needs that stays fixed for the whole run.
pub struct Compositor<'a> {
    pub config: &'a RunConfig,
    pub logos: &'a LogoResolver,
    pub backend: &'a dyn ImageBackend,
}

impl<'a> Compositor<'a> {
    pub fn new(config: &'a RunConfig, logos: &'a LogoResolver, backend: &'a dyn ImageBackend) -> Self {
        Self {
            config,
            logos,
            backend,
        }
    }

    /// Compose `source` and write the result into the output directory.
    /// Returns the path written.
    pub fn process(&self, source: &Path) -> Result<PathBuf, ProcessError> {
        let file_name = source
            .file_name()
            .ok_or_else(|| ProcessError::NoFileName(source.to_path_buf()))?;
        let output = self.config.output_dir.join(file_name);

        let bytes = std::fs::read(source)?;
        let canvas = self.render(&bytes)?;
        self.backend
            .save_jpeg(&canvas, &output, Quality::new(self.config.quality))
            .map_err(ProcessError::Encode)?;

        tracing::debug!(source = %source.display(), output = %output.display(), "composed");
        Ok(output)
    }

    /// Compose an encoded image in memory.
    pub fn render(&self, bytes: &[u8]) -> Result<RgbaImage, ProcessError> {
        let record = metadata::decode(bytes)?;
        let photo = self
            .backend
            .decode(bytes)
            .map_err(ProcessError::ImageUnreadable)?;
        Ok(self.compose(&photo, &record))
    }

    /// Draw the framed canvas for already-decoded pixels and metadata.
    pub fn compose(&self, photo: &RgbaImage, record: &MetadataRecord) -> RgbaImage {
        let config = self.config;
        let geom = layout::canvas_geometry(
            Size::new(photo.width(), photo.height()),
            config.border_ratio,
            config.add_frame,
        );

        let mut canvas = RgbaImage::from_pixel(geom.canvas.width, geom.canvas.height, CANVAS_WHITE);
        imageops::replace(&mut canvas, photo, geom.source_x as i64, geom.source_y as i64);

        let left = TextBlock::for_side(&config.text, true, record, config.auto_align, geom.border);
        let right = TextBlock::for_side(&config.text, false, record, config.auto_align, geom.border);
        let left_measured = left.measure(self.backend);
        let right_measured = right.measure(self.backend);

        let logo = self.load_logo(record);
        let placed = layout::place_watermark(
            &geom,
            left_measured.size,
            right_measured.size,
            right.has_text(),
            logo.as_ref().map(|l| Size::new(l.width(), l.height())),
        );

        self.draw_block(&mut canvas, &left_measured, placed.left_block);
        self.draw_block(&mut canvas, &right_measured, placed.right_block);

        if let (Some(logo), Some(rect)) = (&logo, placed.logo) {
            let scaled = imageops::resize(logo, rect.width, rect.height, FilterType::Lanczos3);
            imageops::overlay(&mut canvas, &scaled, rect.x as i64, rect.y as i64);
        }
        if let Some(rect) = placed.divider {
            draw_divider(&mut canvas, rect);
        }
        canvas
    }

    fn load_logo(&self, record: &MetadataRecord) -> Option<RgbaImage> {
        let path = self.logos.resolve(&self.config.logo, &record.make)?;
        match self.backend.load_logo(path) {
            Ok(logo) => Some(logo),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "logo could not be loaded");
                None
            }
        }
    }

    fn draw_block(&self, canvas: &mut RgbaImage, block: &MeasuredBlock, at: Rect) {
        for line in &block.lines {
            self.backend.draw_text(
                canvas,
                &line.text,
                &line.style,
                at.x + line.dx as i32,
                at.y + line.dy as i32,
            );
        }
    }
}

fn draw_divider(canvas: &mut RgbaImage, rect: Rect) {
    if rect.width == 0 || rect.height == 0 {
        return;
    }
    imageproc::drawing::draw_filled_rect_mut(
        canvas,
        imageproc::rect::Rect::at(rect.x, rect.y).of_size(rect.width, rect.height),
        DIVIDER,
    );
}
