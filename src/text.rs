//! Text slot rendering and block measurement.
//!
//! Each side of the band is a [`TextBlock`] of two rows: the top row from the
//! `*_top` slot and the bottom row from the `*_bottom` slot. A slot renders
//! to a string from the image's [`MetadataRecord`]; rich-text slots are
//! flattened to plain lines first.
//!
//! Empty slots behave differently depending on `auto_align`:
//!
//! - `false`: the slot renders a single non-breaking space, so the row keeps
//!   its height and the other row stays where it would be with text.
//! - `true`: the slot renders nothing and its row collapses, letting the
//!   remaining row center itself in the band.

use crate::config::{Corner, TextKind, TextSetting, TextSettings};
use crate::imaging::{ImageBackend, TextStyle};
use crate::layout::Size;
use crate::metadata::MetadataRecord;

/// Stand-in for an empty slot when rows keep their height.
pub const PLACEHOLDER: &str = "\u{00A0}";

/// Content source of one slot, with its literal payload where it has one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextSlot {
    None,
    CameraModel,
    LensModel,
    ExposureSummary,
    CaptureTime,
    GpsCoordinates,
    CustomString(String),
    RichText(String),
}

impl From<&TextSetting> for TextSlot {
    fn from(setting: &TextSetting) -> Self {
        match setting.kind {
            TextKind::None => TextSlot::None,
            TextKind::CameraModel => TextSlot::CameraModel,
            TextKind::LensModel => TextSlot::LensModel,
            TextKind::ExposureSummary => TextSlot::ExposureSummary,
            TextKind::CaptureTime => TextSlot::CaptureTime,
            TextKind::GpsCoordinates => TextSlot::GpsCoordinates,
            TextKind::CustomString => TextSlot::CustomString(setting.text.clone()),
            TextKind::RichText => TextSlot::RichText(setting.text.clone()),
        }
    }
}

impl TextSlot {
    /// Raw content for this slot. Rich text comes back as markup.
    pub fn render(&self, record: &MetadataRecord) -> String {
        match self {
            TextSlot::None => String::new(),
            TextSlot::CameraModel => record.model.clone(),
            TextSlot::LensModel => record.lens_model.clone(),
            TextSlot::ExposureSummary => record.exposure_summary(),
            TextSlot::CaptureTime => record.capture_time.clone(),
            TextSlot::GpsCoordinates => record.gps_summary(),
            TextSlot::CustomString(text) | TextSlot::RichText(text) => text.clone(),
        }
    }

    /// Display lines for this slot; empty when there is nothing to show.
    pub fn lines(&self, record: &MetadataRecord) -> Vec<String> {
        let content = self.render(record);
        match self {
            TextSlot::RichText(_) => flatten_markup(&content),
            _ if content.trim().is_empty() => Vec::new(),
            _ => content.lines().map(|l| l.trim_end().to_string()).collect(),
        }
    }
}

/// Lines drawn for a slot. An empty slot yields the placeholder, or nothing
/// under auto-align.
pub fn resolve_slot(slot: &TextSlot, record: &MetadataRecord, auto_align: bool) -> Vec<String> {
    let lines = slot.lines(record);
    if lines.is_empty() && !auto_align {
        return vec![PLACEHOLDER.to_string()];
    }
    lines
}

/// Flatten rich-text markup to plain display lines.
///
/// `<br>`, closing `</p>`/`</div>` and newlines break lines; every other tag
/// is dropped. Common entities are decoded. Leading and trailing blank lines
/// are removed.
pub fn flatten_markup(markup: &str) -> Vec<String> {
    let mut text = String::with_capacity(markup.len());
    let mut chars = markup.chars();
    while let Some(c) = chars.next() {
        match c {
            '<' => {
                let tag: String = chars.by_ref().take_while(|&c| c != '>').collect();
                let tag = tag.trim().to_ascii_lowercase();
                let name = tag
                    .split(|c: char| c.is_whitespace() || c == '/')
                    .find(|s| !s.is_empty())
                    .unwrap_or("");
                let closing = tag.starts_with('/');
                if name == "br" || (closing && matches!(name, "p" | "div")) {
                    text.push('\n');
                }
            }
            '\r' => {}
            _ => text.push(c),
        }
    }

    let mut lines: Vec<String> = text
        .split('\n')
        .map(|l| decode_entities(l).trim().to_string())
        .collect();
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    let leading = lines.iter().take_while(|l| l.is_empty()).count();
    lines.drain(..leading);
    lines
}

fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp..];
        let decoded = after.find(';').filter(|&end| end <= 10).and_then(|end| {
            let entity = &after[1..end];
            let c = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{00A0}'),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            c.map(|c| (c, end + 1))
        });
        match decoded {
            Some((c, consumed)) => {
                out.push(c);
                rest = &after[consumed..];
            }
            None => {
                out.push('&');
                rest = &after[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

// =============================================================================
// Blocks
// =============================================================================

/// One row of a block: the lines of a single slot in a single style.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRow {
    pub lines: Vec<String>,
    pub style: TextStyle,
    /// False when the row only holds a placeholder (or nothing).
    pub has_text: bool,
}

impl TextRow {
    fn build(setting: &TextSetting, record: &MetadataRecord, auto_align: bool, style: TextStyle) -> Self {
        let lines = resolve_slot(&TextSlot::from(setting), record, auto_align);
        let has_text = lines.iter().any(|line| line != PLACEHOLDER);
        Self {
            lines,
            style,
            has_text,
        }
    }
}

/// A line positioned relative to its block's top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub style: TextStyle,
    pub dx: u32,
    pub dy: u32,
}

/// A block after measurement: its outer size and where each line goes.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredBlock {
    pub size: Size,
    pub lines: Vec<PlacedLine>,
}

/// The two rows drawn on one side of the band.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub top: TextRow,
    pub bottom: TextRow,
}

impl TextBlock {
    /// Build the block for the left (`left == true`) or right side.
    pub fn for_side(
        settings: &TextSettings,
        left: bool,
        record: &MetadataRecord,
        auto_align: bool,
        border: u32,
    ) -> Self {
        let (top, bottom) = if left {
            (Corner::LeftTop, Corner::LeftBottom)
        } else {
            (Corner::RightTop, Corner::RightBottom)
        };
        let top_setting = settings.get(top);
        let bottom_setting = settings.get(bottom);
        Self {
            top: TextRow::build(
                top_setting,
                record,
                auto_align,
                TextStyle::top_row(border, top_setting.weight),
            ),
            bottom: TextRow::build(
                bottom_setting,
                record,
                auto_align,
                TextStyle::bottom_row(border, bottom_setting.weight),
            ),
        }
    }

    pub fn has_text(&self) -> bool {
        self.top.has_text || self.bottom.has_text
    }

    /// Lay the rows out top to bottom. Rows are left-aligned within the
    /// block; the bottom row starts 0.2 × the top row's first line height
    /// below the top row when both rows occupy space.
    pub fn measure(&self, backend: &dyn ImageBackend) -> MeasuredBlock {
        let mut lines = Vec::new();
        let mut width = 0u32;

        let top_height = place_row(&self.top, 0, backend, &mut lines, &mut width);
        let gap = lines
            .first()
            .map(|first| {
                let height = backend.measure_text(&first.text, &first.style).height;
                (height as f64 * 0.2).round() as u32
            })
            .unwrap_or(0);
        let bottom_height = place_row(&self.bottom, top_height + gap, backend, &mut lines, &mut width);
        let gap = if bottom_height == 0 { 0 } else { gap };

        MeasuredBlock {
            size: Size::new(width, top_height + gap + bottom_height),
            lines,
        }
    }
}

/// Append a row's non-empty lines starting at `top`; returns the row height.
fn place_row(
    row: &TextRow,
    top: u32,
    backend: &dyn ImageBackend,
    out: &mut Vec<PlacedLine>,
    width: &mut u32,
) -> u32 {
    let mut height = 0u32;
    for line in &row.lines {
        if line.is_empty() {
            continue;
        }
        let extent = backend.measure_text(line, &row.style);
        *width = (*width).max(extent.width);
        out.push(PlacedLine {
            text: line.clone(),
            style: row.style,
            dx: 0,
            dy: top + height,
        });
        height += extent.height;
    }
    height
}
