//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Run
//!
//! ```text
//! ==> 12 images: photos/ → framed/
//! [01/12]
//! [02/12]
//! [03/12] (1 failed)
//! ...
//! Done: 11 framed, 1 failed → framed/
//! ```
//!
//! ## Inspect
//!
//! ```text
//! IMG_0042.jpg
//!     Make: Canon
//!     Model: Canon EOS R5
//!     Lens: RF24-70mm F2.8 L IS USM
//!     Exposure: 35mm ISO200 1/250 f/2.8
//!     Captured: 2024:03:09 10:11:12
//!     GPS: 31°14'5"N 121°28'12"E
//!     Logo: /opt/frame-mark/logos/Canon.png
//!     Slots:
//!         left_top: Canon EOS R5
//!         right_top: 35mm ISO200 1/250 f/2.8
//!         left_bottom: RF24-70mm F2.8 L IS USM
//!         right_bottom: 2024:03:09 10:11:12
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::batch::{BatchResult, ProgressEvent};
use crate::config::{Corner, TextSettings};
use crate::logos::LogoResolver;
use crate::metadata::MetadataRecord;
use crate::text::TextSlot;
use std::path::Path;

/// Zero-pad `pos` to the width of `total`.
fn format_index(pos: usize, total: usize) -> String {
    let width = total.to_string().len().max(2);
    format!("{:0>width$}", pos)
}

/// `value`, or `-` when it is empty.
fn or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}

// ============================================================================
// Run
// ============================================================================

pub fn format_run_header(count: usize, input: &Path, output: &Path) -> Vec<String> {
    let noun = if count == 1 { "image" } else { "images" };
    vec![format!(
        "==> {} {}: {} → {}",
        count,
        noun,
        input.display(),
        output.display()
    )]
}

/// Format a progress event. The terminal event prints nothing here; the
/// summary line covers it.
pub fn format_progress_event(event: &ProgressEvent) -> Vec<String> {
    if event.done {
        return Vec::new();
    }
    let mut line = format!(
        "[{}/{}]",
        format_index(event.current, event.total),
        format_index(event.total, event.total)
    );
    if event.failed > 0 {
        line.push_str(&format!(" ({} failed)", event.failed));
    }
    vec![line]
}

pub fn format_summary(result: &BatchResult, output: &Path) -> Vec<String> {
    vec![format!(
        "Done: {} framed, {} failed → {}",
        result.succeeded(),
        result.failed,
        output.display()
    )]
}

pub fn print_progress_event(event: &ProgressEvent) {
    for line in format_progress_event(event) {
        println!("{}", line);
    }
}

pub fn print_summary(result: &BatchResult, output: &Path) {
    for line in format_summary(result, output) {
        println!("{}", line);
    }
}

// ============================================================================
// Inspect
// ============================================================================

/// Metadata of one image plus the logo it would get.
pub fn format_inspect(file_name: &str, record: &MetadataRecord, logo: Option<&Path>) -> Vec<String> {
    vec![
        file_name.to_string(),
        format!("    Make: {}", or_dash(&record.make)),
        format!("    Model: {}", or_dash(&record.model)),
        format!("    Lens: {}", or_dash(&record.lens_model)),
        format!("    Exposure: {}", or_dash(&record.exposure_summary())),
        format!("    Captured: {}", or_dash(&record.capture_time)),
        format!("    GPS: {}", or_dash(&record.gps_summary())),
        format!(
            "    Logo: {}",
            logo.map(|p| p.display().to_string())
                .unwrap_or_else(|| "-".to_string())
        ),
    ]
}

/// What each text slot would show for `record`.
pub fn format_slots(settings: &TextSettings, record: &MetadataRecord) -> Vec<String> {
    let mut lines = vec!["    Slots:".to_string()];
    for corner in Corner::ALL {
        let lines_for_slot = TextSlot::from(settings.get(corner)).lines(record);
        let shown = if lines_for_slot.is_empty() {
            "-".to_string()
        } else {
            lines_for_slot.join(" / ")
        };
        lines.push(format!("        {}: {}", corner.key(), shown));
    }
    lines
}

pub fn print_inspect(
    file_name: &str,
    record: &MetadataRecord,
    logo: Option<&Path>,
    settings: &TextSettings,
) {
    let lines = format_inspect(file_name, record, logo)
        .into_iter()
        .chain(format_slots(settings, record));
    for line in lines {
        println!("{}", line);
    }
}

// ============================================================================
// Logos
// ============================================================================

/// Logo keys in match order.
pub fn format_logos(logos: &LogoResolver, dir: &Path) -> Vec<String> {
    let mut lines = vec![format!("Logos ({}) in {}", logos.len(), dir.display())];
    for (i, entry) in logos.entries().iter().enumerate() {
        let file = entry
            .path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        lines.push(format!(
            "{} {} ({})",
            format_index(i + 1, logos.len()),
            entry.key,
            file
        ));
    }
    lines
}

pub fn print_logos(logos: &LogoResolver, dir: &Path) {
    for line in format_logos(logos, dir) {
        println!("{}", line);
    }
}
