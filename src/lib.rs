//! # frame-mark
//!
//! Batch-frames exported photographs: every JPEG in an input directory gets a
//! white information band with its camera model, lens, exposure, capture time
//! or GPS position, an optional camera-brand logo, and optionally a white
//! frame around the photo. Results land in an output directory under the
//! same file names.
//!
//! # Architecture: Init → Start → Clean
//!
//! A run is driven by a [`batch::BatchWorker`] with a small lifecycle:
//!
//! ```text
//! init(config, callback)   validate paths, scan *.jpg/*.jpeg, load logos
//! start()                  spawn the worker; progress flows to the callback
//! clean()                  join the finished worker, back to Idle
//! ```
//!
//! The worker composites each image independently ([`compose`]), so one bad
//! file is logged, counted and skipped without touching the rest.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | Run configuration: TOML loading over stock defaults, validation, text slot settings |
//! | [`metadata`] | EXIF decoding into a flat record; exposure and GPS formatting |
//! | [`logos`] | Logo table from the `logos/` asset directory; case-insensitive prefix matching |
//! | [`text`] | Slot rendering, rich-text flattening, two-row block measurement |
//! | [`layout`] | Pure canvas and band geometry |
//! | [`compose`] | Per-image pipeline: decode → layout → draw → encode |
//! | [`batch`] | Background worker, state machine, progress events |
//! | [`assets`] | Asset directory resolution (beside the executable or `--assets`) |
//! | [`imaging`] | Raster backend trait, pure-Rust backend, font discovery |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Pure-Rust Raster Stack
//!
//! Decoding and encoding use the `image` crate, glyph metrics come from
//! `ab_glyph`, and drawing from `imageproc`. There are no system libraries to
//! install; fonts are plain `.ttf`/`.otf` files looked up by family name.
//!
//! ## Geometry Separate From Pixels
//!
//! [`layout`] is a set of pure functions over sizes. The compositor asks the
//! backend only to measure and draw text, so every placement rule is tested
//! against a mock backend with predictable metrics.
//!
//! ## Errors Per Image, Not Per Run
//!
//! Setup problems (missing input, no images, bad config) fail `init` and
//! nothing starts. Once running, per-image failures become warnings and a
//! `failed` count; the terminal progress event is always delivered.

pub mod assets;
pub mod batch;
pub mod compose;
pub mod config;
pub mod imaging;
pub mod layout;
pub mod logos;
pub mod metadata;
pub mod output;
pub mod text;

#[cfg(test)]
pub(crate) mod test_helpers;
