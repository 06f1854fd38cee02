//! Run configuration.
//!
//! A [`RunConfig`] describes one batch: where images come from, where the
//! composited copies go, and how the watermark band is laid out and filled.
//! It is immutable once a run starts; the batch worker only ever reads it.
//!
//! ## Config File
//!
//! The CLI accepts an optional TOML file. Every key is optional and layered
//! on top of the stock defaults, so a file only needs the values it changes:
//!
//! ```toml
//! border_ratio = 0.03
//!
//! [text.right_bottom]
//! kind = "gps_coordinates"
//! ```
//!
//! Partially specified corners keep the defaults of the keys they omit
//! (`[text.left_top] kind = "lens_model"` keeps the DemiBold weight).
//! Unknown keys are rejected to catch typos early.
//!
//! ## Text Slots
//!
//! The band has four text slots keyed by [`Corner`]. Each slot picks a
//! [`TextKind`], a [`FontWeight`], and an optional literal `text` used by the
//! `custom_string` and `rich_text` kinds.

use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Input path and output path must both be set")]
    EmptyPath,
    #[error("Input directory does not exist: {0}")]
    InputMissing(PathBuf),
    #[error("Cannot create output directory {path}: {source}")]
    OutputUncreatable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("No .jpg/.jpeg files found in {0}")]
    NoImages(PathBuf),
}

/// Logo selector value that resolves the logo from the camera make.
pub const AUTO_LOGO: &str = "Auto";

/// Configuration for one batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Directory scanned (non-recursively) for `.jpg`/`.jpeg` files.
    pub input_dir: PathBuf,
    /// Directory receiving one output file per processed input.
    pub output_dir: PathBuf,
    /// Font family used for every text slot.
    pub font: String,
    /// Border size as a fraction of the longer image edge, in (0, 1).
    pub border_ratio: f64,
    /// Surround the photo with a uniform border in addition to the band.
    pub add_frame: bool,
    /// Collapse empty text rows instead of reserving a placeholder line.
    pub auto_align: bool,
    /// `"Auto"` to match the camera make, or an explicit logo name.
    pub logo: String,
    /// JPEG encoding quality (1-100).
    pub quality: u32,
    /// The four text slots.
    pub text: TextSettings,
    /// Worker pool settings.
    pub processing: ProcessingConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::new(),
            output_dir: PathBuf::new(),
            font: "MiSans Latin".to_string(),
            border_ratio: 0.02,
            add_frame: true,
            auto_align: false,
            logo: AUTO_LOGO.to_string(),
            quality: 100,
            text: TextSettings::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl RunConfig {
    /// Validate numeric settings. Path checks happen when a run is initialized.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.border_ratio.is_finite() || self.border_ratio <= 0.0 || self.border_ratio >= 1.0 {
            return Err(ConfigError::Validation(format!(
                "border_ratio must be between 0 and 1 (exclusive), got {}",
                self.border_ratio
            )));
        }
        if self.quality == 0 || self.quality > 100 {
            return Err(ConfigError::Validation("quality must be 1-100".into()));
        }
        for corner in Corner::ALL {
            let weight = self.text.get(corner).weight.value();
            if weight == 0 || weight > 1000 {
                return Err(ConfigError::Validation(format!(
                    "text.{}.weight must be 1-1000, got {}",
                    corner.key(),
                    weight
                )));
            }
        }
        Ok(())
    }
}

/// Position of a text slot inside the watermark band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    LeftTop,
    RightTop,
    LeftBottom,
    RightBottom,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::LeftTop,
        Corner::RightTop,
        Corner::LeftBottom,
        Corner::RightBottom,
    ];

    /// Key used for this corner in the config file.
    pub fn key(self) -> &'static str {
        match self {
            Corner::LeftTop => "left_top",
            Corner::RightTop => "right_top",
            Corner::LeftBottom => "left_bottom",
            Corner::RightBottom => "right_bottom",
        }
    }
}

/// The four text slots, one per [`Corner`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextSettings {
    pub left_top: TextSetting,
    pub right_top: TextSetting,
    pub left_bottom: TextSetting,
    pub right_bottom: TextSetting,
}

impl TextSettings {
    pub fn get(&self, corner: Corner) -> &TextSetting {
        match corner {
            Corner::LeftTop => &self.left_top,
            Corner::RightTop => &self.right_top,
            Corner::LeftBottom => &self.left_bottom,
            Corner::RightBottom => &self.right_bottom,
        }
    }
}

impl Default for TextSettings {
    fn default() -> Self {
        Self {
            left_top: TextSetting::new(TextKind::CameraModel, FontWeight::DEMI_BOLD),
            right_top: TextSetting::new(TextKind::ExposureSummary, FontWeight::DEMI_BOLD),
            left_bottom: TextSetting::new(TextKind::LensModel, FontWeight::LIGHT),
            right_bottom: TextSetting::new(TextKind::CaptureTime, FontWeight::LIGHT),
        }
    }
}

/// What a single text slot shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextSetting {
    pub kind: TextKind,
    pub weight: FontWeight,
    /// Literal content for `custom_string`; markup for `rich_text`.
    pub text: String,
}

impl TextSetting {
    pub fn new(kind: TextKind, weight: FontWeight) -> Self {
        Self {
            kind,
            weight,
            text: String::new(),
        }
    }

    pub fn custom(text: impl Into<String>, weight: FontWeight) -> Self {
        Self {
            kind: TextKind::CustomString,
            weight,
            text: text.into(),
        }
    }
}

impl Default for TextSetting {
    fn default() -> Self {
        Self::new(TextKind::None, FontWeight::NORMAL)
    }
}

/// Source of a text slot's content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextKind {
    #[default]
    None,
    CameraModel,
    LensModel,
    ExposureSummary,
    CaptureTime,
    GpsCoordinates,
    CustomString,
    RichText,
}

/// CSS-style font weight (100 = Thin ... 900 = Black).
///
/// Deserializes from either a number or one of the weight names
/// (`"Thin"`, `"ExtraLight"`, `"Light"`, `"Normal"`, `"Medium"`,
/// `"DemiBold"`, `"Bold"`, `"ExtraBold"`, `"Black"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct FontWeight(pub u16);

const WEIGHT_NAMES: [&str; 9] = [
    "Thin",
    "ExtraLight",
    "Light",
    "Normal",
    "Medium",
    "DemiBold",
    "Bold",
    "ExtraBold",
    "Black",
];

impl FontWeight {
    pub const THIN: FontWeight = FontWeight(100);
    pub const LIGHT: FontWeight = FontWeight(300);
    pub const NORMAL: FontWeight = FontWeight(400);
    pub const MEDIUM: FontWeight = FontWeight(500);
    pub const DEMI_BOLD: FontWeight = FontWeight(600);
    pub const BOLD: FontWeight = FontWeight(700);
    pub const BLACK: FontWeight = FontWeight(900);

    /// Parse a weight name or number. Unrecognized input maps to Normal (400).
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if let Some(pos) = WEIGHT_NAMES
            .iter()
            .position(|name| name.eq_ignore_ascii_case(input))
        {
            return FontWeight((pos as u16 + 1) * 100);
        }
        input.parse().map(FontWeight).unwrap_or(FontWeight::NORMAL)
    }

    pub fn value(self) -> u16 {
        self.0
    }
}

impl Default for FontWeight {
    fn default() -> Self {
        FontWeight::NORMAL
    }
}

impl<'de> Deserialize<'de> for FontWeight {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(u16),
            Name(String),
        }
        Ok(match Repr::deserialize(deserializer)? {
            Repr::Number(n) => FontWeight(n),
            Repr::Name(name) => FontWeight::parse(&name),
        })
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of files composited at once.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)`, never less than one
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading and merging
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(RunConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key-by-key; any other overlay value replaces the base value.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Parse TOML text over the stock defaults and validate the result.
pub fn parse_config(content: &str) -> Result<RunConfig, ConfigError> {
    let overlay: toml::Value = toml::from_str(content)?;
    let merged = merge_toml(stock_defaults_value()?, overlay);
    let config: RunConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load a config file, or the stock defaults when `path` is `None`.
pub fn load_config(path: Option<&Path>) -> Result<RunConfig, ConfigError> {
    match path {
        Some(path) => parse_config(&fs::read_to_string(path)?),
        None => Ok(RunConfig::default()),
    }
}

/// Returns a fully-commented stock config file.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# frame-mark configuration
# ========================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# Font family for all text. Faces are looked up in the `font` asset
# directory first, then in the system font directories.
font = "MiSans Latin"

# Border size as a fraction of the longer image edge. The watermark band
# below the photo is four borders tall.
border_ratio = 0.02

# Surround the photo with a uniform border as well.
add_frame = true

# Collapse empty text rows instead of keeping a blank line in their place.
auto_align = false

# "Auto" picks the logo whose name prefixes the camera make
# (case-insensitive). Any other value is used as the lookup key instead.
logo = "Auto"

# JPEG encoding quality (1-100).
quality = 100

# ---------------------------------------------------------------------------
# Text slots
# ---------------------------------------------------------------------------
# kind:   none | camera_model | lens_model | exposure_summary | capture_time
#         | gps_coordinates | custom_string | rich_text
# weight: 100-900 or Thin | ExtraLight | Light | Normal | Medium | DemiBold
#         | Bold | ExtraBold | Black
# text:   literal content for custom_string, markup for rich_text

[text.left_top]
kind = "camera_model"
weight = 600

[text.right_top]
kind = "exposure_summary"
weight = 600

[text.left_bottom]
kind = "lens_model"
weight = 300

[text.right_bottom]
kind = "capture_time"
weight = 300

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum number of images composited in parallel.
# Omit to auto-detect (= number of CPU cores); 1 processes strictly in order.
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_matches_front_end_defaults() {
        let config = RunConfig::default();
        assert_eq!(config.border_ratio, 0.02);
        assert!(config.add_frame);
        assert!(!config.auto_align);
        assert_eq!(config.logo, AUTO_LOGO);
        assert_eq!(config.quality, 100);
        assert_eq!(config.text.left_top.kind, TextKind::CameraModel);
        assert_eq!(config.text.left_top.weight, FontWeight::DEMI_BOLD);
        assert_eq!(config.text.left_bottom.kind, TextKind::LensModel);
        assert_eq!(config.text.right_top.kind, TextKind::ExposureSummary);
        assert_eq!(config.text.right_bottom.kind, TextKind::CaptureTime);
        assert_eq!(config.text.right_bottom.weight, FontWeight::LIGHT);
    }

    #[test]
    fn default_config_is_valid() {
        RunConfig::default().validate().unwrap();
    }

    #[test]
    fn font_weight_names_map_to_hundreds() {
        assert_eq!(FontWeight::parse("Thin").value(), 100);
        assert_eq!(FontWeight::parse("DemiBold").value(), 600);
        assert_eq!(FontWeight::parse("black").value(), 900);
        assert_eq!(FontWeight::parse("350").value(), 350);
        assert_eq!(FontWeight::parse("Chunky").value(), 400);
    }

    #[test]
    fn parse_partial_config_keeps_defaults() {
        let config = parse_config("border_ratio = 0.05\n").unwrap();
        assert_eq!(config.border_ratio, 0.05);
        assert!(config.add_frame);
        assert_eq!(config.text.left_top.kind, TextKind::CameraModel);
    }

    #[test]
    fn partial_corner_keeps_corner_defaults() {
        let config = parse_config(
            r#"
[text.left_top]
kind = "lens_model"
"#,
        )
        .unwrap();
        assert_eq!(config.text.left_top.kind, TextKind::LensModel);
        assert_eq!(config.text.left_top.weight, FontWeight::DEMI_BOLD);
    }

    #[test]
    fn parse_custom_string_with_named_weight() {
        let config = parse_config(
            r#"
[text.right_bottom]
kind = "custom_string"
weight = "Bold"
text = "Shot on film"
"#,
        )
        .unwrap();
        let slot = &config.text.right_bottom;
        assert_eq!(slot.kind, TextKind::CustomString);
        assert_eq!(slot.weight, FontWeight::BOLD);
        assert_eq!(slot.text, "Shot on film");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = parse_config("border_size = 12\n");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn border_ratio_out_of_range_is_rejected() {
        for bad in ["border_ratio = 0.0", "border_ratio = 1.0", "border_ratio = -0.2"] {
            let result = parse_config(bad);
            assert!(
                matches!(result, Err(ConfigError::Validation(_))),
                "{bad} should fail validation"
            );
        }
    }

    #[test]
    fn quality_out_of_range_is_rejected() {
        assert!(matches!(
            parse_config("quality = 0"),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            parse_config("quality = 101"),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn stock_config_parses_to_defaults() {
        let config = parse_config(stock_config_toml()).unwrap();
        assert_eq!(config, RunConfig::default());
    }

    #[test]
    fn load_config_without_path_is_default() {
        assert_eq!(load_config(None).unwrap(), RunConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("frame-mark.toml");
        fs::write(&path, "add_frame = false\nlogo = \"Leica\"\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert!(!config.add_frame);
        assert_eq!(config.logo, "Leica");
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("frame-mark.toml");
        fs::write(&path, "this is not valid toml [[[").unwrap();

        assert!(matches!(
            load_config(Some(&path)),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn effective_threads_clamps_to_cores() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&ProcessingConfig::default()), cores);
        let one = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&one), 1);
        let huge = ProcessingConfig {
            max_processes: Some(100_000),
        };
        assert_eq!(effective_threads(&huge), cores);
        let zero = ProcessingConfig {
            max_processes: Some(0),
        };
        assert_eq!(effective_threads(&zero), 1);
    }
}
