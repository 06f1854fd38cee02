//! Font discovery and weight selection.
//!
//! A [`FontBook`] holds every face of one family, each tagged with a CSS
//! weight inferred from its file name (`MiSans-Demibold.ttf` → 600). Text
//! slots ask for a weight and get the nearest face.
//!
//! Faces come from the `font/` asset directory first. When that directory
//! has no face of the requested family, the system font directories are
//! searched instead. Family names are compared after dropping case, spaces
//! and punctuation, so `"MiSans Latin"` finds `MiSansLatin-Bold.ttf`.
//!
//! Only upright faces are used. A file whose family part (the stem before
//! the first `-`) equals the requested family beats a longer family that
//! merely starts with it, so `Roboto` does not pick up `RobotoMono-*`.

use ab_glyph::FontVec;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::FontWeight;

const FONT_EXTENSIONS: &[&str] = &["ttf", "otf"];

#[cfg(target_os = "macos")]
const SYSTEM_FONT_DIRS: &[&str] = &["/System/Library/Fonts", "/Library/Fonts"];
#[cfg(target_os = "windows")]
const SYSTEM_FONT_DIRS: &[&str] = &["C:\\Windows\\Fonts"];
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const SYSTEM_FONT_DIRS: &[&str] = &["/usr/share/fonts", "/usr/local/share/fonts"];

/// A loaded font face.
pub struct FontFace {
    pub path: PathBuf,
    pub weight: FontWeight,
    pub font: FontVec,
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace")
            .field("path", &self.path)
            .field("weight", &self.weight)
            .finish_non_exhaustive()
    }
}

/// The faces of one font family, keyed by weight.
#[derive(Debug, Default)]
pub struct FontBook {
    faces: Vec<FontFace>,
}

impl FontBook {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load `family` from `font_dir`, falling back to the system font
    /// directories. Unreadable files are skipped with a warning.
    pub fn load(font_dir: &Path, family: &str) -> Self {
        let local = upright(font_files(font_dir, 1));
        let mut candidates = matching_family(&local, family);
        if candidates.is_empty() && !local.is_empty() {
            tracing::warn!(
                family,
                dir = %font_dir.display(),
                "font family not found in asset directory, using all faces there"
            );
            candidates = local;
        }
        if candidates.is_empty() {
            let system: Vec<PathBuf> = SYSTEM_FONT_DIRS
                .iter()
                .flat_map(|dir| font_files(Path::new(dir), usize::MAX))
                .collect();
            candidates = matching_family(&upright(system), family);
        }

        let mut book = Self::empty();
        for path in candidates {
            match std::fs::read(&path).map(FontVec::try_from_vec) {
                Ok(Ok(font)) => book.push(FontFace {
                    weight: weight_from_file_name(&path),
                    path,
                    font,
                }),
                Ok(Err(e)) => tracing::warn!(path = %path.display(), error = %e, "invalid font file"),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "cannot read font file"),
            }
        }
        if book.is_empty() {
            tracing::warn!(family, "no usable font faces found, text will not be drawn");
        } else {
            tracing::debug!(family, faces = book.faces.len(), "font family loaded");
        }
        book
    }

    pub fn push(&mut self, face: FontFace) {
        self.faces.push(face);
        self.faces.sort_by(|a, b| a.weight.cmp(&b.weight).then_with(|| a.path.cmp(&b.path)));
    }

    /// Face whose weight is closest to `weight`; lighter wins ties.
    pub fn face(&self, weight: FontWeight) -> Option<&FontFace> {
        nearest_weight(self.faces.iter().map(|f| (f.path.as_path(), f.weight)), weight)
            .map(|i| &self.faces[i])
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}

/// Index of the entry closest to `wanted`. Ties go to the lighter weight,
/// then to the smaller path.
fn nearest_weight<'a>(
    faces: impl IntoIterator<Item = (&'a Path, FontWeight)>,
    wanted: FontWeight,
) -> Option<usize> {
    faces
        .into_iter()
        .enumerate()
        .min_by(|(_, (pa, wa)), (_, (pb, wb))| {
            wa.value()
                .abs_diff(wanted.value())
                .cmp(&wb.value().abs_diff(wanted.value()))
                .then_with(|| wa.cmp(wb))
                .then_with(|| pa.cmp(pb))
        })
        .map(|(i, _)| i)
}

fn font_files(dir: &Path, max_depth: usize) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(max_depth)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| FONT_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        })
        .collect();
    files.sort();
    files
}

/// Drop italic and oblique faces.
fn upright(files: Vec<PathBuf>) -> Vec<PathBuf> {
    files
        .into_iter()
        .filter(|p| {
            let stem = stem_of(p).map(normalize).unwrap_or_default();
            !stem.contains("italic") && !stem.contains("oblique")
        })
        .collect()
}

/// Files of `family`: exact family part first, prefix matches otherwise.
fn matching_family(files: &[PathBuf], family: &str) -> Vec<PathBuf> {
    let wanted = normalize(family);
    if wanted.is_empty() {
        return Vec::new();
    }
    let exact: Vec<PathBuf> = files
        .iter()
        .filter(|p| {
            stem_of(p).is_some_and(|s| normalize(s.split('-').next().unwrap_or("")) == wanted)
        })
        .cloned()
        .collect();
    if !exact.is_empty() {
        return exact;
    }
    files
        .iter()
        .filter(|p| stem_of(p).is_some_and(|s| normalize(s).starts_with(&wanted)))
        .cloned()
        .collect()
}

fn stem_of(path: &Path) -> Option<&str> {
    path.file_stem().and_then(|s| s.to_str())
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Infer a CSS weight from a font file name. Regular faces and names with
/// no recognizable weight are 400.
pub fn weight_from_file_name(path: &Path) -> FontWeight {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .map(normalize)
        .unwrap_or_default();
    // Compound names first so "semibold" is not read as "bold".
    const TABLE: &[(&str, u16)] = &[
        ("hairline", 100),
        ("thin", 100),
        ("extralight", 200),
        ("ultralight", 200),
        ("semilight", 350),
        ("demilight", 350),
        ("light", 300),
        ("medium", 500),
        ("semibold", 600),
        ("demibold", 600),
        ("extrabold", 800),
        ("ultrabold", 800),
        ("bold", 700),
        ("black", 900),
        ("heavy", 900),
    ];
    TABLE
        .iter()
        .find(|(name, _)| stem.contains(name))
        .map(|&(_, w)| FontWeight(w))
        .unwrap_or(FontWeight::NORMAL)
}
