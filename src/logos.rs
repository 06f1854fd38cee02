//! Camera logo lookup.
//!
//! Logos live as image files in a `logos/` asset directory. The file stem is
//! the lookup key (`Canon.png` → `Canon`, `Sony.svg.png` → `Sony.svg`), kept
//! with its original case.
//!
//! A key matches a candidate string (the camera make, or an explicit logo
//! name from the config) when the two agree case-insensitively over the
//! length of the shorter one. `"NIKON CORPORATION"` matches key `Nikon`, and
//! the candidate `"Leica"` matches key `Leica Camera`.
//!
//! Keys are tried longest first, ties broken alphabetically, so
//! `Fujifilm-X` beats `Fujifilm` and the result never depends on directory
//! listing order. An empty candidate matches nothing.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::AUTO_LOGO;

#[derive(Error, Debug)]
pub enum LogoError {
    #[error("Logo directory not found: {0}")]
    MissingDir(PathBuf),
    #[error("IO error reading {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoEntry {
    pub key: String,
    pub path: PathBuf,
}

/// Immutable map from logo key to absolute image path.
#[derive(Debug, Clone, Default)]
pub struct LogoResolver {
    entries: Vec<LogoEntry>,
}

impl LogoResolver {
    /// Register every regular, non-hidden file in `dir`.
    pub fn from_dir(dir: &Path) -> Result<Self, LogoError> {
        if !dir.is_dir() {
            return Err(LogoError::MissingDir(dir.to_path_buf()));
        }
        let io_err = |source| LogoError::Io {
            path: dir.to_path_buf(),
            source,
        };
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if !path.is_file() {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if key.is_empty() || key.starts_with('.') {
                continue;
            }
            let path = std::path::absolute(&path).unwrap_or(path.clone());
            entries.push(LogoEntry {
                key: key.to_string(),
                path,
            });
        }
        Ok(Self::from_entries(entries))
    }

    pub fn from_entries(entries: impl IntoIterator<Item = LogoEntry>) -> Self {
        let mut entries: Vec<LogoEntry> = entries.into_iter().collect();
        entries.sort_by(|a, b| {
            b.key
                .chars()
                .count()
                .cmp(&a.key.chars().count())
                .then_with(|| a.key.cmp(&b.key))
                .then_with(|| a.path.cmp(&b.path))
        });
        entries.dedup_by(|a, b| a.key == b.key);
        Self { entries }
    }

    /// Pick the logo for an image.
    ///
    /// An explicit `selector` (anything but empty or `"Auto"`) is matched
    /// instead of the camera `make`.
    pub fn resolve(&self, selector: &str, make: &str) -> Option<&Path> {
        let candidate = if selector.is_empty() || selector == AUTO_LOGO {
            make
        } else {
            selector
        };
        self.lookup(candidate)
    }

    /// First key that prefix-matches `candidate`.
    pub fn lookup(&self, candidate: &str) -> Option<&Path> {
        let candidate = candidate.trim();
        if candidate.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|e| prefix_matches(&e.key, candidate))
            .map(|e| e.path.as_path())
    }

    pub fn entries(&self) -> &[LogoEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Case-insensitive comparison over the shorter of the two strings.
/// Either side being empty is never a match.
pub fn prefix_matches(key: &str, candidate: &str) -> bool {
    if key.is_empty() || candidate.is_empty() {
        return false;
    }
    key.chars()
        .flat_map(char::to_lowercase)
        .zip(candidate.chars().flat_map(char::to_lowercase))
        .all(|(a, b)| a == b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn resolver(keys: &[&str]) -> LogoResolver {
        LogoResolver::from_entries(keys.iter().map(|k| LogoEntry {
            key: k.to_string(),
            path: PathBuf::from(format!("/logos/{k}.png")),
        }))
    }

    #[test]
    fn prefix_match_is_case_insensitive_over_shorter_length() {
        assert!(prefix_matches("Nikon", "NIKON CORPORATION"));
        assert!(prefix_matches("Leica Camera", "Leica"));
        assert!(prefix_matches("canon", "Canon"));
        assert!(!prefix_matches("Sony", "SIGMA"));
        assert!(!prefix_matches("", "Canon"));
        assert!(!prefix_matches("Canon", ""));
    }

    #[test]
    fn auto_selector_uses_make() {
        let logos = resolver(&["Canon", "Nikon"]);
        assert_eq!(
            logos.resolve("Auto", "NIKON CORPORATION"),
            Some(Path::new("/logos/Nikon.png"))
        );
    }

    #[test]
    fn explicit_selector_overrides_make() {
        let logos = resolver(&["Canon", "Leica"]);
        assert_eq!(
            logos.resolve("leica", "Canon"),
            Some(Path::new("/logos/Leica.png"))
        );
    }

    #[test]
    fn empty_selector_behaves_like_auto() {
        let logos = resolver(&["Canon"]);
        assert_eq!(logos.resolve("", "Canon"), Some(Path::new("/logos/Canon.png")));
    }

    #[test]
    fn empty_make_resolves_to_nothing() {
        let logos = resolver(&["Canon", "Nikon"]);
        assert_eq!(logos.resolve("Auto", ""), None);
        assert_eq!(logos.resolve("Auto", "   "), None);
    }

    #[test]
    fn unknown_make_resolves_to_nothing() {
        let logos = resolver(&["Canon", "Nikon"]);
        assert_eq!(logos.resolve("Auto", "Pentax"), None);
    }

    #[test]
    fn longer_keys_win_over_shorter_prefixes() {
        let logos = resolver(&["Fuji", "Fujifilm"]);
        assert_eq!(
            logos.resolve("Auto", "FUJIFILM"),
            Some(Path::new("/logos/Fujifilm.png"))
        );
    }

    #[test]
    fn duplicate_keys_keep_smallest_path() {
        let entry = |file: &str| LogoEntry {
            key: "Canon".into(),
            path: PathBuf::from(format!("/logos/{file}")),
        };
        let forward = LogoResolver::from_entries([entry("Canon.png"), entry("Canon.webp")]);
        let backward = LogoResolver::from_entries([entry("Canon.webp"), entry("Canon.png")]);
        assert_eq!(forward.len(), 1);
        assert_eq!(forward.entries(), backward.entries());
        assert_eq!(forward.lookup("Canon"), Some(Path::new("/logos/Canon.png")));
    }

    #[test]
    fn from_dir_registers_files_by_stem() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("Canon.png"), b"png").unwrap();
        fs::write(tmp.path().join("SONY.png"), b"png").unwrap();
        fs::write(tmp.path().join(".DS_Store"), b"junk").unwrap();
        fs::create_dir(tmp.path().join("Nikon")).unwrap();

        let logos = LogoResolver::from_dir(tmp.path()).unwrap();
        let keys: Vec<&str> = logos.entries().iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["Canon", "SONY"]);
        assert!(logos.entries().iter().all(|e| e.path.is_absolute()));
        assert!(logos.resolve("Auto", "Sony").is_some());
    }

    #[test]
    fn from_dir_missing_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = LogoResolver::from_dir(&tmp.path().join("nope"));
        assert!(matches!(result, Err(LogoError::MissingDir(_))));
    }
}
