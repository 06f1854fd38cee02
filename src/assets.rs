//! Asset directory resolution.
//!
//! Logos and fonts ship next to the executable:
//!
//! ```text
//! frame-mark            # binary
//! logos/                # one image per camera brand, named by make prefix
//! font/                 # .ttf/.otf faces of the configured family
//! ```
//!
//! `--assets DIR` points at another root with the same layout.

use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPaths {
    pub logos: PathBuf,
    pub fonts: PathBuf,
}

impl AssetPaths {
    /// `logos/` and `font/` under `root`.
    pub fn under(root: &Path) -> Self {
        Self {
            logos: root.join("logos"),
            fonts: root.join("font"),
        }
    }

    /// Asset directories beside the running executable.
    pub fn beside_executable() -> io::Result<Self> {
        let exe = std::env::current_exe()?;
        let root = exe
            .parent()
            .ok_or_else(|| io::Error::other("executable has no parent directory"))?;
        Ok(Self::under(root))
    }

    /// `root` when given, otherwise the executable's directory.
    pub fn resolve(root: Option<&Path>) -> io::Result<Self> {
        match root {
            Some(root) => Ok(Self::under(root)),
            None => Self::beside_executable(),
        }
    }
}
