//! Locating and validating the read-only source bundle.
use anyhow::Result;
use std::path::{Path, PathBuf};

use super::manifest::{CONFIG_FILE, EntryKind, MANIFEST, PLUGIN_DIR, PRIMARY_MODULE};
use crate::error::OverlayError;

/// A validated source bundle directory.
///
/// Construction checks that every required manifest entry is present, so the
/// accessors never point at missing required files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBundle {
    root: PathBuf,
}

impl SourceBundle {
    /// Open the bundle rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError::BundleUnavailable`] if `root` is not a
    /// directory and [`OverlayError::BundleFileMissing`] for the first
    /// required manifest entry that is absent.
    pub fn open(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(OverlayError::BundleUnavailable(format!(
                "{} is not a directory",
                root.display()
            ))
            .into());
        }
        let root = dunce::canonicalize(root)?;
        for entry in MANIFEST.iter().filter(|e| e.required) {
            let path = root.join(entry.path);
            let present = match entry.kind {
                EntryKind::PluginDirectory => path.is_dir(),
                _ => path.is_file(),
            };
            if !present {
                return Err(OverlayError::BundleFileMissing(path).into());
            }
        }
        Ok(Self { root })
    }

    /// Bundle root directory (canonicalized).
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The primary module.
    #[must_use]
    pub fn primary(&self) -> PathBuf {
        self.root.join(PRIMARY_MODULE)
    }

    /// The canonical config file.
    #[must_use]
    pub fn config(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    /// The plugin directory.
    #[must_use]
    pub fn plugin_dir(&self) -> PathBuf {
        self.root.join(PLUGIN_DIR)
    }

    /// An optional file shipped in the bundle, or `None` when absent.
    #[must_use]
    pub fn optional_file(&self, name: &str) -> Option<PathBuf> {
        let path = self.root.join(name);
        path.is_file().then_some(path)
    }
}

/// Finds the source bundle for an install or uninstall run.
pub trait BundleLocator {
    /// Locate and validate the bundle.
    ///
    /// # Errors
    ///
    /// Returns an error when no usable bundle can be found.
    fn locate(&self) -> Result<SourceBundle>;
}

/// Uses one fixed directory.
#[derive(Debug, Clone)]
pub struct StaticLocator(pub PathBuf);

impl BundleLocator for StaticLocator {
    fn locate(&self) -> Result<SourceBundle> {
        SourceBundle::open(&self.0)
    }
}

/// Tries candidate directories in order and takes the first valid bundle.
#[derive(Debug, Clone, Default)]
pub struct SearchLocator {
    candidates: Vec<PathBuf>,
}

impl SearchLocator {
    /// Search `candidates` in order.
    #[must_use]
    pub const fn new(candidates: Vec<PathBuf>) -> Self {
        Self { candidates }
    }
}

impl BundleLocator for SearchLocator {
    fn locate(&self) -> Result<SourceBundle> {
        self.candidates
            .iter()
            .find_map(|dir| SourceBundle::open(dir).ok())
            .ok_or_else(|| {
                let tried = self
                    .candidates
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                OverlayError::BundleUnavailable(format!("no bundle found (searched: {tried})"))
                    .into()
            })
    }
}
