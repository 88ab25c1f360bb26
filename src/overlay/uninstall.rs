//! Overlay uninstaller.
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

use super::bundle::{BundleLocator, SourceBundle};
use super::manifest::{self, ALLOWED_INSTALL_NAMES, CONFIG_FILE, PLUGIN_DIR};
use super::{Outcome, step};
use crate::error::OverlayError;
use crate::logging::Log;
use crate::resources::backup;
use crate::resources::helpers::fs;

/// What an uninstall run changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UninstallReport {
    /// Originals put back from their backups.
    pub restored: Vec<PathBuf>,
    /// Overlay files deleted.
    pub removed: Vec<PathBuf>,
    /// Whether the plugin directory was restored from its backup.
    pub plugins_restored: bool,
    /// Leftover backups deleted by the final sweep.
    pub orphans_removed: Vec<PathBuf>,
}

/// Removes the overlay from a target directory and restores originals.
///
/// Works purely from what is on disk: backups are found by name, so it
/// recovers from partial installs and from installs made under any allowed
/// name.
pub struct OverlayUninstaller<'a> {
    bundle: Option<&'a dyn BundleLocator>,
    log: &'a dyn Log,
}

impl std::fmt::Debug for OverlayUninstaller<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayUninstaller")
            .field("has_bundle", &self.bundle.is_some())
            .finish_non_exhaustive()
    }
}

impl<'a> OverlayUninstaller<'a> {
    /// Create an uninstaller.
    ///
    /// With a bundle locator, a primary module that has no backup is removed
    /// when it is byte-identical to the bundle's; without one such files are
    /// left in place.
    #[must_use]
    pub const fn new(bundle: Option<&'a dyn BundleLocator>, log: &'a dyn Log) -> Self {
        Self { bundle, log }
    }

    /// Uninstall and report success as a boolean; errors are logged.
    pub fn uninstall(&self, target_dir: &Path) -> bool {
        match self.try_uninstall(target_dir) {
            Ok(_) => true,
            Err(e) => {
                self.log.error(&format!("uninstall failed: {e:#}"));
                false
            }
        }
    }

    /// Remove the overlay from `target_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError::TargetMissing`] if `target_dir` is not a
    /// directory, or the first I/O failure.  Absent optional files are not
    /// errors.
    pub fn try_uninstall(&self, target_dir: &Path) -> Result<UninstallReport> {
        if !target_dir.is_dir() {
            return Err(OverlayError::TargetMissing(target_dir.to_path_buf()).into());
        }
        let log = self.log;
        log.stage(&format!(
            "Removing OptiScaler from {}",
            target_dir.display()
        ));
        let mut report = UninstallReport::default();

        step(log, "Restore originals", || {
            for bak in backup::find_backups(target_dir)? {
                let Some(original) = backup::original_path(&bak) else {
                    continue;
                };
                if !is_primary_name(&original) {
                    continue;
                }
                if backup::restore(&original)? {
                    log.info(&format!("restored {}", display_name(&original)));
                    report.restored.push(original);
                }
            }
            Ok(if report.restored.is_empty() {
                Outcome::Skipped("no backups".to_string())
            } else {
                Outcome::Done
            })
        })?;

        let bundle = self.locate_bundle();
        step(log, "Remove installed primary module", || {
            let Some(bundle) = &bundle else {
                return Ok(Outcome::Skipped("bundle unavailable".to_string()));
            };
            let before = report.removed.len();
            for name in ALLOWED_INSTALL_NAMES {
                let path = target_dir.join(name);
                if report.restored.contains(&path) || !path.is_file() {
                    continue;
                }
                if fs::same_contents(&path, &bundle.primary())? {
                    fs::remove_existing(&path)?;
                    report.removed.push(path);
                } else {
                    log.warn(&format!(
                        "{name} has no backup and differs from the bundle; leaving it in place, remove it by hand if it is the overlay"
                    ));
                }
            }
            Ok(if report.removed.len() > before {
                Outcome::Done
            } else {
                Outcome::Skipped("none without a backup".to_string())
            })
        })?;

        step(log, "Remove overlay files", || {
            let before = report.removed.len();
            for name in std::iter::once(CONFIG_FILE).chain(manifest::auxiliary_files()) {
                let path = target_dir.join(name);
                if fs::remove_existing(&path)? {
                    report.removed.push(path);
                }
            }
            Ok(if report.removed.len() > before {
                Outcome::Done
            } else {
                Outcome::Skipped("none present".to_string())
            })
        })?;

        let plugins = target_dir.join(PLUGIN_DIR);
        step(log, "Restore plugins", || {
            if backup::restore_dir(&plugins)? {
                report.plugins_restored = true;
                Ok(Outcome::Done)
            } else if fs::remove_dir_if_exists(&plugins)? {
                report.removed.push(plugins.clone());
                Ok(Outcome::Done)
            } else {
                Ok(Outcome::Skipped("no plugin directory".to_string()))
            }
        })?;

        step(log, "Remove leftover backups", || {
            for bak in backup::find_backups(target_dir)? {
                fs::remove_existing(&bak)?;
                log.info(&format!("removed orphaned backup {}", display_name(&bak)));
                report.orphans_removed.push(bak);
            }
            warn_about_directory_backups(target_dir, log)?;
            Ok(if report.orphans_removed.is_empty() {
                Outcome::Skipped("none found".to_string())
            } else {
                Outcome::Done
            })
        })?;

        Ok(report)
    }

    /// The bundle, when one can be found; used only for comparison.
    fn locate_bundle(&self) -> Option<SourceBundle> {
        match self.bundle?.locate() {
            Ok(bundle) => Some(bundle),
            Err(e) => {
                self.log
                    .debug(&format!("bundle not available for comparison: {e:#}"));
                None
            }
        }
    }
}

fn is_primary_name(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(manifest::is_allowed)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

/// Directory backups other than the plugin directory are never created by
/// the installer; report them instead of deleting unknown trees.
fn warn_about_directory_backups(target_dir: &Path, log: &dyn Log) -> Result<()> {
    for entry in std::fs::read_dir(target_dir)
        .with_context(|| format!("reading directory {}", target_dir.display()))?
    {
        let path = entry
            .with_context(|| format!("reading entry in {}", target_dir.display()))?
            .path();
        if path.is_dir() && backup::original_path(&path).is_some() {
            log.warn(&format!(
                "leaving directory backup {} in place",
                display_name(&path)
            ));
        }
    }
    Ok(())
}
