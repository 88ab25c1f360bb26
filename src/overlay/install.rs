//! Overlay installer.
use anyhow::Result;
use std::path::{Path, PathBuf};

use super::bundle::BundleLocator;
use super::dll_override::{DllOverrideRegistrar, OverrideOrder};
use super::manifest::{self, CONFIG_FILE, InstallName, PLUGIN_DIR};
use super::{Outcome, step};
use crate::config::ini;
use crate::config::overrides::OverrideSet;
use crate::error::OverlayError;
use crate::logging::Log;
use crate::resources::backup;
use crate::resources::helpers::fs;

/// What an install run changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// Name the primary module was installed under.
    pub install_name: InstallName,
    /// Bundle the files were copied from.
    pub bundle: PathBuf,
    /// Whether an original primary module was backed up by this run.
    pub primary_backed_up: bool,
    /// Auxiliary files copied (those present in the bundle).
    pub auxiliary_copied: Vec<String>,
    /// Whether an original plugin directory was backed up by this run.
    pub plugins_backed_up: bool,
    /// Library base name an override was registered for, if any.
    pub override_registered: Option<String>,
}

/// Installs the overlay into a target directory.
///
/// A live primary module or plugin directory identical to the bundle's is
/// the overlay itself and is never backed up, so repeated installs keep the
/// true originals.
///
/// Preconditions (target exists, install name allowed, bundle located) are
/// checked before anything is written.  After that, a failing step aborts
/// the run without rolling back earlier steps; running install again or
/// running the uninstaller recovers.
pub struct OverlayInstaller<'a> {
    bundle: &'a dyn BundleLocator,
    registrar: &'a dyn DllOverrideRegistrar,
    log: &'a dyn Log,
}

impl std::fmt::Debug for OverlayInstaller<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayInstaller")
            .field("bundle", &"<dyn BundleLocator>")
            .field("registrar", &"<dyn DllOverrideRegistrar>")
            .finish_non_exhaustive()
    }
}

impl<'a> OverlayInstaller<'a> {
    /// Create an installer using the given collaborators.
    #[must_use]
    pub const fn new(
        bundle: &'a dyn BundleLocator,
        registrar: &'a dyn DllOverrideRegistrar,
        log: &'a dyn Log,
    ) -> Self {
        Self {
            bundle,
            registrar,
            log,
        }
    }

    /// Install and report success as a boolean; errors are logged.
    pub fn install(&self, target_dir: &Path, install_name: &str, overrides: &OverrideSet) -> bool {
        match self.try_install(target_dir, install_name, overrides) {
            Ok(_) => true,
            Err(e) => {
                self.log.error(&format!("install failed: {e:#}"));
                false
            }
        }
    }

    /// Install the overlay into `target_dir`, placing the primary module
    /// under `install_name` and patching the config with `overrides`.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError::TargetMissing`],
    /// [`OverlayError::InvalidInstallName`] or a bundle error before any
    /// write; afterwards, the first failing copy, patch or registration step.
    pub fn try_install(
        &self,
        target_dir: &Path,
        install_name: &str,
        overrides: &OverrideSet,
    ) -> Result<InstallReport> {
        if !target_dir.is_dir() {
            return Err(OverlayError::TargetMissing(target_dir.to_path_buf()).into());
        }
        let name = InstallName::new(install_name)?;
        let bundle = self.bundle.locate()?;

        let log = self.log;
        log.stage(&format!("Installing OptiScaler into {}", target_dir.display()));
        log.debug(&format!("bundle: {}", bundle.root().display()));

        let primary = target_dir.join(name.as_str());
        let primary_backed_up = step(log, &format!("Back up {name}"), || {
            if fs::same_contents(&primary, &bundle.primary())? {
                Ok(Outcome::Skipped("already installed".to_string()))
            } else if backup::backup(&primary)? {
                Ok(Outcome::Done)
            } else if primary.exists() {
                Ok(Outcome::Skipped("backup already present".to_string()))
            } else {
                Ok(Outcome::Skipped("no original".to_string()))
            }
        })? == Outcome::Done;

        step(log, &format!("Install {name}"), || {
            fs::copy_file(&bundle.primary(), &primary)?;
            Ok(Outcome::Done)
        })?;

        let mut auxiliary_copied = Vec::new();
        for aux in manifest::auxiliary_files() {
            let outcome = step(log, &format!("Copy {aux}"), || match bundle.optional_file(aux) {
                Some(src) => {
                    fs::copy_file(&src, &target_dir.join(aux))?;
                    Ok(Outcome::Done)
                }
                None => Ok(Outcome::Skipped("not in bundle".to_string())),
            })?;
            if outcome == Outcome::Done {
                auxiliary_copied.push(aux.to_string());
            }
        }

        let config = target_dir.join(CONFIG_FILE);
        step(log, &format!("Copy {CONFIG_FILE}"), || {
            fs::copy_file(&bundle.config(), &config)?;
            Ok(Outcome::Done)
        })?;
        step(log, "Apply config overrides", || {
            ini::apply_overrides(&config, overrides)?;
            if overrides.is_empty() {
                Ok(Outcome::Skipped("no overrides".to_string()))
            } else {
                Ok(Outcome::Done)
            }
        })?;

        let plugins = target_dir.join(PLUGIN_DIR);
        let plugins_backed_up = step(log, "Back up plugins", || {
            if fs::same_tree(&plugins, &bundle.plugin_dir())? {
                Ok(Outcome::Skipped("already installed".to_string()))
            } else if backup::backup_dir(&plugins)? {
                Ok(Outcome::Done)
            } else if plugins.is_dir() {
                Ok(Outcome::Skipped("backup already present".to_string()))
            } else {
                Ok(Outcome::Skipped("no original".to_string()))
            }
        })? == Outcome::Done;

        step(log, "Install plugins", || {
            if !fs::remove_dir_if_exists(&plugins)? {
                fs::remove_existing(&plugins)?;
            }
            fs::copy_dir_recursive(&bundle.plugin_dir(), &plugins)?;
            Ok(Outcome::Done)
        })?;

        let override_registered = match name.library_base() {
            Some(library) => {
                step(log, &format!("Register {library} override"), || {
                    self.registrar
                        .register(library, OverrideOrder::NativeBuiltin)?;
                    Ok(Outcome::Done)
                })?;
                Some(library.to_string())
            }
            None => {
                log.debug(&format!("{name} is not a library; no override needed"));
                None
            }
        };

        Ok(InstallReport {
            install_name: name,
            bundle: bundle.root().to_path_buf(),
            primary_backed_up,
            auxiliary_copied,
            plugins_backed_up,
            override_registered,
        })
    }
}
