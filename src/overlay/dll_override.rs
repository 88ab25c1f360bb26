//! Library-resolution overrides for the Wine/Proton compatibility layer.
//!
//! Under Wine a DLL dropped into the game directory is only preferred over
//! Wine's own implementation when an override says so.  The installer asks a
//! [`DllOverrideRegistrar`] to record that preference once per install.
use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::error::OverlayError;
use crate::exec::Executor;
use crate::logging::Log;

/// Registry key Wine reads per-library load order from.
const DLL_OVERRIDES_KEY: &str = r"HKEY_CURRENT_USER\Software\Wine\DllOverrides";

/// Library load order preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideOrder {
    /// Prefer the native DLL, fall back to Wine's builtin.
    NativeBuiltin,
}

impl OverrideOrder {
    /// Short form used in `WINEDLLOVERRIDES`.
    ///
    /// ```
    /// use optiscaler_overlay::overlay::dll_override::OverrideOrder;
    ///
    /// assert_eq!(OverrideOrder::NativeBuiltin.env_token(), "n,b");
    /// ```
    #[must_use]
    pub const fn env_token(self) -> &'static str {
        match self {
            Self::NativeBuiltin => "n,b",
        }
    }

    /// Long form stored under the `DllOverrides` registry key.
    #[must_use]
    pub const fn registry_value(self) -> &'static str {
        match self {
            Self::NativeBuiltin => "native,builtin",
        }
    }
}

/// Records a library-resolution override.
#[cfg_attr(test, mockall::automock)]
pub trait DllOverrideRegistrar {
    /// Record that `library` (base name without `.dll`) resolves in `order`.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError::Registration`] when the override cannot be
    /// recorded.
    fn register(&self, library: &str, order: OverrideOrder) -> Result<()>;
}

/// Writes the override into a Wine prefix registry with `wine reg add`.
#[derive(Debug)]
pub struct WineRegistry<'a> {
    prefix: PathBuf,
    executor: &'a dyn Executor,
}

impl<'a> WineRegistry<'a> {
    /// Target the prefix belonging to `compat_data`.
    ///
    /// Proton keeps the actual Wine prefix in a `pfx` subdirectory of the
    /// compatibility data path; a plain Wine prefix is used as-is.
    #[must_use]
    pub fn new(compat_data: &Path, executor: &'a dyn Executor) -> Self {
        let pfx = compat_data.join("pfx");
        let prefix = if pfx.is_dir() {
            pfx
        } else {
            compat_data.to_path_buf()
        };
        Self { prefix, executor }
    }

    /// The Wine prefix the override is written into.
    #[must_use]
    pub fn prefix(&self) -> &Path {
        &self.prefix
    }
}

impl DllOverrideRegistrar for WineRegistry<'_> {
    fn register(&self, library: &str, order: OverrideOrder) -> Result<()> {
        let failed = |reason: String| OverlayError::Registration {
            library: library.to_string(),
            reason,
        };
        if !self.executor.which("wine") {
            return Err(failed("wine not found on PATH".to_string()).into());
        }
        let prefix = self.prefix.to_string_lossy();
        self.executor
            .run_with_env(
                "wine",
                &[
                    "reg",
                    "add",
                    DLL_OVERRIDES_KEY,
                    "/v",
                    library,
                    "/d",
                    order.registry_value(),
                    "/f",
                ],
                &[("WINEPREFIX", &*prefix)],
            )
            .map_err(|e| failed(format!("{e:#}")))?;
        Ok(())
    }
}

/// Reports the launch option to set by hand when no prefix is known.
pub struct LaunchOptionHint<'a> {
    log: &'a dyn Log,
}

impl std::fmt::Debug for LaunchOptionHint<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaunchOptionHint").finish_non_exhaustive()
    }
}

impl<'a> LaunchOptionHint<'a> {
    /// Emit hints through `log`.
    #[must_use]
    pub const fn new(log: &'a dyn Log) -> Self {
        Self { log }
    }
}

/// Launch option string that applies the override for one game session.
#[must_use]
pub fn launch_option(library: &str, order: OverrideOrder) -> String {
    format!("WINEDLLOVERRIDES=\"{library}={}\" %command%", order.env_token())
}

impl DllOverrideRegistrar for LaunchOptionHint<'_> {
    fn register(&self, library: &str, order: OverrideOrder) -> Result<()> {
        self.log
            .warn("no compatibility prefix given; the override was not written");
        self.log.info(&format!(
            "set the game's launch options to: {}",
            launch_option(library, order)
        ));
        Ok(())
    }
}

/// Registrar for native Windows, where local DLLs already win.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeLoader;

impl DllOverrideRegistrar for NativeLoader {
    fn register(&self, _library: &str, _order: OverrideOrder) -> Result<()> {
        Ok(())
    }
}
