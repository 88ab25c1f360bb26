//! Subcommand orchestration.
//!
//! This is the only layer that reads process environment: the bundle
//! location, the compatibility prefix and the platform are resolved here and
//! handed to the overlay core as explicit collaborators.
pub mod completions;
pub mod install;
pub mod uninstall;
pub mod version;

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::cli::GlobalOpts;
use crate::exec::Executor;
use crate::logging::{Log, Logger};
use crate::overlay::bundle::{BundleLocator, SearchLocator, StaticLocator};
use crate::overlay::dll_override::{
    DllOverrideRegistrar, LaunchOptionHint, NativeLoader, WineRegistry,
};
use crate::platform::Platform;

/// Environment variable naming the bundle directory.
pub const SOURCE_ENV: &str = "OPTISCALER_SOURCE";

/// Environment variable Steam sets to the Proton compatibility data path.
pub const PREFIX_ENV: &str = "STEAM_COMPAT_DATA_PATH";

/// Bundle directory name under the data directories.
const BUNDLE_SUBDIR: &str = "optiscaler-overlay/OptiScaler";

/// Read a non-empty environment variable.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Build the bundle locator from `--source`, the environment, or the
/// default search path.
#[must_use]
pub fn bundle_locator(global: &GlobalOpts) -> Box<dyn BundleLocator> {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    bundle_locator_with(global, env_var, exe_dir.as_deref())
}

fn bundle_locator_with(
    global: &GlobalOpts,
    env: impl Fn(&str) -> Option<String>,
    exe_dir: Option<&Path>,
) -> Box<dyn BundleLocator> {
    if let Some(source) = &global.source {
        return Box::new(StaticLocator(source.clone()));
    }
    if let Some(source) = env(SOURCE_ENV) {
        return Box::new(StaticLocator(PathBuf::from(source)));
    }
    Box::new(SearchLocator::new(default_search_paths(&env, exe_dir)))
}

/// `$XDG_DATA_HOME` (or `~/.local/share`), then `<exe>/../share`.
fn default_search_paths(
    env: &impl Fn(&str) -> Option<String>,
    exe_dir: Option<&Path>,
) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    let data_home = env("XDG_DATA_HOME")
        .map(PathBuf::from)
        .or_else(|| env("HOME").map(|home| PathBuf::from(home).join(".local/share")));
    if let Some(data_home) = data_home {
        paths.push(data_home.join(BUNDLE_SUBDIR));
    }
    if let Some(exe_dir) = exe_dir {
        paths.push(exe_dir.join("../share").join(BUNDLE_SUBDIR));
    }
    paths
}

/// Compatibility data path from `--prefix` or `$STEAM_COMPAT_DATA_PATH`.
#[must_use]
pub fn compat_prefix(global: &GlobalOpts) -> Option<PathBuf> {
    compat_prefix_with(global, env_var)
}

fn compat_prefix_with(
    global: &GlobalOpts,
    env: impl Fn(&str) -> Option<String>,
) -> Option<PathBuf> {
    global
        .prefix
        .clone()
        .or_else(|| env(PREFIX_ENV).map(PathBuf::from))
}

/// Pick how the library override is recorded on this platform.
#[must_use]
pub fn registrar<'a>(
    platform: Platform,
    prefix: Option<&Path>,
    executor: &'a dyn Executor,
    log: &'a dyn Log,
) -> Box<dyn DllOverrideRegistrar + 'a> {
    if !platform.uses_compat_layer() {
        return Box::new(NativeLoader);
    }
    match prefix {
        Some(prefix) => Box::new(WineRegistry::new(prefix, executor)),
        None => Box::new(LaunchOptionHint::new(log)),
    }
}

/// Print the step summary and bail if any step failed.
///
/// # Errors
///
/// Returns an error if one or more steps recorded a failure.
pub fn finish(log: &Logger) -> Result<()> {
    log.print_summary();
    let count = log.failure_count();
    if count > 0 {
        anyhow::bail!("{count} step(s) failed");
    }
    Ok(())
}
