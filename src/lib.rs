//! Reversible OptiScaler overlay installer.
//!
//! Layers the OptiScaler distributable onto a game directory and takes it
//! off again.  Every file that gets replaced is first saved next to itself
//! under a reserved backup suffix, so uninstall can restore originals by
//! looking at file names alone.
//!
//! The public API is organised into layers:
//!
//! - **[`config`]**: INI patching, override sets and TOML presets
//! - **[`resources`]**: the backup ledger and filesystem helpers
//! - **[`overlay`]**: manifest, bundle location, library overrides,
//!   installer and uninstaller
//! - **[`commands`]**: top-level subcommand orchestration (`install`, `uninstall`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod logging;
pub mod overlay;
pub mod platform;
pub mod resources;

/// Version string stamped by the build script, or the package version.
#[must_use]
pub fn version() -> &'static str {
    option_env!("OPTISCALER_OVERLAY_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}
