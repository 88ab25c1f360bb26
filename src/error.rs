//! Domain-specific error types for the overlay installer.
//!
//! Internal modules return [`anyhow::Result`] and raise these typed errors
//! with `bail!` or `?`, so callers that care about the failure category can
//! recover it with [`anyhow::Error::downcast_ref`].
//!
//! # Error hierarchy
//!
//! ```text
//! OverlayError
//! ├── TargetMissing        target directory absent
//! ├── InvalidInstallName   name not on the allow-list
//! ├── BundleUnavailable    source bundle could not be located
//! ├── BundleFileMissing    a required manifest entry is absent
//! ├── Registration         library override could not be recorded
//! └── Config(ConfigError)  INI patching, override and preset parsing
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for install and uninstall operations.
#[derive(Error, Debug)]
pub enum OverlayError {
    /// The target directory does not exist (or is not a directory).
    #[error("target directory does not exist: {}", .0.display())]
    TargetMissing(PathBuf),

    /// The requested primary-module name is not an accepted install name.
    #[error("'{name}' is not an accepted install name (expected one of: {expected})")]
    InvalidInstallName {
        /// The rejected name.
        name: String,
        /// Comma-separated list of accepted names.
        expected: String,
    },

    /// The source bundle could not be located.
    #[error("source bundle unavailable: {0}")]
    BundleUnavailable(String),

    /// A required manifest file is missing from the source bundle.
    #[error("required bundle entry missing: {}", .0.display())]
    BundleFileMissing(PathBuf),

    /// The library-resolution override could not be registered.
    #[error("failed to register library override for '{library}': {reason}")]
    Registration {
        /// Library base name (e.g. `"dxgi"`).
        library: String,
        /// Human-readable reason for the failure.
        reason: String,
    },

    /// Configuration error (INI patching, overrides, presets).
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors that arise from configuration files and override parsing.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file to patch does not exist.
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The INI file contains a line that cannot be parsed.
    #[error("Invalid INI syntax in {file} at line {line}: {message}")]
    InvalidSyntax {
        /// File the syntax error was found in.
        file: String,
        /// One-based line number.
        line: usize,
        /// Description of the problem.
        message: String,
    },

    /// A `Section.Key=Value` assignment is malformed.
    #[error("invalid override '{0}': expected Section.Key=Value")]
    InvalidOverride(String),

    /// An I/O error occurred while reading a config or preset file.
    #[error("IO error reading config file {path}: {source}")]
    Io {
        /// Path to the file that could not be read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A preset file is not valid TOML or has the wrong shape.
    #[error("Invalid preset {path}: {message}")]
    InvalidPreset {
        /// Path to the preset file.
        path: String,
        /// Parser message.
        message: String,
    },
}
