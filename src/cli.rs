//! Command-line interface definition.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::overlay::manifest::DEFAULT_INSTALL_NAME;

/// Top-level CLI entry point for the OptiScaler overlay installer.
#[derive(Parser, Debug)]
#[command(
    name = "optiscaler-overlay",
    about = "Install and remove the OptiScaler overlay in a game directory",
    version
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// OptiScaler bundle directory (default: $OPTISCALER_SOURCE, then the
    /// standard data directories)
    #[arg(long, global = true, value_name = "DIR")]
    pub source: Option<PathBuf>,

    /// Wine/Proton compatibility data directory for the library override
    /// (default: $STEAM_COMPAT_DATA_PATH)
    #[arg(long, global = true, value_name = "DIR")]
    pub prefix: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Install the overlay into a game directory
    Install(InstallOpts),
    /// Remove the overlay and restore original files
    Uninstall(UninstallOpts),
    /// Print version information
    Version,
    /// Generate shell completions
    Completions(CompletionsOpts),
}

/// Options for the `install` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct InstallOpts {
    /// Game directory containing the executable
    pub target: PathBuf,

    /// File name the game loads the primary module under
    #[arg(long, value_name = "NAME")]
    pub dll_name: Option<String>,

    /// TOML preset with an install name and config overrides
    #[arg(long, value_name = "FILE")]
    pub preset: Option<PathBuf>,

    /// Config override, applied after the preset
    #[arg(long = "set", value_name = "SECTION.KEY=VALUE")]
    pub overrides: Vec<String>,
}

impl InstallOpts {
    /// Install name precedence: `--dll-name`, then the preset, then the default.
    #[must_use]
    pub fn install_name<'a>(&'a self, preset: Option<&'a str>) -> &'a str {
        self.dll_name
            .as_deref()
            .or(preset)
            .unwrap_or(DEFAULT_INSTALL_NAME)
    }
}

/// Options for the `uninstall` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct UninstallOpts {
    /// Game directory the overlay was installed into
    pub target: PathBuf,
}

/// Options for the `completions` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct CompletionsOpts {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
