//! `optiscaler-overlay` command-line entry point.
use anyhow::Result;
use clap::Parser as _;

use optiscaler_overlay::{cli, commands, logging};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = cli::Cli::parse();

    let command = match &args.command {
        cli::Command::Install(_) => "install",
        cli::Command::Uninstall(_) => "uninstall",
        cli::Command::Version => {
            commands::version::run();
            return Ok(());
        }
        cli::Command::Completions(opts) => {
            commands::completions::run(opts);
            return Ok(());
        }
    };
    logging::init_subscriber(args.verbose, command);
    let log = logging::Logger::new(command);

    match &args.command {
        cli::Command::Install(opts) => commands::install::run(&args.global, opts, &log),
        cli::Command::Uninstall(opts) => commands::uninstall::run(&args.global, opts, &log),
        cli::Command::Version | cli::Command::Completions(_) => Ok(()),
    }
}
