//! Uninstall command implementation.
use anyhow::Result;

use crate::cli::{GlobalOpts, UninstallOpts};
use crate::logging::Logger;
use crate::overlay::uninstall::OverlayUninstaller;

/// Run the uninstall command.
///
/// # Errors
///
/// Returns an error if the target directory is missing or a removal fails.
pub fn run(global: &GlobalOpts, opts: &UninstallOpts, log: &Logger) -> Result<()> {
    let locator = super::bundle_locator(global);
    let uninstaller = OverlayUninstaller::new(Some(locator.as_ref()), log);
    let report = uninstaller.try_uninstall(&opts.target);
    super::finish(log)?;
    let report = report?;

    log.info(&format!(
        "restored {} file(s), removed {} overlay entr{}",
        report.restored.len() + usize::from(report.plugins_restored),
        report.removed.len(),
        if report.removed.len() == 1 { "y" } else { "ies" }
    ));
    Ok(())
}
