//! Install command implementation.
use anyhow::Result;

use crate::cli::{GlobalOpts, InstallOpts};
use crate::config::overrides::{OverrideSet, Preset};
use crate::exec::SystemExecutor;
use crate::logging::Logger;
use crate::overlay::install::OverlayInstaller;
use crate::platform::Platform;

/// Run the install command.
///
/// # Errors
///
/// Returns an error if the preset or an override is invalid, a precondition
/// fails, or any install step fails.
pub fn run(global: &GlobalOpts, opts: &InstallOpts, log: &Logger) -> Result<()> {
    let platform = Platform::detect();
    log.info(&format!("optiscaler-overlay {} ({})", crate::version(), platform.os));

    let preset = match &opts.preset {
        Some(path) => {
            log.debug(&format!("loading preset {}", path.display()));
            Preset::load(path)?
        }
        None => Preset::default(),
    };
    let install_name = opts.install_name(preset.dll_name.as_deref());
    let mut overrides = preset.overrides.clone();
    overrides.extend(OverrideSet::from_assignments(&opts.overrides)?);
    log.debug(&format!("{} config override(s)", overrides.len()));

    let locator = super::bundle_locator(global);
    let prefix = super::compat_prefix(global);
    let executor = SystemExecutor;
    let registrar = super::registrar(platform, prefix.as_deref(), &executor, log);

    let installer = OverlayInstaller::new(locator.as_ref(), registrar.as_ref(), log);
    let report = installer.try_install(&opts.target, install_name, &overrides);
    super::finish(log)?;
    let report = report?;

    log.info(&format!(
        "installed {} from {}",
        report.install_name,
        report.bundle.display()
    ));
    if let Some(library) = &report.override_registered {
        log.info(&format!("{library} set to load native first"));
    }
    Ok(())
}
