//! Overlay installer and uninstaller.
//!
//! The installer layers a fixed manifest of files from a [`SourceBundle`]
//! onto a target directory, backing up every file it replaces; the
//! uninstaller puts the originals back and removes what the installer added.
//! Both are synchronous and assume nothing else touches the target
//! directory while they run.
//!
//! [`SourceBundle`]: bundle::SourceBundle

pub mod bundle;
pub mod dll_override;
pub mod install;
pub mod manifest;
pub mod uninstall;

use anyhow::Result;

use crate::logging::{Log, StepStatus};

/// What a single step did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// The step changed the target directory.
    Done,
    /// Nothing to do, with the reason.
    Skipped(String),
}

/// Run one named step, record its outcome, and propagate failure.
pub(crate) fn step(
    log: &dyn Log,
    name: &str,
    f: impl FnOnce() -> Result<Outcome>,
) -> Result<Outcome> {
    match f() {
        Ok(Outcome::Done) => {
            log.debug(&format!("{name}: done"));
            log.record_step(name, StepStatus::Ok, None);
            Ok(Outcome::Done)
        }
        Ok(Outcome::Skipped(reason)) => {
            log.debug(&format!("{name}: skipped ({reason})"));
            log.record_step(name, StepStatus::Skipped, Some(&reason));
            Ok(Outcome::Skipped(reason))
        }
        Err(e) => {
            log.record_step(name, StepStatus::Failed, Some(&format!("{e:#}")));
            Err(e)
        }
    }
}
