//! Backup ledger: sibling backup files named by a reserved suffix.
//!
//! A backup of `dxgi.dll` lives next to it as `dxgi.dll.optiscaler.bak`.
//! Discoverability is purely by file name, so uninstall can find every
//! backup without an index.  At most one backup exists per original; a
//! second backup attempt is a no-op so repeated installs never overwrite the
//! true original.
use anyhow::{Context as _, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use super::helpers::fs;

/// Reserved marker appended (after a `.`) to every backup name.
pub const BACKUP_MARKER: &str = "optiscaler.bak";

/// Derive the backup path for `path` by appending `.optiscaler.bak` to its
/// file name.
///
/// # Examples
///
/// ```
/// use optiscaler_overlay::resources::backup::backup_path;
/// use std::path::Path;
///
/// assert_eq!(
///     backup_path(Path::new("/game/dxgi.dll")),
///     Path::new("/game/dxgi.dll.optiscaler.bak")
/// );
/// ```
#[must_use]
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(OsString::new, std::ffi::OsStr::to_os_string);
    name.push(".");
    name.push(BACKUP_MARKER);
    path.with_file_name(name)
}

/// Return the original path a backup belongs to, or `None` if `path` does
/// not follow the backup naming convention.
///
/// # Examples
///
/// ```
/// use optiscaler_overlay::resources::backup::original_path;
/// use std::path::Path;
///
/// assert_eq!(
///     original_path(Path::new("/game/dxgi.dll.optiscaler.bak")),
///     Some(Path::new("/game/dxgi.dll").to_path_buf())
/// );
/// assert_eq!(original_path(Path::new("/game/dxgi.dll")), None);
/// ```
#[must_use]
pub fn original_path(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?.to_str()?;
    let stem = name.strip_suffix(BACKUP_MARKER)?.strip_suffix('.')?;
    if stem.is_empty() {
        return None;
    }
    Some(path.with_file_name(stem))
}

/// Back up the file at `path`.
///
/// Returns `Ok(false)` without touching anything when `path` does not exist
/// (nothing to protect) or a backup already exists (the existing backup is
/// the true original).  Otherwise copies `path` to its backup name and
/// returns `Ok(true)`.
///
/// # Errors
///
/// Returns an error if the copy itself fails.
pub fn backup(path: &Path) -> Result<bool> {
    if !path.is_file() {
        return Ok(false);
    }
    let bak = backup_path(path);
    if bak.symlink_metadata().is_ok() {
        return Ok(false);
    }
    fs::copy_file(path, &bak).with_context(|| format!("backing up {}", path.display()))?;
    Ok(true)
}

/// Restore `path` from its backup and consume the backup.
///
/// Returns `Ok(false)` when no backup exists, leaving `path` untouched.
/// Otherwise replaces (or creates) `path` with the backup's contents, deletes
/// the backup and returns `Ok(true)`.
///
/// # Errors
///
/// Returns an error if the backup cannot be moved into place.
pub fn restore(path: &Path) -> Result<bool> {
    let bak = backup_path(path);
    if !bak.is_file() {
        return Ok(false);
    }
    fs::move_path(&bak, path).with_context(|| format!("restoring {}", path.display()))?;
    Ok(true)
}

/// Back up the directory at `path` wholesale by moving it to its backup name.
///
/// Follows the same single-backup rule as [`backup`]: returns `Ok(false)`
/// when `path` is not a directory or a backup already exists.
///
/// # Errors
///
/// Returns an error if the directory cannot be moved.
pub fn backup_dir(path: &Path) -> Result<bool> {
    if !path.is_dir() {
        return Ok(false);
    }
    let bak = backup_path(path);
    if bak.symlink_metadata().is_ok() {
        return Ok(false);
    }
    fs::move_path(path, &bak).with_context(|| format!("backing up {}", path.display()))?;
    Ok(true)
}

/// Restore the directory at `path` from its backup.
///
/// Returns `Ok(false)` when no directory backup exists.  Otherwise removes
/// whatever currently lives at `path` and moves the backup into place.
///
/// # Errors
///
/// Returns an error if the live directory cannot be removed or the backup
/// cannot be moved.
pub fn restore_dir(path: &Path) -> Result<bool> {
    let bak = backup_path(path);
    if !bak.is_dir() {
        return Ok(false);
    }
    if !fs::remove_dir_if_exists(path)? {
        fs::remove_existing(path)?;
    }
    fs::move_path(&bak, path).with_context(|| format!("restoring {}", path.display()))?;
    Ok(true)
}

/// List every backup file directly inside `dir`, sorted by path.
///
/// Directory backups are not included.
///
/// # Errors
///
/// Returns an error if `dir` cannot be read.
pub fn find_backups(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in
        std::fs::read_dir(dir).with_context(|| format!("reading directory {}", dir.display()))?
    {
        let entry = entry.with_context(|| format!("reading entry in {}", dir.display()))?;
        let path = entry.path();
        if path.is_file() && original_path(&path).is_some() {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}
