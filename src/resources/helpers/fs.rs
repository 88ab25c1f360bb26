//! File-system helpers shared by the backup ledger and the overlay steps.
use anyhow::{Context as _, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Copy a single file, overwriting `dst` if it exists.
///
/// # Errors
///
/// Returns an error if `src` cannot be read or `dst` cannot be written.
pub fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    std::fs::copy(src, dst)
        .with_context(|| format!("copying {} to {}", src.display(), dst.display()))?;
    Ok(())
}

/// Remove an existing file or symlink at `path`, including broken symlinks.
///
/// Returns `true` when something was removed and `false` when `path` was
/// already absent.  Directories are left alone (`false`).
///
/// # Errors
///
/// Returns an error if the path exists but cannot be removed.
pub fn remove_existing(path: &Path) -> Result<bool> {
    match path.symlink_metadata() {
        Ok(meta) if !meta.is_dir() => {
            std::fs::remove_file(path)
                .with_context(|| format!("remove existing: {}", path.display()))?;
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// Recursively remove the directory at `path` if it exists.
///
/// Returns `true` when a directory was removed.
///
/// # Errors
///
/// Returns an error if the directory exists but cannot be removed.
pub fn remove_dir_if_exists(path: &Path) -> Result<bool> {
    if !path.is_dir() {
        return Ok(false);
    }
    std::fs::remove_dir_all(path)
        .with_context(|| format!("removing directory {}", path.display()))?;
    Ok(true)
}

/// Recursively copy a directory tree.
///
/// Symlinks within the source tree are *followed*: the function uses
/// [`Path::is_dir`] (which follows symlinks) so directory symlinks are
/// recursed into and their contents materialised rather than copying the
/// link itself.
///
/// # Errors
///
/// Returns an error if the destination directory cannot be created, a source
/// entry cannot be read, or a file cannot be copied.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    std::fs::create_dir_all(dst)
        .with_context(|| format!("creating directory {}", dst.display()))?;
    for entry in
        std::fs::read_dir(src).with_context(|| format!("reading directory {}", src.display()))?
    {
        let entry = entry.with_context(|| format!("reading entry in {}", src.display()))?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        if src_path.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            copy_file(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Move a file or directory from `from` to `to`.
///
/// Prefers an atomic rename; falls back to copy+delete when the rename
/// crosses a filesystem boundary.  An existing file at `to` is replaced.
///
/// # Errors
///
/// Returns an error if neither the rename nor the fallback copy succeeds.
pub fn move_path(from: &Path, to: &Path) -> Result<()> {
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }
    if from.is_dir() {
        copy_dir_recursive(from, to)
            .with_context(|| format!("cross-fs copy {} to {}", from.display(), to.display()))?;
        std::fs::remove_dir_all(from)
            .with_context(|| format!("remove moved dir: {}", from.display()))?;
    } else {
        copy_file(from, to)?;
        std::fs::remove_file(from)
            .with_context(|| format!("remove moved file: {}", from.display()))?;
    }
    Ok(())
}

/// Returns `true` if `a` and `b` are both regular files with identical bytes.
///
/// # Errors
///
/// Returns an error if either existing file cannot be read.
pub fn same_contents(a: &Path, b: &Path) -> Result<bool> {
    if !a.is_file() || !b.is_file() {
        return Ok(false);
    }
    let left = std::fs::read(a).with_context(|| format!("reading {}", a.display()))?;
    let right = std::fs::read(b).with_context(|| format!("reading {}", b.display()))?;
    Ok(left == right)
}

/// Returns `true` if directories `a` and `b` hold the same relative file
/// paths with identical bytes.  Empty subdirectories are ignored.
///
/// # Errors
///
/// Returns an error if either existing tree cannot be read.
pub fn same_tree(a: &Path, b: &Path) -> Result<bool> {
    if !a.is_dir() || !b.is_dir() {
        return Ok(false);
    }
    Ok(tree_contents(a)? == tree_contents(b)?)
}

fn tree_contents(root: &Path) -> Result<BTreeMap<PathBuf, Vec<u8>>> {
    fn walk(root: &Path, dir: &Path, out: &mut BTreeMap<PathBuf, Vec<u8>>) -> Result<()> {
        for entry in
            std::fs::read_dir(dir).with_context(|| format!("reading directory {}", dir.display()))?
        {
            let path = entry
                .with_context(|| format!("reading entry in {}", dir.display()))?
                .path();
            if path.is_dir() {
                walk(root, &path, out)?;
            } else {
                let bytes =
                    std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
                let rel = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
                out.insert(rel, bytes);
            }
        }
        Ok(())
    }
    let mut out = BTreeMap::new();
    walk(root, root, &mut out)?;
    Ok(out)
}
