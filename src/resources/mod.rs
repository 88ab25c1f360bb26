//! File-system primitives the overlay is built from.
//!
//! - [`backup`]: the backup ledger (single-use sibling backups)
//! - [`helpers::fs`]: copy, move and removal helpers with error context
pub mod backup;

/// Shared helpers used by resource primitives.
pub mod helpers {
    pub mod fs;
}
