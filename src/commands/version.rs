//! Command: print version information.

/// Print the version to stdout.
pub fn run() {
    println!("optiscaler-overlay {}", crate::version());
}
