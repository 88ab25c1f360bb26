#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing
)]
//! Integration tests for the overlay uninstaller, mostly as install/uninstall
//! round trips.

mod common;

use common::{Fixture, RecordingLog, RecordingRegistrar};
use optiscaler_overlay::config::overrides::OverrideSet;
use optiscaler_overlay::overlay::bundle::BundleLocator;
use optiscaler_overlay::overlay::install::OverlayInstaller;
use optiscaler_overlay::overlay::uninstall::OverlayUninstaller;
use optiscaler_overlay::resources::backup;

fn install(fx: &Fixture, name: &str) {
    let registrar = RecordingRegistrar::default();
    let log = RecordingLog::default();
    let locator = fx.locator();
    OverlayInstaller::new(&locator, &registrar, &log)
        .try_install(
            fx.game_path(),
            name,
            &OverrideSet::from_iter([("Spoofing", "SpoofHAGS", "true")]),
        )
        .unwrap();
}

fn uninstall(fx: &Fixture) -> bool {
    let log = RecordingLog::default();
    let locator = fx.locator();
    OverlayUninstaller::new(Some(&locator as &dyn BundleLocator), &log).uninstall(fx.game_path())
}

// ---------------------------------------------------------------------------
// Round trips
// ---------------------------------------------------------------------------

#[test]
fn restores_original_dxgi() {
    let fx = Fixture::new().with_game_file("dxgi.dll", b"original");
    install(&fx, "dxgi.dll");
    assert_eq!(fx.read("dxgi.dll"), b"new");
    assert_eq!(fx.read("dxgi.dll.optiscaler.bak"), b"original");

    assert!(uninstall(&fx));

    assert_eq!(fx.read("dxgi.dll"), b"original");
    assert!(backup::find_backups(fx.game_path()).unwrap().is_empty());
}

#[test]
fn pristine_directory_round_trips_exactly() {
    let fx = Fixture::new()
        .with_game_file("Game.exe", b"exe")
        .with_game_file("data/level1.pak", b"pak");
    let before = fx.snapshot();

    install(&fx, "dxgi.dll");
    assert!(uninstall(&fx));

    assert_eq!(fx.snapshot(), before);
    assert!(!fx.game_file("plugins").exists());
}

#[test]
fn double_install_then_uninstall_restores_first_original() {
    let fx = Fixture::new()
        .with_game_file("dxgi.dll", b"original")
        .with_game_file("plugins/original_plugin.dll", b"original plugin");
    let before = fx.snapshot();

    install(&fx, "dxgi.dll");
    install(&fx, "dxgi.dll");
    assert!(uninstall(&fx));

    assert_eq!(fx.snapshot(), before);
}

#[test]
fn restores_across_different_install_names() {
    let fx = Fixture::new()
        .with_game_file("dxgi.dll", b"original dxgi")
        .with_game_file("winmm.dll", b"original winmm");
    let before = fx.snapshot();

    install(&fx, "dxgi.dll");
    install(&fx, "winmm.dll");
    assert!(uninstall(&fx));

    assert_eq!(fx.snapshot(), before);
}

#[test]
fn recovers_from_partial_install() {
    let fx = Fixture::new()
        .with_game_file("dxgi.dll", b"original")
        .with_game_file("dxgi.dll.optiscaler.bak", b"original")
        .with_game_file("nvngx.dll", b"nvngx.dll");
    std::fs::write(fx.game_file("dxgi.dll"), b"new").unwrap();

    assert!(uninstall(&fx));

    assert_eq!(fx.read("dxgi.dll"), b"original");
    assert!(!fx.game_file("nvngx.dll").exists());
    assert!(!fx.game_file("dxgi.dll.optiscaler.bak").exists());
}

// ---------------------------------------------------------------------------
// Cleanup and edge cases
// ---------------------------------------------------------------------------

#[test]
fn deletes_orphaned_backups() {
    let fx = Fixture::new()
        .with_game_file("settings.cfg.optiscaler.bak", b"stale")
        .with_game_file("settings.cfg", b"current");

    assert!(uninstall(&fx));

    assert!(!fx.game_file("settings.cfg.optiscaler.bak").exists());
    assert_eq!(fx.read("settings.cfg"), b"current");
}

#[test]
fn leaves_unknown_directory_backups_with_warning() {
    let fx = Fixture::new().with_game_file("shaders.optiscaler.bak/a.bin", b"a");
    let log = RecordingLog::default();

    assert!(OverlayUninstaller::new(None, &log).uninstall(fx.game_path()));

    assert!(fx.game_file("shaders.optiscaler.bak/a.bin").exists());
    assert!(
        log.messages()
            .iter()
            .any(|m| m.starts_with("warn:") && m.contains("shaders.optiscaler.bak"))
    );
}

#[test]
fn nonexistent_target_fails() {
    let fx = Fixture::new();
    let log = RecordingLog::default();
    assert!(!OverlayUninstaller::new(None, &log).uninstall(&fx.game_file("missing")));
}

#[test]
fn empty_directory_is_a_successful_noop() {
    let fx = Fixture::new();
    assert!(uninstall(&fx));
    assert!(fx.snapshot().is_empty());
}

#[test]
fn second_uninstall_changes_nothing() {
    let fx = Fixture::new().with_game_file("dxgi.dll", b"original");
    install(&fx, "dxgi.dll");
    assert!(uninstall(&fx));
    let after_first = fx.snapshot();

    assert!(uninstall(&fx));

    assert_eq!(fx.snapshot(), after_first);
}
