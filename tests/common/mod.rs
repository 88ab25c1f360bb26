// Shared helpers for integration tests.
//
// Provides a temporary game directory plus a complete OptiScaler bundle, and
// recording collaborators so tests can observe logging and override
// registration without touching the real environment.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use optiscaler_overlay::logging::{Log, StepStatus};
use optiscaler_overlay::overlay::bundle::StaticLocator;
use optiscaler_overlay::overlay::dll_override::{DllOverrideRegistrar, OverrideOrder};

/// Canonical config shipped in the test bundle.
pub const BUNDLE_INI: &str = "\
; OptiScaler config
[Upscalers]
Dx12Upscaler = auto

[Spoofing]
Dxgi=auto
";

/// Write a complete bundle into `root`.
///
/// Creates:
/// - `OptiScaler.dll`                  containing `new`
/// - `OptiScaler.ini`                  [`BUNDLE_INI`]
/// - `fakenvapi.dll`, `nvngx.dll`, `libxess.dll`
/// - `plugins/optiscaler_plugin.dll`
pub fn write_bundle(root: &Path) {
    std::fs::create_dir_all(root.join("plugins")).expect("create plugins dir");
    std::fs::write(root.join("OptiScaler.dll"), b"new").expect("write primary");
    std::fs::write(root.join("OptiScaler.ini"), BUNDLE_INI).expect("write ini");
    for aux in ["fakenvapi.dll", "nvngx.dll", "libxess.dll"] {
        std::fs::write(root.join(aux), aux.as_bytes()).expect("write aux");
    }
    std::fs::write(root.join("plugins/optiscaler_plugin.dll"), b"overlay plugin")
        .expect("write plugin");
}

/// A game directory and a bundle, each in its own [`tempfile::TempDir`].
pub struct Fixture {
    /// Game directory the overlay is installed into.
    pub game: tempfile::TempDir,
    /// Source bundle directory.
    pub bundle: tempfile::TempDir,
}

impl Fixture {
    /// An empty game directory and a complete bundle.
    pub fn new() -> Self {
        let game = tempfile::tempdir().expect("create game dir");
        let bundle = tempfile::tempdir().expect("create bundle dir");
        write_bundle(bundle.path());
        Self { game, bundle }
    }

    /// Add a file (creating parent directories) to the game directory.
    pub fn with_game_file(self, rel: &str, contents: &[u8]) -> Self {
        let path = self.game.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dir");
        }
        std::fs::write(path, contents).expect("write game file");
        self
    }

    /// Path to the game directory.
    pub fn game_path(&self) -> &Path {
        self.game.path()
    }

    /// Path of `rel` inside the game directory.
    pub fn game_file(&self, rel: &str) -> PathBuf {
        self.game.path().join(rel)
    }

    /// Read `rel` from the game directory.
    pub fn read(&self, rel: &str) -> Vec<u8> {
        std::fs::read(self.game_file(rel)).expect("read game file")
    }

    /// Locator pointing at this fixture's bundle.
    pub fn locator(&self) -> StaticLocator {
        StaticLocator(self.bundle.path().to_path_buf())
    }

    /// Every file under the game directory.
    pub fn snapshot(&self) -> BTreeMap<PathBuf, Vec<u8>> {
        snapshot(self.game.path())
    }
}

/// Every file under `dir` (relative path to bytes).
pub fn snapshot(dir: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    fn walk(root: &Path, dir: &Path, out: &mut BTreeMap<PathBuf, Vec<u8>>) {
        for entry in std::fs::read_dir(dir).expect("read dir") {
            let path = entry.expect("dir entry").path();
            if path.is_dir() {
                walk(root, &path, out);
            } else {
                let rel = path.strip_prefix(root).expect("relative path").to_path_buf();
                out.insert(rel, std::fs::read(&path).expect("read file"));
            }
        }
    }
    let mut out = BTreeMap::new();
    walk(dir, dir, &mut out);
    out
}

/// [`Log`] that keeps messages and steps in memory.
#[derive(Debug, Default)]
pub struct RecordingLog {
    messages: Mutex<Vec<String>>,
    steps: Mutex<Vec<(String, StepStatus)>>,
}

impl RecordingLog {
    /// All messages logged so far, prefixed by level.
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().expect("lock").clone()
    }

    /// All recorded steps.
    pub fn steps(&self) -> Vec<(String, StepStatus)> {
        self.steps.lock().expect("lock").clone()
    }

    fn push(&self, level: &str, msg: &str) {
        self.messages
            .lock()
            .expect("lock")
            .push(format!("{level}: {msg}"));
    }
}

impl Log for RecordingLog {
    fn stage(&self, msg: &str) {
        self.push("stage", msg);
    }
    fn info(&self, msg: &str) {
        self.push("info", msg);
    }
    fn debug(&self, msg: &str) {
        self.push("debug", msg);
    }
    fn warn(&self, msg: &str) {
        self.push("warn", msg);
    }
    fn error(&self, msg: &str) {
        self.push("error", msg);
    }
    fn record_step(&self, name: &str, status: StepStatus, _message: Option<&str>) {
        self.steps
            .lock()
            .expect("lock")
            .push((name.to_string(), status));
    }
}

/// Registrar that records every call and optionally fails.
#[derive(Debug, Default)]
pub struct RecordingRegistrar {
    calls: RefCell<Vec<(String, OverrideOrder)>>,
    /// When set, every registration fails.
    pub fail: bool,
}

impl RecordingRegistrar {
    /// A registrar whose registrations always fail.
    pub fn failing() -> Self {
        Self {
            calls: RefCell::default(),
            fail: true,
        }
    }

    /// Every `(library, order)` registered so far.
    pub fn calls(&self) -> Vec<(String, OverrideOrder)> {
        self.calls.borrow().clone()
    }
}

impl DllOverrideRegistrar for RecordingRegistrar {
    fn register(&self, library: &str, order: OverrideOrder) -> anyhow::Result<()> {
        self.calls.borrow_mut().push((library.to_string(), order));
        if self.fail {
            anyhow::bail!("registry unavailable");
        }
        Ok(())
    }
}
