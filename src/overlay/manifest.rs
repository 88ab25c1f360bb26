//! Fixed manifest of bundle entries and the install-name allow-list.
use std::fmt;
use std::str::FromStr;

use crate::error::OverlayError;

/// Source file name of the primary module inside the bundle.
pub const PRIMARY_MODULE: &str = "OptiScaler.dll";

/// The tunable config file, copied verbatim and then patched.
pub const CONFIG_FILE: &str = "OptiScaler.ini";

/// The plugin directory, replaced wholesale.
pub const PLUGIN_DIR: &str = "plugins";

/// Install name used when the caller does not pick one.
pub const DEFAULT_INSTALL_NAME: &str = "dxgi.dll";

/// Names the game-side loader will pick up the primary module under.
pub const ALLOWED_INSTALL_NAMES: &[&str] = &[
    "dxgi.dll",
    "winmm.dll",
    "version.dll",
    "dbghelp.dll",
    "d3d12.dll",
    "wininet.dll",
    "winhttp.dll",
    "OptiScaler.asi",
];

/// What role an entry plays during install.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Copied under the caller's install name, backing up any original.
    PrimaryModule,
    /// Copied over any previous copy, then patched with overrides.
    ConfigFile,
    /// Additive library drop, never backed up.
    AuxiliaryFile,
    /// Directory tree, backed up wholesale once.
    PluginDirectory,
}

/// A bundle-relative path and its role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Path relative to the bundle root (and to the target directory, except
    /// for the primary module which is renamed).
    pub path: &'static str,
    /// Role of the entry.
    pub kind: EntryKind,
    /// Whether install fails when the bundle lacks this entry.
    pub required: bool,
}

/// Every entry the installer knows about, in install order.
pub const MANIFEST: &[ManifestEntry] = &[
    ManifestEntry {
        path: PRIMARY_MODULE,
        kind: EntryKind::PrimaryModule,
        required: true,
    },
    ManifestEntry {
        path: "fakenvapi.dll",
        kind: EntryKind::AuxiliaryFile,
        required: false,
    },
    ManifestEntry {
        path: "nvngx.dll",
        kind: EntryKind::AuxiliaryFile,
        required: false,
    },
    ManifestEntry {
        path: "libxess.dll",
        kind: EntryKind::AuxiliaryFile,
        required: false,
    },
    ManifestEntry {
        path: CONFIG_FILE,
        kind: EntryKind::ConfigFile,
        required: true,
    },
    ManifestEntry {
        path: PLUGIN_DIR,
        kind: EntryKind::PluginDirectory,
        required: true,
    },
];

/// Iterate over the auxiliary file names.
pub fn auxiliary_files() -> impl Iterator<Item = &'static str> {
    MANIFEST
        .iter()
        .filter(|e| e.kind == EntryKind::AuxiliaryFile)
        .map(|e| e.path)
}

/// Returns `true` if `name` is an accepted install name (exact match).
#[must_use]
pub fn is_allowed(name: &str) -> bool {
    ALLOWED_INSTALL_NAMES.contains(&name)
}

/// A validated install name for the primary module.
///
/// # Examples
///
/// ```
/// use optiscaler_overlay::overlay::manifest::InstallName;
///
/// let name: InstallName = "winmm.dll".parse().unwrap();
/// assert_eq!(name.library_base(), Some("winmm"));
///
/// let asi: InstallName = "OptiScaler.asi".parse().unwrap();
/// assert_eq!(asi.library_base(), None);
///
/// assert!("dinput8.dll".parse::<InstallName>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallName(String);

impl InstallName {
    /// Validate `name` against [`ALLOWED_INSTALL_NAMES`].
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError::InvalidInstallName`] when `name` is not listed.
    pub fn new(name: &str) -> Result<Self, OverlayError> {
        if is_allowed(name) {
            Ok(Self(name.to_string()))
        } else {
            Err(OverlayError::InvalidInstallName {
                name: name.to_string(),
                expected: ALLOWED_INSTALL_NAMES.join(", "),
            })
        }
    }

    /// The file name as given.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the name is a `.dll` resolved through the library loader
    /// (as opposed to an `.asi` loader extension).
    #[must_use]
    pub fn is_library(&self) -> bool {
        self.library_base().is_some()
    }

    /// Library name without the `.dll` extension, as used by override
    /// registries; `None` for non-library names.
    #[must_use]
    pub fn library_base(&self) -> Option<&str> {
        self.0.strip_suffix(".dll")
    }
}

impl FromStr for InstallName {
    type Err = OverlayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for InstallName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
