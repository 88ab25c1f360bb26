//! Override sets (section → key → value) and TOML install presets.
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use super::toml_loader;
use crate::error::ConfigError;

/// Configuration keys to force after the canonical config file is copied.
///
/// Values are opaque strings.  Iteration order is sorted by section, then
/// key, so the patched file is deterministic.
///
/// # Examples
///
/// ```
/// use optiscaler_overlay::config::overrides::OverrideSet;
///
/// let mut set = OverrideSet::default();
/// set.insert("Spoofing", "SpoofHAGS", "true");
/// assert_eq!(set.get("Spoofing", "SpoofHAGS"), Some("true"));
/// assert_eq!(set.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideSet(BTreeMap<String, BTreeMap<String, String>>);

impl OverrideSet {
    /// Set `section.key = value`, replacing any previous value.
    pub fn insert(
        &mut self,
        section: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.0
            .entry(section.into())
            .or_default()
            .insert(key.into(), value.into());
    }

    /// Look up a single override.
    #[must_use]
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.0.get(section)?.get(key).map(String::as_str)
    }

    /// Iterate over sections and their key/value maps.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeMap<String, String>)> {
        self.0.iter()
    }

    /// Total number of key assignments across all sections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    /// Returns `true` if no section is named.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merge `other` into `self`; values from `other` win.
    pub fn extend(&mut self, other: Self) {
        for (section, entries) in other.0 {
            self.0.entry(section).or_default().extend(entries);
        }
    }

    /// Check that every section, key and value fits on one INI line.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOverride`] for the first entry holding a
    /// line break.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (section, entries) in &self.0 {
            for (key, value) in entries {
                ensure_single_line(section, key, value)?;
            }
        }
        Ok(())
    }

    /// Build a set from `Section.Key=Value` assignments.
    ///
    /// # Examples
    ///
    /// ```
    /// use optiscaler_overlay::config::overrides::OverrideSet;
    ///
    /// let set = OverrideSet::from_assignments(["FrameGen.Enabled=true"]).unwrap();
    /// assert_eq!(set.get("FrameGen", "Enabled"), Some("true"));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOverride`] for the first malformed assignment.
    pub fn from_assignments<I, S>(assignments: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for assignment in assignments {
            let (section, key, value) = parse_assignment(assignment.as_ref())?;
            set.insert(section, key, value);
        }
        Ok(set)
    }
}

impl<S, K, V> FromIterator<(S, K, V)> for OverrideSet
where
    S: Into<String>,
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (S, K, V)>>(iter: T) -> Self {
        let mut set = Self::default();
        for (section, key, value) in iter {
            set.insert(section, key, value);
        }
        set
    }
}

/// Split `Section.Key=Value` into its three parts.
///
/// The section ends at the first `.` and the key at the first `=`; the value
/// is taken verbatim and may be empty.
fn parse_assignment(assignment: &str) -> Result<(&str, &str, &str), ConfigError> {
    let invalid = || ConfigError::InvalidOverride(assignment.to_string());
    let (path, value) = assignment.split_once('=').ok_or_else(invalid)?;
    let (section, key) = path.split_once('.').ok_or_else(invalid)?;
    let (section, key) = (section.trim(), key.trim());
    if section.is_empty() || key.is_empty() {
        return Err(invalid());
    }
    ensure_single_line(section, key, value)?;
    Ok((section, key, value))
}

/// Reject line breaks, which would split the entry when written out.
fn ensure_single_line(section: &str, key: &str, value: &str) -> Result<(), ConfigError> {
    let breaks = |s: &str| s.contains(['\r', '\n']);
    if breaks(section) || breaks(key) || breaks(value) {
        return Err(ConfigError::InvalidOverride(format!(
            "{}.{}={}",
            section.escape_debug(),
            key.escape_debug(),
            value.escape_debug()
        )));
    }
    Ok(())
}

/// An install preset loaded from a TOML file.
///
/// ```toml
/// dll_name = "winmm.dll"
///
/// [ini.Spoofing]
/// SpoofHAGS = true
///
/// [ini.Upscalers]
/// Dx12Upscaler = "xess"
/// ```
///
/// Scalar values (strings, integers, floats, booleans) are stored as their
/// string form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preset {
    /// Install name for the primary module, if the preset pins one.
    pub dll_name: Option<String>,
    /// Config overrides to apply after copying the canonical config file.
    pub overrides: OverrideSet,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPreset {
    dll_name: Option<String>,
    #[serde(default)]
    ini: BTreeMap<String, BTreeMap<String, toml::Value>>,
}

impl Preset {
    /// Load a preset from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// holds a non-scalar override value.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw: RawPreset = toml_loader::load_config(path)?;
        let mut overrides = OverrideSet::default();
        for (section, entries) in raw.ini {
            for (key, value) in entries {
                let text = match value {
                    toml::Value::String(s) => s,
                    toml::Value::Integer(i) => i.to_string(),
                    toml::Value::Float(f) => f.to_string(),
                    toml::Value::Boolean(b) => b.to_string(),
                    other => {
                        return Err(ConfigError::InvalidPreset {
                            path: path.display().to_string(),
                            message: format!(
                                "ini.{section}.{key}: expected a scalar, found {}",
                                other.type_str()
                            ),
                        });
                    }
                };
                ensure_single_line(&section, &key, &text)?;
                overrides.insert(section.clone(), key, text);
            }
        }
        Ok(Self {
            dll_name: raw.dll_name,
            overrides,
        })
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::test_helpers::write_temp_toml;

    #[test]
    fn parse_assignment_splits_parts() {
        assert_eq!(
            parse_assignment("Spoofing.SpoofHAGS=true").unwrap(),
            ("Spoofing", "SpoofHAGS", "true")
        );
    }

    #[test]
    fn parse_assignment_keeps_equals_in_value() {
        assert_eq!(
            parse_assignment("Log.Path=a=b").unwrap(),
            ("Log", "Path", "a=b")
        );
    }

    #[test]
    fn parse_assignment_allows_empty_value() {
        assert_eq!(parse_assignment("A.B=").unwrap(), ("A", "B", ""));
    }

    #[test]
    fn parse_assignment_rejects_malformed() {
        for bad in ["nodot=1", "Section.Key", ".Key=1", "Section.=1", ""] {
            assert!(
                matches!(parse_assignment(bad), Err(ConfigError::InvalidOverride(_))),
                "expected rejection for {bad:?}"
            );
        }
    }

    #[test]
    fn parse_assignment_rejects_line_breaks() {
        for bad in ["A.k=x\ny", "A.k=x\r\n", "A\nB.k=1"] {
            assert!(
                matches!(parse_assignment(bad), Err(ConfigError::InvalidOverride(_))),
                "expected rejection for {bad:?}"
            );
        }
    }

    #[test]
    fn validate_reports_escaped_entry() {
        let set = OverrideSet::from_iter([("A", "ok", "1"), ("A", "k", "x\ny")]);
        let err = set.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOverride(_)));
        assert!(err.to_string().contains(r"A.k=x\ny"), "{err}");
    }

    #[test]
    fn extend_prefers_other() {
        let mut base = OverrideSet::from_iter([("A", "x", "1"), ("A", "y", "2")]);
        base.extend(OverrideSet::from_iter([("A", "y", "3"), ("B", "z", "4")]));
        assert_eq!(base.get("A", "x"), Some("1"));
        assert_eq!(base.get("A", "y"), Some("3"));
        assert_eq!(base.get("B", "z"), Some("4"));
        assert_eq!(base.len(), 3);
    }

    #[test]
    fn preset_load_stringifies_scalars() {
        let (_dir, path) = write_temp_toml(
            r#"dll_name = "winmm.dll"

[ini.Spoofing]
SpoofHAGS = true

[ini.Upscale]
UpscaleRatio = 0.77
Mode = "quality"
Sharpness = 3
"#,
        );
        let preset = Preset::load(&path).unwrap();
        assert_eq!(preset.dll_name.as_deref(), Some("winmm.dll"));
        assert_eq!(preset.overrides.get("Spoofing", "SpoofHAGS"), Some("true"));
        assert_eq!(preset.overrides.get("Upscale", "UpscaleRatio"), Some("0.77"));
        assert_eq!(preset.overrides.get("Upscale", "Mode"), Some("quality"));
        assert_eq!(preset.overrides.get("Upscale", "Sharpness"), Some("3"));
    }

    #[test]
    fn preset_without_ini_table_is_empty() {
        let (_dir, path) = write_temp_toml("dll_name = \"dxgi.dll\"\n");
        let preset = Preset::load(&path).unwrap();
        assert!(preset.overrides.is_empty());
    }

    #[test]
    fn preset_rejects_nested_values() {
        let (_dir, path) = write_temp_toml("[ini.A]\nlist = [1, 2]\n");
        let err = Preset::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPreset { .. }), "{err}");
    }

    #[test]
    fn preset_rejects_multiline_values() {
        let (_dir, path) = write_temp_toml("[ini.A]\nk = \"x\\ny\"\n");
        assert!(matches!(
            Preset::load(&path),
            Err(ConfigError::InvalidOverride(_))
        ));
    }

    #[test]
    fn preset_rejects_unknown_fields() {
        let (_dir, path) = write_temp_toml("dll = \"dxgi.dll\"\n");
        assert!(matches!(
            Preset::load(&path),
            Err(ConfigError::InvalidPreset { .. })
        ));
    }

    #[test]
    fn preset_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Preset::load(&dir.path().join("missing.toml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
