//! Order-preserving INI document model and the config patcher.
//!
//! The document keeps every line it does not understand as data (comments,
//! blank lines) verbatim, so writing an unmodified document reproduces the
//! input byte for byte.  Values are opaque strings; nothing is interpreted.
use anyhow::{Context as _, Result};
use std::fmt;
use std::path::Path;

use super::overrides::OverrideSet;
use crate::error::ConfigError;

/// A key-value section as plain data, in file order.
///
/// # Examples
///
/// ```
/// use optiscaler_overlay::config::ini::KvSection;
///
/// let section = KvSection {
///     header: "Upscalers".to_string(),
///     entries: vec![("Dx12Upscaler".to_string(), "xess".to_string())],
/// };
/// assert_eq!(section.header, "Upscalers");
/// assert_eq!(section.entries[0].1, "xess");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvSection {
    /// Section name as written between the brackets.
    pub header: String,
    /// Key-value entries within this section.
    pub entries: Vec<(String, String)>,
}

/// A `key = value` line.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    /// Trimmed key, original spelling.
    key: String,
    /// Everything up to and including the whitespace after `=`.
    lead: String,
    /// Trimmed value.
    value: String,
    /// The original line, dropped once the value is replaced.
    raw: Option<String>,
}

impl Entry {
    fn render(&self) -> String {
        self.raw
            .clone()
            .unwrap_or_else(|| format!("{}{}", self.lead, self.value))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Entry(Entry),
    Verbatim(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Section {
    name: String,
    header: String,
    lines: Vec<Line>,
}

/// A parsed INI file that round-trips losslessly.
///
/// # Examples
///
/// ```
/// use optiscaler_overlay::config::ini::IniDocument;
///
/// let mut doc = IniDocument::parse("[Upscalers]\n; comment\nDx12Upscaler=auto\n").unwrap();
/// doc.set("Upscalers", "Dx12Upscaler", "xess");
/// doc.set("Spoofing", "SpoofHAGS", "true");
/// assert_eq!(doc.get("Upscalers", "dx12upscaler"), Some("xess"));
/// assert_eq!(
///     doc.to_string(),
///     "[Upscalers]\n; comment\nDx12Upscaler=xess\n\n[Spoofing]\nSpoofHAGS=true\n"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IniDocument {
    bom: bool,
    newline: &'static str,
    trailing_newline: bool,
    preamble: Vec<String>,
    sections: Vec<Section>,
}

impl IniDocument {
    /// Parse INI content from a string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSyntax`] if a key-value pair appears
    /// outside a section, a line inside a section is neither a comment nor a
    /// `key = value` pair, or a section header is empty.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Self::parse_named(content, "<input>")
    }

    /// Read and parse the INI file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if the file does not exist, or an
    /// I/O or syntax error otherwise.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse_named(&content, &path.display().to_string())
    }

    fn parse_named(content: &str, file: &str) -> Result<Self, ConfigError> {
        let (bom, body) = content
            .strip_prefix('\u{feff}')
            .map_or((false, content), |rest| (true, rest));
        let mut doc = Self {
            bom,
            newline: if body.contains("\r\n") { "\r\n" } else { "\n" },
            trailing_newline: body.is_empty() || body.ends_with('\n'),
            preamble: Vec::new(),
            sections: Vec::new(),
        };
        let syntax = |line: usize, message: &str| ConfigError::InvalidSyntax {
            file: file.to_string(),
            line,
            message: message.to_string(),
        };

        for (idx, line) in body.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with(';') || trimmed.starts_with('#') {
                match doc.sections.last_mut() {
                    Some(section) => section.lines.push(Line::Verbatim(line.to_string())),
                    None => doc.preamble.push(line.to_string()),
                }
                continue;
            }

            if let Some(inner) = trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
                let name = inner.trim();
                if name.is_empty() {
                    return Err(syntax(idx + 1, "empty section header"));
                }
                doc.sections.push(Section {
                    name: name.to_string(),
                    header: line.to_string(),
                    lines: Vec::new(),
                });
                continue;
            }

            let Some(section) = doc.sections.last_mut() else {
                return Err(syntax(idx + 1, "entry outside of section"));
            };
            let entry = parse_entry(line).ok_or_else(|| syntax(idx + 1, "expected key=value"))?;
            section.lines.push(Line::Entry(entry));
        }

        Ok(doc)
    }

    /// Look up `key` in `section`.
    ///
    /// Section names match exactly; keys match ASCII case-insensitively.
    #[must_use]
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section)?
            .lines
            .iter()
            .find_map(|line| match line {
                Line::Entry(e) if e.key.eq_ignore_ascii_case(key) => Some(e.value.as_str()),
                _ => None,
            })
    }

    /// Set `key` to `value` in `section`, creating either as needed.
    ///
    /// An existing key keeps its spelling and delimiter spacing.  A new key
    /// is inserted after the last entry of the section as `key=value`; a new
    /// section is appended at the end of the document.
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        let pos = if let Some(pos) = self.sections.iter().position(|s| s.name == section) {
            pos
        } else {
            self.push_section(section);
            self.sections.len() - 1
        };
        let Some(target) = self.sections.get_mut(pos) else {
            return;
        };

        for line in &mut target.lines {
            if let Line::Entry(e) = line
                && e.key.eq_ignore_ascii_case(key)
            {
                if e.value != value {
                    e.value = value.to_string();
                    e.raw = None;
                }
                return;
            }
        }

        let insert_at = target
            .lines
            .iter()
            .rposition(|l| matches!(l, Line::Entry(_)))
            .map_or(0, |i| i + 1);
        target.lines.insert(
            insert_at,
            Line::Entry(Entry {
                key: key.to_string(),
                lead: format!("{key}="),
                value: value.to_string(),
                raw: None,
            }),
        );
    }

    /// Apply every override in `overrides`, in order.
    pub fn merge(&mut self, overrides: &OverrideSet) {
        for (section, entries) in overrides.iter() {
            if entries.is_empty() && self.section(section).is_none() {
                self.push_section(section);
            }
            for (key, value) in entries {
                self.set(section, key, value);
            }
        }
    }

    /// Return the document's sections and entries as plain data.
    #[must_use]
    pub fn kv_sections(&self) -> Vec<KvSection> {
        self.sections
            .iter()
            .map(|s| KvSection {
                header: s.name.clone(),
                entries: s
                    .lines
                    .iter()
                    .filter_map(|l| match l {
                        Line::Entry(e) => Some((e.key.clone(), e.value.clone())),
                        Line::Verbatim(_) => None,
                    })
                    .collect(),
            })
            .collect()
    }

    fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    fn push_section(&mut self, name: &str) {
        if let Some(prev) = self.sections.last_mut() {
            let ends_blank =
                matches!(prev.lines.last(), Some(Line::Verbatim(v)) if v.trim().is_empty());
            if !ends_blank {
                prev.lines.push(Line::Verbatim(String::new()));
            }
        }
        self.sections.push(Section {
            name: name.to_string(),
            header: format!("[{name}]"),
            lines: Vec::new(),
        });
        self.trailing_newline = true;
    }
}

impl fmt::Display for IniDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines: Vec<String> = self.preamble.clone();
        for section in &self.sections {
            lines.push(section.header.clone());
            lines.extend(section.lines.iter().map(|l| match l {
                Line::Entry(e) => e.render(),
                Line::Verbatim(v) => v.clone(),
            }));
        }
        if self.bom {
            f.write_str("\u{feff}")?;
        }
        f.write_str(&lines.join(self.newline))?;
        if self.trailing_newline && !lines.is_empty() {
            f.write_str(self.newline)?;
        }
        Ok(())
    }
}

/// Split a `key = value` line, keeping the key and delimiter spacing.
fn parse_entry(line: &str) -> Option<Entry> {
    let eq = line.find('=')?;
    let (before, after) = line.split_at(eq);
    let key = before.trim();
    if key.is_empty() {
        return None;
    }
    let after_eq = after.get(1..).unwrap_or_default();
    let value = after_eq.trim();
    let gap = after_eq.len() - after_eq.trim_start().len();
    let lead_len = eq + 1 + gap;
    Some(Entry {
        key: key.to_string(),
        lead: line.get(..lead_len).unwrap_or(line).to_string(),
        value: value.to_string(),
        raw: Some(line.to_string()),
    })
}

/// Merge `overrides` into the INI file at `path` and write it back.
///
/// Sections and keys not named by `overrides` are preserved, as are comments
/// and ordering.  An empty override set is a successful no-op rewrite.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidOverride`] without touching the file if an
/// override holds a line break, [`ConfigError::NotFound`] if `path` does not
/// exist, or an error if the file cannot be parsed or written.
pub fn apply_overrides(path: &Path, overrides: &OverrideSet) -> Result<()> {
    overrides.validate()?;
    let mut doc = IniDocument::load(path)?;
    doc.merge(overrides);
    std::fs::write(path, doc.to_string())
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
; OptiScaler configuration
[Upscalers]
; Dx11Upscaler: fsr22, xess, dlss
Dx11Upscaler=auto
Dx12Upscaler = auto

[Upscale]
UpscaleRatio = 0.77
";

    #[test]
    fn unmodified_document_round_trips_exactly() {
        let doc = IniDocument::parse(SAMPLE).unwrap();
        assert_eq!(doc.to_string(), SAMPLE);
    }

    #[test]
    fn crlf_and_bom_round_trip() {
        let content = "\u{feff}[A]\r\nk = v\r\n";
        let doc = IniDocument::parse(content).unwrap();
        assert_eq!(doc.to_string(), content);
    }

    #[test]
    fn missing_trailing_newline_is_preserved() {
        let content = "[A]\nk=v";
        assert_eq!(IniDocument::parse(content).unwrap().to_string(), content);
    }

    #[test]
    fn get_matches_keys_case_insensitively() {
        let doc = IniDocument::parse(SAMPLE).unwrap();
        assert_eq!(doc.get("Upscalers", "dx12upscaler"), Some("auto"));
        assert_eq!(doc.get("upscalers", "Dx12Upscaler"), None);
        assert_eq!(doc.get("Upscale", "UpscaleRatio"), Some("0.77"));
    }

    #[test]
    fn set_existing_key_keeps_spelling_and_spacing() {
        let mut doc = IniDocument::parse(SAMPLE).unwrap();
        doc.set("Upscalers", "DX12UPSCALER", "xess");
        let out = doc.to_string();
        assert!(out.contains("Dx12Upscaler = xess\n"), "got:\n{out}");
        assert!(out.contains("; Dx11Upscaler: fsr22, xess, dlss\n"));
    }

    #[test]
    fn set_new_key_goes_after_last_entry() {
        let mut doc = IniDocument::parse(SAMPLE).unwrap();
        doc.set("Upscalers", "VulkanUpscaler", "fsr21");
        let out = doc.to_string();
        assert!(
            out.contains("Dx12Upscaler = auto\nVulkanUpscaler=fsr21\n\n[Upscale]"),
            "got:\n{out}"
        );
    }

    #[test]
    fn set_new_section_is_appended() {
        let mut doc = IniDocument::parse(SAMPLE).unwrap();
        doc.set("Spoofing", "SpoofHAGS", "true");
        assert!(doc.to_string().ends_with("UpscaleRatio = 0.77\n\n[Spoofing]\nSpoofHAGS=true\n"));
    }

    #[test]
    fn set_on_empty_document() {
        let mut doc = IniDocument::parse("").unwrap();
        doc.set("FrameGen", "Enabled", "true");
        assert_eq!(doc.to_string(), "[FrameGen]\nEnabled=true\n");
    }

    #[test]
    fn entry_outside_section_fails() {
        let err = IniDocument::parse("orphan=1\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSyntax { line: 1, .. }));
    }

    #[test]
    fn line_without_delimiter_fails() {
        let err = IniDocument::parse("[A]\njunk\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSyntax { line: 2, .. }));
    }

    #[test]
    fn empty_header_fails() {
        assert!(IniDocument::parse("[ ]\n").is_err());
    }

    #[test]
    fn value_may_contain_equals() {
        let doc = IniDocument::parse("[A]\nkey = val=ue\n").unwrap();
        assert_eq!(doc.get("A", "key"), Some("val=ue"));
    }

    #[test]
    fn kv_sections_exposes_entries_in_order() {
        let doc = IniDocument::parse(SAMPLE).unwrap();
        let sections = doc.kv_sections();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].header, "Upscalers");
        assert_eq!(
            sections[0].entries,
            vec![
                ("Dx11Upscaler".to_string(), "auto".to_string()),
                ("Dx12Upscaler".to_string(), "auto".to_string()),
            ]
        );
    }

    // -----------------------------------------------------------------------
    // apply_overrides
    // -----------------------------------------------------------------------

    #[test]
    fn apply_overrides_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let overrides = OverrideSet::from_iter([("Section", "Key", "value")]);
        let err = apply_overrides(&dir.path().join("nonexistent.ini"), &overrides).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn apply_overrides_rejects_multiline_value_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("OptiScaler.ini");
        std::fs::write(&path, "[A]\nk=v\n").unwrap();
        let overrides = OverrideSet::from_iter([("A", "k", "x\ny")]);

        let err = apply_overrides(&path, &overrides).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::InvalidOverride(_))
        ));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[A]\nk=v\n");
        assert_eq!(IniDocument::load(&path).unwrap().get("A", "k"), Some("v"));
    }

    #[test]
    fn apply_overrides_empty_set_is_semantic_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("OptiScaler.ini");
        std::fs::write(&path, SAMPLE).unwrap();
        let before = IniDocument::load(&path).unwrap().kv_sections();

        apply_overrides(&path, &OverrideSet::default()).unwrap();

        let after = IniDocument::load(&path).unwrap().kv_sections();
        assert_eq!(before, after);
    }

    #[test]
    fn apply_overrides_new_and_existing_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("OptiScaler.ini");
        std::fs::write(&path, "[Upscaler]\nUpscaleRatio = 0.77\n").unwrap();

        let overrides = OverrideSet::from_iter([
            ("Spoofing", "SpoofHAGS", "true"),
            ("FrameGeneration", "Enabled", "true"),
            ("Upscaler", "Mode", "quality"),
        ]);
        apply_overrides(&path, &overrides).unwrap();

        let doc = IniDocument::load(&path).unwrap();
        assert_eq!(doc.get("Spoofing", "SpoofHAGS"), Some("true"));
        assert_eq!(doc.get("FrameGeneration", "Enabled"), Some("true"));
        assert_eq!(doc.get("Upscaler", "Mode"), Some("quality"));
        assert_eq!(doc.get("Upscaler", "UpscaleRatio"), Some("0.77"));
    }
}
