//! TOML file loading with typed errors.
use serde::de::DeserializeOwned;
use std::path::Path;

use crate::error::ConfigError;

/// Read and deserialize the TOML file at `path`.
///
/// Unlike the INI side, a missing file is an error here: presets are only
/// loaded when the user names one explicitly.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read and
/// [`ConfigError::InvalidPreset`] if it does not deserialize into `T`.
pub fn load_config<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;

    toml::from_str(&content).map_err(|e| ConfigError::InvalidPreset {
        path: path.display().to_string(),
        message: e.message().to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::test_helpers::write_temp_toml;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Sample {
        name: String,
    }

    #[test]
    fn load_valid_file() {
        let (_dir, path) = write_temp_toml("name = \"dxgi\"\n");
        let sample: Sample = load_config(&path).unwrap();
        assert_eq!(sample.name, "dxgi");
    }

    #[test]
    fn load_invalid_toml_reports_path() {
        let (_dir, path) = write_temp_toml("name = \n");
        let err = load_config::<Sample>(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPreset { .. }));
        assert!(err.to_string().contains("preset.toml"), "{err}");
    }
}
