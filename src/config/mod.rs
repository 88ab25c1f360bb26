//! Configuration: the INI config patcher, override sets and TOML presets.
//!
//! - [`ini`]: lossless INI document model and [`ini::apply_overrides`]
//! - [`overrides`]: [`overrides::OverrideSet`] and [`overrides::Preset`]
//! - [`toml_loader`]: typed TOML loading shared by presets
pub mod ini;
pub mod overrides;
pub mod toml_loader;
