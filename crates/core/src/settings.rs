//! Reader settings and their TOML file.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_WPM: u32 = 100;
pub const MAX_WPM: u32 = 1200;
pub const DEFAULT_WPM: u32 = 300;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid settings file: {0}")]
    Parse(String),
}

/// Reading preferences. A session copies them when it starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub wpm: u32,
    pub auto_continue: bool,
    pub stop_before_header: bool,
    pub stop_before_media: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            wpm: DEFAULT_WPM,
            auto_continue: false,
            stop_before_header: true,
            stop_before_media: true,
        }
    }
}

impl Settings {
    pub fn from_toml_str(input: &str) -> Result<Self, SettingsError> {
        let mut settings: Settings =
            toml::from_str(input).map_err(|e| SettingsError::Parse(e.to_string()))?;
        settings.wpm = normalize_wpm(settings.wpm as f64);
        Ok(settings)
    }

    pub fn to_toml_string(&self) -> Result<String, SettingsError> {
        toml::to_string_pretty(self).map_err(|e| SettingsError::Parse(e.to_string()))
    }
}

/// Clamp a words-per-minute value into `[MIN_WPM, MAX_WPM]`, truncating
/// fractions. Non-finite input yields [`DEFAULT_WPM`].
pub fn normalize_wpm(value: f64) -> u32 {
    if !value.is_finite() {
        return DEFAULT_WPM;
    }
    value.trunc().clamp(MIN_WPM as f64, MAX_WPM as f64) as u32
}

/// Read settings from `path`. A missing file yields the defaults.
pub fn load_from_path(path: &Path) -> Result<Settings, SettingsError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Settings::from_toml_str(&contents),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Settings::default()),
        Err(e) => Err(e.into()),
    }
}

/// Write settings to `path`, creating parent directories.
pub fn save_to_path(path: &Path, settings: &Settings) -> Result<(), SettingsError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, settings.to_toml_string()?)?;
    Ok(())
}
