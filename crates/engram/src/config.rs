//! Settings file location and command-line overrides.

use std::path::PathBuf;

use engram_core::settings::{self, normalize_wpm, Settings};

use crate::prelude::*;

const APP_DIR: &str = "engram";
const SETTINGS_FILE: &str = "settings.toml";

/// Reader flags shared by `read` and `settings`.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct SettingsArgs {
    /// Reading speed in words per minute (100-1200)
    #[arg(long, env = "ENGRAM_WPM")]
    pub wpm: Option<u32>,

    /// Keep reading into the following pages when the selection ends
    #[arg(long)]
    pub auto_continue: bool,

    /// Do not pause before headings
    #[arg(long)]
    pub no_header_stops: bool,

    /// Do not pause before lists, tables, code and images
    #[arg(long)]
    pub no_media_stops: bool,
}

impl SettingsArgs {
    /// Layer the flags over `settings`. Flags only ever switch features on
    /// or off relative to the file.
    pub fn apply(&self, mut settings: Settings) -> Settings {
        if let Some(wpm) = self.wpm {
            settings.wpm = normalize_wpm(wpm as f64);
        }
        if self.auto_continue {
            settings.auto_continue = true;
        }
        if self.no_header_stops {
            settings.stop_before_header = false;
        }
        if self.no_media_stops {
            settings.stop_before_media = false;
        }
        settings
    }
}

/// `--config`, or `settings.toml` under the user config directory.
pub fn settings_path(global: &crate::Global) -> Result<PathBuf> {
    if let Some(path) = &global.config {
        return Ok(path.clone());
    }
    let dir = dirs_next::config_dir()
        .ok_or_else(|| Error::Config("could not determine the config directory".into()))?;
    Ok(dir.join(APP_DIR).join(SETTINGS_FILE))
}

/// Load the settings file and apply command-line overrides.
pub fn load_settings(global: &crate::Global, args: &SettingsArgs) -> Result<Settings> {
    let path = settings_path(global)?;
    log::debug!("loading settings from {}", path.display());
    let file = settings::load_from_path(&path).map_err(|e| Error::Config(e.to_string()))?;
    Ok(args.apply(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn global_with(path: PathBuf) -> crate::Global {
        crate::Global {
            config: Some(path),
            verbose: false,
        }
    }

    #[test]
    fn test_flags_override_file() {
        let args = SettingsArgs {
            wpm: Some(5_000),
            auto_continue: true,
            no_header_stops: true,
            no_media_stops: false,
        };
        let s = args.apply(Settings::default());
        assert_eq!(s.wpm, 1200);
        assert!(s.auto_continue);
        assert!(!s.stop_before_header);
        assert!(s.stop_before_media);
    }

    #[test]
    fn test_no_flags_keep_file_values() {
        let file = Settings {
            wpm: 420,
            auto_continue: true,
            ..Settings::default()
        };
        assert_eq!(SettingsArgs::default().apply(file.clone()), file);
    }

    #[test]
    fn test_explicit_config_path_wins() {
        let path = PathBuf::from("/tmp/engram-test/settings.toml");
        assert_eq!(settings_path(&global_with(path.clone())).unwrap(), path);
    }

    #[test]
    fn test_load_settings_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "wpm = 480\nstop_before_header = false\n").unwrap();

        let s = load_settings(&global_with(path), &SettingsArgs::default()).unwrap();
        assert_eq!(s.wpm, 480);
        assert!(!s.stop_before_header);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "wpm = [1, 2]").unwrap();

        let err = load_settings(&global_with(path), &SettingsArgs::default()).unwrap_err();
        assert!(err.to_string().starts_with("Configuration error"));
    }
}
