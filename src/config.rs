use directories::ProjectDirs;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

use crate::richtext::structured_editor::DEFAULT_FONT_SIZE;

/// Application configuration, loaded from the platform config directory.
/// Missing or malformed files fall back to defaults.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where note records live; defaults to the platform data directory
    pub notes_dir: Option<PathBuf>,
    /// Debounce window for the autosave flush, in milliseconds
    pub autosave_debounce_ms: i64,
    /// Font size used when no explicit size is set, in pixels
    pub default_font_size: u8,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            notes_dir: None,
            autosave_debounce_ms: crate::autosave::DEFAULT_DEBOUNCE_MS,
            default_font_size: DEFAULT_FONT_SIZE,
        }
    }
}

impl Config {
    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            if path.exists() {
                if let Ok(contents) = fs::read_to_string(&path) {
                    if let Ok(config) = toml::from_str::<Config>(&contents) {
                        return config;
                    }
                }
            }
        }
        Config::default()
    }

    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "inkdown").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// The resolved notes directory
    pub fn notes_dir(&self) -> PathBuf {
        if let Some(dir) = &self.notes_dir {
            return dir.clone();
        }
        ProjectDirs::from("", "", "inkdown")
            .map(|dirs| dirs.data_dir().join("notes"))
            .unwrap_or_else(|| PathBuf::from(".inkdown/notes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.autosave_debounce_ms, 1000);
        assert_eq!(config.default_font_size, 16);
        assert!(config.notes_dir.is_none());
    }

    #[test]
    fn test_parse_partial_config() {
        let config: Config = toml::from_str("autosave_debounce_ms = 250").unwrap();
        assert_eq!(config.autosave_debounce_ms, 250);
        assert_eq!(config.default_font_size, 16);
    }

    #[test]
    fn test_explicit_notes_dir_wins() {
        let config: Config = toml::from_str("notes_dir = \"/tmp/notes\"").unwrap();
        assert_eq!(config.notes_dir(), PathBuf::from("/tmp/notes"));
    }
}
