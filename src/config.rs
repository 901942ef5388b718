// src/config.rs
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::color::{DEFAULT_HUE_STEP, DEFAULT_LIGHTNESS, DEFAULT_SATURATION};
use crate::engine::DEFAULT_START_HUE;
use crate::error::ConfigError;

const APP_DIR: &str = "storymap";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// Degrees the hue advances per pair
    pub hue_step: i64,
    pub saturation: f64,
    pub lightness: f64,
    /// Hue each pass resets to before drawing its first color
    pub start_hue: i64,
    /// Key the hue counter is stored under
    pub counter_key: String,
    /// Counter database; defaults to the user data dir
    pub database: Option<PathBuf>,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            hue_step: DEFAULT_HUE_STEP,
            saturation: DEFAULT_SATURATION,
            lightness: DEFAULT_LIGHTNESS,
            start_hue: DEFAULT_START_HUE,
            counter_key: "hue".to_string(),
            database: None,
        }
    }
}

impl HighlightConfig {
    /// Counter database path, falling back to `<data dir>/storymap/counters.db`
    pub fn database_path(&self) -> Option<PathBuf> {
        self.database
            .clone()
            .or_else(|| dirs::data_dir().map(|p| p.join(APP_DIR).join("counters.db")))
    }
}

/// Get the config directory for the application
pub fn get_config_dir() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|p| p.join(APP_DIR))
        .ok_or(ConfigError::NoConfigDir)
}

pub fn get_config_path() -> Result<PathBuf, ConfigError> {
    get_config_dir().map(|p| p.join("config.toml"))
}

/// Load the config from the user config dir, default if not present
pub fn load_config() -> Result<HighlightConfig, ConfigError> {
    load_config_from(&get_config_path()?)
}

pub fn load_config_from(path: &Path) -> Result<HighlightConfig, ConfigError> {
    if !path.exists() {
        log::debug!("no config at {}, using defaults", path.display());
        return Ok(HighlightConfig::default());
    }

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(toml::from_str(&content)?)
}

pub fn save_config_to(path: &Path, config: &HighlightConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|source| ConfigError::Write {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;

    fs::write(path, content).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_temp_config_path() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("storymap").join("config.toml");
        (temp_dir, config_path)
    }

    #[test]
    fn test_config_default() {
        let config = HighlightConfig::default();
        assert_eq!(config.hue_step, 20);
        assert_eq!(config.saturation, 80.0);
        assert_eq!(config.lightness, 70.0);
        assert_eq!(config.start_hue, -20);
        assert_eq!(config.counter_key, "hue");
        assert!(config.database.is_none());
    }

    #[test]
    fn test_missing_file_gives_default() {
        let (_temp_dir, config_path) = create_temp_config_path();
        let config = load_config_from(&config_path).unwrap();
        assert_eq!(config, HighlightConfig::default());
    }

    #[test]
    fn test_config_roundtrip_file() {
        let (_temp_dir, config_path) = create_temp_config_path();

        let config = HighlightConfig {
            hue_step: 30,
            saturation: 60.0,
            lightness: 50.0,
            start_hue: 0,
            counter_key: "story-hue".to_string(),
            database: Some(PathBuf::from("/tmp/counters.db")),
        };

        save_config_to(&config_path, &config).unwrap();
        let loaded = load_config_from(&config_path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_minimal_toml() {
        let config: HighlightConfig = toml::from_str("hue_step = 45").unwrap();
        assert_eq!(config.hue_step, 45);
        assert_eq!(config.start_hue, -20);
        assert_eq!(config.counter_key, "hue");
    }

    #[test]
    fn test_config_invalid_toml() {
        let (_temp_dir, config_path) = create_temp_config_path();
        fs::create_dir_all(config_path.parent().unwrap()).unwrap();
        fs::write(&config_path, "hue_step = \"wide\"").unwrap();

        assert!(matches!(
            load_config_from(&config_path),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_explicit_database_path_wins() {
        let config = HighlightConfig {
            database: Some(PathBuf::from("/data/hue.db")),
            ..HighlightConfig::default()
        };
        assert_eq!(config.database_path(), Some(PathBuf::from("/data/hue.db")));
    }
}
