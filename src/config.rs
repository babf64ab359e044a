//! Configuration management for sysprobe
//!
//! Config file location:
//! - Linux: ~/.config/sysprobe/config.toml
//! - macOS: ~/Library/Application Support/com.sysprobe.sysprobe/config.toml
//! - Windows: %APPDATA%/sysprobe/sysprobe/config/config.toml
//!
//! You can override the config location by setting `SYSPROBE_CONFIG_PATH`.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::report::{ReportFormatter, DEFAULT_PLACEHOLDER};

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "SYSPROBE_CONFIG_PATH";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Report output settings
    #[serde(default)]
    pub report: ReportConfig,

    /// Logging settings
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from file or fall back to defaults
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a specific file; a missing file means defaults
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

            let config: Config = toml::from_str(&content).with_context(|| {
                format!("Failed to parse config from {}", config_path.display())
            })?;

            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration, using the defaults when the file cannot be read
    /// or parsed. The error is handed back so the caller can report it.
    pub fn load_or_default() -> (Self, Option<anyhow::Error>) {
        match Self::config_path() {
            Ok(path) => Self::load_from_or_default(&path),
            Err(err) => (Self::default(), Some(err)),
        }
    }

    /// Like [`Config::load_or_default`] for a specific file
    pub fn load_from_or_default(config_path: &Path) -> (Self, Option<anyhow::Error>) {
        match Self::load_from(config_path) {
            Ok(config) => (config, None),
            Err(err) => (Self::default(), Some(err)),
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(config_path, toml)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Ok(PathBuf::from(trimmed));
            }
        }

        let proj_dirs = ProjectDirs::from("com", "sysprobe", "sysprobe")
            .context("Could not determine project directories")?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Load config and write the defaults if no file exists yet
    pub fn init() -> Result<Self> {
        Self::init_at(&Self::config_path()?)
    }

    /// Like [`Config::init`] for a specific file. An existing file is never
    /// overwritten, even when it does not parse.
    pub fn init_at(config_path: &Path) -> Result<Self> {
        let (config, _) = Self::load_from_or_default(config_path);

        if !config_path.exists() {
            config.save_to(config_path)?;
        }

        Ok(config)
    }

    /// Formatter configured from `[report]`
    pub fn formatter(&self) -> ReportFormatter {
        ReportFormatter::new(&self.report.placeholder)
    }
}

/// Output format of the report command
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Report configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportConfig {
    /// Text shown for fields that could not be read
    #[serde(default = "default_placeholder")]
    pub placeholder: String,

    /// Default output format
    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            placeholder: default_placeholder(),
            format: OutputFormat::default(),
        }
    }
}

fn default_placeholder() -> String {
    DEFAULT_PLACEHOLDER.to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogConfig {
    /// Default tracing filter when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Get configuration file path for display purposes
pub fn get_config_path() -> Result<String> {
    let path = Config::config_path()?;
    Ok(path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.report.placeholder, "N/A");
        assert_eq!(config.report.format, OutputFormat::Text);
        assert_eq!(config.log.level, "warn");
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml = toml::to_string(&config).unwrap();

        assert!(toml.contains("[report]"));
        assert!(toml.contains("placeholder"));
        assert!(toml.contains("format = \"text\""));
        assert!(toml.contains("[log]"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str("[report]\nformat = \"json\"\n").unwrap();
        assert_eq!(config.report.format, OutputFormat::Json);
        assert_eq!(config.report.placeholder, "N/A");
        assert_eq!(config.log.level, "warn");
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.report.placeholder = "unknown".to_string();
        config.log.level = "debug".to_string();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.formatter().placeholder(), "unknown");
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let loaded = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn test_invalid_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[report\nplaceholder = ").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_invalid_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[report\nplaceholder = ").unwrap();

        let (config, err) = Config::load_from_or_default(&path);
        assert_eq!(config, Config::default());
        assert_eq!(config.formatter().placeholder(), "N/A");

        let err = err.expect("parse error should be reported");
        assert!(format!("{:#}", err).contains("Failed to parse config"));
    }

    #[test]
    fn test_init_keeps_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[report\nplaceholder = ").unwrap();

        let config = Config::init_at(&path).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(fs::read_to_string(&path).unwrap(), "[report\nplaceholder = ");
    }

    #[test]
    fn test_init_writes_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sysprobe").join("config.toml");

        let config = Config::init_at(&path).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());
    }

    // Only test touching the process environment, so no other test races it
    #[test]
    fn test_config_path_env_override() {
        let dir = TempDir::new().unwrap();
        let custom = dir.path().join("custom.toml");

        std::env::set_var(CONFIG_PATH_ENV, &custom);
        let overridden = Config::config_path();

        std::env::set_var(CONFIG_PATH_ENV, "   ");
        let blank = Config::config_path();

        std::env::remove_var(CONFIG_PATH_ENV);
        let default = Config::config_path();

        assert_eq!(overridden.unwrap(), custom);
        if let Ok(default) = default {
            assert_eq!(blank.unwrap(), default);
            assert_ne!(default, custom);
        } else {
            assert!(blank.is_err());
        }
    }
}
