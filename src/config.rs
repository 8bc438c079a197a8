//! Configuration file handling.
//!
//! This module provides loading and saving of reposnap configuration
//! from a TOML file.
//!
//! # Configuration Location
//!
//! The configuration file is stored at:
//! - Linux: `~/.config/reposnap/config.toml`
//! - macOS: `~/Library/Application Support/reposnap/config.toml`
//! - Windows: `%APPDATA%\reposnap\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! api_url = "https://api.github.com"
//! rate_limit_threshold = 10
//! request_timeout_secs = 30
//! user_agent = "reposnap/0.1.0"
//! default_format = "table"
//! default_extensions = ["py", "rs"]
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Application configuration.
///
/// # Example
///
/// ```no_run
/// use reposnap::Config;
///
/// // Load from file (or use defaults if file doesn't exist)
/// let config = Config::load().unwrap();
///
/// println!("API: {}", config.api_url);
/// println!("Rate limit threshold: {}", config.rate_limit_threshold);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the GitHub REST API.
    ///
    /// Default: `https://api.github.com`
    pub api_url: String,

    /// Scans refuse to start (or continue) once the remaining request
    /// quota drops below this number.
    ///
    /// Default: 10
    pub rate_limit_threshold: u64,

    /// Per-request timeout, in seconds.
    ///
    /// Default: 30
    pub request_timeout_secs: u64,

    /// `User-Agent` header sent with every request. GitHub rejects
    /// requests without one.
    pub user_agent: String,

    /// Default output format when no `--format` flag is provided.
    ///
    /// Valid values: "table", "json"
    /// Default: "table"
    pub default_format: String,

    /// Extensions to filter on when no `--ext` flag is provided.
    ///
    /// Default: none (every recognized extension)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_extensions: Option<Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            rate_limit_threshold: 10,
            request_timeout_secs: 30,
            user_agent: format!("reposnap/{}", env!("CARGO_PKG_VERSION")),
            default_format: "table".to_string(),
            default_extensions: None,
        }
    }
}

impl Config {
    /// Loads configuration from the config file.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves the configuration to the config file.
    ///
    /// Creates the parent directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Returns the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("reposnap")
            .join("config.toml")
    }

    /// Generates a string containing the default configuration.
    pub fn generate_default_config() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.api_url, "https://api.github.com");
        assert_eq!(config.rate_limit_threshold, 10);
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.default_format, "table");
        assert!(config.user_agent.starts_with("reposnap/"));
        assert!(config.default_extensions.is_none());
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "rate_limit_threshold = 4000\ndefault_extensions = [\"py\"]\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.rate_limit_threshold, 4000);
        assert_eq!(config.default_extensions, Some(vec!["py".to_string()]));
        assert_eq!(config.api_url, "https://api.github.com");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config {
            api_url: "https://ghe.example.com/api/v3".to_string(),
            default_format: "json".to_string(),
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "rate_limit_threshold = \"many\"").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_generate_default_config_round_trips() {
        let text = Config::generate_default_config();
        assert!(text.contains("rate_limit_threshold = 10"));
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, Config::default());
    }
}
