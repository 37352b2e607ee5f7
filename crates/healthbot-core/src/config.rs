use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::client::DEFAULT_BASE_URL;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    pub api_base_url: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self { api_base_url: None }
    }

    /// Resolve the backend base URL: env var first, then config file, then
    /// the built-in default.
    pub fn base_url(&self) -> String {
        std::env::var("HEALTHBOT_API_URL")
            .ok()
            .or_else(|| self.api_base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(&config_path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;

        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(&config_path, config_content)?;
        Ok(())
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("healthbot").join("config.json"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_base_url() {
        let config = Config::new();
        if std::env::var("HEALTHBOT_API_URL").is_err() {
            assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        }
    }

    #[test]
    fn test_configured_base_url_wins_over_default() {
        if std::env::var("HEALTHBOT_API_URL").is_ok() {
            return;
        }
        let config = Config {
            api_base_url: Some("http://10.0.0.5:8000/api/health".to_string()),
        };
        assert_eq!(config.base_url(), "http://10.0.0.5:8000/api/health");
    }
}
