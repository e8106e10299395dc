use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::ai::ollama::DEFAULT_OLLAMA_URL;
use crate::provider::Provider;

pub const DEFAULT_AUTOSAVE_DEBOUNCE_MS: u64 = 1000;
pub const DEFAULT_INTERVENTION_INTERVAL_SECS: u64 = 45;

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub provider: Option<String>,
    pub default_model: Option<String>,
    pub claude_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub ollama_url: Option<String>,
    pub autosave_debounce_ms: Option<u64>,
    pub intervention_interval_secs: Option<u64>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            provider: Some(Provider::Ollama.as_str().to_string()),
            ..Default::default()
        }
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    /// Load the config, writing the defaults on first run so there is a file to edit
    pub fn load_or_create() -> Result<Self> {
        Self::load_or_create_at(&Self::get_config_path()?)
    }

    pub fn load_or_create_at(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            return Self::load_from(config_path);
        }
        let config = Self::new();
        config.save_to(config_path)?;
        tracing::info!(path = %config_path.display(), "Wrote default config");
        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, config_content)?;
        Ok(())
    }

    pub fn provider(&self) -> Provider {
        self.provider
            .as_deref()
            .and_then(Provider::from_str)
            .unwrap_or(Provider::Ollama)
    }

    pub fn ollama_url(&self) -> String {
        std::env::var("OLLAMA_HOST").ok()
            .or_else(|| self.ollama_url.clone())
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string())
    }

    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms.unwrap_or(DEFAULT_AUTOSAVE_DEBOUNCE_MS))
    }

    pub fn intervention_interval(&self) -> Duration {
        Duration::from_secs(
            self.intervention_interval_secs
                .unwrap_or(DEFAULT_INTERVENTION_INTERVAL_SECS)
                .max(5),
        )
    }

    /// Directory holding the session database and log file
    pub fn data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow!("Could not determine data directory"))?;

        Ok(data_dir.join("flowdeck"))
    }

    pub fn describe_path() -> String {
        Self::get_config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| "the flowdeck config file".to_string())
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("flowdeck").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.provider(), Provider::Ollama);
        assert_eq!(config.autosave_debounce(), Duration::from_millis(DEFAULT_AUTOSAVE_DEBOUNCE_MS));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::new();
        config.provider = Some("claude".to_string());
        config.autosave_debounce_ms = Some(250);
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.provider(), Provider::Claude);
        assert_eq!(loaded.autosave_debounce(), Duration::from_millis(250));
    }

    #[test]
    fn test_first_run_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flowdeck").join("config.json");

        let config = Config::load_or_create_at(&path).unwrap();
        assert_eq!(config.provider(), Provider::Ollama);
        assert!(path.exists());

        fs::write(&path, r#"{"provider":"claude"}"#).unwrap();
        assert_eq!(Config::load_or_create_at(&path).unwrap().provider(), Provider::Claude);
    }

    #[test]
    fn test_older_files_without_new_keys_still_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"provider":"openai","default_model":"gpt-4o"}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.provider(), Provider::OpenAI);
        assert_eq!(config.default_model.as_deref(), Some("gpt-4o"));
        assert_eq!(
            config.intervention_interval(),
            Duration::from_secs(DEFAULT_INTERVENTION_INTERVAL_SECS)
        );
    }
}
