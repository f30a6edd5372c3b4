//! Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Configuration for parley
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default chat model
    pub model: Option<String>,
    /// Model used for summarization calls (defaults to the chat model)
    pub summary_model: Option<String>,
    /// Whether to advertise the hosted web search tool
    pub web_search: Option<bool>,
    /// Token budget for the conversation history
    pub max_tokens: Option<u32>,
    /// Number of recent messages protected from compaction
    pub protected_tail: Option<usize>,
    /// Custom system prompt file path
    pub system_prompt_file: Option<String>,
    /// API key (alternative to the OPENAI_API_KEY environment variable)
    pub api_key: Option<String>,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("parley")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        // Check for PARLEY_CONFIG_PATH env var first
        if let Ok(path) = std::env::var("PARLEY_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from file
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Warning: Failed to parse config file: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    /// Save config to file
    pub fn save(&self) -> std::io::Result<()> {
        let path = Self::config_path();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, content)
    }

    /// Create a default config file if it doesn't exist
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }

        let default_config = Config {
            model: Some("gpt-4o".to_string()),
            summary_model: None,
            web_search: Some(true),
            max_tokens: Some(20_000),
            protected_tail: Some(10),
            system_prompt_file: None,
            api_key: None,
        };

        default_config.save()?;
        Ok(path)
    }

    /// Get the API key, checking config then environment
    pub fn api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_all_unset() {
        let config = Config::default();
        assert!(config.model.is_none());
        assert!(config.web_search.is_none());
        assert!(config.max_tokens.is_none());
    }

    #[test]
    fn test_partial_toml_parses_with_defaults() {
        let config: Config = toml::from_str("model = \"gpt-4o\"\nmax_tokens = 5000\n").unwrap();
        assert_eq!(config.model.as_deref(), Some("gpt-4o"));
        assert_eq!(config.max_tokens, Some(5000));
        assert!(config.summary_model.is_none());
        assert!(config.protected_tail.is_none());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = Config {
            model: Some("gpt-4.1".to_string()),
            summary_model: Some("gpt-4o-mini".to_string()),
            web_search: Some(false),
            max_tokens: Some(10_000),
            protected_tail: Some(6),
            system_prompt_file: None,
            api_key: None,
        };
        let text = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.model, config.model);
        assert_eq!(back.summary_model, config.summary_model);
        assert_eq!(back.web_search, config.web_search);
        assert_eq!(back.protected_tail, config.protected_tail);
    }
}
