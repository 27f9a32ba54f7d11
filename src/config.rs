use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::gemini;

fn default_model() -> String {
    gemini::DEFAULT_MODEL.to_string()
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub gemini: GeminiConfig,
    pub window: WindowConfig,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GeminiConfig {
    #[serde(default = "default_model")]
    pub model: String,
    /// Built-in shared key used whenever no custom credential is configured.
    #[serde(default)]
    pub shared_api_key: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            gemini: GeminiConfig {
                model: default_model(),
                shared_api_key: String::new(),
            },
            window: WindowConfig {
                width: 860,
                height: 760,
            },
        }
    }
}

impl Config {
    pub fn load() -> Self {
        let config_path = Self::get_config_path();

        if config_path.exists() {
            match fs::read_to_string(&config_path) {
                Ok(contents) => match toml::from_str(&contents) {
                    Ok(config) => return config,
                    Err(e) => eprintln!("Error parsing config.toml: {}. Using defaults.", e),
                },
                Err(e) => eprintln!("Error reading config.toml: {}. Using defaults.", e),
            }
        } else {
            // Create config directory if it doesn't exist
            if let Some(parent) = config_path.parent() {
                let _ = fs::create_dir_all(parent);
            }
        }

        Config::default()
    }

    /// Resolves the built-in shared key: the config value wins, the
    /// environment variable is the fallback for unconfigured installs.
    pub fn shared_key(&self) -> String {
        if !self.gemini.shared_api_key.trim().is_empty() {
            return self.gemini.shared_api_key.clone();
        }
        std::env::var("GEMINI_API_KEY").unwrap_or_default()
    }

    pub fn get_config_path() -> PathBuf {
        Self::get_config_dir().join("config.toml")
    }

    pub fn get_config_dir() -> PathBuf {
        if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home).join(".config/reprompt")
        } else {
            PathBuf::from(".")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.gemini.model, "gemini-3-flash-preview");
        assert!(config.gemini.shared_api_key.is_empty());
        assert!(config.window.width > 0);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            "[gemini]\nshared_api_key = \"AIza-shared\"\n\n[window]\nwidth = 800\nheight = 600\n",
        )
        .unwrap();
        assert_eq!(config.gemini.model, "gemini-3-flash-preview");
        assert_eq!(config.gemini.shared_api_key, "AIza-shared");
        assert_eq!(config.window.width, 800);
    }

    #[test]
    fn test_shared_key_prefers_config_value() {
        let mut config = Config::default();
        config.gemini.shared_api_key = "AIza-shared".to_string();
        assert_eq!(config.shared_key(), "AIza-shared");
    }
}
