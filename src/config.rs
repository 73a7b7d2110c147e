use color_eyre::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub groq: GroqConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub brave: BraveConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

/// Groq completion endpoint (OpenAI-compatible)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroqConfig {
    pub api_key: String,
    pub base_url: String,
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_GROQ_BASE_URL.to_string(),
        }
    }
}

/// Model identifiers for the two prompt modes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Chart-producing analysis
    pub logic: String,
    /// Summary-only answers
    pub fast: String,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            logic: "llama-3.3-70b-versatile".to_string(),
            fast: "llama-3.1-8b-instant".to_string(),
        }
    }
}

/// Brave Search configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BraveConfig {
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

/// Timeouts applied to every external call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    pub connect_secs: u64,
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 10,
            request_secs: 120,
        }
    }
}

impl TimeoutConfig {
    #[must_use]
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }

    #[must_use]
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }
}

impl Config {
    /// Loads configuration from disk (creating a default file if missing),
    /// then applies environment overrides
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        let mut config = if config_path.exists() {
            let contents = fs::read_to_string(&config_path)?;
            toml::from_str(&contents)?
        } else {
            let config = Config::default();
            config.save()?;
            config
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Saves configuration to disk
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&config_path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Returns the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("", "", "vizwiz")
            .ok_or_else(|| color_eyre::eyre::eyre!("Could not determine config directory"))?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Overlays values from the environment (or `.env`) on top of the file
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(api_key) = non_blank("GROQ_API_KEY") {
            self.groq.api_key = api_key;
        }
        if let Some(base_url) = non_blank("GROQ_BASE_URL") {
            self.groq.base_url = base_url;
        }
        if let Some(api_key) = non_blank("BRAVE_API_KEY") {
            self.brave.api_key = api_key;
        }
        if let Some(bind) = non_blank("VIZWIZ_BIND") {
            self.server.bind = bind;
        }
        if let Some(data_dir) = non_blank("VIZWIZ_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(data_dir);
        }
    }

    /// Refuses to start without a completion API key
    pub fn validate(&self) -> Result<()> {
        if self.groq.api_key.trim().is_empty() {
            return Err(color_eyre::eyre::eyre!(
                "GROQ_API_KEY not found! Set it in the environment, a .env file, or {}",
                Self::config_path()
                    .map_or_else(|_| "config.toml".to_string(), |path| path.display().to_string())
            ));
        }
        if self.timeouts.request_secs == 0 {
            return Err(color_eyre::eyre::eyre!("timeouts.request_secs must be greater than zero"));
        }
        Ok(())
    }

    /// Brave key, if one is configured
    #[must_use]
    pub fn brave_key(&self) -> Option<&str> {
        let key = self.brave.api_key.trim();
        (!key.is_empty()).then_some(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_missing_api_key_fails_validation() {
        let config = Config::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_key_passes_validation() {
        let mut config = Config::default();
        config.apply_env(env(&[("GROQ_API_KEY", "gsk_test")]));
        assert!(config.validate().is_ok());
        assert_eq!(config.groq.api_key, "gsk_test");
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let mut config = Config::default();
        config.groq.api_key = "from-file".to_string();
        config.apply_env(env(&[("GROQ_API_KEY", "   "), ("VIZWIZ_BIND", "")]));
        assert_eq!(config.groq.api_key, "from-file");
        assert_eq!(config.server.bind, "127.0.0.1:8000");
    }

    #[test]
    fn test_env_overrides_paths_and_search_key() {
        let mut config = Config::default();
        config.apply_env(env(&[
            ("BRAVE_API_KEY", "brave"),
            ("VIZWIZ_DATA_DIR", "/tmp/vizwiz"),
            ("VIZWIZ_BIND", "0.0.0.0:9000"),
        ]));
        assert_eq!(config.brave_key(), Some("brave"));
        assert_eq!(config.storage.data_dir, PathBuf::from("/tmp/vizwiz"));
        assert_eq!(config.server.bind, "0.0.0.0:9000");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("[groq]\napi_key = \"k\"\nbase_url = \"http://x\"\n")
            .expect("parse toml");
        assert_eq!(config.models.fast, "llama-3.1-8b-instant");
        assert_eq!(config.timeouts.request_secs, 120);
        assert!(config.brave_key().is_none());
    }
}
