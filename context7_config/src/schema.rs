use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

pub const API_KEY_ENV: &str = "CONTEXT7_OPENAI_API_KEY";
pub const BASE_URL_ENV: &str = "CONTEXT7_OPENAI_BASE_URL";
pub const MODEL_ENV: &str = "CONTEXT7_OPENAI_MODEL";
pub const HISTORY_PATH_ENV: &str = "CONTEXT7_HISTORY_PATH";

const CONFIG_FILE: &str = "config.json";
const HISTORY_FILE: &str = "history.json";
const PLACEHOLDER_API_KEY: &str = "your-openai-api-key-here";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub openai: OpenAIConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub mcp: McpConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OpenAIConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "OpenAIConfig::default_base_url")]
    pub base_url: String,
    #[serde(default = "OpenAIConfig::default_model")]
    pub model: String,
    #[serde(default = "OpenAIConfig::default_temperature")]
    pub temperature: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default = "OpenAIConfig::default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: Self::default_base_url(),
            model: Self::default_model(),
            temperature: Self::default_temperature(),
            max_tokens: None,
            request_timeout_secs: Self::default_request_timeout_secs(),
        }
    }
}

impl OpenAIConfig {
    fn default_base_url() -> String {
        "https://api.openai.com/v1".to_string()
    }

    fn default_model() -> String {
        "gpt-4o-mini".to_string()
    }

    const fn default_temperature() -> f32 {
        0.2
    }

    const fn default_request_timeout_secs() -> u64 {
        120
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct HistoryConfig {
    /// Defaults to `~/context7/history.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Oldest turns beyond this count are dropped on write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_turns: Option<usize>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct McpConfig {
    #[serde(default = "McpConfig::default_command")]
    pub command: String,
    #[serde(default = "McpConfig::default_args")]
    pub args: Vec<String>,
    #[serde(default = "McpConfig::default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "McpConfig::default_max_tool_rounds")]
    pub max_tool_rounds: usize,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            command: Self::default_command(),
            args: Self::default_args(),
            request_timeout_secs: Self::default_request_timeout_secs(),
            max_tool_rounds: Self::default_max_tool_rounds(),
        }
    }
}

impl McpConfig {
    fn default_command() -> String {
        "npx".to_string()
    }

    fn default_args() -> Vec<String> {
        vec!["-y".to_string(), "@upstash/context7-mcp@latest".to_string()]
    }

    const fn default_request_timeout_secs() -> u64 {
        60
    }

    const fn default_max_tool_rounds() -> usize {
        8
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// `~/context7`, home of the config and history files.
pub fn config_dir() -> anyhow::Result<PathBuf> {
    Ok(dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
        .join("context7"))
}

impl Config {
    /// Loads `~/context7/config.json` (optional) and applies `CONTEXT7_*`
    /// environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path()?;
        let config = Self::load_from(&config_path, |key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `path` if it exists and applies overrides from `env`. Does not
    /// validate, so `info` can show a partial configuration.
    pub fn load_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content)
                .map_err(|e| anyhow::anyhow!("Invalid config file {}: {e}", path.display()))?
        } else {
            debug!("No config file at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_env_overrides(env);
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty(API_KEY_ENV) {
            self.openai.api_key = key;
        }
        if let Some(url) = non_empty(BASE_URL_ENV) {
            self.openai.base_url = url;
        }
        if let Some(model) = non_empty(MODEL_ENV) {
            self.openai.model = model;
        }
        if let Some(path) = non_empty(HISTORY_PATH_ENV) {
            self.history.path = Some(PathBuf::from(path));
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let key = self.openai.api_key.trim();
        if key.is_empty() || key == PLACEHOLDER_API_KEY {
            anyhow::bail!(
                "No OpenAI API key configured. Set {API_KEY_ENV} or add openai.api_key to {}",
                Self::config_path()
                    .map_or_else(|_| CONFIG_FILE.to_string(), |p| p.display().to_string())
            );
        }
        if self.mcp.max_tool_rounds == 0 {
            anyhow::bail!("mcp.max_tool_rounds must be at least 1");
        }
        Ok(())
    }

    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(config_dir()?.join(CONFIG_FILE))
    }

    pub fn history_path(&self) -> anyhow::Result<PathBuf> {
        match &self.history.path {
            Some(path) => Ok(path.clone()),
            None => Ok(config_dir()?.join(HISTORY_FILE)),
        }
    }

    pub fn create_config() -> anyhow::Result<PathBuf> {
        let path = Self::config_path()?;
        Self::create_config_at(&path)?;
        Ok(path)
    }

    /// Writes a template with every default spelled out. Refuses to
    /// overwrite an existing file.
    pub fn create_config_at(path: &Path) -> anyhow::Result<()> {
        if path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                path.display()
            );
        }
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let mut template = Self::default();
        template.openai.api_key = PLACEHOLDER_API_KEY.to_string();
        std::fs::write(path, serde_json::to_string_pretty(&template)?)?;

        info!("Created config file at {}", path.display());
        Ok(())
    }
}
