use crate::core::error::AppError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";
pub const PLACEHOLDER_API_KEY: &str = "your-api-key-here";

const DEFAULT_SHELL_LABELS: &[&str] = &[
    "bash",
    "sh",
    "shell",
    "zsh",
    "fish",
    "console",
    "cmd",
    "bat",
    "batch",
    "powershell",
    "pwsh",
    "ps1",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub url: String,
    pub key: String,
    pub model: String,
    pub temperature: f64,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_API_URL.to_string(),
            key: PLACEHOLDER_API_KEY.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.2,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub debug_mode: bool,
    /// Upper bound on regenerations within one run
    pub max_regenerations: usize,
    /// Replaces the built-in system prompt; `{os}` is substituted
    pub system_prompt: Option<String>,
    /// Language hints stripped after an opening code fence
    pub shell_labels: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            debug_mode: false,
            max_regenerations: 5,
            system_prompt: None,
            shell_labels: DEFAULT_SHELL_LABELS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub app: AppConfig,
}

/// Result of loading the configuration file
#[derive(Debug)]
pub enum LoadOutcome {
    Existing(Config),
    /// No file was found; defaults were written to the given path
    Created(Config, PathBuf),
}

impl Config {
    fn config_dir() -> PathBuf {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join(".aicmd").join("config.toml")
    }

    pub fn load() -> Result<LoadOutcome, AppError> {
        Self::load_from(&Self::config_path())
    }

    /// Reads the file at `path`, or writes defaults there when it is absent.
    pub fn load_from(path: &Path) -> Result<LoadOutcome, AppError> {
        if !path.exists() {
            let config = Config::default();
            config.save_to(path)?;
            info!("created default config at {}", path.display());
            return Ok(LoadOutcome::Created(config, path.to_path_buf()));
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Read {}: {}", path.display(), e)))?;
        let mut config =
            toml::from_str::<Config>(&contents).map_err(|source| AppError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;

        if config.api.url.trim().is_empty() {
            config.api.url = DEFAULT_API_URL.to_string();
        }

        Ok(LoadOutcome::Existing(config))
    }

    pub fn save_to(&self, path: &Path) -> Result<(), AppError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    AppError::Config(format!("Create {}: {}", parent.display(), e))
                })?;
            }
        }

        let toml_content = toml::to_string_pretty(self)?;
        fs::write(path, toml_content)
            .map_err(|e| AppError::Config(format!("Write {}: {}", path.display(), e)))?;
        Ok(())
    }

    pub fn has_placeholder_key(&self) -> bool {
        let key = self.api.key.trim();
        key.is_empty() || key == PLACEHOLDER_API_KEY
    }
}
