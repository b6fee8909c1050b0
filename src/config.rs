use anyhow::{anyhow, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use validator::Validate;

use crate::matcher::DEFAULT_THRESHOLD;

pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
const CACHE_FILE_NAME: &str = "ai_error_memory.csv";

#[derive(Debug, Serialize, Deserialize, Clone, Default, Validate)]
pub struct Config {
    #[validate]
    pub ai: AIConfig,
    #[validate]
    #[serde(default)]
    pub diagnosis: DiagnosisConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct AIConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    pub model: String,
    #[validate(range(min = 1, message = "max_tokens must be at least 1"))]
    pub max_tokens: u32,
    #[validate(range(min = 0.0, max = 2.0, message = "temperature must be between 0 and 2"))]
    pub temperature: f32,
    pub api_key: Option<String>,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

impl Default for AIConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 350,
            temperature: 0.2,
            api_key: None,
        }
    }
}

impl AIConfig {
    /// The credential to send, if one is configured and non-blank.
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
#[serde(default)]
pub struct DiagnosisConfig {
    #[validate(range(min = 0.0, max = 1.0, message = "match_threshold must be between 0 and 1"))]
    pub match_threshold: f64,
    #[validate(range(min = 1, message = "tail_lines must be at least 1"))]
    pub tail_lines: usize,
    pub max_free_queries: u32,
    pub enable_cache: bool,
    pub enable_catalog: bool,
    pub enable_budget: bool,
}

impl Default for DiagnosisConfig {
    fn default() -> Self {
        Self {
            match_threshold: DEFAULT_THRESHOLD,
            tail_lines: crate::diagnosis::DEFAULT_TAIL_LINES,
            max_free_queries: 5,
            enable_cache: true,
            enable_catalog: true,
            enable_budget: true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Local path or http(s) URL of the reference CSV.
    pub catalog_source: Option<String>,
    /// Falls back to the platform data directory when unset.
    pub cache_file: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct DisplayConfig {
    pub color_output: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { color_output: true }
    }
}

impl Config {
    pub fn create_default(path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(&Config::default())?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.apply_env_overrides();
        config
            .validate()
            .map_err(|e| anyhow!("Invalid config at {:?}: {}", path, e))?;
        Ok(config)
    }

    /// Picks up `OPENAI_API_KEY` from the environment (and `.env`).
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.ai.api_key = Some(key);
            }
        }
    }

    pub fn cache_path(&self) -> Result<PathBuf> {
        match &self.storage.cache_file {
            Some(path) => Ok(path.clone()),
            None => Ok(project_dirs()?.data_dir().join(CACHE_FILE_NAME)),
        }
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "gauss-doctor", "gauss-doctor")
        .ok_or_else(|| anyhow!("Could not determine config directory"))
}

pub fn get_config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("config.toml"))
}
