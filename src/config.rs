use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct GlossaConfig {
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
    pub segmenter: SegmenterConfig,
    pub ai: AiConfig,
    pub review: ReviewConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SegmenterConfig {
    /// Longest candidate word (in chars) tried at each position. Shared by
    /// the learning path and the passive annotate path.
    pub max_word_chars: usize,
    /// Replaces the built-in segmentation instructions sent to the AI.
    pub prompt_override: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AiConfig {
    /// Base URL of an OpenAI-compatible API (the `/chat/completions` path is appended).
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
    /// Target language for glosses.
    pub gloss_language: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ReviewConfig {
    /// Shuffle each fetched batch instead of presenting oldest-due first.
    pub shuffle: bool,
    /// Cards per fetch; 0 means no limit.
    pub batch_size: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_glossa_dir()
            .join("dictionary.db")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            max_word_chars: crate::segment::MAX_WORD_CHARS,
            prompt_override: None,
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".into(),
            model: "gpt-4o-mini".into(),
            api_key: String::new(),
            gloss_language: "English".into(),
            timeout_secs: 30,
        }
    }
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            shuffle: false,
            batch_size: 0,
        }
    }
}

/// Returns `~/.glossa/`
pub fn default_glossa_dir() -> PathBuf {
    dirs::home_dir()
        .expect("home directory must exist")
        .join(".glossa")
}

/// Returns the default config file path: `~/.glossa/config.toml`
pub fn default_config_path() -> PathBuf {
    default_glossa_dir().join("config.toml")
}

impl GlossaConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            GlossaConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (GLOSSA_DB, GLOSSA_LOG_LEVEL,
    /// GLOSSA_API_KEY, GLOSSA_AI_ENDPOINT, GLOSSA_AI_MODEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("GLOSSA_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("GLOSSA_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = std::env::var("GLOSSA_API_KEY") {
            self.ai.api_key = val;
        }
        if let Ok(val) = std::env::var("GLOSSA_AI_ENDPOINT") {
            self.ai.endpoint = val;
        }
        if let Ok(val) = std::env::var("GLOSSA_AI_MODEL") {
            self.ai.model = val;
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .expect("home directory must exist")
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}
