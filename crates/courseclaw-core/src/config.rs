//! CourseClaw configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CourseClawError, Result};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseClawConfig {
    /// Explicit API key. Empty means "look it up in the environment".
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Base URL override, e.g. `http://localhost:11434/v1`.
    #[serde(default)]
    pub endpoint: String,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
    #[serde(default)]
    pub identity: Identity,
}

fn default_provider() -> String { "openai".into() }
fn default_chat_model() -> String { "gpt-4o-mini".into() }
fn default_temperature() -> f32 { 0.7 }
fn default_max_tokens() -> u32 { 1024 }

impl Default for CourseClawConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            provider: default_provider(),
            endpoint: String::new(),
            chat_model: default_chat_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            embedding: EmbeddingConfig::default(),
            knowledge: KnowledgeConfig::default(),
            identity: Identity::default(),
        }
    }
}

impl CourseClawConfig {
    /// Load config from the default path (~/.courseclaw/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CourseClawError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| CourseClawError::Config(format!("Failed to parse config: {e}")))?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the CourseClaw home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".courseclaw")
    }
}

/// Embedding model settings. The dimension is fixed for the lifetime of a store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
}

fn default_embedding_model() -> String { "text-embedding-3-large".into() }
fn default_dimensions() -> usize { 3072 }

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            dimensions: default_dimensions(),
        }
    }
}

/// Where the catalog comes from and where the index lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default = "default_csv_path")]
    pub csv_path: String,
}

fn default_db_path() -> String { "~/.courseclaw/course.db".into() }
fn default_csv_path() -> String { "courses.csv".into() }

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            csv_path: default_csv_path(),
        }
    }
}

impl KnowledgeConfig {
    /// Store path with `~` expanded.
    pub fn db_path(&self) -> PathBuf {
        expand_path(&self.db_path)
    }

    pub fn csv_path(&self) -> PathBuf {
        expand_path(&self.csv_path)
    }
}

/// Assistant persona.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

fn default_name() -> String { "CourseClaw".into() }
fn default_system_prompt() -> String {
    "You are an assistant for university course queries. Use search_courses to find information. \
     Answer in 1-2 plain sentences without any formatting, bullet points, numbered lists, bold text, \
     or line breaks. Use format like: 'Course X and Course Y are offered' or \
     'Professor teaches Course A (code) and Course B (code)'."
        .into()
}

impl Default for Identity {
    fn default() -> Self {
        Self {
            name: default_name(),
            system_prompt: default_system_prompt(),
        }
    }
}

/// Expand a leading `~` and environment variables.
pub fn expand_path(p: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(p).to_string())
}
