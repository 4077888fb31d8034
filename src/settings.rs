//! User settings, stored as TOML at `{config_dir}/cardstack/settings.toml`.
//!
//! A missing file means defaults. Settings are loaded once by a front end
//! and handed down explicitly; nothing reads them globally.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::flashcards::{Card, FlashcardStorage};
use crate::study::StudyConfig;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid settings file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    ConfigDirNotFound,
}

pub type Result<T> = std::result::Result<T, SettingsError>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Which explanation prompt to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptKind {
    #[default]
    Analyze,
    Memory,
}

impl std::str::FromStr for PromptKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "analyze" => Ok(Self::Analyze),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown template '{}' (expected analyze or memory)", other)),
        }
    }
}

/// Prompt templates for explanations. `{front}` and `{back}` are replaced
/// with the card's text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptTemplates {
    pub analyze: String,
    pub memory: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            analyze: "Explain the following flashcard in depth. Cover the underlying \
                      concept, common pitfalls and a short example.\n\n\
                      Question: {front}\nAnswer: {back}"
                .to_string(),
            memory: "Give me a memorable mnemonic or association that helps me recall \
                     the answer to this flashcard. Keep it short.\n\n\
                     Question: {front}\nAnswer: {back}"
                .to_string(),
        }
    }
}

impl PromptTemplates {
    pub fn get(&self, kind: PromptKind) -> &str {
        match kind {
            PromptKind::Analyze => &self.analyze,
            PromptKind::Memory => &self.memory,
        }
    }

    /// Fill the template for `kind` with the card's front and back
    pub fn render(&self, kind: PromptKind, card: &Card) -> String {
        crate::ai::render_prompt(self.get(kind), card)
    }
}

/// OpenAI-compatible chat completions endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub base_url: String,
    pub model: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.deepseek.com".to_string(),
            model: "deepseek-chat".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub theme: Theme,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_api_key: Option<String>,
    /// Overrides the default data directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    pub prompt_templates: PromptTemplates,
    pub ai: AiConfig,
    pub study: StudyConfig,
    pub server: ServerConfig,
}

impl Settings {
    /// Default settings file location
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join("cardstack").join("settings.toml"))
            .ok_or(SettingsError::ConfigDirNotFound)
    }

    /// Load settings from `path`, or defaults when the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn load_default() -> Result<Self> {
        Self::load(&Self::default_path()?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// The API key, ignoring blank values
    pub fn api_key(&self) -> Option<&str> {
        self.ai_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// Data directory: the configured one, else the platform default
    pub fn data_dir(&self) -> Option<PathBuf> {
        self.data_dir
            .clone()
            .or_else(|| FlashcardStorage::default_data_dir().ok())
    }
}
