//! Configuration with layered resolution using figment.
//!
//! Resolution order (highest priority last):
//! 1. Built-in defaults
//! 2. User config: `~/.config/cctp/config.toml` (XDG) or platform config dir
//! 3. Project config: `cctp.toml` in the working directory
//! 4. Environment variables: `CCTP_*`, nested keys joined by `__`
//!    (`CCTP_LLM__BASE_URL`, `CCTP_EXAMPLES__MAX_COUNT`)
//!
//! ```toml
//! data_dir = "/srv/cctp"
//!
//! [llm]
//! base_url = "https://api.openai.com/v1"
//! generation_model = "gpt-4-1106-preview"
//!
//! [examples]
//! max_count = 3
//! max_total_chars = 4000
//! ```
//!
//! When no API key is configured, `OPENAI_API_KEY` is used.

use std::ops::Deref;
use std::path::{Path, PathBuf};

use cctp_ai::draft::DraftSettings;
use cctp_ai::retrieve::ExampleLimits;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const PROJECT_CONFIG_FILE: &str = "cctp.toml";
pub const API_KEY_FALLBACK_VAR: &str = "OPENAI_API_KEY";

/// Boxed wrapper for figment::Error to reduce Result size on the stack.
#[derive(Debug)]
pub struct ConfigError(Box<figment::Error>);

impl Deref for ConfigError {
    type Target = figment::Error;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self(Box::new(err))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Holds `knowledge_base/`, `system_prompt.txt` and `exports/`.
    pub data_dir: PathBuf,
    pub llm: LlmConfig,
    pub examples: ExampleLimits,
}

/// OpenAI-compatible chat endpoint and model choices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub generation_model: String,
    pub modification_model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        let draft = DraftSettings::default();
        Self {
            data_dir: default_data_dir(),
            llm: LlmConfig {
                base_url: "https://api.openai.com/v1".to_string(),
                api_key: None,
                generation_model: draft.generation_model,
                modification_model: draft.modification_model,
                temperature: draft.temperature,
                timeout_secs: 120,
            },
            examples: draft.limits,
        }
    }
}

impl Config {
    /// Load config with layered resolution (defaults → user → project → env).
    pub fn load() -> Result<Self, ConfigError> {
        let config: Config = Self::figment(&Self::user_config_path()).extract()?;
        Ok(config.with_api_key_fallback(std::env::var(API_KEY_FALLBACK_VAR).ok()))
    }

    fn figment(user_config: &Path) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(user_config))
            .merge(Toml::file(PROJECT_CONFIG_FILE))
            .merge(Env::prefixed("CCTP_").split("__"))
    }

    fn with_api_key_fallback(mut self, fallback: Option<String>) -> Self {
        let configured = self
            .llm
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty());
        if !configured {
            self.llm.api_key = fallback.filter(|k| !k.trim().is_empty());
        }
        self
    }

    pub fn knowledge_dir(&self) -> PathBuf {
        self.data_dir.join("knowledge_base")
    }

    pub fn exports_dir(&self) -> PathBuf {
        self.data_dir.join("exports")
    }

    pub fn draft_settings(&self) -> DraftSettings {
        DraftSettings {
            generation_model: self.llm.generation_model.clone(),
            modification_model: self.llm.modification_model.clone(),
            temperature: self.llm.temperature,
            limits: self.examples,
        }
    }

    /// User config path: ~/.config/cctp/config.toml (XDG) or platform config dir.
    fn user_config_path() -> PathBuf {
        if let Some(home) = dirs::home_dir() {
            let xdg_path = home.join(".config").join("cctp").join("config.toml");
            if xdg_path.exists() {
                return xdg_path;
            }
        }
        dirs::config_dir()
            .map(|p| p.join("cctp").join("config.toml"))
            .unwrap_or_default()
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|p| p.join("cctp"))
        .unwrap_or_else(|| PathBuf::from(".cctp"))
}
