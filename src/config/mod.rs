//! User settings and the API key.
//!
//! Settings are read through [`ConfigStore`] and the key through
//! [`SecretStore`]; [`FileSettings`] implements both on top of two TOML files.
//! A cycle takes one [`GenerationConfig`] snapshot at its start and never
//! re-reads, so edits made while it runs apply from the next cycle on.

mod file;

use std::fmt;

use crate::commit::DEFAULT_PROMPT;
use crate::error::ConfigError;

pub use file::{CONFIG_DIR_ENV_VAR, API_KEY_ENV_VAR, FileSettings};

/// Setting: commit without asking when a message has been generated.
pub const AUTO_COMMIT_ENABLED: &str = "auto_commit_enabled";

/// Setting: the instruction text placed before the diff in the prompt.
pub const CUSTOM_PROMPT: &str = "custom_prompt";

/// Secret: the Gemini API key.
pub const GEMINI_API_KEY: &str = "gemini_api_key";

/// A value written through [`ConfigStore::set`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Bool(bool),
    String(String),
}

/// Non-secret settings.
#[cfg_attr(test, mockall::automock)]
pub trait ConfigStore: Send + Sync {
    fn get_bool(&self, name: &str, default: bool) -> Result<bool, ConfigError>;
    fn get_string(&self, name: &str, default: &str) -> Result<String, ConfigError>;
    fn set(&self, name: &str, value: SettingValue) -> Result<(), ConfigError>;
}

/// Secrets, kept apart from ordinary settings.
#[cfg_attr(test, mockall::automock)]
pub trait SecretStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, ConfigError>;
    fn set(&self, key: &str, value: &str) -> Result<(), ConfigError>;
}

/// An API key. `Debug` never shows the value.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap `key`, treating a blank string as no key.
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into().trim().to_string();
        (!key.is_empty()).then_some(Self(key))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(****)")
    }
}

/// Everything one generation cycle needs from the settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationConfig {
    pub api_key: Option<ApiKey>,
    pub auto_commit_enabled: bool,
    pub custom_prompt: String,
}

impl GenerationConfig {
    /// Read a snapshot from the stores, filling in defaults.
    ///
    /// A blank prompt falls back to [`DEFAULT_PROMPT`].
    pub fn load(config: &dyn ConfigStore, secrets: &dyn SecretStore) -> Result<Self, ConfigError> {
        let api_key = secrets.get(GEMINI_API_KEY)?.and_then(ApiKey::new);
        let auto_commit_enabled = config.get_bool(AUTO_COMMIT_ENABLED, false)?;
        let custom_prompt = config.get_string(CUSTOM_PROMPT, DEFAULT_PROMPT)?;
        let custom_prompt = if custom_prompt.trim().is_empty() {
            DEFAULT_PROMPT.to_string()
        } else {
            custom_prompt
        };

        Ok(Self {
            api_key,
            auto_commit_enabled,
            custom_prompt,
        })
    }
}
